use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use ethereum_types::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::Alloc;

use super::{
    blob_schedule::{BlobParams, BlobSchedule},
    capability::{Capability, CapabilityValue, ForkPoint, Rule, constant},
    error::ForkError,
    gas::{GasCosts, IntrinsicCostInput},
    registry::ForkRegistry,
};

/// What a fork's activation is keyed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ActivationKind {
    #[default]
    Block,
    Timestamp,
}

/// A fork to be appended to a [`ForkRegistryBuilder`](super::ForkRegistryBuilder).
pub struct ForkDefinition {
    pub(crate) name: String,
    pub(crate) activation: ActivationKind,
    pub(crate) ignored: bool,
    pub(crate) overrides: Vec<(Capability, Rule)>,
    pub(crate) pre_allocation: Option<Alloc>,
}

impl fmt::Debug for ForkDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForkDefinition")
            .field("name", &self.name)
            .field("activation", &self.activation)
            .field("ignored", &self.ignored)
            .field(
                "overrides",
                &self.overrides.iter().map(|(c, _)| c).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl ForkDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activation: ActivationKind::Block,
            ignored: false,
            overrides: Vec::new(),
            pre_allocation: None,
        }
    }

    pub fn activated_by(mut self, activation: ActivationKind) -> Self {
        self.activation = activation;
        self
    }

    /// Keeps the fork in the ordering but out of every fork listing.
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub fn with(self, capability: Capability, value: CapabilityValue) -> Self {
        self.with_rule(capability, constant(value))
    }

    pub fn with_rule(mut self, capability: Capability, rule: Rule) -> Self {
        self.overrides.push((capability, rule));
        self
    }

    /// Accounts this fork adds to the pre-state, merged over its parent's.
    pub fn pre_allocation(mut self, alloc: Alloc) -> Self {
        self.pre_allocation = Some(alloc);
        self
    }
}

/// Handle to a fork of a [`ForkRegistry`].
///
/// Forks are totally ordered by activation. Equality and hashing use the
/// rank and the name.
#[derive(Clone)]
pub struct Fork {
    registry: ForkRegistry,
    rank: usize,
}

impl Fork {
    pub(crate) fn new(registry: ForkRegistry, rank: usize) -> Self {
        Self { registry, rank }
    }

    pub fn name(&self) -> &str {
        &self.registry.inner().forks[self.rank].name
    }

    /// Position in the catalog, starting at zero.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn registry(&self) -> &ForkRegistry {
        &self.registry
    }

    pub fn activation(&self) -> ActivationKind {
        self.registry.inner().forks[self.rank].activation
    }

    pub fn is_ignored(&self) -> bool {
        self.registry.inner().forks[self.rank].ignored
    }

    pub fn is_deployed(&self) -> bool {
        self.rank <= self.registry.inner().last_deployed
    }

    /// The fork right before this one, ignored forks included.
    pub fn parent(&self) -> Option<Fork> {
        self.rank
            .checked_sub(1)
            .map(|rank| self.registry.fork_at_rank(rank))
    }

    /// Evaluates the rule this fork defines or inherits for `capability`.
    pub fn evaluate(
        &self,
        capability: Capability,
        point: ForkPoint,
    ) -> Result<CapabilityValue, ForkError> {
        self.registry
            .inner()
            .capabilities
            .resolve(capability, self.rank)
            .map(|rule| rule(point))
            .ok_or_else(|| ForkError::UnknownCapability {
                fork: self.name().to_string(),
                capability: capability.to_string(),
            })
    }

    /// Forks from the first one up to this one, in order, ignored forks included.
    fn lineage(&self) -> impl Iterator<Item = Fork> + '_ {
        (0..=self.rank).map(|rank| self.registry.fork_at_rank(rank))
    }
}

impl fmt::Debug for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fork({})", self.name())
    }
}

impl fmt::Display for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq for Fork {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.name() == other.name()
    }
}

impl Eq for Fork {}

impl Hash for Fork {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank.hash(state);
        self.name().hash(state);
    }
}

impl PartialOrd for Fork {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fork {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.name().cmp(other.name()))
    }
}

impl Serialize for Fork {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Fork {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        ForkRegistry::mainline()
            .fork(&name)
            .map_err(serde::de::Error::custom)
    }
}

fn capability_type_error(fork: &Fork, capability: Capability) -> ForkError {
    ForkError::Config(format!(
        "capability {capability} of fork {fork} has an unexpected value type"
    ))
}

/// Queries shared by plain forks and transitions.
///
/// Every query takes an optional chain point. Plain forks default to genesis,
/// transitions default to the point where the transition happens.
pub trait ForkRules {
    fn name(&self) -> &str;

    /// The plain fork whose rules apply at `point` and the point to evaluate them at.
    fn resolve(&self, point: Option<ForkPoint>) -> (Fork, ForkPoint);

    /// Plain fork in effect at the given block and timestamp.
    fn fork_at(&self, block_number: u64, timestamp: u64) -> Fork {
        self.resolve(Some(ForkPoint::new(block_number, timestamp))).0
    }

    fn capability(
        &self,
        capability: Capability,
        point: Option<ForkPoint>,
    ) -> Result<CapabilityValue, ForkError> {
        let (fork, point) = self.resolve(point);
        fork.evaluate(capability, point)
    }

    /// Same as [`capability`](Self::capability), looking the capability up by name.
    fn capability_by_name(
        &self,
        name: &str,
        point: Option<ForkPoint>,
    ) -> Result<CapabilityValue, ForkError> {
        let capability =
            name.parse::<Capability>()
                .map_err(|_| ForkError::UnknownCapability {
                    fork: self.name().to_string(),
                    capability: name.to_string(),
                })?;
        self.capability(capability, point)
    }

    fn transition_tool_name(&self, point: Option<ForkPoint>) -> Result<String, ForkError> {
        let (fork, point) = self.resolve(point);
        let value = fork.evaluate(Capability::TransitionToolName, point)?;
        value
            .as_name()
            .map(str::to_string)
            .ok_or_else(|| capability_type_error(&fork, Capability::TransitionToolName))
    }

    fn header_base_fee_required(&self, point: Option<ForkPoint>) -> Result<bool, ForkError> {
        bool_capability(self, Capability::HeaderBaseFeeRequired, point)
    }

    fn header_prev_randao_required(&self, point: Option<ForkPoint>) -> Result<bool, ForkError> {
        bool_capability(self, Capability::HeaderPrevRandaoRequired, point)
    }

    fn header_zero_difficulty_required(
        &self,
        point: Option<ForkPoint>,
    ) -> Result<bool, ForkError> {
        bool_capability(self, Capability::HeaderZeroDifficultyRequired, point)
    }

    fn header_withdrawals_required(&self, point: Option<ForkPoint>) -> Result<bool, ForkError> {
        bool_capability(self, Capability::HeaderWithdrawalsRequired, point)
    }

    fn header_blob_gas_used_required(&self, point: Option<ForkPoint>) -> Result<bool, ForkError> {
        bool_capability(self, Capability::HeaderBlobGasUsedRequired, point)
    }

    fn header_excess_blob_gas_required(
        &self,
        point: Option<ForkPoint>,
    ) -> Result<bool, ForkError> {
        bool_capability(self, Capability::HeaderExcessBlobGasRequired, point)
    }

    fn header_beacon_root_required(&self, point: Option<ForkPoint>) -> Result<bool, ForkError> {
        bool_capability(self, Capability::HeaderBeaconRootRequired, point)
    }

    fn header_requests_required(&self, point: Option<ForkPoint>) -> Result<bool, ForkError> {
        bool_capability(self, Capability::HeaderRequestsRequired, point)
    }

    fn engine_new_payload_version(
        &self,
        point: Option<ForkPoint>,
    ) -> Result<Option<u64>, ForkError> {
        version_capability(self, Capability::EngineNewPayloadVersion, point)
    }

    fn engine_forkchoice_updated_version(
        &self,
        point: Option<ForkPoint>,
    ) -> Result<Option<u64>, ForkError> {
        version_capability(self, Capability::EngineForkchoiceUpdatedVersion, point)
    }

    fn engine_get_payload_version(
        &self,
        point: Option<ForkPoint>,
    ) -> Result<Option<u64>, ForkError> {
        version_capability(self, Capability::EngineGetPayloadVersion, point)
    }

    fn tx_types(&self, point: Option<ForkPoint>) -> Result<Vec<u8>, ForkError> {
        let (fork, point) = self.resolve(point);
        let value = fork.evaluate(Capability::TxTypes, point)?;
        value
            .as_tx_types()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| capability_type_error(&fork, Capability::TxTypes))
    }

    fn contract_creating_tx_types(&self, point: Option<ForkPoint>) -> Result<Vec<u8>, ForkError> {
        let (fork, point) = self.resolve(point);
        let value = fork.evaluate(Capability::ContractCreatingTxTypes, point)?;
        value
            .as_tx_types()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| capability_type_error(&fork, Capability::ContractCreatingTxTypes))
    }

    fn precompiles(&self, point: Option<ForkPoint>) -> Result<Vec<Address>, ForkError> {
        let (fork, point) = self.resolve(point);
        let value = fork.evaluate(Capability::Precompiles, point)?;
        value
            .as_addresses()
            .map(<[Address]>::to_vec)
            .ok_or_else(|| capability_type_error(&fork, Capability::Precompiles))
    }

    fn gas_costs(&self, point: Option<ForkPoint>) -> Result<GasCosts, ForkError> {
        let (fork, point) = self.resolve(point);
        let value = fork.evaluate(Capability::GasCosts, point)?;
        value
            .as_gas_costs()
            .copied()
            .ok_or_else(|| capability_type_error(&fork, Capability::GasCosts))
    }

    fn blob_params(&self, point: Option<ForkPoint>) -> Result<Option<BlobParams>, ForkError> {
        let (fork, point) = self.resolve(point);
        blob_params_of(&fork, point)
    }

    /// Blob parameters of every fork from the first one with blobs up to the
    /// resolved fork. `None` before blobs exist.
    fn blob_schedule(&self, point: Option<ForkPoint>) -> Result<Option<BlobSchedule>, ForkError> {
        let (fork, point) = self.resolve(point);
        let mut schedule = BlobSchedule::new();
        for ancestor in fork.lineage().filter(|f| !f.is_ignored()) {
            if let Some(params) = blob_params_of(&ancestor, point)? {
                schedule.push(ancestor.name(), params);
            }
        }
        Ok((!schedule.is_empty()).then_some(schedule))
    }

    /// Pre-state every test of the resolved fork starts from.
    fn pre_allocation(&self, point: Option<ForkPoint>) -> Alloc {
        let (fork, _) = self.resolve(point);
        let mut alloc = Alloc::new();
        for ancestor in fork.lineage() {
            if let Some(contribution) =
                &fork.registry().inner().forks[ancestor.rank()].pre_allocation
            {
                alloc.merge(contribution);
            }
        }
        alloc
    }

    /// Intrinsic gas of a transaction, without the EIP-7623 floor.
    fn transaction_intrinsic_cost(
        &self,
        input: &IntrinsicCostInput<'_>,
        point: Option<ForkPoint>,
    ) -> Result<u64, ForkError> {
        Ok(self.gas_costs(point)?.intrinsic_cost(input))
    }

    /// EIP-7623 calldata floor, `None` on forks without it.
    fn transaction_data_floor_cost(
        &self,
        calldata: &[u8],
        point: Option<ForkPoint>,
    ) -> Result<Option<u64>, ForkError> {
        Ok(self.gas_costs(point)?.data_floor_cost(calldata))
    }
}

fn bool_capability<R: ForkRules + ?Sized>(
    rules: &R,
    capability: Capability,
    point: Option<ForkPoint>,
) -> Result<bool, ForkError> {
    let (fork, point) = rules.resolve(point);
    fork.evaluate(capability, point)?
        .as_bool()
        .ok_or_else(|| capability_type_error(&fork, capability))
}

fn version_capability<R: ForkRules + ?Sized>(
    rules: &R,
    capability: Capability,
    point: Option<ForkPoint>,
) -> Result<Option<u64>, ForkError> {
    let (fork, point) = rules.resolve(point);
    fork.evaluate(capability, point)?
        .as_version()
        .ok_or_else(|| capability_type_error(&fork, capability))
}

fn blob_params_of(fork: &Fork, point: ForkPoint) -> Result<Option<BlobParams>, ForkError> {
    fork.evaluate(Capability::BlobParams, point)?
        .as_blob_params()
        .ok_or_else(|| capability_type_error(fork, Capability::BlobParams))
}

impl ForkRules for Fork {
    fn name(&self) -> &str {
        Fork::name(self)
    }

    fn resolve(&self, point: Option<ForkPoint>) -> (Fork, ForkPoint) {
        (self.clone(), point.unwrap_or(ForkPoint::GENESIS))
    }
}
