use std::{collections::HashMap, fmt, sync::Arc};

use ethereum_types::Address;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::{blob_schedule::BlobParams, gas::GasCosts};

/// Rules a fork can define or inherit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Name the external state transition tool knows the fork by.
    TransitionToolName,
    HeaderBaseFeeRequired,
    HeaderPrevRandaoRequired,
    HeaderZeroDifficultyRequired,
    HeaderWithdrawalsRequired,
    HeaderBlobGasUsedRequired,
    HeaderExcessBlobGasRequired,
    HeaderBeaconRootRequired,
    HeaderRequestsRequired,
    EngineNewPayloadVersion,
    EngineForkchoiceUpdatedVersion,
    EngineGetPayloadVersion,
    TxTypes,
    ContractCreatingTxTypes,
    Precompiles,
    GasCosts,
    BlobParams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityValue {
    Bool(bool),
    Version(Option<u64>),
    Name(String),
    TxTypes(Vec<u8>),
    Addresses(Vec<Address>),
    GasCosts(GasCosts),
    BlobParams(Option<BlobParams>),
}

impl CapabilityValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CapabilityValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// `Some(None)` means the capability is defined but unsupported at this fork.
    pub fn as_version(&self) -> Option<Option<u64>> {
        match self {
            CapabilityValue::Version(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            CapabilityValue::Name(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_tx_types(&self) -> Option<&[u8]> {
        match self {
            CapabilityValue::TxTypes(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_addresses(&self) -> Option<&[Address]> {
        match self {
            CapabilityValue::Addresses(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_gas_costs(&self) -> Option<&GasCosts> {
        match self {
            CapabilityValue::GasCosts(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_blob_params(&self) -> Option<Option<BlobParams>> {
        match self {
            CapabilityValue::BlobParams(value) => Some(*value),
            _ => None,
        }
    }
}

/// Point of the chain a capability is evaluated at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ForkPoint {
    pub block_number: u64,
    pub timestamp: u64,
}

impl ForkPoint {
    pub const GENESIS: ForkPoint = ForkPoint {
        block_number: 0,
        timestamp: 0,
    };

    pub const fn new(block_number: u64, timestamp: u64) -> Self {
        Self {
            block_number,
            timestamp,
        }
    }

    pub const fn at_block(block_number: u64) -> Self {
        Self::new(block_number, 0)
    }

    pub const fn at_timestamp(timestamp: u64) -> Self {
        Self::new(0, timestamp)
    }
}

/// A capability value as a function of the chain point.
pub type Rule = Arc<dyn Fn(ForkPoint) -> CapabilityValue + Send + Sync>;

pub fn constant(value: CapabilityValue) -> Rule {
    Arc::new(move |_| value.clone())
}

/// Per capability, the overrides registered by each fork in rank order.
///
/// A fork sees the last override made at or before its own rank.
#[derive(Clone, Default)]
pub struct CapabilityTable {
    overrides: HashMap<Capability, Vec<(usize, Rule)>>,
}

impl CapabilityTable {
    pub fn set(&mut self, capability: Capability, rank: usize, rule: Rule) {
        let overrides = self.overrides.entry(capability).or_default();
        let position = overrides.partition_point(|(r, _)| *r <= rank);
        if position > 0 && overrides[position - 1].0 == rank {
            overrides[position - 1].1 = rule;
        } else {
            overrides.insert(position, (rank, rule));
        }
    }

    pub fn resolve(&self, capability: Capability, rank: usize) -> Option<&Rule> {
        let overrides = self.overrides.get(&capability)?;
        let position = overrides.partition_point(|(r, _)| *r <= rank);
        position.checked_sub(1).map(|i| &overrides[i].1)
    }

    /// Whether the fork at `rank` itself overrides `capability`.
    pub fn overrides_at(&self, capability: Capability, rank: usize) -> bool {
        self.overrides
            .get(&capability)
            .is_some_and(|overrides| overrides.iter().any(|(r, _)| *r == rank))
    }
}

impl fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (capability, overrides) in &self.overrides {
            let ranks: Vec<usize> = overrides.iter().map(|(rank, _)| *rank).collect();
            map.entry(capability, &ranks);
        }
        map.finish()
    }
}
