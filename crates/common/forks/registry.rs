use std::{collections::HashMap, fmt, sync::Arc};

use lazy_static::lazy_static;
use tracing::{debug, warn};

use crate::types::Alloc;

use super::{
    capability::{Capability, CapabilityTable, CapabilityValue, Rule, constant},
    error::ForkError,
    fork::{ActivationKind, Fork, ForkDefinition},
    mainline,
    transition::{Boundary, ForkSpec, TransitionFork},
};

lazy_static! {
    static ref MAINLINE: ForkRegistry = mainline::registry();
}

#[derive(Debug)]
pub(crate) struct ForkEntry {
    pub(crate) name: String,
    pub(crate) activation: ActivationKind,
    pub(crate) ignored: bool,
    pub(crate) pre_allocation: Option<Alloc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransitionSpec {
    pub(crate) name: String,
    pub(crate) from: usize,
    pub(crate) to: usize,
    pub(crate) boundary: Boundary,
}

#[derive(Debug)]
pub(crate) struct RegistryInner {
    pub(crate) forks: Vec<ForkEntry>,
    pub(crate) capabilities: CapabilityTable,
    pub(crate) transitions: Vec<TransitionSpec>,
    pub(crate) last_deployed: usize,
    by_name: HashMap<String, usize>,
}

/// Immutable, ordered catalog of forks and the transitions between them.
///
/// Cloning is cheap: every clone and every [`Fork`] handed out share the
/// same catalog.
#[derive(Clone)]
pub struct ForkRegistry {
    inner: Arc<RegistryInner>,
}

impl fmt::Debug for ForkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForkRegistry")
            .field(
                "forks",
                &self.inner.forks.iter().map(|f| &f.name).collect::<Vec<_>>(),
            )
            .field("transitions", &self.inner.transitions.len())
            .finish_non_exhaustive()
    }
}

impl ForkRegistry {
    /// The Ethereum mainnet catalog, built on first use.
    pub fn mainline() -> ForkRegistry {
        MAINLINE.clone()
    }

    pub(crate) fn inner(&self) -> &RegistryInner {
        &self.inner
    }

    pub(crate) fn fork_at_rank(&self, rank: usize) -> Fork {
        Fork::new(self.clone(), rank)
    }

    pub fn fork(&self, name: impl AsRef<str>) -> Result<Fork, ForkError> {
        let name = name.as_ref();
        self.inner
            .by_name
            .get(name)
            .map(|rank| self.fork_at_rank(*rank))
            .ok_or_else(|| ForkError::UnknownFork(name.to_string()))
    }

    /// Every listed fork in activation order, development forks included.
    pub fn all_forks(&self) -> Vec<Fork> {
        self.listed(0..self.inner.forks.len())
    }

    /// Forks up to and including the last deployed one.
    pub fn deployed_forks(&self) -> Vec<Fork> {
        self.listed(0..self.inner.last_deployed + 1)
    }

    pub fn last_deployed(&self) -> Fork {
        self.fork_at_rank(self.inner.last_deployed)
    }

    /// Listed forks from `from` to `until`, both included. Empty when `from`
    /// comes after `until`.
    pub fn forks_from_until(&self, from: &Fork, until: &Fork) -> Vec<Fork> {
        if from.rank() > until.rank() {
            return Vec::new();
        }
        self.listed(from.rank()..until.rank() + 1)
    }

    /// Listed forks starting at `from`, optionally stopping at the last deployed fork.
    pub fn forks_from(&self, from: &Fork, deployed_only: bool) -> Vec<Fork> {
        let end = if deployed_only {
            self.inner.last_deployed + 1
        } else {
            self.inner.forks.len()
        };
        self.listed(from.rank()..end)
    }

    fn listed(&self, ranks: std::ops::Range<usize>) -> Vec<Fork> {
        ranks
            .filter(|rank| {
                self.inner
                    .forks
                    .get(*rank)
                    .is_some_and(|entry| !entry.ignored)
            })
            .map(|rank| self.fork_at_rank(rank))
            .collect()
    }

    pub fn transitions(&self) -> Vec<TransitionFork> {
        self.inner
            .transitions
            .iter()
            .map(|spec| TransitionFork::from_spec(self, spec))
            .collect()
    }

    pub fn transition(&self, name: &str) -> Option<TransitionFork> {
        self.inner
            .transitions
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| TransitionFork::from_spec(self, spec))
    }

    /// The transition going from `from` directly to `to`, if one is registered.
    pub fn transition_fork_from_to(&self, from: &Fork, to: &Fork) -> Option<TransitionFork> {
        self.inner
            .transitions
            .iter()
            .find(|spec| spec.from == from.rank() && spec.to == to.rank())
            .map(|spec| TransitionFork::from_spec(self, spec))
    }

    /// Every transition ending at `to`.
    pub fn transition_fork_to(&self, to: &Fork) -> Vec<TransitionFork> {
        self.inner
            .transitions
            .iter()
            .filter(|spec| spec.to == to.rank())
            .map(|spec| TransitionFork::from_spec(self, spec))
            .collect()
    }

    /// Looks a name up among forks first, then among transitions.
    pub fn spec_by_name(&self, name: &str) -> Result<ForkSpec, ForkError> {
        if let Ok(fork) = self.fork(name) {
            return Ok(ForkSpec::Fork(fork));
        }
        self.transition(name)
            .map(ForkSpec::Transition)
            .ok_or_else(|| ForkError::UnknownFork(name.to_string()))
    }
}

/// Assembles a [`ForkRegistry`].
///
/// Forks are appended in activation order, each inheriting every capability
/// of the previous one unless it overrides it.
#[derive(Debug, Default)]
pub struct ForkRegistryBuilder {
    forks: Vec<ForkEntry>,
    capabilities: CapabilityTable,
    transitions: Vec<TransitionSpec>,
    last_deployed: Option<usize>,
    by_name: HashMap<String, usize>,
}

impl ForkRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the mainline catalog, ready to be extended.
    pub fn mainline() -> Self {
        mainline::builder()
    }

    pub fn fork(mut self, definition: ForkDefinition) -> Result<Self, ForkError> {
        if self.by_name.contains_key(&definition.name) {
            return Err(ForkError::DuplicateFork(definition.name));
        }
        self.push_fork(definition);
        Ok(self)
    }

    pub(crate) fn push_fork(&mut self, definition: ForkDefinition) {
        let rank = self.forks.len();
        let ForkDefinition {
            name,
            activation,
            ignored,
            overrides,
            pre_allocation,
        } = definition;
        self.capabilities.set(
            Capability::TransitionToolName,
            rank,
            constant(CapabilityValue::Name(name.clone())),
        );
        for (capability, rule) in overrides {
            self.capabilities.set(capability, rank, rule);
        }
        self.by_name.insert(name.clone(), rank);
        self.forks.push(ForkEntry {
            name,
            activation,
            ignored,
            pre_allocation,
        });
    }

    pub fn transition_at_block(self, from: &str, to: &str, block: u64) -> Result<Self, ForkError> {
        self.transition(from, to, Boundary::Block(block))
    }

    pub fn transition_at_timestamp(
        self,
        from: &str,
        to: &str,
        timestamp: u64,
    ) -> Result<Self, ForkError> {
        self.transition(from, to, Boundary::Timestamp(timestamp))
    }

    /// Registers a transition under its conventional name, see [`Boundary::transition_name`].
    pub fn transition(self, from: &str, to: &str, boundary: Boundary) -> Result<Self, ForkError> {
        let name = boundary.transition_name(from, to);
        self.named_transition(name, from, to, boundary)
    }

    /// Registering the same transition twice is a no-op, reusing a name for
    /// different endpoints or boundary is an error.
    pub fn named_transition(
        mut self,
        name: impl Into<String>,
        from: &str,
        to: &str,
        boundary: Boundary,
    ) -> Result<Self, ForkError> {
        let name = name.into();
        let from_rank = self.rank_of(from)?;
        let to_rank = self.rank_of(to)?;
        let malformed = |reason: &str| ForkError::MalformedTransition {
            name: name.clone(),
            reason: reason.to_string(),
        };
        if to_rank <= from_rank {
            return Err(malformed("target fork must come after the source fork"));
        }
        if self.forks[to_rank].activation != boundary.activation_kind() {
            return Err(malformed(match boundary {
                Boundary::Block(_) => "target fork activates by timestamp",
                Boundary::Timestamp(_) => "target fork activates by block number",
            }));
        }
        let spec = TransitionSpec {
            name,
            from: from_rank,
            to: to_rank,
            boundary,
        };
        match self.transitions.iter().find(|t| t.name == spec.name) {
            Some(existing) if *existing == spec => {
                debug!(transition = %spec.name, "transition already registered");
            }
            Some(_) => {
                warn!(transition = %spec.name, "conflicting transition rejected");
                return Err(ForkError::DuplicateTransition(spec.name));
            }
            None => self.transitions.push(spec),
        }
        Ok(self)
    }

    /// Registers a transition between known-valid ranks.
    pub(crate) fn push_transition(&mut self, from: usize, to: usize, boundary: Boundary) {
        let name = boundary.transition_name(&self.forks[from].name, &self.forks[to].name);
        self.transitions.push(TransitionSpec {
            name,
            from,
            to,
            boundary,
        });
    }

    pub(crate) fn set_last_deployed(&mut self, rank: usize) {
        self.last_deployed = Some(rank);
    }

    fn rank_of(&self, name: &str) -> Result<usize, ForkError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ForkError::UnknownFork(name.to_string()))
    }

    pub fn last_deployed(mut self, name: &str) -> Result<Self, ForkError> {
        self.last_deployed = Some(self.rank_of(name)?);
        Ok(self)
    }

    /// Overrides a single capability of an already registered fork.
    pub fn override_capability(
        mut self,
        fork: &str,
        capability: Capability,
        rule: Rule,
    ) -> Result<Self, ForkError> {
        let rank = self.rank_of(fork)?;
        self.capabilities.set(capability, rank, rule);
        Ok(self)
    }

    /// Without an explicit cutoff every fork counts as deployed.
    pub fn build(self) -> ForkRegistry {
        let last_deployed = self
            .last_deployed
            .unwrap_or_else(|| self.forks.len().saturating_sub(1));
        debug!(
            forks = self.forks.len(),
            transitions = self.transitions.len(),
            "fork registry built"
        );
        ForkRegistry {
            inner: Arc::new(RegistryInner {
                forks: self.forks,
                capabilities: self.capabilities,
                transitions: self.transitions,
                last_deployed,
                by_name: self.by_name,
            }),
        }
    }
}
