use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{
    capability::ForkPoint,
    fork::{ActivationKind, Fork, ForkRules},
    registry::{ForkRegistry, TransitionSpec},
};

/// Point at which a transition switches to its target fork.
/// The boundary itself already belongs to the target fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    Block(u64),
    Timestamp(u64),
}

impl Boundary {
    pub fn activation_kind(&self) -> ActivationKind {
        match self {
            Boundary::Block(_) => ActivationKind::Block,
            Boundary::Timestamp(_) => ActivationKind::Timestamp,
        }
    }

    pub fn is_reached(&self, point: ForkPoint) -> bool {
        match *self {
            Boundary::Block(block) => point.block_number >= block,
            Boundary::Timestamp(timestamp) => point.timestamp >= timestamp,
        }
    }

    /// The earliest point at which the boundary is reached.
    pub fn point(&self) -> ForkPoint {
        match *self {
            Boundary::Block(block) => ForkPoint::at_block(block),
            Boundary::Timestamp(timestamp) => ForkPoint::at_timestamp(timestamp),
        }
    }

    /// `BerlinToLondonAt5`, `ParisToShanghaiAtTime15k`
    pub fn transition_name(&self, from: &str, to: &str) -> String {
        let (prefix, value) = match *self {
            Boundary::Block(block) => ("At", block),
            Boundary::Timestamp(timestamp) => ("AtTime", timestamp),
        };
        if value != 0 && value % 1000 == 0 {
            format!("{from}To{to}{prefix}{}k", value / 1000)
        } else {
            format!("{from}To{to}{prefix}{value}")
        }
    }
}

/// A fork that behaves as `from` before its boundary and as `to` from the
/// boundary on.
///
/// Identity is the transition's own name. Ordering follows the `to` fork, so
/// a transition sorts right where its target fork does.
#[derive(Clone)]
pub struct TransitionFork {
    name: String,
    from: Fork,
    to: Fork,
    boundary: Boundary,
}

impl TransitionFork {
    pub(crate) fn from_spec(registry: &ForkRegistry, spec: &TransitionSpec) -> Self {
        Self {
            name: spec.name.clone(),
            from: registry.fork_at_rank(spec.from),
            to: registry.fork_at_rank(spec.to),
            boundary: spec.boundary,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transitions_from(&self) -> &Fork {
        &self.from
    }

    pub fn transitions_to(&self) -> &Fork {
        &self.to
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Key sorting transitions after plain forks of the same rank, then by name.
    pub fn sort_key(&self) -> (usize, u8, &str) {
        (self.to.rank(), 1, &self.name)
    }
}

impl ForkRules for TransitionFork {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, point: Option<ForkPoint>) -> (Fork, ForkPoint) {
        match point {
            None => (self.to.clone(), self.boundary.point()),
            Some(point) if self.boundary.is_reached(point) => (self.to.clone(), point),
            Some(point) => (self.from.clone(), point),
        }
    }
}

impl fmt::Debug for TransitionFork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransitionFork({})", self.name)
    }
}

impl fmt::Display for TransitionFork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq for TransitionFork {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TransitionFork {}

impl Hash for TransitionFork {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for TransitionFork {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TransitionFork {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to
            .rank()
            .cmp(&other.to.rank())
            .then_with(|| self.name.cmp(&other.name))
    }
}

// A transition never equals a plain fork, yet compares as `Equal` to its
// target fork: `T >= to` and `T <= to` both hold.
impl PartialEq<Fork> for TransitionFork {
    fn eq(&self, _other: &Fork) -> bool {
        false
    }
}

impl PartialOrd<Fork> for TransitionFork {
    fn partial_cmp(&self, other: &Fork) -> Option<Ordering> {
        Some(self.to.rank().cmp(&other.rank()))
    }
}

impl PartialEq<TransitionFork> for Fork {
    fn eq(&self, _other: &TransitionFork) -> bool {
        false
    }
}

impl PartialOrd<TransitionFork> for Fork {
    fn partial_cmp(&self, other: &TransitionFork) -> Option<Ordering> {
        Some(self.rank().cmp(&other.to.rank()))
    }
}

impl Serialize for TransitionFork {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for TransitionFork {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        ForkRegistry::mainline()
            .transition(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("Unknown transition fork: {name}")))
    }
}

/// Either a plain fork or a transition, as taken by test fillers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ForkSpec {
    Fork(Fork),
    Transition(TransitionFork),
}

impl ForkSpec {
    /// Rank used for comparisons: the fork's own, or the transition's target.
    pub fn rank(&self) -> usize {
        match self {
            ForkSpec::Fork(fork) => fork.rank(),
            ForkSpec::Transition(transition) => transition.to.rank(),
        }
    }

    /// Total order usable for sorting mixed lists. Plain forks come before
    /// transitions into them.
    pub fn sort_key(&self) -> (usize, u8, &str) {
        match self {
            ForkSpec::Fork(fork) => (fork.rank(), 0, fork.name()),
            ForkSpec::Transition(transition) => transition.sort_key(),
        }
    }

    pub fn as_fork(&self) -> Option<&Fork> {
        match self {
            ForkSpec::Fork(fork) => Some(fork),
            ForkSpec::Transition(_) => None,
        }
    }

    pub fn as_transition(&self) -> Option<&TransitionFork> {
        match self {
            ForkSpec::Fork(_) => None,
            ForkSpec::Transition(transition) => Some(transition),
        }
    }
}

impl PartialOrd for ForkSpec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (ForkSpec::Fork(a), ForkSpec::Fork(b)) => a.partial_cmp(b),
            (ForkSpec::Transition(a), ForkSpec::Transition(b)) => a.partial_cmp(b),
            (ForkSpec::Fork(a), ForkSpec::Transition(b)) => a.partial_cmp(b),
            (ForkSpec::Transition(a), ForkSpec::Fork(b)) => a.partial_cmp(b),
        }
    }
}

impl PartialEq<Fork> for ForkSpec {
    fn eq(&self, other: &Fork) -> bool {
        self.as_fork() == Some(other)
    }
}

impl PartialOrd<Fork> for ForkSpec {
    fn partial_cmp(&self, other: &Fork) -> Option<Ordering> {
        match self {
            ForkSpec::Fork(fork) => fork.partial_cmp(other),
            ForkSpec::Transition(transition) => transition.partial_cmp(other),
        }
    }
}

impl From<Fork> for ForkSpec {
    fn from(fork: Fork) -> Self {
        ForkSpec::Fork(fork)
    }
}

impl From<TransitionFork> for ForkSpec {
    fn from(transition: TransitionFork) -> Self {
        ForkSpec::Transition(transition)
    }
}

impl ForkRules for ForkSpec {
    fn name(&self) -> &str {
        match self {
            ForkSpec::Fork(fork) => Fork::name(fork),
            ForkSpec::Transition(transition) => &transition.name,
        }
    }

    fn resolve(&self, point: Option<ForkPoint>) -> (Fork, ForkPoint) {
        match self {
            ForkSpec::Fork(fork) => fork.resolve(point),
            ForkSpec::Transition(transition) => transition.resolve(point),
        }
    }
}

impl fmt::Display for ForkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ForkRules::name(self))
    }
}

impl Serialize for ForkSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(ForkRules::name(self))
    }
}

impl<'de> Deserialize<'de> for ForkSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        ForkRegistry::mainline()
            .spec_by_name(&name)
            .map_err(serde::de::Error::custom)
    }
}
