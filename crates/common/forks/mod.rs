//! Fork catalog and capability resolution.
//!
//! A [`ForkRegistry`] holds forks in activation order. Every fork inherits the
//! capabilities of the previous one and overrides only what it changes, so a
//! lookup walks back to the closest fork that defines the capability.
//! [`TransitionFork`]s switch from one fork to the next at a block number or
//! timestamp and answer every query through [`ForkRules`] like a plain fork.
mod blob_schedule;
mod capability;
mod config;
mod error;
mod fork;
mod gas;
mod mainline;
mod registry;
mod transition;

pub use blob_schedule::{BlobParams, BlobSchedule};
pub use capability::{Capability, CapabilityTable, CapabilityValue, ForkPoint, Rule, constant};
pub use config::{RegistryConfig, TransitionConfig};
pub use error::ForkError;
pub use fork::{ActivationKind, Fork, ForkDefinition, ForkRules};
pub use gas::{GasCosts, IntrinsicCostInput};
pub use mainline::{LAST_DEPLOYED, MAINLINE_FORKS, MainlineFork};
pub use registry::{ForkRegistry, ForkRegistryBuilder};
pub use transition::{Boundary, ForkSpec, TransitionFork};
