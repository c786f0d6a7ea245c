use ethereum_types::Address;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    constants::{BEACON_ROOTS_ADDRESS, BEACON_ROOTS_CODE},
    types::{Account, Alloc},
};

use super::{
    blob_schedule::BlobParams,
    capability::{Capability, CapabilityValue},
    fork::{ActivationKind, ForkDefinition},
    gas::GasCosts,
    registry::{ForkRegistry, ForkRegistryBuilder},
    transition::Boundary,
};

/// Forks of the Ethereum mainnet, in activation order.
///
/// The discriminant is the fork's rank in [`ForkRegistry::mainline`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    AsRefStr,
    EnumIter,
)]
pub enum MainlineFork {
    Frontier = 0,
    Homestead = 1,
    Byzantium = 2,
    Constantinople = 3,
    ConstantinopleFix = 4,
    Istanbul = 5,
    MuirGlacier = 6,
    Berlin = 7,
    London = 8,
    ArrowGlacier = 9,
    GrayGlacier = 10,
    Paris = 11,
    Shanghai = 12,
    Cancun = 13,
    Prague = 14,
    Osaka = 15,
}

use MainlineFork::*;

pub const MAINLINE_FORKS: [MainlineFork; 16] = [
    Frontier,
    Homestead,
    Byzantium,
    Constantinople,
    ConstantinopleFix,
    Istanbul,
    MuirGlacier,
    Berlin,
    London,
    ArrowGlacier,
    GrayGlacier,
    Paris,
    Shanghai,
    Cancun,
    Prague,
    Osaka,
];

pub const LAST_DEPLOYED: MainlineFork = Prague;

/// Transitions filled by default: one per upgrade since Berlin, with
/// timestamp forks switching at 15k.
const TRANSITIONS: [(MainlineFork, MainlineFork, Boundary); 5] = [
    (Berlin, London, Boundary::Block(5)),
    (Paris, Shanghai, Boundary::Timestamp(15_000)),
    (Shanghai, Cancun, Boundary::Timestamp(15_000)),
    (Cancun, Prague, Boundary::Timestamp(15_000)),
    (Prague, Osaka, Boundary::Timestamp(15_000)),
];

impl MainlineFork {
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Glacier forks only delayed the difficulty bomb and are never tested on their own.
    pub fn is_ignored(self) -> bool {
        matches!(self, MuirGlacier | ArrowGlacier | GrayGlacier)
    }

    pub fn activation(self) -> ActivationKind {
        if self >= Shanghai {
            ActivationKind::Timestamp
        } else {
            ActivationKind::Block
        }
    }
}

fn precompiles(count: u64) -> CapabilityValue {
    CapabilityValue::Addresses((1..=count).map(Address::from_low_u64_be).collect())
}

fn definition(fork: MainlineFork) -> ForkDefinition {
    let definition = ForkDefinition::new(fork.as_ref()).activated_by(fork.activation());
    let definition = if fork.is_ignored() {
        definition.ignored()
    } else {
        definition
    };
    use Capability as C;
    use CapabilityValue as V;
    match fork {
        Frontier => definition
            .with(C::HeaderBaseFeeRequired, V::Bool(false))
            .with(C::HeaderPrevRandaoRequired, V::Bool(false))
            .with(C::HeaderZeroDifficultyRequired, V::Bool(false))
            .with(C::HeaderWithdrawalsRequired, V::Bool(false))
            .with(C::HeaderBlobGasUsedRequired, V::Bool(false))
            .with(C::HeaderExcessBlobGasRequired, V::Bool(false))
            .with(C::HeaderBeaconRootRequired, V::Bool(false))
            .with(C::HeaderRequestsRequired, V::Bool(false))
            .with(C::EngineNewPayloadVersion, V::Version(None))
            .with(C::EngineForkchoiceUpdatedVersion, V::Version(None))
            .with(C::EngineGetPayloadVersion, V::Version(None))
            .with(C::TxTypes, V::TxTypes(vec![0]))
            .with(C::ContractCreatingTxTypes, V::TxTypes(vec![0]))
            .with(C::Precompiles, precompiles(4))
            .with(C::GasCosts, V::GasCosts(GasCosts::FRONTIER))
            .with(C::BlobParams, V::BlobParams(None)),
        Homestead => definition.with(C::GasCosts, V::GasCosts(GasCosts::HOMESTEAD)),
        Byzantium => definition.with(C::Precompiles, precompiles(8)),
        Istanbul => definition
            .with(C::Precompiles, precompiles(9))
            .with(C::GasCosts, V::GasCosts(GasCosts::ISTANBUL)),
        Berlin => definition
            .with(C::TxTypes, V::TxTypes(vec![0, 1]))
            .with(C::ContractCreatingTxTypes, V::TxTypes(vec![0, 1]))
            .with(C::GasCosts, V::GasCosts(GasCosts::BERLIN)),
        London => definition
            .with(C::HeaderBaseFeeRequired, V::Bool(true))
            .with(C::TxTypes, V::TxTypes(vec![0, 1, 2]))
            .with(C::ContractCreatingTxTypes, V::TxTypes(vec![0, 1, 2])),
        Paris => definition
            .with(C::TransitionToolName, V::Name("Merge".to_string()))
            .with(C::HeaderPrevRandaoRequired, V::Bool(true))
            .with(C::HeaderZeroDifficultyRequired, V::Bool(true))
            .with(C::EngineNewPayloadVersion, V::Version(Some(1)))
            .with(C::EngineForkchoiceUpdatedVersion, V::Version(Some(1)))
            .with(C::EngineGetPayloadVersion, V::Version(Some(1))),
        Shanghai => definition
            .with(C::HeaderWithdrawalsRequired, V::Bool(true))
            .with(C::EngineNewPayloadVersion, V::Version(Some(2)))
            .with(C::EngineForkchoiceUpdatedVersion, V::Version(Some(2)))
            .with(C::EngineGetPayloadVersion, V::Version(Some(2))),
        Cancun => definition
            .with(C::HeaderBlobGasUsedRequired, V::Bool(true))
            .with(C::HeaderExcessBlobGasRequired, V::Bool(true))
            .with(C::HeaderBeaconRootRequired, V::Bool(true))
            .with(C::EngineNewPayloadVersion, V::Version(Some(3)))
            .with(C::EngineForkchoiceUpdatedVersion, V::Version(Some(3)))
            .with(C::EngineGetPayloadVersion, V::Version(Some(3)))
            .with(C::TxTypes, V::TxTypes(vec![0, 1, 2, 3]))
            .with(C::Precompiles, precompiles(10))
            .with(C::BlobParams, V::BlobParams(Some(BlobParams::CANCUN)))
            .pre_allocation(beacon_roots_alloc()),
        Prague => definition
            .with(C::HeaderRequestsRequired, V::Bool(true))
            .with(C::EngineNewPayloadVersion, V::Version(Some(4)))
            .with(C::EngineGetPayloadVersion, V::Version(Some(4)))
            .with(C::TxTypes, V::TxTypes(vec![0, 1, 2, 3, 4]))
            .with(C::Precompiles, precompiles(17))
            .with(C::GasCosts, V::GasCosts(GasCosts::PRAGUE))
            .with(C::BlobParams, V::BlobParams(Some(BlobParams::PRAGUE))),
        Constantinople | ConstantinopleFix | MuirGlacier | ArrowGlacier | GrayGlacier | Osaka => {
            definition
        }
    }
}

/// EIP-4788 beacon block root contract.
fn beacon_roots_alloc() -> Alloc {
    [(
        BEACON_ROOTS_ADDRESS,
        Account::default()
            .with_nonce(1)
            .with_code(BEACON_ROOTS_CODE.to_vec()),
    )]
    .into_iter()
    .collect()
}

pub(crate) fn builder() -> ForkRegistryBuilder {
    let mut builder = ForkRegistryBuilder::new();
    for fork in MAINLINE_FORKS {
        builder.push_fork(definition(fork));
    }
    for (from, to, boundary) in TRANSITIONS {
        builder.push_transition(from.rank(), to.rank(), boundary);
    }
    builder.set_last_deployed(LAST_DEPLOYED.rank());
    builder
}

pub(crate) fn registry() -> ForkRegistry {
    builder().build()
}
