use ethereum_types::Address;
use forkline_common::forks::{
    ActivationKind, Capability, CapabilityValue, Fork, ForkDefinition, ForkError, ForkPoint,
    ForkRegistry, ForkRegistryBuilder, ForkRules, MAINLINE_FORKS, MainlineFork, constant,
};
use lazy_static::lazy_static;
use std::sync::Arc;

lazy_static! {
    /// Three forks where `Two` switches its tx types on at timestamp 100.
    static ref CUSTOM: ForkRegistry = ForkRegistryBuilder::new()
        .fork(
            ForkDefinition::new("One")
                .with(Capability::TxTypes, CapabilityValue::TxTypes(vec![0]))
                .with(Capability::HeaderBaseFeeRequired, CapabilityValue::Bool(false)),
        )
        .unwrap()
        .fork(
            ForkDefinition::new("Two")
                .activated_by(ActivationKind::Timestamp)
                .with_rule(
                    Capability::TxTypes,
                    Arc::new(|point: ForkPoint| {
                        if point.timestamp >= 100 {
                            CapabilityValue::TxTypes(vec![0, 1])
                        } else {
                            CapabilityValue::TxTypes(vec![0])
                        }
                    }),
                ),
        )
        .unwrap()
        .fork(ForkDefinition::new("Three").activated_by(ActivationKind::Timestamp))
        .unwrap()
        .last_deployed("Two")
        .unwrap()
        .build();
}

fn names(forks: &[Fork]) -> Vec<&str> {
    forks.iter().map(Fork::name).collect()
}

fn mainline(name: &str) -> Fork {
    ForkRegistry::mainline().fork(name).unwrap()
}

#[test]
fn mainline_listing_skips_glacier_forks() {
    let registry = ForkRegistry::mainline();
    assert_eq!(
        names(&registry.all_forks()),
        [
            "Frontier",
            "Homestead",
            "Byzantium",
            "Constantinople",
            "ConstantinopleFix",
            "Istanbul",
            "Berlin",
            "London",
            "Paris",
            "Shanghai",
            "Cancun",
            "Prague",
            "Osaka",
        ]
    );
    assert!(registry.fork("MuirGlacier").unwrap().is_ignored());
    assert_eq!(registry.last_deployed().name(), "Prague");
    assert_eq!(
        registry.deployed_forks().last().map(Fork::name),
        Some("Prague")
    );
    assert!(!mainline("Osaka").is_deployed());
}

#[test]
fn ranks_follow_mainline_enum() {
    for fork in MAINLINE_FORKS {
        assert_eq!(mainline(fork.as_ref()).rank(), fork.rank());
    }
    assert_eq!(mainline("Paris").parent().unwrap().name(), "GrayGlacier");
    assert!(mainline("Frontier").parent().is_none());
    assert_eq!(
        mainline("Shanghai").activation(),
        MainlineFork::Shanghai.activation()
    );
}

#[test]
fn fork_ranges() {
    let registry = ForkRegistry::mainline();
    let berlin = mainline("Berlin");
    let cancun = mainline("Cancun");
    assert_eq!(
        names(&registry.forks_from_until(&berlin, &cancun)),
        ["Berlin", "London", "Paris", "Shanghai", "Cancun"]
    );
    assert!(registry.forks_from_until(&cancun, &berlin).is_empty());
    assert_eq!(names(&registry.forks_from(&cancun, true)), ["Cancun", "Prague"]);
    assert_eq!(
        names(&registry.forks_from(&cancun, false)),
        ["Cancun", "Prague", "Osaka"]
    );
}

#[test]
fn unknown_fork() {
    assert_eq!(
        ForkRegistry::mainline().fork("Constantinopel").unwrap_err(),
        ForkError::UnknownFork("Constantinopel".into())
    );
}

#[test]
fn header_requirements() {
    let london = mainline("London");
    let paris = mainline("Paris");
    let cancun = mainline("Cancun");
    let prague = mainline("Prague");

    assert!(!mainline("Berlin").header_base_fee_required(None).unwrap());
    assert!(london.header_base_fee_required(None).unwrap());
    assert!(!london.header_prev_randao_required(None).unwrap());
    assert!(paris.header_prev_randao_required(None).unwrap());
    assert!(paris.header_zero_difficulty_required(None).unwrap());
    assert!(!paris.header_withdrawals_required(None).unwrap());
    assert!(mainline("Shanghai").header_withdrawals_required(None).unwrap());
    assert!(cancun.header_blob_gas_used_required(None).unwrap());
    assert!(cancun.header_excess_blob_gas_required(None).unwrap());
    assert!(cancun.header_beacon_root_required(None).unwrap());
    assert!(!cancun.header_requests_required(None).unwrap());
    assert!(prague.header_requests_required(None).unwrap());
}

#[test]
fn engine_api_versions() {
    let london = mainline("London");
    assert_eq!(london.engine_new_payload_version(None).unwrap(), None);
    assert_eq!(mainline("Paris").engine_new_payload_version(None).unwrap(), Some(1));
    let cancun = mainline("Cancun");
    assert_eq!(cancun.engine_new_payload_version(None).unwrap(), Some(3));
    assert_eq!(cancun.engine_forkchoice_updated_version(None).unwrap(), Some(3));
    let prague = mainline("Prague");
    assert_eq!(prague.engine_new_payload_version(None).unwrap(), Some(4));
    assert_eq!(prague.engine_forkchoice_updated_version(None).unwrap(), Some(3));
    assert_eq!(prague.engine_get_payload_version(None).unwrap(), Some(4));
}

#[test]
fn transaction_types_and_precompiles() {
    assert_eq!(mainline("Frontier").tx_types(None).unwrap(), [0]);
    assert_eq!(mainline("Berlin").tx_types(None).unwrap(), [0, 1]);
    assert_eq!(mainline("Cancun").tx_types(None).unwrap(), [0, 1, 2, 3]);
    assert_eq!(mainline("Prague").tx_types(None).unwrap(), [0, 1, 2, 3, 4]);
    assert_eq!(
        mainline("Prague").contract_creating_tx_types(None).unwrap(),
        [0, 1, 2]
    );

    let precompiles = mainline("Byzantium").precompiles(None).unwrap();
    assert_eq!(precompiles.len(), 8);
    assert_eq!(precompiles[0], Address::from_low_u64_be(1));
    assert_eq!(mainline("Cancun").precompiles(None).unwrap().len(), 10);
    assert_eq!(mainline("Prague").precompiles(None).unwrap().len(), 17);
}

#[test]
fn transition_tool_names() {
    assert_eq!(mainline("Paris").transition_tool_name(None).unwrap(), "Merge");
    assert_eq!(
        mainline("Shanghai").transition_tool_name(None).unwrap(),
        "Shanghai"
    );
    assert_eq!(
        mainline("ArrowGlacier").transition_tool_name(None).unwrap(),
        "ArrowGlacier"
    );
}

#[test]
fn capability_by_name() {
    let cancun = mainline("Cancun");
    assert_eq!(
        cancun.capability_by_name("header_beacon_root_required", None),
        Ok(CapabilityValue::Bool(true))
    );
    assert_eq!(
        cancun.capability_by_name("header_gas_used_required", None),
        Err(ForkError::UnknownCapability {
            fork: "Cancun".into(),
            capability: "header_gas_used_required".into(),
        })
    );
}

#[test]
fn custom_registry_rules_depend_on_the_point() {
    let two = CUSTOM.fork("Two").unwrap();
    assert_eq!(two.tx_types(None).unwrap(), [0]);
    assert_eq!(
        two.tx_types(Some(ForkPoint::at_timestamp(100))).unwrap(),
        [0, 1]
    );
    let three = CUSTOM.fork("Three").unwrap();
    assert_eq!(
        three.tx_types(Some(ForkPoint::at_timestamp(150))).unwrap(),
        [0, 1]
    );
    assert!(!three.header_base_fee_required(None).unwrap());
    assert_eq!(CUSTOM.last_deployed().name(), "Two");
    assert_eq!(names(&CUSTOM.deployed_forks()), ["One", "Two"]);
}

#[test]
fn undefined_capability_is_an_error() {
    let one = CUSTOM.fork("One").unwrap();
    assert!(matches!(
        one.gas_costs(None),
        Err(ForkError::UnknownCapability { .. })
    ));
}

#[test]
fn mistyped_capability_is_a_config_error() {
    let registry = ForkRegistryBuilder::new()
        .fork(ForkDefinition::new("Only").with(
            Capability::HeaderBaseFeeRequired,
            CapabilityValue::Version(Some(1)),
        ))
        .unwrap()
        .build();
    let only = registry.fork("Only").unwrap();
    assert!(matches!(
        only.header_base_fee_required(None),
        Err(ForkError::Config(_))
    ));
}

#[test]
fn override_capability_on_mainline() {
    let registry = ForkRegistryBuilder::mainline()
        .override_capability(
            "Shanghai",
            Capability::TxTypes,
            constant(CapabilityValue::TxTypes(vec![0, 1, 2, 3])),
        )
        .unwrap()
        .build();
    let shanghai = registry.fork("Shanghai").unwrap();
    assert_eq!(shanghai.tx_types(None).unwrap(), [0, 1, 2, 3]);
    assert_eq!(
        registry.fork("Paris").unwrap().tx_types(None).unwrap(),
        [0, 1, 2]
    );
    assert_eq!(mainline("Shanghai").tx_types(None).unwrap(), [0, 1, 2]);
}
