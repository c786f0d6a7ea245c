use forkline_common::forks::{
    BlobParams, Boundary, ForkPoint, ForkRegistry, ForkRegistryBuilder, ForkRules,
};

fn transition(name: &str) -> forkline_common::forks::TransitionFork {
    ForkRegistry::mainline().transition(name).unwrap()
}

#[test]
fn mainline_transitions() {
    let names: Vec<String> = ForkRegistry::mainline()
        .transitions()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(
        names,
        [
            "BerlinToLondonAt5",
            "ParisToShanghaiAtTime15k",
            "ShanghaiToCancunAtTime15k",
            "CancunToPragueAtTime15k",
            "PragueToOsakaAtTime15k",
        ]
    );
}

#[test]
fn block_boundary_is_inclusive() {
    let berlin_to_london = transition("BerlinToLondonAt5");
    assert_eq!(berlin_to_london.fork_at(4, 0).name(), "Berlin");
    assert_eq!(berlin_to_london.fork_at(5, 0).name(), "London");
    assert_eq!(berlin_to_london.boundary(), Boundary::Block(5));
    assert!(
        !berlin_to_london
            .header_base_fee_required(Some(ForkPoint::at_block(4)))
            .unwrap()
    );
    assert!(
        berlin_to_london
            .header_base_fee_required(Some(ForkPoint::at_block(5)))
            .unwrap()
    );
}

#[test]
fn timestamp_boundary_ignores_block_number() {
    let shanghai_to_cancun = transition("ShanghaiToCancunAtTime15k");
    assert_eq!(shanghai_to_cancun.fork_at(1_000_000, 14_999).name(), "Shanghai");
    assert_eq!(shanghai_to_cancun.fork_at(0, 15_000).name(), "Cancun");
}

#[test]
fn no_point_resolves_to_target_at_boundary() {
    let cancun_to_prague = transition("CancunToPragueAtTime15k");
    let (fork, point) = cancun_to_prague.resolve(None);
    assert_eq!(fork.name(), "Prague");
    assert_eq!(point, ForkPoint::at_timestamp(15_000));
    assert!(cancun_to_prague.header_requests_required(None).unwrap());
    assert_eq!(
        cancun_to_prague.blob_params(None).unwrap(),
        Some(BlobParams::PRAGUE)
    );
    assert_eq!(
        cancun_to_prague
            .blob_params(Some(ForkPoint::at_timestamp(14_999)))
            .unwrap(),
        Some(BlobParams::CANCUN)
    );
}

#[test]
fn endpoints() {
    let paris_to_shanghai = transition("ParisToShanghaiAtTime15k");
    assert_eq!(paris_to_shanghai.transitions_from().name(), "Paris");
    assert_eq!(paris_to_shanghai.transitions_to().name(), "Shanghai");
}

#[test]
fn transition_lookup_by_endpoints() {
    let registry = ForkRegistry::mainline();
    let shanghai = registry.fork("Shanghai").unwrap();
    let cancun = registry.fork("Cancun").unwrap();
    let berlin = registry.fork("Berlin").unwrap();
    assert_eq!(
        registry
            .transition_fork_from_to(&shanghai, &cancun)
            .map(|t| t.name().to_string()),
        Some("ShanghaiToCancunAtTime15k".to_string())
    );
    assert!(registry.transition_fork_from_to(&berlin, &cancun).is_none());
    assert_eq!(registry.transition_fork_to(&cancun).len(), 1);
    assert!(registry.transition_fork_to(&berlin).is_empty());
}

#[test]
fn transitions_may_skip_forks() {
    let registry = ForkRegistryBuilder::mainline()
        .transition_at_timestamp("Paris", "Cancun", 20_000)
        .unwrap()
        .build();
    let paris_to_cancun = registry.transition("ParisToCancunAtTime20k").unwrap();
    assert_eq!(paris_to_cancun.fork_at(0, 19_999).name(), "Paris");
    assert_eq!(paris_to_cancun.fork_at(0, 20_000).name(), "Cancun");
    assert_eq!(
        registry.transition_fork_to(&registry.fork("Cancun").unwrap()).len(),
        2
    );
}

#[test]
fn unrounded_boundaries_keep_full_number() {
    let registry = ForkRegistryBuilder::mainline()
        .transition_at_block("London", "Paris", 1_500)
        .unwrap()
        .build();
    assert!(registry.transition("LondonToParisAt1500").is_some());
}
