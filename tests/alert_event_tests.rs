//! Alert engine determinism, alert lifecycle, and the event log

use traffic_control::control::{
    demo_definitions, evaluate, AlertCandidate, AlertConfig, AlertRule, CommandError, EventFilter,
    EventSpec, EventStatus, EventType, FeedError, GeoPosition, IncidentSource, Intersection,
    IntersectionDef, IntersectionId, Network, Phase, Severity, TrafficConfig,
};

fn intersection_with(phase: Phase, remaining: u32, vehicles: u32, pedestrian: bool) -> Intersection {
    let def = IntersectionDef {
        id: IntersectionId(7),
        name: "Test Square".to_string(),
        position: GeoPosition::new(20.29, 85.82),
        phase,
        phase_remaining: remaining,
        vehicle_count: vehicles,
        pedestrian_present: pedestrian,
    };
    Intersection::from_def(&def, &TrafficConfig::default())
}

// --- rule evaluation ---

#[test]
fn test_high_congestion_near_change_yields_ranked_alerts() {
    let config = AlertConfig::default();
    // 48 vehicles puts the congestion bucket at High.
    let intersection = intersection_with(Phase::Red, 3, 48, false);

    let candidates = evaluate(&config, &intersection);

    let congestion_rank = candidates
        .iter()
        .position(|c| c.rule == AlertRule::CongestionHigh)
        .expect("missing congestion alert");
    let imminent_rank = candidates
        .iter()
        .position(|c| c.rule == AlertRule::LightChangeImminent)
        .expect("missing imminent-change alert");
    assert!(congestion_rank < imminent_rank);
}

#[test]
fn test_evaluate_is_deterministic() {
    let config = AlertConfig::default();
    let intersection = intersection_with(Phase::Green, 4, 50, true);

    let first = evaluate(&config, &intersection);
    let second = evaluate(&config, &intersection);

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_pedestrian_on_green_fires_safety_alert() {
    let config = AlertConfig::default();
    let intersection = intersection_with(Phase::Green, 20, 10, true);

    let candidates = evaluate(&config, &intersection);
    assert!(candidates
        .iter()
        .any(|c| c.rule == AlertRule::PedestrianOnGreen && c.severity == Severity::High));

    // Same pedestrian on red is not a hazard.
    let intersection = intersection_with(Phase::Red, 20, 10, true);
    let candidates = evaluate(&config, &intersection);
    assert!(!candidates
        .iter()
        .any(|c| c.rule == AlertRule::PedestrianOnGreen));
}

#[test]
fn test_imminent_alert_requires_positive_remaining() {
    let config = AlertConfig::default();
    let intersection = intersection_with(Phase::Yellow, 0, 10, false);

    let candidates = evaluate(&config, &intersection);
    assert!(!candidates
        .iter()
        .any(|c| c.rule == AlertRule::LightChangeImminent));
}

#[test]
fn test_quiet_intersection_yields_no_alerts() {
    let config = AlertConfig::default();
    let intersection = intersection_with(Phase::Red, 20, 10, false);

    assert!(evaluate(&config, &intersection).is_empty());
}

// --- alert board lifecycle ---

#[test]
fn test_alerts_expire_after_condition_clears() {
    let mut network = Network::new(&demo_definitions());

    // Intersection 3 starts on Yellow with 5s left, so the first ticks
    // raise an imminent-change alert; once it cycles to Red the alert
    // must age out.
    network.step(false);
    assert!(network
        .alert_board()
        .for_intersection(IntersectionId(3))
        .iter()
        .any(|a| a.rule == AlertRule::LightChangeImminent));

    for _ in 0..10 {
        network.step(false);
    }
    assert!(!network
        .alert_board()
        .for_intersection(IntersectionId(3))
        .iter()
        .any(|a| a.rule == AlertRule::LightChangeImminent));
}

#[test]
fn test_acknowledge_removes_alert() {
    let mut network = Network::new(&demo_definitions());
    network.step(false);

    let id = network.alert_board().ranked()[0].id;
    network.acknowledge_alert(id).unwrap();
    assert!(network.alert_board().ranked().iter().all(|a| a.id != id));

    let err = network.acknowledge_alert(id).unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
}

#[test]
fn test_snapshot_alerts_are_severity_ordered() {
    let mut network = Network::new(&demo_definitions());
    for _ in 0..3 {
        network.step(false);
    }

    let snapshot = network.snapshot();
    let ranks: Vec<Severity> = snapshot.alerts.iter().map(|a| a.severity).collect();
    let mut sorted = ranks.clone();
    sorted.sort();
    assert_eq!(ranks, sorted);
}

// --- incident feed isolation ---

struct FlakyFeed;

impl IncidentSource for FlakyFeed {
    fn incidents(
        &mut self,
        intersection: &Intersection,
        _now: u64,
    ) -> Result<Vec<AlertCandidate>, FeedError> {
        if intersection.id == IntersectionId(1) {
            return Err(FeedError("malformed feed entry".to_string()));
        }
        Ok(vec![AlertCandidate {
            rule: AlertRule::Accident,
            severity: Severity::Critical,
            message: format!("Collision reported at {}", intersection.name),
        }])
    }
}

#[test]
fn test_feed_failure_is_isolated_per_intersection() {
    let mut network = Network::new(&demo_definitions());
    network.set_incident_source(Box::new(FlakyFeed));

    network.step(false);

    // Other intersections still got feed alerts.
    assert!(network
        .alert_board()
        .for_intersection(IntersectionId(2))
        .iter()
        .any(|a| a.rule == AlertRule::Accident));

    // The failing intersection still got its deterministic rule alerts:
    // it bootstraps with a pedestrian on a green light.
    assert!(network
        .alert_board()
        .for_intersection(IntersectionId(1))
        .iter()
        .any(|a| a.rule == AlertRule::PedestrianOnGreen));
}

// --- event log ---

fn accident_spec() -> EventSpec {
    EventSpec {
        event_type: EventType::Accident,
        title: "Vehicle Collision".to_string(),
        location: "North Gate & Ring Road".to_string(),
        severity: Severity::High,
        description: "Two-car collision blocking right lane".to_string(),
    }
}

fn construction_spec() -> EventSpec {
    EventSpec {
        event_type: EventType::Construction,
        title: "Scheduled Road Work".to_string(),
        location: "Jaydev Vihar service lane".to_string(),
        severity: Severity::Medium,
        description: "One lane closed for resurfacing".to_string(),
    }
}

#[test]
fn test_event_status_defaults_by_type() {
    let mut network = Network::new(&demo_definitions());

    let accident = network.add_event(accident_spec());
    let construction = network.add_event(construction_spec());

    assert_eq!(
        network.event_log().get(accident).unwrap().status,
        EventStatus::Active
    );
    assert_eq!(
        network.event_log().get(construction).unwrap().status,
        EventStatus::Scheduled
    );
}

#[test]
fn test_events_are_ordered_most_recent_first() {
    let mut network = Network::new(&demo_definitions());

    let first = network.add_event(accident_spec());
    let second = network.add_event(construction_spec());

    let events = network.event_log().events();
    assert_eq!(events[0].id, second);
    assert_eq!(events[1].id, first);
    assert!(second > first);
}

#[test]
fn test_resolve_event_is_idempotent() {
    let mut network = Network::new(&demo_definitions());
    let id = network.add_event(accident_spec());

    network.step(false);
    network.resolve_event(id).unwrap();
    let after_first = network.event_log().get(id).unwrap().clone();

    network.step(false);
    network.resolve_event(id).unwrap();
    let after_second = network.event_log().get(id).unwrap();

    assert_eq!(after_first.status, EventStatus::Resolved);
    assert_eq!(after_second.status, after_first.status);
    // The original resolution timestamp is kept.
    assert_eq!(after_second.resolved_at, after_first.resolved_at);
}

#[test]
fn test_resolve_unknown_event_is_not_found() {
    let mut network = Network::new(&demo_definitions());
    let err = network
        .resolve_event(traffic_control::control::EventId(404))
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
}

#[test]
fn test_activate_event_is_monotone() {
    let mut network = Network::new(&demo_definitions());
    let id = network.add_event(construction_spec());

    network.activate_event(id).unwrap();
    assert_eq!(
        network.event_log().get(id).unwrap().status,
        EventStatus::Active
    );

    // Re-activating is harmless; reviving a resolved event is not allowed.
    network.activate_event(id).unwrap();
    network.resolve_event(id).unwrap();
    let err = network.activate_event(id).unwrap_err();
    assert!(matches!(err, CommandError::StateConflict(_)));
}

#[test]
fn test_query_filters_by_status_type_and_location() {
    let mut network = Network::new(&demo_definitions());
    let accident = network.add_event(accident_spec());
    network.add_event(construction_spec());
    network.resolve_event(accident).unwrap();

    let resolved = network.query_events(&EventFilter {
        status: Some(EventStatus::Resolved),
        ..EventFilter::default()
    });
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, accident);

    let construction = network.query_events(&EventFilter {
        event_type: Some(EventType::Construction),
        ..EventFilter::default()
    });
    assert_eq!(construction.len(), 1);

    // Location match is a case-insensitive substring, correlating events
    // to intersections by name.
    let near_jaydev = network.query_events(&EventFilter {
        location_contains: Some("jaydev".to_string()),
        ..EventFilter::default()
    });
    assert_eq!(near_jaydev.len(), 1);
    assert_eq!(near_jaydev[0].event_type, EventType::Construction);
}
