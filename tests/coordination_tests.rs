//! Emergency override and green corridor coordination protocols

use traffic_control::control::{
    demo_definitions, CommandError, Controller, EventFilter, EventStatus, EventType, HoldOwner,
    IntersectionId, Network, Phase, Scheduler, EMERGENCY_HOLD_SECS,
};

fn network() -> Network {
    Network::new(&demo_definitions())
}

// --- emergency override ---

#[test]
fn test_emergency_forces_every_signal_to_red() {
    let mut net = network();

    assert!(net.activate_emergency());
    assert!(net.is_emergency_active());

    for intersection in net.intersections() {
        assert_eq!(intersection.phase, Phase::Red);
        assert_eq!(intersection.phase_remaining, EMERGENCY_HOLD_SECS);
        assert!(intersection.override_active());
    }
}

#[test]
fn test_emergency_rejects_non_red_manual_change() {
    let mut net = network();
    net.activate_emergency();

    let err = net
        .set_light(IntersectionId(1), Phase::Yellow, 10)
        .unwrap_err();
    assert!(matches!(err, CommandError::StateConflict(_)));

    // Red stays allowed and does not release the hold.
    net.set_light(IntersectionId(1), Phase::Red, 10).unwrap();
    let intersection = net.intersection(IntersectionId(1)).unwrap();
    assert_eq!(intersection.phase_remaining, 10);
    assert!(intersection.override_active());
}

#[test]
fn test_emergency_suspends_cycling() {
    let mut net = network();
    net.activate_emergency();

    for _ in 0..EMERGENCY_HOLD_SECS + 10 {
        net.step(false);
    }

    // Timers ran out long ago but no signal advanced past Red.
    for intersection in net.intersections() {
        assert_eq!(intersection.phase, Phase::Red);
        assert_eq!(intersection.phase_remaining, 0);
    }
}

#[test]
fn test_emergency_deactivation_restarts_from_green() {
    let mut net = network();
    let green = net.timing().green_secs;

    net.activate_emergency();
    for _ in 0..7 {
        net.step(false);
    }
    assert!(net.deactivate_emergency());

    for intersection in net.intersections() {
        assert_eq!(intersection.phase, Phase::Green);
        assert_eq!(intersection.phase_remaining, green);
        assert!(!intersection.override_active());
    }
    assert!(!net.is_emergency_active());
}

#[test]
fn test_emergency_activation_is_idempotent() {
    let mut net = network();

    assert!(net.activate_emergency());
    assert!(!net.activate_emergency());

    // Only the first activation is audited.
    let audits = net.query_events(&EventFilter {
        event_type: Some(EventType::Emergency),
        ..EventFilter::default()
    });
    assert_eq!(audits.len(), 1);

    assert!(net.deactivate_emergency());
    assert!(!net.deactivate_emergency());
}

#[test]
fn test_emergency_audit_event_is_resolved_on_release() {
    let mut net = network();
    net.activate_emergency();
    net.deactivate_emergency();

    let audits = net.query_events(&EventFilter {
        event_type: Some(EventType::Emergency),
        ..EventFilter::default()
    });
    assert_eq!(audits[0].status, EventStatus::Resolved);
}

#[test]
fn test_toggle_reports_new_state() {
    let mut net = network();
    assert!(net.toggle_emergency_override());
    assert!(net.is_emergency_active());
    assert!(!net.toggle_emergency_override());
    assert!(!net.is_emergency_active());
}

// --- green corridor ---

#[test]
fn test_corridor_rejects_degenerate_paths() {
    let mut net = network();

    let err = net.create_green_corridor(&[IntersectionId(1)]).unwrap_err();
    assert!(matches!(err, CommandError::Validation(_)));

    let err = net
        .create_green_corridor(&[IntersectionId(1), IntersectionId(1)])
        .unwrap_err();
    assert!(matches!(err, CommandError::Validation(_)));

    let err = net
        .create_green_corridor(&[IntersectionId(1), IntersectionId(2), IntersectionId(1)])
        .unwrap_err();
    assert!(matches!(err, CommandError::Validation(_)));

    let err = net
        .create_green_corridor(&[IntersectionId(1), IntersectionId(99)])
        .unwrap_err();
    assert!(matches!(err, CommandError::Validation(_)));
}

#[test]
fn test_corridor_reports_active_with_matching_endpoints() {
    let mut net = network();

    net.create_green_corridor(&[IntersectionId(1), IntersectionId(2)])
        .unwrap();

    let corridor = net.active_corridor().unwrap();
    assert_eq!(
        corridor.endpoints(),
        (IntersectionId(1), IntersectionId(2))
    );

    let snapshot = net.snapshot();
    let status = snapshot.corridor.unwrap();
    assert!(status.active);
    assert_eq!(
        status.intersections(),
        vec![IntersectionId(1), IntersectionId(2)]
    );
}

#[test]
fn test_corridor_wave_holds_and_releases_legs_in_order() {
    let mut net = network();
    let window = net.corridor_config().green_window_secs;

    net.create_green_corridor(&[IntersectionId(1), IntersectionId(2)])
        .unwrap();

    // Head leg is green immediately; the downstream leg waits out its
    // transit offset under a red hold.
    let head = net.intersection(IntersectionId(1)).unwrap();
    assert_eq!(head.phase, Phase::Green);
    assert_eq!(head.phase_remaining, window);
    assert_eq!(head.hold(), Some(HoldOwner::Corridor));

    let offset = net.active_corridor().unwrap().legs[1].offset_secs;
    assert!(offset > 0);
    let tail = net.intersection(IntersectionId(2)).unwrap();
    assert_eq!(tail.phase, Phase::Red);
    assert_eq!(tail.phase_remaining, offset);

    for _ in 0..offset {
        net.step(false);
    }

    let tail = net.intersection(IntersectionId(2)).unwrap();
    assert_eq!(tail.phase, Phase::Green);
    assert_eq!(tail.phase_remaining, window);
    assert_eq!(tail.hold(), Some(HoldOwner::Corridor));
}

#[test]
fn test_corridor_held_leg_stays_green_after_window() {
    let mut net = network();
    let window = net.corridor_config().green_window_secs;

    net.create_green_corridor(&[IntersectionId(1), IntersectionId(2)])
        .unwrap();

    for _ in 0..window + 20 {
        net.step(false);
    }

    // The head's window elapsed but the hold keeps it green until the
    // corridor is deactivated.
    let head = net.intersection(IntersectionId(1)).unwrap();
    assert_eq!(head.phase, Phase::Green);
}

#[test]
fn test_second_corridor_is_rejected_while_one_is_active() {
    let mut net = network();

    net.create_green_corridor(&[IntersectionId(1), IntersectionId(2)])
        .unwrap();
    let err = net
        .create_green_corridor(&[IntersectionId(3), IntersectionId(4)])
        .unwrap_err();
    assert!(matches!(err, CommandError::StateConflict(_)));
}

#[test]
fn test_manual_change_rejected_on_corridor_held_intersection() {
    let mut net = network();
    net.create_green_corridor(&[IntersectionId(1), IntersectionId(2)])
        .unwrap();

    let err = net
        .set_light(IntersectionId(2), Phase::Green, 10)
        .unwrap_err();
    assert!(matches!(err, CommandError::StateConflict(_)));

    // Intersections off the corridor are still free.
    net.set_light(IntersectionId(3), Phase::Red, 10).unwrap();
}

#[test]
fn test_corridor_rejected_during_emergency() {
    let mut net = network();
    net.activate_emergency();

    let err = net
        .create_green_corridor(&[IntersectionId(1), IntersectionId(2)])
        .unwrap_err();
    assert!(matches!(err, CommandError::StateConflict(_)));
}

#[test]
fn test_emergency_preempts_active_corridor() {
    let mut net = network();
    net.create_green_corridor(&[IntersectionId(1), IntersectionId(2)])
        .unwrap();

    net.activate_emergency();

    assert!(net.active_corridor().is_none());
    for intersection in net.intersections() {
        assert_eq!(intersection.phase, Phase::Red);
        assert_eq!(intersection.hold(), Some(HoldOwner::Emergency));
    }
}

#[test]
fn test_corridor_deactivation_restarts_legs_from_green() {
    let mut net = network();
    let green = net.timing().green_secs;

    net.create_green_corridor(&[IntersectionId(1), IntersectionId(2)])
        .unwrap();
    assert!(net.deactivate_green_corridor());
    assert!(!net.deactivate_green_corridor());

    for id in [IntersectionId(1), IntersectionId(2)] {
        let intersection = net.intersection(id).unwrap();
        assert_eq!(intersection.phase, Phase::Green);
        assert_eq!(intersection.phase_remaining, green);
        assert!(!intersection.override_active());
    }
    assert!(net.active_corridor().is_none());

    // A fresh corridor can be created once the first is released.
    net.create_green_corridor(&[IntersectionId(3), IntersectionId(4)])
        .unwrap();
}

// --- controller front end ---

#[test]
fn test_controller_serializes_ticks_and_commands() {
    let controller = Controller::new(network(), Scheduler::new(5));

    controller.tick(5);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.time, 5);

    controller
        .set_light(IntersectionId(1), Phase::Red, 20)
        .unwrap();
    let snapshot = controller.snapshot();
    let intersection = snapshot.intersection(IntersectionId(1)).unwrap();
    assert_eq!(intersection.phase, Phase::Red);
    assert_eq!(intersection.phase_remaining, 20);
}

#[test]
fn test_controller_snapshot_reflects_emergency_flag() {
    let controller = Controller::new(network(), Scheduler::default());

    assert!(controller.toggle_emergency_override());
    assert!(controller.snapshot().emergency_active);

    let err = controller
        .set_light(IntersectionId(2), Phase::Green, 10)
        .unwrap_err();
    assert!(matches!(err, CommandError::StateConflict(_)));

    assert!(!controller.toggle_emergency_override());
    assert!(!controller.snapshot().emergency_active);
}
