//! The traffic network: registry, coordinators, and command surface
//!
//! `Network` owns every intersection plus the traffic model, alert engine,
//! event log, and the two coordination protocols (network-wide emergency
//! override and green corridors). All mutation goes through `step()` and
//! the explicit command methods; collaborators read versioned snapshots.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use super::alerts::{AlertBoard, AlertConfig, AlertEngine};
use super::corridor::{plan_legs, CorridorConfig, GreenCorridor};
use super::error::CommandError;
use super::events::{EventFilter, EventLog, EventSpec, EventStatus, EventType};
use super::feed::IncidentSource;
use super::intersection::{demo_definitions, Intersection, IntersectionDef, SignalTiming};
use super::snapshot::{CorridorSnapshot, IntersectionSnapshot, NetworkSnapshot};
use super::traffic::{TrafficConfig, TrafficModel};
use super::types::{AlertId, CorridorId, EventId, HoldOwner, IntersectionId, Phase, Severity};

/// Hold countdown applied to every signal by the emergency override. Holds
/// never auto-advance, so this only has to be long enough to read sensibly
/// on a dashboard.
pub const EMERGENCY_HOLD_SECS: u32 = 600;

/// The whole simulated network
pub struct Network {
    /// Registry of all intersections, keyed and iterated in id order
    intersections: BTreeMap<IntersectionId, Intersection>,
    timing: SignalTiming,
    traffic: TrafficModel,
    engine: AlertEngine,
    board: AlertBoard,
    events: EventLog,
    corridor_config: CorridorConfig,
    /// The single active corridor, if any (creation rejects a second)
    corridor: Option<GreenCorridor>,
    next_corridor_id: u64,
    /// Audit event of the active emergency override; None when inactive
    emergency: Option<EventId>,
    /// Simulated time in ticks
    time: u64,
    /// Snapshot revision; bumped on every tick and successful command
    revision: u64,
}

impl Network {
    pub fn new(defs: &[IntersectionDef]) -> Self {
        Self::new_internal(defs, TrafficModel::new(TrafficConfig::default()))
    }

    /// Create a network with a seeded traffic model for reproducible runs
    pub fn with_seed(defs: &[IntersectionDef], seed: u64) -> Self {
        Self::new_internal(defs, TrafficModel::with_seed(TrafficConfig::default(), seed))
    }

    fn new_internal(defs: &[IntersectionDef], traffic: TrafficModel) -> Self {
        let mut intersections = BTreeMap::new();
        for def in defs {
            intersections.insert(def.id, Intersection::from_def(def, traffic.config()));
        }
        Self {
            intersections,
            timing: SignalTiming::default(),
            traffic,
            engine: AlertEngine::new(AlertConfig::default()),
            board: AlertBoard::new(),
            events: EventLog::new(),
            corridor_config: CorridorConfig::default(),
            corridor: None,
            next_corridor_id: 0,
            emergency: None,
            time: 0,
            revision: 0,
        }
    }

    /// The demo city network, pre-populated with the bootstrap incident log
    pub fn create_demo_network() -> Self {
        Self::seed_demo_events(Self::new(&demo_definitions()))
    }

    /// Demo network with a seeded traffic model
    pub fn create_demo_network_with_seed(seed: u64) -> Self {
        Self::seed_demo_events(Self::with_seed(&demo_definitions(), seed))
    }

    fn seed_demo_events(mut network: Network) -> Network {
        let now = network.time;
        network.events.add(
            EventSpec {
                event_type: EventType::Accident,
                title: "Vehicle Collision".to_string(),
                location: "Janpath Road & Master Canteen Square".to_string(),
                severity: Severity::High,
                description: "Two-car collision blocking right lane".to_string(),
            },
            now,
        );
        network.events.add(
            EventSpec {
                event_type: EventType::Construction,
                title: "Scheduled Road Work".to_string(),
                location: "Jaydev Vihar between Rasulgarh and Vani Vihar".to_string(),
                severity: Severity::Medium,
                description: "Water pipe replacement, one lane closed".to_string(),
            },
            now,
        );
        network.events.add(
            EventSpec {
                event_type: EventType::Emergency,
                title: "Ambulance Route".to_string(),
                location: "From AMRI Hospital to Capital Hospital".to_string(),
                severity: Severity::High,
                description: "Emergency vehicle en route - prioritize signals".to_string(),
            },
            now,
        );
        network
    }

    /// Replace the alert engine's external incident source
    pub fn set_incident_source(&mut self, feed: Box<dyn IncidentSource + Send>) {
        self.engine.set_incident_source(feed);
    }

    // --- tick ---

    /// Advance the network by one time unit.
    ///
    /// Every step drives the signal timers and the corridor wave; the
    /// traffic model runs only when the scheduler says its coarser period
    /// is due. Alert evaluation always follows, against the updated state.
    pub fn step(&mut self, run_traffic: bool) {
        self.time += 1;
        self.tick_signals();
        self.advance_corridor_wave();
        if run_traffic {
            self.tick_traffic();
        }
        self.refresh_alerts();
        self.revision += 1;
    }

    fn tick_signals(&mut self) {
        for intersection in self.intersections.values_mut() {
            if let Some(next) = intersection.tick_signal(&self.timing) {
                debug!("{} cycled to {next}", intersection.name);
            }
        }
    }

    /// Flip corridor legs to Green as the wave reaches them. A leg's Red
    /// hold carries its offset as the countdown; once it hits zero the leg
    /// goes Green for the configured window and stays held.
    fn advance_corridor_wave(&mut self) {
        let Some(corridor) = &self.corridor else {
            return;
        };
        let window = self.corridor_config.green_window_secs;
        let due: Vec<IntersectionId> = corridor
            .legs
            .iter()
            .map(|leg| leg.intersection)
            .filter(|id| {
                matches!(
                    self.intersections.get(id),
                    Some(ix) if ix.phase == Phase::Red
                        && ix.phase_remaining == 0
                        && ix.hold() == Some(HoldOwner::Corridor)
                )
            })
            .collect();
        for id in due {
            if let Some(intersection) = self.intersections.get_mut(&id) {
                intersection.apply_light(Phase::Green, window);
                debug!("green wave reached {}", intersection.name);
            }
        }
    }

    fn tick_traffic(&mut self) {
        for intersection in self.intersections.values_mut() {
            self.traffic.tick(intersection);
        }
    }

    fn refresh_alerts(&mut self) {
        let now = self.time;
        for intersection in self.intersections.values() {
            let candidates = self.engine.evaluate_intersection(intersection, now);
            self.board
                .absorb(self.engine.config(), intersection.id, candidates, now);
        }
        self.board.expire(now);
    }

    // --- operator commands ---

    /// Manually set one signal's phase and countdown.
    ///
    /// Rejected while the emergency override is active unless the request
    /// is Red, and always rejected on a corridor-held intersection; a
    /// successful change is recorded as a Control event.
    pub fn set_light(
        &mut self,
        id: IntersectionId,
        phase: Phase,
        duration: u32,
    ) -> Result<(), CommandError> {
        if duration == 0 {
            return Err(CommandError::validation("light duration must be positive"));
        }
        let emergency_active = self.emergency.is_some();
        let intersection = self
            .intersections
            .get_mut(&id)
            .ok_or_else(|| CommandError::validation(format!("unknown intersection {id}")))?;
        if emergency_active && phase != Phase::Red {
            return Err(CommandError::state_conflict(format!(
                "emergency override active; {} may only be set to Red",
                intersection.name
            )));
        }
        if intersection.hold() == Some(HoldOwner::Corridor) {
            return Err(CommandError::state_conflict(format!(
                "{} is held by an active green corridor",
                intersection.name
            )));
        }
        intersection.apply_light(phase, duration);
        let name = intersection.name.clone();
        info!("light at {name} set to {phase} for {duration}s");
        self.events.add(
            EventSpec {
                event_type: EventType::Control,
                title: format!("Light changed to {phase}"),
                location: name,
                severity: Severity::Low,
                description: format!("Manual override: traffic light set to {phase} for {duration}s"),
            },
            self.time,
        );
        self.revision += 1;
        Ok(())
    }

    // --- emergency override coordinator ---

    pub fn is_emergency_active(&self) -> bool {
        self.emergency.is_some()
    }

    /// Activate the network-wide emergency override: every signal goes Red
    /// under an Emergency hold. Idempotent; only the inactive-to-active
    /// edge emits the audit event. An active corridor is released first,
    /// since the two protocols may not share an intersection.
    pub fn activate_emergency(&mut self) -> bool {
        if self.emergency.is_some() {
            return false;
        }
        if self.corridor.is_some() {
            self.deactivate_green_corridor();
        }
        for intersection in self.intersections.values_mut() {
            intersection.apply_light(Phase::Red, EMERGENCY_HOLD_SECS);
            intersection.set_hold(HoldOwner::Emergency);
        }
        let event = self.events.add(
            EventSpec {
                event_type: EventType::Emergency,
                title: "Emergency override activated".to_string(),
                location: "All intersections".to_string(),
                severity: Severity::Critical,
                description: format!(
                    "All signals forced to Red with a {EMERGENCY_HOLD_SECS}s hold"
                ),
            },
            self.time,
        );
        self.emergency = Some(event);
        warn!("emergency override activated; all signals forced to Red");
        self.revision += 1;
        true
    }

    /// Deactivate the override: every signal restarts from Green with the
    /// default duration. Idempotent; resolves the activation event and
    /// logs the release.
    pub fn deactivate_emergency(&mut self) -> bool {
        let Some(event) = self.emergency.take() else {
            return false;
        };
        let green = self.timing.green_secs;
        for intersection in self.intersections.values_mut() {
            intersection.clear_hold();
            intersection.apply_light(Phase::Green, green);
        }
        // The id was issued by this log, so resolve cannot miss.
        let _ = self.events.resolve(event, self.time);
        self.events.add(
            EventSpec {
                event_type: EventType::Control,
                title: "Emergency override lifted".to_string(),
                location: "All intersections".to_string(),
                severity: Severity::Low,
                description: "All signals resumed cycling from Green".to_string(),
            },
            self.time,
        );
        info!("emergency override lifted; signals restart from Green");
        self.revision += 1;
        true
    }

    /// Flip the override and return the new state
    pub fn toggle_emergency_override(&mut self) -> bool {
        if self.is_emergency_active() {
            self.deactivate_emergency();
            false
        } else {
            self.activate_emergency();
            true
        }
    }

    // --- green corridor coordinator ---

    pub fn active_corridor(&self) -> Option<&GreenCorridor> {
        self.corridor.as_ref()
    }

    /// Sequence a green corridor along the given path.
    ///
    /// The head leg goes Green immediately; each later leg is held Red for
    /// its cumulative transit offset and flipped Green by the wave. At
    /// most one corridor is active at a time; a second request is rejected
    /// rather than queued or replacing the first.
    pub fn create_green_corridor(
        &mut self,
        ids: &[IntersectionId],
    ) -> Result<CorridorId, CommandError> {
        if ids.len() < 2 {
            return Err(CommandError::validation(
                "a green corridor needs at least two intersections",
            ));
        }
        if ids.first() == ids.last() {
            return Err(CommandError::validation(
                "corridor start and end must differ",
            ));
        }
        for (index, id) in ids.iter().enumerate() {
            if ids[..index].contains(id) {
                return Err(CommandError::validation(format!(
                    "duplicate intersection {id} in corridor path"
                )));
            }
        }
        let mut path = Vec::with_capacity(ids.len());
        for id in ids {
            let intersection = self
                .intersections
                .get(id)
                .ok_or_else(|| CommandError::validation(format!("unknown intersection {id}")))?;
            path.push((*id, intersection.position));
        }
        if self.emergency.is_some() {
            return Err(CommandError::state_conflict(
                "emergency override active; corridors are suspended",
            ));
        }
        if self.corridor.is_some() {
            return Err(CommandError::state_conflict(
                "a green corridor is already active",
            ));
        }

        let legs = plan_legs(&self.corridor_config, &path);
        let window = self.corridor_config.green_window_secs;
        for leg in &legs {
            if let Some(intersection) = self.intersections.get_mut(&leg.intersection) {
                if leg.offset_secs == 0 {
                    intersection.apply_light(Phase::Green, window);
                } else {
                    intersection.apply_light(Phase::Red, leg.offset_secs);
                }
                intersection.set_hold(HoldOwner::Corridor);
            }
        }

        self.next_corridor_id += 1;
        let corridor_id = CorridorId(self.next_corridor_id);
        let start_name = self.name_of(ids[0]);
        let end_name = self.name_of(ids[ids.len() - 1]);
        let event = self.events.add(
            EventSpec {
                event_type: EventType::Control,
                title: "Green corridor activated".to_string(),
                location: format!("{start_name} to {end_name}"),
                severity: Severity::High,
                description: format!(
                    "{} intersections sequenced for uninterrupted transit",
                    legs.len()
                ),
            },
            self.time,
        );
        info!("green corridor {corridor_id:?} activated: {start_name} to {end_name}");
        self.corridor = Some(GreenCorridor {
            id: corridor_id,
            legs,
            activated_at: self.time,
            event,
        });
        self.revision += 1;
        Ok(corridor_id)
    }

    /// Release the active corridor, restarting every leg from Green with
    /// the default duration. Idempotent.
    pub fn deactivate_green_corridor(&mut self) -> bool {
        let Some(corridor) = self.corridor.take() else {
            return false;
        };
        let green = self.timing.green_secs;
        for leg in &corridor.legs {
            if let Some(intersection) = self.intersections.get_mut(&leg.intersection) {
                intersection.clear_hold();
                intersection.apply_light(Phase::Green, green);
            }
        }
        let _ = self.events.resolve(corridor.event, self.time);
        self.events.add(
            EventSpec {
                event_type: EventType::Control,
                title: "Green corridor deactivated".to_string(),
                location: "Corridor path".to_string(),
                severity: Severity::Low,
                description: "Held intersections resumed cycling from Green".to_string(),
            },
            self.time,
        );
        info!("green corridor deactivated; legs resume cycling");
        self.revision += 1;
        true
    }

    // --- event log commands ---

    pub fn add_event(&mut self, spec: EventSpec) -> EventId {
        let id = self.events.add(spec, self.time);
        self.revision += 1;
        id
    }

    pub fn resolve_event(&mut self, id: EventId) -> Result<(), CommandError> {
        self.events.resolve(id, self.time)?;
        self.revision += 1;
        Ok(())
    }

    pub fn activate_event(&mut self, id: EventId) -> Result<(), CommandError> {
        self.events.activate(id)?;
        self.revision += 1;
        Ok(())
    }

    pub fn query_events(&self, filter: &EventFilter) -> Vec<&super::events::Event> {
        self.events.query(filter)
    }

    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    /// Count of unresolved (scheduled or active) events
    pub fn open_event_count(&self) -> usize {
        self.events
            .events()
            .iter()
            .filter(|e| e.status != EventStatus::Resolved)
            .count()
    }

    // --- alert commands ---

    pub fn acknowledge_alert(&mut self, id: AlertId) -> Result<(), CommandError> {
        self.board.acknowledge(id)?;
        self.revision += 1;
        Ok(())
    }

    pub fn alert_board(&self) -> &AlertBoard {
        &self.board
    }

    // --- accessors ---

    pub fn intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.intersections.get(&id)
    }

    pub fn intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.intersections.values()
    }

    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    pub fn timing(&self) -> &SignalTiming {
        &self.timing
    }

    pub fn traffic_config(&self) -> &TrafficConfig {
        self.traffic.config()
    }

    pub fn corridor_config(&self) -> &CorridorConfig {
        &self.corridor_config
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn name_of(&self, id: IntersectionId) -> String {
        self.intersections
            .get(&id)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Capture a versioned, immutable snapshot of the whole network
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            revision: self.revision,
            time: self.time,
            emergency_active: self.emergency.is_some(),
            corridor: self.corridor.as_ref().map(CorridorSnapshot::capture),
            intersections: self
                .intersections
                .values()
                .map(IntersectionSnapshot::capture)
                .collect(),
            alerts: self.board.ranked().into_iter().cloned().collect(),
            events: self.events.events().to_vec(),
        }
    }
}
