//! Intersection records and the per-intersection signal state machine
//!
//! Each intersection carries its own phase countdown. The cycle is fixed
//! (Green -> Yellow -> Red) and only the timer advances it; coordinators
//! park a hold on the intersection to stop the cycle entirely.

use serde::{Deserialize, Serialize};

use super::traffic::TrafficConfig;
use super::types::{CongestionLevel, GeoPosition, HoldOwner, IntersectionId, Phase};

/// Default phase durations in seconds of simulated time
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalTiming {
    pub green_secs: u32,
    pub yellow_secs: u32,
    pub red_secs: u32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            green_secs: 30,
            yellow_secs: 5,
            red_secs: 25,
        }
    }
}

impl SignalTiming {
    /// The default duration for a phase when the cycle enters it
    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Green => self.green_secs,
            Phase::Yellow => self.yellow_secs,
            Phase::Red => self.red_secs,
        }
    }
}

/// Static bootstrap definition of one intersection
///
/// The set of definitions is fixed at network creation; intersections are
/// never added or destroyed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionDef {
    pub id: IntersectionId,
    pub name: String,
    pub position: GeoPosition,
    pub phase: Phase,
    pub phase_remaining: u32,
    pub vehicle_count: u32,
    pub pedestrian_present: bool,
}

/// A managed signal node with phase, timer, and traffic telemetry
#[derive(Debug, Clone)]
pub struct Intersection {
    pub id: IntersectionId,
    pub name: String,
    pub position: GeoPosition,
    /// Current signal phase
    pub phase: Phase,
    /// Seconds left in the current phase; never underflows
    pub phase_remaining: u32,
    pub pedestrian_present: bool,
    /// Vehicle count, clamped by the traffic model to its configured range
    pub vehicle_count: u32,
    /// Derived congestion bucket; always `f(vehicle_count)`
    pub congestion: CongestionLevel,
    /// Human-readable waiting-time estimate derived from the congestion bucket
    pub waiting_estimate: String,
    /// Set while an emergency override or green corridor holds this signal
    hold: Option<HoldOwner>,
}

impl Intersection {
    pub fn from_def(def: &IntersectionDef, traffic: &TrafficConfig) -> Self {
        let congestion = traffic.congestion_for(def.vehicle_count);
        Self {
            id: def.id,
            name: def.name.clone(),
            position: def.position,
            phase: def.phase,
            phase_remaining: def.phase_remaining,
            pedestrian_present: def.pedestrian_present,
            vehicle_count: def.vehicle_count,
            congestion,
            waiting_estimate: TrafficConfig::waiting_estimate(congestion).to_string(),
            hold: None,
        }
    }

    /// The coordinator currently holding this signal, if any
    pub fn hold(&self) -> Option<HoldOwner> {
        self.hold
    }

    /// Whether the signal is under emergency or corridor control
    pub fn override_active(&self) -> bool {
        self.hold.is_some()
    }

    pub(crate) fn set_hold(&mut self, owner: HoldOwner) {
        self.hold = Some(owner);
    }

    pub(crate) fn clear_hold(&mut self) {
        self.hold = None;
    }

    /// Advance the signal timer by one time unit.
    ///
    /// The countdown decrements even under a hold, saturating at zero, but
    /// the phase only auto-advances when no coordinator holds the signal.
    /// Returns the new phase when a transition happened.
    pub fn tick_signal(&mut self, timing: &SignalTiming) -> Option<Phase> {
        self.phase_remaining = self.phase_remaining.saturating_sub(1);
        if self.phase_remaining > 0 || self.hold.is_some() {
            return None;
        }
        let next = self.phase.next();
        self.phase = next;
        self.phase_remaining = timing.duration_of(next);
        Some(next)
    }

    /// Directly set the phase and countdown. Callers are responsible for
    /// hold bookkeeping and conflict checks.
    pub(crate) fn apply_light(&mut self, phase: Phase, duration: u32) {
        self.phase = phase;
        self.phase_remaining = duration;
    }
}

/// The demo city network: eight intersections with real coordinates and
/// plausible starting telemetry.
pub fn demo_definitions() -> Vec<IntersectionDef> {
    let defs = [
        (1, "Master Canteen Square", 20.2961, 85.8245, Phase::Green, 30, 25, true),
        (2, "Vani Vihar Square", 20.2889, 85.8206, Phase::Red, 15, 48, false),
        (3, "Jaydev Vihar", 20.3015, 85.8068, Phase::Yellow, 5, 32, true),
        (4, "Rasulgarh Square", 20.2813, 85.8317, Phase::Green, 25, 15, false),
        (5, "Sachivalaya Marg", 20.2915, 85.8342, Phase::Red, 20, 28, true),
        (6, "Kalpana Square", 20.2778, 85.8143, Phase::Green, 35, 18, false),
        (7, "Biju Patnaik Chhak", 20.2736, 85.8239, Phase::Yellow, 10, 52, true),
        (8, "Patia Square", 20.3124, 85.8173, Phase::Red, 18, 35, false),
    ];

    defs.into_iter()
        .map(
            |(id, name, lat, lon, phase, remaining, vehicles, pedestrian)| IntersectionDef {
                id: IntersectionId(id),
                name: name.to_string(),
                position: GeoPosition::new(lat, lon),
                phase,
                phase_remaining: remaining,
                vehicle_count: vehicles,
                pedestrian_present: pedestrian,
            },
        )
        .collect()
}
