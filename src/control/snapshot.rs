//! Versioned, immutable state snapshots for collaborators
//!
//! Dashboards, map renderers, and alert feeds consume these instead of
//! touching the registry. A snapshot is taken after a completed tick or
//! command, so readers never see a partially updated intersection.

use serde::Serialize;

use super::alerts::Alert;
use super::corridor::{CorridorLeg, GreenCorridor};
use super::events::Event;
use super::intersection::Intersection;
use super::types::{CongestionLevel, CorridorId, GeoPosition, IntersectionId, Phase};

/// Full telemetry of one intersection at snapshot time
#[derive(Debug, Clone, Serialize)]
pub struct IntersectionSnapshot {
    pub id: IntersectionId,
    pub name: String,
    pub position: GeoPosition,
    pub phase: Phase,
    pub phase_remaining: u32,
    pub pedestrian_present: bool,
    pub vehicle_count: u32,
    pub congestion: CongestionLevel,
    pub waiting_estimate: String,
    pub override_active: bool,
}

impl IntersectionSnapshot {
    pub(crate) fn capture(intersection: &Intersection) -> Self {
        Self {
            id: intersection.id,
            name: intersection.name.clone(),
            position: intersection.position,
            phase: intersection.phase,
            phase_remaining: intersection.phase_remaining,
            pedestrian_present: intersection.pedestrian_present,
            vehicle_count: intersection.vehicle_count,
            congestion: intersection.congestion,
            waiting_estimate: intersection.waiting_estimate.clone(),
            override_active: intersection.override_active(),
        }
    }
}

/// Status of the active green corridor, if any
#[derive(Debug, Clone, Serialize)]
pub struct CorridorSnapshot {
    pub id: CorridorId,
    pub legs: Vec<CorridorLeg>,
    pub activated_at: u64,
    pub active: bool,
}

impl CorridorSnapshot {
    pub(crate) fn capture(corridor: &GreenCorridor) -> Self {
        Self {
            id: corridor.id,
            legs: corridor.legs.clone(),
            activated_at: corridor.activated_at,
            active: true,
        }
    }

    /// Ordered intersection ids along the corridor
    pub fn intersections(&self) -> Vec<IntersectionId> {
        self.legs.iter().map(|l| l.intersection).collect()
    }
}

/// A versioned snapshot of the whole network
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSnapshot {
    /// Bumped on every completed tick or successful command
    pub revision: u64,
    /// Simulated time in ticks
    pub time: u64,
    pub emergency_active: bool,
    pub corridor: Option<CorridorSnapshot>,
    /// Ordered by intersection id
    pub intersections: Vec<IntersectionSnapshot>,
    /// Active alerts, severity first
    pub alerts: Vec<Alert>,
    /// Event log, most recent first
    pub events: Vec<Event>,
}

impl NetworkSnapshot {
    pub fn intersection(&self, id: IntersectionId) -> Option<&IntersectionSnapshot> {
        self.intersections.iter().find(|i| i.id == id)
    }

    /// Active alerts for one intersection, in ranked order
    pub fn alerts_for(&self, id: IntersectionId) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.intersection == id).collect()
    }
}
