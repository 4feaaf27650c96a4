//! Green corridor planning
//!
//! A corridor is an operator-chosen ordered path of intersections. Each
//! leg's green window starts at the cumulative transit-time offset from
//! the corridor's head, estimated from geodesic distance at a configured
//! corridor speed. Application of the holds lives in the network; this
//! module owns the plan arithmetic and bookkeeping.

use serde::{Deserialize, Serialize};

use super::types::{CorridorId, EventId, GeoPosition, IntersectionId};

/// Tunables for corridor planning
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CorridorConfig {
    /// Assumed convoy speed along the corridor, meters per second
    pub speed_mps: f64,
    /// Floor for the per-hop transit estimate, seconds
    pub min_hop_secs: u32,
    /// Green window granted to each leg once the wave reaches it, seconds
    pub green_window_secs: u32,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            speed_mps: 11.0,
            min_hop_secs: 5,
            green_window_secs: 45,
        }
    }
}

impl CorridorConfig {
    /// Estimated transit time between two adjacent corridor intersections
    pub fn transit_secs(&self, from: &GeoPosition, to: &GeoPosition) -> u32 {
        let secs = (from.distance_meters(to) / self.speed_mps).round() as u32;
        secs.max(self.min_hop_secs)
    }
}

/// One intersection along an active corridor
#[derive(Debug, Clone, Serialize)]
pub struct CorridorLeg {
    pub intersection: IntersectionId,
    /// Seconds after activation at which this leg's green window starts
    pub offset_secs: u32,
}

/// An active green corridor
#[derive(Debug, Clone)]
pub struct GreenCorridor {
    pub id: CorridorId,
    /// In path order; at least two legs, endpoints distinct
    pub legs: Vec<CorridorLeg>,
    /// Tick at which the corridor was activated
    pub activated_at: u64,
    /// The activation event, resolved again on deactivation
    pub event: EventId,
}

impl GreenCorridor {
    pub fn endpoints(&self) -> (IntersectionId, IntersectionId) {
        // Validation guarantees at least two legs.
        (
            self.legs[0].intersection,
            self.legs[self.legs.len() - 1].intersection,
        )
    }

    pub fn contains(&self, id: IntersectionId) -> bool {
        self.legs.iter().any(|l| l.intersection == id)
    }
}

/// Compute the leg offsets for a validated path.
///
/// The first leg starts immediately; each later leg starts one estimated
/// hop time after its predecessor.
pub fn plan_legs(
    config: &CorridorConfig,
    path: &[(IntersectionId, GeoPosition)],
) -> Vec<CorridorLeg> {
    let mut legs = Vec::with_capacity(path.len());
    let mut offset = 0u32;
    for (index, (id, position)) in path.iter().enumerate() {
        if index > 0 {
            let (_, previous) = &path[index - 1];
            offset += config.transit_secs(previous, position);
        }
        legs.push(CorridorLeg {
            intersection: *id,
            offset_secs: offset,
        });
    }
    legs
}
