//! Pluggable external incident source
//!
//! The alert engine's deterministic rules cover what can be read off the
//! registry. Everything else (accidents, emergency vehicles, weather)
//! arrives through this trait, so a real sensor or incident feed can be
//! swapped in without touching the engine. The bundled demo feed is a
//! randomized simulation stand-in.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::alerts::{AlertCandidate, AlertRule};
use super::intersection::Intersection;
use super::types::Severity;

/// Failure reported by an incident source for one intersection.
///
/// The engine isolates these: a bad feed entry never stops ticking or
/// alert evaluation for other intersections.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct FeedError(pub String);

/// An external source of incident alert candidates
pub trait IncidentSource {
    /// Candidates for one intersection at the given tick
    fn incidents(
        &mut self,
        intersection: &Intersection,
        now: u64,
    ) -> Result<Vec<AlertCandidate>, FeedError>;
}

/// Randomized demo feed reproducing the dummy accident, emergency-vehicle,
/// and weather injectors of the source system
pub struct DemoIncidentFeed {
    rng: Option<StdRng>,
    /// Per-intersection, per-tick odds of each incident family
    accident_odds: f64,
    emergency_odds: f64,
    weather_odds: f64,
}

impl Default for DemoIncidentFeed {
    fn default() -> Self {
        Self {
            rng: None,
            accident_odds: 0.02,
            emergency_odds: 0.03,
            weather_odds: 0.05,
        }
    }
}

impl DemoIncidentFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded variant for reproducible demo runs
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Some(StdRng::seed_from_u64(seed)),
            ..Self::default()
        }
    }

    fn roll(&mut self, odds: f64) -> bool {
        match &mut self.rng {
            Some(rng) => rng.random_bool(odds),
            None => rand::rng().random_bool(odds),
        }
    }

    fn pick(&mut self, len: usize) -> usize {
        match &mut self.rng {
            Some(rng) => rng.random_range(0..len),
            None => rand::rng().random_range(0..len),
        }
    }
}

impl IncidentSource for DemoIncidentFeed {
    fn incidents(
        &mut self,
        intersection: &Intersection,
        _now: u64,
    ) -> Result<Vec<AlertCandidate>, FeedError> {
        let mut candidates = Vec::new();

        if self.roll(self.accident_odds) {
            let variants = [
                (
                    Severity::Critical,
                    format!(
                        "Two-vehicle collision reported at {}. Emergency services dispatched",
                        intersection.name
                    ),
                ),
                (
                    Severity::High,
                    format!(
                        "Disabled vehicle blocking lane at {}. Tow truck requested",
                        intersection.name
                    ),
                ),
                (
                    Severity::Medium,
                    format!(
                        "Construction equipment malfunction at {}. Traffic diverted",
                        intersection.name
                    ),
                ),
            ];
            let (severity, message) = variants[self.pick(variants.len())].clone();
            candidates.push(AlertCandidate {
                rule: AlertRule::Accident,
                severity,
                message,
            });
        }

        if self.roll(self.emergency_odds) {
            candidates.push(AlertCandidate {
                rule: AlertRule::EmergencyVehicle,
                severity: Severity::High,
                message: format!(
                    "Ambulance en route through {} - prioritize signal control",
                    intersection.name
                ),
            });
        }

        if self.roll(self.weather_odds) {
            let variants = [
                (
                    Severity::Medium,
                    format!("Rain affecting visibility at {}", intersection.name),
                ),
                (
                    Severity::High,
                    format!("Dense fog reducing visibility at {}", intersection.name),
                ),
                (
                    Severity::Critical,
                    format!("Storm approaching {}. Consider diversion", intersection.name),
                ),
            ];
            let (severity, message) = variants[self.pick(variants.len())].clone();
            candidates.push(AlertCandidate {
                rule: AlertRule::Weather,
                severity,
                message,
            });
        }

        Ok(candidates)
    }
}
