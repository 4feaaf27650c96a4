//! Stochastic vehicle-count and congestion model
//!
//! Perturbs each intersection's vehicle count every traffic tick and
//! re-derives the congestion bucket and waiting-time estimate from the
//! count alone, so neither can drift from it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::intersection::Intersection;
use super::types::CongestionLevel;

/// Tunables for the traffic model
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Lower clamp for the vehicle count
    pub min_vehicles: u32,
    /// Upper clamp for the vehicle count
    pub max_vehicles: u32,
    /// Per-tick perturbation is drawn from `-max_delta..=max_delta`
    pub max_delta: i32,
    /// Counts above this are at least Medium congestion
    pub medium_threshold: u32,
    /// Counts above this are High congestion
    pub high_threshold: u32,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            min_vehicles: 5,
            max_vehicles: 60,
            max_delta: 5,
            medium_threshold: 20,
            high_threshold: 40,
        }
    }
}

impl TrafficConfig {
    /// Derive the congestion bucket from a vehicle count
    pub fn congestion_for(&self, vehicle_count: u32) -> CongestionLevel {
        if vehicle_count > self.high_threshold {
            CongestionLevel::High
        } else if vehicle_count > self.medium_threshold {
            CongestionLevel::Medium
        } else {
            CongestionLevel::Low
        }
    }

    /// Representative waiting time for a congestion bucket
    pub fn waiting_estimate(level: CongestionLevel) -> &'static str {
        match level {
            CongestionLevel::Low => "30s",
            CongestionLevel::Medium => "1m 30s",
            CongestionLevel::High => "2m 45s",
        }
    }
}

/// The traffic model: owns the RNG and the congestion configuration
pub struct TrafficModel {
    config: TrafficConfig,
    /// Seeded RNG for reproducible simulations; falls back to the thread RNG
    rng: Option<StdRng>,
}

impl TrafficModel {
    pub fn new(config: TrafficConfig) -> Self {
        Self { config, rng: None }
    }

    /// Create a traffic model with a seeded RNG for reproducible runs
    pub fn with_seed(config: TrafficConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Some(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn config(&self) -> &TrafficConfig {
        &self.config
    }

    fn random_delta(&mut self) -> i32 {
        let bound = self.config.max_delta;
        match &mut self.rng {
            Some(rng) => rng.random_range(-bound..=bound),
            None => rand::rng().random_range(-bound..=bound),
        }
    }

    fn random_bool(&mut self) -> bool {
        match &mut self.rng {
            Some(rng) => rng.random_bool(0.5),
            None => rand::rng().random_bool(0.5),
        }
    }

    /// Perturb one intersection's telemetry by one traffic tick.
    ///
    /// Congestion and the waiting estimate are recomputed from the updated
    /// count; there is no other persisted traffic state.
    pub fn tick(&mut self, intersection: &mut Intersection) {
        let delta = self.random_delta();
        let clamped = (i64::from(intersection.vehicle_count) + i64::from(delta))
            .clamp(i64::from(self.config.min_vehicles), i64::from(self.config.max_vehicles));
        intersection.vehicle_count = clamped as u32;
        intersection.congestion = self.config.congestion_for(intersection.vehicle_count);
        intersection.waiting_estimate =
            TrafficConfig::waiting_estimate(intersection.congestion).to_string();
        intersection.pedestrian_present = self.random_bool();
    }
}
