//! Virtual-time tick driver
//!
//! The scheduler owns the tick cadence: signals advance every time unit,
//! the traffic model on a configurable coarser period. Tests advance
//! virtual time through `advance()` directly instead of sleeping; real
//! wall-clock pacing belongs to whoever drives the scheduler.

use super::network::Network;

/// Fixed-interval driver for a network
#[derive(Debug)]
pub struct Scheduler {
    /// The traffic model runs every this many signal ticks
    traffic_every: u64,
    ticks: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Scheduler {
    pub fn new(traffic_every: u64) -> Self {
        Self {
            traffic_every: traffic_every.max(1),
            ticks: 0,
        }
    }

    /// Total ticks driven so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance the network by `units` time units
    pub fn advance(&mut self, network: &mut Network, units: u64) {
        for _ in 0..units {
            self.ticks += 1;
            let traffic_due = self.ticks % self.traffic_every == 0;
            network.step(traffic_due);
        }
    }
}
