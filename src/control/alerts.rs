//! Rule-based alert engine and the active alert board
//!
//! The core rule evaluation is a pure function of intersection state:
//! identical input produces an identical, deterministically ordered list
//! of candidates. Anything nondeterministic (the demo incident feed, or a
//! real sensor feed later) plugs in behind the `IncidentSource` trait and
//! is merged after the deterministic pass.

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::CommandError;
use super::feed::IncidentSource;
use super::intersection::Intersection;
use super::types::{AlertId, CongestionLevel, IntersectionId, Phase, Severity};

/// The rule (or feed kind) that produced an alert. Declaration order is
/// the tiebreak order for candidates of equal severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertRule {
    /// Congestion bucket reached High
    CongestionHigh,
    /// Signal about to change phase
    LightChangeImminent,
    /// Vehicle count above the overload threshold
    VehicleOverload,
    /// Pedestrian present while the signal shows Green
    PedestrianOnGreen,
    /// External feed: accident or breakdown
    Accident,
    /// External feed: emergency vehicle approaching
    EmergencyVehicle,
    /// External feed: weather hazard
    Weather,
}

/// Tunables for the alert engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertConfig {
    /// An imminent-change alert fires when `0 < phase_remaining <= this`
    pub imminent_threshold: u32,
    /// A density alert fires when the vehicle count exceeds this
    pub overload_threshold: u32,
    /// Lifetime of a critical alert, in ticks
    pub ttl_critical: u64,
    /// Lifetime of every other severity, in ticks
    pub ttl_default: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            imminent_threshold: 5,
            overload_threshold: 25,
            ttl_critical: 8,
            ttl_default: 5,
        }
    }
}

impl AlertConfig {
    /// TTL in ticks for an alert of the given severity. Critical alerts
    /// persist longer than the rest.
    pub fn ttl_for(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.ttl_critical,
            _ => self.ttl_default,
        }
    }
}

/// An alert candidate produced by one evaluation pass, before the board
/// assigns it an id and expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertCandidate {
    pub rule: AlertRule,
    pub severity: Severity,
    pub message: String,
}

/// An active, severity-ranked alert
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: AlertId,
    pub intersection: IntersectionId,
    pub rule: AlertRule,
    pub severity: Severity,
    pub message: String,
    pub created_at: u64,
    pub expires_at: u64,
}

/// The deterministic rule pass: pure over the intersection's current state.
pub fn evaluate(config: &AlertConfig, intersection: &Intersection) -> Vec<AlertCandidate> {
    let mut candidates = Vec::new();

    if intersection.congestion == CongestionLevel::High {
        candidates.push(AlertCandidate {
            rule: AlertRule::CongestionHigh,
            severity: Severity::High,
            message: format!(
                "Heavy traffic at {}. Expected delay: {}",
                intersection.name, intersection.waiting_estimate
            ),
        });
    }

    if intersection.phase_remaining > 0 && intersection.phase_remaining <= config.imminent_threshold
    {
        candidates.push(AlertCandidate {
            rule: AlertRule::LightChangeImminent,
            severity: Severity::Medium,
            message: format!(
                "Signal at {} changes in {}s",
                intersection.name, intersection.phase_remaining
            ),
        });
    }

    if intersection.vehicle_count > config.overload_threshold {
        candidates.push(AlertCandidate {
            rule: AlertRule::VehicleOverload,
            severity: Severity::Medium,
            message: format!(
                "{} vehicles queued at {}",
                intersection.vehicle_count, intersection.name
            ),
        });
    }

    if intersection.pedestrian_present && intersection.phase == Phase::Green {
        candidates.push(AlertCandidate {
            rule: AlertRule::PedestrianOnGreen,
            severity: Severity::High,
            message: format!("Pedestrian detected on green at {}", intersection.name),
        });
    }

    rank(candidates)
}

/// Deduplicate by rule (keeping the highest severity per rule) and order
/// by severity, then rule. Total and stable: equal inputs rank equally.
pub fn rank(mut candidates: Vec<AlertCandidate>) -> Vec<AlertCandidate> {
    candidates.sort_by_key(|c| (c.rule, c.severity));
    candidates.dedup_by_key(|c| c.rule);
    candidates.sort_by_key(|c| (c.severity, c.rule));
    candidates
}

/// The alert engine: deterministic rules plus an optional pluggable feed
pub struct AlertEngine {
    config: AlertConfig,
    feed: Option<Box<dyn IncidentSource + Send>>,
}

impl AlertEngine {
    pub fn new(config: AlertConfig) -> Self {
        Self { config, feed: None }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Replace the external incident source. The engine works without one;
    /// a feed only ever adds candidates.
    pub fn set_incident_source(&mut self, feed: Box<dyn IncidentSource + Send>) {
        self.feed = Some(feed);
    }

    /// Evaluate one intersection: the deterministic rule pass merged with
    /// whatever the feed contributes. A feed failure is logged and isolated
    /// to this intersection; the rule candidates still come back.
    pub fn evaluate_intersection(
        &mut self,
        intersection: &Intersection,
        now: u64,
    ) -> Vec<AlertCandidate> {
        let mut candidates = evaluate(&self.config, intersection);

        if let Some(feed) = &mut self.feed {
            match feed.incidents(intersection, now) {
                Ok(extra) => candidates.extend(extra),
                Err(err) => {
                    warn!(
                        "incident feed failed for {} ({}): {err}",
                        intersection.name, intersection.id
                    );
                }
            }
        }

        rank(candidates)
    }
}

/// The set of currently active alerts across the network
#[derive(Debug, Default)]
pub struct AlertBoard {
    alerts: Vec<Alert>,
    next_id: u64,
}

impl AlertBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one intersection's fresh candidates into the active set.
    ///
    /// A candidate matching an existing alert's (intersection, rule) pair
    /// refreshes that alert's message and expiry instead of duplicating it.
    pub fn absorb(
        &mut self,
        config: &AlertConfig,
        intersection: IntersectionId,
        candidates: Vec<AlertCandidate>,
        now: u64,
    ) {
        for candidate in candidates {
            let expires_at = now + config.ttl_for(candidate.severity);
            if let Some(existing) = self
                .alerts
                .iter_mut()
                .find(|a| a.intersection == intersection && a.rule == candidate.rule)
            {
                existing.severity = candidate.severity;
                existing.message = candidate.message;
                existing.expires_at = expires_at;
            } else {
                self.next_id += 1;
                self.alerts.push(Alert {
                    id: AlertId(self.next_id),
                    intersection,
                    rule: candidate.rule,
                    severity: candidate.severity,
                    message: candidate.message,
                    created_at: now,
                    expires_at,
                });
            }
        }
    }

    /// Drop every alert whose TTL has elapsed
    pub fn expire(&mut self, now: u64) {
        self.alerts.retain(|a| a.expires_at > now);
    }

    /// Remove an alert by operator acknowledgment
    pub fn acknowledge(&mut self, id: AlertId) -> Result<Alert, CommandError> {
        let index = self
            .alerts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| CommandError::not_found(format!("no alert with id {}", id.0)))?;
        Ok(self.alerts.remove(index))
    }

    /// Active alerts ordered by severity, then intersection, then id
    pub fn ranked(&self) -> Vec<&Alert> {
        let mut alerts: Vec<&Alert> = self.alerts.iter().collect();
        alerts.sort_by_key(|a| (a.severity, a.intersection, a.id));
        alerts
    }

    /// Active alerts for one intersection, severity first
    pub fn for_intersection(&self, id: IntersectionId) -> Vec<&Alert> {
        let mut alerts: Vec<&Alert> = self
            .alerts
            .iter()
            .filter(|a| a.intersection == id)
            .collect();
        alerts.sort_by_key(|a| (a.severity, a.rule));
        alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
