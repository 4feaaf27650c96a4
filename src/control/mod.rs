//! Traffic-network control core
//!
//! This module contains all of the control-room logic (the intersection
//! registry, signal state machines, traffic model, alert engine, event
//! log, and the emergency/corridor coordination protocols) with no
//! rendering or transport attached. Collaborators consume versioned
//! snapshots and issue the command methods; they never mutate registry
//! state directly.

mod alerts;
mod controller;
mod corridor;
mod error;
mod events;
mod feed;
mod intersection;
mod network;
mod scheduler;
mod snapshot;
mod traffic;
mod types;

pub use alerts::{evaluate, rank, Alert, AlertBoard, AlertCandidate, AlertConfig, AlertEngine, AlertRule};
pub use controller::Controller;
pub use corridor::{plan_legs, CorridorConfig, CorridorLeg, GreenCorridor};
pub use error::CommandError;
pub use events::{Event, EventFilter, EventLog, EventSpec, EventStatus, EventType};
pub use feed::{DemoIncidentFeed, FeedError, IncidentSource};
pub use intersection::{demo_definitions, Intersection, IntersectionDef, SignalTiming};
pub use network::{Network, EMERGENCY_HOLD_SECS};
pub use scheduler::Scheduler;
pub use snapshot::{CorridorSnapshot, IntersectionSnapshot, NetworkSnapshot};
pub use traffic::{TrafficConfig, TrafficModel};
pub use types::{
    AlertId, CongestionLevel, CorridorId, EventId, GeoPosition, HoldOwner, IntersectionId, Phase,
    Severity,
};
