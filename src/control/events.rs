//! Append-ordered event and incident log
//!
//! Records accidents, roadworks, manual actions, and coordinator activity.
//! The list is kept most-recent-first; resolved events stay in the log and
//! only their status ever changes again.

use serde::{Deserialize, Serialize};

use super::error::CommandError;
use super::types::{EventId, Severity};

/// Category of a logged event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Accident,
    Construction,
    Emergency,
    Control,
    Closure,
}

/// Lifecycle status of an event. Transitions are monotone:
/// Scheduled -> Active -> Resolved, or Active -> Resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Scheduled,
    Active,
    Resolved,
}

/// Operator- or system-supplied description of a new event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSpec {
    pub event_type: EventType,
    pub title: String,
    /// Free-text location; correlated to intersections by substring match
    pub location: String,
    pub severity: Severity,
    pub description: String,
}

/// A logged event or incident
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    pub title: String,
    pub location: String,
    pub severity: Severity,
    pub description: String,
    pub status: EventStatus,
    /// Tick at which the event was logged
    pub created_at: u64,
    /// Tick at which the event was resolved, if it has been
    pub resolved_at: Option<u64>,
}

/// Filter for querying the log; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub event_type: Option<EventType>,
    /// Case-insensitive substring matched against the location field
    pub location_contains: Option<String>,
}

impl EventFilter {
    fn matches(&self, event: &Event) -> bool {
        if let Some(status) = self.status {
            if event.status != status {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        if let Some(needle) = &self.location_contains {
            if !event
                .location
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// The event log itself
#[derive(Debug, Default)]
pub struct EventLog {
    /// Most recent first
    events: Vec<Event>,
    next_id: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a new event, assigning the next monotonic id.
    ///
    /// Construction events start out Scheduled; everything else is Active
    /// immediately.
    pub fn add(&mut self, spec: EventSpec, now: u64) -> EventId {
        self.next_id += 1;
        let id = EventId(self.next_id);
        let status = match spec.event_type {
            EventType::Construction => EventStatus::Scheduled,
            _ => EventStatus::Active,
        };
        let event = Event {
            id,
            event_type: spec.event_type,
            title: spec.title,
            location: spec.location,
            severity: spec.severity,
            description: spec.description,
            status,
            created_at: now,
            resolved_at: None,
        };
        self.events.insert(0, event);
        id
    }

    fn find_mut(&mut self, id: EventId) -> Result<&mut Event, CommandError> {
        self.events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CommandError::not_found(format!("no event with id {}", id.0)))
    }

    /// Mark an event resolved. Resolving an already-resolved event is a
    /// no-op, not an error; an unknown id is NotFound.
    pub fn resolve(&mut self, id: EventId, now: u64) -> Result<&Event, CommandError> {
        let event = self.find_mut(id)?;
        if event.status != EventStatus::Resolved {
            event.status = EventStatus::Resolved;
            event.resolved_at = Some(now);
        }
        Ok(&*event)
    }

    /// Move a scheduled event to Active. Already-active events are left
    /// alone; resolved events cannot come back.
    pub fn activate(&mut self, id: EventId) -> Result<&Event, CommandError> {
        let event = self.find_mut(id)?;
        match event.status {
            EventStatus::Scheduled => {
                event.status = EventStatus::Active;
                Ok(&*event)
            }
            EventStatus::Active => Ok(&*event),
            EventStatus::Resolved => Err(CommandError::state_conflict(format!(
                "event {} is already resolved",
                id.0
            ))),
        }
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// All events matching the filter, most recent first
    pub fn query(&self, filter: &EventFilter) -> Vec<&Event> {
        self.events.iter().filter(|e| filter.matches(e)).collect()
    }

    /// The full log, most recent first
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
