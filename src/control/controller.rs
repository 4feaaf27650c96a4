//! Thread-safe front end serializing commands against the tick loop
//!
//! The registry is single shared mutable state. Every mutation, whether
//! a tick from the background pacer or an operator command, goes through
//! one mutex, so commands are atomic with respect to concurrent ticks.
//! Readers never touch that mutex: they clone the latest published
//! snapshot, refreshed after each completed tick or command.

use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::Duration;

use log::debug;

use super::error::CommandError;
use super::events::{EventFilter, EventSpec};
use super::network::Network;
use super::scheduler::Scheduler;
use super::snapshot::NetworkSnapshot;
use super::types::{AlertId, CorridorId, EventId, IntersectionId, Phase};

struct ControllerState {
    scheduler: Scheduler,
    network: Network,
}

struct Inner {
    state: Mutex<ControllerState>,
    latest: RwLock<Arc<NetworkSnapshot>>,
}

/// Shared handle to the network; cheap to clone
#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

impl Controller {
    pub fn new(network: Network, scheduler: Scheduler) -> Self {
        let snapshot = Arc::new(network.snapshot());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ControllerState { scheduler, network }),
                latest: RwLock::new(snapshot),
            }),
        }
    }

    /// Run a closure against the locked network and republish the snapshot
    fn with_network<R>(&self, f: impl FnOnce(&mut ControllerState) -> R) -> R {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let result = f(&mut state);
        let snapshot = Arc::new(state.network.snapshot());
        drop(state);
        if let Ok(mut latest) = self.inner.latest.write() {
            *latest = snapshot;
        }
        result
    }

    /// The most recently published snapshot. Never blocks on the tick loop.
    pub fn snapshot(&self) -> Arc<NetworkSnapshot> {
        self.inner
            .latest
            .read()
            .map(|s| Arc::clone(&s))
            .unwrap_or_else(|poisoned| Arc::clone(&poisoned.into_inner()))
    }

    /// Advance virtual time by `units` ticks
    pub fn tick(&self, units: u64) {
        self.with_network(|state| {
            state.scheduler.advance(&mut state.network, units);
        });
    }

    /// Spawn a background thread pacing one tick per `period`.
    ///
    /// Timers are periodic and self-restarting; the thread runs until
    /// process shutdown.
    pub fn spawn_ticker(&self, period: Duration) -> thread::JoinHandle<()> {
        let controller = self.clone();
        thread::spawn(move || {
            debug!("tick thread started, period {period:?}");
            loop {
                thread::sleep(period);
                controller.tick(1);
            }
        })
    }

    // --- command pass-throughs; each is serialized with the tick loop ---

    pub fn set_light(
        &self,
        id: IntersectionId,
        phase: Phase,
        duration: u32,
    ) -> Result<(), CommandError> {
        self.with_network(|state| state.network.set_light(id, phase, duration))
    }

    pub fn toggle_emergency_override(&self) -> bool {
        self.with_network(|state| state.network.toggle_emergency_override())
    }

    pub fn activate_emergency(&self) -> bool {
        self.with_network(|state| state.network.activate_emergency())
    }

    pub fn deactivate_emergency(&self) -> bool {
        self.with_network(|state| state.network.deactivate_emergency())
    }

    pub fn create_green_corridor(
        &self,
        ids: &[IntersectionId],
    ) -> Result<CorridorId, CommandError> {
        self.with_network(|state| state.network.create_green_corridor(ids))
    }

    pub fn deactivate_green_corridor(&self) -> bool {
        self.with_network(|state| state.network.deactivate_green_corridor())
    }

    pub fn add_event(&self, spec: EventSpec) -> EventId {
        self.with_network(|state| state.network.add_event(spec))
    }

    pub fn resolve_event(&self, id: EventId) -> Result<(), CommandError> {
        self.with_network(|state| state.network.resolve_event(id))
    }

    pub fn activate_event(&self, id: EventId) -> Result<(), CommandError> {
        self.with_network(|state| state.network.activate_event(id))
    }

    pub fn acknowledge_alert(&self, id: AlertId) -> Result<(), CommandError> {
        self.with_network(|state| state.network.acknowledge_alert(id))
    }

    /// Query the event log through the current snapshot-consistent state
    pub fn query_events(&self, filter: &EventFilter) -> Vec<super::events::Event> {
        self.with_network(|state| {
            state
                .network
                .query_events(filter)
                .into_iter()
                .cloned()
                .collect()
        })
    }
}
