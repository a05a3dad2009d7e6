//! Atom event framework: activation events and their delivery.
//!
//! Atoms have an activation state. When a previously inactive atom becomes
//! active, the framework enqueues an event and, on the next
//! [`process_events`](AtomEventFramework::process_events) call, delivers it
//! to every kernel registered for the atom's predicate. The framework is the
//! serialization point: handlers for one kernel are never re-entered, and
//! one activation's handler runs to completion before the next is delivered.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::atom::{AtomKey, GroundAtom};
use crate::clause::DnfClause;
use crate::error::{GroundingError, StoreError};
use crate::groundstore::GroundRuleStore;
use crate::manager::AtomManager;
use crate::predicate::PredicateId;
use crate::term::Constant;

/// Identity token for an event registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Creates a new random registration id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegistrationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kinds of atom events. The grounder subscribes to activation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomEventKind {
    /// An atom transitioned from inactive to active.
    Activated,
}

/// The event set covering exactly atom activation.
pub const ACTIVATED_EVENT_SET: &[AtomEventKind] = &[AtomEventKind::Activated];

/// An atom event as delivered to handlers.
#[derive(Debug, Clone)]
pub struct AtomEvent {
    /// What happened.
    pub kind: AtomEventKind,
    /// The canonical atom the event is about.
    pub atom: Arc<GroundAtom>,
}

/// Receiver of atom events.
///
/// A handler must not be re-entered; the framework guarantees sequential
/// delivery per handler. Handlers receive the framework's atom manager for
/// restricted grounding queries and the ground-rule store for insertion.
pub trait AtomEventHandler: Send + Sync {
    /// Called once per delivered activation. Returns the number of result
    /// rows expanded into ground rules.
    fn on_atom_activated(
        &self,
        event: &AtomEvent,
        manager: &AtomManager,
        store: &mut GroundRuleStore,
    ) -> Result<usize, GroundingError>;
}

/// Tuning knobs for the event framework.
#[derive(Debug, Clone)]
pub struct EventFrameworkConfig {
    /// Max queued activation events before `activate` reports `QueueFull`.
    pub queue_capacity: usize,
}

impl Default for EventFrameworkConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 4096,
        }
    }
}

struct Registration {
    id: RegistrationId,
    predicates: Vec<PredicateId>,
    events: Vec<AtomEventKind>,
    handler: Arc<dyn AtomEventHandler>,
}

/// Owner of the activation queue and handler registrations.
pub struct AtomEventFramework {
    manager: Arc<AtomManager>,
    cfg: EventFrameworkConfig,
    registrations: RwLock<Vec<Registration>>,
    active: Mutex<HashSet<AtomKey>>,
    event_tx: Sender<AtomEvent>,
    event_rx: Receiver<AtomEvent>,
    delivered: AtomicU64,
}

impl fmt::Debug for AtomEventFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomEventFramework")
            .field("pending", &self.pending_events())
            .field("delivered", &self.delivered_events())
            .finish_non_exhaustive()
    }
}

impl AtomEventFramework {
    /// Creates a framework over the given atom manager.
    #[must_use]
    pub fn new(manager: Arc<AtomManager>, cfg: EventFrameworkConfig) -> Self {
        let (event_tx, event_rx) = bounded(cfg.queue_capacity.max(1));
        Self {
            manager,
            cfg,
            registrations: RwLock::new(Vec::new()),
            active: Mutex::new(HashSet::new()),
            event_tx,
            event_rx,
            delivered: AtomicU64::new(0),
        }
    }

    /// The atom manager handlers query through.
    #[must_use]
    pub fn manager(&self) -> &Arc<AtomManager> {
        &self.manager
    }

    /// Registers `handler` for `events` on every standard predicate of
    /// `clause`. Returns the token that unregisters it.
    pub fn register_clause(
        &self,
        clause: &DnfClause,
        handler: Arc<dyn AtomEventHandler>,
        events: &[AtomEventKind],
    ) -> Result<RegistrationId, GroundingError> {
        let id = RegistrationId::new();
        let predicates = clause.standard_predicates(self.manager.registry());
        let mut registrations = self
            .registrations
            .write()
            .map_err(|_| StoreError::Backend("poisoned registration lock".to_string()))?;
        registrations.push(Registration {
            id,
            predicates,
            events: events.to_vec(),
            handler,
        });
        Ok(id)
    }

    /// Removes a registration by token.
    ///
    /// # Errors
    /// `UnknownRegistration` if the token was never issued or already
    /// removed.
    pub fn unregister(&self, id: RegistrationId) -> Result<(), GroundingError> {
        let mut registrations = self
            .registrations
            .write()
            .map_err(|_| StoreError::Backend("poisoned registration lock".to_string()))?;
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        if registrations.len() == before {
            return Err(GroundingError::UnknownRegistration { id });
        }
        Ok(())
    }

    /// Marks `(predicate, args)` active, enqueueing an activation event if
    /// the atom was not active before. Returns true on a fresh activation,
    /// false if the atom was already active.
    ///
    /// # Errors
    /// `QueueFull` when the activation queue is at capacity; the activation
    /// state is rolled back so the caller can retry.
    pub fn activate(
        &self,
        predicate: PredicateId,
        args: Vec<Constant>,
    ) -> Result<bool, GroundingError> {
        let atom = self.manager.get_atom(predicate, args)?;
        let key = atom.key();

        {
            let mut active = self
                .active
                .lock()
                .map_err(|_| StoreError::Backend("poisoned activation lock".to_string()))?;
            if !active.insert(key.clone()) {
                return Ok(false);
            }
        }

        let event = AtomEvent {
            kind: AtomEventKind::Activated,
            atom,
        };
        match self.event_tx.try_send(event) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                if let Ok(mut active) = self.active.lock() {
                    active.remove(&key);
                }
                Err(GroundingError::QueueFull {
                    capacity: self.cfg.queue_capacity,
                })
            }
            Err(TrySendError::Disconnected(_)) => Err(GroundingError::Disconnected),
        }
    }

    /// Returns true if the atom is currently active.
    #[must_use]
    pub fn is_active(&self, atom: &GroundAtom) -> bool {
        self.active
            .lock()
            .map(|a| a.contains(&atom.key()))
            .unwrap_or(false)
    }

    /// Drains the activation queue, delivering each event to every matching
    /// registration in registration order. Returns the number of events
    /// delivered.
    ///
    /// Handler errors propagate immediately; ground rules inserted before
    /// the failure remain (grounding is idempotent under merge, so replay is
    /// safe).
    pub fn process_events(&self, store: &mut GroundRuleStore) -> Result<usize, GroundingError> {
        let mut processed = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            let handlers: Vec<Arc<dyn AtomEventHandler>> = {
                let registrations = self
                    .registrations
                    .read()
                    .map_err(|_| StoreError::Backend("poisoned registration lock".to_string()))?;
                registrations
                    .iter()
                    .filter(|r| {
                        r.events.contains(&event.kind)
                            && r.predicates.contains(&event.atom.predicate)
                    })
                    .map(|r| Arc::clone(&r.handler))
                    .collect()
            };

            for handler in handlers {
                handler.on_atom_activated(&event, &self.manager, store)?;
            }

            processed += 1;
            self.delivered.fetch_add(1, Ordering::Relaxed);
        }
        Ok(processed)
    }

    /// Activation events waiting in the queue.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.event_rx.len()
    }

    /// Total activation events delivered so far.
    #[must_use]
    pub fn delivered_events(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}
