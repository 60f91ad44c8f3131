//! Deferred fun fact store
//!
//! Background delivery policies hand the caller a ticket instead of the fun
//! fact. The background fetch writes its terminal state here and the caller
//! polls `GET /api/fun-fact/{ticket}` to read it.
//!
//! Slots expire after a fixed TTL. Expired slots are pruned whenever a new
//! ticket is issued and are never returned by lookups.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::enrichment::{AttemptState, FETCHING_PLACEHOLDER};

/// Whether the fact for a ticket has been resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FactStatus {
    Pending,
    Ready,
}

/// Poll response for a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactSnapshot {
    pub ticket: Uuid,
    pub number: i64,
    pub status: FactStatus,
    pub fun_fact: String,
}

struct FactSlot {
    number: i64,
    state: AttemptState,
    created: Instant,
}

/// Ticket → deferred fact, shared between handlers and background tasks
#[derive(Clone)]
pub struct FactStore {
    slots: Arc<RwLock<HashMap<Uuid, FactSlot>>>,
    ttl: Duration,
}

impl FactStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Issue a ticket for an in-flight fetch
    pub async fn insert_pending(&self, number: i64) -> Uuid {
        let ticket = Uuid::new_v4();
        let now = Instant::now();

        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| now.duration_since(slot.created) < self.ttl);
        let pruned = before - slots.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned expired fun fact tickets");
        }

        slots.insert(
            ticket,
            FactSlot {
                number,
                state: AttemptState::InFlight,
                created: now,
            },
        );
        ticket
    }

    /// Record the terminal state for `ticket`
    ///
    /// Returns false when the ticket is unknown or expired; the result is
    /// then dropped.
    pub async fn resolve(&self, ticket: Uuid, state: AttemptState) -> bool {
        let mut slots = self.slots.write().await;
        match slots.get_mut(&ticket) {
            Some(slot) if slot.created.elapsed() < self.ttl => {
                slot.state = state;
                true
            }
            _ => false,
        }
    }

    /// Remove a ticket (used when a job could not be scheduled)
    pub async fn remove(&self, ticket: Uuid) {
        self.slots.write().await.remove(&ticket);
    }

    /// Current view of `ticket`, or `None` when unknown or expired
    pub async fn get(&self, ticket: Uuid) -> Option<FactSnapshot> {
        let slots = self.slots.read().await;
        let slot = slots.get(&ticket)?;
        if slot.created.elapsed() >= self.ttl {
            return None;
        }

        let snapshot = match slot.state.fun_fact() {
            Some(text) => FactSnapshot {
                ticket,
                number: slot.number,
                status: FactStatus::Ready,
                fun_fact: text.to_string(),
            },
            None => FactSnapshot {
                ticket,
                number: slot.number,
                status: FactStatus::Pending,
                fun_fact: FETCHING_PLACEHOLDER.to_string(),
            },
        };
        Some(snapshot)
    }

    /// Number of live or not-yet-pruned tickets
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
