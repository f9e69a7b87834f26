//! Bounded table of tracked requests
//!
//! Entries move `processing -> completed | error` exactly once. Finished
//! entries expire `ttl` after they finish; when the table is full the oldest
//! finished entry makes room. Entries still processing are never evicted, so
//! a table full of them rejects new submissions.

use crate::clock::Clock;
use agent_analyst::InvestmentReport;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Externally visible request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Processing,
    Completed,
    Error,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Processing)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed(Box<InvestmentReport>),
    Failed(String),
}

/// One tracked request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEntry {
    pub id: String,
    pub symbol: String,
    pub company_name: String,
    /// `None` while processing
    pub outcome: Option<Outcome>,
}

impl RequestEntry {
    /// A freshly submitted request
    pub fn processing(
        id: impl Into<String>,
        symbol: impl Into<String>,
        company_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            company_name: company_name.into(),
            outcome: None,
        }
    }

    pub fn status(&self) -> RequestStatus {
        match self.outcome {
            None => RequestStatus::Processing,
            Some(Outcome::Completed(_)) => RequestStatus::Completed,
            Some(Outcome::Failed(_)) => RequestStatus::Error,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Request ID already exists: {0}")]
    DuplicateId(String),

    #[error("All {0} tracked requests are still processing")]
    AtCapacity(usize),

    #[error("Request ID not found: {0}")]
    NotFound(String),

    #[error("Request {0} has already finished")]
    AlreadyFinished(String),
}

#[derive(Debug)]
struct Slot {
    entry: RequestEntry,
    finished_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct Table {
    slots: HashMap<String, Slot>,
    /// Ids in submission order
    order: VecDeque<String>,
}

impl Table {
    fn remove(&mut self, id: &str) {
        self.slots.remove(id);
        self.order.retain(|other| other != id);
    }

    fn purge_expired(&mut self, now: Instant, ttl: Duration) {
        let expired: Vec<String> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.finished_at.is_some_and(|at| now.duration_since(at) >= ttl))
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            debug!(request_id = %id, "Expiring finished request");
            self.remove(&id);
        }
    }

    fn oldest_finished(&self) -> Option<String> {
        self.order
            .iter()
            .find(|id| self.slots.get(*id).is_some_and(|slot| slot.finished_at.is_some()))
            .cloned()
    }
}

/// Concurrency-safe request table with a size cap and result expiry
#[derive(Debug)]
pub struct BoundedStore {
    table: Mutex<Table>,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl BoundedStore {
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            capacity,
            ttl,
            clock,
        }
    }

    /// Track a new processing request
    pub async fn insert(&self, entry: RequestEntry) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        table.purge_expired(self.clock.now(), self.ttl);

        if table.slots.contains_key(&entry.id) {
            return Err(StoreError::DuplicateId(entry.id));
        }
        if table.slots.len() >= self.capacity {
            let victim = table
                .oldest_finished()
                .ok_or(StoreError::AtCapacity(self.capacity))?;
            debug!(request_id = %victim, "Evicting oldest finished request");
            table.remove(&victim);
        }

        table.order.push_back(entry.id.clone());
        table.slots.insert(
            entry.id.clone(),
            Slot {
                entry,
                finished_at: None,
            },
        );
        Ok(())
    }

    /// Look up a request; expired entries are gone
    pub async fn get(&self, id: &str) -> Option<RequestEntry> {
        let mut table = self.table.lock().await;
        table.purge_expired(self.clock.now(), self.ttl);
        table.slots.get(id).map(|slot| slot.entry.clone())
    }

    /// Record how a processing request ended
    pub async fn finish(&self, id: &str, outcome: Outcome) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut table = self.table.lock().await;
        let slot = table
            .slots
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if slot.entry.outcome.is_some() {
            return Err(StoreError::AlreadyFinished(id.to_string()));
        }

        slot.entry.outcome = Some(outcome);
        slot.finished_at = Some(now);
        Ok(())
    }

    /// Number of tracked requests, expired ones included until the next purge
    pub async fn len(&self) -> usize {
        self.table.lock().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
