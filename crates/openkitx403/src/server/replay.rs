/*
[INPUT]:  Replay keys derived from accepted challenges
[OUTPUT]: Atomic first-use decisions with bounded, time-expiring memory
[POS]:    Server layer - replay defense
[UPDATE]: When adding store backends or changing eviction policy
*/

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

/// Errors raised by a replay store backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayStoreError {
    #[error("Replay store lock poisoned")]
    Poisoned,

    #[error("Replay store backend error: {0}")]
    Backend(String),
}

/// Record of consumed challenge nonces.
///
/// Implementations must make `check_and_insert` a single atomic step: two
/// concurrent calls with the same key may not both return `true`.
#[async_trait]
pub trait ReplayStore: Send + Sync {
    /// `true` if the key was absent (or expired) and is now recorded,
    /// `false` if it was already present
    async fn check_and_insert(&self, key: &str) -> Result<bool, ReplayStoreError>;
}

/// Replay key for a challenge: its nonce scoped by audience and server id.
///
/// Encoded as a JSON array so no choice of field contents can collide.
pub fn replay_key(audience: &str, server_id: &str, nonce: &str) -> String {
    json!([audience, server_id, nonce]).to_string()
}

/// One consumed nonce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRecord {
    pub key: String,
    pub inserted_at: Instant,
}

#[derive(Debug, Default)]
struct ReplayState {
    records: HashMap<String, Instant>,
    order: VecDeque<ReplayRecord>,
}

impl ReplayState {
    /// Drop records older than `ttl`. Insertion order is time order, so
    /// expired records are always at the front.
    fn expire(&mut self, now: Instant, ttl: Duration) {
        while let Some(front) = self.order.front() {
            if now.saturating_duration_since(front.inserted_at) < ttl {
                break;
            }
            if let Some(record) = self.order.pop_front() {
                self.records.remove(&record.key);
            }
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(record) = self.order.pop_front() {
            self.records.remove(&record.key);
        }
    }
}

/// In-process replay store: a mutex-guarded map plus insertion-order queue
#[derive(Debug)]
pub struct InMemoryReplayStore {
    ttl: Duration,
    capacity: usize,
    state: Mutex<ReplayState>,
}

impl InMemoryReplayStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            state: Mutex::new(ReplayState::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `check_and_insert` against an explicit clock reading
    pub fn check_and_insert_at(&self, key: &str, now: Instant) -> Result<bool, ReplayStoreError> {
        let mut state = self.state.lock().map_err(|_| ReplayStoreError::Poisoned)?;

        state.expire(now, self.ttl);
        if state.records.contains_key(key) {
            return Ok(false);
        }

        while state.records.len() >= self.capacity {
            state.evict_oldest();
        }

        state.records.insert(key.to_string(), now);
        state.order.push_back(ReplayRecord {
            key: key.to_string(),
            inserted_at: now,
        });
        Ok(true)
    }

    /// Records held, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.records.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReplayStore for InMemoryReplayStore {
    async fn check_and_insert(&self, key: &str) -> Result<bool, ReplayStoreError> {
        self.check_and_insert_at(key, Instant::now())
    }
}
