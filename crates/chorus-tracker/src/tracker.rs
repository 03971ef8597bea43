//! Per-chat burst state.
//!
//! Locking is two-level: the outer map is held only long enough to find or
//! create a chat's slot, and each slot has its own lock covering the whole
//! read-modify-write of [`Tracker::observe`] and the per-chat part of
//! [`Tracker::sweep`]. Chats never contend with each other on the hot path.
//! Lock order is always outer then slot.


use crate::normalize::ContentKey;
use chorus_core::config::EchoConfig;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

type ChatRecords = HashMap<ContentKey, BurstRecord>;
type ChatSlot = Arc<Mutex<ChatRecords>>;

/// Distinct senders seen for one `(chat, key)` since `first_seen`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstRecord {
    senders: HashSet<String>,
    first_seen: DateTime<Utc>,
}

impl BurstRecord {
    fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            senders: HashSet::from([user_id.to_string()]),
            first_seen: now,
        }
    }

    /// Number of distinct senders. Always equal to `senders().len()`.
    pub fn distinct_senders(&self) -> usize {
        self.senders.len()
    }

    pub fn senders(&self) -> &HashSet<String> {
        &self.senders
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    fn is_expired(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        now - self.first_seen > window
    }
}

/// Outcome of observing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    NoAction,
    /// Threshold reached. The record has already been removed.
    Fire(BurstRecord),
}

impl Decision {
    pub fn is_fire(&self) -> bool {
        matches!(self, Self::Fire(_))
    }
}

/// Snapshot of how much state the tracker holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub chats: usize,
    pub records: usize,
}

/// Process-wide burst tracker.
///
/// Created empty at startup and mutated only through [`observe`](Self::observe)
/// and [`sweep`](Self::sweep).
#[derive(Debug)]
pub struct Tracker {
    trigger_count: usize,
    window: TimeDelta,
    chats: Mutex<HashMap<String, ChatSlot>>,
}

impl Tracker {
    /// Create a tracker. A `trigger_count` of 0 is treated as 1.
    pub fn new(trigger_count: usize, window: Duration) -> Self {
        Self {
            trigger_count: trigger_count.max(1),
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            chats: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &EchoConfig) -> Self {
        Self::new(config.trigger_count, config.time_window())
    }

    pub fn trigger_count(&self) -> usize {
        self.trigger_count
    }

    pub fn window(&self) -> Duration {
        self.window.to_std().unwrap_or(Duration::MAX)
    }

    /// Record that `user_id` sent content `key` into `chat_id` at `now`.
    ///
    /// The window is anchored at the record's first sighting; a sighting
    /// past it starts a fresh record with only this sender. A sender already
    /// in the record changes nothing. Once the distinct count reaches the
    /// threshold the record is removed under the same lock and returned.
    pub fn observe(
        &self,
        chat_id: &str,
        user_id: &str,
        key: &ContentKey,
        now: DateTime<Utc>,
    ) -> Decision {
        let slot = self.slot(chat_id);
        let mut records = lock(&slot);

        let count = match records.get_mut(key) {
            Some(record) if !record.is_expired(now, self.window) => {
                if !record.senders.insert(user_id.to_string()) {
                    return Decision::NoAction;
                }
                record.distinct_senders()
            }
            Some(record) => {
                *record = BurstRecord::new(user_id, now);
                1
            }
            None => {
                records.insert(key.clone(), BurstRecord::new(user_id, now));
                1
            }
        };

        if count >= self.trigger_count {
            records.remove(key).map_or(Decision::NoAction, Decision::Fire)
        } else {
            Decision::NoAction
        }
    }

    /// Remove every record whose window has elapsed at `now`.
    ///
    /// Returns the number of records removed. Chats left without records are
    /// dropped too, unless an `observe` is currently holding their slot.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let slots: Vec<ChatSlot> = lock(&self.chats).values().cloned().collect();

        let mut removed = 0;
        for slot in &slots {
            let mut records = lock(slot);
            let before = records.len();
            records.retain(|_, record| !record.is_expired(now, self.window));
            removed += before - records.len();
        }
        drop(slots);

        // Only a slot nobody else holds can be dropped: clones are handed out
        // under this same lock, so a count of one cannot grow meanwhile.
        lock(&self.chats)
            .retain(|_, slot| Arc::strong_count(slot) > 1 || !lock(slot).is_empty());

        removed
    }

    /// Copy of the live record for `(chat_id, key)`, if any.
    pub fn peek(&self, chat_id: &str, key: &ContentKey) -> Option<BurstRecord> {
        let slot = lock(&self.chats).get(chat_id).cloned()?;
        let records = lock(&slot);
        records.get(key).cloned()
    }

    pub fn stats(&self) -> TrackerStats {
        let chats = lock(&self.chats);
        TrackerStats {
            chats: chats.len(),
            records: chats.values().map(|slot| lock(slot).len()).sum(),
        }
    }

    fn slot(&self, chat_id: &str) -> ChatSlot {
        let mut chats = lock(&self.chats);
        chats.entry(chat_id.to_string()).or_default().clone()
    }
}

/// Every critical section leaves the maps consistent, so a poisoned lock
/// is still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
