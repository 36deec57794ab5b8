use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tracing::trace;

use picochan_types::clock::now_secs;
use picochan_types::models::{Channel, Message};

use crate::lock;

pub const DEFAULT_CAPACITY: usize = 512;

/// Default number of messages returned by one `query`.
pub const POLL_BATCH: usize = 64;

/// Fixed-capacity, append-only message log with one ring per channel and a
/// single id sequence shared by all channels.
pub struct BoundedLog {
    capacity: usize,
    inner: Mutex<LogInner>,
}

struct LogInner {
    next_id: u64,
    channels: HashMap<Channel, VecDeque<Message>>,
}

impl BoundedLog {
    /// `capacity` is per channel; zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(LogInner {
                next_id: 1,
                channels: HashMap::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a message, stamping it with the next id and the current time.
    pub fn append(&self, chan: Channel, text: String, hash: String, color: String) -> Message {
        self.append_with(chan, text, hash, color, |_| {})
    }

    /// Like [`append`](Self::append), but runs `on_append` before the log lock
    /// is released. Fan-out done from here sees messages in id order.
    pub fn append_with<F>(
        &self,
        chan: Channel,
        text: String,
        hash: String,
        color: String,
        on_append: F,
    ) -> Message
    where
        F: FnOnce(&Message),
    {
        let mut inner = lock(&self.inner);

        let msg = Message {
            id: inner.next_id,
            ts: now_secs(),
            chan,
            text,
            hash,
            color,
        };
        inner.next_id += 1;

        let ring = inner
            .channels
            .entry(chan)
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        ring.push_back(msg.clone());
        while ring.len() > self.capacity {
            if let Some(evicted) = ring.pop_front() {
                trace!("Evicted message #{} from {}", evicted.id, chan);
            }
        }

        on_append(&msg);
        msg
    }

    /// Retained messages in `chan` with `id > since_id`, ascending, at most
    /// `limit` of them.
    pub fn query(&self, since_id: u64, chan: Channel, limit: usize) -> Vec<Message> {
        let inner = lock(&self.inner);
        let Some(ring) = inner.channels.get(&chan) else {
            return Vec::new();
        };

        // Ids within a ring are ascending, so skip straight to the first match.
        let start = ring.partition_point(|m| m.id <= since_id);
        ring.range(start..).take(limit).cloned().collect()
    }

    /// The last `n` retained messages of `chan`, oldest first.
    pub fn recent(&self, chan: Channel, n: usize) -> Vec<Message> {
        let inner = lock(&self.inner);
        match inner.channels.get(&chan) {
            Some(ring) => ring.iter().skip(ring.len().saturating_sub(n)).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Total retained messages across all channels.
    pub fn len(&self) -> usize {
        lock(&self.inner).channels.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BoundedLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
