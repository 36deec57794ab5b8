use std::collections::HashMap;
use std::sync::Mutex;

use crate::lock;

pub const DEFAULT_POST_COOLDOWN: f64 = 1.0;

/// Seconds since last request for a client to still count as active.
pub const ACTIVE_WINDOW_SECS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostDecision {
    Allowed,
    Denied,
}

impl PostDecision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }
}

#[derive(Debug, Clone, Default)]
struct ClientRecord {
    last_post: Option<f64>,
    last_seen: i64,
}

#[derive(Debug, Default)]
struct Records {
    by_addr: HashMap<String, ClientRecord>,
    last_sweep: i64,
}

/// Per-address post cooldown plus a decaying count of active clients.
///
/// Stale records are swept by `active_count`, and by `mark_seen` at most once
/// per activity window, so distinct addresses do not pile up on a server that
/// nobody health-checks.
pub struct ClientTracker {
    cooldown: f64,
    active_window: i64,
    records: Mutex<Records>,
}

impl ClientTracker {
    pub fn new(cooldown: f64, active_window: i64) -> Self {
        Self {
            cooldown: cooldown.max(0.0),
            active_window,
            records: Mutex::new(Records::default()),
        }
    }

    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }

    /// Deny if the address posted less than `cooldown` seconds ago, otherwise
    /// record `now` as its last post.
    pub fn check_and_record_post(&self, addr: &str, now: f64) -> PostDecision {
        let mut records = lock(&self.records);
        let record = records
            .by_addr
            .entry(addr.to_string())
            .or_insert_with(|| ClientRecord {
                last_post: None,
                last_seen: now as i64,
            });

        if let Some(last) = record.last_post {
            if now - last < self.cooldown {
                return PostDecision::Denied;
            }
        }
        record.last_post = Some(now);
        PostDecision::Allowed
    }

    pub fn mark_seen(&self, addr: &str, now: i64) {
        let mut records = lock(&self.records);
        if now - records.last_sweep > self.active_window {
            self.sweep(&mut records, now);
        }
        records.by_addr.entry(addr.to_string()).or_default().last_seen = now;
    }

    /// Number of addresses seen within the activity window. Stale records are
    /// dropped as a side effect, unless they are still inside a cooldown.
    pub fn active_count(&self, now: i64) -> usize {
        let mut records = lock(&self.records);
        self.sweep(&mut records, now);

        let window = self.active_window;
        records
            .by_addr
            .values()
            .filter(|r| now - r.last_seen <= window)
            .count()
    }

    fn sweep(&self, records: &mut Records, now: i64) {
        let window = self.active_window;
        let cooldown = self.cooldown;

        records.by_addr.retain(|_, r| {
            let seen_recently = now - r.last_seen <= window;
            let cooling_down = r
                .last_post
                .is_some_and(|last| (now as f64) - last < cooldown);
            seen_recently || cooling_down
        });
        records.last_sweep = now;
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        lock(&self.records).by_addr.len()
    }
}

impl Default for ClientTracker {
    fn default() -> Self {
        Self::new(DEFAULT_POST_COOLDOWN, ACTIVE_WINDOW_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: f64 = 1_700_000_000.0;

    #[test]
    fn second_post_inside_cooldown_is_denied() {
        let tracker = ClientTracker::default();
        assert_eq!(tracker.check_and_record_post("a", T), PostDecision::Allowed);
        assert_eq!(tracker.check_and_record_post("a", T + 0.5), PostDecision::Denied);
    }

    #[test]
    fn post_after_cooldown_is_allowed() {
        let tracker = ClientTracker::default();
        assert!(tracker.check_and_record_post("a", T).is_allowed());
        assert!(tracker.check_and_record_post("a", T + 1.1).is_allowed());
    }

    #[test]
    fn denied_post_does_not_extend_cooldown() {
        let tracker = ClientTracker::default();
        assert!(tracker.check_and_record_post("a", T).is_allowed());
        assert!(!tracker.check_and_record_post("a", T + 0.9).is_allowed());
        assert!(tracker.check_and_record_post("a", T + 1.0).is_allowed());
    }

    #[test]
    fn cooldown_is_per_address() {
        let tracker = ClientTracker::default();
        assert!(tracker.check_and_record_post("a", T).is_allowed());
        assert!(tracker.check_and_record_post("b", T + 0.1).is_allowed());
    }

    #[test]
    fn active_count_decays() {
        let tracker = ClientTracker::default();
        let now = T as i64;
        tracker.mark_seen("a", now);
        tracker.mark_seen("b", now + 5);
        assert_eq!(tracker.active_count(now + 5), 2);
        assert_eq!(tracker.active_count(now + 11), 1);
        assert_eq!(tracker.active_count(now + 16), 0);

        tracker.mark_seen("a", now + 20);
        assert_eq!(tracker.active_count(now + 20), 1);
    }

    #[test]
    fn pruning_keeps_cooldown_state() {
        let tracker = ClientTracker::new(60.0, ACTIVE_WINDOW_SECS);
        let now = T as i64;
        tracker.mark_seen("a", now);
        assert!(tracker.check_and_record_post("a", T).is_allowed());

        // No longer active, but the long cooldown must survive pruning
        assert_eq!(tracker.active_count(now + 30), 0);
        assert!(!tracker.check_and_record_post("a", T + 30.0).is_allowed());
    }

    #[test]
    fn mark_seen_sweeps_stale_addresses() {
        let tracker = ClientTracker::default();
        let now = T as i64;
        for i in 0..100 {
            tracker.mark_seen(&format!("10.0.{}.{}", i / 256, i % 256), now);
        }
        assert_eq!(tracker.tracked(), 100);

        // Same window: no sweep yet
        tracker.mark_seen("late", now + 5);
        assert_eq!(tracker.tracked(), 101);

        tracker.mark_seen("fresh", now + 30);
        assert_eq!(tracker.tracked(), 1);
    }
}
