//! Per (command, user) cooldown bookkeeping

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Last accepted invocation per (command, user).
///
/// Entries are created lazily and never evicted; the map is bounded by
/// distinct commands times distinct active users for the process lifetime.
#[derive(Default)]
pub struct CooldownTracker {
    entries: Mutex<HashMap<(String, String), Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn remaining_at(last: Option<Instant>, cooldown: Duration, now: Instant) -> Duration {
        match last {
            // `last + cooldown` can overflow `Instant`
            Some(last) => cooldown.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Time left before `user` may run `command` again; zero if none
    pub fn remaining(
        &self,
        command: &str,
        user: &str,
        cooldown: Duration,
        now: Instant,
    ) -> Duration {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let last = entries
            .get(&(command.to_string(), user.to_string()))
            .copied();
        Self::remaining_at(last, cooldown, now)
    }

    /// Record an invocation. Timestamps never move backwards.
    pub fn record(&self, command: &str, user: &str, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .entry((command.to_string(), user.to_string()))
            .or_insert(now);
        if now > *entry {
            *entry = now;
        }
    }

    /// Check and record in one step.
    ///
    /// Returns the remaining wait when the cooldown is still active; otherwise
    /// records `now` and returns `Ok`.
    pub fn try_acquire(
        &self,
        command: &str,
        user: &str,
        cooldown: Duration,
        now: Instant,
    ) -> Result<(), Duration> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (command.to_string(), user.to_string());
        let remaining = Self::remaining_at(entries.get(&key).copied(), cooldown, now);
        if !remaining.is_zero() {
            return Err(remaining);
        }
        let entry = entries.entry(key).or_insert(now);
        if now > *entry {
            *entry = now;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whole seconds to show the user, rounded up so a live cooldown never reads 0
pub fn ceil_secs(remaining: Duration) -> u64 {
    let secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entry_means_no_wait() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        assert_eq!(tracker.remaining("daily", "42", Duration::from_secs(60), now), Duration::ZERO);
    }

    #[test]
    fn test_remaining_counts_down() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        tracker.record("daily", "42", start);

        let later = start + Duration::from_secs(20);
        assert_eq!(
            tracker.remaining("daily", "42", Duration::from_secs(60), later),
            Duration::from_secs(40)
        );
        let done = start + Duration::from_secs(60);
        assert!(tracker.remaining("daily", "42", Duration::from_secs(60), done).is_zero());
    }

    #[test]
    fn test_keys_are_per_user_and_command() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        let cooldown = Duration::from_secs(10);
        assert!(tracker.try_acquire("work", "alice", cooldown, now).is_ok());
        assert!(tracker.try_acquire("work", "bob", cooldown, now).is_ok());
        assert!(tracker.try_acquire("rob", "alice", cooldown, now).is_ok());
        assert!(tracker.try_acquire("work", "alice", cooldown, now).is_err());
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_record_is_monotonic() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        let later = start + Duration::from_secs(30);
        tracker.record("work", "alice", later);
        tracker.record("work", "alice", start);

        let cooldown = Duration::from_secs(60);
        assert_eq!(
            tracker.remaining("work", "alice", cooldown, later),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_rejected_acquire_does_not_extend_cooldown() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        let cooldown = Duration::from_secs(5);
        assert!(tracker.try_acquire("ping", "u", cooldown, start).is_ok());
        let early = start + Duration::from_secs(3);
        assert!(tracker.try_acquire("ping", "u", cooldown, early).is_err());
        let done = start + Duration::from_secs(5);
        assert!(tracker.try_acquire("ping", "u", cooldown, done).is_ok());
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(Duration::from_millis(4_001)), 5);
        assert_eq!(ceil_secs(Duration::from_secs(5)), 5);
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_huge_cooldown_does_not_overflow() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        let cooldown = Duration::from_secs(u64::MAX);
        assert!(tracker.try_acquire("slow", "u", cooldown, start).is_ok());

        let later = start + Duration::from_secs(10);
        let remaining = tracker.try_acquire("slow", "u", cooldown, later).unwrap_err();
        assert_eq!(remaining, cooldown - Duration::from_secs(10));
        assert_eq!(ceil_secs(remaining), u64::MAX - 10);
    }
}
