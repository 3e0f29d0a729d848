//! Fixed-window counter keyed by client identity.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use id8_core::config::RateLimitSettings;

// ============================================================================
// Configuration
// ============================================================================

/// Limits for one logical endpoint class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per key per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
    /// Upper bound on tracked keys.
    pub max_entries: usize,
    /// Minimum time between opportunistic sweeps of expired windows.
    pub sweep_interval: Duration,
}

impl RateLimitConfig {
    /// Create a config allowing `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            max_entries: 10_000,
            sweep_interval: window,
        }
    }

    /// Limit the number of keys held in memory.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Preset for the tracking endpoints: 60 requests per minute.
    pub fn tracking() -> Self {
        Self::new(60, Duration::from_secs(60))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::tracking()
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self::new(
            settings.max_requests,
            Duration::from_secs(settings.window_secs.max(1)),
        )
        .with_max_entries(settings.max_entries)
    }
}

// ============================================================================
// Decision
// ============================================================================

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Configured maximum per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

impl RateLimitDecision {
    /// Wall-clock time at which the window resets.
    pub fn reset_at(&self) -> DateTime<Utc> {
        let delta = chrono::Duration::from_std(self.reset_after)
            .unwrap_or_else(|_| chrono::Duration::zero());
        Utc::now() + delta
    }

    /// Whole seconds a throttled client should wait (never zero).
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }
}

// ============================================================================
// Limiter
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

#[derive(Debug)]
struct Table {
    windows: HashMap<String, Window>,
    last_sweep: Instant,
}

/// Process-scoped fixed-window rate limiter.
///
/// Each key gets its own window. The first request opens a window with a
/// count of one; later requests inside the window increment the count and
/// are allowed while it stays within `max_requests`. Once the window has
/// elapsed the next request opens a fresh one.
///
/// The table is bounded: expired windows are swept periodically and, when
/// the table is full, the oldest window is evicted to make room.
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    config: RateLimitConfig,
    table: Mutex<Table>,
}

impl RateLimiter {
    /// Create a limiter for the named endpoint class.
    pub fn new(name: impl Into<String>, config: RateLimitConfig) -> Self {
        Self {
            name: name.into(),
            config,
            table: Mutex::new(Table {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Endpoint class this limiter guards.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `key` and decide whether it may proceed.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// [`check`](Self::check) against an explicit clock reading.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let window_len = self.config.window;
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);

        if now.duration_since(table.last_sweep) >= self.config.sweep_interval {
            self.sweep_locked(&mut table, now);
        }

        let window = match table.windows.get_mut(key) {
            Some(w) if now.duration_since(w.started) < window_len => {
                w.count = w.count.saturating_add(1);
                *w
            }
            Some(w) => {
                *w = Window {
                    count: 1,
                    started: now,
                };
                *w
            }
            None => {
                if table.windows.len() >= self.config.max_entries {
                    self.make_room(&mut table, now);
                }
                let w = Window {
                    count: 1,
                    started: now,
                };
                table.windows.insert(key.to_string(), w);
                w
            }
        };
        drop(table);

        let allowed = window.count <= self.config.max_requests;
        if !allowed {
            log::debug!(
                "Rate limit '{}' exceeded for key '{key}' ({} > {})",
                self.name,
                window.count,
                self.config.max_requests
            );
        }

        RateLimitDecision {
            allowed,
            limit: self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(window.count),
            reset_after: (window.started + window_len).saturating_duration_since(now),
        }
    }

    /// Remove every expired window, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// [`sweep`](Self::sweep) against an explicit clock reading.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        self.sweep_locked(&mut table, now)
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .windows
            .len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every window.
    pub fn clear(&self) {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .windows
            .clear();
    }

    fn sweep_locked(&self, table: &mut Table, now: Instant) -> usize {
        let window_len = self.config.window;
        let before = table.windows.len();
        table
            .windows
            .retain(|_, w| now.duration_since(w.started) < window_len);
        table.last_sweep = now;
        let removed = before - table.windows.len();
        if removed > 0 {
            log::debug!("Rate limit '{}' swept {removed} expired window(s)", self.name);
        }
        removed
    }

    fn make_room(&self, table: &mut Table, now: Instant) {
        self.sweep_locked(table, now);
        while table.windows.len() >= self.config.max_entries {
            let oldest = table
                .windows
                .iter()
                .min_by_key(|(_, w)| w.started)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    table.windows.remove(&key);
                    log::warn!(
                        "Rate limit '{}' table full ({} keys), evicted '{key}'",
                        self.name,
                        self.config.max_entries
                    );
                }
                None => break,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limiter(max: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(
            "test",
            RateLimitConfig::new(max, Duration::from_secs(window_secs)),
        )
    }

    #[test]
    fn test_first_request_opens_window() {
        let limiter = limiter(3, 60);
        let decision = limiter.check("1.2.3.4");
        assert!(decision.allowed);
        assert_eq!(decision.limit, 3);
        assert_eq!(decision.remaining, 2);
        assert!(decision.reset_after <= Duration::from_secs(60));
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_request_over_limit_is_denied() {
        let limiter = limiter(3, 60);
        let t0 = Instant::now();
        for i in 0..3 {
            let d = limiter.check_at("k", t0 + Duration::from_secs(i));
            assert!(d.allowed, "request {} should pass", i + 1);
        }
        let denied = limiter.check_at("k", t0 + Duration::from_secs(10));
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_after, Duration::from_secs(50));
        assert_eq!(denied.retry_after_secs(), 50);
    }

    #[test]
    fn test_new_window_after_elapsed() {
        let limiter = limiter(2, 10);
        let t0 = Instant::now();
        assert!(limiter.check_at("k", t0).allowed);
        assert!(limiter.check_at("k", t0).allowed);
        assert!(!limiter.check_at("k", t0 + Duration::from_secs(9)).allowed);

        let later = limiter.check_at("k", t0 + Duration::from_millis(10_001));
        assert!(later.allowed);
        assert_eq!(later.remaining, 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter(1, 60);
        let t0 = Instant::now();
        assert!(limiter.check_at("a", t0).allowed);
        assert!(!limiter.check_at("a", t0).allowed);
        assert!(limiter.check_at("b", t0).allowed);
    }

    #[test]
    fn test_sweep_removes_expired_windows() {
        let limiter = limiter(5, 10);
        let t0 = Instant::now();
        limiter.check_at("old", t0);
        limiter.check_at("fresh", t0 + Duration::from_secs(8));

        let removed = limiter.sweep_at(t0 + Duration::from_secs(11));
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_table_is_bounded() {
        let limiter = RateLimiter::new(
            "bounded",
            RateLimitConfig::new(5, Duration::from_secs(600)).with_max_entries(3),
        );
        let t0 = Instant::now();
        for (i, key) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            limiter.check_at(key, t0 + Duration::from_secs(i as u64));
        }
        assert_eq!(limiter.len(), 3);

        // "a" and "b" were the oldest and got evicted, so "a" starts fresh.
        let d = limiter.check_at("a", t0 + Duration::from_secs(6));
        assert_eq!(d.remaining, 4);
    }

    #[test]
    fn test_clear() {
        let limiter = limiter(1, 60);
        limiter.check("x");
        assert!(!limiter.is_empty());
        limiter.clear();
        assert!(limiter.is_empty());
        assert!(limiter.check("x").allowed);
    }

    #[test]
    fn test_from_settings() {
        let settings = RateLimitSettings {
            max_requests: 10,
            window_secs: 30,
            max_entries: 100,
        };
        let config = RateLimitConfig::from(&settings);
        assert_eq!(config.max_requests, 10);
        assert_eq!(config.window, Duration::from_secs(30));
        assert_eq!(config.max_entries, 100);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let d = RateLimitDecision {
            allowed: false,
            limit: 1,
            remaining: 0,
            reset_after: Duration::from_millis(1_500),
        };
        assert_eq!(d.retry_after_secs(), 2);
        assert!(d.reset_at() > Utc::now());
    }

    proptest! {
        #[test]
        fn test_allowed_count_never_exceeds_limit(max in 1u32..20, requests in 0usize..60) {
            let limiter = limiter(max, 60);
            let t0 = Instant::now();
            let allowed = (0..requests)
                .filter(|_| limiter.check_at("k", t0).allowed)
                .count();
            prop_assert_eq!(allowed, requests.min(max as usize));
        }
    }
}
