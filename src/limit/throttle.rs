//! Per-client request throttling with fixed-window counters.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::observability::metrics;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3_600);
const DAY: Duration = Duration::from_secs(86_400);

/// One fixed window: a count and the instant the window began.
///
/// The count resets to zero and the start advances to "now" exactly when the
/// elapsed time since start reaches the window length; within a window the
/// count only increases.
#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    count: u32,
    window_start: Instant,
}

impl WindowCounter {
    fn new(now: Instant) -> Self {
        Self { count: 0, window_start: now }
    }

    /// Reset if elapsed, then report whether the pre-increment count is
    /// still under the ceiling.
    fn roll_and_check(&mut self, now: Instant, length: Duration, ceiling: u32) -> bool {
        if now.duration_since(self.window_start) >= length {
            self.count = 0;
            self.window_start = now;
        }
        self.count < ceiling
    }
}

/// Rolling counters for one client key. Created lazily on first request.
#[derive(Debug, Clone, Copy)]
struct ThrottleState {
    minute: WindowCounter,
    hour: WindowCounter,
    day: WindowCounter,
    last_seen: Instant,
}

impl ThrottleState {
    fn new(now: Instant) -> Self {
        Self {
            minute: WindowCounter::new(now),
            hour: WindowCounter::new(now),
            day: WindowCounter::new(now),
            last_seen: now,
        }
    }
}

/// Bounds per-client request rate across minute/hour/day windows.
///
/// All mutation happens under the per-key DashMap entry lock, so concurrent
/// requests sharing a key never interleave a read-then-write, and requests
/// for distinct keys never contend with each other.
pub struct RateLimiter {
    clients: DashMap<String, ThrottleState>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            clients: DashMap::new(),
            config,
        }
    }

    /// Build the throttle key for a request: authenticated users are limited
    /// per account id, everyone else per source address.
    pub fn client_key(user_id: Option<&str>, remote_ip: &str) -> String {
        match user_id {
            Some(id) => format!("user:{}", id),
            None => format!("ip:{}", remote_ip),
        }
    }

    /// Admit or throttle one request for `key`.
    ///
    /// Only admitted requests increment the counters, and all three windows
    /// are rolled, checked and incremented as one atomic operation.
    pub fn try_admit(&self, key: &str) -> bool {
        self.try_admit_at(key, Instant::now())
    }

    fn try_admit_at(&self, key: &str, now: Instant) -> bool {
        let mut state = self
            .clients
            .entry(key.to_string())
            .or_insert_with(|| ThrottleState::new(now));

        let admitted = state.minute.roll_and_check(now, MINUTE, self.config.requests_per_minute)
            && state.hour.roll_and_check(now, HOUR, self.config.requests_per_hour)
            && state.day.roll_and_check(now, DAY, self.config.requests_per_day);

        if admitted {
            state.minute.count += 1;
            state.hour.count += 1;
            state.day.count += 1;
            state.last_seen = now;
        }
        admitted
    }

    /// Retry-After hint sent with throttled responses, in seconds.
    pub fn retry_after_secs(&self) -> u64 {
        self.config.retry_after_secs
    }

    /// Number of client keys currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Drop keys that have been idle for a full day window. Returns how many
    /// entries were evicted.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, state| now.duration_since(state.last_seen) < DAY);
        let evicted = before - self.clients.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.clients.len(), "Swept idle throttle entries");
            metrics::record_throttle_table_size(self.clients.len());
        }
        evicted
    }

    /// Interval for the background sweeper.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.config.sweep_interval_secs)
    }
}
