//! Circuit breaker state machine.
//!
//! # States
//! - Closed: normal operation, calls pass through and are recorded
//! - Open: downstream assumed down, calls fail fast
//! - Half-Open: bounded probes test whether the downstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure rate over the sliding window >= threshold,
//!                once minimum_calls outcomes are recorded
//! Open → Half-Open: automatically, after open_duration elapses
//! Half-Open → Closed: half_open_trial_count consecutive probe successes
//! Half-Open → Open: any probe failure (timer restarts)
//! ```
//!
//! Half-Open is reachable only from Open; transitions never skip a state.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::ServiceConfig;
use crate::observability::metrics;

/// Breaker operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerMode {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakerMode::Closed => "closed",
            BreakerMode::Open => "open",
            BreakerMode::HalfOpen => "half-open",
        }
    }
}

/// Tuning parameters for one breaker instance.
#[derive(Debug, Clone)]
pub struct BreakerSettings {
    pub sliding_window_size: usize,
    pub minimum_calls: usize,
    pub failure_rate_threshold: f32,
    pub open_duration: Duration,
    pub half_open_trial_count: usize,
}

impl From<&ServiceConfig> for BreakerSettings {
    fn from(service: &ServiceConfig) -> Self {
        Self {
            sliding_window_size: service.sliding_window_size,
            minimum_calls: service.minimum_calls,
            failure_rate_threshold: service.failure_rate_threshold,
            open_duration: service.open_duration(),
            half_open_trial_count: service.half_open_trial_count,
        }
    }
}

/// State behind the breaker's lock.
#[derive(Debug)]
struct Inner {
    mode: BreakerMode,
    /// Last N call outcomes, true = failure. Only maintained while Closed.
    outcomes: VecDeque<bool>,
    /// When the breaker last entered Open.
    opened_at: Option<Instant>,
    /// Probes admitted since entering Half-Open.
    probes_issued: usize,
    /// Consecutive probe successes since entering Half-Open.
    probe_successes: usize,
}

/// Failure-isolation state machine for one downstream service.
///
/// Internally synchronized; callers never need external locking. The lock is
/// held only for constant-time bookkeeping, never across a downstream call.
pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            inner: Mutex::new(Inner {
                mode: BreakerMode::Closed,
                outcomes: VecDeque::new(),
                opened_at: None,
                probes_issued: 0,
                probe_successes: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current mode snapshot (for health reporting).
    pub fn mode(&self) -> BreakerMode {
        self.inner.lock().expect("breaker mutex poisoned").mode
    }

    /// Ask permission to place one call.
    ///
    /// Returns false when the breaker is Open and the cool-down has not
    /// elapsed, or when Half-Open and all probe slots are taken. An admitted
    /// call must later be reported via [`record_success`](Self::record_success)
    /// or [`record_failure`](Self::record_failure).
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        match inner.mode {
            BreakerMode::Closed => true,
            BreakerMode::Open => {
                let opened_at = inner.opened_at.expect("open breaker missing timestamp");
                if now.duration_since(opened_at) >= self.settings.open_duration {
                    self.transition(&mut inner, BreakerMode::HalfOpen);
                    // The call that triggered the transition is the first probe.
                    inner.probes_issued = 1;
                    true
                } else {
                    false
                }
            }
            BreakerMode::HalfOpen => {
                if inner.probes_issued < self.settings.half_open_trial_count {
                    inner.probes_issued += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Report a successful call outcome.
    pub fn record_success(&self) {
        self.record_at(false, Instant::now());
    }

    /// Report a failed call outcome (connect error, timeout, gateway-class
    /// upstream status).
    pub fn record_failure(&self) {
        self.record_at(true, Instant::now());
    }

    /// Return a slot obtained from [`try_acquire`](Self::try_acquire) without
    /// recording an outcome, when the call was never placed. The outcome
    /// window only ever holds real call results.
    pub fn release(&self) {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        if inner.mode == BreakerMode::HalfOpen && inner.probes_issued > 0 {
            inner.probes_issued -= 1;
        }
    }

    fn record_at(&self, failure: bool, now: Instant) {
        let mut inner = self.inner.lock().expect("breaker mutex poisoned");
        match inner.mode {
            BreakerMode::Closed => {
                inner.outcomes.push_back(failure);
                while inner.outcomes.len() > self.settings.sliding_window_size {
                    inner.outcomes.pop_front();
                }
                if inner.outcomes.len() >= self.settings.minimum_calls
                    && self.failure_rate(&inner) >= self.settings.failure_rate_threshold
                {
                    self.transition(&mut inner, BreakerMode::Open);
                    inner.opened_at = Some(now);
                    inner.outcomes.clear();
                }
            }
            BreakerMode::HalfOpen => {
                if failure {
                    // Any probe failure reopens with a fresh timer.
                    self.transition(&mut inner, BreakerMode::Open);
                    inner.opened_at = Some(now);
                } else {
                    inner.probe_successes += 1;
                    if inner.probe_successes >= self.settings.half_open_trial_count {
                        self.transition(&mut inner, BreakerMode::Closed);
                    }
                }
            }
            // A call admitted earlier may complete after the breaker already
            // opened (e.g. the client disconnected mid-flight). Its outcome
            // can no longer affect the open timer.
            BreakerMode::Open => {}
        }
    }

    fn failure_rate(&self, inner: &Inner) -> f32 {
        let failures = inner.outcomes.iter().filter(|&&f| f).count();
        failures as f32 * 100.0 / inner.outcomes.len() as f32
    }

    fn transition(&self, inner: &mut Inner, to: BreakerMode) {
        tracing::info!(
            service = %self.name,
            from = inner.mode.as_str(),
            to = to.as_str(),
            "Circuit breaker transition"
        );
        metrics::record_breaker_transition(&self.name, to.as_str());
        inner.mode = to;
        inner.probes_issued = 0;
        inner.probe_successes = 0;
        if to == BreakerMode::Closed {
            inner.outcomes.clear();
            inner.opened_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BreakerSettings {
        BreakerSettings {
            sliding_window_size: 10,
            minimum_calls: 5,
            failure_rate_threshold: 50.0,
            open_duration: Duration::from_secs(30),
            half_open_trial_count: 3,
        }
    }

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new("user-service", settings())
    }

    #[test]
    fn stays_closed_below_minimum_calls() {
        let breaker = breaker();
        for _ in 0..4 {
            assert!(breaker.try_acquire());
            breaker.record_failure();
        }
        // Four failures is 100% but below minimum_calls.
        assert_eq!(breaker.mode(), BreakerMode::Closed);
    }

    #[test]
    fn opens_once_failure_rate_reached() {
        let breaker = breaker();
        for failure in [true, false, true, false, true] {
            assert!(breaker.try_acquire());
            if failure {
                breaker.record_failure();
            } else {
                breaker.record_success();
            }
        }
        // 3 failures out of 5 = 60% >= 50%.
        assert_eq!(breaker.mode(), BreakerMode::Open);
        assert!(!breaker.try_acquire());
    }

    #[test]
    fn open_rejects_until_cooldown_then_probes() {
        let breaker = breaker();
        let start = Instant::now();
        for _ in 0..5 {
            breaker.record_at(true, start);
        }
        assert_eq!(breaker.mode(), BreakerMode::Open);

        assert!(!breaker.try_acquire_at(start + Duration::from_secs(29)));
        // Cool-down elapsed: the next call is admitted as the first probe.
        assert!(breaker.try_acquire_at(start + Duration::from_secs(30)));
        assert_eq!(breaker.mode(), BreakerMode::HalfOpen);
    }

    #[test]
    fn half_open_closes_after_consecutive_successes() {
        let breaker = breaker();
        let start = Instant::now();
        for _ in 0..5 {
            breaker.record_at(true, start);
        }
        let after = start + Duration::from_secs(30);

        for _ in 0..3 {
            assert!(breaker.try_acquire_at(after));
            breaker.record_at(false, after);
        }
        assert_eq!(breaker.mode(), BreakerMode::Closed);
        // Window was reset: old failures no longer count.
        assert!(breaker.try_acquire());
    }

    #[test]
    fn probe_failure_reopens_with_fresh_timer() {
        let breaker = breaker();
        let start = Instant::now();
        for _ in 0..5 {
            breaker.record_at(true, start);
        }
        let probe_time = start + Duration::from_secs(30);
        assert!(breaker.try_acquire_at(probe_time));
        breaker.record_at(true, probe_time);

        assert_eq!(breaker.mode(), BreakerMode::Open);
        // The original timer would have expired; the restarted one has not.
        assert!(!breaker.try_acquire_at(start + Duration::from_secs(31)));
        assert!(breaker.try_acquire_at(probe_time + Duration::from_secs(30)));
    }

    #[test]
    fn half_open_admits_bounded_probe_count() {
        let breaker = breaker();
        let start = Instant::now();
        for _ in 0..5 {
            breaker.record_at(true, start);
        }
        let after = start + Duration::from_secs(30);

        // Three trial slots, no outcomes reported yet.
        assert!(breaker.try_acquire_at(after));
        assert!(breaker.try_acquire_at(after));
        assert!(breaker.try_acquire_at(after));
        assert!(!breaker.try_acquire_at(after));
    }

    #[test]
    fn sliding_window_forgets_old_failures() {
        let breaker = CircuitBreaker::new("account-service", settings());
        for _ in 0..2 {
            breaker.record_success();
            breaker.record_success();
            breaker.record_failure();
        }
        // 2 failures of 6 = 33%, still closed.
        assert_eq!(breaker.mode(), BreakerMode::Closed);
        for _ in 0..8 {
            breaker.record_success();
        }
        // Window is now all recent successes plus at most two old failures
        // pushed out; still closed.
        assert_eq!(breaker.mode(), BreakerMode::Closed);
    }

    #[test]
    fn released_slots_leave_the_outcome_window_untouched() {
        let breaker = breaker();
        for _ in 0..4 {
            assert!(breaker.try_acquire());
            breaker.record_failure();
        }
        // Acquired but never-placed calls contribute no outcomes.
        for _ in 0..10 {
            assert!(breaker.try_acquire());
            breaker.release();
        }
        assert_eq!(breaker.mode(), BreakerMode::Closed);

        // The fifth real outcome makes 5 failures of 5 recorded calls.
        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.mode(), BreakerMode::Open);
    }

    #[test]
    fn released_probe_slot_is_reusable_in_half_open() {
        let breaker = breaker();
        let start = Instant::now();
        for _ in 0..5 {
            breaker.record_at(true, start);
        }
        let after = start + Duration::from_secs(30);

        assert!(breaker.try_acquire_at(after));
        assert!(breaker.try_acquire_at(after));
        assert!(breaker.try_acquire_at(after));
        assert!(!breaker.try_acquire_at(after));

        breaker.release();
        assert!(breaker.try_acquire_at(after));
        assert!(!breaker.try_acquire_at(after));
    }

    #[test]
    fn late_outcome_while_open_is_ignored() {
        let breaker = breaker();
        let start = Instant::now();
        for _ in 0..5 {
            breaker.record_at(true, start);
        }
        assert_eq!(breaker.mode(), BreakerMode::Open);

        // An in-flight call completing now must not disturb the open timer.
        breaker.record_at(false, start + Duration::from_secs(1));
        assert_eq!(breaker.mode(), BreakerMode::Open);
        assert!(breaker.try_acquire_at(start + Duration::from_secs(30)));
    }
}
