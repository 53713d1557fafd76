use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_after: Duration,
}

/// Injected throttling capability. Correctness across multiple server
/// instances requires an implementation backed by a shared store with TTL
/// semantics; [`MemoryRateLimiter`] covers single-process deployments and
/// tests.
pub trait RateLimiter: Send + Sync {
    fn check(&self, key: &str, limit: u32, window: Duration) -> RateDecision;
}

/// Fixed-window counter per key, kept behind a process-local mutex.
#[derive(Default)]
pub struct MemoryRateLimiter {
    windows: Mutex<HashMap<String, WindowState>>,
}

struct WindowState {
    count: u32,
    opened_at: Instant,
}

impl RateLimiter for MemoryRateLimiter {
    fn check(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        let mut guard = self.windows.lock().expect("limiter mutex poisoned");
        let now = Instant::now();
        let state = guard.entry(key.to_string()).or_insert(WindowState {
            count: 0,
            opened_at: now,
        });

        let elapsed = now.duration_since(state.opened_at);
        if elapsed >= window {
            state.count = 0;
            state.opened_at = now;
        }

        let reset_after = window.saturating_sub(now.duration_since(state.opened_at));
        if state.count >= limit {
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }

        state.count += 1;
        RateDecision {
            allowed: true,
            remaining: limit - state.count,
            reset_after,
        }
    }
}

/// Limiter that never throttles, for wiring paths where throttling is
/// disabled.
pub struct UnlimitedRateLimiter;

impl RateLimiter for UnlimitedRateLimiter {
    fn check(&self, _key: &str, limit: u32, window: Duration) -> RateDecision {
        RateDecision {
            allowed: true,
            remaining: limit,
            reset_after: window,
        }
    }
}
