//! Per-client request rate limiting.
//!
//! The HTTP layer only consumes a [`RateDecision`]; how requests are counted
//! is up to the [`RateLimitPolicy`] behind it.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Tracked clients above which expired windows are swept, at most once per window
const PRUNE_THRESHOLD: usize = 1024;

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request may proceed
    Allow {
        /// Requests left in the current window
        remaining: u32,
    },
    /// Request must be rejected without doing any work
    Reject {
        /// Time until the window resets
        retry_after: Duration,
    },
}

/// A pass/reject policy keyed by client address
pub trait RateLimitPolicy: Send + Sync {
    /// Record one request from `client` and decide whether it may proceed
    fn check(&self, client: IpAddr) -> RateDecision;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Default)]
struct Clients {
    windows: HashMap<IpAddr, Window>,
    last_swept: Option<Instant>,
}

/// Fixed-window counter per client address
///
/// Each address gets `max_requests` per window; the window starts with the
/// first request and resets once it has fully elapsed. Rejected requests are
/// not counted.
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<Clients>,
}

impl FixedWindowLimiter {
    /// Create a limiter
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(Clients::default()),
        }
    }

    /// Create a limiter from configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    /// Decide for a request arriving at `now`
    pub fn check_at(&self, client: IpAddr, now: Instant) -> RateDecision {
        let mut clients = self.lock();
        let window = self.window;

        let sweep_due = clients
            .last_swept
            .map_or(true, |at| now.saturating_duration_since(at) >= window);
        if clients.windows.len() > PRUNE_THRESHOLD && sweep_due {
            clients
                .windows
                .retain(|_, w| now.saturating_duration_since(w.started) < window);
            clients.last_swept = Some(now);
        }

        let entry = clients.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            return RateDecision::Reject {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        entry.count += 1;
        RateDecision::Allow {
            remaining: self.max_requests - entry.count,
        }
    }

    /// Number of addresses currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.lock().windows.len()
    }

    fn lock(&self) -> MutexGuard<'_, Clients> {
        self.clients.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RateLimitPolicy for FixedWindowLimiter {
    fn check(&self, client: IpAddr) -> RateDecision {
        self.check_at(client, Instant::now())
    }
}
