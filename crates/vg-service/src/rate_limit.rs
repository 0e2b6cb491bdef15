//! Per-client fixed-window request limiting.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counts requests per client IP in fixed windows.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clients: DashMap<IpAddr, Window>,
}

impl RateLimiter {
    /// `max_requests == 0` disables limiting.
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            clients: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Record a request from `client` at `now`.
    pub fn check(&self, client: IpAddr, now: Instant) -> RateDecision {
        if !self.is_enabled() {
            return RateDecision::Allowed {
                remaining: u32::MAX,
            };
        }

        let mut entry = self.clients.entry(client).or_insert(Window {
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
            let retry_after = self
                .window
                .saturating_sub(now.saturating_duration_since(entry.started));
            return RateDecision::Limited { retry_after };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    /// Drop windows that have expired. Returns how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before.saturating_sub(self.clients.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}
