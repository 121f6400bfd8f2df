//! Fixed-window per-IP rate limiting for the read API.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Requests allowed per window per client address.
const WINDOW: Duration = Duration::from_secs(60);
const LIMIT: u32 = 60;

pub struct RateLimiter {
    windows: Mutex<HashMap<IpAddr, (Instant, u32)>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Account one request. Returns false when the caller is over budget.
    pub fn allow(&self, addr: IpAddr) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("rate limit table poisoned");

        let entry = windows.entry(addr).or_insert((now, 0));
        if now.duration_since(entry.0) >= WINDOW {
            *entry = (now, 0);
        }
        entry.1 += 1;
        entry.1 <= LIMIT
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_trips_after_budget() {
        let limiter = RateLimiter::new();
        let addr: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..LIMIT {
            assert!(limiter.allow(addr));
        }
        assert!(!limiter.allow(addr));

        // a different client has its own window
        let other: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(limiter.allow(other));
    }
}
