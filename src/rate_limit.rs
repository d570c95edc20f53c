//! Fixed-window attempt counter with a block period, keyed by client address.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::config::RateLimitConfig;

/// Entries are pruned once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
    blocked_until: Option<Instant>,
}

pub struct FixedWindowLimiter {
    max_attempts: u32,
    window: Duration,
    block: Duration,
    entries: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(max_attempts: u32, window: Duration, block: Duration) -> Self {
        Self {
            max_attempts,
            window,
            block,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self::new(
            cfg.max_attempts,
            Duration::from_secs(cfg.window_secs),
            Duration::from_secs(cfg.block_secs),
        )
    }

    /// Records one attempt. `Err` carries how long the key stays blocked.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    pub(crate) fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() > PRUNE_THRESHOLD {
            let window = self.window;
            entries.retain(|_, w| {
                w.blocked_until.is_some_and(|until| until > now) || now.duration_since(w.started) < window
            });
        }

        let w = entries.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
            blocked_until: None,
        });

        if let Some(until) = w.blocked_until {
            if until > now {
                return Err(until - now);
            }
            *w = Window { started: now, count: 0, blocked_until: None };
        }
        if now.duration_since(w.started) >= self.window {
            w.started = now;
            w.count = 0;
        }

        w.count += 1;
        if w.count > self.max_attempts {
            w.blocked_until = Some(now + self.block);
            return Err(self.block);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> FixedWindowLimiter {
        FixedWindowLimiter::new(3, Duration::from_secs(60), Duration::from_secs(300))
    }

    #[test]
    fn allows_up_to_limit_then_blocks() {
        let l = limiter();
        let t0 = Instant::now();
        for _ in 0..3 {
            assert!(l.check_at("1.2.3.4", t0).is_ok());
        }
        assert_eq!(l.check_at("1.2.3.4", t0), Err(Duration::from_secs(300)));
        // other keys are unaffected
        assert!(l.check_at("5.6.7.8", t0).is_ok());
    }

    #[test]
    fn block_outlasts_the_window() {
        let l = limiter();
        let t0 = Instant::now();
        for _ in 0..4 {
            let _ = l.check_at("k", t0);
        }
        let later = t0 + Duration::from_secs(120);
        assert_eq!(l.check_at("k", later), Err(Duration::from_secs(180)));
        let after_block = t0 + Duration::from_secs(301);
        assert!(l.check_at("k", after_block).is_ok());
    }

    #[test]
    fn window_resets_counter() {
        let l = limiter();
        let t0 = Instant::now();
        for _ in 0..3 {
            l.check_at("k", t0).unwrap();
        }
        let next_window = t0 + Duration::from_secs(61);
        for _ in 0..3 {
            assert!(l.check_at("k", next_window).is_ok());
        }
    }
}
