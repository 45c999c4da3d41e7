use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Best-effort, process-local rate limiter keyed by caller address, with
/// a sliding window. Good enough for abuse mitigation on the subscribe
/// endpoint; a multi-instance deployment would need a shared counter
/// store keyed by (caller, window) instead.
pub struct RateLimiter {
    max: u32,
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> RateLimiter {
        RateLimiter {
            max,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Records one hit for the caller and reports whether it is allowed.
    pub fn check(&self, caller: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().expect("rate limiter lock");
        // Expire old hits everywhere and drop callers whose window has
        // fully drained, otherwise the map grows with every address the
        // process ever saw.
        hits.retain(|_, entry| {
            entry.retain(|hit| now.duration_since(*hit) < self.window);
            !entry.is_empty()
        });
        let entry = hits.entry(caller.to_string()).or_default();
        if entry.len() >= self.max as usize {
            false
        } else {
            entry.push(now);
            true
        }
    }

    #[cfg(test)]
    fn tracked_callers(&self) -> usize {
        self.hits.lock().expect("rate limiter lock").len()
    }
}
