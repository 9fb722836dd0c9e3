//! Login throttle for slowing down password guessing

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Failed attempts allowed inside one window
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,       // 5 minutes
            ban_duration_seconds: 900, // 15 minutes
        }
    }
}

/// Tracked keys above which `record_failure` drops stale entries
const MAX_TRACKED_KEYS: usize = 10_000;

/// Rate limiter entry
#[derive(Debug)]
struct RateLimiterEntry {
    /// Failed attempts in the current window
    attempts: u32,
    /// Start of the current window
    window_start: Instant,
    /// Ban expiration time
    ban_expires: Option<Instant>,
}

impl RateLimiterEntry {
    /// No active ban and the failure window has passed
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        match self.ban_expires {
            Some(ban_expires) => now >= ban_expires,
            None => now.duration_since(self.window_start) >= window,
        }
    }
}

/// Per-key failure counter with temporary bans
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_seconds)
    }

    /// Whether `key` may attempt a login right now
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let window = self.window();

        match entries
            .get(key)
            .map(|entry| (entry.is_stale(now, window), entry.ban_expires.is_some()))
        {
            Some((true, _)) => {
                // Ban or window over, start over
                entries.remove(key);
                true
            }
            Some((false, banned)) => !banned,
            None => true,
        }
    }

    /// Count a failed attempt, banning `key` once the limit is reached
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = self.window();

        if entries.len() >= MAX_TRACKED_KEYS {
            entries.retain(|_, entry| !entry.is_stale(now, window));
            debug!("Pruned login throttle, {} keys tracked", entries.len());
        }

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            attempts: 0,
            window_start: now,
            ban_expires: None,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.attempts = 0;
            entry.window_start = now;
        }

        entry.attempts += 1;

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            info!(
                "Banned login for {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
        }
    }

    /// Forget the failures recorded for `key`
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bans_after_max_attempts() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 3,
            window_seconds: 300,
            ban_duration_seconds: 900,
        });

        for _ in 0..2 {
            limiter.record_failure("ada").await;
            assert!(limiter.is_allowed("ada").await);
        }

        limiter.record_failure("ada").await;
        assert!(!limiter.is_allowed("ada").await);
        assert!(limiter.is_allowed("grace").await);
    }

    #[tokio::test]
    async fn test_reset_clears_failures() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 2,
            ..RateLimiterConfig::default()
        });

        limiter.record_failure("ada").await;
        limiter.reset("ada").await;
        limiter.record_failure("ada").await;

        assert!(limiter.is_allowed("ada").await);
    }

    #[tokio::test]
    async fn test_ban_expires() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 1,
            window_seconds: 300,
            ban_duration_seconds: 0,
        });

        limiter.record_failure("ada").await;

        assert!(limiter.is_allowed("ada").await);
    }

    #[tokio::test]
    async fn test_lapsed_window_forgets_key() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 5,
            window_seconds: 0,
            ban_duration_seconds: 900,
        });

        for i in 0..100 {
            limiter.record_failure(&format!("user{}", i)).await;
        }
        for i in 0..100 {
            assert!(limiter.is_allowed(&format!("user{}", i)).await);
        }

        assert!(limiter.entries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_keys_are_pruned_at_capacity() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 5,
            window_seconds: 0,
            ban_duration_seconds: 900,
        });

        for i in 0..=MAX_TRACKED_KEYS {
            limiter.record_failure(&format!("user{}", i)).await;
        }

        assert_eq!(limiter.entries.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_active_ban_survives_pruning() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 1,
            window_seconds: 0,
            ban_duration_seconds: 900,
        });

        limiter.record_failure("ada").await;
        for i in 0..MAX_TRACKED_KEYS {
            limiter.entries.lock().await.insert(
                format!("user{}", i),
                RateLimiterEntry {
                    attempts: 1,
                    window_start: Instant::now(),
                    ban_expires: Some(Instant::now()),
                },
            );
        }
        limiter.record_failure("grace").await;

        assert!(!limiter.is_allowed("ada").await);
        assert_eq!(limiter.entries.lock().await.len(), 2);
    }
}
