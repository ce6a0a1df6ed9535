//! Login-attempt limiter for slowing down password guessing

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failed attempts allowed inside one window
    pub max_attempts: u32,
    /// Time window
    pub window: Duration,
    /// Ban duration once the limit is reached
    pub ban_duration: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::minutes(5),
            ban_duration: Duration::minutes(15),
        }
    }
}

impl From<&AuthConfig> for RateLimiterConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            max_attempts: config.login_max_attempts,
            window: config.login_window(),
            ban_duration: config.login_ban(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    failures: u32,
    window_started: DateTime<Utc>,
    banned_until: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_lapsed(&self, now: DateTime<Utc>, config: &RateLimiterConfig) -> bool {
        let banned = self.banned_until.is_some_and(|until| now < until);
        !banned && now - self.window_started >= config.window
    }
}

/// Per-key attempt counter with temporary bans
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reserve one login attempt for `key`.
    ///
    /// The ban check and the count happen under one lock, so concurrent
    /// attempts cannot all slip past the limit. Every reserved attempt counts
    /// as a failure until [`RateLimiter::reset`] is called after a success.
    pub async fn try_acquire(&self, key: &str) -> AuthResult<()> {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now();

        let entry = entries.entry(key.to_string()).or_insert(Entry {
            failures: 0,
            window_started: now,
            banned_until: None,
        });

        if entry.banned_until.is_some_and(|until| now < until) {
            return Err(AuthError::RateLimited);
        }
        // a finished ban starts a fresh window
        if entry.banned_until.is_some() || entry.is_lapsed(now, &self.config) {
            entry.failures = 0;
            entry.window_started = now;
            entry.banned_until = None;
        }

        entry.failures += 1;
        if entry.failures >= self.config.max_attempts {
            entry.banned_until = Some(now + self.config.ban_duration);
            warn!(
                "Login locked for {} seconds after {} attempts",
                self.config.ban_duration.num_seconds(),
                entry.failures
            );
        }

        Ok(())
    }

    /// Forget a key after a successful attempt.
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    /// Drop keys whose window and ban have both run out. Returns how many.
    pub async fn prune(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now();

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_lapsed(now, &self.config));
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(clock: &ManualClock) -> RateLimiter {
        RateLimiter::new(
            RateLimiterConfig {
                max_attempts: 3,
                window: Duration::minutes(5),
                ban_duration: Duration::minutes(15),
            },
            Arc::new(clock.clone()),
        )
    }

    #[tokio::test]
    async fn bans_after_max_attempts_then_lifts() {
        let clock = ManualClock::new(Utc::now());
        let limiter = limiter(&clock);

        for _ in 0..3 {
            limiter.try_acquire("rose@example.org").await.unwrap();
        }
        assert!(matches!(
            limiter.try_acquire("rose@example.org").await,
            Err(AuthError::RateLimited)
        ));
        // other keys are unaffected
        assert!(limiter.try_acquire("amy@example.org").await.is_ok());

        clock.advance(Duration::minutes(16));
        assert!(limiter.try_acquire("rose@example.org").await.is_ok());
    }

    #[tokio::test]
    async fn attempts_outside_window_do_not_accumulate() {
        let clock = ManualClock::new(Utc::now());
        let limiter = limiter(&clock);

        limiter.try_acquire("rose@example.org").await.unwrap();
        limiter.try_acquire("rose@example.org").await.unwrap();
        clock.advance(Duration::minutes(6));
        limiter.try_acquire("rose@example.org").await.unwrap();

        assert!(limiter.try_acquire("rose@example.org").await.is_ok());
    }

    #[tokio::test]
    async fn reset_clears_attempts() {
        let clock = ManualClock::new(Utc::now());
        let limiter = limiter(&clock);

        limiter.try_acquire("rose@example.org").await.unwrap();
        limiter.try_acquire("rose@example.org").await.unwrap();
        limiter.reset("rose@example.org").await;
        limiter.try_acquire("rose@example.org").await.unwrap();

        assert!(limiter.try_acquire("rose@example.org").await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_attempts_respect_the_limit() {
        let clock = ManualClock::new(Utc::now());
        let limiter = limiter(&clock);

        let mut handles = Vec::new();
        for _ in 0..24 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.try_acquire("rose@example.org").await
            }));
        }

        let mut granted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => granted += 1,
                Err(e) => assert!(matches!(e, AuthError::RateLimited)),
            }
        }
        assert_eq!(granted, 3);
    }

    #[tokio::test]
    async fn prune_drops_only_lapsed_keys() {
        let clock = ManualClock::new(Utc::now());
        let limiter = limiter(&clock);

        limiter.try_acquire("amy@example.org").await.unwrap();
        limiter.try_acquire("clara@example.org").await.unwrap();
        for _ in 0..3 {
            limiter.try_acquire("rose@example.org").await.unwrap();
        }

        // windows over, rose still banned
        clock.advance(Duration::minutes(6));
        assert_eq!(limiter.prune().await, 2);
        assert!(matches!(
            limiter.try_acquire("rose@example.org").await,
            Err(AuthError::RateLimited)
        ));

        clock.advance(Duration::minutes(10));
        assert_eq!(limiter.prune().await, 1);
        assert_eq!(limiter.prune().await, 0);
        assert!(limiter.try_acquire("rose@example.org").await.is_ok());
    }
}
