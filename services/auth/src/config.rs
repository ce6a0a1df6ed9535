//! Authentication service configuration

use chrono::Duration;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Upper bound for every `*_secs` setting (one year)
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration for the authentication service
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Session lifetime in seconds (default: 86400 = 24 hours)
    pub session_ttl_secs: u64,
    /// Cron expression for the expired-session sweep (default: every 10 minutes)
    pub sweep_schedule: String,
    /// Failed logins allowed per email inside the window
    pub login_max_attempts: u32,
    /// Window for counting failed logins, in seconds
    pub login_window_secs: u64,
    /// How long an email stays locked out once the limit is hit, in seconds
    pub login_ban_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            session_ttl_secs: 86_400,
            sweep_schedule: "0 */10 * * * *".to_string(),
            login_max_attempts: 5,
            login_window_secs: 300,
            login_ban_secs: 900,
        }
    }
}

impl AuthConfig {
    /// Load configuration from defaults overridden by `AUTH_*` variables
    ///
    /// # Environment Variables
    /// - `AUTH_BIND_ADDR`
    /// - `AUTH_SESSION_TTL_SECS`
    /// - `AUTH_SWEEP_SCHEDULE`
    /// - `AUTH_LOGIN_MAX_ATTEMPTS`
    /// - `AUTH_LOGIN_WINDOW_SECS`
    /// - `AUTH_LOGIN_BAN_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config: AuthConfig = Config::builder()
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("session_ttl_secs", defaults.session_ttl_secs as i64)?
            .set_default("sweep_schedule", defaults.sweep_schedule)?
            .set_default("login_max_attempts", defaults.login_max_attempts as i64)?
            .set_default("login_window_secs", defaults.login_window_secs as i64)?
            .set_default("login_ban_secs", defaults.login_ban_secs as i64)?
            .add_source(Environment::with_prefix("AUTH").try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.session_ttl_secs == 0 {
            return Err(ConfigError::Message(
                "AUTH_SESSION_TTL_SECS must be greater than zero".to_string(),
            ));
        }
        for (name, value) in [
            ("AUTH_SESSION_TTL_SECS", config.session_ttl_secs),
            ("AUTH_LOGIN_WINDOW_SECS", config.login_window_secs),
            ("AUTH_LOGIN_BAN_SECS", config.login_ban_secs),
        ] {
            if value > MAX_DURATION_SECS {
                return Err(ConfigError::Message(format!(
                    "{} must be at most {} seconds",
                    name, MAX_DURATION_SECS
                )));
            }
        }
        if config.login_max_attempts == 0 {
            return Err(ConfigError::Message(
                "AUTH_LOGIN_MAX_ATTEMPTS must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn session_ttl(&self) -> Duration {
        bounded_secs(self.session_ttl_secs)
    }

    pub fn login_window(&self) -> Duration {
        bounded_secs(self.login_window_secs)
    }

    pub fn login_ban(&self) -> Duration {
        bounded_secs(self.login_ban_secs)
    }
}

fn bounded_secs(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_DURATION_SECS) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "AUTH_BIND_ADDR",
        "AUTH_SESSION_TTL_SECS",
        "AUTH_SWEEP_SCHEDULE",
        "AUTH_LOGIN_MAX_ATTEMPTS",
        "AUTH_LOGIN_WINDOW_SECS",
        "AUTH_LOGIN_BAN_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_auth_config_defaults() {
        clear_env();

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.session_ttl_secs, 86_400);
        assert_eq!(config.session_ttl(), Duration::hours(24));
        assert_eq!(config.login_max_attempts, 5);
    }

    #[test]
    #[serial]
    fn test_auth_config_from_env_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("AUTH_SESSION_TTL_SECS", "3600");
            std::env::set_var("AUTH_LOGIN_MAX_ATTEMPTS", "3");
            std::env::set_var("AUTH_BIND_ADDR", "127.0.0.1:4000");
        }

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.session_ttl_secs, 3600);
        assert_eq!(config.login_max_attempts, 3);
        assert_eq!(config.bind_addr, "127.0.0.1:4000");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_auth_config_rejects_oversized_durations() {
        clear_env();
        unsafe {
            std::env::set_var("AUTH_LOGIN_BAN_SECS", "18446744073709551615");
        }
        assert!(AuthConfig::from_env().is_err());

        clear_env();
        unsafe {
            std::env::set_var("AUTH_SESSION_TTL_SECS", "9999999999999");
        }
        assert!(AuthConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_durations_are_clamped() {
        let config = AuthConfig {
            session_ttl_secs: u64::MAX,
            login_window_secs: u64::MAX,
            ..AuthConfig::default()
        };
        let year = Duration::seconds(MAX_DURATION_SECS as i64);
        assert_eq!(config.session_ttl(), year);
        assert_eq!(config.login_window(), year);
    }

    #[test]
    #[serial]
    fn test_auth_config_rejects_zero_ttl() {
        clear_env();
        unsafe {
            std::env::set_var("AUTH_SESSION_TTL_SECS", "0");
        }

        assert!(AuthConfig::from_env().is_err());

        clear_env();
    }
}
