//! API service configuration

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3001".to_string(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from defaults overridden by `API_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_addr", Self::default().bind_addr)?
            .add_source(Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn defaults_without_environment() {
        unsafe {
            env::remove_var("API_BIND_ADDR");
        }
        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3001");
    }

    #[test]
    #[serial]
    fn bind_addr_from_environment() {
        unsafe {
            env::set_var("API_BIND_ADDR", "127.0.0.1:8081");
        }
        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8081");
        unsafe {
            env::remove_var("API_BIND_ADDR");
        }
    }
}
