#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use auth::models::{ClientMeta, LoginCredentials, RegisterUser, User};
use auth::{AuthConfig, AuthService, Clock, LoginOutput, ManualClock, MemoryStore};

pub const PASSWORD: &str = "Sunfl0wer!";

/// Service over a fresh in-memory store with a controllable clock
pub struct Harness {
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub service: AuthService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AuthConfig::default())
    }

    pub fn with_config(config: AuthConfig) -> Self {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
        let service = AuthService::in_memory(store.clone(), Arc::new(clock.clone()), &config);

        Self {
            store,
            clock,
            service,
        }
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn user(&self, email: &str, role: &str) -> User {
        self.service
            .register(RegisterUser {
                email: email.to_string(),
                password: PASSWORD.to_string(),
                full_name: "Test Person".to_string(),
                role: role.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn login(&self, email: &str) -> LoginOutput {
        self.service
            .login(
                LoginCredentials {
                    email: email.to_string(),
                    password: PASSWORD.to_string(),
                },
                ClientMeta::default(),
            )
            .await
            .unwrap()
    }
}
