//! Access guard consulted before any patient-scoped record is returned

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::models::{Capability, Role};
use crate::relationships::RelationshipRegistry;
use crate::repositories::UserRepository;
use crate::session::SessionManager;

/// Identity resolved from a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
    pub email: String,
}

#[derive(Clone)]
pub struct AccessGuard {
    sessions: SessionManager,
    users: Arc<dyn UserRepository>,
    relationships: RelationshipRegistry,
}

impl AccessGuard {
    pub fn new(
        sessions: SessionManager,
        users: Arc<dyn UserRepository>,
        relationships: RelationshipRegistry,
    ) -> Self {
        Self {
            sessions,
            users,
            relationships,
        }
    }

    /// Validate the session and resolve who is calling.
    ///
    /// A session whose user no longer exists reports `SessionNotFound`.
    pub async fn identify(&self, session_token: &str) -> AuthResult<Caller> {
        let user_id = self.sessions.validate(session_token).await?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        Ok(Caller {
            user_id: user.id,
            role: user.role,
            email: user.email,
        })
    }

    /// Decide whether the session may use `capability` on the patient's records.
    pub async fn authorize(
        &self,
        session_token: &str,
        target_patient_id: Uuid,
        capability: Capability,
    ) -> AuthResult<Caller> {
        let caller = self.identify(session_token).await?;

        let permitted = match caller.role {
            Role::Senior => caller.user_id == target_patient_id,
            Role::Caregiver => {
                self.relationships
                    .has_approved(caller.user_id, target_patient_id)
                    .await?
            }
            // TODO: require an explicit provider-patient assignment once the product defines one
            Role::Provider => true,
        };

        if !permitted {
            warn!(
                "Denied {} access for {} {} to patient {}",
                capability, caller.role, caller.user_id, target_patient_id
            );
            return Err(AuthError::Forbidden);
        }

        debug!(
            "Granted {} access for {} {} to patient {}",
            capability, caller.role, caller.user_id, target_patient_id
        );
        Ok(caller)
    }
}
