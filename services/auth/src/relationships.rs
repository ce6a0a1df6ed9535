//! Relationship registry: caregiver access requests and their lifecycle
//!
//! ```text
//!            request                 respond (patient)
//!   (none) ----------> pending ---------------------> approved
//!                        ^   \                            |
//!                        |    `-----> rejected            | remove (either party)
//!                        |               |                v
//!                        `---- request --+------------ removed
//! ```
//!
//! Re-requesting a rejected or removed pair reuses the existing row.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AuthError, AuthResult};
use crate::models::{AccessRequest, Decision, Relationship, RelationshipStatus, Role, User};
use crate::repositories::{RelationshipRepository, UserRepository};

#[derive(Clone)]
pub struct RelationshipRegistry {
    relationships: Arc<dyn RelationshipRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl RelationshipRegistry {
    pub fn new(
        relationships: Arc<dyn RelationshipRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            relationships,
            users,
            clock,
        }
    }

    async fn has_role(&self, user_id: Uuid, role: Role) -> AuthResult<bool> {
        Ok(self
            .users
            .find_by_id(user_id)
            .await?
            .is_some_and(|u| u.role == role))
    }

    /// Error for a compare-and-set that found the row in another state.
    async fn stale_transition(&self, relationship_id: Uuid) -> AuthError {
        match self.relationships.find_by_id(relationship_id).await {
            Ok(Some(current)) => AuthError::InvalidTransition(current.status),
            Ok(None) => AuthError::NotFound,
            Err(e) => e,
        }
    }

    /// File (or re-file) a caregiver's request to access a senior's records.
    pub async fn request_access(
        &self,
        caregiver_id: Uuid,
        patient_id: Uuid,
        notes: Option<String>,
    ) -> AuthResult<Relationship> {
        if caregiver_id == patient_id {
            return Err(AuthError::SelfRequest);
        }

        if !self.has_role(caregiver_id, Role::Caregiver).await?
            || !self.has_role(patient_id, Role::Senior).await?
        {
            return Err(AuthError::InvalidRoles);
        }

        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        self.relationships
            .open_request(AccessRequest {
                id: Uuid::new_v4(),
                caregiver_id,
                patient_id,
                notes,
                requested_at: self.clock.now(),
            })
            .await
    }

    /// Approve or reject a pending request. Only the target patient may answer.
    pub async fn respond_to_request(
        &self,
        relationship_id: Uuid,
        patient_id: Uuid,
        decision: Decision,
    ) -> AuthResult<Relationship> {
        let relationship = self
            .relationships
            .find_by_id(relationship_id)
            .await?
            .filter(|r| r.patient_id == patient_id)
            .ok_or(AuthError::NotFound)?;

        if relationship.status != RelationshipStatus::Pending {
            return Err(AuthError::InvalidTransition(relationship.status));
        }

        let next = RelationshipStatus::from(decision);
        let updated = self
            .relationships
            .update_status(
                relationship_id,
                RelationshipStatus::Pending,
                next,
                Some(self.clock.now()),
            )
            .await?;

        match updated {
            Some(relationship) => {
                info!("Relationship {} is now {}", relationship.id, relationship.status);
                Ok(relationship)
            }
            // lost a race with another response
            None => Err(self.stale_transition(relationship_id).await),
        }
    }

    /// End an approved relationship. Either party may do this.
    pub async fn remove_relationship(
        &self,
        relationship_id: Uuid,
        user_id: Uuid,
    ) -> AuthResult<Relationship> {
        let relationship = self
            .relationships
            .find_by_id(relationship_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !relationship.involves(user_id) {
            warn!(
                "User {} tried to remove relationship {} they are not part of",
                user_id, relationship_id
            );
            return Err(AuthError::Forbidden);
        }

        if relationship.status != RelationshipStatus::Approved {
            return Err(AuthError::InvalidTransition(relationship.status));
        }

        let updated = self
            .relationships
            .update_status(
                relationship_id,
                RelationshipStatus::Approved,
                RelationshipStatus::Removed,
                None,
            )
            .await?;

        match updated {
            Some(relationship) => {
                info!("Relationship {} removed by user {}", relationship.id, user_id);
                Ok(relationship)
            }
            None => Err(self.stale_transition(relationship_id).await),
        }
    }

    /// Patients this caregiver currently has approved access to.
    pub async fn list_patients_for_caregiver(&self, caregiver_id: Uuid) -> AuthResult<Vec<User>> {
        self.relationships.approved_patients(caregiver_id).await
    }

    /// Requests waiting for this patient's answer, oldest first.
    pub async fn list_pending_requests_for_patient(
        &self,
        patient_id: Uuid,
    ) -> AuthResult<Vec<Relationship>> {
        self.relationships
            .list_for_patient(patient_id, RelationshipStatus::Pending)
            .await
    }

    pub async fn get(&self, relationship_id: Uuid) -> AuthResult<Option<Relationship>> {
        self.relationships.find_by_id(relationship_id).await
    }

    pub async fn has_approved(&self, caregiver_id: Uuid, patient_id: Uuid) -> AuthResult<bool> {
        Ok(self
            .relationships
            .find_by_pair(caregiver_id, patient_id)
            .await?
            .is_some_and(|r| r.status == RelationshipStatus::Approved))
    }
}
