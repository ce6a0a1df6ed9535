//! In-memory store implementing every repository trait
//!
//! All three tables live behind one lock, so each operation is atomic the
//! same way a single SQL statement is.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RelationshipRepository, SessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::models::{
    AccessRequest, NewSession, NewUser, Relationship, RelationshipStatus, Session, User,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    relationships: HashMap<Uuid, Relationship>,
}

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of relationship rows stored for the pair.
    pub async fn relationship_rows_for(&self, caregiver_id: Uuid, patient_id: Uuid) -> usize {
        let tables = self.tables.lock().await;
        tables
            .relationships
            .values()
            .filter(|r| r.caregiver_id == caregiver_id && r.patient_id == patient_id)
            .count()
    }

    /// Number of stored sessions, expired ones included.
    pub async fn session_count(&self) -> usize {
        self.tables.lock().await.sessions.len()
    }
}

fn sorted_by_request(mut relationships: Vec<Relationship>) -> Vec<Relationship> {
    relationships.sort_by(|a, b| {
        a.requested_at
            .cmp(&b.requested_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    relationships
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, new_user: NewUser) -> AuthResult<User> {
        let mut tables = self.tables.lock().await;

        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(AuthError::DuplicateEmail);
        }

        let user = User {
            id: new_user.id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            full_name: new_user.full_name,
            role: new_user.role,
            created_at: new_user.created_at,
            updated_at: new_user.created_at,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut tables = self.tables.lock().await;
        let user = tables.users.get_mut(&id).ok_or(AuthError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = updated_at;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert(&self, new_session: NewSession) -> AuthResult<Session> {
        let mut tables = self.tables.lock().await;

        if !tables.users.contains_key(&new_session.user_id) {
            return Err(AuthError::ConstraintViolation(
                "session references an unknown user".to_string(),
            ));
        }
        if tables
            .sessions
            .values()
            .any(|s| s.token_hash == new_session.token_hash)
        {
            return Err(AuthError::ConstraintViolation(
                "duplicate session token".to_string(),
            ));
        }

        let session = Session {
            id: new_session.id,
            user_id: new_session.user_id,
            token_hash: new_session.token_hash,
            created_at: new_session.created_at,
            expires_at: new_session.expires_at,
            last_activity: new_session.created_at,
            ip_address: new_session.ip_address,
            user_agent: new_session.user_agent,
        };
        tables.sessions.insert(session.id, session.clone());

        Ok(session)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AuthResult<Option<Session>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .values()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AuthResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(session) = tables.sessions.get_mut(&id) {
            session.last_activity = at;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AuthResult<()> {
        self.tables.lock().await.sessions.remove(&id);
        Ok(())
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> AuthResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.token_hash != token_hash);
        Ok(tables.sessions.len() < before)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> AuthResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AuthResult<Vec<Session>> {
        let tables = self.tables.lock().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sessions)
    }
}

#[async_trait]
impl RelationshipRepository for MemoryStore {
    async fn open_request(&self, request: AccessRequest) -> AuthResult<Relationship> {
        let mut tables = self.tables.lock().await;

        let existing = tables
            .relationships
            .values_mut()
            .find(|r| r.caregiver_id == request.caregiver_id && r.patient_id == request.patient_id);

        match existing {
            Some(row) if row.status.can_be_rerequested() => {
                row.status = RelationshipStatus::Pending;
                row.requested_at = request.requested_at;
                row.responded_at = None;
                row.notes = request.notes;
                Ok(row.clone())
            }
            Some(_) => Err(AuthError::RequestAlreadyExists),
            None => {
                let relationship = Relationship {
                    id: request.id,
                    caregiver_id: request.caregiver_id,
                    patient_id: request.patient_id,
                    status: RelationshipStatus::Pending,
                    requested_at: request.requested_at,
                    responded_at: None,
                    notes: request.notes,
                };
                tables
                    .relationships
                    .insert(relationship.id, relationship.clone());
                Ok(relationship)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Relationship>> {
        let tables = self.tables.lock().await;
        Ok(tables.relationships.get(&id).cloned())
    }

    async fn find_by_pair(
        &self,
        caregiver_id: Uuid,
        patient_id: Uuid,
    ) -> AuthResult<Option<Relationship>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .relationships
            .values()
            .find(|r| r.caregiver_id == caregiver_id && r.patient_id == patient_id)
            .cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: RelationshipStatus,
        next: RelationshipStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> AuthResult<Option<Relationship>> {
        let mut tables = self.tables.lock().await;

        match tables.relationships.get_mut(&id) {
            Some(row) if row.status == expected => {
                row.status = next;
                if responded_at.is_some() {
                    row.responded_at = responded_at;
                }
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn approved_patients(&self, caregiver_id: Uuid) -> AuthResult<Vec<User>> {
        let tables = self.tables.lock().await;

        let approved: Vec<Relationship> = tables
            .relationships
            .values()
            .filter(|r| r.caregiver_id == caregiver_id && r.status == RelationshipStatus::Approved)
            .cloned()
            .collect();

        Ok(sorted_by_request(approved)
            .iter()
            .filter_map(|r| tables.users.get(&r.patient_id).cloned())
            .collect())
    }

    async fn list_for_patient(
        &self,
        patient_id: Uuid,
        status: RelationshipStatus,
    ) -> AuthResult<Vec<Relationship>> {
        let tables = self.tables.lock().await;

        let matching: Vec<Relationship> = tables
            .relationships
            .values()
            .filter(|r| r.patient_id == patient_id && r.status == status)
            .cloned()
            .collect();

        Ok(sorted_by_request(matching))
    }
}
