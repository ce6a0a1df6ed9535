//! Relationship repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::RelationshipRepository;
use super::user::user_from_row;
use crate::error::{AuthError, AuthResult};
use crate::models::{AccessRequest, Relationship, RelationshipStatus, User};

const RELATIONSHIP_COLUMNS: &str =
    "id, caregiver_id, patient_id, status, requested_at, responded_at, notes";

/// PostgreSQL relationship repository
#[derive(Clone)]
pub struct PgRelationshipRepository {
    pool: PgPool,
}

impl PgRelationshipRepository {
    /// Create a new relationship repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn relationship_from_row(row: &PgRow) -> AuthResult<Relationship> {
    let status: String = row.try_get("status")?;

    Ok(Relationship {
        id: row.try_get("id")?,
        caregiver_id: row.try_get("caregiver_id")?,
        patient_id: row.try_get("patient_id")?,
        status: status.parse()?,
        requested_at: row.try_get("requested_at")?,
        responded_at: row.try_get("responded_at")?,
        notes: row.try_get("notes")?,
    })
}

#[async_trait]
impl RelationshipRepository for PgRelationshipRepository {
    async fn open_request(&self, request: AccessRequest) -> AuthResult<Relationship> {
        // The conditional DO UPDATE keeps check-and-write in one statement;
        // no row comes back when the existing row is pending or approved.
        let sql = format!(
            "INSERT INTO relationships \
             (id, caregiver_id, patient_id, status, requested_at, responded_at, notes) \
             VALUES ($1, $2, $3, 'pending', $4, NULL, $5) \
             ON CONFLICT (caregiver_id, patient_id) DO UPDATE \
             SET status = 'pending', \
                 requested_at = EXCLUDED.requested_at, \
                 responded_at = NULL, \
                 notes = EXCLUDED.notes \
             WHERE relationships.status IN ('rejected', 'removed') \
             RETURNING {}",
            RELATIONSHIP_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(request.id)
            .bind(request.caregiver_id)
            .bind(request.patient_id)
            .bind(request.requested_at)
            .bind(&request.notes)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let relationship = relationship_from_row(&row)?;
                info!(
                    "Relationship {} is pending for caregiver {} and patient {}",
                    relationship.id, relationship.caregiver_id, relationship.patient_id
                );
                Ok(relationship)
            }
            None => Err(AuthError::RequestAlreadyExists),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Relationship>> {
        let sql = format!("SELECT {} FROM relationships WHERE id = $1", RELATIONSHIP_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(relationship_from_row).transpose()
    }

    async fn find_by_pair(
        &self,
        caregiver_id: Uuid,
        patient_id: Uuid,
    ) -> AuthResult<Option<Relationship>> {
        let sql = format!(
            "SELECT {} FROM relationships WHERE caregiver_id = $1 AND patient_id = $2",
            RELATIONSHIP_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(caregiver_id)
            .bind(patient_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(relationship_from_row).transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: RelationshipStatus,
        next: RelationshipStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> AuthResult<Option<Relationship>> {
        let sql = format!(
            "UPDATE relationships \
             SET status = $3, responded_at = COALESCE($4, responded_at) \
             WHERE id = $1 AND status = $2 \
             RETURNING {}",
            RELATIONSHIP_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(expected.as_str())
            .bind(next.as_str())
            .bind(responded_at)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(relationship_from_row).transpose()
    }

    async fn approved_patients(&self, caregiver_id: Uuid) -> AuthResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.email, u.password_hash, u.full_name, u.role, u.created_at, u.updated_at
            FROM relationships r
            JOIN users u ON u.id = r.patient_id
            WHERE r.caregiver_id = $1 AND r.status = 'approved'
            ORDER BY r.requested_at ASC, r.id ASC
            "#,
        )
        .bind(caregiver_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn list_for_patient(
        &self,
        patient_id: Uuid,
        status: RelationshipStatus,
    ) -> AuthResult<Vec<Relationship>> {
        let sql = format!(
            "SELECT {} FROM relationships \
             WHERE patient_id = $1 AND status = $2 \
             ORDER BY requested_at ASC, id ASC",
            RELATIONSHIP_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(patient_id)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(relationship_from_row).collect()
    }
}
