//! PostgreSQL implementation of PlanSessionRepository.
//!
//! Belief and observation snapshots are stored as JSONB; everything the
//! session lookup filters on is a plain column.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    ConversationId, CustomerId, DomainError, ErrorCode, PlanNodeId, PlanSessionId, TenantId,
    Timestamp,
};
use crate::domain::planning::{BeliefState, ObservedState, PlanSession, PlanSessionStatus};
use crate::ports::PlanSessionRepository;

use super::{column, db_error};

/// PostgreSQL implementation of PlanSessionRepository.
#[derive(Clone)]
pub struct PostgresPlanSessionRepository {
    pool: PgPool,
}

impl PostgresPlanSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    id, tenant_id, conversation_id, customer_id, belief, observed_state,
    max_depth, explored_paths, completed_actions, root_node_id, current_node_id,
    status, created_at, updated_at, expires_at
"#;

#[async_trait]
impl PlanSessionRepository for PostgresPlanSessionRepository {
    async fn save(&self, session: &PlanSession) -> Result<(), DomainError> {
        let belief = serde_json::to_value(session.belief())
            .map_err(|e| db_error(&format!("Failed to encode belief: {}", e)))?;
        let observed = serde_json::to_value(session.observed_state())
            .map_err(|e| db_error(&format!("Failed to encode observed state: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO plan_sessions (
                id, tenant_id, conversation_id, customer_id, belief, observed_state,
                max_depth, explored_paths, completed_actions, root_node_id, current_node_id,
                status, created_at, updated_at, expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.tenant_id().as_str())
        .bind(session.conversation_id().map(|c| c.as_str()))
        .bind(session.customer_id().as_str())
        .bind(belief)
        .bind(observed)
        .bind(session.max_depth() as i32)
        .bind(session.explored_paths() as i32)
        .bind(session.completed_actions() as i32)
        .bind(session.root_node_id().map(|id| *id.as_uuid()))
        .bind(session.current_node_id().map(|id| *id.as_uuid()))
        .bind(session.status().as_str())
        .bind(session.created_at().as_datetime())
        .bind(session.updated_at().as_datetime())
        .bind(session.expires_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to insert plan session: {}", e)))?;

        Ok(())
    }

    async fn update(&self, session: &PlanSession) -> Result<(), DomainError> {
        let belief = serde_json::to_value(session.belief())
            .map_err(|e| db_error(&format!("Failed to encode belief: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE plan_sessions SET
                belief = $2,
                explored_paths = $3,
                completed_actions = $4,
                root_node_id = $5,
                current_node_id = $6,
                status = $7,
                updated_at = $8,
                expires_at = $9
            WHERE id = $1
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(belief)
        .bind(session.explored_paths() as i32)
        .bind(session.completed_actions() as i32)
        .bind(session.root_node_id().map(|id| *id.as_uuid()))
        .bind(session.current_node_id().map(|id| *id.as_uuid()))
        .bind(session.status().as_str())
        .bind(session.updated_at().as_datetime())
        .bind(session.expires_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to update plan session: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Plan session not found: {}", session.id()),
            ));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &PlanSessionId) -> Result<Option<PlanSession>, DomainError> {
        let query = format!("SELECT {} FROM plan_sessions WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&format!("Failed to fetch plan session: {}", e)))?;

        row.map(row_to_session).transpose()
    }

    async fn find_latest_by_conversation(
        &self,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
    ) -> Result<Option<PlanSession>, DomainError> {
        let query = format!(
            "SELECT {} FROM plan_sessions \
             WHERE tenant_id = $1 AND conversation_id = $2 \
             ORDER BY updated_at DESC, created_at DESC \
             LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(tenant_id.as_str())
            .bind(conversation_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(&format!("Failed to fetch latest plan session: {}", e)))?;

        row.map(row_to_session).transpose()
    }
}

fn row_to_session(row: PgRow) -> Result<PlanSession, DomainError> {
    let id: Uuid = column(&row, "id")?;
    let tenant_id: String = column(&row, "tenant_id")?;
    let conversation_id: Option<String> = column(&row, "conversation_id")?;
    let customer_id: String = column(&row, "customer_id")?;
    let belief: serde_json::Value = column(&row, "belief")?;
    let observed_state: serde_json::Value = column(&row, "observed_state")?;
    let max_depth: i32 = column(&row, "max_depth")?;
    let explored_paths: i32 = column(&row, "explored_paths")?;
    let completed_actions: i32 = column(&row, "completed_actions")?;
    let root_node_id: Option<Uuid> = column(&row, "root_node_id")?;
    let current_node_id: Option<Uuid> = column(&row, "current_node_id")?;
    let status: String = column(&row, "status")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = column(&row, "updated_at")?;
    let expires_at: chrono::DateTime<chrono::Utc> = column(&row, "expires_at")?;

    let belief: BeliefState = serde_json::from_value(belief)
        .map_err(|e| db_error(&format!("Invalid belief payload: {}", e)))?;
    let observed_state: ObservedState = serde_json::from_value(observed_state)
        .map_err(|e| db_error(&format!("Invalid observed state payload: {}", e)))?;
    let status = PlanSessionStatus::parse(&status)
        .ok_or_else(|| db_error(&format!("Invalid plan session status: {}", status)))?;

    Ok(PlanSession::reconstitute(
        PlanSessionId::from_uuid(id),
        TenantId::new(tenant_id)?,
        conversation_id.map(ConversationId::new).transpose()?,
        CustomerId::new(customer_id)?,
        belief,
        observed_state,
        to_u32(max_depth, "max_depth")?,
        to_u32(explored_paths, "explored_paths")?,
        to_u32(completed_actions, "completed_actions")?,
        root_node_id.map(PlanNodeId::from_uuid),
        current_node_id.map(PlanNodeId::from_uuid),
        status,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
        Timestamp::from_datetime(expires_at),
    ))
}

fn to_u32(value: i32, field: &str) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| db_error(&format!("Negative {} in plan_sessions", field)))
}
