//! PostgreSQL implementation of PlanNodeRepository.
//!
//! `seq` is a BIGSERIAL assigned on insert and stands in for creation order,
//! so ties never depend on clock resolution.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, PlanNodeId, PlanSessionId, Timestamp};
use crate::domain::planning::{Action, NodeStatus, PlanNode};
use crate::ports::PlanNodeRepository;

use super::{column, db_error};

/// PostgreSQL implementation of PlanNodeRepository.
#[derive(Clone)]
pub struct PostgresPlanNodeRepository {
    pool: PgPool,
}

impl PostgresPlanNodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanNodeRepository for PostgresPlanNodeRepository {
    async fn save(&self, node: &PlanNode) -> Result<(), DomainError> {
        let action = serde_json::to_value(node.action())
            .map_err(|e| db_error(&format!("Failed to encode action: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO plan_nodes (
                id, session_id, parent_id, depth, action_kind, action,
                q_value, risk, explainability, total_score, status,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(node.id().as_uuid())
        .bind(node.session_id().as_uuid())
        .bind(node.parent_id().map(|id| *id.as_uuid()))
        .bind(node.depth() as i32)
        .bind(node.action().kind().as_str())
        .bind(action)
        .bind(node.q_value())
        .bind(node.risk())
        .bind(node.explainability())
        .bind(node.total_score())
        .bind(node.status().as_str())
        .bind(node.created_at().as_datetime())
        .bind(node.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to insert plan node: {}", e)))?;

        Ok(())
    }

    async fn update(&self, node: &PlanNode) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE plan_nodes SET
                q_value = $2,
                risk = $3,
                explainability = $4,
                total_score = $5,
                status = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(node.id().as_uuid())
        .bind(node.q_value())
        .bind(node.risk())
        .bind(node.explainability())
        .bind(node.total_score())
        .bind(node.status().as_str())
        .bind(node.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to update plan node: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::NodeNotFound,
                format!("Plan node not found: {}", node.id()),
            ));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &PlanNodeId) -> Result<Option<PlanNode>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, session_id, parent_id, depth, action, q_value, risk,
                   explainability, total_score, status, created_at, updated_at
            FROM plan_nodes
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to fetch plan node: {}", e)))?;

        row.map(row_to_node).transpose()
    }

    async fn find_by_session(
        &self,
        session_id: &PlanSessionId,
    ) -> Result<Vec<PlanNode>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, parent_id, depth, action, q_value, risk,
                   explainability, total_score, status, created_at, updated_at
            FROM plan_nodes
            WHERE session_id = $1
            ORDER BY depth ASC, seq ASC
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to fetch session nodes: {}", e)))?;

        rows.into_iter().map(row_to_node).collect()
    }

    async fn find_children(&self, parent_id: &PlanNodeId) -> Result<Vec<PlanNode>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, parent_id, depth, action, q_value, risk,
                   explainability, total_score, status, created_at, updated_at
            FROM plan_nodes
            WHERE parent_id = $1
            ORDER BY total_score DESC, seq ASC
            "#,
        )
        .bind(parent_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to fetch child nodes: {}", e)))?;

        rows.into_iter().map(row_to_node).collect()
    }
}

fn row_to_node(row: PgRow) -> Result<PlanNode, DomainError> {
    let id: Uuid = column(&row, "id")?;
    let session_id: Uuid = column(&row, "session_id")?;
    let parent_id: Option<Uuid> = column(&row, "parent_id")?;
    let depth: i32 = column(&row, "depth")?;
    let action: serde_json::Value = column(&row, "action")?;
    let q_value: f64 = column(&row, "q_value")?;
    let risk: f64 = column(&row, "risk")?;
    let explainability: f64 = column(&row, "explainability")?;
    let total_score: f64 = column(&row, "total_score")?;
    let status: String = column(&row, "status")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = column(&row, "updated_at")?;

    let action: Action = serde_json::from_value(action)
        .map_err(|e| db_error(&format!("Invalid action payload: {}", e)))?;
    let status = NodeStatus::parse(&status)
        .ok_or_else(|| db_error(&format!("Invalid plan node status: {}", status)))?;
    let depth = u32::try_from(depth).map_err(|_| db_error("Negative depth in plan_nodes"))?;

    Ok(PlanNode::reconstitute(
        PlanNodeId::from_uuid(id),
        PlanSessionId::from_uuid(session_id),
        parent_id.map(PlanNodeId::from_uuid),
        depth,
        action,
        q_value,
        risk,
        explainability,
        total_score,
        status,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
