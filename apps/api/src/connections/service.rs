use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::connections::lifecycle::{
    activation_for, check_can_request, request_transition, transition, validate_strength,
    ConnectionAction, RequestAction,
};
use crate::errors::AppError;
use crate::models::connection::{
    normalize_pair, ConnectionRequestRow, ConnectionRow, ConnectionStatus, RequestStatus,
};
use crate::notifications::service::{notify_best_effort, NotificationKind};
use crate::params::non_blank;
use crate::users::service::require_user;

/// Strength given to a freshly accepted connection.
pub const DEFAULT_STRENGTH: f64 = 0.5;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub user_id: Uuid,
    pub recipient_id: Uuid,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PendingRequests {
    pub incoming: Vec<ConnectionRequestRow>,
    pub outgoing: Vec<ConnectionRequestRow>,
}

/// A connection from one participant's point of view.
#[derive(Debug, Serialize)]
pub struct ConnectionView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub strength: f64,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RequestOutcome {
    pub request: ConnectionRequestRow,
    pub connection: Option<ConnectionRow>,
}

pub async fn find_between(
    pool: &PgPool,
    a: Uuid,
    b: Uuid,
) -> Result<Option<ConnectionRow>, AppError> {
    let (user_a, user_b) = normalize_pair(a, b);
    Ok(sqlx::query_as::<_, ConnectionRow>(
        "SELECT * FROM connections WHERE user_a = $1 AND user_b = $2",
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(pool)
    .await?)
}

pub async fn is_blocked_between(pool: &PgPool, a: Uuid, b: Uuid) -> Result<bool, AppError> {
    Ok(find_between(pool, a, b)
        .await?
        .and_then(|c| c.status())
        == Some(ConnectionStatus::Blocked))
}

pub async fn are_connected(pool: &PgPool, a: Uuid, b: Uuid) -> Result<bool, AppError> {
    Ok(find_between(pool, a, b)
        .await?
        .and_then(|c| c.status())
        == Some(ConnectionStatus::Active))
}

pub async fn active_connections(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ConnectionRow>, AppError> {
    Ok(sqlx::query_as::<_, ConnectionRow>(
        r#"
        SELECT * FROM connections
        WHERE (user_a = $1 OR user_b = $1) AND status = 'active'
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

/// Counterpart id → strength for every active connection of `user_id`.
pub async fn connection_strengths(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<HashMap<Uuid, f64>, AppError> {
    Ok(active_connections(pool, user_id)
        .await?
        .into_iter()
        .filter_map(|c| c.counterpart(user_id).map(|other| (other, c.strength)))
        .collect())
}

pub async fn send_request(
    pool: &PgPool,
    req: &SendRequest,
) -> Result<ConnectionRequestRow, AppError> {
    require_user(pool, req.user_id).await?;
    require_user(pool, req.recipient_id).await?;

    let existing = find_between(pool, req.user_id, req.recipient_id).await?;
    let pending: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id FROM connection_requests
        WHERE status = 'pending'
          AND ((requester_id = $1 AND recipient_id = $2)
            OR (requester_id = $2 AND recipient_id = $1))
        LIMIT 1
        "#,
    )
    .bind(req.user_id)
    .bind(req.recipient_id)
    .fetch_optional(pool)
    .await?;

    check_can_request(
        req.user_id,
        req.recipient_id,
        existing.as_ref(),
        pending.is_some(),
    )?;

    let request = sqlx::query_as::<_, ConnectionRequestRow>(
        r#"
        INSERT INTO connection_requests (id, requester_id, recipient_id, message)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(req.recipient_id)
    .bind(non_blank(req.message.as_deref()))
    .fetch_one(pool)
    .await?;

    info!(
        "Connection request {} from {} to {}",
        request.id, request.requester_id, request.recipient_id
    );

    notify_best_effort(
        pool,
        request.recipient_id,
        NotificationKind::ConnectionRequest,
        json!({ "request_id": request.id, "from": request.requester_id }),
    )
    .await;

    Ok(request)
}

async fn load_request(pool: &PgPool, id: Uuid) -> Result<ConnectionRequestRow, AppError> {
    sqlx::query_as::<_, ConnectionRequestRow>("SELECT * FROM connection_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Connection request {id} not found")))
}

/// Accepts, rejects or cancels a pending request.
/// Accept and reject belong to the recipient, cancel to the requester.
pub async fn respond_to_request(
    pool: &PgPool,
    request_id: Uuid,
    actor: Uuid,
    action: RequestAction,
) -> Result<RequestOutcome, AppError> {
    let request = load_request(pool, request_id).await?;

    let allowed = match action {
        RequestAction::Accept | RequestAction::Reject => actor == request.recipient_id,
        RequestAction::Cancel => actor == request.requester_id,
    };
    if !allowed {
        return Err(AppError::Forbidden(
            "You cannot act on this connection request".to_string(),
        ));
    }

    let current = request
        .status()
        .ok_or_else(|| anyhow::anyhow!("Unknown request status '{}'", request.status))?;
    let next = request_transition(current, action)?;

    let mut tx = pool.begin().await?;

    // Guard on status so a concurrent answer cannot be applied twice
    let updated = sqlx::query_as::<_, ConnectionRequestRow>(
        r#"
        UPDATE connection_requests
        SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(request_id)
    .bind(next.as_str())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::Conflict("Request was answered concurrently".to_string()))?;

    let connection = if next == RequestStatus::Accepted {
        let (user_a, user_b) = normalize_pair(updated.requester_id, updated.recipient_id);
        let existing = sqlx::query_as::<_, ConnectionRow>(
            "SELECT * FROM connections WHERE user_a = $1 AND user_b = $2 FOR UPDATE",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&mut *tx)
        .await?;
        activation_for(existing.as_ref())?;

        let row = sqlx::query_as::<_, ConnectionRow>(
            r#"
            INSERT INTO connections (id, user_a, user_b, strength, status)
            VALUES ($1, $2, $3, $4, 'active')
            ON CONFLICT (user_a, user_b) DO UPDATE
                SET status = 'active', blocked_by = NULL, updated_at = NOW()
                WHERE connections.status <> 'blocked'
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_a)
        .bind(user_b)
        .bind(DEFAULT_STRENGTH)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::Forbidden("Connection between these users is blocked".to_string())
        })?;
        Some(row)
    } else {
        None
    };

    tx.commit().await?;

    info!("Connection request {request_id} -> {}", next.as_str());

    if connection.is_some() {
        notify_best_effort(
            pool,
            updated.requester_id,
            NotificationKind::ConnectionAccepted,
            json!({ "request_id": updated.id, "by": updated.recipient_id }),
        )
        .await;
    }

    Ok(RequestOutcome {
        request: updated,
        connection,
    })
}

pub async fn pending_requests(pool: &PgPool, user_id: Uuid) -> Result<PendingRequests, AppError> {
    let rows = sqlx::query_as::<_, ConnectionRequestRow>(
        r#"
        SELECT * FROM connection_requests
        WHERE status = 'pending' AND (requester_id = $1 OR recipient_id = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let (incoming, outgoing) = rows.into_iter().partition(|r| r.recipient_id == user_id);
    Ok(PendingRequests { incoming, outgoing })
}

pub async fn list_connections(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ConnectionView>, AppError> {
    let rows: Vec<(Uuid, Uuid, String, f64, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT c.id, u.id, u.name, c.strength, c.updated_at
        FROM connections c
        JOIN users u ON u.id = CASE WHEN c.user_a = $1 THEN c.user_b ELSE c.user_a END
        WHERE (c.user_a = $1 OR c.user_b = $1) AND c.status = 'active'
        ORDER BY c.strength DESC, u.name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, user_id, name, strength, since)| ConnectionView {
            id,
            user_id,
            name,
            strength,
            since,
        })
        .collect())
}

/// Loads a connection and checks that `actor` is one of its endpoints.
async fn load_for_participant(
    pool: &PgPool,
    id: Uuid,
    actor: Uuid,
) -> Result<ConnectionRow, AppError> {
    let row = sqlx::query_as::<_, ConnectionRow>("SELECT * FROM connections WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Connection {id} not found")))?;
    if !row.involves(actor) {
        return Err(AppError::Forbidden(
            "Only participants can modify a connection".to_string(),
        ));
    }
    Ok(row)
}

pub async fn set_strength(
    pool: &PgPool,
    id: Uuid,
    actor: Uuid,
    strength: f64,
) -> Result<ConnectionRow, AppError> {
    let strength = validate_strength(strength)?;
    let row = load_for_participant(pool, id, actor).await?;
    if row.status() != Some(ConnectionStatus::Active) {
        return Err(AppError::Conflict(
            "Only active connections have a strength".to_string(),
        ));
    }

    Ok(sqlx::query_as::<_, ConnectionRow>(
        "UPDATE connections SET strength = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(strength)
    .fetch_one(pool)
    .await?)
}

/// Applies a block or unblock through the lifecycle state machine.
pub async fn change_status(
    pool: &PgPool,
    id: Uuid,
    actor: Uuid,
    action: ConnectionAction,
) -> Result<ConnectionRow, AppError> {
    let row = load_for_participant(pool, id, actor).await?;
    let current = row
        .status()
        .ok_or_else(|| anyhow::anyhow!("Unknown connection status '{}'", row.status))?;
    let next = transition(current, row.blocked_by, action)?;
    let blocked_by = (action == ConnectionAction::Block).then_some(actor);

    let updated = sqlx::query_as::<_, ConnectionRow>(
        r#"
        UPDATE connections
        SET status = $2, blocked_by = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(next.as_str())
    .bind(blocked_by)
    .fetch_one(pool)
    .await?;

    info!("Connection {id} is now {} (by {actor})", next.as_str());
    Ok(updated)
}

pub async fn remove_connection(pool: &PgPool, id: Uuid, actor: Uuid) -> Result<(), AppError> {
    let row = load_for_participant(pool, id, actor).await?;
    if row.status() == Some(ConnectionStatus::Blocked) && row.blocked_by != Some(actor) {
        return Err(AppError::Forbidden(
            "Only the blocker can remove a blocked connection".to_string(),
        ));
    }
    sqlx::query("DELETE FROM connections WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    info!("Connection {id} removed by {actor}");
    Ok(())
}
