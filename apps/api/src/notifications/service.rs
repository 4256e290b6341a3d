use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::message::NotificationRow;
use crate::models::user::NotificationPreferences;
use crate::users::service::find_user;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ConnectionRequest,
    ConnectionAccepted,
    Message,
    EvaluationReceived,
    EvaluationLiked,
    EvaluationReply,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::ConnectionRequest => "connection_request",
            NotificationKind::ConnectionAccepted => "connection_accepted",
            NotificationKind::Message => "message",
            NotificationKind::EvaluationReceived => "evaluation_received",
            NotificationKind::EvaluationLiked => "evaluation_liked",
            NotificationKind::EvaluationReply => "evaluation_reply",
        }
    }
}

/// Whether the recipient's preferences let this kind through.
pub fn preference_allows(kind: NotificationKind, prefs: &NotificationPreferences) -> bool {
    match kind {
        NotificationKind::Message => prefs.messages,
        NotificationKind::ConnectionRequest | NotificationKind::ConnectionAccepted => {
            prefs.connections
        }
        NotificationKind::EvaluationReceived
        | NotificationKind::EvaluationLiked
        | NotificationKind::EvaluationReply => prefs.evaluations,
    }
}

/// Stores a notification unless the recipient opted out of this kind.
pub async fn notify(
    pool: &PgPool,
    recipient: Uuid,
    kind: NotificationKind,
    payload: Value,
) -> Result<Option<NotificationRow>, AppError> {
    let Some(user) = find_user(pool, recipient).await? else {
        return Ok(None);
    };
    if !preference_allows(kind, &user.preferences()) {
        debug!(
            "User {recipient} opted out of {} notifications",
            kind.as_str()
        );
        return Ok(None);
    }

    let row = sqlx::query_as::<_, NotificationRow>(
        r#"
        INSERT INTO notifications (id, user_id, kind, payload)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(recipient)
    .bind(kind.as_str())
    .bind(payload)
    .fetch_one(pool)
    .await?;

    Ok(Some(row))
}

/// Like [`notify`], but a failure only logs. The action that triggered the
/// notification has already been committed.
pub async fn notify_best_effort(
    pool: &PgPool,
    recipient: Uuid,
    kind: NotificationKind,
    payload: Value,
) {
    if let Err(e) = notify(pool, recipient, kind, payload).await {
        warn!(
            "Failed to store {} notification for {recipient}: {e}",
            kind.as_str()
        );
    }
}

pub async fn list_notifications(
    pool: &PgPool,
    user_id: Uuid,
    unread_only: bool,
) -> Result<Vec<NotificationRow>, AppError> {
    Ok(sqlx::query_as::<_, NotificationRow>(
        r#"
        SELECT * FROM notifications
        WHERE user_id = $1 AND (NOT $2 OR NOT read)
        ORDER BY created_at DESC
        LIMIT 200
        "#,
    )
    .bind(user_id)
    .bind(unread_only)
    .fetch_all(pool)
    .await?)
}

pub async fn mark_read(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<NotificationRow, AppError> {
    let existing = sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification {id} not found")))?;

    if existing.user_id != user_id {
        return Err(AppError::Forbidden(
            "Only the recipient can mark a notification read".to_string(),
        ));
    }

    Ok(sqlx::query_as::<_, NotificationRow>(
        "UPDATE notifications SET read = TRUE WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(pool)
    .await?)
}

pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
    let result =
        sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND NOT read")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
