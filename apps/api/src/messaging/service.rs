use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::connections::service::is_blocked_between;
use crate::errors::AppError;
use crate::models::message::MessageRow;
use crate::notifications::service::{notify_best_effort, NotificationKind};
use crate::users::service::require_user;

pub const MAX_BODY_CHARS: usize = 5000;
/// Characters of the body copied into the notification payload.
const PREVIEW_CHARS: usize = 80;
const PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub user_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

pub fn validate_body(body: &str) -> Result<&str, AppError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::Validation("message body cannot be empty".to_string()));
    }
    if body.chars().count() > MAX_BODY_CHARS {
        return Err(AppError::Validation(format!(
            "message body must be at most {MAX_BODY_CHARS} characters"
        )));
    }
    Ok(body)
}

fn preview(body: &str) -> String {
    if body.chars().count() <= PREVIEW_CHARS {
        body.to_string()
    } else {
        let cut: String = body.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    }
}

pub async fn send_message(pool: &PgPool, req: &SendMessage) -> Result<MessageRow, AppError> {
    let body = validate_body(&req.body)?;
    if req.user_id == req.recipient_id {
        return Err(AppError::Validation("cannot message yourself".to_string()));
    }
    require_user(pool, req.user_id).await?;
    require_user(pool, req.recipient_id).await?;
    if is_blocked_between(pool, req.user_id, req.recipient_id).await? {
        return Err(AppError::Forbidden(
            "messaging is blocked between these users".to_string(),
        ));
    }

    let message = sqlx::query_as::<_, MessageRow>(
        r#"
        INSERT INTO messages (id, sender_id, recipient_id, body)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(req.recipient_id)
    .bind(body)
    .fetch_one(pool)
    .await?;

    info!(
        "Message {} sent {} -> {}",
        message.id, req.user_id, req.recipient_id
    );
    notify_best_effort(
        pool,
        req.recipient_id,
        NotificationKind::Message,
        json!({
            "message_id": message.id,
            "sender_id": req.user_id,
            "preview": preview(body),
        }),
    )
    .await;

    Ok(message)
}

pub async fn inbox(pool: &PgPool, user_id: Uuid) -> Result<Vec<MessageRow>, AppError> {
    Ok(sqlx::query_as::<_, MessageRow>(
        "SELECT * FROM messages WHERE recipient_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(PAGE_SIZE)
    .fetch_all(pool)
    .await?)
}

pub async fn sent(pool: &PgPool, user_id: Uuid) -> Result<Vec<MessageRow>, AppError> {
    Ok(sqlx::query_as::<_, MessageRow>(
        "SELECT * FROM messages WHERE sender_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(PAGE_SIZE)
    .fetch_all(pool)
    .await?)
}

/// Both directions of the conversation, oldest first.
pub async fn thread(
    pool: &PgPool,
    user_id: Uuid,
    other: Uuid,
) -> Result<Vec<MessageRow>, AppError> {
    Ok(sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT * FROM messages
        WHERE (sender_id = $1 AND recipient_id = $2)
           OR (sender_id = $2 AND recipient_id = $1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .bind(other)
    .fetch_all(pool)
    .await?)
}

/// Marks a message read. Re-marking keeps the first `read_at`.
pub async fn mark_message_read(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<MessageRow, AppError> {
    let message = sqlx::query_as::<_, MessageRow>("SELECT * FROM messages WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message {id} not found")))?;

    if message.recipient_id != user_id {
        return Err(AppError::Forbidden(
            "Only the recipient can mark a message read".to_string(),
        ));
    }

    Ok(sqlx::query_as::<_, MessageRow>(
        "UPDATE messages SET read_at = COALESCE(read_at, NOW()) WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(pool)
    .await?)
}

pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<UnreadCount, AppError> {
    let unread: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(UnreadCount { unread })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_body() {
        assert!(matches!(validate_body("   "), Err(AppError::Validation(_))));
        assert_eq!(validate_body("  hi there ").unwrap(), "hi there");
        assert!(validate_body(&"x".repeat(MAX_BODY_CHARS)).is_ok());
        assert!(validate_body(&"x".repeat(MAX_BODY_CHARS + 1)).is_err());
    }

    #[test]
    fn test_body_limit_counts_chars_not_bytes() {
        assert!(validate_body(&"é".repeat(MAX_BODY_CHARS)).is_ok());
    }

    #[test]
    fn test_preview_truncates_long_bodies() {
        assert_eq!(preview("short"), "short");
        let long = "a".repeat(PREVIEW_CHARS + 10);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 1);
        assert!(p.ends_with('…'));
    }
}
