use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRow;

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
}

/// Partial update; omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct PreferencesPatch {
    pub user_id: Uuid,
    pub messages: Option<bool>,
    pub connections: Option<bool>,
    pub evaluations: Option<bool>,
}

pub fn validate_new_user(name: &str, email: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!("'{email}' is not a valid email"))),
    }
}

pub async fn create_user(pool: &PgPool, req: &CreateUserRequest) -> Result<UserRow, AppError> {
    validate_new_user(&req.name, &req.email)?;
    let email = req.email.trim().to_lowercase();

    let taken: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(format!("Email {email} is already registered")));
    }

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, name, email, bio)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.name.trim())
    .bind(&email)
    .bind(req.bio.as_deref())
    .fetch_one(pool)
    .await?;

    info!("Created user {}", user.id);
    Ok(user)
}

pub async fn find_user(pool: &PgPool, id: Uuid) -> Result<Option<UserRow>, AppError> {
    Ok(sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// Loads a user or fails with 404.
pub async fn require_user(pool: &PgPool, id: Uuid) -> Result<UserRow, AppError> {
    find_user(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

/// Profiles are only changed by their owner.
pub fn require_self(actor: Uuid, id: Uuid) -> Result<(), AppError> {
    if actor != id {
        return Err(AppError::Forbidden(
            "You can only change your own preferences".to_string(),
        ));
    }
    Ok(())
}

pub async fn update_preferences(
    pool: &PgPool,
    id: Uuid,
    patch: &PreferencesPatch,
) -> Result<UserRow, AppError> {
    require_self(patch.user_id, id)?;
    sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET notify_messages    = COALESCE($2, notify_messages),
            notify_connections = COALESCE($3, notify_connections),
            notify_evaluations = COALESCE($4, notify_evaluations)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(patch.messages)
    .bind(patch.connections)
    .bind(patch.evaluations)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_owner_only() {
        let me = Uuid::new_v4();
        assert!(require_self(me, me).is_ok());
        assert!(matches!(
            require_self(Uuid::new_v4(), me),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_preferences_patch_requires_caller() {
        let without_caller = serde_json::from_str::<PreferencesPatch>(r#"{"messages":false}"#);
        assert!(without_caller.is_err());

        let patch: PreferencesPatch = serde_json::from_str(&format!(
            r#"{{"user_id":"{}","messages":false}}"#,
            Uuid::new_v4()
        ))
        .unwrap();
        assert_eq!(patch.messages, Some(false));
        assert_eq!(patch.connections, None);
    }

    #[test]
    fn test_valid_user() {
        assert!(validate_new_user("Aiko Tanaka", "aiko@example.com").is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(matches!(
            validate_new_user("   ", "a@b.c"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_emails_rejected() {
        for email in ["", "no-at-sign", "@example.com", "someone@"] {
            assert!(
                validate_new_user("Name", email).is_err(),
                "accepted {email:?}"
            );
        }
    }

    #[test]
    fn test_overlong_name_rejected() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_new_user(&name, "a@b.c").is_err());
    }
}
