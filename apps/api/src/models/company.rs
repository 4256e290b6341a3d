use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub average_rating: f64,
    pub search_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A news article attached to a company by the research refresh.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanySourceRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub url: String,
    pub snippet: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

/// One changed field. `editor_id` is NULL for system edits (research refresh).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyEditRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub editor_id: Option<Uuid>,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub edited_at: DateTime<Utc>,
}
