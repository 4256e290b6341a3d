use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Private,
    Connections,
    Public,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Connections => "connections",
            Visibility::Public => "public",
        }
    }

    /// Unknown values are treated as private.
    pub fn parse(s: &str) -> Self {
        match s {
            "connections" => Visibility::Connections,
            "public" => Visibility::Public,
            _ => Visibility::Private,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SharedListRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SharedListRow {
    pub fn visibility(&self) -> Visibility {
        Visibility::parse(&self.visibility)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SharedListItemRow {
    pub id: Uuid,
    pub list_id: Uuid,
    pub company_slug: Option<String>,
    pub person_id: Option<Uuid>,
    pub note: Option<String>,
    pub added_at: DateTime<Utc>,
}
