use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub is_admin: bool,
    pub notify_messages: bool,
    pub notify_connections: bool,
    pub notify_evaluations: bool,
    pub created_at: DateTime<Utc>,
}

/// Email/notification preferences embedded on the user record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationPreferences {
    pub messages: bool,
    pub connections: bool,
    pub evaluations: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            messages: true,
            connections: true,
            evaluations: true,
        }
    }
}

impl UserRow {
    pub fn preferences(&self) -> NotificationPreferences {
        NotificationPreferences {
            messages: self.notify_messages,
            connections: self.notify_connections,
            evaluations: self.notify_evaluations,
        }
    }
}
