use serde::Deserialize;
use uuid::Uuid;

/// Caller identity carried in the query string or JSON body.
/// Authentication happens upstream; handlers only check ownership.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
}

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// Applies the default page size and caps it at [`MAX_LIMIT`].
pub fn clamp_limit(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Trims optional free text; blank input is stored as NULL.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
