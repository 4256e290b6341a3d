use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::companies::service::require_company;
use crate::connections::service::are_connected;
use crate::errors::AppError;
use crate::lists::visibility::{can_view, counts_as_view};
use crate::models::shared_list::{SharedListItemRow, SharedListRow, Visibility};
use crate::users::service::require_user;

const MAX_NAME_CHARS: usize = 100;
const MAX_NOTE_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Deserialize)]
pub struct ListPatch {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub user_id: Uuid,
    pub company_slug: Option<String>,
    pub person_id: Option<Uuid>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemTarget {
    Company(String),
    Person(Uuid),
}

#[derive(Debug, Serialize)]
pub struct ListDetail {
    #[serde(flatten)]
    pub list: SharedListRow,
    pub items: Vec<SharedListItemRow>,
    pub view_count: i64,
}

pub fn validate_list_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("list name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "list name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name)
}

pub fn item_target(req: &AddItemRequest) -> Result<ItemTarget, AppError> {
    let slug = req
        .company_slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match (slug, req.person_id) {
        (Some(slug), None) => Ok(ItemTarget::Company(slug.to_string())),
        (None, Some(person)) => Ok(ItemTarget::Person(person)),
        _ => Err(AppError::Validation(
            "exactly one of company_slug or person_id is required".to_string(),
        )),
    }
}

fn validate_note(note: Option<&str>) -> Result<Option<&str>, AppError> {
    let note = note.map(str::trim).filter(|n| !n.is_empty());
    if note.is_some_and(|n| n.chars().count() > MAX_NOTE_CHARS) {
        return Err(AppError::Validation(format!(
            "note must be at most {MAX_NOTE_CHARS} characters"
        )));
    }
    Ok(note)
}

async fn load_list(pool: &PgPool, id: Uuid) -> Result<SharedListRow, AppError> {
    sqlx::query_as::<_, SharedListRow>("SELECT * FROM shared_lists WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("List {id} not found")))
}

async fn owned_list(pool: &PgPool, id: Uuid, actor: Uuid) -> Result<SharedListRow, AppError> {
    let list = load_list(pool, id).await?;
    if list.owner_id != actor {
        return Err(AppError::Forbidden(
            "Only the list owner can change it".to_string(),
        ));
    }
    Ok(list)
}

async fn viewer_can_see(
    pool: &PgPool,
    list: &SharedListRow,
    viewer: Option<Uuid>,
) -> Result<bool, AppError> {
    let visibility = list.visibility();
    let is_connection = match viewer {
        Some(v) if visibility == Visibility::Connections && v != list.owner_id => {
            are_connected(pool, list.owner_id, v).await?
        }
        _ => false,
    };
    Ok(can_view(visibility, list.owner_id, viewer, is_connection))
}

pub async fn create_list(
    pool: &PgPool,
    req: &CreateListRequest,
) -> Result<SharedListRow, AppError> {
    let name = validate_list_name(&req.name)?;
    require_user(pool, req.user_id).await?;

    let list = sqlx::query_as::<_, SharedListRow>(
        r#"
        INSERT INTO shared_lists (id, owner_id, name, description, visibility)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(name)
    .bind(req.description.as_deref().map(str::trim))
    .bind(req.visibility.as_str())
    .fetch_one(pool)
    .await?;

    info!("List {} created by {}", list.id, req.user_id);
    Ok(list)
}

/// Invisible lists are reported as missing. Non-owner views are recorded.
pub async fn list_detail(
    pool: &PgPool,
    id: Uuid,
    viewer: Option<Uuid>,
) -> Result<ListDetail, AppError> {
    let list = load_list(pool, id).await?;
    if !viewer_can_see(pool, &list, viewer).await? {
        return Err(AppError::NotFound(format!("List {id} not found")));
    }

    if let Some(v) = viewer.filter(|v| counts_as_view(list.owner_id, Some(*v))) {
        sqlx::query("INSERT INTO shared_list_views (id, list_id, viewer_id) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(v)
            .execute(pool)
            .await?;
    }

    let items = sqlx::query_as::<_, SharedListItemRow>(
        "SELECT * FROM shared_list_items WHERE list_id = $1 ORDER BY added_at ASC",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    let view_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM shared_list_views WHERE list_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

    Ok(ListDetail {
        list,
        items,
        view_count,
    })
}

/// `owner`'s lists that `viewer` is allowed to see, newest first.
pub async fn lists_of_owner(
    pool: &PgPool,
    owner: Uuid,
    viewer: Option<Uuid>,
) -> Result<Vec<SharedListRow>, AppError> {
    let lists = sqlx::query_as::<_, SharedListRow>(
        "SELECT * FROM shared_lists WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner)
    .fetch_all(pool)
    .await?;

    let is_connection = match viewer {
        Some(v) if v != owner => are_connected(pool, owner, v).await?,
        _ => false,
    };
    Ok(lists
        .into_iter()
        .filter(|l| can_view(l.visibility(), owner, viewer, is_connection))
        .collect())
}

pub async fn update_list(
    pool: &PgPool,
    id: Uuid,
    patch: &ListPatch,
) -> Result<SharedListRow, AppError> {
    let existing = owned_list(pool, id, patch.user_id).await?;
    let name = match &patch.name {
        Some(name) => validate_list_name(name)?.to_string(),
        None => existing.name.clone(),
    };
    let description = match &patch.description {
        Some(d) => {
            let d = d.trim();
            (!d.is_empty()).then(|| d.to_string())
        }
        None => existing.description.clone(),
    };
    let visibility = patch.visibility.unwrap_or_else(|| existing.visibility());

    Ok(sqlx::query_as::<_, SharedListRow>(
        r#"
        UPDATE shared_lists
        SET name = $2, description = $3, visibility = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(visibility.as_str())
    .fetch_one(pool)
    .await?)
}

pub async fn delete_list(pool: &PgPool, id: Uuid, actor: Uuid) -> Result<(), AppError> {
    owned_list(pool, id, actor).await?;
    sqlx::query("DELETE FROM shared_lists WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    info!("List {id} deleted");
    Ok(())
}

pub async fn add_item(
    pool: &PgPool,
    list_id: Uuid,
    req: &AddItemRequest,
) -> Result<SharedListItemRow, AppError> {
    let target = item_target(req)?;
    let note = validate_note(req.note.as_deref())?;
    owned_list(pool, list_id, req.user_id).await?;

    let (slug, person) = match &target {
        ItemTarget::Company(slug) => {
            require_company(pool, slug).await?;
            (Some(slug.as_str()), None)
        }
        ItemTarget::Person(person) => {
            require_user(pool, *person).await?;
            (None, Some(*person))
        }
    };

    let duplicate: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM shared_list_items
            WHERE list_id = $1
              AND (company_slug = $2 OR person_id = $3)
        )
        "#,
    )
    .bind(list_id)
    .bind(slug)
    .bind(person)
    .fetch_one(pool)
    .await?;
    if duplicate {
        return Err(AppError::Conflict("This item is already on the list".to_string()));
    }

    // The partial unique indexes still reject a concurrent duplicate (409).
    Ok(sqlx::query_as::<_, SharedListItemRow>(
        r#"
        INSERT INTO shared_list_items (id, list_id, company_slug, person_id, note)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(list_id)
    .bind(slug)
    .bind(person)
    .bind(note)
    .fetch_one(pool)
    .await?)
}

pub async fn remove_item(
    pool: &PgPool,
    list_id: Uuid,
    item_id: Uuid,
    actor: Uuid,
) -> Result<(), AppError> {
    owned_list(pool, list_id, actor).await?;
    let removed = sqlx::query("DELETE FROM shared_list_items WHERE id = $1 AND list_id = $2")
        .bind(item_id)
        .bind(list_id)
        .execute(pool)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(AppError::NotFound(format!("Item {item_id} not found")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(slug: Option<&str>, person: Option<Uuid>) -> AddItemRequest {
        AddItemRequest {
            user_id: Uuid::new_v4(),
            company_slug: slug.map(str::to_string),
            person_id: person,
            note: None,
        }
    }

    #[test]
    fn test_item_target_requires_exactly_one() {
        let person = Uuid::new_v4();
        assert_eq!(
            item_target(&item(Some(" acme "), None)).unwrap(),
            ItemTarget::Company("acme".to_string())
        );
        assert_eq!(
            item_target(&item(None, Some(person))).unwrap(),
            ItemTarget::Person(person)
        );
        assert!(item_target(&item(Some("acme"), Some(person))).is_err());
        assert!(item_target(&item(None, None)).is_err());
        assert!(item_target(&item(Some("  "), None)).is_err());
    }

    #[test]
    fn test_list_name_bounds() {
        assert!(validate_list_name("").is_err());
        assert_eq!(validate_list_name("  Favourites ").unwrap(), "Favourites");
        assert!(validate_list_name(&"n".repeat(MAX_NAME_CHARS)).is_ok());
        assert!(validate_list_name(&"n".repeat(MAX_NAME_CHARS + 1)).is_err());
    }

    #[test]
    fn test_note_blank_is_none() {
        assert_eq!(validate_note(Some("   ")).unwrap(), None);
        assert_eq!(validate_note(Some(" ok ")).unwrap(), Some("ok"));
        assert!(validate_note(Some(&"x".repeat(MAX_NOTE_CHARS + 1))).is_err());
    }

    #[test]
    fn test_visibility_defaults_to_private() {
        let req: CreateListRequest = serde_json::from_str(&format!(
            r#"{{"user_id":"{}","name":"Mine"}}"#,
            Uuid::new_v4()
        ))
        .unwrap();
        assert_eq!(req.visibility, Visibility::Private);
    }
}
