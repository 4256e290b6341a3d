use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::companies::slug::{next_available, slugify};
use crate::errors::AppError;
use crate::models::company::{CompanyEditRow, CompanyRow, CompanySourceRow};
use crate::params::non_blank;
use crate::trust::cache::RankingCache;

const MAX_NAME_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub industry: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompanyPatch {
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: CompanyRow,
    pub reviewer_count: i64,
    pub sources: Vec<CompanySourceRow>,
}

/// A single field change destined for `company_edits`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// A news article to attach to a company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSource {
    pub title: String,
    pub url: String,
    pub snippet: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name)
}

/// Fields of `patch` that differ from `existing`. Blank strings clear optional fields.
pub fn diff_fields(existing: &CompanyRow, patch: &CompanyPatch) -> Vec<FieldChange> {
    fn normalize(value: &str) -> Option<String> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    let mut changes = Vec::new();

    if let Some(name) = patch.name.as_deref().and_then(normalize) {
        if name != existing.name {
            changes.push(FieldChange {
                field: "name",
                old_value: Some(existing.name.clone()),
                new_value: Some(name),
            });
        }
    }

    let optional = [
        ("industry", &patch.industry, &existing.industry),
        ("description", &patch.description, &existing.description),
    ];
    for (field, requested, current) in optional {
        if let Some(raw) = requested {
            let new_value = normalize(raw);
            if &new_value != current {
                changes.push(FieldChange {
                    field,
                    old_value: current.clone(),
                    new_value,
                });
            }
        }
    }

    changes
}

pub async fn create_company(
    pool: &PgPool,
    req: &CreateCompanyRequest,
) -> Result<CompanyRow, AppError> {
    let name = validate_name(&req.name)?;
    let base = slugify(name);

    let taken: Vec<String> =
        sqlx::query_scalar("SELECT slug FROM companies WHERE slug = $1 OR slug LIKE $1 || '-%'")
            .bind(&base)
            .fetch_all(pool)
            .await?;
    let slug = next_available(&base, &taken.into_iter().collect::<HashSet<_>>());

    let company = sqlx::query_as::<_, CompanyRow>(
        r#"
        INSERT INTO companies (id, name, slug, industry, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&slug)
    .bind(non_blank(req.industry.as_deref()))
    .bind(non_blank(req.description.as_deref()))
    .fetch_one(pool)
    .await?;

    info!("Created company {} ({})", company.name, company.slug);
    Ok(company)
}

pub async fn require_company(pool: &PgPool, slug: &str) -> Result<CompanyRow, AppError> {
    sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {slug} not found")))
}

/// Loads a company for display and counts the lookup.
pub async fn company_detail(pool: &PgPool, slug: &str) -> Result<CompanyDetail, AppError> {
    let company = sqlx::query_as::<_, CompanyRow>(
        "UPDATE companies SET search_count = search_count + 1 WHERE slug = $1 RETURNING *",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Company {slug} not found")))?;

    let reviewer_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM company_reviewers WHERE company_slug = $1")
            .bind(slug)
            .fetch_one(pool)
            .await?;

    let sources = company_sources(pool, company.id).await?;

    Ok(CompanyDetail {
        company,
        reviewer_count,
        sources,
    })
}

/// Escapes `%`, `_` and `\` so user input matches literally inside LIKE.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub async fn search_companies(
    pool: &PgPool,
    query: Option<&str>,
    limit: usize,
) -> Result<Vec<CompanyRow>, AppError> {
    let pattern = format!("%{}%", escape_like(query.unwrap_or("").trim()));
    Ok(sqlx::query_as::<_, CompanyRow>(
        r#"
        SELECT * FROM companies
        WHERE name ILIKE $1
        ORDER BY search_count DESC, name ASC
        LIMIT $2
        "#,
    )
    .bind(pattern)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?)
}

/// Writes one `company_edits` row per change.
pub async fn record_edits(
    conn: &mut PgConnection,
    company_id: Uuid,
    editor_id: Option<Uuid>,
    changes: &[FieldChange],
) -> sqlx::Result<()> {
    for change in changes {
        sqlx::query(
            r#"
            INSERT INTO company_edits (id, company_id, editor_id, field, old_value, new_value)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(editor_id)
        .bind(change.field)
        .bind(change.old_value.as_deref())
        .bind(change.new_value.as_deref())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Rankings embed the company name, so a rename makes cached rankings stale.
pub fn affects_rankings(changes: &[FieldChange]) -> bool {
    changes.iter().any(|c| c.field == "name")
}

/// Applies changed fields and appends them to the edit history. The slug never changes.
pub async fn update_company(
    pool: &PgPool,
    cache: &RankingCache,
    slug: &str,
    patch: &CompanyPatch,
) -> Result<CompanyRow, AppError> {
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    let existing = require_company(pool, slug).await?;
    let changes = diff_fields(&existing, patch);
    if changes.is_empty() {
        return Ok(existing);
    }

    let mut tx = pool.begin().await?;
    let mut merged = existing.clone();
    for change in &changes {
        match change.field {
            "name" => merged.name = change.new_value.clone().unwrap_or_default(),
            "industry" => merged.industry = change.new_value.clone(),
            "description" => merged.description = change.new_value.clone(),
            _ => {}
        }
    }

    let updated = sqlx::query_as::<_, CompanyRow>(
        r#"
        UPDATE companies
        SET name = $2, industry = $3, description = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(existing.id)
    .bind(&merged.name)
    .bind(merged.industry.as_deref())
    .bind(merged.description.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    record_edits(&mut *tx, existing.id, patch.user_id, &changes).await?;
    tx.commit().await?;

    if affects_rankings(&changes) {
        cache.invalidate().await;
    }

    info!("Company {slug}: {} field(s) edited", changes.len());
    Ok(updated)
}

pub async fn company_history(pool: &PgPool, slug: &str) -> Result<Vec<CompanyEditRow>, AppError> {
    let company = require_company(pool, slug).await?;
    Ok(sqlx::query_as::<_, CompanyEditRow>(
        "SELECT * FROM company_edits WHERE company_id = $1 ORDER BY edited_at DESC",
    )
    .bind(company.id)
    .fetch_all(pool)
    .await?)
}

pub async fn company_sources(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Vec<CompanySourceRow>, AppError> {
    Ok(sqlx::query_as::<_, CompanySourceRow>(
        r#"
        SELECT * FROM company_sources
        WHERE company_id = $1
        ORDER BY published_at DESC NULLS LAST, fetched_at DESC
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?)
}

/// Inserts new sources and refreshes title/snippet of ones already known by URL.
pub async fn upsert_sources(
    conn: &mut PgConnection,
    company_id: Uuid,
    sources: &[NewSource],
) -> sqlx::Result<u64> {
    let mut written = 0;
    for source in sources {
        written += sqlx::query(
            r#"
            INSERT INTO company_sources (id, company_id, title, url, snippet, published_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (company_id, url) DO UPDATE
                SET title = EXCLUDED.title,
                    snippet = EXCLUDED.snippet,
                    published_at = COALESCE(EXCLUDED.published_at, company_sources.published_at),
                    fetched_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(&source.title)
        .bind(&source.url)
        .bind(source.snippet.as_deref())
        .bind(source.published_at)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }
    Ok(written)
}
