use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::evaluation::EvaluationRow;
use crate::trust::aggregation::CompanyStats;
use crate::trust::graph::GraphLabels;

pub async fn company_evaluations(pool: &PgPool, slug: &str) -> sqlx::Result<Vec<EvaluationRow>> {
    sqlx::query_as::<_, EvaluationRow>(
        "SELECT * FROM evaluations WHERE company_slug = $1 ORDER BY created_at DESC",
    )
    .bind(slug)
    .fetch_all(pool)
    .await
}

pub async fn person_evaluations(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<EvaluationRow>> {
    sqlx::query_as::<_, EvaluationRow>(
        "SELECT * FROM evaluations WHERE target_user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Every evaluation written by any of `evaluators`.
pub async fn evaluations_by(
    pool: &PgPool,
    evaluators: &[Uuid],
) -> sqlx::Result<Vec<EvaluationRow>> {
    sqlx::query_as::<_, EvaluationRow>(
        "SELECT * FROM evaluations WHERE evaluator_id = ANY($1) ORDER BY created_at DESC",
    )
    .bind(evaluators)
    .fetch_all(pool)
    .await
}

/// Mean rating and review count per reviewed company.
pub async fn company_stats(pool: &PgPool) -> sqlx::Result<Vec<CompanyStats>> {
    sqlx::query_as::<_, CompanyStats>(
        r#"
        SELECT c.slug,
               c.name,
               AVG(e.rating)::float8 AS average_rating,
               COUNT(e.id)           AS review_count
        FROM companies c
        JOIN evaluations e ON e.company_slug = c.slug
        GROUP BY c.slug, c.name
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Recomputes `companies.average_rating` from the evaluations table.
pub async fn refresh_company_average(conn: &mut PgConnection, slug: &str) -> sqlx::Result<f64> {
    sqlx::query_scalar(
        r#"
        UPDATE companies
        SET average_rating = COALESCE(
                (SELECT AVG(rating)::float8 FROM evaluations WHERE company_slug = $1), 0),
            updated_at = NOW()
        WHERE slug = $1
        RETURNING average_rating
        "#,
    )
    .bind(slug)
    .fetch_one(conn)
    .await
}

pub async fn graph_labels(
    pool: &PgPool,
    user_ids: &[Uuid],
    slugs: &[String],
) -> sqlx::Result<GraphLabels> {
    let users: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM users WHERE id = ANY($1)")
        .bind(user_ids)
        .fetch_all(pool)
        .await?;
    let companies: Vec<(String, String)> =
        sqlx::query_as("SELECT slug, name FROM companies WHERE slug = ANY($1)")
            .bind(slugs)
            .fetch_all(pool)
            .await?;

    Ok(GraphLabels {
        users: users.into_iter().collect::<HashMap<_, _>>(),
        companies: companies.into_iter().collect::<HashMap<_, _>>(),
    })
}
