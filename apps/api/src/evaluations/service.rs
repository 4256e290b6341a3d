use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::companies::service::require_company;
use crate::errors::AppError;
use crate::evaluations::validation::{
    parse_relationship, resolve_target, validate_categories, validate_comment, validate_reply,
    validate_score,
};
use crate::models::evaluation::{
    CategoryScores, EvaluationEditRow, EvaluationReplyRow, EvaluationRow, EvaluationTarget,
};
use crate::notifications::service::{notify_best_effort, NotificationKind};
use crate::trust::cache::RankingCache;
use crate::trust::store::refresh_company_average;
use crate::users::service::require_user;

#[derive(Debug, Deserialize)]
pub struct CreateEvaluationRequest {
    pub user_id: Uuid,
    pub company_slug: Option<String>,
    pub target_user_id: Option<Uuid>,
    pub rating: i16,
    #[serde(flatten)]
    pub categories: CategoryScores,
    #[serde(default)]
    pub relationship_type: i16,
    #[serde(default)]
    pub comment: String,
}

/// Omitted fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateEvaluationRequest {
    pub user_id: Uuid,
    pub rating: Option<i16>,
    #[serde(flatten)]
    pub categories: CategoryScores,
    pub relationship_type: Option<i16>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct EvaluationListItem {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub evaluation: EvaluationRow,
    pub evaluator_name: String,
    pub like_count: i64,
    pub reply_count: i64,
}

#[derive(Debug, Serialize)]
pub struct EvaluationDetail {
    #[serde(flatten)]
    pub evaluation: EvaluationRow,
    pub like_count: i64,
    pub replies: Vec<EvaluationReplyRow>,
    pub history: Vec<EvaluationEditRow>,
}

#[derive(Debug, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i64,
}

pub async fn load_evaluation(pool: &PgPool, id: Uuid) -> Result<EvaluationRow, AppError> {
    sqlx::query_as::<_, EvaluationRow>("SELECT * FROM evaluations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Evaluation {id} not found")))
}

pub async fn create_evaluation(
    pool: &PgPool,
    cache: &RankingCache,
    req: &CreateEvaluationRequest,
) -> Result<EvaluationRow, AppError> {
    validate_score("rating", req.rating)?;
    validate_categories(&req.categories)?;
    let relationship = parse_relationship(req.relationship_type)?;
    validate_comment(&req.comment)?;
    let target = resolve_target(req.user_id, req.company_slug.as_deref(), req.target_user_id)?;

    require_user(pool, req.user_id).await?;
    let (company_slug, target_user_id) = match &target {
        EvaluationTarget::Company(slug) => {
            require_company(pool, slug).await?;
            (Some(slug.as_str()), None)
        }
        EvaluationTarget::Person(user_id) => {
            require_user(pool, *user_id).await?;
            (None, Some(*user_id))
        }
    };

    let mut tx = pool.begin().await?;

    // Upsert first so the reviewer row stays locked until commit; a concurrent
    // delete of this user's last evaluation then waits for us.
    if let Some(slug) = company_slug {
        sqlx::query(
            r#"
            INSERT INTO company_reviewers (company_slug, user_id)
            VALUES ($1, $2)
            ON CONFLICT (company_slug, user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            "#,
        )
        .bind(slug)
        .bind(req.user_id)
        .execute(&mut *tx)
        .await?;
    }

    let evaluation = sqlx::query_as::<_, EvaluationRow>(
        r#"
        INSERT INTO evaluations
            (id, evaluator_id, company_slug, target_user_id, rating,
             trustworthiness, expertise, communication, reliability, value,
             relationship_type, comment)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(company_slug)
    .bind(target_user_id)
    .bind(req.rating)
    .bind(req.categories.trustworthiness)
    .bind(req.categories.expertise)
    .bind(req.categories.communication)
    .bind(req.categories.reliability)
    .bind(req.categories.value)
    .bind(i16::from(relationship))
    .bind(req.comment.trim())
    .fetch_one(&mut *tx)
    .await?;

    if let Some(slug) = company_slug {
        refresh_company_average(&mut *tx, slug).await?;
    }

    tx.commit().await?;

    info!(
        "Evaluation {} by {} ({:?}, rating {})",
        evaluation.id, evaluation.evaluator_id, target, evaluation.rating
    );

    match target {
        EvaluationTarget::Company(_) => cache.invalidate().await,
        EvaluationTarget::Person(user_id) => {
            notify_best_effort(
                pool,
                user_id,
                NotificationKind::EvaluationReceived,
                json!({ "evaluation_id": evaluation.id, "from": evaluation.evaluator_id }),
            )
            .await
        }
    }

    Ok(evaluation)
}

pub async fn evaluation_detail(pool: &PgPool, id: Uuid) -> Result<EvaluationDetail, AppError> {
    let evaluation = load_evaluation(pool, id).await?;

    let like_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM evaluation_likes WHERE evaluation_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

    let replies = sqlx::query_as::<_, EvaluationReplyRow>(
        "SELECT * FROM evaluation_replies WHERE evaluation_id = $1 ORDER BY created_at ASC",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let history = sqlx::query_as::<_, EvaluationEditRow>(
        "SELECT * FROM evaluation_edits WHERE evaluation_id = $1 ORDER BY edited_at DESC",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(EvaluationDetail {
        evaluation,
        like_count,
        replies,
        history,
    })
}

const LIST_SELECT: &str = r#"
    SELECT e.*,
           u.name AS evaluator_name,
           (SELECT COUNT(*) FROM evaluation_likes l WHERE l.evaluation_id = e.id)   AS like_count,
           (SELECT COUNT(*) FROM evaluation_replies r WHERE r.evaluation_id = e.id) AS reply_count
    FROM evaluations e
    JOIN users u ON u.id = e.evaluator_id
"#;

pub async fn company_evaluations(
    pool: &PgPool,
    slug: &str,
) -> Result<Vec<EvaluationListItem>, AppError> {
    require_company(pool, slug).await?;
    let sql = format!("{LIST_SELECT} WHERE e.company_slug = $1 ORDER BY e.created_at DESC");
    Ok(sqlx::query_as::<_, EvaluationListItem>(&sql)
        .bind(slug)
        .fetch_all(pool)
        .await?)
}

pub async fn received_evaluations(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<EvaluationListItem>, AppError> {
    require_user(pool, user_id).await?;
    let sql = format!("{LIST_SELECT} WHERE e.target_user_id = $1 ORDER BY e.created_at DESC");
    Ok(sqlx::query_as::<_, EvaluationListItem>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?)
}

fn require_evaluator(evaluation: &EvaluationRow, actor: Uuid) -> Result<(), AppError> {
    if evaluation.evaluator_id != actor {
        return Err(AppError::Forbidden(
            "Only the evaluator can change this evaluation".to_string(),
        ));
    }
    Ok(())
}

/// Whether applying `req` would change any stored field of `existing`.
pub fn update_changes_anything(existing: &EvaluationRow, req: &UpdateEvaluationRequest) -> bool {
    fn differs<T: PartialEq>(proposed: Option<T>, current: T) -> bool {
        proposed.is_some_and(|p| p != current)
    }
    fn differs_opt<T: PartialEq>(proposed: Option<T>, current: Option<T>) -> bool {
        proposed.is_some() && proposed != current
    }

    let c = &req.categories;
    let comment = req.comment.as_deref().map(str::trim);
    differs(req.rating, existing.rating)
        || differs_opt(c.trustworthiness, existing.trustworthiness)
        || differs_opt(c.expertise, existing.expertise)
        || differs_opt(c.communication, existing.communication)
        || differs_opt(c.reliability, existing.reliability)
        || differs_opt(c.value, existing.value)
        || differs(req.relationship_type, existing.relationship_type)
        || differs(comment, existing.comment.as_str())
}

/// Applies a partial update and records the previous rating and comment.
pub async fn update_evaluation(
    pool: &PgPool,
    cache: &RankingCache,
    id: Uuid,
    req: &UpdateEvaluationRequest,
) -> Result<EvaluationRow, AppError> {
    let existing = load_evaluation(pool, id).await?;
    require_evaluator(&existing, req.user_id)?;

    if let Some(rating) = req.rating {
        validate_score("rating", rating)?;
    }
    validate_categories(&req.categories)?;
    let relationship = req.relationship_type.map(parse_relationship).transpose()?;
    if let Some(comment) = &req.comment {
        validate_comment(comment)?;
    }
    if !update_changes_anything(&existing, req) {
        return Ok(existing);
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO evaluation_edits (id, evaluation_id, rating, comment) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(existing.rating)
    .bind(&existing.comment)
    .execute(&mut *tx)
    .await?;

    let updated = sqlx::query_as::<_, EvaluationRow>(
        r#"
        UPDATE evaluations
        SET rating            = COALESCE($2, rating),
            trustworthiness   = COALESCE($3, trustworthiness),
            expertise         = COALESCE($4, expertise),
            communication     = COALESCE($5, communication),
            reliability       = COALESCE($6, reliability),
            value             = COALESCE($7, value),
            relationship_type = COALESCE($8, relationship_type),
            comment           = COALESCE($9, comment),
            updated_at        = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.rating)
    .bind(req.categories.trustworthiness)
    .bind(req.categories.expertise)
    .bind(req.categories.communication)
    .bind(req.categories.reliability)
    .bind(req.categories.value)
    .bind(relationship.map(i16::from))
    .bind(req.comment.as_deref().map(str::trim))
    .fetch_one(&mut *tx)
    .await?;

    if let Some(slug) = &updated.company_slug {
        refresh_company_average(&mut *tx, slug).await?;
    }

    tx.commit().await?;

    if updated.company_slug.is_some() {
        cache.invalidate().await;
    }
    info!("Evaluation {id} edited by {}", req.user_id);
    Ok(updated)
}

/// Company the evaluator leaves the reviewer set of after `deleted` is gone.
/// `remaining` counts their other evaluations of that company.
pub fn reviewer_to_drop(deleted: &EvaluationRow, remaining: i64) -> Option<&str> {
    match deleted.company_slug.as_deref() {
        Some(slug) if remaining == 0 => Some(slug),
        _ => None,
    }
}

/// Deletes an evaluation. The evaluator leaves the company's reviewer set
/// only when this was their last evaluation of that company.
pub async fn delete_evaluation(
    pool: &PgPool,
    cache: &RankingCache,
    id: Uuid,
    actor: Uuid,
) -> Result<(), AppError> {
    let existing = load_evaluation(pool, id).await?;
    require_evaluator(&existing, actor)?;

    let mut tx = pool.begin().await?;

    // Serializes with a concurrent create by the same evaluator, which
    // upserts (and so locks) this row before inserting its evaluation.
    if let Some(slug) = &existing.company_slug {
        sqlx::query(
            "SELECT 1 FROM company_reviewers WHERE company_slug = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(slug)
        .bind(existing.evaluator_id)
        .fetch_optional(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM evaluations WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if let Some(slug) = &existing.company_slug {
        let remaining: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM evaluations WHERE company_slug = $1 AND evaluator_id = $2",
        )
        .bind(slug)
        .bind(existing.evaluator_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(slug) = reviewer_to_drop(&existing, remaining) {
            sqlx::query("DELETE FROM company_reviewers WHERE company_slug = $1 AND user_id = $2")
                .bind(slug)
                .bind(existing.evaluator_id)
                .execute(&mut *tx)
                .await?;
        }
        refresh_company_average(&mut *tx, slug).await?;
    }

    tx.commit().await?;

    if existing.company_slug.is_some() {
        cache.invalidate().await;
    }
    info!("Evaluation {id} deleted by {actor}");
    Ok(())
}

pub async fn toggle_like(pool: &PgPool, id: Uuid, actor: Uuid) -> Result<LikeState, AppError> {
    let evaluation = load_evaluation(pool, id).await?;
    require_user(pool, actor).await?;

    let removed =
        sqlx::query("DELETE FROM evaluation_likes WHERE evaluation_id = $1 AND user_id = $2")
            .bind(id)
            .bind(actor)
            .execute(pool)
            .await?
            .rows_affected();

    let liked = if removed == 0 {
        sqlx::query(
            "INSERT INTO evaluation_likes (evaluation_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(actor)
        .execute(pool)
        .await?;
        true
    } else {
        false
    };

    let like_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM evaluation_likes WHERE evaluation_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

    if liked && actor != evaluation.evaluator_id {
        notify_best_effort(
            pool,
            evaluation.evaluator_id,
            NotificationKind::EvaluationLiked,
            json!({ "evaluation_id": id, "by": actor }),
        )
        .await;
    }

    Ok(LikeState { liked, like_count })
}

pub async fn add_reply(
    pool: &PgPool,
    id: Uuid,
    actor: Uuid,
    body: &str,
) -> Result<EvaluationReplyRow, AppError> {
    validate_reply(body)?;
    let evaluation = load_evaluation(pool, id).await?;
    require_user(pool, actor).await?;

    let reply = sqlx::query_as::<_, EvaluationReplyRow>(
        r#"
        INSERT INTO evaluation_replies (id, evaluation_id, author_id, body)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(actor)
    .bind(body.trim())
    .fetch_one(pool)
    .await?;

    if actor != evaluation.evaluator_id {
        notify_best_effort(
            pool,
            evaluation.evaluator_id,
            NotificationKind::EvaluationReply,
            json!({ "evaluation_id": id, "reply_id": reply.id, "by": actor }),
        )
        .await;
    }

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::fixtures::{company_eval, person_eval};

    fn patch(user_id: Uuid) -> UpdateEvaluationRequest {
        UpdateEvaluationRequest {
            user_id,
            rating: None,
            categories: CategoryScores::default(),
            relationship_type: None,
            comment: None,
        }
    }

    #[test]
    fn test_last_company_evaluation_drops_reviewer() {
        let evaluation = company_eval(Uuid::new_v4(), "acme", 4, 3);
        assert_eq!(reviewer_to_drop(&evaluation, 0), Some("acme"));
    }

    #[test]
    fn test_reviewer_kept_while_other_evaluations_remain() {
        let evaluation = company_eval(Uuid::new_v4(), "acme", 4, 3);
        assert_eq!(reviewer_to_drop(&evaluation, 1), None);
        assert_eq!(reviewer_to_drop(&evaluation, 5), None);
    }

    #[test]
    fn test_person_evaluation_never_touches_reviewers() {
        let evaluation = person_eval(Uuid::new_v4(), Uuid::new_v4(), 2, 0);
        assert_eq!(reviewer_to_drop(&evaluation, 0), None);
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let evaluation = company_eval(Uuid::new_v4(), "acme", 4, 0);
        assert!(!update_changes_anything(&evaluation, &patch(evaluation.evaluator_id)));
    }

    #[test]
    fn test_patch_with_same_values_changes_nothing() {
        let mut evaluation = company_eval(Uuid::new_v4(), "acme", 4, 0);
        evaluation.comment = "Solid team".to_string();
        evaluation.expertise = Some(5);

        let mut req = patch(evaluation.evaluator_id);
        req.rating = Some(4);
        req.comment = Some("  Solid team ".to_string());
        req.categories.expertise = Some(5);
        req.relationship_type = Some(0);
        assert!(!update_changes_anything(&evaluation, &req));
    }

    #[test]
    fn test_patch_detects_each_kind_of_change() {
        let evaluation = company_eval(Uuid::new_v4(), "acme", 4, 0);

        let mut rating = patch(evaluation.evaluator_id);
        rating.rating = Some(2);
        assert!(update_changes_anything(&evaluation, &rating));

        let mut category = patch(evaluation.evaluator_id);
        category.categories.value = Some(3);
        assert!(update_changes_anything(&evaluation, &category));

        let mut comment = patch(evaluation.evaluator_id);
        comment.comment = Some("Changed my mind".to_string());
        assert!(update_changes_anything(&evaluation, &comment));

        let mut relationship = patch(evaluation.evaluator_id);
        relationship.relationship_type = Some(3);
        assert!(update_changes_anything(&evaluation, &relationship));
    }
}
