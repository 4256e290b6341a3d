use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::connection::ConnectionRow;
use crate::models::evaluation::EvaluationRow;

pub fn company_eval(evaluator: Uuid, slug: &str, rating: i16, age_days: i64) -> EvaluationRow {
    let created_at = Utc::now() - Duration::days(age_days);
    eval_at(evaluator, Some(slug), None, rating, created_at)
}

pub fn person_eval(evaluator: Uuid, target: Uuid, rating: i16, age_days: i64) -> EvaluationRow {
    let created_at = Utc::now() - Duration::days(age_days);
    eval_at(evaluator, None, Some(target), rating, created_at)
}

pub fn eval_at(
    evaluator: Uuid,
    slug: Option<&str>,
    target_user: Option<Uuid>,
    rating: i16,
    created_at: DateTime<Utc>,
) -> EvaluationRow {
    EvaluationRow {
        id: Uuid::new_v4(),
        evaluator_id: evaluator,
        company_slug: slug.map(String::from),
        target_user_id: target_user,
        rating,
        trustworthiness: None,
        expertise: None,
        communication: None,
        reliability: None,
        value: None,
        relationship_type: 0,
        comment: String::new(),
        created_at,
        updated_at: created_at,
    }
}

pub fn connection(a: Uuid, b: Uuid, strength: f64, status: &str) -> ConnectionRow {
    let (user_a, user_b) = crate::models::connection::normalize_pair(a, b);
    ConnectionRow {
        id: Uuid::new_v4(),
        user_a,
        user_b,
        strength,
        status: status.to_string(),
        blocked_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
