use uuid::Uuid;

use crate::errors::AppError;
use crate::models::evaluation::{CategoryScores, EvaluationTarget, RelationshipType};

pub const MAX_COMMENT_CHARS: usize = 2000;
pub const MAX_REPLY_CHARS: usize = 1000;

pub fn validate_score(field: &str, value: i16) -> Result<(), AppError> {
    if (1..=5).contains(&value) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "{field} must be between 1 and 5, got {value}"
        )))
    }
}

pub fn validate_categories(categories: &CategoryScores) -> Result<(), AppError> {
    for (name, value) in CategoryScores::NAMES.iter().zip(categories.values()) {
        if let Some(v) = value {
            validate_score(name, v)?;
        }
    }
    Ok(())
}

pub fn parse_relationship(code: i16) -> Result<RelationshipType, AppError> {
    RelationshipType::try_from(code)
        .map_err(|_| AppError::Validation(format!("relationship_type must be 0–6, got {code}")))
}

pub fn validate_comment(comment: &str) -> Result<(), AppError> {
    if comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn validate_reply(body: &str) -> Result<(), AppError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::Validation("reply cannot be empty".to_string()));
    }
    if body.chars().count() > MAX_REPLY_CHARS {
        return Err(AppError::Validation(format!(
            "reply must be at most {MAX_REPLY_CHARS} characters"
        )));
    }
    Ok(())
}

/// Exactly one of company or person must be given, and people cannot rate themselves.
pub fn resolve_target(
    evaluator: Uuid,
    company_slug: Option<&str>,
    target_user_id: Option<Uuid>,
) -> Result<EvaluationTarget, AppError> {
    let company_slug = company_slug.map(str::trim).filter(|s| !s.is_empty());
    match (company_slug, target_user_id) {
        (Some(slug), None) => Ok(EvaluationTarget::Company(slug.to_string())),
        (None, Some(user_id)) if user_id == evaluator => Err(AppError::Validation(
            "You cannot evaluate yourself".to_string(),
        )),
        (None, Some(user_id)) => Ok(EvaluationTarget::Person(user_id)),
        (Some(_), Some(_)) => Err(AppError::Validation(
            "Specify either company_slug or target_user_id, not both".to_string(),
        )),
        (None, None) => Err(AppError::Validation(
            "company_slug or target_user_id is required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        assert!(validate_score("rating", 1).is_ok());
        assert!(validate_score("rating", 5).is_ok());
        assert!(validate_score("rating", 0).is_err());
        assert!(validate_score("rating", 6).is_err());
    }

    #[test]
    fn test_categories_only_checked_when_set() {
        let mut categories = CategoryScores::default();
        assert!(validate_categories(&categories).is_ok());
        categories.reliability = Some(9);
        let err = validate_categories(&categories).unwrap_err();
        assert!(err.to_string().contains("reliability"));
    }

    #[test]
    fn test_relationship_codes() {
        assert_eq!(parse_relationship(3).unwrap(), RelationshipType::Partner);
        assert!(matches!(
            parse_relationship(7),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_comment_length() {
        assert!(validate_comment(&"あ".repeat(MAX_COMMENT_CHARS)).is_ok());
        assert!(validate_comment(&"a".repeat(MAX_COMMENT_CHARS + 1)).is_err());
    }

    #[test]
    fn test_reply_rules() {
        assert!(validate_reply("  ").is_err());
        assert!(validate_reply("Thanks for the feedback").is_ok());
        assert!(validate_reply(&"a".repeat(MAX_REPLY_CHARS + 1)).is_err());
    }

    #[test]
    fn test_target_resolution() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(
            resolve_target(me, Some(" acme "), None).unwrap(),
            EvaluationTarget::Company("acme".to_string())
        );
        assert_eq!(
            resolve_target(me, None, Some(other)).unwrap(),
            EvaluationTarget::Person(other)
        );
        assert!(resolve_target(me, None, Some(me)).is_err());
        assert!(resolve_target(me, Some("acme"), Some(other)).is_err());
        assert!(resolve_target(me, None, None).is_err());
        assert!(resolve_target(me, Some(""), None).is_err());
    }
}
