use std::collections::HashMap;

use uuid::Uuid;

use crate::models::evaluation::{EvaluationRow, EvaluationTarget};

/// Collapses duplicate submission pathways: one evaluator may have rated the
/// same target several times (company page, profile page, re-submission).
/// Keeps the most recent evaluation per (evaluator, target). Ties on
/// `created_at` keep the larger id so the result is deterministic.
///
/// Output is ordered newest first.
pub fn dedup_latest(evaluations: &[EvaluationRow]) -> Vec<&EvaluationRow> {
    let mut latest: HashMap<(Uuid, EvaluationTarget), &EvaluationRow> = HashMap::new();

    for evaluation in evaluations {
        let Some(target) = evaluation.target() else {
            continue;
        };
        latest
            .entry((evaluation.evaluator_id, target))
            .and_modify(|kept| {
                if is_newer(evaluation, kept) {
                    *kept = evaluation;
                }
            })
            .or_insert(evaluation);
    }

    let mut kept: Vec<&EvaluationRow> = latest.into_values().collect();
    kept.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    kept
}

fn is_newer(candidate: &EvaluationRow, kept: &EvaluationRow) -> bool {
    (candidate.created_at, candidate.id) > (kept.created_at, kept.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::fixtures::{company_eval, eval_at, person_eval};
    use chrono::Utc;

    #[test]
    fn test_keeps_latest_per_evaluator_and_target() {
        let alice = Uuid::new_v4();
        let old = company_eval(alice, "acme", 2, 100);
        let new = company_eval(alice, "acme", 5, 1);
        let evals = vec![old, new.clone()];

        let kept = dedup_latest(&evals);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, new.id);
    }

    #[test]
    fn test_distinct_targets_are_not_merged() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let evals = vec![
            company_eval(alice, "acme", 4, 3),
            company_eval(alice, "globex", 4, 3),
            person_eval(alice, bob, 3, 3),
        ];
        assert_eq!(dedup_latest(&evals).len(), 3);
    }

    #[test]
    fn test_distinct_evaluators_are_not_merged() {
        let evals = vec![
            company_eval(Uuid::new_v4(), "acme", 4, 3),
            company_eval(Uuid::new_v4(), "acme", 2, 3),
        ];
        assert_eq!(dedup_latest(&evals).len(), 2);
    }

    #[test]
    fn test_tie_breaks_on_id() {
        let alice = Uuid::new_v4();
        let at = Utc::now();
        let a = eval_at(alice, Some("acme"), None, 1, at);
        let b = eval_at(alice, Some("acme"), None, 5, at);
        let expected = if a.id > b.id { a.id } else { b.id };

        let forward = vec![a.clone(), b.clone()];
        let backward = vec![b, a];
        assert_eq!(dedup_latest(&forward)[0].id, expected);
        assert_eq!(dedup_latest(&backward)[0].id, expected);
    }

    #[test]
    fn test_output_is_newest_first() {
        let evals = vec![
            company_eval(Uuid::new_v4(), "acme", 4, 30),
            company_eval(Uuid::new_v4(), "acme", 4, 1),
            company_eval(Uuid::new_v4(), "acme", 4, 10),
        ];
        let kept = dedup_latest(&evals);
        assert!(kept.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }
}
