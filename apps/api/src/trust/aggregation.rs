use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::evaluation::{CategoryScores, EvaluationRow, EvaluationTarget};
use crate::trust::dedup::dedup_latest;
use crate::trust::scoring::{
    average_rating, grade, ranking_score, recency_weight, weighted_mean, Grade,
};

/// Aggregate reputation of one company or person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustSummary {
    pub review_count: usize,
    pub unique_reviewers: usize,
    /// Plain mean over every evaluation row.
    pub average_rating: f64,
    /// Recency-weighted mean over the latest evaluation per reviewer.
    pub trust_score: f64,
    pub grade: Grade,
    /// Mean of each category sub-score; categories nobody filled in are absent.
    pub categories: BTreeMap<String, f64>,
    /// Counts for ratings 1 through 5.
    pub rating_distribution: [usize; 5],
    pub relationship_distribution: BTreeMap<String, usize>,
}

pub fn summarize(evaluations: &[EvaluationRow], now: DateTime<Utc>) -> TrustSummary {
    let ratings: Vec<i16> = evaluations.iter().map(|e| e.rating).collect();
    let deduped = dedup_latest(evaluations);

    let trust_score = weighted_mean(
        deduped
            .iter()
            .map(|e| (f64::from(e.rating), recency_weight(e.created_at, now))),
    )
    .unwrap_or(0.0);

    let mut rating_distribution = [0usize; 5];
    for &rating in &ratings {
        if (1..=5).contains(&rating) {
            rating_distribution[(rating - 1) as usize] += 1;
        }
    }

    let mut relationship_distribution = BTreeMap::new();
    for evaluation in evaluations {
        *relationship_distribution
            .entry(evaluation.relationship().label().to_string())
            .or_insert(0) += 1;
    }

    TrustSummary {
        review_count: evaluations.len(),
        unique_reviewers: deduped.len(),
        average_rating: average_rating(&ratings),
        trust_score,
        grade: grade(trust_score),
        categories: category_averages(evaluations),
        rating_distribution,
        relationship_distribution,
    }
}

fn category_averages(evaluations: &[EvaluationRow]) -> BTreeMap<String, f64> {
    let mut averages = BTreeMap::new();
    for (idx, name) in CategoryScores::NAMES.iter().enumerate() {
        let values: Vec<i16> = evaluations
            .iter()
            .filter_map(|e| e.categories().values()[idx])
            .collect();
        if !values.is_empty() {
            averages.insert(name.to_string(), average_rating(&values));
        }
    }
    averages
}

// ────────────────────────────────────────────────────────────────────────────
// Ranking
// ────────────────────────────────────────────────────────────────────────────

/// Per-company aggregate as loaded from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompanyStats {
    pub slug: String,
    pub name: String,
    pub average_rating: f64,
    pub review_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedCompany {
    pub rank: usize,
    pub slug: String,
    pub name: String,
    pub average_rating: f64,
    pub review_count: i64,
    pub score: f64,
    pub grade: Grade,
}

/// Orders companies by `average × review_count`, then average, then slug.
/// Companies without reviews are left out.
pub fn rank_companies(stats: Vec<CompanyStats>, limit: usize) -> Vec<RankedCompany> {
    let mut scored: Vec<(f64, CompanyStats)> = stats
        .into_iter()
        .filter(|s| s.review_count > 0)
        .map(|s| (ranking_score(s.average_rating, s.review_count), s))
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .total_cmp(score_a)
            .then(b.average_rating.total_cmp(&a.average_rating))
            .then(a.slug.cmp(&b.slug))
    });

    scored
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, (score, s))| RankedCompany {
            rank: idx + 1,
            grade: grade(s.average_rating),
            slug: s.slug,
            name: s.name,
            average_rating: s.average_rating,
            review_count: s.review_count,
            score,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Personal trust map
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustMapEntry {
    pub company_slug: String,
    /// Σ recency × evaluator multiplier.
    pub weight: f64,
    pub weighted_rating: f64,
    pub evaluator_count: usize,
    pub grade: Grade,
}

/// Companies as seen through the viewer's own network.
///
/// Counts company evaluations written by the viewer (multiplier 1.0) or by
/// one of the viewer's active connections (multiplier = connection strength).
/// Everything else is ignored. Companies whose total weight is zero are dropped.
pub fn personal_trust_map(
    viewer: Uuid,
    evaluations: &[EvaluationRow],
    connection_strengths: &HashMap<Uuid, f64>,
    now: DateTime<Utc>,
) -> Vec<TrustMapEntry> {
    struct Acc {
        weight: f64,
        weighted_sum: f64,
        evaluators: usize,
    }

    let mut per_company: BTreeMap<String, Acc> = BTreeMap::new();

    for evaluation in dedup_latest(evaluations) {
        let Some(EvaluationTarget::Company(slug)) = evaluation.target() else {
            continue;
        };
        let multiplier = if evaluation.evaluator_id == viewer {
            1.0
        } else if let Some(strength) = connection_strengths.get(&evaluation.evaluator_id) {
            *strength
        } else {
            continue;
        };

        let w = recency_weight(evaluation.created_at, now) * multiplier;
        let acc = per_company.entry(slug).or_insert(Acc {
            weight: 0.0,
            weighted_sum: 0.0,
            evaluators: 0,
        });
        acc.weight += w;
        acc.weighted_sum += f64::from(evaluation.rating) * w;
        acc.evaluators += 1;
    }

    let mut entries: Vec<TrustMapEntry> = per_company
        .into_iter()
        .filter(|(_, acc)| acc.weight > 0.0)
        .map(|(company_slug, acc)| {
            let weighted_rating = acc.weighted_sum / acc.weight;
            TrustMapEntry {
                company_slug,
                weight: acc.weight,
                weighted_rating,
                evaluator_count: acc.evaluators,
                grade: grade(weighted_rating),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then(a.company_slug.cmp(&b.company_slug))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::fixtures::{company_eval, person_eval};

    fn stats(slug: &str, avg: f64, count: i64) -> CompanyStats {
        CompanyStats {
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            average_rating: avg,
            review_count: count,
        }
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = summarize(&[], Utc::now());
        assert_eq!(summary.review_count, 0);
        assert_eq!(summary.average_rating, 0.0);
        assert_eq!(summary.trust_score, 0.0);
        assert_eq!(summary.grade, Grade::E);
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_summary_average_counts_every_row_but_trust_dedups() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let evals = vec![
            company_eval(alice, "acme", 1, 200),
            company_eval(alice, "acme", 5, 0),
            company_eval(bob, "acme", 5, 0),
        ];
        let summary = summarize(&evals, Utc::now());

        assert_eq!(summary.review_count, 3);
        assert_eq!(summary.unique_reviewers, 2);
        assert!((summary.average_rating - 11.0 / 3.0).abs() < 1e-9);
        // Alice's stale 1-star is superseded, both remaining are 5
        assert!((summary.trust_score - 5.0).abs() < 1e-9);
        assert_eq!(summary.grade, Grade::A);
        assert_eq!(summary.rating_distribution, [1, 0, 0, 0, 2]);
    }

    #[test]
    fn test_trust_score_favors_recent_reviews() {
        let evals = vec![
            company_eval(Uuid::new_v4(), "acme", 5, 0),
            company_eval(Uuid::new_v4(), "acme", 1, 1000),
        ];
        let summary = summarize(&evals, Utc::now());
        assert!(summary.trust_score > summary.average_rating);
    }

    #[test]
    fn test_category_averages_skip_unset() {
        let mut a = company_eval(Uuid::new_v4(), "acme", 4, 1);
        a.expertise = Some(5);
        a.value = Some(2);
        let mut b = company_eval(Uuid::new_v4(), "acme", 4, 1);
        b.expertise = Some(3);

        let summary = summarize(&[a, b], Utc::now());
        assert_eq!(summary.categories.get("expertise"), Some(&4.0));
        assert_eq!(summary.categories.get("value"), Some(&2.0));
        assert!(!summary.categories.contains_key("reliability"));
    }

    #[test]
    fn test_relationship_distribution_uses_labels() {
        let mut a = company_eval(Uuid::new_v4(), "acme", 4, 1);
        a.relationship_type = 2;
        let b = company_eval(Uuid::new_v4(), "acme", 4, 1);

        let summary = summarize(&[a, b], Utc::now());
        assert_eq!(summary.relationship_distribution.get("client"), Some(&1));
        assert_eq!(summary.relationship_distribution.get("unset"), Some(&1));
    }

    #[test]
    fn test_rank_companies_by_volume_weighted_score() {
        let ranked = rank_companies(
            vec![
                stats("small", 5.0, 2),
                stats("big", 4.0, 10),
                stats("empty", 0.0, 0),
            ],
            10,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].slug, "big");
        assert_eq!(ranked[0].rank, 1);
        assert!((ranked[0].score - 40.0).abs() < f64::EPSILON);
        assert_eq!(ranked[1].slug, "small");
    }

    #[test]
    fn test_rank_companies_tie_breaks() {
        let ranked = rank_companies(
            vec![
                stats("beta", 4.0, 5),
                stats("alpha", 4.0, 5),
                stats("high", 5.0, 4),
            ],
            10,
        );
        // all score 20; higher average first, then slug
        let slugs: Vec<_> = ranked.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["high", "alpha", "beta"]);
    }

    #[test]
    fn test_rank_companies_respects_limit() {
        let all: Vec<_> = (1..=5).map(|i| stats(&format!("c{i}"), 3.0, i)).collect();
        assert_eq!(rank_companies(all, 2).len(), 2);
    }

    #[test]
    fn test_trust_map_only_counts_viewer_and_connections() {
        let viewer = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let strengths = HashMap::from([(friend, 0.5)]);

        let evals = vec![
            company_eval(viewer, "acme", 4, 0),
            company_eval(friend, "acme", 2, 0),
            company_eval(stranger, "acme", 1, 0),
            company_eval(stranger, "globex", 5, 0),
        ];
        let map = personal_trust_map(viewer, &evals, &strengths, Utc::now());

        assert_eq!(map.len(), 1);
        let acme = &map[0];
        assert_eq!(acme.company_slug, "acme");
        assert_eq!(acme.evaluator_count, 2);
        assert!((acme.weight - 1.5).abs() < 1e-6);
        // (4×1 + 2×0.5) / 1.5
        assert!((acme.weighted_rating - 10.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_trust_map_ignores_person_evaluations() {
        let viewer = Uuid::new_v4();
        let evals = vec![person_eval(viewer, Uuid::new_v4(), 5, 0)];
        assert!(personal_trust_map(viewer, &evals, &HashMap::new(), Utc::now()).is_empty());
    }

    #[test]
    fn test_trust_map_drops_zero_weight_companies() {
        let viewer = Uuid::new_v4();
        let muted = Uuid::new_v4();
        let strengths = HashMap::from([(muted, 0.0)]);
        let evals = vec![company_eval(muted, "acme", 5, 0)];
        assert!(personal_trust_map(viewer, &evals, &strengths, Utc::now()).is_empty());
    }

    #[test]
    fn test_trust_map_sorted_by_weight() {
        let viewer = Uuid::new_v4();
        let evals = vec![
            company_eval(viewer, "old", 5, 900),
            company_eval(viewer, "fresh", 3, 1),
        ];
        let map = personal_trust_map(viewer, &evals, &HashMap::new(), Utc::now());
        assert_eq!(map[0].company_slug, "fresh");
        assert_eq!(map[1].company_slug, "old");
    }
}
