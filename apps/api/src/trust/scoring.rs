use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time constant of the recency decay. A review this old weighs 1/e.
pub const DECAY_PERIOD_DAYS: f64 = 365.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

/// Arithmetic mean of ratings. Empty input yields 0.0.
pub fn average_rating(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: f64 = ratings.iter().map(|&r| f64::from(r)).sum();
    sum / ratings.len() as f64
}

/// Volume-weighted ranking score: average × review count.
pub fn ranking_score(average: f64, review_count: i64) -> f64 {
    average * review_count.max(0) as f64
}

/// Exponential recency multiplier in (0, 1].
/// Timestamps in the future count as brand new.
pub fn recency_weight(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_secs = (now - created_at).num_seconds().max(0) as f64;
    let age_days = age_secs / SECONDS_PER_DAY;
    (-age_days / DECAY_PERIOD_DAYS).exp()
}

/// Fixed threshold ladder: ≥4.5 A, ≥4 B, ≥3 C, ≥2 D, else E.
pub fn grade(score: f64) -> Grade {
    match score {
        s if s >= 4.5 => Grade::A,
        s if s >= 4.0 => Grade::B,
        s if s >= 3.0 => Grade::C,
        s if s >= 2.0 => Grade::D,
        _ => Grade::E,
    }
}

/// Σ(value × weight) / Σ(weight), or `None` when the total weight is zero.
pub fn weighted_mean(pairs: impl IntoIterator<Item = (f64, f64)>) -> Option<f64> {
    let (num, den) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(n, d), (value, weight)| {
            (n + value * weight, d + weight)
        });
    if den > 0.0 {
        Some(num / den)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_average_of_empty_is_zero() {
        assert_eq!(average_rating(&[]), 0.0);
    }

    #[test]
    fn test_average_rating() {
        let avg = average_rating(&[5, 4, 3]);
        assert!((avg - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ranking_score_weights_volume() {
        // 4.0 over 10 reviews beats 5.0 over 2
        assert!(ranking_score(4.0, 10) > ranking_score(5.0, 2));
        assert_eq!(ranking_score(4.5, 0), 0.0);
    }

    #[test]
    fn test_recency_weight_new_review_is_one() {
        let now = Utc::now();
        assert!((recency_weight(now, now) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_recency_weight_one_period_is_inverse_e() {
        let now = Utc::now();
        let w = recency_weight(now - Duration::days(365), now);
        assert!((w - (-1.0_f64).exp()).abs() < 1e-9, "weight was {w}");
    }

    #[test]
    fn test_recency_weight_decreases_with_age() {
        let now = Utc::now();
        let recent = recency_weight(now - Duration::days(10), now);
        let old = recency_weight(now - Duration::days(800), now);
        assert!(recent > old);
        assert!(old > 0.0);
    }

    #[test]
    fn test_recency_weight_future_is_clamped() {
        let now = Utc::now();
        assert_eq!(recency_weight(now + Duration::days(3), now), 1.0);
    }

    #[test]
    fn test_grade_ladder_boundaries() {
        assert_eq!(grade(5.0), Grade::A);
        assert_eq!(grade(4.5), Grade::A);
        assert_eq!(grade(4.49), Grade::B);
        assert_eq!(grade(4.0), Grade::B);
        assert_eq!(grade(3.0), Grade::C);
        assert_eq!(grade(2.0), Grade::D);
        assert_eq!(grade(1.99), Grade::E);
        assert_eq!(grade(0.0), Grade::E);
    }

    #[test]
    fn test_grade_nan_is_e() {
        assert_eq!(grade(f64::NAN), Grade::E);
    }

    #[test]
    fn test_weighted_mean() {
        let mean = weighted_mean([(5.0, 1.0), (1.0, 3.0)]).unwrap();
        assert!((mean - 2.0).abs() < f64::EPSILON);
        assert_eq!(weighted_mean(std::iter::empty()), None);
        assert_eq!(weighted_mean([(4.0, 0.0)]), None);
    }
}
