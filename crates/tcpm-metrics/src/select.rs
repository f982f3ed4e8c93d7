//! Ranking of candidate scores where `NaN` means "metric undefined".

use std::cmp::Ordering;

/// Order two scores so that larger is better and `NaN` is worst.
///
/// Returns [`Ordering::Greater`] when `a` ranks above `b`. Two `NaN`s compare
/// equal.
#[must_use]
pub fn compare_scores(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.total_cmp(&b),
    }
}

/// Index of the best defined score. Ties keep the earliest candidate.
///
/// Returns `None` when `scores` is empty or every score is `NaN`.
#[must_use]
pub fn best_candidate(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &s) in scores.iter().enumerate() {
        if s.is_nan() {
            continue;
        }
        match best {
            Some(b) if compare_scores(s, scores[b]) != Ordering::Greater => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Candidate indices sorted best first, `NaN` scores last.
#[must_use]
pub fn rank_candidates(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| compare_scores(scores[b], scores[a]));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_ranks_below_zero() {
        assert_eq!(compare_scores(0.0, f64::NAN), Ordering::Greater);
        assert_eq!(compare_scores(f64::NAN, 0.0), Ordering::Less);
        assert_eq!(compare_scores(f64::NAN, f64::NAN), Ordering::Equal);
        assert_eq!(compare_scores(0.7, 0.2), Ordering::Greater);
    }

    #[test]
    fn best_skips_undefined() {
        assert_eq!(best_candidate(&[f64::NAN, 0.1, 0.4, f64::NAN]), Some(2));
        assert_eq!(best_candidate(&[0.0, f64::NAN]), Some(0));
        assert_eq!(best_candidate(&[f64::NAN, f64::NAN]), None);
        assert_eq!(best_candidate(&[]), None);
    }

    #[test]
    fn ties_keep_first() {
        assert_eq!(best_candidate(&[0.5, 0.5, 0.2]), Some(0));
    }

    #[test]
    fn ranking_puts_nan_last() {
        let order = rank_candidates(&[0.2, f64::NAN, 0.9, 0.0]);
        assert_eq!(order, vec![2, 0, 3, 1]);
    }
}
