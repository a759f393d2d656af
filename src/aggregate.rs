use std::cmp::Ordering;

use crate::error::{AnalysisError, Result};

/// `numerator / denominator`, or `UndefinedAggregate` when the denominator is
/// zero or the quotient is not a finite number.
pub fn ratio(subject: &str, numerator: f64, denominator: f64) -> Result<f64> {
    if denominator == 0.0 {
        return Err(AnalysisError::undefined(subject, "zero denominator"));
    }
    let value = numerator / denominator;
    if !value.is_finite() {
        return Err(AnalysisError::undefined(subject, "non-finite result"));
    }
    Ok(value)
}

/// A category summary that can be ranked by a single score.
pub trait Ranked {
    fn label(&self) -> &str;
    fn score(&self) -> f64;
}

fn by_score_then_label<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then_with(|| a.label().cmp(b.label()))
}

/// Highest score first; equal scores fall back to ascending label order.
pub fn rank_descending<T: Ranked>(items: &mut [T]) {
    items.sort_by(by_score_then_label);
}

pub fn top_k<T: Ranked>(mut items: Vec<T>, k: usize) -> Vec<T> {
    rank_descending(&mut items);
    items.truncate(k);
    items
}
