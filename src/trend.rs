use ahash::HashMap;
use polars::prelude::*;

use crate::data::{integer_column, numeric_column};
use crate::error::Result;

/// Volume and mean of a numeric field for one period.
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodTrend {
    pub period: i64,
    /// Rows in the period, whether or not `value` is known for them.
    pub count: usize,
    /// Mean of the non-missing values, `None` when the period has none.
    pub mean: Option<f64>,
}

/// Groups rows by `period` and reports per-period counts and the mean of
/// `value`, in ascending period order. Periods with no rows do not appear.
pub fn period_trend(df: &DataFrame, period: &str, value: &str) -> Result<Vec<PeriodTrend>> {
    let periods = integer_column(df, period)?;
    let values = numeric_column(df, value)?;

    // period -> (rows, value sum, values seen)
    let mut groups: HashMap<i64, (usize, f64, usize)> = HashMap::default();
    for (period, value) in periods.into_iter().zip(values) {
        let Some(period) = period else {
            continue;
        };
        let group = groups.entry(period).or_default();
        group.0 += 1;
        if let Some(value) = value {
            group.1 += value;
            group.2 += 1;
        }
    }

    let mut trend: Vec<PeriodTrend> = groups
        .into_iter()
        .map(|(period, (count, sum, seen))| PeriodTrend {
            period,
            count,
            mean: (seen > 0).then(|| sum / seen as f64),
        })
        .collect();
    trend.sort_by_key(|t| t.period);
    Ok(trend)
}
