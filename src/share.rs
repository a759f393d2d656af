use ahash::HashMap;
use polars::prelude::*;
use tracing::{debug, warn};

use crate::aggregate::{Ranked, rank_descending, ratio, top_k};
use crate::config::AnalysisConfig;
use crate::data::{numeric_column, text_column};
use crate::error::Result;

/// One category's part of a grand total.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryShare {
    pub label: String,
    pub total: f64,
    pub percent: f64,
}

impl Ranked for CategoryShare {
    fn label(&self) -> &str {
        &self.label
    }
    fn score(&self) -> f64 {
        self.percent
    }
}

/// Top spenders and top earners among production companies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BudgetRevenueShares {
    pub budget: Vec<CategoryShare>,
    pub revenue: Vec<CategoryShare>,
}

fn into_shares(totals: HashMap<&str, f64>, what: &str) -> Vec<CategoryShare> {
    let grand_total: f64 = totals.values().sum();
    if grand_total == 0.0 {
        warn!(what, "grand total is zero, every share is undefined");
        return Vec::new();
    }

    let mut shares = Vec::with_capacity(totals.len());
    for (label, total) in totals {
        match ratio(label, total * 100.0, grand_total) {
            Ok(percent) => shares.push(CategoryShare {
                label: label.to_string(),
                total,
                percent,
            }),
            Err(err) => debug!(%err, what, "omitting category from shares"),
        }
    }
    rank_descending(&mut shares);
    shares
}

/// `100 · Σ metric(C) / Σ metric(all)` for every category, largest first.
/// Missing metric values count as nothing; rows without a category are ignored.
pub fn metric_shares(df: &DataFrame, category: &str, metric: &str) -> Result<Vec<CategoryShare>> {
    let labels = text_column(df, category)?;
    let values = numeric_column(df, metric)?;

    let mut totals: HashMap<&str, f64> = HashMap::default();
    for (label, value) in labels.iter().zip(values) {
        let Some(label) = label.as_deref() else {
            continue;
        };
        *totals.entry(label).or_default() += value.unwrap_or(0.0);
    }
    Ok(into_shares(totals, metric))
}

pub fn top_metric_shares(
    df: &DataFrame,
    category: &str,
    metric: &str,
    k: usize,
) -> Result<Vec<CategoryShare>> {
    Ok(top_k(metric_shares(df, category, metric)?, k))
}

/// Share of rows falling into each category, largest first.
pub fn frequency_shares(df: &DataFrame, category: &str) -> Result<Vec<CategoryShare>> {
    let labels = text_column(df, category)?;

    let mut counts: HashMap<&str, f64> = HashMap::default();
    for label in labels.iter().flatten() {
        *counts.entry(label.as_str()).or_default() += 1.0;
    }
    Ok(into_shares(counts, category))
}

/// Top-K production companies by budget share and by revenue share.
pub fn budget_revenue_shares(
    companies: &DataFrame,
    config: &AnalysisConfig,
) -> Result<BudgetRevenueShares> {
    let columns = &config.columns;
    Ok(BudgetRevenueShares {
        budget: top_metric_shares(
            companies,
            &columns.production_companies,
            &columns.budget,
            config.top_k,
        )?,
        revenue: top_metric_shares(
            companies,
            &columns.production_companies,
            &columns.revenue,
            config.top_k,
        )?,
    })
}
