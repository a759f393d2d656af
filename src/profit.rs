use ahash::HashMap;
use polars::prelude::*;
use tracing::debug;

use crate::aggregate::{Ranked, ratio, top_k};
use crate::config::{AnalysisConfig, ColumnNames};
use crate::data::{float_column, numeric_column, text_column};
use crate::error::{AnalysisError, Result};

pub const PROFIT: &str = "profit";
pub const PROFIT_PERCENT: &str = "profit_perc";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProfitRatio {
    pub profit: f64,
    /// Profit as a percentage of budget.
    pub profit_percent: f64,
}

/// Profit and profit percentage of a single title.
///
/// Undefined when either amount is missing, the budget is zero, or the
/// percentage overflows.
pub fn profit_ratio(budget: Option<f64>, revenue: Option<f64>) -> Result<ProfitRatio> {
    let (Some(budget), Some(revenue)) = (budget, revenue) else {
        return Err(AnalysisError::undefined(PROFIT_PERCENT, "missing budget or revenue"));
    };
    if budget == 0.0 {
        return Err(AnalysisError::undefined(PROFIT_PERCENT, "zero budget"));
    }
    let profit = revenue - budget;
    Ok(ProfitRatio {
        profit,
        profit_percent: ratio(PROFIT_PERCENT, 100.0 * profit, budget)?,
    })
}

/// Adds `profit` and `profit_perc` columns. Cells where the ratio is undefined
/// are left missing.
pub fn with_profit(df: &DataFrame, columns: &ColumnNames) -> Result<DataFrame> {
    let budgets = numeric_column(df, &columns.budget)?;
    let revenues = numeric_column(df, &columns.revenue)?;

    let mut undefined = 0usize;
    let (profits, percents): (Vec<Option<f64>>, Vec<Option<f64>>) = budgets
        .into_iter()
        .zip(revenues)
        .map(|(budget, revenue)| match profit_ratio(budget, revenue) {
            Ok(ratio) => (Some(ratio.profit), Some(ratio.profit_percent)),
            Err(_) => {
                undefined += 1;
                (budget.zip(revenue).map(|(b, r)| r - b), None)
            }
        })
        .unzip();
    debug!(undefined, "profit percentage not computable");

    let mut out = df.clone();
    out.with_column(Series::new(PROFIT.into(), profits))?;
    out.with_column(Series::new(PROFIT_PERCENT.into(), percents))?;
    Ok(out)
}

/// Rows whose budget is strictly above `min_budget`. Missing budgets are
/// dropped too.
pub fn plausible_budgets(df: &DataFrame, budget: &str, min_budget: f64) -> Result<DataFrame> {
    float_column(df, budget)?;
    let kept = df
        .clone()
        .lazy()
        .filter(col(budget).cast(DataType::Float64).gt(lit(min_budget)))
        .collect()?;
    debug!(
        rows_in = df.height(),
        rows_out = kept.height(),
        min_budget,
        "applied budget plausibility filter"
    );
    Ok(kept)
}

/// `(budget, profit percentage)` for every title where both are defined.
pub fn profit_scatter(df: &DataFrame, columns: &ColumnNames) -> Result<Vec<(f64, f64)>> {
    let budgets = numeric_column(df, &columns.budget)?;
    let revenues = numeric_column(df, &columns.revenue)?;
    Ok(budgets
        .into_iter()
        .zip(revenues)
        .filter_map(|(budget, revenue)| {
            let ratio = profit_ratio(budget, revenue).ok()?;
            Some((budget?, ratio.profit_percent))
        })
        .collect())
}

/// Number of titles whose profit percentage exceeds `above`.
pub fn count_profit_outliers(df: &DataFrame, columns: &ColumnNames, above: f64) -> Result<usize> {
    Ok(profit_scatter(df, columns)?
        .into_iter()
        .filter(|(_, percent)| *percent > above)
        .count())
}

/// Best profit percentage reached by any title of a category.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryProfit {
    pub label: String,
    pub max_profit_percent: f64,
    /// Budget of the title behind `max_profit_percent`.
    pub budget: f64,
}

impl Ranked for CategoryProfit {
    fn label(&self) -> &str {
        &self.label
    }
    fn score(&self) -> f64 {
        self.max_profit_percent
    }
}

/// Categories ranked by their maximum profit percentage.
///
/// Titles with an implausibly small budget are removed before ranking, since
/// a budget of a few dollars turns any revenue into an enormous percentage.
pub fn top_profit_categories(
    df: &DataFrame,
    category: &str,
    config: &AnalysisConfig,
) -> Result<Vec<CategoryProfit>> {
    let columns = &config.columns;
    let candidates = plausible_budgets(df, &columns.budget, config.min_plausible_budget)?;

    let labels = text_column(&candidates, category)?;
    let budgets = numeric_column(&candidates, &columns.budget)?;
    let revenues = numeric_column(&candidates, &columns.revenue)?;

    let mut best: HashMap<&str, CategoryProfit> = HashMap::default();
    for ((label, budget), revenue) in labels.iter().zip(budgets).zip(revenues) {
        let Some(label) = label.as_deref() else {
            continue;
        };
        let Ok(ratio) = profit_ratio(budget, revenue) else {
            continue;
        };
        let entry = best.entry(label).or_insert_with(|| CategoryProfit {
            label: label.to_string(),
            max_profit_percent: f64::NEG_INFINITY,
            budget: 0.0,
        });
        if ratio.profit_percent > entry.max_profit_percent {
            entry.max_profit_percent = ratio.profit_percent;
            entry.budget = budget.unwrap_or_default();
        }
    }

    Ok(top_k(best.into_values().collect(), config.profit_top_k))
}

#[cfg(test)]
mod test_profit {
    use super::*;

    fn companies() -> PolarsResult<DataFrame> {
        df!(
            "production_companies" => [
                Some("Blumhouse Productions"),
                Some("Haxan Films"),
                Some("Warner Bros."),
                Some("Warner Bros."),
                Some("Tiny Budget Co."),
                Some("Unknown Budget"),
                None,
            ],
            "budget" => [Some(15_000.0), Some(25_000.0), Some(1000.0), Some(200_000.0), Some(100.0), None, Some(600.0)],
            "revenue" => [Some(193_355_800.0), Some(248_000_000.0), Some(1500.0), Some(300_000.0), Some(1_000_000.0), Some(5.0), Some(6000.0)],
        )
    }

    #[test]
    fn test_profit_ratio() -> Result<()> {
        let ratio = profit_ratio(Some(1000.0), Some(1500.0))?;
        assert_eq!(ratio.profit, 500.0);
        assert_eq!(ratio.profit_percent, 50.0);

        let loss = profit_ratio(Some(200.0), Some(50.0))?;
        assert_eq!(loss.profit_percent, -75.0);

        for (budget, revenue) in [(Some(0.0), Some(10.0)), (None, Some(10.0)), (Some(10.0), None)] {
            assert!(matches!(
                profit_ratio(budget, revenue),
                Err(AnalysisError::UndefinedAggregate { .. })
            ));
        }

        // A vanishing budget against a huge revenue has no finite percentage.
        let res = profit_ratio(Some(1e-320), Some(1e300));
        assert!(matches!(res, Err(AnalysisError::UndefinedAggregate { .. })));
        Ok(())
    }

    #[test]
    fn test_with_profit() -> Result<()> {
        let df = df!(
            "budget" => [Some(1000.0), None, Some(0.0)],
            "revenue" => [Some(1500.0), Some(10.0), Some(10.0)],
        )?;
        let out = with_profit(&df, &ColumnNames::default())?;
        assert_eq!(
            numeric_column(&out, PROFIT)?,
            vec![Some(500.0), None, Some(10.0)]
        );
        assert_eq!(
            numeric_column(&out, PROFIT_PERCENT)?,
            vec![Some(50.0), None, None]
        );
        Ok(())
    }

    #[test]
    fn test_small_budgets_never_ranked() -> Result<()> {
        let df = companies()?;
        let ranked = top_profit_categories(&df, "production_companies", &AnalysisConfig::default())?;

        let labels: Vec<&str> = ranked.iter().map(|c| c.label.as_str()).collect();
        assert!(!labels.contains(&"Tiny Budget Co."));
        assert!(!labels.contains(&"Unknown Budget"));
        assert_eq!(labels, vec!["Blumhouse Productions", "Haxan Films", "Warner Bros."]);

        let warner = &ranked[2];
        assert_eq!(warner.max_profit_percent, 50.0);
        assert_eq!(warner.budget, 1000.0);
        Ok(())
    }

    #[test]
    fn test_plausible_budgets_threshold_is_exclusive() -> Result<()> {
        let df = df!(
            "budget" => [Some(500i64), Some(501), None, Some(100)],
        )?;
        let kept = plausible_budgets(&df, "budget", 500.0)?;
        assert_eq!(numeric_column(&kept, "budget")?, vec![Some(501.0)]);

        let text = df!("budget" => ["$600", "700"])?;
        let res = plausible_budgets(&text, "budget", 500.0);
        assert!(matches!(res, Err(AnalysisError::Configuration(_))));
        Ok(())
    }

    #[test]
    fn test_scatter_and_outliers() -> Result<()> {
        let df = companies()?;
        let columns = ColumnNames::default();
        let points = profit_scatter(&df, &columns)?;
        assert_eq!(points.len(), 6);
        assert_eq!(points[2], (1000.0, 50.0));

        // Blumhouse, Haxan and the 100-dollar budget are all far above 10 000 %.
        assert_eq!(count_profit_outliers(&df, &columns, 10_000.0)?, 3);
        let plausible = plausible_budgets(&df, "budget", 500.0)?;
        assert_eq!(count_profit_outliers(&plausible, &columns, 10_000.0)?, 2);
        Ok(())
    }
}
