use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::clean::{CleanReport, Cleaned, clean};
use crate::config::AnalysisConfig;
use crate::data::{MovieData, distinct_count};
use crate::error::Result;
use crate::expand::expand_list_column;
use crate::profit::{
    CategoryProfit, count_profit_outliers, plausible_budgets, profit_scatter,
    top_profit_categories, with_profit,
};
use crate::rating::{CategoryRating, weighted_ratings};
use crate::share::{BudgetRevenueShares, CategoryShare, budget_revenue_shares, frequency_shares};
use crate::trend::{PeriodTrend, period_trend};

/// Everything one run computes, stage by stage.
pub struct Analysis {
    pub cleaned: DataFrame,
    pub clean_report: CleanReport,
    /// One row per (movie, genre).
    pub genres: DataFrame,
    /// One row per (movie, production company), with profit columns.
    pub companies: DataFrame,
    pub genre_ratings: Vec<CategoryRating>,
    pub genre_popularity: Vec<CategoryShare>,
    pub company_shares: BudgetRevenueShares,
    /// `(budget, profit %)` before and after the budget plausibility filter.
    pub profit_points: Vec<(f64, f64)>,
    pub plausible_profit_points: Vec<(f64, f64)>,
    pub profit_outliers: usize,
    pub top_profit_companies: Vec<CategoryProfit>,
    /// Movies per release year and their mean runtime.
    pub yearly: Vec<PeriodTrend>,
}

/// Runs every stage on an already loaded table.
pub fn analyze(movies: &DataFrame, config: &AnalysisConfig) -> Result<Analysis> {
    config.validate()?;
    let columns = &config.columns;
    let delimiter = config.delimiter_byte();

    let Cleaned {
        table: cleaned,
        report: clean_report,
    } = clean(movies, config)?;

    let genres = expand_list_column(&cleaned, &columns.genres, delimiter, config.empty_segments)?;
    info!(
        rows = genres.height(),
        before = distinct_count(&cleaned, &columns.genres)?,
        after = distinct_count(&genres, &columns.genres)?,
        "split genres"
    );

    let companies = expand_list_column(
        &cleaned,
        &columns.production_companies,
        delimiter,
        config.empty_segments,
    )?;
    info!(
        rows = companies.height(),
        companies = distinct_count(&companies, &columns.production_companies)?,
        "split production companies"
    );

    let genre_ratings = weighted_ratings(&genres, &columns.genres, columns)?;
    let genre_popularity = frequency_shares(&genres, &columns.genres)?;
    let company_shares = budget_revenue_shares(&companies, config)?;

    let companies = with_profit(&companies, columns)?;
    let profit_points = profit_scatter(&companies, columns)?;
    let plausible = plausible_budgets(&companies, &columns.budget, config.min_plausible_budget)?;
    let plausible_profit_points = profit_scatter(&plausible, columns)?;
    let profit_outliers = count_profit_outliers(&companies, columns, config.profit_outlier_percent)?;
    info!(
        outliers = profit_outliers,
        above = config.profit_outlier_percent,
        "profit percentage outliers"
    );
    let top_profit_companies =
        top_profit_categories(&companies, &columns.production_companies, config)?;

    let yearly = period_trend(&cleaned, &columns.release_year, &columns.runtime)?;

    Ok(Analysis {
        cleaned,
        clean_report,
        genres,
        companies,
        genre_ratings,
        genre_popularity,
        company_shares,
        profit_points,
        plausible_profit_points,
        profit_outliers,
        top_profit_companies,
        yearly,
    })
}

/// Loads `input` and runs every stage.
pub fn run(input: &Path, config: &AnalysisConfig) -> Result<Analysis> {
    config.validate()?;
    let data = MovieData::load(input, config)?;
    analyze(&data.movies, config)
}
