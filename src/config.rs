use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AnalysisError, Result};

/// Names of the columns the analysis reads.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    pub budget: String,
    pub revenue: String,
    pub runtime: String,
    pub genres: String,
    pub production_companies: String,
    pub vote_count: String,
    pub vote_average: String,
    pub release_year: String,
}

impl ColumnNames {
    /// Columns the loader insists on before any stage runs.
    pub fn required(&self) -> [&str; 8] {
        [
            self.budget.as_str(),
            self.revenue.as_str(),
            self.runtime.as_str(),
            self.genres.as_str(),
            self.production_companies.as_str(),
            self.vote_count.as_str(),
            self.vote_average.as_str(),
            self.release_year.as_str(),
        ]
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            budget: "budget".into(),
            revenue: "revenue".into(),
            runtime: "runtime".into(),
            genres: "genres".into(),
            production_companies: "production_companies".into(),
            vote_count: "vote_count".into(),
            vote_average: "vote_average".into(),
            release_year: "release_year".into(),
        }
    }
}

/// What the expander does with empty list segments such as the tail of `"Drama|"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySegments {
    /// Keep them as an empty-string category.
    #[default]
    Keep,
    /// Skip them; a cell with nothing left yields one row with a missing category.
    Drop,
}

/// Tunables for one analysis run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub columns: ColumnNames,
    /// Columns removed before any other cleaning step.
    pub drop_columns: Vec<String>,
    /// Numeric columns where `0` is a placeholder for "unknown".
    pub sentinel_columns: Vec<String>,
    /// Separator inside multi-valued cells.
    pub list_delimiter: char,
    pub empty_segments: EmptySegments,
    /// Budgets at or below this value are excluded from the profit ranking.
    pub min_plausible_budget: f64,
    /// Size of the budget and revenue share rankings.
    pub top_k: usize,
    /// Size of the profit percentage ranking.
    pub profit_top_k: usize,
    /// Profit percentages above this are reported as outliers.
    pub profit_outlier_percent: f64,
    /// Field separator of the input file.
    pub csv_separator: char,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            drop_columns: [
                "id",
                "imdb_id",
                "popularity",
                "cast",
                "homepage",
                "tagline",
                "overview",
                "release_date",
                "budget_adj",
                "revenue_adj",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            sentinel_columns: ["budget", "revenue", "runtime"]
                .into_iter()
                .map(String::from)
                .collect(),
            list_delimiter: '|',
            empty_segments: EmptySegments::Keep,
            min_plausible_budget: 500.0,
            top_k: 3,
            profit_top_k: 10,
            profit_outlier_percent: 10_000.0,
            csv_separator: ',',
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            AnalysisError::configuration(format!("cannot read '{}': {err}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.list_delimiter.is_ascii() {
            return Err(AnalysisError::configuration(format!(
                "list delimiter {:?} must be a single ASCII character",
                self.list_delimiter
            )));
        }
        if !self.csv_separator.is_ascii() {
            return Err(AnalysisError::configuration(format!(
                "csv separator {:?} must be a single ASCII character",
                self.csv_separator
            )));
        }
        if self.top_k == 0 || self.profit_top_k == 0 {
            return Err(AnalysisError::configuration(
                "ranking sizes must be at least 1",
            ));
        }
        for (name, value) in [
            ("min_plausible_budget", self.min_plausible_budget),
            ("profit_outlier_percent", self.profit_outlier_percent),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::configuration(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Delimiter as the byte the expander scans for. Only valid after `validate`.
    pub fn delimiter_byte(&self) -> u8 {
        self.list_delimiter as u8
    }

    pub fn separator_byte(&self) -> u8 {
        self.csv_separator as u8
    }
}

#[cfg(test)]
mod test_config {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = AnalysisConfig::default();
        assert_eq!(config.list_delimiter, '|');
        assert_eq!(config.min_plausible_budget, 500.0);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.profit_top_k, 10);
        assert_eq!(config.sentinel_columns, ["budget", "revenue", "runtime"]);
        assert_eq!(config.drop_columns.len(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() -> Result<()> {
        let config = AnalysisConfig::from_toml_str(
            r#"
            top_k = 5
            empty_segments = "drop"
            sentinel_columns = ["budget"]

            [columns]
            release_year = "year"
            "#,
        )?;
        assert_eq!(config.top_k, 5);
        assert_eq!(config.empty_segments, EmptySegments::Drop);
        assert_eq!(config.sentinel_columns, ["budget"]);
        assert_eq!(config.columns.release_year, "year");
        assert_eq!(config.columns.budget, "budget");
        assert_eq!(config.profit_top_k, 10);
        Ok(())
    }

    #[test]
    fn test_shipped_config_matches_defaults() -> Result<()> {
        let config = AnalysisConfig::from_toml_str(include_str!("../analysis.toml"))?;
        assert_eq!(config, AnalysisConfig::default());
        Ok(())
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let res = AnalysisConfig::from_toml_str("top_kk = 5");
        assert!(matches!(res, Err(AnalysisError::Toml(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let res = AnalysisConfig::from_toml_str("list_delimiter = \"¦\"");
        assert!(matches!(res, Err(AnalysisError::Configuration(_))));

        let res = AnalysisConfig::from_toml_str("top_k = 0");
        assert!(matches!(res, Err(AnalysisError::Configuration(_))));

        let res = AnalysisConfig::from_toml_str("min_plausible_budget = -1.0");
        assert!(matches!(res, Err(AnalysisError::Configuration(_))));
    }
}
