use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use rustc_hash::FxHashSet as HashSet;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};

/// The raw movie table as read from disk, one row per input record.
pub struct MovieData {
    pub movies: DataFrame,
}

// Reference layout (tmdb-movies.csv):
//     id, imdb_id, popularity, budget, revenue, original_title, cast, homepage,
//     director, tagline, keywords, overview, runtime, genres,
//     production_companies, release_date, vote_count, vote_average,
//     release_year, budget_adj, revenue_adj
//
// `genres` and `production_companies` hold `|`-joined lists.

impl MovieData {
    /// Reads a CSV (or `.parquet`) file and checks that every column the
    /// analysis needs is present.
    pub fn load(path: &Path, config: &AnalysisConfig) -> Result<Self> {
        let access = |reason: String| AnalysisError::DataAccess {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|err| access(err.to_string()))?;
        let movies = match path.extension().and_then(|ext| ext.to_str()) {
            Some("parquet") => ParquetReader::new(file).finish(),
            _ => CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(10_000))
                .map_parse_options(|opts| opts.with_separator(config.separator_byte()))
                .into_reader_with_file_handle(file)
                .finish(),
        }
        .map_err(|err| access(err.to_string()))?;

        for name in config.columns.required() {
            if movies.get_column_index(name).is_none() {
                return Err(access(format!("missing required column '{name}'")));
            }
        }

        info!(
            path = %path.display(),
            rows = movies.height(),
            columns = movies.width(),
            "loaded movie table"
        );
        Ok(Self { movies })
    }
}

/// Looks up a column the configuration names, failing with a configuration
/// error instead of a polars lookup error.
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| {
        AnalysisError::configuration(format!("column '{name}' does not exist in the table"))
    })
}

/// A column cast to `Float64`. Text or other non-numeric columns are a
/// configuration error rather than a column of missing values.
pub fn float_column(df: &DataFrame, name: &str) -> Result<Column> {
    let column = require_column(df, name)?;
    let dtype = column.dtype();
    if !(dtype.is_primitive_numeric() || dtype.is_null()) {
        return Err(AnalysisError::configuration(format!(
            "column '{name}' holds {dtype} values, expected numbers"
        )));
    }
    Ok(column.strict_cast(&DataType::Float64)?)
}

/// Column values as `f64`, whatever the stored numeric type.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = float_column(df, name)?;
    Ok(values.f64()?.into_iter().collect())
}

pub fn integer_column(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let values = require_column(df, name)?.cast(&DataType::Int64)?;
    Ok(values.i64()?.into_iter().collect())
}

pub fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let values = require_column(df, name)?.cast(&DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|opt| opt.map(|s| s.to_string()))
        .collect())
}

/// Number of distinct non-null values in a column.
pub fn distinct_count(df: &DataFrame, name: &str) -> Result<usize> {
    let values = require_column(df, name)?.cast(&DataType::String)?;
    let distinct: HashSet<&str> = values.str()?.into_iter().flatten().collect();
    Ok(distinct.len())
}
