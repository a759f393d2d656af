use polars::prelude::*;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::data::float_column;
use crate::error::{AnalysisError, Result};

/// What the cleaning stages removed or rewrote.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CleanReport {
    pub columns_dropped: usize,
    pub duplicates_removed: usize,
    /// Cells turned from `0` into missing, per sentinel column.
    pub sentinels_replaced: Vec<(String, usize)>,
}

pub struct Cleaned {
    pub table: DataFrame,
    pub report: CleanReport,
}

/// Removes the named columns. Every name must exist in the table.
pub fn prune_columns(df: &DataFrame, drop: &[String]) -> Result<DataFrame> {
    if let Some(missing) = drop.iter().find(|name| df.get_column_index(name).is_none()) {
        return Err(AnalysisError::configuration(format!(
            "cannot drop column '{missing}': it does not exist in the table"
        )));
    }
    let keep: Vec<PlSmallStr> = df
        .get_column_names()
        .into_iter()
        .filter(|name| !drop.iter().any(|d| d == name.as_str()))
        .cloned()
        .collect();
    Ok(df.select(keep)?)
}

/// Keeps the first of every group of rows that are equal across all columns.
/// Missing values compare equal to each other.
pub fn drop_duplicates(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let unique = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let removed = df.height() - unique.height();
    Ok((unique, removed))
}

/// Replaces literal zeros with missing in each named column. The columns come
/// back as `Float64`; any non-zero value is kept as is. A column that does not
/// hold numbers is rejected.
pub fn replace_sentinels(
    df: &DataFrame,
    columns: &[String],
) -> Result<(DataFrame, Vec<(String, usize)>)> {
    let mut out = df.clone();
    let mut replaced = Vec::with_capacity(columns.len());

    for name in columns {
        let values = float_column(df, name)?;
        let mut zeros = 0usize;
        let corrected: Float64Chunked = values
            .f64()?
            .into_iter()
            .map(|opt| match opt {
                Some(v) if v == 0.0 => {
                    zeros += 1;
                    None
                }
                other => other,
            })
            .collect();
        out.with_column(corrected.with_name(name.as_str().into()).into_series())?;
        debug!(column = %name, zeros, "replaced sentinel zeros");
        replaced.push((name.clone(), zeros));
    }

    Ok((out, replaced))
}

/// Duplicate removal followed by sentinel correction. Rows that only become
/// identical once their placeholders are missing are collapsed too, so running
/// this on its own output changes nothing.
pub fn normalize(df: &DataFrame, config: &AnalysisConfig) -> Result<(DataFrame, CleanReport)> {
    let (deduped, mut duplicates_removed) = drop_duplicates(df)?;
    let (corrected, sentinels_replaced) = replace_sentinels(&deduped, &config.sentinel_columns)?;
    let (table, collapsed) = drop_duplicates(&corrected)?;
    duplicates_removed += collapsed;

    Ok((
        table,
        CleanReport {
            columns_dropped: 0,
            duplicates_removed,
            sentinels_replaced,
        },
    ))
}

/// Full cleaning stage: column pruning, then `normalize`.
pub fn clean(df: &DataFrame, config: &AnalysisConfig) -> Result<Cleaned> {
    let pruned = prune_columns(df, &config.drop_columns)?;
    let (table, mut report) = normalize(&pruned, config)?;
    report.columns_dropped = df.width() - pruned.width();

    info!(
        rows = table.height(),
        columns = table.width(),
        duplicates = report.duplicates_removed,
        "cleaned movie table"
    );
    Ok(Cleaned { table, report })
}

#[cfg(test)]
mod test_clean {
    use super::*;

    fn raw() -> PolarsResult<DataFrame> {
        df!(
            "id" => [1i64, 2, 2, 3, 4],
            "title" => ["Mr. Holmes", "Mythica", "Mythica", "Manor", "Paranormal"],
            "budget" => [Some(0i64), Some(50), Some(50), Some(-5), None],
            "revenue" => [Some(10i64), Some(0), Some(0), Some(20), Some(30)],
            "runtime" => [Some(104i64), Some(0), Some(0), Some(96), Some(86)],
        )
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            drop_columns: vec!["id".into()],
            ..AnalysisConfig::default()
        }
    }

    fn zero_count(df: &DataFrame, name: &str) -> Result<usize> {
        let values = crate::data::numeric_column(df, name)?;
        Ok(values.into_iter().filter(|v| *v == Some(0.0)).count())
    }

    #[test]
    fn test_clean() -> Result<()> {
        let raw = raw()?;
        let Cleaned { table, report } = clean(&raw, &config())?;

        assert_eq!(table.width(), 4);
        assert!(table.column("id").is_err());
        assert_eq!(table.height(), 4);
        assert_eq!(report.columns_dropped, 1);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(
            report.sentinels_replaced,
            vec![
                ("budget".to_string(), 1),
                ("revenue".to_string(), 1),
                ("runtime".to_string(), 1),
            ]
        );
        for name in ["budget", "revenue", "runtime"] {
            assert_eq!(zero_count(&table, name)?, 0);
        }

        let budgets = crate::data::numeric_column(&table, "budget")?;
        assert_eq!(budgets, vec![None, Some(50.0), Some(-5.0), None]);
        Ok(())
    }

    #[test]
    fn test_prune_unknown_column() -> Result<()> {
        let raw = raw()?;
        let res = prune_columns(&raw, &["imdb_id".to_string()]);
        assert!(matches!(res, Err(AnalysisError::Configuration(_))));
        Ok(())
    }

    #[test]
    fn test_unknown_sentinel_column() -> Result<()> {
        let raw = raw()?;
        let res = replace_sentinels(&raw, &["popularity".to_string()]);
        assert!(matches!(res, Err(AnalysisError::Configuration(_))));
        Ok(())
    }

    #[test]
    fn test_text_sentinel_column_is_rejected() -> Result<()> {
        let df = df!(
            "title" => ["Carol", "Mythica", "Manor"],
            "budget" => ["$10", "0", "25"],
        )?;
        let res = replace_sentinels(&df, &["budget".to_string()]);
        assert!(matches!(res, Err(AnalysisError::Configuration(_))));
        Ok(())
    }

    #[test]
    fn test_sentinel_policy_disabled() -> Result<()> {
        let raw = raw()?;
        let config = AnalysisConfig {
            drop_columns: vec![],
            sentinel_columns: vec![],
            ..AnalysisConfig::default()
        };
        let Cleaned { table, report } = clean(&raw, &config)?;
        assert_eq!(zero_count(&table, "budget")?, 1);
        assert!(report.sentinels_replaced.is_empty());
        Ok(())
    }

    #[test]
    fn test_normalize_is_idempotent() -> Result<()> {
        // Rows 0 and 1 differ only by a placeholder zero vs. a missing budget.
        let raw = df!(
            "title" => ["Mr. Holmes", "Mr. Holmes", "Carol"],
            "budget" => [Some(0i64), None, Some(11_800_000)],
            "revenue" => [Some(29_355_203i64), Some(29_355_203), Some(40_272_135)],
            "runtime" => [Some(104i64), Some(104), Some(118)],
        )?;
        let config = AnalysisConfig::default();

        let (once, first) = normalize(&raw, &config)?;
        assert_eq!(once.height(), 2);
        assert_eq!(first.duplicates_removed, 1);

        let (twice, second) = normalize(&once, &config)?;
        assert!(once.equals_missing(&twice));
        assert_eq!(second.duplicates_removed, 0);
        assert!(second.sentinels_replaced.iter().all(|(_, n)| *n == 0));
        Ok(())
    }

    #[test]
    fn test_clean_output_is_stable() -> Result<()> {
        let raw = raw()?;
        let config = config();
        let Cleaned { table, .. } = clean(&raw, &config)?;
        let (again, _) = normalize(&table, &config)?;
        assert!(table.equals_missing(&again));
        assert!(again.height() <= raw.height());
        Ok(())
    }
}
