use memchr::memchr_iter;
use polars::prelude::*;
use tracing::debug;

use crate::config::EmptySegments;
use crate::data::require_column;
use crate::error::Result;

/// Splits `text` on a single ASCII delimiter, keeping empty segments.
fn segments(text: &str, delimiter: u8) -> impl Iterator<Item = &str> {
    let mut start = 0;
    memchr_iter(delimiter, text.as_bytes())
        .map(Some)
        .chain(std::iter::once(None))
        .map(move |end| {
            let end = end.unwrap_or(text.len());
            let part = &text[start..end];
            start = end + 1;
            part
        })
}

/// Replaces a delimiter-joined list column with one row per list element.
///
/// Every other column is repeated for each element taken from the same input
/// row. Rows keep their input order and elements keep their order inside the
/// cell. A missing cell, or one with nothing left after `EmptySegments::Drop`,
/// still produces one row, with a missing value in `column`.
pub fn expand_list_column(
    df: &DataFrame,
    column: &str,
    delimiter: u8,
    empty: EmptySegments,
) -> Result<DataFrame> {
    let source = require_column(df, column)?.cast(&DataType::String)?;
    let cells = source.str()?;

    let mut take: Vec<IdxSize> = Vec::with_capacity(df.height());
    let mut values: Vec<Option<&str>> = Vec::with_capacity(df.height());

    for (row, cell) in cells.into_iter().enumerate() {
        let before = values.len();
        if let Some(text) = cell {
            for part in segments(text, delimiter) {
                if part.is_empty() && empty == EmptySegments::Drop {
                    continue;
                }
                take.push(row as IdxSize);
                values.push(Some(part));
            }
        }
        if values.len() == before {
            take.push(row as IdxSize);
            values.push(None);
        }
    }

    let idx = IdxCa::from_vec(PlSmallStr::EMPTY, take);
    let mut expanded = df.take(&idx)?;
    let scalar = StringChunked::from_iter_options(column.into(), values.into_iter());
    expanded.with_column(scalar.into_series())?;

    debug!(
        column,
        rows_in = df.height(),
        rows_out = expanded.height(),
        "expanded list column"
    );
    Ok(expanded)
}
