//! Exploratory analysis of the TMDb movie table.
//!
//! The stages run strictly in order and each returns a new table:
//! [`data::MovieData::load`] → [`clean::clean`] → [`expand::expand_list_column`]
//! → the aggregates in [`rating`], [`share`], [`profit`] and [`trend`] →
//! [`report::render_all`]. [`pipeline::analyze`] wires them together.

pub mod aggregate;
pub mod clean;
pub mod config;
pub mod data;
pub mod error;
pub mod expand;
pub mod pipeline;
pub mod profit;
pub mod rating;
pub mod report;
pub mod share;
pub mod trend;

pub use config::{AnalysisConfig, ColumnNames, EmptySegments};
pub use error::{AnalysisError, Result};
pub use pipeline::{Analysis, analyze, run};
