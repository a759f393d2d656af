use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tmdb_eda::{Analysis, AnalysisConfig, pipeline, report};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory analysis of the TMDb movie table",
    long_about = "Cleans the movie table, splits genres and production companies, \
                  computes weighted ratings, budget/revenue shares, profit ratios and \
                  yearly trends, and renders each as an SVG chart.\n\n\
                  EXAMPLES:\n  \
                  tmdb-eda -i tmdb-movies.csv\n  \
                  tmdb-eda -i tmdb-movies.csv -c analysis.toml -o charts/ --min-budget 1000"
)]
struct Args {
    /// CSV (or .parquet) file with the movie table
    #[arg(short, long)]
    input: PathBuf,

    /// TOML file overriding the default analysis settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the charts are written to
    #[arg(short, long, default_value = "charts")]
    output: PathBuf,

    /// Budgets at or below this are left out of the profit ranking
    #[arg(long)]
    min_budget: Option<f64>,

    /// Size of the budget/revenue share rankings
    #[arg(long)]
    top_k: Option<usize>,

    /// Size of the profit percentage ranking
    #[arg(long)]
    profit_top_k: Option<usize>,

    /// Print the summary without rendering charts
    #[arg(long)]
    no_charts: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(min_budget) = args.min_budget {
        config.min_plausible_budget = min_budget;
    }
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }
    if let Some(profit_top_k) = args.profit_top_k {
        config.profit_top_k = profit_top_k;
    }
    config.validate()?;
    Ok(config)
}

/// Plain-text summary on stdout, independent of the log level.
fn print_summary(analysis: &Analysis, config: &AnalysisConfig) {
    let report = &analysis.clean_report;
    println!(
        "cleaned: {} rows x {} columns ({} columns dropped, {} duplicates removed)",
        analysis.cleaned.height(),
        analysis.cleaned.width(),
        report.columns_dropped,
        report.duplicates_removed,
    );
    for (column, count) in &report.sentinels_replaced {
        println!("  {column}: {count} zero placeholders set to missing");
    }

    println!("\nweighted rating by genre (vote share %):");
    for rating in &analysis.genre_ratings {
        println!(
            "  {:<20} {:>5.2}  ({:>5.2}%, unweighted {:.2})",
            rating.label, rating.weighted_rating, rating.vote_share_percent, rating.unweighted_mean
        );
    }

    println!("\ntop {} companies by budget share:", config.top_k);
    for share in &analysis.company_shares.budget {
        println!("  {:<40} {:>6.2}%", share.label, share.percent);
    }
    println!("top {} companies by revenue share:", config.top_k);
    for share in &analysis.company_shares.revenue {
        println!("  {:<40} {:>6.2}%", share.label, share.percent);
    }

    println!(
        "\n{} titles above {}% profit; top {} companies by profit % (budget > {}):",
        analysis.profit_outliers,
        config.profit_outlier_percent,
        config.profit_top_k,
        config.min_plausible_budget,
    );
    for company in &analysis.top_profit_companies {
        println!(
            "  {:<40} {:>12.1}%  (budget {})",
            company.label, company.max_profit_percent, company.budget
        );
    }

    println!("\ngenre popularity:");
    for share in &analysis.genre_popularity {
        println!("  {:<20} {:>5.2}%", share.label, share.percent);
    }

    if let (Some(first), Some(last)) = (analysis.yearly.first(), analysis.yearly.last()) {
        let runtime = |mean: Option<f64>| mean.map_or("n/a".to_string(), |m| format!("{m:.1} min"));
        println!(
            "\n{}: {} movies, {}\n{}: {} movies, {}",
            first.period,
            first.count,
            runtime(first.mean),
            last.period,
            last.count,
            runtime(last.mean),
        );
    }
}

fn main() -> Result<()> {
    // Keep polars on a single thread; must happen before its pool starts.
    unsafe {
        env::set_var("POLARS_MAX_THREADS", "1");
    }

    let args = Args::parse();
    init_logging(&args.log_level);

    let config = load_config(&args)?;
    info!(
        threads = polars_core::POOL.current_num_threads(),
        "polars thread pool"
    );

    let analysis = pipeline::run(&args.input, &config)
        .with_context(|| format!("analysing {}", args.input.display()))?;
    print_summary(&analysis, &config);

    if !args.no_charts {
        let charts = report::render_all(&analysis, &args.output)?;
        info!(count = charts.len(), dir = %args.output.display(), "charts written");
    }
    Ok(())
}
