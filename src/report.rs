use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::Palette;
use tracing::info;

use crate::error::{AnalysisError, Result};
use crate::pipeline::Analysis;
use crate::trend::PeriodTrend;

type DrawResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

fn rendered(path: &Path, res: DrawResult) -> Result<PathBuf> {
    res.map_err(|source| AnalysisError::Render {
        path: path.to_path_buf(),
        source,
    })?;
    info!(chart = %path.display(), "rendered chart");
    Ok(path.to_path_buf())
}

/// Axis range covering `values` with a little room on both sides.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad)..(hi + pad)
}

/// Horizontal bars, first bar on top.
pub fn bar_chart(path: &Path, title: &str, x_desc: &str, bars: &[(String, f64)]) -> Result<PathBuf> {
    rendered(path, draw_bars(path, title, x_desc, bars))
}

fn draw_bars(path: &Path, title: &str, x_desc: &str, bars: &[(String, f64)]) -> DrawResult {
    let root = SVGBackend::new(path, (960, 640)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = bars.len() as i32;
    let x_range = padded_range(bars.iter().map(|(_, v)| *v).chain([0.0]));
    let x_range = x_range.start.min(0.0)..x_range.end;
    let row_label = |y: &i32| {
        usize::try_from(n - 1 - *y)
            .ok()
            .and_then(|i| bars.get(i))
            .map(|(label, _)| label.clone())
            .unwrap_or_default()
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(200)
        .build_cartesian_2d(x_range, 0..n.max(1))?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(bars.len().max(1))
        .y_label_formatter(&row_label)
        .x_desc(x_desc)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
        let y = n - 1 - i as i32;
        Rectangle::new([(0.0, y), (*value, y + 1)], BLUE.mix(0.7).filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Two bars per category, one per series, sharing a percentage axis.
pub fn paired_bar_chart(
    path: &Path,
    title: &str,
    series: [(&str, &[(String, f64)]); 2],
) -> Result<PathBuf> {
    rendered(path, draw_paired_bars(path, title, series))
}

fn draw_paired_bars(path: &Path, title: &str, series: [(&str, &[(String, f64)]); 2]) -> DrawResult {
    let root = SVGBackend::new(path, (960, 640)).into_drawing_area();
    root.fill(&WHITE)?;

    // Categories in first-seen order across both series.
    let mut labels: Vec<&str> = Vec::new();
    for (_, bars) in &series {
        for (label, _) in bars.iter() {
            if !labels.contains(&label.as_str()) {
                labels.push(label);
            }
        }
    }
    let rows = (labels.len() * 2) as i32;
    let row_label = |y: &i32| {
        usize::try_from(rows - 1 - *y)
            .ok()
            .filter(|row| row % 2 == 0)
            .and_then(|row| labels.get(row / 2))
            .map(|label| label.to_string())
            .unwrap_or_default()
    };
    let x_max = series
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|(_, v)| *v))
        .fold(0.0_f64, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(200)
        .build_cartesian_2d(0.0..(x_max * 1.1).max(1.0), 0..rows.max(1))?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(labels.len().max(1) * 2)
        .y_label_formatter(&row_label)
        .x_desc("% of overall")
        .draw()?;

    for (offset, ((name, bars), color)) in series.iter().zip([RED, BLUE]).enumerate() {
        let rects: Vec<_> = bars
            .iter()
            .filter_map(|(label, value)| {
                let idx = labels.iter().position(|l| *l == label.as_str())?;
                let y = rows - 1 - (idx * 2 + offset) as i32;
                Some(Rectangle::new([(0.0, y), (*value, y + 1)], color.mix(0.7).filled()))
            })
            .collect();
        chart
            .draw_series(rects)?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Pie of percentage shares.
pub fn pie_chart(path: &Path, title: &str, slices: &[(String, f64)]) -> Result<PathBuf> {
    rendered(path, draw_pie(path, title, slices))
}

fn draw_pie(path: &Path, title: &str, slices: &[(String, f64)]) -> DrawResult {
    let root = SVGBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled(title, ("sans-serif", 24))?;

    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.32;

    let sizes: Vec<f64> = slices.iter().map(|(_, v)| *v).collect();
    let labels: Vec<&str> = slices.iter().map(|(label, _)| label.as_str()).collect();
    let colors: Vec<RGBColor> = (0..slices.len())
        .map(|i| {
            let (r, g, b) = Palette99::COLORS[i % Palette99::COLORS.len()];
            RGBColor(r, g, b)
        })
        .collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 12).into_font());
    pie.percentages(("sans-serif", 10).into_font());
    area.draw(&pie)?;

    root.present()?;
    Ok(())
}

/// Points on linear axes fitted to the data.
pub fn scatter_chart(
    path: &Path,
    title: &str,
    axes: (&str, &str),
    points: &[(f64, f64)],
) -> Result<PathBuf> {
    rendered(path, draw_scatter(path, title, axes, points))
}

fn draw_scatter(path: &Path, title: &str, axes: (&str, &str), points: &[(f64, f64)]) -> DrawResult {
    let root = SVGBackend::new(path, (960, 640)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(
            padded_range(points.iter().map(|p| p.0)),
            padded_range(points.iter().map(|p| p.1)),
        )?;
    chart
        .configure_mesh()
        .x_desc(axes.0)
        .y_desc(axes.1)
        .draw()?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 2, BLUE.mix(0.6).filled())),
    )?;

    root.present()?;
    Ok(())
}

fn yearly_points(yearly: &[PeriodTrend], pick: impl Fn(&PeriodTrend) -> Option<f64>) -> Vec<(f64, f64)> {
    yearly
        .iter()
        .filter_map(|t| Some((t.period as f64, pick(t)?)))
        .collect()
}

/// Writes every chart of an analysis into `dir` and returns their paths.
pub fn render_all(analysis: &Analysis, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut charts = Vec::new();

    let ratings: Vec<(String, f64)> = analysis
        .genre_ratings
        .iter()
        .map(|r| (r.label.clone(), r.weighted_rating))
        .collect();
    charts.push(bar_chart(
        &dir.join("genre_ratings.svg"),
        "Average Votes across Genres",
        "Average Vote",
        &ratings,
    )?);

    let vote_shares: Vec<(String, f64)> = analysis
        .genre_ratings
        .iter()
        .map(|r| (r.label.clone(), r.vote_share_percent))
        .collect();
    charts.push(pie_chart(
        &dir.join("genre_vote_share.svg"),
        "Percentage of Vote Counts across Genres",
        &vote_shares,
    )?);

    let budget: Vec<(String, f64)> = analysis
        .company_shares
        .budget
        .iter()
        .map(|s| (s.label.clone(), s.percent))
        .collect();
    let revenue: Vec<(String, f64)> = analysis
        .company_shares
        .revenue
        .iter()
        .map(|s| (s.label.clone(), s.percent))
        .collect();
    charts.push(paired_bar_chart(
        &dir.join("company_budget_revenue.svg"),
        "Top Production Companies in terms of Budget and Revenue",
        [("Budget %", budget.as_slice()), ("Revenue %", revenue.as_slice())],
    )?);

    charts.push(scatter_chart(
        &dir.join("profit_vs_budget.svg"),
        "Profit percentage vs. Budget",
        ("budget", "profit %"),
        &analysis.profit_points,
    )?);
    charts.push(scatter_chart(
        &dir.join("profit_vs_budget_plausible.svg"),
        "Profit percentage vs. Budget (plausible budgets)",
        ("budget", "profit %"),
        &analysis.plausible_profit_points,
    )?);

    let top_profit: Vec<(String, f64)> = analysis
        .top_profit_companies
        .iter()
        .map(|c| (c.label.clone(), c.max_profit_percent))
        .collect();
    charts.push(bar_chart(
        &dir.join("top_profit_companies.svg"),
        "Most profit generating production companies relative to budget",
        "Profit Percentage",
        &top_profit,
    )?);

    let popularity: Vec<(String, f64)> = analysis
        .genre_popularity
        .iter()
        .map(|s| (s.label.clone(), s.percent))
        .collect();
    charts.push(bar_chart(
        &dir.join("genre_popularity.svg"),
        "Popularity across Genres",
        "% from overall",
        &popularity,
    )?);

    charts.push(scatter_chart(
        &dir.join("movies_per_year.svg"),
        "Movie Count over the Years",
        ("Year", "Movie Count"),
        &yearly_points(&analysis.yearly, |t| Some(t.count as f64)),
    )?);
    charts.push(scatter_chart(
        &dir.join("runtime_per_year.svg"),
        "Runtime over the years",
        ("Year", "runtime"),
        &yearly_points(&analysis.yearly, |t| t.mean),
    )?);

    Ok(charts)
}
