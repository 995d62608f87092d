//! Smoothed line charts of the monthly and cumulative tables, rendered as SVG.
//!
//! Each series is passed through a 1-D Gaussian filter before plotting. The
//! smoothing is purely visual: tables and CSV files keep the exact sums.

use std::fmt::Write as _;
use std::path::PathBuf;

use report_core::error::Result;
use report_core::models::{Metric, MonthKey, MonthRow};

use crate::sink::{ReportContext, ReportSink};
use crate::snapshot::write_atomic;

/// Kernel half-width, in standard deviations.
const TRUNCATE: f64 = 4.0;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 80.0;
const Y_TICKS: usize = 5;

// ── Smoothing ─────────────────────────────────────────────────────────────────

/// Gaussian-smooth `values` with standard deviation `sigma` (in samples).
///
/// The kernel is truncated at `4 * sigma` and the signal is extended past its
/// ends by mirror reflection (`d c b a | a b c d | d c b a`).
pub fn gaussian_smooth(values: &[f64], sigma: f64) -> Vec<f64> {
    let n = values.len();
    if n == 0 || sigma <= 0.0 {
        return values.to_vec();
    }

    // Past a few periods of the mirrored signal a wider kernel adds nothing.
    let radius = ((TRUNCATE * sigma + 0.5) as i64).min(4 * n as i64);
    let kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let norm: f64 = kernel.iter().sum();

    (0..n as i64)
        .map(|i| {
            kernel
                .iter()
                .zip(-radius..=radius)
                .map(|(w, offset)| w * values[reflect_index(i + offset, n)])
                .sum::<f64>()
                / norm
        })
        .collect()
}

/// Map an out-of-range index back into `0..n` by half-sample mirroring.
fn reflect_index(i: i64, n: usize) -> usize {
    let n = n as i64;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m < n {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

// ── Chart model ───────────────────────────────────────────────────────────────

/// One plotted line.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: &'static str,
    pub color: &'static str,
    pub values: Vec<f64>,
}

/// A line chart over months.
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub months: Vec<MonthKey>,
    pub series: Vec<Series>,
    /// Whether to draw a legend box.
    pub legend: bool,
}

impl LineChart {
    /// Chart of the given metrics over `rows`, each series smoothed by `sigma`.
    pub fn from_rows(title: String, rows: &[MonthRow], metrics: &[Metric], sigma: f64) -> Self {
        let series = metrics
            .iter()
            .map(|&metric| {
                let raw: Vec<f64> = rows.iter().map(|r| r.value(metric) as f64).collect();
                Series {
                    label: metric.header(),
                    color: metric.color(),
                    values: gaussian_smooth(&raw, sigma),
                }
            })
            .collect();

        Self {
            title,
            months: rows.iter().map(|r| r.month).collect(),
            series,
            legend: metrics.len() > 1,
        }
    }

    fn y_max(&self) -> f64 {
        let max = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0_f64, f64::max);
        if max > 0.0 {
            nice_ceiling(max)
        } else {
            1.0
        }
    }

    fn x_at(&self, i: usize) -> f64 {
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        if self.months.len() <= 1 {
            MARGIN_LEFT + plot_w / 2.0
        } else {
            MARGIN_LEFT + plot_w * i as f64 / (self.months.len() - 1) as f64
        }
    }

    fn y_at(&self, value: f64, y_max: f64) -> f64 {
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        HEIGHT - MARGIN_BOTTOM - plot_h * (value / y_max)
    }

    /// Render the chart as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let y_max = self.y_max();
        let bottom = HEIGHT - MARGIN_BOTTOM;
        let mut svg = String::new();

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="24" text-anchor="middle" font-size="16">{}</text>"#,
            WIDTH / 2.0,
            html_escape::encode_text(&self.title)
        );

        // Horizontal grid and y labels.
        for t in 0..=Y_TICKS {
            let value = y_max * t as f64 / Y_TICKS as f64;
            let y = self.y_at(value, y_max);
            let _ = writeln!(
                svg,
                r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#dddddd"/>"##,
                WIDTH - MARGIN_RIGHT
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
                MARGIN_LEFT - 6.0,
                y + 4.0,
                value.round() as u64
            );
        }

        // Axes.
        let _ = writeln!(
            svg,
            r#"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{bottom}" stroke="black"/>"#
        );
        let _ = writeln!(
            svg,
            r#"<line x1="{MARGIN_LEFT}" y1="{bottom}" x2="{}" y2="{bottom}" stroke="black"/>"#,
            WIDTH - MARGIN_RIGHT
        );

        // Month labels, rotated 45°.
        for (i, month) in self.months.iter().enumerate() {
            let x = self.x_at(i);
            let y = bottom + 14.0;
            let _ = writeln!(
                svg,
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="end" transform="rotate(-45 {x:.1} {y:.1})">{month}</text>"#
            );
        }

        for series in &self.series {
            let points: Vec<String> = series
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| format!("{:.1},{:.1}", self.x_at(i), self.y_at(*v, y_max)))
                .collect();
            let _ = writeln!(
                svg,
                r#"<polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
                series.color,
                points.join(" ")
            );
        }

        if self.legend {
            for (i, series) in self.series.iter().enumerate() {
                let y = MARGIN_TOP + 12.0 + 18.0 * i as f64;
                let x = MARGIN_LEFT + 12.0;
                let _ = writeln!(
                    svg,
                    r#"<line x1="{x:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{}" stroke-width="2"/>"#,
                    x + 20.0,
                    series.color
                );
                let _ = writeln!(
                    svg,
                    r#"<text x="{:.1}" y="{:.1}">{}</text>"#,
                    x + 26.0,
                    y + 4.0,
                    series.label
                );
            }
        }

        svg.push_str("</svg>\n");
        svg
    }
}

/// Round `v` up to 1, 2, 2.5 or 5 times a power of ten.
fn nice_ceiling(v: f64) -> f64 {
    let magnitude = 10_f64.powf(v.log10().floor());
    let scaled = v / magnitude;
    let nice = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|step| scaled <= *step)
        .unwrap_or(10.0);
    nice * magnitude
}

// ── File naming ───────────────────────────────────────────────────────────────

/// Chart file suffixes, in rendering order: the combined chart, then one per
/// metric. Cumulative charts carry an extra `_acc`.
pub fn chart_suffixes(cumulative: bool) -> Vec<String> {
    let acc = if cumulative { "_acc" } else { "" };
    std::iter::once(format!("_chart{acc}.svg"))
        .chain(
            Metric::ALL
                .iter()
                .map(|m| format!("_{}{acc}.svg", m.field_name())),
        )
        .collect()
}

// ── ChartSink ─────────────────────────────────────────────────────────────────

/// Writes the combined and per-metric charts for both tables.
pub struct ChartSink {
    pub sigma: f64,
}

impl ChartSink {
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }

    fn charts_for(&self, dept: &str, rows: &[MonthRow], cumulative: bool) -> Vec<LineChart> {
        let kind = if cumulative { "accumulated" } else { "monthly" };
        std::iter::once(LineChart::from_rows(
            format!("{dept}: {kind} cases"),
            rows,
            &Metric::ALL,
            self.sigma,
        ))
        .chain(Metric::ALL.iter().map(|&m| {
            let title = if cumulative {
                format!("{} (accumulated)", m.title())
            } else {
                m.title().to_string()
            };
            LineChart::from_rows(title, rows, &[m], self.sigma)
        }))
        .collect()
    }
}

impl ReportSink for ChartSink {
    fn name(&self) -> &'static str {
        "charts"
    }

    fn write(&self, ctx: &ReportContext<'_>) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for (rows, cumulative) in [(ctx.monthly.rows(), false), (ctx.cumulative.rows(), true)] {
            let charts = self.charts_for(ctx.department, rows, cumulative);
            for (chart, suffix) in charts.iter().zip(chart_suffixes(cumulative)) {
                let path = ctx.output_path(&suffix);
                write_atomic(&path, chart.to_svg().as_bytes())?;
                written.push(path);
            }
        }

        Ok(written)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use report_core::models::{CumulativeTable, MonthlyTable};
    use tempfile::TempDir;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_smoothing_constant_signal_is_unchanged() {
        let out = gaussian_smooth(&[5.0; 7], 1.0);
        assert!(out.iter().all(|v| approx(*v, 5.0)));
    }

    #[test]
    fn test_smoothing_huge_sigma_stays_bounded() {
        let smoothed = gaussian_smooth(&[1.0, 2.0], 1e12);
        assert_eq!(smoothed.len(), 2);
        // An effectively flat kernel averages the mirrored signal.
        assert!(smoothed.iter().all(|v| (1.0..=2.0).contains(v)));
    }

    #[test]
    fn test_smoothing_preserves_length_and_empty() {
        assert!(gaussian_smooth(&[], 1.0).is_empty());
        assert_eq!(gaussian_smooth(&[1.0, 2.0, 3.0], 1.0).len(), 3);
        let single = gaussian_smooth(&[4.0], 2.0);
        assert_eq!(single.len(), 1);
        assert!(approx(single[0], 4.0));
    }

    #[test]
    fn test_smoothing_preserves_sum_with_reflection_of_symmetric_signal() {
        let input = [0.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0];
        let out = gaussian_smooth(&input, 1.0);
        let total: f64 = out.iter().sum();
        assert!(approx(total, 10.0), "total = {total}");
        // Peak stays in the middle and is spread to its neighbours symmetrically.
        assert!(out[4] < 10.0);
        assert!(approx(out[3], out[5]));
    }

    #[test]
    fn test_smoothing_non_positive_sigma_is_identity() {
        assert_eq!(gaussian_smooth(&[1.0, 9.0], 0.0), vec![1.0, 9.0]);
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(2, 4), 2);
        assert_eq!(reflect_index(-3, 1), 0);
    }

    #[test]
    fn test_nice_ceiling() {
        assert!(approx(nice_ceiling(7.0), 10.0));
        assert!(approx(nice_ceiling(180.0), 200.0));
        assert!(approx(nice_ceiling(2300.0), 2500.0));
    }

    #[test]
    fn test_chart_suffixes() {
        assert_eq!(
            chart_suffixes(false),
            vec![
                "_chart.svg",
                "_day_hosp_new.svg",
                "_day_intcare_new.svg",
                "_day_out_new.svg",
                "_day_death_new.svg"
            ]
        );
        assert_eq!(chart_suffixes(true)[0], "_chart_acc.svg");
        assert_eq!(chart_suffixes(true)[4], "_day_death_new_acc.svg");
    }

    #[test]
    fn test_svg_contains_series_and_escaped_title() {
        let mut row = MonthRow::zeroed(MonthKey::new(2021, 1).unwrap());
        row.hospitalized = 15;
        let chart = LineChart::from_rows("A & B".to_string(), &[row], &Metric::ALL, 1.0);
        let svg = chart.to_svg();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("A &amp; B"));
        assert_eq!(svg.matches("<polyline").count(), 4);
        assert!(svg.contains("2021-01"));
        assert!(svg.contains("Admissions"));
    }

    #[test]
    fn test_chart_sink_writes_ten_files() {
        let tmp = TempDir::new().unwrap();
        let mut row = MonthRow::zeroed(MonthKey::new(2021, 1).unwrap());
        row.deaths = 3;
        let monthly = MonthlyTable::from_sorted_rows(vec![row]);
        let cumulative = CumulativeTable::from_sorted_rows(vec![row]);
        let ctx = ReportContext {
            department: "Nord",
            monthly: &monthly,
            cumulative: &cumulative,
            generated_on: NaiveDate::from_ymd_opt(2021, 12, 18).unwrap(),
            output_dir: tmp.path(),
        };

        let written = ChartSink::new(1.0).write(&ctx).unwrap();

        assert_eq!(written.len(), 10);
        assert!(written.iter().all(|p| p.is_file()));
        assert!(tmp.path().join("Nord_chart.svg").is_file());
        assert!(tmp.path().join("Nord_day_death_new_acc.svg").is_file());
    }

    #[test]
    fn test_chart_sink_handles_empty_tables() {
        let tmp = TempDir::new().unwrap();
        let monthly = MonthlyTable::default();
        let cumulative = CumulativeTable::default();
        let ctx = ReportContext {
            department: "Nord",
            monthly: &monthly,
            cumulative: &cumulative,
            generated_on: NaiveDate::from_ymd_opt(2021, 12, 18).unwrap(),
            output_dir: tmp.path(),
        };
        assert_eq!(ChartSink::new(1.0).write(&ctx).unwrap().len(), 10);
    }
}
