//! HTML summary report referencing the charts and embedding both tables.

use std::fmt::Write as _;
use std::path::PathBuf;

use html_escape::{encode_double_quoted_attribute, encode_text};

use report_core::error::Result;
use report_core::formatting::format_long_date;
use report_core::models::{Metric, MonthRow};

use crate::chart::chart_suffixes;
use crate::sink::{ReportContext, ReportSink};
use crate::snapshot::write_atomic;

const PAGE_TITLE: &str = "COVID report";
const INTRO: &str = "The objective of this software is to display information on hospital \
                     data relating to the COVID-19 epidemic in France.";
const CHART_WIDTH: u32 = 700;

/// Render a month table as an HTML `<table>`.
pub fn table_html(rows: &[MonthRow]) -> String {
    let mut html = String::from("<table border=\"1\" class=\"dataframe\">\n  <thead>\n    <tr>");
    html.push_str("<th>Date</th>");
    for metric in Metric::ALL {
        let _ = write!(html, "<th>{}</th>", encode_text(metric.header()));
    }
    html.push_str("</tr>\n  </thead>\n  <tbody>\n");

    for row in rows {
        let _ = write!(html, "    <tr><td>{}</td>", row.month);
        for value in row.values() {
            let _ = write!(html, "<td>{}</td>", value);
        }
        html.push_str("</tr>\n");
    }

    html.push_str("  </tbody>\n</table>");
    html
}

/// Assemble the full report page for `ctx`.
pub fn render_report(ctx: &ReportContext<'_>) -> String {
    let dept = encode_text(ctx.department);
    let stem = ctx.file_stem();
    let mut html = String::new();

    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html>");
    let _ = writeln!(html, "<head>");
    let _ = writeln!(html, "<meta charset=\"utf-8\">");
    let _ = writeln!(html, "<title>{PAGE_TITLE}</title>");
    let _ = writeln!(html, "</head>");
    let _ = writeln!(html, "<body>");
    let _ = writeln!(html, "<h1>{dept} monthly cases report</h1>");
    let _ = writeln!(
        html,
        "<p>Welcome, today is {}.<br>{INTRO}</p>",
        format_long_date(ctx.generated_on)
    );

    for (heading, tag, cumulative) in [
        ("Summary of graphs", "h2", false),
        ("Summary of accumulated graphs", "h3", true),
    ] {
        let _ = writeln!(html, "<{tag}>{heading}</{tag}>");
        for suffix in chart_suffixes(cumulative) {
            let src = format!("{stem}{suffix}");
            let _ = writeln!(
                html,
                "<img src=\"{}\" width=\"{CHART_WIDTH}\">",
                encode_double_quoted_attribute(&src)
            );
        }
    }

    let _ = writeln!(html, "<h2>Table data of cases</h2>");
    let _ = writeln!(html, "{}", table_html(ctx.monthly.rows()));
    let _ = writeln!(html, "<h2>Table data of cases accumulated</h2>");
    let _ = writeln!(html, "{}", table_html(ctx.cumulative.rows()));
    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");

    html
}

/// Writes `<dept>_html_report.html`.
pub struct HtmlSink;

impl ReportSink for HtmlSink {
    fn name(&self) -> &'static str {
        "html"
    }

    fn write(&self, ctx: &ReportContext<'_>) -> Result<Vec<PathBuf>> {
        let path = ctx.output_path("_html_report.html");
        write_atomic(&path, render_report(ctx).as_bytes())?;
        Ok(vec![path])
    }
}
