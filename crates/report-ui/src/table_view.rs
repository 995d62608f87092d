//! Month table view (monthly or cumulative) for the report TUI.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per month
//! plus a highlighted totals row at the bottom.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use report_core::formatting::format_count;
use report_core::models::{ColumnTotals, Metric, MonthRow};

use crate::themes::Theme;

const MONTH_COLUMN: &str = "Month";

/// Render `rows` into `area`, followed by a `TOTAL` row built from `totals`.
pub fn render_table_view(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[MonthRow],
    totals: &ColumnTotals,
    theme: &Theme,
) {
    let header_cells = std::iter::once(Cell::from(MONTH_COLUMN).style(theme.table_header)).chain(
        Metric::ALL
            .iter()
            .map(|m| Cell::from(m.header()).style(theme.table_header)),
    );
    let header = Row::new(header_cells).height(1);

    let data_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            let cells = std::iter::once(Cell::from(row.month.to_string())).chain(
                Metric::ALL.iter().map(|&m| {
                    Cell::from(format_count(row.value(m))).style(theme.metric_style(m))
                }),
            );
            Row::new(cells).style(style)
        })
        .collect();

    let total_cells = std::iter::once(Cell::from("TOTAL")).chain(
        Metric::ALL
            .iter()
            .map(|&m| Cell::from(format_count(totals.value(m)))),
    );
    let total_row = Row::new(total_cells).style(theme.table_total);

    let mut all_rows = data_rows;
    all_rows.push(total_row);

    let widths = [
        Constraint::Length(10),
        Constraint::Length(14),
        Constraint::Length(16),
        Constraint::Length(14),
        Constraint::Length(12),
    ];

    let table = Table::new(all_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(format!(" {} ", title), theme.header)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render a placeholder when the department produced no months.
pub fn render_no_data(frame: &mut Frame, area: Rect, department: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("No records for {department}"),
            theme.info,
        )),
        Line::from(""),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" COVID report "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use report_core::models::{MonthKey, MonthlyTable};

    fn make_table() -> MonthlyTable {
        let mut jan = MonthRow::zeroed(MonthKey::new(2021, 1).unwrap());
        jan.hospitalized = 1_500;
        jan.deaths = 1;
        let mut feb = MonthRow::zeroed(MonthKey::new(2021, 2).unwrap());
        feb.deaths = 2;
        MonthlyTable::from_sorted_rows(vec![jan, feb])
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_render_table_view_shows_rows_and_total() {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        let theme = Theme::dark();
        let table = make_table();
        let totals = table.column_totals();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_table_view(frame, area, "Monthly", table.rows(), &totals, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Monthly"));
        assert!(text.contains("Admissions"));
        assert!(text.contains("2021-01"));
        assert!(text.contains("2021-02"));
        assert!(text.contains("1,500"));
        assert!(text.contains("TOTAL"));
        assert!(text.find("2021-01") < text.find("2021-02"));
    }

    #[test]
    fn test_render_table_view_empty_rows_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        let theme = Theme::light();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_table_view(frame, area, "Cumulative", &[], &ColumnTotals::default(), &theme);
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("TOTAL"));
    }

    #[test]
    fn test_render_no_data_names_department() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_no_data(frame, area, "Paris", &theme);
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("No records for Paris"));
    }
}
