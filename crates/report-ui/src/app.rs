//! Application state and TUI event loop for the report viewer.
//!
//! [`App`] owns the theme, the two month tables and which of them is shown.
//! Tab switches between the monthly and cumulative tables.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use report_core::models::{CumulativeTable, MonthlyTable};

use crate::table_view;
use crate::themes::Theme;

// ── TableKind ─────────────────────────────────────────────────────────────────

/// Which table the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Monthly,
    Cumulative,
}

impl TableKind {
    /// Parse a `--view` value; `None` for anything that is not a table.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "monthly" => Some(Self::Monthly),
            "cumulative" => Some(Self::Cumulative),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Monthly => Self::Cumulative,
            Self::Cumulative => Self::Monthly,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Monthly => "Monthly cases",
            Self::Cumulative => "Cumulative cases",
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub theme: Theme,
    pub table: TableKind,
    pub department: String,
    pub monthly: MonthlyTable,
    pub cumulative: CumulativeTable,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
}

impl App {
    pub fn new(
        theme_name: &str,
        table: TableKind,
        department: String,
        monthly: MonthlyTable,
        cumulative: CumulativeTable,
    ) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            table,
            department,
            monthly,
            cumulative,
            should_quit: false,
        }
    }

    /// Apply one key press: Tab toggles the table, `q` / `Ctrl+C` quit.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => self.table = self.table.toggled(),
            _ => {}
        }
    }

    /// Run the table viewer until the user quits.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout so the loop stays
    /// responsive without spinning.
    pub async fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        if self.monthly.is_empty() {
            table_view::render_no_data(frame, area, &self.department, &self.theme);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(area);

        let header = Line::from(vec![
            Span::styled(format!(" {} ", self.department), self.theme.header),
            Span::styled("│ ", self.theme.separator),
            Span::styled("Tab: switch table  q: quit", self.theme.dim),
        ]);
        frame.render_widget(Paragraph::new(header), chunks[0]);

        // Both footers equal the monthly column sums: the last cumulative row.
        let totals = self.monthly.column_totals();
        let rows = match self.table {
            TableKind::Monthly => self.monthly.rows(),
            TableKind::Cumulative => self.cumulative.rows(),
        };
        table_view::render_table_view(
            frame,
            chunks[1],
            self.table.title(),
            rows,
            &totals,
            &self.theme,
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
