use crate::app::RunsView;
use crate::model::Run;
use crate::status::{self, StatusColor};
use crate::tui::{centered, spinner, status_color, weighted};
use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use ratatui::Frame;

const HEADERS: [&str; 7] = [
    "Job Name",
    "Run ID",
    "Start Time",
    "Duration",
    "Lifecycle State",
    "Result State",
    "Link",
];

/// Result column: green or red once known, plain otherwise. Unlike the cards, no amber.
fn result_color(run: &Run) -> StatusColor {
    match status::result_color(run.lifecycle_state, run.result_state) {
        color @ (StatusColor::Green | StatusColor::Red) => color,
        _ => StatusColor::Black,
    }
}

fn row<'a>(view: &'a RunsView, run: &'a Run, now: DateTime<Utc>) -> Row<'a> {
    let display = status::derive_display_state(Some(run), now);
    let result_label = run
        .result_state
        .map_or(status::NOT_AVAILABLE, |r| r.short_label());
    let link = if run.run_page_url.is_some() { "open ↗" } else { "" };

    Row::new(vec![
        Cell::from(run.run_name.as_deref().unwrap_or(&view.job_name)),
        Cell::from(run.run_id.as_str()),
        Cell::from(display.formatted_start_time),
        Cell::from(display.formatted_duration),
        Cell::from(Span::styled(
            run.lifecycle_state.as_str(),
            weighted(
                Style::default().fg(status_color(display.lifecycle_color)),
                display.lifecycle_font_weight,
            ),
        )),
        Cell::from(Span::styled(
            result_label,
            weighted(
                Style::default().fg(status_color(result_color(run))),
                display.result_font_weight,
            ),
        )),
        Cell::from(Span::styled(link, Style::default().fg(Color::Cyan))),
    ])
}

pub fn render(f: &mut Frame, view: &RunsView, spinner_frame: usize) {
    let overlay_area: Rect = centered(f.area(), 90, 80, 40, 8);
    f.render_widget(Clear, overlay_area);

    let title = format!(" Runs: {} ", view.job_name);
    let hints = Line::from(vec![
        Span::styled(" j/k", Style::default().fg(Color::Cyan)),
        Span::styled(" move ", Style::default().fg(Color::DarkGray)),
        Span::styled("o", Style::default().fg(Color::Cyan)),
        Span::styled(" open ", Style::default().fg(Color::DarkGray)),
        Span::styled("r", Style::default().fg(Color::Cyan)),
        Span::styled(" reload ", Style::default().fg(Color::DarkGray)),
        Span::styled("q", Style::default().fg(Color::Cyan)),
        Span::styled(" close ", Style::default().fg(Color::DarkGray)),
    ]);
    let block = Block::default()
        .title(title)
        .title_bottom(hints.centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if !view.loaded {
        let msg = format!("{} Loading runs…", spinner::frame(spinner_frame));
        let para = Paragraph::new(msg)
            .style(Style::default().fg(Color::Yellow))
            .block(block);
        f.render_widget(para, overlay_area);
        return;
    }
    if view.runs.is_empty() {
        let para = Paragraph::new("No runs found")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(para, overlay_area);
        return;
    }

    let now = Utc::now();
    let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h)))
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
    let rows = view.runs.iter().map(|run| row(view, run, now));
    let widths = [
        Constraint::Fill(2),
        Constraint::Length(18),
        Constraint::Length(19),
        Constraint::Length(14),
        Constraint::Length(16),
        Constraint::Length(14),
        Constraint::Length(7),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut table_state = TableState::default().with_selected(Some(view.cursor));
    f.render_stateful_widget(table, overlay_area, &mut table_state);
}
