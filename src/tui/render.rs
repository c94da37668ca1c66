use crate::app::{ActiveOverlay, AppState};
use crate::tui::{cards, footer, header, runs_table, select_overlay};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn render(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(1),    // cards
            Constraint::Length(2), // footer
        ])
        .split(f.area());

    header::render(f, chunks[0], state);
    cards::render(f, chunks[1], state);
    footer::render(f, chunks[2], state);

    // Overlay (drawn on top of the grid)
    match &state.overlay {
        ActiveOverlay::Select(draft) => select_overlay::render(f, draft),
        ActiveOverlay::Runs(view) => runs_table::render(f, view, state.spinner_frame),
        ActiveOverlay::None => {}
    }

    // Error toast, above any overlay
    if let Some(err) = state.error_message() {
        let area = f.area();
        if area.height > 6 && area.width >= 4 {
            let err_area = Rect {
                x: area.x + 1,
                y: area.y + area.height.saturating_sub(5),
                width: area.width.saturating_sub(2),
                height: 3,
            };
            let err_widget = Paragraph::new(err.to_owned())
                .style(Style::default().fg(Color::Red))
                .block(
                    Block::default()
                        .title(" Error ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                )
                .wrap(Wrap { trim: true });
            f.render_widget(ratatui::widgets::Clear, err_area);
            f.render_widget(err_widget, err_area);
        }
    }
}
