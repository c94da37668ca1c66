use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{ActiveOverlay, AppState, NARROW_WIDTH_THRESHOLD};
use crate::selection::DraftFocus;

fn hints(state: &AppState, narrow: bool) -> &'static [(&'static str, &'static str)] {
    match &state.overlay {
        ActiveOverlay::Select(draft) if draft.focus == DraftFocus::Search => &[
            ("type", "filter"),
            ("Backspace", "delete"),
            ("Enter/Esc", "done"),
        ],
        ActiveOverlay::Select(_) => &[
            ("j/k", "move"),
            ("Space", "toggle"),
            ("a", "all"),
            ("n", "none"),
            ("/", "search"),
            ("Enter", "apply"),
            ("q", "cancel"),
        ],
        ActiveOverlay::Runs(_) => &[
            ("j/k", "move"),
            ("o", "open"),
            ("r", "reload"),
            ("q", "close"),
        ],
        ActiveOverlay::None if narrow => &[
            ("hjkl", "nav"),
            ("Enter", "runs"),
            ("s", "select"),
            ("r", "refresh"),
            ("q", "quit"),
        ],
        ActiveOverlay::None => &[
            ("←↓↑→/hjkl", "navigate"),
            ("Enter", "runs"),
            ("s", "select jobs"),
            ("r", "refresh"),
            ("q", "quit"),
        ],
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < NARROW_WIDTH_THRESHOLD;

    let line = if let Some(notif) = state.notifications.last() {
        Line::from(vec![
            Span::styled("★ ", Style::default().fg(Color::Yellow)),
            Span::styled(&notif.message, Style::default().fg(Color::Yellow)),
        ])
    } else {
        let mut spans: Vec<Span> = Vec::new();
        for (i, (key, desc)) in hints(state, narrow).iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::styled(
                format!(" {desc}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}
