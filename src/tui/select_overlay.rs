use crate::selection::{DraftFocus, SelectionDraft};
use crate::tui::{centered, truncate};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

pub fn render(f: &mut Frame, draft: &SelectionDraft) {
    let overlay_area = centered(f.area(), 60, 80, 30, 8);
    f.render_widget(Clear, overlay_area);

    let count = Line::from(Span::styled(
        format!(" {} of {} selected ", draft.checked_count(), draft.total()),
        Style::default().fg(Color::DarkGray),
    ));
    let block = Block::default()
        .title(" Select jobs ")
        .title_bottom(count.centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(overlay_area);
    f.render_widget(block, overlay_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let searching = draft.focus == DraftFocus::Search;
    let search_style = if searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut search = vec![
        Span::styled("/ ", search_style),
        Span::styled(draft.query.as_str(), Style::default().fg(Color::White)),
    ];
    if searching {
        search.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    } else if draft.query.is_empty() {
        search.push(Span::styled("search", Style::default().fg(Color::DarkGray)));
    }
    f.render_widget(Paragraph::new(Line::from(search)), chunks[0]);

    let rows = draft.visible_rows();
    if rows.is_empty() {
        let msg = if draft.total() == 0 { "No jobs" } else { "No matching jobs" };
        f.render_widget(
            Paragraph::new(msg).style(Style::default().fg(Color::DarkGray)),
            chunks[1],
        );
        return;
    }

    let name_width = usize::from(chunks[1].width.saturating_sub(5));
    let items: Vec<ListItem> = rows
        .iter()
        .map(|(job, checked)| {
            let (mark, style) = if *checked {
                ("[x] ", Style::default().fg(Color::Green))
            } else {
                ("[ ] ", Style::default().fg(Color::DarkGray))
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, style),
                Span::raw(truncate(&job.display_name(), name_width)),
            ]))
        })
        .collect();

    let highlight = if searching {
        Style::default()
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    };
    let list = List::new(items).highlight_style(highlight);
    let mut list_state = ListState::default().with_selected(Some(draft.cursor));
    f.render_stateful_widget(list, chunks[1], &mut list_state);
}
