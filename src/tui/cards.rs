use crate::app::{AppState, CARD_HEIGHT, CARD_WIDTH};
use crate::model::Job;
use crate::status::{self, RunDisplayState, StatusColor};
use crate::tui::{spinner, status_color, truncate, weighted};
use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;

/// Number of cards that fit side by side in `width` columns.
pub fn columns_for(width: u16) -> usize {
    usize::from((width / CARD_WIDTH).max(1))
}

/// First visible card row so that the cursor's row stays on screen.
fn scroll_rows(cursor_row: usize, visible_rows: usize) -> usize {
    if visible_rows == 0 || cursor_row < visible_rows {
        0
    } else {
        cursor_row + 1 - visible_rows
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    if state.visible.is_empty() {
        let msg = if state.jobs_loaded {
            "No jobs found"
        } else if state.is_loading {
            "Loading jobs…"
        } else {
            "No job data"
        };
        let para = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        f.render_widget(para, area);
        return;
    }

    let columns = columns_for(area.width);
    let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));
    let first_row = scroll_rows(state.cursor / columns, visible_rows);
    let now = Utc::now();

    for (idx, job) in state.visible.iter().enumerate().skip(first_row * columns) {
        let row = idx / columns - first_row;
        if row >= visible_rows {
            break;
        }
        let col = idx % columns;
        let card_area = Rect {
            x: area.x + (col as u16) * CARD_WIDTH,
            y: area.y + (row as u16) * CARD_HEIGHT,
            width: CARD_WIDTH.min(area.width),
            height: CARD_HEIGHT.min(area.height.saturating_sub((row as u16) * CARD_HEIGHT)),
        };
        render_card(f, card_area, state, job, idx == state.cursor, now);
    }
}

fn render_card(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    job: &Job,
    selected: bool,
    now: DateTime<Utc>,
) {
    let inner_width = usize::from(area.width.saturating_sub(2));
    let last_run = state.last_run_for(&job.job_id);
    // Derived on every render: elapsed time of running jobs moves with `now`.
    let display = match last_run {
        Some(run) => status::derive_display_state(run, now),
        None => RunDisplayState::placeholder(),
    };
    let color = status_color(display.result_color);

    let mut title_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
    if selected {
        title_style = title_style.add_modifier(Modifier::REVERSED);
    }
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", truncate(&job.display_name(), inner_width.saturating_sub(2))),
            title_style,
        ))
        .borders(Borders::ALL)
        .border_type(if selected { BorderType::Thick } else { BorderType::Rounded })
        .border_style(Style::default().fg(color));

    let label = Style::default().fg(Color::DarkGray);
    let lines = if last_run.is_none() && state.is_loading {
        vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("{} loading last run", spinner::frame(state.spinner_frame)),
                Style::default().fg(Color::Yellow),
            )),
        ]
    } else {
        vec![
            Line::from(vec![
                Span::styled(
                    display.lifecycle_label.clone(),
                    weighted(Style::default().fg(color), display.lifecycle_font_weight),
                ),
                Span::styled("  state", label),
            ]),
            Line::from(vec![
                Span::styled(
                    truncate(&display.result_label, inner_width.saturating_sub(8)),
                    weighted(Style::default().fg(color), display.result_font_weight),
                ),
                Span::styled("  result", label),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Started  ", label),
                Span::raw(display.formatted_start_time.clone()),
            ]),
            Line::from(vec![
                Span::styled("Duration ", label),
                Span::raw(display.formatted_duration.clone()),
            ]),
            run_id_line(last_run.flatten().map(|r| r.run_id.as_str()), label),
        ]
    };

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn run_id_line(run_id: Option<&str>, label: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled("Run      ", label),
        Span::styled(
            run_id.unwrap_or(status::NOT_AVAILABLE).to_string(),
            Style::default().fg(status_color(StatusColor::Gray)),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_never_zero() {
        assert_eq!(columns_for(0), 1);
        assert_eq!(columns_for(CARD_WIDTH - 1), 1);
    }

    #[test]
    fn columns_fill_width() {
        assert_eq!(columns_for(CARD_WIDTH * 3 + 5), 3);
    }

    #[test]
    fn scroll_keeps_cursor_row_visible() {
        assert_eq!(scroll_rows(0, 3), 0);
        assert_eq!(scroll_rows(2, 3), 0);
        assert_eq!(scroll_rows(3, 3), 1);
        assert_eq!(scroll_rows(7, 3), 5);
        assert_eq!(scroll_rows(4, 0), 0);
    }
}
