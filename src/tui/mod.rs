pub mod cards;
pub mod footer;
pub mod header;
pub mod render;
pub mod runs_table;
pub mod select_overlay;
pub mod spinner;

use crate::status::{FontWeight, StatusColor};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn status_color(color: StatusColor) -> Color {
    match color {
        StatusColor::Green => Color::Green,
        StatusColor::Red => Color::Red,
        StatusColor::Amber => Color::Rgb(237, 154, 0),
        StatusColor::Gray => Color::Gray,
        StatusColor::Black => Color::Reset,
    }
}

pub fn weighted(style: Style, weight: FontWeight) -> Style {
    match weight {
        FontWeight::Bold => style.add_modifier(Modifier::BOLD),
        FontWeight::Normal => style,
    }
}

/// Rect of `percent_x` × `percent_y` of `area`, centered, never smaller than the minimums.
pub fn centered(area: Rect, percent_x: u16, percent_y: u16, min_w: u16, min_h: u16) -> Rect {
    let width = (area.width * percent_x / 100).max(min_w).min(area.width);
    let height = (area.height * percent_y / 100).max(min_h).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

pub fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        s.to_string()
    } else if max_width == 0 {
        String::new()
    } else {
        let mut result = String::new();
        let mut width = 0;
        for c in s.chars() {
            let cw = UnicodeWidthChar::width(c).unwrap_or(0);
            if width + cw + 1 > max_width {
                result.push('…');
                break;
            }
            result.push(c);
            width += cw;
        }
        result
    }
}
