use chrono::Local;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::ui::sel_style;

/// Status text for the current card file, shown on every screen.
pub fn status_line(app: &App) -> String {
    if app.settings.auth_is_default() {
        format!("Card file (default): {}", app.auth_path().display())
    } else {
        format!("Card file: {}", app.auth_path().display())
    }
}

pub fn render_status_bar(f: &mut Frame, area: Rect, text: &str) {
    if area.height == 0 { return; }

    let now = Local::now().format("%H:%M").to_string();
    let left = format!(" {text}");
    let right = format!("{now} ");

    let width = area.width as usize;
    let used = left.chars().count() + right.chars().count();
    let line = if used <= width {
        let pad = " ".repeat(width - used);
        Line::from(vec![
            Span::styled(left, sel_style()),
            Span::styled(pad, sel_style()),
            Span::styled(right, sel_style()),
        ])
    } else {
        // Too narrow: keep the tail of the path, it is the informative part.
        let keep = width.saturating_sub(right.chars().count() + 2);
        let tail: String = {
            let chars: Vec<char> = left.chars().collect();
            chars[chars.len().saturating_sub(keep)..].iter().collect()
        };
        Line::from(vec![
            Span::styled(format!(" …{tail}"), sel_style()),
            Span::styled(right, sel_style()),
        ])
    };
    f.render_widget(Paragraph::new(line), area);
}
