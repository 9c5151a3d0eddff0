use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::time::Duration;

use crate::status::render_status_bar;

pub type Term = Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>;

const ACCENT: Color = Color::Cyan;

pub const HEADER_LINES: &[&str] = &[
    "CARDSWITCH",
    "card account switcher / game launcher",
    "",
];

// ── Padding ───────────────────────────────────────────────────────────────────
// Horizontal padding applied to every screen so text never touches the edges.
const H_PAD: u16 = 3;

pub fn pad_horizontal(area: Rect) -> Rect {
    let pad = H_PAD.min(area.width / 2);
    Rect {
        x: area.x + pad,
        y: area.y,
        width: area.width.saturating_sub(pad * 2),
        height: area.height,
    }
}

// ── Color helpers ─────────────────────────────────────────────────────────────

pub fn normal_style() -> Style { Style::default().fg(ACCENT) }
pub fn sel_style()    -> Style { Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD) }
pub fn title_style()  -> Style { Style::default().fg(ACCENT).add_modifier(Modifier::BOLD) }
pub fn dim_style()    -> Style { Style::default().fg(ACCENT).add_modifier(Modifier::DIM) }

// ── Header ────────────────────────────────────────────────────────────────────

fn render_header(f: &mut Frame, area: Rect) {
    let inner = pad_horizontal(area);
    let lines: Vec<Line> = HEADER_LINES
        .iter()
        .map(|l| Line::from(Span::styled(*l, title_style())))
        .collect();
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_separator(f: &mut Frame, area: Rect) {
    let inner = pad_horizontal(area);
    let sep = "=".repeat(inner.width as usize);
    f.render_widget(Paragraph::new(sep).style(dim_style()), inner);
}

// ── Screen ────────────────────────────────────────────────────────────────────

/// One row of a list menu. Labels are never interpreted, so a label that
/// reads `---` or `Back` is still an ordinary item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry<'a> {
    Item(&'a str),
    Separator,
}

impl<'a> MenuEntry<'a> {
    /// Fixed menus spell separators as `---`.
    fn from_choice(choice: &'a str) -> Self {
        if choice == "---" { MenuEntry::Separator } else { MenuEntry::Item(choice) }
    }
}

/// Positions in `entries` that the cursor can land on, in order.
pub fn selectable_positions(entries: &[MenuEntry]) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, MenuEntry::Item(_)))
        .map(|(i, _)| i)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuResult {
    Selected(String),
    Back,
}

/// The terminal plus the text shown in the bottom status bar.
pub struct Ui {
    pub terminal: Term,
    status: String,
}

impl Ui {
    pub fn new(terminal: Term) -> Self {
        Self { terminal, status: String::new() }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn run_menu(&mut self, title: &str, choices: &[&str], subtitle: Option<&str>) -> Result<MenuResult> {
        self.run_menu_at(title, choices, subtitle, 0)
    }

    /// `start` indexes the selectable entries (separators `---` excluded).
    pub fn run_menu_at(
        &mut self,
        title: &str,
        choices: &[&str],
        subtitle: Option<&str>,
        start: usize,
    ) -> Result<MenuResult> {
        let entries: Vec<MenuEntry> = choices.iter().copied().map(MenuEntry::from_choice).collect();
        Ok(match self.run_list_at(title, &entries, subtitle, start)? {
            Some(i) => MenuResult::Selected(choices[i].to_string()),
            None => MenuResult::Back,
        })
    }

    /// Like `run_menu_at`, but for entries built from user data. Returns the
    /// position of the chosen entry in `entries`, or `None` on Esc.
    pub fn run_list_at(
        &mut self,
        title: &str,
        entries: &[MenuEntry],
        subtitle: Option<&str>,
        start: usize,
    ) -> Result<Option<usize>> {
        let selectable = selectable_positions(entries);
        let mut idx = start.min(selectable.len().saturating_sub(1));
        let status = self.status.clone();

        loop {
            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Length(1),
                        if subtitle.is_some() { Constraint::Length(2) } else { Constraint::Length(0) },
                        Constraint::Min(1),
                        Constraint::Length(1),
                    ])
                    .split(f.area());

                render_header(f, chunks[0]);
                render_separator(f, chunks[1]);
                f.render_widget(
                    Paragraph::new(title).alignment(Alignment::Center).style(title_style()),
                    pad_horizontal(chunks[2]),
                );
                render_separator(f, chunks[3]);

                if let Some(sub) = subtitle {
                    f.render_widget(
                        Paragraph::new(Span::styled(sub, dim_style())),
                        pad_horizontal(chunks[4]),
                    );
                }

                // Keep the cursor on screen for long account lists.
                let content = pad_horizontal(chunks[5]);
                let mut lines: Vec<Line> = Vec::new();
                let mut cursor_line = 0usize;
                let mut seen = 0usize;
                for entry in entries {
                    let MenuEntry::Item(label) = entry else {
                        lines.push(Line::from(""));
                        continue;
                    };
                    if seen == idx {
                        cursor_line = lines.len();
                        lines.push(Line::from(Span::styled(format!("  > {label}"), sel_style())));
                    } else {
                        lines.push(Line::from(Span::styled(format!("    {label}"), normal_style())));
                    }
                    seen += 1;
                }
                let height = content.height as usize;
                let scroll = cursor_line.saturating_sub(height.saturating_sub(1));
                f.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), content);

                render_status_bar(f, chunks[6], &status);
            })?;

            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press { continue; }
                    match key.code {
                        KeyCode::Up | KeyCode::Char('k') => {
                            idx = idx.saturating_sub(1);
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            if !selectable.is_empty() {
                                idx = (idx + 1).min(selectable.len() - 1);
                            }
                        }
                        KeyCode::Enter | KeyCode::Char(' ') => {
                            if let Some(&pos) = selectable.get(idx) {
                                return Ok(Some(pos));
                            }
                        }
                        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Tab => {
                            return Ok(None);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    // ── Text input ────────────────────────────────────────────────────────────

    /// Returns the trimmed input, or `None` when cancelled with Esc.
    pub fn input_prompt(&mut self, prompt: &str, initial: &str) -> Result<Option<String>> {
        let mut buf = initial.to_string();
        let status = self.status.clone();

        loop {
            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(1),
                        Constraint::Min(1),
                        Constraint::Length(1),
                        Constraint::Length(1),
                    ])
                    .split(f.area());

                render_header(f, chunks[0]);
                render_separator(f, chunks[1]);
                let display = format!("{prompt}\n\n  > {buf}█");
                f.render_widget(Paragraph::new(display).style(normal_style()), pad_horizontal(chunks[2]));
                f.render_widget(
                    Paragraph::new("Enter = accept   Esc = cancel").style(dim_style()),
                    pad_horizontal(chunks[3]),
                );
                render_status_bar(f, chunks[4], &status);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press { continue; }
                    match key.code {
                        KeyCode::Enter => return Ok(Some(buf.trim().to_string())),
                        KeyCode::Esc => return Ok(None),
                        KeyCode::Backspace => {
                            buf.pop();
                        }
                        KeyCode::Char(c) if !c.is_control() => buf.push(c),
                        _ => {}
                    }
                }
            }
        }
    }

    // ── Confirmation dialog ───────────────────────────────────────────────────

    pub fn confirm(&mut self, message: &str) -> Result<bool> {
        let status = self.status.clone();
        loop {
            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(1)])
                    .split(f.area());
                render_header(f, chunks[0]);
                let msg = format!("{message}\n\n  [y] Yes    [n] No");
                f.render_widget(Paragraph::new(msg).style(normal_style()), pad_horizontal(chunks[1]));
                render_status_bar(f, chunks[2], &status);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press { continue; }
                    match key.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') => return Ok(true),
                        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return Ok(false),
                        _ => {}
                    }
                }
            }
        }
    }

    // ── Message flash ─────────────────────────────────────────────────────────

    pub fn flash_message(&mut self, message: &str, ms: u64) -> Result<()> {
        let status = self.status.clone();
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(1)])
                .split(f.area());
            render_header(f, chunks[0]);
            let p = Paragraph::new(format!("\n  {message}")).style(normal_style());
            f.render_widget(p, pad_horizontal(chunks[1]));
            render_status_bar(f, chunks[2], &status);
        })?;
        std::thread::sleep(Duration::from_millis(ms));
        Ok(())
    }

    // ── Pager ─────────────────────────────────────────────────────────────────

    /// Scrollable text; any of q/Esc/Enter closes it.
    pub fn pager(&mut self, text: &str, title: &str) -> Result<()> {
        let lines: Vec<&str> = text.lines().collect();
        let mut offset = 0usize;
        let status = self.status.clone();

        loop {
            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Min(1),
                        Constraint::Length(1),
                        Constraint::Length(1),
                    ])
                    .split(f.area());

                render_header(f, chunks[0]);
                render_separator(f, chunks[1]);
                f.render_widget(
                    Paragraph::new(title).alignment(Alignment::Center).style(title_style()),
                    pad_horizontal(chunks[2]),
                );

                let content = pad_horizontal(chunks[3]);
                let page: Vec<Line> = lines[offset..]
                    .iter()
                    .take(content.height as usize)
                    .map(|l| Line::from(Span::styled(*l, normal_style())))
                    .collect();
                f.render_widget(Paragraph::new(page), content);

                f.render_widget(
                    Paragraph::new("↑↓ scroll   q/Enter = close").style(dim_style()),
                    pad_horizontal(chunks[4]),
                );
                render_status_bar(f, chunks[5], &status);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press { continue; }
                    match key.code {
                        KeyCode::Up | KeyCode::Char('k') => {
                            offset = offset.saturating_sub(1);
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            if offset + 1 < lines.len() { offset += 1; }
                        }
                        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => break,
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}
