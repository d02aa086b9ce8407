//! Viewer rendering.
//!
//! [`render`] is a pure function of [`ViewerState`]: it draws the tab bar,
//! the active tab's visible window and the help/status line, and never
//! mutates anything.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ 1:api  ● 2:db  3:worker                  │  tab bar
//! │──────────────────────────────────────────│
//! │ ...active tab's visible lines...         │  log window
//! │ tab/←→: switch  ...  │ FOLLOWING         │  help/status
//! └──────────────────────────────────────────┘
//! ```

// Rust guideline compliant 2026-01

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::constants::{HELP_HEIGHT, TAB_BAR_HEIGHT};

use super::state::ViewerState;
use super::tab::Tab;

/// Placeholder shown until the terminal size is known.
pub const PLACEHOLDER: &str = "\n  Initializing…";

const HELP_TEXT: &str = "tab/←→: switch  ↑↓/pgup/pgdn: scroll  G: follow  g: top  esc/q: quit";

const TAB_WIDTH: usize = 4;

// === Palette (xterm-256) ===
const ACCENT: Color = Color::Indexed(215);
const UNREAD: Color = Color::Indexed(230);
const INACTIVE: Color = Color::Indexed(245);
const BORDER: Color = Color::Indexed(240);
const HELP: Color = Color::Indexed(241);
const UNREAD_DOT: Color = Color::Indexed(82);
const EXITED: Color = Color::Indexed(203);

/// Draw the whole viewer into `f`.
pub fn render(f: &mut Frame, state: &ViewerState) {
    if state.quitting() {
        return;
    }
    let area = f.area();
    if !state.ready() {
        f.render_widget(Paragraph::new(PLACEHOLDER), area);
        return;
    }
    let Some(active) = state.active_tab() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TAB_BAR_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(HELP_HEIGHT),
        ])
        .split(area);

    render_tab_bar(f, chunks[0], state);
    render_log_window(f, chunks[1], active, state.viewport_height());
    render_help(f, chunks[2], active);
}

fn render_tab_bar(f: &mut Frame, area: Rect, state: &ViewerState) {
    let mut spans = Vec::with_capacity(state.tabs().len() * 2);
    for (i, tab) in state.tabs().iter().enumerate() {
        spans.push(Span::raw(" "));
        spans.extend(tab_label(i, tab, i == state.active()));
        spans.push(Span::raw(" "));
    }

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(BORDER)),
    );
    f.render_widget(bar, area);
}

/// Label spans for one tab: `N:name` for the first nine, styled by state.
fn tab_label(index: usize, tab: &Tab, active: bool) -> Vec<Span<'static>> {
    let label = if index < 9 {
        format!("{}:{}", index + 1, tab.name())
    } else {
        tab.name().to_string()
    };

    if active {
        vec![Span::styled(
            label,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]
    } else if tab.unread() {
        vec![
            Span::styled("● ", Style::default().fg(UNREAD_DOT)),
            Span::styled(label, Style::default().fg(UNREAD).add_modifier(Modifier::BOLD)),
        ]
    } else {
        vec![Span::styled(label, Style::default().fg(INACTIVE))]
    }
}

fn render_log_window(f: &mut Frame, area: Rect, tab: &Tab, height: usize) {
    let lines: Vec<Line> = tab
        .visible(height)
        .map(|line| Line::raw(sanitize(line)))
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn render_help(f: &mut Frame, area: Rect, tab: &Tab) {
    let mut spans = vec![Span::styled(HELP_TEXT, Style::default().fg(HELP))];
    if tab.follow() {
        spans.push(Span::styled(" │ ", Style::default().fg(HELP)));
        spans.push(Span::styled(
            "FOLLOWING",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ));
    }
    if tab.exited() {
        spans.push(Span::styled(" │ ", Style::default().fg(HELP)));
        spans.push(Span::styled(
            "EXITED",
            Style::default().fg(EXITED).add_modifier(Modifier::BOLD),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Make a log line safe to draw: expand tabs, drop escape sequences and
/// other control characters.
///
/// Escape sequences would otherwise be written straight to the terminal
/// and move the cursor or repaint outside the log window.
#[must_use]
pub fn sanitize(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\t' => out.extend(std::iter::repeat_n(' ', TAB_WIDTH)),
            '\u{1b}' => match chars.peek() {
                // CSI: parameters and intermediates, then one final byte.
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&c) {
                            break;
                        }
                    }
                }
                // OSC: terminated by BEL or ST.
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\u{7}' {
                            break;
                        }
                        if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            },
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
