//! Terminal UI rendering for the commander TUI.
//!
//! Layout, top to bottom:
//! - Viewport: the lines of the selected command, each marked allowed or blocked
//! - Separator
//! - HUD: the command catalog with scrolloff navigation
//! - Status bar: '?' keymap toggle plus the tmux session name
//!
//! This module renders from RenderState (immutable snapshot) - it never
//! mutates application state.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::render::{CommandView, LinePreview, RenderState};
use crate::tea::{Notification, NotificationLevel};

// Color tokens (selection uses REVERSED modifier to adapt to terminal theme)
const COLOR_TEXT_DIMMED: Color = Color::Gray;
const COLOR_TEXT_MUTED: Color = Color::DarkGray;
const COLOR_SEPARATOR: Color = Color::White;

const COLOR_ALLOWED: Color = Color::Green;
const COLOR_BLOCKED: Color = Color::Red;
const COLOR_OVERRIDE: Color = Color::Yellow;

// Layout constants
const HUD_HEIGHT: u16 = 8;

// Column widths for the command list
const LABEL_WIDTH: usize = 24;
const MODE_WIDTH: usize = 9;
const SPACING: usize = 2;

/// A single keybinding entry for display.
struct Keybinding(&'static str, &'static str);

/// A group of related keybindings (separated by │).
struct KeybindingGroup(Vec<Keybinding>);

fn keybindings(has_selection: bool) -> Vec<KeybindingGroup> {
    let mut run = vec![Keybinding("j/k", "move")];
    if has_selection {
        run.push(Keybinding("Enter", "run"));
    }
    vec![
        KeybindingGroup(run),
        KeybindingGroup(vec![Keybinding("o", "attach"), Keybinding("r", "reload")]),
        KeybindingGroup(vec![Keybinding("q", "quit")]),
    ]
}

/// Main render function - entry point for all UI drawing.
pub fn draw(frame: &mut Frame, state: &RenderState) {
    render_main_layout(frame, state);

    if let Some(ref notification) = state.notification {
        render_notification(frame, notification, frame.area());
    }
}

/// Render the main layout: viewport + separator + HUD + status bar.
fn render_main_layout(frame: &mut Frame, state: &RenderState) {
    let area = frame.area();

    if area.height < 3 {
        render_hud(frame, state, area);
        return;
    }

    let hud_height = HUD_HEIGHT.min(area.height.saturating_sub(3));
    let separator_height = if area.height > hud_height + 2 { 1 } else { 0 };

    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(separator_height),
        Constraint::Length(hud_height),
        Constraint::Length(1),
    ])
    .split(area);

    render_viewport(frame, state, chunks[0]);
    if separator_height > 0 {
        render_separator(frame, chunks[1]);
    }
    render_hud(frame, state, chunks[2]);
    render_statusbar(frame, state, chunks[3]);
}

/// Render the viewport - what Enter would send, line by line.
fn render_viewport(frame: &mut Frame, state: &RenderState, area: Rect) {
    let Some(selected) = state.commands.get(state.selected) else {
        let hint = Line::from(Span::styled(
            format!("Add [[commands]] to {} and press 'r'.", state.config_path),
            Style::default().fg(COLOR_TEXT_MUTED),
        ));
        frame.render_widget(Paragraph::new(hint), area);
        return;
    };

    let mut lines = Vec::with_capacity(state.preview.len() + 2);
    lines.push(Line::from(vec![
        Span::styled(
            selected.label.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", selected.mode),
            Style::default().fg(COLOR_TEXT_DIMMED),
        ),
    ]));
    if selected.override_security {
        lines.push(Line::from(Span::styled(
            "security checks overridden",
            Style::default().fg(COLOR_OVERRIDE),
        )));
    }
    lines.extend(
        state
            .preview
            .iter()
            .map(|line| preview_line(line, selected.override_security)),
    );

    // Keep the tail visible when a sequence is taller than the viewport.
    let start = lines.len().saturating_sub(area.height as usize);
    let lines: Vec<Line> = lines.into_iter().skip(start).collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn preview_line(line: &LinePreview, overridden: bool) -> Line<'static> {
    let (marker, marker_style) = match (&line.blocked_by, overridden) {
        (_, true) => ("!", Style::default().fg(COLOR_OVERRIDE)),
        (None, false) => ("✓", Style::default().fg(COLOR_ALLOWED)),
        (Some(_), false) => ("✗", Style::default().fg(COLOR_BLOCKED)),
    };

    let mut spans = vec![
        Span::styled(format!("{} ", marker), marker_style),
        Span::raw(line.text.clone()),
    ];
    if let Some(pattern) = &line.blocked_by {
        spans.push(Span::styled(
            format!("  blocked by `{}`", pattern),
            Style::default().fg(COLOR_BLOCKED),
        ));
    }
    Line::from(spans)
}

/// Render the separator - solid divider line between viewport and HUD.
fn render_separator(frame: &mut Frame, area: Rect) {
    let solid = "─".repeat(area.width as usize);
    let line = Line::from(Span::styled(solid, Style::default().fg(COLOR_SEPARATOR)));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_statusbar(frame: &mut Frame, state: &RenderState, area: Rect) {
    frame.render_widget(Paragraph::new(render_keymap_line(state, area.width)), area);
}

/// Render keybindings legend for the bottom line.
/// When show_keymap is false: Shows just "?" (grayed out)
/// When show_keymap is true: Shows "? │ <full keymap legend>" with bright "?"
/// The tmux session name is right-aligned.
fn render_keymap_line(state: &RenderState, width: u16) -> Line<'static> {
    let groups = keybindings(!state.commands.is_empty());

    let key_style = Style::default().fg(COLOR_TEXT_DIMMED);
    let desc_style = Style::default().fg(COLOR_TEXT_MUTED);
    let sep_style = Style::default().fg(COLOR_TEXT_MUTED);

    let help_style = if state.show_keymap {
        Style::default()
    } else {
        Style::default().fg(COLOR_TEXT_MUTED)
    };
    let mut spans: Vec<Span> = vec![Span::styled("?", help_style)];

    if state.show_keymap {
        for group in groups.iter() {
            spans.push(Span::styled(" │ ", sep_style));
            for (key_idx, keybinding) in group.0.iter().enumerate() {
                if key_idx > 0 {
                    spans.push(Span::styled(" • ", sep_style));
                }
                spans.push(Span::styled(keybinding.0, key_style));
                spans.push(Span::styled(format!(" {}", keybinding.1), desc_style));
            }
        }
    }

    let badge = format!(" tmux:{} ", state.tmux_session);
    let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let spacer_width = (width as usize)
        .saturating_sub(content_width)
        .saturating_sub(badge.chars().count());
    if spacer_width > 0 {
        spans.push(Span::raw(" ".repeat(spacer_width)));
        spans.push(Span::styled(badge, Style::default().fg(COLOR_TEXT_DIMMED)));
    }

    Line::from(spans)
}

/// Render the HUD - command list with scrolloff navigation.
fn render_hud(frame: &mut Frame, state: &RenderState, area: Rect) {
    if state.commands.is_empty() {
        let msg = Line::from(Span::styled(
            "No commands configured.",
            Style::default().fg(COLOR_TEXT_DIMMED),
        ));
        frame.render_widget(Paragraph::new(msg), area);
        return;
    }

    let header_height = 1;
    let content_height = area.height.saturating_sub(header_height as u16) as usize;

    // Scrolloff: keep selection centered
    let center = content_height / 2;
    let start = state.selected.saturating_sub(center);
    let end = (start + content_height).min(state.commands.len());
    let start = end.saturating_sub(content_height);

    let mut lines: Vec<Line> = Vec::with_capacity(content_height + header_height);
    lines.push(render_header_row(area.width));
    lines.extend(
        state
            .commands
            .iter()
            .enumerate()
            .skip(start)
            .take(content_height)
            .map(|(idx, command)| render_command_row(command, idx == state.selected, area.width)),
    );

    frame.render_widget(Paragraph::new(lines), area);
}

/// Render the column header row (bold to distinguish from data rows).
fn render_header_row(width: u16) -> Line<'static> {
    let header_style = Style::default()
        .fg(COLOR_TEXT_DIMMED)
        .add_modifier(Modifier::BOLD);

    if width < 20 {
        return Line::from(Span::styled("LABEL", header_style));
    }

    let command_width = command_column_width(width);
    Line::from(vec![
        Span::styled(format!("{:<w$}", "LABEL", w = LABEL_WIDTH), header_style),
        Span::styled("  ", header_style),
        Span::styled(format!("{:<w$}", "MODE", w = MODE_WIDTH), header_style),
        Span::styled("  ", header_style),
        Span::styled(format!("{:<w$}", "COMMAND", w = command_width), header_style),
    ])
}

/// Columns: LABEL (~24ch) | MODE (~9ch) | COMMAND (flex)
fn render_command_row(command: &CommandView, is_selected: bool, width: u16) -> Line<'static> {
    if width < 20 {
        let style = if is_selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        return Line::from(Span::styled(
            truncate(&command.label, width as usize),
            style,
        ));
    }

    let command_width = command_column_width(width);
    let label = format!(
        "{:<w$}",
        truncate(&command.label, LABEL_WIDTH),
        w = LABEL_WIDTH
    );
    let mode = format!("{:<w$}", command.mode, w = MODE_WIDTH);
    let summary = format!(
        "{:<w$}",
        truncate(&command.summary, command_width),
        w = command_width
    );

    let (primary_style, mode_style, secondary_style) = if is_selected {
        let selected = Style::default().add_modifier(Modifier::REVERSED);
        (selected, selected, selected)
    } else {
        let mode_color = if command.override_security {
            COLOR_OVERRIDE
        } else {
            COLOR_TEXT_DIMMED
        };
        (
            Style::default(),
            Style::default().fg(mode_color),
            Style::default().fg(COLOR_TEXT_DIMMED),
        )
    };

    Line::from(vec![
        Span::styled(label, primary_style),
        Span::styled("  ", primary_style),
        Span::styled(mode, mode_style),
        Span::styled("  ", primary_style),
        Span::styled(summary, secondary_style),
    ])
}

fn command_column_width(width: u16) -> usize {
    (width as usize).saturating_sub(LABEL_WIDTH + MODE_WIDTH + SPACING * 2)
}

/// Render the notification at the bottom of the screen, one row per line of
/// the message. When the screen is shorter than the message, the first lines win.
///
/// - Error: Red text with "Error:" prefix and bold styling
/// - Info: Green text without prefix
fn render_notification(frame: &mut Frame, notification: &Notification, area: Rect) {
    let rows = notification.message.lines().count().max(1) as u16;
    let height = rows.min(area.height);
    let notification_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(height),
        width: area.width,
        height,
    };
    frame.render_widget(Clear, notification_area);

    let lines: Vec<Line> = notification
        .message
        .lines()
        .enumerate()
        .map(|(i, text)| match notification.level {
            NotificationLevel::Error if i == 0 => Line::from(vec![
                Span::styled(
                    "Error: ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(text.to_string(), Style::default().fg(Color::Red)),
            ]),
            NotificationLevel::Error => Line::from(vec![
                Span::raw("       "),
                Span::styled(text.to_string(), Style::default().fg(Color::Red)),
            ]),
            NotificationLevel::Info => {
                Line::from(Span::styled(text.to_string(), Style::default().fg(Color::Green)))
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), notification_area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 1).collect();
        format!("{}~", truncated)
    }
}
