use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::line::NORMAL as LINE;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};

use crate::config::{RgbColor, UiColors};
use crate::fields::Tab;

use super::edit::InlineEditor;
use super::keymap::HelpEntry;
use super::session::{EditTarget, EditorView, FieldRow};

const READY_HINT: &str = "?: help  1-9: edit field  q: quit";
const HELP_MODAL_FOOTER: &str = "any key: close";

/// One frame's worth of state
pub struct Screen<'a> {
    pub view: &'a EditorView,
    pub colors: &'a UiColors,
    pub status: Option<&'a str>,
    pub prompt: Option<&'a InlineEditor>,
    pub help: Option<&'a [HelpEntry]>,
}

pub fn render<B: Backend>(terminal: &mut Terminal<B>, screen: &Screen<'_>) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, screen))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, screen: &Screen<'_>) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], screen);
    draw_tabs(frame, layout[1], screen);
    draw_footer(frame, layout[2], screen);
    if let Some(entries) = screen.help {
        draw_help_modal(frame, size, screen.colors, entries);
    }
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, screen: &Screen<'_>) {
    let position = format!(
        "CONTACT {}/{}",
        screen.view.cursor.index + 1,
        screen.view.total
    );
    let mut spans = vec![
        Span::styled("RLABOOK", label_style(screen.colors).add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::styled(position, label_style(screen.colors)),
    ];
    if screen.view.can_undo {
        spans.push(Span::raw("   "));
        spans.push(Span::styled("MODIFIED", selection_style(screen.colors)));
    }
    let line = Line::from(spans);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_tabs(frame: &mut Frame<'_>, area: Rect, screen: &Screen<'_>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(screen.colors))
        .title(Span::styled(
            format!(" {} ", screen.view.header),
            label_style(screen.colors),
        ))
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    render_header_with_separator(
        frame,
        layout[0],
        build_tab_header(screen.view.cursor.tab, screen.colors),
        screen.colors,
        area.width,
    );

    let rows = &screen.view.rows;
    let label_width = rows.iter().map(|r| r.label.len() + 1).max().unwrap_or(0);

    let mut lines: Vec<Line> = Vec::new();
    for row in rows {
        if row.target == EditTarget::Email(0) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "E-mail addresses:",
                label_style(screen.colors),
            )));
        }
        lines.push(field_line(row, screen.colors, label_width));
    }

    frame.render_widget(Paragraph::new(lines), layout[1]);
}

fn build_tab_header(current: Tab, colors: &UiColors) -> Line<'static> {
    let mut spans: Vec<Span> = Vec::new();
    for (idx, tab) in Tab::ALL.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" | ".to_string(), label_style(colors)));
        }
        let style = if *tab == current {
            selection_style(colors)
        } else {
            label_style(colors)
        };
        spans.push(Span::styled(tab.title().to_string(), style));
    }
    Line::from(spans)
}

fn field_line(row: &FieldRow, colors: &UiColors, label_width: usize) -> Line<'static> {
    let number = format!("{:>2}  ", row.number);
    let label = format!("{:width$} ", format!("{}:", row.label), width = label_width);
    Line::from(vec![
        Span::styled(number, selection_style(colors)),
        Span::styled(label, label_style(colors)),
        Span::raw(row.value.clone()),
    ])
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, screen: &Screen<'_>) {
    let colors = screen.colors;
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);

    if let Some(editor) = screen.prompt {
        let line = Line::from(vec![
            Span::styled(editor.prompt().to_string(), style.add_modifier(Modifier::BOLD)),
            Span::styled(editor.value().to_string(), style),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let column = Span::raw(editor.prompt()).width() + editor.visual_cursor();
        let x = area.x.saturating_add(column as u16);
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        return;
    }

    let message = screen.status.unwrap_or(READY_HINT);
    frame.render_widget(Paragraph::new(message.to_string()).style(style), area);
}

fn draw_help_modal(frame: &mut Frame<'_>, area: Rect, colors: &UiColors, entries: &[HelpEntry]) {
    let width = area.width.saturating_mul(2).saturating_div(3).max(40).min(area.width);
    let height = (entries.len() as u16 + 2).min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    let keys_width = 20usize;
    let lines: Vec<Line> = entries
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!("{:<width$}", entry.keys, width = keys_width),
                    label_style(colors),
                ),
                Span::raw(entry.description),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(colors))
        .title(Span::styled(" HELP ", label_style(colors)))
        .title_bottom(Line::from(Span::styled(
            format!(" {} ", HELP_MODAL_FOOTER),
            label_style(colors),
        )))
        .title_alignment(Alignment::Center);

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);
    frame.render_widget(Paragraph::new(lines), inner);
}

fn selection_style(colors: &UiColors) -> Style {
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(colors: &UiColors) -> Style {
    Style::default().fg(color(colors.border))
}

fn label_style(colors: &UiColors) -> Style {
    Style::default().fg(color(colors.label))
}

/// Render a header line with a separator below it.
/// `outer_width` is the full pane width (including borders) so the separator
/// joins the side borders.
fn render_header_with_separator(
    frame: &mut Frame<'_>,
    area: Rect,
    content: Line<'static>,
    colors: &UiColors,
    outer_width: u16,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    if area.height == 1 {
        frame.render_widget(Paragraph::new(content), area);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    frame.render_widget(Paragraph::new(content), layout[0]);

    // ├───┤
    let inner_width = outer_width.saturating_sub(2) as usize;
    let separator = format!(
        "{}{}{}",
        LINE.vertical_right,
        LINE.horizontal.to_string().repeat(inner_width),
        LINE.vertical_left
    );
    let separator_area = Rect {
        x: layout[1].x.saturating_sub(1),
        y: layout[1].y,
        width: outer_width,
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(separator, border_style(colors)))),
        separator_area,
    );
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
