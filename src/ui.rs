use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::content::{self, ContentBlock};
use crate::history::Sender;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let banner_height = if app.error.is_some() { 1 } else { 0 };

    // Main layout: header, transcript, error banner, input, footer
    let [header_area, transcript_area, banner_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(banner_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_transcript(app, frame, transcript_area);
    render_error_banner(app, frame, banner_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" codequill ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("Python Code Assistant ", Style::default().fg(Color::White)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let text = if app.history.is_empty() && !app.loading() {
        app.transcript_lines = 1;
        Text::from(Span::styled(
            "Ask me anything about Python...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for (index, msg) in app.history.messages().iter().enumerate() {
            match msg.sender {
                Sender::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    push_blocks(&mut lines, &msg.content);
                }
                Sender::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "AI:",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )));
                    // The revealing message shows only its current prefix;
                    // everything else shows the full stored content.
                    let shown = if app.history.revealing_index() == Some(index) {
                        app.reveal_prefix().unwrap_or(&msg.content)
                    } else {
                        &msg.content
                    };
                    push_blocks(&mut lines, shown);
                }
            }
            lines.push(Line::default());
        }

        if app.loading() {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        let inner_width = area.width.saturating_sub(2);
        app.transcript_lines = wrapped_line_count(&lines, inner_width);

        Text::from(lines)
    };

    app.transcript_height = area.height.saturating_sub(2);
    let max_scroll = app.transcript_lines.saturating_sub(app.transcript_height);
    app.scroll = if app.follow {
        max_scroll
    } else {
        app.scroll.min(max_scroll)
    };

    let transcript = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));

    frame.render_widget(transcript, area);
}

/// Approximate wrapped line count for scroll bookkeeping, the same way the
/// transcript paragraph is wrapped. Saturates at `u16::MAX` so an extremely
/// long conversation clamps instead of overflowing.
fn wrapped_line_count(lines: &[Line], inner_width: u16) -> u16 {
    let inner_width = inner_width.max(1) as usize;
    let mut total: usize = 0;
    for line in lines {
        let width = line.width();
        total += if width == 0 {
            1
        } else {
            width.div_ceil(inner_width)
        };
    }
    total.min(u16::MAX as usize) as u16
}

/// Append a message's parsed blocks: prose with inline formatting, fenced
/// code with a language tag line.
fn push_blocks(lines: &mut Vec<Line<'static>>, content: &str) {
    for block in content::parse(content) {
        match block {
            ContentBlock::Text(text) => {
                for line in text.lines() {
                    lines.push(inline_line(line));
                }
            }
            ContentBlock::Code { language, text } => {
                lines.push(Line::from(Span::styled(
                    format!(" {} ", language),
                    Style::default().bg(Color::DarkGray).fg(Color::White),
                )));
                for line in text.lines() {
                    lines.push(Line::from(Span::styled(
                        line.to_string(),
                        Style::default().fg(Color::Green),
                    )));
                }
            }
        }
    }
}

/// Convert **bold** and `inline code` markdown in a prose line to styled spans
fn inline_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut current_text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
            // Consume the second *
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some((_, c)) = chars.next() {
                if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else if c == '`' {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            let mut code_text = String::new();
            let mut found_close = false;

            for (_, c) in chars.by_ref() {
                if c == '`' {
                    found_close = true;
                    break;
                }
                code_text.push(c);
            }

            if found_close && !code_text.is_empty() {
                spans.push(Span::styled(code_text, Style::default().fg(Color::Red)));
            } else {
                // No closing backtick, treat as literal
                current_text.push('`');
                current_text.push_str(&code_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn render_error_banner(app: &App, frame: &mut Frame, area: Rect) {
    let Some(banner) = &app.error else {
        return;
    };
    if area.height == 0 {
        return;
    }

    let notice = Paragraph::new(Line::from(Span::styled(
        format!(" {} ", banner.message),
        Style::default().fg(Color::White).bg(Color::Red),
    )));
    frame.render_widget(notice, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let input_border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let title = if app.loading() {
        " Waiting for response... "
    } else if app.reveal_active() {
        " Revealing (Esc to stop) "
    } else {
        " Ask (Enter to send) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(title);

    // Horizontal scroll: keep the cursor inside the inner width
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " INSERT ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" ask ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ];
            if app.reveal_active() {
                hints.extend(vec![
                    Span::styled(" Esc ", key_style),
                    Span::styled(" stop ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" C ", key_style),
                Span::styled(" clear ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
