use careerdesk_core::{ChatRole, ImageStatus, Workspace};
use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, FocusPane, InputMode};
use crate::input::LineInput;
use crate::palette::Palette;
use crate::preview::{render_half_blocks, ImagePreview};

/// Wrap text to a display width, breaking at spaces. Runs of spaces inside a
/// line are kept; words wider than the panel are split.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;
    let mut gap = 0;

    for (i, word) in text.split(' ').enumerate() {
        if i > 0 {
            gap += 1;
        }
        if word.is_empty() {
            continue;
        }
        let word_width = word.width();

        if current_width == 0 {
            // Indentation survives on the first line only
            if lines.is_empty() && gap + word_width <= width {
                current_line.push_str(&" ".repeat(gap));
                current_width = gap;
            }
        } else if current_width + gap + word_width <= width {
            current_line.push_str(&" ".repeat(gap));
            current_width += gap;
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_width = 0;
        }
        gap = 0;

        for c in word.chars() {
            let char_width = c.width().unwrap_or(0);
            if current_width > 0 && current_width + char_width > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            current_line.push(c);
            current_width += char_width;
        }
    }

    if !current_line.is_empty() || lines.is_empty() {
        lines.push(current_line);
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    frame.render_widget(Block::default().style(app.palette.base()), area);

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if app.workspace().is_some() {
        render_workspace(app, frame, body_area);
    } else {
        render_login(app, frame, body_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let palette = &app.palette;
    let mut spans = vec![Span::styled(
        " AI Image & Job Assistant ",
        Style::default().fg(palette.primary).bold(),
    )];
    if app.workspace().is_some() {
        spans.push(Span::styled(
            format!(" chat: {}  image: {} ", app.chat_model, app.image_model),
            palette.muted(),
        ));
    }
    spans.push(Span::styled(
        format!(" [{}] ", app.theme.as_str()),
        palette.muted(),
    ));

    let header = Paragraph::new(Line::from(spans)).style(palette.panel());
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let palette = &app.palette;
    let hints: &[(&str, &str)] = if app.workspace().is_none() {
        &[("Enter", "log in"), ("t", "theme"), ("q", "quit")]
    } else if app.input_mode == InputMode::Editing {
        &[("Enter", "send"), ("Tab", "switch"), ("Esc", "stop editing")]
    } else {
        &[
            ("i", "edit"),
            ("Tab", "switch"),
            ("j/k", "scroll"),
            ("x", "dismiss"),
            ("t", "theme"),
            ("L", "log out"),
            ("q", "quit"),
        ]
    };

    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), palette.key()));
        spans.push(Span::styled(format!(" {}  ", label), palette.muted()));
    }

    let footer = Paragraph::new(Line::from(spans)).style(palette.panel());
    frame.render_widget(footer, area);
}

fn render_login(app: &App, frame: &mut Frame, area: Rect) {
    let palette = &app.palette;

    let [row] = Layout::vertical([Constraint::Length(9)])
        .flex(Flex::Center)
        .areas(area);
    let [card] = Layout::horizontal([Constraint::Length(44)])
        .flex(Flex::Center)
        .areas(row);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(true))
        .style(palette.panel());

    let text = Text::from(vec![
        Line::default(),
        Line::styled("Welcome Back", palette.title().fg(palette.primary)),
        Line::styled("Sign in to access the assistant", palette.muted()),
        Line::default(),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled(" Enter ", palette.key()),
            Span::raw(" to log in"),
        ]),
    ]);

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, card);
}

fn render_workspace(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, image_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(area);

    render_chat(app, frame, chat_area);
    render_image(app, frame, image_area);
}

fn chat_lines(workspace: &Workspace, palette: &Palette, width: usize, frame_no: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in workspace.chat.transcript() {
        let (label, style) = match msg.role {
            ChatRole::User => ("You:", Style::default().fg(palette.primary)),
            ChatRole::Assistant => ("Assistant:", Style::default().fg(palette.accent)),
        };
        lines.push(Line::from(Span::styled(label, style.add_modifier(Modifier::BOLD))));
        for paragraph in msg.content.lines() {
            for wrapped in wrap_text_to_width(paragraph, width) {
                lines.push(Line::from(wrapped));
            }
        }
        lines.push(Line::default());
    }

    if workspace.chat.is_sending() {
        lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis
        let dots = ".".repeat(frame_no as usize % 3 + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            palette.muted().add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [history_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let focused = app.focus == FocusPane::Chat;

    // Inner size minus borders
    app.chat_height = history_area.height.saturating_sub(2);
    app.chat_width = history_area.width.saturating_sub(2);

    let Some(workspace) = app.gate.workspace() else {
        return;
    };
    let sending = workspace.chat.is_sending();
    let lines = chat_lines(workspace, &app.palette, app.chat_width as usize, app.animation_frame);

    app.chat_total_lines = lines.len().min(u16::MAX as usize) as u16;
    if app.chat_follow {
        app.chat_scroll = app.max_chat_scroll();
    } else {
        app.chat_scroll = app.chat_scroll.min(app.max_chat_scroll());
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.palette.border(focused))
        .title(Span::styled(" Job Application Assistant ", app.palette.title()))
        .style(app.palette.panel());

    let history = Paragraph::new(lines)
        .block(block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(history, history_area);

    let title = if sending { " Waiting for reply " } else { " Ask a question " };
    render_input(app, frame, input_area, InputTarget::Chat, title, sending);
}

fn render_image(app: &mut App, frame: &mut Frame, area: Rect) {
    let [prompt_area, status_area, result_area, saved_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let Some(workspace) = app.gate.workspace() else {
        return;
    };
    let state = workspace.image.state().clone();
    let request = workspace.image.request_id();
    let loading = state.status == ImageStatus::Loading;

    let title = if loading { " Generating " } else { " Describe an image " };
    render_input(app, frame, prompt_area, InputTarget::Image, title, loading);

    let palette = app.palette;

    let status = if loading {
        let dots = ".".repeat(app.animation_frame as usize % 3 + 1);
        Line::styled(format!(" Generating{}", dots), Style::default().fg(palette.accent))
    } else if let Some(error) = &state.error {
        Line::from(vec![
            Span::styled(format!(" {}", error), palette.error()),
            Span::styled("  (x to dismiss)", palette.muted()),
        ])
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(status), status_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(app.focus == FocusPane::Image))
        .title(Span::styled(" AI Image Generator ", palette.title()))
        .style(palette.panel());
    let inner = block.inner(result_area);
    frame.render_widget(block, result_area);

    match (&state.result, state.status) {
        (Some(image), ImageStatus::Ready) => {
            let cached = app
                .preview
                .as_ref()
                .map(|p| p.matches(request, inner.width, inner.height))
                .unwrap_or(false);
            if !cached {
                let lines = render_half_blocks(&image.bytes, inner.width, inner.height)
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "could not render image preview");
                        vec![Line::styled("Preview unavailable for this image", palette.muted())]
                    });
                app.preview = Some(ImagePreview {
                    request,
                    width: inner.width,
                    height: inner.height,
                    lines,
                });
            }
            if let Some(preview) = &app.preview {
                let picture = Paragraph::new(preview.lines.clone()).alignment(Alignment::Center);
                frame.render_widget(picture, inner);
            }
        }
        _ => {
            let message = if loading {
                "Generating..."
            } else {
                "Your generated image will appear here"
            };
            let [middle] = Layout::vertical([Constraint::Length(1)])
                .flex(Flex::Center)
                .areas(inner);
            let placeholder = Paragraph::new(Span::styled(message, palette.muted()))
                .alignment(Alignment::Center);
            frame.render_widget(placeholder, middle);
        }
    }

    let footer = if let Some(notice) = &app.notice {
        Line::styled(format!(" {}", notice), palette.error())
    } else if let Some(path) = &app.saved_image {
        Line::styled(format!(" Saved to {}", path.display()), palette.muted())
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(footer).wrap(Wrap { trim: true }), saved_area);
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum InputTarget {
    Chat,
    Image,
}

fn render_input(
    app: &App,
    frame: &mut Frame,
    area: Rect,
    target: InputTarget,
    title: &str,
    disabled: bool,
) {
    let palette = &app.palette;
    let (input, focused): (&LineInput, bool) = match target {
        InputTarget::Chat => (&app.chat_input, app.focus == FocusPane::Chat),
        InputTarget::Image => (&app.prompt_input, app.focus == FocusPane::Image),
    };
    let editing = focused && app.input_mode == InputMode::Editing;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(editing))
        .title(Span::styled(title.to_string(), palette.muted()))
        .style(palette.panel());

    // Keep the cursor visible by scrolling horizontally
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = input.cursor();
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = input
        .text()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let paragraph = if input.text().is_empty() && !editing {
        let hint = match target {
            InputTarget::Chat => "Type your message...",
            InputTarget::Image => "e.g. A minimalist logo for a tech startup",
        };
        Paragraph::new(hint).style(palette.muted())
    } else if disabled {
        Paragraph::new(visible_text).style(palette.muted())
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(palette.text))
    };
    frame.render_widget(paragraph.block(block), area);

    if editing && !disabled {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
