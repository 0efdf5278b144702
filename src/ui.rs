use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use promptmaster_core::Role;

use crate::app::{App, BuilderField, InputMode, Screen};

/// Turn `**bold**` runs into styled spans. An unclosed marker stays literal.
fn styled_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    // An odd part count means every opening marker has a closing one
    let balanced = parts.len() % 2 == 1;
    let last = parts.len() - 1;

    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let bold = i % 2 == 1;
        if bold && !balanced && i == last {
            spans.push(Span::raw(format!("**{}", part)));
        } else if part.is_empty() {
            continue;
        } else if bold {
            spans.push(Span::styled(
                part.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(part.to_string()));
        }
    }

    Line::from(spans)
}

fn ellipsis(app: &App) -> String {
    ".".repeat(app.animation_frame as usize + 1)
}

fn border_color(selected: bool, editing: bool) -> Color {
    match (selected, editing) {
        (true, true) => Color::Yellow,
        (true, false) => Color::Cyan,
        _ => Color::DarkGray,
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Tutor => render_tutor_screen(app, frame, body_area),
        Screen::Builder => render_builder_screen(app, frame, body_area),
        Screen::Refine => render_refine_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(" PromptMaster ", Style::default().fg(Color::Cyan).bold())];

    for (i, screen) in Screen::all().iter().enumerate() {
        let label = format!(" {} {} ", i + 1, screen.title());
        if *screen == app.screen {
            spans.push(Span::styled(label, Style::default().bg(Color::Cyan).fg(Color::Black)));
        } else {
            spans.push(Span::styled(label, Style::default().fg(Color::White)));
        }
    }

    spans.push(Span::styled(
        format!(" {} ({}) ", app.model_tier().display_name(), app.model_name()),
        Style::default().fg(Color::Gray),
    ));

    if app.screen == Screen::Tutor && app.chat.thinking_mode() {
        spans.push(Span::styled(" [deep thinking] ", Style::default().fg(Color::Magenta).bold()));
    }

    match app.api_key_source {
        Some(source) => spans.push(Span::styled(
            format!(" key: {} ", source),
            Style::default().fg(Color::DarkGray),
        )),
        None => spans.push(Span::styled(
            " no API key (K to set) ",
            Style::default().fg(Color::Red).bold(),
        )),
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &str, label: &str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    let pairs: Vec<(&str, &str)> = match (app.screen, app.input_mode) {
        (Screen::Tutor, InputMode::Normal) => vec![
            ("i", "type"),
            ("t", if app.chat.thinking_mode() { "thinking off" } else { "thinking on" }),
            ("j/k", "scroll"),
            ("n", "new chat"),
        ],
        (Screen::Tutor, InputMode::Editing) => vec![("Enter", "send"), ("Esc", "stop typing")],
        (Screen::Builder, InputMode::Normal) => vec![
            ("j/k", "field"),
            ("Enter", "edit"),
            ("g", "generate"),
            ("r", "run"),
        ],
        (Screen::Builder, InputMode::Editing) => vec![("Alt+Enter", "newline"), ("Enter/Esc", "done")],
        (Screen::Refine, InputMode::Normal) => vec![("i", "type"), ("r", "refine")],
        (Screen::Refine, InputMode::Editing) => vec![("Alt+Enter", "newline"), ("Enter", "refine"), ("Esc", "stop typing")],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)];
    for (key, label) in pairs {
        spans.extend(hint(key, label));
    }
    if app.input_mode == InputMode::Normal {
        for (key, label) in [("Tab", "screen"), ("K", "API key"), ("q", "quit")] {
            spans.extend(hint(key, label));
        }
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_tutor_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Inner size, used by the scroll helpers
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let loading = app.chat.is_loading();
    let mut lines: Vec<Line> = Vec::new();

    for msg in app.chat.conversation().messages() {
        match msg.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.extend(msg.text.lines().map(|l| Line::from(l.to_string())));
            }
            Role::Model => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                if msg.is_thinking {
                    lines.push(Line::from(Span::styled(
                        "deep thinking",
                        Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC),
                    )));
                }
                if msg.is_placeholder() {
                    let label = if msg.is_thinking { "Reasoning" } else { "Thinking" };
                    let text = if loading {
                        format!("{}{}", label, ellipsis(app))
                    } else {
                        String::new()
                    };
                    lines.push(Line::from(Span::styled(
                        text,
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                    )));
                } else {
                    lines.extend(msg.text.lines().map(styled_line));
                }
            }
        }
        lines.push(Line::default());
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", Screen::Tutor.title()));

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    let editing = app.input_mode == InputMode::Editing;
    let title = if loading { " Waiting for the tutor... " } else { " Message " };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(editing, true)))
        .title(title);

    // Scroll horizontally to keep the cursor visible
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let offset = if inner_width > 0 && app.chat_cursor >= inner_width {
        app.chat_cursor - inner_width + 1
    } else {
        0
    };
    let visible: String = app.chat_input.chars().skip(offset).take(inner_width).collect();

    let input = Paragraph::new(visible)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if editing {
        let cursor_x = (app.chat_cursor - offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_builder_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [form_area, result_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);

    let [role_area, task_area, context_area, format_area, constraints_area, status_area] =
        Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .areas(form_area);

    render_builder_field(app, frame, role_area, BuilderField::Role);
    render_builder_field(app, frame, task_area, BuilderField::Task);
    render_builder_field(app, frame, context_area, BuilderField::Context);
    render_builder_field(app, frame, format_area, BuilderField::Format);
    render_builder_field(app, frame, constraints_area, BuilderField::Constraints);

    let status = if app.builder.is_generating() {
        Line::from(Span::styled(
            format!("Architecting prompt{}", ellipsis(app)),
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(error) = &app.builder_error {
        Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
    } else {
        Line::from(Span::styled("Press g to generate", Style::default().fg(Color::DarkGray)))
    };
    let status_block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(
        Paragraph::new(status).block(status_block).wrap(Wrap { trim: true }),
        status_area,
    );

    let [strategy_area, prompt_area, test_input_area, output_area] = Layout::vertical([
        Constraint::Length(6),
        Constraint::Min(5),
        Constraint::Length(4),
        Constraint::Percentage(30),
    ])
    .areas(result_area);

    let strategy = app
        .builder
        .result()
        .map(|r| r.strategy.clone())
        .unwrap_or_default();
    let strategy_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Strategy ");
    frame.render_widget(
        Paragraph::new(strategy)
            .style(Style::default().fg(Color::Gray))
            .block(strategy_block)
            .wrap(Wrap { trim: true }),
        strategy_area,
    );

    render_builder_field(app, frame, prompt_area, BuilderField::Prompt);
    render_builder_field(app, frame, test_input_area, BuilderField::TestInput);

    let output = if app.builder.is_executing() {
        Text::from(Span::styled(
            format!("Running{}", ellipsis(app)),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        match app.builder.test_output() {
            Some(text) => Text::from(text.lines().map(styled_line).collect::<Vec<_>>()),
            None => Text::from(Span::styled(
                "Press r to run the prompt",
                Style::default().fg(Color::DarkGray),
            )),
        }
    };
    let output_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Playground output ");
    frame.render_widget(
        Paragraph::new(output).block(output_block).wrap(Wrap { trim: true }),
        output_area,
    );
}

fn render_builder_field(app: &App, frame: &mut Frame, area: Rect, field: BuilderField) {
    let selected = app.builder_field == field;
    let editing = selected && app.input_mode == InputMode::Editing;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(selected, editing)))
        .title(format!(" {} ", field.label()));

    let body = match app.builder_value(field) {
        Some(value) if editing => Text::from(format!("{}_", value)),
        Some(value) => Text::from(value.to_string()),
        None => Text::from(Span::styled(
            "Generate a prompt first",
            Style::default().fg(Color::DarkGray),
        )),
    };

    frame.render_widget(Paragraph::new(body).block(block).wrap(Wrap { trim: false }), area);
}

fn render_refine_screen(app: &App, frame: &mut Frame, area: Rect) {
    let [input_area, output_area, status_area] = Layout::vertical([
        Constraint::Percentage(45),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);

    let editing = app.input_mode == InputMode::Editing;
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(true, editing)))
        .title(" Draft ");
    let draft = if editing {
        format!("{}_", app.refine_input)
    } else {
        app.refine_input.clone()
    };
    frame.render_widget(
        Paragraph::new(draft).block(input_block).wrap(Wrap { trim: false }),
        input_area,
    );

    let output = if app.refine_loading {
        Text::from(Span::styled(
            format!("Refining{}", ellipsis(app)),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Text::from(app.refine_output.clone().unwrap_or_default())
    };
    let output_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Refined ");
    frame.render_widget(
        Paragraph::new(output).block(output_block).wrap(Wrap { trim: true }),
        output_area,
    );

    if let Some(ms) = app.refine_elapsed_ms {
        let status = Paragraph::new(format!(" latency: {} ms ", ms)).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(status, status_area);
    }
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 6.min(area.height);
    let popup_area = Rect::new(
        area.width.saturating_sub(popup_width) / 2,
        area.height.saturating_sub(popup_height) / 2,
        popup_width,
        popup_height,
    );

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Gemini API Key ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Only the last four characters are shown
    let len = app.api_key_input.chars().count();
    let tail: String = app.api_key_input.chars().skip(len.saturating_sub(4)).collect();
    let masked = format!("{}{}", "*".repeat(len.saturating_sub(4).min(24)), tail);

    let lines = vec![
        Line::from(Span::styled(
            "Paste your key. Enter saves, Esc cancels.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
        Line::from(Span::styled(masked.clone(), Style::default().fg(Color::Cyan))),
        Line::from(Span::styled(
            format!("{} characters", len),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);

    if inner.height > 2 && inner.width > 0 {
        let cursor_x = (masked.chars().count() as u16).min(inner.width - 1);
        frame.set_cursor_position((inner.x + cursor_x, inner.y + 2));
    }
}
