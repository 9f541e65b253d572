use pharmagpt_core::{sanitize, Relevance, Role, SearchResult};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode, Tab};
use crate::markdown;

const DISCLAIMER: &str = "⚠ Disclaimer: for educational and informational purposes only. \
Not a substitute for professional medical advice. Always consult a qualified healthcare provider.";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, disclaimer, footer
    let [header_area, body_area, disclaimer_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.tab {
        Tab::Search => render_search_tab(app, frame, body_area),
        Tab::Chat => render_chat_tab(app, frame, body_area),
    }

    let disclaimer = Paragraph::new(Span::styled(DISCLAIMER, Style::default().fg(Color::DarkGray)));
    frame.render_widget(disclaimer, disclaimer_area);

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(" 💊 PharmaGPT ", Style::default().fg(Color::Cyan).bold())];

    for (i, tab) in [Tab::Search, Tab::Chat].iter().enumerate() {
        let label = format!(" [{}] {} ", i + 1, tab.title());
        let style = if *tab == app.tab {
            Style::default().fg(Color::Black).bg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(label, style));
    }

    spans.push(Span::styled(
        format!("  {}  v{}", app.base_url(), env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().fg(Color::Black).bg(Color::Blue)),
        InputMode::Editing => (" EDITING ", Style::default().fg(Color::Black).bg(Color::Yellow)),
    };

    let hints = match (app.input_mode, app.tab) {
        (InputMode::Editing, Tab::Search) => " Enter: search  Esc: stop editing  Tab: switch panel",
        (InputMode::Editing, Tab::Chat) => " Enter: send  Esc: stop editing  Tab: switch panel",
        (InputMode::Normal, Tab::Search) => " i: edit  j/k: select medicine  1/2/Tab: panels  q: quit",
        (InputMode::Normal, Tab::Chat) => " i: edit  j/k PgUp/PgDn: scroll  G: newest  1/2/Tab: panels  q: quit",
    };

    let footer = Line::from(vec![
        Span::styled(mode, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

/// Single-line input box with horizontal scrolling to keep the cursor visible
fn render_input(
    frame: &mut Frame,
    area: Rect,
    text: &str,
    cursor: usize,
    title: &str,
    editing: bool,
) {
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title));

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor = cursor.min(text.chars().count());
    let scroll_offset = if inner_width == 0 || cursor < inner_width {
        0
    } else {
        cursor - inner_width + 1
    };

    let visible_text: String = text.chars().skip(scroll_offset).take(inner_width).collect();
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    let banner = Paragraph::new(Line::from(vec![
        Span::styled("⚠ ", Style::default().fg(Color::Red).bold()),
        Span::styled(message.to_string(), Style::default().fg(Color::Red)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    )
    .wrap(Wrap { trim: true });
    frame.render_widget(banner, area);
}

fn render_empty_state(frame: &mut Frame, area: Rect, icon: &str, title: &str, body: &str) {
    let text = Text::from(vec![
        Line::default(),
        Line::from(icon.to_string()).centered(),
        Line::from(Span::styled(title.to_string(), Style::default().bold())).centered(),
        Line::from(Span::styled(body.to_string(), Style::default().fg(Color::DarkGray))).centered(),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn relevance_color(relevance: Relevance) -> Color {
    match relevance {
        Relevance::High => Color::Green,
        Relevance::Medium => Color::Yellow,
        Relevance::Low => Color::Gray,
    }
}

fn relevance_badge(score: f64) -> Span<'static> {
    let relevance = Relevance::from_score(score);
    Span::styled(
        format!(" {} ", relevance.label()),
        Style::default()
            .fg(Color::Black)
            .bg(relevance_color(relevance))
            .add_modifier(Modifier::BOLD),
    )
}

fn render_search_tab(app: &mut App, frame: &mut Frame, area: Rect) {
    let error = app.search.error_message().map(str::to_string);
    let error_height = if error.is_some() { 3 } else { 0 };

    let [input_area, error_area, results_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(error_height),
        Constraint::Min(0),
    ])
    .areas(area);

    let title = if app.search.is_loading() {
        "Searching..."
    } else {
        "Describe your symptoms or condition, e.g. 'headache and fever'"
    };
    render_input(
        frame,
        input_area,
        app.search.query(),
        app.search_cursor,
        title,
        app.input_mode == InputMode::Editing,
    );

    if let Some(message) = &error {
        render_error(frame, error_area, message);
    }

    if app.search.is_loading() {
        let dots = ".".repeat(app.animation_frame as usize + 1);
        let waiting = Paragraph::new(Span::styled(
            format!("Searching{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
        frame.render_widget(waiting, results_area);
        return;
    }

    if app.search.results().is_empty() {
        if error.is_none() {
            render_empty_state(
                frame,
                results_area,
                "🔎",
                "Search for Medicines",
                "Enter symptoms or conditions to find matching medicines.",
            );
        }
        return;
    }

    // Results: list on left, medicine card on right
    let [list_area, card_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(results_area);

    let items: Vec<ListItem> = app
        .search
        .results()
        .iter()
        .map(|medicine| {
            ListItem::new(Line::from(vec![
                Span::raw(format!(" {} ", medicine.name)),
                relevance_badge(medicine.relevance_score),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" Results ({}) ", app.search.results().len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut app.search_state);

    let selected = app
        .search_state
        .selected()
        .and_then(|i| app.search.results().get(i));
    let card = match selected {
        Some(medicine) => medicine_card(medicine),
        None => Text::from("Select a medicine to see its details"),
    };
    let card = Paragraph::new(card)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Medicine "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(card, card_area);
}

fn medicine_card(medicine: &SearchResult) -> Text<'static> {
    let label = |text: &str| {
        Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
    };

    Text::from(vec![
        Line::from(vec![
            Span::styled(medicine.name.clone(), Style::default().fg(Color::Yellow).bold()),
            Span::raw("  "),
            relevance_badge(medicine.relevance_score),
        ]),
        Line::default(),
        label("Benefits"),
        Line::from(medicine.benefits.clone()),
        Line::default(),
        label("Side Effects"),
        Line::from(medicine.side_effects.clone()),
        Line::default(),
        label("Safety Advice"),
        Line::from(medicine.safety_advice.clone()),
    ])
}

/// Every line of the chat transcript, before wrapping
pub fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.chat.history() {
        match msg.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    format!("{}:", msg.role.display_name()),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                // User text is shown exactly as typed
                lines.extend(msg.content.lines().map(|l| Line::from(l.to_string())));
            }
            Role::Assistant => {
                lines.push(Line::from(Span::styled(
                    format!("{}:", msg.role.display_name()),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(markdown::render(&sanitize(&msg.content)));

                if !msg.sources.is_empty() {
                    let mut spans = vec![Span::styled(
                        "Sources: ",
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
                    )];
                    for (i, source) in msg.sources.iter().enumerate() {
                        if i > 0 {
                            spans.push(Span::raw(" "));
                        }
                        spans.push(Span::styled(
                            format!("[{}]", source.label(i)),
                            Style::default().fg(Color::Magenta),
                        ));
                    }
                    lines.push(Line::from(spans));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_loading() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("PharmaGPT is thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Rows the transcript occupies once word-wrapped to `width` columns,
/// measured by the same wrapper that draws it
pub fn wrapped_height(transcript: &Paragraph, width: u16) -> u16 {
    let rows = transcript.line_count(width.max(1));
    rows.min(u16::MAX as usize) as u16
}

fn render_chat_tab(app: &mut App, frame: &mut Frame, area: Rect) {
    let error = app.chat.error_message().map(str::to_string);
    let error_height = if error.is_some() { 3 } else { 0 };

    let [chat_area, error_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(error_height),
        Constraint::Length(3),
    ])
    .areas(area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat with PharmaGPT ");

    if app.chat.history().is_empty() && !app.chat.is_loading() {
        render_empty_state(
            frame,
            chat_area,
            "🩺",
            "Start a Conversation",
            "Ask PharmaGPT about medicines, dosages, or interactions.",
        );
    } else {
        let chat = Paragraph::new(Text::from(transcript_lines(app))).wrap(Wrap { trim: false });
        let inner_height = chat_area.height.saturating_sub(2);
        let inner_width = chat_area.width.saturating_sub(2);
        app.update_chat_metrics(wrapped_height(&chat, inner_width), inner_height, inner_width);

        let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
        frame.render_widget(chat, chat_area);
    }

    if let Some(message) = &error {
        render_error(frame, error_area, message);
    }

    let title = if app.chat.is_loading() {
        "Sending..."
    } else {
        "Ask about a medicine, side effect, or interaction..."
    };
    render_input(
        frame,
        input_area,
        app.chat.draft(),
        app.chat_cursor,
        title,
        app.input_mode == InputMode::Editing,
    );
}
