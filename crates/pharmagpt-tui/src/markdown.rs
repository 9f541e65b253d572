//! Minimal markdown-to-terminal rendering for assistant answers.
//!
//! Handles what the service actually emits: headings, bullet and numbered
//! lists, `**bold**`, and `![alt](url)` images (shown as a link line since a
//! terminal cannot draw them). Everything else is passed through as text.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Render a full answer into display lines
pub fn render(text: &str) -> Vec<Line<'static>> {
    text.lines().map(render_line).collect()
}

fn render_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();

    if let Some((level, heading)) = heading(trimmed) {
        let style = if level <= 2 {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        return Line::from(Span::styled(heading.to_string(), style));
    }

    if let Some(item) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| trimmed.strip_prefix("+ "))
    {
        let mut spans = vec![Span::styled("  • ", Style::default().fg(Color::Yellow))];
        spans.extend(inline(item));
        return Line::from(spans);
    }

    Line::from(inline(line))
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    line[level..].strip_prefix(' ').map(|rest| (level, rest.trim()))
}

/// Parse `**bold**` and `![alt](url)` within a line
fn inline(text: &str) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_text = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**") {
                if end > 0 {
                    flush(&mut spans, &mut current_text);
                    spans.push(Span::styled(
                        after[..end].to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ));
                    rest = &after[end + 2..];
                    continue;
                }
            }
            // No closing **, treat as literal
            current_text.push_str("**");
            rest = after;
            continue;
        }

        if let Some((alt, url, remaining)) = image(rest) {
            flush(&mut spans, &mut current_text);
            let label = if alt.is_empty() {
                "[image] ".to_string()
            } else {
                format!("[image: {alt}] ")
            };
            spans.push(Span::styled(label, Style::default().fg(Color::Magenta)));
            spans.push(Span::styled(
                url.to_string(),
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED),
            ));
            rest = remaining;
            continue;
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            current_text.push(c);
        }
        rest = chars.as_str();
    }

    flush(&mut spans, &mut current_text);
    spans
}

/// `![alt](url)` at the start of `text` -> (alt, url, remainder)
fn image(text: &str) -> Option<(&str, &str, &str)> {
    let after_bang = text.strip_prefix("![")?;
    let alt_end = after_bang.find("](")?;
    let alt = &after_bang[..alt_end];
    let after_alt = &after_bang[alt_end + 2..];
    let url_end = after_alt.find(')')?;
    Some((alt, &after_alt[..url_end], &after_alt[url_end + 1..]))
}

fn flush(spans: &mut Vec<Span<'static>>, current_text: &mut String) {
    if !current_text.is_empty() {
        spans.push(Span::raw(std::mem::take(current_text)));
    }
}
