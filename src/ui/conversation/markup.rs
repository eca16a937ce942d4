//! Lightweight message markup: `**bold**`, `_italic_`, `` `code` ``,
//! fenced code blocks and `[label](url)` links.

use once_cell::sync::Lazy;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use regex::Regex;

static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(.+?)```").expect("fence pattern"));

static INLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*(?P<bold>.+?)\*\*|`(?P<code>[^`]+)`|\[(?P<label>[^\]]+)\]\((?P<url>[^)]+)\)|_(?P<italic>.+?)_")
        .expect("inline pattern")
});

fn code_style() -> Style {
    Style::default().fg(Color::Yellow).bg(Color::Black)
}

/// Turn message content into styled lines, one per source line.
pub fn render(content: &str, base: Style) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut last = 0;

    for fence in FENCE.captures_iter(content) {
        let (Some(whole), Some(body)) = (fence.get(0), fence.get(1)) else {
            continue;
        };
        push_prose(&mut lines, &content[last..whole.start()], base);
        for code_line in body.as_str().trim_matches('\n').split('\n') {
            lines.push(Line::from(Span::styled(format!("  {}", code_line), code_style())));
        }
        last = whole.end();
    }
    push_prose(&mut lines, &content[last..], base);

    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

fn push_prose(lines: &mut Vec<Line<'static>>, text: &str, base: Style) {
    if text.is_empty() {
        return;
    }
    for source_line in text.split('\n') {
        lines.push(Line::from(inline_spans(source_line, base)));
    }
}

fn inline_spans(text: &str, base: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in INLINE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::styled(text[last..whole.start()].to_string(), base));
        }

        if let Some(bold) = caps.name("bold") {
            spans.push(Span::styled(bold.as_str().to_string(), base.add_modifier(Modifier::BOLD)));
        } else if let Some(code) = caps.name("code") {
            spans.push(Span::styled(code.as_str().to_string(), code_style()));
        } else if let (Some(label), Some(url)) = (caps.name("label"), caps.name("url")) {
            spans.push(Span::styled(
                label.as_str().to_string(),
                base.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
            ));
            spans.push(Span::styled(
                format!(" ({})", url.as_str()),
                Style::default().fg(Color::DarkGray),
            ));
        } else if let Some(italic) = caps.name("italic") {
            spans.push(Span::styled(italic.as_str().to_string(), base.add_modifier(Modifier::ITALIC)));
        }
        last = whole.end();
    }

    if last < text.len() {
        spans.push(Span::styled(text[last..].to_string(), base));
    }
    spans
}

/// Word-wrap a styled line to `width` columns, keeping span styles.
pub fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line.clone()];
    }

    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;

    for span in &line.spans {
        for piece in span.content.split_inclusive(' ') {
            let word_width = piece.trim_end_matches(' ').chars().count();
            if current_width > 0 && current_width + word_width > width {
                lines.push(Line::from(std::mem::take(&mut current)));
                current_width = 0;
            }

            let mut piece = piece.to_string();
            while current_width == 0 && piece.chars().count() > width {
                let head: String = piece.chars().take(width).collect();
                piece = piece.chars().skip(width).collect();
                lines.push(Line::from(Span::styled(head, span.style)));
            }

            if !piece.is_empty() {
                current_width += piece.chars().count();
                current.push(Span::styled(piece, span.style));
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}

/// Render and wrap in one step.
pub fn render_wrapped(content: &str, base: Style, width: usize) -> Vec<Line<'static>> {
    render(content, base)
        .iter()
        .flat_map(|line| wrap_line(line, width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_bold_and_italic() {
        let lines = render("Это **важно** и _срочно_", Style::default());
        assert_eq!(lines.len(), 1);
        let spans = &lines[0].spans;
        assert_eq!(spans[1].content, "важно");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[3].content, "срочно");
        assert!(spans[3].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_link_shows_label_and_url() {
        let lines = render("См. [портал](https://www.gosuslugi.ru)", Style::default());
        assert_eq!(text_of(&lines[0]), "См. портал (https://www.gosuslugi.ru)");
    }

    #[test]
    fn test_code_fence_spans_lines() {
        let lines = render("Шаблон:\n```\nстрока 1\nстрока 2\n```\nконец", Style::default());
        let texts: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(texts, vec!["Шаблон:", "", "  строка 1", "  строка 2", "", "конец"]);
    }

    #[test]
    fn test_newlines_are_preserved() {
        let lines = render("a\n\nb", Style::default());
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_wrap_keeps_styles_and_width() {
        let line = Line::from(vec![
            Span::raw("Опишите "),
            Span::styled("подробно", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" что произошло"),
        ]);
        let wrapped = wrap_line(&line, 10);
        assert!(wrapped.iter().all(|l| text_of(l).trim_end().chars().count() <= 10));
        let bold = wrapped
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content == "подробно")
            .unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let wrapped = wrap_line(&Line::from("абвгдежзик"), 4);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["абвг", "дежз", "ик"]);
    }
}
