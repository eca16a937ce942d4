//! Conversation history display component

use crate::api::types::Turn;
use crate::events::ConversationRole;
use crate::ui::conversation::markup;
use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget},
};
use std::cell::Cell;
use std::collections::VecDeque;

/// A single message in the conversation history
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationMessage {
    pub role: ConversationRole,
    pub content: String,
    /// Set for messages rendered in this session; transcripts reloaded from
    /// the server carry no time.
    pub timestamp: Option<DateTime<Local>>,
}

/// Conversation history display component
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: VecDeque<ConversationMessage>,
    max_messages: usize,
    typing: bool,
    typing_frame: usize,
    /// Lines scrolled up from the bottom
    scroll: usize,
    max_scroll: Cell<usize>,
    page: Cell<usize>,
}

impl ConversationHistory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            max_messages,
            typing: false,
            typing_frame: 0,
            scroll: 0,
            max_scroll: Cell::new(0),
            page: Cell::new(10),
        }
    }

    /// Add a new message to the history
    pub fn add_message(&mut self, message: ConversationMessage) {
        self.messages.push_back(message);

        if self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }

        self.scroll_to_bottom();
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(ConversationMessage {
            role: ConversationRole::User,
            content: content.into(),
            timestamp: Some(Local::now()),
        });
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.add_message(ConversationMessage {
            role: ConversationRole::Assistant,
            content: content.into(),
            timestamp: Some(Local::now()),
        });
    }

    /// Replace the whole transcript with the server's copy
    pub fn replace(&mut self, turns: &[Turn]) {
        self.messages = turns
            .iter()
            .map(|turn| ConversationMessage {
                role: turn.role,
                content: turn.content.clone(),
                timestamp: None,
            })
            .collect();
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
        self.scroll_to_bottom();
    }

    pub fn messages(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages.iter()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.back()
    }

    pub fn set_typing(&mut self, typing: bool) {
        self.typing = typing;
        self.typing_frame = 0;
        if typing {
            self.scroll_to_bottom();
        }
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Advance the typing animation
    pub fn tick(&mut self) {
        if self.typing {
            self.typing_frame = self.typing_frame.wrapping_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + self.page.get()).min(self.max_scroll.get());
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(self.page.get());
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    fn render_message(message: &ConversationMessage, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let (icon, color) = match message.role {
            ConversationRole::User => ("👤", Color::Blue),
            ConversationRole::Assistant => ("⚖", Color::Green),
            ConversationRole::System => ("⚙", Color::Yellow),
        };

        let mut header = vec![
            Span::styled(format!("{} ", icon), Style::default().fg(color)),
            Span::styled(
                message.role.display_name(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ];
        if let Some(timestamp) = message.timestamp {
            header.push(Span::styled(
                format!(" {}", timestamp.format("%H:%M")),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(header));

        let base = match message.role {
            ConversationRole::User => Style::default().fg(Color::Cyan),
            ConversationRole::Assistant => Style::default().fg(Color::White),
            ConversationRole::System => Style::default().fg(Color::Yellow),
        };
        for line in markup::render_wrapped(&message.content, base, width.saturating_sub(2) as usize) {
            let mut spans = vec![Span::raw("  ")];
            spans.extend(line.spans);
            lines.push(Line::from(spans));
        }

        lines
    }

    fn typing_line(&self) -> Line<'static> {
        let dots = ".".repeat(self.typing_frame % 3 + 1);
        Line::from(vec![
            Span::styled("⚖ ", Style::default().fg(Color::Green)),
            Span::styled(
                format!("{} печатает{}", ConversationRole::Assistant.display_name(), dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ])
    }
}

impl Widget for &ConversationHistory {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Жалоба ");

        let inner = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() && !self.typing {
            let welcome = [
                Line::from(Span::styled("Загрузка диалога...", Style::default().fg(Color::Green))),
                Line::default(),
                Line::from(Span::styled(
                    "/help - команды и клавиши",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            for (i, line) in welcome.iter().enumerate() {
                if i < inner.height as usize {
                    buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
                }
            }
            return;
        }

        let text_width = inner.width.saturating_sub(1);
        let mut all_lines: Vec<Line> = Vec::new();
        for message in &self.messages {
            all_lines.extend(ConversationHistory::render_message(message, text_width));
            all_lines.push(Line::default());
        }
        if self.typing {
            all_lines.push(self.typing_line());
        }

        let height = inner.height as usize;
        let total = all_lines.len();
        let max_scroll = total.saturating_sub(height);
        self.max_scroll.set(max_scroll);
        self.page.set(height.saturating_sub(2).max(1));

        let scroll = self.scroll.min(max_scroll);
        let start = max_scroll - scroll;
        for (i, line) in all_lines.iter().skip(start).take(height).enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, line, text_width);
        }

        if max_scroll > 0 {
            let mut state = ScrollbarState::new(max_scroll).position(start);
            Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .render(inner, buf, &mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: ConversationRole, content: &str) -> Turn {
        Turn {
            role,
            content: content.to_string(),
            input_type: None,
            options: None,
        }
    }

    #[test]
    fn test_replace_is_idempotent() {
        let turns = vec![
            turn(ConversationRole::Assistant, "Что случилось?"),
            turn(ConversationRole::User, "ЖКХ"),
        ];
        let mut history = ConversationHistory::new(100);
        history.add_user_message("stale");
        history.replace(&turns);
        let first: Vec<_> = history.messages().cloned().collect();
        history.replace(&turns);
        let second: Vec<_> = history.messages().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|m| m.timestamp.is_none()));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = ConversationHistory::new(3);
        for i in 0..5 {
            history.add_assistant_message(format!("m{}", i));
        }
        assert_eq!(history.message_count(), 3);
        assert_eq!(history.messages().next().unwrap().content, "m2");
    }

    #[test]
    fn test_render_shows_latest_lines_and_typing() {
        let mut history = ConversationHistory::new(100);
        for i in 0..20 {
            history.add_assistant_message(format!("сообщение {}", i));
        }
        history.set_typing(true);

        let area = Rect::new(0, 0, 40, 8);
        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);

        let rows: Vec<String> = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf.get(x, y).symbol().to_string()).collect())
            .collect();
        let screen = rows.join("\n");
        assert!(screen.contains("печатает"));
        assert!(!screen.contains("сообщение 0"));
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut history = ConversationHistory::new(100);
        for i in 0..20 {
            history.add_user_message(format!("m{}", i));
        }
        let area = Rect::new(0, 0, 30, 10);
        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);

        for _ in 0..100 {
            history.scroll_up();
        }
        assert_eq!(history.scroll, history.max_scroll.get());
        history.scroll_down();
        assert!(history.scroll < history.max_scroll.get());
    }
}
