//! Transient notices stacked in the top-right corner.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};
use std::collections::VecDeque;
use tokio::time::{Duration, Instant};

use crate::error::ApiError;

const MAX_VISIBLE: usize = 4;
const MAX_WIDTH: u16 = 48;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
    Info,
}

/// Rejections are warnings; every other API failure is an error.
impl From<&ApiError> for NoticeLevel {
    fn from(error: &ApiError) -> Self {
        match error {
            ApiError::Rejected(_) => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        }
    }
}

impl NoticeLevel {
    fn color(self) -> Color {
        match self {
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Error => Color::Red,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Info => Color::Blue,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            NoticeLevel::Success => "✔",
            NoticeLevel::Error => "✖",
            NoticeLevel::Warning => "⚠",
            NoticeLevel::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    created_at: Instant,
}

/// Notice stack with a fixed time to live.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    notices: VecDeque<Notice>,
    ttl: Duration,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            notices: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(?level, %message, "Notice");
        self.notices.push_back(Notice {
            level,
            message,
            created_at: Instant::now(),
        });
        while self.notices.len() > MAX_VISIBLE {
            self.notices.pop_front();
        }
    }

    /// Drop expired notices. Returns true if anything was removed.
    pub fn prune(&mut self) -> bool {
        let before = self.notices.len();
        let ttl = self.ttl;
        self.notices.retain(|notice| notice.created_at.elapsed() < ttl);
        before != self.notices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Widget for &NoticeBoard {
    /// `area` is the whole frame; notices are anchored to its top-right corner.
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = MAX_WIDTH.min(area.width);
        let mut y = area.y;

        for notice in self.notices.iter().rev() {
            if y + 3 > area.y + area.height {
                break;
            }
            let rect = Rect {
                x: area.x + area.width - width,
                y,
                width,
                height: 3,
            };
            let color = notice.level.color();
            Clear.render(rect, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color));
            let inner = block.inner(rect);
            block.render(rect, buf);

            let line = Line::from(vec![
                Span::styled(
                    format!("{} ", notice.level.icon()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(notice.message.as_str()),
            ]);
            buf.set_line(inner.x, inner.y, &line, inner.width);
            y += 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_levels() {
        let rejected = ApiError::Rejected("Невозможно вернуться назад".into());
        assert_eq!(NoticeLevel::from(&rejected), NoticeLevel::Warning);
        assert_eq!(NoticeLevel::from(&ApiError::RateLimited), NoticeLevel::Error);
        assert_eq!(NoticeLevel::from(&ApiError::Server("Ошибка".into())), NoticeLevel::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notices_expire_after_ttl() {
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        board.push(NoticeLevel::Success, "Диалог начат заново");
        assert!(!board.prune());
        assert_eq!(board.latest().unwrap().message, "Диалог начат заново");

        tokio::time::advance(Duration::from_millis(2_900)).await;
        board.push(NoticeLevel::Error, "Ошибка сервера");
        tokio::time::advance(Duration::from_millis(200)).await;

        assert!(board.prune());
        let remaining: Vec<_> = board.iter().map(|n| n.level).collect();
        assert_eq!(remaining, vec![NoticeLevel::Error]);
    }

    #[test]
    fn test_stack_is_bounded() {
        let mut board = NoticeBoard::new(Duration::from_secs(3));
        for i in 0..10 {
            board.push(NoticeLevel::Info, format!("notice {}", i));
        }
        assert_eq!(board.iter().count(), MAX_VISIBLE);
        assert_eq!(board.iter().next().unwrap().message, "notice 6");
    }
}
