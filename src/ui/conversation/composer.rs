use crate::ui::conversation::commands::{command_entries, parse_slash_command, CommandEntry, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        block::{Position, Title},
        Block, Borders, Clear, Widget,
    },
};

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    /// Enter on non-empty text. The text stays in the composer; the owner
    /// clears it once the message is actually sent.
    Submitted(String),
    Command(ParsedCommand),
    /// The text content changed
    Changed,
    /// Key consumed without changing the text
    Consumed,
    /// Key not handled here
    Ignored,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Cursor position in characters
    pub cursor: usize,
}

impl TextAreaState {
    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Free-text input with a slash-command palette
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    state: TextAreaState,
    placeholder: String,
    has_focus: bool,
    send_enabled: bool,
    blocked_hint: Option<String>,
    max_len: usize,
    count_threshold: usize,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    show_command_palette: bool,
    selected_command: Option<usize>,
}

impl ConversationComposer {
    pub fn new(max_len: usize, count_threshold: usize) -> Self {
        Self {
            state: TextAreaState::default(),
            placeholder: String::new(),
            has_focus: true,
            send_enabled: false,
            blocked_hint: None,
            max_len,
            count_threshold,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            show_command_palette: false,
            selected_command: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::Ignored;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                    return self.insert_str("\n");
                }
                if self.show_command_palette && self.apply_selected_command() {
                    return ComposerResult::Changed;
                }
                let content = self.state.content.trim().to_string();
                if content.is_empty() {
                    return ComposerResult::Consumed;
                }
                if let Some(command) = parse_slash_command(&content) {
                    self.clear();
                    return ComposerResult::Command(command);
                }
                ComposerResult::Submitted(content)
            }
            KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_str("\n")
            }
            KeyCode::Up if self.show_command_palette => {
                self.move_command_selection(-1);
                ComposerResult::Consumed
            }
            KeyCode::Down if self.show_command_palette => {
                self.move_command_selection(1);
                ComposerResult::Consumed
            }
            KeyCode::Esc if self.show_command_palette => {
                self.close_command_palette();
                ComposerResult::Consumed
            }
            KeyCode::Tab if self.show_command_palette => {
                if self.apply_selected_command() {
                    ComposerResult::Changed
                } else {
                    ComposerResult::Consumed
                }
            }
            KeyCode::Char(c)
                if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let mut buf = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut buf))
            }
            KeyCode::Backspace => {
                if self.state.cursor == 0 {
                    return ComposerResult::Consumed;
                }
                self.state.cursor -= 1;
                let at = self.state.byte_index(self.state.cursor);
                self.state.content.remove(at);
                self.after_edit();
                ComposerResult::Changed
            }
            KeyCode::Delete => {
                if self.state.cursor >= self.state.char_len() {
                    return ComposerResult::Consumed;
                }
                let at = self.state.byte_index(self.state.cursor);
                self.state.content.remove(at);
                self.after_edit();
                ComposerResult::Changed
            }
            KeyCode::Left => {
                self.state.cursor = self.state.cursor.saturating_sub(1);
                ComposerResult::Consumed
            }
            KeyCode::Right => {
                self.state.cursor = (self.state.cursor + 1).min(self.state.char_len());
                ComposerResult::Consumed
            }
            KeyCode::Home => {
                self.state.cursor = 0;
                ComposerResult::Consumed
            }
            KeyCode::End => {
                self.state.cursor = self.state.char_len();
                ComposerResult::Consumed
            }
            _ => ComposerResult::Ignored,
        }
    }

    /// Insert text at the cursor, truncated to the length limit
    pub fn insert_str(&mut self, text: &str) -> ComposerResult {
        let room = self.max_len.saturating_sub(self.state.char_len());
        let text: String = text.chars().filter(|c| *c != '\r').take(room).collect();
        if text.is_empty() {
            return ComposerResult::Consumed;
        }
        let at = self.state.byte_index(self.state.cursor);
        self.state.content.insert_str(at, &text);
        self.state.cursor += text.chars().count();
        self.after_edit();
        ComposerResult::Changed
    }

    fn after_edit(&mut self) {
        if self.state.content.starts_with('/') && !self.state.content.contains(char::is_whitespace) {
            if !self.show_command_palette {
                self.open_command_palette();
            } else {
                self.refresh_command_palette();
            }
        } else if self.show_command_palette {
            self.close_command_palette();
        }
    }

    fn open_command_palette(&mut self) {
        self.show_command_palette = true;
        self.selected_command = Some(0);
        self.refresh_command_palette();
    }

    fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn refresh_command_palette(&mut self) {
        let query = self.state.content.trim_start_matches('/').to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
            .copied()
            .collect();

        self.selected_command = if self.filtered_commands.is_empty() {
            None
        } else {
            let index = self.selected_command.unwrap_or(0);
            Some(index.min(self.filtered_commands.len() - 1))
        };
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let current = self.selected_command.unwrap_or(0) as isize;
        let len = self.filtered_commands.len() as isize;
        self.selected_command = Some((current + delta).rem_euclid(len) as usize);
    }

    fn apply_selected_command(&mut self) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index))
            .copied()
        else {
            return false;
        };

        self.state.content = format!("/{} ", entry.keyword);
        self.state.cursor = self.state.char_len();
        self.close_command_palette();
        true
    }

    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    /// Mirror of the send affordance state, with an optional reason it is blocked
    pub fn set_send_state(&mut self, send_enabled: bool, blocked_hint: Option<String>) {
        self.send_enabled = send_enabled;
        self.blocked_hint = blocked_hint;
    }

    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Replace the content and move the cursor to the end
    pub fn set_text(&mut self, text: &str) {
        self.state.content = text.chars().take(self.max_len).collect();
        self.state.cursor = self.state.char_len();
        self.close_command_palette();
    }

    pub fn content(&self) -> &str {
        &self.state.content
    }

    pub fn palette_open(&self) -> bool {
        self.show_command_palette
    }

    pub fn clear(&mut self) {
        self.state = TextAreaState::default();
        self.close_command_palette();
    }

    /// `N / max` once the text is long enough to be worth counting
    pub fn char_counter(&self) -> Option<String> {
        let count = self.state.char_len();
        (count > self.count_threshold).then(|| format!("{} / {}", count, self.max_len))
    }

    /// Height the composer wants, borders included
    pub fn desired_height(&self) -> u16 {
        let lines = self.state.content.split('\n').count().clamp(1, 6) as u16;
        lines + 2
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.has_focus {
            Color::Green
        } else {
            Color::Gray
        };

        let send_hint = if self.send_enabled {
            Span::styled(" Enter ⏎ отправить ", Style::default().fg(Color::Green))
        } else if let Some(hint) = &self.blocked_hint {
            Span::styled(format!(" {} ", hint), Style::default().fg(Color::Yellow))
        } else {
            Span::styled(" Enter ⏎ отправить ", Style::default().fg(Color::DarkGray))
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Title::from(send_hint).alignment(Alignment::Right));
        if let Some(counter) = self.char_counter() {
            block = block.title(
                Title::from(format!(" {} ", counter))
                    .position(Position::Bottom)
                    .alignment(Alignment::Right),
            );
        }

        let inner = block.inner(area);
        block.render(area, buf);

        if self.state.content.is_empty() {
            let placeholder = Line::from(Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(inner.x, inner.y, &placeholder, inner.width);
        } else {
            let mut content = self.state.content.clone();
            if self.has_focus {
                content.insert(self.state.byte_index(self.state.cursor), '▌');
            }

            let lines: Vec<&str> = content.split('\n').collect();
            let skip = lines.len().saturating_sub(inner.height as usize);
            for (i, line_text) in lines.iter().skip(skip).enumerate() {
                let line = Line::from(Span::raw(*line_text));
                buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
            }
        }

        if self.show_command_palette && !self.filtered_commands.is_empty() {
            let palette_height = (self.filtered_commands.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height.min(area.y),
            };
            if palette_area.height < 3 {
                return;
            }

            Clear.render(palette_area, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Команды")
                .border_style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            for (index, entry) in self.filtered_commands.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let style = if self.selected_command == Some(index) {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);
                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}
