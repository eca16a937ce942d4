//! Single-choice list and multi-select checklist affordances.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::api::types::ChoiceOption;
use crate::ui::conversation::input_area::Submission;
use crate::ui::hit;

/// Icon by keyword in the option label; first match wins.
const OPTION_ICONS: [(&str, &str); 7] = [
    ("жкх", "🏢"),
    ("работодатель", "💼"),
    ("магазин", "🏪"),
    ("госорган", "🏛"),
    ("банк", "🏦"),
    ("соседи", "👥"),
    ("другое", "…"),
];
const DEFAULT_ICON: &str = "→";

/// Multi-select options with this id are never listed.
pub const CUSTOM_OPTION_ID: &str = "custom";

pub fn option_icon(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    OPTION_ICONS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

/// What a panel did with a key or click.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    Ignored,
    Consumed,
    Submit(Submission),
}

fn digit_index(key: &KeyEvent) -> Option<usize> {
    match key.code {
        KeyCode::Char(c @ '1'..='9') => c.to_digit(10).map(|d| d as usize - 1),
        _ => None,
    }
}

/// Buttons for a single-choice turn. Each carries the option id as payload
/// and the option text as label.
#[derive(Debug, Clone)]
pub struct ChoiceList {
    options: Vec<ChoiceOption>,
    cursor: usize,
    rows: RefCell<Vec<(Rect, usize)>>,
}

impl ChoiceList {
    pub fn new(options: Vec<ChoiceOption>) -> Self {
        Self {
            options,
            cursor: 0,
            rows: RefCell::new(Vec::new()),
        }
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn submission(&self, index: usize) -> Option<Submission> {
        self.options
            .get(index)
            .map(|option| Submission::new(option.id.clone(), option.text.clone()))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PanelAction {
        if let Some(index) = digit_index(&key) {
            return match self.submission(index) {
                Some(submission) => PanelAction::Submit(submission),
                None => PanelAction::Consumed,
            };
        }

        match key.code {
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                PanelAction::Consumed
            }
            KeyCode::Down => {
                self.cursor = (self.cursor + 1).min(self.options.len().saturating_sub(1));
                PanelAction::Consumed
            }
            KeyCode::Enter => match self.submission(self.cursor) {
                Some(submission) => PanelAction::Submit(submission),
                None => PanelAction::Consumed,
            },
            _ => PanelAction::Ignored,
        }
    }

    pub fn click(&mut self, column: u16, row: u16) -> PanelAction {
        let target = self
            .rows
            .borrow()
            .iter()
            .find(|(area, _)| hit(*area, column, row))
            .map(|(_, index)| *index);
        match target {
            Some(index) => {
                self.cursor = index;
                self.submission(index)
                    .map(PanelAction::Submit)
                    .unwrap_or(PanelAction::Consumed)
            }
            None => PanelAction::Ignored,
        }
    }

    pub fn desired_height(&self) -> u16 {
        (self.options.len().min(9) + 2) as u16
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, focused: bool) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
            .title(" Выберите вариант (1-9, Enter) · Tab - свой ответ ");
        let inner = block.inner(area);
        block.render(area, buf);

        let visible = inner.height as usize;
        let offset = (self.cursor + 1).saturating_sub(visible);
        let mut rows = self.rows.borrow_mut();
        rows.clear();

        for (row, (index, option)) in self
            .options
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .enumerate()
        {
            let selected = focused && index == self.cursor;
            let style = if selected {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let number = if index < 9 { format!("{} ", index + 1) } else { "  ".to_string() };
            let line = Line::from(vec![
                Span::styled(number, Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{} ", option_icon(&option.text)), Style::default().fg(Color::Cyan)),
                Span::styled(option.text.clone(), style),
            ]);
            let rect = Rect::new(inner.x, inner.y + row as u16, inner.width, 1);
            buf.set_line(rect.x, rect.y, &line, rect.width);
            rows.push((rect, index));
        }
    }
}

/// Ids chosen in one checklist. Never outlives the turn it was created for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    /// Flip membership; returns whether `id` is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChecklistRow {
    Option(usize),
    Submit,
}

/// Checklist for a multi-select turn.
#[derive(Debug, Clone)]
pub struct Checklist {
    options: Vec<ChoiceOption>,
    selection: SelectionSet,
    /// `options.len()` is the submit row
    cursor: usize,
    scroll: Cell<usize>,
    rows: RefCell<Vec<(Rect, ChecklistRow)>>,
}

impl Checklist {
    pub fn new(options: Vec<ChoiceOption>) -> Self {
        Self {
            options,
            selection: SelectionSet::default(),
            cursor: 0,
            scroll: Cell::new(0),
            rows: RefCell::new(Vec::new()),
        }
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn toggle(&mut self, index: usize) -> bool {
        match self.options.get(index) {
            Some(option) => {
                let id = option.id.clone();
                self.selection.toggle(&id)
            }
            None => false,
        }
    }

    pub fn submit_enabled(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn submit_label(&self) -> String {
        if self.selection.is_empty() {
            "Продолжить".to_string()
        } else {
            format!("Продолжить ({})", self.selection.len())
        }
    }

    /// Selected ids joined with `,` and their labels joined with `, `, both
    /// in option order.
    pub fn submission(&self) -> Option<Submission> {
        if self.selection.is_empty() {
            return None;
        }
        let chosen: Vec<&ChoiceOption> = self
            .options
            .iter()
            .filter(|option| self.selection.contains(&option.id))
            .collect();
        let payload = chosen.iter().map(|o| o.id.as_str()).collect::<Vec<_>>().join(",");
        let display = chosen.iter().map(|o| o.text.as_str()).collect::<Vec<_>>().join(", ");
        Some(Submission::new(payload, display))
    }

    fn submit(&self) -> PanelAction {
        self.submission()
            .map(PanelAction::Submit)
            .unwrap_or(PanelAction::Consumed)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PanelAction {
        if let Some(index) = digit_index(&key) {
            if index < self.options.len() {
                self.cursor = index;
                self.toggle(index);
            }
            return PanelAction::Consumed;
        }

        match key.code {
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                PanelAction::Consumed
            }
            KeyCode::Down => {
                self.cursor = (self.cursor + 1).min(self.options.len());
                PanelAction::Consumed
            }
            KeyCode::Char(' ') => {
                if self.cursor < self.options.len() {
                    self.toggle(self.cursor);
                }
                PanelAction::Consumed
            }
            KeyCode::Enter => {
                if self.cursor < self.options.len() && !self.submit_enabled() {
                    self.toggle(self.cursor);
                    return PanelAction::Consumed;
                }
                self.submit()
            }
            _ => PanelAction::Ignored,
        }
    }

    pub fn click(&mut self, column: u16, row: u16) -> PanelAction {
        let target = self
            .rows
            .borrow()
            .iter()
            .find(|(area, _)| hit(*area, column, row))
            .map(|(_, target)| *target);
        match target {
            Some(ChecklistRow::Option(index)) => {
                self.cursor = index;
                self.toggle(index);
                PanelAction::Consumed
            }
            Some(ChecklistRow::Submit) => self.submit(),
            None => PanelAction::Ignored,
        }
    }

    pub fn desired_height(&self) -> u16 {
        let lines: usize = self.options.iter().map(|o| 2 + usize::from(o.summary().is_some())).sum();
        (lines + 5).min(22) as u16
    }

    fn option_lines(&self, index: usize, option: &ChoiceOption, expanded: bool) -> Vec<Line<'static>> {
        let checked = self.selection.contains(&option.id);
        let focused = index == self.cursor;
        let mut title = vec![
            Span::styled(
                if checked { "[x] " } else { "[ ] " },
                Style::default().fg(if checked { Color::Green } else { Color::Gray }),
            ),
            Span::styled(
                option.text.clone(),
                if focused {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                },
            ),
        ];
        if let Some(level) = option.level.as_deref().filter(|l| !l.is_empty()) {
            let (icon, color) = level_badge(level);
            title.push(Span::styled(format!("  {} {}", icon, level), Style::default().fg(color)));
        }
        if let Some(effectiveness) = option.effectiveness.as_deref() {
            let (label, color) = effectiveness_badge(effectiveness);
            title.push(Span::styled(format!("  {}", label), Style::default().fg(color)));
        }

        let detail = |text: String| Line::from(Span::styled(format!("    {}", text), Style::default().fg(Color::Gray)));
        let mut lines = vec![Line::from(title)];
        if let Some(summary) = option.summary() {
            lines.push(detail(summary.to_string()));
        }
        if !expanded {
            return lines;
        }

        if let Some(address) = &option.address {
            lines.push(detail(format!("📍 {}", address)));
        }
        if let Some(phone) = &option.phone {
            lines.push(detail(format!("📞 {}", phone)));
        }
        if let Some(hours) = &option.working_hours {
            lines.push(detail(format!("🕐 {}", hours)));
        }
        if !option.submission_methods.is_empty() {
            let badges: Vec<String> = option
                .submission_methods
                .iter()
                .map(|method| format!("{} {}", method_icon(method), method))
                .collect();
            lines.push(detail(badges.join("  ")));
        }
        if let Some(auth) = &option.auth_required {
            lines.push(Line::from(Span::styled(format!("    🔐 {}", auth), Style::default().fg(Color::Yellow))));
        }
        if let Some(time) = &option.processing_time {
            lines.push(detail(format!("⏱ Срок ответа: {}", time)));
        }
        if !option.documents_needed.is_empty() {
            lines.push(detail(format!("📄 Могут понадобиться: {}", option.documents_needed.join(", "))));
        }
        if let Some(tips) = &option.tips {
            lines.push(Line::from(Span::styled(format!("    💡 {}", tips), Style::default().fg(Color::Green))));
        }
        if let Some(website) = &option.website {
            let name = option.portal_name.as_deref().unwrap_or("Перейти на портал");
            lines.push(Line::from(Span::styled(
                format!("    🌐 {} ({})", name, website),
                Style::default().fg(Color::Cyan),
            )));
        }
        lines
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, focused: bool) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
            .title(" ✓ Выберите одного или нескольких получателей (Space - отметить) ");
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 2 {
            return;
        }

        let list_height = (inner.height - 1) as usize;
        let mut lines: Vec<(ChecklistRow, Line<'static>)> = Vec::new();
        let mut cursor_span = (0, 0);
        for (index, option) in self.options.iter().enumerate() {
            let start = lines.len();
            let expanded = focused && index == self.cursor;
            for line in self.option_lines(index, option, expanded) {
                lines.push((ChecklistRow::Option(index), line));
            }
            if index == self.cursor {
                cursor_span = (start, lines.len());
            }
        }

        let mut scroll = self.scroll.get().min(lines.len().saturating_sub(1));
        if cursor_span.0 < scroll {
            scroll = cursor_span.0;
        } else if cursor_span.1 > scroll + list_height {
            scroll = cursor_span.1.saturating_sub(list_height).min(cursor_span.0);
        }
        self.scroll.set(scroll);

        let mut rows = self.rows.borrow_mut();
        rows.clear();
        for (i, (target, line)) in lines.iter().skip(scroll).take(list_height).enumerate() {
            let rect = Rect::new(inner.x, inner.y + i as u16, inner.width, 1);
            buf.set_line(rect.x, rect.y, line, rect.width);
            rows.push((rect, *target));
        }

        let submit_rect = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
        let on_submit = focused && self.cursor == self.options.len();
        let style = match (self.submit_enabled(), on_submit) {
            (false, _) => Style::default().fg(Color::DarkGray),
            (true, true) => Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        };
        let label = format!("[ {} ]", self.submit_label());
        buf.set_line(submit_rect.x, submit_rect.y, &Line::from(Span::styled(label, style)), submit_rect.width);
        rows.push((submit_rect, ChecklistRow::Submit));
    }
}

pub fn level_badge(level: &str) -> (&'static str, Color) {
    match level.to_lowercase().as_str() {
        "местный" => ("🏠", Color::Green),
        "региональный" => ("🏛", Color::Blue),
        "федеральный" => ("🏛", Color::Magenta),
        _ => ("📍", Color::Gray),
    }
}

/// Unknown values are shown as medium.
pub fn effectiveness_badge(effectiveness: &str) -> (&'static str, Color) {
    match effectiveness {
        "high" => ("✓ рекомендуется", Color::Green),
        "low" => ("⚠ крайняя мера", Color::DarkGray),
        _ => ("~ стандартный", Color::Yellow),
    }
}

fn method_icon(method: &str) -> &'static str {
    match method {
        "Портал" => "🌐",
        "Email" => "📧",
        "Личный приём" => "👤",
        "Почта" | "Почта России" => "✉",
        _ => "📋",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn option(id: &str, text: &str) -> ChoiceOption {
        ChoiceOption {
            id: id.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_option_icons() {
        assert_eq!(option_icon("ЖКХ"), "🏢");
        assert_eq!(option_icon("Проблема с работодателем"), "💼");
        assert_eq!(option_icon("Что-то другое"), "…");
        assert_eq!(option_icon("Авиакомпания"), DEFAULT_ICON);
    }

    #[test]
    fn test_choice_sends_id_and_shows_text() {
        let mut list = ChoiceList::new(vec![option("zhkh", "ЖКХ"), option("other", "Другое")]);
        assert_eq!(
            list.handle_key(press(KeyCode::Enter)),
            PanelAction::Submit(Submission::new("zhkh", "ЖКХ"))
        );
        assert_eq!(
            list.handle_key(press(KeyCode::Char('2'))),
            PanelAction::Submit(Submission::new("other", "Другое"))
        );
        assert_eq!(list.handle_key(press(KeyCode::Char('7'))), PanelAction::Consumed);
        assert_eq!(list.handle_key(press(KeyCode::Char('x'))), PanelAction::Ignored);
    }

    #[test]
    fn test_choice_without_id_sends_text() {
        let list = ChoiceList::new(vec![option("", "Свой вариант")]);
        assert_eq!(list.submission(0), Some(Submission::new("Свой вариант", "Свой вариант")));
    }

    #[test]
    fn test_choice_click_after_render() {
        let mut list = ChoiceList::new(vec![option("zhkh", "ЖКХ"), option("other", "Другое")]);
        let area = Rect::new(0, 10, 40, list.desired_height());
        let mut buf = Buffer::empty(Rect::new(0, 0, 40, 20));
        list.render(area, &mut buf, true);

        assert_eq!(list.click(5, 12), PanelAction::Submit(Submission::new("other", "Другое")));
        assert_eq!(list.click(5, 0), PanelAction::Ignored);
    }

    #[test]
    fn test_checklist_submit_tracks_selection() {
        let mut checklist = Checklist::new(vec![
            option("a", "Орган А"),
            option("b", "Орган Б"),
        ]);
        assert_eq!(checklist.options().len(), 2);
        assert!(!checklist.submit_enabled());
        assert_eq!(checklist.submit_label(), "Продолжить");
        assert_eq!(checklist.submission(), None);

        checklist.handle_key(press(KeyCode::Char('2')));
        checklist.handle_key(press(KeyCode::Char('1')));
        assert!(checklist.submit_enabled());
        assert_eq!(checklist.submit_label(), "Продолжить (2)");

        assert_eq!(
            checklist.handle_key(press(KeyCode::Enter)),
            PanelAction::Submit(Submission::new("a,b", "Орган А, Орган Б"))
        );

        checklist.handle_key(press(KeyCode::Char(' ')));
        assert_eq!(checklist.submit_label(), "Продолжить (1)");
        assert_eq!(checklist.submission(), Some(Submission::new("b", "Орган Б")));
    }

    #[test]
    fn test_checklist_enter_toggles_while_empty() {
        let mut checklist = Checklist::new(vec![option("a", "Орган А")]);
        assert_eq!(checklist.handle_key(press(KeyCode::Enter)), PanelAction::Consumed);
        assert!(checklist.selection().contains("a"));
        checklist.handle_key(press(KeyCode::Down));
        checklist.toggle(0);
        assert_eq!(checklist.handle_key(press(KeyCode::Enter)), PanelAction::Consumed);
    }

    #[test]
    fn test_checklist_click_toggles_and_submits() {
        let mut checklist = Checklist::new(vec![option("a", "Орган А"), option("b", "Орган Б")]);
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        checklist.render(area, &mut buf, true);

        assert_eq!(checklist.click(3, 2), PanelAction::Consumed);
        assert!(checklist.selection().contains("b"));
        checklist.render(area, &mut buf, true);
        assert_eq!(
            checklist.click(3, 8),
            PanelAction::Submit(Submission::new("b", "Орган Б"))
        );
    }

    #[test]
    fn test_badges() {
        assert_eq!(level_badge("Федеральный").0, "🏛");
        assert_eq!(level_badge("муниципальный").0, "📍");
        assert_eq!(effectiveness_badge("high").0, "✓ рекомендуется");
        assert_eq!(effectiveness_badge("unknown").0, "~ стандартный");
    }
}
