//! Typeahead controller for one gated text input.
//!
//! The controller never blocks the loop: debounce and blur timers and the
//! lookups themselves run as spawned tasks that post [`AutocompleteEvent`]s
//! back. Every lookup is tagged with a sequence number when it is issued and
//! its result is applied only if that number is still the latest one, so
//! responses that arrive out of order cannot overwrite newer suggestions.

use std::cell::Cell;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::config::AutocompleteConfig;
use crate::events::{AppEvent, AutocompleteEvent};
use crate::suggest::{EntityType, SuggestionItem, SuggestionSource};
use crate::ui::hit;

const MAX_ROWS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutocompleteSettings {
    pub debounce: Duration,
    pub blur_hide: Duration,
    pub min_query_len: usize,
}

impl Default for AutocompleteSettings {
    fn default() -> Self {
        Self::from(&AutocompleteConfig::default())
    }
}

impl From<&AutocompleteConfig> for AutocompleteSettings {
    fn from(config: &AutocompleteConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            blur_hide: Duration::from_millis(config.blur_hide_ms),
            min_query_len: config.min_query_len,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutocompletePhase {
    Idle,
    Searching,
    Showing,
    Selected,
}

/// A committed suggestion: the text to put into the input and the item itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub text: String,
    pub item: SuggestionItem,
}

/// What the controller did with a key.
#[derive(Debug, Clone, PartialEq)]
pub enum AutocompleteAction {
    /// Not for the dropdown; route it to the text input
    Ignored,
    Consumed,
    Committed(Commit),
}

pub struct AutocompleteController {
    id: u64,
    entity: EntityType,
    source: Arc<dyn SuggestionSource>,
    events: UnboundedSender<AppEvent>,
    settings: AutocompleteSettings,
    phase: AutocompletePhase,
    suggestions: Vec<SuggestionItem>,
    highlighted: Option<usize>,
    visible: bool,
    /// Sequence number of the most recently issued lookup
    seq: u64,
    pending_query: String,
    debounce_generation: u64,
    debounce: Option<JoinHandle<()>>,
    blur_generation: u64,
    blur_timer: Option<JoinHandle<()>>,
    pointer_over: bool,
    disposed: bool,
    dropdown_area: Cell<Option<Rect>>,
    scroll_offset: Cell<usize>,
}

impl AutocompleteController {
    pub fn new(
        id: u64,
        entity: EntityType,
        source: Arc<dyn SuggestionSource>,
        events: UnboundedSender<AppEvent>,
        settings: AutocompleteSettings,
    ) -> Self {
        tracing::debug!(controller = id, entity = entity.as_path(), "Autocomplete mounted");
        Self {
            id,
            entity,
            source,
            events,
            settings,
            phase: AutocompletePhase::Idle,
            suggestions: Vec::new(),
            highlighted: None,
            visible: false,
            seq: 0,
            pending_query: String::new(),
            debounce_generation: 0,
            debounce: None,
            blur_generation: 0,
            blur_timer: None,
            pointer_over: false,
            disposed: false,
            dropdown_area: Cell::new(None),
            scroll_offset: Cell::new(0),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn phase(&self) -> AutocompletePhase {
        self.phase
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn suggestions(&self) -> &[SuggestionItem] {
        &self.suggestions
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn latest_seq(&self) -> u64 {
        self.seq
    }

    fn long_enough(&self, query: &str) -> bool {
        query.chars().count() >= self.settings.min_query_len
    }

    /// The text of the input changed.
    pub fn on_input(&mut self, text: &str) {
        if self.disposed {
            return;
        }
        self.cancel_debounce();
        let query = text.trim();

        if !self.long_enough(query) {
            self.invalidate_lookups();
            self.hide();
            self.phase = AutocompletePhase::Idle;
            return;
        }

        if self.phase == AutocompletePhase::Selected {
            self.phase = AutocompletePhase::Idle;
        }
        self.pending_query = query.to_string();
        self.debounce_generation += 1;
        let generation = self.debounce_generation;
        let controller = self.id;
        let delay = self.settings.debounce;
        let events = self.events.clone();
        self.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(AppEvent::Autocomplete(AutocompleteEvent::DebounceElapsed {
                controller,
                generation,
            }));
        }));
    }

    /// The input gained focus: search right away for an unresolved query.
    pub fn on_focus(&mut self, text: &str) {
        if self.disposed {
            return;
        }
        self.cancel_blur();
        let query = text.trim();
        if self.long_enough(query) && self.phase != AutocompletePhase::Selected {
            self.cancel_debounce();
            self.issue_search(query.to_string());
        }
    }

    /// The input lost focus: hide after a short delay unless the pointer is
    /// over the dropdown by then.
    pub fn on_blur(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_blur();
        let generation = self.blur_generation;
        let controller = self.id;
        let delay = self.settings.blur_hide;
        let events = self.events.clone();
        self.blur_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(AppEvent::Autocomplete(AutocompleteEvent::BlurElapsed {
                controller,
                generation,
            }));
        }));
    }

    /// Apply a completion posted by one of this controller's tasks.
    /// Returns true if anything visible changed.
    pub fn handle_event(&mut self, event: AutocompleteEvent) -> bool {
        if self.disposed || event.controller() != self.id {
            tracing::debug!(controller = event.controller(), "Dropping autocomplete event");
            return false;
        }

        match event {
            AutocompleteEvent::DebounceElapsed { generation, .. } => {
                if generation != self.debounce_generation {
                    return false;
                }
                self.debounce = None;
                let query = std::mem::take(&mut self.pending_query);
                self.issue_search(query);
                false
            }
            AutocompleteEvent::SuggestionsLoaded { seq, items, .. } => {
                if seq != self.seq {
                    tracing::debug!(seq, latest = self.seq, "Discarding stale suggestions");
                    return false;
                }
                self.show(items);
                true
            }
            AutocompleteEvent::BlurElapsed { generation, .. } => {
                if generation != self.blur_generation {
                    return false;
                }
                self.blur_timer = None;
                if self.pointer_over {
                    return false;
                }
                self.hide();
                true
            }
        }
    }

    /// Keyboard contract of the dropdown. Keys are only taken while it is visible.
    pub fn handle_key(&mut self, key: KeyEvent) -> AutocompleteAction {
        if !self.visible || key.kind != KeyEventKind::Press {
            return AutocompleteAction::Ignored;
        }

        match key.code {
            KeyCode::Down => {
                let last = self.suggestions.len().saturating_sub(1);
                self.highlighted = Some(self.highlighted.map_or(0, |i| (i + 1).min(last)));
                AutocompleteAction::Consumed
            }
            KeyCode::Up => {
                self.highlighted = Some(self.highlighted.map_or(0, |i| i.saturating_sub(1)));
                AutocompleteAction::Consumed
            }
            KeyCode::Enter => match self.highlighted.and_then(|index| self.commit(index)) {
                Some(commit) => AutocompleteAction::Committed(commit),
                None => AutocompleteAction::Ignored,
            },
            KeyCode::Esc => {
                self.hide();
                AutocompleteAction::Consumed
            }
            _ => AutocompleteAction::Ignored,
        }
    }

    /// Pointer moved to `(column, row)`: track whether it is over the
    /// dropdown and highlight the hovered row.
    pub fn on_pointer_move(&mut self, column: u16, row: u16) -> bool {
        let before = (self.pointer_over, self.highlighted);
        self.pointer_over = false;
        if self.visible {
            if let Some(area) = self.dropdown_area.get().filter(|area| hit(*area, column, row)) {
                self.pointer_over = true;
                if let Some(index) = self.row_at(area, row) {
                    self.highlighted = Some(index);
                }
            }
        }
        before != (self.pointer_over, self.highlighted)
    }

    /// Pointer click: commits the row under it, if any.
    pub fn on_click(&mut self, column: u16, row: u16) -> Option<Commit> {
        if !self.visible {
            return None;
        }
        let area = self.dropdown_area.get().filter(|area| hit(*area, column, row))?;
        let index = self.row_at(area, row)?;
        self.commit(index)
    }

    pub fn pointer_over_dropdown(&self) -> bool {
        self.pointer_over
    }

    fn row_at(&self, area: Rect, row: u16) -> Option<usize> {
        // One border row above the items
        let offset = row.checked_sub(area.y + 1)? as usize;
        let index = self.scroll_offset.get() + offset;
        (offset < MAX_ROWS && index < self.suggestions.len()).then_some(index)
    }

    /// Select the item at `index`: hide, stop searching until the text
    /// changes again, and hand the item to the caller.
    pub fn commit(&mut self, index: usize) -> Option<Commit> {
        let item = self.suggestions.get(index)?.clone();
        self.cancel_debounce();
        self.invalidate_lookups();
        self.hide();
        self.phase = AutocompletePhase::Selected;
        tracing::info!(entity = self.entity.as_path(), "Suggestion committed");
        Some(Commit {
            text: item.display_text().to_string(),
            item,
        })
    }

    /// Stop all timers and hide. Late completions are ignored afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_debounce();
        self.cancel_blur();
        self.hide();
        self.suggestions.clear();
        self.disposed = true;
        tracing::debug!(controller = self.id, "Autocomplete disposed");
    }

    fn issue_search(&mut self, query: String) {
        self.seq += 1;
        let seq = self.seq;
        let controller = self.id;
        let entity = self.entity;
        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        self.phase = AutocompletePhase::Searching;
        tracing::debug!(seq, entity = entity.as_path(), %query, "Suggestion lookup issued");

        tokio::spawn(async move {
            let items = source.search(entity, &query).await;
            let _ = events.send(AppEvent::Autocomplete(AutocompleteEvent::SuggestionsLoaded {
                controller,
                seq,
                items,
            }));
        });
    }

    fn show(&mut self, items: Vec<SuggestionItem>) {
        self.highlighted = None;
        self.scroll_offset.set(0);
        if items.is_empty() {
            self.suggestions.clear();
            self.hide();
            self.phase = AutocompletePhase::Idle;
            return;
        }
        self.suggestions = items;
        self.visible = true;
        self.phase = AutocompletePhase::Showing;
    }

    fn hide(&mut self) {
        self.visible = false;
        self.highlighted = None;
        self.pointer_over = false;
        self.dropdown_area.set(None);
        if matches!(self.phase, AutocompletePhase::Showing | AutocompletePhase::Searching) {
            self.phase = AutocompletePhase::Idle;
        }
    }

    /// Results of lookups issued so far will no longer be applied.
    fn invalidate_lookups(&mut self) {
        self.seq += 1;
    }

    /// Also retires a tick that already fired but is still queued.
    fn cancel_debounce(&mut self) {
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
        self.debounce_generation += 1;
        self.pending_query.clear();
    }

    fn cancel_blur(&mut self) {
        if let Some(handle) = self.blur_timer.take() {
            handle.abort();
        }
        self.blur_generation += 1;
    }

    /// Draw the dropdown directly above `anchor` (the text input).
    pub fn render_dropdown(&self, anchor: Rect, buf: &mut Buffer) {
        if !self.visible || self.suggestions.is_empty() {
            self.dropdown_area.set(None);
            return;
        }

        let rows = self.suggestions.len().min(MAX_ROWS);
        let height = (rows as u16 + 2).min(anchor.y);
        if height < 3 {
            self.dropdown_area.set(None);
            return;
        }
        let area = Rect {
            x: anchor.x,
            y: anchor.y - height,
            width: anchor.width,
            height,
        };
        self.dropdown_area.set(Some(area));

        let visible_rows = (height - 2) as usize;
        let mut offset = self.scroll_offset.get();
        if let Some(index) = self.highlighted {
            if index < offset {
                offset = index;
            } else if index >= offset + visible_rows {
                offset = index + 1 - visible_rows;
            }
        }
        self.scroll_offset.set(offset);

        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" Подсказки ({}) ", self.suggestions.len()));
        let inner = block.inner(area);
        block.render(area, buf);

        for (row, (index, item)) in self
            .suggestions
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible_rows)
            .enumerate()
        {
            let selected = self.highlighted == Some(index);
            let name_style = if selected {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let mut spans = vec![Span::styled(item.display_text().to_string(), name_style)];
            if let Some(detail) = dropdown_detail(item) {
                spans.push(Span::styled(format!("  {}", detail), Style::default().fg(Color::DarkGray)));
            }
            buf.set_line(inner.x, inner.y + row as u16, &Line::from(spans), inner.width);
        }
    }
}

/// Company rows always show the INN (or a placeholder) and a shortened address.
fn dropdown_detail(item: &SuggestionItem) -> Option<String> {
    match item {
        SuggestionItem::Company(company) => {
            let inn = company.inn.as_deref().filter(|inn| !inn.is_empty()).unwrap_or("н/д");
            let mut detail = format!("ИНН: {}", inn);
            if let Some(address) = company.address.as_deref().filter(|a| !a.is_empty()) {
                let short: String = address.chars().take(50).collect();
                detail.push_str(&format!(" · {}...", short));
            }
            Some(detail)
        }
        other => other.detail(),
    }
}

impl Drop for AutocompleteController {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for AutocompleteController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutocompleteController")
            .field("id", &self.id)
            .field("entity", &self.entity)
            .field("phase", &self.phase)
            .field("visible", &self.visible)
            .field("suggestions", &self.suggestions.len())
            .field("seq", &self.seq)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crossterm::event::KeyModifiers;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    #[derive(Default)]
    struct FakeSource {
        queries: Mutex<Vec<String>>,
        delays: HashMap<String, Duration>,
    }

    #[async_trait]
    impl SuggestionSource for FakeSource {
        async fn search(&self, entity: EntityType, query: &str) -> Vec<SuggestionItem> {
            self.queries.lock().unwrap().push(query.to_string());
            if let Some(delay) = self.delays.get(query) {
                tokio::time::sleep(*delay).await;
            }
            (1..=3)
                .filter_map(|i| {
                    SuggestionItem::from_json(entity, json!({ "name": format!("{} {}", query, i), "inn": "1" }))
                })
                .collect()
        }
    }

    fn controller(source: Arc<FakeSource>) -> (AutocompleteController, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let controller = AutocompleteController::new(
            1,
            EntityType::Company,
            source,
            tx,
            AutocompleteSettings::default(),
        );
        (controller, rx)
    }

    async fn pump(controller: &mut AutocompleteController, rx: &mut UnboundedReceiver<AppEvent>) -> bool {
        match rx.recv().await {
            Some(AppEvent::Autocomplete(event)) => controller.handle_event(event),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn showing(source: Arc<FakeSource>) -> (AutocompleteController, UnboundedReceiver<AppEvent>) {
        let (mut controller, mut rx) = controller(source);
        controller.on_input("Ромашка");
        pump(&mut controller, &mut rx).await;
        pump(&mut controller, &mut rx).await;
        assert!(controller.is_visible());
        (controller, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_issues_only_the_last_query() {
        let source = Arc::new(FakeSource::default());
        let (mut controller, mut rx) = controller(source.clone());

        controller.on_input("a");
        tokio::time::advance(Duration::from_millis(100)).await;
        controller.on_input("ab");
        tokio::time::advance(Duration::from_millis(100)).await;
        controller.on_input("abc");

        pump(&mut controller, &mut rx).await;
        assert!(pump(&mut controller, &mut rx).await);

        assert_eq!(*source.queries.lock().unwrap(), vec!["abc".to_string()]);
        assert_eq!(controller.suggestions()[0].display_text(), "abc 1");
        assert_eq!(controller.phase(), AutocompletePhase::Showing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_hides_without_request() {
        let source = Arc::new(FakeSource::default());
        let (mut controller, mut rx) = showing(source.clone()).await;

        controller.on_input("Р");
        assert!(!controller.is_visible());
        assert_eq!(controller.phase(), AutocompletePhase::Idle);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(source.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let mut delays = HashMap::new();
        delays.insert("ab".to_string(), Duration::from_millis(800));
        delays.insert("abc".to_string(), Duration::from_millis(10));
        let source = Arc::new(FakeSource { delays, ..Default::default() });
        let (mut controller, mut rx) = controller(source.clone());

        controller.on_input("ab");
        pump(&mut controller, &mut rx).await; // debounce -> lookup "ab"
        controller.on_input("abc");
        pump(&mut controller, &mut rx).await; // debounce -> lookup "abc"

        assert!(pump(&mut controller, &mut rx).await); // "abc" results
        assert!(!pump(&mut controller, &mut rx).await); // late "ab" results

        assert_eq!(controller.suggestions()[0].display_text(), "abc 1");
        assert_eq!(
            *source.queries.lock().unwrap(),
            vec!["ab".to_string(), "abc".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_keyboard_navigation_is_bounded() {
        let (mut controller, _rx) = showing(Arc::new(FakeSource::default())).await;
        assert_eq!(controller.highlighted(), None);

        controller.handle_key(press(KeyCode::Up));
        assert_eq!(controller.highlighted(), Some(0));
        for _ in 0..5 {
            controller.handle_key(press(KeyCode::Down));
        }
        assert_eq!(controller.highlighted(), Some(2));
        controller.handle_key(press(KeyCode::Up));
        assert_eq!(controller.highlighted(), Some(1));
        assert_eq!(controller.phase(), AutocompletePhase::Showing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_commits_only_with_highlight() {
        let (mut controller, _rx) = showing(Arc::new(FakeSource::default())).await;

        assert_eq!(controller.handle_key(press(KeyCode::Enter)), AutocompleteAction::Ignored);
        assert!(controller.is_visible());

        controller.handle_key(press(KeyCode::Down));
        controller.handle_key(press(KeyCode::Down));
        match controller.handle_key(press(KeyCode::Enter)) {
            AutocompleteAction::Committed(commit) => {
                assert_eq!(commit.text, "Ромашка 2");
                assert_eq!(commit.item.structured_data(), json!({ "name": "Ромашка 2", "inn": "1" }));
            }
            other => panic!("unexpected action: {:?}", other),
        }
        assert!(!controller.is_visible());
        assert_eq!(controller.phase(), AutocompletePhase::Selected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_hides_without_commit() {
        let (mut controller, _rx) = showing(Arc::new(FakeSource::default())).await;
        controller.handle_key(press(KeyCode::Down));
        assert_eq!(controller.handle_key(press(KeyCode::Esc)), AutocompleteAction::Consumed);
        assert!(!controller.is_visible());
        assert_eq!(controller.phase(), AutocompletePhase::Idle);
        assert_eq!(controller.handle_key(press(KeyCode::Down)), AutocompleteAction::Ignored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_invalidates_in_flight_lookup() {
        let (mut controller, mut rx) = showing(Arc::new(FakeSource {
            delays: HashMap::from([("Ромашка".to_string(), Duration::from_millis(500))]),
            ..Default::default()
        }))
        .await;

        // Re-issue the lookup, then commit while it is still in flight
        controller.on_focus("Ромашка");
        controller.handle_key(press(KeyCode::Down));
        assert!(matches!(
            controller.handle_key(press(KeyCode::Enter)),
            AutocompleteAction::Committed(_)
        ));

        assert!(!pump(&mut controller, &mut rx).await);
        assert!(!controller.is_visible());
        assert_eq!(controller.phase(), AutocompletePhase::Selected);

        // No lookup on focus once selected
        controller.on_focus("Ромашка 1");
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_hides_unless_pointer_over_dropdown() {
        let (mut controller, mut rx) = showing(Arc::new(FakeSource::default())).await;

        let mut buf = Buffer::empty(Rect::new(0, 0, 60, 20));
        controller.render_dropdown(Rect::new(0, 15, 60, 3), &mut buf);
        let area = controller.dropdown_area.get().unwrap();

        controller.on_pointer_move(area.x + 2, area.y + 1);
        assert!(controller.pointer_over_dropdown());
        assert_eq!(controller.highlighted(), Some(0));

        controller.on_blur();
        assert!(!pump(&mut controller, &mut rx).await);
        assert!(controller.is_visible());

        let commit = controller.on_click(area.x + 2, area.y + 2).unwrap();
        assert_eq!(commit.text, "Ромашка 2");

        controller.on_input("Ромашка 3");
        pump(&mut controller, &mut rx).await;
        pump(&mut controller, &mut rx).await;
        controller.on_pointer_move(0, 0);
        controller.on_blur();
        assert!(pump(&mut controller, &mut rx).await);
        assert!(!controller.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_searches_immediately() {
        let source = Arc::new(FakeSource::default());
        let (mut controller, mut rx) = controller(source.clone());
        controller.on_focus("Лютик");
        assert!(pump(&mut controller, &mut rx).await);
        assert_eq!(*source.queries.lock().unwrap(), vec!["Лютик".to_string()]);

        controller.on_focus("Л");
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_ignores_late_events() {
        let source = Arc::new(FakeSource::default());
        let (mut controller, mut rx) = controller(source.clone());
        controller.on_input("Ромашка");
        pump(&mut controller, &mut rx).await;

        controller.dispose();
        let late = rx.recv().await.unwrap();
        match late {
            AppEvent::Autocomplete(event) => assert!(!controller.handle_event(event)),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(!controller.is_visible());

        controller.on_input("Ромашка 2");
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_for_another_controller_are_dropped() {
        let (mut controller, _rx) = controller(Arc::new(FakeSource::default()));
        let foreign = AutocompleteEvent::SuggestionsLoaded {
            controller: 99,
            seq: controller.latest_seq(),
            items: Vec::new(),
        };
        assert!(!controller.handle_event(foreign));
    }
}
