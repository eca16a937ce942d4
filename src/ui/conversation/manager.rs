use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Duration;

use crate::api::client::ConversationApi;
use crate::api::routes::Endpoints;
use crate::api::types::{ChatRequest, ChatResponse, StateResponse};
use crate::config::Config;
use crate::error::ApiError;
use crate::events::{AppEvent, ConversationRole, TuiEvent};
use crate::suggest::SuggestionSource;
use crate::ui::centered;
use crate::ui::conversation::input_area::{Affordance, InputArea, InputOutcome, Submission, TurnDirective};
use crate::ui::conversation::{
    get_help_text, AutocompleteSettings, ConversationComposer, ConversationHistory, EmailDraft,
    NoticeBoard, NoticeLevel, ParsedCommand, SlashCommand, StepProgress,
};

const GATE_WARNING: &str = "Сначала выберите из списка подсказок";
const RESTART_PROMPT: &str = "Начать заново? Текущий прогресс будет потерян.";

/// Round trip the controller is waiting on. At most one is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Chat,
    Back,
    Restart,
    /// A state load; back and restart finish only once it is applied
    Reload,
}

/// Modal drawn over the conversation. Takes all keys while open.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    None,
    ConfirmRestart,
    Email(EmailDraft),
    Help,
}

/// Owns the transcript, the mounted affordance and the round trips with the
/// conversation API. All mutation happens on the loop task: network calls are
/// spawned and report back through [`AppEvent`]s.
pub struct ConversationManager {
    history: ConversationHistory,
    composer: ConversationComposer,
    input_area: InputArea,
    progress: StepProgress,
    notices: NoticeBoard,
    api: Arc<dyn ConversationApi>,
    events: UnboundedSender<AppEvent>,
    pending: Option<Pending>,
    can_go_back: bool,
    load_generation: u64,
    overlay: Overlay,
    should_quit: bool,
}

impl ConversationManager {
    pub fn new(
        config: &Config,
        api: Arc<dyn ConversationApi>,
        source: Arc<dyn SuggestionSource>,
        endpoints: Endpoints,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let input_area = InputArea::new(
            source,
            events.clone(),
            AutocompleteSettings::from(&config.autocomplete),
            endpoints,
        );
        Self {
            history: ConversationHistory::new(config.ui.history_limit),
            composer: ConversationComposer::new(config.ui.max_message_len, config.ui.char_count_threshold),
            input_area,
            progress: StepProgress::default(),
            notices: NoticeBoard::new(Duration::from_secs(config.ui.notice_ttl_secs)),
            api,
            events,
            pending: None,
            can_go_back: false,
            load_generation: 0,
            overlay: Overlay::None,
            should_quit: false,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    pub fn input_area(&self) -> &InputArea {
        &self.input_area
    }

    pub fn progress(&self) -> StepProgress {
        self.progress
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// A chat, back, restart or state load is outstanding.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn can_go_back(&self) -> bool {
        self.can_go_back
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Whether the send affordance is enabled right now.
    pub fn can_send(&self) -> bool {
        !self.is_busy() && self.input_area.send_enabled(self.composer.content())
    }

    /// Fetch the full transcript. Only the most recently issued load is applied.
    pub fn load_state(&mut self) {
        if let Some(pending @ (Pending::Chat | Pending::Back | Pending::Restart)) = self.pending {
            tracing::debug!(?pending, "Request in flight, state load skipped");
            return;
        }
        self.pending = Some(Pending::Reload);
        self.load_generation += 1;
        let generation = self.load_generation;
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tracing::debug!(generation, "Loading conversation state");
        tokio::spawn(async move {
            let result = api.state().await;
            let _ = events.send(AppEvent::StateLoaded { generation, result });
        });
    }

    fn on_state_loaded(&mut self, generation: u64, result: Result<StateResponse, ApiError>) {
        if generation != self.load_generation {
            tracing::debug!(generation, latest = self.load_generation, "Discarding stale state load");
            return;
        }
        if self.pending == Some(Pending::Chat) {
            tracing::debug!(generation, "Chat in flight, discarding state load");
            return;
        }
        self.pending = None;

        match result {
            Ok(state) => {
                let turns = state.history.len();
                self.history.replace(&state.history);
                self.progress.set(turns / 2);
                self.can_go_back = turns > 2;

                let directive = state
                    .history
                    .iter()
                    .rev()
                    .find(|turn| turn.role == ConversationRole::Assistant)
                    .map(TurnDirective::from_turn)
                    .unwrap_or_else(TurnDirective::fallback);
                self.input_area.mount(directive, &mut self.composer);
                tracing::info!(turns, step = self.progress.step(), "Conversation state loaded");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load conversation state");
                self.notices.push(
                    NoticeLevel::Error,
                    format!("Не удалось загрузить диалог. {}", e.user_message()),
                );
            }
        }
    }

    /// Submit one answer. `None` sends the composer text.
    pub fn send_message(&mut self, submission: Option<Submission>) {
        if let Some(pending) = self.pending {
            tracing::debug!(?pending, "Request in flight, ignoring send");
            return;
        }

        let submission = match submission {
            Some(submission) => submission,
            None => {
                let text = self.composer.content().trim().to_string();
                if text.is_empty() {
                    return;
                }
                if !self.input_area.send_enabled(&text) {
                    if self.input_area.blocked_hint(&text).is_some() {
                        self.notices.push(NoticeLevel::Warning, GATE_WARNING);
                    }
                    return;
                }
                Submission::typed(text)
            }
        };
        if submission.payload.trim().is_empty() {
            return;
        }

        self.composer.clear();
        self.history.add_user_message(submission.display_text.clone());
        self.input_area.suspend();
        self.history.set_typing(true);
        self.pending = Some(Pending::Chat);

        let request = ChatRequest {
            message: submission.payload,
            company_data: self.input_area.take_structured_data(),
        };
        self.input_area.sync_composer(&mut self.composer);
        tracing::info!(structured = request.company_data.is_some(), "Sending answer");

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = api.chat(&request).await;
            let _ = events.send(AppEvent::ChatFinished(result));
        });
    }

    fn on_chat_finished(&mut self, result: Result<ChatResponse, ApiError>) {
        self.pending = None;
        self.history.set_typing(false);

        match result {
            Ok(response) => {
                self.history.add_assistant_message(response.message.clone());
                self.progress.advance();
                self.can_go_back = response.can_go_back != Some(false);
                self.input_area.mount(TurnDirective::from_response(&response), &mut self.composer);
                tracing::info!(step = self.progress.step(), "Turn received");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat request failed");
                self.notices.push(NoticeLevel::from(&e), e.user_message());
                self.input_area.resume();
                self.input_area.sync_composer(&mut self.composer);
            }
        }
    }

    pub fn go_back(&mut self) {
        if self.is_busy() {
            return;
        }
        if !self.can_go_back {
            self.notices.push(NoticeLevel::Info, "Назад вернуться нельзя");
            return;
        }
        self.pending = Some(Pending::Back);
        tracing::info!("Going back one step");

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = api.back().await;
            let _ = events.send(AppEvent::BackFinished(result));
        });
    }

    /// On success the controller stays busy until the reloaded state is applied.
    fn on_back_finished(&mut self, result: Result<(), ApiError>) {
        self.pending = None;
        match result {
            Ok(()) => {
                self.progress.step_back();
                self.notices.push(NoticeLevel::Info, "Вернулись на шаг назад");
                self.load_state();
            }
            Err(ApiError::Rejected(message)) => {
                tracing::warn!(%message, "Back rejected");
                self.notices.push(NoticeLevel::Warning, message);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Back request failed");
                self.notices.push(NoticeLevel::Error, "Ошибка. Попробуйте ещё раз.");
            }
        }
    }

    /// Ask for confirmation before the destructive reset.
    pub fn request_restart(&mut self) {
        if self.is_busy() {
            return;
        }
        self.overlay = Overlay::ConfirmRestart;
    }

    pub fn confirm_restart(&mut self) {
        self.overlay = Overlay::None;
        if self.is_busy() {
            return;
        }
        self.pending = Some(Pending::Restart);
        tracing::info!("Restarting conversation");

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = api.reset().await;
            let _ = events.send(AppEvent::RestartFinished(result));
        });
    }

    fn on_restart_finished(&mut self, result: Result<(), ApiError>) {
        self.pending = None;
        match result {
            Ok(()) => {
                self.progress.reset();
                self.notices.push(NoticeLevel::Success, "Диалог начат заново");
                self.load_state();
            }
            Err(ApiError::Rejected(message)) => {
                tracing::warn!(%message, "Restart rejected");
                self.notices.push(NoticeLevel::Warning, message);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Restart request failed");
                self.notices.push(NoticeLevel::Error, "Ошибка. Попробуйте ещё раз.");
            }
        }
    }

    /// Open the email view for result card `index`.
    pub fn open_email(&mut self, index: usize) {
        let draft = match self.input_area.affordance() {
            Affordance::Results(view) => view.result(index).and_then(EmailDraft::from_result),
            _ => {
                self.notices.push(NoticeLevel::Warning, "Письма доступны после формирования жалобы");
                return;
            }
        };
        match draft {
            Some(draft) => self.overlay = Overlay::Email(draft),
            None => self.notices.push(NoticeLevel::Warning, "Email не найден"),
        }
    }

    fn run_command(&mut self, command: ParsedCommand) {
        tracing::debug!(command = command.command.command(), "Slash command");
        match command.command {
            SlashCommand::Back => self.go_back(),
            SlashCommand::Restart => self.request_restart(),
            SlashCommand::Email => match command.email_index() {
                Some(index) => self.open_email(index),
                None => self.notices.push(NoticeLevel::Warning, "Укажите номер получателя: /email 1"),
            },
            SlashCommand::Help => self.overlay = Overlay::Help,
            SlashCommand::Quit => self.should_quit = true,
        }
    }

    fn apply(&mut self, outcome: InputOutcome) {
        match outcome {
            InputOutcome::Idle => {}
            InputOutcome::Submit(submission) => self.send_message(Some(submission)),
            InputOutcome::SendTyped(_) => self.send_message(None),
            InputOutcome::Command(command) => {
                self.input_area.on_text_changed(&mut self.composer);
                self.run_command(command);
            }
            InputOutcome::Committed(item) => {
                self.notices.push(NoticeLevel::Success, item.selection_notice());
            }
            InputOutcome::RequestRestart => self.request_restart(),
            InputOutcome::OpenEmail(index) => self.open_email(index),
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tui(TuiEvent::Key(key)) => self.handle_key(key),
            AppEvent::Tui(TuiEvent::Mouse(mouse)) => self.handle_mouse(mouse),
            AppEvent::Tui(TuiEvent::Paste(text)) => {
                if self.overlay == Overlay::None {
                    self.input_area.handle_paste(&text, &mut self.composer);
                }
            }
            AppEvent::Tui(TuiEvent::FocusGained) => self.input_area.on_focus_gained(&self.composer),
            AppEvent::Tui(TuiEvent::FocusLost) => self.input_area.on_focus_lost(),
            AppEvent::Tui(TuiEvent::Resize(..)) => {}
            AppEvent::StateLoaded { generation, result } => self.on_state_loaded(generation, result),
            AppEvent::ChatFinished(result) => self.on_chat_finished(result),
            AppEvent::BackFinished(result) => self.on_back_finished(result),
            AppEvent::RestartFinished(result) => self.on_restart_finished(result),
            AppEvent::Autocomplete(event) => {
                self.input_area.on_autocomplete_event(event);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match &self.overlay {
            Overlay::None => {}
            Overlay::ConfirmRestart => {
                match key.code {
                    KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('д') => {
                        self.confirm_restart()
                    }
                    KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => self.overlay = Overlay::None,
                    _ => {}
                }
                return;
            }
            Overlay::Email(_) | Overlay::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.overlay = Overlay::None;
                }
                return;
            }
        }

        match key.code {
            KeyCode::Char('b') if ctrl => self.go_back(),
            KeyCode::Char('r') if ctrl => self.request_restart(),
            KeyCode::PageUp => self.history.scroll_up(),
            KeyCode::PageDown => self.history.scroll_down(),
            _ => {
                let outcome = self.input_area.handle_key(key, &mut self.composer);
                self.apply(outcome);
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.history.scroll_up(),
            MouseEventKind::ScrollDown => self.history.scroll_down(),
            _ if self.overlay != Overlay::None => {}
            _ => {
                let outcome = self.input_area.handle_mouse(mouse, &mut self.composer);
                self.apply(outcome);
            }
        }
    }

    /// Periodic housekeeping: expire notices and animate the typing line.
    pub fn on_tick(&mut self) {
        self.notices.prune();
        self.history.tick();
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.size();
        let progress_height = u16::from(self.progress.is_visible());
        let composer_height = self.composer.desired_height();
        let available = area.height.saturating_sub(progress_height + composer_height + 1);
        let panel_height = match self.input_area.affordance() {
            Affordance::Results(_) if !self.input_area.is_suspended() => available * 2 / 3,
            _ => self.input_area.panel_height().min(available / 2),
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(progress_height),
                Constraint::Min(3),
                Constraint::Length(panel_height),
                Constraint::Length(composer_height),
                Constraint::Length(1),
            ])
            .split(area);

        if self.progress.is_visible() {
            frame.render_widget(&self.progress, chunks[0]);
        }
        frame.render_widget(&self.history, chunks[1]);

        let buf = frame.buffer_mut();
        self.input_area.render(chunks[2], chunks[3], &self.composer, buf);
        buf.set_line(chunks[4].x, chunks[4].y, &self.footer(), chunks[4].width);
        self.input_area.render_dropdown(buf);
        self.notices.render(area, buf);

        match &self.overlay {
            Overlay::None => {}
            Overlay::ConfirmRestart => {
                let popup = centered(area, 52, 6);
                Clear.render(popup, buf);
                Paragraph::new(vec![
                    Line::from(RESTART_PROMPT),
                    Line::default(),
                    Line::from(vec![
                        Span::styled("[Y/Enter] Да", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                        Span::raw("   "),
                        Span::styled("[N/Esc] Нет", Style::default().fg(Color::Gray)),
                    ]),
                ])
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Yellow))
                        .title(" Новая жалоба "),
                )
                .render(popup, buf);
            }
            Overlay::Email(draft) => {
                let popup = centered(area, 90, 22);
                Clear.render(popup, buf);
                draft.render(popup, buf);
            }
            Overlay::Help => {
                let popup = centered(area, 64, 24);
                Clear.render(popup, buf);
                Paragraph::new(get_help_text())
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(Color::Cyan))
                            .title(" Справка (Esc - закрыть) "),
                    )
                    .render(popup, buf);
            }
        }
    }

    fn footer(&self) -> Line<'static> {
        let key = Style::default().fg(Color::Cyan);
        let text = Style::default().fg(Color::DarkGray);
        let mut spans = Vec::new();
        if self.can_go_back {
            spans.push(Span::styled("Ctrl+B", key));
            spans.push(Span::styled(" назад  ", text));
        }
        spans.push(Span::styled("Ctrl+R", key));
        spans.push(Span::styled(" заново  ", text));
        spans.push(Span::styled("/help", key));
        spans.push(Span::styled(" справка  ", text));
        spans.push(Span::styled("Ctrl+C", key));
        spans.push(Span::styled(" выход", text));
        Line::from(spans)
    }

    #[cfg(test)]
    pub(crate) fn composer_mut(&mut self) -> &mut ConversationComposer {
        &mut self.composer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{ChoiceOption, InputType, Turn};
    use crate::suggest::{EntityType, SuggestionItem};
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    struct ScriptedApi {
        history: Vec<Turn>,
    }

    #[async_trait]
    impl ConversationApi for ScriptedApi {
        async fn state(&self) -> crate::error::Result<StateResponse> {
            Ok(StateResponse { history: self.history.clone() })
        }

        async fn chat(&self, _request: &ChatRequest) -> crate::error::Result<ChatResponse> {
            Err(ApiError::Status(500))
        }

        async fn back(&self) -> crate::error::Result<()> {
            Ok(())
        }

        async fn reset(&self) -> crate::error::Result<()> {
            Ok(())
        }
    }

    struct NoSuggestions;

    #[async_trait]
    impl SuggestionSource for NoSuggestions {
        async fn search(&self, _entity: EntityType, _query: &str) -> Vec<SuggestionItem> {
            Vec::new()
        }
    }

    fn options_turn() -> Turn {
        Turn {
            role: ConversationRole::Assistant,
            content: "Что **случилось**?".into(),
            input_type: Some(InputType::Options),
            options: Some(vec![
                ChoiceOption { id: "zhkh".into(), text: "ЖКХ".into(), ..Default::default() },
                ChoiceOption { id: "other".into(), text: "Другое".into(), ..Default::default() },
            ]),
        }
    }

    fn manager(history: Vec<Turn>) -> (ConversationManager, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let manager = ConversationManager::new(
            &Config::default(),
            Arc::new(ScriptedApi { history }),
            Arc::new(NoSuggestions),
            Endpoints::new("http://localhost:5000", "/").unwrap(),
            tx,
        );
        (manager, rx)
    }

    async fn settle(manager: &mut ConversationManager, rx: &mut UnboundedReceiver<AppEvent>) {
        while let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
            manager.handle_event(event);
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen(manager: &ConversationManager) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|frame| manager.render(frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..buffer.area.height)
            .map(|y| (0..buffer.area.width).map(|x| buffer.get(x, y).symbol().to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_render_loaded_options_turn() {
        let (mut manager, mut rx) = manager(vec![options_turn()]);
        manager.load_state();
        settle(&mut manager, &mut rx).await;

        let screen = screen(&manager);
        assert!(screen.contains("случилось"));
        assert!(screen.contains("ЖКХ"));
        assert!(screen.contains("Другое"));
        assert!(!manager.can_go_back());
        assert_eq!(manager.progress().step(), 0);
    }

    #[tokio::test]
    async fn test_empty_history_mounts_fallback() {
        let (mut manager, mut rx) = manager(Vec::new());
        manager.load_state();
        settle(&mut manager, &mut rx).await;
        assert_eq!(manager.input_area().affordance().name(), "fallback");
        screen(&manager);
    }

    #[tokio::test]
    async fn test_stale_state_load_is_ignored() {
        let (mut manager, mut rx) = manager(vec![options_turn()]);
        manager.load_state();
        manager.load_state();
        manager.handle_event(AppEvent::StateLoaded {
            generation: 1,
            result: Ok(StateResponse::default()),
        });
        assert_eq!(manager.input_area().affordance().name(), "none");
        settle(&mut manager, &mut rx).await;
        assert_eq!(manager.history().message_count(), 1);
        assert_eq!(manager.input_area().affordance().name(), "options");
    }

    #[tokio::test]
    async fn test_state_load_during_chat_is_discarded() {
        let (mut manager, mut rx) = manager(vec![options_turn()]);
        manager.load_state();
        settle(&mut manager, &mut rx).await;
        let generation = manager.load_generation;

        manager.handle_key(press(KeyCode::Char('1')));
        manager.load_state();
        assert_eq!(manager.load_generation, generation);

        manager.handle_event(AppEvent::StateLoaded {
            generation,
            result: Ok(StateResponse::default()),
        });
        assert!(manager.is_busy());
        assert!(manager.input_area().is_suspended());
        assert_eq!(manager.history().last().map(|m| m.content.as_str()), Some("ЖКХ"));

        settle(&mut manager, &mut rx).await;
        assert!(!manager.is_busy());
        assert_eq!(manager.history().message_count(), 2);
    }

    #[tokio::test]
    async fn test_send_waits_for_initial_state() {
        let (mut manager, mut rx) = manager(vec![options_turn()]);
        manager.load_state();
        assert!(manager.is_busy());
        manager.send_message(Some(Submission::new("other", "Другое")));
        assert_eq!(manager.history().message_count(), 0);

        settle(&mut manager, &mut rx).await;
        assert!(!manager.is_busy());
        assert_eq!(manager.history().message_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_send_restores_panel_and_keeps_message() {
        let (mut manager, mut rx) = manager(vec![options_turn()]);
        manager.load_state();
        settle(&mut manager, &mut rx).await;

        manager.handle_key(press(KeyCode::Char('2')));
        assert!(manager.is_busy());
        assert!(manager.input_area().is_suspended());
        assert!(manager.history().is_typing());
        settle(&mut manager, &mut rx).await;

        assert!(!manager.is_busy());
        assert!(!manager.input_area().is_suspended());
        assert_eq!(manager.history().last().map(|m| m.content.as_str()), Some("Другое"));
        assert_eq!(manager.notices().latest().map(|n| n.message.as_str()), Some("Ошибка сервера"));
    }

    #[tokio::test]
    async fn test_overlays_take_keys() {
        let (mut manager, mut rx) = manager(vec![options_turn()]);
        manager.load_state();
        settle(&mut manager, &mut rx).await;

        manager.composer_mut().set_text("/help");
        manager.input_area.handle_key(press(KeyCode::Tab), &mut manager.composer);
        manager.handle_key(press(KeyCode::Enter));
        assert_eq!(manager.overlay(), &Overlay::Help);
        assert!(screen(&manager).contains("Справка"));
        manager.handle_key(press(KeyCode::Esc));
        assert_eq!(manager.overlay(), &Overlay::None);

        manager.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert_eq!(manager.overlay(), &Overlay::ConfirmRestart);
        manager.handle_key(press(KeyCode::Char('n')));
        assert_eq!(manager.overlay(), &Overlay::None);
        assert!(!manager.is_busy());

        manager.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(manager.should_quit());
    }

    #[tokio::test]
    async fn test_email_requires_results() {
        let (mut manager, _rx) = manager(Vec::new());
        manager.open_email(0);
        assert_eq!(manager.overlay(), &Overlay::None);
        assert!(manager.notices().latest().is_some());
    }
}
