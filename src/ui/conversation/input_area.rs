//! Maps the server's declared input type to exactly one mounted affordance.
//!
//! Every affordance produces the same [`Submission`] pair, so the owner has a
//! single send path regardless of how the answer was picked.

use std::cell::Cell;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::routes::Endpoints;
use crate::api::types::{ChatResponse, ChoiceOption, InputType, SendingResult, Turn};
use crate::events::{AppEvent, AutocompleteEvent};
use crate::suggest::{EntityType, SuggestionItem, SuggestionSource};
use crate::ui::conversation::autocomplete::{
    AutocompleteAction, AutocompleteController, AutocompleteSettings, Commit,
};
use crate::ui::conversation::choices::{Checklist, ChoiceList, PanelAction, CUSTOM_OPTION_ID};
use crate::ui::conversation::commands::ParsedCommand;
use crate::ui::conversation::composer::{ComposerResult, ConversationComposer};
use crate::ui::conversation::results::{ResultsAction, ResultsView};
use crate::ui::hit;

const READY_LABEL: &str = "Выбрано! Нажмите отправить.";

/// What gets sent and what gets shown for one user answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub payload: String,
    pub display_text: String,
}

impl Submission {
    pub fn new(payload: impl Into<String>, display_text: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            display_text: display_text.into(),
        }
    }

    /// Free text: the payload is also what is shown.
    pub fn typed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            payload: text.clone(),
            display_text: text,
        }
    }
}

/// Everything needed to mount the affordance for the next user action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnDirective {
    pub input_type: InputType,
    pub options: Vec<ChoiceOption>,
    pub current_text: String,
    pub results: Vec<SendingResult>,
    pub pdf_download_url: Option<String>,
}

impl TurnDirective {
    pub fn from_turn(turn: &Turn) -> Self {
        Self {
            input_type: turn.input_type.clone().unwrap_or_default(),
            options: turn.options.clone().unwrap_or_default(),
            ..Default::default()
        }
    }

    /// No declared type at all.
    pub fn fallback() -> Self {
        Self {
            input_type: InputType::Other(String::new()),
            ..Default::default()
        }
    }

    pub fn from_response(response: &ChatResponse) -> Self {
        Self {
            input_type: response.input_type.clone().unwrap_or_default(),
            options: response.options.clone().unwrap_or_default(),
            current_text: response.current_text.clone().unwrap_or_default(),
            results: response.results.clone().unwrap_or_default(),
            pdf_download_url: response.pdf_download_url.clone(),
        }
    }
}

/// The suggestion committed for the current gated input.
#[derive(Debug, Clone, PartialEq)]
pub struct AutocompleteSelection {
    pub item: SuggestionItem,
    /// Input text at commit time; any edit away from it drops the selection
    pub text: String,
}

#[derive(Debug)]
pub struct GatedInput {
    pub entity: EntityType,
    pub controller: AutocompleteController,
    pub selection: Option<AutocompleteSelection>,
}

/// The single affordance mounted for the current turn.
#[derive(Debug, Default)]
pub enum Affordance {
    /// Nothing loaded yet
    #[default]
    None,
    FreeText { long_form: bool },
    Choices(ChoiceList),
    Checklist(Checklist),
    Gated(GatedInput),
    Results(ResultsView),
    /// Unrecognized input type: plain text, sendable when non-empty
    Fallback,
}

impl Affordance {
    pub fn name(&self) -> &'static str {
        match self {
            Affordance::None => "none",
            Affordance::FreeText { long_form: false } => "text",
            Affordance::FreeText { long_form: true } => "textarea",
            Affordance::Choices(_) => "options",
            Affordance::Checklist(_) => "multiselect",
            Affordance::Gated(_) => "autocomplete",
            Affordance::Results(_) => "sending_results",
            Affordance::Fallback => "fallback",
        }
    }

    fn has_panel(&self) -> bool {
        matches!(
            self,
            Affordance::Choices(_) | Affordance::Checklist(_) | Affordance::Results(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Panel,
    Composer,
}

/// What the input area wants the owner to do.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    Idle,
    Submit(Submission),
    /// Enter in the composer; the owner decides whether sending is allowed
    SendTyped(String),
    Command(ParsedCommand),
    Committed(SuggestionItem),
    RequestRestart,
    OpenEmail(usize),
}

pub struct InputArea {
    affordance: Affordance,
    focus: PanelFocus,
    suspended: bool,
    source: Arc<dyn SuggestionSource>,
    events: UnboundedSender<AppEvent>,
    settings: AutocompleteSettings,
    endpoints: Endpoints,
    next_controller: u64,
    panel_area: Cell<Option<Rect>>,
    composer_area: Cell<Option<Rect>>,
}

impl InputArea {
    pub fn new(
        source: Arc<dyn SuggestionSource>,
        events: UnboundedSender<AppEvent>,
        settings: AutocompleteSettings,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            affordance: Affordance::None,
            focus: PanelFocus::Composer,
            suspended: false,
            source,
            events,
            settings,
            endpoints,
            next_controller: 0,
            panel_area: Cell::new(None),
            composer_area: Cell::new(None),
        }
    }

    pub fn affordance(&self) -> &Affordance {
        &self.affordance
    }

    pub fn focus(&self) -> PanelFocus {
        self.focus
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Dispose whatever is mounted. Selection state goes with it.
    pub fn teardown(&mut self) {
        if let Affordance::Gated(gated) = &mut self.affordance {
            gated.controller.dispose();
        }
        self.affordance = Affordance::None;
        self.suspended = false;
        self.panel_area.set(None);
    }

    /// Replace the current affordance with the one `directive` declares.
    pub fn mount(&mut self, directive: TurnDirective, composer: &mut ConversationComposer) {
        self.teardown();

        let TurnDirective {
            input_type,
            options,
            current_text,
            results,
            pdf_download_url,
        } = directive;
        let options = offered_options(&input_type, options);

        let (affordance, placeholder) = match input_type {
            InputType::Options | InputType::Preview if !options.is_empty() => {
                (Affordance::Choices(ChoiceList::new(options)), "Или введите свой ответ...")
            }
            InputType::Multiselect if !options.is_empty() => {
                (Affordance::Checklist(Checklist::new(options)), "Или введите свой ответ...")
            }
            InputType::Options | InputType::Preview | InputType::Multiselect | InputType::Text => {
                (Affordance::FreeText { long_form: false }, "Введите ответ...")
            }
            InputType::Textarea => (Affordance::FreeText { long_form: true }, "Опишите подробно..."),
            InputType::Autocomplete(entity) => {
                self.next_controller += 1;
                let controller = AutocompleteController::new(
                    self.next_controller,
                    entity,
                    Arc::clone(&self.source),
                    self.events.clone(),
                    self.settings,
                );
                (
                    Affordance::Gated(GatedInput {
                        entity,
                        controller,
                        selection: None,
                    }),
                    entity.placeholder(),
                )
            }
            InputType::SendingResults => (
                Affordance::Results(ResultsView::new(results, pdf_download_url, &self.endpoints)),
                "/restart - новая жалоба, /help - команды",
            ),
            InputType::Other(tag) => {
                if !tag.is_empty() {
                    tracing::warn!(input_type = %tag, "Unknown input type, using plain text");
                }
                (Affordance::Fallback, "Введите ответ...")
            }
        };

        tracing::info!(affordance = affordance.name(), "Affordance mounted");
        self.affordance = affordance;
        self.focus = if self.affordance.has_panel() {
            PanelFocus::Panel
        } else {
            PanelFocus::Composer
        };

        composer.set_text(&current_text);
        composer.set_placeholder(placeholder);
        if let Affordance::Gated(gated) = &mut self.affordance {
            gated.controller.on_focus(&current_text);
        }
        self.sync_composer(composer);
    }

    /// Whether the current text may be sent with the mounted affordance.
    pub fn send_enabled(&self, text: &str) -> bool {
        let has_text = !text.trim().is_empty();
        match &self.affordance {
            Affordance::Results(_) => false,
            Affordance::Gated(gated) => has_text && gated.selection.is_some(),
            _ => has_text,
        }
    }

    /// Why sending is blocked, if the gate is the reason.
    pub fn blocked_hint(&self, text: &str) -> Option<String> {
        match &self.affordance {
            Affordance::Gated(gated) if gated.selection.is_none() && !text.trim().is_empty() => {
                Some(gated.entity.requirement_label().to_string())
            }
            _ => None,
        }
    }

    /// Requirement indicator of a gated input: label and whether it is satisfied.
    pub fn indicator(&self) -> Option<(&'static str, bool)> {
        match &self.affordance {
            Affordance::Gated(gated) => Some(match gated.selection {
                Some(_) => (READY_LABEL, true),
                None => (gated.entity.requirement_label(), false),
            }),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<&AutocompleteSelection> {
        match &self.affordance {
            Affordance::Gated(gated) => gated.selection.as_ref(),
            _ => None,
        }
    }

    /// Structured data for the next request. Consumed by the call.
    pub fn take_structured_data(&mut self) -> Option<Value> {
        match &mut self.affordance {
            Affordance::Gated(gated) => gated.selection.take().map(|s| s.item.structured_data()),
            _ => None,
        }
    }

    /// The composer text changed by typing or pasting.
    pub fn on_text_changed(&mut self, composer: &mut ConversationComposer) {
        let text = composer.content().to_string();
        if let Affordance::Gated(gated) = &mut self.affordance {
            if gated.selection.as_ref().is_some_and(|s| s.text != text) {
                tracing::debug!("Text edited after selection, gate closed again");
                gated.selection = None;
            }
            gated.controller.on_input(&text);
        }
        self.sync_composer(composer);
    }

    pub fn on_focus_gained(&mut self, composer: &ConversationComposer) {
        if self.focus == PanelFocus::Composer {
            if let Affordance::Gated(gated) = &mut self.affordance {
                gated.controller.on_focus(composer.content());
            }
        }
    }

    pub fn on_focus_lost(&mut self) {
        if let Affordance::Gated(gated) = &mut self.affordance {
            gated.controller.on_blur();
        }
    }

    /// Route a timer or lookup completion. Events for a controller that is
    /// no longer mounted are dropped.
    pub fn on_autocomplete_event(&mut self, event: AutocompleteEvent) -> bool {
        match &mut self.affordance {
            Affordance::Gated(gated) => gated.controller.handle_event(event),
            _ => {
                tracing::debug!(controller = event.controller(), "No gated input mounted, dropping event");
                false
            }
        }
    }

    /// Hide the panel while a submission is in flight.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    fn apply_commit(&mut self, commit: Commit, composer: &mut ConversationComposer) -> InputOutcome {
        composer.set_text(&commit.text);
        if let Affordance::Gated(gated) = &mut self.affordance {
            gated.selection = Some(AutocompleteSelection {
                item: commit.item.clone(),
                text: commit.text,
            });
        }
        self.sync_composer(composer);
        InputOutcome::Committed(commit.item)
    }

    /// Push send-eligibility and focus into the composer.
    pub fn sync_composer(&self, composer: &mut ConversationComposer) {
        let text = composer.content();
        let enabled = self.send_enabled(text);
        let hint = self.blocked_hint(text);
        composer.set_send_state(enabled, hint);
        composer.set_focus(self.focus == PanelFocus::Composer || self.suspended);
    }

    fn set_focus(&mut self, focus: PanelFocus, composer: &mut ConversationComposer) {
        self.focus = focus;
        self.sync_composer(composer);
    }

    pub fn handle_key(&mut self, key: KeyEvent, composer: &mut ConversationComposer) -> InputOutcome {
        if let Affordance::Gated(gated) = &mut self.affordance {
            match gated.controller.handle_key(key) {
                AutocompleteAction::Committed(commit) => return self.apply_commit(commit, composer),
                AutocompleteAction::Consumed => return InputOutcome::Idle,
                AutocompleteAction::Ignored => {}
            }
        }

        let panel_live = self.affordance.has_panel() && !self.suspended;
        if key.code == KeyCode::Tab && panel_live && !composer.palette_open() {
            let next = match self.focus {
                PanelFocus::Panel => PanelFocus::Composer,
                PanelFocus::Composer => PanelFocus::Panel,
            };
            self.set_focus(next, composer);
            return InputOutcome::Idle;
        }

        if panel_live && self.focus == PanelFocus::Panel {
            let outcome = match &mut self.affordance {
                Affordance::Choices(list) => panel_outcome(list.handle_key(key)),
                Affordance::Checklist(checklist) => panel_outcome(checklist.handle_key(key)),
                Affordance::Results(view) => results_outcome(view.handle_key(key)),
                _ => None,
            };
            match outcome {
                Some(outcome) => return outcome,
                None => {
                    let printable = matches!(key.code, KeyCode::Char(_))
                        && !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
                    if !printable {
                        return InputOutcome::Idle;
                    }
                    self.set_focus(PanelFocus::Composer, composer);
                }
            }
        }

        match composer.handle_key(key) {
            ComposerResult::Submitted(text) => InputOutcome::SendTyped(text),
            ComposerResult::Command(command) => InputOutcome::Command(command),
            ComposerResult::Changed => {
                self.on_text_changed(composer);
                InputOutcome::Idle
            }
            ComposerResult::Consumed | ComposerResult::Ignored => InputOutcome::Idle,
        }
    }

    /// Pasted text always goes to the composer.
    pub fn handle_paste(&mut self, text: &str, composer: &mut ConversationComposer) {
        self.focus = PanelFocus::Composer;
        if composer.insert_str(text) == ComposerResult::Changed {
            self.on_text_changed(composer);
        } else {
            self.sync_composer(composer);
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, composer: &mut ConversationComposer) -> InputOutcome {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved => {
                if let Affordance::Gated(gated) = &mut self.affordance {
                    gated.controller.on_pointer_move(column, row);
                }
                InputOutcome::Idle
            }
            MouseEventKind::Down(MouseButton::Left) => self.click(column, row, composer),
            _ => InputOutcome::Idle,
        }
    }

    fn click(&mut self, column: u16, row: u16, composer: &mut ConversationComposer) -> InputOutcome {
        let on_composer = self.composer_area.get().is_some_and(|area| hit(area, column, row));

        if let Affordance::Gated(gated) = &mut self.affordance {
            if let Some(commit) = gated.controller.on_click(column, row) {
                return self.apply_commit(commit, composer);
            }
            if on_composer {
                gated.controller.on_focus(composer.content());
            } else if !gated.controller.pointer_over_dropdown() {
                gated.controller.on_blur();
            }
        }

        if on_composer {
            self.set_focus(PanelFocus::Composer, composer);
            return InputOutcome::Idle;
        }

        let on_panel = self.panel_area.get().is_some_and(|area| hit(area, column, row));
        if !on_panel || self.suspended {
            return InputOutcome::Idle;
        }
        self.set_focus(PanelFocus::Panel, composer);
        let outcome = match &mut self.affordance {
            Affordance::Choices(list) => panel_outcome(list.click(column, row)),
            Affordance::Checklist(checklist) => panel_outcome(checklist.click(column, row)),
            Affordance::Results(view) => results_outcome(view.click(column, row)),
            _ => None,
        };
        outcome.unwrap_or(InputOutcome::Idle)
    }

    /// Rows wanted for the panel above the composer, indicator included.
    pub fn panel_height(&self) -> u16 {
        if self.suspended {
            return 0;
        }
        match &self.affordance {
            Affordance::Choices(list) => list.desired_height(),
            Affordance::Checklist(checklist) => checklist.desired_height(),
            Affordance::Results(_) => u16::MAX,
            Affordance::Gated(_) => 1,
            _ => 0,
        }
    }

    /// Draw the panel (if any) into `panel` and the composer into `composer_area`.
    pub fn render(
        &self,
        panel: Rect,
        composer_area: Rect,
        composer: &ConversationComposer,
        buf: &mut Buffer,
    ) {
        self.composer_area.set(Some(composer_area));
        let focused = self.focus == PanelFocus::Panel;
        let panel_area = (!self.suspended && panel.height > 0).then_some(panel);
        self.panel_area.set(panel_area);

        if let Some(panel) = panel_area {
            match &self.affordance {
                Affordance::Choices(list) => list.render(panel, buf, focused),
                Affordance::Checklist(checklist) => checklist.render(panel, buf, focused),
                Affordance::Results(view) => view.render(panel, buf, focused),
                Affordance::Gated(_) => {
                    if let Some((label, ready)) = self.indicator() {
                        let (icon, color) = if ready { ("✓", Color::Green) } else { ("⚠", Color::Yellow) };
                        let line = Line::from(Span::styled(
                            format!(" {} {}", icon, label),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ));
                        buf.set_line(panel.x, panel.y, &line, panel.width);
                    }
                }
                _ => {}
            }
        }

        composer.render(composer_area, buf);
    }

    /// Draw the suggestion dropdown over whatever is above the composer.
    pub fn render_dropdown(&self, buf: &mut Buffer) {
        if let (Affordance::Gated(gated), Some(anchor)) = (&self.affordance, self.composer_area.get()) {
            gated.controller.render_dropdown(anchor, buf);
        }
    }
}

/// Options a panel may list. Without an id there is nothing to send, and a
/// checklist never lists the custom-answer entry.
fn offered_options(input_type: &InputType, options: Vec<ChoiceOption>) -> Vec<ChoiceOption> {
    options
        .into_iter()
        .filter(|option| {
            if !option.is_submittable() {
                tracing::warn!(text = %option.text, "Option without id skipped");
                return false;
            }
            !(*input_type == InputType::Multiselect && option.id == CUSTOM_OPTION_ID)
        })
        .collect()
}

fn panel_outcome(action: PanelAction) -> Option<InputOutcome> {
    match action {
        PanelAction::Submit(submission) => Some(InputOutcome::Submit(submission)),
        PanelAction::Consumed => Some(InputOutcome::Idle),
        PanelAction::Ignored => None,
    }
}

fn results_outcome(action: ResultsAction) -> Option<InputOutcome> {
    match action {
        ResultsAction::OpenEmail(index) => Some(InputOutcome::OpenEmail(index)),
        ResultsAction::RequestRestart => Some(InputOutcome::RequestRestart),
        ResultsAction::Consumed => Some(InputOutcome::Idle),
        ResultsAction::Ignored => None,
    }
}
