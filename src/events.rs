use serde::{Deserialize, Serialize};

use crate::api::types::{ChatResponse, StateResponse};
use crate::error::ApiError;
use crate::suggest::SuggestionItem;

/// Internal application events. Everything that mutates UI state arrives
/// through this enum and is handled on the loop task.
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input
    Tui(TuiEvent),

    /// `/state` finished; `generation` identifies the load that was issued
    StateLoaded {
        generation: u64,
        result: Result<StateResponse, ApiError>,
    },

    /// `/chat` finished
    ChatFinished(Result<ChatResponse, ApiError>),

    /// `/back` finished
    BackFinished(Result<(), ApiError>),

    /// `/restart` or `/reset` finished
    RestartFinished(Result<(), ApiError>),

    /// Timer or lookup completion for an autocomplete controller
    Autocomplete(AutocompleteEvent),
}

/// Completions posted by an autocomplete controller's background tasks.
/// Each carries the id of the controller that spawned it so that events
/// for a disposed controller can be dropped.
#[derive(Debug, Clone)]
pub enum AutocompleteEvent {
    /// The debounce timer for `generation` ran to completion
    DebounceElapsed { controller: u64, generation: u64 },

    /// A lookup issued with sequence number `seq` returned
    SuggestionsLoaded {
        controller: u64,
        seq: u64,
        items: Vec<SuggestionItem>,
    },

    /// The deferred hide scheduled on blur is due
    BlurElapsed { controller: u64, generation: u64 },
}

impl AutocompleteEvent {
    pub fn controller(&self) -> u64 {
        match self {
            AutocompleteEvent::DebounceElapsed { controller, .. }
            | AutocompleteEvent::SuggestionsLoaded { controller, .. }
            | AutocompleteEvent::BlurElapsed { controller, .. } => *controller,
        }
    }
}

/// TUI-specific events (keyboard, mouse, etc.)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Mouse event
    Mouse(crossterm::event::MouseEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// Terminal window gained focus
    FocusGained,

    /// Terminal window lost focus
    FocusLost,
}

/// Role in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ConversationRole {
    User,
    Assistant,
    System,
}

impl From<String> for ConversationRole {
    fn from(role: String) -> Self {
        match role.as_str() {
            "user" => ConversationRole::User,
            "assistant" => ConversationRole::Assistant,
            _ => ConversationRole::System,
        }
    }
}

impl ConversationRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ConversationRole::User => "Вы",
            ConversationRole::Assistant => "Юридический помощник",
            ConversationRole::System => "Система",
        }
    }
}
