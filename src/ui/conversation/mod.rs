//! Conversation UI components for the intake wizard

pub mod autocomplete;
pub mod choices;
pub mod commands;
pub mod composer;
pub mod history;
pub mod input_area;
pub mod manager;
pub mod markup;
pub mod notices;
pub mod progress;
pub mod results;

pub use autocomplete::{AutocompleteController, AutocompletePhase, AutocompleteSettings};
pub use commands::{get_help_text, parse_slash_command, ParsedCommand, SlashCommand};
pub use composer::{ComposerResult, ConversationComposer};
pub use history::ConversationHistory;
pub use input_area::{Affordance, InputArea, InputOutcome, Submission, TurnDirective};
pub use manager::{ConversationManager, Overlay};
pub use notices::{NoticeBoard, NoticeLevel};
pub use progress::StepProgress;
pub use results::EmailDraft;
