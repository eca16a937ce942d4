//! Client side of the remote conversation API.

pub mod client;
pub mod routes;
pub mod types;

pub use client::{http_client, ConversationApi, HttpConversationClient};
pub use routes::{ApiVersion, Endpoints};
pub use types::{
    ChatRequest, ChatResponse, ChoiceOption, InputType, SendingResult, StateResponse, Turn,
};
