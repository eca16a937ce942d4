//! Wire types of the conversation API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::events::ConversationRole;
use crate::suggest::EntityType;

/// Input affordance declared by the server for the next user action.
///
/// An empty tag means options, like a missing one. Unknown tags map to
/// [`InputType::Other`] rather than to any of the specific variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum InputType {
    Text,
    Textarea,
    #[default]
    Options,
    Preview,
    Multiselect,
    Autocomplete(EntityType),
    SendingResults,
    Other(String),
}

impl From<String> for InputType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "" => InputType::default(),
            "text" => InputType::Text,
            "textarea" => InputType::Textarea,
            "options" => InputType::Options,
            "preview" => InputType::Preview,
            "multiselect" => InputType::Multiselect,
            "sending_results" => InputType::SendingResults,
            _ => match tag.strip_prefix("autocomplete_").map(str::parse::<EntityType>) {
                Some(Ok(entity)) => InputType::Autocomplete(entity),
                _ => InputType::Other(tag),
            },
        }
    }
}

impl From<InputType> for String {
    fn from(input_type: InputType) -> Self {
        match input_type {
            InputType::Text => "text".to_string(),
            InputType::Textarea => "textarea".to_string(),
            InputType::Options => "options".to_string(),
            InputType::Preview => "preview".to_string(),
            InputType::Multiselect => "multiselect".to_string(),
            InputType::Autocomplete(entity) => format!("autocomplete_{}", entity.as_path()),
            InputType::SendingResults => "sending_results".to_string(),
            InputType::Other(tag) => tag,
        }
    }
}

/// A recipient or category the user can pick.
///
/// `id` is what gets transmitted, `text` is what gets shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub effectiveness: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub working_hours: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub submission_methods: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub auth_required: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub processing_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub documents_needed: Vec<String>,
    #[serde(default)]
    pub tips: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub portal_name: Option<String>,
}

impl ChoiceOption {
    /// Options without an id have nothing to transmit and are never offered.
    pub fn is_submittable(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Reason or description line, whichever the server sent.
    pub fn summary(&self) -> Option<&str> {
        self.reason.as_deref().or(self.description.as_deref())
    }
}

/// Per-recipient entry of the terminal `sending_results` turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendingResult {
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub working_hours: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub processing_time: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub portal_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub auth_required: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mailto_link: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub documents_needed: Vec<String>,
    #[serde(default)]
    pub tips: Option<String>,
}

impl SendingResult {
    /// Identifier used to reference this recipient's PDF.
    pub fn artifact_key(&self) -> &str {
        self.recipient_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(self.id.as_deref())
            .unwrap_or("")
    }

    pub fn display_name(&self) -> &str {
        self.recipient_name.as_deref().unwrap_or("Получатель")
    }
}

/// One message of the transcript as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: ConversationRole,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub input_type: Option<InputType>,
    #[serde(default)]
    pub options: Option<Vec<ChoiceOption>>,
}

/// `GET /state`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateResponse {
    #[serde(default)]
    pub history: Vec<Turn>,
}

/// `POST /chat` request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_data: Option<Value>,
}

/// `POST /chat` response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub input_type: Option<InputType>,
    #[serde(default)]
    pub options: Option<Vec<ChoiceOption>>,
    #[serde(default)]
    pub current_text: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<SendingResult>>,
    #[serde(default)]
    pub pdf_download_url: Option<String>,
    #[serde(default)]
    pub can_go_back: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /back` response body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /restart` and `POST /reset` response body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResetResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Accept a string, number or boolean where the server is loose about types.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(true)) => Some("да".to_string()),
        _ => None,
    })
}

/// Accept a list of strings, a single string, or null.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(text)) if !text.trim().is_empty() => vec![text],
        _ => Vec::new(),
    })
}
