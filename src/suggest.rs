//! Typeahead lookups against `/api/suggest/{entity}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

use crate::api::routes::Endpoints;

/// Kinds of entities the suggestion endpoint can resolve.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum EntityType {
    /// Organizations, searched by name or INN
    Company,
    /// Postal addresses
    Address,
    /// Full personal names
    Fio,
}

impl EntityType {
    /// Path segment used by the suggestion endpoint.
    pub fn as_path(self) -> &'static str {
        self.into()
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            EntityType::Company => "Введите ИНН или название организации...",
            EntityType::Address => "Начните вводить адрес...",
            EntityType::Fio => "Введите ФИО...",
        }
    }

    /// Text of the persistent "pick from the list" indicator.
    pub fn requirement_label(self) -> &'static str {
        match self {
            EntityType::Company => "Выберите организацию из списка",
            EntityType::Address => "Выберите адрес из подсказок",
            EntityType::Fio => "Выберите ФИО из подсказок",
        }
    }
}

/// Organization returned by the company lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySuggestion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ogrn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kpp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Remaining fields (region, director, ...) carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Address or full-name suggestion: a single display value plus whatever
/// structured parts the server attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSuggestion {
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a suggestion list. The shape depends on the entity type.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionItem {
    Company(CompanySuggestion),
    Address(ValueSuggestion),
    Fio(ValueSuggestion),
}

impl SuggestionItem {
    /// Decode a raw suggestion according to the entity type it was requested for.
    pub fn from_json(entity: EntityType, raw: Value) -> Option<Self> {
        let item = match entity {
            EntityType::Company => SuggestionItem::Company(serde_json::from_value(raw).ok()?),
            EntityType::Address => SuggestionItem::Address(serde_json::from_value(raw).ok()?),
            EntityType::Fio => SuggestionItem::Fio(serde_json::from_value(raw).ok()?),
        };
        Some(item)
    }

    pub fn entity(&self) -> EntityType {
        match self {
            SuggestionItem::Company(_) => EntityType::Company,
            SuggestionItem::Address(_) => EntityType::Address,
            SuggestionItem::Fio(_) => EntityType::Fio,
        }
    }

    /// Text written into the input when the item is committed.
    pub fn display_text(&self) -> &str {
        match self {
            SuggestionItem::Company(company) => &company.name,
            SuggestionItem::Address(value) | SuggestionItem::Fio(value) => &value.value,
        }
    }

    /// Secondary line shown under the item in the dropdown.
    pub fn detail(&self) -> Option<String> {
        match self {
            SuggestionItem::Company(company) => {
                let mut parts = Vec::new();
                if let Some(inn) = company.inn.as_deref().filter(|inn| !inn.is_empty()) {
                    parts.push(format!("ИНН: {}", inn));
                }
                if let Some(address) = company.address.as_deref().filter(|a| !a.is_empty()) {
                    parts.push(address.to_string());
                }
                (!parts.is_empty()).then(|| parts.join(" · "))
            }
            SuggestionItem::Address(value) => value
                .extra
                .get("postal_code")
                .and_then(Value::as_str)
                .filter(|code| !code.is_empty())
                .map(|code| format!("Индекс: {}", code)),
            SuggestionItem::Fio(_) => None,
        }
    }

    /// Structured data attached to the next `/chat` request as `company_data`.
    pub fn structured_data(&self) -> Value {
        match self {
            SuggestionItem::Company(company) => {
                serde_json::to_value(company).unwrap_or_else(|_| json!({ "name": company.name }))
            }
            SuggestionItem::Address(value) => json!({ "address": value.value }),
            SuggestionItem::Fio(value) => json!({ "fio": value.value }),
        }
    }

    /// Notice shown when the item is committed.
    pub fn selection_notice(&self) -> String {
        match self {
            SuggestionItem::Company(company) => format!("✓ {}", company.name),
            SuggestionItem::Address(_) => "✓ Адрес выбран".to_string(),
            SuggestionItem::Fio(value) => format!("✓ {}", value.value),
        }
    }
}

/// Source of typeahead suggestions.
///
/// Lookups never fail from the caller's point of view: transport errors and
/// non-success responses produce an empty list, indistinguishable from
/// "no matches".
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn search(&self, entity: EntityType, query: &str) -> Vec<SuggestionItem>;
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    suggestions: Vec<Value>,
}

/// HTTP implementation of [`SuggestionSource`].
#[derive(Clone)]
pub struct HttpSuggestionClient {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpSuggestionClient {
    pub fn new(client: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    async fn fetch(&self, entity: EntityType, query: &str) -> Result<Vec<SuggestionItem>, reqwest::Error> {
        let response = self
            .client
            .get(self.endpoints.suggest(entity, query))
            .send()
            .await?
            .error_for_status()?;
        let body: SuggestResponse = response.json().await?;
        Ok(decode_suggestions(entity, body.suggestions))
    }
}

#[async_trait]
impl SuggestionSource for HttpSuggestionClient {
    async fn search(&self, entity: EntityType, query: &str) -> Vec<SuggestionItem> {
        match self.fetch(entity, query).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, entity = entity.as_path(), "Suggestion lookup failed");
                Vec::new()
            }
        }
    }
}

/// Decode raw suggestions, dropping entries that do not match the entity shape.
pub fn decode_suggestions(entity: EntityType, raw: Vec<Value>) -> Vec<SuggestionItem> {
    raw.into_iter()
        .filter_map(|value| SuggestionItem::from_json(entity, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_entity_type_parsing() {
        assert_eq!(EntityType::from_str("company").unwrap(), EntityType::Company);
        assert_eq!(EntityType::from_str("fio").unwrap(), EntityType::Fio);
        assert!(EntityType::from_str("phone").is_err());
        assert_eq!(EntityType::Address.as_path(), "address");
    }

    #[test]
    fn test_company_structured_data_keeps_received_fields() {
        let item = SuggestionItem::from_json(
            EntityType::Company,
            json!({ "name": "ООО Ромашка", "inn": "123" }),
        )
        .unwrap();
        assert_eq!(item.display_text(), "ООО Ромашка");
        assert_eq!(item.structured_data(), json!({ "name": "ООО Ромашка", "inn": "123" }));
    }

    #[test]
    fn test_company_extra_fields_round_trip() {
        let raw = json!({
            "name": "ПАО Банк",
            "inn": "7700000000",
            "address": "г Москва",
            "director": "Иванов И.И."
        });
        let item = SuggestionItem::from_json(EntityType::Company, raw.clone()).unwrap();
        assert_eq!(item.structured_data(), raw);
        assert_eq!(item.detail().unwrap(), "ИНН: 7700000000 · г Москва");
    }

    #[test]
    fn test_address_and_fio_structured_data() {
        let address = SuggestionItem::from_json(
            EntityType::Address,
            json!({ "value": "г Казань, ул Баумана, д 1", "postal_code": "420111" }),
        )
        .unwrap();
        assert_eq!(address.structured_data(), json!({ "address": "г Казань, ул Баумана, д 1" }));
        assert_eq!(address.detail().unwrap(), "Индекс: 420111");
        assert_eq!(address.selection_notice(), "✓ Адрес выбран");

        let fio = SuggestionItem::from_json(EntityType::Fio, json!({ "value": "Петров Пётр" })).unwrap();
        assert_eq!(fio.structured_data(), json!({ "fio": "Петров Пётр" }));
        assert_eq!(fio.selection_notice(), "✓ Петров Пётр");
    }

    #[test]
    fn test_decode_drops_mismatched_entries() {
        let items = decode_suggestions(
            EntityType::Company,
            vec![json!({ "value": "no name field" }), json!({ "name": "ООО Лютик" })],
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].display_text(), "ООО Лютик");
        assert_eq!(items[0].entity(), EntityType::Company);
    }
}
