use anyhow::{Context, Result};

use crate::api::client::{http_client, ConversationApi, HttpConversationClient};
use crate::api::routes::Endpoints;
use crate::config::Config;
use crate::events::ConversationRole;
use crate::suggest::{EntityType, HttpSuggestionClient, SuggestionItem, SuggestionSource};

fn endpoints(config: &Config) -> Result<Endpoints> {
    Endpoints::new(&config.server_url, &config.entry_path)
        .with_context(|| format!("Invalid server URL: {}", config.server_url))
}

fn client(config: &Config) -> Result<reqwest::Client> {
    http_client(config.request_timeout()).context("Failed to build HTTP client")
}

/// One line per suggestion, companies with INN and address.
pub fn format_suggestion(item: &SuggestionItem) -> String {
    match item.detail() {
        Some(detail) => format!("{}  ({})", item.display_text(), detail),
        None => item.display_text().to_string(),
    }
}

pub async fn suggest(config: &Config, entity: EntityType, query: &str) -> Result<()> {
    let query = query.trim();
    if query.chars().count() < config.autocomplete.min_query_len {
        println!(
            "Запрос слишком короткий: нужно не меньше {} символов.",
            config.autocomplete.min_query_len
        );
        return Ok(());
    }

    let source = HttpSuggestionClient::new(client(config)?, endpoints(config)?);
    let items = source.search(entity, query).await;
    if items.is_empty() {
        println!("Ничего не найдено.");
        return Ok(());
    }
    for item in &items {
        println!("{}", format_suggestion(item));
    }
    Ok(())
}

pub async fn transcript(config: &Config) -> Result<()> {
    let api = HttpConversationClient::new(client(config)?, endpoints(config)?);
    let state = api
        .state()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Failed to load conversation state")?;

    if state.history.is_empty() {
        println!("Диалог пуст.");
        return Ok(());
    }

    println!("Шаг {}", state.history.len() / 2);
    println!("{}", "=".repeat(50));
    for turn in &state.history {
        let marker = match turn.role {
            ConversationRole::User => "👤",
            ConversationRole::Assistant => "⚖",
            ConversationRole::System => "⚙",
        };
        println!("{} {}:", marker, turn.role.display_name());
        for line in turn.content.lines() {
            println!("   {}", line);
        }
        println!();
    }
    Ok(())
}

pub fn config_init(config: &Config) -> Result<()> {
    let path = config.save()?;
    println!("Настройки сохранены: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_company_suggestion() {
        let item = SuggestionItem::from_json(
            EntityType::Company,
            json!({ "name": "ООО Ромашка", "inn": "7701", "address": "Москва" }),
        )
        .unwrap();
        assert_eq!(format_suggestion(&item), "ООО Ромашка  (ИНН: 7701 · Москва)");

        let item = SuggestionItem::from_json(EntityType::Fio, json!({ "value": "Иванов Иван" })).unwrap();
        assert_eq!(format_suggestion(&item), "Иванов Иван");
    }

    #[test]
    fn test_invalid_server_url() {
        let config = Config {
            server_url: "not a url".into(),
            ..Default::default()
        };
        assert!(endpoints(&config).is_err());
    }
}
