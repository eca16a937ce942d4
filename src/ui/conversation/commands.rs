use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Go back one step
    Back,
    /// Start the complaint over
    Restart,
    /// Compose an email for a result card
    Email,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Zero-based result card index for `/email <n>` (the user types 1-based).
    pub fn email_index(&self) -> Option<usize> {
        if self.command != SlashCommand::Email {
            return None;
        }
        let n: usize = self.argument()?.trim().parse().ok()?;
        n.checked_sub(1)
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Back => "вернуться на шаг назад",
            SlashCommand::Restart => "начать жалобу заново",
            SlashCommand::Email => "письмо получателю №n из результатов",
            SlashCommand::Help => "показать команды и клавиши",
            SlashCommand::Quit => "выйти",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim().strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let tail: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(&head)
        .ok()
        .or_else(|| match head.as_str() {
            "q" | "exit" => Some(SlashCommand::Quit),
            "b" => Some(SlashCommand::Back),
            "new" | "reset" => Some(SlashCommand::Restart),
            "h" | "?" => Some(SlashCommand::Help),
            _ => None,
        })?;

    let argument = if tail.is_empty() {
        None
    } else {
        Some(tail.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Команды:\n\n");
    for entry in command_entries() {
        help.push_str(&format!("/{} - {}\n", entry.keyword, entry.description));
    }

    help.push_str("\nКлавиши:\n\n");
    help.push_str("Enter - отправить или выбрать\n");
    help.push_str("Shift+Enter / Alt+Enter - новая строка\n");
    help.push_str("Tab - переключить список и поле ввода\n");
    help.push_str("1-9 - быстрый выбор, Space - отметить пункт\n");
    help.push_str("Ctrl+B - назад, Ctrl+R - заново\n");
    help.push_str("PgUp/PgDn - прокрутка, Esc - закрыть, Ctrl+C - выход\n");
    help.push_str("\nСокращения: /q, /b, /new");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        let parsed = parse_slash_command("/back").unwrap();
        assert_eq!(parsed.command, SlashCommand::Back);
        assert_eq!(parsed.argument, None);

        assert_eq!(parse_slash_command("/q").unwrap().command, SlashCommand::Quit);
        assert_eq!(parse_slash_command("/new").unwrap().command, SlashCommand::Restart);
        assert_eq!(parse_slash_command(" /HELP ").unwrap().command, SlashCommand::Help);
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert!(parse_slash_command("ЖКХ").is_none());
        assert!(parse_slash_command("/").is_none());
        assert!(parse_slash_command("/unknown").is_none());
    }

    #[test]
    fn test_email_index_is_one_based() {
        assert_eq!(parse_slash_command("/email 2").unwrap().email_index(), Some(1));
        assert_eq!(parse_slash_command("/email 0").unwrap().email_index(), None);
        assert_eq!(parse_slash_command("/email").unwrap().email_index(), None);
        assert_eq!(parse_slash_command("/back 2").unwrap().email_index(), None);
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = get_help_text();
        for entry in command_entries() {
            assert!(help.contains(&format!("/{}", entry.keyword)));
        }
    }
}
