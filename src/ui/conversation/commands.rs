use std::str::FromStr;

use crate::escalation::EscalationChoice;
use crate::events::Sentiment;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start a new conversation
    New,
    /// Refresh the session list
    Sessions,
    /// Open a session from the sidebar
    Open,
    /// Delete a session
    Delete,
    /// Mark an answer as helpful
    Good,
    /// Mark an answer as unhelpful
    Bad,
    /// Escalate to a human
    Yes,
    /// Decline escalation
    No,
    /// Export the conversation as HTML
    Export,
    /// Sign out and exit
    Signout,
    /// Show help
    Help,
    /// Exit the application
    Bye,
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

    /// 1-based index argument as used by `/open 2` or `/good 3`
    pub fn index(&self) -> Option<usize> {
        self.argument()?
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
    }

    pub fn sentiment(&self) -> Option<Sentiment> {
        match self.command {
            SlashCommand::Good => Some(Sentiment::Positive),
            SlashCommand::Bad => Some(Sentiment::Negative),
            _ => None,
        }
    }

    pub fn escalation_choice(&self) -> Option<EscalationChoice> {
        match self.command {
            SlashCommand::Yes => Some(EscalationChoice::Yes),
            SlashCommand::No => Some(EscalationChoice::No),
            _ => None,
        }
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::New => "start a new conversation",
            SlashCommand::Sessions => "refresh the conversation list",
            SlashCommand::Open => "open conversation <n> from the sidebar",
            SlashCommand::Delete => "delete conversation <n> (default: the open one)",
            SlashCommand::Good => "mark answer <n> as helpful (default: the latest)",
            SlashCommand::Bad => "mark answer <n> as unhelpful (default: the latest)",
            SlashCommand::Yes => "raise the issue with a human",
            SlashCommand::No => "dismiss the escalation prompt",
            SlashCommand::Export => "save the conversation as HTML [path]",
            SlashCommand::Signout => "sign out and exit",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Whether this command can be run while an answer is pending.
    pub fn available_while_loading(self) -> bool {
        !matches!(
            self,
            SlashCommand::Good | SlashCommand::Bad | SlashCommand::Yes | SlashCommand::No
        )
    }
}

/// Return all built-in commands in a Vec paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim().strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let rest: Vec<String> = parts.map(|s| s.to_string()).collect();

    let command = SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Some(SlashCommand::Bye),
        "logout" | "sign-out" => Some(SlashCommand::Signout),
        "up" | "+" => Some(SlashCommand::Good),
        "down" | "-" => Some(SlashCommand::Bad),
        "ls" | "list" => Some(SlashCommand::Sessions),
        "rm" => Some(SlashCommand::Delete),
        "h" | "?" => Some(SlashCommand::Help),
        _ => None,
    })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str("\nAliases: /q for /bye, /+ and /- for /good and /bad, /ls for /sessions, /rm for /delete.");
    help.push_str("\nAnswers and conversations are numbered as shown on screen.");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_argument() {
        let parsed = parse_slash_command("/open 3").unwrap();
        assert_eq!(parsed.command, SlashCommand::Open);
        assert_eq!(parsed.index(), Some(3));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(parse_slash_command("/q").unwrap().command, SlashCommand::Bye);
        assert_eq!(parse_slash_command("/+").unwrap().sentiment(), Some(Sentiment::Positive));
        assert_eq!(parse_slash_command("/rm 2").unwrap().command, SlashCommand::Delete);
    }

    #[test]
    fn test_non_commands() {
        assert!(parse_slash_command("hello /open").is_none());
        assert!(parse_slash_command("/frobnicate").is_none());
        assert!(parse_slash_command("/").is_none());
    }

    #[test]
    fn test_index_rejects_zero_and_text() {
        assert_eq!(parse_slash_command("/good 0").unwrap().index(), None);
        assert_eq!(parse_slash_command("/good last").unwrap().index(), None);
        assert_eq!(parse_slash_command("/good").unwrap().index(), None);
    }

    #[test]
    fn test_escalation_choice() {
        assert_eq!(
            parse_slash_command("/yes").unwrap().escalation_choice(),
            Some(EscalationChoice::Yes)
        );
        assert_eq!(parse_slash_command("/bye").unwrap().escalation_choice(), None);
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = get_help_text();
        for entry in command_entries() {
            assert!(help.contains(&format!("/{}", entry.keyword)));
        }
    }
}
