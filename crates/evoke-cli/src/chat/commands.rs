//! Slash commands available inside the chat loop.

use console::style;

/// A parsed slash command.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    New,
    Sessions,
    Switch(usize),
    History,
    Delete(usize),
    Clear,
    Exit,
    Unknown(String),
}

/// Parse a slash command. Returns `None` for plain chat input.
pub fn parse(text: &str) -> Option<ChatCommand> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let mut parts = text.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next();

    let parsed = match command {
        "/help" => ChatCommand::Help,
        "/new" => ChatCommand::New,
        "/sessions" => ChatCommand::Sessions,
        "/switch" => match arg.and_then(|a| a.parse().ok()) {
            Some(n) => ChatCommand::Switch(n),
            None => ChatCommand::Unknown("usage: /switch <number>".to_string()),
        },
        "/history" => ChatCommand::History,
        "/delete" => match arg.and_then(|a| a.parse().ok()) {
            Some(n) => ChatCommand::Delete(n),
            None => ChatCommand::Unknown("usage: /delete <message number>".to_string()),
        },
        "/clear" => ChatCommand::Clear,
        "/exit" | "/quit" => ChatCommand::Exit,
        other => ChatCommand::Unknown(format!("unknown command: {other}")),
    };
    Some(parsed)
}

/// Print the command reference.
pub fn print_help() {
    println!();
    println!("  {}", style("Commands").bold());
    let entries = [
        ("/new", "start a new chat session"),
        ("/sessions", "list all sessions"),
        ("/switch <n>", "switch to session <n> from the list"),
        ("/history", "show the current session's messages"),
        ("/delete <n>", "delete message <n> from the current session"),
        ("/clear", "clear the screen"),
        ("/exit", "leave the chat"),
        ("/help", "show this help"),
    ];
    for (cmd, description) in entries {
        println!("  {:<14} {}", style(cmd).cyan(), style(description).dim());
    }
    println!();
}
