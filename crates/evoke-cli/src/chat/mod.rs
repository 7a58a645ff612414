//! Interactive chat: banner, session table, input loop.

pub mod commands;
pub mod input;
pub mod loop_runner;

pub use loop_runner::run_chat_loop;

use comfy_table::{ContentArrangement, Table};
use console::style;

use evoke_types::session::{Session, SessionRegistry};

/// Print the welcome banner for a chat session.
pub fn print_welcome_banner(session: &Session, user_id: &str) {
    println!();
    println!(
        "  {} {}",
        style("Evoke").cyan().bold(),
        style("-- your assistant, one connection away").dim()
    );
    println!(
        "  {} {}  {} {}",
        style("session:").dim(),
        style(session.id).dim(),
        style("user:").dim(),
        style(user_id).dim()
    );
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit.").dim()
    );
    println!();
}

/// Render the registry as a numbered table (newest first).
pub fn print_session_table(registry: &SessionRegistry) {
    if registry.is_empty() {
        println!("  no sessions yet");
        return;
    }

    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Title", "Messages", "Updated", "Preview"]);
    for (index, session) in registry.sessions().iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            session.title.clone(),
            session.message_count.to_string(),
            session.last_updated.format("%Y-%m-%d %H:%M").to_string(),
            session.preview.clone(),
        ]);
    }
    println!("{table}");
}

/// Print one message the way the transcript renders it.
pub fn format_message(message: &evoke_types::message::Message) -> String {
    use evoke_types::message::Role;
    let label = match message.role {
        Role::User => style("You >").green().bold(),
        Role::Assistant => style("AI  >").magenta().bold(),
    };
    format!(
        "  {} {} {}",
        label,
        message.content,
        style(message.timestamp.format("%H:%M")).dim()
    )
}
