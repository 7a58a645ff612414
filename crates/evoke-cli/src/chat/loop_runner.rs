//! Main chat loop orchestration.
//!
//! Replays the current session's transcript, then alternates between user
//! input and slash commands. Assistant replies, reminders, and connectivity
//! changes arrive asynchronously through the engine event bus and are
//! rendered by a background task, so the loop never blocks on a reply --
//! sends are fire-and-forget, exactly like the engine underneath.

use std::io::Write;
use std::sync::Arc;

use console::style;
use rustyline_async::SharedWriter;
use tokio::sync::broadcast;

use evoke_types::error::ControllerError;
use evoke_types::event::EngineEvent;
use evoke_types::message::Role;

use crate::state::{EngineController, EngineHandle};

use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::{format_message, print_session_table, print_welcome_banner};

enum LoopAction {
    Continue,
    Exit,
}

/// Run the interactive chat loop until EOF or `/exit`.
pub async fn run_chat_loop(engine: &EngineHandle) -> anyhow::Result<()> {
    let controller = &engine.controller;

    let session = controller.current_session().await;
    print_welcome_banner(&session, &engine.config.user_id);
    for message in &session.messages {
        println!("{}", format_message(message));
    }
    println!();

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut input, writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("failed to initialize input: {e}"))?;

    let render = tokio::spawn(render_events(
        Arc::clone(controller),
        engine.events.subscribe(),
        writer,
    ));

    loop {
        match input.next().await {
            InputEvent::Exit => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Cancel => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Line(text) => {
                if text.is_empty() {
                    continue;
                }
                if let Some(command) = commands::parse(&text) {
                    match handle_command(controller, &mut input, command).await {
                        LoopAction::Continue => continue,
                        LoopAction::Exit => break,
                    }
                }
                match controller.append_user_message(&text).await {
                    Ok(_) => {}
                    Err(ControllerError::Busy) => {
                        println!(
                            "  {}",
                            style("still waiting for the previous reply...").dim()
                        );
                    }
                    // Empty input never reaches here (filtered above); an
                    // unknown current session cannot happen from this loop.
                    Err(_) => {}
                }
            }
        }
    }

    render.abort();
    Ok(())
}

async fn handle_command(
    controller: &EngineController,
    input: &mut ChatInput,
    command: ChatCommand,
) -> LoopAction {
    match command {
        ChatCommand::Help => commands::print_help(),
        ChatCommand::Exit => {
            println!("\n  {}", style("Session ended.").dim());
            return LoopAction::Exit;
        }
        ChatCommand::Clear => input.clear(),
        ChatCommand::New => {
            let session = controller.create_session().await;
            println!(
                "  {} {}",
                style("Started a new session").dim(),
                style(session.id).dim()
            );
        }
        ChatCommand::Sessions => {
            print_session_table(&controller.registry_snapshot().await);
        }
        ChatCommand::Switch(n) => {
            let registry = controller.registry_snapshot().await;
            let Some(session) = n.checked_sub(1).and_then(|i| registry.sessions().get(i))
            else {
                println!("  {}", style(format!("no session #{n}")).yellow());
                return LoopAction::Continue;
            };
            match controller.switch_session(&session.id).await {
                Ok(session) => {
                    println!("  {} {}", style("Switched to").dim(), session.title);
                    for message in &session.messages {
                        println!("{}", format_message(message));
                    }
                }
                Err(_) => {
                    println!("  {}", style(format!("no session #{n}")).yellow());
                }
            }
        }
        ChatCommand::History => {
            let session = controller.current_session().await;
            println!("  {}", style(&session.title).bold());
            for (index, message) in session.messages.iter().enumerate() {
                println!("  {:>3}. {}", index + 1, format_message(message).trim_start());
            }
        }
        ChatCommand::Delete(n) => {
            let id = controller.current_session_id().await;
            let removed = match n.checked_sub(1) {
                Some(index) => controller.delete_message(&id, index).await,
                None => false,
            };
            if removed {
                println!("  {}", style(format!("deleted message #{n}")).dim());
            } else {
                println!("  {}", style(format!("no message #{n}")).yellow());
            }
        }
        ChatCommand::Unknown(hint) => {
            println!("  {}", style(hint).yellow());
        }
    }
    LoopAction::Continue
}

/// Background renderer: assistant replies, reminders, connectivity, and
/// persistence warnings, printed through the shared writer so the prompt
/// line survives.
async fn render_events(
    controller: EngineController,
    mut events: broadcast::Receiver<EngineEvent>,
    mut writer: SharedWriter,
) {
    let mut degraded = false;
    loop {
        match events.recv().await {
            Ok(EngineEvent::MessageAppended { session_id, message }) => {
                if message.role == Role::Assistant
                    && session_id == controller.current_session_id().await
                {
                    let _ = writeln!(writer, "{}", format_message(&message));
                }
            }
            Ok(EngineEvent::ConnectionStateChanged(state)) => {
                let _ = writeln!(
                    writer,
                    "  {}",
                    style(format!("[connection: {state}]")).dim()
                );
            }
            Ok(EngineEvent::RegistryChanged { degraded: now, .. }) => {
                if now && !degraded {
                    let _ = writeln!(
                        writer,
                        "  {}",
                        style("[storage unavailable -- history will not survive a restart]")
                            .yellow()
                    );
                }
                degraded = now;
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
