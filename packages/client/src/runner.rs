//! Playground execution logic.

use std::time::Duration;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use meshchat_core::{
    domain::{DisplayName, RoomId},
    ui::{SessionHandle, shutdown_signal},
};

use super::{
    error::ClientError,
    formatter::MessageFormatter,
    playground::{Command, Playground},
    ui::{redisplay_prompt, render_changes},
};

/// Run the playground until the user leaves or the session ends
///
/// # Arguments
///
/// * `username` - Display name of the user
/// * `room` - Room id to create; a fresh one is generated when `None`
/// * `idle_minutes` - Minutes without activity before the session expires
pub async fn run_client(
    username: String,
    room: Option<String>,
    idle_minutes: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let display_name = DisplayName::new(username)?;
    let room = match room {
        Some(room) => RoomId::new(room)?,
        None => RoomId::generate(),
    };
    let prompt_name = display_name.as_str().to_string();

    let mut playground = Playground::new(room, idle_threshold(idle_minutes));
    let me = playground.create_room(display_name);

    println!(
        "\nYou are '{}' in room '{}'. Type messages and press Enter to send. \
         Type /help for commands, Ctrl+C to exit.\n",
        prompt_name,
        playground.room()
    );

    // Print every change to the user's session as it is published
    let mut watcher = me.clone();
    let prompt_for_watch = prompt_name.clone();
    let watch_task = tokio::spawn(async move {
        let mut last = watcher.mark_seen();
        while watcher.changed().await {
            let next = watcher.mark_seen();
            let rendered = render_changes(&last, &next);
            if !rendered.is_empty() {
                print!("{}", rendered);
                redisplay_prompt(&prompt_for_watch);
            }
            last = next;
        }
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt_for_input = prompt_name.clone();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_for_input);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let ended = me.wait();
    tokio::pin!(ended);
    let mut input_open = true;
    let mut signalled = false;

    let reason = loop {
        tokio::select! {
            line = input_rx.recv(), if input_open => {
                let Some(line) = line else {
                    input_open = false;
                    me.leave();
                    continue;
                };
                match Command::parse(&line) {
                    Ok(Command::Quit) => me.leave(),
                    Ok(command) => {
                        if let Err(e) = execute(&mut playground, &me, command).await {
                            println!("{}", e);
                        }
                    }
                    Err(e) => println!("{}", e),
                }
                redisplay_prompt(&prompt_name);
            }
            _ = &mut shutdown, if !signalled => {
                signalled = true;
                me.leave();
            }
            reason = &mut ended => break reason,
        }
    };

    playground.shutdown();
    // Let the watcher print the final snapshot
    let _ = tokio::time::timeout(Duration::from_millis(200), watch_task).await;
    println!();
    tracing::info!("Session ended ({:?})", reason);

    Ok(())
}

/// Idle threshold for `minutes`, saturating instead of overflowing.
fn idle_threshold(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

async fn execute(
    playground: &mut Playground,
    me: &SessionHandle,
    command: Command,
) -> Result<(), ClientError> {
    match command {
        Command::Say(text) => {
            let message = me.send_message(text).await?;
            print!(
                "{}",
                MessageFormatter::format_sent_confirmation(message.timestamp.value())
            );
        }
        Command::Join(name) => {
            playground.join(&name)?;
        }
        Command::As { name, text } => {
            playground.send_as(&name, &text).await?;
        }
        Command::Drop(name) => playground.drop_peer(&name)?,
        Command::Who => {
            let view = me.view();
            if let Some(address) = &view.local_address {
                print!(
                    "{}",
                    MessageFormatter::format_room_connected(&view.participants, address)
                );
            }
            println!("{} minutes until idle timeout", view.minutes_remaining);
        }
        Command::Help => print!("{}", Command::usage()),
        Command::Quit => me.leave(),
    }
    Ok(())
}
