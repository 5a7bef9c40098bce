//! Terminal output helpers for the playground.

use std::io::Write;

use meshchat_core::{ui::SessionView, usecase::ConnectionStatus};

use super::formatter::MessageFormatter;

/// Redisplay the prompt after printing asynchronous output
pub fn redisplay_prompt(username: &str) {
    print!("{}> ", username);
    std::io::stdout().flush().ok();
}

/// Render what changed between two snapshots of the user's session.
///
/// Own messages are left out; the prompt loop confirms those itself.
pub fn render_changes(previous: &SessionView, next: &SessionView) -> String {
    let mut output = String::new();
    let me = next.local_address.as_ref();

    if previous.local_address.is_none()
        && let Some(address) = me
    {
        output.push_str(&MessageFormatter::format_room_connected(
            &next.participants,
            address,
        ));
    }

    for participant in &next.participants {
        match previous.participant(&participant.id) {
            None if Some(&participant.id) != me => {
                output.push_str(&MessageFormatter::format_participant_joined(
                    participant.username.as_str(),
                    participant.id.as_str(),
                ));
            }
            Some(before) if before.is_connected && !participant.is_connected => {
                output.push_str(&MessageFormatter::format_participant_left(
                    participant.username.as_str(),
                ));
            }
            _ => {}
        }
    }

    for message in &next.messages {
        let is_new = !previous.messages.iter().any(|m| m.id == message.id);
        if is_new && Some(&message.sender_id) != me {
            output.push_str(&MessageFormatter::format_chat_message(
                message.sender.as_str(),
                message.content.as_str(),
                message.timestamp.value(),
            ));
        }
    }

    for notice in &next.notices {
        if !previous.notices.contains(notice) {
            output.push_str(&MessageFormatter::format_notice(notice));
        }
    }

    if next.minutes_remaining == 1
        && previous.minutes_remaining > 1
        && next.status == ConnectionStatus::Connected
    {
        output.push_str(&MessageFormatter::format_expiry_warning(
            next.minutes_remaining,
        ));
    }

    if let ConnectionStatus::Ended(reason) = next.status
        && previous.status != next.status
    {
        output.push_str(&MessageFormatter::format_session_ended(reason));
    }

    output
}
