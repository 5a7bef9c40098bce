//! Message formatting utilities for the playground display.

use meshchat_core::{
    domain::{Notice, NoticeKind, Participant, PeerAddress},
    usecase::EndReason,
};
use meshchat_shared::time::timestamp_to_rfc3339;

/// Message formatter for playground display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the roster shown when the session becomes ready and on `/who`
    ///
    /// # Arguments
    ///
    /// * `participants` - Roster entries of the session
    /// * `me` - The local peer address (to mark as "me")
    ///
    /// # Returns
    ///
    /// A formatted string with participant list
    pub fn format_room_connected(participants: &[Participant], me: &PeerAddress) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str("Participants:\n");

        if participants.is_empty() {
            output.push_str("(No participants)\n");
        } else {
            for participant in participants {
                let me_suffix = if &participant.id == me { " (me)" } else { "" };
                let state = if participant.is_connected {
                    "connected"
                } else {
                    "disconnected"
                };
                output.push_str(&format!(
                    "{}{} - {} [{}]\n",
                    participant.username, me_suffix, participant.id, state
                ));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format a participant-joined notification
    pub fn format_participant_joined(username: &str, address: &str) -> String {
        format!("\n+ {} joined ({})\n", username, address)
    }

    /// Format a participant-left notification
    pub fn format_participant_left(username: &str) -> String {
        format!("\n- {} left\n", username)
    }

    /// Format a chat message
    ///
    /// # Arguments
    ///
    /// * `from` - Display name of the sender
    /// * `content` - The message content
    /// * `sent_at` - Unix timestamp when the message was sent (milliseconds)
    pub fn format_chat_message(from: &str, content: &str, sent_at: i64) -> String {
        let timestamp_str = timestamp_to_rfc3339(sent_at);
        format!(
            "\n\n------------------------------------------------------------\n\
             @{}: {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            from, content, timestamp_str
        )
    }

    /// Format a confirmation message after sending
    pub fn format_sent_confirmation(sent_at: i64) -> String {
        let timestamp_str = timestamp_to_rfc3339(sent_at);
        format!("sent at {}\n", timestamp_str)
    }

    /// Format a transient error notice
    pub fn format_notice(notice: &Notice) -> String {
        let label = match notice.kind {
            NoticeKind::AddressUnavailable => "address unavailable",
            NoticeKind::NetworkUnreachable => "network unreachable",
            NoticeKind::SubstrateError => "substrate error",
            NoticeKind::ConnectionError => "connection error",
            NoticeKind::JoinFailed => "join failed",
            NoticeKind::ProtocolError => "protocol error",
            NoticeKind::SessionExpired => "session expired",
        };
        format!("\n! [{}] {}\n", label, notice.text)
    }

    /// Format the warning shown shortly before the idle timeout
    pub fn format_expiry_warning(minutes_remaining: u64) -> String {
        let unit = if minutes_remaining == 1 {
            "minute"
        } else {
            "minutes"
        };
        format!(
            "\n! Session expires in {} {} unless someone says something\n",
            minutes_remaining, unit
        )
    }

    /// Format the final line of a session
    pub fn format_session_ended(reason: EndReason) -> String {
        let detail = match reason {
            EndReason::Left => "left the room",
            EndReason::Expired => "idle timeout",
            EndReason::BootstrapFailed => "could not claim an address",
        };
        format!("\n*** Session ended: {} ***\n", detail)
    }
}
