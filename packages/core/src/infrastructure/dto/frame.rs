//! JSON shapes of the frames exchanged between peers.
//!
//! Every frame is an envelope `{"type": "<KIND>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

/// Outer frame envelope; `data` stays untyped until `type` is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Payload of `USER_INFO`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoDto {
    pub id: String,
    pub username: String,
}

/// One message as sent in `INIT_MESSAGES` and `NEW_MESSAGE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub sender: String,
    pub sender_id: String,
    pub content: String,
    pub timestamp: i64,
}

/// One roster entry as sent in `INIT_PARTICIPANTS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub id: String,
    pub username: String,
    pub is_connected: bool,
}
