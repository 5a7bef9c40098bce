//! A whole room inside one process.
//!
//! The user's session is the anchor; simulated peers join through the same
//! in-memory network and run their own sessions.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use meshchat_core::{
    domain::{DisplayName, Message, RoomId},
    infrastructure::transport::InMemoryNetwork,
    ui::{SessionHandle, spawn_session},
    usecase::{Role, SessionConfig},
};
use meshchat_shared::time::SystemClock;

use super::error::ClientError;

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text, sent as the user
    Say(String),
    Join(String),
    As { name: String, text: String },
    Drop(String),
    Who,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ClientError> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Say(line.to_string()));
        };

        let (verb, args) = match rest.split_once(char::is_whitespace) {
            Some((verb, args)) => (verb, args.trim()),
            None => (rest, ""),
        };

        match (verb, args) {
            ("who", "") => Ok(Command::Who),
            ("help", "") => Ok(Command::Help),
            ("quit", "") => Ok(Command::Quit),
            ("join", name) if is_single_word(name) => Ok(Command::Join(name.to_string())),
            ("drop", name) if is_single_word(name) => Ok(Command::Drop(name.to_string())),
            ("as", args) => match args.split_once(char::is_whitespace) {
                Some((name, text)) if !text.trim().is_empty() => Ok(Command::As {
                    name: name.to_string(),
                    text: text.trim().to_string(),
                }),
                _ => Err(ClientError::InvalidCommand(
                    "usage: /as <name> <text>".to_string(),
                )),
            },
            _ => Err(ClientError::InvalidCommand(line.to_string())),
        }
    }

    pub fn usage() -> &'static str {
        "Commands:\n  \
         <text>             send a message\n  \
         /join <name>       add a simulated peer\n  \
         /as <name> <text>  send as a simulated peer\n  \
         /drop <name>       a simulated peer leaves\n  \
         /who               show participants\n  \
         /quit              leave the room\n"
    }
}

fn is_single_word(value: &str) -> bool {
    !value.is_empty() && !value.contains(char::is_whitespace)
}

/// The room being simulated.
pub struct Playground {
    network: InMemoryNetwork,
    room: RoomId,
    idle_threshold: Duration,
    peers: BTreeMap<String, SessionHandle>,
}

impl Playground {
    pub fn new(room: RoomId, idle_threshold: Duration) -> Self {
        Self {
            network: InMemoryNetwork::new(),
            room,
            idle_threshold,
            peers: BTreeMap::new(),
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Start the anchor session for `username`.
    pub fn create_room(&self, username: DisplayName) -> SessionHandle {
        tracing::info!("Creating room '{}' as '{}'", self.room, username);
        self.spawn(username, Role::Anchor)
    }

    /// Start a simulated peer that joins the room.
    pub fn join(&mut self, name: &str) -> Result<SessionHandle, ClientError> {
        if self.peers.contains_key(name) {
            return Err(ClientError::PeerExists(name.to_string()));
        }
        let username = DisplayName::new(name.to_string())?;
        let handle = self.spawn(username, Role::Joiner);
        self.peers.insert(name.to_string(), handle.clone());
        tracing::info!("Simulated peer '{}' joining room '{}'", name, self.room);
        Ok(handle)
    }

    pub async fn send_as(&self, name: &str, text: &str) -> Result<Message, ClientError> {
        let handle = self
            .peers
            .get(name)
            .ok_or_else(|| ClientError::UnknownPeer(name.to_string()))?;
        Ok(handle.send_message(text).await?)
    }

    pub fn drop_peer(&mut self, name: &str) -> Result<(), ClientError> {
        let handle = self
            .peers
            .remove(name)
            .ok_or_else(|| ClientError::UnknownPeer(name.to_string()))?;
        handle.leave();
        tracing::info!("Simulated peer '{}' left", name);
        Ok(())
    }

    pub fn peer_names(&self) -> Vec<&str> {
        self.peers.keys().map(String::as_str).collect()
    }

    /// Every simulated peer leaves.
    pub fn shutdown(&mut self) {
        for (name, handle) in std::mem::take(&mut self.peers) {
            tracing::debug!("Stopping simulated peer '{}'", name);
            handle.leave();
        }
    }

    fn spawn(&self, username: DisplayName, role: Role) -> SessionHandle {
        let config = SessionConfig::new(self.room.clone(), username, role)
            .with_idle_threshold(self.idle_threshold);
        spawn_session(
            config,
            Arc::new(self.network.transport()),
            Arc::new(SystemClock),
        )
    }
}

impl Drop for Playground {
    fn drop(&mut self) {
        self.shutdown();
    }
}
