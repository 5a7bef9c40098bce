//! Session event loop and the handle used to drive it.

use std::{sync::Arc, time::Duration};

use meshchat_shared::time::Clock;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, MissedTickBehavior},
};

use crate::{
    domain::{Message, SessionError, Transport},
    usecase::{ConnectionStatus, EndReason, MeshSession, SessionConfig, claim_local_address},
};

use super::view::SessionView;

/// How often the view is republished so countdowns and notices age out.
const VIEW_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Requests from the presentation layer.
#[derive(Debug)]
pub enum SessionCommand {
    SendMessage {
        text: String,
        reply: oneshot::Sender<Result<Message, SessionError>>,
    },
    Leave,
}

/// Cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    /// Send `text` as a local message.
    ///
    /// # Errors
    ///
    /// `NotReady` before the local address is known, `InvalidMessage` for
    /// blank or oversized text, `Ended` once the session is over.
    pub async fn send_message(&self, text: impl Into<String>) -> Result<Message, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::SendMessage {
                text: text.into(),
                reply,
            })
            .map_err(|_| SessionError::Ended)?;
        response.await.map_err(|_| SessionError::Ended)?
    }

    /// Ask the session to end. Safe to call more than once.
    pub fn leave(&self) {
        let _ = self.commands.send(SessionCommand::Leave);
    }

    /// Latest published snapshot.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Wait for the next published snapshot. `false` once the session task is gone.
    pub async fn changed(&mut self) -> bool {
        self.view.changed().await.is_ok()
    }

    /// Marks the current snapshot as seen so `changed` only reports newer ones.
    pub fn mark_seen(&mut self) -> SessionView {
        self.view.borrow_and_update().clone()
    }

    /// Wait until a snapshot satisfies `predicate`.
    ///
    /// Returns `None` if the session task finished without ever publishing one.
    pub async fn wait_for(&self, predicate: impl FnMut(&SessionView) -> bool) -> Option<SessionView> {
        let mut view = self.view.clone();
        let matched = view.wait_for(predicate).await.ok()?.clone();
        Some(matched)
    }

    /// Wait for the session to end.
    pub async fn wait(&self) -> EndReason {
        let mut view = self.view.clone();
        let ended = view
            .wait_for(|v| matches!(v.status, ConnectionStatus::Ended(_)))
            .await
            .map(|v| v.status);
        let status = ended.unwrap_or_else(|_| view.borrow().status);
        match status {
            ConnectionStatus::Ended(reason) => reason,
            // the task went away without publishing an end state
            _ => EndReason::Left,
        }
    }
}

/// Start a session on the current runtime.
pub fn spawn_session(
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
) -> SessionHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(SessionView::initial(&config));
    tokio::spawn(run_session(config, transport, clock, command_rx, view_tx));
    SessionHandle {
        commands: command_tx,
        view: view_rx,
    }
}

/// Drive one session until it ends.
///
/// Claims the local address, then serially applies transport events,
/// commands and timer ticks. A snapshot is published after every step.
/// When every command sender is dropped the session leaves. After the end,
/// the view keeps being republished until the last notice is dismissed.
pub async fn run_session(
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    view: watch::Sender<SessionView>,
) -> EndReason {
    let poll_interval = config.poll_interval;
    let mut session = MeshSession::new(config, transport.clone(), clock);
    let (event_tx, mut events) = mpsc::unbounded_channel();

    match claim_local_address(transport.as_ref(), session.plan(), event_tx).await {
        Ok(address) => session.on_local_address_ready(address),
        Err(e) => {
            tracing::error!("Failed to claim local address: {}", e);
            session.on_bootstrap_failed(&e);
        }
    }
    publish(&view, &mut session);

    let mut poll = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut refresh = tokio::time::interval_at(
        Instant::now() + VIEW_REFRESH_INTERVAL,
        VIEW_REFRESH_INTERVAL,
    );
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while !session.has_ended() {
        tokio::select! {
            Some(event) = events.recv() => session.handle_event(event),
            command = commands.recv() => match command {
                Some(SessionCommand::SendMessage { text, reply }) => {
                    let result = session.send_message(&text);
                    if let Err(e) = &result {
                        tracing::debug!("Message rejected: {}", e);
                    }
                    publish(&view, &mut session);
                    let _ = reply.send(result);
                }
                Some(SessionCommand::Leave) | None => session.leave(),
            },
            _ = poll.tick() => {
                session.poll_timeout();
            }
            _ = refresh.tick() => {}
        }
        publish(&view, &mut session);
    }

    // notices raised by the ending itself still have to age out
    while !session.active_notices().is_empty() && !view.is_closed() {
        refresh.tick().await;
        publish(&view, &mut session);
    }

    let reason = match session.status() {
        ConnectionStatus::Ended(reason) => reason,
        _ => EndReason::Left,
    };
    tracing::info!("Session loop finished ({:?})", reason);
    reason
}

fn publish(view: &watch::Sender<SessionView>, session: &mut MeshSession) {
    let next = SessionView::capture(session);
    view.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}
