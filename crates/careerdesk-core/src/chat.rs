//! Chat session controller: owns the transcript and serializes sends.

use crate::gateway::{ChatReply, ChatSessionHandle, Gateway, CHAT_FALLBACK};
use crate::session::MountId;
use crate::state::ChatMessage;

pub const GREETING: &str =
    "Hello! How can I assist you with your job search or platform questions today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    NoSession,
    SessionReady,
    Sending,
}

enum SessionSlot {
    Empty,
    Ready(ChatSessionHandle),
    /// The handle is out with a `PendingChat`.
    Lent,
}

/// A send that has been accepted but not yet run against the gateway.
///
/// Carries the session handle, so the controller cannot start another send
/// until the matching `ChatCompletion` comes back.
pub struct PendingChat {
    mount: MountId,
    gateway: Gateway,
    session: ChatSessionHandle,
    text: String,
}

impl PendingChat {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub async fn send(mut self) -> ChatCompletion {
        let reply = self
            .gateway
            .send_chat_message(&mut self.session, &self.text)
            .await;
        ChatCompletion {
            mount: self.mount,
            session: self.session,
            reply,
        }
    }
}

pub struct ChatCompletion {
    mount: MountId,
    session: ChatSessionHandle,
    reply: ChatReply,
}

pub struct ChatController {
    mount: MountId,
    gateway: Gateway,
    session: SessionSlot,
    transcript: Vec<ChatMessage>,
}

impl ChatController {
    /// Controller with the greeting but no provider session yet.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            mount: MountId::next(),
            gateway,
            session: SessionSlot::Empty,
            transcript: vec![ChatMessage::assistant(GREETING)],
        }
    }

    /// Controller for a freshly mounted chat view, session already open.
    pub fn mount(gateway: Gateway) -> Self {
        let mut controller = Self::new(gateway);
        controller.open_session();
        controller
    }

    pub fn open_session(&mut self) {
        if matches!(self.session, SessionSlot::Empty) {
            self.session = SessionSlot::Ready(self.gateway.create_chat_session());
        }
    }

    pub fn mount_id(&self) -> MountId {
        self.mount
    }

    pub fn phase(&self) -> ChatPhase {
        match self.session {
            SessionSlot::Empty => ChatPhase::NoSession,
            SessionSlot::Ready(_) => ChatPhase::SessionReady,
            SessionSlot::Lent => ChatPhase::Sending,
        }
    }

    pub fn is_sending(&self) -> bool {
        self.phase() == ChatPhase::Sending
    }

    pub fn can_submit(&self, input: &str) -> bool {
        self.phase() == ChatPhase::SessionReady && !input.trim().is_empty()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Append the user turn and hand out the send. `None` when the input is
    /// blank, no session is open, or a send is already in flight.
    pub fn begin_submit(&mut self, input: &str) -> Option<PendingChat> {
        if !self.can_submit(input) {
            return None;
        }

        let session = match std::mem::replace(&mut self.session, SessionSlot::Lent) {
            SessionSlot::Ready(session) => session,
            other => {
                self.session = other;
                return None;
            }
        };

        self.transcript.push(ChatMessage::user(input));
        tracing::debug!(mount = ?self.mount, session = session.id(), "chat send started");

        Some(PendingChat {
            mount: self.mount,
            gateway: self.gateway.clone(),
            session,
            text: input.to_string(),
        })
    }

    /// Append the assistant turn for a finished send. Returns false when the
    /// completion belongs to another mount or nothing was in flight.
    pub fn complete(&mut self, completion: ChatCompletion) -> bool {
        if completion.mount != self.mount {
            tracing::debug!(
                expected = ?self.mount,
                got = ?completion.mount,
                "dropping chat completion from a previous mount"
            );
            return false;
        }
        if !self.is_sending() {
            tracing::debug!("dropping chat completion with no send in flight");
            return false;
        }

        if completion.reply.is_fallback() {
            tracing::debug!(mount = ?self.mount, "chat turn answered with fallback");
        }
        self.session = SessionSlot::Ready(completion.session);
        self.transcript
            .push(ChatMessage::assistant(completion.reply.into_text()));
        true
    }

    /// The in-flight send never came back (task panicked or was aborted).
    /// Close the pair with the fallback reply and start a new session.
    pub fn recover_lost_send(&mut self) {
        if !self.is_sending() {
            return;
        }
        tracing::error!(mount = ?self.mount, "chat send lost, reopening session");
        self.transcript.push(ChatMessage::assistant(CHAT_FALLBACK));
        self.session = SessionSlot::Empty;
        self.open_session();
    }

    /// Submit and wait for the reply in place.
    pub async fn submit(&mut self, input: &str) -> bool {
        match self.begin_submit(input) {
            Some(pending) => {
                let completion = pending.send().await;
                self.complete(completion)
            }
            None => false,
        }
    }
}
