//! Active conversation session
//!
//! Owns the message list of one open conversation. History loads drive the
//! `Idle → Loading → Ready | Failed` lifecycle; sends are optimistic, with
//! each pending record swapped for its server echo by correlation id, or
//! rolled back when delivery fails. The session as a whole stays `Ready`
//! regardless of per-message outcomes.

use crate::api::{Backend, MessageRecord, SendEnvelope};
use crate::model::{Message, MessageKind, MessageStatus};
use crate::uploader::UploadedAttachment;
use crate::urls::UrlResolver;
use crate::{Error, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Lifecycle of a conversation session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No history load attempted yet
    Idle,
    /// History fetch in flight
    Loading,
    /// History loaded; the session accepts sends and deletes
    Ready,
    /// History fetch failed; another `load_history` retries
    Failed,
}

/// An open conversation
pub struct ConversationSession {
    backend: Arc<dyn Backend>,
    resolver: UrlResolver,
    chat_id: String,
    current_user_id: String,
    state: SessionState,
    messages: Vec<Message>,
}

impl ConversationSession {
    /// Open a session on a conversation; call [`load_history`] before sending
    ///
    /// [`load_history`]: ConversationSession::load_history
    pub fn new(
        backend: Arc<dyn Backend>,
        resolver: UrlResolver,
        chat_id: &str,
        current_user_id: &str,
    ) -> Self {
        Self {
            backend,
            resolver,
            chat_id: chat_id.to_string(),
            current_user_id: current_user_id.to_string(),
            state: SessionState::Idle,
            messages: Vec::new(),
        }
    }

    /// Load the conversation's full history, oldest first
    ///
    /// A 404 means the conversation simply has no messages yet and yields an
    /// empty, `Ready` session. Any other failure parks the session in
    /// `Failed`; calling again retries.
    pub async fn load_history(&mut self) -> Result<()> {
        self.state = SessionState::Loading;

        let records = match self.backend.fetch_history(&self.chat_id).await {
            Ok(records) => records,
            Err(Error::Server { status: 404, .. }) => Vec::new(),
            Err(e) => {
                warn!("History load failed for {}: {}", self.chat_id, e);
                self.state = SessionState::Failed;
                return Err(e);
            }
        };

        info!("Loaded {} messages for {}", records.len(), self.chat_id);
        // Server order is authoritative; records keep their positions even
        // when a timestamp fails to parse.
        self.messages = records
            .into_iter()
            .map(|record| self.confirmed_from_record(record, None))
            .collect();
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Send a message, optimistically appending it before the network call
    ///
    /// The pending record is visible immediately. On success it is replaced
    /// in place by the server-confirmed record; on failure it is removed and
    /// the error returned. Requires a `Ready` session.
    pub async fn send_message(
        &mut self,
        text: &str,
        attachment: Option<&UploadedAttachment>,
    ) -> Result<Message> {
        if self.state != SessionState::Ready {
            return Err(Error::Validation(
                "conversation history is not loaded".to_string(),
            ));
        }

        let kind = match attachment {
            Some(uploaded) => uploaded.to_kind(&self.resolver),
            None => MessageKind::Text,
        };
        let envelope = SendEnvelope {
            content: text.to_string(),
            message_type: kind.wire_name().to_string(),
            // The envelope carries the URL exactly as the upload returned it.
            file_url: attachment.map(|a| a.url.clone()),
        };

        let optimistic = Message::outgoing(&self.chat_id, &self.current_user_id, text, kind)?;
        let local_id = optimistic.local_id;
        self.messages.push(optimistic);

        match self.backend.send_message(&self.chat_id, &envelope).await {
            Ok(record) => {
                let confirmed = self.confirmed_from_record(record, Some(local_id));
                let confirmed = match self.messages.iter_mut().find(|m| m.local_id == local_id) {
                    Some(slot) => {
                        *slot = confirmed;
                        slot.clone()
                    }
                    // History reloaded mid-send; the echo still belongs in the list.
                    None => {
                        self.messages.push(confirmed.clone());
                        confirmed
                    }
                };
                info!(
                    "Message {} confirmed as {:?} in {}",
                    local_id, confirmed.server_id, self.chat_id
                );
                Ok(confirmed)
            }
            Err(e) => {
                warn!("Send failed in {}: {}, rolling back", self.chat_id, e);
                self.messages.retain(|m| m.local_id != local_id);
                Err(e)
            }
        }
    }

    /// Delete one of the current user's own messages
    ///
    /// Local removal happens only after server confirmation; a rejected
    /// delete leaves the message in place.
    pub async fn delete_message(&mut self, server_id: &str) -> Result<()> {
        let message = self
            .messages
            .iter()
            .find(|m| m.server_id.as_deref() == Some(server_id))
            .ok_or_else(|| Error::Validation(format!("unknown message {server_id}")))?;

        if !message.is_from(&self.current_user_id) {
            return Err(Error::Validation(
                "only your own messages can be deleted".to_string(),
            ));
        }

        self.backend.delete_message(&self.chat_id, server_id).await?;
        self.messages
            .retain(|m| m.server_id.as_deref() != Some(server_id));
        info!("Deleted message {} in {}", server_id, self.chat_id);
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Messages known to this session, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Conversation id this session is bound to
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Build a confirmed message from a server record
    ///
    /// `local_id` carries over the correlation id when the record confirms an
    /// optimistic send.
    fn confirmed_from_record(&self, record: MessageRecord, local_id: Option<uuid::Uuid>) -> Message {
        let sent_at = record.created_at_utc().unwrap_or_else(|| {
            warn!(
                "Unparseable timestamp '{}' on message {}",
                record.created_at, record.message_id
            );
            Utc::now()
        });

        Message {
            local_id: local_id.unwrap_or_else(uuid::Uuid::new_v4),
            server_id: Some(record.message_id),
            conversation_id: self.chat_id.clone(),
            sender_id: record.sender_id,
            sender_name: record.sender_name,
            content: record.content,
            kind: kind_from_wire(
                &record.message_type,
                record.file_url.as_deref(),
                &self.resolver,
            ),
            status: MessageStatus::Confirmed,
            sent_at,
        }
    }
}

/// Interpret a wire message type plus attachment URL as a [`MessageKind`]
///
/// Attachment URLs are resolved to fully-qualified form here, so rendering
/// never sees an abbreviated path. An attachment-typed record without a URL
/// violates the message invariant and degrades to text with a warning.
fn kind_from_wire(message_type: &str, file_url: Option<&str>, resolver: &UrlResolver) -> MessageKind {
    let resolved = file_url.map(|raw| resolver.resolve(raw));
    match (message_type, resolved) {
        ("IMAGE", Some(url)) => MessageKind::Image { url },
        ("VIDEO", Some(url)) => MessageKind::Video { url },
        ("FILE", Some(url)) => {
            let filename = url
                .rsplit('/')
                .next()
                .unwrap_or("attachment")
                .to_string();
            MessageKind::File { url, filename }
        }
        ("TEXT", _) => MessageKind::Text,
        (other, None) if other != "TEXT" => {
            warn!("{} message without a file URL, treating as text", other);
            MessageKind::Text
        }
        _ => MessageKind::Text,
    }
}
