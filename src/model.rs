//! Core data model
//!
//! Conversations, messages and typing signals as this core tracks them.
//! Message shape is a tagged union so an attachment-typed message without a
//! URL is unrepresentable, and optimistic delivery is an explicit status
//! rather than a temporary-id naming convention.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Course student
    Student,
    /// Course instructor
    Instructor,
    /// Marketplace administrator
    Admin,
}

impl Role {
    /// Role-scoped API path prefix for this role's dashboard
    pub fn api_prefix(&self) -> &'static str {
        match self {
            Role::Admin => "/api/admin",
            Role::Instructor => "/api/instructor",
            Role::Student => "/api/student",
        }
    }
}

/// Kind of conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConversationKind {
    /// Two participants
    Individual,
    /// Named group with three or more participants
    Group,
}

/// A conversation participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// User id
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Marketplace role
    pub role: Role,
    /// Resolved avatar URL, if any
    pub avatar_url: Option<String>,
    /// Whether the user is currently online
    pub online: bool,
}

/// A chat thread, individual or group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation id
    pub chat_id: String,
    /// Individual or group
    pub kind: ConversationKind,
    /// Participants, including the current user
    pub participants: Vec<Participant>,
    /// Group name (groups only)
    pub group_name: Option<String>,
    /// Summary of the most recent message
    pub last_message: Option<String>,
    /// Unread message counter for the current user
    pub unread: u32,
    /// Timestamp of the most recent activity
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Record the arrival of a message in this conversation
    ///
    /// Updates the last-message summary and activity timestamp, and
    /// increments the unread counter unless the current user sent it.
    pub fn apply_message(
        &mut self,
        sender_id: &str,
        summary: &str,
        at: DateTime<Utc>,
        current_user_id: &str,
    ) {
        self.last_message = Some(summary.to_string());
        self.updated_at = at;
        if sender_id != current_user_id {
            self.unread += 1;
        }
    }

    /// Clear the unread counter
    pub fn mark_read(&mut self) {
        self.unread = 0;
    }
}

/// Message shape, one variant per message kind
///
/// `Image` and `Video` carry a playable URL; `File` additionally carries a
/// filename hint for download rendering; `Text` carries only its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Plain text
    Text,
    /// Image attachment
    Image {
        /// Viewable image URL
        url: String,
    },
    /// Video attachment
    Video {
        /// Playable video URL
        url: String,
    },
    /// Generic document attachment
    File {
        /// Download URL
        url: String,
        /// Original filename, shown as the download label
        filename: String,
    },
}

impl MessageKind {
    /// Wire tag for the send envelope
    pub fn wire_name(&self) -> &'static str {
        match self {
            MessageKind::Text => "TEXT",
            MessageKind::Image { .. } => "IMAGE",
            MessageKind::Video { .. } => "VIDEO",
            MessageKind::File { .. } => "FILE",
        }
    }

    /// Attachment URL, if this kind carries one
    pub fn attachment_url(&self) -> Option<&str> {
        match self {
            MessageKind::Text => None,
            MessageKind::Image { url } | MessageKind::Video { url } => Some(url),
            MessageKind::File { url, .. } => Some(url),
        }
    }
}

/// Delivery status of a locally known message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageStatus {
    /// Inserted optimistically, awaiting the server echo
    Pending,
    /// Confirmed by the server (id and timestamp are authoritative)
    Confirmed,
}

/// A chat message as tracked by a conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Locally generated correlation id, stable across confirmation
    pub local_id: Uuid,
    /// Server-assigned id, present once confirmed
    pub server_id: Option<String>,
    /// Owning conversation id
    pub conversation_id: String,
    /// Sender user id
    pub sender_id: String,
    /// Sender display name, when the server supplied one
    pub sender_name: Option<String>,
    /// Text content (caption or placeholder for attachment messages)
    pub content: String,
    /// Message shape
    pub kind: MessageKind,
    /// Pending or confirmed
    pub status: MessageStatus,
    /// Creation time; server-authoritative once confirmed
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Create an optimistic outgoing message
    ///
    /// Fails with [`Error::Validation`] when the message would be neither
    /// text-bearing nor attachment-bearing.
    pub fn outgoing(
        conversation_id: &str,
        sender_id: &str,
        content: &str,
        kind: MessageKind,
    ) -> Result<Self> {
        if content.trim().is_empty() && kind.attachment_url().is_none() {
            return Err(Error::Validation(
                "message must carry text or an attachment".to_string(),
            ));
        }

        Ok(Self {
            local_id: Uuid::new_v4(),
            server_id: None,
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: None,
            content: content.to_string(),
            kind,
            status: MessageStatus::Pending,
            sent_at: Utc::now(),
        })
    }

    /// Whether the given user sent this message
    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }
}

/// Ephemeral typing notification, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingSignal {
    /// Conversation the signal belongs to
    pub conversation_id: String,
    /// User composing (or no longer composing) a message
    pub user_id: String,
    /// Whether the user is currently typing
    pub is_typing: bool,
}
