//! Wire envelopes exchanged with the REST backend
//!
//! Field names follow the backend's camelCase JSON. Timestamps arrive as
//! strings and are parsed leniently; a record with an unparseable timestamp
//! is still usable, it just loses precise ordering until the next reload.

use crate::model::{ConversationKind, Role};
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    /// Conversation id
    pub chat_id: String,
    /// INDIVIDUAL or GROUP
    pub conversation_type: ConversationKind,
    /// Participants, including the requesting user
    pub participants: Vec<ParticipantRecord>,
    /// Group name (groups only)
    #[serde(default)]
    pub group_name: Option<String>,
    /// Summary of the most recent message
    #[serde(default)]
    pub last_message: Option<String>,
    /// Unread counter for the requesting user
    #[serde(default)]
    pub unread_count: u32,
    /// Last-activity timestamp string
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ConversationRecord {
    /// Parsed last-activity timestamp, if present and well-formed
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }
}

/// A participant as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    /// User id
    pub user_id: String,
    /// Display name
    pub name: String,
    /// Marketplace role
    pub role: Role,
    /// Avatar URL, when already known to the backend
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Online flag
    #[serde(default)]
    pub online: bool,
}

/// Request body for individual-conversation creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndividualRequest {
    /// The one other participant
    pub other_user_id: String,
    /// First message placed in the conversation
    pub initial_message: String,
}

/// Request body for group-conversation creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    /// Group display name
    pub name: String,
    /// Participants besides the creator, in selection order
    pub participant_ids: Vec<String>,
    /// First message placed in the conversation
    pub initial_message: String,
}

/// Outbound message envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEnvelope {
    /// Text content (caption or placeholder for attachments)
    pub content: String,
    /// TEXT, IMAGE, VIDEO or FILE
    pub message_type: String,
    /// Attachment URL, null for plain text
    pub file_url: Option<String>,
}

/// A message as returned in history or as a send confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// Server-assigned message id
    pub message_id: String,
    /// Sender user id
    pub sender_id: String,
    /// Sender display name
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Text content
    #[serde(default)]
    pub content: String,
    /// TEXT, IMAGE, VIDEO or FILE
    pub message_type: String,
    /// Attachment URL, possibly relative or abbreviated
    #[serde(default)]
    pub file_url: Option<String>,
    /// Server creation timestamp string
    pub created_at: String,
}

impl MessageRecord {
    /// Parsed server timestamp, if well-formed
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// A file pending upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original filename
    pub filename: String,
    /// Declared MIME type, when the picker supplied one
    pub content_type: Option<String>,
    /// File contents
    pub data: Bytes,
}

impl UploadFile {
    /// Size of the file in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Response body of a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// URL of the stored attachment, possibly relative
    pub file_url: String,
}

/// Response body of an avatar lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    /// Avatar URL, null for users without one
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Parse a backend timestamp string
///
/// Accepts RFC 3339 and the bare `YYYY-MM-DDTHH:MM:SS` form some endpoints
/// emit, both interpreted as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_naive_timestamps() {
        let record = MessageRecord {
            message_id: "m1".to_string(),
            sender_id: "u1".to_string(),
            sender_name: None,
            content: "hi".to_string(),
            message_type: "TEXT".to_string(),
            file_url: None,
            created_at: "2024-05-01T10:30:00Z".to_string(),
        };
        assert!(record.created_at_utc().is_some());

        let naive = MessageRecord {
            created_at: "2024-05-01T10:30:00.123".to_string(),
            ..record.clone()
        };
        assert!(naive.created_at_utc().is_some());

        let bad = MessageRecord {
            created_at: "yesterday".to_string(),
            ..record
        };
        assert!(bad.created_at_utc().is_none());
    }

    #[test]
    fn send_envelope_uses_camel_case() {
        let envelope = SendEnvelope {
            content: "[Image]".to_string(),
            message_type: "IMAGE".to_string(),
            file_url: Some("/api/uploads/a.png".to_string()),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"messageType\":\"IMAGE\""));
        assert!(json.contains("\"fileUrl\""));
    }
}
