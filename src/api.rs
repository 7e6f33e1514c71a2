//! REST backend seam
//!
//! The dashboards talk to a role-scoped REST backend whose contract shape is
//! identical for admins and instructors; only the path prefix differs. The
//! [`Backend`] trait is the seam the rest of the core is written against, so
//! sessions, rosters and uploads can be exercised without a live server.

use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod http;
pub mod types;

pub use http::{ApiConfig, HttpBackend};
pub use types::{
    AvatarResponse, ConversationRecord, CreateGroupRequest, CreateIndividualRequest,
    MessageRecord, ParticipantRecord, SendEnvelope, UploadFile, UploadResponse,
};

/// Upload progress callback, invoked with values in the 0..=100 range
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Role-scoped chat backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// List all conversations visible to the current user
    async fn list_conversations(&self) -> Result<Vec<ConversationRecord>>;

    /// Create (or reuse) an individual conversation with one other user
    async fn create_individual(
        &self,
        request: &CreateIndividualRequest,
    ) -> Result<ConversationRecord>;

    /// Create a group conversation
    async fn create_group(&self, request: &CreateGroupRequest) -> Result<ConversationRecord>;

    /// Fetch the full message history of a conversation, oldest first
    async fn fetch_history(&self, chat_id: &str) -> Result<Vec<MessageRecord>>;

    /// Send a message and return the server-confirmed record
    async fn send_message(&self, chat_id: &str, envelope: &SendEnvelope)
        -> Result<MessageRecord>;

    /// Delete a message previously sent by the current user
    async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<()>;

    /// Upload an attachment, reporting progress, and return its URL
    ///
    /// `kind_tag` is the detected attachment kind (IMAGE, VIDEO or FILE)
    /// forwarded to the server as the multipart `type` field.
    async fn upload(
        &self,
        file: &UploadFile,
        kind_tag: &str,
        progress: ProgressFn,
    ) -> Result<UploadResponse>;

    /// Look up a user's avatar URL; `None` when the user has none
    async fn fetch_avatar(&self, user_id: &str) -> Result<Option<String>>;
}
