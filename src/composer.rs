//! Message composition
//!
//! Owns the pending text and the (at most one) pending attachment of the
//! input box, and orchestrates submission: upload first when an attachment
//! is selected, then send through the session. Composer state survives a
//! failed submit so the user can retry; a successful submit clears it and
//! signals typing-stopped.

use crate::session::ConversationSession;
use crate::typing::TypingSignaler;
use crate::uploader::AttachmentUploader;
use crate::api::UploadFile;
use crate::model::Message;
use crate::Result;
use tracing::debug;

/// Outcome of a submit attempt
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// A message was sent and confirmed
    Sent(Message),
    /// Neither text nor attachment was pending; nothing happened
    Nothing,
}

/// Pending input state for one conversation
pub struct MessageComposer {
    uploader: AttachmentUploader,
    signaler: TypingSignaler,
    text: String,
    attachment: Option<UploadFile>,
}

impl MessageComposer {
    /// Create a composer bound to an uploader and a typing signaler
    pub fn new(uploader: AttachmentUploader, signaler: TypingSignaler) -> Self {
        Self {
            uploader,
            signaler,
            text: String::new(),
            attachment: None,
        }
    }

    /// Replace the pending text; drives the typing signal
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.signaler.notify_typing(!self.text.trim().is_empty());
    }

    /// Current pending text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Select an attachment, replacing any previous selection
    pub fn attach(&mut self, file: UploadFile) {
        if let Some(previous) = &self.attachment {
            debug!("Replacing pending attachment {}", previous.filename);
        }
        self.attachment = Some(file);
    }

    /// Drop the pending attachment
    pub fn clear_attachment(&mut self) {
        self.attachment = None;
    }

    /// Pending attachment, if any
    pub fn attachment(&self) -> Option<&UploadFile> {
        self.attachment.as_ref()
    }

    /// Whether submit would do anything
    pub fn can_submit(&self) -> bool {
        !self.text.trim().is_empty() || self.attachment.is_some()
    }

    /// Submit the pending input
    ///
    /// With an attachment pending, uploads it first; an upload failure
    /// aborts before anything is sent. An attachment sent without caption
    /// text gets its kind's placeholder (`[Image]`, `[Video]`, `[File]`).
    /// With only text pending, sends it as a plain text message. With
    /// neither, does nothing. Successful submits clear the composer and
    /// publish a typing-stopped signal.
    pub async fn submit(&mut self, session: &mut ConversationSession) -> Result<SubmitOutcome> {
        let text = self.text.trim().to_string();

        let sent = if let Some(file) = &self.attachment {
            let uploaded = self.uploader.upload(file).await?;
            let caption = if text.is_empty() {
                uploaded.kind.placeholder().to_string()
            } else {
                text
            };
            session.send_message(&caption, Some(&uploaded)).await?
        } else if !text.is_empty() {
            session.send_message(&text, None).await?
        } else {
            return Ok(SubmitOutcome::Nothing);
        };

        self.text.clear();
        self.attachment = None;
        self.signaler.notify_typing(false);
        Ok(SubmitOutcome::Sent(sent))
    }
}
