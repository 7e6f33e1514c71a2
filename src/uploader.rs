//! Attachment upload
//!
//! Enforces the size cap before any network traffic, classifies the
//! attachment kind from its MIME type (sniffed from the filename when the
//! picker supplied none), and delegates the transfer to the backend with a
//! progress callback.

use crate::api::{Backend, ProgressFn, UploadFile};
use crate::model::MessageKind;
use crate::urls::UrlResolver;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Default attachment size cap: 20 MB
pub const DEFAULT_SIZE_CAP: u64 = 20 * 1024 * 1024;

/// Attachment classification by MIME prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// `image/*`
    Image,
    /// `video/*`
    Video,
    /// Everything else
    File,
}

impl AttachmentKind {
    /// Wire tag sent as the multipart `type` field and the message type
    pub fn wire_tag(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "IMAGE",
            AttachmentKind::Video => "VIDEO",
            AttachmentKind::File => "FILE",
        }
    }

    /// Caption used when the sender typed none
    pub fn placeholder(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "[Image]",
            AttachmentKind::Video => "[Video]",
            AttachmentKind::File => "[File]",
        }
    }
}

/// A successfully uploaded attachment, ready to be sent in a message
#[derive(Debug, Clone)]
pub struct UploadedAttachment {
    /// Attachment URL exactly as the server returned it
    pub url: String,
    /// Detected kind
    pub kind: AttachmentKind,
    /// Original filename
    pub filename: String,
}

impl UploadedAttachment {
    /// Message shape for this attachment, with the URL resolved for display
    pub fn to_kind(&self, resolver: &UrlResolver) -> MessageKind {
        let url = resolver.resolve(&self.url);
        match self.kind {
            AttachmentKind::Image => MessageKind::Image { url },
            AttachmentKind::Video => MessageKind::Video { url },
            AttachmentKind::File => MessageKind::File {
                url,
                filename: self.filename.clone(),
            },
        }
    }
}

/// Uploads attachments through the backend
pub struct AttachmentUploader {
    backend: Arc<dyn Backend>,
    size_cap: u64,
    on_progress: ProgressFn,
}

impl AttachmentUploader {
    /// Create an uploader with the default 20 MB cap and no progress reporting
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            size_cap: DEFAULT_SIZE_CAP,
            on_progress: Arc::new(|_| {}),
        }
    }

    /// Override the size cap
    pub fn with_size_cap(mut self, size_cap: u64) -> Self {
        self.size_cap = size_cap;
        self
    }

    /// Install a progress callback, invoked with values in 0..=100
    pub fn with_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.on_progress = Arc::new(on_progress);
        self
    }

    /// Upload a file and return its URL and detected kind
    ///
    /// Fails with [`Error::SizeLimit`] before any network call when the file
    /// exceeds the cap.
    pub async fn upload(&self, file: &UploadFile) -> Result<UploadedAttachment> {
        if file.size() > self.size_cap {
            return Err(Error::SizeLimit {
                size: file.size(),
                cap: self.size_cap,
            });
        }

        let kind = classify(file);
        debug!(
            "Classified {} as {} ({:?} declared)",
            file.filename,
            kind.wire_tag(),
            file.content_type
        );

        let response = self
            .backend
            .upload(file, kind.wire_tag(), self.on_progress.clone())
            .await?;

        info!("Uploaded {} as {}", file.filename, response.file_url);
        Ok(UploadedAttachment {
            url: response.file_url,
            kind,
            filename: file.filename.clone(),
        })
    }
}

/// Classify an attachment by MIME prefix
///
/// Falls back to guessing from the file extension when no content type was
/// declared; anything unrecognized is a generic file.
fn classify(file: &UploadFile) -> AttachmentKind {
    let mime = match &file.content_type {
        Some(declared) => declared.clone(),
        None => mime_guess::from_path(&file.filename)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    };

    if mime.starts_with("image/") {
        AttachmentKind::Image
    } else if mime.starts_with("video/") {
        AttachmentKind::Video
    } else {
        AttachmentKind::File
    }
}
