//! CourseChat - client-side chat session core
//!
//! This library implements the chat flow shared by the admin and instructor
//! dashboards of an online course marketplace: conversation listing and
//! creation, per-conversation sessions with optimistic message delivery,
//! attachment upload with progress, typing-signal debouncing, and cached
//! participant identity resolution.
//!
//! The core talks to two injected collaborators: a role-scoped REST backend
//! (the [`api::Backend`] trait) and a fire-and-forget publish/subscribe
//! channel (the [`typing::TypingPublisher`] trait). Rendering, routing and
//! transport reconnection belong to the embedding application.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod auth;
pub mod avatar;
pub mod composer;
pub mod model;
pub mod roster;
pub mod session;
pub mod typing;
pub mod uploader;
pub mod urls;

#[cfg(test)]
mod tests;

/// Result type alias for CourseChat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for CourseChat operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed caller input; surfaced immediately, never sent to the server
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or rejected credentials; the embedding UI redirects to login
    #[error("Auth error: {0}")]
    Auth(String),

    /// Attachment exceeds the upload size cap
    #[error("Attachment of {size} bytes exceeds the {cap} byte limit")]
    SizeLimit {
        /// Size of the rejected file in bytes
        size: u64,
        /// Configured cap in bytes
        cap: u64,
    },

    /// Transport-level failure with no server response
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx server response, status and body preserved for display
    #[error("Server error {status}: {body}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Initialize the CourseChat library with logging
pub fn init() {
    tracing_subscriber::fmt::init();
}
