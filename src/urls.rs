//! Attachment URL resolution
//!
//! The backend abbreviates attachment URLs inconsistently: some endpoints
//! return a fully-qualified URL, some a `/api/...` path, some a bare stored
//! filename. One deterministic, idempotent rule set turns all three forms
//! into a renderable URL before messages leave the session.

/// Resolves abbreviated or relative attachment URLs to fully-qualified ones
#[derive(Debug, Clone)]
pub struct UrlResolver {
    origin: String,
    upload_path: String,
}

impl UrlResolver {
    /// Create a resolver for the given origin and upload path
    ///
    /// `origin` is the backend origin (`https://api.example.com`);
    /// `upload_path` is where bare filenames live (`/api/uploads`).
    pub fn new(origin: impl Into<String>, upload_path: impl Into<String>) -> Self {
        let mut origin = origin.into();
        while origin.ends_with('/') {
            origin.pop();
        }

        let mut upload_path = upload_path.into();
        if !upload_path.starts_with('/') {
            upload_path.insert(0, '/');
        }
        while upload_path.ends_with('/') {
            upload_path.pop();
        }

        Self { origin, upload_path }
    }

    /// Resolve a URL as the server returned it
    ///
    /// Absolute URLs pass through unchanged, leading-slash paths are
    /// prefixed with the origin, bare filenames are placed under the upload
    /// path. Applying the resolver to its own output is a no-op.
    pub fn resolve(&self, raw: &str) -> String {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return raw.to_string();
        }
        if raw.starts_with('/') {
            return format!("{}{}", self.origin, raw);
        }
        format!("{}{}/{}", self.origin, self.upload_path, raw)
    }
}
