//! reqwest implementation of the backend seam
//!
//! Every request carries the session's bearer token and the role-scoped
//! path prefix. Error mapping is uniform: transport failures become
//! [`Error::Network`], 401/403 become [`Error::Auth`] and clear the stored
//! credentials, any other non-2xx becomes [`Error::Server`] with the
//! response body preserved for display.

use crate::api::{
    Backend, ConversationRecord, CreateGroupRequest, CreateIndividualRequest, MessageRecord,
    ProgressFn, SendEnvelope, UploadFile, UploadResponse,
};
use crate::api::types::AvatarResponse;
use crate::auth::SessionProvider;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upload body chunk size; each chunk emits one progress tick
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Backend endpoint configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin, e.g. `https://api.example.com`, without a trailing slash
    pub base_url: String,
}

impl ApiConfig {
    /// Create a configuration for the given origin
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

/// REST backend client
pub struct HttpBackend {
    client: reqwest::Client,
    config: ApiConfig,
    session: Arc<dyn SessionProvider>,
}

impl HttpBackend {
    /// Create a backend client for the given origin and session
    pub fn new(config: ApiConfig, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            session,
        }
    }

    /// Build a fully-qualified, role-scoped URL
    fn url(&self, path: &str) -> Result<String> {
        let role = self
            .session
            .role()
            .ok_or_else(|| Error::Auth("no session role available".to_string()))?;
        Ok(format!("{}{}{}", self.config.base_url, role.api_prefix(), path))
    }

    /// Bearer token for the current session
    fn token(&self) -> Result<String> {
        self.session
            .token()
            .ok_or_else(|| Error::Auth("no auth token stored".to_string()))
    }

    /// Map a response to an error unless it is 2xx
    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("Request rejected with {}, clearing session", status);
            self.session.clear();
            return Err(Error::Auth(format!("request rejected with {status}")));
        }

        Err(Error::Server {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        let token = self.token()?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let response = self.check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Network(format!("invalid response body: {e}")))
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path)?;
        let token = self.token()?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let response = self.check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Network(format!("invalid response body: {e}")))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_conversations(&self) -> Result<Vec<ConversationRecord>> {
        self.get_json("/conversations").await
    }

    async fn create_individual(
        &self,
        request: &CreateIndividualRequest,
    ) -> Result<ConversationRecord> {
        self.post_json("/conversations/individual", request).await
    }

    async fn create_group(&self, request: &CreateGroupRequest) -> Result<ConversationRecord> {
        self.post_json("/conversations/group", request).await
    }

    async fn fetch_history(&self, chat_id: &str) -> Result<Vec<MessageRecord>> {
        self.get_json(&format!("/conversations/{chat_id}/messages"))
            .await
    }

    async fn send_message(
        &self,
        chat_id: &str,
        envelope: &SendEnvelope,
    ) -> Result<MessageRecord> {
        self.post_json(&format!("/conversations/{chat_id}/messages"), envelope)
            .await
    }

    async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<()> {
        let url = self.url(&format!("/conversations/{chat_id}/messages/{message_id}"))?;
        let token = self.token()?;
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        self.check(response).await?;
        Ok(())
    }

    async fn upload(
        &self,
        file: &UploadFile,
        kind_tag: &str,
        progress: ProgressFn,
    ) -> Result<UploadResponse> {
        let url = self.url("/uploads")?;
        let token = self.token()?;
        info!("Uploading {} ({} bytes) to {}", file.filename, file.size(), url);

        progress(0);

        // Chunk the body so each flushed chunk advances the progress callback.
        let total = file.data.len().max(1);
        let chunks: Vec<(Bytes, u8)> = file
            .data
            .chunks(UPLOAD_CHUNK_BYTES)
            .scan(0usize, |sent, chunk| {
                *sent += chunk.len();
                let pct = (*sent * 100 / total) as u8;
                Some((Bytes::copy_from_slice(chunk), pct))
            })
            .collect();

        let tick = progress.clone();
        let stream = futures::stream::iter(chunks.into_iter().map(move |(chunk, pct)| {
            tick(pct);
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let mut part = Part::stream_with_length(Body::wrap_stream(stream), file.size())
            .file_name(file.filename.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| Error::Validation(format!("invalid MIME type: {e}")))?;
        }

        let form = Form::new()
            .part("file", part)
            .text("type", kind_tag.to_string());

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let response = self.check(response).await?;
        let uploaded = response
            .json::<UploadResponse>()
            .await
            .map_err(|e| Error::Network(format!("invalid upload response: {e}")))?;

        progress(100);
        info!("Upload of {} complete: {}", file.filename, uploaded.file_url);
        Ok(uploaded)
    }

    async fn fetch_avatar(&self, user_id: &str) -> Result<Option<String>> {
        match self
            .get_json::<AvatarResponse>(&format!("/users/{user_id}/avatar"))
            .await
        {
            Ok(response) => Ok(response.avatar_url),
            // A user without an avatar is not an error condition.
            Err(Error::Server { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
