use crate::api::{ApiConfig, Backend, HttpBackend};
use crate::auth::{Credentials, MemorySession, SessionProvider};
use crate::model::Role;
use crate::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn credentials() -> Credentials {
    Credentials {
        token: "tok-1".to_string(),
        user_id: "me".to_string(),
        role: Role::Student,
    }
}

/// Session provider that counts `clear` calls on top of the in-memory store.
struct RecordingSession {
    inner: MemorySession,
    clears: AtomicUsize,
}

impl RecordingSession {
    fn logged_in() -> Self {
        Self {
            inner: MemorySession::logged_in(credentials()),
            clears: AtomicUsize::new(0),
        }
    }
}

impl SessionProvider for RecordingSession {
    fn token(&self) -> Option<String> {
        self.inner.token()
    }

    fn user_id(&self) -> Option<String> {
        self.inner.user_id()
    }

    fn role(&self) -> Option<Role> {
        self.inner.role()
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear();
    }
}

/// Serve a single canned HTTP response on a loopback port.
async fn respond_once(status: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().expect("listener has no address");

    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            while let Ok(n) = stream.read(&mut buf).await {
                if n == 0 || buf[..n].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let reply =
                format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            let _ = stream.write_all(reply.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    format!("http://{addr}")
}

#[test]
fn memory_session_stores_and_clears_credentials() {
    let session = MemorySession::new();
    assert_eq!(session.token(), None);
    assert_eq!(session.role(), None);

    session.set(credentials());
    assert_eq!(session.token(), Some("tok-1".to_string()));
    assert_eq!(session.user_id(), Some("me".to_string()));
    assert_eq!(session.role(), Some(Role::Student));

    session.clear();
    assert_eq!(session.token(), None);
    // Clearing an already-empty session stays a no-op.
    session.clear();
    assert_eq!(session.token(), None);
}

#[tokio::test]
async fn missing_credentials_fail_before_any_request() {
    // The origin is in a reserved documentation range, so any attempt to
    // reach it would stall or fail with a transport error. An immediate
    // auth error proves the call never left the process.
    let session = Arc::new(MemorySession::new());
    let backend = HttpBackend::new(ApiConfig::new("http://192.0.2.1:9"), session);

    let result = tokio::time::timeout(Duration::from_millis(100), backend.list_conversations())
        .await
        .expect("credential check should not touch the network");
    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test]
async fn unauthorized_response_clears_the_session() {
    let origin = respond_once("401 Unauthorized").await;
    let session = Arc::new(RecordingSession::logged_in());
    let backend = HttpBackend::new(ApiConfig::new(origin), session.clone());

    let result = backend.list_conversations().await;
    assert!(matches!(result, Err(Error::Auth(_))));
    assert_eq!(session.clears.load(Ordering::SeqCst), 1);
    assert_eq!(session.token(), None);
}

#[tokio::test]
async fn forbidden_response_clears_the_session() {
    let origin = respond_once("403 Forbidden").await;
    let session = Arc::new(RecordingSession::logged_in());
    let backend = HttpBackend::new(ApiConfig::new(origin), session.clone());

    let result = backend.fetch_history("chat-1").await;
    assert!(matches!(result, Err(Error::Auth(_))));
    assert_eq!(session.clears.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_error_leaves_the_session_intact() {
    let origin = respond_once("500 Internal Server Error").await;
    let session = Arc::new(RecordingSession::logged_in());
    let backend = HttpBackend::new(ApiConfig::new(origin), session.clone());

    let result = backend.list_conversations().await;
    assert!(matches!(result, Err(Error::Server { status: 500, .. })));
    assert_eq!(session.clears.load(Ordering::SeqCst), 0);
    assert_eq!(session.token(), Some("tok-1".to_string()));
}
