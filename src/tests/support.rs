// Shared test support: a scriptable mock backend with per-method call
// counters, so tests can assert exactly how many network requests a flow
// issued.

use crate::api::{
    Backend, ConversationRecord, CreateGroupRequest, CreateIndividualRequest, MessageRecord,
    ParticipantRecord, ProgressFn, SendEnvelope, UploadFile, UploadResponse,
};
use crate::model::{ConversationKind, Role};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Failure a mock method should simulate
#[derive(Debug, Clone, Copy)]
pub enum Fail {
    Network,
    Server(u16),
}

impl Fail {
    fn into_error(self) -> Error {
        match self {
            Fail::Network => Error::Network("simulated transport failure".to_string()),
            Fail::Server(status) => Error::Server {
                status,
                body: "simulated server failure".to_string(),
            },
        }
    }
}

#[derive(Default)]
pub struct MockBackend {
    pub list_calls: AtomicUsize,
    pub create_individual_calls: AtomicUsize,
    pub create_group_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub avatar_calls: AtomicUsize,

    pub conversations: Mutex<Vec<ConversationRecord>>,
    pub history: Mutex<Vec<MessageRecord>>,
    pub upload_url: Mutex<String>,

    pub fail_history: Mutex<Option<Fail>>,
    pub fail_send: Mutex<Option<Fail>>,
    pub fail_delete: Mutex<Option<Fail>>,
    pub fail_upload: Mutex<Option<Fail>>,
    pub fail_avatar: Mutex<Option<Fail>>,

    pub last_individual_request: Mutex<Option<CreateIndividualRequest>>,
    pub last_group_request: Mutex<Option<CreateGroupRequest>>,
    pub last_envelope: Mutex<Option<SendEnvelope>>,

    next_id: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        let mock = Self::default();
        *mock.upload_url.lock().unwrap() = "/api/uploads/stored.bin".to_string();
        mock
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n}")
    }

    fn failure(&self, slot: &Mutex<Option<Fail>>) -> Option<Fail> {
        *slot.lock().unwrap()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_conversations(&self) -> Result<Vec<ConversationRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn create_individual(
        &self,
        request: &CreateIndividualRequest,
    ) -> Result<ConversationRecord> {
        self.create_individual_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_individual_request.lock().unwrap() = Some(request.clone());
        Ok(conversation(
            &self.next_id("chat"),
            ConversationKind::Individual,
            &[("me", "Me"), (request.other_user_id.as_str(), "Them")],
            None,
        ))
    }

    async fn create_group(&self, request: &CreateGroupRequest) -> Result<ConversationRecord> {
        self.create_group_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_group_request.lock().unwrap() = Some(request.clone());
        let mut members: Vec<(&str, &str)> = vec![("me", "Me")];
        for id in &request.participant_ids {
            members.push((id.as_str(), "Member"));
        }
        Ok(conversation(
            &self.next_id("chat"),
            ConversationKind::Group,
            &members,
            Some(&request.name),
        ))
    }

    async fn fetch_history(&self, _chat_id: &str) -> Result<Vec<MessageRecord>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fail) = self.failure(&self.fail_history) {
            return Err(fail.into_error());
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn send_message(
        &self,
        _chat_id: &str,
        envelope: &SendEnvelope,
    ) -> Result<MessageRecord> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_envelope.lock().unwrap() = Some(envelope.clone());
        if let Some(fail) = self.failure(&self.fail_send) {
            return Err(fail.into_error());
        }
        Ok(MessageRecord {
            message_id: self.next_id("srv"),
            sender_id: "me".to_string(),
            sender_name: Some("Me".to_string()),
            content: envelope.content.clone(),
            message_type: envelope.message_type.clone(),
            file_url: envelope.file_url.clone(),
            created_at: "2024-05-01T10:30:00Z".to_string(),
        })
    }

    async fn delete_message(&self, _chat_id: &str, _message_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fail) = self.failure(&self.fail_delete) {
            return Err(fail.into_error());
        }
        Ok(())
    }

    async fn upload(
        &self,
        _file: &UploadFile,
        _kind_tag: &str,
        progress: ProgressFn,
    ) -> Result<UploadResponse> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fail) = self.failure(&self.fail_upload) {
            return Err(fail.into_error());
        }
        progress(100);
        Ok(UploadResponse {
            file_url: self.upload_url.lock().unwrap().clone(),
        })
    }

    async fn fetch_avatar(&self, user_id: &str) -> Result<Option<String>> {
        self.avatar_calls.fetch_add(1, Ordering::SeqCst);
        // Small delay so concurrent resolution tests genuinely overlap.
        tokio::time::sleep(Duration::from_millis(10)).await;
        if let Some(fail) = self.failure(&self.fail_avatar) {
            return Err(fail.into_error());
        }
        Ok(Some(format!("https://cdn.example.com/avatars/{user_id}.png")))
    }
}

/// Build a conversation record with the given members
pub fn conversation(
    chat_id: &str,
    kind: ConversationKind,
    members: &[(&str, &str)],
    group_name: Option<&str>,
) -> ConversationRecord {
    ConversationRecord {
        chat_id: chat_id.to_string(),
        conversation_type: kind,
        participants: members
            .iter()
            .map(|(id, name)| ParticipantRecord {
                user_id: id.to_string(),
                name: name.to_string(),
                role: Role::Student,
                avatar_url: None,
                online: false,
            })
            .collect(),
        group_name: group_name.map(str::to_string),
        last_message: None,
        unread_count: 0,
        updated_at: Some("2024-05-01T10:00:00Z".to_string()),
    }
}

/// Build a history record
pub fn history_record(
    message_id: &str,
    sender_id: &str,
    content: &str,
    message_type: &str,
    file_url: Option<&str>,
    created_at: &str,
) -> MessageRecord {
    MessageRecord {
        message_id: message_id.to_string(),
        sender_id: sender_id.to_string(),
        sender_name: None,
        content: content.to_string(),
        message_type: message_type.to_string(),
        file_url: file_url.map(str::to_string),
        created_at: created_at.to_string(),
    }
}
