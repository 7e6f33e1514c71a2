//! Conversation roster
//!
//! Lists, filters and creates conversations, keeps them ordered by recency,
//! and resolves the display identity shown for each thread. Every newly
//! observed participant triggers a background avatar resolution through the
//! shared [`AvatarCache`], which already coalesces duplicate lookups.

use crate::api::{Backend, ConversationRecord, CreateGroupRequest, CreateIndividualRequest};
use crate::avatar::AvatarCache;
use crate::model::{Conversation, ConversationKind, Participant};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Conversation-kind filter for [`ConversationList::list`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    /// Both individual and group conversations
    All,
    /// Individual conversations only
    Individual,
    /// Group conversations only
    Group,
}

/// Filter applied when listing conversations
#[derive(Debug, Clone)]
pub struct ConversationFilter {
    /// Which conversation kinds to include
    pub kind: KindFilter,
    /// Case-insensitive substring matched against the display name
    pub search: String,
}

impl Default for ConversationFilter {
    fn default() -> Self {
        Self {
            kind: KindFilter::All,
            search: String::new(),
        }
    }
}

/// What a conversation row displays as
#[derive(Debug, Clone)]
pub enum DisplayIdentity {
    /// The other participant of an individual conversation
    Peer(Participant),
    /// Group name and member count
    Group {
        /// Group display name
        name: String,
        /// Number of participants
        participant_count: usize,
    },
}

/// The set of conversations visible to the current user
pub struct ConversationList {
    backend: Arc<dyn Backend>,
    avatars: Arc<AvatarCache>,
    current_user_id: String,
    conversations: Vec<Conversation>,
}

impl ConversationList {
    /// Create an empty roster for the given user
    pub fn new(backend: Arc<dyn Backend>, avatars: Arc<AvatarCache>, current_user_id: &str) -> Self {
        Self {
            backend,
            avatars,
            current_user_id: current_user_id.to_string(),
            conversations: Vec::new(),
        }
    }

    /// Fetch the conversation set from the backend
    ///
    /// Replaces the local set, re-sorts by recency and kicks off avatar
    /// resolution for every participant observed in the response.
    pub async fn refresh(&mut self) -> Result<()> {
        let records = self.backend.list_conversations().await?;
        info!("Loaded {} conversations", records.len());

        self.conversations = records.into_iter().map(conversation_from_record).collect();
        self.sort_by_recency();

        for conversation in &self.conversations {
            for participant in &conversation.participants {
                self.avatars.spawn_resolve(&participant.user_id);
            }
        }
        Ok(())
    }

    /// Conversations matching the filter, ordered by recency
    ///
    /// Search matches the group name for groups and any participant's name
    /// for individual conversations, case-insensitively.
    pub fn list(&self, filter: &ConversationFilter) -> Vec<&Conversation> {
        let needle = filter.search.trim().to_lowercase();
        self.conversations
            .iter()
            .filter(|c| match filter.kind {
                KindFilter::All => true,
                KindFilter::Individual => c.kind == ConversationKind::Individual,
                KindFilter::Group => c.kind == ConversationKind::Group,
            })
            .filter(|c| needle.is_empty() || matches_search(c, &needle))
            .collect()
    }

    /// Create (or reuse) an individual conversation with one other user
    pub async fn create_individual(
        &mut self,
        other_user_id: &str,
        initial_message: &str,
    ) -> Result<Conversation> {
        if other_user_id.trim().is_empty() {
            return Err(Error::Validation(
                "an individual conversation needs another participant".to_string(),
            ));
        }

        let request = CreateIndividualRequest {
            other_user_id: other_user_id.to_string(),
            initial_message: initial_message.to_string(),
        };
        let record = self.backend.create_individual(&request).await?;
        info!("Created individual conversation {}", record.chat_id);
        Ok(self.insert(conversation_from_record(record)))
    }

    /// Create a group conversation
    pub async fn create_group(
        &mut self,
        name: &str,
        participant_ids: &[String],
        initial_message: &str,
    ) -> Result<Conversation> {
        if name.trim().is_empty() {
            return Err(Error::Validation("a group needs a name".to_string()));
        }
        if participant_ids.len() < 2 {
            return Err(Error::Validation(
                "a group needs at least two other participants".to_string(),
            ));
        }

        let request = CreateGroupRequest {
            name: name.to_string(),
            participant_ids: participant_ids.to_vec(),
            initial_message: initial_message.to_string(),
        };
        let record = self.backend.create_group(&request).await?;
        info!("Created group conversation {}", record.chat_id);
        Ok(self.insert(conversation_from_record(record)))
    }

    /// Resolve what a conversation row displays as
    ///
    /// For groups this is the group name and member count. For individual
    /// conversations it is the participant whose id differs from the current
    /// user. The current user missing from their own conversation's
    /// participant list is an invariant violation on the backend side; it is
    /// logged and the first participant is used as a fallback. Returns `None`
    /// only for an individual conversation with no participants at all.
    pub fn resolve_display(&self, conversation: &Conversation) -> Option<DisplayIdentity> {
        match conversation.kind {
            ConversationKind::Group => Some(DisplayIdentity::Group {
                name: conversation
                    .group_name
                    .clone()
                    .unwrap_or_else(|| "Group".to_string()),
                participant_count: conversation.participants.len(),
            }),
            ConversationKind::Individual => {
                let includes_self = conversation
                    .participants
                    .iter()
                    .any(|p| p.user_id == self.current_user_id);
                if !includes_self {
                    warn!(
                        "Current user {} is not a participant of conversation {}",
                        self.current_user_id, conversation.chat_id
                    );
                }

                conversation
                    .participants
                    .iter()
                    .find(|p| p.user_id != self.current_user_id)
                    .or_else(|| conversation.participants.first())
                    .cloned()
                    .map(DisplayIdentity::Peer)
            }
        }
    }

    /// Apply the arrival of a message to the conversation it belongs to
    ///
    /// Updates the last-message summary and activity timestamp, increments
    /// the unread counter when someone else sent it, and re-sorts.
    pub fn note_message(
        &mut self,
        chat_id: &str,
        sender_id: &str,
        summary: &str,
        at: DateTime<Utc>,
    ) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.chat_id == chat_id) {
            conversation.apply_message(sender_id, summary, at, &self.current_user_id);
            self.sort_by_recency();
        }
    }

    /// Clear the unread counter of a conversation
    pub fn mark_read(&mut self, chat_id: &str) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.chat_id == chat_id) {
            conversation.mark_read();
        }
    }

    /// All conversations, ordered by recency
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    fn insert(&mut self, conversation: Conversation) -> Conversation {
        for participant in &conversation.participants {
            self.avatars.spawn_resolve(&participant.user_id);
        }
        // The backend may return an existing conversation for a repeated
        // individual-create; replace rather than duplicate.
        self.conversations
            .retain(|c| c.chat_id != conversation.chat_id);
        self.conversations.push(conversation.clone());
        self.sort_by_recency();
        conversation
    }

    fn sort_by_recency(&mut self) {
        self.conversations
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
}

fn matches_search(conversation: &Conversation, needle: &str) -> bool {
    match conversation.kind {
        ConversationKind::Group => conversation
            .group_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(needle)),
        ConversationKind::Individual => conversation
            .participants
            .iter()
            .any(|p| p.name.to_lowercase().contains(needle)),
    }
}

fn conversation_from_record(record: ConversationRecord) -> Conversation {
    let updated_at = record
        .updated_at_utc()
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    Conversation {
        chat_id: record.chat_id,
        kind: record.conversation_type,
        participants: record
            .participants
            .into_iter()
            .map(|p| Participant {
                user_id: p.user_id,
                name: p.name,
                role: p.role,
                avatar_url: p.avatar_url,
                online: p.online,
            })
            .collect(),
        group_name: record.group_name,
        last_message: record.last_message,
        unread: record.unread_count,
        updated_at,
    }
}
