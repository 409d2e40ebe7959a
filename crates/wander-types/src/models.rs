use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use uuid::Uuid;

// -- Identifiers --

/// Opaque reply identifier. The backend sends either strings or integers;
/// both are normalized to their string form so ids compare and hash alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ReplyId(String);

impl ReplyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Client-side id for a reply that has not been acknowledged by the server yet.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ReplyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

impl fmt::Display for ReplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReplyId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ReplyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ReplyId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

// -- Payload --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Everything about a reply that the projector carries but never reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPayload {
    #[serde(default)]
    pub author_ref: Option<AuthorRef>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media_refs: Vec<MediaRef>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reaction_state: ReactionState,
}

impl ReplyPayload {
    pub fn new(author_ref: Option<AuthorRef>, content: impl Into<String>) -> Self {
        Self {
            author_ref,
            content: content.into(),
            media_refs: Vec::new(),
            created_at: Utc::now(),
            reaction_state: ReactionState::default(),
        }
    }
}

// -- Replies --

/// One reply in a discussion, with its direct children in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyNode {
    pub id: ReplyId,
    #[serde(default)]
    pub parent_id: Option<ReplyId>,
    #[serde(flatten)]
    pub payload: ReplyPayload,
    #[serde(default)]
    pub children: Vec<ReplyNode>,
}

impl ReplyNode {
    pub fn new(id: impl Into<ReplyId>, parent_id: Option<ReplyId>, payload: ReplyPayload) -> Self {
        Self {
            id: id.into(),
            parent_id,
            payload,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Detach this node from its children, producing the flat record form.
    pub fn into_record(self) -> (ReplyRecord, Vec<ReplyNode>) {
        let record = ReplyRecord {
            id: self.id,
            parent_id: self.parent_id,
            payload: self.payload,
        };
        (record, self.children)
    }
}

/// Flat form of a reply, linked to its parent only by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRecord {
    pub id: ReplyId,
    #[serde(default)]
    pub parent_id: Option<ReplyId>,
    #[serde(flatten)]
    pub payload: ReplyPayload,
}

// -- Reactions --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

/// Like/dislike tallies for a reply plus the viewer's own vote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionState {
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
    #[serde(default)]
    pub my_reaction: Option<ReactionKind>,
}

impl ReactionState {
    /// Optimistically apply the viewer clicking `kind`.
    /// Clicking the active kind withdraws it; clicking the other kind moves the vote.
    pub fn toggle(&mut self, kind: ReactionKind) {
        match self.my_reaction {
            Some(current) if current == kind => {
                self.decrement(kind);
                self.my_reaction = None;
            }
            Some(current) => {
                self.decrement(current);
                self.increment(kind);
                self.my_reaction = Some(kind);
            }
            None => {
                self.increment(kind);
                self.my_reaction = Some(kind);
            }
        }
    }

    /// Adopt the server's authoritative state after a toggle round-trip.
    /// Returns true if the optimistic state already matched.
    pub fn reconcile(&mut self, server: &ReactionState) -> bool {
        if self == server {
            return true;
        }
        debug!(
            local_likes = self.likes,
            local_dislikes = self.dislikes,
            server_likes = server.likes,
            server_dislikes = server.dislikes,
            "reaction state diverged from server, adopting server counts"
        );
        *self = server.clone();
        false
    }

    fn increment(&mut self, kind: ReactionKind) {
        match kind {
            ReactionKind::Like => self.likes = self.likes.saturating_add(1),
            ReactionKind::Dislike => self.dislikes = self.dislikes.saturating_add(1),
        }
    }

    fn decrement(&mut self, kind: ReactionKind) {
        match kind {
            ReactionKind::Like => self.likes = self.likes.saturating_sub(1),
            ReactionKind::Dislike => self.dislikes = self.dislikes.saturating_sub(1),
        }
    }
}
