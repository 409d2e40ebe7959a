use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AuthorRef, ReactionKind, ReactionState, ReplyNode};

// -- Discussions --

/// Response of the discussion endpoint: the discussion plus its full,
/// already-nested reply forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionResponse {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author_ref: Option<AuthorRef>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<ReplyNode>,
}

/// Parse a discussion without serde_json's nesting limit. Every reply level
/// costs two levels of JSON nesting, so deep threads would otherwise be
/// rejected; the stack grows on demand instead.
pub fn parse_discussion(raw: &str) -> serde_json::Result<DiscussionResponse> {
    let mut de = serde_json::Deserializer::from_str(raw);
    de.disable_recursion_limit();
    let discussion = DiscussionResponse::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(discussion)
}

// -- Reactions --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleReactionRequest {
    pub kind: ReactionKind,
}

/// The reaction endpoint answers with the authoritative state of the reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleReactionResponse {
    pub reply_id: crate::models::ReplyId,
    #[serde(flatten)]
    pub state: ReactionState,
}
