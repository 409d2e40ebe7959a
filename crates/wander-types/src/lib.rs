//! Shared data types for the Wander forum client: the reply model, reaction
//! state, discussion payloads, and the thread actions the UI dispatches.

pub mod api;
pub mod events;
pub mod models;

pub use events::ThreadAction;
pub use models::{
    AuthorRef, MediaRef, ReactionKind, ReactionState, ReplyId, ReplyNode, ReplyPayload, ReplyRecord,
};
