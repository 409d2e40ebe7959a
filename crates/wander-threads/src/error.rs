use thiserror::Error;
use wander_types::ReplyId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    #[error("malformed tree: reply {node_id} is reachable from itself")]
    Cycle { node_id: ReplyId },

    #[error("malformed tree: reply {node_id} references missing parent {parent_id}")]
    MissingParent { node_id: ReplyId, parent_id: ReplyId },

    #[error("malformed tree: reply id {0} appears more than once")]
    DuplicateId(ReplyId),

    #[error("malformed tree: reply {node_id} is listed under {listed_under:?} but claims parent {claimed:?}")]
    ParentMismatch {
        node_id: ReplyId,
        listed_under: Option<ReplyId>,
        claimed: Option<ReplyId>,
    },

    #[error("malformed tree: reply {node_id} nests deeper than {limit} levels")]
    DepthLimitExceeded { node_id: ReplyId, limit: usize },

    #[error("unknown reply: {0}")]
    UnknownNode(ReplyId),

    #[error("invalid argument {name}: {value}")]
    InvalidArgument { name: &'static str, value: String },
}

impl ThreadError {
    /// True for errors caused by the shape of the reply data rather than the caller's arguments.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::UnknownNode(_) | Self::InvalidArgument { .. })
    }
}

pub type Result<T> = std::result::Result<T, ThreadError>;
