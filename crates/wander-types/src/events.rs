use serde::{Deserialize, Serialize};

use crate::models::ReplyId;

/// Thread interactions dispatched by the UI event loop, one per click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ThreadAction {
    /// Show or hide the replies under a node
    ToggleReplies { node_id: ReplyId },

    /// Reveal the next page of replies under a node.
    /// Signed on the wire so malformed sizes reach validation instead of
    /// failing to parse.
    LoadMore {
        node_id: ReplyId,
        #[serde(default)]
        page_size: Option<i64>,
    },

    /// Collapse every expanded node, keeping reveal progress
    CollapseAll,
}

impl ThreadAction {
    /// Returns the node this action targets, if it is scoped to one.
    pub fn node_id(&self) -> Option<&ReplyId> {
        match self {
            Self::ToggleReplies { node_id } => Some(node_id),
            Self::LoadMore { node_id, .. } => Some(node_id),
            Self::CollapseAll => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_use_adjacent_tagging() {
        let action: ThreadAction =
            serde_json::from_str(r#"{"type":"LoadMore","data":{"node_id":"r1","page_size":4}}"#).unwrap();
        assert_eq!(
            action,
            ThreadAction::LoadMore { node_id: ReplyId::from("r1"), page_size: Some(4) }
        );

        let collapse: ThreadAction = serde_json::from_str(r#"{"type":"CollapseAll"}"#).unwrap();
        assert_eq!(collapse.node_id(), None);
    }
}
