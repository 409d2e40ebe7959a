use serde::Serialize;
use wander_types::{ReplyId, ReplyNode};

use crate::error::Result;
use crate::walk::{self, TraversalLimits};

/// Indentation stops growing past this level.
pub const MAX_VISUAL_LEVEL: usize = 5;

/// A descendant of a nested reply, in the order it should be displayed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FlatReply<'a> {
    pub node: &'a ReplyNode,
    /// Logical nesting below the flattened node, unbounded; direct children are at 1.
    pub level: usize,
    pub parent_id: &'a ReplyId,
}

// Owned replies cannot loop, so these walks run without a depth ceiling.

/// Number of replies beneath `node`, not counting `node` itself.
pub fn count_descendants(node: &ReplyNode) -> Result<usize> {
    walk::count_descendants(node, TraversalLimits::unbounded())
}

/// Every reply beneath `node` in pre-order. This order is the order in which
/// "load more" reveals replies.
pub fn flatten_descendants(node: &ReplyNode) -> Result<Vec<FlatReply<'_>>> {
    let visits = walk::collect_descendants(node, TraversalLimits::unbounded())?;
    Ok(visits
        .into_iter()
        .map(|visit| FlatReply {
            node: visit.node,
            level: visit.depth,
            parent_id: &visit.parent.id,
        })
        .collect())
}

/// The leading part of a flattened thread that is currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window<'a, T> {
    pub items: &'a [T],
    pub has_more: bool,
    /// Entries past the window.
    pub hidden: usize,
}

pub fn visible_window<T>(flattened: &[T], visible_count: usize) -> Window<'_, T> {
    let shown = visible_count.min(flattened.len());
    Window {
        items: &flattened[..shown],
        has_more: flattened.len() > visible_count,
        hidden: flattened.len() - shown,
    }
}

/// Clamp a logical nesting level to the deepest indentation the thread renders.
pub fn display_depth(raw_level: usize, max_visual_level: usize) -> usize {
    raw_level.min(max_visual_level)
}
