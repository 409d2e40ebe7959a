//! Guarded pre-order traversal shared by every tree shape in the crate.
//!
//! The walk keeps its own stack instead of recursing, and gives up with a
//! structural error once it has taken more steps or descended further than
//! the caller allows. A tree that loops back on itself therefore fails in a
//! bounded number of steps.

use wander_types::{ReplyId, ReplyNode};

use crate::error::{Result, ThreadError};

/// Default ceiling on logical nesting before a tree is treated as malformed.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// A copyable handle onto one node of some tree.
pub trait TreeCursor: Copy {
    type Children: DoubleEndedIterator<Item = Self>;

    /// Direct children in display order.
    fn children(self) -> Self::Children;

    fn reply_id(self) -> ReplyId;
}

impl<'a> TreeCursor for &'a ReplyNode {
    type Children = std::slice::Iter<'a, ReplyNode>;

    fn children(self) -> Self::Children {
        self.children.iter()
    }

    fn reply_id(self) -> ReplyId {
        self.id.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalLimits {
    /// Most nodes a single walk may visit.
    pub max_steps: usize,
    /// Deepest level below the start node a walk may reach.
    pub max_depth: usize,
}

impl TraversalLimits {
    pub fn new(max_steps: usize, max_depth: usize) -> Self {
        Self { max_steps, max_depth }
    }

    /// No step or depth ceiling. Only for trees that cannot loop, such as owned `ReplyNode`s.
    pub fn unbounded() -> Self {
        Self {
            max_steps: usize::MAX,
            max_depth: usize::MAX,
        }
    }
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_steps: usize::MAX,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One descendant reached by a walk.
#[derive(Debug, Clone, Copy)]
pub struct Visit<C> {
    pub node: C,
    /// Levels below the start node; direct children are at 1.
    pub depth: usize,
    pub parent: C,
}

/// Visit every descendant of `start` in pre-order: a child, then all of that
/// child's descendants, then the next sibling. `start` itself is not visited.
pub fn walk_descendants<C, F>(start: C, limits: TraversalLimits, mut visit: F) -> Result<()>
where
    C: TreeCursor,
    F: FnMut(Visit<C>),
{
    // Children are pushed in reverse so the first child pops first.
    let mut stack: Vec<Visit<C>> = start
        .children()
        .rev()
        .map(|node| Visit { node, depth: 1, parent: start })
        .collect();
    let mut steps = 0usize;

    while let Some(entry) = stack.pop() {
        steps += 1;
        if steps > limits.max_steps {
            return Err(ThreadError::Cycle {
                node_id: entry.node.reply_id(),
            });
        }
        if entry.depth > limits.max_depth {
            return Err(ThreadError::DepthLimitExceeded {
                node_id: entry.node.reply_id(),
                limit: limits.max_depth,
            });
        }

        visit(entry);

        let depth = entry.depth + 1;
        let parent = entry.node;
        stack.extend(
            parent
                .children()
                .rev()
                .map(|node| Visit { node, depth, parent }),
        );
    }

    Ok(())
}

pub fn count_descendants<C: TreeCursor>(start: C, limits: TraversalLimits) -> Result<usize> {
    let mut count = 0usize;
    walk_descendants(start, limits, |_| count += 1)?;
    Ok(count)
}

pub fn collect_descendants<C: TreeCursor>(start: C, limits: TraversalLimits) -> Result<Vec<Visit<C>>> {
    let mut out = Vec::new();
    walk_descendants(start, limits, |visit| out.push(visit))?;
    Ok(out)
}
