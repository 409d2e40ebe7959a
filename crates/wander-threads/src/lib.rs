//! Wander Threads: reply-tree projection for discussion views.
//!
//! Turns a nested reply forest into flat, bounded thread views:
//! - Guarded pre-order traversal with explicit stacks (no native recursion)
//! - Validated forest arena built from nested replies or flat parent-linked records
//! - Visible windows with "load more" pagination per reply
//! - Indentation clamped to a maximum visual level, logical level kept intact
//! - Expand/collapse state keyed by reply id, with a configurable re-expand policy

pub mod config;
pub mod error;
pub mod expansion;
pub mod flatten;
pub mod forest;
pub mod projector;
pub mod walk;

// Re-export key types for convenience.
pub use config::ProjectorConfig;
pub use error::{Result, ThreadError};
pub use expansion::{
    DEFAULT_PAGE_SIZE, ExpansionPolicy, ExpansionState, ExpansionStore, INITIAL_PAGE_SIZE,
    load_more, toggle_expansion,
};
pub use flatten::{
    FlatReply, MAX_VISUAL_LEVEL, Window, count_descendants, display_depth, flatten_descendants,
    visible_window,
};
pub use forest::{ForestEntry, ReplyForest};
pub use projector::{ReplyTo, ReplyTreeProjector, ThreadRow, ThreadView};
pub use walk::{DEFAULT_MAX_DEPTH, TraversalLimits, TreeCursor};
