use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wander_types::ReplyId;

use crate::error::{Result, ThreadError};

/// Replies shown when a thread is first expanded.
pub const INITIAL_PAGE_SIZE: usize = 2;

/// Replies revealed by each "load more".
pub const DEFAULT_PAGE_SIZE: usize = 2;

/// What re-expanding a collapsed thread shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionPolicy {
    /// Show as much as was visible when the thread was last collapsed.
    #[default]
    PreserveProgress,
    /// Start over at the initial page size on every expand.
    ResetOnExpand,
}

/// Per-reply UI state. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpansionState {
    pub is_expanded: bool,
    pub visible_count: usize,
}

impl ExpansionState {
    pub fn new(initial_page_size: usize) -> Self {
        Self {
            is_expanded: false,
            visible_count: initial_page_size,
        }
    }
}

impl Default for ExpansionState {
    fn default() -> Self {
        Self::new(INITIAL_PAGE_SIZE)
    }
}

/// Reveal one more page. The count is not capped at the thread length;
/// callers re-derive `has_more` against the flattened replies.
pub fn load_more(state: ExpansionState, page_size: usize) -> ExpansionState {
    ExpansionState {
        visible_count: state.visible_count.saturating_add(page_size),
        ..state
    }
}

pub fn toggle_expansion(
    state: ExpansionState,
    policy: ExpansionPolicy,
    initial_page_size: usize,
) -> ExpansionState {
    let is_expanded = !state.is_expanded;
    let visible_count = match policy {
        ExpansionPolicy::ResetOnExpand if is_expanded => initial_page_size,
        _ => state.visible_count,
    };
    ExpansionState {
        is_expanded,
        visible_count,
    }
}

/// Convert a signed count from the outside world, rejecting negatives.
pub fn checked_count(name: &'static str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| ThreadError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}

/// Expansion state for every reply that has been referenced, keyed by id.
/// Entries are created on first reference.
#[derive(Debug, Clone)]
pub struct ExpansionStore {
    states: HashMap<ReplyId, ExpansionState>,
    initial_page_size: usize,
    policy: ExpansionPolicy,
}

impl ExpansionStore {
    pub fn new(initial_page_size: usize, policy: ExpansionPolicy) -> Self {
        Self {
            states: HashMap::new(),
            initial_page_size,
            policy,
        }
    }

    /// Current state, or the default for a reply never referenced. Does not create an entry.
    pub fn get(&self, id: &ReplyId) -> ExpansionState {
        self.states
            .get(id)
            .copied()
            .unwrap_or_else(|| ExpansionState::new(self.initial_page_size))
    }

    pub fn contains(&self, id: &ReplyId) -> bool {
        self.states.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn entry(&mut self, id: &ReplyId) -> &mut ExpansionState {
        let initial = self.initial_page_size;
        self.states.entry(id.clone()).or_insert_with(|| {
            debug!(reply_id = %id, "expansion state created");
            ExpansionState::new(initial)
        })
    }

    pub fn toggle_expansion(&mut self, id: &ReplyId) -> ExpansionState {
        let (policy, initial) = (self.policy, self.initial_page_size);
        let state = self.entry(id);
        *state = toggle_expansion(*state, policy, initial);
        debug!(reply_id = %id, expanded = state.is_expanded, visible = state.visible_count, "toggled replies");
        *state
    }

    pub fn load_more(&mut self, id: &ReplyId, page_size: usize) -> ExpansionState {
        let state = self.entry(id);
        *state = load_more(*state, page_size);
        debug!(reply_id = %id, visible = state.visible_count, "loaded more replies");
        *state
    }

    /// Collapse every thread. Reveal progress is kept for the next expand.
    pub fn collapse_all(&mut self) {
        for state in self.states.values_mut() {
            state.is_expanded = false;
        }
    }

    /// Drop state for replies that no longer exist. Returns how many entries were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&ReplyId) -> bool) -> usize {
        let before = self.states.len();
        self.states.retain(|id, _| keep(id));
        before - self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_more_reveals_a_page_each_time() {
        let state = ExpansionState::default();
        let once = load_more(state, DEFAULT_PAGE_SIZE);
        let twice = load_more(once, DEFAULT_PAGE_SIZE);
        assert_eq!(once.visible_count, 4);
        assert_eq!(twice.visible_count, 6);
    }

    #[test]
    fn re_expanding_keeps_progress_by_default() {
        let state = ExpansionState { is_expanded: true, visible_count: 6 };
        let collapsed = toggle_expansion(state, ExpansionPolicy::PreserveProgress, INITIAL_PAGE_SIZE);
        assert!(!collapsed.is_expanded);
        let expanded = toggle_expansion(collapsed, ExpansionPolicy::PreserveProgress, INITIAL_PAGE_SIZE);
        assert_eq!(expanded, ExpansionState { is_expanded: true, visible_count: 6 });
    }

    #[test]
    fn reset_policy_starts_over_on_expand() {
        let state = ExpansionState { is_expanded: true, visible_count: 6 };
        let collapsed = toggle_expansion(state, ExpansionPolicy::ResetOnExpand, INITIAL_PAGE_SIZE);
        assert_eq!(collapsed.visible_count, 6);
        let expanded = toggle_expansion(collapsed, ExpansionPolicy::ResetOnExpand, INITIAL_PAGE_SIZE);
        assert_eq!(expanded, ExpansionState { is_expanded: true, visible_count: 2 });
    }

    #[test]
    fn negative_sizes_are_rejected() {
        assert_eq!(checked_count("visible_count", 0).unwrap(), 0);
        assert!(matches!(
            checked_count("visible_count", -1),
            Err(ThreadError::InvalidArgument { name: "visible_count", .. })
        ));
        assert!(checked_count("page_size", -2).is_err());
        assert_eq!(checked_count("page_size", 3).unwrap(), 3);
    }

    #[test]
    fn store_creates_state_lazily() {
        let mut store = ExpansionStore::new(INITIAL_PAGE_SIZE, ExpansionPolicy::default());
        let id = ReplyId::from("never-seen");
        assert_eq!(store.get(&id), ExpansionState::default());
        assert!(store.is_empty());

        let state = store.toggle_expansion(&id);
        assert!(state.is_expanded);
        assert!(store.contains(&id));
    }

    #[test]
    fn collapse_all_keeps_counts() {
        let mut store = ExpansionStore::new(INITIAL_PAGE_SIZE, ExpansionPolicy::default());
        let a = ReplyId::from("a");
        store.toggle_expansion(&a);
        store.load_more(&a, 2);
        store.collapse_all();
        assert_eq!(store.get(&a), ExpansionState { is_expanded: false, visible_count: 4 });
    }

    #[test]
    fn retain_drops_only_rejected_ids() {
        let mut store = ExpansionStore::new(INITIAL_PAGE_SIZE, ExpansionPolicy::default());
        for id in ["a", "b", "c"] {
            store.entry(&ReplyId::from(id));
        }
        let removed = store.retain(|id| id.as_str() != "b");
        assert_eq!(removed, 1);
        assert!(!store.contains(&ReplyId::from("b")));
        assert_eq!(store.len(), 2);
    }
}
