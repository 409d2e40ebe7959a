use serde::Serialize;
use tracing::{debug, info, warn};
use wander_types::{AuthorRef, ReplyId, ReplyNode, ReplyRecord, ThreadAction};

use crate::config::ProjectorConfig;
use crate::error::{Result, ThreadError};
use crate::expansion::{ExpansionState, ExpansionStore, checked_count};
use crate::flatten::{display_depth, visible_window};
use crate::forest::ReplyForest;

/// Who a row is answering, for "replying to @name" attribution.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReplyTo<'a> {
    pub id: &'a ReplyId,
    pub author: Option<&'a AuthorRef>,
}

/// One visible reply beneath an expanded thread.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThreadRow<'a> {
    pub reply: &'a ReplyRecord,
    /// Logical level in the forest, never clamped.
    pub level: usize,
    /// Indentation to render, clamped to the configured maximum.
    pub display_depth: usize,
    pub reply_to: ReplyTo<'a>,
}

/// Everything the rendering layer needs to draw one reply and its thread.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadView<'a> {
    pub reply: &'a ReplyRecord,
    pub level: usize,
    pub descendant_count: usize,
    pub is_expanded: bool,
    /// Visible descendants in pre-order; empty while collapsed.
    pub rows: Vec<ThreadRow<'a>>,
    /// Whether a "load more" affordance should be offered.
    pub has_more: bool,
    /// Descendants not currently shown.
    pub hidden_count: usize,
}

/// Projects a reply forest into bounded, flat thread views and owns the
/// per-reply expansion state that drives them.
#[derive(Debug, Clone)]
pub struct ReplyTreeProjector {
    config: ProjectorConfig,
    store: ExpansionStore,
}

impl ReplyTreeProjector {
    pub fn new(config: ProjectorConfig) -> Result<Self> {
        config.validate()?;
        let store = ExpansionStore::new(config.initial_page_size, config.expansion_policy);
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    pub fn state(&self, id: &ReplyId) -> ExpansionState {
        self.store.get(id)
    }

    pub fn store(&self) -> &ExpansionStore {
        &self.store
    }

    /// Assemble a validated forest under this projector's depth limit.
    pub fn assemble(&self, replies: Vec<ReplyNode>) -> Result<ReplyForest> {
        ReplyForest::from_nested(replies, self.config.max_depth)
    }

    pub fn toggle_expansion(&mut self, id: &ReplyId) -> ExpansionState {
        self.store.toggle_expansion(id)
    }

    /// Reveal another page under `id`. `None` uses the configured page size;
    /// negative sizes are rejected rather than clamped, zero reveals nothing.
    pub fn load_more(&mut self, id: &ReplyId, page_size: Option<i64>) -> Result<ExpansionState> {
        let page_size = match page_size {
            Some(raw) => checked_count("page_size", raw).inspect_err(|_| {
                warn!(reply_id = %id, page_size = raw, "rejected load-more page size");
            })?,
            None => self.config.page_size,
        };
        Ok(self.store.load_more(id, page_size))
    }

    pub fn apply(&mut self, action: &ThreadAction) -> Result<()> {
        match action {
            ThreadAction::ToggleReplies { node_id } => {
                self.toggle_expansion(node_id);
            }
            ThreadAction::LoadMore { node_id, page_size } => {
                self.load_more(node_id, *page_size)?;
            }
            ThreadAction::CollapseAll => {
                debug!(tracked = self.store.len(), "collapsing all threads");
                self.store.collapse_all();
            }
        }
        Ok(())
    }

    /// Forget expansion state for replies that are gone from `forest`,
    /// e.g. after a delete or a full refetch.
    pub fn prune(&mut self, forest: &ReplyForest) -> usize {
        let removed = self.store.retain(|id| forest.contains(id));
        if removed > 0 {
            info!(removed, "pruned expansion state for removed replies");
        }
        removed
    }

    /// Views for every top-level reply, in display order.
    pub fn project<'f>(&mut self, forest: &'f ReplyForest) -> Result<Vec<ThreadView<'f>>> {
        let root_ids: Vec<&'f ReplyId> = forest.roots().map(|record| &record.id).collect();
        root_ids
            .into_iter()
            .map(|id| self.project_node(forest, id))
            .collect()
    }

    /// View for any reply in the forest.
    pub fn project_node<'f>(&mut self, forest: &'f ReplyForest, id: &ReplyId) -> Result<ThreadView<'f>> {
        let reply = forest
            .get(id)
            .ok_or_else(|| ThreadError::UnknownNode(id.clone()))?;
        let level = forest.level_of(id)?;
        let descendants = forest.flatten_descendants(id)?;
        let descendant_count = descendants.len();

        if descendant_count == 0 {
            return Ok(ThreadView {
                reply,
                level,
                descendant_count,
                is_expanded: false,
                rows: Vec::new(),
                has_more: false,
                hidden_count: 0,
            });
        }

        // First render of a reply with a thread materializes its state.
        let state = *self.store.entry(id);
        if !state.is_expanded {
            return Ok(ThreadView {
                reply,
                level,
                descendant_count,
                is_expanded: false,
                rows: Vec::new(),
                has_more: false,
                hidden_count: descendant_count,
            });
        }

        let window = visible_window(&descendants, state.visible_count);
        let rows = window
            .items
            .iter()
            .map(|entry| ThreadRow {
                reply: entry.record,
                level: entry.level,
                display_depth: display_depth(entry.level, self.config.max_visual_level),
                reply_to: ReplyTo {
                    id: &entry.parent.id,
                    author: entry.parent.payload.author_ref.as_ref(),
                },
            })
            .collect();

        Ok(ThreadView {
            reply,
            level,
            descendant_count,
            is_expanded: true,
            rows,
            has_more: window.has_more,
            hidden_count: window.hidden,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::ExpansionPolicy;
    use wander_types::ReplyPayload;

    fn node(id: &str, parent: Option<&str>, author: &str, children: Vec<ReplyNode>) -> ReplyNode {
        let author = AuthorRef {
            user_id: format!("u-{}", author),
            username: author.to_string(),
        };
        let mut node = ReplyNode::new(id, parent.map(ReplyId::from), ReplyPayload::new(Some(author), "..."));
        node.children = children;
        node
    }

    /// r1 -> [a -> [a1 -> [a2]], b, c], r2
    fn sample() -> Vec<ReplyNode> {
        vec![
            node(
                "r1",
                None,
                "kim",
                vec![
                    node(
                        "a",
                        Some("r1"),
                        "lee",
                        vec![node("a1", Some("a"), "kim", vec![node("a2", Some("a1"), "ana", vec![])])],
                    ),
                    node("b", Some("r1"), "ana", vec![]),
                    node("c", Some("r1"), "lee", vec![]),
                ],
            ),
            node("r2", None, "ana", vec![]),
        ]
    }

    fn row_ids<'a>(view: &'a ThreadView<'_>) -> Vec<&'a str> {
        view.rows.iter().map(|row| row.reply.id.as_str()).collect()
    }

    #[test]
    fn collapsed_thread_hides_everything() {
        let mut projector = ReplyTreeProjector::new(ProjectorConfig::default()).unwrap();
        let forest = projector.assemble(sample()).unwrap();
        let views = projector.project(&forest).unwrap();

        assert_eq!(views.len(), 2);
        assert!(!views[0].is_expanded);
        assert!(views[0].rows.is_empty());
        assert_eq!(views[0].hidden_count, 5);
        assert_eq!(views[1].descendant_count, 0);

        // Only the reply with a thread got state.
        assert!(projector.store().contains(&ReplyId::from("r1")));
        assert!(!projector.store().contains(&ReplyId::from("r2")));
    }

    #[test]
    fn expanding_shows_first_page_then_more() {
        let mut projector = ReplyTreeProjector::new(ProjectorConfig::default()).unwrap();
        let forest = projector.assemble(sample()).unwrap();
        let r1 = ReplyId::from("r1");

        projector.apply(&ThreadAction::ToggleReplies { node_id: r1.clone() }).unwrap();
        let view = projector.project_node(&forest, &r1).unwrap();
        assert_eq!(row_ids(&view), vec!["a", "a1"]);
        assert!(view.has_more);
        assert_eq!(view.hidden_count, 3);

        projector
            .apply(&ThreadAction::LoadMore { node_id: r1.clone(), page_size: None })
            .unwrap();
        let view = projector.project_node(&forest, &r1).unwrap();
        assert_eq!(row_ids(&view), vec!["a", "a1", "a2", "b"]);

        projector
            .apply(&ThreadAction::LoadMore { node_id: r1.clone(), page_size: Some(5) })
            .unwrap();
        let view = projector.project_node(&forest, &r1).unwrap();
        assert_eq!(row_ids(&view), vec!["a", "a1", "a2", "b", "c"]);
        assert!(!view.has_more);
        assert_eq!(projector.state(&r1).visible_count, 9);
    }

    #[test]
    fn rows_carry_attribution_and_clamped_depth() {
        let config = ProjectorConfig { max_visual_level: 2, ..ProjectorConfig::default() };
        let mut projector = ReplyTreeProjector::new(config).unwrap();
        let forest = projector.assemble(sample()).unwrap();
        let r1 = ReplyId::from("r1");
        projector.toggle_expansion(&r1);
        projector.load_more(&r1, Some(10)).unwrap();

        let view = projector.project_node(&forest, &r1).unwrap();
        let a2 = view.rows.iter().find(|row| row.reply.id.as_str() == "a2").unwrap();
        assert_eq!(a2.level, 3);
        assert_eq!(a2.display_depth, 2);
        assert_eq!(a2.reply_to.id.as_str(), "a1");
        assert_eq!(a2.reply_to.author.unwrap().username, "kim");
    }

    #[test]
    fn invalid_page_size_leaves_state_untouched() {
        let mut projector = ReplyTreeProjector::new(ProjectorConfig::default()).unwrap();
        let r1 = ReplyId::from("r1");
        let err = projector.load_more(&r1, Some(-2)).unwrap_err();
        assert_eq!(err, ThreadError::InvalidArgument { name: "page_size", value: "-2".into() });
        assert!(!projector.store().contains(&r1));
    }

    #[test]
    fn zero_page_size_reveals_nothing() {
        let mut projector = ReplyTreeProjector::new(ProjectorConfig::default()).unwrap();
        let a = ReplyId::from("a");
        let state = projector.load_more(&a, Some(0)).unwrap();
        assert_eq!(state, ExpansionState { is_expanded: false, visible_count: 2 });
        assert!(projector.store().contains(&a));
    }

    #[test]
    fn reset_policy_is_configurable() {
        let config = ProjectorConfig {
            expansion_policy: ExpansionPolicy::ResetOnExpand,
            ..ProjectorConfig::default()
        };
        let mut projector = ReplyTreeProjector::new(config).unwrap();
        let r1 = ReplyId::from("r1");
        projector.toggle_expansion(&r1);
        projector.load_more(&r1, None).unwrap();
        projector.toggle_expansion(&r1);
        let state = projector.toggle_expansion(&r1);
        assert_eq!(state, ExpansionState { is_expanded: true, visible_count: 2 });
    }

    #[test]
    fn prune_forgets_deleted_replies() {
        let mut projector = ReplyTreeProjector::new(ProjectorConfig::default()).unwrap();
        let forest = projector.assemble(sample()).unwrap();
        projector.toggle_expansion(&ReplyId::from("r1"));
        projector.toggle_expansion(&ReplyId::from("a"));

        // Refetch after "a" and its subtree were deleted.
        let mut replies = sample();
        replies[0].children.remove(0);
        let refetched = projector.assemble(replies).unwrap();

        assert_eq!(projector.prune(&forest), 0);
        assert_eq!(projector.prune(&refetched), 1);
        assert!(projector.state(&ReplyId::from("r1")).is_expanded);
        assert!(!projector.store().contains(&ReplyId::from("a")));
    }

    #[test]
    fn unknown_reply_cannot_be_projected() {
        let mut projector = ReplyTreeProjector::new(ProjectorConfig::default()).unwrap();
        let forest = projector.assemble(sample()).unwrap();
        let err = projector.project_node(&forest, &ReplyId::from("zzz")).unwrap_err();
        assert_eq!(err, ThreadError::UnknownNode(ReplyId::from("zzz")));
    }
}
