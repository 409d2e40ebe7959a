use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};
use wander_types::{ReplyId, ReplyNode, ReplyRecord};

use crate::error::{Result, ThreadError};
use crate::walk::{self, TraversalLimits, TreeCursor};

struct ForestNode {
    record: ReplyRecord,
    parent: Option<usize>,
    children: Vec<usize>,
    level: usize,
}

/// The reply forest of one discussion, stored as an arena indexed by reply id.
///
/// Construction validates the forest: ids are unique, every parent exists,
/// parent links never loop, and nesting stays under the depth limit. Queries
/// after that can rely on the structure.
pub struct ReplyForest {
    nodes: Vec<ForestNode>,
    index: HashMap<ReplyId, usize>,
    roots: Vec<usize>,
    max_depth: usize,
}

/// A descendant returned by [`ReplyForest::flatten_descendants`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ForestEntry<'a> {
    pub record: &'a ReplyRecord,
    /// Logical level in the whole forest; top-level replies are at 0.
    pub level: usize,
    pub parent: &'a ReplyRecord,
}

impl ReplyForest {
    /// Assemble a forest from the nested replies returned by the discussion endpoint.
    pub fn from_nested(roots: Vec<ReplyNode>, max_depth: usize) -> Result<Self> {
        let mut records = Vec::new();
        // (node, id of the node that lists it)
        let mut stack: Vec<(ReplyNode, Option<ReplyId>)> =
            roots.into_iter().rev().map(|node| (node, None)).collect();

        while let Some((node, listed_under)) = stack.pop() {
            if node.parent_id != listed_under {
                return Err(ThreadError::ParentMismatch {
                    node_id: node.id,
                    listed_under,
                    claimed: node.parent_id,
                });
            }
            let (record, children) = node.into_record();
            let id = record.id.clone();
            records.push(record);
            stack.extend(children.into_iter().rev().map(|child| (child, Some(id.clone()))));
        }

        Self::from_records(records, max_depth)
    }

    /// Assemble a forest from flat records linked by parent id. Siblings keep
    /// the relative order they have in `records`.
    pub fn from_records(records: Vec<ReplyRecord>, max_depth: usize) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.id.clone(), i).is_some() {
                return Err(ThreadError::DuplicateId(record.id.clone()));
            }
        }

        let mut nodes: Vec<ForestNode> = records
            .into_iter()
            .map(|record| ForestNode {
                record,
                parent: None,
                children: Vec::new(),
                level: 0,
            })
            .collect();
        let mut roots = Vec::new();

        for i in 0..nodes.len() {
            let Some(parent_id) = nodes[i].record.parent_id.clone() else {
                roots.push(i);
                continue;
            };
            let Some(&parent) = index.get(&parent_id) else {
                return Err(ThreadError::MissingParent {
                    node_id: nodes[i].record.id.clone(),
                    parent_id,
                });
            };
            if parent == i {
                return Err(ThreadError::Cycle {
                    node_id: parent_id,
                });
            }
            nodes[i].parent = Some(parent);
            nodes[parent].children.push(i);
        }

        let mut forest = Self {
            nodes,
            index,
            roots,
            max_depth,
        };
        forest.assign_levels()?;

        debug!(replies = forest.len(), roots = forest.roots.len(), "reply forest assembled");
        Ok(forest)
    }

    /// Walk down from every root, recording levels. Any reply left unreached
    /// hangs off a loop of parent links.
    fn assign_levels(&mut self) -> Result<()> {
        let limits = self.limits();
        let mut levels: Vec<Option<usize>> = vec![None; self.nodes.len()];

        for &root in &self.roots {
            levels[root] = Some(0);
            let cursor = ForestCursor { forest: self, index: root };
            walk::walk_descendants(cursor, limits, |visit| {
                levels[visit.node.index] = Some(visit.depth);
            })?;
        }

        if let Some(unreached) = levels.iter().position(Option::is_none) {
            let node_id = self.node_on_loop(unreached);
            warn!(%node_id, "reply forest contains a parent-link loop");
            return Err(ThreadError::Cycle { node_id });
        }

        for (node, level) in self.nodes.iter_mut().zip(levels) {
            node.level = level.unwrap_or_default();
        }
        Ok(())
    }

    /// Follow parent links from `start` long enough to be inside the loop it leads to.
    fn node_on_loop(&self, start: usize) -> ReplyId {
        let mut current = start;
        for _ in 0..self.nodes.len() {
            match self.nodes[current].parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        self.nodes[current].record.id.clone()
    }

    fn limits(&self) -> TraversalLimits {
        TraversalLimits::new(self.nodes.len(), self.max_depth)
    }

    fn index_of(&self, id: &ReplyId) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ThreadError::UnknownNode(id.clone()))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &ReplyId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &ReplyId) -> Option<&ReplyRecord> {
        self.index.get(id).map(|&i| &self.nodes[i].record)
    }

    /// Top-level replies in display order.
    pub fn roots(&self) -> impl Iterator<Item = &ReplyRecord> + '_ {
        self.roots.iter().map(|&i| &self.nodes[i].record)
    }

    pub fn parent_of(&self, id: &ReplyId) -> Result<Option<&ReplyRecord>> {
        let i = self.index_of(id)?;
        Ok(self.nodes[i].parent.map(|p| &self.nodes[p].record))
    }

    /// Logical nesting level of a reply; top-level replies are at 0.
    pub fn level_of(&self, id: &ReplyId) -> Result<usize> {
        Ok(self.nodes[self.index_of(id)?].level)
    }

    pub fn count_descendants(&self, id: &ReplyId) -> Result<usize> {
        walk::count_descendants(self.cursor(id)?, self.limits())
    }

    /// Every reply beneath `id` in pre-order, excluding `id` itself.
    pub fn flatten_descendants(&self, id: &ReplyId) -> Result<Vec<ForestEntry<'_>>> {
        let visits = walk::collect_descendants(self.cursor(id)?, self.limits())?;
        Ok(visits
            .into_iter()
            .map(|visit| ForestEntry {
                record: visit.node.record(),
                level: visit.node.level(),
                parent: visit.parent.record(),
            })
            .collect())
    }

    pub fn cursor(&self, id: &ReplyId) -> Result<ForestCursor<'_>> {
        Ok(ForestCursor {
            forest: self,
            index: self.index_of(id)?,
        })
    }
}

/// Handle onto one reply of a [`ReplyForest`].
#[derive(Clone, Copy)]
pub struct ForestCursor<'a> {
    forest: &'a ReplyForest,
    index: usize,
}

impl<'a> ForestCursor<'a> {
    pub fn record(self) -> &'a ReplyRecord {
        &self.forest.nodes[self.index].record
    }

    pub fn level(self) -> usize {
        self.forest.nodes[self.index].level
    }
}

pub struct ForestChildren<'a> {
    forest: &'a ReplyForest,
    inner: std::slice::Iter<'a, usize>,
}

impl<'a> Iterator for ForestChildren<'a> {
    type Item = ForestCursor<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let forest = self.forest;
        self.inner.next().map(|&index| ForestCursor { forest, index })
    }
}

impl DoubleEndedIterator for ForestChildren<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let forest = self.forest;
        self.inner.next_back().map(|&index| ForestCursor { forest, index })
    }
}

impl<'a> TreeCursor for ForestCursor<'a> {
    type Children = ForestChildren<'a>;

    fn children(self) -> Self::Children {
        ForestChildren {
            forest: self.forest,
            inner: self.forest.nodes[self.index].children.iter(),
        }
    }

    fn reply_id(self) -> ReplyId {
        self.record().id.clone()
    }
}
