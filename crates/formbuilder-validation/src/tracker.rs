//! # LinkId Index
//!
//! Which nodes currently hold which linkId. A value held by two or more nodes is a
//! duplicate; every holder of it must report `DUPLICATE_LINK_ID`.

use form_tree::NodeId;
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkIdTracker {
    /// linkId -> holders, in the order they claimed the value.
    holders: HashMap<String, Vec<NodeId>>,
    /// Reverse index: each node is tracked under at most one linkId.
    owners: HashMap<NodeId, String>,
}

impl LinkIdTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct tracked linkIds.
    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn node_ids(&self, link_id: &str) -> &[NodeId] {
        self.holders
            .get(link_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn link_id_of(&self, node: NodeId) -> Option<&str> {
        self.owners.get(&node).map(String::as_str)
    }

    /// True if `link_id` is held by some node other than `node`.
    pub fn has_duplicate(&self, link_id: &str, node: NodeId) -> bool {
        self.node_ids(link_id).iter().any(|&id| id != node)
    }

    /// linkIds held by more than one node.
    pub fn duplicates(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.holders
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(link_id, ids)| (link_id.as_str(), ids.as_slice()))
    }

    /// Tracks `node` under `link_id`, leaving whatever value it held before.
    pub fn insert(&mut self, link_id: &str, node: NodeId) {
        if self.link_id_of(node) == Some(link_id) {
            return;
        }
        self.remove_node(node);
        self.holders
            .entry(link_id.to_string())
            .or_default()
            .push(node);
        self.owners.insert(node, link_id.to_string());
    }

    /// Stops tracking `node`. Returns the linkId it held. Empty sets are pruned.
    pub fn remove_node(&mut self, node: NodeId) -> Option<String> {
        let link_id = self.owners.remove(&node)?;
        if let Some(ids) = self.holders.get_mut(&link_id) {
            ids.retain(|&id| id != node);
            if ids.is_empty() {
                self.holders.remove(&link_id);
            }
        }
        Some(link_id)
    }
}

/// What the linkId validator concluded about the proposed value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkIdOutcome {
    Valid,
    /// The value is well-formed but already held by another node.
    Duplicate,
    /// Required/pattern/length failure: the value is not tracked at all.
    Invalid,
}

/// Result of planning a linkId change, before anything is written.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkIdPlan {
    pub tracker: LinkIdTracker,
    /// The value the node was tracked under before the change.
    pub previous: Option<String>,
    /// Other holders of the new value that must now report a duplicate.
    pub flag: Vec<NodeId>,
    /// The holder left alone on the previous value, whose duplicate error must go.
    pub clear: Vec<NodeId>,
}

/// Plans the index update for `node` moving from `previous` to `next`.
///
/// Only the holders of the previous and the new value are examined. When the new
/// value ends up with three or more holders the others are already flagged, so only
/// the transition to exactly two holders flags anyone.
pub fn plan_link_id_change(
    tracker: &LinkIdTracker,
    node: NodeId,
    previous: Option<&str>,
    next: &str,
    outcome: LinkIdOutcome,
) -> LinkIdPlan {
    let mut tracker = tracker.clone();
    let previous = tracker
        .link_id_of(node)
        .map(str::to_string)
        .or_else(|| previous.map(str::to_string));

    let mut flag = Vec::new();
    match outcome {
        LinkIdOutcome::Valid | LinkIdOutcome::Duplicate => {
            tracker.insert(next, node);
            if let [a, b] = tracker.node_ids(next) {
                flag.extend([*a, *b].into_iter().filter(|&id| id != node));
            }
        }
        LinkIdOutcome::Invalid => {
            tracker.remove_node(node);
        }
    }

    let mut clear = Vec::new();
    if let Some(prev) = previous.as_deref()
        && let [sole] = tracker.node_ids(prev)
        && *sole != node
    {
        clear.push(*sole);
    }

    LinkIdPlan {
        tracker,
        previous,
        flag,
        clear,
    }
}
