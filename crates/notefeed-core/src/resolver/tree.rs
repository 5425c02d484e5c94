//! Arena-backed resolution tree
//!
//! Nodes live in one `Vec` and point at each other by [`NodeId`]. A cycle in
//! the reference graph just produces more nodes at higher depths; the depth
//! bound applied in [`ResolutionTree::push`] is what ends it.

use chrono::DateTime;
use notefeed_extract::{extract, strip_references};
use notefeed_model::{ContentItem, MediaAttachment, Reference};
use serde::Serialize;
use std::fmt;

/// Index of a node in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the arena
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolution state of one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeStatus {
    /// Lookup in progress
    Loading,
    /// Target found
    Resolved(ContentItem),
    /// Lookup settled without a target, or failed
    Missing,
    /// At or past the depth bound; never looked up
    Disabled,
}

impl NodeStatus {
    /// Whether the node will not change again
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Resolved(_) => "resolved",
            Self::Missing => "missing",
            Self::Disabled => "disabled",
        }
    }
}

/// One reference encountered during a resolve pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub reference: Reference,
    /// Root item is depth 0; its references are depth 1
    pub depth: usize,
    pub status: NodeStatus,
    pub children: Vec<NodeId>,
}

/// Reference tree for one root item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTree {
    root_id: String,
    max_depth: usize,
    nodes: Vec<ResolutionNode>,
    top: Vec<NodeId>,
    abandoned: bool,
}

impl ResolutionTree {
    /// Empty tree for `root_id`
    #[must_use]
    pub fn new(root_id: impl Into<String>, max_depth: usize) -> Self {
        Self {
            root_id: root_id.into(),
            max_depth,
            nodes: Vec::new(),
            top: Vec::new(),
            abandoned: false,
        }
    }

    /// Add a node under `parent` (or at top level)
    ///
    /// The initial status is `Disabled` at or past the depth bound, `Missing`
    /// when the reference has no decodable target, and `Loading` otherwise.
    pub fn push(&mut self, parent: Option<NodeId>, reference: Reference, depth: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        let status = if depth >= self.max_depth {
            NodeStatus::Disabled
        } else if !reference.is_resolvable() {
            NodeStatus::Missing
        } else {
            NodeStatus::Loading
        };

        self.nodes.push(ResolutionNode {
            id,
            parent,
            reference,
            depth,
            status,
            children: Vec::new(),
        });

        match parent.and_then(|p| self.nodes.get_mut(p.0)) {
            Some(parent) => parent.children.push(id),
            None => self.top.push(id),
        }
        id
    }

    /// Move a `Loading` node to `Resolved` or `Missing`
    ///
    /// Returns false, leaving the node unchanged, if it is not `Loading` or
    /// `status` is neither of those. `Disabled` is only assigned by
    /// [`ResolutionTree::push`].
    pub fn settle(&mut self, id: NodeId, status: NodeStatus) -> bool {
        let settles = matches!(status, NodeStatus::Resolved(_) | NodeStatus::Missing);
        match self.nodes.get_mut(id.0) {
            Some(node) if settles && node.status == NodeStatus::Loading => {
                node.status = status;
                true
            }
            _ => false,
        }
    }

    /// Mark the pass as abandoned; nodes still loading stay that way
    pub fn abandon(&mut self) {
        self.abandoned = true;
    }

    #[inline]
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    #[inline]
    #[must_use]
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    #[inline]
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&ResolutionNode> {
        self.nodes.get(id.0)
    }

    /// Nodes for the root item's own references
    pub fn top_level(&self) -> impl Iterator<Item = &ResolutionNode> {
        self.top.iter().filter_map(move |id| self.get(*id))
    }

    /// Child nodes of `id`
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &ResolutionNode> {
        self.get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |child| self.get(*child))
    }

    /// All nodes in creation order
    pub fn iter(&self) -> impl Iterator<Item = &ResolutionNode> {
        self.nodes.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes whose status satisfies `pred`
    pub fn count(&self, pred: impl Fn(&NodeStatus) -> bool) -> usize {
        self.nodes.iter().filter(|node| pred(&node.status)).count()
    }

    /// Deepest node depth, 0 for an empty tree
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    /// Owned, nested rendering of the tree
    #[must_use]
    pub fn to_preview(&self) -> Vec<PreviewNode> {
        self.top.iter().filter_map(|id| self.preview_node(*id)).collect()
    }

    fn preview_node(&self, id: NodeId) -> Option<PreviewNode> {
        let node = self.get(id)?;
        let status = match &node.status {
            NodeStatus::Loading => PreviewStatus::Loading,
            NodeStatus::Resolved(item) => {
                let extraction = extract(item);
                PreviewStatus::Resolved {
                    id: item.id.clone(),
                    author: item.author.clone(),
                    date_label: date_label(item.created_at),
                    body: strip_references(&item.body, &extraction.references),
                    media: extraction.media,
                }
            }
            NodeStatus::Missing => PreviewStatus::Missing {
                label: node.reference.fallback_label(),
                href: node.reference.href(),
            },
            NodeStatus::Disabled => PreviewStatus::Disabled {
                label: node.reference.fallback_label(),
                href: node.reference.href(),
            },
        };

        Some(PreviewNode {
            pointer: node.reference.pointer.clone(),
            depth: node.depth,
            status,
            children: node
                .children
                .iter()
                .filter_map(|child| self.preview_node(*child))
                .collect(),
        })
    }
}

/// Display-ready node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewNode {
    pub pointer: String,
    pub depth: usize,
    pub status: PreviewStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PreviewNode>,
}

/// Display-ready status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PreviewStatus {
    Loading,
    Resolved {
        id: String,
        author: String,
        date_label: String,
        /// Body with reference tokens removed
        body: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        media: Vec<MediaAttachment>,
    },
    Missing {
        label: String,
        href: String,
    },
    Disabled {
        label: String,
        href: String,
    },
}

/// Short date label, e.g. `Mar 4`; empty for an out-of-range timestamp
#[must_use]
pub fn date_label(created_at: i64) -> String {
    DateTime::from_timestamp(created_at, 0)
        .map(|at| at.format("%b %-d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference(n: u8) -> Reference {
        Reference::note(format!("note1{n:0>30}"), format!("{n:0>64}"))
    }

    #[test]
    fn push_applies_depth_bound() {
        let mut tree = ResolutionTree::new("root", 2);
        let a = tree.push(None, reference(1), 1);
        let b = tree.push(Some(a), reference(2), 2);

        assert_eq!(tree.get(a).unwrap().status, NodeStatus::Loading);
        assert_eq!(tree.get(b).unwrap().status, NodeStatus::Disabled);
        assert_eq!(tree.children(a).map(|n| n.id).collect::<Vec<_>>(), vec![b]);
        assert_eq!(tree.top_level().count(), 1);
    }

    #[test]
    fn unresolvable_reference_starts_missing() {
        let mut tree = ResolutionTree::new("root", 2);
        let mut broken = reference(1);
        broken.target_id = None;
        let id = tree.push(None, broken, 1);
        assert_eq!(tree.get(id).unwrap().status, NodeStatus::Missing);
    }

    #[test]
    fn settle_only_from_loading() {
        let mut tree = ResolutionTree::new("root", 2);
        let a = tree.push(None, reference(1), 1);
        let disabled = tree.push(Some(a), reference(2), 2);

        assert!(tree.settle(a, NodeStatus::Missing));
        assert!(!tree.settle(a, NodeStatus::Loading));
        assert!(!tree.settle(disabled, NodeStatus::Missing));
        assert_eq!(tree.count(|s| *s == NodeStatus::Missing), 1);
    }

    #[test]
    fn settle_rejects_disabled() {
        let mut tree = ResolutionTree::new("root", 2);
        let id = tree.push(None, reference(1), 1);

        assert!(!tree.settle(id, NodeStatus::Disabled));
        assert_eq!(tree.get(id).unwrap().status, NodeStatus::Loading);
    }

    #[test]
    fn preview_nests_children_and_labels_fallbacks() {
        let mut tree = ResolutionTree::new("root", 2);
        let a = tree.push(None, reference(1), 1);
        let item = ContentItem::new("f".repeat(64), "e".repeat(64), 0, 1, " quoted ");
        tree.settle(a, NodeStatus::Resolved(item));
        tree.push(Some(a), reference(2), 2);

        let preview = tree.to_preview();
        assert_eq!(preview.len(), 1);
        match &preview[0].status {
            PreviewStatus::Resolved { body, date_label, .. } => {
                assert_eq!(body, "quoted");
                assert_eq!(date_label, "Jan 1");
            }
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(
            preview[0].children[0].status,
            PreviewStatus::Disabled {
                label: reference(2).fallback_label(),
                href: reference(2).href(),
            }
        );
    }

    #[test]
    fn preview_serializes_with_status_tag() {
        let mut tree = ResolutionTree::new("root", 0);
        tree.push(None, reference(1), 1);
        let json = serde_json::to_value(tree.to_preview()).unwrap();
        assert_eq!(json[0]["status"]["status"], "disabled");
    }

    #[test]
    fn date_label_formats_month_and_day() {
        assert_eq!(date_label(1_709_510_400), "Mar 4");
    }
}
