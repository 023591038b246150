//! Content tree data structures.
//!
//! The content tree holds everything regions display: element nodes with an
//! ordered list of children, and text nodes with a string value. Region
//! containers are ordinary elements of the same tree. Every structural or
//! textual edit is reported to the observers watching an enclosing subtree.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::errors::TreeError;
use crate::types::{MutationKind, MutationRecord, NodeId, ObserverId};

/// Payload of a content node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

/// Element tag and inline style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    /// Inline style declarations in insertion order
    pub style: IndexMap<String, String>,
}

/// A node in the content tree.
#[derive(Debug, Clone)]
pub struct ContentNode {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl ContentNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

#[derive(Debug, Clone)]
struct Observation {
    root: NodeId,
    records: Vec<MutationRecord>,
}

/// Arena of content nodes.
///
/// Nodes without a parent are roots; a tree may hold any number of them
/// (detached regions, clones not yet inserted, and so on).
#[derive(Debug, Clone)]
pub struct ContentTree {
    nodes: HashMap<NodeId, ContentNode>,
    next_id: u64,
    next_observer: u64,
    observations: HashMap<ObserverId, Observation>,
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 0,
            next_observer: 0,
            observations: HashMap::new(),
        }
    }

    fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            ContentNode {
                id,
                parent: None,
                children: Vec::new(),
                kind,
            },
        );
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.allocate(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            style: IndexMap::new(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, value: impl Into<String>) -> NodeId {
        self.allocate(NodeKind::Text(value.into()))
    }

    /// Create an element and append the given children to it.
    pub fn build_element(
        &mut self,
        tag: &str,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, TreeError> {
        let id = self.create_element(tag);
        for child in children {
            self.append_child(id, child)?;
        }
        Ok(id)
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&ContentNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn node(&self, id: NodeId) -> Result<&ContentNode, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::UnknownNode { node: id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut ContentNode, TreeError> {
        self.nodes
            .get_mut(&id)
            .ok_or(TreeError::UnknownNode { node: id })
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Children of a node; empty for text nodes and unknown IDs.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Position of a node among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(&id).map(|n| &n.kind),
            Some(NodeKind::Element(_))
        )
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(&id).map(|n| &n.kind), Some(NodeKind::Text(_)))
    }

    /// Tag of an element, `None` for text nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Element(data)) => Some(data.tag.as_str()),
            _ => None,
        }
    }

    /// Value of a text node, `None` for elements.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Inline style declaration of an element.
    pub fn style(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.nodes.get(&id).map(|n| &n.kind) {
            Some(NodeKind::Element(data)) => data.style.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Set or clear an inline style declaration, returning the previous value.
    pub fn set_style(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<Option<String>, TreeError> {
        let previous = match &mut self.node_mut(id)?.kind {
            NodeKind::Element(data) => match value {
                Some(value) => data.style.insert(name.to_string(), value.to_string()),
                None => data.style.shift_remove(name),
            },
            NodeKind::Text(_) => return Err(TreeError::NotAnElement { node: id }),
        };
        self.notify(id, MutationKind::Attributes);
        Ok(previous)
    }

    /// Replace the value of a text node.
    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text(current) => *current = value.into(),
            NodeKind::Element(_) => return Err(TreeError::NotText { node: id }),
        }
        self.notify(id, MutationKind::CharacterData);
        Ok(())
    }

    /// Iterate from a node up to its root, the node itself included.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.contains(id).then_some(id),
        }
    }

    /// Topmost ancestor of a node.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Concatenated value of every text node in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(value) => out.push_str(value),
            NodeKind::Element(_) => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.is_element(parent) {
            self.node(parent)?;
            return Err(TreeError::NotAnElement { node: parent });
        }
        self.node(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }
        Ok(())
    }

    /// Append a node as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Insert a node at `index` among the children of `parent`.
    ///
    /// `index` counts the children other than `child` itself. On error the
    /// tree is left untouched.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        let already_here = self.parent(child) == Some(parent);
        let slots = self.children(parent).len() - usize::from(already_here);
        if index > slots {
            return Err(TreeError::ChildOutOfRange {
                node: parent,
                index,
            });
        }
        self.detach(child)?;
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.notify(parent, MutationKind::ChildList);
        Ok(())
    }

    /// Insert `node` directly after `reference` under the same parent.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<(), TreeError> {
        let parent = self
            .parent(reference)
            .ok_or(TreeError::Detached { node: reference })?;
        self.detach(node)?;
        let index = self
            .index_in_parent(reference)
            .ok_or(TreeError::Detached { node: reference })?;
        self.insert_child(parent, index + 1, node)
    }

    /// Remove a node from its parent, keeping it alive as a root.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|&c| c != id);
        self.node_mut(id)?.parent = None;
        self.notify(parent, MutationKind::ChildList);
        Ok(())
    }

    /// Detach a node and drop it together with its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
        self.observations.retain(|_, o| o.root != id);
        Ok(())
    }

    /// Move every child of `from` to the end of `to`, preserving order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<(), TreeError> {
        for child in self.children(from).to_vec() {
            self.append_child(to, child)?;
        }
        Ok(())
    }

    /// Copy a subtree; the copy is a detached root.
    pub fn deep_clone(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        let node = self.node(id)?;
        let kind = node.kind.clone();
        let children = node.children.clone();
        let copy = self.allocate(kind);
        for child in children {
            let child_copy = self.deep_clone(child)?;
            self.node_mut(child_copy)?.parent = Some(copy);
            self.node_mut(copy)?.children.push(child_copy);
        }
        Ok(copy)
    }

    /// Split a text node at a byte offset.
    ///
    /// The node keeps `[0, offset)`; a new text node holding `[offset, end)`
    /// is inserted right after it when the node has a parent, and returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, TreeError> {
        self.node(id)?;
        let value = self.text(id).ok_or(TreeError::NotText { node: id })?;
        if !value.is_char_boundary(offset) {
            return Err(TreeError::InvalidOffset { node: id, offset });
        }
        let head = value[..offset].to_string();
        let tail = value[offset..].to_string();
        self.set_text(id, head)?;
        let rest = self.create_text(tail);
        if self.parent(id).is_some() {
            self.insert_after(id, rest)?;
        }
        Ok(rest)
    }

    /// Start recording mutations inside the subtree rooted at `root`.
    pub fn observe(&mut self, root: NodeId) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observations.insert(
            id,
            Observation {
                root,
                records: Vec::new(),
            },
        );
        id
    }

    /// Stop an observation, dropping undelivered records.
    pub fn unobserve(&mut self, id: ObserverId) {
        self.observations.remove(&id);
    }

    /// Drain the records collected for an observation since the last call.
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observations
            .get_mut(&id)
            .map(|o| std::mem::take(&mut o.records))
            .unwrap_or_default()
    }

    fn notify(&mut self, target: NodeId, kind: MutationKind) {
        if self.observations.is_empty() {
            return;
        }
        let path: Vec<NodeId> = self.ancestors(target).collect();
        for observation in self.observations.values_mut() {
            if path.contains(&observation.root) {
                observation.records.push(MutationRecord { kind, target });
            }
        }
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    tree: &'a ContentTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
