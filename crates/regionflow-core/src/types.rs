//! Core value types shared across the engine.

use std::fmt;

use smallvec::SmallVec;

/// Identity of a node in a [`ContentTree`](crate::tree::ContentTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Child indices leading from a region root down to a node.
pub type NodePath = SmallVec<[usize; 8]>;

/// Where the addressed node divides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BreakOffset {
    /// Byte offset into a text node's value, on a character boundary.
    /// Everything from here on moves downstream.
    Text(usize),
    /// The addressed element moves downstream entirely.
    WholeNode,
}

/// The address inside a region's content tree where content must be divided.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SplitPoint {
    /// Child indices from the region root
    pub path: NodePath,
    /// Division inside the addressed node
    pub offset: BreakOffset,
}

impl SplitPoint {
    /// A break inside a text node.
    pub fn text(path: impl IntoIterator<Item = usize>, offset: usize) -> Self {
        Self {
            path: path.into_iter().collect(),
            offset: BreakOffset::Text(offset),
        }
    }

    /// A break that moves a whole element.
    pub fn whole(path: impl IntoIterator<Item = usize>) -> Self {
        Self {
            path: path.into_iter().collect(),
            offset: BreakOffset::WholeNode,
        }
    }

    /// Whether the addressed node moves as a unit.
    pub fn is_element_level(&self) -> bool {
        matches!(self.offset, BreakOffset::WholeNode)
    }

    /// Number of levels below the region root.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

impl fmt::Display for SplitPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        match self.offset {
            BreakOffset::Text(offset) => write!(f, "[{}]@{}", path.join("/"), offset),
            BreakOffset::WholeNode => write!(f, "[{}]@whole", path.join("/")),
        }
    }
}

/// Rendered width and height of a box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Kind of change reported to a tree observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MutationKind {
    /// A text node's value changed
    CharacterData,
    /// Children were inserted or removed
    ChildList,
    /// An element's inline style changed
    Attributes,
}

/// A single change observed inside a watched subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    /// The text node, the parent whose children changed, or the styled element
    pub target: NodeId,
}

/// Handle for a subtree observation registered on a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);
