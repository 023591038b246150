//! Error types for the regionflow engine.

use crate::types::NodeId;
use thiserror::Error;

/// Top-level error type for region chain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("At least one region is required")]
    InsufficientRegions,

    #[error("{node} is not a valid region container: {reason}")]
    InvalidRegion { node: NodeId, reason: String },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors raised by content tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Unknown node {node}")]
    UnknownNode { node: NodeId },

    #[error("Node {node} is not an element")]
    NotAnElement { node: NodeId },

    #[error("Node {node} is not a text node")]
    NotText { node: NodeId },

    #[error("Node {node} has no parent")]
    Detached { node: NodeId },

    #[error("Child index {index} out of range for node {node}")]
    ChildOutOfRange { node: NodeId, index: usize },

    #[error("Inserting {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("Offset {offset} is not a character boundary in node {node}")]
    InvalidOffset { node: NodeId, offset: usize },
}
