//! Core types for the regionflow engine.
//!
//! This crate provides the foundational pieces shared by the layout host and
//! the flow engine:
//! - The content tree that regions display and the chain restructures
//! - Split points addressing a break inside a region's content
//! - The geometry contract a rendering host implements
//! - Error types

pub mod errors;
pub mod probe;
pub mod tree;
pub mod types;

pub use errors::*;
pub use probe::*;
pub use tree::*;
pub use types::*;
