//! Multi-container content flow.
//!
//! A [`RegionChain`] takes content that lives in one container and spreads
//! it over an ordered sequence of fixed-size containers, like text running
//! from column to column. Each region ends up showing exactly what fits; the
//! rest continues in the next region, with the enclosing elements duplicated
//! so every region's tree stays well-formed.
//!
//! The engine never lays anything out. It asks a [`GeometryProbe`] where
//! boxes ended up after each edit and reacts to the answer. Container
//! lifecycle is left to the host: the chain reports [`RegionIntent`]s when
//! it needs another region or stops using one.
//!
//! ```ignore
//! let mut chain = RegionChain::new(&tree, first)?;
//! chain.flow_to(&mut tree, &probe, second)?;
//! for intent in chain.split(&mut tree, &probe)? {
//!     // create or drop containers, then call flow_to/remove_region
//! }
//! // later, from the host's event loop
//! chain.tick(&mut tree, &probe, Instant::now())?;
//! ```

pub mod chain;
pub mod options;
pub mod rebuild;
pub mod splitter;
pub mod watcher;
pub mod word;

pub use chain::{FlowState, FlowTo, PendingOverflow, RegionChain, RegionIntent};
pub use options::{FlowOptions, WatchOptions};
pub use rebuild::merge_back;
pub use splitter::{apply_split, Splitter};
pub use watcher::{
    ChangeReason, ChangeSource, ChangeWatcher, GeometryPoller, MutationSource, WatchContext,
};
pub use word::{word_spans, WordLocator};

pub use regionflow_core::{
    BreakOffset, ContentTree, FlowError, GeometryProbe, MutationKind, NodeId, NodePath, Size,
    SplitPoint, TreeError,
};
