//! Change detection for a split chain.
//!
//! Once a chain has split its content, two kinds of change make the split
//! stale: edits to the content inside the regions, and regions changing size.
//! Each is detected by a [`ChangeSource`]; the [`ChangeWatcher`] polls them
//! all and reports the first reason it finds.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use log::trace;
use regionflow_core::{ContentTree, GeometryProbe, MutationKind, NodeId, ObserverId, Size};

use crate::options::WatchOptions;

/// Why a resplit was triggered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChangeReason {
    /// Content inside a region was edited
    ContentMutated { kind: MutationKind, target: NodeId },
    /// A region's rendered size differs from the last poll
    GeometryChanged {
        region: NodeId,
        previous: Size,
        current: Size,
    },
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeReason::ContentMutated { kind, target } => {
                write!(f, "{kind:?} mutation at {target}")
            }
            ChangeReason::GeometryChanged {
                region,
                previous,
                current,
            } => write!(
                f,
                "region {region} resized from {}x{} to {}x{}",
                previous.width, previous.height, current.width, current.height
            ),
        }
    }
}

/// Everything a source may look at while polling.
pub struct WatchContext<'a> {
    pub tree: &'a mut ContentTree,
    pub probe: &'a dyn GeometryProbe,
    pub regions: &'a [NodeId],
    pub now: Instant,
}

/// A detector of changes that invalidate a split.
///
/// Sources are disconnected while the chain edits its own regions, so the
/// chain's edits are never reported back to it.
pub trait ChangeSource: fmt::Debug {
    /// Start watching the given regions.
    fn connect(&mut self, tree: &mut ContentTree, regions: &[NodeId]);

    /// Stop watching, discarding anything not yet reported.
    fn disconnect(&mut self, tree: &mut ContentTree);

    /// Report a change since the last poll, if any.
    fn poll(&mut self, ctx: &mut WatchContext<'_>) -> Option<ChangeReason>;
}

/// Watches region subtrees for content edits.
#[derive(Debug, Default)]
pub struct MutationSource {
    observers: Vec<ObserverId>,
    react_to_child_list: bool,
    react_to_attributes: bool,
}

impl MutationSource {
    pub fn new(options: &WatchOptions) -> Self {
        Self {
            observers: Vec::new(),
            react_to_child_list: options.react_to_child_list,
            react_to_attributes: options.react_to_attributes,
        }
    }

    fn accepts(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::CharacterData => true,
            MutationKind::ChildList => self.react_to_child_list,
            MutationKind::Attributes => self.react_to_attributes,
        }
    }
}

impl ChangeSource for MutationSource {
    fn connect(&mut self, tree: &mut ContentTree, regions: &[NodeId]) {
        self.disconnect(tree);
        self.observers = regions.iter().map(|&region| tree.observe(region)).collect();
    }

    fn disconnect(&mut self, tree: &mut ContentTree) {
        for observer in self.observers.drain(..) {
            tree.unobserve(observer);
        }
    }

    fn poll(&mut self, ctx: &mut WatchContext<'_>) -> Option<ChangeReason> {
        let mut reason = None;
        for &observer in &self.observers {
            for record in ctx.tree.take_records(observer) {
                if !self.accepts(record.kind) {
                    trace!("ignoring {:?} mutation at {}", record.kind, record.target);
                    continue;
                }
                reason.get_or_insert(ChangeReason::ContentMutated {
                    kind: record.kind,
                    target: record.target,
                });
            }
        }
        reason
    }
}

/// Polls region sizes on a fixed interval.
///
/// The first measurement of a region only records its size.
#[derive(Debug)]
pub struct GeometryPoller {
    interval: Duration,
    next_due: Option<Instant>,
    observed: HashMap<NodeId, Size>,
    active: bool,
}

impl GeometryPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
            observed: HashMap::new(),
            active: false,
        }
    }

    /// Last size recorded for a region.
    pub fn observed(&self, region: NodeId) -> Option<Size> {
        self.observed.get(&region).copied()
    }
}

impl ChangeSource for GeometryPoller {
    fn connect(&mut self, _tree: &mut ContentTree, regions: &[NodeId]) {
        self.observed.retain(|region, _| regions.contains(region));
        self.active = true;
    }

    fn disconnect(&mut self, _tree: &mut ContentTree) {
        self.active = false;
    }

    fn poll(&mut self, ctx: &mut WatchContext<'_>) -> Option<ChangeReason> {
        if !self.active {
            return None;
        }
        if self.next_due.is_some_and(|due| ctx.now < due) {
            return None;
        }

        let mut change = None;
        for &region in ctx.regions {
            let current = ctx.probe.size(ctx.tree, region);
            match self.observed.insert(region, current) {
                Some(previous) if previous != current => {
                    change.get_or_insert(ChangeReason::GeometryChanged {
                        region,
                        previous,
                        current,
                    });
                }
                _ => {}
            }
        }
        self.next_due = Some(ctx.now + self.interval);
        change
    }
}

/// The set of change sources attached to a chain.
#[derive(Debug, Default)]
pub struct ChangeWatcher {
    sources: Vec<Box<dyn ChangeSource>>,
    connected: bool,
}

impl ChangeWatcher {
    /// A watcher with no sources; it never reports anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the sources enabled in `options`.
    pub fn from_options(options: &WatchOptions) -> Self {
        let mut watcher = Self::new();
        if options.observe_mutations {
            watcher = watcher.with_source(MutationSource::new(options));
        }
        if options.poll_geometry {
            watcher = watcher.with_source(GeometryPoller::new(options.poll_interval()));
        }
        watcher
    }

    pub fn with_source(mut self, source: impl ChangeSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn connect(&mut self, tree: &mut ContentTree, regions: &[NodeId]) {
        for source in &mut self.sources {
            source.connect(tree, regions);
        }
        self.connected = true;
    }

    pub fn disconnect(&mut self, tree: &mut ContentTree) {
        if !self.connected {
            return;
        }
        for source in &mut self.sources {
            source.disconnect(tree);
        }
        self.connected = false;
    }

    /// Poll every source and return the first reported change.
    ///
    /// All sources are polled even after one reports, so each consumes its
    /// pending observations.
    pub fn poll(
        &mut self,
        tree: &mut ContentTree,
        probe: &dyn GeometryProbe,
        regions: &[NodeId],
        now: Instant,
    ) -> Option<ChangeReason> {
        if !self.connected {
            return None;
        }
        let mut ctx = WatchContext {
            tree,
            probe,
            regions,
            now,
        };
        let mut reason = None;
        for source in &mut self.sources {
            if let Some(found) = source.poll(&mut ctx) {
                reason.get_or_insert(found);
            }
        }
        reason
    }
}
