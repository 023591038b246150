//! The ordered chain of regions sharing one content stream.

use std::time::Instant;

use indexmap::IndexSet;
use log::{debug, info, warn};
use regionflow_core::{ContentTree, FlowError, GeometryProbe, NodeId, SplitPoint};

use crate::options::FlowOptions;
use crate::rebuild::merge_back;
use crate::splitter::{apply_split, Splitter};
use crate::watcher::{ChangeReason, ChangeWatcher};

/// A lifecycle request for the host.
///
/// The chain never creates or destroys containers itself; it reports what
/// it needs and leaves the decision to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionIntent {
    /// Content still overflows the last region; supply another one.
    RequestNewRegion,
    /// This region no longer receives content.
    RequestRemoveRegion(NodeId),
}

/// Where the chain stands in its split/rebuild cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// All content sits in the first region.
    Unsplit,
    /// Content is distributed and fits the chain.
    Split,
    /// Content is distributed but overflows the last region.
    AwaitingRegion,
}

/// Result of adding a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowTo {
    /// The region was already a member; nothing changed.
    AlreadyPresent,
    /// The region was appended; intents raised by the resplit, if any.
    Appended(Vec<RegionIntent>),
}

impl FlowTo {
    pub fn is_appended(&self) -> bool {
        matches!(self, FlowTo::Appended(_))
    }

    pub fn intents(&self) -> &[RegionIntent] {
        match self {
            FlowTo::AlreadyPresent => &[],
            FlowTo::Appended(intents) => intents,
        }
    }
}

/// A break found in the last region with no region after it yet.
///
/// The content stays where it is; supplying a region moves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOverflow {
    pub region: NodeId,
    pub split: SplitPoint,
}

/// An ordered sequence of regions displaying one content tree.
///
/// The first region owns the content. Splitting distributes it across the
/// chain so each region shows only what fits; rebuilding merges it back.
/// Between operations `split_points()[i]` records where region `i` ended,
/// which is all rebuilding needs.
#[derive(Debug)]
pub struct RegionChain {
    regions: IndexSet<NodeId>,
    breaks: Vec<Option<SplitPoint>>,
    pending: Option<PendingOverflow>,
    state: FlowState,
    options: FlowOptions,
    watcher: ChangeWatcher,
}

impl RegionChain {
    /// Create a chain whose content lives in `region`.
    pub fn new(tree: &ContentTree, region: NodeId) -> Result<Self, FlowError> {
        Self::with_options(tree, region, FlowOptions::default())
    }

    pub fn with_options(
        tree: &ContentTree,
        region: NodeId,
        options: FlowOptions,
    ) -> Result<Self, FlowError> {
        if !tree.is_element(region) {
            return Err(FlowError::InsufficientRegions);
        }
        let watcher = ChangeWatcher::from_options(&options.watch);
        let mut regions = IndexSet::new();
        regions.insert(region);
        debug!("created chain with content region {region}");
        Ok(Self {
            regions,
            breaks: Vec::new(),
            pending: None,
            state: FlowState::Unsplit,
            options,
            watcher,
        })
    }

    /// Create a chain from an ordered list of regions without splitting.
    ///
    /// The first region holds the content; the rest must be empty.
    pub fn from_regions(
        tree: &ContentTree,
        regions: impl IntoIterator<Item = NodeId>,
        options: FlowOptions,
    ) -> Result<Self, FlowError> {
        let mut regions = regions.into_iter();
        let first = regions.next().ok_or(FlowError::InsufficientRegions)?;
        let mut chain = Self::with_options(tree, first, options)?;
        for region in regions {
            if !chain.regions.contains(&region) {
                chain.append(tree, region)?;
            }
        }
        Ok(chain)
    }

    /// Replace the change watcher, e.g. with custom sources.
    pub fn with_watcher(mut self, watcher: ChangeWatcher) -> Self {
        self.watcher = watcher;
        self
    }

    /// Add a region to the end of the chain.
    ///
    /// When the chain is split, splitting resumes from the previous last
    /// region, which moves any pending overflow into the new one.
    pub fn flow_to(
        &mut self,
        tree: &mut ContentTree,
        probe: &dyn GeometryProbe,
        region: NodeId,
    ) -> Result<FlowTo, FlowError> {
        if self.regions.contains(&region) {
            return Ok(FlowTo::AlreadyPresent);
        }
        let previous_last = self.regions.len() - 1;
        self.append(tree, region)?;
        if self.state == FlowState::Unsplit {
            return Ok(FlowTo::Appended(Vec::new()));
        }
        let intents =
            self.suspended(tree, |chain, tree| chain.split_from(tree, probe, previous_last))?;
        Ok(FlowTo::Appended(intents))
    }

    /// Add several regions in order, collecting every raised intent.
    pub fn flow_to_all(
        &mut self,
        tree: &mut ContentTree,
        probe: &dyn GeometryProbe,
        regions: impl IntoIterator<Item = NodeId>,
    ) -> Result<Vec<RegionIntent>, FlowError> {
        let mut intents = Vec::new();
        for region in regions {
            if let FlowTo::Appended(raised) = self.flow_to(tree, probe, region)? {
                intents.extend(raised);
            }
        }
        Ok(intents)
    }

    /// Remove a region and redistribute the content across the rest.
    ///
    /// Removing the only region fails with [`FlowError::InsufficientRegions`]
    /// and leaves the chain as it was. Removing the first region hands its
    /// content to the next one.
    pub fn remove_region(
        &mut self,
        tree: &mut ContentTree,
        probe: &dyn GeometryProbe,
        region: NodeId,
    ) -> Result<Vec<RegionIntent>, FlowError> {
        if !tree.is_element(region) {
            return Err(FlowError::InvalidRegion {
                node: region,
                reason: "not an element".to_string(),
            });
        }
        let Some(index) = self.regions.get_index_of(&region) else {
            debug!("region {region} is not part of the chain, nothing to remove");
            return Ok(Vec::new());
        };
        if self.regions.len() == 1 {
            return Err(FlowError::InsufficientRegions);
        }

        self.state = FlowState::Split;
        self.suspended(tree, |chain, tree| {
            chain.rebuild_all(tree)?;
            if index == 0 {
                if let Some(&successor) = chain.regions.get_index(1) {
                    tree.move_children(region, successor)?;
                }
            }
            chain.regions.shift_remove_index(index);
            chain.breaks.pop();
            info!("removed region {region}, {} left", chain.regions.len());
            chain.split_from(tree, probe, 0)
        })
    }

    /// Recompute the distribution of content from scratch.
    pub fn split(
        &mut self,
        tree: &mut ContentTree,
        probe: &dyn GeometryProbe,
    ) -> Result<Vec<RegionIntent>, FlowError> {
        self.state = FlowState::Split;
        self.suspended(tree, |chain, tree| {
            chain.rebuild_all(tree)?;
            chain.split_from(tree, probe, 0)
        })
    }

    /// Merge all content back into the first region and stop watching.
    pub fn rebuild(&mut self, tree: &mut ContentTree) -> Result<(), FlowError> {
        self.state = FlowState::Unsplit;
        self.suspended(tree, |chain, tree| chain.rebuild_all(tree))
    }

    /// React to changes observed since the last tick.
    ///
    /// Does nothing until the chain has been split once.
    pub fn tick(
        &mut self,
        tree: &mut ContentTree,
        probe: &dyn GeometryProbe,
        now: Instant,
    ) -> Result<Option<(ChangeReason, Vec<RegionIntent>)>, FlowError> {
        if self.state == FlowState::Unsplit {
            return Ok(None);
        }
        let regions: Vec<NodeId> = self.regions.iter().copied().collect();
        let Some(reason) = self.watcher.poll(tree, probe, &regions, now) else {
            return Ok(None);
        };
        info!("{reason}, resplitting");
        let intents = self.split(tree, probe)?;
        Ok(Some((reason, intents)))
    }

    /// Index of the region whose subtree contains `node`.
    pub fn region_index(&self, tree: &ContentTree, node: NodeId) -> Option<usize> {
        tree.ancestors(node)
            .find_map(|ancestor| self.regions.get_index_of(&ancestor))
    }

    /// Regions in flow order.
    pub fn regions(&self) -> &IndexSet<NodeId> {
        &self.regions
    }

    pub fn region(&self, index: usize) -> Option<NodeId> {
        self.regions.get_index(index).copied()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Always false: a chain holds at least one region.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Where each region's content ended, one slot per adjacent pair.
    pub fn split_points(&self) -> &[Option<SplitPoint>] {
        &self.breaks
    }

    pub fn pending_overflow(&self) -> Option<&PendingOverflow> {
        self.pending.as_ref()
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn options(&self) -> &FlowOptions {
        &self.options
    }

    pub fn watcher(&self) -> &ChangeWatcher {
        &self.watcher
    }

    fn append(&mut self, tree: &ContentTree, region: NodeId) -> Result<(), FlowError> {
        self.validate(tree, region)?;
        self.regions.insert(region);
        self.breaks.push(None);
        debug!(
            "appended region {region} at position {}",
            self.regions.len() - 1
        );
        Ok(())
    }

    fn validate(&self, tree: &ContentTree, region: NodeId) -> Result<(), FlowError> {
        let invalid = |reason: String| FlowError::InvalidRegion {
            node: region,
            reason,
        };
        if !tree.contains(region) {
            return Err(invalid("unknown node".to_string()));
        }
        if !tree.is_element(region) {
            return Err(invalid("text nodes cannot display content".to_string()));
        }
        if let Some(index) = self.region_index(tree, region) {
            return Err(invalid(format!("nested inside region {index}")));
        }
        if let Some(inner) = self
            .regions
            .iter()
            .find(|&&member| tree.is_inclusive_ancestor(region, member))
        {
            return Err(invalid(format!("contains region {inner}")));
        }
        if !tree.children(region).is_empty() {
            return Err(invalid("already has content".to_string()));
        }
        Ok(())
    }

    /// Run a chain edit with the watcher detached, reattaching it after.
    fn suspended<R>(
        &mut self,
        tree: &mut ContentTree,
        edit: impl FnOnce(&mut Self, &mut ContentTree) -> Result<R, FlowError>,
    ) -> Result<R, FlowError> {
        self.watcher.disconnect(tree);
        let result = edit(self, tree);
        if self.state != FlowState::Unsplit {
            let regions: Vec<NodeId> = self.regions.iter().copied().collect();
            self.watcher.connect(tree, &regions);
        }
        result
    }

    /// Merge every region back into the first, last pair first.
    fn rebuild_all(&mut self, tree: &mut ContentTree) -> Result<(), FlowError> {
        for index in (1..self.regions.len()).rev() {
            let (Some(&upstream), Some(&downstream)) = (
                self.regions.get_index(index - 1),
                self.regions.get_index(index),
            ) else {
                continue;
            };
            match self.breaks[index - 1].take() {
                Some(split) => merge_back(tree, upstream, downstream, &split)?,
                None if !tree.children(downstream).is_empty() => {
                    warn!("region {downstream} gained content outside the flow, folding it back");
                    tree.move_children(downstream, upstream)?;
                }
                None => {}
            }
        }
        self.pending = None;
        Ok(())
    }

    /// Split region by region starting at `start`.
    fn split_from(
        &mut self,
        tree: &mut ContentTree,
        probe: &dyn GeometryProbe,
        start: usize,
    ) -> Result<Vec<RegionIntent>, FlowError> {
        let splitter = Splitter::new(probe, &self.options);
        let mut intents = Vec::new();
        let mut index = start;
        self.pending = None;

        while let Some(&current) = self.regions.get_index(index) {
            let next = self.regions.get_index(index + 1).copied();
            let found = splitter.find_break(tree, current)?;
            match (found, next) {
                (Some(split), Some(next)) => {
                    apply_split(tree, current, next, &split)?;
                    self.breaks[index] = Some(split);
                    index += 1;
                }
                (Some(split), None) => {
                    debug!("region {current} overflows at {split}, requesting a new region");
                    self.pending = Some(PendingOverflow {
                        region: current,
                        split,
                    });
                    intents.push(RegionIntent::RequestNewRegion);
                    break;
                }
                (None, Some(next)) => {
                    self.breaks[index] = None;
                    debug!("content ends in region {current}, region {next} is unused");
                    intents.push(RegionIntent::RequestRemoveRegion(next));
                    break;
                }
                (None, None) => break,
            }
        }

        self.state = if self.pending.is_some() {
            FlowState::AwaitingRegion
        } else {
            FlowState::Split
        };
        Ok(intents)
    }
}
