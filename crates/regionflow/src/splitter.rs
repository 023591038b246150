//! Finding and applying the break point of a single region.

use log::{debug, warn};
use regionflow_core::{
    parse_px, with_display, BreakOffset, ContentTree, GeometryProbe, NodeId, NodePath, SplitPoint,
    TreeError,
};

use crate::options::FlowOptions;
use crate::word::{WordLocator, EPSILON};

/// Locates the first piece of a region's content that does not fit.
pub struct Splitter<'a> {
    probe: &'a dyn GeometryProbe,
    options: &'a FlowOptions,
}

impl<'a> Splitter<'a> {
    pub fn new(probe: &'a dyn GeometryProbe, options: &'a FlowOptions) -> Self {
        Self { probe, options }
    }

    /// Height available to content: the region's box minus its bottom padding.
    pub fn budget(&self, tree: &ContentTree, region: NodeId) -> f64 {
        let padding = self
            .probe
            .computed_style(tree, region, "padding-bottom")
            .as_deref()
            .and_then(parse_px)
            .unwrap_or(0.0);
        self.probe.offset_height(tree, region) - padding
    }

    /// Break point of a region, or `None` when all of its content fits.
    ///
    /// When even the first piece of content overflows, the region keeps that
    /// piece (its first line, or the whole atomic element) and breaks right
    /// after it, so every region holds at least something.
    pub fn find_break(
        &self,
        tree: &mut ContentTree,
        region: NodeId,
    ) -> Result<Option<SplitPoint>, TreeError> {
        let budget = self.budget(tree, region);
        let mut path = NodePath::new();
        let found = match self.search(tree, region, region, budget, &mut path)? {
            Some(split) if !has_content_before(tree, region, &split) => {
                let forced = self.break_after_first(tree, region, budget, &split)?;
                match &forced {
                    Some(after) => warn!(
                        "first content of region {region} overflows a {budget}px budget, keeping it and breaking at {after}"
                    ),
                    None => warn!(
                        "content of region {region} cannot fit a {budget}px budget, leaving it in place"
                    ),
                }
                forced
            }
            found => found,
        };
        if let Some(split) = &found {
            debug!("region {region} breaks at {split} (budget {budget}px)");
        }
        Ok(found)
    }

    /// Break just past the first unit at `split`: after the first line of a
    /// text node, otherwise before the next rendered node in document order.
    fn break_after_first(
        &self,
        tree: &mut ContentTree,
        region: NodeId,
        budget: f64,
        split: &SplitPoint,
    ) -> Result<Option<SplitPoint>, TreeError> {
        let mut parents = vec![region];
        for &index in &split.path {
            let Some(&parent) = parents.last() else {
                break;
            };
            let Some(child) = tree.child(parent, index) else {
                return Ok(None);
            };
            parents.push(child);
        }

        if let (BreakOffset::Text(_), Some(&node)) = (&split.offset, parents.last()) {
            let locator = WordLocator::new(self.probe, region, budget, &self.options.probe_tag);
            if let Some(offset) = locator.first_line_end(tree, node)? {
                return Ok(Some(SplitPoint {
                    path: split.path.clone(),
                    offset: BreakOffset::Text(offset),
                }));
            }
        }

        let mut path = split.path.clone();
        while let Some(index) = path.pop() {
            let parent = parents[path.len()];
            let following = tree.children(parent)[index + 1..]
                .iter()
                .position(|&node| renders(tree, node));
            if let Some(offset) = following {
                path.push(index + 1 + offset);
                return Ok(Some(SplitPoint {
                    path,
                    offset: BreakOffset::WholeNode,
                }));
            }
        }
        Ok(None)
    }

    fn search(
        &self,
        tree: &mut ContentTree,
        region: NodeId,
        container: NodeId,
        budget: f64,
        path: &mut NodePath,
    ) -> Result<Option<SplitPoint>, TreeError> {
        let count = tree.children(container).len();
        for index in 0..count {
            let Some(child) = tree.child(container, index) else {
                break;
            };

            if tree.is_text(child) {
                let locator = WordLocator::new(self.probe, region, budget, &self.options.probe_tag);
                if let Some(offset) = locator.locate(tree, child)? {
                    path.push(index);
                    return Ok(Some(SplitPoint {
                        path: path.clone(),
                        offset: BreakOffset::Text(offset),
                    }));
                }
                continue;
            }

            if self.probe.computed_style(tree, child, "display").as_deref() == Some("none") {
                continue;
            }

            let probe = self.probe;
            let bottom = with_display(tree, child, &self.options.measure_display, |tree| {
                probe.bottom_within(tree, child, region)
            })?;
            if bottom <= budget + EPSILON {
                continue;
            }

            path.push(index);
            if tree.tag(child).is_some_and(|tag| self.options.is_atomic(tag)) {
                return Ok(Some(SplitPoint {
                    path: path.clone(),
                    offset: BreakOffset::WholeNode,
                }));
            }
            if let Some(found) = self.search(tree, region, child, budget, path)? {
                return Ok(Some(found));
            }
            path.pop();
        }
        Ok(None)
    }
}

/// Whether anything renderable precedes the break inside the region.
fn has_content_before(tree: &ContentTree, region: NodeId, split: &SplitPoint) -> bool {
    let mut container = region;
    for &index in &split.path {
        let children = tree.children(container);
        let before = &children[..index.min(children.len())];
        if before.iter().any(|&node| renders(tree, node)) {
            return true;
        }
        let Some(next) = tree.child(container, index) else {
            return true;
        };
        container = next;
    }
    match split.offset {
        BreakOffset::Text(offset) => tree
            .text(container)
            .and_then(|value| value.get(..offset))
            .is_some_and(|head| !head.trim().is_empty()),
        BreakOffset::WholeNode => false,
    }
}

fn renders(tree: &ContentTree, node: NodeId) -> bool {
    match tree.text(node) {
        Some(value) => !value.trim().is_empty(),
        None => tree.contains(node),
    }
}

/// Move everything after `split` from `current` into the empty `next`.
///
/// The content is cloned into `next`, then each side is trimmed level by
/// level along the path: `current` keeps what precedes the break, `next`
/// keeps what follows it. Ancestors of the break end up on both sides.
pub fn apply_split(
    tree: &mut ContentTree,
    current: NodeId,
    next: NodeId,
    split: &SplitPoint,
) -> Result<(), TreeError> {
    for child in tree.children(current).to_vec() {
        let copy = tree.deep_clone(child)?;
        tree.append_child(next, copy)?;
    }

    let mut upstream = current;
    let mut downstream = next;
    for &index in &split.path {
        for _ in 0..index {
            if let Some(first) = tree.first_child(downstream) {
                tree.remove(first)?;
            }
        }
        while tree.children(upstream).len() > index + 1 {
            if let Some(last) = tree.last_child(upstream) {
                tree.remove(last)?;
            }
        }
        upstream = tree
            .child(upstream, index)
            .ok_or(TreeError::ChildOutOfRange {
                node: upstream,
                index,
            })?;
        downstream = tree
            .first_child(downstream)
            .ok_or(TreeError::ChildOutOfRange {
                node: downstream,
                index: 0,
            })?;
    }

    match split.offset {
        BreakOffset::Text(offset) => {
            let value = tree
                .text(upstream)
                .ok_or(TreeError::NotText { node: upstream })?;
            let (head, tail) = match (value.get(..offset), value.get(offset..)) {
                (Some(head), Some(tail)) => (head.to_string(), tail.to_string()),
                _ => {
                    return Err(TreeError::InvalidOffset {
                        node: upstream,
                        offset,
                    })
                }
            };
            tree.set_text(upstream, head)?;
            tree.set_text(downstream, tail)?;
        }
        BreakOffset::WholeNode => tree.remove(upstream)?,
    }
    Ok(())
}
