//! Geometry contract between the flow engine and a rendering host.
//!
//! The engine never lays anything out itself. It asks the host where boxes
//! ended up and reacts to the answer.

use crate::errors::TreeError;
use crate::tree::ContentTree;
use crate::types::{NodeId, Size};

/// Read-only access to the rendered geometry of content nodes.
///
/// All lengths are in pixels. Hosts should answer `0.0` for nodes they do
/// not render rather than failing.
pub trait GeometryProbe {
    /// Rendered height of a node's box, padding included.
    fn offset_height(&self, tree: &ContentTree, node: NodeId) -> f64;

    /// Rendered width of a node's box, padding included.
    fn offset_width(&self, tree: &ContentTree, node: NodeId) -> f64;

    /// Distance from the top of `ancestor`'s box to the top of `node`'s box.
    fn offset_top(&self, tree: &ContentTree, node: NodeId, ancestor: NodeId) -> f64;

    /// Computed value of a style property, e.g. `"12px"` for `padding-bottom`.
    fn computed_style(&self, tree: &ContentTree, node: NodeId, property: &str) -> Option<String>;

    /// Rendered size of a node's box.
    fn size(&self, tree: &ContentTree, node: NodeId) -> Size {
        Size::new(self.offset_width(tree, node), self.offset_height(tree, node))
    }

    /// Bottom edge of `node` measured from the top of `ancestor`.
    fn bottom_within(&self, tree: &ContentTree, node: NodeId, ancestor: NodeId) -> f64 {
        self.offset_top(tree, node, ancestor) + self.offset_height(tree, node)
    }
}

/// Run `measure` with `node` forced to the given display mode.
///
/// The node's previous inline `display` declaration is restored afterwards,
/// including its absence.
pub fn with_display<R>(
    tree: &mut ContentTree,
    node: NodeId,
    display: &str,
    measure: impl FnOnce(&ContentTree) -> R,
) -> Result<R, TreeError> {
    let previous = tree.set_style(node, "display", Some(display))?;
    let result = measure(tree);
    tree.set_style(node, "display", previous.as_deref())?;
    Ok(result)
}

/// Parse a pixel length such as `"12px"`, `"12.5px"` or `"0"`.
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}
