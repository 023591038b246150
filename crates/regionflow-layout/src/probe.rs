//! Layout computation and the geometry probe built on it.

use std::collections::HashMap;

use log::trace;
use regionflow_core::{parse_px, ContentTree, GeometryProbe, NodeId, NodeKind};

use crate::bounds::Bounds;
use crate::text::{measure_text, LineBreaker, TextStyle};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "html", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "ul",
];

const REPLACED_TAGS: &[&str] = &["img", "iframe", "video", "canvas", "svg"];

/// Outer display type of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    InlineBlock,
    None,
}

impl Display {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "block" => Some(Display::Block),
            "inline" => Some(Display::Inline),
            "inline-block" => Some(Display::InlineBlock),
            "none" => Some(Display::None),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Display::Block => "block",
            Display::Inline => "inline",
            Display::InlineBlock => "inline-block",
            Display::None => "none",
        }
    }
}

/// Whether a tag renders as a replaced box sized by its own attributes.
pub fn is_replaced(tag: &str) -> bool {
    REPLACED_TAGS.contains(&tag)
}

/// Resolve the display type of a node from its inline style and tag.
pub fn display_of(tree: &ContentTree, node: NodeId) -> Display {
    let Some(tag) = tree.tag(node) else {
        return Display::Inline;
    };
    if let Some(display) = tree.style(node, "display").and_then(Display::parse) {
        return display;
    }
    if BLOCK_TAGS.contains(&tag) {
        Display::Block
    } else if is_replaced(tag) {
        Display::InlineBlock
    } else {
        Display::Inline
    }
}

/// Boxes computed for every rendered node below a layout root.
#[derive(Debug, Clone, Default)]
pub struct BoxMap {
    boxes: HashMap<NodeId, Bounds>,
}

impl BoxMap {
    /// Get the box of a node, positioned relative to the layout root.
    pub fn get(&self, node: NodeId) -> Option<Bounds> {
        self.boxes.get(&node).copied()
    }
}

/// Geometry probe backed by a deterministic block/inline layout.
///
/// Every query lays out the whole tree the node belongs to, starting at its
/// topmost ancestor, so answers always reflect the current content.
#[derive(Debug, Clone)]
pub struct LayoutProbe {
    style: TextStyle,
    viewport_width: f64,
}

impl Default for LayoutProbe {
    fn default() -> Self {
        Self::new(TextStyle::default())
    }
}

impl LayoutProbe {
    pub fn new(style: TextStyle) -> Self {
        Self {
            style,
            viewport_width: 800.0,
        }
    }

    /// Width used for roots without an inline `width`.
    pub fn with_viewport_width(mut self, width: f64) -> Self {
        self.viewport_width = width;
        self
    }

    /// Lay out the subtree rooted at `root` with `root` at the origin.
    pub fn layout(&self, tree: &ContentTree, root: NodeId) -> BoxMap {
        let mut layouter = Layouter {
            tree,
            style: &self.style,
            boxes: HashMap::new(),
        };
        if tree.is_element(root) {
            let width = length(tree, root, "width").unwrap_or(self.viewport_width);
            layouter.layout_block(root, 0.0, 0.0, width);
        } else if tree.is_text(root) {
            layouter.layout_inline_run(&[root], 0.0, 0.0, self.viewport_width);
        }
        trace!("laid out {} boxes under {root}", layouter.boxes.len());
        BoxMap {
            boxes: layouter.boxes,
        }
    }

    fn bounds(&self, tree: &ContentTree, node: NodeId) -> Option<Bounds> {
        if !tree.contains(node) {
            return None;
        }
        self.layout(tree, tree.root_of(node)).get(node)
    }
}

impl GeometryProbe for LayoutProbe {
    fn offset_height(&self, tree: &ContentTree, node: NodeId) -> f64 {
        self.bounds(tree, node).map(|b| b.height).unwrap_or(0.0)
    }

    fn offset_width(&self, tree: &ContentTree, node: NodeId) -> f64 {
        self.bounds(tree, node).map(|b| b.width).unwrap_or(0.0)
    }

    fn offset_top(&self, tree: &ContentTree, node: NodeId, ancestor: NodeId) -> f64 {
        if !tree.contains(node) {
            return 0.0;
        }
        let boxes = self.layout(tree, tree.root_of(node));
        let top = boxes.get(node).map(|b| b.y).unwrap_or(0.0);
        let origin = boxes.get(ancestor).map(|b| b.y).unwrap_or(0.0);
        top - origin
    }

    fn computed_style(&self, tree: &ContentTree, node: NodeId, property: &str) -> Option<String> {
        if let Some(value) = tree.style(node, property) {
            return Some(value.to_string());
        }
        match property {
            "display" => tree
                .contains(node)
                .then(|| display_of(tree, node).as_str().to_string()),
            "padding-top" | "padding-bottom" => tree.is_element(node).then(|| "0px".to_string()),
            "width" => self.bounds(tree, node).map(|b| format!("{}px", b.width)),
            "height" => self.bounds(tree, node).map(|b| format!("{}px", b.height)),
            _ => None,
        }
    }
}

fn length(tree: &ContentTree, node: NodeId, property: &str) -> Option<f64> {
    tree.style(node, property).and_then(parse_px)
}

struct Layouter<'a> {
    tree: &'a ContentTree,
    style: &'a TextStyle,
    boxes: HashMap<NodeId, Bounds>,
}

#[derive(Debug, Clone, Copy)]
struct LineBox {
    top: f64,
    height: f64,
}

/// Lines covered by an inline box.
#[derive(Debug, Clone, Copy)]
struct Extent {
    first_line: usize,
    last_line: usize,
    left: f64,
    right: f64,
}

/// State of one inline formatting context.
struct InlineRun {
    x: f64,
    width: f64,
    line_height: f64,
    breaker: LineBreaker,
    lines: Vec<LineBox>,
    pending_space: bool,
    placed_any: bool,
    open: Vec<NodeId>,
    extents: Vec<(NodeId, Extent)>,
}

impl InlineRun {
    fn current_line(&self) -> usize {
        self.lines.len() - 1
    }

    /// Place an item and return its line and left edge.
    fn place(&mut self, width: f64) -> (usize, f64) {
        let (left, broke) = self.breaker.place(width, self.pending_space);
        if broke {
            let last = self.lines[self.current_line()];
            self.lines.push(LineBox {
                top: last.top + last.height,
                height: self.line_height,
            });
        }
        self.pending_space = false;
        self.placed_any = true;
        (self.current_line(), left)
    }

    fn extend(&mut self, node: NodeId, line: usize, left: f64, right: f64) {
        if let Some((_, extent)) = self.extents.iter_mut().find(|(id, _)| *id == node) {
            extent.last_line = line;
            if line == extent.first_line {
                extent.right = extent.right.max(right);
            }
            return;
        }
        self.extents.push((
            node,
            Extent {
                first_line: line,
                last_line: line,
                left,
                right,
            },
        ));
    }

    /// Extend every open inline element, plus `node`, over a placed item.
    fn cover(&mut self, node: NodeId, line: usize, left: f64, right: f64) {
        for open in self.open.clone() {
            self.extend(open, line, left, right);
        }
        self.extend(node, line, left, right);
    }
}

impl Layouter<'_> {
    /// Lay out a block box and return its outer height.
    fn layout_block(&mut self, node: NodeId, x: f64, y: f64, width: f64) -> f64 {
        let tree = self.tree;
        let pad_top = length(tree, node, "padding-top").unwrap_or(0.0);
        let pad_bottom = length(tree, node, "padding-bottom").unwrap_or(0.0);
        let children = tree.children(node);
        let mut cursor = y + pad_top;

        let mut index = 0;
        while index < children.len() {
            let child = children[index];
            if display_of(tree, child) == Display::Block {
                let child_width = length(tree, child, "width").unwrap_or(width);
                cursor += self.layout_block(child, x, cursor, child_width);
                index += 1;
            } else {
                let start = index;
                while index < children.len() && display_of(tree, children[index]) != Display::Block
                {
                    index += 1;
                }
                cursor += self.layout_inline_run(&children[start..index], x, cursor, width);
            }
        }

        let natural = cursor - y + pad_bottom;
        let height = length(tree, node, "height").unwrap_or(natural);
        self.boxes.insert(node, Bounds::new(x, y, width, height));
        height
    }

    /// Lay out consecutive inline-level siblings and return the run height.
    fn layout_inline_run(&mut self, nodes: &[NodeId], x: f64, y: f64, width: f64) -> f64 {
        let mut run = InlineRun {
            x,
            width,
            line_height: self.style.line_height,
            breaker: LineBreaker::new(width, self.style.char_width),
            lines: vec![LineBox {
                top: y,
                height: self.style.line_height,
            }],
            pending_space: false,
            placed_any: false,
            open: Vec::new(),
            extents: Vec::new(),
        };

        for &node in nodes {
            self.flow_inline(node, &mut run);
        }

        // Whitespace-only runs collapse away entirely
        if !run.placed_any {
            run.lines[0].height = 0.0;
        }

        for &(node, extent) in &run.extents {
            let first = run.lines[extent.first_line];
            let last = run.lines[extent.last_line];
            let (left, box_width) = if extent.first_line == extent.last_line {
                (run.x + extent.left, extent.right - extent.left)
            } else {
                (run.x, run.width)
            };
            self.boxes.insert(
                node,
                Bounds::new(left, first.top, box_width, last.top + last.height - first.top),
            );
        }

        let last = run.lines[run.current_line()];
        last.top + last.height - y
    }

    fn flow_inline(&mut self, node: NodeId, run: &mut InlineRun) {
        let tree = self.tree;
        let Some(content) = tree.get(node) else {
            return;
        };
        match content.kind() {
            NodeKind::Text(value) => self.flow_text(node, value, run),
            NodeKind::Element(_) => match display_of(tree, node) {
                Display::None => {
                    let top = run.lines[run.current_line()].top;
                    self.boxes.insert(
                        node,
                        Bounds::new(run.x + run.breaker.line_width(), top, 0.0, 0.0),
                    );
                }
                Display::Inline => {
                    run.open.push(node);
                    for &child in tree.children(node) {
                        self.flow_inline(child, run);
                    }
                    run.open.pop();
                    if !run.extents.iter().any(|(id, _)| *id == node) {
                        let line = run.current_line();
                        let left = run.breaker.line_width();
                        run.extend(node, line, left, left);
                    }
                }
                Display::InlineBlock | Display::Block => self.place_box(node, run),
            },
        }
    }

    fn flow_text(&mut self, node: NodeId, value: &str, run: &mut InlineRun) {
        let mut rest = value;
        while !rest.is_empty() {
            let word_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
            if word_len == 0 {
                let space_len = rest
                    .find(|c: char| !c.is_whitespace())
                    .unwrap_or(rest.len());
                run.pending_space = true;
                rest = &rest[space_len..];
                continue;
            }
            let width = self.style.advance(&rest[..word_len]);
            let (line, left) = run.place(width);
            run.cover(node, line, left, left + width);
            rest = &rest[word_len..];
        }
    }

    /// Place an atomic inline box on the current line.
    fn place_box(&mut self, node: NodeId, run: &mut InlineRun) {
        let tree = self.tree;
        let replaced = tree.tag(node).is_some_and(is_replaced);
        let width = match length(tree, node, "width") {
            Some(width) => width,
            None if replaced => 0.0,
            None => self.max_content_width(node).min(run.width),
        };

        let (line, left) = run.place(width);
        let top = run.lines[line].top;
        let height = if replaced {
            let height = length(tree, node, "height").unwrap_or(0.0);
            self.boxes
                .insert(node, Bounds::new(run.x + left, top, width, height));
            height
        } else {
            self.layout_block(node, run.x + left, top, width)
        };

        let line_box = &mut run.lines[line];
        line_box.height = line_box.height.max(height);
        for open in run.open.clone() {
            run.extend(open, line, left, left + width);
        }
    }

    /// Width of the content laid out on a single line.
    fn max_content_width(&self, node: NodeId) -> f64 {
        let text = self.tree.text_content(node);
        if text.split_whitespace().next().is_none() {
            return 0.0;
        }
        measure_text(&text, self.style, None).width
    }
}
