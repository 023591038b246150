//! A small deterministic rendering host for regionflow.
//!
//! The flow engine only measures layout; something has to produce it. This
//! crate lays a [`ContentTree`](regionflow_core::ContentTree) out with
//! monospace text metrics and answers the
//! [`GeometryProbe`](regionflow_core::GeometryProbe) queries from the result.
//!
//! # Model
//!
//! 1. **Block flow**: block children stack vertically inside their parent
//! 2. **Inline flow**: text, inline and inline-block boxes wrap greedily into
//!    lines of a fixed height
//! 3. **Replaced boxes**: `img`, `iframe`, `video`, `canvas` and `svg` take
//!    their size from inline `width`/`height`
//!
//! # Example
//!
//! ```ignore
//! use regionflow_layout::{LayoutProbe, TextStyle};
//!
//! let probe = LayoutProbe::new(TextStyle::default());
//! let boxes = probe.layout(&tree, region);
//! println!("{:?}", boxes.get(paragraph));
//! ```

mod bounds;
mod probe;
mod text;

pub use bounds::Bounds;
pub use probe::{display_of, is_replaced, BoxMap, Display, LayoutProbe};
pub use text::{measure_text, LineBreaker, TextMetrics, TextStyle};
