//! Locating the last fitting word inside a text run.

use std::ops::Range;

use log::trace;
use regionflow_core::{ContentTree, GeometryProbe, NodeId, TreeError};

pub(crate) const EPSILON: f64 = 1e-6;

/// Byte ranges of the whitespace-delimited words of `text`.
pub fn word_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;
    for (index, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(begin)) => {
                spans.push(begin..index);
                start = None;
            }
            (false, None) => start = Some(index),
            _ => {}
        }
    }
    if let Some(begin) = start {
        spans.push(begin..text.len());
    }
    spans
}

/// Measured box of one word.
#[derive(Debug, Clone, Copy)]
struct Trial {
    word: usize,
    top: f64,
    bottom: f64,
}

/// Finds where a text node must break to fit a height budget.
///
/// Each candidate word is wrapped, together with the whitespace before it,
/// in a temporary element inserted in place, and that element's rendered
/// box is measured relative to the region.
///
/// Rendered bottom edges must be non-decreasing with word index. Simple
/// top-to-bottom flow guarantees this; floats and mixed writing directions
/// do not, and are not supported.
pub struct WordLocator<'a> {
    probe: &'a dyn GeometryProbe,
    region: NodeId,
    budget: f64,
    probe_tag: &'a str,
}

impl<'a> WordLocator<'a> {
    pub fn new(
        probe: &'a dyn GeometryProbe,
        region: NodeId,
        budget: f64,
        probe_tag: &'a str,
    ) -> Self {
        Self {
            probe,
            region,
            budget,
            probe_tag,
        }
    }

    /// Byte offset of the first word of `text_node` that does not fit.
    ///
    /// `None` when every word fits or the node holds no words. The node's
    /// value is unchanged afterwards.
    pub fn locate(
        &self,
        tree: &mut ContentTree,
        text_node: NodeId,
    ) -> Result<Option<usize>, TreeError> {
        let original = tree
            .text(text_node)
            .ok_or(TreeError::NotText { node: text_node })?
            .to_string();
        let words = word_spans(&original);
        if words.is_empty() {
            return Ok(None);
        }

        let gauge = Gauge::install(tree, text_node, original, self.probe_tag)?;
        let searched = self.search(tree, &gauge, &words);
        gauge.remove(tree)?;

        let first_overflow = searched?;
        Ok(words.get(first_overflow).map(|w| w.start))
    }

    /// Byte offset of the first word of `text_node` that starts a new line.
    ///
    /// Ignores the budget. `None` when all words share the first line.
    pub fn first_line_end(
        &self,
        tree: &mut ContentTree,
        text_node: NodeId,
    ) -> Result<Option<usize>, TreeError> {
        let original = tree
            .text(text_node)
            .ok_or(TreeError::NotText { node: text_node })?
            .to_string();
        let words = word_spans(&original);
        if words.len() < 2 {
            return Ok(None);
        }

        let gauge = Gauge::install(tree, text_node, original, self.probe_tag)?;
        let walked = self.walk_first_line(tree, &gauge, &words);
        gauge.remove(tree)?;

        Ok(walked?.and_then(|word| words.get(word)).map(|w| w.start))
    }

    fn walk_first_line(
        &self,
        tree: &mut ContentTree,
        gauge: &Gauge,
        words: &[Range<usize>],
    ) -> Result<Option<usize>, TreeError> {
        let first = self.trial(tree, gauge, words, 0)?;
        for word in 1..words.len() {
            if !same_line(&self.trial(tree, gauge, words, word)?, &first) {
                return Ok(Some(word));
            }
        }
        Ok(None)
    }

    /// Index of the first non-fitting word, `words.len()` if all fit.
    fn search(
        &self,
        tree: &mut ContentTree,
        gauge: &Gauge,
        words: &[Range<usize>],
    ) -> Result<usize, TreeError> {
        let mut low = 0;
        let mut high = words.len();
        let mut pivot = None;

        while low < high {
            let mid = low + (high - low) / 2;
            let trial = self.trial(tree, gauge, words, mid)?;
            pivot = Some(trial);
            if trial.bottom > self.budget + EPSILON {
                high = mid;
            } else if trial.bottom < self.budget - EPSILON {
                low = mid + 1;
            } else {
                break;
            }
        }

        let Some(mut pivot) = pivot else {
            return Ok(words.len());
        };

        // Land on the true last word of the fitting line
        if self.fits(&pivot) {
            while pivot.word + 1 < words.len() {
                let next = self.trial(tree, gauge, words, pivot.word + 1)?;
                if !same_line(&next, &pivot) {
                    break;
                }
                pivot = next;
            }
            Ok(pivot.word + 1)
        } else {
            while pivot.word > 0 {
                let previous = self.trial(tree, gauge, words, pivot.word - 1)?;
                if !same_line(&previous, &pivot) {
                    break;
                }
                pivot = previous;
            }
            Ok(pivot.word)
        }
    }

    fn trial(
        &self,
        tree: &mut ContentTree,
        gauge: &Gauge,
        words: &[Range<usize>],
        word: usize,
    ) -> Result<Trial, TreeError> {
        let start = if word == 0 { 0 } else { words[word - 1].end };
        gauge.show(tree, start..words[word].end)?;
        let top = self.probe.offset_top(tree, gauge.element, self.region);
        let bottom = top + self.probe.offset_height(tree, gauge.element);
        trace!("word {word} of {}: top {top}, bottom {bottom}", words.len());
        Ok(Trial { word, top, bottom })
    }

    fn fits(&self, trial: &Trial) -> bool {
        trial.bottom <= self.budget + EPSILON
    }
}

fn same_line(a: &Trial, b: &Trial) -> bool {
    (a.top - b.top).abs() < EPSILON
}

/// A text node temporarily split into prefix, measured element, and suffix.
struct Gauge {
    text_node: NodeId,
    original: String,
    element: NodeId,
    word: NodeId,
    suffix: NodeId,
}

impl Gauge {
    fn install(
        tree: &mut ContentTree,
        text_node: NodeId,
        original: String,
        tag: &str,
    ) -> Result<Self, TreeError> {
        let suffix = tree.split_text(text_node, original.len())?;
        let word = tree.create_text("");
        let element = tree.build_element(tag, [word])?;
        tree.insert_after(text_node, element)?;
        Ok(Self {
            text_node,
            original,
            element,
            word,
            suffix,
        })
    }

    fn show(&self, tree: &mut ContentTree, range: Range<usize>) -> Result<(), TreeError> {
        tree.set_text(self.text_node, &self.original[..range.start])?;
        tree.set_text(self.word, &self.original[range.clone()])?;
        tree.set_text(self.suffix, &self.original[range.end..])
    }

    fn remove(self, tree: &mut ContentTree) -> Result<(), TreeError> {
        tree.remove(self.element)?;
        tree.remove(self.suffix)?;
        tree.set_text(self.text_node, self.original)
    }
}
