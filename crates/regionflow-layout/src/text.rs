//! Text measurement for layout.
//!
//! Every character advances by the same width and every line has the same
//! height, which keeps layouts exact and reproducible.

/// Text measurement configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Advance of one character (and of one collapsed space) in pixels
    pub char_width: f64,
    /// Height of one line box in pixels
    pub line_height: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            char_width: 10.0,
            line_height: 20.0,
        }
    }
}

impl TextStyle {
    /// Width of a run of characters.
    pub fn advance(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.char_width
    }
}

/// Measured text metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    /// Width of the widest line
    pub width: f64,
    /// Height of all lines
    pub height: f64,
    /// Number of lines
    pub lines: u32,
}

/// Greedy line filling shared by text measurement and inline layout.
///
/// An item that does not fit moves to a new line unless the current line is
/// still empty, in which case it overflows the line instead.
#[derive(Debug, Clone)]
pub struct LineBreaker {
    max_width: f64,
    space_width: f64,
    line_x: f64,
    line_empty: bool,
    line: usize,
}

impl LineBreaker {
    pub fn new(max_width: f64, space_width: f64) -> Self {
        Self {
            max_width,
            space_width,
            line_x: 0.0,
            line_empty: true,
            line: 0,
        }
    }

    /// Place an item of `width`, preceded by a collapsed space when `spaced`.
    ///
    /// Returns the item's left edge and whether a new line was started.
    pub fn place(&mut self, width: f64, spaced: bool) -> (f64, bool) {
        let mut broke = false;
        let left = if self.line_empty {
            0.0
        } else {
            let gap = if spaced { self.space_width } else { 0.0 };
            if self.line_x + gap + width > self.max_width {
                self.break_line();
                broke = true;
                0.0
            } else {
                self.line_x + gap
            }
        };
        self.line_x = left + width;
        self.line_empty = false;
        (left, broke)
    }

    /// Start a new line.
    pub fn break_line(&mut self) {
        self.line_x = 0.0;
        self.line_empty = true;
        self.line += 1;
    }

    /// Zero-based index of the current line.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Right edge of the content placed on the current line.
    pub fn line_width(&self) -> f64 {
        self.line_x
    }
}

/// Measure text with the given style.
///
/// Whitespace collapses to single spaces. With `max_width` the text wraps at
/// spaces; a word wider than the line overflows it on a line of its own.
pub fn measure_text(text: &str, style: &TextStyle, max_width: Option<f64>) -> TextMetrics {
    if text.split_whitespace().next().is_none() {
        return TextMetrics {
            width: 0.0,
            height: style.line_height,
            lines: 1,
        };
    }

    match max_width {
        Some(max_w) if max_w > 0.0 => measure_wrapped_text(text, style, max_w),
        _ => measure_single_line(text, style),
    }
}

fn measure_single_line(text: &str, style: &TextStyle) -> TextMetrics {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    TextMetrics {
        width: style.advance(&collapsed),
        height: style.line_height,
        lines: 1,
    }
}

fn measure_wrapped_text(text: &str, style: &TextStyle, max_width: f64) -> TextMetrics {
    let mut breaker = LineBreaker::new(max_width, style.char_width);
    let mut widest = 0.0_f64;

    // The breaker forgets a line once it moves on, so track the widest eagerly
    for word in text.split_whitespace() {
        breaker.place(style.advance(word), true);
        widest = widest.max(breaker.line_width());
    }

    let lines = breaker.line() as u32 + 1;
    TextMetrics {
        width: widest,
        height: lines as f64 * style.line_height,
        lines,
    }
}
