//! Configuration for a region chain.

use std::time::Duration;

/// Options for splitting content across a chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FlowOptions {
    /// Tags of elements that cannot be partially shown and always move whole
    pub atomic_tags: Vec<String>,
    /// Tag of the temporary element wrapped around a word while measuring it
    pub probe_tag: String,
    /// Display mode forced on an element while its height is measured
    pub measure_display: String,
    /// Change detection settings
    pub watch: WatchOptions,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            atomic_tags: ["img", "iframe", "video", "canvas", "svg"]
                .into_iter()
                .map(String::from)
                .collect(),
            probe_tag: "span".to_string(),
            measure_display: "inline-block".to_string(),
            watch: WatchOptions::default(),
        }
    }
}

impl FlowOptions {
    /// Whether elements with this tag move as a unit.
    pub fn is_atomic(&self, tag: &str) -> bool {
        self.atomic_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Options for the change watcher.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct WatchOptions {
    /// Observe region subtrees for content mutations
    pub observe_mutations: bool,
    /// Poll region sizes on a fixed interval
    pub poll_geometry: bool,
    /// Interval between geometry polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Resplit on child-list mutations. Off by default.
    pub react_to_child_list: bool,
    /// Resplit on inline style mutations. Off by default.
    pub react_to_attributes: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            observe_mutations: true,
            poll_geometry: true,
            poll_interval_ms: 100,
            react_to_child_list: false,
            react_to_attributes: false,
        }
    }
}

impl WatchOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
