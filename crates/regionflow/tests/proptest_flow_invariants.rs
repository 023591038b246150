//! Property-based invariants of splitting and rebuilding.
//!
//! Content is a single run of words in regions of equal size, laid out with
//! 10px characters and 20px lines, so every region holds a whole number of
//! lines:
//!
//! 1. Split then rebuild restores the original text in the first region.
//! 2. Splitting twice gives the same break points and region contents.
//! 3. The regions' texts concatenate back to the original.
//! 4. Each region keeps the most words that fit its line count.

mod common;

use common::{region, region_texts, text_region};
use proptest::prelude::*;
use regionflow::{BreakOffset, ContentTree, FlowOptions, NodeId, RegionChain};
use regionflow_layout::{measure_text, LayoutProbe, TextStyle};

// ── Helpers ─────────────────────────────────────────────────────────────

fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(word_strategy(), 1..30).prop_map(|words| words.join(" "))
}

/// Width in whole characters, height in whole lines, and region count.
fn geometry_strategy() -> impl Strategy<Value = (f64, u32, usize)> {
    (4u32..=12, 1u32..=4, 1usize..=4).prop_map(|(chars, lines, count)| {
        (f64::from(chars) * 10.0, lines, count)
    })
}

fn build(text: &str, width: f64, lines: u32, count: usize) -> (ContentTree, RegionChain) {
    let height = f64::from(lines) * 20.0;
    let mut tree = ContentTree::new();
    let mut regions: Vec<NodeId> = vec![text_region(&mut tree, width, height, text)];
    for _ in 1..count {
        regions.push(region(&mut tree, width, height));
    }
    let chain = RegionChain::from_regions(&tree, regions, FlowOptions::default()).unwrap();
    (tree, chain)
}

fn lines_of(text: &str, width: f64) -> u32 {
    if text.split_whitespace().next().is_none() {
        return 0;
    }
    measure_text(text, &TextStyle::default(), Some(width)).lines
}

fn first_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rebuild_restores_original(text in text_strategy(), (width, lines, count) in geometry_strategy()) {
        let (mut tree, mut chain) = build(&text, width, lines, count);
        let probe = LayoutProbe::default();
        let first = chain.region(0).unwrap();

        chain.split(&mut tree, &probe).unwrap();
        chain.rebuild(&mut tree).unwrap();

        prop_assert_eq!(tree.text_content(first), text);
        prop_assert_eq!(tree.children(first).len(), 1);
        for &other in chain.regions().iter().skip(1) {
            prop_assert!(tree.children(other).is_empty());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn split_twice_is_stable(text in text_strategy(), (width, lines, count) in geometry_strategy()) {
        let (mut tree, mut chain) = build(&text, width, lines, count);
        let probe = LayoutProbe::default();

        let first_intents = chain.split(&mut tree, &probe).unwrap();
        let points = chain.split_points().to_vec();
        let texts = region_texts(&tree, &chain);

        let second_intents = chain.split(&mut tree, &probe).unwrap();
        prop_assert_eq!(first_intents, second_intents);
        prop_assert_eq!(chain.split_points().to_vec(), points);
        prop_assert_eq!(region_texts(&tree, &chain), texts);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. No content lost or duplicated
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn regions_concatenate_to_original(text in text_strategy(), (width, lines, count) in geometry_strategy()) {
        let (mut tree, mut chain) = build(&text, width, lines, count);
        let probe = LayoutProbe::default();

        chain.split(&mut tree, &probe).unwrap();

        prop_assert_eq!(region_texts(&tree, &chain).concat(), text);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Breaks fall after the last word that fits
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn breaks_keep_exactly_the_lines_that_fit(text in text_strategy(), (width, lines, count) in geometry_strategy()) {
        let (mut tree, mut chain) = build(&text, width, lines, count);
        let probe = LayoutProbe::default();

        chain.split(&mut tree, &probe).unwrap();
        let texts = region_texts(&tree, &chain);

        for (index, point) in chain.split_points().iter().enumerate() {
            let Some(point) = point else { continue };
            prop_assert!(matches!(point.offset, BreakOffset::Text(_)));
            let kept = &texts[index];
            let next = first_word(&texts[index + 1]);
            prop_assert!(lines_of(kept, width) <= lines, "{kept:?} overflows {lines} lines");
            let with_next = format!("{kept}{next}");
            prop_assert!(lines_of(&with_next, width) > lines, "{next:?} would still fit after {kept:?}");
        }

        if let Some(pending) = chain.pending_overflow() {
            let BreakOffset::Text(offset) = pending.split.offset else {
                return Err(TestCaseError::fail("word content broke at an element"));
            };
            let held = tree.text_content(pending.region);
            let (kept, rest) = held.split_at(offset);
            prop_assert!(lines_of(kept, width) <= lines);
            let with_next = format!("{kept}{}", first_word(rest));
            prop_assert!(lines_of(&with_next, width) > lines);
        }
    }
}
