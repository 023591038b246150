#![allow(dead_code)]

use regionflow::{ContentTree, NodeId, RegionChain};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An empty container with a fixed size.
pub fn region(tree: &mut ContentTree, width: f64, height: f64) -> NodeId {
    let region = tree.create_element("div");
    tree.set_style(region, "width", Some(format!("{width}px").as_str()))
        .unwrap();
    tree.set_style(region, "height", Some(format!("{height}px").as_str()))
        .unwrap();
    region
}

/// A container holding a single run of text.
pub fn text_region(tree: &mut ContentTree, width: f64, height: f64, text: &str) -> NodeId {
    let region = region(tree, width, height);
    let node = tree.create_text(text);
    tree.append_child(region, node).unwrap();
    region
}

pub fn paragraph(tree: &mut ContentTree, text: &str) -> NodeId {
    let node = tree.create_text(text);
    tree.build_element("p", [node]).unwrap()
}

/// Text shown by each region, in chain order.
pub fn region_texts(tree: &ContentTree, chain: &RegionChain) -> Vec<String> {
    chain
        .regions()
        .iter()
        .map(|&region| tree.text_content(region))
        .collect()
}

/// One line per region: index and its text.
pub fn report(tree: &ContentTree, chain: &RegionChain) -> String {
    region_texts(tree, chain)
        .iter()
        .enumerate()
        .map(|(index, text)| format!("{index}: {text:?}"))
        .collect::<Vec<_>>()
        .join("\n")
}
