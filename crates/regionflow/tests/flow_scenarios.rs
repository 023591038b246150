//! End-to-end flows through a region chain, measured by the layout host.

mod common;

use common::{init_logging, paragraph, region, region_texts, report, text_region};
use regionflow::{
    BreakOffset, ContentTree, FlowOptions, FlowState, FlowTo, RegionChain, RegionIntent,
    SplitPoint,
};
use regionflow_layout::LayoutProbe;

#[test]
fn test_two_regions_split_at_line_end() {
    init_logging();
    let mut tree = ContentTree::new();
    let first = text_region(&mut tree, 70.0, 20.0, "aaa bbb ccc ddd");
    let second = region(&mut tree, 70.0, 20.0);
    let probe = LayoutProbe::default();
    let mut chain = RegionChain::new(&tree, first).unwrap();
    chain.flow_to(&mut tree, &probe, second).unwrap();

    let intents = chain.split(&mut tree, &probe).unwrap();

    assert!(intents.is_empty());
    insta::assert_snapshot!(report(&tree, &chain), @r###"
    0: "aaa bbb "
    1: "ccc ddd"
    "###);
    let point = chain.split_points()[0].as_ref().unwrap();
    assert_eq!(point.to_string(), "[0]@8");
    assert_eq!(point.offset, BreakOffset::Text(8));
}

#[test]
fn test_enclosing_elements_are_duplicated() {
    init_logging();
    let mut tree = ContentTree::new();
    let first = region(&mut tree, 70.0, 40.0);
    let intro = paragraph(&mut tree, "aaa");
    let body = paragraph(&mut tree, "bbb ccc ddd eee");
    tree.append_child(first, intro).unwrap();
    tree.append_child(first, body).unwrap();
    let second = region(&mut tree, 70.0, 40.0);
    let probe = LayoutProbe::default();
    let mut chain =
        RegionChain::from_regions(&tree, [first, second], FlowOptions::default()).unwrap();

    chain.split(&mut tree, &probe).unwrap();

    assert_eq!(chain.split_points(), &[Some(SplitPoint::text([1, 0], 8))]);
    assert_eq!(tree.children(first), &[intro, body]);
    assert_eq!(tree.text_content(first), "aaabbb ccc ");
    let continued = tree.first_child(second).unwrap();
    assert_eq!(tree.tag(continued), Some("p"));
    assert_ne!(continued, body);
    assert_eq!(tree.text_content(second), "ddd eee");
}

#[test]
fn test_atomic_image_moves_whole() {
    init_logging();
    let mut tree = ContentTree::new();
    let first = region(&mut tree, 100.0, 50.0);
    let intro = paragraph(&mut tree, "intro");
    let img = tree.create_element("img");
    tree.set_style(img, "width", Some("50px")).unwrap();
    tree.set_style(img, "height", Some("100px")).unwrap();
    tree.append_child(first, intro).unwrap();
    tree.append_child(first, img).unwrap();
    let second = region(&mut tree, 100.0, 200.0);
    let probe = LayoutProbe::default();
    let mut chain =
        RegionChain::from_regions(&tree, [first, second], FlowOptions::default()).unwrap();

    let intents = chain.split(&mut tree, &probe).unwrap();

    assert!(intents.is_empty());
    assert_eq!(chain.split_points(), &[Some(SplitPoint::whole([1]))]);
    assert_eq!(tree.children(first), &[intro]);
    let moved = tree.first_child(second).unwrap();
    assert_eq!(tree.tag(moved), Some("img"));
    assert_eq!(tree.style(moved, "height"), Some("100px"));
}

#[test]
fn test_oversized_atomic_stays_without_more_requests() {
    init_logging();
    let mut tree = ContentTree::new();
    let first = region(&mut tree, 100.0, 50.0);
    let intro = paragraph(&mut tree, "intro");
    let img = tree.create_element("img");
    tree.set_style(img, "width", Some("50px")).unwrap();
    tree.set_style(img, "height", Some("300px")).unwrap();
    tree.append_child(first, intro).unwrap();
    tree.append_child(first, img).unwrap();
    let second = region(&mut tree, 100.0, 200.0);
    let probe = LayoutProbe::default();
    let mut chain =
        RegionChain::from_regions(&tree, [first, second], FlowOptions::default()).unwrap();

    let intents = chain.split(&mut tree, &probe).unwrap();

    assert!(intents.is_empty());
    assert_eq!(chain.state(), FlowState::Split);
    assert_eq!(tree.children(second).len(), 1);
    assert_eq!(chain.split_points().len(), 1);
}

#[test]
fn test_content_after_oversized_atomic_keeps_flowing() {
    init_logging();
    let mut tree = ContentTree::new();
    let first = region(&mut tree, 100.0, 50.0);
    let intro = paragraph(&mut tree, "intro");
    let img = tree.create_element("img");
    tree.set_style(img, "width", Some("50px")).unwrap();
    tree.set_style(img, "height", Some("300px")).unwrap();
    let tail = paragraph(&mut tree, "tail");
    for node in [intro, img, tail] {
        tree.append_child(first, node).unwrap();
    }
    let second = region(&mut tree, 100.0, 200.0);
    let third = region(&mut tree, 100.0, 200.0);
    let probe = LayoutProbe::default();
    let mut chain =
        RegionChain::from_regions(&tree, [first, second, third], FlowOptions::default())
            .unwrap();

    let intents = chain.split(&mut tree, &probe).unwrap();

    assert!(intents.is_empty());
    assert_eq!(region_texts(&tree, &chain), vec!["intro", "", "tail"]);
    let kept = tree.first_child(second).unwrap();
    assert_eq!(tree.tag(kept), Some("img"));
    assert_eq!(tree.children(second).len(), 1);
    assert_eq!(
        chain.split_points(),
        &[Some(SplitPoint::whole([1])), Some(SplitPoint::whole([1]))]
    );

    chain.rebuild(&mut tree).unwrap();
    assert_eq!(tree.children(first).len(), 3);
    assert_eq!(tree.text_content(first), "introtail");
}

#[test]
fn test_oversized_first_line_moves_on_without_more_requests() {
    init_logging();
    let mut tree = ContentTree::new();
    let first = text_region(&mut tree, 70.0, 10.0, "aaa bbb ccc ddd");
    let second = region(&mut tree, 70.0, 10.0);
    let probe = LayoutProbe::default();
    let mut chain =
        RegionChain::from_regions(&tree, [first, second], FlowOptions::default()).unwrap();

    let intents = chain.split(&mut tree, &probe).unwrap();

    assert!(intents.is_empty());
    assert_eq!(region_texts(&tree, &chain), vec!["aaa bbb ", "ccc ddd"]);
}

#[test]
fn test_chain_growth_is_ordered_and_idempotent() {
    init_logging();
    let mut tree = ContentTree::new();
    let first = text_region(&mut tree, 70.0, 20.0, "aaa");
    let second = region(&mut tree, 70.0, 20.0);
    let third = region(&mut tree, 70.0, 20.0);
    let probe = LayoutProbe::default();
    let mut chain = RegionChain::new(&tree, first).unwrap();

    let intents = chain
        .flow_to_all(&mut tree, &probe, [second, third])
        .unwrap();
    assert!(intents.is_empty());
    assert_eq!(
        chain.regions().iter().copied().collect::<Vec<_>>(),
        vec![first, second, third]
    );

    assert_eq!(
        chain.flow_to(&mut tree, &probe, second).unwrap(),
        FlowTo::AlreadyPresent
    );
    assert!(!chain.flow_to(&mut tree, &probe, first).unwrap().is_appended());
    assert_eq!(chain.len(), 3);
    assert_eq!(chain.split_points().len(), 2);
}

#[test]
fn test_host_loop_supplies_regions_until_content_fits() {
    init_logging();
    let mut tree = ContentTree::new();
    let original = "aaa bbb ccc ddd eee fff";
    let first = text_region(&mut tree, 70.0, 20.0, original);
    let probe = LayoutProbe::default();
    let mut chain = RegionChain::new(&tree, first).unwrap();

    let mut intents = chain.split(&mut tree, &probe).unwrap();
    let mut supplied = 0;
    while intents.contains(&RegionIntent::RequestNewRegion) {
        assert!(supplied < 10, "chain kept asking for regions");
        let next = region(&mut tree, 70.0, 20.0);
        intents = chain
            .flow_to(&mut tree, &probe, next)
            .unwrap()
            .intents()
            .to_vec();
        supplied += 1;
    }

    assert_eq!(supplied, 2);
    assert_eq!(chain.state(), FlowState::Split);
    assert!(chain.pending_overflow().is_none());
    assert_eq!(
        region_texts(&tree, &chain),
        vec!["aaa bbb ", "ccc ddd ", "eee fff"]
    );
    assert_eq!(region_texts(&tree, &chain).concat(), original);
}

#[test]
fn test_pending_overflow_keeps_content_in_place() {
    init_logging();
    let mut tree = ContentTree::new();
    let original = "aaa bbb ccc ddd eee fff";
    let first = text_region(&mut tree, 70.0, 20.0, original);
    let second = region(&mut tree, 70.0, 20.0);
    let probe = LayoutProbe::default();
    let mut chain =
        RegionChain::from_regions(&tree, [first, second], FlowOptions::default()).unwrap();

    let intents = chain.split(&mut tree, &probe).unwrap();

    assert_eq!(intents, vec![RegionIntent::RequestNewRegion]);
    assert_eq!(chain.state(), FlowState::AwaitingRegion);
    let pending = chain.pending_overflow().unwrap();
    assert_eq!(pending.region, second);
    assert_eq!(pending.split, SplitPoint::text([0], 8));
    assert_eq!(tree.text_content(second), "ccc ddd eee fff");
    assert_eq!(region_texts(&tree, &chain).concat(), original);
}

#[test]
fn test_remove_middle_region_redistributes() {
    init_logging();
    let mut tree = ContentTree::new();
    let original = "aaa bbb ccc ddd eee fff";
    let first = text_region(&mut tree, 70.0, 20.0, original);
    let second = region(&mut tree, 70.0, 20.0);
    let third = region(&mut tree, 70.0, 20.0);
    let probe = LayoutProbe::default();
    let mut chain =
        RegionChain::from_regions(&tree, [first, second, third], FlowOptions::default())
            .unwrap();
    chain.split(&mut tree, &probe).unwrap();
    assert_eq!(tree.text_content(second), "ccc ddd ");

    let intents = chain.remove_region(&mut tree, &probe, second).unwrap();

    assert_eq!(intents, vec![RegionIntent::RequestNewRegion]);
    assert_eq!(
        chain.regions().iter().copied().collect::<Vec<_>>(),
        vec![first, third]
    );
    assert!(tree.children(second).is_empty());
    assert_eq!(tree.text_content(first), "aaa bbb ");
    assert_eq!(tree.text_content(third), "ccc ddd eee fff");
    assert_eq!(chain.region_index(&tree, second), None);
}

#[test]
fn test_padding_bottom_shrinks_budget() {
    init_logging();
    let mut tree = ContentTree::new();
    let first = text_region(&mut tree, 70.0, 40.0, "aaa bbb ccc ddd");
    tree.set_style(first, "padding-bottom", Some("20px")).unwrap();
    let second = region(&mut tree, 70.0, 40.0);
    let probe = LayoutProbe::default();
    let mut chain =
        RegionChain::from_regions(&tree, [first, second], FlowOptions::default()).unwrap();

    chain.split(&mut tree, &probe).unwrap();

    assert_eq!(region_texts(&tree, &chain), vec!["aaa bbb ", "ccc ddd"]);
}

#[test]
fn test_split_is_idempotent() {
    init_logging();
    let mut tree = ContentTree::new();
    let first = region(&mut tree, 70.0, 40.0);
    let intro = paragraph(&mut tree, "aaa");
    let body = paragraph(&mut tree, "bbb ccc ddd eee fff ggg");
    tree.append_child(first, intro).unwrap();
    tree.append_child(first, body).unwrap();
    let second = region(&mut tree, 70.0, 40.0);
    let probe = LayoutProbe::default();
    let mut chain =
        RegionChain::from_regions(&tree, [first, second], FlowOptions::default()).unwrap();

    chain.split(&mut tree, &probe).unwrap();
    let points = chain.split_points().to_vec();
    let texts = region_texts(&tree, &chain);

    chain.split(&mut tree, &probe).unwrap();
    assert_eq!(chain.split_points(), points.as_slice());
    assert_eq!(region_texts(&tree, &chain), texts);
}

#[test]
fn test_rebuild_restores_nested_structure() {
    init_logging();
    let mut tree = ContentTree::new();
    let first = region(&mut tree, 70.0, 40.0);
    let lead = tree.create_text("aaa ");
    let emphasis = tree.create_text("bbb ccc");
    let em = tree.build_element("em", [emphasis]).unwrap();
    let tail = tree.create_text(" ddd");
    let p = tree.build_element("p", [lead, em, tail]).unwrap();
    let quote = paragraph(&mut tree, "eee fff ggg");
    tree.append_child(first, p).unwrap();
    tree.append_child(first, quote).unwrap();
    let before = tree.text_content(first);
    let second = region(&mut tree, 70.0, 40.0);
    let third = region(&mut tree, 70.0, 40.0);
    let probe = LayoutProbe::default();
    let mut chain =
        RegionChain::from_regions(&tree, [first, second, third], FlowOptions::default())
            .unwrap();

    let intents = chain.split(&mut tree, &probe).unwrap();
    assert_eq!(intents, vec![RegionIntent::RequestRemoveRegion(third)]);
    assert_eq!(tree.text_content(second), "eee fff ggg");

    chain.rebuild(&mut tree).unwrap();

    assert_eq!(chain.state(), FlowState::Unsplit);
    assert!(chain.split_points().iter().all(Option::is_none));
    assert_eq!(tree.text_content(first), before);
    assert_eq!(tree.children(first), &[p, quote]);
    assert_eq!(tree.children(p).len(), 3);
    assert!(tree.children(second).is_empty());
}
