//! Merging split content back into one region.

use regionflow_core::{BreakOffset, ContentTree, NodeId, SplitPoint, TreeError};

/// Undo one split: fold `downstream`'s content back into `upstream`.
///
/// Descends along the split path on both sides, re-joins the text halves at
/// the break, then moves every remaining downstream node up level by level,
/// dropping the duplicated ancestors on the way. Afterwards `downstream` is
/// empty.
///
/// Content may have been edited since the split. Where the recorded path no
/// longer exists upstream the last child stands in for it, so nothing is
/// lost even if the join lands in a different place.
pub fn merge_back(
    tree: &mut ContentTree,
    upstream: NodeId,
    downstream: NodeId,
    split: &SplitPoint,
) -> Result<(), TreeError> {
    let Some((&last, ancestors)) = split.path.split_last() else {
        return tree.move_children(downstream, upstream);
    };

    let mut ups = vec![upstream];
    let mut downs = vec![downstream];
    for &index in ancestors {
        let (Some(&up), Some(&down)) = (ups.last(), downs.last()) else {
            break;
        };
        let (Some(next_up), Some(next_down)) =
            (child_or_last(tree, up, index), tree.first_child(down))
        else {
            break;
        };
        if !tree.is_element(next_up) || !tree.is_element(next_down) {
            break;
        }
        ups.push(next_up);
        downs.push(next_down);
    }

    let up = ups[ups.len() - 1];
    let down = downs[downs.len() - 1];
    let full_depth = ups.len() == split.path.len();
    if matches!(split.offset, BreakOffset::Text(_)) && full_depth {
        join_text(tree, up, down, last)?;
    }
    tree.move_children(down, up)?;

    for level in (0..downs.len() - 1).rev() {
        tree.remove(downs[level + 1])?;
        tree.move_children(downs[level], ups[level])?;
    }
    Ok(())
}

/// Append the first downstream text to the upstream text half.
fn join_text(
    tree: &mut ContentTree,
    up: NodeId,
    down: NodeId,
    index: usize,
) -> Result<(), TreeError> {
    let (Some(head), Some(tail)) = (child_or_last(tree, up, index), tree.first_child(down)) else {
        return Ok(());
    };
    let joined = match (tree.text(head), tree.text(tail)) {
        (Some(head), Some(tail)) => format!("{head}{tail}"),
        _ => return Ok(()),
    };
    tree.set_text(head, joined)?;
    tree.remove(tail)
}

fn child_or_last(tree: &ContentTree, parent: NodeId, index: usize) -> Option<NodeId> {
    tree.child(parent, index).or_else(|| tree.last_child(parent))
}
