//! Pure bounds resolution: raw node geometry + parent chain in, canvas-space
//! pixel rectangle out. Recomputed on every draw and hit-test pass; nothing
//! here caches or mutates.

use crate::{
    error::{ScrimError, ScrimResult},
    geom::{Rect, Vec2},
    model::{Anchor, Node, NodeId, PercentBasis},
};

/// Resolve `id`'s final canvas-space rectangle.
///
/// Per axis, independently: a stretched axis derives position and size from
/// the parent's bounds minus the edge offsets, ignoring raw position/size and
/// anchor; an unstretched axis takes the raw coordinate through its anchor
/// rule and keeps the raw size. Both axes then get the pivot adjustment,
/// which always multiplies the node's *raw* stored size, not the stretched
/// result.
///
/// The parent chain is walked recursively with a visited list; a repeated id
/// fails with [`ScrimError::CyclicParent`] instead of exhausting the stack.
pub fn resolve_bounds(
    nodes: &[Node],
    canvas: Rect,
    id: NodeId,
    basis: PercentBasis,
) -> ScrimResult<Rect> {
    let mut visited = Vec::new();
    resolve_inner(nodes, canvas, id, basis, &mut visited)
}

fn resolve_inner(
    nodes: &[Node],
    canvas: Rect,
    id: NodeId,
    basis: PercentBasis,
    visited: &mut Vec<NodeId>,
) -> ScrimResult<Rect> {
    if visited.contains(&id) {
        return Err(ScrimError::CyclicParent(id.0));
    }
    visited.push(id);

    let node = nodes.get(id.0).ok_or_else(|| {
        // visited holds only `id` itself on the root call.
        if visited.len() == 1 {
            ScrimError::usage(format!("no node with id {}", id.0))
        } else {
            ScrimError::usage(format!("bounds parent {} is not a node", id.0))
        }
    })?;

    let parent = match node.bounds_parent {
        Some(parent_id) => resolve_inner(nodes, canvas, parent_id, basis, visited)?,
        None => canvas,
    };

    // Edge offsets in pixels. The reference dimension for percentages is the
    // parent's width for every edge, including top and bottom, unless the
    // stage opted into per-axis resolution.
    let vertical_ref = match basis {
        PercentBasis::ParentWidth => parent.width,
        PercentBasis::PerAxis => parent.height,
    };
    let left = node.offset.left.resolve(parent.width);
    let right = node.offset.right.resolve(parent.width);
    let top = node.offset.top.resolve(vertical_ref);
    let bottom = node.offset.bottom.resolve(vertical_ref);

    let (mut x, width) = if node.stretch.x {
        (parent.x + left, parent.width - left - right)
    } else {
        let x = match node.anchor.x {
            Anchor::Start => parent.x + node.position.x,
            Anchor::End => parent.x + parent.width - node.position.x,
            Anchor::Center => parent.x + parent.width * 0.5 + node.position.x,
        };
        (x, node.size.x)
    };

    let (mut y, height) = if node.stretch.y {
        (parent.y + top, parent.height - top - bottom)
    } else {
        let y = match node.anchor.y {
            Anchor::Start => parent.y + node.position.y,
            Anchor::End => parent.y + parent.height - node.position.y,
            Anchor::Center => parent.y + parent.height * 0.5 + node.position.y,
        };
        (y, node.size.y)
    };

    // Pivot offsets against the raw size field as last assigned, even on a
    // stretched axis.
    x -= node.size.x * node.pivot.x;
    y -= node.size.y * node.pivot.y;

    Ok(Rect::new(x, y, width, height))
}

/// The pivot point in canvas space: where draw-time rotation spins around.
/// Sits at `bounds.origin + pivot * raw_size`, i.e. the position the anchor
/// rules produced before the pivot subtraction.
pub fn pivot_point(node: &Node, bounds: Rect) -> Vec2 {
    Vec2::new(
        bounds.x + node.size.x * node.pivot.x,
        bounds.y + node.size.y * node.pivot.y,
    )
}
