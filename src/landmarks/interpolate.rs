//! Blending between neighbouring landmark frames.

use super::frame::{LandmarkFrame, LandmarkSet};
use super::ids::LandmarkId;

/// Blend two frames at fraction `alpha` (0 = `a`, 1 = `b`).
///
/// Each sub-set is blended independently over the union of observed ids.
/// Ids observed in only one frame pass through unchanged.
pub fn blend(a: &LandmarkFrame, b: &LandmarkFrame, alpha: f32) -> LandmarkFrame {
    LandmarkFrame {
        left_hand: blend_optional(a.left_hand.as_ref(), b.left_hand.as_ref(), alpha),
        right_hand: blend_optional(a.right_hand.as_ref(), b.right_hand.as_ref(), alpha),
        pose: blend_optional(a.pose.as_ref(), b.pose.as_ref(), alpha),
    }
}

fn blend_optional<I: LandmarkId>(
    a: Option<&LandmarkSet<I>>,
    b: Option<&LandmarkSet<I>>,
    alpha: f32,
) -> Option<LandmarkSet<I>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(blend_sets(a, b, alpha)),
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (None, None) => None,
    }
}

/// Union blend of two landmark sets.
pub fn blend_sets<I: LandmarkId>(a: &LandmarkSet<I>, b: &LandmarkSet<I>, alpha: f32) -> LandmarkSet<I> {
    let mut out = LandmarkSet::new();
    for &id in I::ALL {
        let point = match (a.get(id), b.get(id)) {
            (Some(pa), Some(pb)) => pa.lerp(pb, alpha),
            (Some(p), None) | (None, Some(p)) => *p,
            (None, None) => continue,
        };
        out.set(id, point);
    }
    out
}
