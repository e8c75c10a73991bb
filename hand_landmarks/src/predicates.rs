//! Stateless per-frame gesture tests.
//!
//! Every threshold is in normalized image units.  All comparisons are
//! strict, so a value sitting exactly on a threshold does not trigger.

use crate::{index, Hand, Landmark};

/// Thumb tip ↔ index tip 3D distance below which a hand is pinching.
pub const PINCH_THRESHOLD: f32 = 0.06;

/// Mean fingertip spread above which a palm counts as open.
pub const OPEN_PALM_THRESHOLD: f32 = 0.14;

/// Index tip ↔ index tip 2D distance below which two hands touch.
pub const INDEX_CLOSE_THRESHOLD: f32 = 0.12;

pub fn is_pinch(hand: &Hand) -> bool {
    is_pinch_with(hand, PINCH_THRESHOLD)
}

pub fn is_pinch_with(hand: &Hand, threshold: f32) -> bool {
    hand.thumb_tip().distance(hand.index_tip()) < threshold
}

/// Mean of the wrist and the five knuckle-line joints (all three axes).
pub fn palm_center(hand: &Hand) -> Landmark {
    let n = index::PALM.len() as f32;
    let (sx, sy, sz) = index::PALM.iter()
        .map(|&i| hand.landmark(i))
        .fold((0.0, 0.0, 0.0), |(x, y, z), p| (x + p.x, y + p.y, z + p.z));
    Landmark::new(sx / n, sy / n, sz / n)
}

/// Mean image-plane distance of the four non-thumb fingertips from the
/// palm center.
pub fn fingertip_spread(hand: &Hand) -> f32 {
    let center = palm_center(hand);
    let total: f32 = index::FINGERTIPS.iter()
        .map(|&i| hand.landmark(i).distance_2d(&center))
        .sum();
    total / index::FINGERTIPS.len() as f32
}

/// Openness test.  Depth and palm orientation are ignored, so despite the
/// name a back-of-hand spread also passes; tracker depth is too noisy
/// across devices to gate on.
pub fn is_open_palm_facing_camera(hand: &Hand) -> bool {
    is_open_palm_with(hand, OPEN_PALM_THRESHOLD)
}

pub fn is_open_palm_with(hand: &Hand, threshold: f32) -> bool {
    fingertip_spread(hand) > threshold
}

pub fn are_index_fingers_close(a: &Hand, b: &Hand) -> bool {
    are_index_fingers_close_with(a, b, INDEX_CLOSE_THRESHOLD)
}

pub fn are_index_fingers_close_with(a: &Hand, b: &Hand, threshold: f32) -> bool {
    a.index_tip().distance_2d(b.index_tip()) < threshold
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
