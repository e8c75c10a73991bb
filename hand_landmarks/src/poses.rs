//! Canned synthetic hands.
//!
//! Used by the keyboard/mouse simulator in place of a tracking model, and by
//! tests that need a hand which is unambiguously open, pinching, or neither.
//! Every pose is anchored on its index fingertip so a pointer position maps
//! directly onto the drag point.

use crate::{index, Hand, Landmark, LANDMARK_COUNT};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPose {
    /// Loosely curled fingers; neither open nor pinching.
    Relaxed,
    /// Fingers spread wide.
    OpenPalm,
    /// Thumb tip touching index tip.
    Pinch,
}

/// Offsets (x, y) of the wrist and knuckle line, shared by all poses.
/// Image space: +y points down.
const PALM_OFFSETS: [(usize, (f32, f32)); 6] = [
    (index::WRIST,      ( 0.000,  0.10)),
    (index::THUMB_CMC,  (-0.050,  0.06)),
    (index::INDEX_MCP,  (-0.030, -0.02)),
    (index::MIDDLE_MCP, ( 0.000, -0.03)),
    (index::RING_MCP,   ( 0.030, -0.02)),
    (index::PINKY_MCP,  ( 0.055,  0.00)),
];

/// Fingertip offsets in order: thumb, index, middle, ring, pinky.
fn tip_offsets(pose: HandPose) -> [(f32, f32); 5] {
    match pose {
        HandPose::OpenPalm => [
            (-0.12, -0.02), (-0.05, -0.17), (0.00, -0.19), (0.05, -0.17), (0.09, -0.12),
        ],
        HandPose::Relaxed => [
            (-0.10,  0.05), (-0.03,  0.02), (0.00,  0.02), (0.03,  0.02), (0.05,  0.03),
        ],
        HandPose::Pinch => [
            (-0.03, -0.08), (-0.04, -0.08), (0.00,  0.00), (0.03,  0.01), (0.05,  0.02),
        ],
    }
}

/// Build a hand in `pose` whose index fingertip sits at (`index_x`, `index_y`)
/// with every landmark at depth `z`.
pub fn build_hand(pose: HandPose, index_x: f32, index_y: f32, z: f32) -> Hand {
    let tips = tip_offsets(pose);
    let ox = index_x - tips[1].0;
    let oy = index_y - tips[1].1;
    let at = |(dx, dy): (f32, f32)| Landmark::new(ox + dx, oy + dy, z);

    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    for &(i, off) in &PALM_OFFSETS {
        pts[i] = at(off);
    }

    // (base joint, tip joint) per digit; the two joints between are
    // interpolated along the straight line.
    let digits = [
        (index::THUMB_CMC,  index::THUMB_TIP),
        (index::INDEX_MCP,  index::INDEX_TIP),
        (index::MIDDLE_MCP, index::MIDDLE_TIP),
        (index::RING_MCP,   index::RING_TIP),
        (index::PINKY_MCP,  index::PINKY_TIP),
    ];
    for (d, &(base, tip)) in digits.iter().enumerate() {
        pts[tip] = at(tips[d]);
        let b = pts[base];
        let t = pts[tip];
        for (k, frac) in [(1, 1.0 / 3.0), (2, 2.0 / 3.0)] {
            pts[base + k] = Landmark::new(
                b.x + (t.x - b.x) * frac,
                b.y + (t.y - b.y) * frac,
                z,
            );
        }
    }

    Hand::new(pts)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
