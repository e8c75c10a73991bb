//! Prints every predicate for the canned poses at a few screen positions.

use hand_landmarks::poses::{build_hand, HandPose};
use hand_landmarks::predicates::fingertip_spread;
use hand_landmarks::{
    are_index_fingers_close, is_open_palm_facing_camera, is_pinch, map_normalized_to_world,
    palm_center, project_to_zone, DeletionZone, PerspectiveCamera, Viewport,
};

fn main() {
    println!("\n=== Hand landmark predicate demo ===\n");

    let camera   = PerspectiveCamera::default();
    let viewport = Viewport::default();
    let zone     = DeletionZone::default();

    // ── 1. Per-pose predicates ────────────────────────────────────────────
    println!("1. Poses at image center");
    for pose in [HandPose::Relaxed, HandPose::OpenPalm, HandPose::Pinch] {
        let h = build_hand(pose, 0.5, 0.5, 0.0);
        let c = palm_center(&h);
        println!(
            "   {:<10} pinch={:<5} open={:<5} spread={:.3}  palm=({:.3}, {:.3})",
            format!("{:?}", pose), is_pinch(&h), is_open_palm_facing_camera(&h),
            fingertip_spread(&h), c.x, c.y,
        );
    }
    println!();

    // ── 2. Two hands ──────────────────────────────────────────────────────
    println!("2. Index fingertips touching");
    let l = build_hand(HandPose::Pinch, 0.46, 0.5, 0.0);
    let r = build_hand(HandPose::Pinch, 0.54, 0.5, 0.0);
    println!("   0.08 apart → close={}", are_index_fingers_close(&l, &r));
    let r = build_hand(HandPose::Pinch, 0.70, 0.5, 0.0);
    println!("   0.24 apart → close={}", are_index_fingers_close(&l, &r));
    println!();

    // ── 3. Deletion zone sweep ────────────────────────────────────────────
    println!("3. Deletion zone (mirrored bottom-right)");
    for (nx, ny) in [(0.5, 0.5), (0.02, 0.75), (0.98, 0.75), (0.02, 0.2)] {
        let w = map_normalized_to_world(nx, ny);
        let screen = camera.to_mirrored_screen(w, &viewport);
        println!(
            "   norm=({:.2}, {:.2}) world=({:+.2}, {:+.2}) screen={:?} in_zone={}",
            nx, ny, w.x, w.y, screen.map(|(x, y)| (x as i32, y as i32)),
            project_to_zone(w, &camera, &viewport, &zone),
        );
    }
    println!();
}
