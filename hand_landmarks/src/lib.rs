//! # hand_landmarks
//!
//! Per-frame hand geometry for gesture-driven scenes.
//!
//! A tracking model reports each detected hand as 21 landmarks in
//! normalized image space (`x`, `y` in `[0, 1]`, `z` a relative depth where
//! smaller is closer to the camera).  This crate owns that data model and
//! the stateless questions asked of it every frame:
//!
//! | Predicate | Test |
//! |---|---|
//! | [`is_pinch`] | thumb tip ↔ index tip, 3D distance `< 0.06` |
//! | [`is_open_palm_facing_camera`] | mean 2D fingertip spread from palm center `> 0.14` |
//! | [`are_index_fingers_close`] | index tip ↔ index tip, 2D distance `< 0.12` |
//! | [`project_to_zone`] | world point lands in the mirrored bottom-right screen rectangle |
//!
//! plus the fixed normalized→world mapping [`map_normalized_to_world`].
//!
//! ## Quick start
//!
//! ```rust
//! use hand_landmarks::{poses::{HandPose, build_hand}, is_pinch, is_open_palm_facing_camera};
//!
//! let open = build_hand(HandPose::OpenPalm, 0.5, 0.4, 0.0);
//! assert!(is_open_palm_facing_camera(&open));
//! assert!(!is_pinch(&open));
//! ```

use serde::{Deserialize, Serialize};

pub mod predicates;
pub mod projection;
pub mod poses;

pub use predicates::{
    are_index_fingers_close, is_open_palm_facing_camera, is_pinch, palm_center,
    INDEX_CLOSE_THRESHOLD, OPEN_PALM_THRESHOLD, PINCH_THRESHOLD,
};
pub use projection::{
    map_normalized_to_world, project_to_zone, DeletionZone, PerspectiveCamera, ScreenRect, Vec3,
    Viewport, WORLD_SPAN,
};

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (MediaPipe hand model convention)
// ════════════════════════════════════════════════════════════════════════════

/// Anatomical landmark indices.
pub mod index {
    pub const WRIST:       usize = 0;
    pub const THUMB_CMC:   usize = 1;
    pub const THUMB_MCP:   usize = 2;
    pub const THUMB_IP:    usize = 3;
    pub const THUMB_TIP:   usize = 4;
    pub const INDEX_MCP:   usize = 5;
    pub const INDEX_TIP:   usize = 8;
    pub const MIDDLE_MCP:  usize = 9;
    pub const MIDDLE_TIP:  usize = 12;
    pub const RING_MCP:    usize = 13;
    pub const RING_TIP:    usize = 16;
    pub const PINKY_MCP:   usize = 17;
    pub const PINKY_TIP:   usize = 20;

    /// Wrist plus the five knuckle-line joints; their mean is the palm center.
    pub const PALM: [usize; 6] = [WRIST, THUMB_CMC, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

    /// The four non-thumb fingertips.
    pub const FINGERTIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];
}

/// Landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Hands the tracking model reports at most per frame.
pub const MAX_HANDS: usize = 2;

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// Contract violations in tracking input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LandmarkError {
    #[error("hand has {0} landmarks, expected {LANDMARK_COUNT}")]
    WrongCount(usize),
    #[error("frame has {0} hands, at most {MAX_HANDS} are tracked")]
    TooManyHands(usize),
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark / Hand / Frame
// ════════════════════════════════════════════════════════════════════════════

/// One tracked point in normalized image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth; smaller values are closer to the camera.
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Euclidean distance including depth.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance in the image plane only.
    pub fn distance_2d(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The full 21-landmark skeleton of one hand in one frame.
///
/// The fixed-size array makes a malformed hand unrepresentable; slices from
/// an external tracker go through [`Hand::from_slice`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    landmarks: [Landmark; LANDMARK_COUNT],
}

impl Hand {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Hand { landmarks }
    }

    pub fn from_slice(points: &[Landmark]) -> Result<Self, LandmarkError> {
        let landmarks: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::WrongCount(points.len()))?;
        Ok(Hand { landmarks })
    }

    pub fn landmark(&self, idx: usize) -> &Landmark {
        &self.landmarks[idx]
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }

    pub fn wrist(&self)     -> &Landmark { &self.landmarks[index::WRIST] }
    pub fn thumb_tip(&self) -> &Landmark { &self.landmarks[index::THUMB_TIP] }
    pub fn index_tip(&self) -> &Landmark { &self.landmarks[index::INDEX_TIP] }
}

/// Milliseconds on the tracking clock.
pub type Timestamp = u64;

/// The complete tracking result for one video frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub timestamp_ms: Timestamp,
    pub hands: Vec<Hand>,
}

impl Frame {
    pub fn new(timestamp_ms: Timestamp, hands: Vec<Hand>) -> Result<Self, LandmarkError> {
        if hands.len() > MAX_HANDS {
            return Err(LandmarkError::TooManyHands(hands.len()));
        }
        Ok(Frame { timestamp_ms, hands })
    }

    /// A frame in which the tracker found nothing.
    pub fn empty(timestamp_ms: Timestamp) -> Self {
        Frame { timestamp_ms, hands: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    /// The hand whose index fingertip is closest to the camera.
    ///
    /// Used as the "primary" hand for single-hand gestures.  On equal depth
    /// the earlier hand wins.
    pub fn primary_hand(&self) -> Option<&Hand> {
        self.hands.iter().reduce(|best, cur| {
            if cur.index_tip().z < best.index_tip().z { cur } else { best }
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poses::{build_hand, HandPose};

    #[test]
    fn from_slice_rejects_wrong_count() {
        let pts = vec![Landmark::default(); 20];
        assert_eq!(Hand::from_slice(&pts), Err(LandmarkError::WrongCount(20)));
    }

    #[test]
    fn from_slice_accepts_21() {
        let pts: Vec<Landmark> = (0..21).map(|i| Landmark::new(i as f32, 0.0, 0.0)).collect();
        let hand = Hand::from_slice(&pts).unwrap();
        assert_eq!(hand.index_tip().x, 8.0);
        assert_eq!(hand.thumb_tip().x, 4.0);
    }

    #[test]
    fn frame_rejects_three_hands() {
        let h = build_hand(HandPose::Relaxed, 0.5, 0.5, 0.0);
        let err = Frame::new(0, vec![h.clone(), h.clone(), h]).unwrap_err();
        assert_eq!(err, LandmarkError::TooManyHands(3));
    }

    #[test]
    fn primary_hand_is_closest_index_tip() {
        let far  = build_hand(HandPose::Relaxed, 0.3, 0.5, 0.2);
        let near = build_hand(HandPose::Relaxed, 0.7, 0.5, -0.1);
        let frame = Frame::new(0, vec![far, near.clone()]).unwrap();
        assert_eq!(frame.primary_hand(), Some(&near));
    }

    #[test]
    fn primary_hand_tie_keeps_first() {
        let a = build_hand(HandPose::Relaxed, 0.3, 0.5, 0.0);
        let b = build_hand(HandPose::Relaxed, 0.7, 0.5, 0.0);
        let frame = Frame::new(0, vec![a.clone(), b]).unwrap();
        assert_eq!(frame.primary_hand(), Some(&a));
    }

    #[test]
    fn empty_frame_has_no_primary() {
        assert!(Frame::empty(10).primary_hand().is_none());
    }

    #[test]
    fn landmark_distances() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.3, 0.4, 1.2);
        assert!((a.distance_2d(&b) - 0.5).abs() < 1e-6);
        assert!((a.distance(&b) - 1.3).abs() < 1e-6);
    }
}
