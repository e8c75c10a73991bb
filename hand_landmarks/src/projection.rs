//! World ↔ screen mapping.
//!
//! Normalized image coordinates map onto a fixed world plane at `z = 0`;
//! world points map back onto the screen through a perspective camera on
//! the +z axis looking toward the origin.  The screen is mirrored
//! horizontally to match a selfie-style video feed.

use serde::{Deserialize, Serialize};

/// Width and height, in world units, that the normalized image spans.
pub const WORLD_SPAN: f32 = 10.0;

// ════════════════════════════════════════════════════════════════════════════
// Vec3
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// `x = (nx − 0.5)·10`, `y = (0.5 − ny)·10`, `z = 0`.
pub fn map_normalized_to_world(norm_x: f32, norm_y: f32) -> Vec3 {
    Vec3::new(
        (norm_x - 0.5) * WORLD_SPAN,
        (0.5 - norm_y) * WORLD_SPAN,
        0.0,
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Viewport / camera
// ════════════════════════════════════════════════════════════════════════════

/// Screen size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width:  f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Viewport { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { width: 1280.0, height: 720.0 }
    }
}

/// Perspective camera at (0, 0, `distance`) looking down −z with +y up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub distance:  f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        PerspectiveCamera { fov_y_deg: 75.0, distance: 5.0 }
    }
}

impl PerspectiveCamera {
    /// Normalized device coordinates of `p`, or `None` when `p` is at or
    /// behind the camera plane.
    pub fn project(&self, p: Vec3, aspect: f32) -> Option<(f32, f32)> {
        let depth = self.distance - p.z;
        if depth <= f32::EPSILON {
            return None;
        }
        let f = 1.0 / (self.fov_y_deg.to_radians() * 0.5).tan();
        Some((f / aspect * p.x / depth, f * p.y / depth))
    }

    /// Pixel position of `p` with the horizontal axis mirrored.
    pub fn to_mirrored_screen(&self, p: Vec3, viewport: &Viewport) -> Option<(f32, f32)> {
        let (nx, ny) = self.project(p, viewport.aspect())?;
        let sx = (nx + 1.0) * 0.5 * viewport.width;
        let sy = (1.0 - ny) * 0.5 * viewport.height;
        Some((viewport.width - sx, sy))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Deletion zone
// ════════════════════════════════════════════════════════════════════════════

/// Axis-aligned pixel rectangle; edges are inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    pub left:   f32,
    pub top:    f32,
    pub right:  f32,
    pub bottom: f32,
}

impl ScreenRect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    pub fn width(&self)  -> f32 { self.right - self.left }
    pub fn height(&self) -> f32 { self.bottom - self.top }
}

/// Fixed-size rectangle anchored to the bottom-right corner of the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletionZone {
    pub margin_right:  f32,
    pub margin_bottom: f32,
    pub width:         f32,
    pub height:        f32,
}

impl Default for DeletionZone {
    fn default() -> Self {
        DeletionZone { margin_right: 60.0, margin_bottom: 60.0, width: 160.0, height: 160.0 }
    }
}

impl DeletionZone {
    pub fn rect(&self, viewport: &Viewport) -> ScreenRect {
        let left = viewport.width - self.margin_right - self.width;
        let top  = viewport.height - self.margin_bottom - self.height;
        ScreenRect { left, top, right: left + self.width, bottom: top + self.height }
    }
}

/// True when world point `position` is drawn inside the deletion zone.
pub fn project_to_zone(
    position: Vec3,
    camera:   &PerspectiveCamera,
    viewport: &Viewport,
    zone:     &DeletionZone,
) -> bool {
    match camera.to_mirrored_screen(position, viewport) {
        Some((x, y)) => zone.rect(viewport).contains(x, y),
        None => false,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
