//! Colors: CSS hex parsing, the neon shape palette, outline states, and
//! packed-ARGB helpers for the framebuffer.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFFFFFF);
    pub const BLACK: Rgb = Rgb(0x000000);

    /// Parse `#rgb` or `#rrggbb` (leading `#` optional).
    pub fn parse_hex(s: &str) -> Option<Rgb> {
        let hex = s.trim().trim_start_matches('#');
        match hex.len() {
            6 => u32::from_str_radix(hex, 16).ok().map(Rgb),
            3 => {
                let v = u32::from_str_radix(hex, 16).ok()?;
                let (r, g, b) = ((v >> 8) & 0xF, (v >> 4) & 0xF, v & 0xF);
                Some(Rgb((r * 0x11) << 16 | (g * 0x11) << 8 | (b * 0x11)))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:06x}", self.0 & 0xFFFFFF)
    }

    /// Packed 0xAARRGGBB, fully opaque.
    pub fn to_argb(self) -> u32 {
        0xFF000000 | (self.0 & 0xFFFFFF)
    }
}

/// Cycled through in order as shapes are spawned.
pub const NEON_PALETTE: [Rgb; 8] = [
    Rgb(0xFF00FF), Rgb(0x00FFFF), Rgb(0xFF3300), Rgb(0x39FF14),
    Rgb(0xFF0099), Rgb(0x00FF00), Rgb(0xFF6600), Rgb(0xFFFF00),
];

/// Wireframe outline of an entity at rest.
pub const OUTLINE_IDLE: Rgb = Rgb::WHITE;
/// Wireframe outline while the dragged entity hovers over the deletion zone.
pub const OUTLINE_DANGER: Rgb = Rgb(0xFF0000);

/// Default card face when a message has no color.
pub const DEFAULT_CARD_COLOR: Rgb = Rgb(0xFF6B6B);
/// Color preselected in the composer.
pub const DEFAULT_COMPOSE_COLOR: Rgb = Rgb(0x88D8C0);

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb)
}

/// Scale the brightness of an ARGB color; used for depth/rotation shading.
pub fn shade(c: u32, k: f32) -> u32 {
    blend(0xFF000000, c, k)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
