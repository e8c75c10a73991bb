//! Software-rendered visualizer using `minifb`.
//!
//! Layout (mirrored like a selfie camera):
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ queue / entities / hold state                                │
//! │                                                              │
//! │        ◆ shapes spin        ┌────────┐                       │
//! │                             │  card  │   · · hand landmarks  │
//! │                             └────────┘                       │
//! │                                                   ┌────────┐ │
//! │                                                   │ DELETE │ │
//! │                                                   └────────┘ │
//! │ key legend                                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entities are projected through the same camera the controller uses for
//! the deletion-zone test, so what is drawn inside the zone is exactly what
//! gets deleted on release.

use std::collections::HashSet;
use std::sync::mpsc::Sender;

use hand_landmarks::{index, Frame, PerspectiveCamera, Timestamp, Viewport};
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};
use tracing::{trace, warn};

use crate::color::{blend, shade};
use crate::config::StageConfig;
use crate::gesture::{SimInput, SimSample};
use crate::registry::{CardFace, EntityId, EntityKind, ShapeGeometry};
use crate::scene::{Scene, SceneNode, ZoneLamp};

// ════════════════════════════════════════════════════════════════════════════
// Colors
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:        u32 = 0xFF1A1A2E;
const TEXT_BG:         u32 = 0xFF0F3460;
const ZONE_IDLE:       u32 = 0xFF555577;
const ZONE_ACTIVE:     u32 = 0xFFFF3030;
const HAND_DOT:        u32 = 0xFF66FFCC;
const HAND_TIP:        u32 = 0xFFFFFFFF;
const LEGEND_COLOR:    u32 = 0xFF888888;
const STATUS_COLOR:    u32 = 0xFFEEEEEE;
/// World-space edge length of a shape at scale 1.
const SHAPE_SIZE:      f32 = 1.0;
const STATUS_H:        usize = 28;

// ════════════════════════════════════════════════════════════════════════════
// Canvas — pixel buffer and drawing primitives
// ════════════════════════════════════════════════════════════════════════════

/// Packed-ARGB framebuffer with clipped drawing helpers.
pub struct Canvas {
    pub w:   usize,
    pub h:   usize,
    pub buf: Vec<u32>,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        Canvas { w, h, buf: vec![BG_COLOR; w * h] }
    }

    pub fn clear(&mut self, color: u32) {
        self.buf.fill(color);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.w && y < self.h).then(|| self.buf[y * self.w + x])
    }

    pub fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.buf[y as usize * self.w + x as usize] = color;
        }
    }

    pub fn fill_rect(&mut self, x: isize, y: isize, w: usize, h: usize, color: u32) {
        let x0 = (x.max(0) as usize).min(self.w);
        let y0 = (y.max(0) as usize).min(self.h);
        let x1 = ((x + w as isize).max(0) as usize).min(self.w);
        let y1 = ((y + h as isize).max(0) as usize).min(self.h);
        for row in y0..y1 {
            let base = row * self.w;
            self.buf[base + x0..base + x1.max(x0)].fill(color);
        }
    }

    pub fn draw_border(&mut self, x: isize, y: isize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 {
            return;
        }
        let (r, b) = (x + w as isize - 1, y + h as isize - 1);
        for col in x..=r {
            self.set_pixel(col, y, color);
            self.set_pixel(col, b, color);
        }
        for row in y..=b {
            self.set_pixel(x, row, color);
            self.set_pixel(r, row, color);
        }
    }

    pub fn fill_circle(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Isosceles triangle pointing up, apex at (cx, top).
    pub fn fill_triangle(&mut self, cx: isize, top: isize, half_w: isize, h: isize, color: u32) {
        for row in 0..h.max(1) {
            let span = half_w * row / h.max(1);
            for dx in -span..=span {
                self.set_pixel(cx + dx, top + row, color);
            }
        }
    }

    /// Nearest-neighbour blit of `src` (w×h) into the destination rect.
    pub fn blit_scaled(&mut self, src: &[u32], sw: usize, sh: usize, x: isize, y: isize, dw: usize, dh: usize) {
        if sw == 0 || sh == 0 || dw == 0 || dh == 0 {
            return;
        }
        for row in 0..dh {
            let sy = row * sh / dh;
            for col in 0..dw {
                let sx = col * sw / dw;
                let p = src[sy * sw + sx];
                if p >> 24 != 0 {
                    self.set_pixel(x + col as isize, y + row as isize, 0xFF000000 | p);
                }
            }
        }
    }

    /// 3×5 bitmap text, each font pixel drawn as a `scale`×`scale` block.
    pub fn draw_label(&mut self, text: &str, x: isize, y: isize, color: u32, scale: usize) {
        let s = scale.max(1) as isize;
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3isize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * s, y + row as isize * s, s as usize, s as usize, color);
                    }
                }
            }
            cx += 4 * s;
            if cx >= self.w as isize {
                break;
            }
        }
    }
}

/// Pixel width of `text` drawn by [`Canvas::draw_label`].
pub fn label_width(text: &str, scale: usize) -> usize {
    text.chars().count() * 4 * scale.max(1)
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b111, 0b001, 0b011, 0b000, 0b010],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '^' => [0b010, 0b101, 0b000, 0b000, 0b000],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Projection helpers
// ════════════════════════════════════════════════════════════════════════════

/// Screen pixels covered by one world unit on the `z = 0` plane.
pub fn pixels_per_unit(camera: &PerspectiveCamera, viewport: &Viewport) -> f32 {
    let f = 1.0 / (camera.fov_y_deg.to_radians() * 0.5).tan();
    f / camera.distance * viewport.height * 0.5
}

/// Window pixel → normalized landmark coordinates (undoing the mirror).
pub fn pointer_to_normalized(mx: f32, my: f32, w: f32, h: f32) -> Option<(f32, f32)> {
    if mx < 0.0 || my < 0.0 || mx >= w || my >= h {
        return None;
    }
    Some((1.0 - mx / w, my / h))
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

/// One-shot requests from the window that are not hand gestures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostAction {
    /// Spawn a shape under the pointer (normalized coordinates).
    SpawnShape(f32, f32),
    EnqueueDemo,
    Quit,
}

/// What the status bar shows.
pub struct StatusLine<'a> {
    pub text:    &'a str,
    pub queued:  usize,
}

pub struct Visualizer {
    window:      Window,
    canvas:      Canvas,
    sim_tx:      Sender<SimInput>,
    second_hand: bool,
    camera:      PerspectiveCamera,
    viewport:    Viewport,
    zone:        hand_landmarks::DeletionZone,
    /// Cards whose undrawable media has already been reported.
    media_warned: HashSet<EntityId>,
}

impl Visualizer {
    pub fn new(config: &StageConfig, sim_tx: Sender<SimInput>) -> Result<Self, minifb::Error> {
        let (w, h) = (config.viewport.width as usize, config.viewport.height as usize);
        let mut window = Window::new(
            "Palm Stage - hand gesture simulator",
            w, h,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            canvas: Canvas::new(w, h),
            sim_tx,
            second_hand: false,
            camera: config.camera,
            viewport: config.viewport,
            zone: config.zone,
            media_warned: HashSet::new(),
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Sample mouse and keys, forward a hand sample to the simulator and
    /// return any one-shot actions.
    pub fn poll_input(&mut self, now: Timestamp) -> Vec<HostAction> {
        let mut actions = Vec::new();
        if !self.window.is_open() || self.window.is_key_pressed(Key::Q, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::Quit);
            actions.push(HostAction::Quit);
            return actions;
        }

        let (w, h) = (self.canvas.w as f32, self.canvas.h as f32);
        let pointer = self
            .window
            .get_mouse_pos(MouseMode::Discard)
            .and_then(|(mx, my)| pointer_to_normalized(mx, my, w, h));

        if self.window.is_key_pressed(Key::H, KeyRepeat::No) {
            self.second_hand = !self.second_hand;
        }
        if self.window.is_key_pressed(Key::M, KeyRepeat::No) {
            actions.push(HostAction::EnqueueDemo);
        }
        if let Some((x, y)) = pointer {
            if self.window.is_key_pressed(Key::N, KeyRepeat::No) {
                actions.push(HostAction::SpawnShape(x, y));
            }
        }

        let sample = SimSample {
            pointer,
            pinch:          self.window.is_key_down(Key::P),
            open_palm:      self.window.is_key_down(Key::O),
            second_hand:    self.second_hand,
            two_hand_pinch: self.window.is_key_down(Key::Key2),
            timestamp_ms:   now,
        };
        let _ = self.sim_tx.send(SimInput::Sample(sample));
        actions
    }

    /// Render one frame.
    pub fn render(&mut self, scene: &Scene, lamp: &ZoneLamp, hands: Option<&Frame>, status: &StatusLine<'_>) {
        let c = &mut self.canvas;
        c.clear(BG_COLOR);

        // ── Deletion zone ─────────────────────────────────────────────────
        let r = self.zone.rect(&self.viewport);
        let (zx, zy) = (r.left as isize, r.top as isize);
        let (zw, zh) = (r.width() as usize + 1, r.height() as usize + 1);
        if lamp.active {
            c.fill_rect(zx, zy, zw, zh, blend(BG_COLOR, ZONE_ACTIVE, 0.35));
            c.draw_border(zx, zy, zw, zh, ZONE_ACTIVE);
        } else {
            c.draw_border(zx, zy, zw, zh, ZONE_IDLE);
        }
        let label_x = zx + (zw as isize - label_width("DELETE", 2) as isize) / 2;
        c.draw_label("DELETE", label_x, zy + zh as isize / 2 - 5, if lamp.active { ZONE_ACTIVE } else { ZONE_IDLE }, 2);

        // ── Entities ──────────────────────────────────────────────────────
        let ppu = pixels_per_unit(&self.camera, &self.viewport);
        let warned = &mut self.media_warned;
        warned.retain(|id| scene.node_for(*id).is_some());
        for node in scene.nodes() {
            let Some((sx, sy)) = self.camera.to_mirrored_screen(node.position, &self.viewport) else {
                continue;
            };
            match &node.kind {
                EntityKind::Shape(_) => draw_shape(c, node, sx, sy, ppu),
                EntityKind::MessageCard(_) => draw_card(c, node, sx, sy, ppu, scene.now(), warned),
            }
        }

        // ── Hands ─────────────────────────────────────────────────────────
        if let Some(frame) = hands {
            for hand in &frame.hands {
                for (i, lm) in hand.landmarks().iter().enumerate() {
                    let x = ((1.0 - lm.x) * c.w as f32) as isize;
                    let y = (lm.y * c.h as f32) as isize;
                    let (color, r) = if i == index::INDEX_TIP { (HAND_TIP, 4) } else { (HAND_DOT, 2) };
                    c.fill_circle(x, y, r, color);
                }
            }
        }

        // ── Status bar ────────────────────────────────────────────────────
        c.fill_rect(0, 0, c.w, STATUS_H, TEXT_BG);
        let line = format!("queue {}  {}", status.queued, status.text);
        c.draw_label(&line, 10, 7, STATUS_COLOR, 3);

        // ── Key legend ────────────────────────────────────────────────────
        c.draw_label(
            "P=pinch  O=open palm  H=second hand  2=two-hand pinch  N=shape  M=message  Q=quit",
            10, c.h as isize - 16, LEGEND_COLOR, 2,
        );

        self.window.update_with_buffer(&c.buf, c.w, c.h).ok();
    }
}

// ── Entity painters ───────────────────────────────────────────────────────

fn draw_shape(c: &mut Canvas, node: &SceneNode, sx: f32, sy: f32, ppu: f32) {
    let EntityKind::Shape(shape) = &node.kind else { return };
    let half = (SHAPE_SIZE * ppu * node.animated.scale * 0.5) as isize;
    let (cx, cy) = (sx as isize, sy as isize);
    // Fake lighting from the spin angle.
    let k = 0.65 + 0.35 * node.rotation[0].cos();
    let fill = shade(shape.color.to_argb(), k);
    match shape.geometry {
        ShapeGeometry::Box      => c.fill_rect(cx - half, cy - half, 2 * half as usize, 2 * half as usize, fill),
        ShapeGeometry::Sphere   => c.fill_circle(cx, cy, half, fill),
        ShapeGeometry::Cone     => c.fill_triangle(cx, cy - half, half, 2 * half, fill),
        ShapeGeometry::Cylinder => c.fill_rect(cx - half * 2 / 3, cy - half, (half * 4 / 3) as usize, 2 * half as usize, fill),
    }
    draw_outline(c, node, cx - half, cy - half, 2 * half as usize, 2 * half as usize);
}

/// True the first time `id` is reported; later reports for it are quiet.
fn first_media_failure(warned: &mut HashSet<EntityId>, id: EntityId) -> bool {
    warned.insert(id)
}

fn draw_card(
    c: &mut Canvas,
    node: &SceneNode,
    sx: f32,
    sy: f32,
    ppu: f32,
    now: Timestamp,
    warned: &mut HashSet<EntityId>,
) {
    let EntityKind::MessageCard(card) = &node.kind else { return };
    let s = node.animated.scale;
    let w = (card.size[0] * ppu * s) as usize;
    let h = (card.size[1] * ppu * s) as usize;
    let (x, y) = (sx as isize - w as isize / 2, sy as isize - h as isize / 2);
    let face_color = card.color.to_argb();
    c.fill_rect(x, y, w, h, shade(face_color, 0.35));

    match card.face(node.animated.reveal) {
        CardFace::Blank => {}
        CardFace::Media(media) => match media.frame_at(now.saturating_sub(card.created_at)) {
            Ok(frame) => {
                let inset = 6;
                c.blit_scaled(
                    frame.pixels,
                    frame.width as usize,
                    frame.height as usize,
                    x + inset,
                    y + inset,
                    w.saturating_sub(2 * inset as usize),
                    h.saturating_sub(2 * inset as usize),
                );
            }
            Err(err) if first_media_failure(warned, node.entity) => {
                warn!(entity = %node.entity, %err, "card media not drawable")
            }
            Err(err) => trace!(entity = %node.entity, %err, "card media still not drawable"),
        },
        CardFace::Text(text) => {
            let alpha = node.animated.text_alpha;
            let scale = if label_width(text, 3) + 12 <= w { 3 } else { 2 };
            let tw = label_width(text, scale) as isize;
            let color = blend(shade(face_color, 0.35), face_color, alpha);
            c.draw_label(text, x + (w as isize - tw) / 2, y + h as isize / 2 - 2 * scale as isize, color, scale);
        }
    }
    draw_outline(c, node, x, y, w, h);
}

fn draw_outline(c: &mut Canvas, node: &SceneNode, x: isize, y: isize, w: usize, h: usize) {
    let color = node.outline.to_argb();
    c.draw_border(x, y, w, h, color);
    if node.selected {
        c.draw_border(x - 2, y - 2, w + 4, h + 4, color);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_clips_at_edges() {
        let mut c = Canvas::new(4, 4);
        c.fill_rect(-2, -2, 4, 4, 0xFF123456);
        assert_eq!(c.pixel(0, 0), Some(0xFF123456));
        assert_eq!(c.pixel(1, 1), Some(0xFF123456));
        assert_eq!(c.pixel(2, 2), Some(BG_COLOR));
        c.fill_rect(3, 3, 10, 10, 0xFF000001);
        assert_eq!(c.pixel(3, 3), Some(0xFF000001));
    }

    #[test]
    fn fill_rect_fully_offscreen_is_noop() {
        let mut c = Canvas::new(4, 4);
        c.fill_rect(10, 10, 5, 5, 0xFF000000);
        c.fill_rect(-10, 0, 5, 5, 0xFF000000);
        assert!(c.buf.iter().all(|&p| p == BG_COLOR));
    }

    #[test]
    fn border_leaves_interior() {
        let mut c = Canvas::new(5, 5);
        c.draw_border(0, 0, 5, 5, 0xFFFFFFFF);
        assert_eq!(c.pixel(0, 4), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(4, 0), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(2, 2), Some(BG_COLOR));
    }

    #[test]
    fn label_draws_scaled_glyphs() {
        let mut c = Canvas::new(16, 12);
        c.draw_label("1", 0, 0, 0xFFFFFFFF, 2);
        // Top row of '1' is 0b010: middle column lit, 2×2 block.
        assert_eq!(c.pixel(2, 0), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(3, 1), Some(0xFFFFFFFF));
        assert_eq!(c.pixel(0, 0), Some(BG_COLOR));
        assert_eq!(label_width("abc", 2), 24);
    }

    #[test]
    fn media_failure_reported_once_per_entity() {
        let mut warned = HashSet::new();
        assert!(first_media_failure(&mut warned, EntityId(1)));
        assert!(!first_media_failure(&mut warned, EntityId(1)));
        assert!(!first_media_failure(&mut warned, EntityId(1)));
        assert!(first_media_failure(&mut warned, EntityId(2)));
    }

    #[test]
    fn blit_scales_nearest() {
        let mut c = Canvas::new(4, 2);
        c.blit_scaled(&[0xFFFF0000, 0xFF0000FF], 2, 1, 0, 0, 4, 2);
        assert_eq!(c.pixel(1, 1), Some(0xFFFF0000));
        assert_eq!(c.pixel(2, 0), Some(0xFF0000FF));
    }

    #[test]
    fn transparent_pixels_are_skipped() {
        let mut c = Canvas::new(1, 1);
        c.blit_scaled(&[0x00FF0000], 1, 1, 0, 0, 1, 1);
        assert_eq!(c.pixel(0, 0), Some(BG_COLOR));
    }

    #[test]
    fn pointer_mapping_undoes_mirror() {
        assert_eq!(pointer_to_normalized(0.0, 0.0, 100.0, 50.0), Some((1.0, 0.0)));
        assert_eq!(pointer_to_normalized(50.0, 25.0, 100.0, 50.0), Some((0.5, 0.5)));
        assert_eq!(pointer_to_normalized(100.0, 10.0, 100.0, 50.0), None);
    }

    #[test]
    fn world_unit_scale_matches_projection() {
        let cam = PerspectiveCamera::default();
        let vp = Viewport::default();
        let (_, y0) = cam.to_mirrored_screen(hand_landmarks::Vec3::ZERO, &vp).unwrap();
        let (_, y1) = cam.to_mirrored_screen(hand_landmarks::Vec3::new(0.0, 1.0, 0.0), &vp).unwrap();
        assert!(((y0 - y1) - pixels_per_unit(&cam, &vp)).abs() < 1e-3);
    }
}
