//! Per-frame interaction state machine.
//!
//! [`InteractionController::process_frame`] is the only entry point that
//! mutates gesture state.  Each call runs, in order:
//!
//! 1. palm-open broadcast to every card,
//! 2. the two-hand pinch early-out,
//! 3. the palm-hold debouncer on the closest hand,
//! 4. pinch-drag per hand (or a release when no hand is visible),
//! 5. the deletion-zone affordance, last write wins.
//!
//! The result is a batch of [`Command`]s for the render layer.  Outline,
//! zone and palm-open commands are only emitted when the value changes.

use hand_landmarks::predicates::{are_index_fingers_close_with, is_open_palm_with, is_pinch_with};
use hand_landmarks::{map_normalized_to_world, palm_center, project_to_zone, Frame, Hand, Timestamp, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::animation::Animation;
use crate::color::{Rgb, OUTLINE_DANGER, OUTLINE_IDLE};
use crate::command::Command;
use crate::config::StageConfig;
use crate::debounce::{HoldOutcome, PalmHold};
use crate::queue::{MessageQueue, QueueItem};
use crate::registry::{CardData, EntityId, EntityKind, Registry, ShapeData, ShapeGeometry};

/// Reserved two-hand gesture, reported but not acted on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwoHandPinch {
    /// World position midway between the two index tips.
    pub center: Vec3,
    /// 2D distance between the index tips, normalized units.
    pub span:          f32,
    /// Index tips within the `index_close` threshold.
    pub indexes_close: bool,
}

#[derive(Clone, Debug)]
pub struct InteractionState {
    pub palm_hold:      PalmHold,
    pub last_hold:      HoldOutcome,
    pub zone_active:    bool,
    /// Entity currently drawn with the danger outline.
    pub highlighted:    Option<EntityId>,
    /// Last broadcast palm-open value.
    pub palm_open:      bool,
    pub two_hand_pinch: Option<TwoHandPinch>,
}

pub struct InteractionController {
    config:        StageConfig,
    registry:      Registry,
    queue:         MessageQueue,
    state:         InteractionState,
    palette_index: usize,
    rng:           StdRng,
}

impl InteractionController {
    pub fn new(config: StageConfig) -> Self {
        let rng = match config.shapes.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = InteractionState {
            palm_hold:      PalmHold::new(config.timing.palm_hold_ms, config.timing.palm_cooldown_ms),
            last_hold:      HoldOutcome::Idle,
            zone_active:    false,
            highlighted:    None,
            palm_open:      false,
            two_hand_pinch: None,
        };
        InteractionController {
            config,
            registry: Registry::new(),
            queue: MessageQueue::new(),
            state,
            palette_index: 0,
            rng,
        }
    }

    pub fn config(&self)   -> &StageConfig      { &self.config }
    pub fn registry(&self) -> &Registry         { &self.registry }
    pub fn queue(&self)    -> &MessageQueue     { &self.queue }
    pub fn state(&self)    -> &InteractionState { &self.state }

    pub fn enqueue(&mut self, item: QueueItem) {
        debug!(text = %item.text, pending = self.queue.len() + 1, "message queued");
        self.queue.enqueue(item);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Frame processing
    // ════════════════════════════════════════════════════════════════════════

    pub fn process_frame(&mut self, frame: &Frame) -> Vec<Command> {
        let mut cmds = Vec::new();
        let th = self.config.thresholds.clone();

        let any_open = frame.hands.iter().any(|h| is_open_palm_with(h, th.open_palm));
        self.broadcast_palm(any_open, &mut cmds);

        if let [a, b] = frame.hands.as_slice() {
            if is_pinch_with(a, th.pinch) && is_pinch_with(b, th.pinch) {
                let (ia, ib) = (a.index_tip(), b.index_tip());
                let pinch = TwoHandPinch {
                    center:        map_normalized_to_world((ia.x + ib.x) * 0.5, (ia.y + ib.y) * 0.5),
                    span:          ia.distance_2d(ib),
                    indexes_close: are_index_fingers_close_with(a, b, th.index_close),
                };
                if self.state.two_hand_pinch.is_none() {
                    debug!(span = pinch.span, "two-hand pinch");
                }
                self.state.two_hand_pinch = Some(pinch);
                self.set_zone(false, &mut cmds);
                return cmds;
            }
        }
        self.state.two_hand_pinch = None;

        self.update_palm_hold(frame, &mut cmds);

        let mut zone = None;
        if frame.hands.is_empty() {
            self.release(&mut zone, &mut cmds);
        } else {
            for hand in &frame.hands {
                if is_pinch_with(hand, th.pinch) {
                    self.drag(hand, &mut zone, &mut cmds);
                } else {
                    self.release(&mut zone, &mut cmds);
                }
            }
        }
        if let Some(active) = zone {
            self.set_zone(active, &mut cmds);
        }
        cmds
    }

    fn broadcast_palm(&mut self, open: bool, cmds: &mut Vec<Command>) {
        for (id, card) in self.registry.cards_mut() {
            if card.palm_open != open {
                card.palm_open = open;
                cmds.push(Command::PalmOpen { id, open });
            }
        }
        self.state.palm_open = open;
    }

    fn update_palm_hold(&mut self, frame: &Frame, cmds: &mut Vec<Command>) {
        let th = &self.config.thresholds;
        let candidate = frame.primary_hand();
        let qualifies = candidate
            .map_or(false, |h| is_open_palm_with(h, th.open_palm) && !is_pinch_with(h, th.pinch));
        let outcome = self.state.palm_hold.update(qualifies, frame.timestamp_ms, self.queue.has_pending());
        if outcome == HoldOutcome::Armed && self.state.last_hold != HoldOutcome::Armed {
            debug!("palm hold armed, waiting for a queued message");
        }
        self.state.last_hold = outcome;
        if outcome != HoldOutcome::Fire {
            return;
        }
        let (Some(hand), Some(item)) = (candidate, self.queue.dequeue()) else {
            return;
        };
        let c = palm_center(hand);
        let position = map_normalized_to_world(c.x, c.y);
        self.spawn_card(item, position, frame.timestamp_ms, cmds);
    }

    fn spawn_card(&mut self, item: QueueItem, position: Vec3, now: Timestamp, cmds: &mut Vec<Command>) {
        let defaults = &self.config.card;
        let message = if item.text.is_empty() && item.media.is_none() {
            defaults.default_message.clone()
        } else {
            item.text
        };
        let card = CardData {
            message,
            color:      item.color.unwrap_or(defaults.default_color),
            media:      item.media,
            is_video:   item.is_video,
            palm_open:  self.state.palm_open,
            created_at: now,
            size:       [self.config.card.width, self.config.card.height],
        };
        info!(message = %card.message, has_media = card.media.is_some(), "spawning message card");
        let kind = EntityKind::MessageCard(card);
        let id = self.registry.insert(kind.clone(), position);
        let timing = &self.config.timing;
        cmds.push(Command::Spawn { id, kind, position });
        for animation in [
            Animation::ContentReveal,
            Animation::TextFade { start: now, duration_ms: timing.text_fade_ms },
            Animation::ScaleIn {
                start:       now,
                duration_ms: timing.card_scale_in_ms,
                from:        self.config.card.spawn_scale,
            },
        ] {
            cmds.push(Command::Animate { id, animation });
        }
    }

    // ── drag / release ───────────────────────────────────────────────────────

    fn in_zone(&self, position: Vec3) -> bool {
        let c = &self.config;
        project_to_zone(position, &c.camera, &c.viewport, &c.zone)
    }

    fn drag(&mut self, hand: &Hand, zone: &mut Option<bool>, cmds: &mut Vec<Command>) {
        let tip = hand.index_tip();
        let position = map_normalized_to_world(tip.x, tip.y);

        if self.registry.selected().is_none() {
            if let Some(id) = self.registry.find_nearest(position, self.config.thresholds.grab_radius) {
                self.registry.select(id);
                debug!(%id, "entity grabbed");
                cmds.push(Command::Select { id, selected: true });
            }
        }
        let Some(id) = self.registry.selected() else {
            return;
        };

        self.registry.set_position(id, position);
        cmds.push(Command::Move { id, position });

        let inside = self.in_zone(position);
        if inside && self.state.highlighted != Some(id) {
            self.state.highlighted = Some(id);
            cmds.push(Command::Outline { id, color: OUTLINE_DANGER });
        } else if !inside && self.state.highlighted == Some(id) {
            self.state.highlighted = None;
            cmds.push(Command::Outline { id, color: OUTLINE_IDLE });
        }
        *zone = Some(inside);
    }

    fn release(&mut self, zone: &mut Option<bool>, cmds: &mut Vec<Command>) {
        if let Some(id) = self.registry.selected() {
            let dropped_in_zone = self
                .registry
                .get(id)
                .map_or(false, |e| self.in_zone(e.position));
            if dropped_in_zone {
                self.registry.remove(id);
                info!(%id, "entity deleted in zone");
                cmds.push(Command::Remove { id });
            } else {
                if self.state.highlighted == Some(id) {
                    cmds.push(Command::Outline { id, color: OUTLINE_IDLE });
                }
                debug!(%id, "entity released");
                cmds.push(Command::Select { id, selected: false });
            }
        }
        self.registry.clear_selection();
        self.state.highlighted = None;
        *zone = Some(false);
    }

    fn set_zone(&mut self, active: bool, cmds: &mut Vec<Command>) {
        if self.state.zone_active != active {
            self.state.zone_active = active;
            cmds.push(Command::ZoneAffordance { active });
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Shapes
    // ════════════════════════════════════════════════════════════════════════

    /// Spawn a shape with random geometry and the next palette color.
    pub fn spawn_shape(&mut self, position: Vec3) -> (EntityId, Vec<Command>) {
        let geometry = ShapeGeometry::ALL[self.rng.gen_range(0..ShapeGeometry::ALL.len())];
        let color = self.next_palette_color();
        let kind = EntityKind::Shape(ShapeData { geometry, color });
        let id = self.registry.insert(kind.clone(), position);
        debug!(%id, ?geometry, color = %color.to_hex(), "shape spawned");
        (id, vec![Command::Spawn { id, kind, position }])
    }

    fn next_palette_color(&mut self) -> Rgb {
        let palette = &self.config.shapes.palette;
        if palette.is_empty() {
            return OUTLINE_IDLE;
        }
        let c = palette[self.palette_index % palette.len()];
        self.palette_index += 1;
        c
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::NEON_PALETTE;
    use hand_landmarks::poses::{build_hand, HandPose};

    fn controller() -> InteractionController {
        let mut cfg = StageConfig::default();
        cfg.shapes.seed = Some(1);
        InteractionController::new(cfg)
    }

    fn frame(ts: Timestamp, hands: Vec<Hand>) -> Frame {
        Frame::new(ts, hands).unwrap()
    }

    fn open(x: f32, y: f32) -> Hand  { build_hand(HandPose::OpenPalm, x, y, 0.0) }
    fn pinch(x: f32, y: f32) -> Hand { build_hand(HandPose::Pinch, x, y, 0.0) }
    fn relaxed(x: f32, y: f32) -> Hand { build_hand(HandPose::Relaxed, x, y, 0.0) }

    fn spawned_cards(cmds: &[Command]) -> usize {
        cmds.iter()
            .filter(|c| matches!(c, Command::Spawn { kind: EntityKind::MessageCard(_), .. }))
            .count()
    }

    #[test]
    fn palm_hold_spawns_card_with_animations() {
        let mut c = controller();
        c.enqueue(QueueItem::text("hello", Rgb::WHITE));
        assert_eq!(spawned_cards(&c.process_frame(&frame(0, vec![open(0.5, 0.5)]))), 0);
        let cmds = c.process_frame(&frame(1000, vec![open(0.5, 0.5)]));
        assert_eq!(spawned_cards(&cmds), 1);
        assert!(c.queue().is_empty());
        let names: Vec<_> = cmds
            .iter()
            .filter_map(|c| match c { Command::Animate { animation, .. } => Some(animation.name()), _ => None })
            .collect();
        assert_eq!(names, ["content-reveal", "text-fade", "scale-in"]);
    }

    #[test]
    fn new_card_inherits_current_palm_state() {
        let mut c = controller();
        c.enqueue(QueueItem::text("x", Rgb::WHITE));
        c.process_frame(&frame(0, vec![open(0.5, 0.5)]));
        c.process_frame(&frame(1000, vec![open(0.5, 0.5)]));
        let card = c.registry().iter().next().unwrap();
        match &card.kind {
            EntityKind::MessageCard(d) => assert!(d.palm_open),
            other => panic!("expected card, got {:?}", other),
        }
    }

    #[test]
    fn card_spawns_at_palm_center() {
        let mut c = controller();
        c.enqueue(QueueItem::text("x", Rgb::WHITE));
        let hand = open(0.3, 0.4);
        let expect = {
            let p = palm_center(&hand);
            map_normalized_to_world(p.x, p.y)
        };
        c.process_frame(&frame(0, vec![hand.clone()]));
        c.process_frame(&frame(1000, vec![hand]));
        let card = c.registry().iter().next().unwrap();
        assert!(card.position.distance(&expect) < 1e-5);
    }

    #[test]
    fn two_hand_pinch_is_reserved_noop() {
        let mut c = controller();
        let (id, _) = c.spawn_shape(Vec3::ZERO);
        let cmds = c.process_frame(&frame(0, vec![pinch(0.4, 0.5), pinch(0.6, 0.5)]));
        assert!(cmds.is_empty(), "{:?}", cmds);
        assert_eq!(c.registry().selected(), None);
        assert!(c.registry().contains(id));
        let p = c.state().two_hand_pinch.unwrap();
        assert!(p.center.distance(&Vec3::ZERO) < 1e-5);
        assert!((p.span - 0.2).abs() < 1e-5);
        assert!(!p.indexes_close);
    }

    #[test]
    fn index_close_threshold_comes_from_config() {
        let mut cfg = StageConfig::default();
        cfg.thresholds.index_close = 0.0001;
        let mut c = InteractionController::new(cfg);
        c.process_frame(&frame(0, vec![pinch(0.48, 0.5), pinch(0.52, 0.5)]));
        assert!(!c.state().two_hand_pinch.unwrap().indexes_close);

        let mut c = controller();
        c.process_frame(&frame(0, vec![pinch(0.48, 0.5), pinch(0.52, 0.5)]));
        assert!(c.state().two_hand_pinch.unwrap().indexes_close);
    }

    fn spawn_one(mut c: InteractionController, item: QueueItem) -> CardData {
        c.enqueue(item);
        c.process_frame(&frame(0, vec![open(0.5, 0.5)]));
        c.process_frame(&frame(1000, vec![open(0.5, 0.5)]));
        match &c.registry().iter().next().unwrap().kind {
            EntityKind::MessageCard(d) => d.clone(),
            other => panic!("expected card, got {:?}", other),
        }
    }

    #[test]
    fn blank_item_spawns_default_card() {
        let card = spawn_one(controller(), QueueItem::blank());
        assert_eq!(card.message, "Hi ! (^-^)/");
        assert_eq!(card.color, crate::color::DEFAULT_CARD_COLOR);

        let mut cfg = StageConfig::default();
        cfg.card.default_message = "CUSTOM".into();
        cfg.card.default_color = Rgb(0x123456);
        let card = spawn_one(InteractionController::new(cfg), QueueItem::blank());
        assert_eq!(card.message, "CUSTOM");
        assert_eq!(card.color, Rgb(0x123456));
    }

    #[test]
    fn item_content_overrides_card_defaults() {
        let card = spawn_one(controller(), QueueItem::text("mine", Rgb(0x010203)));
        assert_eq!(card.message, "mine");
        assert_eq!(card.color, Rgb(0x010203));
    }

    #[test]
    fn two_hand_pinch_leaves_hold_timer_alone() {
        let mut c = controller();
        c.enqueue(QueueItem::text("x", Rgb::WHITE));
        c.process_frame(&frame(0, vec![open(0.5, 0.5)]));
        c.process_frame(&frame(500, vec![pinch(0.4, 0.5), pinch(0.6, 0.5)]));
        let cmds = c.process_frame(&frame(1000, vec![open(0.5, 0.5)]));
        assert_eq!(spawned_cards(&cmds), 1);
    }

    #[test]
    fn pinch_grabs_and_moves_nearest() {
        let mut c = controller();
        let (id, _) = c.spawn_shape(Vec3::ZERO);
        let cmds = c.process_frame(&frame(0, vec![pinch(0.55, 0.5)]));
        assert_eq!(cmds[0], Command::Select { id, selected: true });
        assert!(matches!(cmds[1], Command::Move { id: m, .. } if m == id));
        let moved = c.registry().get(id).unwrap().position;
        assert!(moved.distance(&map_normalized_to_world(0.55, 0.5)) < 1e-5);
    }

    #[test]
    fn pinch_far_from_everything_selects_nothing() {
        let mut c = controller();
        c.spawn_shape(Vec3::ZERO);
        let cmds = c.process_frame(&frame(0, vec![pinch(0.9, 0.1)]));
        assert!(cmds.is_empty());
        assert_eq!(c.registry().selected(), None);
    }

    #[test]
    fn drag_into_zone_outlines_once() {
        let mut c = controller();
        let (id, _) = c.spawn_shape(Vec3::ZERO);
        c.process_frame(&frame(0, vec![pinch(0.5, 0.5)]));
        let first = c.process_frame(&frame(16, vec![pinch(0.02, 0.75)]));
        assert!(first.contains(&Command::Outline { id, color: OUTLINE_DANGER }));
        assert!(first.contains(&Command::ZoneAffordance { active: true }));
        let second = c.process_frame(&frame(32, vec![pinch(0.02, 0.75)]));
        assert!(!second.iter().any(|c| matches!(c, Command::Outline { .. } | Command::ZoneAffordance { .. })));
    }

    #[test]
    fn release_in_zone_deletes() {
        let mut c = controller();
        let (id, _) = c.spawn_shape(Vec3::ZERO);
        c.process_frame(&frame(0, vec![pinch(0.5, 0.5)]));
        c.process_frame(&frame(16, vec![pinch(0.02, 0.75)]));
        let cmds = c.process_frame(&frame(32, vec![relaxed(0.02, 0.75)]));
        assert!(cmds.contains(&Command::Remove { id }));
        assert!(cmds.contains(&Command::ZoneAffordance { active: false }));
        assert!(!c.registry().contains(id));
        assert_eq!(c.registry().selected(), None);
    }

    #[test]
    fn release_outside_keeps_entity() {
        let mut c = controller();
        let (id, _) = c.spawn_shape(Vec3::ZERO);
        c.process_frame(&frame(0, vec![pinch(0.5, 0.5)]));
        c.process_frame(&frame(16, vec![pinch(0.6, 0.5)]));
        let cmds = c.process_frame(&frame(32, vec![relaxed(0.6, 0.5)]));
        assert_eq!(cmds, vec![Command::Select { id, selected: false }]);
        assert!(c.registry().contains(id));
        assert_eq!(c.registry().selected(), None);
    }

    #[test]
    fn palette_cycles_in_order() {
        let mut c = controller();
        let colors: Vec<Rgb> = (0..9)
            .map(|_| {
                let (id, _) = c.spawn_shape(Vec3::ZERO);
                match &c.registry().get(id).unwrap().kind {
                    EntityKind::Shape(s) => s.color,
                    _ => unreachable!(),
                }
            })
            .collect();
        assert_eq!(&colors[..8], &NEON_PALETTE[..]);
        assert_eq!(colors[8], NEON_PALETTE[0]);
    }

    #[test]
    fn seeded_geometry_is_reproducible() {
        let geoms = |seed| {
            let mut cfg = StageConfig::default();
            cfg.shapes.seed = Some(seed);
            let mut c = InteractionController::new(cfg);
            (0..6)
                .map(|_| {
                    let (id, _) = c.spawn_shape(Vec3::ZERO);
                    match &c.registry().get(id).unwrap().kind {
                        EntityKind::Shape(s) => s.geometry,
                        _ => unreachable!(),
                    }
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(geoms(42), geoms(42));
    }
}
