//! Render contract and the in-memory scene used by the simulator.
//!
//! The controller never talks to a renderer directly; it produces
//! [`Command`]s, and a [`SceneBridge`] replays them against anything that
//! implements [`RenderEngine`] and [`ZoneIndicator`].  A failed command is
//! logged and skipped, the rest of the batch still applies.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

use hand_landmarks::{Timestamp, Vec3};
use tracing::warn;

use crate::animation::{evaluate, AnimatedState, Animation};
use crate::color::{Rgb, OUTLINE_IDLE};
use crate::command::Command;
use crate::registry::{EntityId, EntityKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("no render handle for entity {0}")]
    UnknownEntity(EntityId),
    #[error("render handle {0} is stale")]
    StaleHandle(String),
    #[error("entity {0} already has a render node")]
    Duplicate(EntityId),
    #[error("render engine rejected {what}: {reason}")]
    Rejected { what: &'static str, reason: String },
}

// ════════════════════════════════════════════════════════════════════════════
// Contract
// ════════════════════════════════════════════════════════════════════════════

pub trait RenderEngine {
    type Handle: Copy + Debug;

    fn create_entity(&mut self, id: EntityId, kind: &EntityKind, position: Vec3) -> Result<Self::Handle, RenderError>;
    fn remove_entity(&mut self, handle: Self::Handle) -> Result<(), RenderError>;
    fn set_position(&mut self, handle: Self::Handle, position: Vec3) -> Result<(), RenderError>;
    fn set_outline_color(&mut self, handle: Self::Handle, color: Rgb) -> Result<(), RenderError>;
    fn set_selected(&mut self, handle: Self::Handle, selected: bool) -> Result<(), RenderError>;
    fn set_palm_open(&mut self, handle: Self::Handle, open: bool) -> Result<(), RenderError>;
    fn attach_animation(&mut self, handle: Self::Handle, animation: Animation) -> Result<(), RenderError>;
}

/// The deletion-zone highlight.
pub trait ZoneIndicator {
    fn activate(&mut self);
    fn deactivate(&mut self);
}

// ════════════════════════════════════════════════════════════════════════════
// SceneBridge
// ════════════════════════════════════════════════════════════════════════════

/// Maps entity ids to engine handles and applies command batches.
pub struct SceneBridge<H> {
    handles: HashMap<EntityId, H>,
}

impl<H: Copy + Debug> Default for SceneBridge<H> {
    fn default() -> Self {
        SceneBridge { handles: HashMap::new() }
    }
}

impl<H: Copy + Debug> SceneBridge<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, id: EntityId) -> Option<H> {
        self.handles.get(&id).copied()
    }

    /// Apply every command in order; returns how many failed.
    pub fn apply<E, Z>(&mut self, engine: &mut E, zone: &mut Z, cmds: Vec<Command>) -> usize
    where
        E: RenderEngine<Handle = H>,
        Z: ZoneIndicator,
    {
        let mut failures = 0;
        for cmd in cmds {
            if let Err(err) = self.apply_one(engine, zone, cmd) {
                warn!(%err, "render command skipped");
                failures += 1;
            }
        }
        failures
    }

    fn apply_one<E, Z>(&mut self, engine: &mut E, zone: &mut Z, cmd: Command) -> Result<(), RenderError>
    where
        E: RenderEngine<Handle = H>,
        Z: ZoneIndicator,
    {
        match cmd {
            Command::Spawn { id, kind, position } => {
                let h = engine.create_entity(id, &kind, position)?;
                self.handles.insert(id, h);
                Ok(())
            }
            Command::Remove { id } => {
                let h = self.handles.remove(&id).ok_or(RenderError::UnknownEntity(id))?;
                engine.remove_entity(h)
            }
            Command::Move { id, position }     => engine.set_position(self.lookup(id)?, position),
            Command::Outline { id, color }     => engine.set_outline_color(self.lookup(id)?, color),
            Command::Select { id, selected }   => engine.set_selected(self.lookup(id)?, selected),
            Command::PalmOpen { id, open }     => engine.set_palm_open(self.lookup(id)?, open),
            Command::Animate { id, animation } => engine.attach_animation(self.lookup(id)?, animation),
            Command::ZoneAffordance { active } => {
                if active { zone.activate() } else { zone.deactivate() }
                Ok(())
            }
        }
    }

    fn lookup(&self, id: EntityId) -> Result<H, RenderError> {
        self.handle(id).ok_or(RenderError::UnknownEntity(id))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// In-memory scene
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle(u32);

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub entity:     EntityId,
    pub kind:       EntityKind,
    pub position:   Vec3,
    /// Accumulated x/y rotation in radians.
    pub rotation:   [f32; 2],
    pub outline:    Rgb,
    pub selected:   bool,
    pub palm_open:  bool,
    pub animations: Vec<Animation>,
    /// Result of the last [`Scene::tick`].
    pub animated:   AnimatedState,
}

#[derive(Debug)]
pub struct Scene {
    nodes:         BTreeMap<NodeHandle, SceneNode>,
    next_handle:   u32,
    rotation_step: f32,
    now:           Timestamp,
}

impl Scene {
    pub fn new(rotation_step: f32) -> Self {
        Scene { nodes: BTreeMap::new(), next_handle: 0, rotation_step, now: 0 }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(&handle)
    }

    pub fn node_for(&self, entity: EntityId) -> Option<&SceneNode> {
        self.nodes.values().find(|n| n.entity == entity)
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// One render tick: spin unselected shapes and re-evaluate behaviors.
    pub fn tick(&mut self, now: Timestamp) {
        self.now = now;
        for node in self.nodes.values_mut() {
            if node.kind.auto_rotates() && !node.selected {
                node.rotation[0] += self.rotation_step;
                node.rotation[1] += self.rotation_step;
            }
            node.animated = evaluate(&node.animations, now, node.palm_open);
        }
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut SceneNode, RenderError> {
        self.nodes
            .get_mut(&handle)
            .ok_or_else(|| RenderError::StaleHandle(handle.to_string()))
    }
}

impl RenderEngine for Scene {
    type Handle = NodeHandle;

    fn create_entity(&mut self, id: EntityId, kind: &EntityKind, position: Vec3) -> Result<NodeHandle, RenderError> {
        if self.node_for(id).is_some() {
            return Err(RenderError::Duplicate(id));
        }
        let palm_open = match kind {
            EntityKind::MessageCard(card) => card.palm_open,
            EntityKind::Shape(_) => false,
        };
        self.next_handle += 1;
        let handle = NodeHandle(self.next_handle);
        let node = SceneNode {
            entity: id,
            kind: kind.clone(),
            position,
            rotation: [0.0; 2],
            outline: OUTLINE_IDLE,
            selected: false,
            palm_open,
            animations: Vec::new(),
            animated: AnimatedState::default(),
        };
        self.nodes.insert(handle, node);
        Ok(handle)
    }

    fn remove_entity(&mut self, handle: NodeHandle) -> Result<(), RenderError> {
        self.nodes
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| RenderError::StaleHandle(handle.to_string()))
    }

    fn set_position(&mut self, handle: NodeHandle, position: Vec3) -> Result<(), RenderError> {
        self.node_mut(handle)?.position = position;
        Ok(())
    }

    fn set_outline_color(&mut self, handle: NodeHandle, color: Rgb) -> Result<(), RenderError> {
        self.node_mut(handle)?.outline = color;
        Ok(())
    }

    fn set_selected(&mut self, handle: NodeHandle, selected: bool) -> Result<(), RenderError> {
        self.node_mut(handle)?.selected = selected;
        Ok(())
    }

    fn set_palm_open(&mut self, handle: NodeHandle, open: bool) -> Result<(), RenderError> {
        let node = self.node_mut(handle)?;
        node.palm_open = open;
        if let EntityKind::MessageCard(card) = &mut node.kind {
            card.palm_open = open;
        }
        Ok(())
    }

    fn attach_animation(&mut self, handle: NodeHandle, animation: Animation) -> Result<(), RenderError> {
        self.node_mut(handle)?.animations.push(animation);
        Ok(())
    }
}

/// Deletion-zone highlight state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZoneLamp {
    pub active:   bool,
    /// Number of off→on transitions.
    pub flashes:  u32,
}

impl ZoneIndicator for ZoneLamp {
    fn activate(&mut self) {
        if !self.active {
            self.flashes += 1;
        }
        self.active = true;
    }

    fn deactivate(&mut self) {
        self.active = false;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ShapeData, ShapeGeometry};

    fn shape() -> EntityKind {
        EntityKind::Shape(ShapeData { geometry: ShapeGeometry::Cone, color: Rgb(0x00FFFF) })
    }

    /// Refuses every creation.
    struct BrokenEngine;

    impl RenderEngine for BrokenEngine {
        type Handle = u8;
        fn create_entity(&mut self, _: EntityId, _: &EntityKind, _: Vec3) -> Result<u8, RenderError> {
            Err(RenderError::Rejected { what: "create", reason: "out of buffers".into() })
        }
        fn remove_entity(&mut self, _: u8) -> Result<(), RenderError> { Ok(()) }
        fn set_position(&mut self, _: u8, _: Vec3) -> Result<(), RenderError> { Ok(()) }
        fn set_outline_color(&mut self, _: u8, _: Rgb) -> Result<(), RenderError> { Ok(()) }
        fn set_selected(&mut self, _: u8, _: bool) -> Result<(), RenderError> { Ok(()) }
        fn set_palm_open(&mut self, _: u8, _: bool) -> Result<(), RenderError> { Ok(()) }
        fn attach_animation(&mut self, _: u8, _: Animation) -> Result<(), RenderError> { Ok(()) }
    }

    #[test]
    fn bridge_applies_batch_in_order() {
        let mut scene = Scene::new(0.01);
        let mut lamp = ZoneLamp::default();
        let mut bridge = SceneBridge::new();
        let id = EntityId(1);
        let failures = bridge.apply(&mut scene, &mut lamp, vec![
            Command::Spawn { id, kind: shape(), position: Vec3::ZERO },
            Command::Select { id, selected: true },
            Command::Move { id, position: Vec3::new(1.0, 2.0, 0.0) },
            Command::ZoneAffordance { active: true },
        ]);
        assert_eq!(failures, 0);
        let node = scene.node_for(id).unwrap();
        assert!(node.selected);
        assert_eq!(node.position, Vec3::new(1.0, 2.0, 0.0));
        assert!(lamp.active);
    }

    #[test]
    fn failures_are_skipped_not_fatal() {
        let mut lamp = ZoneLamp::default();
        let mut bridge = SceneBridge::new();
        let id = EntityId(7);
        let failures = bridge.apply(&mut BrokenEngine, &mut lamp, vec![
            Command::Spawn { id, kind: shape(), position: Vec3::ZERO },
            Command::Move { id, position: Vec3::ZERO },
            Command::ZoneAffordance { active: true },
        ]);
        assert_eq!(failures, 2);
        assert!(lamp.active, "commands after a failure still apply");
    }

    #[test]
    fn remove_forgets_handle() {
        let mut scene = Scene::new(0.01);
        let mut lamp = ZoneLamp::default();
        let mut bridge = SceneBridge::new();
        let id = EntityId(3);
        bridge.apply(&mut scene, &mut lamp, vec![Command::Spawn { id, kind: shape(), position: Vec3::ZERO }]);
        assert_eq!(bridge.apply(&mut scene, &mut lamp, vec![Command::Remove { id }]), 0);
        assert!(scene.is_empty());
        assert!(bridge.handle(id).is_none());
        assert_eq!(bridge.apply(&mut scene, &mut lamp, vec![Command::Remove { id }]), 1);
    }

    #[test]
    fn duplicate_spawn_is_refused() {
        let mut scene = Scene::new(0.01);
        scene.create_entity(EntityId(1), &shape(), Vec3::ZERO).unwrap();
        assert_eq!(
            scene.create_entity(EntityId(1), &shape(), Vec3::ZERO).unwrap_err(),
            RenderError::Duplicate(EntityId(1))
        );
    }

    #[test]
    fn selected_shapes_stop_spinning() {
        let mut scene = Scene::new(0.01);
        let a = scene.create_entity(EntityId(1), &shape(), Vec3::ZERO).unwrap();
        let b = scene.create_entity(EntityId(2), &shape(), Vec3::ZERO).unwrap();
        scene.set_selected(b, true).unwrap();
        scene.tick(16);
        scene.tick(32);
        assert!((scene.node(a).unwrap().rotation[0] - 0.02).abs() < 1e-6);
        assert_eq!(scene.node(b).unwrap().rotation, [0.0, 0.0]);
    }

    #[test]
    fn animations_append() {
        let mut scene = Scene::new(0.01);
        let h = scene.create_entity(EntityId(1), &shape(), Vec3::ZERO).unwrap();
        scene.attach_animation(h, Animation::ContentReveal).unwrap();
        scene.attach_animation(h, Animation::ScaleIn { start: 0, duration_ms: 100, from: 0.0 }).unwrap();
        scene.tick(50);
        let node = scene.node(h).unwrap();
        assert_eq!(node.animations.len(), 2);
        assert!((node.animated.scale - 0.5).abs() < 1e-6);
        assert!(!node.animated.reveal);
    }

    #[test]
    fn lamp_counts_flashes() {
        let mut lamp = ZoneLamp::default();
        lamp.activate();
        lamp.activate();
        lamp.deactivate();
        lamp.activate();
        assert_eq!(lamp.flashes, 2);
    }
}
