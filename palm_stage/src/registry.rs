//! The authoritative set of live entities and the single selection.
//!
//! Entities are addressed by [`EntityId`] only.  Removing an entity that is
//! selected clears the selection in the same call, so a dangling selection
//! can never be observed.

use std::collections::BTreeMap;

use hand_landmarks::{Timestamp, Vec3};

use crate::color::Rgb;
use crate::media::MediaHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Entity kinds
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeGeometry {
    Box,
    Sphere,
    Cone,
    Cylinder,
}

impl ShapeGeometry {
    pub const ALL: [ShapeGeometry; 4] =
        [ShapeGeometry::Box, ShapeGeometry::Sphere, ShapeGeometry::Cone, ShapeGeometry::Cylinder];
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeData {
    pub geometry: ShapeGeometry,
    pub color:    Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CardData {
    pub message:    String,
    pub color:      Rgb,
    pub media:      Option<MediaHandle>,
    pub is_video:   bool,
    pub palm_open:  bool,
    pub created_at: Timestamp,
    /// World-space width and height.
    pub size:       [f32; 2],
}

/// What a card shows right now.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CardFace<'a> {
    Blank,
    Media(&'a MediaHandle),
    Text(&'a str),
}

impl CardData {
    /// Media wins over text; an empty message with no media shows nothing.
    pub fn face(&self, revealed: bool) -> CardFace<'_> {
        if !revealed {
            return CardFace::Blank;
        }
        match (&self.media, self.message.is_empty()) {
            (Some(m), _) => CardFace::Media(m),
            (None, false) => CardFace::Text(&self.message),
            (None, true) => CardFace::Blank,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    Shape(ShapeData),
    MessageCard(CardData),
}

impl EntityKind {
    pub fn auto_rotates(&self) -> bool {
        matches!(self, EntityKind::Shape(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Shape(_)       => "shape",
            EntityKind::MessageCard(_) => "card",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id:       EntityId,
    pub kind:     EntityKind,
    pub position: Vec3,
}

// ════════════════════════════════════════════════════════════════════════════
// Registry
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct Registry {
    entities: BTreeMap<EntityId, Entity>,
    selected: Option<EntityId>,
    next_id:  u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: EntityKind, position: Vec3) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.entities.insert(id, Entity { id, kind, position });
        id
    }

    /// Drop an entity; clears the selection if it pointed here.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(&id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        removed
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn cards_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut CardData)> {
        self.entities.values_mut().filter_map(|e| match &mut e.kind {
            EntityKind::MessageCard(card) => Some((e.id, card)),
            EntityKind::Shape(_) => None,
        })
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.entities.get_mut(&id) {
            Some(e) => { e.position = position; true }
            None => false,
        }
    }

    // ── selection ─────────────────────────────────────────────────────────

    /// Select `id`, replacing any previous selection.  Unknown ids are
    /// refused and leave the selection unchanged.
    pub fn select(&mut self, id: EntityId) -> bool {
        if !self.entities.contains_key(&id) {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn clear_selection(&mut self) -> Option<EntityId> {
        self.selected.take()
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selected == Some(id)
    }

    /// Closest entity to `position`, if strictly nearer than `max_dist`.
    pub fn find_nearest(&self, position: Vec3, max_dist: f32) -> Option<EntityId> {
        self.entities
            .values()
            .map(|e| (e.id, e.position.distance(&position)))
            .filter(|&(_, d)| d < max_dist)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
