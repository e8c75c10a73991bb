//! Render-layer instructions produced by the controller.

use hand_landmarks::Vec3;

use crate::animation::Animation;
use crate::color::Rgb;
use crate::registry::{EntityId, EntityKind};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Spawn       { id: EntityId, kind: EntityKind, position: Vec3 },
    Move        { id: EntityId, position: Vec3 },
    Remove      { id: EntityId },
    Outline     { id: EntityId, color: Rgb },
    Select      { id: EntityId, selected: bool },
    Animate     { id: EntityId, animation: Animation },
    PalmOpen    { id: EntityId, open: bool },
    /// Deletion-zone highlight on or off.
    ZoneAffordance { active: bool },
}

impl Command {
    /// Entity this command addresses, if any.
    pub fn target(&self) -> Option<EntityId> {
        match self {
            Command::Spawn { id, .. }
            | Command::Move { id, .. }
            | Command::Remove { id }
            | Command::Outline { id, .. }
            | Command::Select { id, .. }
            | Command::Animate { id, .. }
            | Command::PalmOpen { id, .. } => Some(*id),
            Command::ZoneAffordance { .. } => None,
        }
    }
}
