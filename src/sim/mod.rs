//! Deterministic gameplay simulation
//!
//! Everything under this module is pure state-in, state-out: no rendering,
//! no audio, no real clock. The driver advances [`World`]'s millisecond
//! clock, runs the stage layer, then ticks the entity layer; sound cues and
//! UI events accumulate in queues for external collaborators to drain.

pub mod boss;
pub mod collision;
pub mod entity;
pub mod formation;
pub mod movement;
pub mod pattern;
pub mod stage;
pub mod world;

pub use boss::{Boss, BossPhase};
pub use entity::{Entity, EntityId, EntityKind, Facing, GroupId};
pub use formation::{BigEnemyEntry, FiringSiteEntry, Formation, FormationEntry};
pub use movement::{MoveCtx, MovementFactory, MovementFn};
pub use pattern::{AttackPattern, CompoundPattern, Pattern, PatternFactory};
pub use stage::{Stage, StageAction, StageContext, StageHandler, StagePredicate, StageScript};
pub use world::{GameMode, UiEvent, World};

#[cfg(test)]
pub(crate) fn test_world() -> world::World {
    world::World::new(Box::new(crate::assets::SolidAssets))
}
