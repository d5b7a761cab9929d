//! World context: entity store, collision groups and shared signals
//!
//! One [`World`] exists per game session. It owns the entity store, the named
//! collision groups, the monotonic millisecond clock and the world-level
//! signals (scroll speed, difficulty modifier, game mode), plus the sound-cue
//! and UI event queues the external collaborators drain.
//!
//! Driver contract, once per fixed-timestep tick:
//! 1. `world.advance(dt_ms)` - advance the clock
//! 2. `stage.update(&mut world)` - scheduler, formations, bosses
//! 3. `world.tick()` - entity physics/collision pass and the removal sweep
//!
//! Spawning and killing during iteration is always safe: ticks run over an id
//! snapshot and removal is deferred to the end-of-tick sweep.

use std::collections::HashMap;

use glam::Vec2;

use crate::assets::{AssetSource, LaserOrientationCache, SoundCue, SpriteMask};
use crate::consts::ORIGINAL_SCROLL_SPEED;
use crate::sim::entity::{self, BombState, Entity, EntityId, EntityKind, Facing, GROUP_COUNT,
    GroupId, LaserState, SiteTracking};

/// Coarse game mode tag shared with the driver and UI collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    #[default]
    Title,
    Playing,
    Paused,
    GameOver,
}

/// Events for the UI collaborator to drain each frame
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Show an attack-name banner
    ShowBanner { text: String },
    /// Retire a banner early (phase ended before it finished)
    RetireBanner { text: String },
    /// Refresh the boss health display
    BossHealth { current: i32, max: i32 },
    /// Play a death effect of the given sprite size at a position
    DeathEffect { pos: Vec2, size: f32 },
}

pub struct World {
    entities: HashMap<EntityId, Entity>,
    groups: [Vec<EntityId>; GROUP_COUNT],
    next_id: EntityId,
    /// Monotonic clock, advanced by the driver
    pub now_ms: u64,
    /// Background scroll applied to static firing sites, pixels/tick.
    /// Bosses zero it on phase entry and restore it on death.
    pub scroll_speed: f32,
    pub base_scroll_speed: f32,
    /// Score multiplier from the selected difficulty
    pub difficulty_modifier: f32,
    pub mode: GameMode,
    assets: Box<dyn AssetSource>,
    pub laser_cache: LaserOrientationCache,
    /// Sound cues queued this tick, drained by the audio collaborator
    pub sounds: Vec<SoundCue>,
    /// UI events queued this tick, drained by the UI collaborator
    pub ui_events: Vec<UiEvent>,
    /// Set by the UI collaborator when the current banner finished; stage
    /// scripts poll it through `wait_until`.
    pub banner_done: bool,
}

impl World {
    pub fn new(assets: Box<dyn AssetSource>) -> Self {
        Self {
            entities: HashMap::new(),
            groups: std::array::from_fn(|_| Vec::new()),
            next_id: 1,
            now_ms: 0,
            scroll_speed: ORIGINAL_SCROLL_SPEED,
            base_scroll_speed: ORIGINAL_SCROLL_SPEED,
            difficulty_modifier: 1.0,
            mode: GameMode::default(),
            assets,
            laser_cache: LaserOrientationCache::new(1),
            sounds: Vec::new(),
            ui_events: Vec::new(),
            banner_done: false,
        }
    }

    /// Advance the monotonic clock by one tick's worth of milliseconds
    pub fn advance(&mut self, dt_ms: u64) {
        self.now_ms += dt_ms;
    }

    /// Run the entity pass: every live entity updates once, in fixed group
    /// order, then the removal sweep runs.
    pub fn tick(&mut self) {
        for group in GroupId::ALL {
            for id in self.group_ids(group) {
                entity::tick(self, id);
            }
        }
        self.sweep();
    }

    fn sweep(&mut self) {
        let entities = &mut self.entities;
        entities.retain(|_, e| e.alive);
        for group in &mut self.groups {
            group.retain(|id| entities.contains_key(id));
        }
    }

    /// Clear all entities and per-stage signals for a stage change. The
    /// clock keeps running; scheduled times are relative to stage start.
    pub fn reset(&mut self) {
        self.entities.clear();
        for group in &mut self.groups {
            group.clear();
        }
        self.sounds.clear();
        self.ui_events.clear();
        self.banner_done = false;
        self.scroll_speed = self.base_scroll_speed;
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub(crate) fn take(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub(crate) fn put_back(&mut self, e: Entity) {
        self.entities.insert(e.id, e);
    }

    /// Snapshot of a group's member ids, safe to iterate while mutating
    pub fn group_ids(&self, group: GroupId) -> Vec<EntityId> {
        self.groups[group.index()].clone()
    }

    /// Live members of a group
    pub fn group_len(&self, group: GroupId) -> usize {
        self.groups[group.index()]
            .iter()
            .filter(|id| self.is_alive(**id))
            .count()
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.get(&id).is_some_and(|e| e.alive)
    }

    /// Current centre position, None once the entity is gone
    pub fn center(&self, id: EntityId) -> Option<Vec2> {
        self.entities.get(&id).filter(|e| e.alive).map(|e| e.pos)
    }

    /// Mark an entity dead; the sweep removes it at end of tick
    pub fn kill(&mut self, id: EntityId) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.alive = false;
        }
    }

    pub fn play(&mut self, cue: SoundCue) {
        self.sounds.push(cue);
    }

    pub fn push_ui(&mut self, event: UiEvent) {
        self.ui_events.push(event);
    }

    /// Fetch a collision mask, substituting a solid placeholder when the
    /// asset is missing.
    fn mask_for(&self, name: &str, size: Vec2) -> SpriteMask {
        let px = (size.x.max(1.0) as u32, size.y.max(1.0) as u32);
        match self.assets.sprite_mask(name, px) {
            Some(mask) => mask,
            None => {
                log::warn!("failed to load sprite {name} at {px:?}, using solid mask");
                SpriteMask::solid(px.0, px.1)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn insert(
        &mut self,
        name: &str,
        kind: EntityKind,
        health: i32,
        pos: Vec2,
        vel: Vec2,
        accel: Vec2,
        size: Vec2,
        reward: i32,
        group: GroupId,
        targets: Option<GroupId>,
        owner: Option<EntityId>,
    ) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        let mask = self.mask_for(name, size);
        let e = Entity {
            id,
            name: name.to_string(),
            kind,
            health,
            pos,
            vel,
            accel,
            facing: Facing::Neutral,
            group,
            targets,
            owner,
            reward,
            score: 0,
            bomb_immunity: false,
            mask,
            size,
            alive: true,
            hits_taken: 0,
            spawn_ms: self.now_ms,
        };
        self.entities.insert(id, e);
        self.groups[group.index()].push(id);
        id
    }

    pub fn spawn_player(&mut self, name: &str, pos: Vec2, health: i32, size: Vec2) -> EntityId {
        self.insert(
            name,
            EntityKind::Player,
            health,
            pos,
            Vec2::ZERO,
            Vec2::ZERO,
            size,
            0,
            GroupId::Players,
            None,
            None,
        )
    }

    pub fn spawn_popcorn(&mut self, name: &str, pos: Vec2, size: Vec2, reward: i32) -> EntityId {
        self.insert(
            name,
            EntityKind::Popcorn,
            1,
            pos,
            Vec2::ZERO,
            Vec2::ZERO,
            size,
            reward,
            GroupId::Enemies,
            None,
            None,
        )
    }

    pub fn spawn_big_enemy(
        &mut self,
        name: &str,
        pos: Vec2,
        health: i32,
        reward: i32,
    ) -> EntityId {
        self.insert(
            name,
            EntityKind::BigEnemy,
            health,
            pos,
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::new(50.0, 50.0),
            reward,
            GroupId::Enemies,
            None,
            None,
        )
    }

    pub fn spawn_boss_entity(
        &mut self,
        name: &str,
        pos: Vec2,
        health: i32,
        reward: i32,
    ) -> EntityId {
        self.insert(
            name,
            EntityKind::Boss,
            health,
            pos,
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::new(90.0, 90.0),
            reward,
            GroupId::Enemies,
            None,
            None,
        )
    }

    /// Stationary positional anchor for a pattern
    pub fn spawn_site(&mut self, pos: Vec2, reward: i32) -> EntityId {
        self.insert(
            "transparent",
            EntityKind::Site { tracking: None },
            -1,
            pos,
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ONE,
            reward,
            GroupId::Sites,
            None,
            None,
        )
    }

    /// Anchor that follows `parent.pos + offset` and mirrors its health
    pub fn spawn_offset_site(&mut self, parent: EntityId, offset: Vec2, reward: i32) -> EntityId {
        let pos = self.center(parent).unwrap_or_default() + offset;
        let health = self.get(parent).map(|p| p.health).unwrap_or(0);
        self.insert(
            "transparent",
            EntityKind::Site { tracking: Some(SiteTracking { parent, offset }) },
            health,
            pos,
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ONE,
            reward,
            GroupId::Sites,
            None,
            None,
        )
    }

    /// Enemy bullet: targets the player group
    pub fn spawn_bullet(
        &mut self,
        name: &str,
        pos: Vec2,
        vel: Vec2,
        accel: Vec2,
        scale: Vec2,
        owner: EntityId,
    ) -> EntityId {
        self.insert(
            name,
            EntityKind::Bullet,
            1,
            pos,
            vel,
            accel,
            scale,
            0,
            GroupId::Bullets,
            Some(GroupId::Players),
            Some(owner),
        )
    }

    /// Player bullet: targets the enemy group
    pub fn spawn_player_bullet(
        &mut self,
        name: &str,
        pos: Vec2,
        vel: Vec2,
        accel: Vec2,
        scale: Vec2,
        owner: EntityId,
    ) -> EntityId {
        self.insert(
            name,
            EntityKind::Bullet,
            1,
            pos,
            vel,
            accel,
            scale,
            0,
            GroupId::PlayerBullets,
            Some(GroupId::Enemies),
            Some(owner),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spawn_missile(
        &mut self,
        name: &str,
        pos: Vec2,
        vel: Vec2,
        accel: Vec2,
        owner: EntityId,
        target: EntityId,
        homing_speed: f32,
        effect_length_ms: u64,
        scale: Vec2,
    ) -> EntityId {
        self.insert(
            name,
            EntityKind::Missile { target, homing_speed, effect_length_ms },
            1,
            pos,
            vel,
            accel,
            scale,
            0,
            GroupId::Bullets,
            Some(GroupId::Players),
            Some(owner),
        )
    }

    /// Immortal beam anchored to its owner; starts in warning mode
    pub fn spawn_laser(
        &mut self,
        name: &str,
        pos: Vec2,
        owner: EntityId,
        width: u32,
        effect_length_ms: u64,
        delay_ms: u64,
    ) -> EntityId {
        let state = LaserState {
            warning: true,
            delay_ms,
            effect_length_ms,
            previous_started: 0,
            previous_finished: self.now_ms,
            angle: 0.0,
            width,
        };
        self.insert(
            name,
            EntityKind::Laser(state),
            -1,
            pos,
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::new(width as f32, width as f32),
            0,
            GroupId::Lasers,
            Some(GroupId::Players),
            Some(owner),
        )
    }

    /// Expanding shockwave centred on its owner
    pub fn spawn_bomb(
        &mut self,
        name: &str,
        owner: EntityId,
        duration_ms: u64,
        targets: GroupId,
    ) -> EntityId {
        let pos = self.center(owner).unwrap_or_default();
        let state = BombState::new(self.now_ms, duration_ms);
        self.play(SoundCue::BombDeployed);
        self.insert(
            name,
            EntityKind::Bomb(state),
            -1,
            pos,
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ONE,
            0,
            GroupId::PlayerBullets,
            Some(targets),
            Some(owner),
        )
    }
}
