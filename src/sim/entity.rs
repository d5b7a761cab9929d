//! Entities and their per-kind movement/collision/damage policies
//!
//! Everything that lives in a collision group is an [`Entity`]: the player,
//! enemies, bosses, projectiles and the invisible firing sites patterns
//! anchor to. Behaviour that differs per concrete type (edge-of-playfield
//! policy, collision scanning, damage response) is dispatched on
//! [`EntityKind`] rather than carried in separate structs, so the store stays
//! a single homogeneous collection.

use glam::Vec2;

use crate::assets::{SoundCue, SpriteMask};
use crate::consts::{BOMB_MAX_DIAMETER, CANVAS_HEIGHT, CANVAS_WIDTH, LASER_STANDARD_LENGTH};
use crate::sim::collision::{mask_hits_beam, masks_overlap, rects_overlap};
use crate::sim::world::{UiEvent, World};

pub type EntityId = u32;

/// Named collision groups entities are filed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupId {
    Players,
    PlayerBullets,
    Enemies,
    Bullets,
    Lasers,
    Sites,
}

pub const GROUP_COUNT: usize = 6;

impl GroupId {
    pub const ALL: [GroupId; GROUP_COUNT] = [
        GroupId::Players,
        GroupId::PlayerBullets,
        GroupId::Enemies,
        GroupId::Bullets,
        GroupId::Lasers,
        GroupId::Sites,
    ];

    pub fn index(self) -> usize {
        match self {
            GroupId::Players => 0,
            GroupId::PlayerBullets => 1,
            GroupId::Enemies => 2,
            GroupId::Bullets => 3,
            GroupId::Lasers => 4,
            GroupId::Sites => 5,
        }
    }
}

/// Facing derived from horizontal velocity; lasers reuse it for their
/// warning/deadly sprite swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Neutral,
    Left,
    Right,
}

/// Parent-tracking state for an offset firing site
#[derive(Debug, Clone, Copy)]
pub struct SiteTracking {
    pub parent: EntityId,
    pub offset: Vec2,
}

/// Warning/deadly cycle state for a laser beam
#[derive(Debug, Clone)]
pub struct LaserState {
    pub warning: bool,
    /// Time spent in warning before the beam turns deadly, ms
    pub delay_ms: u64,
    /// Time the beam stays deadly before cycling back to warning, ms
    pub effect_length_ms: u64,
    pub previous_started: u64,
    pub previous_finished: u64,
    /// Current heading in degrees, laser convention (0 = straight up)
    pub angle: f32,
    pub width: u32,
}

/// Expansion and bookkeeping state for an area bomb
#[derive(Debug, Clone)]
pub struct BombState {
    pub duration_ms: u64,
    pub fired_at: u64,
    /// Targets already dealt their one damage event by this bomb
    hit: Vec<EntityId>,
    /// Targets granted bomb immunity, cleared when the bomb expires
    touched: Vec<EntityId>,
}

impl BombState {
    pub fn new(fired_at: u64, duration_ms: u64) -> Self {
        Self {
            duration_ms,
            fired_at,
            hit: Vec::new(),
            touched: Vec::new(),
        }
    }
}

/// Capability variant deciding an entity's movement, collision and damage
/// policies.
#[derive(Debug, Clone)]
pub enum EntityKind {
    Player,
    /// One-hit disposable enemy
    Popcorn,
    /// Multi-hit enemy, damage decrements health by 1
    BigEnemy,
    /// Damage is recorded as hit counts and drained by the phase machine
    Boss,
    /// Zero-size non-colliding anchor; `tracking` follows a parent entity
    Site { tracking: Option<SiteTracking> },
    Bullet,
    Missile {
        target: EntityId,
        /// Max turn per tick, degrees
        homing_speed: f32,
        /// Lifetime budget, ms
        effect_length_ms: u64,
    },
    Laser(LaserState),
    Bomb(BombState),
}

impl EntityKind {
    /// Plain projectiles a bomb shockwave destroys outright
    pub fn is_projectile(&self) -> bool {
        matches!(self, EntityKind::Bullet | EntityKind::Missile { .. })
    }
}

/// A game object with a hitbox, velocity and collision policy
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    /// Sprite name, also the collision-mask key
    pub name: String,
    pub kind: EntityKind,
    /// -1 is the immortal/proxy sentinel
    pub health: i32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub accel: Vec2,
    pub facing: Facing,
    pub group: GroupId,
    pub targets: Option<GroupId>,
    pub owner: Option<EntityId>,
    /// Score granted to whoever destroys this entity
    pub reward: i32,
    /// Score this entity has accumulated by destroying its targets
    pub score: i64,
    pub bomb_immunity: bool,
    pub mask: SpriteMask,
    pub size: Vec2,
    /// Deferred-removal flag; the end-of-tick sweep removes dead entities
    pub alive: bool,
    /// Damage events not yet drained by a controller (bosses)
    pub hits_taken: u32,
    pub spawn_ms: u64,
}

impl Entity {
    /// Rendered bounding box is always centred on `pos`
    pub fn center(&self) -> Vec2 {
        self.pos
    }

    fn fully_outside_canvas(&self) -> bool {
        let half = self.size / 2.0;
        self.pos.y + half.y < 0.0
            || self.pos.y - half.y > CANVAS_HEIGHT
            || self.pos.x + half.x < 0.0
            || self.pos.x - half.x > CANVAS_WIDTH
    }
}

/// Advance one entity by one tick. The entity is taken out of the store for
/// the duration so its policy can freely mutate the rest of the world.
pub(crate) fn tick(world: &mut World, id: EntityId) {
    let Some(mut e) = world.take(id) else { return };
    if e.alive {
        match e.kind {
            EntityKind::Player
            | EntityKind::Popcorn
            | EntityKind::BigEnemy
            | EntityKind::Boss => tick_body(world, &mut e),
            EntityKind::Site { .. } => tick_site(world, &mut e),
            EntityKind::Bullet => tick_bullet(world, &mut e),
            EntityKind::Missile { .. } => tick_missile(world, &mut e),
            EntityKind::Laser(..) => tick_laser(world, &mut e),
            EntityKind::Bomb(..) => tick_bomb(world, &mut e),
        }
    }
    world.put_back(e);
}

/// Semi-implicit integration: acceleration folds into velocity before the
/// position advances. Facing tracks the horizontal velocity sign.
fn integrate(e: &mut Entity) {
    e.vel += e.accel;
    e.pos += e.vel;
    e.facing = if e.vel.x > 0.0 {
        Facing::Right
    } else if e.vel.x < 0.0 {
        Facing::Left
    } else {
        Facing::Neutral
    };
}

fn check_death(world: &mut World, e: &mut Entity) {
    if e.alive && e.health <= 0 && e.health != -1 {
        e.alive = false;
        world.play(SoundCue::EnemyDeath);
    }
}

fn tick_body(world: &mut World, e: &mut Entity) {
    integrate(e);
    match e.kind {
        EntityKind::Player => {
            let half = e.size / 2.0;
            e.pos.x = e.pos.x.clamp(half.x, CANVAS_WIDTH - half.x);
            e.pos.y = e.pos.y.clamp(half.y, CANVAS_HEIGHT - half.y);
        }
        EntityKind::Popcorn | EntityKind::BigEnemy => {
            if e.fully_outside_canvas() {
                e.alive = false;
                return;
            }
        }
        // Bosses ignore the playfield edges.
        _ => {}
    }
    check_death(world, e);
}

fn tick_site(world: &mut World, e: &mut Entity) {
    let EntityKind::Site { tracking: Some(tr) } = e.kind else {
        return;
    };
    // Weak reference: the site reads the parent's position and mirrors its
    // health, it never controls the parent's lifetime. A vanished parent
    // reads as dead so dependent lasers retire.
    match world.get(tr.parent) {
        Some(parent) if parent.alive => {
            e.pos = parent.pos + tr.offset;
            e.health = parent.health;
        }
        _ => e.health = 0,
    }
}

fn tick_bullet(world: &mut World, e: &mut Entity) {
    integrate(e);
    if e.fully_outside_canvas() {
        e.alive = false;
        return;
    }
    collide_projectile(world, e);
}

fn tick_missile(world: &mut World, e: &mut Entity) {
    let EntityKind::Missile { target, homing_speed, effect_length_ms } = e.kind else {
        return;
    };
    home_toward_target(world, e, target, homing_speed);
    integrate(e);
    if e.fully_outside_canvas() {
        e.alive = false;
        return;
    }
    collide_projectile(world, e);
    if e.alive && world.now_ms - e.spawn_ms >= effect_length_ms {
        e.alive = false;
    }
}

/// Rotate the velocity toward the target by at most `homing_speed` degrees,
/// preserving speed. A vanished or overlapping target is a no-op.
fn home_toward_target(world: &World, e: &mut Entity, target: EntityId, homing_speed: f32) {
    let Some(target_pos) = world.center(target) else { return };
    let to_target = target_pos - e.pos;
    if to_target.length_squared() == 0.0 {
        return;
    }
    let current = e.vel.y.atan2(e.vel.x).to_degrees();
    let desired = to_target.y.atan2(to_target.x).to_degrees();
    let turn = crate::shortest_angle_diff(current, desired).clamp(-homing_speed, homing_speed);
    e.vel = crate::rotate_deg(e.vel, turn);
}

/// First mask-overlap match wins: exactly one damage event, score to the
/// firer, then the projectile despawns.
fn collide_projectile(world: &mut World, e: &mut Entity) {
    let Some(tg) = e.targets else { return };
    for tid in world.group_ids(tg) {
        if Some(tid) == e.owner {
            continue;
        }
        let hit = match world.get(tid) {
            Some(t) if t.alive && !t.bomb_immunity => {
                masks_overlap(&e.mask, e.pos, &t.mask, t.pos)
            }
            _ => continue,
        };
        if hit {
            let reward = world.get(tid).map(|t| t.reward).unwrap_or(0);
            apply_damage(world, tid);
            let gain = (reward as f32 * world.difficulty_modifier) as i64;
            if let Some(oid) = e.owner
                && let Some(owner) = world.get_mut(oid)
            {
                owner.score += gain;
            }
            e.alive = false;
            break;
        }
    }
}

fn tick_laser(world: &mut World, e: &mut Entity) {
    // A laser dies with its owner; the -1 sentinel (plain firing sites)
    // keeps it alive.
    let owner_ok = e
        .owner
        .and_then(|id| world.get(id))
        .map(|o| o.alive && (o.health > 0 || o.health == -1))
        .unwrap_or(false);
    if !owner_ok {
        e.alive = false;
        return;
    }

    let now = world.now_ms;
    let EntityKind::Laser(ls) = &mut e.kind else { return };

    if ls.warning && now - ls.previous_finished >= ls.delay_ms {
        ls.warning = false;
        ls.previous_started = now;
        world.play(SoundCue::LaserOn);
    }
    if !ls.warning && now - ls.previous_started >= ls.effect_length_ms {
        ls.warning = true;
        ls.previous_finished = now;
    }
    e.facing = if ls.warning { Facing::Left } else { Facing::Right };

    if ls.warning {
        return;
    }

    let beam = world
        .laser_cache
        .get(&e.name, (ls.width, LASER_STANDARD_LENGTH), ls.angle);

    // Deadly beams damage every target they cross, and never despawn on hit.
    let Some(tg) = e.targets else { return };
    for tid in world.group_ids(tg) {
        if Some(tid) == e.owner {
            continue;
        }
        let hit = match world.get(tid) {
            Some(t) if t.alive && !t.bomb_immunity => {
                mask_hits_beam(&t.mask, t.pos, e.pos, &beam)
            }
            _ => continue,
        };
        if hit {
            apply_damage(world, tid);
        }
    }
}

fn tick_bomb(world: &mut World, e: &mut Entity) {
    let now = world.now_ms;
    let owner = e.owner;
    let pos = e.pos;
    let EntityKind::Bomb(bs) = &mut e.kind else { return };

    let elapsed = now - bs.fired_at;
    let progress = (elapsed as f32 / bs.duration_ms as f32).min(1.0);

    // Grow from 1 px to the diameter covering twice the screen diagonal,
    // capped; the centre stays fixed.
    let diagonal = (CANVAS_WIDTH * CANVAS_WIDTH + CANVAS_HEIGHT * CANVAS_HEIGHT).sqrt();
    let max_diameter = (diagonal * 2.0).min(BOMB_MAX_DIAMETER);
    let diameter = (progress * max_diameter).max(1.0);
    e.size = Vec2::splat(diameter);

    // The owner is immune for as long as the shockwave is active.
    if let Some(oid) = owner
        && let Some(o) = world.get_mut(oid)
    {
        o.bomb_immunity = true;
    }

    if let Some(tg) = e.targets {
        for tid in world.group_ids(tg) {
            if Some(tid) == owner {
                continue;
            }
            let (overlaps, projectile) = match world.get(tid) {
                Some(t) if t.alive => (
                    rects_overlap(pos, e.size, t.pos, t.size),
                    t.kind.is_projectile(),
                ),
                _ => continue,
            };
            if !overlaps {
                continue;
            }
            if projectile {
                // The shockwave clears plain projectiles outright.
                world.kill(tid);
                continue;
            }
            if !bs.hit.contains(&tid) {
                bs.hit.push(tid);
                apply_damage(world, tid);
            }
            if !bs.touched.contains(&tid) {
                bs.touched.push(tid);
            }
            if let Some(t) = world.get_mut(tid) {
                t.bomb_immunity = true;
            }
        }
    }

    if elapsed >= bs.duration_ms {
        e.alive = false;
        let touched = std::mem::take(&mut bs.touched);
        if let Some(oid) = owner
            && let Some(o) = world.get_mut(oid)
        {
            o.bomb_immunity = false;
        }
        for tid in touched {
            if let Some(t) = world.get_mut(tid) {
                t.bomb_immunity = false;
            }
        }
    }
}

/// Route one damage event to an entity per its kind. Callers have already
/// excluded bomb-immune targets; the flag is re-checked here because a bomb
/// may have granted immunity earlier in the same tick.
pub(crate) fn apply_damage(world: &mut World, id: EntityId) {
    let mut cue = None;
    let mut effect = None;
    {
        let Some(t) = world.get_mut(id) else { return };
        if t.bomb_immunity || !t.alive {
            return;
        }
        match t.kind {
            EntityKind::Popcorn => {
                t.health = 0;
                t.alive = false;
                cue = Some(SoundCue::EnemyDeath);
                effect = Some(UiEvent::DeathEffect { pos: t.pos, size: 35.0 });
            }
            EntityKind::BigEnemy => {
                t.health -= 1;
                if t.health <= 0 {
                    t.alive = false;
                    cue = Some(SoundCue::EnemyDeath);
                    effect = Some(UiEvent::DeathEffect { pos: t.pos, size: 55.0 });
                }
            }
            EntityKind::Boss => {
                t.hits_taken += 1;
            }
            EntityKind::Player => {
                t.health = (t.health - 1).max(0);
                if t.health == 0 {
                    t.alive = false;
                    cue = Some(SoundCue::PlayerDeath);
                }
            }
            // Projectiles and sites shrug damage off.
            _ => {}
        }
    }
    if let Some(c) = cue {
        world.play(c);
    }
    if let Some(ev) = effect {
        world.push_ui(ev);
    }
}
