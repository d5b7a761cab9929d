//! Bullet, missile and laser emission patterns
//!
//! A [`Pattern`] is a stateful generator bound to a firing origin (any entity
//! exposing a centre, usually a firing site). Every variant shares one
//! cadence contract: `update` does nothing while inactive, fires exactly one
//! shot action when the inter-shot delay has elapsed, and stamps
//! `previous_fire_time`. Variants differ only in the geometry of the shot.
//!
//! Angle conventions: bullet headings are degrees clockwise from straight
//! down, laser headings degrees from straight up. All accumulation wraps
//! mod 360 and target tracking interpolates along the shortest signed arc.

use std::collections::VecDeque;

use glam::Vec2;

use crate::assets::SoundCue;
use crate::sim::entity::{EntityId, EntityKind};
use crate::sim::world::World;
use crate::{angle_from_down, angle_from_up, heading_down, normalize_deg, rotate_deg,
    shortest_angle_diff};

/// Shot parameters shared by every pattern variant
#[derive(Debug, Clone)]
pub struct ShotParams {
    /// Projectile sprite name
    pub bullet_type: String,
    pub bullet_scale: Vec2,
    pub bullets_per_shot: u32,
    /// Delay between distinct shots, ms
    pub delay_ms: u64,
    pub speed: f32,
    pub accel: f32,
    /// Recompute the firing heading toward the tracked target each shot
    pub aimed: bool,
}

/// Geometry payload of a pattern
#[derive(Debug)]
pub enum PatternKind {
    /// Bullets at explicit angles, centred on their mean
    Fan { angles: Vec<f32> },
    /// Each bullet advances a persistent rotating offset
    Spiral { spread_angle: f32, current_angle: f32 },
    /// Parallel bullets with a small positional stagger
    Line,
    /// Evenly spaced ring that rotates shot-to-shot
    Snowflake { spin_speed: f32, offset: f32 },
    /// Evenly spaced ring, static orientation
    Circle,
    /// Outer delay gates a burst; an inner delay releases one bullet at a
    /// time from a precomputed angle queue
    Burst {
        spread: f32,
        intra_delay_ms: u64,
        queue: VecDeque<f32>,
        /// None means the next queued bullet releases immediately
        last_bullet_ms: Option<u64>,
        bursting: bool,
    },
    /// Burst staging, homing missiles instead of bullets
    MissileBurst {
        spread: f32,
        intra_delay_ms: u64,
        homing_speed: f32,
        effect_length_ms: u64,
        queue: VecDeque<f32>,
        /// None means the next queued missile releases immediately
        last_missile_ms: Option<u64>,
        bursting: bool,
    },
    /// Evenly spaced beams spinning about the owner
    RotatingLaser {
        width: u32,
        effect_length_ms: u64,
        spin_speed: f32,
        offset: f32,
        beams: Vec<(EntityId, f32)>,
        spawned: bool,
    },
    /// One beam at a fixed or spinning heading
    SingleLaser {
        width: u32,
        effect_length_ms: u64,
        angle: f32,
        spin_speed: f32,
        beam: Option<EntityId>,
        spawned: bool,
    },
    /// Beams at explicit base angles sharing one rotation offset
    MultiLaser {
        width: u32,
        effect_length_ms: u64,
        angles: Vec<f32>,
        spin_speed: f32,
        offset: f32,
        beams: Vec<(EntityId, f32)>,
        spawned: bool,
    },
    /// A fan of beams whose base orientation steers toward the target at a
    /// capped turn rate
    FanLaser {
        width: u32,
        effect_length_ms: u64,
        fan_angle: f32,
        aim_speed: f32,
        offset: f32,
        beams: Vec<EntityId>,
        spawned: bool,
    },
}

/// A stateful projectile generator bound to a firing origin
#[derive(Debug)]
pub struct Pattern {
    /// Firing origin; a dead owner stops production
    pub owner: EntityId,
    /// Tracked target for aimed variants
    pub target: EntityId,
    pub params: ShotParams,
    pub kind: PatternKind,
    /// None until the first shot; the first update fires immediately
    pub previous_fire_time: Option<u64>,
    pub active: bool,
    projectiles: Vec<EntityId>,
}

impl Pattern {
    #[allow(clippy::too_many_arguments)]
    fn base(
        owner: EntityId,
        target: EntityId,
        bullet_type: &str,
        bullet_scale: Vec2,
        bullets_per_shot: u32,
        delay_ms: u64,
        speed: f32,
        accel: f32,
        aimed: bool,
        kind: PatternKind,
    ) -> Self {
        Self {
            owner,
            target,
            params: ShotParams {
                bullet_type: bullet_type.to_string(),
                bullet_scale,
                bullets_per_shot,
                delay_ms,
                speed,
                accel,
                aimed,
            },
            kind,
            previous_fire_time: None,
            active: true,
            projectiles: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fan(
        owner: EntityId,
        target: EntityId,
        bullet_type: &str,
        bullet_scale: Vec2,
        angles: Vec<f32>,
        delay_ms: u64,
        speed: f32,
        accel: f32,
        aimed: bool,
    ) -> Self {
        let n = angles.len() as u32;
        Self::base(
            owner,
            target,
            bullet_type,
            bullet_scale,
            n,
            delay_ms,
            speed,
            accel,
            aimed,
            PatternKind::Fan { angles },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spiral(
        owner: EntityId,
        target: EntityId,
        bullet_type: &str,
        bullet_scale: Vec2,
        bullets_per_shot: u32,
        delay_ms: u64,
        spread_angle: f32,
        speed: f32,
        accel: f32,
        aimed: bool,
    ) -> Self {
        Self::base(
            owner,
            target,
            bullet_type,
            bullet_scale,
            bullets_per_shot,
            delay_ms,
            speed,
            accel,
            aimed,
            PatternKind::Spiral { spread_angle, current_angle: 0.0 },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn line(
        owner: EntityId,
        target: EntityId,
        bullet_type: &str,
        bullet_scale: Vec2,
        bullets_per_shot: u32,
        delay_ms: u64,
        speed: f32,
        accel: f32,
        aimed: bool,
    ) -> Self {
        Self::base(
            owner,
            target,
            bullet_type,
            bullet_scale,
            bullets_per_shot,
            delay_ms,
            speed,
            accel,
            aimed,
            PatternKind::Line,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn snowflake(
        owner: EntityId,
        target: EntityId,
        bullet_type: &str,
        bullet_scale: Vec2,
        bullets_per_shot: u32,
        delay_ms: u64,
        speed: f32,
        accel: f32,
        aimed: bool,
        spin_speed: f32,
    ) -> Self {
        Self::base(
            owner,
            target,
            bullet_type,
            bullet_scale,
            bullets_per_shot,
            delay_ms,
            speed,
            accel,
            aimed,
            PatternKind::Snowflake { spin_speed, offset: 0.0 },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn circle(
        owner: EntityId,
        target: EntityId,
        bullet_type: &str,
        bullet_scale: Vec2,
        bullets_per_shot: u32,
        delay_ms: u64,
        speed: f32,
        accel: f32,
        aimed: bool,
    ) -> Self {
        Self::base(
            owner,
            target,
            bullet_type,
            bullet_scale,
            bullets_per_shot,
            delay_ms,
            speed,
            accel,
            aimed,
            PatternKind::Circle,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn burst(
        owner: EntityId,
        target: EntityId,
        bullet_type: &str,
        bullet_scale: Vec2,
        bullets_per_shot: u32,
        delay_ms: u64,
        speed: f32,
        accel: f32,
        spread: f32,
        intra_delay_ms: u64,
        aimed: bool,
    ) -> Self {
        Self::base(
            owner,
            target,
            bullet_type,
            bullet_scale,
            bullets_per_shot,
            delay_ms,
            speed,
            accel,
            aimed,
            PatternKind::Burst {
                spread,
                intra_delay_ms,
                queue: VecDeque::new(),
                last_bullet_ms: None,
                bursting: false,
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn missile_burst(
        owner: EntityId,
        target: EntityId,
        bullet_type: &str,
        bullet_scale: Vec2,
        bullets_per_shot: u32,
        delay_ms: u64,
        speed: f32,
        accel: f32,
        spread: f32,
        intra_delay_ms: u64,
        homing_speed: f32,
        effect_length_ms: u64,
    ) -> Self {
        Self::base(
            owner,
            target,
            bullet_type,
            bullet_scale,
            bullets_per_shot,
            delay_ms,
            speed,
            accel,
            true,
            PatternKind::MissileBurst {
                spread,
                intra_delay_ms,
                homing_speed,
                effect_length_ms,
                queue: VecDeque::new(),
                last_missile_ms: None,
                bursting: false,
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rotating_laser(
        owner: EntityId,
        target: EntityId,
        laser_type: &str,
        width: u32,
        laser_count: u32,
        delay_ms: u64,
        effect_length_ms: u64,
        spin_speed: f32,
    ) -> Self {
        Self::base(
            owner,
            target,
            laser_type,
            Vec2::new(width as f32, 300.0),
            laser_count,
            delay_ms,
            0.0,
            0.0,
            false,
            PatternKind::RotatingLaser {
                width,
                effect_length_ms,
                spin_speed,
                offset: 0.0,
                beams: Vec::new(),
                spawned: false,
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn single_laser(
        owner: EntityId,
        target: EntityId,
        laser_type: &str,
        width: u32,
        angle: f32,
        delay_ms: u64,
        effect_length_ms: u64,
        spin_speed: f32,
    ) -> Self {
        Self::base(
            owner,
            target,
            laser_type,
            Vec2::new(width as f32, 300.0),
            1,
            delay_ms,
            0.0,
            0.0,
            false,
            PatternKind::SingleLaser {
                width,
                effect_length_ms,
                angle,
                spin_speed,
                beam: None,
                spawned: false,
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn multi_laser(
        owner: EntityId,
        target: EntityId,
        laser_type: &str,
        width: u32,
        angles: Vec<f32>,
        delay_ms: u64,
        effect_length_ms: u64,
        spin_speed: f32,
    ) -> Self {
        let n = angles.len() as u32;
        Self::base(
            owner,
            target,
            laser_type,
            Vec2::new(width as f32, 300.0),
            n,
            delay_ms,
            0.0,
            0.0,
            false,
            PatternKind::MultiLaser {
                width,
                effect_length_ms,
                angles,
                spin_speed,
                offset: 0.0,
                beams: Vec::new(),
                spawned: false,
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fan_laser(
        owner: EntityId,
        target: EntityId,
        laser_type: &str,
        width: u32,
        laser_count: u32,
        delay_ms: u64,
        effect_length_ms: u64,
        fan_angle: f32,
        aimed: bool,
        aim_speed: f32,
    ) -> Self {
        Self::base(
            owner,
            target,
            laser_type,
            Vec2::new(width as f32, 300.0),
            laser_count,
            delay_ms,
            0.0,
            0.0,
            aimed,
            PatternKind::FanLaser {
                width,
                effect_length_ms,
                fan_angle,
                aim_speed,
                offset: 0.0,
                beams: Vec::new(),
                spawned: false,
            },
        )
    }

    /// Ids of projectiles this pattern has spawned and not yet torn down
    pub fn projectiles(&self) -> &[EntityId] {
        &self.projectiles
    }

    pub fn is_laser(&self) -> bool {
        matches!(
            self.kind,
            PatternKind::RotatingLaser { .. }
                | PatternKind::SingleLaser { .. }
                | PatternKind::MultiLaser { .. }
                | PatternKind::FanLaser { .. }
        )
    }

    fn check_fire(&self, now: u64) -> bool {
        match self.previous_fire_time {
            None => true,
            Some(t) => now.saturating_sub(t) >= self.params.delay_ms,
        }
    }

    /// End all live projectiles and deactivate
    pub fn kill_projectiles(&mut self, world: &mut World) {
        for id in self.projectiles.drain(..) {
            world.kill(id);
        }
        match &mut self.kind {
            PatternKind::RotatingLaser { beams, .. } | PatternKind::MultiLaser { beams, .. } => {
                beams.clear()
            }
            PatternKind::SingleLaser { beam, .. } => *beam = None,
            PatternKind::FanLaser { beams, .. } => beams.clear(),
            PatternKind::Burst { queue, bursting, .. }
            | PatternKind::MissileBurst { queue, bursting, .. } => {
                queue.clear();
                *bursting = false;
            }
            _ => {}
        }
        self.active = false;
    }

    pub fn update(&mut self, world: &mut World) {
        if !self.active {
            return;
        }
        // A destroyed owner stops production; existing projectiles run out
        // on their own or through kill_projectiles.
        let Some(origin) = world.center(self.owner) else { return };
        let now = world.now_ms;
        let can_fire = self.check_fire(now);
        let n = self.params.bullets_per_shot;
        let aimed = self.params.aimed;
        let speed = self.params.speed;
        let target = self.target;

        match &mut self.kind {
            PatternKind::Fan { angles } => {
                if !can_fire || angles.is_empty() {
                    return;
                }
                let base = aim_base_angle(world, aimed, target, origin);
                let mean = angles.iter().sum::<f32>() / angles.len() as f32;
                let angles = angles.clone();
                for a in angles {
                    let relative = a - mean;
                    let dir = heading_down(base + relative);
                    // Edge bullets spawn slightly out along their heading so
                    // dense fans do not stack on the origin pixel.
                    let offset = if relative.abs() > 1e-3 { dir * 10.0 } else { Vec2::ZERO };
                    fire_bullet(world, &self.params, self.owner, &mut self.projectiles,
                        origin + offset, dir * speed);
                }
                self.previous_fire_time = Some(now);
            }
            PatternKind::Spiral { spread_angle, current_angle } => {
                if !can_fire {
                    return;
                }
                let unit = aim_unit(world, aimed, target, origin);
                for _ in 0..n {
                    let dir = rotate_deg(unit, *current_angle);
                    fire_bullet(world, &self.params, self.owner, &mut self.projectiles,
                        origin, dir * speed);
                    *current_angle = normalize_deg(*current_angle + *spread_angle);
                }
                self.previous_fire_time = Some(now);
            }
            PatternKind::Line => {
                if !can_fire {
                    return;
                }
                let unit = aim_unit(world, aimed, target, origin);
                let stagger = 0.2 * self.params.bullet_scale.y;
                for i in 0..n {
                    let pos = origin - Vec2::new(0.0, stagger * i as f32);
                    fire_bullet(world, &self.params, self.owner, &mut self.projectiles,
                        pos, unit * speed);
                }
                self.previous_fire_time = Some(now);
            }
            PatternKind::Snowflake { spin_speed, offset } => {
                if !can_fire || n == 0 {
                    return;
                }
                let unit = aim_unit(world, aimed, target, origin);
                for i in 0..n {
                    let angle = *offset + 360.0 / n as f32 * i as f32;
                    let dir = rotate_deg(unit, angle);
                    fire_bullet(world, &self.params, self.owner, &mut self.projectiles,
                        origin, dir * speed);
                }
                *offset = normalize_deg(*offset + *spin_speed);
                self.previous_fire_time = Some(now);
            }
            PatternKind::Circle => {
                if !can_fire || n == 0 {
                    return;
                }
                let unit = aim_unit(world, aimed, target, origin);
                for i in 0..n {
                    let angle = 360.0 / n as f32 * i as f32;
                    let dir = rotate_deg(unit, angle);
                    fire_bullet(world, &self.params, self.owner, &mut self.projectiles,
                        origin, dir * speed);
                }
                self.previous_fire_time = Some(now);
            }
            PatternKind::Burst { spread, intra_delay_ms, queue, last_bullet_ms, bursting } => {
                if !*bursting && can_fire {
                    *queue = burst_angles(world, aimed, target, origin, *spread, n);
                    *bursting = true;
                    // First bullet of the burst releases immediately.
                    *last_bullet_ms = None;
                }
                let due = last_bullet_ms
                    .is_none_or(|t| now.saturating_sub(t) >= *intra_delay_ms);
                if *bursting && due {
                    match queue.pop_front() {
                        Some(angle) => {
                            fire_bullet(world, &self.params, self.owner, &mut self.projectiles,
                                origin, heading_down(angle) * speed);
                            *last_bullet_ms = Some(now);
                        }
                        None => {
                            *bursting = false;
                            self.previous_fire_time = Some(now);
                        }
                    }
                }
            }
            PatternKind::MissileBurst {
                spread,
                intra_delay_ms,
                homing_speed,
                effect_length_ms,
                queue,
                last_missile_ms,
                bursting,
            } => {
                if !*bursting && can_fire {
                    *queue = burst_angles(world, true, target, origin, *spread, n);
                    *bursting = true;
                    *last_missile_ms = None;
                }
                let due = last_missile_ms
                    .is_none_or(|t| now.saturating_sub(t) >= *intra_delay_ms);
                if *bursting && due {
                    match queue.pop_front() {
                        Some(angle) => {
                            let vel = heading_down(angle) * speed;
                            let accel = Vec2::splat(self.params.accel);
                            let id = world.spawn_missile(
                                &self.params.bullet_type,
                                origin,
                                vel,
                                accel,
                                self.owner,
                                target,
                                *homing_speed,
                                *effect_length_ms,
                                self.params.bullet_scale,
                            );
                            self.projectiles.push(id);
                            world.play(SoundCue::EnemyFire);
                            *last_missile_ms = Some(now);
                        }
                        None => {
                            *bursting = false;
                            self.previous_fire_time = Some(now);
                        }
                    }
                }
            }
            PatternKind::RotatingLaser { width, effect_length_ms, spin_speed, offset, beams,
                spawned } => {
                *offset = normalize_deg(*offset + *spin_speed);
                if !*spawned && n > 0 {
                    for i in 0..n {
                        let base = 360.0 / n as f32 * i as f32;
                        let id = fire_beam(world, &self.params, self.owner,
                            &mut self.projectiles, *width, *effect_length_ms, origin, base);
                        beams.push((id, base));
                    }
                    *spawned = true;
                }
                for (id, base) in beams.iter() {
                    let angle = normalize_deg((*base + *offset).round());
                    set_beam(world, *id, origin, angle);
                }
            }
            PatternKind::SingleLaser { width, effect_length_ms, angle, spin_speed, beam,
                spawned } => {
                *angle = normalize_deg((*angle + *spin_speed).round());
                if !*spawned {
                    let id = fire_beam(world, &self.params, self.owner, &mut self.projectiles,
                        *width, *effect_length_ms, origin, *angle);
                    *beam = Some(id);
                    *spawned = true;
                }
                if let Some(id) = beam {
                    set_beam(world, *id, origin, *angle);
                }
            }
            PatternKind::MultiLaser { width, effect_length_ms, angles, spin_speed, offset, beams,
                spawned } => {
                *offset = normalize_deg(*offset + *spin_speed);
                if !*spawned {
                    for &base in angles.iter() {
                        let id = fire_beam(world, &self.params, self.owner,
                            &mut self.projectiles, *width, *effect_length_ms, origin, base);
                        beams.push((id, base));
                    }
                    *spawned = true;
                }
                for (id, base) in beams.iter() {
                    let angle = normalize_deg((*base + *offset).round());
                    set_beam(world, *id, origin, angle);
                }
            }
            PatternKind::FanLaser { width, effect_length_ms, fan_angle, aim_speed, offset, beams,
                spawned } => {
                if aimed {
                    // Smooth turning toward the target, shortest arc only.
                    if let Some(tp) = world.center(target) {
                        let to_target = tp - origin;
                        if to_target.length_squared() > 0.0 {
                            let target_angle = angle_from_up(to_target);
                            let delta = shortest_angle_diff(*offset, target_angle)
                                .clamp(-*aim_speed, *aim_speed);
                            *offset = normalize_deg(*offset + delta);
                        }
                    }
                } else {
                    *offset = 0.0;
                }
                if !*spawned {
                    *offset = match world.center(target) {
                        Some(tp) if (tp - origin).length_squared() > 0.0 => {
                            normalize_deg(angle_from_up(tp - origin))
                        }
                        _ => 0.0,
                    };
                    for _ in 0..n {
                        let id = fire_beam(world, &self.params, self.owner,
                            &mut self.projectiles, *width, *effect_length_ms, origin, *offset);
                        beams.push(id);
                    }
                    *spawned = true;
                }
                let step = if n > 1 { *fan_angle / (n - 1) as f32 } else { 0.0 };
                let start = *offset - *fan_angle / 2.0;
                for (i, id) in beams.iter().enumerate() {
                    let angle = normalize_deg((start + i as f32 * step).round());
                    set_beam(world, *id, origin, angle);
                }
            }
        }
    }
}

/// Firing heading toward the target, degrees from straight down; a missing
/// target or zero-length aim vector falls back to straight down.
fn aim_base_angle(world: &World, aimed: bool, target: EntityId, origin: Vec2) -> f32 {
    if !aimed {
        return 0.0;
    }
    match world.center(target) {
        Some(tp) if (tp - origin).length_squared() > 0.0 => angle_from_down(tp - origin),
        _ => 0.0,
    }
}

/// Unit aim vector toward the target, falling back to straight down
fn aim_unit(world: &World, aimed: bool, target: EntityId, origin: Vec2) -> Vec2 {
    if !aimed {
        return Vec2::new(0.0, 1.0);
    }
    match world.center(target) {
        Some(tp) if (tp - origin).length_squared() > 0.0 => (tp - origin).normalize(),
        _ => Vec2::new(0.0, 1.0),
    }
}

/// Precompute the angle queue for one burst, spread centred on the aim
fn burst_angles(
    world: &World,
    aimed: bool,
    target: EntityId,
    origin: Vec2,
    spread: f32,
    n: u32,
) -> VecDeque<f32> {
    let base = aim_base_angle(world, aimed, target, origin);
    let step = if n > 1 { spread / (n - 1) as f32 } else { 0.0 };
    let start = base - spread / 2.0;
    (0..n).map(|i| start + i as f32 * step).collect()
}

fn fire_bullet(
    world: &mut World,
    params: &ShotParams,
    owner: EntityId,
    projectiles: &mut Vec<EntityId>,
    pos: Vec2,
    vel: Vec2,
) {
    let accel = Vec2::splat(params.accel);
    let id = world.spawn_bullet(&params.bullet_type, pos, vel, accel, params.bullet_scale, owner);
    projectiles.push(id);
    world.play(SoundCue::EnemyFire);
}

#[allow(clippy::too_many_arguments)]
fn fire_beam(
    world: &mut World,
    params: &ShotParams,
    owner: EntityId,
    projectiles: &mut Vec<EntityId>,
    width: u32,
    effect_length_ms: u64,
    origin: Vec2,
    angle: f32,
) -> EntityId {
    let id = world.spawn_laser(&params.bullet_type, origin, owner, width, effect_length_ms,
        params.delay_ms);
    set_beam(world, id, origin, angle);
    projectiles.push(id);
    id
}

/// Re-anchor a beam on its orbit centre and point it at `angle`
fn set_beam(world: &mut World, id: EntityId, origin: Vec2, angle: f32) {
    if let Some(e) = world.get_mut(id) {
        e.pos = origin;
        if let EntityKind::Laser(ls) = &mut e.kind {
            ls.angle = angle;
        }
    }
}

/// An ordered set of patterns treated as one unit
#[derive(Debug)]
pub struct CompoundPattern {
    pub patterns: Vec<Pattern>,
    pub active: bool,
}

impl CompoundPattern {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns, active: true }
    }

    pub fn update(&mut self, world: &mut World) {
        if !self.active {
            return;
        }
        for pattern in &mut self.patterns {
            pattern.update(world);
        }
    }

    pub fn kill_projectiles(&mut self, world: &mut World) {
        for pattern in &mut self.patterns {
            pattern.kill_projectiles(world);
        }
        self.active = false;
    }
}

/// Uniform update/teardown surface over single and compound patterns
#[derive(Debug)]
pub enum AttackPattern {
    Single(Pattern),
    Compound(CompoundPattern),
}

/// Builds a pattern bound to the given firing site
pub type PatternFactory = Box<dyn Fn(EntityId) -> AttackPattern>;

impl AttackPattern {
    pub fn update(&mut self, world: &mut World) {
        match self {
            AttackPattern::Single(p) => p.update(world),
            AttackPattern::Compound(c) => c.update(world),
        }
    }

    pub fn kill_projectiles(&mut self, world: &mut World) {
        match self {
            AttackPattern::Single(p) => p.kill_projectiles(world),
            AttackPattern::Compound(c) => c.kill_projectiles(world),
        }
    }

    pub fn active(&self) -> bool {
        match self {
            AttackPattern::Single(p) => p.active,
            AttackPattern::Compound(c) => c.active,
        }
    }

    pub fn is_laser(&self) -> bool {
        match self {
            AttackPattern::Single(p) => p.is_laser(),
            AttackPattern::Compound(c) => c.patterns.iter().any(Pattern::is_laser),
        }
    }

    /// True when every firing origin of this pattern is gone
    pub fn owners_dead(&self, world: &World) -> bool {
        match self {
            AttackPattern::Single(p) => !world.is_alive(p.owner),
            AttackPattern::Compound(c) => c.patterns.iter().all(|p| !world.is_alive(p.owner)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::GroupId;
    use crate::sim::test_world;
    use proptest::prelude::*;

    const SCALE: Vec2 = Vec2::new(4.0, 10.0);

    fn bullet_headings(world: &World) -> Vec<f32> {
        world
            .group_ids(GroupId::Bullets)
            .iter()
            .filter_map(|id| world.get(*id))
            .map(|e| normalize_deg(angle_from_down(e.vel)))
            .collect()
    }

    fn contains_heading(headings: &[f32], expected: f32) -> bool {
        headings
            .iter()
            .any(|h| shortest_angle_diff(*h, expected).abs() < 0.01)
    }

    #[test]
    fn test_circle_four_shot_headings_and_cadence() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 450.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
        let mut p = Pattern::circle(site, player, "pellet", SCALE, 4, 1000, 5.0, 0.0, false);

        // First update fires immediately.
        p.update(&mut w);
        let headings = bullet_headings(&w);
        assert_eq!(headings.len(), 4);
        for expected in [0.0, 90.0, 180.0, 270.0] {
            assert!(contains_heading(&headings, expected), "missing {expected}");
        }
        for e in w.group_ids(GroupId::Bullets).iter().filter_map(|id| w.get(*id)) {
            assert!((e.vel.length() - 5.0).abs() < 1e-4);
        }

        // Nothing more until the delay elapses.
        w.advance(500);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 4);
        w.advance(499);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 4);

        // At exactly 1000 ms the same static headings fire again.
        w.advance(1);
        p.update(&mut w);
        let headings = bullet_headings(&w);
        assert_eq!(headings.len(), 8);
        for expected in [0.0, 90.0, 180.0, 270.0] {
            assert_eq!(
                headings
                    .iter()
                    .filter(|h| shortest_angle_diff(**h, expected).abs() < 0.01)
                    .count(),
                2
            );
        }
    }

    #[test]
    fn test_circle_even_spacing_for_all_counts() {
        for n in 1..=50u32 {
            let mut w = test_world();
            let site = w.spawn_site(Vec2::new(400.0, 450.0), 0);
            let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
            let mut p = Pattern::circle(site, player, "pellet", SCALE, n, 1000, 5.0, 0.0, false);
            p.update(&mut w);
            let mut headings = bullet_headings(&w);
            assert_eq!(headings.len(), n as usize);
            headings.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for i in 0..headings.len() {
                let next = headings[(i + 1) % headings.len()];
                let gap = normalize_deg(next - headings[i]);
                let gap = if gap == 0.0 && n == 1 { 360.0 } else { gap };
                assert!(
                    (gap - 360.0 / n as f32).abs() < 0.01,
                    "n={n} gap={gap}"
                );
            }
        }
    }

    #[test]
    fn test_fan_symmetric_about_aim_heading() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 100.0), 0);
        // Target straight below: aim heading 0 from down.
        let player = w.spawn_player("f16", Vec2::new(400.0, 700.0), 3, Vec2::splat(40.0));
        let mut p = Pattern::fan(site, player, "pellet", SCALE,
            vec![-30.0, 0.0, 30.0], 500, 4.0, 0.0, true);
        p.update(&mut w);
        let headings = bullet_headings(&w);
        assert_eq!(headings.len(), 3);
        for expected in [330.0, 0.0, 30.0] {
            assert!(contains_heading(&headings, expected), "missing {expected}");
        }
    }

    #[test]
    fn test_fan_angles_center_on_their_mean() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 100.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 700.0), 3, Vec2::splat(40.0));
        // Mean is 20: emitted headings are the offsets from it.
        let mut p = Pattern::fan(site, player, "pellet", SCALE,
            vec![0.0, 20.0, 40.0], 500, 4.0, 0.0, false);
        p.update(&mut w);
        let headings = bullet_headings(&w);
        for expected in [340.0, 0.0, 20.0] {
            assert!(contains_heading(&headings, expected), "missing {expected}");
        }
    }

    #[test]
    fn test_spiral_offset_persists_across_shots() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 450.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
        let mut p = Pattern::spiral(site, player, "pellet", SCALE, 2, 100, 30.0, 5.0, 0.0, false);
        p.update(&mut w);
        let headings = bullet_headings(&w);
        assert!(contains_heading(&headings, 0.0));
        assert!(contains_heading(&headings, 30.0));
        w.advance(100);
        p.update(&mut w);
        let headings = bullet_headings(&w);
        // Second shot continues where the first left off.
        assert!(contains_heading(&headings, 60.0));
        assert!(contains_heading(&headings, 90.0));
    }

    #[test]
    fn test_snowflake_rotates_between_shots() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 450.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
        let mut p =
            Pattern::snowflake(site, player, "pellet", SCALE, 4, 100, 5.0, 0.0, false, 15.0);
        p.update(&mut w);
        assert!(contains_heading(&bullet_headings(&w), 0.0));
        w.advance(100);
        p.update(&mut w);
        // Whole ring advanced by spin_speed.
        assert!(contains_heading(&bullet_headings(&w), 15.0));
        assert!(contains_heading(&bullet_headings(&w), 105.0));
    }

    #[test]
    fn test_burst_releases_one_bullet_per_inner_delay() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 450.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
        let mut p = Pattern::burst(site, player, "pellet", SCALE, 3, 2000, 5.0, 0.0,
            40.0, 50, false);

        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 1);
        w.advance(49);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 1);
        w.advance(1);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 2);
        w.advance(50);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 3);

        // Queue exhausted: the outer delay re-arms only after the closing
        // update, and no new burst starts while one is in progress.
        w.advance(50);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 3);
        w.advance(100);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 3);
        w.advance(2000);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 4);
    }

    #[test]
    fn test_burst_first_bullet_releases_on_arming_update() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 450.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
        // Arm while the clock is still younger than the inner delay.
        w.advance(10);
        let mut p = Pattern::burst(site, player, "pellet", SCALE, 3, 2000, 5.0, 0.0,
            40.0, 50, false);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 1);

        let mut m = Pattern::missile_burst(site, player, "rocket", Vec2::splat(20.0), 2, 1000,
            4.0, 0.0, 30.0, 50, 3.0, 5000);
        m.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 2);
    }

    #[test]
    fn test_missile_burst_spawns_homing_missiles() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 100.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 700.0), 3, Vec2::splat(40.0));
        let mut p = Pattern::missile_burst(site, player, "rocket", Vec2::splat(20.0), 2, 1000,
            4.0, 0.0, 30.0, 0, 3.0, 5000);
        p.update(&mut w);
        p.update(&mut w);
        let ids = w.group_ids(GroupId::Bullets);
        assert_eq!(ids.len(), 2);
        for id in ids {
            let e = w.get(id).unwrap();
            assert!(matches!(e.kind, EntityKind::Missile { target, .. } if target == player));
        }
    }

    #[test]
    fn test_laser_pattern_spawns_beams_exactly_once() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 300.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
        let mut p = Pattern::rotating_laser(site, player, "laser_red", 30, 4, 500, 1000, 2.0);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Lasers), 4);
        for _ in 0..10 {
            w.advance(16);
            p.update(&mut w);
        }
        assert_eq!(w.group_len(GroupId::Lasers), 4);
    }

    #[test]
    fn test_single_laser_accumulates_spin() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 300.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
        let mut p = Pattern::single_laser(site, player, "laser_red", 30, 0.0, 500, 1000, 5.0);
        p.update(&mut w);
        p.update(&mut w);
        p.update(&mut w);
        let beam = w.group_ids(GroupId::Lasers)[0];
        let EntityKind::Laser(ls) = &w.get(beam).unwrap().kind else {
            panic!("expected a laser");
        };
        assert_eq!(ls.angle, 15.0);
    }

    #[test]
    fn test_fan_laser_steers_shortest_path_across_wrap() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 300.0), 0);
        // Directly below: base aim is 180 from up.
        let player = w.spawn_player("f16", Vec2::new(400.0, 700.0), 3, Vec2::splat(40.0));
        let mut p = Pattern::fan_laser(site, player, "laser_red", 20, 1, 500, 1000, 0.0,
            true, 4.0);
        p.update(&mut w);
        let PatternKind::FanLaser { offset, .. } = p.kind else { unreachable!() };
        assert!((offset - 180.0).abs() < 0.01);

        // Move the target just across the up axis on the other side; the
        // offset must cross through 0/360, never swing the long way.
        let mut p = Pattern::fan_laser(site, player, "laser_red", 20, 1, 500, 1000, 0.0,
            true, 4.0);
        p.update(&mut w);
        if let PatternKind::FanLaser { offset, .. } = &mut p.kind {
            *offset = 350.0;
        }
        w.get_mut(player).unwrap().pos = Vec2::new(470.0, -100.0);
        p.update(&mut w);
        let PatternKind::FanLaser { offset, .. } = p.kind else { unreachable!() };
        assert!((offset - 354.0).abs() < 0.01, "offset={offset}");
    }

    #[test]
    fn test_dead_owner_stops_production_but_teardown_works() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 450.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
        let mut p = Pattern::circle(site, player, "pellet", SCALE, 4, 100, 5.0, 0.0, false);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 4);
        w.kill(site);
        w.tick();
        w.advance(200);
        p.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 4);
        p.kill_projectiles(&mut w);
        assert!(!p.active);
        w.tick();
        assert_eq!(w.group_len(GroupId::Bullets), 0);
    }

    #[test]
    fn test_compound_pattern_updates_and_tears_down_as_unit() {
        let mut w = test_world();
        let site = w.spawn_site(Vec2::new(400.0, 450.0), 0);
        let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
        let a = Pattern::circle(site, player, "pellet", SCALE, 2, 100, 5.0, 0.0, false);
        let b = Pattern::line(site, player, "pellet", SCALE, 3, 100, 5.0, 0.0, false);
        let mut c = CompoundPattern::new(vec![a, b]);
        c.update(&mut w);
        assert_eq!(w.group_len(GroupId::Bullets), 5);
        c.kill_projectiles(&mut w);
        assert!(!c.active);
        assert!(c.patterns.iter().all(|p| !p.active));
        w.tick();
        assert_eq!(w.group_len(GroupId::Bullets), 0);
    }

    proptest! {
        /// No two consecutive shots ever land closer together than the
        /// configured delay, for arbitrary delays and tick rates.
        #[test]
        fn prop_cadence_never_beats_delay(
            delay in 1u64..1500,
            dt in 5u64..40,
        ) {
            let mut w = test_world();
            let site = w.spawn_site(Vec2::new(400.0, 450.0), 0);
            let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
            let mut p = Pattern::circle(site, player, "pellet", SCALE, 1, delay, 0.0, 0.0, false);
            let mut fire_times = Vec::new();
            let mut seen = 0;
            for _ in 0..400 {
                p.update(&mut w);
                let count = w.group_len(GroupId::Bullets);
                if count > seen {
                    seen = count;
                    fire_times.push(w.now_ms);
                }
                w.advance(dt);
            }
            prop_assert!(fire_times.len() >= 2);
            for pair in fire_times.windows(2) {
                prop_assert!(pair[1] - pair[0] >= delay);
            }
        }

        /// Fan emission headings are symmetric about the aim heading for any
        /// bullet count.
        #[test]
        fn prop_fan_symmetric_about_aim(n in 1u32..=50) {
            let mut w = test_world();
            let site = w.spawn_site(Vec2::new(400.0, 100.0), 0);
            // Target straight below: the aim heading is 0 from down.
            let player = w.spawn_player("f16", Vec2::new(400.0, 700.0), 3, Vec2::splat(40.0));
            let angles: Vec<f32> = (0..n).map(|i| i as f32 * 10.0).collect();
            let mut p = Pattern::fan(site, player, "pellet", SCALE, angles, 500, 4.0, 0.0, true);
            p.update(&mut w);
            let headings = bullet_headings(&w);
            prop_assert_eq!(headings.len(), n as usize);
            let mut offsets: Vec<f32> = headings
                .iter()
                .map(|h| shortest_angle_diff(0.0, *h))
                .collect();
            offsets.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for i in 0..offsets.len() {
                let mirror = offsets[offsets.len() - 1 - i];
                prop_assert!((offsets[i] + mirror).abs() < 0.01);
            }
        }

        /// Snowflake spin accumulates mod 360 and spacing stays even.
        #[test]
        fn prop_snowflake_spacing_even(n in 1u32..20, spin in 0.0f32..90.0) {
            let mut w = test_world();
            let site = w.spawn_site(Vec2::new(400.0, 450.0), 0);
            let player = w.spawn_player("f16", Vec2::new(400.0, 800.0), 3, Vec2::splat(40.0));
            let mut p = Pattern::snowflake(site, player, "pellet", SCALE, n, 10, 5.0, 0.0,
                false, spin);
            for _ in 0..3 {
                p.update(&mut w);
                w.advance(10);
            }
            let all = w.group_ids(GroupId::Bullets);
            prop_assert_eq!(all.len(), 3 * n as usize);
            // Check the last shot's ring spacing.
            let mut headings: Vec<f32> = all[all.len() - n as usize..]
                .iter()
                .filter_map(|id| w.get(*id))
                .map(|e| normalize_deg(angle_from_down(e.vel)))
                .collect();
            headings.sort_by(|a, b| a.partial_cmp(b).unwrap());
            if n > 1 {
                for i in 0..headings.len() - 1 {
                    let gap = headings[i + 1] - headings[i];
                    prop_assert!((gap - 360.0 / n as f32).abs() < 0.05);
                }
            }
        }
    }
}
