//! Movement policies for enemies and bosses
//!
//! A movement policy is a boxed closure run by the owning controller every
//! tick before physics integration. Per-enemy state (spawn stamps, bezier
//! progress, wander targets) lives inside the closure, so each spawned enemy
//! gets its own policy instance from a [`MovementFactory`].

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::CANVAS_WIDTH;
use crate::sim::entity::Entity;

/// World signals a movement policy may read
#[derive(Debug, Clone, Copy)]
pub struct MoveCtx {
    pub now_ms: u64,
    pub scroll_speed: f32,
}

pub type MovementFn = Box<dyn FnMut(&mut Entity, &MoveCtx)>;
pub type MovementFactory = Box<dyn Fn() -> MovementFn>;

/// Drift straight down slightly faster than the background scroll
pub fn straight_down_slow() -> MovementFn {
    Box::new(|e, ctx| {
        e.vel = Vec2::new(0.0, ctx.scroll_speed + 2.0);
    })
}

/// Enter from the left edge on a fixed diagonal
pub fn swoop_in_left() -> MovementFn {
    let mut started = false;
    Box::new(move |e, ctx| {
        if !started {
            e.vel = Vec2::new(2.5, ctx.scroll_speed + 2.0);
            started = true;
        }
    })
}

/// Enter from the right edge on a fixed diagonal
pub fn swoop_in_right() -> MovementFn {
    let mut started = false;
    Box::new(move |e, _ctx| {
        if !started {
            e.vel = Vec2::new(-2.5, 2.0);
            started = true;
        }
    })
}

/// Descend while wiggling around the spawn column
pub fn sine_wave() -> MovementFn {
    let mut anchor: Option<(f32, u64)> = None;
    Box::new(move |e, ctx| {
        let (spawn_x, start_ms) = *anchor.get_or_insert((e.pos.x, ctx.now_ms));
        let t = (ctx.now_ms - start_ms) as f32 / 1000.0;
        e.pos.x = spawn_x + 40.0 * (t * 3.0).sin();
        e.vel.y = 1.8;
    })
}

fn bezier_point(t: f32, p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Vec2 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Follow a cubic bezier path over `duration_ms`, retiring the rider when
/// the curve completes.
pub fn bezier(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, duration_ms: u64) -> MovementFn {
    let mut start: Option<u64> = None;
    Box::new(move |e, ctx| {
        let start_ms = *start.get_or_insert(ctx.now_ms);
        let t = ((ctx.now_ms - start_ms) as f32 / duration_ms as f32).min(1.0);
        e.pos = bezier_point(t, p0, p1, p2, p3);
        e.vel = Vec2::ZERO;
        if t >= 1.0 {
            e.alive = false;
        }
    })
}

/// Wander the upper playfield, picking a new target every 3 seconds
pub fn boss_random_wander(seed: u64) -> MovementFn {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut target = Vec2::new(400.0, 150.0);
    let mut last_pick: Option<u64> = None;
    Box::new(move |e, ctx| {
        let stamp = *last_pick.get_or_insert(ctx.now_ms);
        if ctx.now_ms - stamp > 3000 {
            target = Vec2::new(
                rng.random_range(100.0..=CANVAS_WIDTH - 100.0),
                rng.random_range(100.0..=300.0),
            );
            last_pick = Some(ctx.now_ms);
        }
        let direction = target - e.pos;
        if direction.length() > 1.0 {
            e.vel = direction.normalize() * 1.5;
        } else {
            e.vel = Vec2::ZERO;
        }
    })
}

pub fn stationary() -> MovementFn {
    Box::new(|e, _ctx| {
        e.vel = Vec2::ZERO;
    })
}
