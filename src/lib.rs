//! Renegade core - runtime for a vertically scrolling shoot-'em-up
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collision, patterns, bosses, stages)
//! - `assets`: Collision-mask provider trait and the laser orientation cache
//! - `config`: Difficulty and player loadout
//! - `save`: High-score persistence
//!
//! Rendering, input devices and the event-pump driver live outside this crate;
//! the simulation communicates with them through sound-cue and UI event queues
//! on the [`sim::World`].

pub mod assets;
pub mod config;
pub mod save;
pub mod sim;

pub use config::{Difficulty, Loadout};
pub use sim::World;

use glam::Vec2;

/// Playfield and timing constants
pub mod consts {
    /// Playfield width in pixels
    pub const CANVAS_WIDTH: f32 = 800.0;
    /// Side-panel height reserved for the HUD strip
    pub const PANEL_SIZE: f32 = 100.0;
    /// Playfield height in pixels (canvas plus HUD strip)
    pub const CANVAS_HEIGHT: f32 = 900.0;

    /// Background scroll speed restored after a boss fight, pixels/tick
    pub const ORIGINAL_SCROLL_SPEED: f32 = 2.0;

    /// Length of every laser beam sprite before rotation, pixels
    pub const LASER_STANDARD_LENGTH: u32 = 2000;
    /// Firing sites that scroll this far past the bottom edge are retired
    pub const SITE_DESPAWN_MARGIN: f32 = 300.0;

    /// Largest diameter a bomb shockwave can reach
    pub const BOMB_MAX_DIAMETER: f32 = 1500.0;
    /// Duration of the projectile-clearing bomb a boss drops between phases
    pub const SCREEN_CLEAR_DURATION_MS: u64 = 400;
}

/// Wrap an angle into `[0, 360)` degrees
#[inline]
pub fn normalize_deg(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

/// Signed shortest angular difference `to - from`, in `[-180, 180)` degrees
#[inline]
pub fn shortest_angle_diff(from: f32, to: f32) -> f32 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Rotate a vector by `deg` degrees (screen coordinates, y down)
#[inline]
pub fn rotate_deg(v: Vec2, deg: f32) -> Vec2 {
    let (sin, cos) = deg.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Unit heading: straight down `(0, 1)` rotated by `deg` degrees
#[inline]
pub fn heading_down(deg: f32) -> Vec2 {
    let (sin, cos) = deg.to_radians().sin_cos();
    Vec2::new(-sin, cos)
}

/// Unit heading: straight up `(0, -1)` rotated by `deg` degrees (laser convention)
#[inline]
pub fn heading_up(deg: f32) -> Vec2 {
    let (sin, cos) = deg.to_radians().sin_cos();
    Vec2::new(sin, -cos)
}

/// Angle in degrees such that `heading_down(angle)` points along `v`
#[inline]
pub fn angle_from_down(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees() - 90.0
}

/// Angle in degrees such that `heading_up(angle)` points along `v`
#[inline]
pub fn angle_from_up(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees() + 90.0
}
