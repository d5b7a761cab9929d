//! Collision-mask assets and the laser orientation table
//!
//! The simulation never touches image data. It asks an [`AssetSource`] for a
//! bit-packed collision mask per (sprite name, size) and degrades to a solid
//! rectangle when the lookup fails. Laser beams do not carry masks at all:
//! their orientation is resolved through [`LaserOrientationCache`], a table of
//! discretised beam headings built once per laser type.

use std::collections::HashMap;

use glam::Vec2;

use crate::{heading_up, normalize_deg};

/// Bit-packed 2-D collision mask, one bit per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteMask {
    width: u32,
    height: u32,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl SpriteMask {
    /// Fully solid mask of the given size (placeholder for missing art)
    pub fn solid(width: u32, height: u32) -> Self {
        let mut mask = Self::empty(width, height);
        for word in &mut mask.bits {
            *word = u64::MAX;
        }
        mask
    }

    /// Fully transparent mask of the given size
    pub fn empty(width: u32, height: u32) -> Self {
        let w = width.max(1);
        let h = height.max(1);
        let words_per_row = (w as usize).div_ceil(64);
        Self {
            width: w,
            height: h,
            words_per_row,
            bits: vec![0; words_per_row * h as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Test one pixel; out-of-bounds reads are transparent
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let word = y as usize * self.words_per_row + (x / 64) as usize;
        self.bits[word] >> (x % 64) & 1 == 1
    }

    /// Set one pixel solid
    pub fn set(&mut self, x: u32, y: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let word = y as usize * self.words_per_row + (x / 64) as usize;
        self.bits[word] |= 1 << (x % 64);
    }

    /// True if no pixel is solid
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    /// Pixel-precise overlap test. `offset` is the position of `other`'s
    /// top-left corner relative to this mask's top-left corner.
    pub fn overlap(&self, other: &SpriteMask, offset: (i32, i32)) -> bool {
        let (ox, oy) = offset;
        let x0 = ox.max(0);
        let y0 = oy.max(0);
        let x1 = (ox + other.width as i32).min(self.width as i32);
        let y1 = (oy + other.height as i32).min(self.height as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x as u32, y as u32)
                    && other.get((x - ox) as u32, (y - oy) as u32)
                {
                    return true;
                }
            }
        }
        false
    }
}

/// Provider of collision masks, cacheable by (name, size).
///
/// Implementations must be deterministic and must not block the tick; the
/// rendering side of the project supplies one backed by real sprite alpha
/// channels, headless runs use [`SolidAssets`].
pub trait AssetSource {
    fn sprite_mask(&self, name: &str, size: (u32, u32)) -> Option<SpriteMask>;
}

/// Asset source that answers every lookup with a solid rectangle
#[derive(Debug, Default, Clone, Copy)]
pub struct SolidAssets;

impl AssetSource for SolidAssets {
    fn sprite_mask(&self, _name: &str, size: (u32, u32)) -> Option<SpriteMask> {
        Some(SpriteMask::solid(size.0, size.1))
    }
}

/// Audio cues emitted by the simulation for the audio collaborator to drain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    EnemyFire,
    EnemyDeath,
    PlayerFire,
    PlayerDeath,
    LaserOn,
    BombDeployed,
}

/// Oriented beam geometry for one discretised laser heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamOrientation {
    /// Unit direction the beam extends along
    pub dir: Vec2,
    /// Beam width in pixels
    pub width: f32,
    /// Reach from the firing point to the beam tip
    pub length: f32,
}

/// Precomputed beam orientations keyed by (laser name, width, canvas length),
/// indexed by discretised angle.
///
/// Beam canvases are `width x length` with the firing point at the canvas
/// centre, so the usable reach is half the canvas length. Keys should be
/// preloaded up front; a lookup for an unknown key builds the table on demand
/// and logs a warning, it never faults.
#[derive(Debug, Default)]
pub struct LaserOrientationCache {
    angle_step: u32,
    tables: HashMap<(String, u32, u32), Vec<BeamOrientation>>,
}

impl LaserOrientationCache {
    /// `angle_step` buckets the full circle; 1 degree matches the precision
    /// lasers are steered at.
    pub fn new(angle_step: u32) -> Self {
        Self {
            angle_step: angle_step.clamp(1, 360),
            tables: HashMap::new(),
        }
    }

    fn build_table(angle_step: u32, size: (u32, u32)) -> Vec<BeamOrientation> {
        let buckets = 360 / angle_step;
        (0..buckets)
            .map(|b| BeamOrientation {
                dir: heading_up((b * angle_step) as f32),
                width: size.0 as f32,
                length: size.1 as f32 / 2.0,
            })
            .collect()
    }

    /// Precompute every orientation for one laser type
    pub fn preload(&mut self, name: &str, size: (u32, u32)) {
        self.tables
            .entry((name.to_string(), size.0, size.1))
            .or_insert_with(|| Self::build_table(self.angle_step, size));
    }

    /// Look up the beam orientation for `angle` degrees, rounding to the
    /// nearest bucket.
    pub fn get(&mut self, name: &str, size: (u32, u32), angle: f32) -> BeamOrientation {
        let key = (name.to_string(), size.0, size.1);
        let step = self.angle_step;
        let table = self.tables.entry(key).or_insert_with(|| {
            log::warn!("laser {name} {size:?} was not preloaded, building on demand");
            Self::build_table(step, size)
        });
        let bucket = (normalize_deg(angle).round() as u32 / step) as usize % table.len();
        table[bucket]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_get_set() {
        let mut m = SpriteMask::empty(70, 3);
        assert!(m.is_empty());
        m.set(0, 0);
        m.set(69, 2);
        assert!(m.get(0, 0));
        assert!(m.get(69, 2));
        assert!(!m.get(68, 2));
        // Out of bounds reads are transparent, not a fault.
        assert!(!m.get(70, 0));
        assert!(!m.get(0, 3));
    }

    #[test]
    fn test_solid_mask_overlap() {
        let a = SpriteMask::solid(10, 10);
        let b = SpriteMask::solid(4, 4);
        assert!(a.overlap(&b, (0, 0)));
        assert!(a.overlap(&b, (9, 9)));
        assert!(!a.overlap(&b, (10, 0)));
        assert!(!a.overlap(&b, (-4, 0)));
    }

    #[test]
    fn test_sparse_mask_overlap() {
        // Two single-pixel masks only overlap when aligned.
        let mut a = SpriteMask::empty(8, 8);
        a.set(2, 3);
        let mut b = SpriteMask::empty(8, 8);
        b.set(5, 5);
        assert!(!a.overlap(&b, (0, 0)));
        assert!(a.overlap(&b, (-3, -2)));
    }

    #[test]
    fn test_cache_bucket_lookup() {
        let mut cache = LaserOrientationCache::new(1);
        cache.preload("laser_red", (40, 2000));
        let o = cache.get("laser_red", (40, 2000), 90.0);
        assert!(o.dir.abs_diff_eq(heading_up(90.0), 1e-6));
        assert!((o.length - 1000.0).abs() < 1e-6);
        // Angles round to the nearest bucket and wrap mod 360.
        let wrapped = cache.get("laser_red", (40, 2000), 450.2);
        assert!(wrapped.dir.abs_diff_eq(heading_up(90.0), 1e-6));
    }

    #[test]
    fn test_cache_builds_on_demand() {
        let mut cache = LaserOrientationCache::new(1);
        let o = cache.get("laser_blue", (20, 2000), 0.0);
        assert!(o.dir.abs_diff_eq(heading_up(0.0), 1e-6));
    }
}
