//! Overlap tests between entities
//!
//! Projectiles use pixel-mask overlap, bombs use coarse rectangle overlap,
//! and lasers test target masks against an oriented beam strip. Every entity
//! rectangle is centred on its position.

use glam::Vec2;

use crate::assets::{BeamOrientation, SpriteMask};

/// Pixel-precise overlap between two masks centred at `a_center`/`b_center`
pub fn masks_overlap(
    a: &SpriteMask,
    a_center: Vec2,
    b: &SpriteMask,
    b_center: Vec2,
) -> bool {
    let a_topleft = a_center - Vec2::new(a.width() as f32, a.height() as f32) / 2.0;
    let b_topleft = b_center - Vec2::new(b.width() as f32, b.height() as f32) / 2.0;
    let offset = b_topleft - a_topleft;
    a.overlap(b, (offset.x.round() as i32, offset.y.round() as i32))
}

/// Axis-aligned rectangle overlap between rects centred at the given positions
pub fn rects_overlap(a_center: Vec2, a_size: Vec2, b_center: Vec2, b_size: Vec2) -> bool {
    (a_center.x - b_center.x).abs() * 2.0 < a_size.x + b_size.x
        && (a_center.y - b_center.y).abs() * 2.0 < a_size.y + b_size.y
}

/// Test a target mask against a laser beam strip.
///
/// The beam starts at `origin` and extends `beam.length` pixels along
/// `beam.dir` with the full width centred on that axis. Solid target pixels
/// are tested individually, so the check stays pixel-precise on the target
/// side the way bullet collision is.
pub fn mask_hits_beam(
    target: &SpriteMask,
    target_center: Vec2,
    origin: Vec2,
    beam: &BeamOrientation,
) -> bool {
    let half_size = Vec2::new(target.width() as f32, target.height() as f32) / 2.0;

    // Cheap reject: target entirely out of the beam's reach.
    let reach = beam.length + half_size.length() + beam.width;
    if origin.distance_squared(target_center) > reach * reach {
        return false;
    }

    let topleft = target_center - half_size;
    let half_width = beam.width / 2.0;
    for y in 0..target.height() {
        for x in 0..target.width() {
            if !target.get(x, y) {
                continue;
            }
            let p = topleft + Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let d = p - origin;
            let along = d.dot(beam.dir);
            if along < 0.0 || along > beam.length {
                continue;
            }
            let across = d.x * beam.dir.y - d.y * beam.dir.x;
            if across.abs() <= half_width {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading_up;

    #[test]
    fn test_masks_overlap_by_center_distance() {
        let a = SpriteMask::solid(10, 10);
        let b = SpriteMask::solid(10, 10);
        assert!(masks_overlap(&a, Vec2::new(0.0, 0.0), &b, Vec2::new(9.0, 0.0)));
        assert!(!masks_overlap(&a, Vec2::new(0.0, 0.0), &b, Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn test_rects_overlap() {
        let size = Vec2::new(20.0, 10.0);
        assert!(rects_overlap(Vec2::ZERO, size, Vec2::new(19.0, 0.0), size));
        assert!(!rects_overlap(Vec2::ZERO, size, Vec2::new(20.0, 0.0), size));
        assert!(!rects_overlap(Vec2::ZERO, size, Vec2::new(0.0, 10.0), size));
    }

    #[test]
    fn test_beam_hits_target_on_axis() {
        let target = SpriteMask::solid(10, 10);
        let beam = BeamOrientation {
            dir: heading_up(0.0),
            width: 8.0,
            length: 500.0,
        };
        let origin = Vec2::new(100.0, 600.0);
        // Straight up from the origin.
        assert!(mask_hits_beam(&target, Vec2::new(100.0, 300.0), origin, &beam));
        // Behind the firing point.
        assert!(!mask_hits_beam(&target, Vec2::new(100.0, 700.0), origin, &beam));
        // Off to the side.
        assert!(!mask_hits_beam(&target, Vec2::new(130.0, 300.0), origin, &beam));
        // Past the tip.
        assert!(!mask_hits_beam(&target, Vec2::new(100.0, 50.0), origin, &beam));
    }

    #[test]
    fn test_beam_rotated_heading() {
        let target = SpriteMask::solid(6, 6);
        let beam = BeamOrientation {
            dir: heading_up(90.0),
            width: 10.0,
            length: 400.0,
        };
        // heading_up(90) points along +x.
        let origin = Vec2::new(50.0, 50.0);
        assert!(mask_hits_beam(&target, Vec2::new(300.0, 50.0), origin, &beam));
        assert!(!mask_hits_beam(&target, Vec2::new(50.0, 300.0), origin, &beam));
    }

    #[test]
    fn test_beam_respects_target_mask_pixels() {
        // Only the far corner pixel is solid; the beam misses it but would
        // have hit a solid rectangle of the same size.
        let mut target = SpriteMask::empty(40, 40);
        target.set(39, 39);
        let beam = BeamOrientation {
            dir: heading_up(0.0),
            width: 4.0,
            length: 500.0,
        };
        let origin = Vec2::new(100.0, 600.0);
        assert!(!mask_hits_beam(&target, Vec2::new(85.0, 300.0), origin, &beam));
        let solid = SpriteMask::solid(40, 40);
        assert!(mask_hits_beam(&solid, Vec2::new(85.0, 300.0), origin, &beam));
    }
}
