//! Picks the cell an edit applies to: the grid cell nearest to a point a
//! fixed distance along the view direction.

use cgmath::{InnerSpace, Point3, Vector3};

use super::cell_key::CellKey;

/// Returns the cell `distance` units in front of `eye` along `direction`.
///
/// Each axis is rounded half-up (`-0.5` goes to `0`, `0.5` to `1`) so the
/// choice does not flip around the origin. A zero-length direction targets
/// the cell containing the eye.
pub fn target_cell(eye: Point3<f32>, direction: Vector3<f32>, distance: f32) -> CellKey {
    let offset = if direction.magnitude2() > f32::EPSILON {
        direction.normalize() * distance
    } else {
        Vector3::new(0.0, 0.0, 0.0)
    };
    let target = eye + offset;

    CellKey::encode(round_half_up(target.x), round_half_up(target.y), round_half_up(target.z))
}

fn round_half_up(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}
