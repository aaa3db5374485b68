/*

    Bounding box measured in a rotated basis.

    compute_bounds( ) brings every world-space point into
    basis-local space with the inverse of the basis rotation
    and folds three independent Intervals, one per axis.
    Min/max are exact so the result does not depend on the
    order of the points.

    @author: bartu
    @date: 9 Nov, 2025
*/


use crate::prelude::*;

use crate::error::{CageError, CageResult};
use crate::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl BBox {
    pub fn new_from(xint: &Interval, yint: &Interval, zint: &Interval) -> Self {

        assert!(xint.validate() && yint.validate() && zint.validate(), "Invalid interval, found max < min");
        Self {
            x: *xint,
            y: *yint,
            z: *zint,
        }
    }

    pub fn min(&self) -> Vector3 {
        Vector3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vector3 {
        Vector3::new(self.x.max, self.y.max, self.z.max)
    }

    pub fn center(&self) -> Vector3 {
        (self.min() + self.max()) * 0.5
    }

    /// Component-wise absolute size, zero along a flat axis
    pub fn extents(&self) -> Vector3 {
        (self.max() - self.min()).abs()
    }

    /// Corners in the same order the host reports an object's bound box:
    ///
    ///   (-,-,-) (-,-,+) (-,+,+) (-,+,-) (+,-,-) (+,-,+) (+,+,+) (+,+,-)
    pub fn corners(&self) -> [Vector3; 8] {
        let (x0, x1) = (self.x.min, self.x.max);
        let (y0, y1) = (self.y.min, self.y.max);
        let (z0, z1) = (self.z.min, self.z.max);
        [
            Vector3::new(x0, y0, z0),
            Vector3::new(x0, y0, z1),
            Vector3::new(x0, y1, z1),
            Vector3::new(x0, y1, z0),
            Vector3::new(x1, y0, z0),
            Vector3::new(x1, y0, z1),
            Vector3::new(x1, y1, z1),
            Vector3::new(x1, y1, z0),
        ]
    }
}

impl Default for BBox {
    /// Zero sized box at the origin, what the host reports for an object without geometry
    fn default() -> Self {
        let zero = Interval::new(0.0, 0.0);
        Self::new_from(&zero, &zero, &zero)
    }
}

pub trait BBoxable {
    fn get_bbox(&self) -> Option<BBox>;
}

impl BBoxable for [Vector3] {
    /// Axis aligned box in the points' own frame, None if there are no points
    fn get_bbox(&self) -> Option<BBox> {
        compute_bounds(self, &Quaternion::IDENTITY).ok()
    }
}

/// Compute the box of `points` in the frame rotated by `basis_rotation`.
///
/// Returns CageError::EmptyInput if there are no points, callers are
/// expected to check that before getting here. NaN or infinite input
/// is CageError::NonFinite.
pub fn compute_bounds(points: &[Vector3], basis_rotation: &Quaternion) -> CageResult<BBox> {
    if points.is_empty() {
        return Err(CageError::EmptyInput);
    }
    if !basis_rotation.is_finite() {
        return Err(CageError::NonFinite("basis rotation"));
    }

    let to_basis = basis_rotation.inverse();
    let (mut xint, mut yint, mut zint) = (Interval::EMPTY, Interval::EMPTY, Interval::EMPTY);
    for p in points {
        let v = to_basis * *p;
        if !v.is_finite() {
            return Err(CageError::NonFinite("point"));
        }

        xint.expand(v.x);
        yint.expand(v.y);
        zint.expand(v.z);
    }

    debug!("Bounds of {} points: x {:?}, y {:?}, z {:?}", points.len(), xint, yint, zint);
    // every interval saw at least one finite value, no validation needed
    Ok(BBox { x: xint, y: yint, z: zint })
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

    fn cube_points() -> Vec<Vector3> {
        let int = Interval::new(-1.0, 1.0);
        BBox::new_from(&int, &int, &int).corners().to_vec()
    }

    fn scattered_points() -> Vec<Vector3> {
        vec![
            Vector3::new(0.3, -2.0, 1.5),
            Vector3::new(4.0, 0.25, -0.75),
            Vector3::new(-1.25, 3.5, 0.0),
            Vector3::new(2.0, 2.0, 2.0),
            Vector3::new(-0.5, -0.5, 6.0),
            Vector3::new(1.0, -3.0, -2.5),
        ]
    }

    #[test]
    fn test_empty_points_is_an_error() {
        let res = compute_bounds(&[], &Quaternion::IDENTITY);
        assert!(matches!(res, Err(CageError::EmptyInput)));
    }

    #[test]
    fn test_non_finite_input_is_an_error() {
        let nan_basis = Quaternion::from_xyzw(Float::NAN, 0.0, 0.0, 1.0);
        assert!(matches!(compute_bounds(&cube_points(), &nan_basis), Err(CageError::NonFinite(_))));

        let mut points = cube_points();
        points.push(Vector3::new(0.0, Float::INFINITY, 0.0));
        assert!(matches!(compute_bounds(&points, &Quaternion::IDENTITY), Err(CageError::NonFinite(_))));
    }

    #[test]
    fn test_identity_basis_gives_world_box() {
        let bbox = compute_bounds(&cube_points(), &Quaternion::IDENTITY).unwrap();
        assert_eq!(bbox.min(), Vector3::splat(-1.0));
        assert_eq!(bbox.max(), Vector3::splat(1.0));
        assert_eq!(bbox.extents(), Vector3::splat(2.0));
        assert_eq!(bbox.center(), Vector3::ZERO);
    }

    #[test]
    fn test_single_point_is_flat() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        let bbox = compute_bounds(&[p], &Quaternion::IDENTITY).unwrap();
        assert_eq!(bbox.extents(), Vector3::ZERO);
        assert_eq!(bbox.center(), p);
    }

    #[test]
    fn test_permutation_does_not_change_bounds() {
        let basis = Quaternion::from_rotation_y(0.7) * Quaternion::from_rotation_x(-0.2);
        let points = scattered_points();
        let reference = compute_bounds(&points, &basis).unwrap();

        let mut rng = StdRng::seed_from_u64(795);
        for _ in 0..16 {
            let mut shuffled = points.clone();
            shuffled.shuffle(&mut rng);
            // exact min/max, bit identical
            assert_eq!(compute_bounds(&shuffled, &basis).unwrap(), reference);
        }
    }

    #[test]
    fn test_rotating_points_and_basis_together() {
        let basis = Quaternion::from_rotation_z(0.4);
        let rigid = Quaternion::from_rotation_x(1.1) * Quaternion::from_rotation_y(-0.6);
        let points = scattered_points();

        let before = compute_bounds(&points, &basis).unwrap();
        let rotated: Vec<Vector3> = points.iter().map(|p| rigid * *p).collect();
        let after = compute_bounds(&rotated, &(rigid * basis)).unwrap();

        assert!(before.min().abs_diff_eq(after.min(), 1e-9));
        assert!(before.max().abs_diff_eq(after.max(), 1e-9));
    }

    #[test]
    fn test_rotated_basis_measures_rotated_cube_tightly() {
        // A cube spun 45 degrees around Z is measured with its own rotation as basis
        let spin = Quaternion::from_rotation_z(std::f64::consts::FRAC_PI_4);
        let points: Vec<Vector3> = cube_points().iter().map(|p| spin * *p).collect();

        let loose = compute_bounds(&points, &Quaternion::IDENTITY).unwrap();
        let tight = compute_bounds(&points, &spin).unwrap();

        assert!(tight.extents().abs_diff_eq(Vector3::splat(2.0), 1e-12));
        assert!(loose.extents().x > 2.8);
    }

    #[test]
    fn test_corner_order() {
        let bbox = BBox::new_from(&Interval::new(0.0, 1.0), &Interval::new(0.0, 2.0), &Interval::new(0.0, 3.0));
        let c = bbox.corners();
        assert_eq!(c[0], Vector3::ZERO);
        assert_eq!(c[1], Vector3::new(0.0, 0.0, 3.0));
        assert_eq!(c[6], Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(c[7], Vector3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_bboxable_slice() {
        let empty: Vec<Vector3> = vec![];
        assert!(empty.as_slice().get_bbox().is_none());
        let bbox = scattered_points().as_slice().get_bbox().unwrap();
        assert_eq!(bbox.min(), Vector3::new(-1.25, -3.0, -2.5));
        assert_eq!(bbox.max(), Vector3::new(4.0, 3.5, 6.0));
    }
}
