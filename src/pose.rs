/*

    Turn a box measured in a basis into the cage's world
    placement.

    The box was computed in the rotated frame, so only its
    center has to be brought back to world space:

        location = rotation * ((min + max) / 2)
        rotation = basis rotation
        scale    = |max - min|

    A flat axis gives a zero scale on that axis, that is the
    deformer's business, not ours.

    @date: Oct, 2025
    @author: bartu
*/

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};

use crate::bbox::BBox;
use crate::prelude::*;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SmartDefault)]
pub enum OrientationBasis {
    Global,
    #[default]
    Local,
    Cursor,
}

impl OrientationBasis {
    /// Rotation the box is measured in. `reference` is the active object's
    /// rotation for Local, the cursor's for Cursor and ignored for Global.
    pub fn rotation(&self, reference: &Quaternion) -> Quaternion {
        match self {
            OrientationBasis::Global => Quaternion::IDENTITY,
            OrientationBasis::Local | OrientationBasis::Cursor => *reference,
        }
    }
}

impl fmt::Display for OrientationBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrientationBasis::Global => "Global",
            OrientationBasis::Local => "Local",
            OrientationBasis::Cursor => "Cursor",
        };
        f.write_str(s)
    }
}

impl FromStr for OrientationBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" | "0" => Ok(OrientationBasis::Global),
            "local" | "1" => Ok(OrientationBasis::Local),
            "cursor" | "2" => Ok(OrientationBasis::Cursor),
            _ => Err(format!("unknown orientation '{s}', expected Global, Local or Cursor")),
        }
    }
}

impl<'de> Deserialize<'de> for OrientationBasis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CagePose {
    pub location: Vector3,
    pub rotation: Quaternion,
    pub scale: Vector3,
}

impl CagePose {
    /// Rotation as the XYZ euler triple (radians) the host stores on objects
    pub fn rotation_euler(&self) -> Vector3 {
        euler_xyz_from_quat(&self.rotation)
    }

    pub fn matrix(&self) -> Matrix4 {
        compose(self.location, self.rotation, self.scale)
    }
}

pub fn solve_pose(bbox: &BBox, basis: OrientationBasis, reference_rotation: &Quaternion) -> CagePose {
    let rotation = basis.rotation(reference_rotation);
    let offset = bbox.center();

    let location = match basis {
        OrientationBasis::Global => offset,
        OrientationBasis::Local | OrientationBasis::Cursor => rotation * offset,
    };
    let scale = bbox.extents();

    if approx_zero(scale.x) || approx_zero(scale.y) || approx_zero(scale.z) {
        debug!("Cage has a flat axis, scale is {}", scale);
    }

    CagePose {
        location,
        rotation,
        scale,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::compute_bounds;
    use crate::interval::Interval;

    fn unit_cube_corners() -> Vec<Vector3> {
        let int = Interval::new(-1.0, 1.0);
        BBox::new_from(&int, &int, &int).corners().to_vec()
    }

    #[test]
    fn test_global_unit_cube() {
        let bbox = compute_bounds(&unit_cube_corners(), &Quaternion::IDENTITY).unwrap();
        let pose = solve_pose(&bbox, OrientationBasis::Global, &Quaternion::from_rotation_x(1.0));
        assert_eq!(pose.location, Vector3::ZERO);
        assert_eq!(pose.rotation, Quaternion::IDENTITY);
        assert_eq!(pose.scale, Vector3::splat(2.0));
    }

    #[test]
    fn test_solve_twice_is_bit_identical() {
        let reference = Quaternion::from_rotation_z(0.25) * Quaternion::from_rotation_y(0.5);
        let points = vec![
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(-4.0, 0.5, 2.0),
            Vector3::new(0.0, -1.5, 7.0),
        ];
        for basis in [OrientationBasis::Global, OrientationBasis::Local, OrientationBasis::Cursor] {
            let bbox = compute_bounds(&points, &basis.rotation(&reference)).unwrap();
            let first = solve_pose(&bbox, basis, &reference);
            let second = solve_pose(&bbox, basis, &reference);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_local_basis_reprojects_center() {
        // Box spanning x in [2, 4] measured in a frame rotated 90 degrees around Z
        let rot = Quaternion::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let bbox = BBox::new_from(&Interval::new(2.0, 4.0), &Interval::new(-1.0, 1.0), &Interval::new(0.0, 2.0));
        let pose = solve_pose(&bbox, OrientationBasis::Local, &rot);

        // Local x axis points along world y
        assert!(pose.location.abs_diff_eq(Vector3::new(0.0, 3.0, 1.0), 1e-12));
        assert_eq!(pose.rotation, rot);
        assert_eq!(pose.scale, Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_flat_axis_is_allowed() {
        let points = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(2.0, 4.0, 1.0)];
        let bbox = compute_bounds(&points, &Quaternion::IDENTITY).unwrap();
        let pose = solve_pose(&bbox, OrientationBasis::Global, &Quaternion::IDENTITY);
        assert_eq!(pose.scale, Vector3::new(2.0, 4.0, 0.0));
        assert_eq!(pose.location, Vector3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn test_cage_matrix_maps_unit_cube_onto_points() {
        // Lattice points live in [-0.5, 0.5]^3, the pose matrix must map them onto the box corners
        let reference = Quaternion::from_rotation_x(0.3);
        let points: Vec<Vector3> = unit_cube_corners().iter().map(|p| reference * (*p * Vector3::new(1.0, 2.0, 3.0) + Vector3::X)).collect();
        let bbox = compute_bounds(&points, &reference).unwrap();
        let pose = solve_pose(&bbox, OrientationBasis::Local, &reference);

        let mapped = transform_point(&pose.matrix(), &Vector3::splat(0.5));
        let expected = reference * Vector3::new(2.0, 2.0, 3.0);
        assert!(mapped.abs_diff_eq(expected, 1e-9));
    }

    #[test]
    fn test_orientation_parsing() {
        assert_eq!("GLOBAL".parse::<OrientationBasis>(), Ok(OrientationBasis::Global));
        assert_eq!("Cursor".parse::<OrientationBasis>(), Ok(OrientationBasis::Cursor));
        assert_eq!("1".parse::<OrientationBasis>(), Ok(OrientationBasis::Local));
        assert!("view".parse::<OrientationBasis>().is_err());
        assert_eq!(OrientationBasis::default(), OrientationBasis::Local);
    }
}
