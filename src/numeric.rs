/*

    Declare numeric types used throughout this crate.

    WARNING: If you like to use f32 instead of f64
    during computations, you need to change all of these
    together since bevy_math has separate types per precision:
    pub type Float = f32;
    pub type Vector3 = Vec3;
    pub type Quaternion = Quat;

    @date: 2 Oct, 2025
    @author: Bartu
*/

use bevy_math::{DMat3, DMat4, DQuat, DVec3, DVec4, EulerRot};
pub type Float = f64; // WARNING: If you want to change it to f32, don't forget to update the types below
pub type Vector3 = DVec3;
pub type Vector4 = DVec4;
pub type Matrix4 = DMat4;
pub type Quaternion = DQuat;

pub fn approx_zero(x: Float) -> bool {
    x.abs() < 1e-8
}

pub fn transform_point(mat: &Matrix4, v: &Vector3) -> Vector3 {
    let v4 = Vector4::new(v.x, v.y, v.z, 1.0);
    let r = *mat * v4;
    Vector3::new(r.x, r.y, r.z)
}

/// Rotation part of a world matrix with scale and shear discarded.
/// Equivalent of asking the host for `matrix_world.to_quaternion()`.
///
/// Columns are orthonormalized in x, y, z order and an axis scaled to
/// zero is rebuilt from the surviving ones. A matrix with no usable axis
/// gives the identity. Mirrored matrices flip x, like a negative x scale.
pub fn rotation_of(mat: &Matrix4) -> Quaternion {
    let columns = [mat.x_axis.truncate(), mat.y_axis.truncate(), mat.z_axis.truncate()];

    let mut axes: [Option<Vector3>; 3] = [None; 3];
    for (i, column) in columns.iter().enumerate() {
        let mut v = *column;
        for kept in axes.iter().flatten() {
            v -= *kept * v.dot(*kept);
        }
        if v.is_finite() && !approx_zero(v.length()) {
            axes[i] = Some(v.normalize());
        }
    }

    let [x, y, z] = match axes {
        [Some(x), Some(y), Some(z)] => {
            if x.cross(y).dot(z) < 0.0 { [-x, y, z] } else { [x, y, z] }
        }
        [None, None, None] => return Quaternion::IDENTITY,
        _ => {
            // Seed a second axis if only one survived, x cross y = z cyclically
            if axes.iter().flatten().count() == 1 {
                let i = axes.iter().position(Option::is_some).unwrap_or(0);
                let known = axes[i].unwrap_or(Vector3::X);
                axes[(i + 1) % 3] = Some(known.any_orthonormal_vector());
            }
            let missing = axes.iter().position(Option::is_none).unwrap_or(0);
            let a = axes[(missing + 1) % 3].unwrap_or(Vector3::X);
            let b = axes[(missing + 2) % 3].unwrap_or(Vector3::Y);
            axes[missing] = Some(a.cross(b));
            [
                axes[0].unwrap_or(Vector3::X),
                axes[1].unwrap_or(Vector3::Y),
                axes[2].unwrap_or(Vector3::Z),
            ]
        }
    };
    Quaternion::from_mat3(&DMat3::from_cols(x, y, z)).normalize()
}

/// Compose a world matrix from location, rotation and scale
pub fn compose(location: Vector3, rotation: Quaternion, scale: Vector3) -> Matrix4 {
    Matrix4::from_scale_rotation_translation(scale, rotation, location)
}

/// Euler angles (radians) in the host's XYZ convention: X is applied first,
/// then Y, then Z, i.e. R = Rz * Ry * Rx.
pub fn quat_from_euler_xyz(angles: Vector3) -> Quaternion {
    Quaternion::from_euler(EulerRot::ZYX, angles.z, angles.y, angles.x)
}

/// Inverse of quat_from_euler_xyz( )
pub fn euler_xyz_from_quat(q: &Quaternion) -> Vector3 {
    let (z, y, x) = q.to_euler(EulerRot::ZYX);
    Vector3::new(x, y, z)
}

pub fn degrees_to_radians(v: Vector3) -> Vector3 {
    Vector3::new(v.x.to_radians(), v.y.to_radians(), v.z.to_radians())
}

pub fn radians_to_degrees(v: Vector3) -> Vector3 {
    Vector3::new(v.x.to_degrees(), v.y.to_degrees(), v.z.to_degrees())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euler_roundtrip_single_axis() {
        let q = Quaternion::from_rotation_z(0.5);
        let e = euler_xyz_from_quat(&q);
        assert!(approx_zero(e.x));
        assert!(approx_zero(e.y));
        assert!(approx_zero(e.z - 0.5));
    }

    #[test]
    fn test_euler_order_matches_host_convention() {
        // Rotating X by 90 degrees first then Z by 90 degrees
        let angles = Vector3::new(90.0, 0.0, 90.0);
        let q = quat_from_euler_xyz(degrees_to_radians(angles));
        let expected = Quaternion::from_rotation_z(Float::to_radians(90.0)) * Quaternion::from_rotation_x(Float::to_radians(90.0));
        assert!(q.abs_diff_eq(expected, 1e-12) || q.abs_diff_eq(-expected, 1e-12));
    }

    #[test]
    fn test_rotation_of_ignores_scale() {
        let rot = Quaternion::from_rotation_y(0.3);
        let mat = compose(Vector3::new(1.0, 2.0, 3.0), rot, Vector3::new(2.0, 5.0, 0.5));
        let extracted = rotation_of(&mat);
        assert!(extracted.abs_diff_eq(rot, 1e-9) || extracted.abs_diff_eq(-rot, 1e-9));
    }

    #[test]
    fn test_rotation_of_flat_and_degenerate_matrices() {
        let rot = Quaternion::from_rotation_z(Float::to_radians(30.0));

        // one zero axis, rebuilt from the other two
        let flat = rotation_of(&compose(Vector3::ZERO, rot, Vector3::new(1.0, 1.0, 0.0)));
        assert!(flat.is_finite());
        assert!(flat.abs_diff_eq(rot, 1e-9) || flat.abs_diff_eq(-rot, 1e-9));

        // only x survives, whatever the rest is it keeps x and stays a rotation
        let line = rotation_of(&compose(Vector3::ZERO, rot, Vector3::new(3.0, 0.0, 0.0)));
        assert!(line.is_normalized());
        assert!((line * Vector3::X).abs_diff_eq(rot * Vector3::X, 1e-9));

        let collapsed = rotation_of(&compose(Vector3::ONE, rot, Vector3::ZERO));
        assert_eq!(collapsed, Quaternion::IDENTITY);
    }

    #[test]
    fn test_rotation_of_mirrored_matrix() {
        let rot = Quaternion::from_rotation_x(0.4);
        let mirrored = rotation_of(&compose(Vector3::ZERO, rot, Vector3::new(-1.0, 1.0, 1.0)));
        assert!(mirrored.abs_diff_eq(rot, 1e-9) || mirrored.abs_diff_eq(-rot, 1e-9));
    }
}
