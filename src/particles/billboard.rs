use glam::Vec3;

/// Direction an unrotated particle quad faces
pub const QUAD_FACING: Vec3 = Vec3::Z;

/// Rotation (axis, angle in radians) that turns a quad facing `QUAD_FACING`
/// towards the camera.
///
/// The axis is normalised. When the view direction is parallel to the quad
/// facing the axis falls back to +Y, and a camera sitting exactly on the
/// particle yields the identity rotation.
pub fn billboard_rotation(particle_pos: Vec3, camera_pos: Vec3) -> (Vec3, f32) {
    let Some(to_camera) = (camera_pos - particle_pos).try_normalize() else {
        return (Vec3::Y, 0.0);
    };

    let angle = QUAD_FACING.dot(to_camera).clamp(-1.0, 1.0).acos();
    let axis = QUAD_FACING
        .cross(to_camera)
        .try_normalize()
        .unwrap_or(Vec3::Y);

    (axis, angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_camera_in_front_needs_no_rotation() {
        let (_, angle) = billboard_rotation(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0));
        assert!(angle.abs() < 1e-6);
    }

    #[test]
    fn test_camera_to_the_side() {
        let (axis, angle) = billboard_rotation(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0));

        assert!((angle - FRAC_PI_2).abs() < 1e-5);
        // Z cross X = Y
        assert!((axis - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_camera_behind_uses_fallback_axis() {
        let (axis, angle) = billboard_rotation(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0));

        assert!((angle - PI).abs() < 1e-5);
        assert_eq!(axis, Vec3::Y);
    }

    #[test]
    fn test_coincident_camera_is_identity() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let (axis, angle) = billboard_rotation(p, p);

        assert_eq!(angle, 0.0);
        assert!(axis.is_finite());
    }

    #[test]
    fn test_rotation_maps_facing_onto_view_direction() {
        let particle = Vec3::new(0.5, 0.2, -1.0);
        let camera = Vec3::new(4.0, 3.0, 2.0);
        let (axis, angle) = billboard_rotation(particle, camera);

        let rotated = glam::Quat::from_axis_angle(axis, angle) * QUAD_FACING;
        let expected = (camera - particle).normalize();
        assert!((rotated - expected).length() < 1e-4);
    }
}
