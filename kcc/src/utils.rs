use crate::collision::{
    Quat, Vec3,
    settings::{DIST_EPS, MIN_MOVE_SQ},
};

/// Removes the component of `v` along `normal`. `normal` must be unit length.
#[inline]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(&normal)
}

/// Unit vector along `v`, or zero when `v` is too short to have a direction.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len_sq = v.norm_squared();
    if len_sq > MIN_MOVE_SQ {
        v / len_sq.sqrt()
    } else {
        Vec3::zeros()
    }
}

/// Rounds toward zero at `decimals` decimal places.
///
/// Used on direction dot products so that values like `-1e-7` from float noise
/// compare as zero.
#[inline]
pub fn round_toward_zero(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).trunc() / scale
}

/// Unsigned angle between two vectors in degrees.
#[inline]
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    // atan2 keeps precision near 0 and 180 degrees where acos does not.
    a.cross(&b).norm().atan2(a.dot(&b)).to_degrees()
}

/// Down direction for a character oriented by `orientation`.
///
/// Falls back to world down if the rotated vector degenerates.
#[inline]
pub fn gravity_from_orientation(orientation: &Quat) -> Vec3 {
    let down = orientation * Vec3::new(0.0, -1.0, 0.0);
    let n = normalize_or_zero(down);
    if n == Vec3::zeros() {
        Vec3::new(0.0, -1.0, 0.0)
    } else {
        n
    }
}

/// Direction along the ground surface that keeps the heading of `direction`.
///
/// Computed as `normalize(ground_normal x (direction x up))` with `up = -gravity`.
/// Returns zero when `direction` is parallel to `up`.
#[inline]
pub fn ground_tangent(direction: Vec3, ground_normal: Vec3, gravity: Vec3) -> Vec3 {
    let up = -gravity;
    let right = direction.cross(&up);
    normalize_or_zero(ground_normal.cross(&right))
}

/// True when all three scale components are equal within tolerance.
#[inline]
pub fn is_uniform_scale(scale: &Vec3) -> bool {
    (scale.x - scale.y).abs() <= DIST_EPS && (scale.y - scale.z).abs() <= DIST_EPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn project_on_plane_removes_normal_component() {
        let v = Vec3::new(3.0, -2.0, 1.0);
        let p = project_on_plane(v, Vec3::y());
        assert_relative_eq!(p, Vec3::new(3.0, 0.0, 1.0));
    }

    #[test]
    fn round_toward_zero_truncates_noise() {
        assert_eq!(round_toward_zero(-1.0e-7, 4), 0.0);
        assert_eq!(round_toward_zero(0.123_49, 4), 0.1234);
        assert_eq!(round_toward_zero(-0.123_49, 4), -0.1234);
    }

    #[test]
    fn angle_between_is_exact_at_right_angles() {
        assert_relative_eq!(angle_between_deg(Vec3::x(), Vec3::y()), 90.0, epsilon = 1.0e-4);
        assert_relative_eq!(angle_between_deg(Vec3::y(), Vec3::y()), 0.0, epsilon = 1.0e-4);
        assert_relative_eq!(angle_between_deg(Vec3::y(), -Vec3::y()), 180.0, epsilon = 1.0e-4);
    }

    #[test]
    fn gravity_follows_orientation() {
        let identity = Quat::identity();
        assert_relative_eq!(gravity_from_orientation(&identity), Vec3::new(0.0, -1.0, 0.0));

        let flipped = Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI);
        assert_relative_eq!(
            gravity_from_orientation(&flipped),
            Vec3::new(0.0, 1.0, 0.0),
            epsilon = 1.0e-5
        );
    }

    #[test]
    fn ground_tangent_follows_slope_and_keeps_heading() {
        let gravity = Vec3::new(0.0, -1.0, 0.0);
        // 45 degree ramp rising towards +x.
        let normal = Vec3::new(-1.0, 1.0, 0.0).normalize();
        let t = ground_tangent(Vec3::x(), normal, gravity);
        assert_relative_eq!(t, Vec3::new(1.0, 1.0, 0.0).normalize(), epsilon = 1.0e-5);

        // Flat ground leaves a horizontal direction unchanged.
        let flat = ground_tangent(Vec3::z(), Vec3::y(), gravity);
        assert_relative_eq!(flat, Vec3::z(), epsilon = 1.0e-6);

        // Purely vertical input has no heading.
        assert_eq!(ground_tangent(-Vec3::y(), Vec3::y(), gravity), Vec3::zeros());
    }

    #[test]
    fn uniform_scale_check() {
        assert!(is_uniform_scale(&Vec3::new(2.0, 2.0, 2.0)));
        assert!(!is_uniform_scale(&Vec3::new(1.0, 2.0, 1.0)));
    }
}
