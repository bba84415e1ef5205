use crate::collision::{BodyState, Quat, Vec3};

/// Displacement of a point rigidly attached to `body` over `dt` seconds.
///
/// - The linear part is `linear_velocity * dt`.
/// - The angular part rotates the lever arm from the body's center of mass by
///   `angular_velocity * dt` and takes the difference.
///
/// Returns zero for a non-positive `dt`.
#[inline]
pub fn movement_from_body(body: &BodyState, point: Vec3, dt: f32) -> Vec3 {
    if dt <= 0.0 {
        return Vec3::zeros();
    }

    let linear = body.linear_velocity * dt;

    let arm = point - body.center_of_mass;
    let rotation = Quat::from_scaled_axis(body.angular_velocity * dt);
    let angular = rotation * arm - arm;

    linear + angular
}

/// Velocity that carries `from` to `to` in `dt` seconds, zero for a non-positive `dt`.
#[inline]
pub fn velocity_between(from: Vec3, to: Vec3, dt: f32) -> Vec3 {
    if dt <= 0.0 {
        Vec3::zeros()
    } else {
        (to - from) / dt
    }
}

/// Angular velocity (scaled axis) that turns `from` into `to` in `dt` seconds.
#[inline]
pub fn angular_velocity_between(from: Quat, to: Quat, dt: f32) -> Vec3 {
    if dt <= 0.0 {
        return Vec3::zeros();
    }
    (to * from.inverse()).scaled_axis() / dt
}
