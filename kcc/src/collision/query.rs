//! Capabilities the controller needs from a physics backend.
//!
//! [`CollisionQueryProvider`] answers geometric questions about the character's
//! shape. [`PhysicsBodies`] exposes the rigid bodies behind colliders so the
//! controller can ride movers and push dynamic bodies. Backends implement both;
//! [`CollisionWorld`] names the combination.

use super::types::{BodyState, CharacterShape, CollisionHit, KinematicTransform, Vec3};
use crate::handle::{BodyId, ColliderId};

/// Collider filter applied by the backend before reporting a collider.
pub type ColliderFilter<'a> = &'a dyn Fn(ColliderId) -> bool;

pub trait CollisionQueryProvider {
    /// Sweep `shape` from `pose` along the unit `direction` for up to `max_distance`.
    ///
    /// Returns the closest accepted hit. A cast that starts embedded in a collider
    /// reports that collider at distance zero. Colliders outside `layer_mask` or
    /// rejected by `filter` are ignored.
    fn sweep(
        &self,
        shape: &CharacterShape,
        pose: &KinematicTransform,
        direction: &Vec3,
        max_distance: f32,
        layer_mask: u32,
        filter: ColliderFilter<'_>,
    ) -> Option<CollisionHit>;

    /// Colliders overlapping `shape` placed at `pose`.
    fn overlap(
        &self,
        shape: &CharacterShape,
        pose: &KinematicTransform,
        layer_mask: u32,
        filter: ColliderFilter<'_>,
    ) -> Vec<ColliderId>;

    /// Minimum translation separating `shape` at `pose` from `other`.
    ///
    /// Returns the unit push direction (applied to the character) and the depth,
    /// or `None` when the two do not penetrate.
    fn penetration(
        &self,
        shape: &CharacterShape,
        pose: &KinematicTransform,
        other: ColliderId,
    ) -> Option<(Vec3, f32)>;
}

pub trait PhysicsBodies {
    /// Current motion state of `body`, or `None` if it no longer exists.
    fn body(&self, body: BodyId) -> Option<BodyState>;

    /// Apply an instantaneous impulse at a world-space point, waking the body.
    fn apply_impulse_at_point(&mut self, body: BodyId, impulse: Vec3, point: Vec3);

    /// Move a kinematic body to `pose` and record its velocities (per second).
    fn set_kinematic_pose(
        &mut self,
        body: BodyId,
        pose: &KinematicTransform,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
    );
}

/// A backend that answers queries and exposes its bodies.
pub trait CollisionWorld: CollisionQueryProvider + PhysicsBodies {}

impl<T: CollisionQueryProvider + PhysicsBodies> CollisionWorld for T {}
