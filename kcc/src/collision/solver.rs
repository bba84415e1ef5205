//! Shared context of the solver stages for one character tick.

use super::{
    query::CollisionWorld,
    rigidbody::{ContactBuffer, ContactRecord},
    settings::{SLOPE_ANGLE_EPS_DEG, UNIT_DIRECTION_TOLERANCE},
    types::{BodyKind, CharacterShape, CollisionHit, KinematicTransform, Quat, RigidBodyContact, Vec3},
};
use crate::{
    character::CharacterConfig, controller::CharacterController, handle::ColliderId,
    utils::angle_between_deg,
};

/// Everything the solver stages read but never mutate during a tick.
pub struct Solver<'a> {
    pub world: &'a dyn CollisionWorld,
    pub controller: &'a dyn CharacterController,
    pub config: &'a CharacterConfig,
    pub shape: CharacterShape,
    /// The character's own collider, never reported to its own queries.
    pub own_collider: Option<ColliderId>,
}

impl<'a> Solver<'a> {
    pub fn new(
        world: &'a dyn CollisionWorld,
        controller: &'a dyn CharacterController,
        config: &'a CharacterConfig,
        shape: CharacterShape,
        own_collider: Option<ColliderId>,
    ) -> Self {
        Self {
            world,
            controller,
            config,
            shape,
            own_collider,
        }
    }

    pub fn accepts(&self, collider: ColliderId) -> bool {
        if Some(collider) == self.own_collider {
            return false;
        }
        !self.config.filter_collisions || self.controller.collision_valid(collider)
    }

    /// Sweep the character shape from `origin` along the unit `direction`.
    pub fn cast(
        &self,
        origin: Vec3,
        orientation: Quat,
        direction: Vec3,
        distance: f32,
    ) -> Option<CollisionHit> {
        if (direction.norm_squared() - 1.0).abs() > UNIT_DIRECTION_TOLERANCE {
            log::warn!("sweep direction {direction:?} is not unit length");
        }
        let pose = KinematicTransform::new(origin, orientation);
        self.world.sweep(
            &self.shape,
            &pose,
            &direction,
            distance,
            self.config.collision_mask,
            &|collider| self.accepts(collider),
        )
    }

    /// Like [`Self::cast`], recording a contact when the hit belongs to a dynamic body.
    ///
    /// `attempted` is the displacement the character was trying to make.
    pub fn cast_recording(
        &self,
        contacts: &mut ContactBuffer,
        origin: Vec3,
        orientation: Quat,
        direction: Vec3,
        distance: f32,
        attempted: Vec3,
    ) -> Option<CollisionHit> {
        let hit = self.cast(origin, orientation, direction, distance)?;
        self.record_contact(contacts, &hit, attempted);
        Some(hit)
    }

    fn record_contact(&self, contacts: &mut ContactBuffer, hit: &CollisionHit, attempted: Vec3) {
        let Some(body) = hit.body else {
            return;
        };
        let Some(state) = self.world.body(body) else {
            return;
        };
        if state.kind != BodyKind::Dynamic {
            return;
        }
        let contact = RigidBodyContact {
            body,
            point: hit.point,
            normal: hit.normal,
            character_velocity: attempted,
            body_velocity: state.linear_velocity,
        };
        if contacts.record(contact) == ContactRecord::Overflow && contacts.dropped() == 1 {
            log::warn!(
                "rigidbody contact buffer full ({} entries), dropping contacts this tick",
                contacts.len()
            );
        }
    }

    /// A surface is walkable when its normal is within the slope limit of up.
    pub fn is_stable_ground(&self, normal: Vec3, gravity: Vec3) -> bool {
        is_stable_ground(normal, gravity, self.config.max_slope_angle)
    }

    /// Ground tag filter. Passes everything when no tags are configured.
    pub fn has_ground_tag(&self, hit: &CollisionHit) -> bool {
        self.config
            .ground_tags
            .is_none_or(|tags| hit.tags.intersects(tags))
    }
}

pub fn is_stable_ground(normal: Vec3, gravity: Vec3, max_slope_angle: f32) -> bool {
    angle_between_deg(-gravity, normal) <= max_slope_angle + SLOPE_ANGLE_EPS_DEG
}
