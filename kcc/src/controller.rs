//! The owner-side capability that drives a character, and the events it receives.

use crate::{
    character::CharacterState,
    collision::{BodyState, CollisionHit, Quat, RigidBodyContact, Vec3},
    handle::{BodyId, ColliderId},
    utils::ground_tangent,
};

/// Movement requested for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveIntent {
    /// Displacement in the character's local frame. Local +Y is up.
    pub displacement: Vec3,
    /// Orientation the character should have after this tick.
    pub orientation: Quat,
}

impl MoveIntent {
    pub fn new(displacement: Vec3, orientation: Quat) -> Self {
        Self {
            displacement,
            orientation,
        }
    }
}

/// Notifications produced during a tick, delivered in order once the tick commits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CharacterEvent {
    /// A sweep hit a collider.
    Collision(CollisionHit),
    /// The character was pushed out of a collider.
    Unstuck {
        collider: ColliderId,
        direction: Vec3,
        depth: f32,
    },
    /// Ground support was gained.
    Grounded(Option<CollisionHit>),
    /// Ground support was lost. Carries the rejected ground hit, if there was one.
    Ungrounded(Option<CollisionHit>),
    AttachedBody(BodyId),
    DetachedBody(BodyId),
    /// A dynamic body contact, forwarded when interactions are handled manually.
    RigidBodyInteraction(RigidBodyContact),
}

/// Drives one character: supplies its motion and reacts to what happened.
///
/// Methods that run while the solver is active take `&self`; everything that
/// may mutate the controller runs once the tick has been committed.
pub trait CharacterController {
    /// Movement for the coming tick.
    fn move_update(&mut self, state: &CharacterState) -> MoveIntent;

    /// Adjust a grounded character's world-space displacement to the ground.
    ///
    /// The default follows the ground tangent and keeps the displacement length.
    fn ground_projection(&self, displacement: Vec3, gravity: Vec3, ground_normal: Vec3) -> Vec3 {
        let len = displacement.norm();
        if len <= 0.0 {
            return Vec3::zeros();
        }
        ground_tangent(displacement / len, ground_normal, gravity) * len
    }

    /// Consulted for every collider when collision filtering is enabled.
    fn collision_valid(&self, _collider: ColliderId) -> bool {
        true
    }

    /// Consulted before attaching to a body found underfoot.
    fn can_attach_to_body(&self, _body: BodyId) -> bool {
        true
    }

    fn on_event(&mut self, _event: &CharacterEvent) {}

    /// Called each tick the character rides `body`, with the state its motion was taken from.
    fn attached_body_update(&mut self, _body: BodyId, _state: &BodyState) {}

    /// Called last, once the new pose is committed.
    fn post_update(&mut self, _state: &CharacterState) {}
}
