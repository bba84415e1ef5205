//! Kinematic movers: scripted bodies (platforms, elevators, doors) that
//! characters can stand on and ride.

use crate::{
    collision::{KinematicTransform, PhysicsBodies, Vec3},
    handle::BodyId,
    motion::{angular_velocity_between, velocity_between},
};

/// Supplies the pose a mover should reach by the end of each tick.
pub trait MoverController {
    fn goal_pose(&mut self, mover: &KinematicMover, dt: f32) -> KinematicTransform;
}

/// A kinematic body moved to a goal pose every tick.
///
/// Its velocities are derived from the pose change so that riders and the
/// physics engine see consistent motion.
#[derive(Clone, Debug)]
pub struct KinematicMover {
    body: BodyId,
    initial: KinematicTransform,
    transient: KinematicTransform,
    committed: KinematicTransform,
    velocity: Vec3,
    angular_velocity: Vec3,
}

impl KinematicMover {
    pub fn new(body: BodyId, pose: KinematicTransform) -> Self {
        Self {
            body,
            initial: pose,
            transient: pose,
            committed: pose,
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
        }
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    /// Pose at the end of the last tick.
    pub fn pose(&self) -> &KinematicTransform {
        &self.committed
    }

    /// Pose at the start of the current tick.
    pub fn initial_pose(&self) -> &KinematicTransform {
        &self.initial
    }

    /// Linear velocity of the last tick (units per second).
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Angular velocity of the last tick (radians per second, scaled axis).
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Teleport. No velocity is inferred from the jump.
    pub fn set_pose(&mut self, pose: KinematicTransform) {
        self.initial = pose;
        self.transient = pose;
        self.committed = pose;
        self.velocity = Vec3::zeros();
        self.angular_velocity = Vec3::zeros();
    }

    /// Move to the controller's goal pose and write it to the body in `bodies`.
    ///
    /// A non-positive `dt` leaves the mover where it is with zero velocity.
    pub fn tick<W: PhysicsBodies + ?Sized>(
        &mut self,
        bodies: &mut W,
        controller: &mut dyn MoverController,
        dt: f32,
    ) {
        self.initial = self.committed;
        if dt <= 0.0 {
            self.velocity = Vec3::zeros();
            self.angular_velocity = Vec3::zeros();
            return;
        }

        self.transient = controller.goal_pose(self, dt);
        self.velocity = velocity_between(self.initial.position, self.transient.position, dt);
        self.angular_velocity =
            angular_velocity_between(self.initial.orientation, self.transient.orientation, dt);
        self.committed = self.transient;

        log::trace!(
            "mover {:?} to {:?} at {:?}",
            self.body,
            self.committed.position,
            self.velocity
        );
        bodies.set_kinematic_pose(self.body, &self.committed, self.velocity, self.angular_velocity);
    }
}
