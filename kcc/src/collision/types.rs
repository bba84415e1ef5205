/*!
Core collision types and math aliases shared by the collision submodules.

This module contains no algorithms. It defines the data exchanged between the
collision world (sweeps, overlaps, penetration) and the solver stages
(unstuck, sweep-and-slide, stair stepping, grounding, rigidbody interaction).

Conventions
- A character position is the center of its collider.
- Distances along a cast are measured from the cast origin along the unit direction.
- Hit normals point out of the surface that was hit, towards the character.
*/

use nalgebra as na;

use crate::{
    bitmask_flags::TagMask,
    handle::{BodyId, ColliderId},
};

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Position and orientation of a character or mover in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicTransform {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for KinematicTransform {
    fn default() -> Self {
        Self::at(Vec3::zeros())
    }
}

impl KinematicTransform {
    #[inline]
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Identity orientation at `position`.
    #[inline]
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::identity())
    }

    /// Convert to nalgebra `Isometry3` for use with parry3d narrow-phase queries.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.position.x, self.position.y, self.position.z),
            self.orientation,
        )
    }
}

/// Query shape of a character collider, in the character's local frame.
///
/// Capsules are aligned with the local +Y axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CharacterShape {
    Cuboid { half_extents: Vec3 },
    Capsule { radius: f32, half_height: f32 },
    Ball { radius: f32 },
}

impl CharacterShape {
    /// Grows every surface of the shape outward by `amount`.
    pub fn inflated(&self, amount: f32) -> Self {
        match *self {
            Self::Cuboid { half_extents } => Self::Cuboid {
                half_extents: half_extents.add_scalar(amount),
            },
            Self::Capsule {
                radius,
                half_height,
            } => Self::Capsule {
                radius: radius + amount,
                half_height,
            },
            Self::Ball { radius } => Self::Ball {
                radius: radius + amount,
            },
        }
    }

    /// Uniformly scales the shape.
    pub fn scaled(&self, scale: f32) -> Self {
        match *self {
            Self::Cuboid { half_extents } => Self::Cuboid {
                half_extents: half_extents * scale,
            },
            Self::Capsule {
                radius,
                half_height,
            } => Self::Capsule {
                radius: radius * scale,
                half_height: half_height * scale,
            },
            Self::Ball { radius } => Self::Ball {
                radius: radius * scale,
            },
        }
    }
}

/// Result of a sweep cast against the collision world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionHit {
    /// World-space contact point.
    pub point: Vec3,
    /// World-space unit normal of the surface that was hit.
    pub normal: Vec3,
    /// Distance travelled along the cast direction before contact.
    pub distance: f32,
    /// Friction coefficient of the surface material, if it has one.
    pub friction: Option<f32>,
    pub collider: Option<ColliderId>,
    pub body: Option<BodyId>,
    pub tags: TagMask,
}

impl CollisionHit {
    /// Sentinel for a cast that hit nothing within `distance`.
    pub fn miss(distance: f32) -> Self {
        Self {
            point: Vec3::zeros(),
            normal: Vec3::zeros(),
            distance,
            friction: None,
            collider: None,
            body: None,
            tags: TagMask::empty(),
        }
    }
}

/// Motion classification of a body in the collision world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Never moves.
    Fixed,
    /// Simulated by the physics engine and reacts to impulses.
    Dynamic,
    /// Moved by game code.
    Kinematic,
    /// Kinematic body driven by a [`crate::KinematicMover`]. Characters may ride it.
    KinematicMover,
    /// The body of another character.
    Character,
}

impl BodyKind {
    /// Bodies that ignore impulses.
    pub fn is_kinematic(self) -> bool {
        !matches!(self, Self::Dynamic)
    }
}

/// Snapshot of a body's motion state, read from the collision world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub kind: BodyKind,
    pub mass: f32,
    /// World-space linear velocity (units per second).
    pub linear_velocity: Vec3,
    /// World-space angular velocity (radians per second, scaled axis).
    pub angular_velocity: Vec3,
    /// World-space center of mass, the pivot of angular motion.
    pub center_of_mass: Vec3,
}

/// A touch between the character and a dynamic body recorded during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidBodyContact {
    pub body: BodyId,
    pub point: Vec3,
    pub normal: Vec3,
    /// The displacement the character was attempting when the contact happened.
    pub character_velocity: Vec3,
    pub body_velocity: Vec3,
}
