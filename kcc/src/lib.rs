//! Kinematic character controller.
//!
//! Moves capsule/box/sphere characters through a collision world by sweeping,
//! sliding, stepping over small obstacles and tracking ground support. Physics
//! backends plug in through [`collision::CollisionQueryProvider`] and
//! [`collision::PhysicsBodies`]; [`rapier_world::RapierQueryWorld`] is the
//! bundled implementation.

pub mod bitmask_flags;
pub mod character;
pub mod collision;
pub mod controller;
pub mod error;
pub mod handle;
pub mod motion;
pub mod movement;
pub mod mover;
pub mod rapier_world;
pub mod simulation;
pub mod utils;

pub use bitmask_flags::TagMask;
pub use character::{
    Character, CharacterConfig, CharacterState, ColliderShape, RigidBodyInteractionMode,
    RigidBodyMoveMode, StairStepGroundMode,
};
pub use collision::{
    BodyKind, BodyState, CharacterShape, CollisionHit, CollisionQueryProvider, CollisionWorld,
    KinematicTransform, PhysicsBodies, Quat, RigidBodyContact, Vec3,
};
pub use controller::{CharacterController, CharacterEvent, MoveIntent};
pub use error::{ConfigError, TickError};
pub use handle::{BodyId, ColliderId};
pub use movement::{GroundingChange, TickOutcome};
pub use mover::{KinematicMover, MoverController};
pub use rapier_world::{BodyDef, ColliderShapeDef, RapierQueryWorld, WorldStaticDef};
pub use simulation::{CharacterKey, MoverKey, Simulation};
pub use utils::{ground_tangent, project_on_plane};
