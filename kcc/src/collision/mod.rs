/*!
Collision root module.

The character solver is split into stages that each read the world through
[`query::CollisionWorld`] and write the character's transient state:

- types:        shared data types (poses, shapes, hits, body snapshots)
- settings:     configuration defaults and solver tolerances
- query:        the world-query and body-access traits a backend implements
- narrow_phase: thin wrappers over parry shape casts and contacts
- solver:       per-tick context shared by the stages
- unstuck:      depenetration
- sweep:        sweep-and-slide with crease handling
- stair_step:   step-up over low obstacles
- ground:       ground probe, snapping and body attachment
- rigidbody:    contact buffer and pushes into dynamic bodies
*/

pub mod ground;
pub mod narrow_phase;
pub mod query;
pub mod rigidbody;
pub mod settings;
pub mod solver;
pub mod stair_step;
pub mod sweep;
#[cfg(test)]
pub mod testing;
pub mod types;
pub mod unstuck;

pub use ground::{GroundCheckResult, GroundProbe};
pub use query::{ColliderFilter, CollisionQueryProvider, CollisionWorld, PhysicsBodies};
pub use rigidbody::ContactBuffer;
pub use sweep::{Corner, SweepReport};
pub use types::{
    BodyKind, BodyState, CharacterShape, CollisionHit, Iso, KinematicTransform, Quat,
    RigidBodyContact, Vec3,
};
