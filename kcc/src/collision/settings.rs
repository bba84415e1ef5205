/*!
Kinematic character controller (KCC) defaults and tolerances.

These constants centralize the defaults for [`crate::CharacterConfig`] and the
fixed tolerances used by the solver stages. Keeping them together makes tuning
easier and helps keep behavior consistent across backends.

Notes
- Distances use world units. The defaults assume centimeter-scale worlds
  (a 150 unit tall character).
- Angles are in degrees.
*/

/// Skin distance given to the character's own collider in the physics world.
pub const DEFAULT_COLLIDER_CONTACT_OFFSET: f32 = 2.0;

/// Separation the solver keeps from surfaces when sweeping and snapping.
/// Also the inflation used when resolving penetration.
pub const DEFAULT_KINEMATIC_CONTACT_OFFSET: f32 = 2.0;

/// Default collider height (full height of the box or capsule cylinder).
pub const DEFAULT_COLLIDER_HEIGHT: f32 = 150.0;

/// Default collider radius. For boxes this is the full width and depth.
pub const DEFAULT_COLLIDER_RADIUS: f32 = 50.0;

/// Penetration resolves allowed per sweep when a cast starts embedded.
pub const DEFAULT_MAX_UNSTUCK_ITERATIONS: u32 = 10;

/// Fraction of the remaining slide kept after each plane while grounded.
pub const DEFAULT_SLIDE_MULTIPLIER: f32 = 0.75;

/// Probe length used to find ground when not already grounded.
pub const DEFAULT_GROUNDING_DISTANCE: f32 = 1.0;

/// Maximum distance the character is pulled down onto the ground per tick.
pub const DEFAULT_GROUND_SNAPPING_DISTANCE: f32 = 1024.0;

/// Steepest surface still considered ground.
pub const DEFAULT_MAX_SLOPE_ANGLE_DEG: f32 = 66.0;

/// Tallest obstacle the character steps over.
pub const DEFAULT_STAIR_STEP_DISTANCE: f32 = 50.0;

/// A step needs at least this much forward clearance on top of the obstacle.
pub const DEFAULT_STAIR_STEP_MIN_FORWARD_DISTANCE: f32 = 0.01;

/// Consecutive steps attempted inside one sweep iteration.
pub const DEFAULT_MAX_STAIR_STEP_ITERATIONS: u32 = 10;

/// Mass used to scale impulses pushed onto dynamic bodies.
pub const DEFAULT_SIMULATED_MASS: f32 = 1000.0;

/// Fraction of the averaged corner normal the character is nudged by in obtuse corners.
pub const DEFAULT_OBTUSE_CORNER_NUDGE: f32 = 0.1;

/// Rigidbody contacts recorded per character per tick. Extra contacts are dropped.
pub const MAX_RIGID_BODY_CONTACTS: usize = 1024;

/// Largest accepted contact buffer. The buffer is allocated up front.
pub const RIGID_BODY_CONTACTS_CEILING: usize = 65_536;

/// Sliding planes solved per sweep. The third plane ends the sweep.
pub const MAX_SWEEP_PLANES: usize = 3;

/// Decimal places kept when comparing directions, to hide float noise.
pub const DIRECTION_ROUNDING_DECIMALS: i32 = 4;

/// Minimum squared movement threshold to consider a step meaningful.
/// Movements below this are treated as zero to avoid tiny oscillations.
pub const MIN_MOVE_SQ: f32 = 1.0e-8;

/// Practical small distance for comparisons.
pub const DIST_EPS: f32 = 1.0e-6;

/// Slack on the slope test so a surface at exactly the limit still counts as ground.
pub const SLOPE_ANGLE_EPS_DEG: f32 = 1.0e-3;

/// Cast directions further than this from unit length are reported as caller errors.
pub const UNIT_DIRECTION_TOLERANCE: f32 = 1.0e-3;
