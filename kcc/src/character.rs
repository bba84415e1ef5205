//! Character configuration and per-character state.
//!
//! The tick pipeline that drives a [`Character`] lives in [`crate::movement`].

use serde::{Deserialize, Serialize};

use crate::{
    bitmask_flags::TagMask,
    collision::{
        CharacterShape, KinematicTransform, Quat, Vec3,
        rigidbody::ContactBuffer,
        settings::{
            DEFAULT_COLLIDER_CONTACT_OFFSET, DEFAULT_COLLIDER_HEIGHT, DEFAULT_COLLIDER_RADIUS,
            DEFAULT_GROUND_SNAPPING_DISTANCE, DEFAULT_GROUNDING_DISTANCE,
            DEFAULT_KINEMATIC_CONTACT_OFFSET, DEFAULT_MAX_SLOPE_ANGLE_DEG,
            DEFAULT_MAX_STAIR_STEP_ITERATIONS, DEFAULT_MAX_UNSTUCK_ITERATIONS,
            DEFAULT_OBTUSE_CORNER_NUDGE, DEFAULT_SIMULATED_MASS, DEFAULT_SLIDE_MULTIPLIER,
            DEFAULT_STAIR_STEP_DISTANCE, DEFAULT_STAIR_STEP_MIN_FORWARD_DISTANCE,
            MAX_RIGID_BODY_CONTACTS, RIGID_BODY_CONTACTS_CEILING,
        },
    },
    controller::CharacterEvent,
    error::ConfigError,
    handle::{BodyId, ColliderId},
    utils::ground_tangent,
};

/// Collider type of a character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderShape {
    #[default]
    Box,
    Capsule,
    Sphere,
}

/// What a stair step needs to find below it before it is accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StairStepGroundMode {
    /// Any landing, or none at all (the character drops the full step height).
    None,
    /// Any surface below.
    RequireSolid,
    /// A walkable surface below.
    #[default]
    RequireStableSolid,
    /// A surface below carrying one of the configured ground tags.
    RequireGround,
    /// A walkable surface below carrying one of the configured ground tags.
    RequireStableGround,
}

/// Which bodies a grounded character may ride.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RigidBodyMoveMode {
    None,
    #[default]
    KinematicMoversOnly,
    All,
}

/// How touched dynamic bodies are pushed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RigidBodyInteractionMode {
    None,
    /// Impulse from the character's simulated mass alone.
    #[default]
    PureKinematic,
    /// Impulse scaled by the mass ratio of character and body.
    SimulateKinematic,
    /// Contacts are forwarded to the controller as events.
    Manual,
}

/// Tunables of one character. Mutable between ticks through [`Character::set_config`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub collider_shape: ColliderShape,
    /// Full height of a box, or the cylinder length of a capsule.
    pub collider_height: f32,
    /// Radius of a capsule or sphere. For boxes this is the full width and depth.
    pub collider_radius: f32,
    /// Skin given to the character's collider in the physics world.
    pub collider_contact_offset: f32,
    /// Distance kept from surfaces by the solver.
    pub kinematic_contact_offset: f32,
    /// Layers the character collides with.
    pub collision_mask: u32,
    pub max_unstuck_iterations: u32,
    /// Ask the controller whether each collider should be collided with.
    pub filter_collisions: bool,
    pub slide_multiplier: f32,
    pub slide_account_for_friction: bool,
    pub slide_skip_multiplier_while_airborne: bool,
    pub grounding_distance: f32,
    pub ground_snapping_distance: f32,
    /// Steepest walkable slope in degrees.
    pub max_slope_angle: f32,
    /// Only surfaces carrying one of these tags count as ground.
    pub ground_tags: Option<TagMask>,
    pub allow_stair_stepping: bool,
    pub stair_step_distance: f32,
    pub stair_step_ground_mode: StairStepGroundMode,
    pub stair_step_min_forward_distance: f32,
    pub max_stair_step_iterations: u32,
    pub rigid_body_move_mode: RigidBodyMoveMode,
    /// Sweep the motion inherited from an attached body instead of applying it directly.
    pub solve_rigid_body_movements: bool,
    pub rigid_body_interaction_mode: RigidBodyInteractionMode,
    pub simulated_mass: f32,
    pub obtuse_corner_nudge: f32,
    pub max_rigid_body_contacts: usize,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            collider_shape: ColliderShape::Box,
            collider_height: DEFAULT_COLLIDER_HEIGHT,
            collider_radius: DEFAULT_COLLIDER_RADIUS,
            collider_contact_offset: DEFAULT_COLLIDER_CONTACT_OFFSET,
            kinematic_contact_offset: DEFAULT_KINEMATIC_CONTACT_OFFSET,
            collision_mask: u32::MAX,
            max_unstuck_iterations: DEFAULT_MAX_UNSTUCK_ITERATIONS,
            filter_collisions: false,
            slide_multiplier: DEFAULT_SLIDE_MULTIPLIER,
            slide_account_for_friction: true,
            slide_skip_multiplier_while_airborne: true,
            grounding_distance: DEFAULT_GROUNDING_DISTANCE,
            ground_snapping_distance: DEFAULT_GROUND_SNAPPING_DISTANCE,
            max_slope_angle: DEFAULT_MAX_SLOPE_ANGLE_DEG,
            ground_tags: None,
            allow_stair_stepping: true,
            stair_step_distance: DEFAULT_STAIR_STEP_DISTANCE,
            stair_step_ground_mode: StairStepGroundMode::RequireStableSolid,
            stair_step_min_forward_distance: DEFAULT_STAIR_STEP_MIN_FORWARD_DISTANCE,
            max_stair_step_iterations: DEFAULT_MAX_STAIR_STEP_ITERATIONS,
            rigid_body_move_mode: RigidBodyMoveMode::KinematicMoversOnly,
            solve_rigid_body_movements: false,
            rigid_body_interaction_mode: RigidBodyInteractionMode::PureKinematic,
            simulated_mass: DEFAULT_SIMULATED_MASS,
            obtuse_corner_nudge: DEFAULT_OBTUSE_CORNER_NUDGE,
            max_rigid_body_contacts: MAX_RIGID_BODY_CONTACTS,
        }
    }
}

impl CharacterConfig {
    /// Query shape derived from the collider type and dimensions.
    pub fn shape(&self) -> CharacterShape {
        match self.collider_shape {
            ColliderShape::Box => CharacterShape::Cuboid {
                half_extents: Vec3::new(
                    self.collider_radius * 0.5,
                    self.collider_height * 0.5,
                    self.collider_radius * 0.5,
                ),
            },
            ColliderShape::Capsule => CharacterShape::Capsule {
                radius: self.collider_radius,
                half_height: self.collider_height * 0.5,
            },
            ColliderShape::Sphere => CharacterShape::Ball {
                radius: self.collider_radius,
            },
        }
    }

    /// Clamp ranged values into their valid intervals.
    pub fn clamped(mut self) -> Self {
        self.slide_multiplier = self.slide_multiplier.clamp(0.0, 1.0);
        self.max_slope_angle = self.max_slope_angle.clamp(0.0, 180.0);
        self.grounding_distance = self.grounding_distance.max(0.0);
        self.ground_snapping_distance = self.ground_snapping_distance.max(0.0);
        self.stair_step_distance = self.stair_step_distance.max(0.0);
        self.stair_step_min_forward_distance = self.stair_step_min_forward_distance.max(0.0);
        self.simulated_mass = self.simulated_mass.max(0.0);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("collider_height", self.collider_height),
            ("collider_radius", self.collider_radius),
            ("collider_contact_offset", self.collider_contact_offset),
            ("kinematic_contact_offset", self.kinematic_contact_offset),
            ("slide_multiplier", self.slide_multiplier),
            ("grounding_distance", self.grounding_distance),
            ("ground_snapping_distance", self.ground_snapping_distance),
            ("max_slope_angle", self.max_slope_angle),
            ("stair_step_distance", self.stair_step_distance),
            (
                "stair_step_min_forward_distance",
                self.stair_step_min_forward_distance,
            ),
            ("simulated_mass", self.simulated_mass),
            ("obtuse_corner_nudge", self.obtuse_corner_nudge),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }

        for (field, value) in [
            ("collider_height", self.collider_height),
            ("collider_radius", self.collider_radius),
            ("collider_contact_offset", self.collider_contact_offset),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        for (field, value) in [
            ("kinematic_contact_offset", self.kinematic_contact_offset),
            ("grounding_distance", self.grounding_distance),
            ("ground_snapping_distance", self.ground_snapping_distance),
            ("stair_step_distance", self.stair_step_distance),
            (
                "stair_step_min_forward_distance",
                self.stair_step_min_forward_distance,
            ),
            ("simulated_mass", self.simulated_mass),
            ("obtuse_corner_nudge", self.obtuse_corner_nudge),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        for (field, value, min, max) in [
            ("slide_multiplier", self.slide_multiplier, 0.0, 1.0),
            ("max_slope_angle", self.max_slope_angle, 0.0, 180.0),
        ] {
            if !(min..=max).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }

        if !(1..=RIGID_BODY_CONTACTS_CEILING).contains(&self.max_rigid_body_contacts) {
            return Err(ConfigError::ContactCapacity {
                value: self.max_rigid_body_contacts,
                max: RIGID_BODY_CONTACTS_CEILING,
            });
        }

        Ok(())
    }
}

/// Per-tick and persistent state of a character.
///
/// Read-only to the owner; the tick pipeline is the only writer.
#[derive(Clone, Debug)]
pub struct CharacterState {
    pub(crate) initial: KinematicTransform,
    pub(crate) transient: KinematicTransform,
    pub(crate) committed: KinematicTransform,
    pub(crate) grounded: bool,
    pub(crate) was_grounded: bool,
    pub(crate) can_ground: bool,
    pub(crate) force_unground: bool,
    pub(crate) ground_normal: Vec3,
    pub(crate) gravity: Vec3,
    /// Vertical component of the last intent in the character's local frame.
    pub(crate) vertical_intent: f32,
    pub(crate) velocity: Vec3,
    pub(crate) attached_velocity: Vec3,
    pub(crate) attached_body: Option<BodyId>,
    pub(crate) contacts: ContactBuffer,
    pub(crate) events: Vec<CharacterEvent>,
}

impl CharacterState {
    pub fn new(pose: KinematicTransform, contact_capacity: usize) -> Self {
        let gravity = crate::utils::gravity_from_orientation(&pose.orientation);
        Self {
            initial: pose,
            transient: pose,
            committed: pose,
            grounded: false,
            was_grounded: false,
            can_ground: true,
            force_unground: false,
            ground_normal: -gravity,
            gravity,
            vertical_intent: 0.0,
            velocity: Vec3::zeros(),
            attached_velocity: Vec3::zeros(),
            attached_body: None,
            contacts: ContactBuffer::with_capacity(contact_capacity),
            events: Vec::new(),
        }
    }

    /// Committed pose at the end of the last tick.
    pub fn pose(&self) -> &KinematicTransform {
        &self.committed
    }

    pub fn position(&self) -> Vec3 {
        self.committed.position
    }

    pub fn orientation(&self) -> Quat {
        self.committed.orientation
    }

    /// Pose the solver is currently working on. Equal to [`Self::pose`] between ticks.
    pub fn transient(&self) -> &KinematicTransform {
        &self.transient
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn ground_normal(&self) -> Vec3 {
        self.ground_normal
    }

    /// Unit down vector derived from the character's orientation.
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Displacement of the last tick, before ground snapping and body riding.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Displacement inherited from the attached body in the last tick.
    pub fn attached_velocity(&self) -> Vec3 {
        self.attached_velocity
    }

    pub fn attached_body(&self) -> Option<BodyId> {
        self.attached_body
    }

    pub fn contacts(&self) -> &ContactBuffer {
        &self.contacts
    }

    pub(crate) fn set_ungrounded(&mut self) {
        self.grounded = false;
        self.ground_normal = -self.gravity;
    }

    pub(crate) fn detach_body(&mut self) {
        if let Some(previous) = self.attached_body.take() {
            log::debug!("detached from body {previous:?}");
            self.events.push(CharacterEvent::DetachedBody(previous));
        }
    }
}

/// A kinematic character: configuration, cached query shape and state.
#[derive(Clone, Debug)]
pub struct Character {
    pub(crate) config: CharacterConfig,
    pub(crate) shape: CharacterShape,
    pub(crate) world_scale: Vec3,
    pub(crate) state: CharacterState,
    pub(crate) collider: Option<ColliderId>,
    pub(crate) body: Option<BodyId>,
}

impl Character {
    pub fn new(config: CharacterConfig, pose: KinematicTransform) -> Result<Self, ConfigError> {
        let config = config.clamped();
        config.validate()?;
        Ok(Self {
            shape: config.shape(),
            state: CharacterState::new(pose, config.max_rigid_body_contacts),
            config,
            world_scale: Vec3::new(1.0, 1.0, 1.0),
            collider: None,
            body: None,
        })
    }

    /// Binds the character to its own body and collider in the collision world.
    ///
    /// The collider is never reported back to the character's own queries, and
    /// the body follows the committed pose.
    pub fn with_world_handles(mut self, body: Option<BodyId>, collider: Option<ColliderId>) -> Self {
        self.body = body;
        self.collider = collider;
        self
    }

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    /// Replace the configuration, re-deriving the query shape.
    pub fn set_config(&mut self, config: CharacterConfig) -> Result<(), ConfigError> {
        let config = config.clamped();
        config.validate()?;
        self.shape = config.shape();
        if config.max_rigid_body_contacts != self.config.max_rigid_body_contacts {
            self.state.contacts = ContactBuffer::with_capacity(config.max_rigid_body_contacts);
        }
        self.config = config;
        Ok(())
    }

    pub fn shape(&self) -> &CharacterShape {
        &self.shape
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn collider(&self) -> Option<ColliderId> {
        self.collider
    }

    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    pub fn world_scale(&self) -> Vec3 {
        self.world_scale
    }

    pub fn set_world_scale(&mut self, scale: Vec3) {
        self.world_scale = scale;
    }

    /// Drop ground support for the next tick, e.g. when jumping.
    pub fn force_unground(&mut self) {
        self.state.force_unground = true;
    }

    pub fn set_can_ground(&mut self, can_ground: bool) {
        self.state.can_ground = can_ground;
    }

    /// Teleport. Resets all pose slots so no motion is inferred from the jump.
    pub fn set_position(&mut self, position: Vec3) {
        let state = &mut self.state;
        state.initial.position = position;
        state.transient.position = position;
        state.committed.position = position;
        state.velocity = Vec3::zeros();
        state.attached_velocity = Vec3::zeros();
        state.contacts.clear();
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        let state = &mut self.state;
        state.initial.orientation = orientation;
        state.transient.orientation = orientation;
        state.committed.orientation = orientation;
        state.gravity = crate::utils::gravity_from_orientation(&orientation);
        if !state.grounded {
            state.ground_normal = -state.gravity;
        }
    }

    /// Forget the attached body, e.g. when the owner destroys it.
    pub fn detach_body(&mut self) -> Option<BodyId> {
        let body = self.state.attached_body.take();
        self.state.attached_velocity = Vec3::zeros();
        body
    }

    /// Direction along the current ground that keeps the heading of `direction`.
    pub fn ground_tangent(&self, direction: Vec3) -> Vec3 {
        ground_tangent(direction, self.state.ground_normal, self.state.gravity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let config = CharacterConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.stair_step_ground_mode, StairStepGroundMode::RequireStableSolid);
        assert_eq!(config.rigid_body_move_mode, RigidBodyMoveMode::KinematicMoversOnly);
    }

    #[test]
    fn box_half_extents_follow_radius_and_height() {
        let config = CharacterConfig::default();
        assert_eq!(
            config.shape(),
            CharacterShape::Cuboid {
                half_extents: Vec3::new(25.0, 75.0, 25.0)
            }
        );
    }

    #[test]
    fn set_config_rederives_shape() {
        let mut character =
            Character::new(CharacterConfig::default(), KinematicTransform::default()).unwrap();
        let config = CharacterConfig {
            collider_shape: ColliderShape::Capsule,
            collider_radius: 10.0,
            collider_height: 40.0,
            ..CharacterConfig::default()
        };
        character.set_config(config).unwrap();
        assert_eq!(
            *character.shape(),
            CharacterShape::Capsule {
                radius: 10.0,
                half_height: 20.0
            }
        );
    }

    #[test]
    fn validate_rejects_bad_values() {
        let negative = CharacterConfig {
            stair_step_distance: -1.0,
            ..CharacterConfig::default()
        };
        assert_eq!(
            negative.validate(),
            Err(ConfigError::Negative {
                field: "stair_step_distance",
                value: -1.0
            })
        );

        let flat = CharacterConfig {
            collider_height: 0.0,
            ..CharacterConfig::default()
        };
        assert!(matches!(
            flat.validate(),
            Err(ConfigError::NotPositive {
                field: "collider_height",
                ..
            })
        ));

        let nan = CharacterConfig {
            kinematic_contact_offset: f32::NAN,
            ..CharacterConfig::default()
        };
        assert!(matches!(nan.validate(), Err(ConfigError::NonFinite { .. })));
    }

    #[test]
    fn config_survives_a_toml_round_trip() {
        let config = CharacterConfig {
            collider_shape: ColliderShape::Capsule,
            collider_radius: 30.0,
            ground_tags: Some(TagMask::new(0b101)),
            stair_step_ground_mode: StairStepGroundMode::RequireGround,
            rigid_body_move_mode: RigidBodyMoveMode::All,
            rigid_body_interaction_mode: RigidBodyInteractionMode::Manual,
            max_rigid_body_contacts: 64,
            ..CharacterConfig::default()
        };

        let text = toml::to_string(&config).unwrap();
        let parsed: CharacterConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_toml_config_falls_back_to_defaults() {
        let parsed: CharacterConfig = toml::from_str(
            r#"
            collider_height = 180.0
            stair_step_ground_mode = "RequireSolid"
            "#,
        )
        .unwrap();

        assert_eq!(
            parsed,
            CharacterConfig {
                collider_height: 180.0,
                stair_step_ground_mode: StairStepGroundMode::RequireSolid,
                ..CharacterConfig::default()
            }
        );
        assert_eq!(parsed.validate(), Ok(()));
    }

    #[test]
    fn contact_buffer_size_is_bounded() {
        for value in [0, RIGID_BODY_CONTACTS_CEILING + 1, usize::MAX] {
            let config = CharacterConfig {
                max_rigid_body_contacts: value,
                ..CharacterConfig::default()
            };
            assert_eq!(
                Character::new(config, KinematicTransform::default()).err(),
                Some(ConfigError::ContactCapacity {
                    value,
                    max: RIGID_BODY_CONTACTS_CEILING
                })
            );
        }

        let mut character =
            Character::new(CharacterConfig::default(), KinematicTransform::default()).unwrap();
        let oversized = CharacterConfig {
            max_rigid_body_contacts: usize::MAX,
            ..CharacterConfig::default()
        };
        assert!(character.set_config(oversized).is_err());
        assert_eq!(
            character.config().max_rigid_body_contacts,
            MAX_RIGID_BODY_CONTACTS
        );
    }

    #[test]
    fn new_clamps_ranged_values() {
        let config = CharacterConfig {
            slide_multiplier: 3.0,
            max_slope_angle: 270.0,
            ..CharacterConfig::default()
        };
        let character = Character::new(config, KinematicTransform::default()).unwrap();
        assert_eq!(character.config().slide_multiplier, 1.0);
        assert_eq!(character.config().max_slope_angle, 180.0);
    }

    #[test]
    fn teleport_resets_every_pose_slot() {
        let mut character =
            Character::new(CharacterConfig::default(), KinematicTransform::default()).unwrap();
        character.set_position(Vec3::new(1.0, 2.0, 3.0));
        let state = character.state();
        assert_eq!(state.initial.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.transient.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.velocity(), Vec3::zeros());
    }

    #[test]
    fn ungrounded_character_reports_up_as_ground_normal() {
        let character =
            Character::new(CharacterConfig::default(), KinematicTransform::default()).unwrap();
        assert!(!character.state().is_grounded());
        assert_relative_eq!(character.state().ground_normal(), Vec3::y());
    }

    #[test]
    fn reorienting_an_airborne_character_flips_its_ground_normal() {
        let mut character =
            Character::new(CharacterConfig::default(), KinematicTransform::default()).unwrap();
        character.set_orientation(Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI));

        assert_relative_eq!(character.state().gravity(), Vec3::y(), epsilon = 1.0e-6);
        assert_relative_eq!(character.state().ground_normal(), -Vec3::y(), epsilon = 1.0e-6);
    }
}
