//! Rapier-backed collision world.
//!
//! Holds the static level geometry, the bodies characters interact with, and
//! the characters' own colliders in one `RigidBodySet`/`ColliderSet` pair, and
//! answers the character queries with parry narrow-phase calls.
//!
//! Design goals
//! - Deterministic: statics are inserted sorted by `id`.
//! - Query-focused: no simulation step is required before querying; collider
//!   world poses are derived from their parent body every query.
//! - The owner keeps stepping dynamics (if any) on the same sets.

// Re-export Rapier so downstream crates can use Rapier types without depending
// on `rapier3d` directly.
pub use rapier3d;

use std::collections::HashMap;

use rapier3d::na::{Point3, Translation3, UnitQuaternion};
use rapier3d::parry::bounding_volume::BoundingVolume;
use rapier3d::prelude::*;

use crate::{
    bitmask_flags::TagMask,
    character::CharacterConfig,
    collision::{
        BodyKind, BodyState, CharacterShape, CollisionHit, CollisionQueryProvider, Iso,
        KinematicTransform, PhysicsBodies, Vec3,
        narrow_phase::{self, CharacterParryShape},
        query::ColliderFilter,
    },
    handle::{BodyId, ColliderId},
};

/// Slack added around swept bounds before the narrow phase.
const QUERY_AABB_MARGIN: f32 = 0.1;

/// Canonical, schema-agnostic definition of an immutable level collider.
///
/// Conventions
/// - Rotation is a unit quaternion.
/// - Planes are half-spaces whose normal is `rotation * +Y`, placed at
///   `translation + normal * offset_along_normal`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    pub translation: Vec3,
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
    pub friction: f32,
    /// Collision layer bits, matched against a character's collision mask.
    pub layers: u32,
    pub tags: TagMask,
}

impl WorldStaticDef {
    pub fn new(id: u32, translation: Vec3, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation: UnitQuaternion::identity(),
            shape,
            friction: 0.0,
            layers: u32::MAX,
            tags: TagMask::empty(),
        }
    }
}

/// Supported collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space), offset along its normal.
    Plane { offset_along_normal: f32 },
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Y-aligned capsule.
    CapsuleY { radius: f32, half_height: f32 },
    /// Y-aligned cylinder.
    CylinderY { radius: f32, half_height: f32 },
}

/// A body with a single collider, e.g. a crate, a door or a moving platform.
#[derive(Clone, Debug)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub translation: Vec3,
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
    /// Mass reported to characters; also the collider mass of dynamic bodies.
    pub mass: f32,
    pub friction: f32,
    pub layers: u32,
    pub tags: TagMask,
}

impl BodyDef {
    pub fn new(kind: BodyKind, translation: Vec3, shape: ColliderShapeDef) -> Self {
        Self {
            kind,
            translation,
            rotation: UnitQuaternion::identity(),
            shape,
            mass: 1.0,
            friction: 0.0,
            layers: u32::MAX,
            tags: TagMask::empty(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ColliderMeta {
    layers: u32,
    tags: TagMask,
}

#[derive(Clone, Copy, Debug)]
struct BodyMeta {
    kind: BodyKind,
    mass: f32,
}

/// In-memory Rapier structures queried by characters.
#[derive(Default)]
pub struct RapierQueryWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    collider_meta: HashMap<ColliderHandle, ColliderMeta>,
    body_meta: HashMap<RigidBodyHandle, BodyMeta>,
}

pub fn collider_id(handle: ColliderHandle) -> ColliderId {
    let (index, generation) = handle.into_raw_parts();
    ColliderId::from_raw_parts(index, generation)
}

pub fn collider_handle(id: ColliderId) -> ColliderHandle {
    let (index, generation) = id.into_raw_parts();
    ColliderHandle::from_raw_parts(index, generation)
}

pub fn body_id(handle: RigidBodyHandle) -> BodyId {
    let (index, generation) = handle.into_raw_parts();
    BodyId::from_raw_parts(index, generation)
}

pub fn body_handle(id: BodyId) -> RigidBodyHandle {
    let (index, generation) = id.into_raw_parts();
    RigidBodyHandle::from_raw_parts(index, generation)
}

fn iso_from(translation: Vec3, rotation: UnitQuaternion<f32>) -> Iso {
    Iso::from_parts(Translation3::from(translation), rotation)
}

impl RapierQueryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a world from a list of static collider definitions.
    ///
    /// The input is sorted by `id` before insertion. NaN or otherwise invalid
    /// values should be rejected by the caller.
    pub fn build(mut defs: Vec<WorldStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);
        let mut world = Self::new();
        for def in &defs {
            world.insert_static(def);
        }
        log::debug!("built query world with {} statics", defs.len());
        world
    }

    /// Insert a parentless static collider.
    pub fn insert_static(&mut self, def: &WorldStaticDef) -> ColliderId {
        // Planes are +Y half-spaces placed on the plane; other shapes are centred.
        let origin = match def.shape {
            ColliderShapeDef::Plane {
                offset_along_normal,
            } => def.translation + (def.rotation * Vec3::y()) * offset_along_normal,
            _ => def.translation,
        };
        let mut collider = collider_builder(&def.shape).friction(def.friction).build();
        collider.set_position(iso_from(origin, def.rotation));

        let handle = self.colliders.insert(collider);
        self.collider_meta.insert(
            handle,
            ColliderMeta {
                layers: def.layers,
                tags: def.tags,
            },
        );
        collider_id(handle)
    }

    /// Insert a body with one collider centred on it.
    pub fn insert_body(&mut self, def: &BodyDef) -> (BodyId, ColliderId) {
        let iso = iso_from(def.translation, def.rotation);
        let builder = match def.kind {
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic | BodyKind::KinematicMover | BodyKind::Character => {
                RigidBodyBuilder::kinematic_position_based()
            }
        };
        let body = self.bodies.insert(builder.pose(iso).build());

        let mut collider = collider_builder(&def.shape).friction(def.friction);
        if def.kind == BodyKind::Dynamic {
            collider = collider.mass(def.mass);
        }
        let collider = self
            .colliders
            .insert_with_parent(collider.build(), body, &mut self.bodies);
        // Mass properties are otherwise only computed by the next physics step.
        if let Some(rb) = self.bodies.get_mut(body) {
            rb.recompute_mass_properties_from_colliders(&self.colliders);
        }

        self.body_meta.insert(
            body,
            BodyMeta {
                kind: def.kind,
                mass: def.mass,
            },
        );
        self.collider_meta.insert(
            collider,
            ColliderMeta {
                layers: def.layers,
                tags: def.tags,
            },
        );
        (body_id(body), collider_id(collider))
    }

    /// Insert the kinematic body and collider of a character.
    ///
    /// The collider carries the configured contact skin so the physics engine
    /// keeps dynamic bodies slightly away from it.
    pub fn insert_character(
        &mut self,
        config: &CharacterConfig,
        pose: &KinematicTransform,
        layers: u32,
    ) -> (BodyId, ColliderId) {
        let shape = match config.shape() {
            CharacterShape::Cuboid { half_extents } => ColliderShapeDef::Cuboid { half_extents },
            CharacterShape::Capsule {
                radius,
                half_height,
            } => ColliderShapeDef::CapsuleY {
                radius,
                half_height,
            },
            CharacterShape::Ball { radius } => ColliderShapeDef::Sphere { radius },
        };
        let body = self.bodies.insert(
            RigidBodyBuilder::kinematic_position_based()
                .pose(pose.iso())
                .build(),
        );
        let collider = collider_builder(&shape)
            .contact_skin(config.collider_contact_offset)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        self.body_meta.insert(
            body,
            BodyMeta {
                kind: BodyKind::Character,
                mass: 0.0,
            },
        );
        self.collider_meta.insert(
            collider,
            ColliderMeta {
                layers,
                tags: TagMask::empty(),
            },
        );
        (body_id(body), collider_id(collider))
    }

    /// World pose of a collider, following its parent body.
    fn collider_pose(&self, collider: &Collider) -> Iso {
        match collider.parent().and_then(|parent| self.bodies.get(parent)) {
            Some(body) => {
                let body_iso = body_pose(body);
                match collider.position_wrt_parent() {
                    Some(local) => body_iso * local,
                    None => body_iso,
                }
            }
            None => *collider.position(),
        }
    }

    /// Colliders passing the layer mask and the filter.
    fn candidates<'a>(
        &'a self,
        layer_mask: u32,
        filter: ColliderFilter<'a>,
    ) -> impl Iterator<Item = (ColliderHandle, &'a Collider, ColliderMeta)> + 'a {
        self.colliders.iter().filter_map(move |(handle, collider)| {
            if collider.is_sensor() {
                return None;
            }
            let meta = self.collider_meta.get(&handle).copied().unwrap_or(ColliderMeta {
                layers: u32::MAX,
                tags: TagMask::empty(),
            });
            (meta.layers & layer_mask != 0 && filter(collider_id(handle)))
                .then_some((handle, collider, meta))
        })
    }
}

fn body_pose(body: &RigidBody) -> Iso {
    Iso::from_parts(Translation3::from(*body.translation()), *body.rotation())
}

/// Center of mass in world space, following poses set since the last physics step.
fn world_center_of_mass(body: &RigidBody) -> Vec3 {
    (body_pose(body) * body.mass_properties().local_mprops.local_com).coords
}

fn collider_builder(shape: &ColliderShapeDef) -> ColliderBuilder {
    match *shape {
        ColliderShapeDef::Plane { .. } => ColliderBuilder::new(SharedShape::halfspace(Vector::y_axis())),
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(radius),
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(half_height, radius),
        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(half_height, radius),
    }
}

impl CollisionQueryProvider for RapierQueryWorld {
    fn sweep(
        &self,
        shape: &CharacterShape,
        pose: &KinematicTransform,
        direction: &Vec3,
        max_distance: f32,
        layer_mask: u32,
        filter: ColliderFilter<'_>,
    ) -> Option<CollisionHit> {
        let moving = CharacterParryShape::new(shape);
        let iso = pose.iso();
        let swept = narrow_phase::swept_aabb(
            &iso,
            moving.as_shape(),
            &(direction * max_distance),
            QUERY_AABB_MARGIN,
        );

        let mut best: Option<CollisionHit> = None;
        for (handle, collider, meta) in self.candidates(layer_mask, filter) {
            let other_iso = self.collider_pose(collider);
            if !collider.shape().compute_aabb(&other_iso).intersects(&swept) {
                continue;
            }
            let Some(hit) = narrow_phase::cast_against(
                &iso,
                moving.as_shape(),
                direction,
                max_distance,
                &other_iso,
                collider.shape(),
            ) else {
                continue;
            };
            if best.as_ref().is_some_and(|b| b.distance <= hit.distance) {
                continue;
            }
            best = Some(CollisionHit {
                point: hit.point,
                normal: hit.normal,
                distance: hit.distance,
                friction: Some(collider.friction()),
                collider: Some(collider_id(handle)),
                body: collider.parent().map(body_id),
                tags: meta.tags,
            });
        }
        best
    }

    fn overlap(
        &self,
        shape: &CharacterShape,
        pose: &KinematicTransform,
        layer_mask: u32,
        filter: ColliderFilter<'_>,
    ) -> Vec<ColliderId> {
        let moving = CharacterParryShape::new(shape);
        let iso = pose.iso();
        let bounds = moving.as_shape().compute_aabb(&iso).loosened(QUERY_AABB_MARGIN);

        self.candidates(layer_mask, filter)
            .filter(|(_, collider, _)| {
                let other_iso = self.collider_pose(collider);
                collider.shape().compute_aabb(&other_iso).intersects(&bounds)
                    && narrow_phase::intersects(&iso, moving.as_shape(), &other_iso, collider.shape())
            })
            .map(|(handle, _, _)| collider_id(handle))
            .collect()
    }

    fn penetration(
        &self,
        shape: &CharacterShape,
        pose: &KinematicTransform,
        other: ColliderId,
    ) -> Option<(Vec3, f32)> {
        let collider = self.colliders.get(collider_handle(other))?;
        let moving = CharacterParryShape::new(shape);
        narrow_phase::penetration(
            &pose.iso(),
            moving.as_shape(),
            &self.collider_pose(collider),
            collider.shape(),
        )
    }
}

impl PhysicsBodies for RapierQueryWorld {
    fn body(&self, id: BodyId) -> Option<BodyState> {
        let handle = body_handle(id);
        let body = self.bodies.get(handle)?;
        let meta = self.body_meta.get(&handle).copied().unwrap_or(BodyMeta {
            kind: if body.is_dynamic() {
                BodyKind::Dynamic
            } else if body.is_fixed() {
                BodyKind::Fixed
            } else {
                BodyKind::Kinematic
            },
            mass: body.mass(),
        });
        Some(BodyState {
            kind: meta.kind,
            mass: meta.mass,
            linear_velocity: *body.linvel(),
            angular_velocity: *body.angvel(),
            center_of_mass: world_center_of_mass(body),
        })
    }

    fn apply_impulse_at_point(&mut self, id: BodyId, impulse: Vec3, point: Vec3) {
        if let Some(body) = self.bodies.get_mut(body_handle(id)) {
            if body.is_dynamic() {
                body.apply_impulse_at_point(impulse, Point3::from(point), true);
            }
        }
    }

    fn set_kinematic_pose(
        &mut self,
        id: BodyId,
        pose: &KinematicTransform,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
    ) {
        let Some(body) = self.bodies.get_mut(body_handle(id)) else {
            log::warn!("set_kinematic_pose on missing body {id:?}");
            return;
        };
        // Visible to queries right away, and to the next physics step.
        body.set_translation(pose.position, true);
        body.set_rotation(pose.orientation, true);
        body.set_next_kinematic_translation(pose.position);
        body.set_next_kinematic_rotation(pose.orientation);
        body.set_linvel(linear_velocity, true);
        body.set_angvel(angular_velocity, true);
    }
}
