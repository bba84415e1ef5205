//! Thin wrappers over parry3d queries (shape casts, intersections, contacts)
//! returning world-space results.

use nalgebra as na;
use rapier3d::parry::{
    bounding_volume::{Aabb, BoundingVolume},
    query::{self, ShapeCastOptions},
    shape::{Ball, Capsule, Cuboid, Shape},
};

use super::types::{CharacterShape, Iso, Vec3};

/// Owned parry shape for a character collider.
pub enum CharacterParryShape {
    Cuboid(Cuboid),
    Capsule(Capsule),
    Ball(Ball),
}

impl CharacterParryShape {
    pub fn new(shape: &CharacterShape) -> Self {
        match *shape {
            CharacterShape::Cuboid { half_extents } => Self::Cuboid(Cuboid::new(half_extents)),
            // Y-aligned capsule (controller axis is +Y).
            CharacterShape::Capsule {
                radius,
                half_height,
            } => Self::Capsule(Capsule::new_y(half_height, radius)),
            CharacterShape::Ball { radius } => Self::Ball(Ball::new(radius)),
        }
    }

    pub fn as_shape(&self) -> &dyn Shape {
        match self {
            Self::Cuboid(s) => s,
            Self::Capsule(s) => s,
            Self::Ball(s) => s,
        }
    }
}

/// Earliest contact of a shape cast, in world space.
#[derive(Clone, Copy, Debug)]
pub struct ShapeHit {
    pub distance: f32,
    pub point: Vec3,
    /// Normal of the surface that was hit, pointing against the cast direction.
    pub normal: Vec3,
}

/// Cast `moving` from `moving_iso` along the unit `direction` against a static `other`.
///
/// A cast starting in penetration reports distance zero.
pub fn cast_against(
    moving_iso: &Iso,
    moving: &dyn Shape,
    direction: &Vec3,
    max_distance: f32,
    other_iso: &Iso,
    other: &dyn Shape,
) -> Option<ShapeHit> {
    let mut opts = ShapeCastOptions::with_max_time_of_impact(max_distance);
    opts.stop_at_penetration = true;
    opts.compute_impact_geometry_on_penetration = true;

    let hit = query::cast_shapes(
        moving_iso,
        direction,
        moving,
        other_iso,
        &na::Vector3::zeros(),
        other,
        opts,
    )
    .ok()
    .flatten()?;

    // normal2/witness2 are expressed in the local frame of `other`.
    let mut normal = other_iso.rotation * hit.normal2.into_inner();
    if normal.dot(direction) > 0.0 {
        normal = -normal;
    }
    let point = other_iso.transform_point(&hit.witness2).coords;

    Some(ShapeHit {
        distance: hit.time_of_impact.max(0.0),
        point,
        normal,
    })
}

/// True if the two placed shapes touch or overlap.
pub fn intersects(iso1: &Iso, shape1: &dyn Shape, iso2: &Iso, shape2: &dyn Shape) -> bool {
    query::intersection_test(iso1, shape1, iso2, shape2).unwrap_or(false)
}

/// Direction and depth that push `shape1` out of `shape2`, if they penetrate.
pub fn penetration(
    iso1: &Iso,
    shape1: &dyn Shape,
    iso2: &Iso,
    shape2: &dyn Shape,
) -> Option<(Vec3, f32)> {
    let contact = query::contact(iso1, shape1, iso2, shape2, 0.0).ok().flatten()?;
    if contact.dist >= 0.0 {
        return None;
    }
    // normal1 is world-space and points from shape1 towards shape2.
    Some((-contact.normal1.into_inner(), -contact.dist))
}

/// AABB covering `shape` over the whole cast from `iso` along `translation`.
pub fn swept_aabb(iso: &Iso, shape: &dyn Shape, translation: &Vec3, margin: f32) -> Aabb {
    let start = shape.compute_aabb(iso);
    let mut end_iso = *iso;
    end_iso.translation.vector += translation;
    start.merged(&shape.compute_aabb(&end_iso)).loosened(margin)
}
