//! Analytic collision world for unit tests.
//!
//! Characters are treated as axis-aligned boxes (identity orientation) so every
//! query has an exact closed form: half-spaces use the box support distance and
//! axis-aligned boxes use their Minkowski sum with the character box.

use std::{cell::Cell, collections::HashMap};

use super::{
    query::{ColliderFilter, CollisionQueryProvider, PhysicsBodies},
    types::{BodyState, CharacterShape, CollisionHit, KinematicTransform, Quat, Vec3},
};
use crate::{
    bitmask_flags::TagMask,
    character::CharacterState,
    controller::{CharacterController, CharacterEvent, MoveIntent},
    handle::{BodyId, ColliderId},
};

const EPS: f32 = 1.0e-6;

#[derive(Clone, Copy, Debug)]
pub enum Solid {
    /// Solid where `normal . x < offset`.
    HalfSpace { normal: Vec3, offset: f32 },
    Aabb { min: Vec3, max: Vec3 },
}

#[derive(Clone, Copy, Debug)]
pub struct Obstacle {
    pub id: ColliderId,
    pub solid: Solid,
    pub friction: Option<f32>,
    pub body: Option<BodyId>,
    pub tags: TagMask,
    pub layers: u32,
}

#[derive(Default)]
pub struct TestWorld {
    pub obstacles: Vec<Obstacle>,
    pub bodies: HashMap<BodyId, BodyState>,
    pub poses: HashMap<BodyId, KinematicTransform>,
    pub impulses: Vec<(BodyId, Vec3, Vec3)>,
    pub sweep_queries: Cell<usize>,
    pub overlap_queries: Cell<usize>,
    pub penetration_queries: Cell<usize>,
}

/// Default character box: radius 50, height 150.
pub fn character_box() -> CharacterShape {
    CharacterShape::Cuboid {
        half_extents: Vec3::new(25.0, 75.0, 25.0),
    }
}

fn half_extents(shape: &CharacterShape) -> Vec3 {
    match *shape {
        CharacterShape::Cuboid { half_extents } => half_extents,
        CharacterShape::Capsule {
            radius,
            half_height,
        } => Vec3::new(radius, half_height + radius, radius),
        CharacterShape::Ball { radius } => Vec3::new(radius, radius, radius),
    }
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, solid: Solid) -> ColliderId {
        let id = ColliderId::from_raw_parts(self.obstacles.len() as u32, 0);
        self.obstacles.push(Obstacle {
            id,
            solid,
            friction: None,
            body: None,
            tags: TagMask::empty(),
            layers: u32::MAX,
        });
        id
    }

    pub fn add_plane(&mut self, normal: Vec3, offset: f32) -> ColliderId {
        self.push(Solid::HalfSpace {
            normal: normal.normalize(),
            offset,
        })
    }

    pub fn add_aabb(&mut self, min: Vec3, max: Vec3) -> ColliderId {
        self.push(Solid::Aabb { min, max })
    }

    pub fn add_body(&mut self, state: BodyState) -> BodyId {
        let id = BodyId::from_raw_parts(self.bodies.len() as u32, 0);
        self.bodies.insert(id, state);
        id
    }

    fn obstacle_mut(&mut self, id: ColliderId) -> &mut Obstacle {
        let (index, _) = id.into_raw_parts();
        &mut self.obstacles[index as usize]
    }

    pub fn set_friction(&mut self, id: ColliderId, friction: f32) {
        self.obstacle_mut(id).friction = Some(friction);
    }

    pub fn set_body(&mut self, id: ColliderId, body: BodyId) {
        self.obstacle_mut(id).body = Some(body);
    }

    pub fn set_tags(&mut self, id: ColliderId, tags: TagMask) {
        self.obstacle_mut(id).tags = tags;
    }

    pub fn set_layers(&mut self, id: ColliderId, layers: u32) {
        self.obstacle_mut(id).layers = layers;
    }

    fn candidates<'a>(
        &'a self,
        layer_mask: u32,
        filter: ColliderFilter<'a>,
    ) -> impl Iterator<Item = &'a Obstacle> + 'a {
        self.obstacles
            .iter()
            .filter(move |o| o.layers & layer_mask != 0 && filter(o.id))
    }
}

/// Signed gap between a box and a half-space, and the box support radius.
fn plane_gap(center: Vec3, half: Vec3, normal: Vec3, offset: f32) -> f32 {
    let support = normal.x.abs() * half.x + normal.y.abs() * half.y + normal.z.abs() * half.z;
    normal.dot(&center) - offset - support
}

/// Minimum push out of an expanded box, if the center is strictly inside it.
fn aabb_push(center: Vec3, min: Vec3, max: Vec3) -> Option<(Vec3, f32)> {
    let mut best: Option<(Vec3, f32)> = None;
    for axis in 0..3 {
        if center[axis] <= min[axis] || center[axis] >= max[axis] {
            return None;
        }
        let mut dir = Vec3::zeros();
        let to_min = center[axis] - min[axis];
        let to_max = max[axis] - center[axis];
        let (depth, sign) = if to_min <= to_max {
            (to_min, -1.0)
        } else {
            (to_max, 1.0)
        };
        dir[axis] = sign;
        if best.is_none_or(|(_, d)| depth < d) {
            best = Some((dir, depth));
        }
    }
    best
}

/// Ray against an expanded box (slab method). Returns distance and entry normal.
fn ray_aabb(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::zeros();
    for axis in 0..3 {
        if dir[axis].abs() < EPS {
            if origin[axis] <= min[axis] || origin[axis] >= max[axis] {
                return None;
            }
            continue;
        }
        let t1 = (min[axis] - origin[axis]) / dir[axis];
        let t2 = (max[axis] - origin[axis]) / dir[axis];
        let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
        if near > t_enter {
            t_enter = near;
            normal = Vec3::zeros();
            normal[axis] = -dir[axis].signum();
        }
        t_exit = t_exit.min(far);
    }
    if t_enter > t_exit || t_exit <= 0.0 || t_enter < 0.0 {
        return None;
    }
    Some((t_enter, normal))
}

impl Obstacle {
    fn sweep(&self, center: Vec3, half: Vec3, dir: Vec3, max: f32) -> Option<(f32, Vec3, Vec3)> {
        match self.solid {
            Solid::HalfSpace { normal, offset } => {
                let gap = plane_gap(center, half, normal, offset);
                if gap < -EPS {
                    return Some((0.0, normal, center));
                }
                let approach = -normal.dot(&dir);
                if approach <= EPS {
                    return None;
                }
                let t = gap.max(0.0) / approach;
                (t <= max).then(|| (t, normal, center + dir * t))
            }
            Solid::Aabb { min, max: upper } => {
                let lo = min - half;
                let hi = upper + half;
                if let Some((push, _)) = aabb_push(center, lo, hi) {
                    return Some((0.0, push, center));
                }
                let (t, normal) = ray_aabb(center, dir, lo, hi)?;
                (t <= max).then(|| (t, normal, center + dir * t))
            }
        }
    }

    fn penetration(&self, center: Vec3, half: Vec3) -> Option<(Vec3, f32)> {
        match self.solid {
            Solid::HalfSpace { normal, offset } => {
                let gap = plane_gap(center, half, normal, offset);
                (gap < 0.0).then_some((normal, -gap))
            }
            Solid::Aabb { min, max } => aabb_push(center, min - half, max + half),
        }
    }
}

impl CollisionQueryProvider for TestWorld {
    fn sweep(
        &self,
        shape: &CharacterShape,
        pose: &KinematicTransform,
        direction: &Vec3,
        max_distance: f32,
        layer_mask: u32,
        filter: ColliderFilter<'_>,
    ) -> Option<CollisionHit> {
        self.sweep_queries.set(self.sweep_queries.get() + 1);
        let half = half_extents(shape);
        let mut best: Option<CollisionHit> = None;
        for o in self.candidates(layer_mask, filter) {
            let Some((distance, normal, point)) = o.sweep(pose.position, half, *direction, max_distance)
            else {
                continue;
            };
            if best.as_ref().is_none_or(|b| distance < b.distance) {
                best = Some(CollisionHit {
                    point,
                    normal,
                    distance,
                    friction: o.friction,
                    collider: Some(o.id),
                    body: o.body,
                    tags: o.tags,
                });
            }
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
        self.overlap_queries.set(self.overlap_queries.get() + 1);
        let half = half_extents(shape);
        self.candidates(layer_mask, filter)
            .filter(|o| o.penetration(pose.position, half).is_some())
            .map(|o| o.id)
            .collect()
    }

    fn penetration(
        &self,
        shape: &CharacterShape,
        pose: &KinematicTransform,
        other: ColliderId,
    ) -> Option<(Vec3, f32)> {
        self.penetration_queries.set(self.penetration_queries.get() + 1);
        let half = half_extents(shape);
        self.obstacles
            .iter()
            .find(|o| o.id == other)?
            .penetration(pose.position, half)
    }
}

impl PhysicsBodies for TestWorld {
    fn body(&self, body: BodyId) -> Option<BodyState> {
        self.bodies.get(&body).copied()
    }

    fn apply_impulse_at_point(&mut self, body: BodyId, impulse: Vec3, point: Vec3) {
        self.impulses.push((body, impulse, point));
    }

    fn set_kinematic_pose(
        &mut self,
        body: BodyId,
        pose: &KinematicTransform,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
    ) {
        self.poses.insert(body, *pose);
        if let Some(state) = self.bodies.get_mut(&body) {
            state.linear_velocity = linear_velocity;
            state.angular_velocity = angular_velocity;
            state.center_of_mass = pose.position;
        }
    }
}

/// Controller that never moves.
pub struct NullController;

impl CharacterController for NullController {
    fn move_update(&mut self, state: &CharacterState) -> MoveIntent {
        MoveIntent::new(Vec3::zeros(), state.orientation())
    }
}

/// Controller replaying a fixed displacement and recording what it is told.
#[derive(Default)]
pub struct ScriptedController {
    pub displacement: Vec3,
    /// Orientation handed out each tick. Keeps the current one when unset.
    pub orientation: Option<Quat>,
    pub events: Vec<CharacterEvent>,
    pub attached_updates: Vec<BodyId>,
    pub post_updates: usize,
    pub rejected: Vec<ColliderId>,
}

impl ScriptedController {
    pub fn moving(displacement: Vec3) -> Self {
        Self {
            displacement,
            ..Self::default()
        }
    }
}

impl CharacterController for ScriptedController {
    fn move_update(&mut self, state: &CharacterState) -> MoveIntent {
        MoveIntent::new(self.displacement, self.orientation.unwrap_or(state.orientation()))
    }

    fn collision_valid(&self, collider: ColliderId) -> bool {
        !self.rejected.contains(&collider)
    }

    fn on_event(&mut self, event: &CharacterEvent) {
        self.events.push(*event);
    }

    fn attached_body_update(&mut self, body: BodyId, _state: &BodyState) {
        self.attached_updates.push(body);
    }

    fn post_update(&mut self, _state: &CharacterState) {
        self.post_updates += 1;
    }
}
