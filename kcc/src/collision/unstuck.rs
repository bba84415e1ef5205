//! Penetration recovery.

use super::{
    solver::Solver,
    types::{KinematicTransform, Vec3},
};
use crate::{character::CharacterState, controller::CharacterEvent};

/// Displacement that pushes the character out of everything it overlaps.
///
/// The shape is inflated by `inflate` for both the overlap and the penetration
/// queries, so surfaces closer than `inflate` are pushed back to that distance.
/// Each collider contributes its own push; the sum is returned and the caller
/// applies it. Emits one [`CharacterEvent::Unstuck`] per contributing collider.
pub fn solve_unstuck(solver: &Solver<'_>, state: &mut CharacterState, inflate: f32) -> Vec3 {
    let shape = solver.shape.inflated(inflate);
    let pose = KinematicTransform::new(state.transient.position, state.transient.orientation);

    let overlaps = solver.world.overlap(
        &shape,
        &pose,
        solver.config.collision_mask,
        &|collider| solver.accepts(collider),
    );

    let mut push = Vec3::zeros();
    for collider in overlaps {
        let Some((direction, depth)) = solver.world.penetration(&shape, &pose, collider) else {
            continue;
        };
        if depth <= 0.0 {
            continue;
        }
        log::trace!("unstuck from {collider:?}: {direction:?} x {depth}");
        state.events.push(CharacterEvent::Unstuck {
            collider,
            direction,
            depth,
        });
        push += direction * depth;
    }
    push
}
