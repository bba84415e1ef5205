//! Ground detection, attachment to the body underfoot, and snapping.

use super::{
    solver::Solver,
    types::{BodyKind, CollisionHit},
};
use crate::{
    character::{CharacterState, RigidBodyMoveMode},
    controller::CharacterEvent,
    handle::BodyId,
};

/// Classification of a downward ground probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroundCheckResult {
    NoGround,
    /// Something was hit but it is too steep or lacks a ground tag.
    NotStable,
    Stable,
}

/// Outcome of [`solve_ground`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundProbe {
    pub result: GroundCheckResult,
    /// The surface found under the character, stable or not.
    pub hit: Option<CollisionHit>,
}

impl GroundProbe {
    fn none() -> Self {
        Self {
            result: GroundCheckResult::NoGround,
            hit: None,
        }
    }
}

/// Decide whether the character stands on ground, attach to what it stands on,
/// and pull it down onto the ground.
///
/// A grounded character probes further (grounding plus stair step distance)
/// so walking down stairs keeps it grounded.
pub fn solve_ground(solver: &Solver<'_>, state: &mut CharacterState) -> GroundProbe {
    if state.force_unground || !state.can_ground {
        state.set_ungrounded();
        attach_to_body(solver, state, None);
        return GroundProbe::none();
    }
    if !state.grounded && state.vertical_intent > 0.0 {
        // Moving up while airborne: no ground to look for.
        state.set_ungrounded();
        attach_to_body(solver, state, None);
        return GroundProbe::none();
    }

    let config = solver.config;
    let probe_distance = if state.grounded {
        config.grounding_distance + config.stair_step_distance
    } else {
        config.grounding_distance
    };
    let probe = ground_check(solver, state, probe_distance);
    snap_to_ground(solver, state);
    probe
}

/// Probe `distance` below the character and update grounding from what is found.
pub fn ground_check(solver: &Solver<'_>, state: &mut CharacterState, distance: f32) -> GroundProbe {
    let contact_offset = solver.config.kinematic_contact_offset;
    let hit = solver.cast(
        state.transient.position,
        state.transient.orientation,
        state.gravity,
        distance + contact_offset,
    );
    let Some(hit) = hit else {
        state.set_ungrounded();
        attach_to_body(solver, state, None);
        return GroundProbe::none();
    };

    if !solver.is_stable_ground(hit.normal, state.gravity) || !solver.has_ground_tag(&hit) {
        state.set_ungrounded();
        attach_to_body(solver, state, None);
        return GroundProbe {
            result: GroundCheckResult::NotStable,
            hit: Some(hit),
        };
    }

    state.grounded = true;
    state.ground_normal = hit.normal;
    attach_to_body(solver, state, hit.body);
    GroundProbe {
        result: GroundCheckResult::Stable,
        hit: Some(hit),
    }
}

/// Pull a grounded character down to one contact offset above the ground.
///
/// Returns the distance moved. Running it twice moves nothing the second time.
pub fn snap_to_ground(solver: &Solver<'_>, state: &mut CharacterState) -> f32 {
    if !state.grounded {
        return 0.0;
    }
    let contact_offset = solver.config.kinematic_contact_offset;
    let Some(hit) = solver.cast(
        state.transient.position,
        state.transient.orientation,
        state.gravity,
        solver.config.ground_snapping_distance + contact_offset,
    ) else {
        return 0.0;
    };
    let drop = (hit.distance - contact_offset).max(0.0);
    state.transient.position += state.gravity * drop;
    drop
}

/// Attach to `body` if the move mode and the controller allow it, or detach with `None`.
pub fn attach_to_body(solver: &Solver<'_>, state: &mut CharacterState, body: Option<BodyId>) {
    let mode = solver.config.rigid_body_move_mode;
    if mode == RigidBodyMoveMode::None {
        state.detach_body();
        return;
    }
    if body == state.attached_body {
        return;
    }
    let Some(body) = body else {
        state.detach_body();
        return;
    };

    let allowed_kind = match solver.world.body(body) {
        Some(body_state) => match mode {
            RigidBodyMoveMode::KinematicMoversOnly => body_state.kind == BodyKind::KinematicMover,
            _ => true,
        },
        None => false,
    };
    if !allowed_kind || !solver.controller.can_attach_to_body(body) {
        state.detach_body();
        return;
    }

    state.detach_body();
    log::debug!("attached to body {body:?}");
    state.attached_body = Some(body);
    state.events.push(CharacterEvent::AttachedBody(body));
}
