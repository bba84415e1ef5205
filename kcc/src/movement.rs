use crate::{
    character::Character,
    collision::{
        CollisionWorld, GroundCheckResult, SweepReport, Vec3,
        ground::solve_ground,
        rigidbody::solve_rigid_body_interactions,
        solver::Solver,
        sweep::solve_sweep,
        unstuck::solve_unstuck,
    },
    controller::{CharacterController, CharacterEvent},
    error::TickError,
    motion::{angular_velocity_between, movement_from_body, velocity_between},
    utils::{gravity_from_orientation, is_uniform_scale},
};

/// Grounding transition that happened during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroundingChange {
    Grounded,
    Ungrounded,
}

/// Output of a single [`Character::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickOutcome {
    /// Sweep of the controller's displacement.
    pub sweep: SweepReport,
    /// Sweep of the attached body's motion, when body movements are solved.
    pub attached_sweep: Option<SweepReport>,
    /// Push applied before sweeping to leave pre-existing overlaps.
    pub unstuck: Vec3,
    pub ground: GroundCheckResult,
    pub grounding_change: Option<GroundingChange>,
    /// Dynamic body contacts pushed or forwarded this tick.
    pub rigid_body_contacts: usize,
}

impl Character {
    /// Advance the character by one tick of `dt` seconds.
    ///
    /// Behavior
    /// - Asks `controller` for the displacement and orientation of this tick.
    /// - Leaves any overlap, then sweeps and slides along the displacement,
    ///   stepping up stairs while grounded.
    /// - Pushes touched dynamic bodies, probes and snaps to the ground, then
    ///   rides the attached body.
    /// - Commits the pose, moves the character's own body in `world`, and
    ///   finally delivers the tick's events followed by `post_update`.
    ///
    /// A rejected tick leaves the character untouched.
    pub fn tick<W: CollisionWorld>(
        &mut self,
        world: &mut W,
        controller: &mut dyn CharacterController,
        dt: f32,
    ) -> Result<TickOutcome, TickError> {
        if !is_uniform_scale(&self.world_scale) {
            let s = self.world_scale;
            log::warn!("character has non-uniform scale {s:?}, skipping tick");
            return Err(TickError::NonUniformScale([s.x, s.y, s.z]));
        }
        let shape = self.shape.scaled(self.world_scale.x);
        let contact_offset = self.config.kinematic_contact_offset;

        // 1) Begin: the committed pose is the start of this tick.
        let state = &mut self.state;
        state.initial = state.committed;
        state.transient = state.committed;
        state.was_grounded = state.grounded;
        state.contacts.clear();
        state.events.clear();

        // 2) Intent, in the character's new local frame.
        let intent = controller.move_update(state);
        let state = &mut self.state;
        state.transient.orientation = intent.orientation;
        state.gravity = gravity_from_orientation(&intent.orientation);
        state.vertical_intent = intent.displacement.y;
        let mut delta = intent.orientation * intent.displacement;
        if state.grounded && !state.force_unground {
            delta = controller.ground_projection(delta, state.gravity, state.ground_normal);
        }

        // 3) Unstuck and sweep.
        let solver = Solver::new(&*world, &*controller, &self.config, shape, self.collider);
        let unstuck = solve_unstuck(&solver, state, contact_offset);
        state.transient.position += unstuck;
        let sweep = solve_sweep(&solver, state, &mut delta);

        // 4) Dynamic bodies touched by the sweep.
        let rigid_body_contacts = solve_rigid_body_interactions(world, &self.config, state);
        state.velocity = state.transient.position - state.initial.position;

        // 5) Ground.
        let solver = Solver::new(&*world, &*controller, &self.config, shape, self.collider);
        let probe = solve_ground(&solver, state);
        state.force_unground = false;
        let grounding_change = match (state.was_grounded, state.grounded) {
            (false, true) => {
                log::debug!("grounded at {:?}", state.transient.position);
                state.events.push(CharacterEvent::Grounded(probe.hit));
                Some(GroundingChange::Grounded)
            }
            (true, false) => {
                log::debug!("ungrounded at {:?}", state.transient.position);
                state.events.push(CharacterEvent::Ungrounded(probe.hit));
                Some(GroundingChange::Ungrounded)
            }
            _ => None,
        };

        // 6) Ride the attached body.
        let mut attached_sweep = None;
        let mut attached_update = None;
        state.attached_velocity = Vec3::zeros();
        if let Some(body) = state.attached_body {
            match world.body(body) {
                None => {
                    log::warn!("attached body {body:?} no longer exists, detaching");
                    state.detach_body();
                }
                Some(body_state) => {
                    let motion = movement_from_body(&body_state, state.transient.position, dt);
                    state.attached_velocity = motion;
                    if self.config.solve_rigid_body_movements {
                        let mut remaining = motion;
                        attached_sweep = Some(solve_sweep(&solver, state, &mut remaining));
                    } else {
                        state.transient.position += motion;
                    }
                    // Lift off the body so a fast rotation does not clip into it.
                    state.transient.position -= state.gravity * contact_offset;
                    attached_update = Some((body, body_state));
                }
            }
        }

        // 7) Commit, and move the character's own body so later queries see it.
        state.committed = state.transient;
        if let Some(body) = self.body {
            let linear = velocity_between(state.initial.position, state.committed.position, dt);
            let angular =
                angular_velocity_between(state.initial.orientation, state.committed.orientation, dt);
            world.set_kinematic_pose(body, &state.committed, linear, angular);
        }
        log::trace!(
            "tick committed at {:?}, grounded: {}",
            state.committed.position,
            state.grounded
        );

        // 8) Notify.
        for event in state.events.drain(..) {
            controller.on_event(&event);
        }
        if let Some((body, body_state)) = attached_update {
            controller.attached_body_update(body, &body_state);
        }
        controller.post_update(&self.state);

        Ok(TickOutcome {
            sweep,
            attached_sweep,
            unstuck,
            ground: probe.result,
            grounding_change,
            rigid_body_contacts,
        })
    }
}
