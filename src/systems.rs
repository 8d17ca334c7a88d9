//! Core controller systems.
//!
//! These systems drive the locomotion layer and keep the state markers in
//! sync. Collision resolution itself runs in the backend's resolve system,
//! which calls [`apply_resolution`] for every actor.

use bevy::prelude::*;

use crate::backend::{KinematicBody, RayCaster};
use crate::config::LocomotionConfig;
use crate::controller::RaycastController;
use crate::intent::MovementIntent;
use crate::locomotion::Locomotion;
use crate::state::{Airborne, GroundState, Grounded, TouchingCeiling, TouchingWall};

/// Displacement waiting to be resolved this fixed step.
///
/// Written by the locomotion systems (or directly by game code for actors
/// without [`Locomotion`]) and consumed by the backend's resolve system,
/// which resets it afterwards.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct MoveRequest {
    /// Desired displacement for this step.
    pub displacement: Vec2,
    /// Directional input; a vertical axis of `-1` drops through one-way
    /// platforms.
    pub input: Vec2,
    /// The actor is being carried by a moving platform.
    pub standing_on_platform: bool,
}

impl MoveRequest {
    pub fn new(displacement: Vec2) -> Self {
        Self {
            displacement,
            ..default()
        }
    }

    /// Builder: set the directional input.
    pub fn with_input(mut self, input: Vec2) -> Self {
        self.input = input;
        self
    }

    /// Builder: mark the actor as carried by a platform.
    pub fn on_platform(mut self) -> Self {
        self.standing_on_platform = true;
        self
    }
}

/// Resolve and apply one actor's pending request, then clear it.
///
/// Shared by every backend's resolve system.
pub fn apply_resolution<B, C>(
    controller: &mut RaycastController,
    request: &mut MoveRequest,
    body: &mut B,
    caster: &C,
    now: f32,
) -> Vec2
where
    B: KinematicBody + ?Sized,
    C: RayCaster + ?Sized,
{
    let corrected = controller.move_body(
        body,
        caster,
        request.displacement,
        request.input,
        request.standing_on_platform,
        now,
    );
    *request = MoveRequest::default();
    corrected
}

/// Fixed timestep delta, with fallback for testing scenarios.
fn fixed_delta(time: &Time<Fixed>) -> f32 {
    Some(time.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(1.0 / 60.0)
}

/// Expire finished drop-throughs against the fixed-step clock.
pub fn expire_drop_through(
    time: Res<Time<Fixed>>,
    mut q_controllers: Query<&mut RaycastController>,
) {
    let now = time.elapsed_secs();
    for mut controller in &mut q_controllers {
        if controller.collisions().falling_through_platform {
            controller.tick(now);
        }
    }
}

/// Turn button edges of [`MovementIntent`] into locomotion actions.
pub fn apply_intent_edges(
    mut q_actors: Query<(
        &mut MovementIntent,
        &mut Locomotion,
        &LocomotionConfig,
        &RaycastController,
    )>,
) {
    for (mut intent, mut locomotion, config, controller) in &mut q_actors {
        if intent.jump_just_pressed() {
            locomotion.on_jump_input_down(config, controller.collisions(), intent.directional);
        }
        if intent.jump_just_released() {
            locomotion.on_jump_input_up(config);
        }
        if intent.dash_just_pressed() {
            locomotion.on_dash_input_down(config);
        }
        intent.latch();
    }
}

/// Integrate locomotion and queue the resulting displacement.
pub fn integrate_locomotion(
    time: Res<Time<Fixed>>,
    mut q_actors: Query<(
        &mut Locomotion,
        &LocomotionConfig,
        &RaycastController,
        Option<&MovementIntent>,
        &mut MoveRequest,
    )>,
) {
    let dt = fixed_delta(&time);

    for (mut locomotion, config, controller, intent, mut request) in &mut q_actors {
        let directional = intent.map(|i| i.directional).unwrap_or(Vec2::ZERO);
        let displacement = locomotion.step(config, controller.collisions(), directional, dt);

        request.displacement = displacement;
        request.input = directional;
    }
}

/// Stop or keep sliding after the move, from the fresh collision report.
pub fn apply_locomotion_response(
    time: Res<Time<Fixed>>,
    mut q_actors: Query<(&mut Locomotion, &LocomotionConfig, &RaycastController)>,
) {
    let dt = fixed_delta(&time);

    for (mut locomotion, config, controller) in &mut q_actors {
        locomotion.after_move(config, controller.collisions(), dt);
    }
}

/// Sync state marker components based on the collision report.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &RaycastController,
        Option<&GroundState>,
        Has<Grounded>,
        Has<Airborne>,
        Option<&TouchingWall>,
        Has<TouchingCeiling>,
    )>,
) {
    for (entity, controller, ground_state, has_grounded, has_airborne, wall, has_ceiling) in
        &q_controllers
    {
        let report = controller.collisions();

        // Sync Grounded/Airborne
        if report.below && !has_grounded {
            commands.entity(entity).insert(Grounded);
            commands.entity(entity).remove::<Airborne>();
        } else if !report.below && (has_grounded || !has_airborne) {
            commands.entity(entity).remove::<Grounded>();
            commands.entity(entity).insert(Airborne);
        }

        let state = GroundState::from_report(report);
        if ground_state != Some(&state) {
            commands.entity(entity).insert(state);
        }

        // Sync TouchingWall; the side can change without losing contact.
        match (TouchingWall::from_report(report), wall) {
            (Some(touching), current) if current != Some(&touching) => {
                commands.entity(entity).insert(touching);
            }
            (None, Some(_)) => {
                commands.entity(entity).remove::<TouchingWall>();
            }
            _ => {}
        }

        // Sync TouchingCeiling
        if report.above && !has_ceiling {
            commands.entity(entity).insert(TouchingCeiling);
        } else if !report.above && has_ceiling {
            commands.entity(entity).remove::<TouchingCeiling>();
        }
    }
}
