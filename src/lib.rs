//! # `msg_raycast_controller`
//!
//! A 2D kinematic platformer controller built on a grid of rays, with a
//! physics backend abstraction.
//!
//! This crate provides a deterministic collider for box-shaped actors that:
//! - Resolves a desired displacement against static geometry with ray casts
//! - Climbs and descends slopes up to a configurable angle
//! - Slides down slopes that are too steep to stand on
//! - Lands on one-way platforms, jumps up through them and drops through them
//! - Reports contacts on all four sides for game logic
//!
//! On top of it, an optional locomotion layer adds gravity, variable jump
//! height, coyote time, jump buffering, wall sliding, wall jumps and dashing.
//!
//! ## Architecture
//!
//! Everything runs in `FixedUpdate`, in the sets of [`RaycastControllerSet`]:
//! 1. `Preparation`: drop-through windows expire
//! 2. `Intent`: button edges and locomotion produce a [`MoveRequest`]
//! 3. `Resolve`: the backend casts rays and moves the actor
//! 4. `Response`: locomotion reacts to contacts, state markers are synced
//!
//! Actors without [`Locomotion`] can write their [`MoveRequest`] directly.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_raycast_controller::prelude::*;
//!
//! // Components for a player actor
//! let controller = RaycastController::new(ControllerConfig::default().with_max_slope_angle(60.0));
//! let locomotion = LocomotionConfig::default().with_move_speed(8.0);
//! let intent = MovementIntent::default();
//!
//! // Spawn them with a `KinematicBox`, a `MoveRequest` and a `Locomotion`
//! ```
//!
//! [`MoveRequest`]: systems::MoveRequest
//! [`Locomotion`]: locomotion::Locomotion

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod detection;
pub mod geometry;
pub mod intent;
pub mod locomotion;
pub mod raycast;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{KinematicBody, RayCaster, RaycastBackend, RaycastRequest};
    pub use crate::collision::{CollisionData, CollisionMask, SurfaceKind};
    pub use crate::config::{ControllerConfig, LocomotionConfig};
    pub use crate::controller::RaycastController;
    pub use crate::detection::{CollisionReport, SlopeAngle};
    pub use crate::geometry::{KinematicBox, StaticBody, StaticGeometry, StaticGeometryBackend};
    pub use crate::intent::MovementIntent;
    pub use crate::locomotion::Locomotion;
    pub use crate::state::{Airborne, GroundState, Grounded, TouchingCeiling, TouchingWall};
    pub use crate::systems::MoveRequest;
    pub use crate::{RaycastControllerPlugin, RaycastControllerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{OneWayPlatform, Rapier2dBackend};
}

/// Ordering of the controller's work inside `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum RaycastControllerSet {
    /// Timers that must run before any input is read.
    Preparation,
    /// Input edges and locomotion, producing this step's move request.
    Intent,
    /// Backend collision resolution.
    Resolve,
    /// Reactions to the fresh collision report.
    Response,
}

/// Main plugin for the ray-grid controller.
///
/// This plugin is generic over a backend `B` which provides the ray casts
/// and the resolve system.
///
/// # Type Parameters
/// - `B`: The backend implementation (e.g., `Rapier2dBackend`)
///
/// # Examples
///
/// With the built-in static geometry:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use msg_raycast_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RaycastControllerPlugin::<StaticGeometryBackend>::default())
///     .run();
/// ```
///
/// With Rapier2D colliders as the level:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use msg_raycast_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(RaycastControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct RaycastControllerPlugin<B: backend::RaycastBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::RaycastBackend> Default for RaycastControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::RaycastBackend> Plugin for RaycastControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::ControllerConfig>();
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<controller::RaycastController>();
        app.register_type::<detection::CollisionReport>();
        app.register_type::<detection::SlopeAngle>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<locomotion::Locomotion>();
        app.register_type::<systems::MoveRequest>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::TouchingWall>();
        app.register_type::<state::TouchingCeiling>();
        app.register_type::<state::GroundState>();

        app.configure_sets(
            FixedUpdate,
            (
                RaycastControllerSet::Preparation,
                RaycastControllerSet::Intent,
                RaycastControllerSet::Resolve,
                RaycastControllerSet::Response,
            )
                .chain(),
        );

        // Add the backend plugin (contributes the Resolve system)
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            systems::expire_drop_through.in_set(RaycastControllerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            (systems::apply_intent_edges, systems::integrate_locomotion)
                .chain()
                .in_set(RaycastControllerSet::Intent),
        );
        app.add_systems(
            FixedUpdate,
            (systems::apply_locomotion_response, systems::sync_state_markers)
                .chain()
                .in_set(RaycastControllerSet::Response),
        );
    }
}
