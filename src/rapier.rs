//! Rapier2D physics backend implementation.
//!
//! This module resolves moves with Bevy Rapier2D ray casts. Enable with the
//! `rapier2d` feature.
//!
//! Actors need a [`Collider`] (its local AABB is the ray grid's box) and are
//! moved by writing their `Transform`, so a kinematic position-based rigid
//! body or no rigid body at all is expected. Rapier's own gravity does not
//! apply to them.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::{KinematicBody, RayCaster, RaycastBackend, RaycastRequest};
use crate::collision::{CollisionData, CollisionMask, SurfaceKind};
use crate::controller::RaycastController;
use crate::systems::{apply_resolution, MoveRequest};
use crate::RaycastControllerSet;

/// Rapier2D physics backend for the ray-grid controller.
pub struct Rapier2dBackend;

impl RaycastBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }
}

/// Plugin that sets up Rapier2D-specific systems for the controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<OneWayPlatform>();

        app.add_systems(
            FixedUpdate,
            rapier_resolve_moves.in_set(RaycastControllerSet::Resolve),
        );
    }
}

/// Marker for colliders that act as one-way platforms.
///
/// Rays report hits on these entities as [`SurfaceKind::OneWay`]: they only
/// block actors falling onto them, and can be dropped through.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct OneWayPlatform;

/// Ray caster over a Rapier context, ignoring the casting actor.
struct RapierCaster<'a, 'w, F> {
    context: &'a RapierContext<'w>,
    exclude_entity: Entity,
    is_one_way: F,
}

impl<F: Fn(Entity) -> bool> RayCaster for RapierCaster<'_, '_, F> {
    fn cast_ray(&self, request: &RaycastRequest) -> Option<CollisionData> {
        rapier_raycast(
            self.context,
            request,
            self.exclude_entity,
            &self.is_one_way,
        )
    }
}

/// Rapier groups for a collision mask. The ray belongs to every group and
/// only interacts with the mask's.
fn mask_groups(mask: CollisionMask) -> CollisionGroups {
    CollisionGroups::new(Group::ALL, Group::from_bits_truncate(mask.bits()))
}

/// Perform a raycast using RapierContext.
fn rapier_raycast(
    context: &RapierContext,
    request: &RaycastRequest,
    exclude_entity: Entity,
    is_one_way: &impl Fn(Entity) -> bool,
) -> Option<CollisionData> {
    // Create filter to exclude the casting entity
    let filter = QueryFilter::default()
        .exclude_collider(exclude_entity)
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors()
        .groups(mask_groups(request.mask));

    // Solid rays report a zero-distance hit when starting inside a collider
    context
        .cast_ray_and_get_normal(
            request.origin,
            request.direction,
            request.max_distance,
            true,
            filter,
        )
        .map(|(hit_entity, hit)| {
            let normal = if hit.normal == Vec2::ZERO {
                -request.direction
            } else {
                hit.normal
            };
            let surface = if is_one_way(hit_entity) {
                SurfaceKind::OneWay
            } else {
                SurfaceKind::Solid
            };
            CollisionData::new(hit.time_of_impact, normal, hit.point, Some(hit_entity))
                .with_surface(surface)
        })
}

/// World-space bounds of a collider at `transform`, ignoring rotation.
pub fn collider_bounds(collider: &Collider, transform: &Transform) -> Rect {
    let aabb = collider.raw.compute_local_aabb();
    let offset = transform.translation.truncate();
    Rect::from_corners(
        Vec2::new(aabb.mins.x, aabb.mins.y) + offset,
        Vec2::new(aabb.maxs.x, aabb.maxs.y) + offset,
    )
}

/// An actor's collider and the transform that carries it.
struct ColliderBody<'a> {
    collider: &'a Collider,
    transform: &'a mut Transform,
}

impl KinematicBody for ColliderBody<'_> {
    fn bounding_box(&self) -> Rect {
        collider_bounds(self.collider, self.transform)
    }

    fn translate(&mut self, displacement: Vec2) {
        self.transform.translation += displacement.extend(0.0);
    }
}

/// Resolve every pending [`MoveRequest`] with Rapier ray casts.
fn rapier_resolve_moves(
    rapier_context: ReadRapierContext,
    time: Res<Time<Fixed>>,
    q_platforms: Query<(), With<OneWayPlatform>>,
    mut q_actors: Query<(
        Entity,
        &mut RaycastController,
        &mut MoveRequest,
        &Collider,
        &mut Transform,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };
    let now = time.elapsed_secs();

    for (entity, mut controller, mut request, collider, mut transform) in &mut q_actors {
        let caster = RapierCaster {
            context: &context,
            exclude_entity: entity,
            is_one_way: |hit: Entity| q_platforms.contains(hit),
        };
        let mut body = ColliderBody {
            collider,
            transform: &mut *transform,
        };
        apply_resolution(&mut controller, &mut request, &mut body, &caster, now);
    }
}
