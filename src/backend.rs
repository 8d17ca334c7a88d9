//! Environment abstraction.
//!
//! The ray-grid collider only needs three things from the world around it: a
//! ray cast against static geometry, the actor's bounding box, and a way to
//! move the actor. These are expressed as small traits so the resolver can be
//! driven by a physics engine, by the crate's own [`StaticGeometry`], or by a
//! test fixture.
//!
//! [`StaticGeometry`]: crate::geometry::StaticGeometry

use bevy::prelude::*;

use crate::collision::{CollisionData, CollisionMask};

/// Trait for physics backend implementations.
///
/// A backend contributes a plugin that adds its resolve system to
/// [`RaycastControllerSet::Resolve`](crate::RaycastControllerSet). That system
/// feeds every pending [`MoveRequest`](crate::systems::MoveRequest) through
/// [`RaycastController::resolve`](crate::controller::RaycastController::resolve)
/// with a [`RayCaster`] over the backend's geometry.
pub trait RaycastBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;
}

/// Ray query against static geometry.
///
/// Implementations must report a hit at distance zero when the ray origin
/// already touches or lies inside a surface; the collider relies on this to
/// ignore surfaces it is flush against.
pub trait RayCaster {
    /// Cast a ray and return the closest hit, if any.
    fn cast_ray(&self, request: &RaycastRequest) -> Option<CollisionData>;
}

impl<T: RayCaster + ?Sized> RayCaster for &T {
    fn cast_ray(&self, request: &RaycastRequest) -> Option<CollisionData> {
        (**self).cast_ray(request)
    }
}

/// Something with an axis-aligned box that can be moved.
pub trait KinematicBody {
    /// Current world-space bounds of the collision shape.
    fn bounding_box(&self) -> Rect;

    /// Move the body by `displacement`.
    fn translate(&mut self, displacement: Vec2);
}

impl KinematicBody for Rect {
    fn bounding_box(&self) -> Rect {
        *self
    }

    fn translate(&mut self, displacement: Vec2) {
        self.min += displacement;
        self.max += displacement;
    }
}

/// Helper struct for building raycasts.
#[derive(Debug, Clone, Copy)]
pub struct RaycastRequest {
    /// Origin point of the ray.
    pub origin: Vec2,
    /// Direction of the ray (normalized).
    pub direction: Vec2,
    /// Maximum distance to cast.
    pub max_distance: f32,
    /// Layers the ray can hit.
    pub mask: CollisionMask,
}

impl RaycastRequest {
    /// Create a new raycast request that hits every layer.
    pub fn new(origin: Vec2, direction: Vec2, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_distance,
            mask: CollisionMask::ALL,
        }
    }

    /// Restrict the ray to `mask`.
    pub fn with_mask(mut self, mask: CollisionMask) -> Self {
        self.mask = mask;
        self
    }

    /// Point at distance `t` along the ray.
    #[inline]
    pub fn point_at(&self, t: f32) -> Vec2 {
        self.origin + self.direction * t
    }
}
