//! Ray hit data and surface filtering.
//!
//! These are the values exchanged between the ray-grid collider and whatever
//! environment answers its ray casts.

use bevy::prelude::*;

/// How a surface reacts to the collider.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Blocks movement from every direction.
    #[default]
    Solid,
    /// One-way ("through") platform: only blocks downward movement, and can be
    /// dropped through on request.
    OneWay,
}

/// Bit mask selecting which collision layers a ray cast can hit.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    /// Hits every layer.
    pub const ALL: Self = Self(u32::MAX);
    /// Hits nothing.
    pub const NONE: Self = Self(0);

    /// Mask for a single layer index (0..32). Indices past the last layer
    /// give an empty mask.
    pub const fn layer(index: u32) -> Self {
        match 1u32.checked_shl(index) {
            Some(bits) => Self(bits),
            None => Self::NONE,
        }
    }

    /// Whether a surface on `layers` is hit by this mask.
    #[inline]
    pub fn matches(self, layers: CollisionMask) -> bool {
        self.0 & layers.0 != 0
    }

    /// Raw bits, for handing to a physics engine's group filter.
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl Default for CollisionMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Information about a raycast collision.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec2,
    /// World position of the hit point.
    pub point: Vec2,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
    /// Surface behaviour of whatever was hit.
    pub surface: SurfaceKind,
}

impl CollisionData {
    /// Create a hit against a solid surface.
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
            surface: SurfaceKind::Solid,
        }
    }

    /// Builder: tag the hit with a surface kind.
    pub fn with_surface(mut self, surface: SurfaceKind) -> Self {
        self.surface = surface;
        self
    }

    /// Whether the hit surface is a one-way platform.
    #[inline]
    pub fn is_one_way(&self) -> bool {
        self.surface == SurfaceKind::OneWay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_data_new_is_solid() {
        let hit = CollisionData::new(5.0, Vec2::Y, Vec2::new(10.0, 0.0), None);

        assert_eq!(hit.distance, 5.0);
        assert_eq!(hit.normal, Vec2::Y);
        assert_eq!(hit.point, Vec2::new(10.0, 0.0));
        assert_eq!(hit.surface, SurfaceKind::Solid);
        assert!(!hit.is_one_way());
    }

    #[test]
    fn collision_data_with_entity_and_surface() {
        let entity = Entity::from_raw(42);
        let hit = CollisionData::new(3.0, Vec2::X, Vec2::ZERO, Some(entity))
            .with_surface(SurfaceKind::OneWay);

        assert_eq!(hit.entity, Some(entity));
        assert!(hit.is_one_way());
    }

    #[test]
    fn mask_matching() {
        let ground = CollisionMask::layer(0);
        let hazards = CollisionMask::layer(3);

        assert!(CollisionMask::ALL.matches(ground));
        assert!(!CollisionMask::NONE.matches(ground));
        assert!(ground.matches(CollisionMask(0b1001)));
        assert!(!ground.matches(hazards));
        assert_eq!(CollisionMask::default(), CollisionMask::ALL);
    }

    #[test]
    fn layer_bounds() {
        assert_eq!(CollisionMask::layer(31).bits(), 1 << 31);
        assert_eq!(CollisionMask::layer(32), CollisionMask::NONE);
        assert_eq!(CollisionMask::layer(u32::MAX), CollisionMask::NONE);
    }
}
