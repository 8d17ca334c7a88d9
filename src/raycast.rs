//! Ray grid geometry.
//!
//! The collider never casts from its true bounds: the box is shrunk by the skin
//! width first, so rays start slightly inside the actor and a surface the actor
//! rests on is still reported at a positive distance.

use bevy::prelude::*;

/// Smallest number of rays along an edge. Two rays put one on each corner.
pub const MIN_RAY_COUNT: usize = 2;

/// Shrink `bounds` inward by `skin_width` on every side.
///
/// A box thinner than two skins collapses onto its center instead of
/// inverting.
pub fn skin_bounds(bounds: Rect, skin_width: f32) -> Rect {
    let shrunk = bounds.inflate(-skin_width);
    if shrunk.is_empty() {
        Rect::from_center_size(bounds.center(), shrunk.size().max(Vec2::ZERO))
    } else {
        shrunk
    }
}

/// Corners of the skin-shrunk box that rays are cast from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RaycastOrigins {
    pub top_left: Vec2,
    pub top_right: Vec2,
    pub bottom_left: Vec2,
    pub bottom_right: Vec2,
}

impl RaycastOrigins {
    /// Origins for an actor whose world-space box is `bounds`.
    pub fn new(bounds: Rect, skin_width: f32) -> Self {
        let inner = skin_bounds(bounds, skin_width);
        Self {
            top_left: Vec2::new(inner.min.x, inner.max.y),
            top_right: inner.max,
            bottom_left: inner.min,
            bottom_right: Vec2::new(inner.max.x, inner.min.y),
        }
    }

    /// Bottom corner on the side the actor is moving toward.
    #[inline]
    pub fn bottom_leading(&self, direction_x: f32) -> Vec2 {
        if direction_x < 0.0 {
            self.bottom_left
        } else {
            self.bottom_right
        }
    }

    /// Bottom corner on the side the actor is moving away from.
    #[inline]
    pub fn bottom_trailing(&self, direction_x: f32) -> Vec2 {
        if direction_x < 0.0 {
            self.bottom_right
        } else {
            self.bottom_left
        }
    }
}

/// Distance between neighbouring rays on each edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RaySpacing {
    /// Spacing of the horizontal rays, measured along the vertical edges.
    pub horizontal: f32,
    /// Spacing of the vertical rays, measured along the horizontal edges.
    pub vertical: f32,
}

impl RaySpacing {
    /// Spread `horizontal_rays` over the shrunk height and `vertical_rays`
    /// over the shrunk width. Counts below [`MIN_RAY_COUNT`] are treated as
    /// [`MIN_RAY_COUNT`].
    pub fn new(
        bounds: Rect,
        skin_width: f32,
        horizontal_rays: usize,
        vertical_rays: usize,
    ) -> Self {
        let size = skin_bounds(bounds, skin_width).size();
        Self {
            horizontal: size.y / gaps(horizontal_rays),
            vertical: size.x / gaps(vertical_rays),
        }
    }
}

fn gaps(rays: usize) -> f32 {
    (rays.max(MIN_RAY_COUNT) - 1) as f32
}

/// Unsigned angle between a surface normal and world up, in degrees.
///
/// 0 is flat ground, 90 is a vertical wall, 180 a ceiling.
pub fn slope_angle(normal: Vec2) -> f32 {
    let dot = normal.normalize_or_zero().dot(Vec2::Y).clamp(-1.0, 1.0);
    dot.acos().to_degrees()
}

/// `-1.0`, `0.0` or `1.0`. Unlike [`f32::signum`], zero maps to zero.
#[inline]
pub(crate) fn sign_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Rect {
        Rect::new(0.0, 0.0, 1.0, 2.0)
    }

    // ==================== Origins ====================

    #[test]
    fn origins_are_shrunk_by_skin() {
        let origins = RaycastOrigins::new(unit_box(), 0.1);

        assert!((origins.bottom_left - Vec2::new(0.1, 0.1)).length() < 1e-6);
        assert!((origins.bottom_right - Vec2::new(0.9, 0.1)).length() < 1e-6);
        assert!((origins.top_left - Vec2::new(0.1, 1.9)).length() < 1e-6);
        assert!((origins.top_right - Vec2::new(0.9, 1.9)).length() < 1e-6);
    }

    #[test]
    fn leading_and_trailing_corners() {
        let origins = RaycastOrigins::new(unit_box(), 0.1);

        assert_eq!(origins.bottom_leading(1.0), origins.bottom_right);
        assert_eq!(origins.bottom_leading(-1.0), origins.bottom_left);
        assert_eq!(origins.bottom_trailing(1.0), origins.bottom_left);
        assert_eq!(origins.bottom_trailing(-1.0), origins.bottom_right);
    }

    #[test]
    fn degenerate_box_collapses_to_center() {
        let tiny = Rect::new(0.0, 0.0, 0.01, 0.01);
        let inner = skin_bounds(tiny, 0.015);

        assert_eq!(inner.size(), Vec2::ZERO);
        assert!((inner.center() - tiny.center()).length() < 1e-6);
    }

    // ==================== Spacing ====================

    #[test]
    fn spacing_spreads_rays_over_edges() {
        let spacing = RaySpacing::new(Rect::new(0.0, 0.0, 1.2, 2.2), 0.1, 5, 3);

        assert!((spacing.horizontal - 0.5).abs() < 1e-6);
        assert!((spacing.vertical - 0.5).abs() < 1e-6);
    }

    #[test]
    fn spacing_clamps_ray_count() {
        let bounds = Rect::new(0.0, 0.0, 1.2, 2.2);
        let one = RaySpacing::new(bounds, 0.1, 1, 0);
        let two = RaySpacing::new(bounds, 0.1, 2, 2);

        assert_eq!(one, two);
        assert!(one.horizontal.is_finite());
        assert!((one.horizontal - 2.0).abs() < 1e-6);
    }

    #[test]
    fn spacing_of_zero_box_is_zero() {
        let spacing = RaySpacing::new(Rect::new(0.0, 0.0, 0.0, 0.0), 0.015, 4, 4);
        assert_eq!(spacing, RaySpacing::default());
    }

    // ==================== Slope Angle ====================

    #[test]
    fn slope_angle_of_common_surfaces() {
        assert!(slope_angle(Vec2::Y).abs() < 1e-4);
        assert!((slope_angle(Vec2::X) - 90.0).abs() < 1e-4);
        assert!((slope_angle(Vec2::NEG_X) - 90.0).abs() < 1e-4);
        assert!((slope_angle(Vec2::NEG_Y) - 180.0).abs() < 1e-4);

        let thirty = Vec2::new(-(30f32.to_radians().sin()), 30f32.to_radians().cos());
        assert!((slope_angle(thirty) - 30.0).abs() < 1e-3);
    }

    #[test]
    fn slope_angle_ignores_normal_length() {
        assert!((slope_angle(Vec2::new(3.0, 3.0)) - 45.0).abs() < 1e-3);
    }

    #[test]
    fn sign_or_zero_keeps_zero() {
        assert_eq!(sign_or_zero(0.0), 0.0);
        assert_eq!(sign_or_zero(-0.2), -1.0);
        assert_eq!(sign_or_zero(7.0), 1.0);
    }
}
