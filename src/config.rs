//! Controller configuration.
//!
//! [`ControllerConfig`] describes the ray grid and is frozen into a
//! [`RaycastController`](crate::controller::RaycastController) when it is
//! built. [`LocomotionConfig`] tunes the movement layer on top and may be
//! edited at any time.

use bevy::prelude::*;

use crate::collision::CollisionMask;
use crate::raycast::MIN_RAY_COUNT;

/// Default distance rays start inside the actor's box.
pub const DEFAULT_SKIN_WIDTH: f32 = 0.015;

/// Configuration of the ray-grid collider.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// Layers the collider's rays can hit.
    pub collision_mask: CollisionMask,

    /// Rays cast sideways, spread along the box height. At least 2.
    pub horizontal_ray_count: usize,

    /// Rays cast up or down, spread along the box width. At least 2.
    pub vertical_ray_count: usize,

    /// Steepest slope that can be walked up or down (degrees).
    pub max_slope_angle: f32,

    /// Inset of the ray origins from the actor's box.
    pub skin_width: f32,

    /// How long a drop through a one-way platform lasts (simulation seconds).
    pub drop_through_duration: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            collision_mask: CollisionMask::ALL,
            horizontal_ray_count: 4,
            vertical_ray_count: 4,
            max_slope_angle: 80.0,
            skin_width: DEFAULT_SKIN_WIDTH,
            drop_through_duration: 5.0,
        }
    }
}

impl ControllerConfig {
    /// Builder: set both ray counts.
    pub fn with_ray_counts(mut self, horizontal: usize, vertical: usize) -> Self {
        self.horizontal_ray_count = horizontal;
        self.vertical_ray_count = vertical;
        self
    }

    /// Builder: set the max walkable slope angle (degrees).
    pub fn with_max_slope_angle(mut self, degrees: f32) -> Self {
        self.max_slope_angle = degrees;
        self
    }

    /// Builder: set the skin width.
    pub fn with_skin_width(mut self, skin_width: f32) -> Self {
        self.skin_width = skin_width;
        self
    }

    /// Builder: set the collision mask.
    pub fn with_collision_mask(mut self, mask: CollisionMask) -> Self {
        self.collision_mask = mask;
        self
    }

    /// Builder: set how long dropping through a platform lasts.
    pub fn with_drop_through_duration(mut self, seconds: f32) -> Self {
        self.drop_through_duration = seconds;
        self
    }

    /// Copy of this config with ray counts raised to [`MIN_RAY_COUNT`].
    pub(crate) fn sanitized(self) -> Self {
        if self.horizontal_ray_count < MIN_RAY_COUNT || self.vertical_ray_count < MIN_RAY_COUNT {
            warn!(
                "ray counts ({}, {}) below {MIN_RAY_COUNT}, clamping",
                self.horizontal_ray_count, self.vertical_ray_count
            );
        }
        Self {
            horizontal_ray_count: self.horizontal_ray_count.max(MIN_RAY_COUNT),
            vertical_ray_count: self.vertical_ray_count.max(MIN_RAY_COUNT),
            ..self
        }
    }

    /// Whether a slope of `degrees` can be walked on.
    #[inline]
    pub fn is_walkable(&self, degrees: f32) -> bool {
        degrees <= self.max_slope_angle
    }
}

/// Tuning of the locomotion layer (gravity, jumps, walls, dash).
///
/// Jump physics are specified by heights and time to apex; gravity and jump
/// velocities are derived from them.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct LocomotionConfig {
    // === Jump Settings ===
    /// Height reached when jump is released immediately.
    pub min_jump_height: f32,
    /// Height reached when jump is held through the apex.
    pub max_jump_height: f32,
    /// Seconds from takeoff to the apex of a full jump.
    pub time_to_jump_apex: f32,
    /// Minimum seconds between two jumps.
    pub jump_cooldown: f32,
    /// Seconds after leaving the ground during which a jump is still allowed.
    pub coyote_time: f32,
    /// Seconds a jump press is remembered before landing.
    pub jump_buffer_time: f32,

    // === Movement Settings ===
    /// Horizontal speed at full input (units/second).
    pub move_speed: f32,
    /// Smoothing time of horizontal velocity while airborne.
    pub acceleration_time_airborne: f32,
    /// Smoothing time of horizontal velocity while grounded.
    pub acceleration_time_grounded: f32,

    // === Wall Settings ===
    /// Jump velocity when jumping with input toward the wall.
    pub wall_jump_climb: Vec2,
    /// Jump velocity when jumping without horizontal input.
    pub wall_jump_off: Vec2,
    /// Jump velocity when jumping with input away from the wall.
    pub wall_leap: Vec2,
    /// Fastest fall speed while sliding down a wall.
    pub wall_slide_speed_max: f32,
    /// Seconds of input away from the wall before letting go.
    pub wall_stick_time: f32,

    // === Dash Settings ===
    /// Horizontal speed during a dash.
    pub dash_velocity: f32,
    /// Seconds a dash lasts.
    pub dash_time: f32,
    /// Seconds from the start of a dash until the next one is allowed.
    pub dash_cooldown: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            // Jump settings
            min_jump_height: 2.0,
            max_jump_height: 4.0,
            time_to_jump_apex: 0.4,
            jump_cooldown: 0.0,
            coyote_time: 0.5,
            jump_buffer_time: 0.5,

            // Movement settings
            move_speed: 6.0,
            acceleration_time_airborne: 0.2,
            acceleration_time_grounded: 0.1,

            // Wall settings
            wall_jump_climb: Vec2::new(7.5, 16.0),
            wall_jump_off: Vec2::new(8.5, 7.0),
            wall_leap: Vec2::new(18.0, 17.0),
            wall_slide_speed_max: 3.0,
            wall_stick_time: 0.25,

            // Dash settings
            dash_velocity: 3.0,
            dash_time: 0.1,
            dash_cooldown: 0.5,
        }
    }
}

impl LocomotionConfig {
    /// Gravity (negative, units/second²) that makes a full jump peak at
    /// `max_jump_height` after `time_to_jump_apex`.
    pub fn gravity(&self) -> f32 {
        -(2.0 * self.max_jump_height) / (self.time_to_jump_apex * self.time_to_jump_apex)
    }

    /// Takeoff speed of a full jump.
    pub fn max_jump_velocity(&self) -> f32 {
        self.gravity().abs() * self.time_to_jump_apex
    }

    /// Speed a jump is cut to when the button is released early.
    pub fn min_jump_velocity(&self) -> f32 {
        (2.0 * self.gravity().abs() * self.min_jump_height).sqrt()
    }

    /// Builder: set jump heights and time to apex.
    pub fn with_jump(mut self, min_height: f32, max_height: f32, time_to_apex: f32) -> Self {
        self.min_jump_height = min_height;
        self.max_jump_height = max_height;
        self.time_to_jump_apex = time_to_apex;
        self
    }

    /// Builder: set move speed.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Builder: set horizontal smoothing times.
    pub fn with_acceleration_times(mut self, grounded: f32, airborne: f32) -> Self {
        self.acceleration_time_grounded = grounded;
        self.acceleration_time_airborne = airborne;
        self
    }

    /// Builder: set coyote time.
    pub fn with_coyote_time(mut self, time: f32) -> Self {
        self.coyote_time = time;
        self
    }

    /// Builder: set jump buffer time.
    pub fn with_jump_buffer_time(mut self, time: f32) -> Self {
        self.jump_buffer_time = time;
        self
    }

    /// Builder: set jump cooldown.
    pub fn with_jump_cooldown(mut self, time: f32) -> Self {
        self.jump_cooldown = time;
        self
    }

    /// Builder: set the three wall jump velocities.
    pub fn with_wall_jumps(mut self, climb: Vec2, off: Vec2, leap: Vec2) -> Self {
        self.wall_jump_climb = climb;
        self.wall_jump_off = off;
        self.wall_leap = leap;
        self
    }

    /// Builder: set wall slide speed and stick time.
    pub fn with_wall_slide(mut self, speed_max: f32, stick_time: f32) -> Self {
        self.wall_slide_speed_max = speed_max;
        self.wall_stick_time = stick_time;
        self
    }

    /// Builder: set dash velocity, duration and cooldown.
    pub fn with_dash(mut self, velocity: f32, time: f32, cooldown: f32) -> Self {
        self.dash_velocity = velocity;
        self.dash_time = time;
        self.dash_cooldown = cooldown;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_config_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.horizontal_ray_count, 4);
        assert_eq!(config.vertical_ray_count, 4);
        assert_eq!(config.max_slope_angle, 80.0);
        assert_eq!(config.skin_width, DEFAULT_SKIN_WIDTH);
        assert_eq!(config.drop_through_duration, 5.0);
    }

    #[test]
    fn sanitized_clamps_ray_counts() {
        let config = ControllerConfig::default().with_ray_counts(1, 0).sanitized();
        assert_eq!(config.horizontal_ray_count, 2);
        assert_eq!(config.vertical_ray_count, 2);

        let config = ControllerConfig::default().with_ray_counts(6, 3).sanitized();
        assert_eq!(config.horizontal_ray_count, 6);
        assert_eq!(config.vertical_ray_count, 3);
    }

    #[test]
    fn walkable_includes_max_angle() {
        let config = ControllerConfig::default().with_max_slope_angle(45.0);
        assert!(config.is_walkable(45.0));
        assert!(!config.is_walkable(45.1));
    }

    #[test]
    fn locomotion_derived_jump_values() {
        let config = LocomotionConfig::default();

        // -(2 * 4) / 0.4² = -50
        assert!((config.gravity() + 50.0).abs() < 1e-3);
        assert!((config.max_jump_velocity() - 20.0).abs() < 1e-3);
        // sqrt(2 * 50 * 2) = sqrt(200)
        assert!((config.min_jump_velocity() - 200f32.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn locomotion_builders() {
        let config = LocomotionConfig::default()
            .with_jump(1.0, 3.0, 0.5)
            .with_move_speed(10.0)
            .with_dash(5.0, 0.2, 1.0);

        assert_eq!(config.max_jump_height, 3.0);
        assert_eq!(config.move_speed, 10.0);
        assert_eq!(config.dash_cooldown, 1.0);
    }
}
