//! The ray-grid collider.
//!
//! [`RaycastController`] turns a desired displacement into one that does not
//! pass through static geometry, and records what it touched along the way in
//! a [`CollisionReport`].
//!
//! # Algorithm
//!
//! Each call casts rays from the corners of the actor's skin-shrunk box:
//!
//! 1. When moving down, probe for slopes below: slide off slopes that are too
//!    steep, or snap onto walkable slopes that fall away in the direction of
//!    travel.
//! 2. Horizontal pass: rays along the leading edge. The lowest ray may start
//!    a slope climb; any other hit clamps the horizontal displacement.
//! 3. Vertical pass: rays along the leading top or bottom edge, shifted by the
//!    horizontal displacement already decided. One-way platforms are handled
//!    here. While climbing, a final horizontal probe at the new height picks
//!    up a change of slope.
//!
//! The order of these passes matters for how slopes feel and is kept as is.

use bevy::prelude::*;

use crate::backend::{KinematicBody, RayCaster, RaycastRequest};
use crate::collision::CollisionData;
use crate::config::ControllerConfig;
use crate::detection::CollisionReport;
use crate::raycast::{slope_angle, sign_or_zero, RaySpacing, RaycastOrigins};

/// Vertical input at or below this asks to drop through one-way platforms.
pub const DROP_THROUGH_INPUT: f32 = -1.0;

/// Ray-grid collider for one actor.
///
/// The configuration is fixed at construction. The collision report is only
/// written by [`resolve`](Self::resolve) and [`tick`](Self::tick).
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct RaycastController {
    config: ControllerConfig,
    collisions: CollisionReport,
    /// Corrected displacement of the last resolution.
    displacement: Vec2,
    #[reflect(ignore)]
    spacing: RaySpacing,
    /// Box size `spacing` was computed for.
    #[reflect(ignore)]
    spacing_size: Option<Vec2>,
}

impl Default for RaycastController {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl RaycastController {
    /// Create a collider. Ray counts below 2 are raised to 2.
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config: config.sanitized(),
            collisions: CollisionReport::default(),
            displacement: Vec2::ZERO,
            spacing: RaySpacing::default(),
            spacing_size: None,
        }
    }

    /// The configuration this collider was built with.
    #[inline]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Contact state from the last resolution.
    #[inline]
    pub fn collisions(&self) -> &CollisionReport {
        &self.collisions
    }

    /// Corrected displacement from the last resolution.
    #[inline]
    pub fn displacement(&self) -> Vec2 {
        self.displacement
    }

    /// Current ray spacing (zero before the first resolution).
    #[inline]
    pub fn spacing(&self) -> RaySpacing {
        self.spacing
    }

    /// Advance the collider's notion of time, expiring the drop-through flag
    /// once its deadline has passed.
    pub fn tick(&mut self, now: f32) {
        if self.collisions.expire_drop_through(now) {
            debug!("drop-through expired at t={now}");
        }
    }

    /// Resolve `displacement` for an actor whose box is `bounds`, without
    /// moving anything.
    ///
    /// `input` is the player's directional input; only its vertical axis is
    /// read, to request dropping through one-way platforms. `now` is the
    /// simulation time, used for the drop-through deadline. When
    /// `standing_on_platform` is set the report is forced to `below`.
    pub fn resolve<C: RayCaster + ?Sized>(
        &mut self,
        caster: &C,
        bounds: Rect,
        displacement: Vec2,
        input: Vec2,
        standing_on_platform: bool,
        now: f32,
    ) -> Vec2 {
        self.tick(now);
        self.refresh_spacing(bounds);

        self.collisions.reset();
        self.collisions.velocity_old = displacement;

        let mut resolution = Resolution {
            caster,
            config: &self.config,
            spacing: self.spacing,
            origins: RaycastOrigins::new(bounds, self.config.skin_width),
            report: &mut self.collisions,
            input,
            now,
        };
        let corrected = resolution.run(displacement);

        if standing_on_platform {
            self.collisions.below = true;
        }

        trace!(
            "resolved {displacement:?} -> {corrected:?} (below={}, slope={})",
            self.collisions.below,
            self.collisions.slope_angle()
        );

        self.displacement = corrected;
        corrected
    }

    /// Resolve `displacement` for `body` and move it by the result.
    pub fn move_body<B: KinematicBody + ?Sized, C: RayCaster + ?Sized>(
        &mut self,
        body: &mut B,
        caster: &C,
        displacement: Vec2,
        input: Vec2,
        standing_on_platform: bool,
        now: f32,
    ) -> Vec2 {
        let corrected = self.resolve(
            caster,
            body.bounding_box(),
            displacement,
            input,
            standing_on_platform,
            now,
        );
        body.translate(corrected);
        corrected
    }

    fn refresh_spacing(&mut self, bounds: Rect) {
        let size = bounds.size();
        if self.spacing_size != Some(size) {
            self.spacing = RaySpacing::new(
                bounds,
                self.config.skin_width,
                self.config.horizontal_ray_count,
                self.config.vertical_ray_count,
            );
            self.spacing_size = Some(size);
        }
    }
}

/// State of a single resolution call.
struct Resolution<'a, C: ?Sized> {
    caster: &'a C,
    config: &'a ControllerConfig,
    spacing: RaySpacing,
    origins: RaycastOrigins,
    report: &'a mut CollisionReport,
    input: Vec2,
    now: f32,
}

impl<C: RayCaster + ?Sized> Resolution<'_, C> {
    fn run(&mut self, mut velocity: Vec2) -> Vec2 {
        if velocity.y < 0.0 {
            self.descend_slope(&mut velocity);
        }

        if velocity.x != 0.0 {
            self.report.face_dir = if velocity.x < 0.0 { -1 } else { 1 };
        }

        self.horizontal_collisions(&mut velocity);

        if velocity.y != 0.0 {
            self.vertical_collisions(&mut velocity);
        }

        velocity
    }

    /// Cast a ray with the collider's mask. Zero-distance hits come from
    /// surfaces the ray starts on and are dropped.
    fn cast(&self, origin: Vec2, direction: Vec2, length: f32) -> Option<CollisionData> {
        let request =
            RaycastRequest::new(origin, direction, length).with_mask(self.config.collision_mask);
        self.caster
            .cast_ray(&request)
            .filter(|hit| hit.distance > 0.0)
    }

    fn horizontal_collisions(&mut self, velocity: &mut Vec2) {
        let skin = self.config.skin_width;
        let direction_x = self.report.face_dir();
        let mut ray_length = velocity.x.abs() + skin;

        if velocity.x.abs() < skin {
            ray_length = 2.0 * skin;
        }

        for i in 0..self.config.horizontal_ray_count {
            let origin = self.origins.bottom_leading(direction_x)
                + Vec2::Y * (self.spacing.horizontal * i as f32);
            let Some(hit) = self.cast(origin, Vec2::X * direction_x, ray_length) else {
                continue;
            };

            let angle = slope_angle(hit.normal);
            let walkable = self.config.is_walkable(angle);

            if i == 0 && walkable {
                if self.report.descending_slope {
                    self.report.descending_slope = false;
                    *velocity = self.report.velocity_old;
                }

                // Reach the foot of a new slope before climbing it.
                let mut distance_to_slope_start = 0.0;
                if angle != self.report.slope_angle.previous {
                    distance_to_slope_start = hit.distance - skin;
                    velocity.x -= distance_to_slope_start * direction_x;
                }
                self.climb_slope(velocity, angle, hit.normal);
                velocity.x += distance_to_slope_start * direction_x;
            }

            if !self.report.climbing_slope || !walkable {
                velocity.x = (hit.distance - skin) * direction_x;
                ray_length = hit.distance;

                if self.report.climbing_slope {
                    velocity.y =
                        self.report.slope_angle.current.to_radians().tan() * velocity.x.abs();
                }

                self.report.left = direction_x < 0.0;
                self.report.right = direction_x > 0.0;
            }
        }
    }

    fn climb_slope(&mut self, velocity: &mut Vec2, angle: f32, normal: Vec2) {
        let radians = angle.to_radians();
        let move_distance = velocity.x.abs();
        let climb_velocity_y = radians.sin() * move_distance;

        // Already rising faster than the slope (jumping): leave it alone.
        if velocity.y <= climb_velocity_y {
            velocity.y = climb_velocity_y;
            velocity.x = radians.cos() * move_distance * velocity.x.signum();
            self.report.below = true;
            self.report.climbing_slope = true;
            self.report.slope_angle.current = angle;
            self.report.slope_normal = normal;
        }
    }

    fn descend_slope(&mut self, velocity: &mut Vec2) {
        let skin = self.config.skin_width;
        let probe_length = velocity.y.abs() + skin;
        let left = self.cast(self.origins.bottom_left, Vec2::NEG_Y, probe_length);
        let right = self.cast(self.origins.bottom_right, Vec2::NEG_Y, probe_length);

        // Only one foot on the ground: perched on the edge of a steep slope.
        if left.is_some() != right.is_some() {
            if let Some(hit) = left.or(right) {
                self.slide_down_max_slope(&hit, velocity);
            }
        }
        if self.report.sliding_down_max_slope {
            return;
        }

        let direction_x = velocity.x.signum();
        let origin = self.origins.bottom_trailing(direction_x);
        let Some(hit) = self.cast(origin, Vec2::NEG_Y, f32::MAX) else {
            return;
        };

        let angle = slope_angle(hit.normal);
        if angle == 0.0 || !self.config.is_walkable(angle) {
            return;
        }
        if sign_or_zero(hit.normal.x) != direction_x {
            return;
        }

        let radians = angle.to_radians();
        let move_distance = velocity.x.abs();
        if hit.distance - skin <= radians.tan() * move_distance {
            velocity.x = radians.cos() * move_distance * velocity.x.signum();
            velocity.y -= radians.sin() * move_distance;

            self.report.slope_angle.current = angle;
            self.report.descending_slope = true;
            self.report.below = true;
            self.report.slope_normal = hit.normal;
        }
    }

    fn slide_down_max_slope(&mut self, hit: &CollisionData, velocity: &mut Vec2) {
        let angle = slope_angle(hit.normal);
        if self.config.is_walkable(angle) {
            return;
        }

        velocity.x = hit.normal.x.signum() * (velocity.y.abs() - hit.distance)
            / angle.to_radians().tan();

        self.report.slope_angle.current = angle;
        self.report.sliding_down_max_slope = true;
        self.report.slope_normal = hit.normal;

        debug!("sliding down {angle:.1}° slope, dx={:.4}", velocity.x);
    }

    fn vertical_collisions(&mut self, velocity: &mut Vec2) {
        let skin = self.config.skin_width;
        let direction_y = velocity.y.signum();
        let mut ray_length = velocity.y.abs() + skin;

        for i in 0..self.config.vertical_ray_count {
            let corner = if direction_y < 0.0 {
                self.origins.bottom_left
            } else {
                self.origins.top_left
            };
            let origin = corner + Vec2::X * (self.spacing.vertical * i as f32 + velocity.x);
            let Some(hit) = self.cast(origin, Vec2::Y * direction_y, ray_length) else {
                continue;
            };

            if hit.is_one_way() && self.passes_through(direction_y) {
                continue;
            }

            velocity.y = (hit.distance - skin) * direction_y;
            ray_length = hit.distance;

            if self.report.climbing_slope {
                let tan = self.report.slope_angle.current.to_radians().tan();
                if tan != 0.0 {
                    velocity.x = velocity.y / tan * velocity.x.signum();
                }
            }

            self.report.above = direction_y > 0.0;
            self.report.below = direction_y < 0.0;
        }

        if self.report.climbing_slope {
            self.probe_slope_change(velocity);
        }
    }

    /// Whether a one-way platform hit should be ignored. Starts a drop-through
    /// when the input asks for one.
    fn passes_through(&mut self, direction_y: f32) -> bool {
        if direction_y > 0.0 || self.report.falling_through_platform {
            return true;
        }

        if self.input.y <= DROP_THROUGH_INPUT {
            let deadline = self.now + self.config.drop_through_duration;
            self.report.begin_drop_through(deadline);
            debug!("dropping through platform until t={deadline}");
            return true;
        }

        false
    }

    /// Re-probe sideways at the height reached, so a climb stops at the seam
    /// between two slopes of different angles.
    fn probe_slope_change(&mut self, velocity: &mut Vec2) {
        let skin = self.config.skin_width;
        let direction_x = velocity.x.signum();
        let ray_length = velocity.x.abs() + skin;
        let origin = self.origins.bottom_leading(direction_x) + Vec2::Y * velocity.y;

        let Some(hit) = self.cast(origin, Vec2::X * direction_x, ray_length) else {
            return;
        };

        let angle = slope_angle(hit.normal);
        if angle != self.report.slope_angle.current {
            velocity.x = (hit.distance - skin) * direction_x;
            self.report.slope_angle.current = angle;
            self.report.slope_normal = hit.normal;
        }
    }
}
