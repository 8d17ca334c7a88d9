//! Collision report produced by every resolution call.
//!
//! The report is rebuilt on each call, except for the handful of fields that
//! describe state spanning several calls: the facing direction, the
//! drop-through flag, and the previous call's slope angle.

use bevy::prelude::*;

/// Slope angle of the current call and the one before it, in degrees.
///
/// `previous` is only ever written by [`SlopeAngle::advance`], which runs once
/// at the start of every resolution call.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct SlopeAngle {
    pub current: f32,
    pub previous: f32,
}

impl SlopeAngle {
    /// Shift `current` into `previous` and clear `current`.
    pub fn advance(&mut self) {
        self.previous = self.current;
        self.current = 0.0;
    }
}

/// Contact state reported by the ray-grid collider.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct CollisionReport {
    /// A vertical ray hit something while moving up.
    pub above: bool,
    /// Standing on something: a downward hit, a slope, or a carrying platform.
    pub below: bool,
    /// Horizontal contact on the left.
    pub left: bool,
    /// Horizontal contact on the right.
    pub right: bool,

    /// Moving up a walkable slope this call.
    pub climbing_slope: bool,
    /// Snapped down onto a walkable slope this call.
    pub descending_slope: bool,
    /// Sliding down a slope steeper than the walkable maximum.
    pub sliding_down_max_slope: bool,

    /// Slope under the actor, this call and last call.
    pub slope_angle: SlopeAngle,
    /// Normal of the slope under the actor (zero when none).
    pub slope_normal: Vec2,
    /// Displacement as requested, before any correction.
    pub velocity_old: Vec2,

    /// Last non-zero horizontal direction, `1` or `-1`. Survives resets.
    pub face_dir: i8,
    /// Dropping through one-way platforms. Survives resets; cleared once
    /// `drop_through_deadline` is reached.
    pub falling_through_platform: bool,
    /// Simulation time at which `falling_through_platform` expires.
    pub drop_through_deadline: Option<f32>,
}

impl Default for CollisionReport {
    fn default() -> Self {
        Self {
            above: false,
            below: false,
            left: false,
            right: false,
            climbing_slope: false,
            descending_slope: false,
            sliding_down_max_slope: false,
            slope_angle: SlopeAngle::default(),
            slope_normal: Vec2::ZERO,
            velocity_old: Vec2::ZERO,
            face_dir: 1,
            falling_through_platform: false,
            drop_through_deadline: None,
        }
    }
}

impl CollisionReport {
    /// Clear per-call state before a new resolution.
    ///
    /// `face_dir` and the drop-through state are kept, and the slope angle is
    /// advanced so `slope_angle.previous` holds the last call's angle.
    pub fn reset(&mut self) {
        self.above = false;
        self.below = false;
        self.left = false;
        self.right = false;
        self.climbing_slope = false;
        self.descending_slope = false;
        self.sliding_down_max_slope = false;
        self.slope_normal = Vec2::ZERO;
        self.slope_angle.advance();
    }

    /// Start dropping through one-way platforms until `deadline`.
    pub fn begin_drop_through(&mut self, deadline: f32) {
        self.falling_through_platform = true;
        self.drop_through_deadline = Some(deadline);
    }

    /// Clear the drop-through flag if its deadline has passed.
    ///
    /// Returns `true` when the flag was cleared by this call.
    pub fn expire_drop_through(&mut self, now: f32) -> bool {
        match self.drop_through_deadline {
            Some(deadline) if now >= deadline => {
                self.falling_through_platform = false;
                self.drop_through_deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Facing direction as a float, for multiplying displacements.
    #[inline]
    pub fn face_dir(&self) -> f32 {
        f32::from(self.face_dir)
    }

    /// Touching a wall on either side.
    #[inline]
    pub fn touching_wall(&self) -> bool {
        self.left || self.right
    }

    /// Current slope angle in degrees.
    #[inline]
    pub fn slope_angle(&self) -> f32 {
        self.slope_angle.current
    }

    /// Whether the report is on any kind of slope this call.
    pub fn on_slope(&self) -> bool {
        self.climbing_slope || self.descending_slope || self.sliding_down_max_slope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== SlopeAngle Tests ====================

    #[test]
    fn slope_angle_advance_moves_current_to_previous() {
        let mut angle = SlopeAngle {
            current: 30.0,
            previous: 10.0,
        };
        angle.advance();

        assert_eq!(angle.previous, 30.0);
        assert_eq!(angle.current, 0.0);
    }

    // ==================== CollisionReport Tests ====================

    #[test]
    fn default_report_faces_right() {
        let report = CollisionReport::default();
        assert_eq!(report.face_dir, 1);
        assert_eq!(report.face_dir(), 1.0);
        assert!(!report.below);
        assert!(!report.falling_through_platform);
    }

    #[test]
    fn reset_clears_contacts_but_keeps_carried_fields() {
        let mut report = CollisionReport {
            above: true,
            below: true,
            left: true,
            right: true,
            climbing_slope: true,
            descending_slope: true,
            sliding_down_max_slope: true,
            slope_angle: SlopeAngle {
                current: 45.0,
                previous: 0.0,
            },
            slope_normal: Vec2::new(-0.7, 0.7),
            velocity_old: Vec2::new(1.0, 2.0),
            face_dir: -1,
            falling_through_platform: true,
            drop_through_deadline: Some(3.0),
        };

        report.reset();

        assert!(!report.above && !report.below && !report.left && !report.right);
        assert!(!report.on_slope());
        assert_eq!(report.slope_normal, Vec2::ZERO);
        assert_eq!(report.slope_angle.previous, 45.0);
        assert_eq!(report.slope_angle(), 0.0);
        assert_eq!(report.face_dir, -1);
        assert!(report.falling_through_platform);
        assert_eq!(report.drop_through_deadline, Some(3.0));
    }

    #[test]
    fn drop_through_expires_at_deadline() {
        let mut report = CollisionReport::default();
        report.begin_drop_through(5.0);

        assert!(!report.expire_drop_through(4.99));
        assert!(report.falling_through_platform);

        assert!(report.expire_drop_through(5.0));
        assert!(!report.falling_through_platform);
        assert!(report.drop_through_deadline.is_none());

        // Nothing left to expire.
        assert!(!report.expire_drop_through(10.0));
    }

    #[test]
    fn touching_wall_either_side() {
        let mut report = CollisionReport::default();
        assert!(!report.touching_wall());

        report.left = true;
        assert!(report.touching_wall());
    }
}
