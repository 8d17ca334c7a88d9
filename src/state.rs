//! State marker components.
//!
//! These components project the collider's [`CollisionReport`] onto the
//! entity so game code can query contact state directly. They are added and
//! removed by [`sync_state_markers`](crate::systems::sync_state_markers)
//! after every resolution.

use bevy::prelude::*;

use crate::detection::CollisionReport;

/// Marker component indicating the actor is standing on something.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_raycast_controller::prelude::*;
///
/// // Grounded is a marker component - just use it in queries
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the actor is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the actor hit a ceiling on its last move.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct TouchingCeiling;

/// Component indicating the actor is pressed against a wall.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct TouchingWall {
    /// Direction from the actor to the wall.
    pub direction: Vec2,
    /// Normal of the wall surface.
    pub normal: Vec2,
}

impl Default for TouchingWall {
    fn default() -> Self {
        Self {
            direction: Vec2::X,
            normal: Vec2::NEG_X,
        }
    }
}

impl TouchingWall {
    /// Create a new wall touch state.
    pub fn new(direction: Vec2, normal: Vec2) -> Self {
        Self { direction, normal }
    }

    /// Wall contact from a collision report, if any. Left wins when both
    /// sides are touched.
    pub fn from_report(report: &CollisionReport) -> Option<Self> {
        if report.left {
            Some(Self::new(Vec2::NEG_X, Vec2::X))
        } else if report.right {
            Some(Self::new(Vec2::X, Vec2::NEG_X))
        } else {
            None
        }
    }

    /// Check if the wall is on the left side.
    pub fn is_left(&self) -> bool {
        self.direction.x < 0.0
    }

    /// Check if the wall is on the right side.
    pub fn is_right(&self) -> bool {
        self.direction.x > 0.0
    }
}

/// Ground contact of the last move, as a single state.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[reflect(Component)]
pub enum GroundState {
    #[default]
    Airborne,
    Grounded,
    ClimbingSlope,
    DescendingSlope,
    /// On a slope too steep to stand on.
    SlidingMaxSlope,
}

impl GroundState {
    /// Project a collision report. Slope states take precedence over plain
    /// ground contact.
    pub fn from_report(report: &CollisionReport) -> Self {
        if report.sliding_down_max_slope {
            Self::SlidingMaxSlope
        } else if report.climbing_slope {
            Self::ClimbingSlope
        } else if report.descending_slope {
            Self::DescendingSlope
        } else if report.below {
            Self::Grounded
        } else {
            Self::Airborne
        }
    }

    /// Whether the actor can stand and jump.
    pub fn is_grounded(self) -> bool {
        matches!(
            self,
            Self::Grounded | Self::ClimbingSlope | Self::DescendingSlope
        )
    }
}
