//! Movement intent component.
//!
//! Intents carry the desired movement from player input or AI. The
//! locomotion systems read them once per fixed step and turn button edges
//! into jump and dash actions.

use bevy::prelude::*;

/// Directional input and button state for one actor.
///
/// Buttons are plain held states: set them every frame from any input source
/// and the controller detects the edges. Edges are consumed once per fixed
/// step by [`MovementIntent::latch`].
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_raycast_controller::prelude::*;
///
/// let mut intent = MovementIntent::new();
/// intent.set_directional(Vec2::new(3.0, -0.5));
/// assert_eq!(intent.directional, Vec2::new(1.0, -0.5));
///
/// intent.set_jump_pressed(true);
/// assert!(intent.jump_just_pressed());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Directional axes, each in `[-1, 1]`. A vertical axis of `-1` asks to
    /// drop through one-way platforms.
    pub directional: Vec2,
    /// Whether the jump button is held.
    pub jump_pressed: bool,
    /// Whether the dash button is held.
    pub dash_pressed: bool,
    /// Held states at the last latch (for edge detection).
    pub(crate) jump_pressed_prev: bool,
    pub(crate) dash_pressed_prev: bool,
}

impl MovementIntent {
    /// Create a new empty movement intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both directional axes, clamped to `[-1, 1]`.
    pub fn set_directional(&mut self, directional: Vec2) {
        self.directional = directional.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Set the horizontal axis (-1.0 = left, 1.0 = right).
    pub fn set_horizontal(&mut self, direction: f32) {
        self.directional.x = direction.clamp(-1.0, 1.0);
    }

    /// Set the vertical axis (-1.0 = down, 1.0 = up).
    pub fn set_vertical(&mut self, direction: f32) {
        self.directional.y = direction.clamp(-1.0, 1.0);
    }

    /// Clear directional input. Button states are kept.
    pub fn clear(&mut self) {
        self.directional = Vec2::ZERO;
    }

    /// Set the jump button state.
    ///
    /// # Example
    /// ```rust,ignore
    /// intent.set_jump_pressed(keyboard.pressed(KeyCode::Space));
    /// ```
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Set the dash button state.
    pub fn set_dash_pressed(&mut self, pressed: bool) {
        self.dash_pressed = pressed;
    }

    /// Jump went from released to held since the last latch.
    pub fn jump_just_pressed(&self) -> bool {
        self.jump_pressed && !self.jump_pressed_prev
    }

    /// Jump went from held to released since the last latch.
    pub fn jump_just_released(&self) -> bool {
        !self.jump_pressed && self.jump_pressed_prev
    }

    /// Dash went from released to held since the last latch.
    pub fn dash_just_pressed(&self) -> bool {
        self.dash_pressed && !self.dash_pressed_prev
    }

    /// Remember the current button states so the same edge fires once.
    pub fn latch(&mut self) {
        self.jump_pressed_prev = self.jump_pressed;
        self.dash_pressed_prev = self.dash_pressed;
    }

    /// Whether the directional input asks to move horizontally.
    pub fn is_moving(&self) -> bool {
        self.directional.x.abs() > 0.001
    }
}
