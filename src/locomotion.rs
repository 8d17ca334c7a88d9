//! Platformer locomotion on top of the ray-grid collider.
//!
//! [`Locomotion`] keeps the actor's velocity and the timers of its movement
//! abilities. Each fixed step it turns directional input into a desired
//! displacement for the collider, then reacts to the resulting
//! [`CollisionReport`].
//!
//! Step order:
//! 1. Button edges (`on_jump_input_down`, `on_jump_input_up`,
//!    `on_dash_input_down`).
//! 2. [`Locomotion::step`]: smoothing, gravity, wall slide, coyote time,
//!    buffered jump, dash.
//! 3. Collision resolution.
//! 4. [`Locomotion::after_move`]: stop on floors and ceilings.

use std::time::Duration;

use bevy::prelude::*;

use crate::config::LocomotionConfig;
use crate::detection::CollisionReport;
use crate::raycast::sign_or_zero;

/// Velocity and ability state of a platformer actor.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct Locomotion {
    /// Velocity in units per second.
    pub velocity: Vec2,
    /// Rate of change of `velocity.x`, carried between smoothing steps.
    velocity_x_smoothing: f32,
    /// Directional input of the current step.
    directional: Vec2,

    wall_sliding: bool,
    /// Side of the wall being touched, `-1` or `1`.
    wall_dir: i8,

    wall_unstick: Timer,
    coyote: Timer,
    jump_buffer: Timer,
    jump_cooldown: Timer,
    dash: Timer,
    dash_cooldown: Timer,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            velocity_x_smoothing: 0.0,
            directional: Vec2::ZERO,
            wall_sliding: false,
            wall_dir: 1,
            wall_unstick: finished_timer(),
            coyote: finished_timer(),
            jump_buffer: finished_timer(),
            jump_cooldown: finished_timer(),
            dash: finished_timer(),
            dash_cooldown: finished_timer(),
        }
    }
}

impl Locomotion {
    pub fn new() -> Self {
        Self::default()
    }

    // === Queries ===

    /// Sliding down a wall this step.
    pub fn is_wall_sliding(&self) -> bool {
        self.wall_sliding
    }

    /// Side of the last wall touched, `-1` (left) or `1` (right).
    pub fn wall_dir(&self) -> i8 {
        self.wall_dir
    }

    /// A dash is in progress.
    pub fn is_dashing(&self) -> bool {
        !self.dash.finished()
    }

    /// Dashing is not allowed yet.
    pub fn dash_on_cooldown(&self) -> bool {
        !self.dash_cooldown.finished()
    }

    /// Still within coyote time of the last grounded step.
    pub fn coyote_active(&self) -> bool {
        !self.coyote.finished()
    }

    /// A jump press is waiting to be used.
    pub fn jump_buffered(&self) -> bool {
        !self.jump_buffer.finished()
    }

    /// Jumping is not allowed yet.
    pub fn jump_on_cooldown(&self) -> bool {
        !self.jump_cooldown.finished()
    }

    // === Input edges ===

    /// Jump button went down.
    ///
    /// Arms the jump buffer. While wall sliding, jumps away from the wall
    /// with a vector picked from the horizontal input. On the ground, jumps
    /// immediately and uses up coyote time.
    pub fn on_jump_input_down(
        &mut self,
        config: &LocomotionConfig,
        report: &CollisionReport,
        directional: Vec2,
    ) {
        restart(&mut self.jump_buffer, config.jump_buffer_time);

        if self.wall_sliding {
            let wall_dir = f32::from(self.wall_dir);
            let input_x = sign_or_zero(directional.x);
            let jump = if input_x == wall_dir {
                config.wall_jump_climb
            } else if input_x == 0.0 {
                config.wall_jump_off
            } else {
                config.wall_leap
            };
            self.velocity = Vec2::new(-wall_dir * jump.x, jump.y);
        }

        if report.below {
            self.jump(config);
            finish(&mut self.coyote);
        }
    }

    /// Jump button went up: cut the jump short.
    pub fn on_jump_input_up(&mut self, config: &LocomotionConfig) {
        let min_jump_velocity = config.min_jump_velocity();
        if self.velocity.y > min_jump_velocity {
            self.velocity.y = min_jump_velocity;
        }
    }

    /// Dash button went down. Ignored while the dash is on cooldown.
    pub fn on_dash_input_down(&mut self, config: &LocomotionConfig) {
        if self.dash_on_cooldown() {
            return;
        }

        restart(&mut self.dash, config.dash_time);
        restart(&mut self.dash_cooldown, config.dash_cooldown);
    }

    // === Per-step ===

    /// Advance one fixed step of `dt` seconds and return the displacement to
    /// hand to the collider.
    ///
    /// `report` is the collision report of the previous move.
    pub fn step(
        &mut self,
        config: &LocomotionConfig,
        report: &CollisionReport,
        directional: Vec2,
        dt: f32,
    ) -> Vec2 {
        let delta = duration_from_secs(dt);
        self.directional = directional;

        self.jump_buffer.tick(delta);
        self.jump_cooldown.tick(delta);
        self.dash.tick(delta);
        self.dash_cooldown.tick(delta);

        self.calculate_velocity(config, report, dt);
        self.handle_wall_sliding(config, report, delta);
        self.handle_coyote(config, report, delta);

        if self.coyote_active() && self.jump_buffered() && !self.jump_on_cooldown() {
            self.jump(config);
            finish(&mut self.jump_buffer);
        }

        if self.is_dashing() {
            self.velocity = Vec2::new(config.dash_velocity * report.face_dir(), 0.0);
        }

        self.velocity * dt
    }

    /// React to the collision report of the move that just happened.
    ///
    /// Floors and ceilings stop vertical motion, except on a slope too steep
    /// to stand on, where gravity keeps pulling along the slope.
    pub fn after_move(&mut self, config: &LocomotionConfig, report: &CollisionReport, dt: f32) {
        if report.above || report.below {
            if report.sliding_down_max_slope {
                self.velocity.y += report.slope_normal.y * -config.gravity() * dt;
            } else {
                self.velocity.y = 0.0;
            }
        }
    }

    fn calculate_velocity(&mut self, config: &LocomotionConfig, report: &CollisionReport, dt: f32) {
        let target_velocity_x = self.directional.x * config.move_speed;
        let smooth_time = if report.below {
            config.acceleration_time_grounded
        } else {
            config.acceleration_time_airborne
        };

        self.velocity.x = smooth_damp(
            self.velocity.x,
            target_velocity_x,
            &mut self.velocity_x_smoothing,
            smooth_time,
            dt,
        );
        self.velocity.y += config.gravity() * dt;
    }

    fn handle_wall_sliding(
        &mut self,
        config: &LocomotionConfig,
        report: &CollisionReport,
        delta: Duration,
    ) {
        self.wall_dir = if report.left { -1 } else { 1 };
        self.wall_sliding = false;

        if !report.touching_wall() || report.below || self.velocity.y >= 0.0 {
            return;
        }

        self.wall_sliding = true;
        self.velocity.y = self.velocity.y.max(-config.wall_slide_speed_max);

        if self.wall_unstick.finished() {
            restart(&mut self.wall_unstick, config.wall_stick_time);
            return;
        }

        // Stuck to the wall until input away from it has been held long enough.
        self.velocity_x_smoothing = 0.0;
        self.velocity.x = 0.0;

        let input_x = sign_or_zero(self.directional.x);
        if input_x != 0.0 && input_x != f32::from(self.wall_dir) {
            self.wall_unstick.tick(delta);
        } else {
            restart(&mut self.wall_unstick, config.wall_stick_time);
        }
    }

    fn handle_coyote(
        &mut self,
        config: &LocomotionConfig,
        report: &CollisionReport,
        delta: Duration,
    ) {
        if report.below {
            restart(&mut self.coyote, config.coyote_time);
        } else {
            self.coyote.tick(delta);
        }
    }

    fn jump(&mut self, config: &LocomotionConfig) {
        self.velocity.y = config.max_jump_velocity();
        restart(&mut self.jump_cooldown, config.jump_cooldown);
    }
}

/// Gradually move `current` toward `target`, like a critically damped
/// spring reaching it in about `smooth_time` seconds.
///
/// `velocity` is the rate of change carried between calls. The result never
/// overshoots `target`.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;

    let mut output = target + (change + temp) * exp;
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}

fn finished_timer() -> Timer {
    let mut timer = Timer::from_seconds(0.0, TimerMode::Once);
    timer.tick(Duration::ZERO);
    timer
}

/// Longest span a timer is set to or ticked by.
const MAX_DURATION: Duration = Duration::from_secs(u32::MAX as u64);

/// Non-negative seconds as a `Duration`, saturating at [`MAX_DURATION`].
fn duration_from_secs(seconds: f32) -> Duration {
    Duration::try_from_secs_f32(seconds.max(0.0))
        .map_or(MAX_DURATION, |duration| duration.min(MAX_DURATION))
}

fn restart(timer: &mut Timer, seconds: f32) {
    timer.set_duration(duration_from_secs(seconds));
    timer.reset();
}

fn finish(timer: &mut Timer) {
    let remaining = timer.remaining();
    timer.tick(remaining);
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn grounded() -> CollisionReport {
        CollisionReport {
            below: true,
            ..default()
        }
    }

    fn against_right_wall() -> CollisionReport {
        CollisionReport {
            right: true,
            ..default()
        }
    }

    // ==================== SmoothDamp Tests ====================

    #[test]
    fn smooth_damp_converges_without_overshoot() {
        let mut value = 0.0;
        let mut velocity = 0.0;

        for _ in 0..120 {
            value = smooth_damp(value, 6.0, &mut velocity, 0.1, DT);
            assert!(value <= 6.0);
        }

        assert!((value - 6.0).abs() < 1e-3);
    }

    #[test]
    fn smooth_damp_zero_dt_is_noop() {
        let mut velocity = 1.0;
        assert_eq!(smooth_damp(2.0, 5.0, &mut velocity, 0.1, 0.0), 2.0);
        assert_eq!(velocity, 1.0);
    }

    // ==================== Gravity and Jump Tests ====================

    #[test]
    fn gravity_accumulates_when_airborne() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion::new();

        let displacement = locomotion.step(&config, &CollisionReport::default(), Vec2::ZERO, DT);

        assert!((locomotion.velocity.y - config.gravity() * DT).abs() < 1e-4);
        assert!(displacement.y < 0.0);
    }

    #[test]
    fn landing_zeroes_vertical_velocity() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion::new();
        locomotion.velocity.y = -10.0;

        locomotion.after_move(&config, &grounded(), DT);
        assert_eq!(locomotion.velocity.y, 0.0);
    }

    #[test]
    fn max_slope_slide_keeps_falling() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion::new();
        locomotion.velocity.y = -1.0;

        let report = CollisionReport {
            below: true,
            sliding_down_max_slope: true,
            slope_normal: Vec2::new(0.9, 0.4),
            ..default()
        };
        locomotion.after_move(&config, &report, DT);

        let expected = -1.0 + 0.4 * -config.gravity() * DT;
        assert!((locomotion.velocity.y - expected).abs() < 1e-5);
    }

    #[test]
    fn grounded_jump_is_immediate() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion::new();

        locomotion.on_jump_input_down(&config, &grounded(), Vec2::ZERO);

        assert_eq!(locomotion.velocity.y, config.max_jump_velocity());
        assert!(!locomotion.coyote_active());
        assert!(locomotion.jump_buffered());
    }

    #[test]
    fn releasing_jump_cuts_velocity() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion::new();
        locomotion.velocity.y = config.max_jump_velocity();

        locomotion.on_jump_input_up(&config);
        assert_eq!(locomotion.velocity.y, config.min_jump_velocity());

        // Already slower: untouched.
        locomotion.velocity.y = 1.0;
        locomotion.on_jump_input_up(&config);
        assert_eq!(locomotion.velocity.y, 1.0);
    }

    #[test]
    fn coyote_time_allows_late_jump() {
        let config = LocomotionConfig::default().with_coyote_time(0.2);
        let mut locomotion = Locomotion::new();

        // Walk off a ledge.
        locomotion.step(&config, &grounded(), Vec2::ZERO, DT);
        locomotion.step(&config, &CollisionReport::default(), Vec2::ZERO, DT);
        assert!(locomotion.coyote_active());

        locomotion.on_jump_input_down(&config, &CollisionReport::default(), Vec2::ZERO);
        locomotion.step(&config, &CollisionReport::default(), Vec2::ZERO, DT);

        println!("PROOF: coyote jump vy={}", locomotion.velocity.y);
        assert!(locomotion.velocity.y > 0.0);
        assert!(!locomotion.jump_buffered());
    }

    #[test]
    fn coyote_time_runs_out() {
        let config = LocomotionConfig::default().with_coyote_time(0.05);
        let mut locomotion = Locomotion::new();

        locomotion.step(&config, &grounded(), Vec2::ZERO, DT);
        for _ in 0..10 {
            locomotion.step(&config, &CollisionReport::default(), Vec2::ZERO, DT);
        }
        assert!(!locomotion.coyote_active());

        locomotion.on_jump_input_down(&config, &CollisionReport::default(), Vec2::ZERO);
        locomotion.step(&config, &CollisionReport::default(), Vec2::ZERO, DT);

        assert!(locomotion.velocity.y < 0.0);
    }

    #[test]
    fn buffered_jump_fires_on_landing() {
        let config = LocomotionConfig::default().with_jump_buffer_time(0.2);
        let mut locomotion = Locomotion::new();
        locomotion.velocity.y = -5.0;

        // Pressed in the air, just before touching down.
        locomotion.on_jump_input_down(&config, &CollisionReport::default(), Vec2::ZERO);
        locomotion.step(&config, &CollisionReport::default(), Vec2::ZERO, DT);
        assert!(locomotion.velocity.y < 0.0);

        locomotion.after_move(&config, &grounded(), DT);
        locomotion.step(&config, &grounded(), Vec2::ZERO, DT);

        assert_eq!(locomotion.velocity.y, config.max_jump_velocity());
        assert!(!locomotion.jump_buffered());
    }

    #[test]
    fn buffered_jump_expires() {
        let config = LocomotionConfig::default().with_jump_buffer_time(0.05);
        let mut locomotion = Locomotion::new();

        locomotion.on_jump_input_down(&config, &CollisionReport::default(), Vec2::ZERO);
        for _ in 0..10 {
            locomotion.step(&config, &CollisionReport::default(), Vec2::ZERO, DT);
        }
        assert!(!locomotion.jump_buffered());

        locomotion.after_move(&config, &grounded(), DT);
        locomotion.step(&config, &grounded(), Vec2::ZERO, DT);
        assert!(locomotion.velocity.y <= 0.0);
    }

    #[test]
    fn jump_cooldown_blocks_repeat() {
        let config = LocomotionConfig::default().with_jump_cooldown(1.0);
        let mut locomotion = Locomotion::new();

        locomotion.on_jump_input_down(&config, &grounded(), Vec2::ZERO);
        assert!(locomotion.jump_on_cooldown());

        // Landed again right away with the press still buffered.
        locomotion.velocity.y = 0.0;
        locomotion.step(&config, &grounded(), Vec2::ZERO, DT);
        assert!(locomotion.velocity.y < 0.0);
    }

    // ==================== Horizontal Tests ====================

    #[test]
    fn horizontal_velocity_approaches_move_speed() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion::new();

        for _ in 0..120 {
            locomotion.step(&config, &grounded(), Vec2::X, DT);
            locomotion.after_move(&config, &grounded(), DT);
        }

        assert!((locomotion.velocity.x - config.move_speed).abs() < 1e-2);
    }

    // ==================== Wall Tests ====================

    #[test]
    fn wall_slide_caps_fall_speed() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion::new();
        locomotion.velocity.y = -20.0;

        locomotion.step(&config, &against_right_wall(), Vec2::ZERO, DT);

        assert!(locomotion.is_wall_sliding());
        assert_eq!(locomotion.wall_dir(), 1);
        assert_eq!(locomotion.velocity.y, -config.wall_slide_speed_max);
    }

    #[test]
    fn rising_along_wall_is_not_sliding() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion::new();
        locomotion.velocity.y = 10.0;

        locomotion.step(&config, &against_right_wall(), Vec2::ZERO, DT);
        assert!(!locomotion.is_wall_sliding());
    }

    #[test]
    fn wall_stick_holds_until_unstick_time() {
        let config = LocomotionConfig::default().with_wall_slide(3.0, 0.1);
        let mut locomotion = Locomotion::new();
        locomotion.velocity.y = -1.0;

        // First sliding step arms the stick timer.
        locomotion.step(&config, &against_right_wall(), Vec2::ZERO, DT);

        // Pulling away from the wall is held back for a while.
        let mut released_at = None;
        for step in 0..20 {
            locomotion.step(&config, &against_right_wall(), Vec2::NEG_X, DT);
            if locomotion.velocity.x < 0.0 {
                released_at = Some(step);
                break;
            }
        }

        let Some(step) = released_at else {
            panic!("never let go of the wall");
        };
        assert!(step >= 4, "let go too early, after {step} steps");
    }

    #[test]
    fn wall_jump_vectors() {
        let config = LocomotionConfig::default();

        let cases = [
            (Vec2::X, config.wall_jump_climb),
            (Vec2::ZERO, config.wall_jump_off),
            (Vec2::NEG_X, config.wall_leap),
        ];

        for (input, expected) in cases {
            let mut locomotion = Locomotion::new();
            locomotion.velocity.y = -1.0;
            locomotion.step(&config, &against_right_wall(), input, DT);
            assert!(locomotion.is_wall_sliding());

            locomotion.on_jump_input_down(&config, &against_right_wall(), input);

            assert_eq!(locomotion.velocity, Vec2::new(-expected.x, expected.y));
        }
    }

    // ==================== Dash Tests ====================

    #[test]
    fn dash_overrides_velocity() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion::new();
        let report = CollisionReport {
            face_dir: -1,
            ..default()
        };

        locomotion.on_dash_input_down(&config);
        assert!(locomotion.is_dashing());

        let displacement = locomotion.step(&config, &report, Vec2::ZERO, DT);

        assert_eq!(locomotion.velocity, Vec2::new(-config.dash_velocity, 0.0));
        assert_eq!(displacement, locomotion.velocity * DT);
    }

    #[test]
    fn dash_ends_and_cools_down() {
        let config = LocomotionConfig::default().with_dash(3.0, 0.05, 0.2);
        let mut locomotion = Locomotion::new();

        locomotion.on_dash_input_down(&config);
        for _ in 0..5 {
            locomotion.step(&config, &CollisionReport::default(), Vec2::ZERO, DT);
        }
        assert!(!locomotion.is_dashing());
        assert!(locomotion.dash_on_cooldown());

        // Ignored during cooldown.
        locomotion.on_dash_input_down(&config);
        assert!(!locomotion.is_dashing());

        for _ in 0..12 {
            locomotion.step(&config, &CollisionReport::default(), Vec2::ZERO, DT);
        }
        assert!(!locomotion.dash_on_cooldown());

        locomotion.on_dash_input_down(&config);
        assert!(locomotion.is_dashing());
    }

    // ==================== Duration Tests ====================

    #[test]
    fn durations_saturate() {
        assert_eq!(duration_from_secs(-1.0), Duration::ZERO);
        assert_eq!(duration_from_secs(f32::NAN), Duration::ZERO);
        assert_eq!(duration_from_secs(f32::INFINITY), MAX_DURATION);
        assert_eq!(duration_from_secs(0.5), Duration::from_millis(500));
    }

    #[test]
    fn infinite_times_do_not_panic() {
        let config = LocomotionConfig::default().with_coyote_time(f32::INFINITY);
        let mut locomotion = Locomotion::new();

        locomotion.step(&config, &grounded(), Vec2::ZERO, DT);
        assert!(locomotion.coyote_active());

        locomotion.step(&config, &CollisionReport::default(), Vec2::ZERO, f32::INFINITY);
        assert!(!locomotion.coyote_active());
    }
}
