//! Physics-backed movement controller for one actor.
//!
//! The controller never owns a body. It talks to whatever physics engine is in
//! use through the [`PhysicsBody`] trait and learns about contacts through
//! [`ContactEvent`]s pushed into [`MovementController::on_contact`].
//!
//! Ground state is a latch: a contact whose normal points down (away from the
//! actor) sets `grounded`, and nothing clears it except a jump. Consumers go
//! through [`MovementController::is_on_ground`], which also requires the
//! vertical velocity to be small, so a body that walked off a ledge stops
//! reading as grounded once it falls fast enough.

use bevy::math::Vec3;
use bevy::prelude::Component;
use serde::{Deserialize, Serialize};

/// Tunables for [`MovementController`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Speed above which no more acceleration is applied (units/sec)
    pub max_speed: f32,
    /// Velocity added per physics step along the move direction
    pub acceleration: f32,
    /// Upward velocity set by a jump
    pub jump_speed: f32,
    /// Minimum dot product between contact normal and world down to count as ground
    pub ground_threshold: f32,
    /// Largest |vertical velocity| still treated as standing
    pub vertical_tolerance: f32,
    /// Max speed multiplier while sprinting
    pub sprint_multiplier: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_speed: 5.0,
            acceleration: 1.0,
            jump_speed: 5.0,
            ground_threshold: 0.5,
            vertical_tolerance: 0.5,
            sprint_multiplier: 2.0,
        }
    }
}

/// Engine-independent identity of a physics body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub u64);

/// One contacting pair reported by the physics step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// World-space contact normal, pointing from `body_a` toward `body_b`.
    pub normal: Vec3,
    pub body_a: BodyId,
    pub body_b: BodyId,
}

impl ContactEvent {
    /// The normal oriented away from `body`, or `None` if `body` is not part
    /// of this contact.
    pub fn normal_away_from(&self, body: BodyId) -> Option<Vec3> {
        if body == self.body_a {
            Some(self.normal)
        } else if body == self.body_b {
            Some(-self.normal)
        } else {
            None
        }
    }
}

/// What the controller needs from a physics body.
pub trait PhysicsBody {
    fn position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
}

/// Per-actor movement state.
#[derive(Component, Debug, Clone)]
pub struct MovementController {
    body: Option<BodyId>,
    direction: Vec3,
    max_speed: f32,
    speed_multiplier: Option<f32>,
    pub acceleration: f32,
    pub jump_speed: f32,
    pub ground_threshold: f32,
    pub vertical_tolerance: f32,
    grounded: bool,
    last_contact_normal: Vec3,
}

impl Default for MovementController {
    fn default() -> Self {
        Self::from_config(&MovementConfig::default())
    }
}

impl MovementController {
    pub fn from_config(config: &MovementConfig) -> Self {
        Self {
            body: None,
            direction: Vec3::ZERO,
            max_speed: config.max_speed,
            speed_multiplier: None,
            acceleration: config.acceleration,
            jump_speed: config.jump_speed,
            ground_threshold: config.ground_threshold,
            vertical_tolerance: config.vertical_tolerance,
            grounded: false,
            last_contact_normal: Vec3::ZERO,
        }
    }

    /// Bind to a body. Ground state starts over.
    pub fn attach(&mut self, body: BodyId) {
        self.body = Some(body);
        self.grounded = false;
        self.last_contact_normal = Vec3::ZERO;
    }

    pub fn detach(&mut self) {
        self.body = None;
        self.grounded = false;
    }

    pub fn body(&self) -> Option<BodyId> {
        self.body
    }

    /// Requested move direction. Not normalized; its length scales acceleration.
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction;
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Override the max speed for this frame (e.g. sprint). `None` restores the base.
    pub fn set_speed_multiplier(&mut self, multiplier: Option<f32>) {
        self.speed_multiplier = multiplier;
    }

    /// Effective max speed after any multiplier.
    pub fn max_speed(&self) -> f32 {
        self.max_speed * self.speed_multiplier.unwrap_or(1.0)
    }

    pub fn base_max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Raw ground latch, see [`Self::is_on_ground`].
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn last_contact_normal(&self) -> Vec3 {
        self.last_contact_normal
    }

    /// Feed one contact from the physics step. Contacts that do not involve the
    /// attached body are ignored.
    pub fn on_contact(&mut self, event: &ContactEvent) {
        let Some(body) = self.body else {
            return;
        };
        let Some(normal) = event.normal_away_from(body) else {
            return;
        };
        let normal = normal.normalize_or_zero();
        self.last_contact_normal = normal;
        if normal.dot(Vec3::NEG_Y) > self.ground_threshold {
            self.grounded = true;
        }
    }

    /// Grounded latch set and vertical speed within tolerance.
    pub fn is_on_ground(&self, body: &dyn PhysicsBody) -> bool {
        self.grounded && body.velocity().y.abs() <= self.vertical_tolerance
    }

    /// Jump if standing. Returns whether the jump was applied.
    pub fn jump(&mut self, body: &mut dyn PhysicsBody) -> bool {
        if !self.is_on_ground(body) {
            return false;
        }
        let mut velocity = body.velocity();
        velocity.y = self.jump_speed;
        body.set_velocity(velocity);
        self.grounded = false;
        true
    }

    /// Apply one step of acceleration along the requested direction.
    ///
    /// Velocity is only added while the body is slower than
    /// [`Self::max_speed`], so the speed approaches the limit rather than being
    /// clamped to it.
    pub fn physics_update(&self, body: Option<&mut dyn PhysicsBody>) {
        let Some(body) = body else {
            return;
        };
        if self.direction.length_squared() == 0.0 {
            return;
        }
        let velocity = body.velocity();
        if velocity.length() < self.max_speed() {
            body.set_velocity(velocity + self.direction * self.acceleration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TestBody {
        position: Vec3,
        velocity: Vec3,
    }

    impl PhysicsBody for TestBody {
        fn position(&self) -> Vec3 {
            self.position
        }

        fn velocity(&self) -> Vec3 {
            self.velocity
        }

        fn set_velocity(&mut self, velocity: Vec3) {
            self.velocity = velocity;
        }
    }

    const ME: BodyId = BodyId(1);
    const FLOOR: BodyId = BodyId(2);

    fn attached() -> MovementController {
        let mut controller = MovementController::default();
        controller.attach(ME);
        controller
    }

    fn floor_contact() -> ContactEvent {
        ContactEvent {
            normal: Vec3::NEG_Y,
            body_a: ME,
            body_b: FLOOR,
        }
    }

    #[test]
    fn test_ground_contact_then_falling() {
        let mut controller = attached();
        let mut body = TestBody::default();

        controller.on_contact(&floor_contact());
        assert!(controller.is_grounded());
        assert!(controller.is_on_ground(&body));

        body.velocity.y = -2.0;
        assert!(controller.is_grounded());
        assert!(!controller.is_on_ground(&body));
    }

    #[test]
    fn test_contact_as_second_body_is_flipped() {
        let mut controller = attached();
        // Floor is body_a, normal points from floor up into the actor.
        controller.on_contact(&ContactEvent {
            normal: Vec3::Y,
            body_a: FLOOR,
            body_b: ME,
        });
        assert!(controller.is_grounded());
        assert_eq!(controller.last_contact_normal(), Vec3::NEG_Y);
    }

    #[test]
    fn test_wall_and_ceiling_contacts_do_not_ground() {
        let mut controller = attached();
        controller.on_contact(&ContactEvent {
            normal: Vec3::X,
            body_a: ME,
            body_b: FLOOR,
        });
        controller.on_contact(&ContactEvent {
            normal: Vec3::Y,
            body_a: ME,
            body_b: FLOOR,
        });
        // Steep slope, about 0.45 against down once normalized.
        controller.on_contact(&ContactEvent {
            normal: Vec3::new(2.0, -1.0, 0.0),
            body_a: ME,
            body_b: FLOOR,
        });
        assert!(!controller.is_grounded());
    }

    #[test]
    fn test_short_floor_normal_still_grounds() {
        let mut controller = attached();
        controller.on_contact(&ContactEvent {
            normal: Vec3::new(0.0, -0.3, 0.0),
            body_a: ME,
            body_b: FLOOR,
        });
        assert!(controller.is_grounded());
        assert!((controller.last_contact_normal() - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_unrelated_or_detached_contacts_ignored() {
        let mut controller = attached();
        controller.on_contact(&ContactEvent {
            normal: Vec3::NEG_Y,
            body_a: BodyId(7),
            body_b: FLOOR,
        });
        assert!(!controller.is_grounded());

        let mut detached = MovementController::default();
        detached.on_contact(&floor_contact());
        assert!(!detached.is_grounded());
    }

    #[test]
    fn test_vertical_tolerance_is_inclusive() {
        let mut controller = attached();
        controller.on_contact(&floor_contact());
        let body = TestBody {
            velocity: Vec3::new(3.0, 0.5, 0.0),
            ..Default::default()
        };
        assert!(controller.is_on_ground(&body));
        let body = TestBody {
            velocity: Vec3::new(0.0, -0.51, 0.0),
            ..Default::default()
        };
        assert!(!controller.is_on_ground(&body));
    }

    #[test]
    fn test_jump_requires_ground() {
        let mut controller = attached();
        let mut body = TestBody {
            velocity: Vec3::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        assert!(!controller.jump(&mut body));
        assert_eq!(body.velocity, Vec3::new(1.0, 0.0, 0.0));

        controller.on_contact(&floor_contact());
        assert!(controller.jump(&mut body));
        assert_eq!(body.velocity, Vec3::new(1.0, 5.0, 0.0));
        assert!(!controller.is_grounded());

        // Same frame, second press.
        assert!(!controller.jump(&mut body));
        assert_eq!(body.velocity.y, 5.0);
    }

    #[test]
    fn test_jump_blocked_while_falling() {
        let mut controller = attached();
        controller.on_contact(&floor_contact());
        let mut body = TestBody {
            velocity: Vec3::new(0.0, -3.0, 0.0),
            ..Default::default()
        };
        assert!(!controller.jump(&mut body));
        assert_eq!(body.velocity.y, -3.0);
        assert!(controller.is_grounded());
    }

    #[test]
    fn test_zero_direction_is_idempotent() {
        let controller = attached();
        let mut body = TestBody {
            velocity: Vec3::new(0.3, -1.0, 2.0),
            ..Default::default()
        };
        for _ in 0..10 {
            controller.physics_update(Some(&mut body));
        }
        assert_eq!(body.velocity, Vec3::new(0.3, -1.0, 2.0));
    }

    #[test]
    fn test_no_body_is_noop() {
        let mut controller = attached();
        controller.set_direction(Vec3::X);
        controller.physics_update(None);
    }

    #[test]
    fn test_acceleration_stops_at_max_speed() {
        let mut controller = attached();
        controller.set_direction(Vec3::X);
        let mut body = TestBody::default();

        for _ in 0..4 {
            controller.physics_update(Some(&mut body));
        }
        assert_eq!(body.velocity, Vec3::new(4.0, 0.0, 0.0));

        // 4 < 5, one more step overshoots to 5, then nothing.
        controller.physics_update(Some(&mut body));
        assert_eq!(body.velocity.x, 5.0);
        controller.physics_update(Some(&mut body));
        assert_eq!(body.velocity.x, 5.0);
    }

    #[test]
    fn test_direction_change_near_max_speed_is_not_snapped() {
        let mut controller = attached();
        let mut body = TestBody {
            velocity: Vec3::new(4.9, 0.0, 0.0),
            ..Default::default()
        };
        controller.set_direction(Vec3::Z);
        controller.physics_update(Some(&mut body));
        assert_eq!(body.velocity, Vec3::new(4.9, 0.0, 1.0));
        // Now above 5: direction has no further effect.
        controller.physics_update(Some(&mut body));
        assert_eq!(body.velocity, Vec3::new(4.9, 0.0, 1.0));
    }

    #[test]
    fn test_sprint_multiplier_raises_limit() {
        let mut controller = attached();
        controller.set_direction(Vec3::X);
        let mut body = TestBody {
            velocity: Vec3::new(6.0, 0.0, 0.0),
            ..Default::default()
        };
        controller.physics_update(Some(&mut body));
        assert_eq!(body.velocity.x, 6.0);

        controller.set_speed_multiplier(Some(2.0));
        assert_eq!(controller.max_speed(), 10.0);
        controller.physics_update(Some(&mut body));
        assert_eq!(body.velocity.x, 7.0);

        controller.set_speed_multiplier(None);
        assert_eq!(controller.max_speed(), controller.base_max_speed());
    }

    #[test]
    fn test_attach_resets_ground_latch() {
        let mut controller = attached();
        controller.on_contact(&floor_contact());
        controller.attach(BodyId(9));
        assert!(!controller.is_grounded());
        assert_eq!(controller.body(), Some(BodyId(9)));
        controller.detach();
        assert_eq!(controller.body(), None);
    }
}
