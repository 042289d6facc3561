use bevy::math::Vec3;
use maze_core::PhysicsBody;
use rapier3d::prelude as rapier;

use crate::state::{to_vec3, to_vector};

/// Borrowed rapier body seen through the movement controller's interface.
pub struct RapierBody<'a> {
    body: &'a mut rapier::RigidBody,
}

impl<'a> RapierBody<'a> {
    pub fn new(body: &'a mut rapier::RigidBody) -> Self {
        Self { body }
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.body.set_translation(to_vector(translation), true);
    }
}

impl PhysicsBody for RapierBody<'_> {
    fn position(&self) -> Vec3 {
        to_vec3(self.body.translation())
    }

    fn velocity(&self) -> Vec3 {
        to_vec3(self.body.linvel())
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.body.set_linvel(to_vector(velocity), true);
    }
}
