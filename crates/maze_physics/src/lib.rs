//! Rapier adapter for the maze walker.
//!
//! [`PhysicsState`] owns the rapier world. [`PhysicsPlugin`] runs it inside
//! bevy's `Update` schedule in a fixed order per frame:
//!
//! 1. [`FrameStage::Input`]: the game samples input and sets move intent
//! 2. [`FrameStage::Step`]: one rapier step, then contacts go to each actor's
//!    [`MovementController`]
//! 3. [`FrameStage::Movement`]: `physics_update` on every controller
//! 4. [`FrameStage::GridCorrection`]: line-trace probes for [`GridProbe`] actors
//!    that are not [`Noclip`]
//! 5. [`FrameStage::Sync`]: body poses copied into `Transform`

use bevy::prelude::*;
use maze_core::{Level, MovementController, PhysicsBody};
use rapier3d::prelude as rapier;

mod body;
mod state;

pub use body::RapierBody;
pub use state::{body_id, PhysicsState};

pub struct PhysicsPlugin {
    pub gravity: Vec3,
}

impl Default for PhysicsPlugin {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
        }
    }
}

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PhysicsState::new(self.gravity))
            .configure_sets(
                Update,
                (
                    FrameStage::Input,
                    FrameStage::Step,
                    FrameStage::Movement,
                    FrameStage::GridCorrection,
                    FrameStage::Sync,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    step_physics.in_set(FrameStage::Step),
                    apply_movement.in_set(FrameStage::Movement),
                    grid_correction.in_set(FrameStage::GridCorrection),
                    sync_transforms.in_set(FrameStage::Sync),
                ),
            );
    }
}

/// Per-frame ordering of the maze walker systems.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameStage {
    Input,
    Step,
    Movement,
    GridCorrection,
    Sync,
}

/// Links a Bevy entity to a Rapier rigid body
#[derive(Component)]
pub struct RigidBodyLink(pub rapier::RigidBodyHandle);

/// Opts an actor into grid line-trace correction after each step.
#[derive(Component, Debug, Default)]
pub struct GridProbe {
    /// Body position before the last physics step.
    pub last_position: Vec3,
}

/// Skips grid correction. Pair with [`PhysicsState::set_noclip`] so rapier
/// ignores the body too.
#[derive(Component, Debug, Default)]
pub struct Noclip;

fn step_physics(
    mut physics: ResMut<PhysicsState>,
    mut probes: Query<(&RigidBodyLink, &mut GridProbe)>,
    mut actors: Query<(&RigidBodyLink, &mut MovementController)>,
) {
    for (link, mut probe) in probes.iter_mut() {
        if let Some(position) = physics.translation(link.0) {
            probe.last_position = position;
        }
    }

    physics.step();

    for (link, mut controller) in actors.iter_mut() {
        for event in physics.contact_events(link.0) {
            controller.on_contact(&event);
        }
    }
}

fn apply_movement(
    mut physics: ResMut<PhysicsState>,
    actors: Query<(&RigidBodyLink, &MovementController)>,
) {
    for (link, controller) in actors.iter() {
        let mut body = physics.body_mut(link.0);
        controller.physics_update(body.as_mut().map(|b| b as &mut dyn PhysicsBody));
    }
}

fn grid_correction(
    level: Option<Res<Level>>,
    mut physics: ResMut<PhysicsState>,
    probes: Query<(&RigidBodyLink, &GridProbe), Without<Noclip>>,
) {
    let Some(level) = level else {
        return;
    };
    for (link, probe) in probes.iter() {
        let Some(mut body) = physics.body_mut(link.0) else {
            continue;
        };
        let to = body.position();
        let result = level.line_trace(probe.last_position, to);
        if !result.collided {
            continue;
        }

        // Cancel motion on every axis the trace pinned.
        let mut velocity = body.velocity();
        for axis in 0..3 {
            if result.intersection[axis] != to[axis] {
                velocity[axis] = 0.0;
            }
        }
        debug!(
            "Grid correction {:?} -> {:?}",
            to, result.intersection
        );
        body.set_translation(result.intersection);
        body.set_velocity(velocity);
    }
}

fn sync_transforms(physics: Res<PhysicsState>, mut query: Query<(&RigidBodyLink, &mut Transform)>) {
    for (link, mut transform) in query.iter_mut() {
        if let Some(body) = physics.rigid_body_set.get(link.0) {
            let pos = body.translation();
            transform.translation = Vec3::new(pos.x, pos.y, pos.z);
            // Locked actors keep the rotation their controller gives them.
            if !body.locked_axes().contains(rapier::LockedAxes::ROTATION_LOCKED) {
                let rot = body.rotation();
                transform.rotation = Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w);
            }
        }
    }
}
