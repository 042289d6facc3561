use bevy::log::{debug, info};
use bevy::math::{IVec3, Vec3};
use bevy::prelude::Resource;
use maze_core::{BodyId, ContactEvent, Level};
use rapier3d::prelude as rapier;
use rapier::nalgebra::{Point3, Vector3};

use crate::body::RapierBody;

/// Rapier world plus the query pipeline used by the ground probe.
#[derive(Resource)]
pub struct PhysicsState {
    pub gravity: Vector3<f32>,
    pub integration_parameters: rapier::IntegrationParameters,
    pub physics_pipeline: rapier::PhysicsPipeline,
    pub island_manager: rapier::IslandManager,
    pub broad_phase: rapier::DefaultBroadPhase,
    pub narrow_phase: rapier::NarrowPhase,
    pub rigid_body_set: rapier::RigidBodySet,
    pub collider_set: rapier::ColliderSet,
    pub impulse_joint_set: rapier::ImpulseJointSet,
    pub multibody_joint_set: rapier::MultibodyJointSet,
    pub ccd_solver: rapier::CCDSolver,
    pub query_pipeline: rapier::QueryPipeline,
}

impl PhysicsState {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: rapier::IntegrationParameters::default(),
            physics_pipeline: rapier::PhysicsPipeline::new(),
            island_manager: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            rigid_body_set: rapier::RigidBodySet::new(),
            collider_set: rapier::ColliderSet::new(),
            impulse_joint_set: rapier::ImpulseJointSet::new(),
            multibody_joint_set: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            query_pipeline: rapier::QueryPipeline::new(),
        }
    }

    /// Advance the world by one fixed step (`integration_parameters.dt`).
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Add a fixed body holding one cuboid per blocking cell, a ring of
    /// cuboids just outside the raster, and a ground slab under the grid.
    pub fn spawn_level_colliders(&mut self, level: &Level) -> rapier::RigidBodyHandle {
        let grid = level.grid();
        let half = grid.cell_size * 0.5;
        let handle = self.rigid_body_set.insert(rapier::RigidBodyBuilder::fixed());

        let mut blocks = 0usize;
        for cell in level.blocking_cells() {
            self.insert_cuboid(handle, grid.cell_to_world(cell), half);
            blocks += 1;
        }

        let (min, max) = grid.world_bounds();
        let size = max - min;
        let center = (min + max) * 0.5;

        // Raster edges count as bounds.
        let w = grid.width as i32;
        let h = grid.height as i32;
        let top = grid.layer_count as i32 - 1;
        for (from, to) in [
            (IVec3::new(-1, 0, -1), IVec3::new(w, top, -1)),
            (IVec3::new(-1, 0, h), IVec3::new(w, top, h)),
            (IVec3::new(-1, 0, 0), IVec3::new(-1, top, h - 1)),
            (IVec3::new(w, 0, 0), IVec3::new(w, top, h - 1)),
        ] {
            let (lo, _) = grid.cell_bounds(from);
            let (_, hi) = grid.cell_bounds(to);
            self.insert_cuboid(handle, (lo + hi) * 0.5, (hi - lo) * 0.5);
        }

        let slab = Vec3::new(size.x * 0.5 + grid.cell_size.x, 0.5, size.z * 0.5 + grid.cell_size.z);
        self.insert_cuboid(handle, Vec3::new(center.x, min.y - 0.5, center.z), slab);

        info!(
            "Spawned level colliders: {} blocks, ground at y = {}",
            blocks, min.y
        );
        handle
    }

    fn insert_cuboid(&mut self, parent: rapier::RigidBodyHandle, center: Vec3, half: Vec3) {
        let collider = rapier::ColliderBuilder::cuboid(half.x, half.y, half.z)
            .translation(to_vector(center));
        self.collider_set
            .insert_with_parent(collider, parent, &mut self.rigid_body_set);
    }

    /// Add a dynamic capsule actor with rotations locked.
    ///
    /// `height` is the cylinder part; the total height is `height + 2 * radius`.
    pub fn spawn_actor(
        &mut self,
        position: Vec3,
        radius: f32,
        height: f32,
        mass: f32,
    ) -> rapier::RigidBodyHandle {
        let body = rapier::RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .lock_rotations()
            .can_sleep(false);
        let handle = self.rigid_body_set.insert(body);
        let collider = rapier::ColliderBuilder::capsule_y(height * 0.5, radius)
            .mass(mass);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        debug!("Spawned actor {:?} at {:?}", handle, position);
        handle
    }

    /// Let a body fly through everything: no gravity and sensor-only colliders.
    /// Turning it off restores both.
    pub fn set_noclip(&mut self, handle: rapier::RigidBodyHandle, enabled: bool) {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return;
        };
        body.set_gravity_scale(if enabled { 0.0 } else { 1.0 }, true);
        for &collider in body.colliders() {
            if let Some(collider) = self.collider_set.get_mut(collider) {
                collider.set_sensor(enabled);
            }
        }
        debug!("Noclip {} for {:?}", enabled, handle);
    }

    /// Adapter for the movement controller, `None` if the handle is stale.
    pub fn body_mut(&mut self, handle: rapier::RigidBodyHandle) -> Option<RapierBody<'_>> {
        self.rigid_body_set.get_mut(handle).map(RapierBody::new)
    }

    pub fn translation(&self, handle: rapier::RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle)
            .map(|body| to_vec3(body.translation()))
    }

    /// Active contacts touching any collider of `handle`.
    ///
    /// The normal of each event points from `body_a` toward `body_b`; which of
    /// the two is `handle` depends on the pair order inside rapier.
    pub fn contact_events(&self, handle: rapier::RigidBodyHandle) -> Vec<ContactEvent> {
        let mut events = Vec::new();
        let Some(body) = self.rigid_body_set.get(handle) else {
            return events;
        };

        for &collider in body.colliders() {
            for pair in self.narrow_phase.contact_pairs_with(collider) {
                if !pair.has_any_active_contact {
                    continue;
                }
                let (Some(a), Some(b)) = (self.parent_of(pair.collider1), self.parent_of(pair.collider2))
                else {
                    continue;
                };
                for manifold in &pair.manifolds {
                    if manifold.points.is_empty() {
                        continue;
                    }
                    events.push(ContactEvent {
                        normal: to_vec3(&manifold.data.normal),
                        body_a: body_id(a),
                        body_b: body_id(b),
                    });
                }
            }
        }
        events
    }

    fn parent_of(&self, collider: rapier::ColliderHandle) -> Option<rapier::RigidBodyHandle> {
        self.collider_set.get(collider).and_then(|c| c.parent())
    }

    /// Cast a short ray down from the bottom of the body.
    ///
    /// Unreliable on edges and right after spawning (the query pipeline is only
    /// refreshed by [`Self::step`]); contact events stay authoritative.
    pub fn probe_ground(
        &self,
        handle: rapier::RigidBodyHandle,
        half_height: f32,
        distance: f32,
    ) -> bool {
        let Some(body) = self.rigid_body_set.get(handle) else {
            return false;
        };
        let t = body.translation();
        let ray = rapier::Ray::new(
            Point3::new(t.x, t.y - half_height, t.z),
            Vector3::new(0.0, -1.0, 0.0),
        );
        let filter = rapier::QueryFilter::default().exclude_rigid_body(handle);
        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                distance,
                true,
                filter,
            )
            .is_some()
    }
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.82, 0.0))
    }
}

/// Stable id for a rapier body handle.
pub fn body_id(handle: rapier::RigidBodyHandle) -> BodyId {
    let (index, generation) = handle.into_raw_parts();
    BodyId((u64::from(generation) << 32) | u64::from(index))
}

#[inline]
pub(crate) fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

#[inline]
pub(crate) fn to_vec3(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}
