//! Rigid-body world backed by Rapier.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use log::{debug, info};
use nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::dynamics::{
    CCDSolver, ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet,
    RigidBody, RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};
use rapier3d::geometry::{BroadPhaseMultiSap, Collider, ColliderBuilder, ColliderSet, NarrowPhase};
use rapier3d::pipeline::{PhysicsPipeline, QueryPipeline};

use crate::controller::PlayerBody;

/// Contact friction shared by every collider.
pub const FRICTION: f32 = 0.3;
/// Contacts are perfectly inelastic.
pub const RESTITUTION: f32 = 0.0;

/// Physics simulation world.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector3<f32>,
    integration_params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    names: HashMap<String, RigidBodyHandle>,
}

impl PhysicsWorld {
    /// Creates an empty world with the given gravity.
    pub fn new(gravity: Vec3) -> Self {
        info!("creating physics world with gravity {gravity}");
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: to_vector(gravity),
            integration_params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            names: HashMap::new(),
        }
    }

    /// Adds an immovable box (floor, obstacle, wall).
    pub fn add_fixed_box(
        &mut self,
        name: &str,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .position(to_isometry(center, rotation))
            .build();
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(FRICTION)
            .restitution(RESTITUTION)
            .build();
        self.insert(name, body, collider)
    }

    /// Adds a box that falls, collides and can be pushed.
    pub fn add_dynamic_box(
        &mut self,
        name: &str,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        mass: f32,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .position(to_isometry(center, rotation))
            .can_sleep(false)
            .build();
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(FRICTION)
            .restitution(RESTITUTION)
            .mass(mass)
            .build();
        self.insert(name, body, collider)
    }

    fn insert(&mut self, name: &str, body: RigidBody, collider: Collider) -> RigidBodyHandle {
        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        if self.names.insert(name.to_string(), handle).is_some() {
            debug!("body name `{name}` reused; the newest body wins lookups");
        }
        handle
    }

    /// Step the physics simulation by dt seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_params.dt = dt;

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    pub fn handle(&self, name: &str) -> Option<RigidBodyHandle> {
        self.names.get(name).copied()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Mutable view of a body for the controller.
    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<RapierBody<'_>> {
        self.bodies.get_mut(handle).map(|body| RapierBody { body })
    }

    /// World-space position and orientation of a body.
    pub fn pose(&self, handle: RigidBodyHandle) -> Option<(Vec3, Quat)> {
        let body = self.bodies.get(handle)?;
        Some((from_vector(body.translation()), from_rotation(body.rotation())))
    }

    pub fn velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|body| from_vector(body.linvel()))
    }
}

/// A Rapier rigid body seen through the [`PlayerBody`] interface.
pub struct RapierBody<'a> {
    body: &'a mut RigidBody,
}

impl PlayerBody for RapierBody<'_> {
    fn position(&self) -> Vec3 {
        from_vector(self.body.translation())
    }

    fn set_position(&mut self, position: Vec3) {
        self.body.set_translation(to_vector(position), true);
    }

    fn velocity(&self) -> Vec3 {
        from_vector(self.body.linvel())
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.body.set_linvel(to_vector(velocity), true);
    }

    fn rotation(&self) -> Quat {
        from_rotation(self.body.rotation())
    }

    fn apply_impulse(&mut self, impulse: Vec3, point: Vec3) {
        self.body
            .apply_impulse_at_point(to_vector(impulse), Point3::new(point.x, point.y, point.z), true);
    }
}

fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_isometry(translation: Vec3, rotation: Quat) -> Isometry3<f32> {
    let rotation = UnitQuaternion::new_normalize(Quaternion::new(
        rotation.w, rotation.x, rotation.y, rotation.z,
    ));
    Isometry3::from_parts(
        Translation3::new(translation.x, translation.y, translation.z),
        rotation,
    )
}

fn from_rotation(rotation: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(rotation.i, rotation.j, rotation.k, rotation.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn world_with_floor() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.82, 0.0));
        world.add_fixed_box(
            "Floor",
            Vec3::new(0.0, -1.5, 0.0),
            Vec3::new(20.0, 0.5, 20.0),
            Quat::IDENTITY,
        );
        world
    }

    fn settle(world: &mut PhysicsWorld, steps: usize) {
        for _ in 0..steps {
            world.step(DT);
        }
    }

    #[test]
    fn box_lands_on_the_floor() {
        let mut world = world_with_floor();
        let player = world.add_dynamic_box(
            "Player",
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::ONE,
            Quat::IDENTITY,
            1.0,
        );

        settle(&mut world, 240);

        let (position, _) = world.pose(player).unwrap();
        assert!(position.y.abs() < 0.05, "resting height {}", position.y);
        assert!(world.velocity(player).unwrap().length() < 0.05);
    }

    #[test]
    fn upward_impulse_lifts_the_body() {
        let mut world = world_with_floor();
        let player = world.add_dynamic_box("Player", Vec3::ZERO, Vec3::ONE, Quat::IDENTITY, 1.0);
        settle(&mut world, 30);

        {
            let mut body = world.body_mut(player).unwrap();
            let at = body.position();
            body.apply_impulse(Vec3::new(0.0, 5.0, 0.0), at);
            assert!((body.velocity().y - 5.0).abs() < 0.1);
        }
        settle(&mut world, 10);

        let (position, _) = world.pose(player).unwrap();
        assert!(position.y > 0.3, "height after jump {}", position.y);
    }

    #[test]
    fn walls_stop_a_pushed_box() {
        let mut world = world_with_floor();
        world.add_fixed_box(
            "WallEast",
            Vec3::new(19.5, 0.0, 0.0),
            Vec3::new(0.5, 1.0, 20.0),
            Quat::IDENTITY,
        );
        let player = world.add_dynamic_box(
            "Player",
            Vec3::new(15.0, 0.0, 0.0),
            Vec3::ONE,
            Quat::IDENTITY,
            1.0,
        );

        for _ in 0..300 {
            world
                .body_mut(player)
                .unwrap()
                .set_velocity(Vec3::new(10.0, 0.0, 0.0));
            world.step(DT);
        }

        let (position, _) = world.pose(player).unwrap();
        assert!(position.x < 18.2, "pushed through the wall to {}", position.x);
    }

    #[test]
    fn handles_are_looked_up_by_name() {
        let mut world = world_with_floor();
        let crate_box = world.add_fixed_box("Crate", Vec3::X, Vec3::ONE, Quat::IDENTITY);
        assert_eq!(world.handle("Crate"), Some(crate_box));
        assert!(world.handle("Missing").is_none());
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn rotations_round_trip_through_rapier() {
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let rotation = Quat::from_rotation_y(0.5);
        let handle = world.add_fixed_box("Turned", Vec3::ZERO, Vec3::ONE, rotation);
        let (_, stored) = world.pose(handle).unwrap();
        assert!(stored.angle_between(rotation) < 1e-5);
    }
}
