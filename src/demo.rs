//! Frame loop for the two demos.
//!
//! The static demo only keeps the floor under the cube. The physics demo
//! owns a Rapier world and a [`PlayerArenaController`]; every frame it
//! steps the world once and lets the controller correct the player and
//! mirror it into the [`DataModel`].

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use log::{debug, info, warn};
use rapier3d::dynamics::RigidBodyHandle;

use crate::config::DemoKind;
use crate::controller::{ControllerConfig, PlayerArenaController};
use crate::data_model::DataModel;
use crate::error::DemoError;
use crate::input::{InputState, KeyCode, KeyEvent};
use crate::input_script::{InputScript, KeyTransition};
use crate::physics::PhysicsWorld;
use crate::scene::{Scene, SceneObject};

const WALL_COLOR: Vec3 = Vec3::new(0.55, 0.55, 0.6);

/// A running demo: shared data model plus whatever drives it.
pub struct Demo {
    kind: DemoKind,
    model: DataModel,
    input: InputState,
    background: Vec3,
    timestep: f32,
    frames: u64,
    driver: Driver,
}

enum Driver {
    FollowFloor { cube: Option<String>, floor: Option<String> },
    Arena(Box<ArenaWorld>),
}

struct ArenaWorld {
    physics: PhysicsWorld,
    controller: PlayerArenaController,
    player: RigidBodyHandle,
    player_name: String,
}

impl Demo {
    /// Builds the demo selected by the scene's settings.
    pub fn from_scene(scene: &Scene) -> Result<Self> {
        let settings = &scene.settings;
        let model = DataModel::from_objects(scene.objects.clone());

        let driver = match settings.demo {
            DemoKind::Static => Driver::FollowFloor {
                cube: scene.find_by_type("cube").map(|obj| obj.name.clone()),
                floor: scene.find_by_type("floor").map(|obj| obj.name.clone()),
            },
            DemoKind::Physics => {
                let world = build_arena(scene, &model).context("failed to build the arena")?;
                Driver::Arena(Box::new(world))
            }
        };

        info!("{} demo ready with {} object(s)", settings.demo, model.len());

        Ok(Self {
            kind: settings.demo,
            model,
            input: InputState::new(),
            background: settings.background,
            timestep: settings.physics.timestep,
            frames: 0,
            driver,
        })
    }

    pub fn kind(&self) -> DemoKind {
        self.kind
    }

    /// Shared handle to the render-facing objects.
    pub fn model(&self) -> &DataModel {
        &self.model
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn background(&self) -> Vec3 {
        self.background
    }

    /// Number of frames simulated so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Clamping range of the player's centre, physics demo only.
    pub fn bounds(&self) -> Option<(f32, f32)> {
        match &self.driver {
            Driver::Arena(world) => Some(world.controller.bounds()),
            Driver::FollowFloor { .. } => None,
        }
    }

    /// Current position of the player body, physics demo only.
    pub fn player_position(&self) -> Option<Vec3> {
        match &self.driver {
            Driver::Arena(world) => world.physics.pose(world.player).map(|(pos, _)| pos),
            Driver::FollowFloor { .. } => None,
        }
    }

    pub fn player_velocity(&self) -> Option<Vec3> {
        match &self.driver {
            Driver::Arena(world) => world.physics.velocity(world.player),
            Driver::FollowFloor { .. } => None,
        }
    }

    /// Routes a key press to the controller. Returns `true` when it was used.
    pub fn key_down(&mut self, event: KeyEvent) -> bool {
        let Driver::Arena(world) = &mut self.driver else {
            return false;
        };
        let ArenaWorld {
            physics,
            controller,
            player,
            ..
        } = world.as_mut();
        let Some(mut body) = physics.body_mut(*player) else {
            warn!("player body is missing from the physics world");
            return false;
        };
        let handled = controller.on_key_down(&mut self.input, event, &mut body);
        debug!("key down {:?} handled={handled}", event.code);
        handled
    }

    pub fn key_up(&mut self, code: KeyCode) -> bool {
        let Driver::Arena(world) = &self.driver else {
            return false;
        };
        let handled = world.controller.on_key_up(&mut self.input, code);
        debug!("key up {code:?} handled={handled}");
        handled
    }

    /// Advances the demo by one frame.
    pub fn frame(&mut self) {
        match &mut self.driver {
            Driver::FollowFloor { cube, floor } => {
                if let (Some(cube), Some(floor)) = (cube.as_deref(), floor.as_deref()) {
                    follow_floor(&self.model, cube, floor);
                }
            }
            Driver::Arena(world) => {
                let ArenaWorld {
                    physics,
                    controller,
                    player,
                    player_name,
                } = world.as_mut();
                physics.step(self.timestep);
                match physics.body_mut(*player) {
                    Some(mut body) => {
                        let mut visual = self.model.proxy(player_name);
                        controller.step(&self.input, &mut body, &mut visual);
                    }
                    None => warn!("player body is missing from the physics world"),
                }
            }
        }
        self.frames += 1;
    }

    /// Runs `count` frames, delivering scripted keys before each one.
    pub fn run(&mut self, count: u64, script: &InputScript) {
        for _ in 0..count {
            let frame = self.frames;
            for scripted in script.events_at(frame) {
                match scripted.transition {
                    KeyTransition::Down(event) => {
                        self.key_down(event);
                    }
                    KeyTransition::Up(code) => {
                        self.key_up(code);
                    }
                }
            }
            self.frame();
        }
    }
}

fn follow_floor(model: &DataModel, cube: &str, floor: &str) {
    let Some(cube) = model.get(cube) else {
        return;
    };
    model.update(floor, |floor| {
        floor.position.x = cube.position.x;
        floor.position.z = cube.position.z;
    });
}

fn build_arena(scene: &Scene, model: &DataModel) -> Result<ArenaWorld> {
    let settings = &scene.settings;
    let arena = settings.arena.arena();
    let mut physics = PhysicsWorld::new(settings.physics.gravity);

    let mut player = None;
    for object in &scene.objects {
        match object.object_type.as_str() {
            "floor" | "obstacle" => {
                physics.add_fixed_box(
                    &object.name,
                    object.position,
                    object.half_extents(),
                    object.rotation,
                );
            }
            "player" => {
                if player.is_some() {
                    warn!("ignoring extra player `{}`", object.name);
                    continue;
                }
                let handle = physics.add_dynamic_box(
                    &object.name,
                    object.position,
                    object.half_extents(),
                    object.rotation,
                    settings.player.mass,
                );
                player = Some((handle, object));
            }
            _ => {}
        }
    }
    let (handle, player) = player.ok_or(DemoError::MissingPlayer)?;

    let floor_top = scene.floor_top().unwrap_or(0.0);
    for (name, center, half_extents) in arena.walls(floor_top, settings.arena.wall_height) {
        physics.add_fixed_box(name, center, half_extents, Quat::IDENTITY);
        model.push(SceneObject::cuboid(name, "wall", center, half_extents * 2.0, WALL_COLOR));
    }

    let config = ControllerConfig {
        move_speed: settings.player.speed,
        jump_impulse: settings.player.jump_impulse,
        half_width: player.half_extents().x,
    };
    let controller = PlayerArenaController::new(arena, config);
    let (min, max) = controller.bounds();
    info!(
        "arena built: {} bodies, player `{}` confined to [{min:.2}, {max:.2}]",
        physics.body_count(),
        player.name
    );

    Ok(ArenaWorld {
        physics,
        controller,
        player: handle,
        player_name: player.name.clone(),
    })
}
