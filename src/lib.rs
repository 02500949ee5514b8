//! Cube arena: a keyboard-driven box in a walled arena, simulated with
//! Rapier and drawn with wgpu on the desktop and in the browser.
//!
//! The simulation side ([`controller`], [`physics`], [`demo`]) has no
//! window dependency and runs headless, which is how the CLI's summary
//! mode and the tests drive it. Window and canvas integration live in
//! [`app`] and, for wasm builds, `web`.

pub mod app;
pub mod camera;
pub mod config;
pub mod controller;
pub mod data_model;
pub mod demo;
pub mod error;
pub mod input;
pub mod input_script;
pub mod physics;
pub mod render;
pub mod scene;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use camera::{OrbitCamera, OrbitControls};
pub use config::{DemoKind, DemoSettings};
pub use controller::{
    Arena, ControllerConfig, PlayerArenaController, PlayerBody, VelocityPolicy, VisualProxy,
};
pub use data_model::DataModel;
pub use demo::Demo;
pub use error::{DemoError, ScriptError};
pub use input::{Action, ControlBindings, Direction, InputState, KeyCode, KeyEvent, NamedKey};
pub use input_script::InputScript;
pub use physics::PhysicsWorld;
pub use render::{CameraParams, LightParams, Renderer};
pub use scene::{Light, Scene, SceneObject};
pub use viewport::{ViewportProvider, WindowViewport};
