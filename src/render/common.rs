use glam::{Mat4, Vec3};

use crate::scene::SceneObject;

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Lighting state consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct LightParams {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl LightParams {
    /// First `light` object of the scene, or a white light above the arena.
    pub fn from_objects(objects: &[SceneObject]) -> Self {
        objects
            .iter()
            .find(|o| o.object_type == "light")
            .map(|light| Self {
                position: light.position,
                color: light.color,
                intensity: light.intensity.max(0.1),
            })
            .unwrap_or(Self {
                position: Vec3::new(3.0, 8.0, 3.0),
                color: Vec3::splat(1.0),
                intensity: 1.0,
            })
    }
}
