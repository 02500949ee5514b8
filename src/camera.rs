use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Mat4, Vec2, Vec3};

use crate::render::CameraParams;
use crate::scene::SceneObject;

const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 60.0;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Perspective camera orbiting a target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    target: Vec3,
    distance: f32,
    yaw: f32,
    pitch: f32,
    fov_degrees: f32,
    near: f32,
    far: f32,
}

impl OrbitCamera {
    /// Places the camera at `eye`, looking at `target`.
    pub fn looking_at(eye: Vec3, target: Vec3, fov_degrees: f32) -> Self {
        let offset = eye - target;
        let distance = offset.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        let (yaw, pitch) = if offset.length_squared() > f32::EPSILON {
            let direction = offset.normalize();
            (direction.x.atan2(direction.z), direction.y.asin())
        } else {
            (0.0, 0.0)
        };
        Self {
            target,
            distance,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            fov_degrees,
            near: 0.1,
            far: 100.0,
        }
    }

    /// Camera described by the first `camera` object, or a default view.
    pub fn from_objects(objects: &[SceneObject]) -> Self {
        objects
            .iter()
            .find(|o| o.object_type == "camera")
            .map(|camera| Self::looking_at(camera.position, camera.target, camera.fov))
            .unwrap_or_else(|| {
                Self::looking_at(Vec3::new(0.0, 1.0, 10.0), Vec3::new(0.0, 1.0, 0.0), 45.0)
            })
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + self.distance * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Rotates around the target; pitch stops short of the poles.
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(TAU);
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Scales the distance to the target by `factor`.
    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn params(&self, aspect: f32) -> CameraParams {
        let eye = self.eye();
        let view = Mat4::look_at_rh(eye, self.target, Vec3::Y);
        let projection = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            aspect.max(0.01),
            self.near,
            self.far,
        );
        CameraParams {
            view_proj: projection * view,
            position: eye,
        }
    }
}

/// Mouse-driven orbit: left-drag rotates, the wheel zooms.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    camera: OrbitCamera,
    dragging: bool,
    last_pointer: Option<Vec2>,
}

impl OrbitControls {
    pub fn new(camera: OrbitCamera) -> Self {
        Self {
            camera,
            dragging: false,
            last_pointer: None,
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn pointer_down(&mut self) {
        self.dragging = true;
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// A full viewport-height drag turns the camera by one revolution.
    pub fn pointer_moved(&mut self, position: Vec2, viewport_height: f32) {
        if let Some(last) = self.last_pointer {
            if self.dragging {
                let delta = (position - last) * TAU / viewport_height.max(1.0);
                self.camera.orbit(-delta.x, delta.y);
            }
        }
        self.last_pointer = Some(position);
    }

    /// Positive `lines` zoom in.
    pub fn wheel(&mut self, lines: f32) {
        self.camera.zoom(0.95f32.powf(lines));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_camera() -> OrbitCamera {
        OrbitCamera::looking_at(Vec3::new(0.0, 1.0, 10.0), Vec3::new(0.0, 1.0, 0.0), 45.0)
    }

    #[test]
    fn reconstructs_initial_eye() {
        let camera = default_camera();
        assert!((camera.eye() - Vec3::new(0.0, 1.0, 10.0)).length() < 1e-4);
        assert!((camera.distance() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let params = default_camera().params(16.0 / 9.0);
        let clip = params.view_proj * Vec3::new(0.0, 1.0, 0.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn orbit_keeps_distance_and_clamps_pitch() {
        let mut camera = default_camera();
        camera.orbit(1.0, 10.0);
        assert!(((camera.eye() - camera.target()).length() - 10.0).abs() < 1e-3);
        assert!(camera.eye().y > camera.target().y + 9.9);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = default_camera();
        camera.zoom(0.001);
        assert_eq!(camera.distance(), MIN_DISTANCE);
        camera.zoom(1000.0);
        assert_eq!(camera.distance(), MAX_DISTANCE);
    }

    #[test]
    fn dragging_rotates_only_while_pressed() {
        let mut controls = OrbitControls::new(default_camera());
        let start = controls.camera().eye();

        controls.pointer_moved(Vec2::new(100.0, 100.0), 720.0);
        controls.pointer_moved(Vec2::new(200.0, 100.0), 720.0);
        assert_eq!(controls.camera().eye(), start);

        controls.pointer_down();
        controls.pointer_moved(Vec2::new(300.0, 100.0), 720.0);
        controls.pointer_up();
        assert!((controls.camera().eye() - start).length() > 0.1);
    }

    #[test]
    fn scene_camera_is_used() {
        let objects = vec![SceneObject {
            name: "Camera".into(),
            object_type: "camera".into(),
            position: Vec3::new(0.0, 10.0, 0.5),
            target: Vec3::ZERO,
            ..SceneObject::default()
        }];
        let camera = OrbitCamera::from_objects(&objects);
        assert!(camera.eye().y > 9.0);
    }
}
