//! Window-side glue shared by the desktop binary and the browser entry.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use glam::Vec2;
use log::{info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{
    ElementState, Event, KeyEvent as WinitKeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::EventLoopWindowTarget;
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::camera::{OrbitCamera, OrbitControls};
use crate::data_model::DataModel;
use crate::demo::Demo;
use crate::input::{KeyCode, KeyEvent, NamedKey};
use crate::input_script::InputScript;
use crate::render::{LightParams, Renderer};
use crate::scene::Scene;
use crate::viewport::{ViewportProvider, WindowViewport};

/// Pixels treated as one wheel notch for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 40.0;

/// Everything a window needs to run a demo: renderer, simulation and camera.
pub struct AppState {
    renderer: Renderer,
    demo: Demo,
    script: InputScript,
    controls: OrbitControls,
    viewport: Arc<WindowViewport>,
    light: LightParams,
}

impl AppState {
    pub fn new(renderer: Renderer, demo: Demo) -> Self {
        let objects = demo.model().all_objects();
        let size = renderer.size();
        Self {
            controls: OrbitControls::new(OrbitCamera::from_objects(&objects)),
            light: LightParams::from_objects(&objects),
            viewport: Arc::new(WindowViewport::new(size.width, size.height)),
            script: InputScript::new(),
            renderer,
            demo,
        }
    }

    /// Keys from `script` are delivered on top of the live keyboard.
    pub fn with_script(mut self, script: InputScript) -> Self {
        self.script = script;
        self
    }

    pub fn demo(&self) -> &Demo {
        &self.demo
    }

    pub fn process_event(
        &mut self,
        event: &Event<()>,
        elwt: &EventLoopWindowTarget<()>,
    ) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => self.resize(*size),
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = self.renderer.window().inner_size();
                        self.resize(size);
                    }
                    WindowEvent::KeyboardInput { event, .. } => self.handle_keyboard(event),
                    WindowEvent::MouseInput { state, button, .. } => {
                        self.handle_mouse_button(*state, *button)
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let (_, height) = self.viewport.viewport_size();
                        let pos = Vec2::new(position.x as f32, position.y as f32);
                        self.controls.pointer_moved(pos, height as f32);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        self.controls.wheel(wheel_lines(*delta));
                    }
                    WindowEvent::RedrawRequested => self.redraw()?,
                    _ => {}
                }
            }
            Event::AboutToWait => {
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.renderer.resize(size);
        self.viewport.update(size.width, size.height);
    }

    fn handle_keyboard(&mut self, event: &WinitKeyEvent) {
        let Some(code) = map_keycode(event.physical_key) else {
            return;
        };
        match event.state {
            ElementState::Pressed => {
                let key = if event.repeat {
                    KeyEvent::repeat(code)
                } else {
                    KeyEvent::press(code)
                };
                self.demo.key_down(key);
            }
            ElementState::Released => {
                self.demo.key_up(code);
            }
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => self.controls.pointer_down(),
            ElementState::Released => self.controls.pointer_up(),
        }
    }

    fn redraw(&mut self) -> Result<()> {
        self.demo.run(1, &self.script);

        let objects = self.demo.model().all_objects();
        let camera = self
            .controls
            .camera()
            .params(self.viewport.aspect_ratio());
        self.renderer.update_globals(&camera, &self.light);
        match self.renderer.render(&objects) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.renderer.window().inner_size();
                self.resize(size);
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU is out of memory")),
            Err(other) => {
                warn!("surface error {other:?}; retrying next frame");
                Ok(())
            }
        }
    }
}

/// Converts a wheel event to notches; positive means zoom in.
pub fn wheel_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
    }
}

/// Lines describing the loaded scene.
pub fn scene_listing(scene: &Scene) -> Vec<String> {
    let mut lines = vec![format!(
        "Loaded scene with {} objects ({} lights)",
        scene.objects.len(),
        scene.lights.len()
    )];
    lines.extend(
        scene
            .objects
            .iter()
            .map(|object| format!(" - {} ({})", object.name, object.object_type)),
    );
    lines
}

/// Lines describing how far a demo got, followed by every object's state.
pub fn run_summary(demo: &Demo) -> Vec<String> {
    let mut lines = vec![format!(
        "Simulated {} frame(s) of the {} demo",
        demo.frames(),
        demo.kind()
    )];
    if let Some((min, max)) = demo.bounds() {
        lines.push(format!("Arena bounds: [{min:.2}, {max:.2}] on x and z"));
    }
    lines.extend(final_state(demo.model()));
    lines
}

pub fn final_state(model: &DataModel) -> Vec<String> {
    let mut lines = vec!["Final object states:".to_string()];
    lines.extend(model.all_objects().into_iter().map(|object| {
        format!(
            " - {} pos=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2})",
            object.name,
            object.position.x,
            object.position.y,
            object.position.z,
            object.color.x,
            object.color.y,
            object.color.z
        )
    }));
    lines
}

/// Runs `frames` frames without a window and logs the outcome.
pub fn run_headless(scene: &Scene, frames: u64, script: &InputScript) -> Result<Demo> {
    let mut demo = Demo::from_scene(scene)?;
    info!("running {frames} headless frame(s)");
    demo.run(frames, script);
    Ok(demo)
}

pub fn map_keycode(key: PhysicalKey) -> Option<KeyCode> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    use WinitKeyCode as Key;
    Some(match code {
        Key::Space => KeyCode::Named(NamedKey::Space),
        Key::Enter | Key::NumpadEnter => KeyCode::Named(NamedKey::Enter),
        Key::Tab => KeyCode::Named(NamedKey::Tab),
        Key::ArrowLeft => KeyCode::Named(NamedKey::Left),
        Key::ArrowRight => KeyCode::Named(NamedKey::Right),
        Key::ArrowUp => KeyCode::Named(NamedKey::Up),
        Key::ArrowDown => KeyCode::Named(NamedKey::Down),
        Key::Escape => KeyCode::Named(NamedKey::Escape),
        Key::Backspace => KeyCode::Named(NamedKey::Backspace),
        Key::ShiftLeft => KeyCode::Named(NamedKey::LeftShift),
        Key::ShiftRight => KeyCode::Named(NamedKey::RightShift),
        Key::ControlLeft => KeyCode::Named(NamedKey::LeftCtrl),
        Key::ControlRight => KeyCode::Named(NamedKey::RightCtrl),
        Key::AltLeft => KeyCode::Named(NamedKey::LeftAlt),
        Key::AltRight => KeyCode::Named(NamedKey::RightAlt),
        Key::Digit0 => KeyCode::Digit(0),
        Key::Digit1 => KeyCode::Digit(1),
        Key::Digit2 => KeyCode::Digit(2),
        Key::Digit3 => KeyCode::Digit(3),
        Key::Digit4 => KeyCode::Digit(4),
        Key::Digit5 => KeyCode::Digit(5),
        Key::Digit6 => KeyCode::Digit(6),
        Key::Digit7 => KeyCode::Digit(7),
        Key::Digit8 => KeyCode::Digit(8),
        Key::Digit9 => KeyCode::Digit(9),
        Key::KeyA => KeyCode::Character('A'),
        Key::KeyB => KeyCode::Character('B'),
        Key::KeyC => KeyCode::Character('C'),
        Key::KeyD => KeyCode::Character('D'),
        Key::KeyE => KeyCode::Character('E'),
        Key::KeyF => KeyCode::Character('F'),
        Key::KeyG => KeyCode::Character('G'),
        Key::KeyH => KeyCode::Character('H'),
        Key::KeyI => KeyCode::Character('I'),
        Key::KeyJ => KeyCode::Character('J'),
        Key::KeyK => KeyCode::Character('K'),
        Key::KeyL => KeyCode::Character('L'),
        Key::KeyM => KeyCode::Character('M'),
        Key::KeyN => KeyCode::Character('N'),
        Key::KeyO => KeyCode::Character('O'),
        Key::KeyP => KeyCode::Character('P'),
        Key::KeyQ => KeyCode::Character('Q'),
        Key::KeyR => KeyCode::Character('R'),
        Key::KeyS => KeyCode::Character('S'),
        Key::KeyT => KeyCode::Character('T'),
        Key::KeyU => KeyCode::Character('U'),
        Key::KeyV => KeyCode::Character('V'),
        Key::KeyW => KeyCode::Character('W'),
        Key::KeyX => KeyCode::Character('X'),
        Key::KeyY => KeyCode::Character('Y'),
        Key::KeyZ => KeyCode::Character('Z'),
        Key::F1 => KeyCode::Function(1),
        Key::F2 => KeyCode::Function(2),
        Key::F3 => KeyCode::Function(3),
        Key::F4 => KeyCode::Function(4),
        Key::F5 => KeyCode::Function(5),
        Key::F6 => KeyCode::Function(6),
        Key::F7 => KeyCode::Function(7),
        Key::F8 => KeyCode::Function(8),
        Key::F9 => KeyCode::Function(9),
        Key::F10 => KeyCode::Function(10),
        Key::F11 => KeyCode::Function(11),
        Key::F12 => KeyCode::Function(12),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoKind;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn winit_codes_match_dom_codes() {
        let pairs = [
            (WinitKeyCode::KeyW, "KeyW"),
            (WinitKeyCode::Space, "Space"),
            (WinitKeyCode::ArrowLeft, "ArrowLeft"),
            (WinitKeyCode::Digit7, "Digit7"),
            (WinitKeyCode::F5, "F5"),
        ];
        for (winit_code, dom) in pairs {
            assert_eq!(
                map_keycode(PhysicalKey::Code(winit_code)),
                KeyCode::from_code(dom),
                "{dom}"
            );
        }
        assert_eq!(map_keycode(PhysicalKey::Code(WinitKeyCode::NumLock)), None);
    }

    #[test]
    fn pixel_wheel_deltas_are_scaled() {
        assert_eq!(wheel_lines(MouseScrollDelta::LineDelta(0.0, -2.0)), -2.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 80.0));
        assert_eq!(wheel_lines(pixels), 2.0);
    }

    #[test]
    fn summary_lists_bounds_and_objects() {
        let scene = Scene::builtin(DemoKind::Physics).unwrap();
        let demo = run_headless(&scene, 3, &InputScript::new()).unwrap();
        let lines = run_summary(&demo);

        assert_eq!(lines[0], "Simulated 3 frame(s) of the physics demo");
        assert_eq!(lines[1], "Arena bounds: [-18.00, 18.00] on x and z");
        assert_eq!(lines[2], "Final object states:");
        assert!(lines.iter().any(|line| line.starts_with(" - WallNorth pos=")));
    }

    #[test]
    fn listing_counts_lights() {
        let scene = Scene::builtin(DemoKind::Static).unwrap();
        let listing = scene_listing(&scene);
        assert_eq!(listing[0], "Loaded scene with 4 objects (1 lights)");
        assert!(listing.contains(&" - Cube (cube)".to_string()));
    }
}
