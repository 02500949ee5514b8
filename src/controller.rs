//! Keyboard-driven player control inside a bordered square arena.
//!
//! The controller owns no state of its own besides tuning values: the
//! movement intent lives in [`InputState`], the authoritative pose in a
//! [`PlayerBody`] and the rendered pose in a [`VisualProxy`]. Each frame
//! the host advances physics first and then calls
//! [`PlayerArenaController::step`].

use glam::{Quat, Vec3};
use log::{debug, trace};

use crate::input::{Action, ControlBindings, InputState, KeyCode, KeyEvent};

/// Square play area centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    half_extent: f32,
    border: f32,
}

impl Arena {
    pub fn new(half_extent: f32, border: f32) -> Self {
        Self {
            half_extent: half_extent.max(0.0),
            border: border.max(0.0),
        }
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    pub fn border(&self) -> f32 {
        self.border
    }

    /// Distance from the centre to the inner face of the border wall.
    pub fn inner_half_extent(&self) -> f32 {
        (self.half_extent - self.border).max(0.0)
    }

    /// Inclusive `(min, max)` range for the centre of a body of the given
    /// half width, identical on x and z. Collapses to `(0, 0)` when the
    /// body is wider than the arena.
    pub fn bounds(&self, half_width: f32) -> (f32, f32) {
        let limit = (self.half_extent - self.border - half_width).max(0.0);
        (-limit, limit)
    }

    /// Clamps x and z into [`Arena::bounds`]; y is untouched.
    pub fn clamp(&self, position: Vec3, half_width: f32) -> Vec3 {
        let (min, max) = self.bounds(half_width);
        Vec3::new(
            position.x.clamp(min, max),
            position.y,
            position.z.clamp(min, max),
        )
    }

    pub fn contains(&self, position: Vec3, half_width: f32) -> bool {
        let (min, max) = self.bounds(half_width);
        (min..=max).contains(&position.x) && (min..=max).contains(&position.z)
    }

    /// The four border walls standing on `floor_top`, as `(name, centre, half extents)`.
    pub fn walls(&self, floor_top: f32, height: f32) -> [(&'static str, Vec3, Vec3); 4] {
        let half_thickness = self.border * 0.5;
        let offset = self.half_extent - half_thickness;
        let y = floor_top + height * 0.5;
        let along_x = Vec3::new(self.half_extent, height * 0.5, half_thickness);
        let along_z = Vec3::new(half_thickness, height * 0.5, self.half_extent);
        [
            ("WallNorth", Vec3::new(0.0, y, -offset), along_x),
            ("WallSouth", Vec3::new(0.0, y, offset), along_x),
            ("WallWest", Vec3::new(-offset, y, 0.0), along_z),
            ("WallEast", Vec3::new(offset, y, 0.0), along_z),
        ]
    }
}

/// Read/write access to the rigid body the controller drives.
pub trait PlayerBody {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn rotation(&self) -> Quat;
    /// Applies an instantaneous impulse at a world-space point.
    fn apply_impulse(&mut self, impulse: Vec3, point: Vec3);
}

/// Render-side transform mirrored from the body after every step.
pub trait VisualProxy {
    fn set_transform(&mut self, position: Vec3, rotation: Quat);
}

/// How held movement keys turn into horizontal velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VelocityPolicy {
    /// Horizontal velocity is overwritten with the commanded value every
    /// step. Friction and restitution never alter horizontal speed while
    /// a key is held, and releasing all keys stops the body dead. Vertical
    /// velocity stays under the physics engine's control.
    #[default]
    DirectCommand,
}

impl VelocityPolicy {
    pub fn apply(self, current: Vec3, input: &InputState) -> Vec3 {
        match self {
            Self::DirectCommand => Vec3::new(input.move_x(), current.y, input.move_z()),
        }
    }
}

/// Tuning values for [`PlayerArenaController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub move_speed: f32,
    pub jump_impulse: f32,
    pub half_width: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            jump_impulse: 5.0,
            half_width: 1.0,
        }
    }
}

/// Translates key events into player motion and keeps the player inside the arena.
#[derive(Debug, Clone)]
pub struct PlayerArenaController {
    arena: Arena,
    config: ControllerConfig,
    bindings: ControlBindings,
    policy: VelocityPolicy,
}

impl PlayerArenaController {
    pub fn new(arena: Arena, config: ControllerConfig) -> Self {
        Self {
            arena,
            config,
            bindings: ControlBindings::default(),
            policy: VelocityPolicy::default(),
        }
    }

    pub fn with_bindings(mut self, bindings: ControlBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Clamping range for the player's centre on x and z.
    pub fn bounds(&self) -> (f32, f32) {
        self.arena.bounds(self.config.half_width)
    }

    /// Handles a key press. Returns `true` when the key is bound.
    ///
    /// The last movement key pressed on an axis wins. Jumping is gated on
    /// the `airborne` latch only, not on floor contact.
    pub fn on_key_down<B: PlayerBody + ?Sized>(
        &self,
        input: &mut InputState,
        event: KeyEvent,
        body: &mut B,
    ) -> bool {
        if event.repeat {
            return false;
        }
        let Some(action) = self.bindings.action(event.code) else {
            return false;
        };
        match action {
            Action::MoveX(direction) => input.move_x = direction.sign() * self.config.move_speed,
            Action::MoveZ(direction) => input.move_z = direction.sign() * self.config.move_speed,
            Action::Jump => {
                if !input.airborne {
                    let impulse = Vec3::Y * self.config.jump_impulse;
                    let point = body.position();
                    body.apply_impulse(impulse, point);
                    input.airborne = true;
                    debug!("jump impulse {impulse} applied at {point}");
                }
            }
        }
        true
    }

    /// Handles a key release. Returns `true` when the key is bound.
    ///
    /// Releasing either key of an opposing pair zeroes the whole axis, even
    /// if the other key is still held. Releasing jump clears the airborne
    /// latch whether or not the body has landed.
    pub fn on_key_up(&self, input: &mut InputState, code: KeyCode) -> bool {
        let Some(action) = self.bindings.action(code) else {
            return false;
        };
        match action {
            Action::MoveX(_) => input.move_x = 0.0,
            Action::MoveZ(_) => input.move_z = 0.0,
            Action::Jump => input.airborne = false,
        }
        true
    }

    /// Post-physics correction for one frame: clamp, command velocity, sync visual.
    pub fn step<B, V>(&self, input: &InputState, body: &mut B, visual: &mut V)
    where
        B: PlayerBody + ?Sized,
        V: VisualProxy + ?Sized,
    {
        let position = body.position();
        let clamped = self.arena.clamp(position, self.config.half_width);
        if clamped != position {
            trace!("clamped player from {position} to {clamped}");
            body.set_position(clamped);
        }

        let velocity = self.policy.apply(body.velocity(), input);
        body.set_velocity(velocity);

        visual.set_transform(body.position(), body.rotation());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NamedKey;

    #[derive(Debug, Default)]
    struct PointBody {
        position: Vec3,
        velocity: Vec3,
        rotation: Quat,
        impulses: Vec<(Vec3, Vec3)>,
    }

    impl PointBody {
        fn at(position: Vec3) -> Self {
            Self {
                position,
                ..Self::default()
            }
        }
    }

    impl PlayerBody for PointBody {
        fn position(&self) -> Vec3 {
            self.position
        }

        fn set_position(&mut self, position: Vec3) {
            self.position = position;
        }

        fn velocity(&self) -> Vec3 {
            self.velocity
        }

        fn set_velocity(&mut self, velocity: Vec3) {
            self.velocity = velocity;
        }

        fn rotation(&self) -> Quat {
            self.rotation
        }

        fn apply_impulse(&mut self, impulse: Vec3, point: Vec3) {
            self.velocity += impulse;
            self.impulses.push((impulse, point));
        }
    }

    #[derive(Debug, Default)]
    struct Transform {
        position: Vec3,
        rotation: Quat,
        updates: usize,
    }

    impl VisualProxy for Transform {
        fn set_transform(&mut self, position: Vec3, rotation: Quat) {
            self.position = position;
            self.rotation = rotation;
            self.updates += 1;
        }
    }

    const W: KeyCode = KeyCode::Character('W');
    const A: KeyCode = KeyCode::Character('A');
    const S: KeyCode = KeyCode::Character('S');
    const D: KeyCode = KeyCode::Character('D');
    const SPACE: KeyCode = KeyCode::Named(NamedKey::Space);

    fn controller() -> PlayerArenaController {
        PlayerArenaController::new(Arena::new(20.0, 1.0), ControllerConfig::default())
    }

    #[test]
    fn arena_bounds_account_for_border_and_half_width() {
        let arena = Arena::new(20.0, 1.0);
        assert_eq!(arena.bounds(1.0), (-18.0, 18.0));
        assert_eq!(arena.inner_half_extent(), 19.0);
        assert_eq!(Arena::new(1.0, 1.0).bounds(1.0), (0.0, 0.0));
    }

    #[test]
    fn walls_line_the_inside_of_the_border() {
        let arena = Arena::new(20.0, 1.0);
        let walls = arena.walls(-1.0, 2.0);
        let (_, east, half) = walls[3];
        assert_eq!(east, Vec3::new(19.5, 0.0, 0.0));
        assert_eq!(east.x - half.x, arena.inner_half_extent());
        let (_, north, half) = walls[0];
        assert_eq!(north.z + half.z, -arena.inner_half_extent());
    }

    #[test]
    fn key_d_commands_positive_x_velocity() {
        let controller = controller();
        let mut input = InputState::new();
        let mut body = PointBody::default();
        let mut visual = Transform::default();

        assert!(controller.on_key_down(&mut input, KeyEvent::press(D), &mut body));
        controller.step(&input, &mut body, &mut visual);

        assert_eq!(body.velocity.x, 2.0);
        assert_eq!(body.velocity.z, 0.0);
    }

    #[test]
    fn axes_are_tracked_independently() {
        let controller = controller();
        let mut input = InputState::new();
        let mut body = PointBody::default();
        let mut visual = Transform::default();

        controller.on_key_down(&mut input, KeyEvent::press(W), &mut body);
        controller.on_key_down(&mut input, KeyEvent::press(D), &mut body);
        controller.on_key_up(&mut input, W);
        controller.step(&input, &mut body, &mut visual);

        assert_eq!(body.velocity.x, 2.0);
        assert_eq!(body.velocity.z, 0.0);
    }

    #[test]
    fn last_pressed_key_on_an_axis_wins() {
        let controller = controller();
        let mut input = InputState::new();
        let mut body = PointBody::default();

        controller.on_key_down(&mut input, KeyEvent::press(A), &mut body);
        controller.on_key_down(&mut input, KeyEvent::press(D), &mut body);
        assert_eq!(input.move_x(), 2.0);
        controller.on_key_down(&mut input, KeyEvent::press(A), &mut body);
        assert_eq!(input.move_x(), -2.0);
    }

    #[test]
    fn releasing_either_opposing_key_zeroes_the_axis() {
        let controller = controller();
        let mut input = InputState::new();
        let mut body = PointBody::default();

        controller.on_key_down(&mut input, KeyEvent::press(W), &mut body);
        controller.on_key_down(&mut input, KeyEvent::press(S), &mut body);
        controller.on_key_up(&mut input, W);

        // S is still held, but the axis is cleared.
        assert_eq!(input.move_z(), 0.0);
    }

    #[test]
    fn jump_applies_a_single_impulse_until_released() {
        let controller = controller();
        let mut input = InputState::new();
        let mut body = PointBody::at(Vec3::new(1.0, 0.0, -2.0));

        controller.on_key_down(&mut input, KeyEvent::press(SPACE), &mut body);
        controller.on_key_down(&mut input, KeyEvent::press(SPACE), &mut body);

        assert_eq!(body.impulses.len(), 1);
        let (impulse, point) = body.impulses[0];
        assert_eq!(impulse, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(point, Vec3::new(1.0, 0.0, -2.0));
        assert!(input.is_airborne());
    }

    #[test]
    fn releasing_jump_clears_airborne_without_landing() {
        let controller = controller();
        let mut input = InputState::new();
        let mut body = PointBody::at(Vec3::new(0.0, 3.0, 0.0));

        controller.on_key_down(&mut input, KeyEvent::press(SPACE), &mut body);
        assert!(input.is_airborne());
        controller.on_key_up(&mut input, SPACE);
        assert!(!input.is_airborne());

        // Still mid-air, yet a second jump goes through.
        controller.on_key_down(&mut input, KeyEvent::press(SPACE), &mut body);
        assert_eq!(body.impulses.len(), 2);
    }

    #[test]
    fn auto_repeat_and_unknown_keys_are_ignored() {
        let controller = controller();
        let mut input = InputState::new();
        let mut body = PointBody::default();

        assert!(!controller.on_key_down(&mut input, KeyEvent::repeat(D), &mut body));
        assert!(!controller.on_key_down(&mut input, KeyEvent::repeat(SPACE), &mut body));
        assert!(!controller.on_key_down(
            &mut input,
            KeyEvent::press(KeyCode::Character('Q')),
            &mut body
        ));
        assert!(!controller.on_key_up(&mut input, KeyCode::Digit(1)));

        assert_eq!(input, InputState::new());
        assert!(body.impulses.is_empty());
    }

    #[test]
    fn idle_step_stops_horizontal_motion_and_keeps_position() {
        let controller = controller();
        let input = InputState::new();
        let start = Vec3::new(3.0, 0.5, -4.0);
        let mut body = PointBody::at(start);
        body.velocity = Vec3::new(7.0, -1.5, 3.0);
        let mut visual = Transform::default();

        for _ in 0..5 {
            controller.step(&input, &mut body, &mut visual);
            assert_eq!(body.velocity, Vec3::new(0.0, -1.5, 0.0));
            assert_eq!(body.position, start);
        }
    }

    #[test]
    fn body_just_past_the_boundary_is_clamped_back() {
        let controller = controller();
        let input = InputState::new();
        let limit = 20.0 - 1.0 - 1.0;
        let mut body = PointBody::at(Vec3::new(limit + 1e-3, 0.0, -(limit + 1e-3)));
        let mut visual = Transform::default();

        controller.step(&input, &mut body, &mut visual);

        assert_eq!(body.position.x, limit);
        assert_eq!(body.position.z, -limit);
    }

    #[test]
    fn clamping_does_not_touch_vertical_position() {
        let controller = controller();
        let input = InputState::new();
        let mut body = PointBody::at(Vec3::new(50.0, 4.25, 0.0));
        let mut visual = Transform::default();

        controller.step(&input, &mut body, &mut visual);

        assert_eq!(body.position, Vec3::new(18.0, 4.25, 0.0));
    }

    #[test]
    fn visual_mirrors_body_after_step() {
        let controller = controller();
        let input = InputState::new();
        let mut body = PointBody::at(Vec3::new(25.0, 1.0, 2.0));
        body.rotation = Quat::from_rotation_y(0.75);
        let mut visual = Transform::default();

        controller.step(&input, &mut body, &mut visual);

        assert_eq!(visual.position, Vec3::new(18.0, 1.0, 2.0));
        assert_eq!(visual.rotation, body.rotation);
        assert_eq!(visual.updates, 1);
    }

    #[test]
    fn every_key_sequence_ends_inside_the_arena() {
        let controller = controller();
        let keys = [W, A, S, D, SPACE];
        let (min, max) = controller.bounds();

        // Walk every sequence of up to three press/release operations,
        // integrating the commanded velocity with an oversized time step.
        let operations: Vec<(KeyCode, bool)> = keys
            .iter()
            .flat_map(|&key| [(key, true), (key, false)])
            .collect();
        for first in &operations {
            for second in &operations {
                for third in &operations {
                    let mut input = InputState::new();
                    let mut body = PointBody::at(Vec3::new(17.5, 0.0, -17.5));
                    let mut visual = Transform::default();
                    for &(key, pressed) in [first, second, third] {
                        if pressed {
                            controller.on_key_down(&mut input, KeyEvent::press(key), &mut body);
                        } else {
                            controller.on_key_up(&mut input, key);
                        }
                        body.position += body.velocity * 1.5;
                        controller.step(&input, &mut body, &mut visual);
                        assert!(body.position.x >= min && body.position.x <= max);
                        assert!(body.position.z >= min && body.position.z <= max);
                    }
                }
            }
        }
    }
}
