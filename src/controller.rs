use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::input::{InputState, KeyCode, NamedKey};

/// Tuning of the fly controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlySettings {
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Degrees of rotation per pixel of mouse movement.
    pub sensitivity: f32,
}

impl Default for FlySettings {
    fn default() -> Self {
        Self {
            speed: 1.5,
            sensitivity: 0.2,
        }
    }
}

/// Free-flying first person controls.
///
/// W/S move along the view direction, A/D strafe, Space/LeftShift move
/// along the camera's up vector. The mouse turns the camera and the
/// scroll wheel zooms.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlyController {
    settings: FlySettings,
}

impl FlyController {
    pub fn new(settings: FlySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> FlySettings {
        self.settings
    }

    /// Applies one frame of input to `camera`. `dt` is in seconds.
    ///
    /// Mouse and scroll deltas are consumed even when the window is not
    /// focused, so nothing stale is applied after focus returns.
    pub fn update(&self, camera: &mut Camera, input: &mut InputState, dt: f32) {
        let mouse = input.take_mouse_delta();
        let scroll = input.take_scroll();
        if !input.is_focused() {
            return;
        }

        let step = self.settings.speed * dt;
        let axis = |positive: KeyCode, negative: KeyCode| -> f32 {
            match (input.is_key_down(positive), input.is_key_down(negative)) {
                (true, false) => 1.0,
                (false, true) => -1.0,
                _ => 0.0,
            }
        };
        let forward = axis(KeyCode::W, KeyCode::S);
        let strafe = axis(KeyCode::D, KeyCode::A);
        let lift = axis(
            KeyCode::Named(NamedKey::Space),
            KeyCode::Named(NamedKey::LeftShift),
        );
        let delta = camera.front() * forward + camera.right() * strafe + camera.up() * lift;
        if delta != Vec3::ZERO {
            camera.move_by(delta * step);
        }

        if mouse.x != 0.0 {
            camera.set_yaw(camera.yaw() + mouse.x * self.settings.sensitivity);
        }
        // Screen y grows downwards.
        if mouse.y != 0.0 {
            camera.set_pitch(camera.pitch() - mouse.y * self.settings.sensitivity);
        }
        if scroll != 0.0 {
            camera.zoom(scroll);
        }
    }
}
