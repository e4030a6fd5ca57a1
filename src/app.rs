use glam::Vec3;
use log::debug;

use crate::camera::Camera;
use crate::controller::FlyController;
use crate::input::InputState;
use crate::scene::{FrameInput, Scene};

/// Feeds one recorded frame through the controller.
pub fn apply_frame(
    camera: &mut Camera,
    controller: &FlyController,
    input: &mut InputState,
    frame: &FrameInput,
) {
    for key in &frame.keys {
        input.set_key_down(*key);
    }
    input.add_mouse_delta(frame.mouse);
    input.add_scroll(frame.scroll);
    controller.update(camera, input, frame.dt);
    for key in &frame.keys {
        input.set_key_up(*key);
    }
}

/// Replays every recorded frame of `scene` against a fresh camera and
/// returns the final camera.
pub fn replay(scene: &Scene) -> Camera {
    let mut camera = scene.camera.build(scene.viewport.aspect_ratio());
    let controller = FlyController::new(scene.camera.fly);
    let mut input = InputState::new();
    for (index, frame) in scene.frames.iter().enumerate() {
        apply_frame(&mut camera, &controller, &mut input, frame);
        debug!(
            "frame {index}: position={:?} yaw={} pitch={} fov={}",
            camera.position(),
            camera.yaw(),
            camera.pitch(),
            camera.fov()
        );
    }
    camera
}

pub fn scene_summary(scene: &Scene) -> String {
    format!(
        "Loaded scene with {} objects, {} lights, {} input frames",
        scene.objects.len(),
        scene.light_count(),
        scene.frames.len()
    )
}

/// Two-line human readable description of the camera state.
pub fn camera_summary(camera: &Camera) -> String {
    let position = tidy(camera.position());
    let front = tidy(camera.front());
    format!(
        "Camera position=({:.2}, {:.2}, {:.2}) yaw={:.2} pitch={:.2} fov={:.2}\nCamera front=({:.2}, {:.2}, {:.2})",
        position.x,
        position.y,
        position.z,
        camera.yaw(),
        camera.pitch(),
        camera.fov(),
        front.x,
        front.y,
        front.z
    )
}

/// Snaps components that would print as `-0.00` to zero.
fn tidy(value: Vec3) -> Vec3 {
    let snap = |component: f32| if component.abs() < 0.005 { 0.0 } else { component };
    Vec3::new(snap(value.x), snap(value.y), snap(value.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    #[test]
    fn replay_applies_frames_in_order() {
        let scene = Scene::from_xml(
            r#"<scene>
                <frame><dt>1</dt><keys>W</keys></frame>
                <frame><scroll>50</scroll></frame>
                <frame><mouse>0 -1000</mouse></frame>
            </scene>"#,
        )
        .unwrap();
        let camera = replay(&scene);
        assert!(camera
            .position()
            .abs_diff_eq(Vec3::new(0.0, 0.0, 1.5), 1e-5));
        assert_eq!(camera.fov(), 1.0);
        assert_eq!(camera.pitch(), 89.0);
    }

    #[test]
    fn keys_are_released_after_each_frame() {
        let scene = Scene::default();
        let mut camera = scene.camera.build(1.0);
        let controller = FlyController::default();
        let mut input = InputState::new();
        let frame = FrameInput {
            dt: 1.0,
            keys: vec![KeyCode::W],
            ..FrameInput::default()
        };
        apply_frame(&mut camera, &controller, &mut input, &frame);
        assert!(!input.is_key_down(KeyCode::W));
    }

    #[test]
    fn summary_prints_without_negative_zero() {
        let camera = Scene::default().camera.build(4.0 / 3.0);
        let summary = camera_summary(&camera);
        assert_eq!(
            summary,
            "Camera position=(0.00, 0.00, 3.00) yaw=-90.00 pitch=0.00 fov=45.00\nCamera front=(0.00, 0.00, -1.00)"
        );
    }
}
