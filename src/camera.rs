use glam::{Mat4, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::orientation::Orientation;

/// Lowest pitch a camera may look at, in degrees.
pub const MIN_PITCH: f32 = -89.0;
/// Highest pitch a camera may look at, in degrees.
pub const MAX_PITCH: f32 = 89.0;
/// Narrowest field of view reachable by zooming in, in degrees.
pub const MIN_FOV: f32 = 1.0;
/// Widest field of view, in degrees.
pub const MAX_FOV: f32 = 45.0;
/// Initial yaw. At -90° the camera looks down -Z.
pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_NEAR: f32 = 0.01;
pub const DEFAULT_FAR: f32 = 100.0;

/// Clamps a pitch angle so the camera never looks straight up or down.
///
/// NaN maps to a level pitch of zero.
pub fn clamp_pitch(pitch: f32) -> f32 {
    if pitch.is_nan() {
        return 0.0;
    }
    pitch.clamp(MIN_PITCH, MAX_PITCH)
}

/// Clamps a field of view to the supported zoom range.
///
/// NaN maps to the widest field of view.
pub fn clamp_fov(fov: f32) -> f32 {
    if fov.is_nan() {
        return MAX_FOV;
    }
    fov.clamp(MIN_FOV, MAX_FOV)
}

/// Near and far clip distances of the perspective projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipPlanes {
    pub near: f32,
    pub far: f32,
}

impl Default for ClipPlanes {
    fn default() -> Self {
        Self {
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

/// First person camera driven by yaw/pitch angles.
///
/// Angles are stored in degrees. The facing vectors are derived state and
/// are rebuilt every time one of the angles changes.
/// Only `Serialize` is derived: a camera is always built through its
/// setters (see `CameraConfig::build`) so the clamps and the orientation
/// basis stay consistent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    fov: f32,
    aspect_ratio: f32,
    clip: ClipPlanes,
    orientation: Orientation,
}

impl Camera {
    /// Creates a camera at `position` facing -Z with the widest field of view.
    pub fn new(position: Vec3, aspect_ratio: f32) -> Self {
        Self {
            position,
            yaw: DEFAULT_YAW,
            pitch: 0.0,
            fov: MAX_FOV,
            aspect_ratio,
            clip: ClipPlanes::default(),
            orientation: Orientation::from_angles(DEFAULT_YAW, 0.0),
        }
    }

    pub fn with_clip_planes(mut self, clip: ClipPlanes) -> Self {
        self.clip = clip;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Translates the camera by a world space delta.
    pub fn move_by(&mut self, delta: Vec3) {
        self.position += delta;
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Sets the yaw in degrees. Yaw is never clamped, but a non-finite
    /// value is ignored.
    pub fn set_yaw(&mut self, yaw: f32) {
        if !yaw.is_finite() {
            debug!("ignoring non-finite yaw {yaw}");
            return;
        }
        self.yaw = yaw;
        self.update_orientation();
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Sets the pitch in degrees, clamped to `[MIN_PITCH, MAX_PITCH]`.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = clamp_pitch(pitch);
        self.update_orientation();
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Sets the field of view in degrees, clamped to `[MIN_FOV, MAX_FOV]`.
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = clamp_fov(fov);
    }

    /// Narrows the field of view by `delta` degrees.
    ///
    /// Positive deltas (scrolling up) zoom in, negative deltas zoom out.
    pub fn zoom(&mut self, delta: f32) {
        if delta.is_nan() {
            return;
        }
        self.set_fov(self.fov - delta);
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Updates the aspect ratio from a viewport size.
    ///
    /// A zero height (minimised window) keeps the previous ratio.
    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        if height == 0 {
            debug!("ignoring aspect ratio update for {width}x{height} viewport");
            return;
        }
        self.aspect_ratio = width as f32 / height as f32;
    }

    pub fn clip_planes(&self) -> ClipPlanes {
        self.clip
    }

    pub fn orientation(&self) -> &Orientation {
        &self.orientation
    }

    pub fn front(&self) -> Vec3 {
        self.orientation.front
    }

    pub fn right(&self) -> Vec3 {
        self.orientation.right
    }

    pub fn up(&self) -> Vec3 {
        self.orientation.up
    }

    /// World to camera space transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(
            self.position,
            self.position + self.orientation.front,
            self.orientation.up,
        )
    }

    /// Camera to clip space transform using OpenGL depth conventions.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.clip.near,
            self.clip.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    fn update_orientation(&mut self) {
        self.orientation = Orientation::from_angles(self.yaw, self.pitch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 3.0), 800.0 / 600.0)
    }

    #[test]
    fn clamp_pitch_keeps_values_in_range() {
        for pitch in [-1000.0, -90.0, -89.5, -89.0, -12.0, 0.0, 45.0, 89.0, 90.0, 1e6] {
            let clamped = clamp_pitch(pitch);
            assert!((MIN_PITCH..=MAX_PITCH).contains(&clamped));
            if (MIN_PITCH..=MAX_PITCH).contains(&pitch) {
                assert_eq!(clamped, pitch);
            }
        }
        assert_eq!(clamp_pitch(90.0), 89.0);
        assert_eq!(clamp_pitch(-90.0), -89.0);
    }

    #[test]
    fn set_pitch_clamps_and_rebuilds_vectors() {
        let mut camera = sample_camera();
        camera.set_pitch(90.0);
        assert_eq!(camera.pitch(), 89.0);
        assert!(camera.front().y > 0.99);
        assert!(camera.right().length() > 0.99);
    }

    #[test]
    fn yaw_is_not_clamped() {
        let mut camera = sample_camera();
        camera.set_yaw(540.0);
        assert_eq!(camera.yaw(), 540.0);
        assert!(camera.front().abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn fov_stays_within_bounds_for_any_zoom_sequence() {
        let mut camera = sample_camera();
        for delta in [3.0, -10.0, 25.0, 25.0, -100.0, 0.5, 44.0, 7.0, -3.0] {
            camera.zoom(delta);
            assert!((MIN_FOV..=MAX_FOV).contains(&camera.fov()));
        }
    }

    #[test]
    fn zooming_in_past_the_limit_pins_fov_at_one() {
        let mut camera = sample_camera();
        for _ in 0..50 {
            camera.zoom(1.0);
        }
        assert_eq!(camera.fov(), MIN_FOV);

        camera.zoom(-1000.0);
        assert_eq!(camera.fov(), MAX_FOV);
    }

    #[test]
    fn non_finite_angles_keep_the_camera_valid() {
        assert_eq!(clamp_pitch(f32::NAN), 0.0);
        assert_eq!(clamp_pitch(f32::INFINITY), MAX_PITCH);
        assert_eq!(clamp_pitch(f32::NEG_INFINITY), MIN_PITCH);
        assert_eq!(clamp_fov(f32::NAN), MAX_FOV);
        assert_eq!(clamp_fov(f32::INFINITY), MAX_FOV);
        assert_eq!(clamp_fov(f32::NEG_INFINITY), MIN_FOV);

        let mut camera = sample_camera();
        camera.set_pitch(f32::NAN);
        assert!((MIN_PITCH..=MAX_PITCH).contains(&camera.pitch()));
        camera.set_yaw(f32::INFINITY);
        assert_eq!(camera.yaw(), DEFAULT_YAW);
        camera.set_fov(f32::NAN);
        assert!((MIN_FOV..=MAX_FOV).contains(&camera.fov()));
        camera.zoom(10.0);
        camera.zoom(f32::NAN);
        assert_eq!(camera.fov(), MAX_FOV - 10.0);
        camera.zoom(f32::INFINITY);
        assert_eq!(camera.fov(), MIN_FOV);

        assert!(camera.view_matrix().is_finite());
        assert!(camera.projection_matrix().is_finite());
    }

    #[test]
    fn move_by_adds_delta() {
        let mut camera = sample_camera();
        camera.move_by(Vec3::new(1.0, -2.0, 0.5));
        assert_eq!(camera.position(), Vec3::new(1.0, -2.0, 3.5));
    }

    #[test]
    fn aspect_ratio_follows_viewport() {
        let mut camera = sample_camera();
        camera.set_aspect_ratio(1920, 1080);
        assert!((camera.aspect_ratio() - 16.0 / 9.0).abs() < f32::EPSILON);
        camera.set_aspect_ratio(1920, 0);
        assert!((camera.aspect_ratio() - 16.0 / 9.0).abs() < f32::EPSILON);
    }

    #[test]
    fn initial_view_looks_down_negative_z() {
        let camera = sample_camera();
        let expected = Mat4::look_at_rh(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::Y,
        );
        assert!(camera.view_matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn projection_uses_fov_aspect_and_clip_planes() {
        let camera = sample_camera();
        let expected = Mat4::perspective_rh_gl(45f32.to_radians(), 800.0 / 600.0, 0.01, 100.0);
        assert_eq!(camera.projection_matrix(), expected);
    }

    #[test]
    fn matrix_queries_are_idempotent() {
        let mut camera = sample_camera();
        camera.set_yaw(12.5);
        camera.set_pitch(-33.0);
        camera.zoom(7.0);
        assert_eq!(
            camera.view_matrix().to_cols_array(),
            camera.view_matrix().to_cols_array()
        );
        assert_eq!(
            camera.projection_matrix().to_cols_array(),
            camera.projection_matrix().to_cols_array()
        );
    }

    #[test]
    fn yaw_and_pitch_round_trip_through_front() {
        let mut camera = sample_camera();
        camera.set_yaw(45.0);
        camera.set_pitch(10.0);
        let front = camera.front();
        let yaw = front.z.atan2(front.x).to_degrees();
        let pitch = front.y.asin().to_degrees();
        assert!((yaw - 45.0).abs() < 1e-3);
        assert!((pitch - 10.0).abs() < 1e-3);
    }
}
