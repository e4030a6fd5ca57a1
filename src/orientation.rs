use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Up direction of the world. Right and up are derived against it.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Orthonormal basis describing where a camera is facing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub front: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Orientation {
    /// Builds the basis from yaw and pitch in degrees.
    ///
    /// The vectors are always rebuilt from the two angles so rounding error
    /// never accumulates between frames. Pitch must stay away from ±90°,
    /// otherwise `front` becomes parallel to [`WORLD_UP`] and `right` has no
    /// meaningful direction.
    pub fn from_angles(yaw: f32, pitch: f32) -> Self {
        let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
        let front = Vec3::new(
            pitch.cos() * yaw.cos(),
            pitch.sin(),
            pitch.cos() * yaw.sin(),
        )
        .normalize();
        let right = front.cross(WORLD_UP).normalize();
        let up = right.cross(front).normalize();
        Self { front, right, up }
    }

    /// Recovers `(yaw, pitch)` in degrees from the front vector.
    pub fn angles(&self) -> (f32, f32) {
        let yaw = self.front.z.atan2(self.front.x).to_degrees();
        let pitch = self.front.y.clamp(-1.0, 1.0).asin().to_degrees();
        (yaw, pitch)
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::from_angles(-90.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-5;

    fn assert_orthonormal(basis: &Orientation) {
        assert!((basis.front.length() - 1.0).abs() < TOLERANCE);
        assert!((basis.right.length() - 1.0).abs() < TOLERANCE);
        assert!((basis.up.length() - 1.0).abs() < TOLERANCE);
        assert!(basis.front.dot(basis.right).abs() < TOLERANCE);
        assert!(basis.front.dot(basis.up).abs() < TOLERANCE);
        assert!(basis.right.dot(basis.up).abs() < TOLERANCE);
    }

    #[test]
    fn basis_is_orthonormal_for_sampled_angles() {
        let mut yaw = -720.0;
        while yaw <= 720.0 {
            let mut pitch = -89.0;
            while pitch <= 89.0 {
                assert_orthonormal(&Orientation::from_angles(yaw, pitch));
                pitch += 7.5;
            }
            yaw += 33.0;
        }
    }

    #[test]
    fn default_faces_negative_z() {
        let basis = Orientation::default();
        assert!(basis.front.abs_diff_eq(Vec3::NEG_Z, TOLERANCE));
        assert!(basis.right.abs_diff_eq(Vec3::X, TOLERANCE));
        assert!(basis.up.abs_diff_eq(Vec3::Y, TOLERANCE));
    }

    #[test]
    fn angles_round_trip_through_front() {
        let (yaw, pitch) = Orientation::from_angles(45.0, 10.0).angles();
        assert!((yaw - 45.0).abs() < 1e-3);
        assert!((pitch - 10.0).abs() < 1e-3);
    }

    #[test]
    fn up_stays_above_horizon_near_the_pole() {
        let basis = Orientation::from_angles(0.0, 89.0);
        assert_orthonormal(&basis);
        assert!(basis.up.y > 0.0);
    }
}
