//! Phong lighting values and their shader bindings.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::uniform::{IndexedUniforms, UniformError, UniformLocations, UniformWriter};

/// Size of the `pointLights` array declared by the lighting shader.
pub const MAX_POINT_LIGHTS: usize = 4;

const POINT_LIGHT_FIELDS: &[&str] = &[
    "position",
    "ambient",
    "diffuse",
    "specular",
    "constant",
    "linear",
    "quadratic",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self { shininess: 32.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.2, -1.0, -0.3),
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::splat(0.4),
            specular: Vec3::splat(0.5),
        }
    }
}

/// Distance attenuation terms shared by point and spot lights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ONE,
            attenuation: Attenuation::default(),
        }
    }
}

/// Cone light. Cut-off angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
    pub cut_off: f32,
    pub outer_cut_off: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
            attenuation: Attenuation::default(),
            cut_off: 12.5,
            outer_cut_off: 17.5,
        }
    }
}

/// Everything the lighting shader needs for one frame.
///
/// A missing directional or spot light is uploaded as a black light so the
/// shader does not need branches for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lighting {
    pub material: Material,
    pub directional: Option<DirectionalLight>,
    pub points: Vec<PointLight>,
    pub spot: Option<SpotLight>,
}

impl Lighting {
    /// Moves the spot light, if any, to the camera so it acts as a flashlight.
    pub fn attach_flashlight(&mut self, camera: &Camera) {
        if let Some(spot) = self.spot.as_mut() {
            spot.position = camera.position();
            spot.direction = camera.front();
        }
    }
}

/// Pre-resolved locations of every lighting uniform.
#[derive(Debug, Clone)]
pub struct LightingUniforms<L> {
    shininess: L,
    point_light_count: L,
    directional: [L; 4],
    points: IndexedUniforms<L>,
    spot: SpotLocations<L>,
}

#[derive(Debug, Clone)]
struct SpotLocations<L> {
    position: L,
    direction: L,
    ambient: L,
    diffuse: L,
    specular: L,
    constant: L,
    linear: L,
    quadratic: L,
    cut_off: L,
    outer_cut_off: L,
}

impl<L: Clone> LightingUniforms<L> {
    /// Resolves the lighting uniforms for `point_lights` active point lights.
    pub fn resolve(
        locations: &UniformLocations<L>,
        point_lights: usize,
    ) -> Result<Self, UniformError> {
        if point_lights > MAX_POINT_LIGHTS {
            return Err(UniformError::TooManyPointLights {
                requested: point_lights,
                max: MAX_POINT_LIGHTS,
            });
        }
        let get = |name: &str| locations.get(name).cloned();
        Ok(Self {
            shininess: get("material.shininess")?,
            point_light_count: get("pointLightCount")?,
            directional: [
                get("dirLight.direction")?,
                get("dirLight.ambient")?,
                get("dirLight.diffuse")?,
                get("dirLight.specular")?,
            ],
            points: IndexedUniforms::resolve(
                locations,
                "pointLights",
                point_lights,
                POINT_LIGHT_FIELDS,
            )?,
            spot: SpotLocations {
                position: get("spotLight.position")?,
                direction: get("spotLight.direction")?,
                ambient: get("spotLight.ambient")?,
                diffuse: get("spotLight.diffuse")?,
                specular: get("spotLight.specular")?,
                constant: get("spotLight.constant")?,
                linear: get("spotLight.linear")?,
                quadratic: get("spotLight.quadratic")?,
                cut_off: get("spotLight.cutOff")?,
                outer_cut_off: get("spotLight.outerCutOff")?,
            },
        })
    }

    /// Number of point lights this binding was resolved for.
    pub fn point_light_capacity(&self) -> usize {
        self.points.len()
    }

    /// Uploads `lighting` into the bound program.
    ///
    /// Point lights beyond the resolved capacity are dropped.
    pub fn upload<W>(&self, writer: &W, lighting: &Lighting) -> Result<(), UniformError>
    where
        W: UniformWriter<Location = L>,
    {
        writer.write_f32(&self.shininess, lighting.material.shininess);

        let directional = lighting.directional.unwrap_or(DirectionalLight {
            ambient: Vec3::ZERO,
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
            ..DirectionalLight::default()
        });
        let [direction, ambient, diffuse, specular] = &self.directional;
        writer.write_vec3(direction, directional.direction);
        writer.write_vec3(ambient, directional.ambient);
        writer.write_vec3(diffuse, directional.diffuse);
        writer.write_vec3(specular, directional.specular);

        let count = lighting.points.len().min(self.points.len());
        writer.write_i32(&self.point_light_count, count as i32);
        for (index, light) in lighting.points.iter().take(count).enumerate() {
            writer.write_vec3(self.points.get(index, "position")?, light.position);
            writer.write_vec3(self.points.get(index, "ambient")?, light.ambient);
            writer.write_vec3(self.points.get(index, "diffuse")?, light.diffuse);
            writer.write_vec3(self.points.get(index, "specular")?, light.specular);
            write_attenuation(
                writer,
                [
                    self.points.get(index, "constant")?,
                    self.points.get(index, "linear")?,
                    self.points.get(index, "quadratic")?,
                ],
                &light.attenuation,
            );
        }

        let spot = lighting.spot.unwrap_or(SpotLight {
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
            ..SpotLight::default()
        });
        let locations = &self.spot;
        writer.write_vec3(&locations.position, spot.position);
        writer.write_vec3(&locations.direction, spot.direction);
        writer.write_vec3(&locations.ambient, spot.ambient);
        writer.write_vec3(&locations.diffuse, spot.diffuse);
        writer.write_vec3(&locations.specular, spot.specular);
        write_attenuation(
            writer,
            [&locations.constant, &locations.linear, &locations.quadratic],
            &spot.attenuation,
        );
        writer.write_f32(&locations.cut_off, spot.cut_off.to_radians().cos());
        writer.write_f32(&locations.outer_cut_off, spot.outer_cut_off.to_radians().cos());
        Ok(())
    }
}

fn write_attenuation<W: UniformWriter>(
    writer: &W,
    [constant, linear, quadratic]: [&W::Location; 3],
    attenuation: &Attenuation,
) {
    writer.write_f32(constant, attenuation.constant);
    writer.write_f32(linear, attenuation.linear);
    writer.write_f32(quadratic, attenuation.quadratic);
}

/// Light space transform for rendering a directional shadow map.
///
/// The light looks at the origin from `light_position` through an
/// orthographic box spanning `half_extent` on each side.
pub fn light_space_matrix(light_position: Vec3, half_extent: f32, near: f32, far: f32) -> Mat4 {
    let projection = Mat4::orthographic_rh_gl(
        -half_extent,
        half_extent,
        -half_extent,
        half_extent,
        near,
        far,
    );
    let view = Mat4::look_at_rh(light_position, Vec3::ZERO, Vec3::Y);
    projection * view
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;
    use crate::uniform::indexed_name;
    use crate::uniform::tests::{FakeDriver, RecordingWriter};

    fn lighting_shader_names(point_lights: usize) -> Vec<String> {
        let mut names: Vec<String> = [
            "material.shininess",
            "pointLightCount",
            "dirLight.direction",
            "dirLight.ambient",
            "dirLight.diffuse",
            "dirLight.specular",
            "spotLight.position",
            "spotLight.direction",
            "spotLight.ambient",
            "spotLight.diffuse",
            "spotLight.specular",
            "spotLight.constant",
            "spotLight.linear",
            "spotLight.quadratic",
            "spotLight.cutOff",
            "spotLight.outerCutOff",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect();
        for index in 0..point_lights {
            for field in POINT_LIGHT_FIELDS {
                names.push(indexed_name("pointLights", index, field));
            }
        }
        names
    }

    fn cache_for(point_lights: usize) -> UniformLocations<i32> {
        let names = lighting_shader_names(point_lights);
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        UniformLocations::build(&FakeDriver::with_names(&names), 1)
    }

    #[test]
    fn resolves_all_lighting_uniforms() {
        let uniforms = LightingUniforms::resolve(&cache_for(MAX_POINT_LIGHTS), 2).unwrap();
        assert_eq!(uniforms.point_light_capacity(), 2);
    }

    #[test]
    fn missing_point_light_member_is_reported() {
        let err = LightingUniforms::resolve(&cache_for(1), 2).unwrap_err();
        assert_eq!(
            err,
            UniformError::UnknownUniform("pointLights[1].position".into())
        );
    }

    #[test]
    fn too_many_point_lights_are_rejected() {
        let err = LightingUniforms::resolve(&cache_for(MAX_POINT_LIGHTS), 5).unwrap_err();
        assert_eq!(
            err,
            UniformError::TooManyPointLights {
                requested: 5,
                max: MAX_POINT_LIGHTS
            }
        );
    }

    #[test]
    fn upload_writes_by_resolved_location() {
        let cache = cache_for(2);
        let uniforms = LightingUniforms::resolve(&cache, 2).unwrap();
        let lighting = Lighting {
            material: Material { shininess: 64.0 },
            directional: None,
            points: vec![
                PointLight {
                    position: Vec3::new(1.0, 2.0, 3.0),
                    ..PointLight::default()
                },
                PointLight::default(),
                PointLight::default(),
            ],
            spot: Some(SpotLight::default()),
        };
        let writer = RecordingWriter::default();
        uniforms.upload(&writer, &lighting).unwrap();

        let at = |name: &str| writer.value_at(*cache.get(name).unwrap()).unwrap();
        assert_eq!(at("material.shininess"), vec![64.0]);
        assert_eq!(at("pointLightCount"), vec![2.0]);
        assert_eq!(at("pointLights[0].position"), vec![1.0, 2.0, 3.0]);
        assert_eq!(at("dirLight.diffuse"), vec![0.0, 0.0, 0.0]);
        let cut_off = at("spotLight.cutOff")[0];
        assert!((cut_off - 12.5f32.to_radians().cos()).abs() < 1e-6);
    }

    #[test]
    fn flashlight_follows_camera() {
        let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), 1.0);
        camera.set_yaw(0.0);
        let mut lighting = Lighting {
            spot: Some(SpotLight::default()),
            ..Lighting::default()
        };
        lighting.attach_flashlight(&camera);
        let spot = lighting.spot.unwrap();
        assert_eq!(spot.position, camera.position());
        assert_eq!(spot.direction, camera.front());
    }

    #[test]
    fn light_space_matrix_maps_origin_inside_the_depth_range() {
        let matrix = light_space_matrix(Vec3::new(-2.0, 4.0, -1.0), 10.0, 1.0, 7.5);
        let clip = matrix * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.x.abs() < 1e-5);
        assert!(clip.y.abs() < 1e-5);
        assert!(clip.z > -1.0 && clip.z < 1.0);
    }
}
