use std::rc::Rc;

use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use glow::HasContext;
use log::info;

use super::mesh::Mesh;
use super::shader::{GlLocation, ShaderProgram};
use super::shared::{LAMP_FRAGMENT, LAMP_VERTEX, LIT_FRAGMENT, LIT_VERTEX};
use crate::camera::Camera;
use crate::lighting::{Lighting, LightingUniforms};
use crate::scene::SceneObject;
use crate::uniform::{UniformError, UniformLocations, UniformWriter};

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
const LAMP_SCALE: f32 = 0.2;

/// Model, view and projection locations shared by both programs.
#[derive(Debug, Clone)]
struct Transforms<L> {
    model: L,
    view: L,
    projection: L,
}

impl<L: Clone> Transforms<L> {
    fn resolve(locations: &UniformLocations<L>) -> Result<Self, UniformError> {
        Ok(Self {
            model: locations.get("model")?.clone(),
            view: locations.get("view")?.clone(),
            projection: locations.get("projection")?.clone(),
        })
    }

    fn upload_camera<W: UniformWriter<Location = L>>(&self, writer: &W, camera: &Camera) {
        writer.write_mat4(&self.view, &camera.view_matrix());
        writer.write_mat4(&self.projection, &camera.projection_matrix());
    }
}

/// Locations used by the lamp program, which takes a combined matrix.
#[derive(Debug, Clone)]
struct LampUniforms<L> {
    model: L,
    view_projection: L,
    color: L,
}

impl<L: Clone> LampUniforms<L> {
    fn resolve(locations: &UniformLocations<L>) -> Result<Self, UniformError> {
        Ok(Self {
            model: locations.get("model")?.clone(),
            view_projection: locations.get("viewProjection")?.clone(),
            color: locations.get("lampColor")?.clone(),
        })
    }
}

/// Draws scene objects as lit cubes and point lights as lamp cubes.
pub struct Renderer {
    gl: Rc<glow::Context>,
    lit: ShaderProgram,
    lit_transforms: Transforms<GlLocation>,
    view_position: GlLocation,
    object_color: GlLocation,
    lighting: LightingUniforms<GlLocation>,
    lamp: ShaderProgram,
    lamp_uniforms: LampUniforms<GlLocation>,
    cube: Mesh,
}

impl Renderer {
    /// Compiles the programs and resolves every uniform they need.
    ///
    /// `point_lights` is the number of point lights the scene will upload.
    pub fn new(gl: Rc<glow::Context>, point_lights: usize) -> Result<Self> {
        let lit = ShaderProgram::new(Rc::clone(&gl), LIT_VERTEX, LIT_FRAGMENT)
            .context("failed to build lighting program")?;
        let lamp = ShaderProgram::new(Rc::clone(&gl), LAMP_VERTEX, LAMP_FRAGMENT)
            .context("failed to build lamp program")?;
        let cube = Mesh::cube(Rc::clone(&gl))?;

        let renderer = Self {
            lit_transforms: Transforms::resolve(lit.uniforms())?,
            view_position: lit.location("viewPos")?,
            object_color: lit.location("objectColor")?,
            lighting: LightingUniforms::resolve(lit.uniforms(), point_lights)?,
            lamp_uniforms: LampUniforms::resolve(lamp.uniforms())?,
            lit,
            lamp,
            cube,
            gl,
        };
        unsafe {
            renderer.gl.enable(glow::DEPTH_TEST);
        }
        info!(
            "renderer ready ({} lit uniforms, {} lamp uniforms)",
            renderer.lit.uniforms().len(),
            renderer.lamp.uniforms().len()
        );
        Ok(renderer)
    }

    /// Matches the GL viewport to the framebuffer size in pixels.
    pub fn resize(&self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
    }

    /// Clears the framebuffer and draws one frame.
    pub fn render(
        &self,
        camera: &Camera,
        objects: &[SceneObject],
        lighting: &Lighting,
    ) -> Result<(), UniformError> {
        let gl = self.gl.as_ref();
        unsafe {
            let [r, g, b, a] = CLEAR_COLOR;
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }

        self.lit.bind();
        self.lit_transforms.upload_camera(gl, camera);
        gl.write_vec3(&self.view_position, camera.position());
        self.lighting.upload(gl, lighting)?;
        for object in objects {
            gl.write_mat4(&self.lit_transforms.model, &object_model_matrix(object));
            gl.write_vec3(&self.object_color, object.color);
            self.cube.draw();
        }

        self.lamp.bind();
        let lamp = &self.lamp_uniforms;
        gl.write_mat4(&lamp.view_projection, &camera.view_projection());
        for light in lighting
            .points
            .iter()
            .take(self.lighting.point_light_capacity())
        {
            gl.write_mat4(&lamp.model, &lamp_model_matrix(light.position));
            gl.write_vec3(&lamp.color, light.diffuse);
            self.cube.draw();
        }
        Ok(())
    }
}

fn object_model_matrix(object: &SceneObject) -> Mat4 {
    let translation = Mat4::from_translation(object.position);
    let rotation = Mat4::from_rotation_z(object.rotation.z.to_radians())
        * Mat4::from_rotation_y(object.rotation.y.to_radians())
        * Mat4::from_rotation_x(object.rotation.x.to_radians());
    let scale = Mat4::from_scale(object.scale);
    translation * rotation * scale
}

fn lamp_model_matrix(position: Vec3) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(LAMP_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_matrix_applies_scale_then_rotation_then_translation() {
        let object = SceneObject {
            name: "Crate".into(),
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.0, 90.0, 0.0),
            scale: Vec3::splat(2.0),
            ..SceneObject::default()
        };
        let corner = object_model_matrix(&object).transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!(corner.abs_diff_eq(Vec3::new(1.0, 2.0, 2.0), 1e-5));
    }

    #[test]
    fn lamp_is_a_small_cube_at_the_light() {
        let corner = lamp_model_matrix(Vec3::new(0.0, 1.0, 0.0)).transform_point3(Vec3::splat(0.5));
        assert!(corner.abs_diff_eq(Vec3::new(0.1, 1.1, 0.1), 1e-6));
    }

    #[test]
    fn transforms_require_all_three_matrices() {
        use crate::uniform::tests::FakeDriver;

        let driver = FakeDriver::with_names(&["model", "view"]);
        let locations = UniformLocations::build(&driver, 1);
        let err = Transforms::resolve(&locations).unwrap_err();
        assert_eq!(err, UniformError::UnknownUniform("projection".into()));
    }

    #[test]
    fn lamp_uploads_the_camera_view_projection() {
        use crate::uniform::tests::{FakeDriver, RecordingWriter};

        let driver = FakeDriver::with_names(&["model", "viewProjection", "lampColor"]);
        let lamp = LampUniforms::resolve(&UniformLocations::build(&driver, 1)).unwrap();
        let camera = Camera::new(Vec3::new(0.0, 0.0, 3.0), 4.0 / 3.0);
        let writer = RecordingWriter::default();
        writer.write_mat4(&lamp.view_projection, &camera.view_projection());

        let expected = camera.projection_matrix() * camera.view_matrix();
        assert_eq!(
            writer.value_at(lamp.view_projection),
            Some(expected.to_cols_array().to_vec())
        );

        let driver = FakeDriver::with_names(&["model", "view", "projection", "lampColor"]);
        let err = LampUniforms::resolve(&UniformLocations::build(&driver, 1)).unwrap_err();
        assert_eq!(err, UniformError::UnknownUniform("viewProjection".into()));
    }
}
