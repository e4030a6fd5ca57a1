use std::rc::Rc;

use glam::{Mat4, Vec3};
use glow::HasContext;
use log::{debug, warn};
use thiserror::Error;

use crate::uniform::{ProgramIntrospection, UniformError, UniformLocations, UniformWriter};

pub type GlProgram = <glow::Context as HasContext>::Program;
pub type GlLocation = <glow::Context as HasContext>::UniformLocation;

/// Failures while turning GLSL sources into a linked program.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to create GL object: {0}")]
    Create(String),

    #[error("failed to compile {stage} shader:\n{log}")]
    Compile { stage: &'static str, log: String },

    #[error("failed to link program:\n{0}")]
    Link(String),
}

/// Linked GLSL program with its uniform locations resolved up front.
///
/// The program is deleted when dropped, so it must not outlive the context
/// it was created on.
pub struct ShaderProgram {
    gl: Rc<glow::Context>,
    program: GlProgram,
    uniforms: UniformLocations<GlLocation>,
}

impl ShaderProgram {
    /// Compiles and links a vertex/fragment pair.
    pub fn new(gl: Rc<glow::Context>, vertex: &str, fragment: &str) -> Result<Self, ShaderError> {
        unsafe {
            let program = gl.create_program().map_err(ShaderError::Create)?;
            let stages = [
                (glow::VERTEX_SHADER, "vertex", vertex),
                (glow::FRAGMENT_SHADER, "fragment", fragment),
            ];
            let mut shaders = Vec::with_capacity(stages.len());
            for (kind, stage, source) in stages {
                match compile(&gl, kind, stage, source) {
                    Ok(shader) => {
                        gl.attach_shader(program, shader);
                        shaders.push(shader);
                    }
                    Err(err) => {
                        for shader in shaders {
                            gl.delete_shader(shader);
                        }
                        gl.delete_program(program);
                        return Err(err);
                    }
                }
            }

            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            // The linked binary keeps its own copy of the compiled stages.
            for shader in shaders {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }
            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(ShaderError::Link(log));
            }

            let uniforms = UniformLocations::build(&*gl, program);
            debug!("linked program with {} active uniforms", uniforms.len());
            Ok(Self {
                gl,
                program,
                uniforms,
            })
        }
    }

    /// Makes this the current program for subsequent uniform writes and draws.
    pub fn bind(&self) {
        unsafe { self.gl.use_program(Some(self.program)) }
    }

    pub fn uniforms(&self) -> &UniformLocations<GlLocation> {
        &self.uniforms
    }

    /// Location of `name`, failing loudly when the program does not use it.
    pub fn location(&self, name: &str) -> Result<GlLocation, UniformError> {
        self.uniforms.get(name).cloned()
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe { self.gl.delete_program(self.program) }
    }
}

unsafe fn compile(
    gl: &glow::Context,
    kind: u32,
    stage: &'static str,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    let shader = gl.create_shader(kind).map_err(ShaderError::Create)?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(ShaderError::Compile { stage, log });
    }
    let log = gl.get_shader_info_log(shader);
    if !log.trim().is_empty() {
        warn!("{stage} shader compiled with warnings:\n{log}");
    }
    Ok(shader)
}

impl ProgramIntrospection for glow::Context {
    type Program = GlProgram;
    type Location = GlLocation;

    fn active_uniform_count(&self, program: GlProgram) -> u32 {
        unsafe { self.get_active_uniforms(program) }
    }

    fn active_uniform_name(&self, program: GlProgram, index: u32) -> Option<String> {
        unsafe { self.get_active_uniform(program, index) }.map(|uniform| uniform.name)
    }

    fn uniform_location(&self, program: GlProgram, name: &str) -> Option<GlLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }
}

impl UniformWriter for glow::Context {
    type Location = GlLocation;

    fn write_mat4(&self, location: &GlLocation, value: &Mat4) {
        // glam is column major, so no transpose.
        unsafe { self.uniform_matrix_4_f32_slice(Some(location), false, &value.to_cols_array()) }
    }

    fn write_vec3(&self, location: &GlLocation, value: Vec3) {
        unsafe { self.uniform_3_f32(Some(location), value.x, value.y, value.z) }
    }

    fn write_f32(&self, location: &GlLocation, value: f32) {
        unsafe { self.uniform_1_f32(Some(location), value) }
    }

    fn write_i32(&self, location: &GlLocation, value: i32) {
        unsafe { self.uniform_1_i32(Some(location), value) }
    }
}
