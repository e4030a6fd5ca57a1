//! OpenGL host layer built on `glow`.
//!
//! Everything here needs a current GL 3.3 core context and must be dropped
//! before that context is destroyed.

mod mesh;
mod renderer;
mod shader;
mod shared;

pub use mesh::Mesh;
pub use renderer::Renderer;
pub use shader::{GlLocation, GlProgram, ShaderError, ShaderProgram};
