//! Camera and uniform binding core for OpenGL samples.
//!
//! The crate exposes a yaw/pitch fly camera, a per-program cache of uniform
//! locations and the small amount of glue the samples share: input
//! snapshots, a fly controller, Phong lighting bindings and an XML scene
//! description. The camera, controller, lighting and scene modules never
//! touch the GPU, so they stay testable in headless tools; only
//! [`render`] talks to an OpenGL context.

pub mod app;
pub mod camera;
pub mod controller;
pub mod input;
pub mod lighting;
pub mod orientation;
pub mod render;
pub mod scene;
pub mod uniform;

pub use camera::{clamp_fov, clamp_pitch, Camera, ClipPlanes};
pub use controller::{FlyController, FlySettings};
pub use input::{InputState, KeyCode, NamedKey};
pub use lighting::{
    light_space_matrix, DirectionalLight, Lighting, LightingUniforms, Material, PointLight,
    SpotLight,
};
pub use orientation::Orientation;
pub use render::{Renderer, ShaderError, ShaderProgram};
pub use scene::{CameraConfig, FrameInput, Scene, SceneObject, Viewport};
pub use uniform::{
    IndexedUniforms, ProgramIntrospection, UniformError, UniformLocations, UniformWriter,
};
