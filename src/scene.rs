use anyhow::{anyhow, bail, Context, Result};
use glam::{Vec2, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::camera::{clamp_fov, clamp_pitch, Camera, ClipPlanes, DEFAULT_YAW, MAX_FOV};
use crate::controller::FlySettings;
use crate::input::KeyCode;
use crate::lighting::{
    Attenuation, DirectionalLight, Lighting, PointLight, SpotLight, MAX_POINT_LIGHTS,
};

/// Sample description loaded from an XML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub camera: CameraConfig,
    pub viewport: Viewport,
    pub objects: Vec<SceneObject>,
    pub lighting: Lighting,
    pub frames: Vec<FrameInput>,
}

impl Scene {
    /// Parses a scene document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        let mut scene = Scene::default();

        if let Some(node) = child(&root, "camera") {
            scene.camera = parse_camera(&node).context("invalid <camera>")?;
        }
        if let Some(node) = child(&root, "viewport") {
            scene.viewport = parse_viewport(&node).context("invalid <viewport>")?;
        }
        if let Some(node) = child(&root, "material") {
            scene.lighting.material.shininess =
                parse_f32(optional_text(&node, "shininess"), scene.lighting.material.shininess)?;
        }

        for node in root.children().filter(|n| n.has_tag_name("object")) {
            scene.objects.push(parse_object(&node)?);
        }

        for (index, node) in root
            .children()
            .filter(|n| n.has_tag_name("light"))
            .enumerate()
        {
            parse_light(&node, &mut scene.lighting)
                .with_context(|| format!("invalid <light> #{}", index + 1))?;
        }
        if scene.lighting.points.len() > MAX_POINT_LIGHTS {
            bail!(
                "scene declares {} point lights, at most {MAX_POINT_LIGHTS} are supported",
                scene.lighting.points.len()
            );
        }

        for (index, node) in root
            .children()
            .filter(|n| n.has_tag_name("frame"))
            .enumerate()
        {
            scene.frames.push(
                parse_frame(&node).with_context(|| format!("invalid <frame> #{}", index + 1))?,
            );
        }

        Ok(scene)
    }

    /// Number of lights of any kind.
    pub fn light_count(&self) -> usize {
        self.lighting.points.len()
            + usize::from(self.lighting.directional.is_some())
            + usize::from(self.lighting.spot.is_some())
    }
}

/// Initial camera state and controller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub clip: ClipPlanes,
    pub fly: FlySettings,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw: DEFAULT_YAW,
            pitch: 0.0,
            fov: MAX_FOV,
            clip: ClipPlanes::default(),
            fly: FlySettings::default(),
        }
    }
}

impl CameraConfig {
    /// Builds a camera for a viewport with the given aspect ratio.
    pub fn build(&self, aspect_ratio: f32) -> Camera {
        let mut camera = Camera::new(self.position, aspect_ratio).with_clip_planes(self.clip);
        camera.set_yaw(self.yaw);
        camera.set_pitch(self.pitch);
        camera.set_fov(self.fov);
        camera
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl Viewport {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Lit cube placed in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in degrees.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default = "default_color")]
    pub color: Vec3,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: default_scale(),
            color: default_color(),
        }
    }
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

/// One recorded frame of input used for headless replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Elapsed time in seconds.
    pub dt: f32,
    pub keys: Vec<KeyCode>,
    /// Mouse movement in pixels.
    pub mouse: Vec2,
    pub scroll: f32,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            keys: Vec::new(),
            mouse: Vec2::ZERO,
            scroll: 0.0,
        }
    }
}

fn parse_camera(node: &Node<'_, '_>) -> Result<CameraConfig> {
    let defaults = CameraConfig::default();
    let near = parse_f32(optional_text(node, "near"), defaults.clip.near)?;
    let far = parse_f32(optional_text(node, "far"), defaults.clip.far)?;
    if !(near > 0.0 && far > near) {
        bail!("clip planes must satisfy 0 < near < far (got {near} and {far})");
    }
    let pitch = parse_f32(optional_text(node, "pitch"), defaults.pitch)?;
    let fov = parse_f32(optional_text(node, "fov"), defaults.fov)?;
    Ok(CameraConfig {
        position: parse_vec3(optional_text(node, "position"), defaults.position)?,
        yaw: parse_f32(optional_text(node, "yaw"), defaults.yaw)?,
        pitch: clamp_pitch(pitch),
        fov: clamp_fov(fov),
        clip: ClipPlanes { near, far },
        fly: FlySettings {
            speed: parse_f32(optional_text(node, "speed"), defaults.fly.speed)?,
            sensitivity: parse_f32(optional_text(node, "sensitivity"), defaults.fly.sensitivity)?,
        },
    })
}

fn parse_viewport(node: &Node<'_, '_>) -> Result<Viewport> {
    let defaults = Viewport::default();
    let width = parse_u32(optional_text(node, "width"), defaults.width)?;
    let height = parse_u32(optional_text(node, "height"), defaults.height)?;
    if width == 0 || height == 0 {
        bail!("viewport must have a non-zero area");
    }
    Ok(Viewport { width, height })
}

fn parse_object(node: &Node<'_, '_>) -> Result<SceneObject> {
    let mut object = SceneObject {
        name: required_text(node, "name")?,
        ..SceneObject::default()
    };
    let name = object.name.clone();
    let context = || format!("invalid object {name}");
    object.position =
        parse_vec3(optional_text(node, "position"), object.position).with_context(context)?;
    object.rotation =
        parse_vec3(optional_text(node, "rotation"), object.rotation).with_context(context)?;
    object.scale = parse_vec3(optional_text(node, "scale"), object.scale).with_context(context)?;
    object.color = parse_color(optional_text(node, "color"), object.color).with_context(context)?;
    Ok(object)
}

fn parse_light(node: &Node<'_, '_>, lighting: &mut Lighting) -> Result<()> {
    let kind = optional_text(node, "type").unwrap_or_else(|| "point".to_string());
    match kind.as_str() {
        "directional" => {
            let defaults = DirectionalLight::default();
            lighting.directional = Some(DirectionalLight {
                direction: parse_vec3(optional_text(node, "direction"), defaults.direction)?,
                ambient: parse_vec3(optional_text(node, "ambient"), defaults.ambient)?,
                diffuse: parse_vec3(optional_text(node, "diffuse"), defaults.diffuse)?,
                specular: parse_vec3(optional_text(node, "specular"), defaults.specular)?,
            });
        }
        "point" => {
            let defaults = PointLight::default();
            lighting.points.push(PointLight {
                position: parse_vec3(optional_text(node, "position"), defaults.position)?,
                ambient: parse_vec3(optional_text(node, "ambient"), defaults.ambient)?,
                diffuse: parse_vec3(optional_text(node, "diffuse"), defaults.diffuse)?,
                specular: parse_vec3(optional_text(node, "specular"), defaults.specular)?,
                attenuation: parse_attenuation(node, defaults.attenuation)?,
            });
        }
        "spot" => {
            let defaults = SpotLight::default();
            lighting.spot = Some(SpotLight {
                position: parse_vec3(optional_text(node, "position"), defaults.position)?,
                direction: parse_vec3(optional_text(node, "direction"), defaults.direction)?,
                ambient: parse_vec3(optional_text(node, "ambient"), defaults.ambient)?,
                diffuse: parse_vec3(optional_text(node, "diffuse"), defaults.diffuse)?,
                specular: parse_vec3(optional_text(node, "specular"), defaults.specular)?,
                attenuation: parse_attenuation(node, defaults.attenuation)?,
                cut_off: parse_f32(optional_text(node, "cutoff"), defaults.cut_off)?,
                outer_cut_off: parse_f32(optional_text(node, "outer-cutoff"), defaults.outer_cut_off)?,
            });
        }
        other => bail!("unknown light type `{other}`"),
    }
    Ok(())
}

fn parse_attenuation(node: &Node<'_, '_>, defaults: Attenuation) -> Result<Attenuation> {
    Ok(Attenuation {
        constant: parse_f32(optional_text(node, "constant"), defaults.constant)?,
        linear: parse_f32(optional_text(node, "linear"), defaults.linear)?,
        quadratic: parse_f32(optional_text(node, "quadratic"), defaults.quadratic)?,
    })
}

fn parse_frame(node: &Node<'_, '_>) -> Result<FrameInput> {
    let defaults = FrameInput::default();
    let dt = parse_f32(optional_text(node, "dt"), defaults.dt)?;
    if dt < 0.0 {
        bail!("frame time must not be negative");
    }
    let keys = optional_text(node, "keys")
        .map(|keys| {
            keys.split_whitespace()
                .map(|name| {
                    KeyCode::from_name(name).ok_or_else(|| anyhow!("unknown key `{name}`"))
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?
        .unwrap_or_default();
    Ok(FrameInput {
        dt,
        keys,
        mouse: parse_vec2(optional_text(node, "mouse"), defaults.mouse)?,
        scroll: parse_f32(optional_text(node, "scroll"), defaults.scroll)?,
    })
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_components<const N: usize>(value: &str, what: &str) -> Result<[f32; N]> {
    let mut components = [0.0; N];
    let mut numbers = value.split_whitespace();
    for component in components.iter_mut() {
        let number = numbers
            .next()
            .ok_or_else(|| anyhow!("{what} is missing components"))?;
        *component = parse_finite(number)
            .with_context(|| format!("failed to parse {what} component `{number}`"))?;
    }
    if numbers.next().is_some() {
        bail!("{what} has more than {N} components");
    }
    Ok(components)
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    Ok(Vec3::from_array(parse_components(&value, "vector")?))
}

fn parse_vec2(value: Option<String>, default: Vec2) -> Result<Vec2> {
    let Some(value) = value else {
        return Ok(default);
    };
    Ok(Vec2::from_array(parse_components(&value, "vector")?))
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let [r, g, b] = parse_components(&value, "color")?;
    Ok(Vec3::new(r / 255.0, g / 255.0, b / 255.0))
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => {
            parse_finite(&value).with_context(|| format!("failed to parse float `{value}`"))
        }
        None => Ok(default),
    }
}

/// Rust accepts `NaN` and `inf` as floats; scene values must be finite.
fn parse_finite(text: &str) -> Result<f32> {
    let number = text.parse::<f32>()?;
    if !number.is_finite() {
        bail!("{number} is not a finite number");
    }
    Ok(number)
}

fn parse_u32(value: Option<String>, default: u32) -> Result<u32> {
    match value {
        Some(value) => value
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse integer `{value}`: {err}")),
        None => Ok(default),
    }
}
