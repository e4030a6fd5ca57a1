use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::num::NonZeroU32;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{error, info, warn};
use raw_window_handle::HasRawWindowHandle;
use thiserror::Error;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{
    DeviceEvent, ElementState, Event, KeyboardInput, MouseScrollDelta, VirtualKeyCode,
    WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{CursorGrabMode, Window, WindowBuilder};

use learngl_camera::app::{camera_summary, replay, scene_summary};
use learngl_camera::{
    Camera, FlyController, InputState, KeyCode, Lighting, NamedKey, Renderer, Scene, SceneObject,
};

/// Scroll lines reported for one pixel of touchpad scrolling.
const LINES_PER_PIXEL: f32 = 1.0 / 20.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let xml = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read scene {}", options.path))?;
    let scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;

    println!("{}", scene_summary(&scene));
    for object in &scene.objects {
        println!(" - {}", object.name);
    }

    let camera = if options.summary_only {
        replay(&scene)
    } else {
        match run_interactive(&scene) {
            Ok(camera) => camera,
            Err(err) => {
                if err.downcast_ref::<HostUnavailable>().is_some() {
                    eprintln!("{err}; replaying the recorded input instead");
                    replay(&scene)
                } else {
                    return Err(err);
                }
            }
        }
    };

    println!("{}", camera_summary(&camera));
    Ok(())
}

fn run_interactive(scene: &Scene) -> Result<Camera> {
    let mut event_loop = init_quietly("event loop", EventLoop::new)?;

    let window_builder = WindowBuilder::new()
        .with_title("learngl-camera")
        .with_inner_size(LogicalSize::new(
            scene.viewport.width as f64,
            scene.viewport.height as f64,
        ));
    let template = ConfigTemplateBuilder::new().with_depth_size(24);
    let display = init_quietly("GL config", || {
        DisplayBuilder::new()
            .with_window_builder(Some(window_builder))
            .build(&event_loop, template, pick_config)
    })?;
    let (window, gl_config) = display.map_err(|err| HostUnavailable::new("display", err))?;
    let window = window.ok_or_else(|| HostUnavailable::new("window", "no window created"))?;

    let gl_display = gl_config.display();
    let context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
        .build(Some(window.raw_window_handle()));
    let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
        .map_err(|err| HostUnavailable::new("GL context", err))?;
    let surface_attributes = window.build_surface_attributes(Default::default());
    let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
        .map_err(|err| HostUnavailable::new("GL surface", err))?;
    let gl_context = not_current
        .make_current(&gl_surface)
        .map_err(|err| HostUnavailable::new("GL context", err))?;
    if let Err(err) = gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
    {
        warn!("failed to enable vsync: {err}");
    }

    let gl = Rc::new(unsafe {
        glow::Context::from_loader_function_cstr(|symbol| gl_display.get_proc_address(symbol))
    });
    let renderer = Renderer::new(Rc::clone(&gl), scene.lighting.points.len())?;
    let size = window.inner_size();
    renderer.resize(size.width, size.height);

    if let Err(err) = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
    {
        warn!("cursor grab unavailable: {err}");
    }
    window.set_cursor_visible(false);

    let mut camera = scene.camera.build(scene.viewport.aspect_ratio());
    camera.set_aspect_ratio(size.width, size.height);
    info!("interactive mode started ({}x{})", size.width, size.height);

    let mut app = AppState {
        renderer,
        camera,
        controller: FlyController::new(scene.camera.fly),
        input: InputState::new(),
        lighting: scene.lighting.clone(),
        objects: scene.objects.clone(),
        last_frame: Instant::now(),
        last_error: None,
        gl_surface,
        gl_context,
        window,
    };

    event_loop.run_return(|event, _, control_flow| {
        control_flow.set_poll();
        if let Err(err) = app.process_event(&event, control_flow) {
            app.last_error = Some(err);
            control_flow.set_exit();
        }
    });

    match app.last_error.take() {
        Some(err) => Err(err),
        None => Ok(app.camera.clone()),
    }
}

fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|best, config| {
            if config.num_samples() > best.num_samples() {
                config
            } else {
                best
            }
        })
        .expect("no GL config matched the template")
}

/// Interactive loop state. The renderer is declared first so its GL objects
/// are released while the context is still alive.
struct AppState {
    renderer: Renderer,
    camera: Camera,
    controller: FlyController,
    input: InputState,
    lighting: Lighting,
    objects: Vec<SceneObject>,
    last_frame: Instant,
    last_error: Option<anyhow::Error>,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

/// The window system or GL driver could not provide a context.
#[derive(Debug, Error)]
#[error("no GL window available ({stage}): {reason}")]
struct HostUnavailable {
    stage: &'static str,
    reason: String,
}

impl HostUnavailable {
    fn new(stage: &'static str, reason: impl fmt::Display) -> Self {
        Self {
            stage,
            reason: reason.to_string(),
        }
    }
}

/// Runs `init` with panic output silenced and reports a panic as
/// [`HostUnavailable`]. winit and glutin panic when no display is reachable.
fn init_quietly<T>(stage: &'static str, init: impl FnOnce() -> T) -> Result<T, HostUnavailable> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let outcome = panic::catch_unwind(AssertUnwindSafe(init));
    panic::set_hook(default_hook);
    outcome.map_err(|payload| HostUnavailable::new(stage, describe_panic(&*payload)))
}

fn describe_panic(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&'static str>().copied())
        .unwrap_or("panicked without a message")
}

impl AppState {
    fn process_event(&mut self, event: &Event<()>, control_flow: &mut ControlFlow) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.window.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    WindowEvent::Resized(size) => self.resize(*size),
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        self.resize(**new_inner_size)
                    }
                    WindowEvent::Focused(focused) => {
                        self.input.set_focused(*focused);
                    }
                    WindowEvent::KeyboardInput { input, .. } => {
                        if is_escape_press(input) {
                            control_flow.set_exit();
                        } else {
                            self.handle_keyboard(input);
                        }
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let lines = match delta {
                            MouseScrollDelta::LineDelta(_, y) => *y,
                            MouseScrollDelta::PixelDelta(position) => {
                                position.y as f32 * LINES_PER_PIXEL
                            }
                        };
                        self.input.add_scroll(lines);
                    }
                    _ => {}
                }
            }
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                if self.input.is_focused() {
                    self.input
                        .add_mouse_delta(Vec2::new(delta.0 as f32, delta.1 as f32));
                }
            }
            Event::RedrawRequested(window_id) if *window_id == self.window.id() => {
                self.frame()?;
            }
            Event::MainEventsCleared => {
                self.window.request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    fn frame(&mut self) -> Result<()> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.controller
            .update(&mut self.camera, &mut self.input, dt);
        self.lighting.attach_flashlight(&self.camera);
        if let Err(err) = self
            .renderer
            .render(&self.camera, &self.objects, &self.lighting)
        {
            error!("skipping frame: {err}");
            return Ok(());
        }
        self.gl_surface
            .swap_buffers(&self.gl_context)
            .map_err(|err| anyhow!("failed to present frame: {err}"))
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        {
            self.gl_surface.resize(&self.gl_context, width, height);
            self.renderer.resize(size.width, size.height);
        }
        self.camera.set_aspect_ratio(size.width, size.height);
    }

    fn handle_keyboard(&mut self, input: &KeyboardInput) {
        let Some(keycode) = input.virtual_keycode.and_then(map_keycode) else {
            return;
        };
        match input.state {
            ElementState::Pressed => self.input.set_key_down(keycode),
            ElementState::Released => self.input.set_key_up(keycode),
        }
    }
}

fn is_escape_press(input: &KeyboardInput) -> bool {
    input.state == ElementState::Pressed && input.virtual_keycode == Some(VirtualKeyCode::Escape)
}

fn map_keycode(code: VirtualKeyCode) -> Option<KeyCode> {
    use VirtualKeyCode as Key;
    Some(match code {
        Key::Space => KeyCode::Named(NamedKey::Space),
        Key::Escape => KeyCode::Named(NamedKey::Escape),
        Key::LShift => KeyCode::Named(NamedKey::LeftShift),
        Key::RShift => KeyCode::Named(NamedKey::RightShift),
        Key::LControl => KeyCode::Named(NamedKey::LeftCtrl),
        Key::Up => KeyCode::Named(NamedKey::Up),
        Key::Down => KeyCode::Named(NamedKey::Down),
        Key::Left => KeyCode::Named(NamedKey::Left),
        Key::Right => KeyCode::Named(NamedKey::Right),
        Key::A => KeyCode::Character('A'),
        Key::B => KeyCode::Character('B'),
        Key::C => KeyCode::Character('C'),
        Key::D => KeyCode::Character('D'),
        Key::E => KeyCode::Character('E'),
        Key::F => KeyCode::Character('F'),
        Key::G => KeyCode::Character('G'),
        Key::H => KeyCode::Character('H'),
        Key::I => KeyCode::Character('I'),
        Key::J => KeyCode::Character('J'),
        Key::K => KeyCode::Character('K'),
        Key::L => KeyCode::Character('L'),
        Key::M => KeyCode::Character('M'),
        Key::N => KeyCode::Character('N'),
        Key::O => KeyCode::Character('O'),
        Key::P => KeyCode::Character('P'),
        Key::Q => KeyCode::Character('Q'),
        Key::R => KeyCode::Character('R'),
        Key::S => KeyCode::Character('S'),
        Key::T => KeyCode::Character('T'),
        Key::U => KeyCode::Character('U'),
        Key::V => KeyCode::Character('V'),
        Key::W => KeyCode::Character('W'),
        Key::X => KeyCode::Character('X'),
        Key::Y => KeyCode::Character('Y'),
        Key::Z => KeyCode::Character('Z'),
        _ => return None,
    })
}

struct CliOptions {
    path: String,
    summary_only: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: learngl-camera <scene.xml> [--summary-only]"
            ));
        };
        let mut summary_only = false;
        for arg in args {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --summary-only"
                    ));
                }
            }
        }
        Ok(Self { path, summary_only })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_quietly_reports_panics_as_unavailable_host() {
        let err = init_quietly("event loop", || -> u32 { panic!("no display on {}", ":0") })
            .unwrap_err();
        assert_eq!(err.stage, "event loop");
        assert_eq!(
            err.to_string(),
            "no GL window available (event loop): no display on :0"
        );

        let err = init_quietly("GL config", || -> u32 { panic!("no GL config matched") })
            .unwrap_err();
        assert_eq!(err.reason, "no GL config matched");

        assert_eq!(init_quietly("window", || 7).unwrap(), 7);
    }

    #[test]
    fn unavailable_host_is_recognised_through_anyhow() {
        let err: anyhow::Error = HostUnavailable::new("GL surface", "bad visual").into();
        assert!(err.downcast_ref::<HostUnavailable>().is_some());
    }
}
