use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, NotCurrentGlContextSurfaceAccessor,
    PossiblyCurrentContext, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, WindowSurface};

use glutin_winit::DisplayBuilder;

use raw_window_handle::HasRawWindowHandle;

use std::ffi::CString;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use winit::dpi::{PhysicalSize, Size};
use winit::event::{ElementState, Event, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use gl_scene::scene::SceneError;
use gl_scene::{AnimationState, FrameRenderer, SceneKind, SceneObject};

use crate::args::Args;

pub struct App {
    event_loop: EventLoop<()>,
    gl_context: PossiblyCurrentContext,
    gl_window: GlWindow,
    scene: SceneObject,
    stop: Arc<AtomicBool>,
}

impl App {
    pub fn new(args: &Args) -> Result<Self, AppError> {
        let event_loop = EventLoop::new();
        let window_builder = WindowBuilder::new()
            .with_inner_size(Size::Physical(PhysicalSize::new(args.width, args.height)))
            .with_min_inner_size(Size::Physical(PhysicalSize::new(32, 32)))
            .with_title("Rotating scene");
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));
        let template = ConfigTemplateBuilder::new();

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |mut configs| configs.next().unwrap())
            .map_err(|e| AppError::Display(e.to_string()))?;

        let window = window.ok_or(AppError::NoWindow)?;

        let handle = window.raw_window_handle();
        let gl_display = gl_config.display();

        let context_attr = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(handle));

        let gl_window = GlWindow::new(window, &gl_config)?;

        let gl_context = unsafe { gl_display.create_context(&gl_config, &context_attr)? }
            .make_current(&gl_window.surface)?;

        gl::load_with(|s| {
            gl_display
                .get_proc_address(CString::new(s).unwrap().as_c_str())
                .cast()
        });

        let kind = SceneKind::from(args.scene);
        let texture_url = matches!(kind, SceneKind::Cube).then_some(args.texture_url.as_str());

        let scene = SceneObject::new(kind, texture_url)?;

        Ok(Self {
            event_loop,
            gl_context,
            gl_window,
            scene,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Raising this flag stops the render loop at the next iteration. Close
    /// request and Escape raise it internally; a host holding the clone can
    /// raise it from anywhere.
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn run(self) -> ! {
        let Self {
            event_loop,
            gl_context,
            gl_window,
            mut scene,
            stop,
        } = self;

        let mut renderer = FrameRenderer::new();
        let mut animation = AnimationState::new(scene.kind.rotation_wrap());

        let start = Instant::now();
        let mut then = 0.0_f32;

        event_loop.run(move |event, _window_target, control_flow| {
            *control_flow = ControlFlow::Poll;
            match event {
                Event::RedrawEventsCleared => {
                    if stop.load(Ordering::Relaxed) {
                        control_flow.set_exit();
                        return;
                    }

                    gl_window.window.request_redraw();
                }
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::Resized(size) => {
                        if size.width != 0 && size.height != 0 {
                            gl_window.surface.resize(
                                &gl_context,
                                NonZeroU32::new(size.width).unwrap(),
                                NonZeroU32::new(size.height).unwrap(),
                            );
                            renderer.resize(size.width, size.height);
                        }
                    }
                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.virtual_keycode == Some(VirtualKeyCode::Escape)
                            && input.state == ElementState::Pressed
                        {
                            stop.store(true, Ordering::Relaxed);
                        }
                    }
                    WindowEvent::CloseRequested => {
                        stop.store(true, Ordering::Relaxed);
                    }
                    _ => (),
                },
                Event::RedrawRequested(_) => {
                    // the fetch completes whenever it completes; frames
                    // before the handoff sample the placeholder
                    if let Some(texture) = &mut scene.texture {
                        texture.poll();
                    }

                    let now = start.elapsed().as_secs_f32();
                    let dt = now - then;
                    then = now;

                    let size = gl_window.window.inner_size();

                    match renderer.render_frame(&scene, (size.width, size.height), &mut animation, dt)
                    {
                        Ok(()) => {
                            gl_window.surface.swap_buffers(&gl_context).unwrap();
                        }
                        Err(e) => {
                            log::warn!("skipping frame: {e}");
                        }
                    }
                }
                _ => (),
            }
        })
    }
}

pub struct GlWindow {
    // XXX the surface must be dropped before the window.
    pub surface: Surface<WindowSurface>,
    pub window: Window,
}

impl GlWindow {
    pub fn new(window: Window, config: &Config) -> Result<Self, AppError> {
        let (width, height): (u32, u32) = window.inner_size().into();

        let (Some(width), Some(height)) = (NonZeroU32::new(width), NonZeroU32::new(height))
        else {
            return Err(AppError::ZeroSizeWindow);
        };

        let raw_window_handle = window.raw_window_handle();
        let attrs =
            SurfaceAttributesBuilder::<WindowSurface>::new().build(raw_window_handle, width, height);

        let surface = unsafe { config.display().create_window_surface(config, &attrs)? };

        Ok(Self { window, surface })
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not create a GL display: {0}")]
    Display(String),
    #[error("no window was created for the GL display")]
    NoWindow,
    #[error("window reported a zero-sized drawable at startup")]
    ZeroSizeWindow,
    #[error("could not create a GL context: {0}")]
    Context(#[from] glutin::error::Error),
    #[error("scene initialization failed: {0}")]
    Scene(#[from] SceneError),
}
