use anyhow::{anyhow, bail, Context, Result};
use glow::HasContext;
use glutin::{
    config::ConfigTemplateBuilder,
    context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version},
    display::{GetGlDisplay, GlDisplay},
    prelude::*,
    surface::{Surface, SwapInterval, WindowSurface},
};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{error, info, warn, LevelFilter};
use raw_window_handle::HasRawWindowHandle;
use simple_logger::SimpleLogger;
use std::{num::NonZeroU32, rc::Rc};
use winit::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::{EventLoop, EventLoopBuilder},
    window::{Window, WindowBuilder},
};

use quadgl::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    QuadPipeline, ShaderProgramSource,
};

struct App {
    pipeline: Option<QuadPipeline<glow::Context>>,
    gl: Rc<glow::Context>,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

impl App {
    fn new(config: &AppConfig) -> Result<(Self, EventLoop<()>)> {
        let event_loop = EventLoopBuilder::new()
            .build()
            .map_err(|e| anyhow!("Failed to initialize the window system: {e}"))?;

        let window_builder = WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height));

        let template = ConfigTemplateBuilder::new().with_alpha_size(8);
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    .unwrap_or_else(|| {
                        error!("Display offered no framebuffer configs");
                        std::process::exit(-1)
                    })
            })
            .map_err(|e| anyhow!("Failed to create window: {e}"))?;
        let window = window.context("Failed to create window")?;

        let requested = Version::new(config.window.gl_major, config.window.gl_minor);
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(requested)))
            .with_profile(GlProfile::Core)
            .build(Some(window.raw_window_handle()));

        let gl_display = gl_config.display();
        let gl_context = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("Failed to create OpenGL context")?;

        let attrs = window.build_surface_attributes(<_>::default());
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
            .context("Failed to create GL surface")?;

        let gl_context = gl_context
            .make_current(&gl_surface)
            .context("Failed to make context current")?;

        let interval = if config.window.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = gl_surface.set_swap_interval(&gl_context, interval) {
            warn!("Failed to set swap interval: {}", e);
        }

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|symbol| gl_display.get_proc_address(symbol))
        };

        let version = gl.version();
        info!(
            "OpenGL {}.{} {}",
            version.major, version.minor, version.vendor_info
        );
        let wanted = (config.window.gl_major as u32, config.window.gl_minor as u32);
        if (version.major, version.minor) < wanted {
            bail!(
                "OpenGL {}.{} is required, the driver provides {}.{}",
                wanted.0,
                wanted.1,
                version.major,
                version.minor
            );
        }

        let gl = Rc::new(gl);
        let source = ShaderProgramSource::load(&config.shader_path)
            .context("Failed to load shader source")?;
        let pipeline = QuadPipeline::new(gl.clone(), &source, &config.render)
            .context("Failed to set up quad pipeline")?;

        let size = window.inner_size();
        pipeline.resize(size.width, size.height);

        Ok((
            Self {
                pipeline: Some(pipeline),
                gl,
                gl_surface,
                gl_context,
                window,
            },
            event_loop,
        ))
    }

    /// Returns `true` once the window should close.
    fn handle_window_event(&mut self, event: &WindowEvent) -> Result<bool> {
        match event {
            WindowEvent::CloseRequested => Ok(true),
            WindowEvent::Resized(size) => {
                if let (Some(width), Some(height)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                {
                    self.gl_surface.resize(&self.gl_context, width, height);
                    if let Some(pipeline) = &self.pipeline {
                        pipeline.resize(size.width, size.height);
                    }
                }
                Ok(false)
            }
            WindowEvent::RedrawRequested => {
                self.render()?;
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn render(&mut self) -> Result<()> {
        if let Some(pipeline) = &mut self.pipeline {
            pipeline.render_frame().context("Failed to render frame")?;
        }
        self.gl_surface
            .swap_buffers(&self.gl_context)
            .context("Failed to swap buffers")?;
        Ok(())
    }

    /// Releases GPU objects while the context is still current.
    fn cleanup(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            let stats = pipeline.stats();
            info!(
                "Rendered {} frames ({} draw calls)",
                stats.frames, stats.draw_calls
            );
        }
        info!(
            "Releasing GL context ({} references)",
            Rc::strong_count(&self.gl)
        );
    }
}

fn run() -> Result<()> {
    let config = AppConfig::load(DEFAULT_CONFIG_PATH)?;
    let (mut app, event_loop) = App::new(&config)?;

    let mut failure = None;
    event_loop
        .run(|event, elwt| match event {
            Event::WindowEvent { event, .. } => match app.handle_window_event(&event) {
                Ok(false) => (),
                Ok(true) => {
                    app.cleanup();
                    elwt.exit();
                }
                Err(e) => {
                    failure = Some(e);
                    app.cleanup();
                    elwt.exit();
                }
            },
            Event::AboutToWait => app.window.request_redraw(),
            _ => (),
        })
        .map_err(|e| anyhow!("Event loop terminated abnormally: {e}"))?;

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Info).init() {
        eprintln!("Failed to initialize logger: {e}");
        std::process::exit(-1);
    }

    info!("Initializing application...");
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(-1);
    }
}
