use {
    anyhow::{anyhow, Context as _},
    glam::Vec2,
    glow::HasContext,
    glray::{ShaderPaths, ShaderProgram, ShaderSource, WindowConfig},
    glutin::{
        config::{ConfigTemplateBuilder, GlConfig},
        context::{
            ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext,
            PossiblyCurrentContext, Version,
        },
        display::{Display, DisplayApiPreference, GlDisplay},
        surface::{GlSurface, Surface, SwapInterval, WindowSurface},
    },
    glutin_winit::GlWindow,
    std::{num::NonZeroU32, rc::Rc, time::Instant},
    winit::{
        application::ApplicationHandler,
        dpi::PhysicalSize,
        event::WindowEvent,
        event_loop::ActiveEventLoop,
        raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle},
        window::{Window, WindowAttributes, WindowId},
    },
};

const SCREEN_VERT: &str = include_str!("../shaders/screen.vert");
const SCREEN_FRAG: &str = include_str!("../shaders/screen.frag");

// Field order is drop order: the program goes while the context is still current.
struct Renderer {
    program: ShaderProgram<glow::Context>,
    vao: glow::VertexArray,
    gl: Rc<glow::Context>,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
}

impl Renderer {
    fn new(
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
        shaders: &ShaderPaths,
    ) -> anyhow::Result<Self> {
        let attributes = WindowAttributes::default()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize { width: config.width, height: config.height });
        let window = event_loop.create_window(attributes).context("failed to create window")?;
        let raw_window = window.window_handle()?.as_raw();
        let raw_display = window.display_handle()?.as_raw();

        let display = unsafe { Display::new(raw_display, display_preference(raw_window)) }?;
        let template = ConfigTemplateBuilder::new().compatible_with_native_window(raw_window).build();
        let gl_config = best_config(unsafe { display.find_configs(template) }?, |c| c.num_samples())
            .context("display offered no GL configs")?;

        let (major, minor) = config.gl_version;
        let profile = if config.forward_compatible { GlProfile::Core } else { GlProfile::Compatibility };
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .with_profile(profile)
            .build(Some(raw_window));

        let context = unsafe { display.create_context(&gl_config, &context_attributes) }
            .with_context(|| format!("OpenGL {major}.{minor} context unavailable"))?;
        let surface_attributes = window.build_surface_attributes(Default::default())?;
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }?;
        let context = context.make_current(&surface)?;

        let interval =
            if config.vsync { SwapInterval::Wait(NonZeroU32::MIN) } else { SwapInterval::DontWait };
        if let Err(err) = surface.set_swap_interval(&context, interval) {
            log::warn!("could not set swap interval: {err}");
        }

        let gl = Rc::new(unsafe {
            glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name))
        });
        log::info!("OpenGL {:?}", gl.version());

        let source = ShaderSource::new(SCREEN_VERT, SCREEN_FRAG).with_overrides(shaders)?;
        let program = ShaderProgram::from_source(gl.clone(), &source)?;
        let vao = unsafe { gl.create_vertex_array() }.map_err(|err| anyhow!(err))?;

        Ok(Self { program, vao, gl, surface, context, window })
    }

    fn resize(&self, size: PhysicalSize<u32>) {
        let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return;
        };
        self.surface.resize(&self.context, width, height);
        unsafe { self.gl.viewport(0, 0, size.width as i32, size.height as i32) };
    }

    fn draw(&self, seconds: f32) -> anyhow::Result<()> {
        let size = self.window.inner_size();
        self.program.use_program();
        self.program.set_vector2("u_resolution", Vec2::new(size.width as f32, size.height as f32))?;
        self.program.set_float("u_time", seconds)?;

        unsafe {
            self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.draw_arrays(glow::TRIANGLES, 0, 3);
        }
        self.surface.swap_buffers(&self.context)?;
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        unsafe { self.gl.delete_vertex_array(self.vao) };
    }
}

#[cfg(windows)]
fn display_preference(window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::WglThenEgl(Some(window))
}

#[cfg(target_os = "macos")]
fn display_preference(_: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(all(unix, not(target_os = "macos")))]
fn display_preference(_: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Egl
}

/// The config with the most samples, the first one on ties.
fn best_config<C>(configs: impl Iterator<Item = C>, samples: impl Fn(&C) -> u8) -> Option<C> {
    configs.reduce(|best, config| if samples(&config) > samples(&best) { config } else { best })
}

pub struct App {
    config: WindowConfig,
    shaders: ShaderPaths,
    renderer: Option<Renderer>,
    started: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: WindowConfig, shaders: ShaderPaths) -> Self {
        Self { config, shaders, renderer: None, started: Instant::now(), error: None }
    }

    /// The error that stopped the event loop, if any.
    pub fn finish(self) -> anyhow::Result<()> {
        self.error.map_or(Ok(()), Err)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        self.renderer = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        match Renderer::new(event_loop, &self.config, &self.shaders) {
            Ok(renderer) => {
                renderer.window.request_redraw();
                self.renderer = Some(renderer);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(renderer) = &self.renderer else { return };
        match event {
            WindowEvent::CloseRequested => {
                self.renderer = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => renderer.resize(size),
            WindowEvent::RedrawRequested => {
                match renderer.draw(self.started.elapsed().as_secs_f32()) {
                    Ok(()) => renderer.window.request_redraw(),
                    Err(err) => self.fail(event_loop, err),
                }
            }
            _ => {}
        }
    }
}
