use {
    clap::{Parser, ValueEnum},
    glray::{ShaderPaths, WindowConfig},
    log::LevelFilter,
    std::path::PathBuf,
};

#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(name = "glray")]
#[command(about = "Opens a window and runs a fullscreen shader program")]
pub struct Args {
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,

    /// Window width in pixels
    #[arg(long, default_value_t = 900)]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 900)]
    pub height: u32,

    #[arg(long, default_value = "OpenGL RayTracing")]
    pub title: String,

    /// Request a compatibility profile instead of a forward-compatible core one
    #[arg(long)]
    pub compat: bool,

    #[arg(long)]
    pub no_vsync: bool,

    /// Vertex shader to use instead of the built-in one
    #[arg(long)]
    pub vertex: Option<PathBuf>,

    /// Fragment shader to use instead of the built-in one
    #[arg(long)]
    pub fragment: Option<PathBuf>,
}

impl Args {
    pub fn window(&self) -> WindowConfig {
        WindowConfig {
            width: self.width,
            height: self.height,
            title: self.title.clone(),
            forward_compatible: !self.compat,
            vsync: !self.no_vsync,
            ..WindowConfig::default()
        }
    }

    pub fn shaders(&self) -> ShaderPaths {
        ShaderPaths { vertex: self.vertex.clone(), fragment: self.fragment.clone() }
    }
}
