pub mod config;
pub mod error;
pub mod gl;
pub mod logger;
mod shader;
pub mod uniform;

pub use {
    config::{ShaderPaths, WindowConfig},
    error::{Result, ShaderError},
    gl::{Gl, Stage},
    shader::{ShaderProgram, ShaderSource},
    uniform::{Uniform, UniformInfo, UniformKind},
};
