use {
    crate::{gl::Stage, uniform::UniformKind},
    std::{io, path::PathBuf},
    thiserror::Error,
};

pub type Result<T, E = ShaderError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("could not create {0} shader object: {1}")]
    CreateShader(Stage, String),
    #[error("could not create program object: {0}")]
    CreateProgram(String),
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: Stage, log: String },
    #[error("program failed to link:\n{log}")]
    Link { log: String },
    #[error("uniform `{0}` is not active in this program")]
    UnknownUniform(String),
    #[error("uniform `{name}` is declared {found}, cannot write {expected}")]
    UniformType { name: String, expected: UniformKind, found: UniformKind },
    #[error("could not read shader source {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub(crate) const EMPTY_LOG: &str = "no diagnostic output";

/// Drivers may legally return an empty info log on failure.
pub(crate) fn diagnostic(log: String) -> String {
    let trimmed = log.trim_end();
    if trimmed.is_empty() { EMPTY_LOG.to_owned() } else { trimmed.to_owned() }
}
