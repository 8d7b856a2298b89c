use std::path::PathBuf;

/// Window and context settings for the harness.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Requested OpenGL core version, `(major, minor)`.
    pub gl_version: (u8, u8),
    pub forward_compatible: bool,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 900,
            height: 900,
            title: "OpenGL RayTracing".to_owned(),
            gl_version: (3, 3),
            forward_compatible: true,
            vsync: true,
        }
    }
}

/// Shader files to load instead of the built-in ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderPaths {
    pub vertex: Option<PathBuf>,
    pub fragment: Option<PathBuf>,
}

impl ShaderPaths {
    pub fn is_builtin(&self) -> bool {
        self.vertex.is_none() && self.fragment.is_none()
    }
}
