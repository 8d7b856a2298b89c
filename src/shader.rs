use {
    crate::{
        config::ShaderPaths,
        error::{diagnostic, Result, ShaderError},
        gl::{Gl, Stage},
        uniform::{Uniform, UniformInfo},
    },
    glam::{Mat4, Vec2, Vec3},
    std::{collections::HashMap, fs, path::Path, rc::Rc},
};

/// Vertex and fragment source text.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self { vertex: vertex.into(), fragment: fragment.into() }
    }

    pub fn load(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> Result<Self> {
        Ok(Self { vertex: read(vertex.as_ref())?, fragment: read(fragment.as_ref())? })
    }

    /// Replaces each stage that `paths` names with the contents of that file.
    pub fn with_overrides(self, paths: &ShaderPaths) -> Result<Self> {
        if paths.is_builtin() {
            return Ok(self);
        }
        if let (Some(vertex), Some(fragment)) = (&paths.vertex, &paths.fragment) {
            return Self::load(vertex, fragment);
        }
        Ok(Self {
            vertex: paths.vertex.as_deref().map_or(Ok(self.vertex), read)?,
            fragment: paths.fragment.as_deref().map_or(Ok(self.fragment), read)?,
        })
    }
}

fn read(path: &Path) -> Result<String> {
    log::debug!("reading shader source {}", path.display());
    fs::read_to_string(path).map_err(|source| ShaderError::Io { path: path.to_owned(), source })
}

/// A linked vertex + fragment program and its active uniforms.
///
/// The program object is deleted when this value is dropped. The context is
/// shared through `Rc`, so a `ShaderProgram` never leaves the thread that owns
/// the context.
pub struct ShaderProgram<G: Gl> {
    gl: Rc<G>,
    handle: G::Program,
    uniforms: HashMap<String, UniformInfo<G::UniformLocation>>,
}

impl<G: Gl> ShaderProgram<G> {
    pub fn new(gl: Rc<G>, vertex: &str, fragment: &str) -> Result<Self> {
        let vs = compile(&*gl, Stage::Vertex, vertex)?;
        let fs = match compile(&*gl, Stage::Fragment, fragment) {
            Ok(fs) => fs,
            Err(err) => {
                gl.delete_shader(vs);
                return Err(err);
            }
        };

        let linked = link(&*gl, vs, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
        let handle = linked?;

        let uniforms = active_uniforms(&*gl, handle);
        log::info!("linked program {handle:?} with {} active uniforms", uniforms.len());
        Ok(Self { gl, handle, uniforms })
    }

    pub fn from_source(gl: Rc<G>, source: &ShaderSource) -> Result<Self> {
        Self::new(gl, &source.vertex, &source.fragment)
    }

    pub fn from_files(
        gl: Rc<G>,
        vertex: impl AsRef<Path>,
        fragment: impl AsRef<Path>,
    ) -> Result<Self> {
        Self::from_source(gl, &ShaderSource::load(vertex, fragment)?)
    }

    pub fn handle(&self) -> G::Program {
        self.handle
    }

    pub fn use_program(&self) {
        self.gl.use_program(Some(self.handle));
    }

    /// Not cached; `None` when `name` is not an active vertex input.
    pub fn attrib_location(&self, name: &str) -> Option<u32> {
        self.gl.attrib_location(self.handle, name)
    }

    pub fn uniform(&self, name: &str) -> Result<&UniformInfo<G::UniformLocation>> {
        self.uniforms.get(name).ok_or_else(|| ShaderError::UnknownUniform(name.to_owned()))
    }

    pub fn location(&self, name: &str) -> Result<&G::UniformLocation> {
        self.uniform(name).map(|info| &info.location)
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    pub fn uniform_count(&self) -> usize {
        self.uniforms.len()
    }

    pub fn uniforms(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }

    /// Binds this program, then writes `value` to `name`.
    ///
    /// Leaves this program bound, whatever was bound before the call.
    pub fn set<U: Uniform>(&self, name: &str, value: U) -> Result<()> {
        let info = self.uniform(name)?;
        if !U::accepts(info.kind) {
            return Err(ShaderError::UniformType {
                name: name.to_owned(),
                expected: U::KIND,
                found: info.kind,
            });
        }
        self.use_program();
        value.upload(&*self.gl, &info.location);
        Ok(())
    }

    pub fn set_int(&self, name: &str, value: i32) -> Result<()> {
        self.set(name, value)
    }

    pub fn set_float(&self, name: &str, value: f32) -> Result<()> {
        self.set(name, value)
    }

    pub fn set_matrix4(&self, name: &str, value: Mat4) -> Result<()> {
        self.set(name, value)
    }

    pub fn set_vector2(&self, name: &str, value: Vec2) -> Result<()> {
        self.set(name, value)
    }

    pub fn set_vector3(&self, name: &str, value: Vec3) -> Result<()> {
        self.set(name, value)
    }
}

impl<G: Gl> Drop for ShaderProgram<G> {
    fn drop(&mut self) {
        log::debug!("deleting program {:?}", self.handle);
        self.gl.delete_program(self.handle);
    }
}

fn compile<G: Gl>(gl: &G, stage: Stage, source: &str) -> Result<G::Shader> {
    let shader = gl.create_shader(stage).map_err(|err| ShaderError::CreateShader(stage, err))?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if !gl.shader_compile_status(shader) {
        let log = diagnostic(gl.shader_info_log(shader));
        gl.delete_shader(shader);
        log::error!("{stage} shader failed to compile: {log}");
        return Err(ShaderError::Compile { stage, log });
    }

    let log = gl.shader_info_log(shader);
    if !log.trim().is_empty() {
        log::warn!("{stage} shader compiled with warnings: {}", log.trim_end());
    }
    log::debug!("compiled {stage} shader {shader:?}");
    Ok(shader)
}

/// Links `vs` and `fs` into a new program. The shaders are detached again
/// either way; deleting them is the caller's job.
fn link<G: Gl>(gl: &G, vs: G::Shader, fs: G::Shader) -> Result<G::Program> {
    let program = gl.create_program().map_err(ShaderError::CreateProgram)?;
    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);
    gl.detach_shader(program, vs);
    gl.detach_shader(program, fs);

    if !gl.program_link_status(program) {
        let log = diagnostic(gl.program_info_log(program));
        gl.delete_program(program);
        log::error!("program failed to link: {log}");
        return Err(ShaderError::Link { log });
    }

    let log = gl.program_info_log(program);
    if !log.trim().is_empty() {
        log::warn!("program linked with warnings: {}", log.trim_end());
    }
    Ok(program)
}

fn active_uniforms<G: Gl>(
    gl: &G,
    program: G::Program,
) -> HashMap<String, UniformInfo<G::UniformLocation>> {
    let count = gl.active_uniform_count(program);
    let mut uniforms = HashMap::with_capacity(count as usize);
    for index in 0..count {
        let Some(active) = gl.active_uniform(program, index) else { continue };
        // Uniforms inside named blocks have no location and are set through buffers.
        let Some(location) = gl.uniform_location(program, &active.name) else {
            log::debug!("uniform `{}` has no location, skipping", active.name);
            continue;
        };
        log::trace!("uniform `{}`: {} at {location:?}", active.name, active.kind);
        uniforms.insert(active.name, UniformInfo { location, kind: active.kind, size: active.size });
    }
    uniforms
}
