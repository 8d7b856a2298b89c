//! A [`Gl`] backend with no GPU behind it.
//!
//! It reads shader sources for their interface, links stages the way a
//! driver would, and records object lifetimes, the bound program and every
//! uniform write so tests can inspect them afterwards.

mod glsl;

use {
    super::{ActiveUniform, Gl, Stage},
    crate::uniform::UniformKind,
    std::{
        cell::RefCell,
        collections::{BTreeMap, HashMap},
        num::NonZeroU32,
    },
};

pub type Object = NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessLocation {
    program: Object,
    index: u32,
}

/// A value written through one of the `uniform_*` calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Mat4([f32; 16]),
}

impl UniformValue {
    fn fits(&self, kind: UniformKind) -> bool {
        match self {
            Self::Int(_) => matches!(kind, UniformKind::Int | UniformKind::Bool | UniformKind::Sampler),
            Self::Float(_) => matches!(kind, UniformKind::Float | UniformKind::Bool),
            Self::Vec2(_) => matches!(kind, UniformKind::Vec2 | UniformKind::BoolVec2),
            Self::Vec3(_) => matches!(kind, UniformKind::Vec3 | UniformKind::BoolVec3),
            Self::Mat4(_) => kind == UniformKind::Mat4,
        }
    }
}

struct ShaderObject {
    stage: Stage,
    source: String,
    unit: Option<glsl::Unit>,
    log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<Object>,
    linked: bool,
    log: String,
    uniforms: Vec<ActiveUniform>,
    attribs: HashMap<String, u32>,
    values: HashMap<u32, UniformValue>,
}

#[derive(Default)]
struct State {
    next: u32,
    shaders: BTreeMap<Object, ShaderObject>,
    programs: BTreeMap<Object, ProgramObject>,
    bound: Option<Object>,
    deletions: HashMap<Object, usize>,
    errors: Vec<String>,
}

impl State {
    fn alloc(&mut self) -> Object {
        self.next += 1;
        // starts at 1 and only grows
        NonZeroU32::MIN.saturating_add(self.next - 1)
    }

    fn error(&mut self, msg: String) {
        log::debug!("headless gl: {msg}");
        self.errors.push(msg);
    }
}

#[derive(Default)]
pub struct HeadlessGl {
    state: RefCell<State>,
}

impl HeadlessGl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn is_program(&self, program: Object) -> bool {
        self.state.borrow().programs.contains_key(&program)
    }

    /// How many times `delete_program` or `delete_shader` was called for `object`.
    pub fn deletions(&self, object: Object) -> usize {
        self.state.borrow().deletions.get(&object).copied().unwrap_or(0)
    }

    pub fn bound_program(&self) -> Option<Object> {
        self.state.borrow().bound
    }

    /// The last value written to `name` in `program`.
    pub fn uniform_value(&self, program: Object, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let program = state.programs.get(&program)?;
        let index = find_uniform(&program.uniforms, name)?;
        program.values.get(&index).copied()
    }

    /// Calls the driver would have flagged with `glGetError`.
    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    fn write(&self, location: &HeadlessLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        if state.bound != Some(location.program) {
            let bound = state.bound;
            state.error(format!(
                "GL_INVALID_OPERATION: location of program {} written while {bound:?} is bound",
                location.program
            ));
            return;
        }
        let Some(program) = state.programs.get_mut(&location.program) else {
            return state.error(format!("GL_INVALID_OPERATION: program {} is gone", location.program));
        };
        let Some(uniform) = program.uniforms.get(location.index as usize) else {
            return state.error(format!("GL_INVALID_OPERATION: no uniform at {}", location.index));
        };
        if !value.fits(uniform.kind) {
            let msg = format!("GL_INVALID_OPERATION: {value:?} written to {} `{}`", uniform.kind, uniform.name);
            return state.error(msg);
        }
        program.values.insert(location.index, value);
    }
}

fn find_uniform(uniforms: &[ActiveUniform], name: &str) -> Option<u32> {
    // `arr` and `arr[0]` both address the first element
    uniforms
        .iter()
        .position(|u| u.name == name || u.name.strip_suffix("[0]") == Some(name))
        .map(|index| index as u32)
}

type Interface = (Vec<ActiveUniform>, HashMap<String, u32>);

/// Links the compiled units, returning active uniforms and attribute slots.
fn link(vertex: &glsl::Unit, fragment: &glsl::Unit) -> Result<Interface, String> {
    for (stage, unit) in [(Stage::Vertex, vertex), (Stage::Fragment, fragment)] {
        if !unit.has_main {
            return Err(format!("error: {stage} shader lacks `main'"));
        }
    }

    for input in &fragment.inputs {
        match vertex.outputs.iter().find(|out| out.name == input.name) {
            None if input.used => {
                return Err(format!(
                    "error: fragment shader input `{}' has no matching vertex shader output",
                    input.name
                ));
            }
            Some(out) if out.ty != input.ty || out.array != input.array => {
                return Err(format!(
                    "error: `{}' declared as {} in vertex shader and {} in fragment shader",
                    input.name, out.ty, input.ty
                ));
            }
            _ => {}
        }
    }

    let mut uniforms: Vec<ActiveUniform> = Vec::new();
    let mut declared: HashMap<&str, &glsl::Decl> = HashMap::new();
    for decl in vertex.uniforms.iter().chain(&fragment.uniforms) {
        if let Some(prev) = declared.insert(&decl.name, decl) {
            if prev.ty != decl.ty || prev.array != decl.array {
                return Err(format!("error: uniform `{}' declared with conflicting types", decl.name));
            }
        }
        let name = match decl.array {
            Some(_) => format!("{}[0]", decl.name),
            None => decl.name.clone(),
        };
        if decl.used && !uniforms.iter().any(|u| u.name == name) {
            let kind = UniformKind::from_glsl(&decl.ty);
            uniforms.push(ActiveUniform { name, kind, size: decl.array.unwrap_or(1) });
        }
    }

    let mut attribs = HashMap::new();
    let explicit: Vec<u32> = vertex.inputs.iter().filter_map(|d| d.location).collect();
    let mut next = 0;
    for input in vertex.inputs.iter().filter(|d| d.used) {
        let slot = match input.location {
            Some(slot) => slot,
            None => {
                while explicit.contains(&next) {
                    next += 1;
                }
                next += 1;
                next - 1
            }
        };
        attribs.insert(input.name.clone(), slot);
    }

    Ok((uniforms, attribs))
}

impl Gl for HeadlessGl {
    type Shader = Object;
    type Program = Object;
    type UniformLocation = HeadlessLocation;

    fn create_shader(&self, stage: Stage) -> Result<Object, String> {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        let shader = ShaderObject { stage, source: String::new(), unit: None, log: String::new() };
        state.shaders.insert(id, shader);
        Ok(id)
    }

    fn shader_source(&self, shader: Object, source: &str) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader) {
            Some(obj) => obj.source = source.to_owned(),
            None => state.error(format!("GL_INVALID_VALUE: no shader {shader}")),
        }
    }

    fn compile_shader(&self, shader: Object) {
        let mut state = self.state.borrow_mut();
        let Some(obj) = state.shaders.get_mut(&shader) else {
            return state.error(format!("GL_INVALID_VALUE: no shader {shader}"));
        };
        match glsl::parse(obj.stage, &obj.source) {
            Ok(unit) => {
                obj.unit = Some(unit);
                obj.log.clear();
            }
            Err(log) => {
                obj.unit = None;
                obj.log = log;
            }
        }
    }

    fn shader_compile_status(&self, shader: Object) -> bool {
        self.state.borrow().shaders.get(&shader).is_some_and(|obj| obj.unit.is_some())
    }

    fn shader_info_log(&self, shader: Object) -> String {
        self.state.borrow().shaders.get(&shader).map(|obj| obj.log.clone()).unwrap_or_default()
    }

    fn delete_shader(&self, shader: Object) {
        let mut state = self.state.borrow_mut();
        *state.deletions.entry(shader).or_default() += 1;
        if state.shaders.remove(&shader).is_none() {
            state.error(format!("GL_INVALID_VALUE: no shader {shader}"));
        }
    }

    fn create_program(&self) -> Result<Object, String> {
        let mut state = self.state.borrow_mut();
        let id = state.alloc();
        state.programs.insert(id, ProgramObject::default());
        Ok(id)
    }

    fn attach_shader(&self, program: Object, shader: Object) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            return state.error(format!("GL_INVALID_VALUE: no shader {shader}"));
        }
        let Some(obj) = state.programs.get_mut(&program) else {
            return state.error(format!("GL_INVALID_VALUE: no program {program}"));
        };
        if obj.attached.contains(&shader) {
            return state.error(format!("GL_INVALID_OPERATION: shader {shader} already attached"));
        }
        obj.attached.push(shader);
    }

    fn detach_shader(&self, program: Object, shader: Object) {
        let mut state = self.state.borrow_mut();
        let Some(obj) = state.programs.get_mut(&program) else {
            return state.error(format!("GL_INVALID_VALUE: no program {program}"));
        };
        if !obj.attached.contains(&shader) {
            return state.error(format!("GL_INVALID_OPERATION: shader {shader} not attached"));
        }
        obj.attached.retain(|&s| s != shader);
    }

    fn link_program(&self, program: Object) {
        let mut state = self.state.borrow_mut();
        let Some(obj) = state.programs.get(&program) else {
            return state.error(format!("GL_INVALID_VALUE: no program {program}"));
        };

        let unit = |stage: Stage| {
            let mut attached = obj.attached.iter().filter_map(|id| state.shaders.get(id));
            match attached.find(|s| s.stage == stage) {
                Some(ShaderObject { unit: Some(compiled), .. }) => Ok(compiled),
                Some(_) => Err(format!("error: {stage} shader is not compiled")),
                None => Err(format!("error: no {stage} shader attached")),
            }
        };
        let result = unit(Stage::Vertex)
            .and_then(|vs| Ok((vs, unit(Stage::Fragment)?)))
            .and_then(|(vs, fs)| link(vs, fs));

        let Some(obj) = state.programs.get_mut(&program) else { return };
        match result {
            Ok((uniforms, attribs)) => {
                let attached = std::mem::take(&mut obj.attached);
                *obj = ProgramObject { attached, linked: true, uniforms, attribs, ..Default::default() };
            }
            Err(log) => {
                obj.linked = false;
                obj.log = log;
                obj.uniforms.clear();
                obj.attribs.clear();
            }
        }
    }

    fn program_link_status(&self, program: Object) -> bool {
        self.state.borrow().programs.get(&program).is_some_and(|obj| obj.linked)
    }

    fn program_info_log(&self, program: Object) -> String {
        self.state.borrow().programs.get(&program).map(|obj| obj.log.clone()).unwrap_or_default()
    }

    fn delete_program(&self, program: Object) {
        let mut state = self.state.borrow_mut();
        *state.deletions.entry(program).or_default() += 1;
        if state.programs.remove(&program).is_none() {
            return state.error(format!("GL_INVALID_VALUE: no program {program}"));
        }
        if state.bound == Some(program) {
            state.bound = None;
        }
    }

    fn use_program(&self, program: Option<Object>) {
        let mut state = self.state.borrow_mut();
        match program {
            Some(id) if !state.programs.get(&id).is_some_and(|obj| obj.linked) => {
                state.error(format!("GL_INVALID_OPERATION: program {id} is not linked"))
            }
            program => state.bound = program,
        }
    }

    fn active_uniform_count(&self, program: Object) -> u32 {
        self.state.borrow().programs.get(&program).map_or(0, |obj| obj.uniforms.len() as u32)
    }

    fn active_uniform(&self, program: Object, index: u32) -> Option<ActiveUniform> {
        self.state.borrow().programs.get(&program)?.uniforms.get(index as usize).cloned()
    }

    fn uniform_location(&self, program: Object, name: &str) -> Option<HeadlessLocation> {
        let state = self.state.borrow();
        let index = find_uniform(&state.programs.get(&program)?.uniforms, name)?;
        Some(HeadlessLocation { program, index })
    }

    fn attrib_location(&self, program: Object, name: &str) -> Option<u32> {
        self.state.borrow().programs.get(&program)?.attribs.get(name).copied()
    }

    fn uniform_1_i32(&self, location: &HeadlessLocation, x: i32) {
        self.write(location, UniformValue::Int(x))
    }

    fn uniform_1_f32(&self, location: &HeadlessLocation, x: f32) {
        self.write(location, UniformValue::Float(x))
    }

    fn uniform_2_f32(&self, location: &HeadlessLocation, x: f32, y: f32) {
        self.write(location, UniformValue::Vec2([x, y]))
    }

    fn uniform_3_f32(&self, location: &HeadlessLocation, x: f32, y: f32, z: f32) {
        self.write(location, UniformValue::Vec3([x, y, z]))
    }

    fn uniform_matrix_4_f32(&self, location: &HeadlessLocation, columns: &[f32; 16]) {
        self.write(location, UniformValue::Mat4(*columns))
    }
}
