use {
    crate::gl::Gl,
    glam::{Mat4, Vec2, Vec3},
    std::fmt,
};

/// GLSL type of an active uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    Bool,
    BoolVec2,
    BoolVec3,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Sampler,
    Other(u32),
}

impl UniformKind {
    pub fn from_gl(utype: u32) -> Self {
        match utype {
            glow::INT => Self::Int,
            glow::BOOL => Self::Bool,
            glow::BOOL_VEC2 => Self::BoolVec2,
            glow::BOOL_VEC3 => Self::BoolVec3,
            glow::FLOAT => Self::Float,
            glow::FLOAT_VEC2 => Self::Vec2,
            glow::FLOAT_VEC3 => Self::Vec3,
            glow::FLOAT_VEC4 => Self::Vec4,
            glow::FLOAT_MAT4 => Self::Mat4,
            glow::SAMPLER_1D
            | glow::SAMPLER_2D
            | glow::SAMPLER_3D
            | glow::SAMPLER_CUBE
            | glow::SAMPLER_2D_ARRAY
            | glow::SAMPLER_BUFFER
            | glow::INT_SAMPLER_2D
            | glow::UNSIGNED_INT_SAMPLER_2D => Self::Sampler,
            other => Self::Other(other),
        }
    }

    /// Parses a GLSL type keyword.
    pub fn from_glsl(ty: &str) -> Self {
        match ty {
            "int" => Self::Int,
            "bool" => Self::Bool,
            "bvec2" => Self::BoolVec2,
            "bvec3" => Self::BoolVec3,
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "mat4" => Self::Mat4,
            ty if ty.contains("sampler") => Self::Sampler,
            _ => Self::Other(0),
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::Bool => f.write_str("bool"),
            Self::BoolVec2 => f.write_str("bvec2"),
            Self::BoolVec3 => f.write_str("bvec3"),
            Self::Float => f.write_str("float"),
            Self::Vec2 => f.write_str("vec2"),
            Self::Vec3 => f.write_str("vec3"),
            Self::Vec4 => f.write_str("vec4"),
            Self::Mat4 => f.write_str("mat4"),
            Self::Sampler => f.write_str("sampler"),
            Self::Other(utype) => write!(f, "GL type {utype:#06x}"),
        }
    }
}

/// A cached active uniform.
#[derive(Debug, Clone)]
pub struct UniformInfo<L> {
    pub location: L,
    pub kind: UniformKind,
    pub size: i32,
}

/// A host value that can be written to a uniform.
pub trait Uniform {
    /// The GLSL type this value is normally written to.
    const KIND: UniformKind;

    /// Whether the value may be written to a uniform declared as `kind`.
    fn accepts(kind: UniformKind) -> bool {
        kind == Self::KIND
    }

    fn upload<G: Gl>(&self, gl: &G, location: &G::UniformLocation);
}

impl Uniform for i32 {
    const KIND: UniformKind = UniformKind::Int;

    // glUniform1i also drives bools and texture units.
    fn accepts(kind: UniformKind) -> bool {
        matches!(kind, UniformKind::Int | UniformKind::Bool | UniformKind::Sampler)
    }

    fn upload<G: Gl>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_1_i32(location, *self)
    }
}

impl Uniform for f32 {
    const KIND: UniformKind = UniformKind::Float;

    // Bools take either glUniform*i or glUniform*f; nonzero is true.
    fn accepts(kind: UniformKind) -> bool {
        matches!(kind, UniformKind::Float | UniformKind::Bool)
    }

    fn upload<G: Gl>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_1_f32(location, *self)
    }
}

impl Uniform for Vec2 {
    const KIND: UniformKind = UniformKind::Vec2;

    fn accepts(kind: UniformKind) -> bool {
        matches!(kind, UniformKind::Vec2 | UniformKind::BoolVec2)
    }

    fn upload<G: Gl>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_2_f32(location, self.x, self.y)
    }
}

impl Uniform for Vec3 {
    const KIND: UniformKind = UniformKind::Vec3;

    fn accepts(kind: UniformKind) -> bool {
        matches!(kind, UniformKind::Vec3 | UniformKind::BoolVec3)
    }

    fn upload<G: Gl>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_3_f32(location, self.x, self.y, self.z)
    }
}

impl Uniform for Mat4 {
    const KIND: UniformKind = UniformKind::Mat4;

    fn upload<G: Gl>(&self, gl: &G, location: &G::UniformLocation) {
        gl.uniform_matrix_4_f32(location, &self.to_cols_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gl_enums_map_to_kinds() {
        assert_eq!(UniformKind::from_gl(glow::FLOAT_VEC3), UniformKind::Vec3);
        assert_eq!(UniformKind::from_gl(glow::SAMPLER_2D), UniformKind::Sampler);
        assert_eq!(UniformKind::from_gl(glow::FLOAT_MAT3), UniformKind::Other(glow::FLOAT_MAT3));
    }

    #[test]
    fn glsl_keywords_map_to_kinds() {
        assert_eq!(UniformKind::from_glsl("mat4"), UniformKind::Mat4);
        assert_eq!(UniformKind::from_glsl("sampler2D"), UniformKind::Sampler);
        assert_eq!(UniformKind::from_glsl("dvec3"), UniformKind::Other(0));
    }

    #[test]
    fn ints_drive_samplers_but_floats_do_not() {
        assert!(i32::accepts(UniformKind::Sampler));
        assert!(i32::accepts(UniformKind::Bool));
        assert!(!f32::accepts(UniformKind::Int));
        assert!(!Vec3::accepts(UniformKind::Vec2));
    }

    #[test]
    fn float_values_drive_bool_uniforms() {
        assert_eq!(UniformKind::from_gl(glow::BOOL_VEC2), UniformKind::BoolVec2);
        assert_eq!(UniformKind::from_glsl("bvec3"), UniformKind::BoolVec3);
        assert!(f32::accepts(UniformKind::Bool));
        assert!(Vec2::accepts(UniformKind::BoolVec2));
        assert!(Vec3::accepts(UniformKind::BoolVec3));
        assert!(!Vec2::accepts(UniformKind::BoolVec3));
        assert!(!Mat4::accepts(UniformKind::Bool));
    }
}
