use {
    glam::{Mat4, Vec2, Vec3},
    glray::{
        gl::headless::{HeadlessGl, UniformValue},
        Gl, ShaderError, ShaderProgram, Stage, UniformKind,
    },
    rstest::rstest,
    std::rc::Rc,
};

const VERT: &str = "#version 330 core
layout(location = 0) in vec3 a_pos;
in vec2 a_uv;
in vec3 a_unused;
uniform mat4 u_mvp;
out vec2 v_uv;
void main() {
    v_uv = a_uv;
    gl_Position = u_mvp * vec4(a_pos, 1.0);
}
";

const FRAG: &str = "#version 330 core
in vec2 v_uv;
uniform int u_count;
uniform float u_time;
uniform vec2 u_resolution;
uniform vec3 u_camera;
uniform sampler2D u_accum;
uniform float u_declared_only;
out vec4 color;
void main() {
    vec3 acc = texture(u_accum, v_uv).rgb / float(u_count);
    color = vec4(acc + u_camera * u_time, u_resolution.x);
}
";

fn build(gl: &Rc<HeadlessGl>) -> ShaderProgram<HeadlessGl> {
    ShaderProgram::new(gl.clone(), VERT, FRAG).unwrap()
}

#[test]
fn valid_stages_link_into_nonzero_program() {
    let gl = Rc::new(HeadlessGl::new());
    let program = build(&gl);
    assert!(program.handle().get() > 0);
    assert!(gl.program_link_status(program.handle()));
    assert!(gl.errors().is_empty(), "{:?}", gl.errors());
}

#[rstest]
#[case::vertex_missing_semicolon(
    "#version 330 core\nvoid main() {\n    gl_Position = vec4(0.0)\n}\n",
    FRAG,
    Stage::Vertex
)]
#[case::fragment_unclosed_brace(VERT, "#version 330 core\nout vec4 color;\nvoid main() {\n", Stage::Fragment)]
#[case::fragment_missing_version(VERT, "out vec4 color;\nvoid main() {}\n", Stage::Fragment)]
fn syntax_errors_fail_at_compile(#[case] vert: &str, #[case] frag: &str, #[case] failing: Stage) {
    let gl = Rc::new(HeadlessGl::new());
    match ShaderProgram::new(gl.clone(), vert, frag) {
        Err(ShaderError::Compile { stage, log }) => {
            assert_eq!(stage, failing);
            assert!(!log.trim().is_empty());
        }
        Err(other) => panic!("expected a compile error, got {other}"),
        Ok(_) => panic!("expected a compile error"),
    }
    assert_eq!(gl.live_shaders(), 0);
    assert_eq!(gl.live_programs(), 0);
}

#[test]
fn compile_error_names_the_stage() {
    let gl = Rc::new(HeadlessGl::new());
    let err = ShaderProgram::new(gl, VERT, "void main() {}").err().unwrap();
    assert!(err.to_string().starts_with("fragment shader failed to compile"), "{err}");
}

#[test]
fn mismatched_varyings_fail_at_link() {
    let gl = Rc::new(HeadlessGl::new());
    let frag = FRAG.replace("v_uv", "v_texcoord");

    // each stage compiles on its own
    for (stage, src) in [(Stage::Vertex, VERT), (Stage::Fragment, frag.as_str())] {
        let shader = gl.create_shader(stage).unwrap();
        gl.shader_source(shader, src);
        gl.compile_shader(shader);
        assert!(gl.shader_compile_status(shader), "{}", gl.shader_info_log(shader));
        gl.delete_shader(shader);
    }

    match ShaderProgram::new(gl.clone(), VERT, &frag) {
        Err(ShaderError::Link { log }) => assert!(log.contains("v_texcoord"), "{log}"),
        Err(other) => panic!("expected a link error, got {other}"),
        Ok(_) => panic!("expected a link error"),
    }
    assert_eq!(gl.live_programs(), 0);
    assert_eq!(gl.live_shaders(), 0);
}

#[test]
fn varying_type_mismatch_fails_at_link() {
    let gl = Rc::new(HeadlessGl::new());
    let frag = FRAG.replace("in vec2 v_uv;", "in vec3 v_uv;").replace("v_uv).rgb", "v_uv.xy).rgb");
    let err = ShaderProgram::new(gl, VERT, &frag).err().unwrap();
    assert!(matches!(err, ShaderError::Link { .. }), "{err}");
}

#[test]
fn cache_holds_exactly_the_active_uniforms() {
    let gl = Rc::new(HeadlessGl::new());
    let program = build(&gl);

    let count = gl.active_uniform_count(program.handle()) as usize;
    assert_eq!(count, 6);
    assert_eq!(program.uniform_count(), count);

    let mut names: Vec<_> = program.uniforms().collect();
    names.sort_unstable();
    assert_eq!(names, ["u_accum", "u_camera", "u_count", "u_mvp", "u_resolution", "u_time"]);
    assert!(!program.has_uniform("u_declared_only"));
    assert_eq!(program.uniform("u_accum").unwrap().kind, UniformKind::Sampler);
}

#[test]
fn set_int_reaches_the_program() {
    let gl = Rc::new(HeadlessGl::new());
    let program = build(&gl);

    program.set_int("u_count", 5).unwrap();
    assert_eq!(gl.uniform_value(program.handle(), "u_count"), Some(UniformValue::Int(5)));
}

#[test]
fn every_setter_writes_its_value() {
    let gl = Rc::new(HeadlessGl::new());
    let program = build(&gl);
    let mvp = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

    program.set_float("u_time", 0.5).unwrap();
    program.set_vector2("u_resolution", Vec2::new(900.0, 900.0)).unwrap();
    program.set_vector3("u_camera", Vec3::Z).unwrap();
    program.set_matrix4("u_mvp", mvp).unwrap();
    program.set_int("u_accum", 0).unwrap();

    let value = |name| gl.uniform_value(program.handle(), name);
    assert_eq!(value("u_time"), Some(UniformValue::Float(0.5)));
    assert_eq!(value("u_resolution"), Some(UniformValue::Vec2([900.0, 900.0])));
    assert_eq!(value("u_camera"), Some(UniformValue::Vec3([0.0, 0.0, 1.0])));
    assert_eq!(value("u_mvp"), Some(UniformValue::Mat4(mvp.to_cols_array())));
    assert_eq!(value("u_accum"), Some(UniformValue::Int(0)));
    assert!(gl.errors().is_empty(), "{:?}", gl.errors());
}

#[test]
fn setters_rebind_their_program() {
    let gl = Rc::new(HeadlessGl::new());
    let first = build(&gl);
    let second = build(&gl);

    second.use_program();
    first.set_float("u_time", 1.0).unwrap();

    assert_eq!(gl.bound_program(), Some(first.handle()));
    assert_eq!(gl.uniform_value(first.handle(), "u_time"), Some(UniformValue::Float(1.0)));
    assert_eq!(gl.uniform_value(second.handle(), "u_time"), None);
    assert!(gl.errors().is_empty(), "{:?}", gl.errors());
}

#[test]
fn unknown_uniform_is_an_error_not_a_fault() {
    let gl = Rc::new(HeadlessGl::new());
    let program = build(&gl);

    for name in ["u_missing", "u_declared_only"] {
        match program.set_float(name, 1.0) {
            Err(ShaderError::UnknownUniform(got)) => assert_eq!(got, name),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert!(program.location("u_missing").is_err());
}

#[test]
fn wrong_value_type_writes_nothing() {
    let gl = Rc::new(HeadlessGl::new());
    let program = build(&gl);

    let err = program.set_float("u_count", 5.0).unwrap_err();
    assert!(matches!(
        err,
        ShaderError::UniformType { expected: UniformKind::Float, found: UniformKind::Int, .. }
    ));
    assert_eq!(gl.uniform_value(program.handle(), "u_count"), None);
}

#[test]
fn float_setters_write_bool_uniforms() {
    let gl = Rc::new(HeadlessGl::new());
    let frag = "#version 330 core
in vec2 v_uv;
uniform bool u_flag;
uniform bvec2 u_mirror;
uniform bvec3 u_channels;
out vec4 color;
void main() {
    vec3 c = u_channels.x ? vec3(v_uv, 1.0) : vec3(0.0);
    if (u_flag && u_mirror.y) c = c.zyx;
    color = vec4(c, 1.0);
}
";
    let program = ShaderProgram::new(gl.clone(), VERT, frag).unwrap();
    assert_eq!(program.uniform("u_flag").unwrap().kind, UniformKind::Bool);

    program.set_float("u_flag", 1.0).unwrap();
    program.set_vector2("u_mirror", Vec2::new(0.0, 1.0)).unwrap();
    program.set_vector3("u_channels", Vec3::X).unwrap();

    let value = |name| gl.uniform_value(program.handle(), name);
    assert_eq!(value("u_flag"), Some(UniformValue::Float(1.0)));
    assert_eq!(value("u_mirror"), Some(UniformValue::Vec2([0.0, 1.0])));
    assert_eq!(value("u_channels"), Some(UniformValue::Vec3([1.0, 0.0, 0.0])));
    assert!(gl.errors().is_empty(), "{:?}", gl.errors());

    let err = program.set_vector2("u_channels", Vec2::ONE).unwrap_err();
    assert!(matches!(
        err,
        ShaderError::UniformType { expected: UniformKind::Vec2, found: UniformKind::BoolVec3, .. }
    ));
}

#[rstest]
#[case("a_pos", Some(0))]
#[case("a_uv", Some(1))]
#[case("a_unused", None)]
#[case("a_normal", None)]
fn attrib_locations(#[case] name: &str, #[case] expected: Option<u32>) {
    let gl = Rc::new(HeadlessGl::new());
    let program = build(&gl);
    assert_eq!(program.attrib_location(name), expected);
}

#[test]
fn drop_deletes_the_program_once() {
    let gl = Rc::new(HeadlessGl::new());
    let program = build(&gl);
    let handle = program.handle();
    program.use_program();

    drop(program);

    assert!(!gl.is_program(handle));
    assert_eq!(gl.deletions(handle), 1);
    assert_eq!(gl.bound_program(), None);
    assert_eq!(gl.live_programs(), 0);
}

#[test]
fn shipped_screen_shaders_link() {
    let gl = Rc::new(HeadlessGl::new());
    let program = ShaderProgram::from_files(
        gl,
        concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/screen.vert"),
        concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/screen.frag"),
    )
    .unwrap();

    let mut names: Vec<_> = program.uniforms().collect();
    names.sort_unstable();
    assert_eq!(names, ["u_resolution", "u_time"]);
    assert_eq!(program.attrib_location("gl_VertexID"), None);
}
