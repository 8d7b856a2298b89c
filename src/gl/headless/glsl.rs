//! Just enough GLSL to find a shader's interface: the `#version` line,
//! delimiter balance, top-level `uniform`/`in`/`out` declarations, and which
//! of them the function bodies mention.

use crate::gl::Stage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub name: String,
    pub ty: String,
    pub array: Option<i32>,
    pub location: Option<u32>,
    pub used: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Unit {
    pub uniforms: Vec<Decl>,
    pub inputs: Vec<Decl>,
    pub outputs: Vec<Decl>,
    pub has_main: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Storage {
    Uniform,
    In,
    Out,
}

const QUALIFIERS: &[&str] = &[
    "const", "flat", "smooth", "noperspective", "centroid", "sample", "invariant", "highp",
    "mediump", "lowp",
];

/// Parses `source`, returning the driver-style info log on failure.
pub fn parse(stage: Stage, source: &str) -> Result<Unit, String> {
    let source = strip_comments(source);

    match source.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(line) if line.starts_with("#version") => {}
        _ => return Err(error(1, "missing #version directive")),
    }
    check_delimiters(&source)?;

    let mut unit = Unit::default();
    let mut bodies = String::new();
    let mut stmt = String::new();
    let mut stmt_line = 1;
    let mut line = 1;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => {
                line += 1;
                stmt.push(' ');
            }
            '#' if stmt.trim().is_empty() => {
                // preprocessor directive: skip to end of line
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            ';' => {
                declare(stage, stmt.trim(), stmt_line, &mut unit)?;
                stmt.clear();
            }
            '{' => {
                let header = std::mem::take(&mut stmt);
                if is_main(&header) {
                    unit.has_main = true;
                }
                let body = block(&mut chars, &mut line)?;
                bodies.push_str(&body);
                bodies.push('\n');
                // `struct S { ... } s;` keeps collecting up to the semicolon
                if header.trim_start().starts_with("struct") {
                    stmt.push_str("struct");
                }
            }
            c => {
                if stmt.trim().is_empty() {
                    stmt_line = line;
                }
                stmt.push(c);
            }
        }
    }

    if !stmt.trim().is_empty() {
        return Err(error(line, &format!("syntax error, unexpected end of file after `{}`", stmt.trim())));
    }

    for decl in unit.uniforms.iter_mut().chain(&mut unit.inputs).chain(&mut unit.outputs) {
        decl.used = mentions(&bodies, &decl.name);
    }
    Ok(unit)
}

fn error(line: usize, msg: &str) -> String {
    format!("0:{line}: error: {msg}")
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn check_delimiters(source: &str) -> Result<(), String> {
    let mut stack = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        for c in line.chars() {
            match c {
                '{' | '(' | '[' => stack.push((c, idx + 1)),
                '}' | ')' | ']' => {
                    let open = match c {
                        '}' => '{',
                        ')' => '(',
                        _ => '[',
                    };
                    match stack.pop() {
                        Some((top, _)) if top == open => {}
                        _ => return Err(error(idx + 1, &format!("syntax error, unexpected '{c}'"))),
                    }
                }
                _ => {}
            }
        }
    }
    match stack.pop() {
        Some((c, line)) => Err(error(line, &format!("unclosed '{c}'"))),
        None => Ok(()),
    }
}

/// Consumes a `{ ... }` block whose opening brace was already read.
fn block(chars: &mut impl Iterator<Item = char>, line: &mut usize) -> Result<String, String> {
    let mut body = String::new();
    let mut depth = 1;
    let mut last = '{';
    for c in chars {
        match c {
            '\n' => *line += 1,
            '{' => depth += 1,
            '}' => {
                if !matches!(last, ';' | '{' | '}') {
                    return Err(error(*line, "syntax error, unexpected '}', expecting ';'"));
                }
                depth -= 1;
                if depth == 0 {
                    return Ok(body);
                }
            }
            _ => {}
        }
        if !c.is_whitespace() {
            last = c;
        }
        body.push(c);
    }
    Err(error(*line, "unexpected end of file in block"))
}

fn is_main(header: &str) -> bool {
    let mut tokens = header.split(|c: char| c.is_whitespace() || c == '(').filter(|t| !t.is_empty());
    tokens.next() == Some("void") && tokens.next() == Some("main")
}

fn declare(stage: Stage, stmt: &str, line: usize, unit: &mut Unit) -> Result<(), String> {
    let (location, rest) = match stmt.strip_prefix("layout") {
        Some(rest) => {
            let rest = rest.trim_start();
            let close = rest.find(')').ok_or_else(|| error(line, "malformed layout qualifier"))?;
            (layout_location(&rest[..close]), &rest[close + 1..])
        }
        None => (None, stmt),
    };

    let mut tokens = rest.split_whitespace().filter(|t| !QUALIFIERS.contains(t)).peekable();
    let storage = match (tokens.peek().copied(), stage) {
        (Some("uniform"), _) => Storage::Uniform,
        (Some("in"), _) | (Some("attribute"), Stage::Vertex) | (Some("varying"), Stage::Fragment) => {
            Storage::In
        }
        (Some("out"), _) | (Some("varying"), Stage::Vertex) => Storage::Out,
        // precision statements, globals, struct definitions, interface blocks
        _ => return Ok(()),
    };
    tokens.next();

    let ty = tokens.next().ok_or_else(|| error(line, "declaration without a type"))?;
    let names = tokens.collect::<Vec<_>>().join(" ");
    if names.is_empty() {
        return Err(error(line, &format!("syntax error, expected identifier after `{ty}`")));
    }

    for name in split_top_level(&names) {
        let name = name.split('=').next().unwrap_or_default().trim();
        let (name, array) = match name.split_once('[') {
            Some((base, len)) => {
                let len = len.trim_end_matches(']').trim();
                let len = len.parse::<i32>().map_err(|_| error(line, &format!("bad array size `{len}`")))?;
                (base.trim(), Some(len))
            }
            None => (name, None),
        };
        if !is_identifier(name) {
            return Err(error(line, &format!("syntax error, unexpected `{name}`")));
        }
        let decl = Decl { name: name.to_owned(), ty: ty.to_owned(), array, location, used: false };
        match storage {
            Storage::Uniform => unit.uniforms.push(decl),
            Storage::In => unit.inputs.push(decl),
            Storage::Out => unit.outputs.push(decl),
        }
    }
    Ok(())
}

/// Splits on commas outside parentheses, so initializers like `vec3(1, 2, 3)` stay whole.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let (mut depth, mut start) = (0, 0);
    for (idx, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&list[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

fn layout_location(args: &str) -> Option<u32> {
    args.trim_start_matches('(').split(',').find_map(|arg| {
        let (key, value) = arg.split_once('=')?;
        (key.trim() == "location").then(|| value.trim().parse::<u32>().ok())?
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn mentions(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|token| token == word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_interface_and_usage() {
        let unit = parse(
            Stage::Fragment,
            "#version 330 core
// uniform float u_commented;
in vec2 v_uv;
uniform float u_time, u_unused;
uniform vec3 u_lights[4];
layout(location = 0) out vec4 color;
void main() {
    color = vec4(v_uv, u_time + u_lights[1].x, 1.0);
}",
        )
        .unwrap();

        assert!(unit.has_main);
        let names: Vec<_> = unit.uniforms.iter().map(|d| (d.name.as_str(), d.used)).collect();
        assert_eq!(names, [("u_time", true), ("u_unused", false), ("u_lights", true)]);
        assert_eq!(unit.uniforms[2].array, Some(4));
        assert_eq!(unit.inputs[0].ty, "vec2");
        assert_eq!(unit.outputs[0].location, Some(0));
    }

    #[test]
    fn missing_semicolon_is_a_syntax_error() {
        let log = parse(
            Stage::Vertex,
            "#version 330 core
void main() {
    gl_Position = vec4(0.0)
}",
        )
        .unwrap_err();
        assert!(log.starts_with("0:4: error: syntax error"), "{log}");
    }

    #[test]
    fn unbalanced_parens_are_reported_with_line() {
        let log = parse(Stage::Vertex, "#version 330\nvoid main() {\n  float x = (1.0;\n}").unwrap_err();
        assert_eq!(log, "0:4: error: syntax error, unexpected '}'");
    }

    #[test]
    fn version_must_come_first() {
        assert!(parse(Stage::Vertex, "void main() {}").unwrap_err().contains("#version"));
    }

    #[test]
    fn legacy_qualifiers_follow_the_stage() {
        let src = "#version 120\nattribute vec3 a_pos;\nvarying vec2 v_uv;\nvoid main() {}";
        let unit = parse(Stage::Vertex, src).unwrap();
        assert_eq!(unit.inputs[0].name, "a_pos");
        assert_eq!(unit.outputs[0].name, "v_uv");
    }

    #[test]
    fn initializers_may_contain_commas() {
        let src = "#version 330\nuniform vec3 u_sky = vec3(0.5, 0.7, 1.0), u_ground;\nvoid main() {}";
        let unit = parse(Stage::Fragment, src).unwrap();
        let names: Vec<_> = unit.uniforms.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["u_sky", "u_ground"]);
    }
}
