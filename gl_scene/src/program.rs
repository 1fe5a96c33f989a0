use gl::types::GLuint;
use std::ffi::{c_char, CString};

use thiserror::Error;

/// Compiles and links a vertex + fragment source pair into a [`Program`].
pub struct ProgramBuilder {
    vert: String,
    frag: String,
}

impl ProgramBuilder {
    pub fn new(vert_src: &str, frag_src: &str) -> Self {
        Self {
            vert: vert_src.to_owned(),
            frag: frag_src.to_owned(),
        }
    }

    /// Each stage is compiled on its own so a vertex error is reported with
    /// its own log and the link is never attempted on a broken stage.
    pub fn build(self) -> Result<Program, PBError> {
        let vert = compile_stage(gl::VERTEX_SHADER, "vertex", &self.vert)?;
        let frag = match compile_stage(gl::FRAGMENT_SHADER, "fragment", &self.frag) {
            Ok(frag) => frag,
            Err(e) => {
                unsafe { gl::DeleteShader(vert) };
                return Err(e);
            }
        };

        let mut success: i32 = 0;

        unsafe {
            let program = gl::CreateProgram();
            gl::AttachShader(program, vert);
            gl::AttachShader(program, frag);
            gl::LinkProgram(program);

            gl::GetProgramiv(program, gl::LINK_STATUS, (&mut success) as *mut i32);

            gl::DeleteShader(vert);
            gl::DeleteShader(frag);

            if success != 1 {
                let mut buf = [0_u8; 1024];
                gl::GetProgramInfoLog(
                    program,
                    1024,
                    std::ptr::null_mut(),
                    buf.as_mut_ptr() as *mut c_char,
                );
                gl::DeleteProgram(program);

                return Err(PBError::Linking(read_info_log(&buf)));
            }

            Ok(Program { id: program })
        }
    }
}

fn compile_stage(kind: u32, stage: &'static str, src: &str) -> Result<GLuint, PBError> {
    let src = CString::new(src).map_err(|_| PBError::InvalidSource(stage))?;

    let mut success: i32 = 0;

    unsafe {
        let shader = gl::CreateShader(kind);

        gl::ShaderSource(
            shader,
            1,
            (&src.as_ptr()) as *const *const c_char,
            std::ptr::null(),
        );

        gl::CompileShader(shader);
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, (&mut success) as *mut i32);
        if success != 1 {
            let mut buf = [0_u8; 1024];
            gl::GetShaderInfoLog(
                shader,
                1024,
                std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut c_char,
            );
            gl::DeleteShader(shader);

            return Err(PBError::Compilation {
                stage,
                log: read_info_log(&buf),
            });
        }

        Ok(shader)
    }
}

fn read_info_log(buf: &[u8]) -> String {
    let data = match buf.iter().position(|b| *b == 0) {
        Some(end) => &buf[..end],
        None => buf,
    };

    String::from_utf8_lossy(data).to_string()
}

#[derive(Debug, Error)]
pub enum PBError {
    #[error("{stage} shader compilation failed: {log}")]
    Compilation { stage: &'static str, log: String },
    #[error("program linking failed: {0}")]
    Linking(String),
    #[error("{0} shader source contains an interior NUL byte")]
    InvalidSource(&'static str),
}

pub struct Program {
    id: GLuint,
}

impl Program {
    pub fn get_id(&self) -> GLuint {
        self.id
    }

    /// `None` when the symbol was not found or was compiled out. Callers
    /// skip the binding instead of failing.
    pub fn attrib_location(&self, name: &str) -> Option<u32> {
        let name = CString::new(name).ok()?;

        let loc = unsafe { gl::GetAttribLocation(self.id, name.as_ptr()) };

        (loc >= 0).then_some(loc as u32)
    }

    pub fn uniform_location(&self, name: &str) -> Option<i32> {
        let name = CString::new(name).ok()?;

        let loc = unsafe { gl::GetUniformLocation(self.id, name.as_ptr()) };

        (loc >= 0).then_some(loc)
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        unsafe { gl::DeleteProgram(self.id) }
    }
}

/// A linked program together with its resolved semantic locations, looked
/// up once after the link instead of every frame.
pub struct ProgramInfo {
    pub program: Program,
    pub position: Option<u32>,
    pub color: Option<u32>,
    pub texture_coord: Option<u32>,
    pub projection: Option<i32>,
    pub model_view: Option<i32>,
    pub sampler: Option<i32>,
}

impl ProgramInfo {
    pub fn resolve(program: Program) -> Self {
        let position = program.attrib_location("aVertexPosition");
        let color = program.attrib_location("aVertexColor");
        let texture_coord = program.attrib_location("aTextureCoord");
        let projection = program.uniform_location("uProjectionMatrix");
        let model_view = program.uniform_location("uModelViewMatrix");
        let sampler = program.uniform_location("uSampler");

        Self {
            program,
            position,
            color,
            texture_coord,
            projection,
            model_view,
            sampler,
        }
    }
}
