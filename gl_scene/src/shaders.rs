//! GLSL sources embedded at compile time.

pub const FLAT_VERT: &str = include_str!("shaders/flat.vert.glsl");
pub const FLAT_FRAG: &str = include_str!("shaders/flat.frag.glsl");
pub const TEXTURED_VERT: &str = include_str!("shaders/textured.vert.glsl");
pub const TEXTURED_FRAG: &str = include_str!("shaders/textured.frag.glsl");
