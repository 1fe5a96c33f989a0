use thiserror::Error;

use crate::animation::RotationWrap;
use crate::geometry::{DrawMode, GBError, Geometry, GeometryBuilder};
use crate::program::{PBError, Program, ProgramBuilder, ProgramInfo};
use crate::shaders;
use crate::texture::RemoteTexture;

#[rustfmt::skip]
const QUAD_POSITIONS: [f32; 8] = [
    1.0, 1.0,
    -1.0, 1.0,
    1.0, -1.0,
    -1.0, -1.0,
];

#[rustfmt::skip]
const QUAD_COLORS: [f32; 16] = [
    1.0, 1.0, 1.0, 1.0, // white
    1.0, 0.0, 0.0, 1.0, // red
    0.0, 1.0, 0.0, 1.0, // green
    0.0, 0.0, 1.0, 1.0, // blue
];

// Four vertices per face, not shared with neighbouring faces, so every face
// carries its own flat unit-square texture mapping.
#[rustfmt::skip]
const CUBE_POSITIONS: [f32; 72] = [
    // front
    -1.0, -1.0, 1.0,
    1.0, -1.0, 1.0,
    1.0, 1.0, 1.0,
    -1.0, 1.0, 1.0,
    // back
    -1.0, -1.0, -1.0,
    -1.0, 1.0, -1.0,
    1.0, 1.0, -1.0,
    1.0, -1.0, -1.0,
    // top
    -1.0, 1.0, -1.0,
    -1.0, 1.0, 1.0,
    1.0, 1.0, 1.0,
    1.0, 1.0, -1.0,
    // bottom
    -1.0, -1.0, -1.0,
    1.0, -1.0, -1.0,
    1.0, -1.0, 1.0,
    -1.0, -1.0, 1.0,
    // right
    1.0, -1.0, -1.0,
    1.0, 1.0, -1.0,
    1.0, 1.0, 1.0,
    1.0, -1.0, 1.0,
    // left
    -1.0, -1.0, -1.0,
    -1.0, -1.0, 1.0,
    -1.0, 1.0, 1.0,
    -1.0, 1.0, -1.0,
];

#[rustfmt::skip]
const CUBE_TEXTURE_COORDS: [f32; 48] = [
    // front
    0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0,
    // back
    0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0,
    // top
    0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0,
    // bottom
    0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0,
    // right
    0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0,
    // left
    0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0,
];

#[rustfmt::skip]
const CUBE_INDICES: [u16; 36] = [
    0, 1, 2, 0, 2, 3, // front
    4, 5, 6, 4, 6, 7, // back
    8, 9, 10, 8, 10, 11, // top
    12, 13, 14, 12, 14, 15, // bottom
    16, 17, 18, 16, 18, 19, // right
    20, 21, 22, 20, 22, 23, // left
];

/// Declarative geometry layout consumed by the generic pipeline: which
/// attributes exist, whether an index buffer exists, and the topology.
pub struct MeshData {
    pub positions: &'static [f32],
    pub position_components: usize,
    pub colors: Option<&'static [f32]>,
    pub texture_coords: Option<&'static [f32]>,
    pub indices: Option<&'static [u16]>,
    pub mode: DrawMode,
}

/// The two scenes the pipeline knows how to draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SceneKind {
    /// Vertex-colored quad spinning around the view axis.
    Flat,
    /// Textured cube tumbling around all three axes.
    Cube,
}

impl SceneKind {
    pub fn mesh(&self) -> MeshData {
        match self {
            SceneKind::Flat => MeshData {
                positions: &QUAD_POSITIONS,
                position_components: 2,
                colors: Some(&QUAD_COLORS),
                texture_coords: None,
                indices: None,
                mode: DrawMode::TriangleStrip,
            },
            SceneKind::Cube => MeshData {
                positions: &CUBE_POSITIONS,
                position_components: 3,
                colors: None,
                texture_coords: Some(&CUBE_TEXTURE_COORDS),
                indices: Some(&CUBE_INDICES),
                mode: DrawMode::Triangles,
            },
        }
    }

    pub fn shader_sources(&self) -> (&'static str, &'static str) {
        match self {
            SceneKind::Flat => (shaders::FLAT_VERT, shaders::FLAT_FRAG),
            SceneKind::Cube => (shaders::TEXTURED_VERT, shaders::TEXTURED_FRAG),
        }
    }

    pub fn rotation_wrap(&self) -> RotationWrap {
        match self {
            SceneKind::Flat => RotationWrap::Modulo,
            SceneKind::Cube => RotationWrap::Unbounded,
        }
    }
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("shader program: {0}")]
    Program(#[from] PBError),
    #[error("geometry: {0}")]
    Geometry(#[from] GBError),
}

/// Everything the frame renderer needs for one scene: the linked program
/// with its resolved locations, the uploaded geometry, and the texture when
/// the scene samples one.
pub struct SceneObject {
    pub kind: SceneKind,
    pub program: ProgramInfo,
    pub geometry: Geometry,
    pub texture: Option<RemoteTexture>,
}

impl SceneObject {
    /// Compiles, uploads and resolves everything up front. Requires a
    /// current GL context. Failure at any step aborts initialization with
    /// no partial scene.
    pub fn new(kind: SceneKind, texture_url: Option<&str>) -> Result<Self, SceneError> {
        let (vert, frag) = kind.shader_sources();

        let program = ProgramBuilder::new(vert, frag).build()?;
        let program = ProgramInfo::resolve(program);

        let geometry = build_geometry(&kind.mesh(), &program)?;

        let texture = kind.mesh().texture_coords.is_some().then(|| {
            match texture_url {
                Some(url) => RemoteTexture::load(url),
                None => RemoteTexture::placeholder_only(),
            }
        });

        Ok(Self {
            kind,
            program,
            geometry,
            texture,
        })
    }
}

fn build_geometry(mesh: &MeshData, program: &ProgramInfo) -> Result<Geometry, GBError> {
    let mut builder = GeometryBuilder::new(mesh.mode);

    // a location the linker did not hand out means the attribute is simply
    // not bound, never an error
    if let Some(location) = program.position {
        builder = builder.with_attribute(location, mesh.position_components, mesh.positions);
    }

    if let (Some(location), Some(colors)) = (program.color, mesh.colors) {
        builder = builder.with_attribute(location, 4, colors);
    }

    if let (Some(location), Some(coords)) = (program.texture_coord, mesh.texture_coords) {
        builder = builder.with_attribute(location, 2, coords);
    }

    if let Some(indices) = mesh.indices {
        builder = builder.with_indices(indices);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn quad_descriptor_arities() {
        let mesh = SceneKind::Flat.mesh();

        assert_eq!(mesh.positions.len() / mesh.position_components, 4);
        assert_eq!(mesh.colors.unwrap().len(), 4 * 4);
        assert!(mesh.texture_coords.is_none());
        assert!(mesh.indices.is_none());
        assert_eq!(mesh.mode, DrawMode::TriangleStrip);
    }

    #[test]
    fn cube_descriptor_arities() {
        let mesh = SceneKind::Cube.mesh();

        assert_eq!(mesh.positions.len() / mesh.position_components, 24);
        assert_eq!(mesh.texture_coords.unwrap().len(), 24 * 2);
        assert_eq!(mesh.indices.unwrap().len(), 36);
        assert!(mesh.colors.is_none());
        assert_eq!(mesh.mode, DrawMode::Triangles);
    }

    #[test]
    fn cube_indices_cover_every_face_twice() {
        let indices = SceneKind::Cube.mesh().indices.unwrap();

        assert!(indices.iter().all(|i| *i < 24));

        let mut triangles = HashSet::new();
        for tri in indices.chunks(3) {
            let mut tri = [tri[0], tri[1], tri[2]];
            tri.sort_unstable();
            assert!(triangles.insert(tri), "duplicate triangle {tri:?}");
        }
        assert_eq!(triangles.len(), 12);

        // two triangles per face, each staying inside its face's 4 vertices
        for face in 0..6_u16 {
            let range = (face * 4)..(face * 4 + 4);
            let in_face = triangles
                .iter()
                .filter(|tri| tri.iter().all(|i| range.contains(i)))
                .count();
            assert_eq!(in_face, 2, "face {face}");
        }
    }

    #[test]
    fn wrap_mode_per_scene() {
        assert_eq!(SceneKind::Flat.rotation_wrap(), RotationWrap::Modulo);
        assert_eq!(SceneKind::Cube.rotation_wrap(), RotationWrap::Unbounded);
    }
}
