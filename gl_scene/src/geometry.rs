use std::ffi::c_void;

use thiserror::Error;

/// Primitive topology for the draw call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrawMode {
    TriangleStrip,
    Triangles,
}

impl DrawMode {
    pub(crate) fn gl_mode(self) -> u32 {
        match self {
            DrawMode::TriangleStrip => gl::TRIANGLE_STRIP,
            DrawMode::Triangles => gl::TRIANGLES,
        }
    }
}

struct AttributeData<'a> {
    location: u32,
    components: usize,
    data: &'a [f32],
}

/// Uploads one static buffer per vertex attribute, plus an optional 16-bit
/// index buffer, and records the layout in a VAO. Everything is uploaded
/// once with `STATIC_DRAW` and never touched again.
pub struct GeometryBuilder<'a> {
    attributes: Vec<AttributeData<'a>>,
    indices: Option<&'a [u16]>,
    mode: DrawMode,
}

impl<'a> GeometryBuilder<'a> {
    pub fn new(mode: DrawMode) -> Self {
        Self {
            attributes: Vec::new(),
            indices: None,
            mode,
        }
    }

    pub fn with_attribute(mut self, location: u32, components: usize, data: &'a [f32]) -> Self {
        self.attributes.push(AttributeData {
            location,
            components,
            data,
        });
        self
    }

    pub fn with_indices(mut self, indices: &'a [u16]) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Checks the descriptor without touching GL, so a malformed mesh is
    /// rejected before any buffer is allocated.
    fn vertex_count(&self) -> Result<usize, GBError> {
        let first = self.attributes.first().ok_or(GBError::NoAttributes)?;

        let mut count = None;

        for attr in &self.attributes {
            if attr.components == 0 || attr.data.len() % attr.components != 0 {
                return Err(GBError::InvalidDataLength);
            }

            let vertices = attr.data.len() / attr.components;
            if *count.get_or_insert(vertices) != vertices {
                return Err(GBError::MismatchedVertexCount);
            }
        }

        let vertices = first.data.len() / first.components;

        if let Some(indices) = self.indices {
            if indices.iter().any(|i| *i as usize >= vertices) {
                return Err(GBError::IndexOutOfRange);
            }
        }

        Ok(vertices)
    }

    pub fn build(self) -> Result<Geometry, GBError> {
        let vertices = self.vertex_count()?;

        let mut vao = 0;
        let mut vbos = vec![0_u32; self.attributes.len()];

        unsafe {
            gl::GenVertexArrays(1, (&mut vao) as *mut u32);
            gl::GenBuffers(self.attributes.len() as i32, vbos.as_mut_ptr());

            gl::BindVertexArray(vao);

            for (attr, vbo) in self.attributes.iter().zip(&vbos) {
                gl::BindBuffer(gl::ARRAY_BUFFER, *vbo);
                gl::BufferData(
                    gl::ARRAY_BUFFER,
                    (attr.data.len() * std::mem::size_of::<f32>()) as isize,
                    attr.data.as_ptr() as *const c_void,
                    gl::STATIC_DRAW,
                );

                gl::VertexAttribPointer(
                    attr.location,
                    attr.components as i32,
                    gl::FLOAT,
                    gl::FALSE,
                    0,
                    std::ptr::null(),
                );
                gl::EnableVertexAttribArray(attr.location);
            }

            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
        }

        let index_buffer = self.indices.map(|indices| {
            let mut ibo = 0;

            unsafe {
                gl::GenBuffers(1, (&mut ibo) as *mut u32);
                // bound while the VAO is still current so the VAO records it
                gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ibo);
                gl::BufferData(
                    gl::ELEMENT_ARRAY_BUFFER,
                    (indices.len() * std::mem::size_of::<u16>()) as isize,
                    indices.as_ptr() as *const c_void,
                    gl::STATIC_DRAW,
                );
            }

            ibo
        });

        unsafe {
            gl::BindVertexArray(0);
        }

        let count = match self.indices {
            Some(indices) => indices.len(),
            None => vertices,
        };

        Ok(Geometry {
            vao,
            vbos,
            index_buffer,
            mode: self.mode,
            count,
        })
    }
}

#[derive(Debug, Error)]
pub enum GBError {
    #[error("attribute data length is not a multiple of its component count")]
    InvalidDataLength,
    #[error("attributes disagree on vertex count")]
    MismatchedVertexCount,
    #[error("index refers to a vertex past the end of the attribute data")]
    IndexOutOfRange,
    #[error("geometry has no attributes")]
    NoAttributes,
}

pub struct Geometry {
    vao: u32,
    vbos: Vec<u32>,
    index_buffer: Option<u32>,
    mode: DrawMode,
    count: usize,
}

impl Geometry {
    pub fn vao(&self) -> u32 {
        self.vao
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    /// Indices to draw when indexed, vertices otherwise.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Drop for Geometry {
    fn drop(&mut self) {
        unsafe {
            if let Some(ibo) = self.index_buffer {
                gl::DeleteBuffers(1, (&ibo) as *const u32);
            }
            gl::DeleteBuffers(self.vbos.len() as i32, self.vbos.as_ptr());
            gl::DeleteVertexArrays(1, (&self.vao) as *const u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_count_checks_divisibility() {
        let builder = GeometryBuilder::new(DrawMode::Triangles).with_attribute(0, 3, &[0.0; 7]);

        assert!(matches!(
            builder.vertex_count(),
            Err(GBError::InvalidDataLength)
        ));
    }

    #[test]
    fn vertex_count_checks_attribute_agreement() {
        let builder = GeometryBuilder::new(DrawMode::Triangles)
            .with_attribute(0, 3, &[0.0; 12])
            .with_attribute(1, 2, &[0.0; 6]);

        assert!(matches!(
            builder.vertex_count(),
            Err(GBError::MismatchedVertexCount)
        ));
    }

    #[test]
    fn vertex_count_checks_index_range() {
        let builder = GeometryBuilder::new(DrawMode::Triangles)
            .with_attribute(0, 3, &[0.0; 12])
            .with_indices(&[0, 1, 4]);

        assert!(matches!(
            builder.vertex_count(),
            Err(GBError::IndexOutOfRange)
        ));
    }

    #[test]
    fn vertex_count_accepts_well_formed_mesh() {
        let builder = GeometryBuilder::new(DrawMode::Triangles)
            .with_attribute(0, 3, &[0.0; 12])
            .with_attribute(1, 2, &[0.0; 8])
            .with_indices(&[0, 1, 2, 0, 2, 3]);

        assert_eq!(builder.vertex_count().unwrap(), 4);
    }

    #[test]
    fn empty_builder_is_rejected() {
        let builder = GeometryBuilder::new(DrawMode::TriangleStrip);

        assert!(matches!(builder.vertex_count(), Err(GBError::NoAttributes)));
    }
}
