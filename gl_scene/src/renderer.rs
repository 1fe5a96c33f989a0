use cgmath::{perspective, Deg, Matrix, Matrix4, Rad, Vector3};

use thiserror::Error;

use crate::animation::AnimationState;
use crate::scene::{SceneKind, SceneObject};

const FIELD_OF_VIEW: Deg<f32> = Deg(45.0);
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;
const MODEL_OFFSET: f32 = -6.0;

/// 45° vertical field of view, clip planes at 0.1 and 100. The aspect ratio
/// comes from the current drawable size, so it is rebuilt every frame.
pub fn projection_matrix(aspect: f32) -> Matrix4<f32> {
    perspective(FIELD_OF_VIEW, aspect, Z_NEAR, Z_FAR)
}

/// Pushes the model six units down the view axis, then rotates. The cube
/// composes Z, then X at 0.3x, then Y at 0.7x of the accumulated angle;
/// matrix products do not commute, so the order is load-bearing.
pub fn model_view_matrix(kind: SceneKind, angle: f32) -> Matrix4<f32> {
    let translated = Matrix4::from_translation(Vector3::new(0.0, 0.0, MODEL_OFFSET))
        * Matrix4::from_angle_z(Rad(angle));

    match kind {
        SceneKind::Flat => translated,
        SceneKind::Cube => {
            translated
                * Matrix4::from_angle_x(Rad(angle * 0.3))
                * Matrix4::from_angle_y(Rad(angle * 0.7))
        }
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("drawable surface has a zero dimension")]
    EmptySurface,
}

/// Issues one frame at a time against a current GL context.
///
/// Individual GL calls are not error-checked; the context's deferred error
/// model applies. The only per-frame failure is a surface the projection
/// cannot be built for, and that aborts just the frame in question.
pub struct FrameRenderer {
    current_program: u32,
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self { current_program: 0 }
    }

    pub fn resize(&self, width: u32, height: u32) {
        unsafe {
            gl::Viewport(0, 0, width as i32, height as i32);
        }
    }

    pub fn render_frame(
        &mut self,
        scene: &SceneObject,
        drawable_size: (u32, u32),
        state: &mut AnimationState,
        dt: f32,
    ) -> Result<(), FrameError> {
        let (width, height) = drawable_size;
        if width == 0 || height == 0 {
            return Err(FrameError::EmptySurface);
        }

        unsafe {
            gl::ClearColor(0.0, 0.0, 0.0, 1.0);
            gl::ClearDepth(1.0);
            gl::Enable(gl::DEPTH_TEST);
            gl::DepthFunc(gl::LEQUAL);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }

        let projection = projection_matrix(width as f32 / height as f32);
        let model_view = model_view_matrix(scene.kind, state.rotation());

        let p_id = scene.program.program.get_id();
        if self.current_program != p_id {
            unsafe { gl::UseProgram(p_id) }
            self.current_program = p_id;
        }

        unsafe {
            gl::BindVertexArray(scene.geometry.vao());

            if let Some(loc) = scene.program.projection {
                gl::UniformMatrix4fv(loc, 1, gl::FALSE, projection.as_ptr());
            }
            if let Some(loc) = scene.program.model_view {
                gl::UniformMatrix4fv(loc, 1, gl::FALSE, model_view.as_ptr());
            }

            if let Some(texture) = &scene.texture {
                texture.bind(0);
                if let Some(loc) = scene.program.sampler {
                    gl::Uniform1i(loc, 0);
                }
            }

            if scene.geometry.is_indexed() {
                gl::DrawElements(
                    scene.geometry.mode().gl_mode(),
                    scene.geometry.count() as i32,
                    gl::UNSIGNED_SHORT,
                    std::ptr::null(),
                );
            } else {
                gl::DrawArrays(
                    scene.geometry.mode().gl_mode(),
                    0,
                    scene.geometry.count() as i32,
                );
            }
        }

        state.advance(dt);

        Ok(())
    }
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn projection_matches_perspective_formula() {
        let aspect = 640.0 / 480.0;
        let m = projection_matrix(aspect);

        let f = 1.0 / (22.5_f32.to_radians()).tan();

        assert_close(m[0][0], f / aspect);
        assert_close(m[1][1], f);
        assert_close(m[2][2], (Z_FAR + Z_NEAR) / (Z_NEAR - Z_FAR));
        assert_close(m[2][3], -1.0);
        assert_close(m[3][2], 2.0 * Z_FAR * Z_NEAR / (Z_NEAR - Z_FAR));
        assert_close(m[3][3], 0.0);
    }

    #[test]
    fn model_view_at_zero_is_pure_translation() {
        for kind in [SceneKind::Flat, SceneKind::Cube] {
            let m = model_view_matrix(kind, 0.0);

            for col in 0..3 {
                for row in 0..4 {
                    let expected = if col == row { 1.0 } else { 0.0 };
                    assert_close(m[col][row], expected);
                }
            }

            assert_close(m[3][0], 0.0);
            assert_close(m[3][1], 0.0);
            assert_close(m[3][2], -6.0);
            assert_close(m[3][3], 1.0);
        }
    }

    #[test]
    fn cube_rotation_order_is_not_commutative() {
        let angle = 1.0_f32;

        let m = model_view_matrix(SceneKind::Cube, angle);

        let reversed = Matrix4::from_translation(Vector3::new(0.0, 0.0, -6.0))
            * Matrix4::from_angle_y(Rad(angle * 0.7))
            * Matrix4::from_angle_x(Rad(angle * 0.3))
            * Matrix4::from_angle_z(Rad(angle));

        let differs = (0..4)
            .flat_map(|c| (0..4).map(move |r| (c, r)))
            .any(|(c, r)| (m[c][r] - reversed[c][r]).abs() > 1e-4);
        assert!(differs);
    }

    #[test]
    fn flat_rotation_stays_in_plane() {
        let m = model_view_matrix(SceneKind::Flat, 0.5);

        // Z axis untouched by a Z rotation
        assert_close(m[2][0], 0.0);
        assert_close(m[2][1], 0.0);
        assert_close(m[2][2], 1.0);
        assert_close(m[0][0], 0.5_f32.cos());
        assert_close(m[0][1], 0.5_f32.sin());
    }
}
