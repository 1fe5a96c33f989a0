//! Retained-mode pipeline over a raw GL context: compile a program once,
//! upload static geometry once, then redraw every frame with fresh matrices.
//!
//! The hosting window is expected to create the context and load the GL
//! function pointers before any of these types are constructed. All calls
//! must stay on the context's thread; the texture fetch is the only piece
//! that leaves it, and it hands its result back over a channel.

pub mod animation;
pub mod geometry;
pub mod program;
pub mod renderer;
pub mod scene;
pub mod shaders;
pub mod texture;

pub use animation::AnimationState;
pub use renderer::FrameRenderer;
pub use scene::{SceneKind, SceneObject};
