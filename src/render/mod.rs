pub mod animation;
pub mod buffers;
pub mod device;
pub mod error;
pub mod pipeline;
pub mod shaders;

#[cfg(test)]
pub(crate) mod mock;

pub use buffers::{IndexBuffer, VertexArray, VertexAttribute, VertexBuffer};
pub use device::{BufferTarget, RenderDevice, ShaderStage};
pub use error::{gl_call, GlError, RenderError};
pub use pipeline::QuadPipeline;
pub use shaders::{parse_shader, ShaderError, ShaderProgram, ShaderProgramSource};
