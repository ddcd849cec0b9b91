pub mod config;
pub mod render;

// Re-export commonly used types
pub use config::{AppConfig, RenderConfig, WindowConfig};
pub use render::pipeline::QuadPipeline;
pub use render::shaders::{ShaderError, ShaderProgram, ShaderProgramSource};
pub use render::{RenderDevice, RenderError};
