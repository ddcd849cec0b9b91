use super::animation::ColorAnimator;
use super::buffers::{IndexBuffer, VertexArray, VertexAttribute, VertexBuffer};
use super::device::RenderDevice;
use super::error::{gl_call, RenderError};
use super::shaders::{ShaderProgram, ShaderProgramSource};
use crate::config::RenderConfig;
use log::{debug, info};
use std::rc::Rc;

/// Corners of the quad, two floats each.
pub const QUAD_POSITIONS: [f32; 8] = [
    -0.5, -0.5, // 0
    0.5, -0.5, // 1
    0.5, 0.5, // 2
    -0.5, 0.5, // 3
];

/// Two triangles sharing the 0-2 diagonal.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    pub draw_calls: u64,
    pub indices_drawn: u64,
}

/// Everything needed to draw the animated quad.
pub struct QuadPipeline<D: RenderDevice> {
    program: ShaderProgram<D>,
    vertex_array: VertexArray<D>,
    index_buffer: IndexBuffer<D>,
    _vertex_buffer: VertexBuffer<D>,
    animator: ColorAnimator,
    color_uniform: String,
    clear_color: [f32; 4],
    stats: RenderStats,
    device: Rc<D>,
}

impl<D: RenderDevice> QuadPipeline<D> {
    pub fn new(
        device: Rc<D>,
        source: &ShaderProgramSource,
        config: &RenderConfig,
    ) -> Result<Self, RenderError> {
        let vertex_array = VertexArray::new(device.clone())?;
        let vertex_buffer = VertexBuffer::new(device.clone(), &QUAD_POSITIONS)?;
        vertex_array.add_buffer(&vertex_buffer, &[VertexAttribute::packed(0, 2)])?;

        let index_buffer = IndexBuffer::new(device.clone(), &QUAD_INDICES)?;

        let mut program = ShaderProgram::new(device.clone(), source)?;
        let animator = ColorAnimator::new(config.initial_color, config.color_step);
        program.set_uniform_4f(&config.color_uniform, animator.color())?;

        vertex_array.unbind();
        vertex_buffer.unbind();
        index_buffer.unbind();
        program.unbind();

        device.clear_color(config.clear_color);
        info!(
            "Quad pipeline ready: {} vertices, {} indices",
            QUAD_POSITIONS.len() / 2,
            index_buffer.count()
        );

        Ok(Self {
            program,
            vertex_array,
            index_buffer,
            _vertex_buffer: vertex_buffer,
            animator,
            color_uniform: config.color_uniform.clone(),
            clear_color: config.clear_color,
            stats: RenderStats::default(),
            device,
        })
    }

    pub fn resize(&self, width: u32, height: u32) {
        debug!("Viewport resized to {}x{}", width, height);
        let clamp = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
        self.device.viewport(clamp(width), clamp(height));
    }

    /// Clears, draws the quad with the current color and advances the
    /// animation by one step.
    pub fn render_frame(&mut self) -> Result<(), RenderError> {
        self.device.clear_color(self.clear_color);
        self.device.clear();

        self.program
            .set_uniform_4f(&self.color_uniform, self.animator.color())?;
        self.vertex_array.bind();
        self.index_buffer.bind();

        let count = self.index_buffer.count();
        gl_call(&*self.device, "draw_elements", |gl| {
            gl.draw_elements(count as i32)
        })?;

        self.animator.step();
        self.stats.frames += 1;
        self.stats.draw_calls += 1;
        self.stats.indices_drawn += count as u64;
        Ok(())
    }

    pub fn color(&self) -> [f32; 4] {
        self.animator.color()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}
