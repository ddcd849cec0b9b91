//! Owning wrappers around GPU buffers and the vertex array that describes them.
//!
//! Each wrapper uploads once at construction and deletes its handle on drop.
//! None of them keep a CPU-side copy of the data.

use super::device::{BufferTarget, RenderDevice};
use super::error::{gl_call, gl_call_keep, RenderError};
use bytemuck::Pod;
use std::mem;
use std::rc::Rc;

fn upload<D: RenderDevice>(
    device: &D,
    target: BufferTarget,
    data: &[u8],
) -> Result<D::Buffer, RenderError> {
    let (created, checked) = gl_call_keep(device, "create_buffer", |gl| gl.create_buffer());
    let buffer = created.map_err(|reason| RenderError::Allocation {
        kind: "buffer",
        reason,
    })?;

    let uploaded = checked.and_then(|()| {
        gl_call(device, "buffer_data", |gl| {
            gl.bind_buffer(target, Some(buffer));
            gl.buffer_data(target, data);
            gl.bind_buffer(target, None);
        })
    });
    if let Err(err) = uploaded {
        device.delete_buffer(buffer);
        return Err(err.into());
    }

    Ok(buffer)
}

pub struct VertexBuffer<D: RenderDevice> {
    device: Rc<D>,
    id: D::Buffer,
    size: usize,
}

impl<D: RenderDevice> VertexBuffer<D> {
    pub fn new<T: Pod>(device: Rc<D>, data: &[T]) -> Result<Self, RenderError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let id = upload(&*device, BufferTarget::Array, bytes)?;
        Ok(Self {
            device,
            id,
            size: bytes.len(),
        })
    }

    pub fn id(&self) -> D::Buffer {
        self.id
    }

    /// Size of the upload in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bind(&self) {
        self.device.bind_buffer(BufferTarget::Array, Some(self.id));
    }

    pub fn unbind(&self) {
        self.device.bind_buffer(BufferTarget::Array, None);
    }
}

impl<D: RenderDevice> Drop for VertexBuffer<D> {
    fn drop(&mut self) {
        self.device.delete_buffer(self.id);
    }
}

pub struct IndexBuffer<D: RenderDevice> {
    device: Rc<D>,
    id: D::Buffer,
    count: usize,
}

impl<D: RenderDevice> IndexBuffer<D> {
    pub fn new(device: Rc<D>, indices: &[u32]) -> Result<Self, RenderError> {
        let id = upload(
            &*device,
            BufferTarget::ElementArray,
            bytemuck::cast_slice(indices),
        )?;
        Ok(Self {
            device,
            id,
            count: indices.len(),
        })
    }

    pub fn id(&self) -> D::Buffer {
        self.id
    }

    /// Number of indices, the element count for a draw call.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn bind(&self) {
        self.device
            .bind_buffer(BufferTarget::ElementArray, Some(self.id));
    }

    pub fn unbind(&self) {
        self.device.bind_buffer(BufferTarget::ElementArray, None);
    }
}

impl<D: RenderDevice> Drop for IndexBuffer<D> {
    fn drop(&mut self) {
        self.device.delete_buffer(self.id);
    }
}

/// One `f32` vertex attribute. `stride` and `offset` are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub index: u32,
    pub components: i32,
    pub stride: i32,
    pub offset: i32,
}

impl VertexAttribute {
    /// Attribute covering `components` tightly packed floats per vertex.
    pub fn packed(index: u32, components: i32) -> Self {
        Self {
            index,
            components,
            stride: components * mem::size_of::<f32>() as i32,
            offset: 0,
        }
    }
}

pub struct VertexArray<D: RenderDevice> {
    device: Rc<D>,
    id: D::VertexArray,
}

impl<D: RenderDevice> VertexArray<D> {
    pub fn new(device: Rc<D>) -> Result<Self, RenderError> {
        let (created, checked) =
            gl_call_keep(&*device, "create_vertex_array", |gl| gl.create_vertex_array());
        let id = created.map_err(|reason| RenderError::Allocation {
            kind: "vertex array",
            reason,
        })?;
        if let Err(err) = checked {
            device.delete_vertex_array(id);
            return Err(err.into());
        }
        Ok(Self { device, id })
    }

    pub fn id(&self) -> D::VertexArray {
        self.id
    }

    pub fn bind(&self) {
        self.device.bind_vertex_array(Some(self.id));
    }

    pub fn unbind(&self) {
        self.device.bind_vertex_array(None);
    }

    /// Records `layout` for `buffer` in this vertex array. Leaves the vertex
    /// array bound.
    pub fn add_buffer(
        &self,
        buffer: &VertexBuffer<D>,
        layout: &[VertexAttribute],
    ) -> Result<(), RenderError> {
        self.bind();
        buffer.bind();
        for attribute in layout {
            gl_call(&*self.device, "vertex_attrib_pointer", |gl| {
                gl.enable_vertex_attrib_array(attribute.index);
                gl.vertex_attrib_pointer_f32(
                    attribute.index,
                    attribute.components,
                    attribute.stride,
                    attribute.offset,
                );
            })?;
        }
        Ok(())
    }
}

impl<D: RenderDevice> Drop for VertexArray<D> {
    fn drop(&mut self) {
        self.device.delete_vertex_array(self.id);
    }
}
