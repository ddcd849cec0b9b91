//! In-memory `RenderDevice` that records what the renderer asks of it.

use super::device::{BufferTarget, RenderDevice, ShaderStage, NO_ERROR};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

pub const INVALID_VALUE: u32 = glow::INVALID_VALUE;
pub const INVALID_OPERATION: u32 = glow::INVALID_OPERATION;

/// Shaders compile when their source contains an entry point.
const ENTRY_POINT: &str = "void main";

#[derive(Debug, Default)]
struct MockShader {
    stage: Option<ShaderStage>,
    source: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct MockProgram {
    attached: Vec<u32>,
    sources: Vec<(ShaderStage, String)>,
    linked: bool,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    errors: VecDeque<u32>,
    shaders: HashMap<u32, MockShader>,
    programs: HashMap<u32, MockProgram>,
    buffers: HashMap<u32, Vec<u8>>,
    vertex_arrays: HashSet<u32>,
    bindings: HashMap<BufferTarget, u32>,
    bound_vertex_array: u32,
    current_program: u32,
    enabled_attributes: HashSet<u32>,
    attribute_layouts: HashMap<u32, (i32, i32, i32)>,
    uniforms: HashMap<(u32, String), [f32; 4]>,
    deleted_shaders: Vec<u32>,
    deleted_programs: Vec<u32>,
    deleted_buffers: Vec<u32>,
    draws: Vec<i32>,
    clears: usize,
    viewport: (i32, i32),
    failing_calls: HashMap<&'static str, u32>,
}

impl State {
    /// Queues the error registered for `call`, once.
    fn trip(&mut self, call: &str) {
        if let Some(code) = self.failing_calls.remove(call) {
            self.errors.push_back(code);
        }
    }
}

#[derive(Debug, Default)]
pub struct MockDevice {
    state: RefCell<State>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_error(&self, code: u32) {
        self.state.borrow_mut().errors.push_back(code);
    }

    /// Makes the next `call` queue `code` as if the driver rejected it.
    pub fn fail_on(&self, call: &'static str, code: u32) {
        self.state.borrow_mut().failing_calls.insert(call, code);
    }

    pub fn pending_errors(&self) -> usize {
        self.state.borrow().errors.len()
    }

    /// Buffer bound at `target`, 0 when nothing is bound.
    pub fn bound_buffer(&self, target: BufferTarget) -> u32 {
        self.state.borrow().bindings.get(&target).copied().unwrap_or(0)
    }

    pub fn bound_vertex_array(&self) -> u32 {
        self.state.borrow().bound_vertex_array
    }

    pub fn current_program(&self) -> u32 {
        self.state.borrow().current_program
    }

    pub fn buffer_contents(&self, buffer: u32) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn deleted_shaders(&self) -> Vec<u32> {
        self.state.borrow().deleted_shaders.clone()
    }

    pub fn deleted_programs(&self) -> Vec<u32> {
        self.state.borrow().deleted_programs.clone()
    }

    pub fn deleted_buffers(&self) -> Vec<u32> {
        self.state.borrow().deleted_buffers.clone()
    }

    pub fn attribute_enabled(&self, index: u32) -> bool {
        self.state.borrow().enabled_attributes.contains(&index)
    }

    pub fn attribute_layout(&self, index: u32) -> Option<(i32, i32, i32)> {
        self.state.borrow().attribute_layouts.get(&index).copied()
    }

    pub fn uniform(&self, program: u32, name: &str) -> Option<[f32; 4]> {
        self.state
            .borrow()
            .uniforms
            .get(&(program, name.to_string()))
            .copied()
    }

    pub fn draws(&self) -> Vec<i32> {
        self.state.borrow().draws.clone()
    }

    pub fn clears(&self) -> usize {
        self.state.borrow().clears
    }

    pub fn viewport(&self) -> (i32, i32) {
        self.state.borrow().viewport
    }

    fn allocate(state: &mut State) -> u32 {
        state.next_id += 1;
        state.next_id
    }
}

impl RenderDevice for MockDevice {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type UniformLocation = (u32, String);

    fn get_error(&self) -> u32 {
        self.state.borrow_mut().errors.pop_front().unwrap_or(NO_ERROR)
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = Self::allocate(&mut state);
        state.trip("create_shader");
        state.shaders.insert(
            id,
            MockShader {
                stage: Some(stage),
                ..MockShader::default()
            },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut state = self.state.borrow_mut();
        state.trip("shader_source");
        match state.shaders.get_mut(&shader) {
            Some(entry) => entry.source = source.to_string(),
            None => state.errors.push_back(INVALID_VALUE),
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        state.trip("compile_shader");
        match state.shaders.get_mut(&shader) {
            Some(entry) => entry.compiled = entry.source.contains(ENTRY_POINT),
            None => state.errors.push_back(INVALID_VALUE),
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map_or(false, |entry| entry.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        match self.state.borrow().shaders.get(&shader) {
            Some(entry) if !entry.compiled => {
                format!("0:1(1): error: syntax error, missing `{}`", ENTRY_POINT)
            }
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader).is_some() {
            state.deleted_shaders.push(shader);
        } else {
            state.errors.push_back(INVALID_VALUE);
        }
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = Self::allocate(&mut state);
        state.trip("create_program");
        state.programs.insert(id, MockProgram::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) || !state.programs.contains_key(&program) {
            state.errors.push_back(INVALID_VALUE);
            return;
        }
        if let Some(entry) = state.programs.get_mut(&program) {
            entry.attached.push(shader);
        }
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        let Some(attached) = state.programs.get(&program).map(|p| p.attached.clone()) else {
            state.errors.push_back(INVALID_VALUE);
            return;
        };

        let sources: Vec<(ShaderStage, String)> = attached
            .iter()
            .filter_map(|id| state.shaders.get(id))
            .filter(|shader| shader.compiled)
            .filter_map(|shader| shader.stage.map(|stage| (stage, shader.source.clone())))
            .collect();
        let has_stage = |stage| sources.iter().any(|(s, _)| *s == stage);
        let linked = sources.len() == attached.len()
            && has_stage(ShaderStage::Vertex)
            && has_stage(ShaderStage::Fragment);

        if let Some(entry) = state.programs.get_mut(&program) {
            entry.linked = linked;
            entry.sources = sources;
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(false, |entry| entry.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        match self.state.borrow().programs.get(&program) {
            Some(entry) if !entry.linked => {
                "error: program needs a compiled vertex and fragment shader".to_string()
            }
            _ => String::new(),
        }
    }

    fn use_program(&self, program: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match program {
            Some(id) if !state.programs.get(&id).map_or(false, |p| p.linked) => {
                state.errors.push_back(INVALID_OPERATION)
            }
            _ => state.current_program = program.unwrap_or(0),
        }
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program).is_some() {
            state.deleted_programs.push(program);
            if state.current_program == program {
                state.current_program = 0;
            }
        } else {
            state.errors.push_back(INVALID_VALUE);
        }
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<(u32, String)> {
        let state = self.state.borrow();
        let entry = state.programs.get(&program)?;
        let declared = entry
            .sources
            .iter()
            .any(|(_, source)| source.contains(&format!("uniform vec4 {};", name)));
        (entry.linked && declared).then(|| (program, name.to_string()))
    }

    fn uniform_4f(&self, location: &(u32, String), value: [f32; 4]) {
        let mut state = self.state.borrow_mut();
        if state.current_program != location.0 {
            state.errors.push_back(INVALID_OPERATION);
            return;
        }
        state.uniforms.insert(location.clone(), value);
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = Self::allocate(&mut state);
        state.trip("create_buffer");
        state.buffers.insert(id, Vec::new());
        Ok(id)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(id) if !state.buffers.contains_key(&id) => {
                state.errors.push_back(INVALID_VALUE)
            }
            Some(id) => {
                state.bindings.insert(target, id);
            }
            None => {
                state.bindings.remove(&target);
            }
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(id) = state.bindings.get(&target).copied() else {
            state.errors.push_back(INVALID_OPERATION);
            return;
        };
        if let Some(contents) = state.buffers.get_mut(&id) {
            *contents = data.to_vec();
        }
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer).is_some() {
            state.deleted_buffers.push(buffer);
            state.bindings.retain(|_, bound| *bound != buffer);
        } else {
            state.errors.push_back(INVALID_VALUE);
        }
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let id = Self::allocate(&mut state);
        state.trip("create_vertex_array");
        state.vertex_arrays.insert(id);
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match vertex_array {
            Some(id) if !state.vertex_arrays.contains(&id) => {
                state.errors.push_back(INVALID_OPERATION)
            }
            _ => state.bound_vertex_array = vertex_array.unwrap_or(0),
        }
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.borrow_mut();
        if state.vertex_arrays.remove(&vertex_array) {
            if state.bound_vertex_array == vertex_array {
                state.bound_vertex_array = 0;
            }
        } else {
            state.errors.push_back(INVALID_VALUE);
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.state.borrow_mut().enabled_attributes.insert(index);
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        let mut state = self.state.borrow_mut();
        if !state.bindings.contains_key(&BufferTarget::Array) {
            state.errors.push_back(INVALID_OPERATION);
            return;
        }
        state
            .attribute_layouts
            .insert(index, (components, stride, offset));
    }

    fn viewport(&self, width: i32, height: i32) {
        self.state.borrow_mut().viewport = (width, height);
    }

    fn clear_color(&self, _color: [f32; 4]) {}

    fn clear(&self) {
        self.state.borrow_mut().clears += 1;
    }

    fn draw_elements(&self, count: i32) {
        let mut state = self.state.borrow_mut();
        if state.current_program == 0 || !state.bindings.contains_key(&BufferTarget::ElementArray) {
            state.errors.push_back(INVALID_OPERATION);
            return;
        }
        state.draws.push(count);
    }
}
