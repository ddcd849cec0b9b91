use super::device::{RenderDevice, ShaderStage};
use super::error::{gl_call, gl_call_keep, GlError};
use log::{error, info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

const MARKER: &str = "#shader";

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("Failed to read shader file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to compile {stage} shader:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("Failed to link shader program:\n{log}")]
    Link { log: String },

    #[error("Uniform '{0}' not found in shader program")]
    UniformNotFound(String),

    #[error("Failed to create shader object: {0}")]
    Allocation(String),

    #[error(transparent)]
    Gl(#[from] GlError),
}

/// Vertex and fragment source split out of one `#shader` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderProgramSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderProgramSource {
    /// Splits `text` on `#shader vertex` / `#shader fragment` marker lines.
    /// Lines before the first marker are dropped.
    pub fn parse(text: &str) -> Self {
        Self::from_lines(text.lines().map(str::to_owned))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let io_err = |source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_err)?;
        Ok(Self::from_lines(lines))
    }

    fn from_lines<I: IntoIterator<Item = String>>(lines: I) -> Self {
        let mut source = Self::default();
        let mut stage = None;

        for line in lines {
            if line.contains(MARKER) {
                if line.contains("vertex") {
                    stage = Some(ShaderStage::Vertex);
                } else if line.contains("fragment") {
                    stage = Some(ShaderStage::Fragment);
                }
                continue;
            }

            let target = match stage {
                Some(ShaderStage::Vertex) => &mut source.vertex,
                Some(ShaderStage::Fragment) => &mut source.fragment,
                None => continue,
            };
            target.push_str(&line);
            target.push('\n');
        }

        source
    }
}

/// Lenient loader: a file that can't be read yields two empty sources.
pub fn parse_shader<P: AsRef<Path>>(path: P) -> ShaderProgramSource {
    ShaderProgramSource::load(path).unwrap_or_else(|err| {
        warn!("{}", err);
        ShaderProgramSource::default()
    })
}

/// Compiles one stage. On failure the shader object is deleted and the info
/// log comes back in the error.
pub fn compile_shader<D: RenderDevice>(
    device: &D,
    stage: ShaderStage,
    source: &str,
) -> Result<D::Shader, ShaderError> {
    let (created, checked) = gl_call_keep(device, "create_shader", |gl| gl.create_shader(stage));
    let shader = created.map_err(ShaderError::Allocation)?;

    let compiled = checked
        .and_then(|()| gl_call(device, "shader_source", |gl| gl.shader_source(shader, source)))
        .and_then(|()| gl_call(device, "compile_shader", |gl| gl.compile_shader(shader)));
    if let Err(err) = compiled {
        device.delete_shader(shader);
        return Err(err.into());
    }

    if !device.shader_compile_status(shader) {
        let log = device.shader_info_log(shader);
        error!("Failed to compile {} shader!", stage);
        error!("{}", log);

        gl_call(device, "delete_shader", |gl| gl.delete_shader(shader))?;
        return Err(ShaderError::Compile { stage, log });
    }

    Ok(shader)
}

/// Links a compiled vertex/fragment pair. Both shader objects are deleted
/// once linking has run, whatever the outcome.
pub fn link_program<D: RenderDevice>(
    device: &D,
    vertex: D::Shader,
    fragment: D::Shader,
) -> Result<D::Program, ShaderError> {
    let (created, checked) = gl_call_keep(device, "create_program", |gl| gl.create_program());
    let program = match created {
        Ok(program) => program,
        Err(reason) => {
            device.delete_shader(vertex);
            device.delete_shader(fragment);
            return Err(ShaderError::Allocation(reason));
        }
    };

    let linked = checked.and_then(|()| {
        gl_call(device, "link_program", |gl| {
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);
        })
    });

    device.delete_shader(vertex);
    device.delete_shader(fragment);

    if let Err(err) = linked {
        device.delete_program(program);
        return Err(err.into());
    }

    if !device.program_link_status(program) {
        let log = device.program_info_log(program);
        error!("Failed to link shader program!");
        error!("{}", log);

        device.delete_program(program);
        return Err(ShaderError::Link { log });
    }

    Ok(program)
}

/// A linked vertex + fragment program with a cache of uniform locations.
pub struct ShaderProgram<D: RenderDevice> {
    device: Rc<D>,
    id: D::Program,
    uniforms: HashMap<String, D::UniformLocation>,
}

impl<D: RenderDevice> ShaderProgram<D> {
    pub fn new(device: Rc<D>, source: &ShaderProgramSource) -> Result<Self, ShaderError> {
        let vertex = compile_shader(&*device, ShaderStage::Vertex, &source.vertex)?;
        let fragment = match compile_shader(&*device, ShaderStage::Fragment, &source.fragment) {
            Ok(fragment) => fragment,
            Err(err) => {
                device.delete_shader(vertex);
                return Err(err);
            }
        };

        let id = link_program(&*device, vertex, fragment)?;
        info!("Linked shader program {:?}", id);

        Ok(Self {
            device,
            id,
            uniforms: HashMap::new(),
        })
    }

    pub fn id(&self) -> D::Program {
        self.id
    }

    pub fn bind(&self) {
        self.device.use_program(Some(self.id));
    }

    pub fn unbind(&self) {
        self.device.use_program(None);
    }

    pub fn uniform_location(&mut self, name: &str) -> Result<D::UniformLocation, ShaderError> {
        if let Some(location) = self.uniforms.get(name) {
            return Ok(location.clone());
        }

        let location = self
            .device
            .uniform_location(self.id, name)
            .ok_or_else(|| ShaderError::UniformNotFound(name.to_string()))?;

        self.uniforms.insert(name.to_string(), location.clone());
        Ok(location)
    }

    /// Binds the program and sets a `vec4` uniform.
    pub fn set_uniform_4f(&mut self, name: &str, value: [f32; 4]) -> Result<(), ShaderError> {
        self.bind();
        let location = self.uniform_location(name)?;
        gl_call(&*self.device, "uniform_4f", |gl| gl.uniform_4f(&location, value))?;
        Ok(())
    }
}

impl<D: RenderDevice> Drop for ShaderProgram<D> {
    fn drop(&mut self) {
        self.device.delete_program(self.id);
    }
}
