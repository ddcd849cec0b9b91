use super::device::{RenderDevice, NO_ERROR};
use super::shaders::ShaderError;
use log::error;
use std::panic::Location;
use thiserror::Error;

/// Upper bound on queued errors drained in one go. A lost context can keep
/// reporting `CONTEXT_LOST` forever.
const MAX_DRAINED_ERRORS: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("[OpenGL Error] ({code:#06x}) {call} {file}:{line}")]
pub struct GlError {
    pub code: u32,
    pub call: &'static str,
    pub file: &'static str,
    pub line: u32,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Gl(#[from] GlError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("Failed to create {kind}: {reason}")]
    Allocation { kind: &'static str, reason: String },
}

/// Drains the error queue so the next check only sees errors from the call
/// of interest.
pub fn clear_errors<D: RenderDevice + ?Sized>(device: &D) {
    for _ in 0..MAX_DRAINED_ERRORS {
        if device.get_error() == NO_ERROR {
            break;
        }
    }
}

/// Polls the error queue after `call`. Every queued error is logged; the
/// first one is returned.
pub fn log_call<D: RenderDevice + ?Sized>(
    device: &D,
    call: &'static str,
    location: &'static Location<'static>,
) -> Result<(), GlError> {
    let mut first = None;
    for _ in 0..MAX_DRAINED_ERRORS {
        let code = device.get_error();
        if code == NO_ERROR {
            break;
        }

        let err = GlError {
            code,
            call,
            file: location.file(),
            line: location.line(),
        };
        error!("{}", err);
        first.get_or_insert(err);
    }

    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Runs `f` between a clear and a check of the error queue, reporting
/// errors against the caller's file and line.
#[track_caller]
pub fn gl_call<D, T, F>(device: &D, call: &'static str, f: F) -> Result<T, GlError>
where
    D: RenderDevice + ?Sized,
    F: FnOnce(&D) -> T,
{
    let (out, checked) = gl_call_keep(device, call, f);
    checked.map(|()| out)
}

/// Like `gl_call`, but hands back the output even when the check fails so
/// an object the call created can still be released.
#[track_caller]
pub fn gl_call_keep<D, T, F>(device: &D, call: &'static str, f: F) -> (T, Result<(), GlError>)
where
    D: RenderDevice + ?Sized,
    F: FnOnce(&D) -> T,
{
    let location = Location::caller();
    clear_errors(device);
    let out = f(device);
    (out, log_call(device, call, location))
}
