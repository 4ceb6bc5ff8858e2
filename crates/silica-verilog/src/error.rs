//! Error types for the Verilog backend

use silica_ir::{NodeId, Op};

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur while rendering a kernel to Verilog
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The kernel contains an operation kind this backend cannot translate
    #[error("unsupported operation {op} at node {node}")]
    UnsupportedOp { op: Op, node: NodeId },
}

/// Errors that can occur while compiling or simulating a kernel
//
// Display/Error/From are implemented by hand because the `CompileFailed`
// variant's `source` field is plain data (generated Verilog source text),
// not an error cause, and thiserror's derive unconditionally treats a field
// named `source` as the `Error::source()`.
#[derive(Debug)]
pub enum BackendError {
    /// Rendering failed
    Render(RenderError),

    /// The external compiler exited non-zero; carries its diagnostics and
    /// the full generated source for postmortem
    CompileFailed { stderr: String, source: String },

    /// The external simulator exited non-zero
    SimulationFailed { stderr: String },

    /// An external tool could not be launched at all
    ToolchainMissing {
        tool: String,
        source: std::io::Error,
    },

    /// Invalid buffer handle
    InvalidBufferHandle(u64),

    /// Host copy with a size the buffer cannot satisfy
    BufferSizeMismatch { buffer_size: usize, host_size: usize },

    /// Filesystem error in the working directory
    Io(std::io::Error),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(inner) => std::fmt::Display::fmt(inner, f),
            Self::CompileFailed { stderr, source } => write!(
                f,
                "iverilog compilation failed:\n{stderr}\n\ngenerated source:\n{source}"
            ),
            Self::SimulationFailed { stderr } => {
                write!(f, "vvp simulation failed:\n{stderr}")
            }
            Self::ToolchainMissing { tool, source } => {
                write!(f, "failed to launch {tool}: {source}")
            }
            Self::InvalidBufferHandle(handle) => {
                write!(f, "invalid buffer handle: {handle}")
            }
            Self::BufferSizeMismatch { buffer_size, host_size } => write!(
                f,
                "buffer size mismatch: buffer holds {buffer_size} bytes, host side has {host_size}"
            ),
            Self::Io(inner) => write!(f, "i/o error: {inner}"),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(inner) => inner.source(),
            Self::ToolchainMissing { source, .. } => Some(source),
            Self::Io(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<RenderError> for BackendError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl BackendError {
    /// Create a compile failure from captured diagnostics
    pub fn compile_failed(stderr: impl Into<String>, source: impl Into<String>) -> Self {
        Self::CompileFailed {
            stderr: stderr.into(),
            source: source.into(),
        }
    }

    /// Create a simulation failure from captured diagnostics
    pub fn simulation_failed(stderr: impl Into<String>) -> Self {
        Self::SimulationFailed { stderr: stderr.into() }
    }
}
