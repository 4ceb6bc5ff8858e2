//! External toolchain driver
//!
//! Drives `iverilog` to turn rendered source into a runnable simulation
//! artifact. All on-disk state lives in a [`BuildContext`]: one source
//! file, one artifact, and the interchange files, in a directory the
//! context owns. A context supports one compile-then-simulate pipeline at
//! a time; callers wanting concurrent kernels create one context each.
//!
//! Tool names resolve from `SILICA_IVERILOG` / `SILICA_VVP`, falling back
//! to `iverilog` / `vvp` on `PATH`.

use crate::error::{BackendError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub(crate) fn iverilog_bin() -> String {
    env::var("SILICA_IVERILOG").unwrap_or_else(|_| "iverilog".to_string())
}

pub(crate) fn vvp_bin() -> String {
    env::var("SILICA_VVP").unwrap_or_else(|_| "vvp".to_string())
}

/// Compiled simulation artifact
///
/// Opaque handle to the `.vvp` file produced by [`BuildContext::compile`].
/// Valid as long as its context's directory exists; a later compile in the
/// same context overwrites it.
#[derive(Debug, Clone)]
pub struct Artifact {
    vvp_path: PathBuf,
}

impl Artifact {
    pub(crate) fn from_path(vvp_path: PathBuf) -> Self {
        Self { vvp_path }
    }

    /// Path of the artifact on disk
    pub fn path(&self) -> &Path {
        &self.vvp_path
    }
}

/// Isolated working directory for one compile-then-simulate pipeline
///
/// Owns the source file, the artifact, and the interchange files. No locks
/// are taken: sharing one context across concurrent pipelines is not safe.
#[derive(Debug)]
pub struct BuildContext {
    dir: PathBuf,
    // keeps the temp dir alive for the lifetime of the context
    _temp: Option<TempDir>,
}

impl BuildContext {
    /// Create a context over a fresh temporary directory
    pub fn new() -> Result<Self> {
        let temp = tempfile::Builder::new().prefix("silica-verilog-").tempdir()?;
        Ok(Self {
            dir: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    /// Create a context over a caller-provided directory
    ///
    /// The directory is created if missing and is not cleaned up on drop.
    pub fn at(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, _temp: None })
    }

    /// The working directory holding source, artifact, and interchange files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Compile rendered source into a simulation artifact
    ///
    /// Writes `kernel.v`, invokes the external compiler, and returns the
    /// artifact handle. The artifact location is fixed per context, so a
    /// second compile overwrites the first.
    ///
    /// # Errors
    ///
    /// [`BackendError::CompileFailed`] on non-zero exit, carrying the
    /// captured diagnostics and the offending source text.
    #[tracing::instrument(skip(self, source))]
    pub fn compile(&self, source: &str) -> Result<Artifact> {
        let src_path = self.dir.join("kernel.v");
        let out_path = self.dir.join("kernel.vvp");

        fs::write(&src_path, source)?;

        let tool = iverilog_bin();
        let output = Command::new(&tool)
            .arg("-o")
            .arg(&out_path)
            .arg(&src_path)
            .output()
            .map_err(|e| BackendError::ToolchainMissing { tool, source: e })?;

        if !output.status.success() {
            return Err(BackendError::compile_failed(
                String::from_utf8_lossy(&output.stderr),
                source,
            ));
        }

        tracing::debug!(artifact = %out_path.display(), "compiled kernel");
        Ok(Artifact { vvp_path: out_path })
    }
}

// ================================================================================================
// Tests
// ================================================================================================
