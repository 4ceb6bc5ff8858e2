//! Execution bridge
//!
//! Runs a compiled artifact against host buffers. Inputs are marshaled to
//! `input_<id>.hex` files in the build context's directory, the external
//! simulator runs with that directory as its working directory, and the
//! simulation's `output_0.hex` is demarshaled back into buffer 0.

use crate::error::{BackendError, Result};
use crate::hex;
use crate::toolchain::{vvp_bin, Artifact, BuildContext};
use std::process::Command;
use std::time::{Duration, Instant};

/// A runnable compiled kernel
#[derive(Debug, Clone)]
pub struct VerilogProgram {
    artifact: Artifact,
}

impl VerilogProgram {
    pub fn new(artifact: Artifact) -> Self {
        Self { artifact }
    }

    /// The compiled artifact this program runs
    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Run the simulation over the given host buffers
    ///
    /// Buffer 0 is the output; all others are inputs. Raw bytes are
    /// treated as f32 elements. Returns elapsed wall-clock time for the
    /// whole call, marshaling included.
    ///
    /// The call blocks until the simulator exits; there is no cancellation
    /// and no retry. If the simulation produced fewer output values than
    /// the output buffer holds, the tail is left unchanged.
    ///
    /// # Errors
    ///
    /// [`BackendError::SimulationFailed`] on non-zero simulator exit, with
    /// the captured diagnostic stream.
    #[tracing::instrument(skip(self, ctx, buffers), fields(buffers = buffers.len()))]
    pub fn launch(&self, ctx: &BuildContext, buffers: &mut [&mut [u8]]) -> Result<Duration> {
        let start = Instant::now();

        for (i, buf) in buffers.iter().enumerate().skip(1) {
            let path = ctx.dir().join(hex::input_file_name(i as i64));
            hex::write_hex_file(&path, buf)?;
        }

        let tool = vvp_bin();
        let output = Command::new(&tool)
            .arg(self.artifact.path())
            .current_dir(ctx.dir())
            .output()
            .map_err(|e| BackendError::ToolchainMissing { tool, source: e })?;

        if !output.status.success() {
            return Err(BackendError::simulation_failed(String::from_utf8_lossy(&output.stderr)));
        }

        if let Some(out) = buffers.first_mut() {
            let out_path = ctx.dir().join(hex::OUTPUT_FILE);
            if out_path.exists() {
                let written = hex::read_hex_file(&out_path, out)?;
                tracing::debug!(values = written, "read simulation output");
            }
        }

        Ok(start.elapsed())
    }
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to serialize SILICA_VVP tests and prevent race conditions.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn stub_program(ctx: &BuildContext) -> VerilogProgram {
        let path = ctx.dir().join("kernel.vvp");
        std::fs::write(&path, "").unwrap();
        VerilogProgram::new(Artifact::from_path(path))
    }

    #[test]
    fn test_simulation_failure_is_hard_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        let ctx = BuildContext::new().unwrap();
        let program = stub_program(&ctx);

        // point vvp at a command that always exits non-zero
        std::env::set_var("SILICA_VVP", "false");
        let mut out = vec![0u8; 4];
        let mut bufs: Vec<&mut [u8]> = vec![out.as_mut_slice()];
        let err = program.launch(&ctx, &mut bufs).unwrap_err();
        std::env::remove_var("SILICA_VVP");

        assert!(matches!(err, BackendError::SimulationFailed { .. }));
    }

    #[test]
    fn test_missing_output_file_leaves_buffer_untouched() {
        let _guard = ENV_LOCK.lock().unwrap();
        let ctx = BuildContext::new().unwrap();
        let program = stub_program(&ctx);

        // a simulator that exits cleanly without writing output_0.hex
        std::env::set_var("SILICA_VVP", "true");
        let mut out = Vec::new();
        for v in [7.0f32, 8.0] {
            out.extend_from_slice(&v.to_ne_bytes());
        }
        let mut bufs: Vec<&mut [u8]> = vec![out.as_mut_slice()];
        let elapsed = program.launch(&ctx, &mut bufs).unwrap();
        std::env::remove_var("SILICA_VVP");

        assert!(elapsed > Duration::ZERO);
        let floats: &[f32] = bytemuck::cast_slice(&out);
        assert_eq!(floats, &[7.0, 8.0]);
    }

    #[test]
    fn test_inputs_written_output_skipped() {
        let _guard = ENV_LOCK.lock().unwrap();
        let ctx = BuildContext::new().unwrap();
        let program = stub_program(&ctx);

        std::env::set_var("SILICA_VVP", "true");
        let mut out = vec![0u8; 4];
        let mut a = 1.0f32.to_ne_bytes().to_vec();
        let mut b = 2.0f32.to_ne_bytes().to_vec();
        let mut bufs: Vec<&mut [u8]> = vec![out.as_mut_slice(), a.as_mut_slice(), b.as_mut_slice()];
        program.launch(&ctx, &mut bufs).unwrap();
        std::env::remove_var("SILICA_VVP");

        assert!(ctx.dir().join("input_1.hex").exists());
        assert!(ctx.dir().join("input_2.hex").exists());
        assert!(!ctx.dir().join("input_0.hex").exists());
        let text = std::fs::read_to_string(ctx.dir().join("input_1.hex")).unwrap();
        assert_eq!(text, "3ff0000000000000\n");
    }
}
