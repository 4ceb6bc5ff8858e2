//! Backend surface for the host framework
//!
//! The interface the generic device/allocator/compiler framework drives:
//! allocate raw storage, copy host bytes in and out, compile a kernel,
//! execute it. [`VerilogBackend`] implements it over host `Vec<u8>`
//! storage and one owned [`BuildContext`].

use crate::error::{BackendError, Result};
use crate::program::VerilogProgram;
use crate::render::VerilogRenderer;
use crate::toolchain::BuildContext;
use silica_ir::Kernel;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Handle to an allocated buffer
///
/// Buffers are opaque handles managed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

impl BufferHandle {
    /// Create a new buffer handle
    pub const fn new(id: u64) -> Self {
        BufferHandle(id)
    }

    /// Get the internal ID
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buf{}", self.0)
    }
}

/// Backend trait for simulated kernel execution
///
/// Buffer management plus the compile/execute pipeline. Buffer order in
/// [`SimBackend::run`] follows the kernel's convention: index 0 is the
/// output buffer, all others are inputs.
pub trait SimBackend {
    /// Allocate a buffer of the given size in bytes
    fn allocate_buffer(&mut self, size: usize) -> Result<BufferHandle>;

    /// Free a previously allocated buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer handle is invalid.
    fn free_buffer(&mut self, handle: BufferHandle) -> Result<()>;

    /// Copy data from host to buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is invalid or sizes differ.
    fn copy_to_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> Result<()>;

    /// Copy data from buffer to host
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is invalid or sizes differ.
    fn copy_from_buffer(&self, handle: BufferHandle, data: &mut [u8]) -> Result<()>;

    /// Get buffer size in bytes
    fn buffer_size(&self, handle: BufferHandle) -> Result<usize>;

    /// Render and compile a kernel into a runnable program
    fn compile_kernel(&mut self, kernel: &Kernel) -> Result<VerilogProgram>;

    /// Execute a compiled program over the given buffers
    ///
    /// Returns elapsed wall-clock time of the simulation call.
    fn run(&mut self, program: &VerilogProgram, buffers: &[BufferHandle]) -> Result<Duration>;
}

/// Verilog simulation backend
///
/// One build context per backend; at most one compile-then-simulate
/// pipeline in flight per backend. Create separate backends for
/// concurrent kernels.
#[derive(Debug)]
pub struct VerilogBackend {
    ctx: BuildContext,
    renderer: VerilogRenderer,
    buffers: HashMap<u64, Vec<u8>>,
    next_id: u64,
}

impl VerilogBackend {
    /// Create a backend over a fresh temporary working directory
    pub fn new() -> Result<Self> {
        Ok(Self::with_context(BuildContext::new()?))
    }

    /// Create a backend over an existing build context
    pub fn with_context(ctx: BuildContext) -> Self {
        Self {
            ctx,
            renderer: VerilogRenderer::new(),
            buffers: HashMap::new(),
            next_id: 0,
        }
    }

    /// The build context this backend compiles and runs in
    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }
}

impl SimBackend for VerilogBackend {
    fn allocate_buffer(&mut self, size: usize) -> Result<BufferHandle> {
        let id = self.next_id;
        self.next_id += 1;
        self.buffers.insert(id, vec![0u8; size]);
        Ok(BufferHandle::new(id))
    }

    fn free_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        self.buffers
            .remove(&handle.id())
            .map(|_| ())
            .ok_or(BackendError::InvalidBufferHandle(handle.id()))
    }

    fn copy_to_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> Result<()> {
        let buf = self
            .buffers
            .get_mut(&handle.id())
            .ok_or(BackendError::InvalidBufferHandle(handle.id()))?;
        if buf.len() != data.len() {
            return Err(BackendError::BufferSizeMismatch {
                buffer_size: buf.len(),
                host_size: data.len(),
            });
        }
        buf.copy_from_slice(data);
        Ok(())
    }

    fn copy_from_buffer(&self, handle: BufferHandle, data: &mut [u8]) -> Result<()> {
        let buf = self
            .buffers
            .get(&handle.id())
            .ok_or(BackendError::InvalidBufferHandle(handle.id()))?;
        if buf.len() != data.len() {
            return Err(BackendError::BufferSizeMismatch {
                buffer_size: buf.len(),
                host_size: data.len(),
            });
        }
        data.copy_from_slice(buf);
        Ok(())
    }

    fn buffer_size(&self, handle: BufferHandle) -> Result<usize> {
        self.buffers
            .get(&handle.id())
            .map(Vec::len)
            .ok_or(BackendError::InvalidBufferHandle(handle.id()))
    }

    fn compile_kernel(&mut self, kernel: &Kernel) -> Result<VerilogProgram> {
        let source = self.renderer.render(kernel).map_err(BackendError::from)?;
        let artifact = self.ctx.compile(&source)?;
        Ok(VerilogProgram::new(artifact))
    }

    fn run(&mut self, program: &VerilogProgram, buffers: &[BufferHandle]) -> Result<Duration> {
        // detach storage so the bridge can borrow every buffer mutably at once
        let mut storage: Vec<(u64, Vec<u8>)> = Vec::with_capacity(buffers.len());
        for handle in buffers {
            match self.buffers.remove(&handle.id()) {
                Some(buf) => storage.push((handle.id(), buf)),
                None => {
                    // reattach what was already detached before failing
                    for (id, buf) in storage {
                        self.buffers.insert(id, buf);
                    }
                    return Err(BackendError::InvalidBufferHandle(handle.id()));
                }
            }
        }

        let mut views: Vec<&mut [u8]> = storage.iter_mut().map(|(_, b)| b.as_mut_slice()).collect();
        let result = program.launch(&self.ctx, &mut views);

        for (id, buf) in storage {
            self.buffers.insert(id, buf);
        }
        result
    }
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_lifecycle() {
        let mut backend = VerilogBackend::new().unwrap();
        let buf = backend.allocate_buffer(16).unwrap();
        assert_eq!(backend.buffer_size(buf).unwrap(), 16);

        let data = [1.0f32, 2.0, 3.0, 4.0];
        backend.copy_to_buffer(buf, bytemuck::cast_slice(&data)).unwrap();

        let mut out = [0.0f32; 4];
        backend.copy_from_buffer(buf, bytemuck::cast_slice_mut(&mut out)).unwrap();
        assert_eq!(out, data);

        backend.free_buffer(buf).unwrap();
        assert!(matches!(
            backend.buffer_size(buf),
            Err(BackendError::InvalidBufferHandle(_))
        ));
    }

    #[test]
    fn test_copy_size_mismatch() {
        let mut backend = VerilogBackend::new().unwrap();
        let buf = backend.allocate_buffer(8).unwrap();
        let err = backend.copy_to_buffer(buf, &[0u8; 4]).unwrap_err();
        assert!(matches!(err, BackendError::BufferSizeMismatch { buffer_size: 8, host_size: 4 }));
    }

    #[test]
    fn test_run_rejects_unknown_handle() {
        let mut backend = VerilogBackend::new().unwrap();
        let good = backend.allocate_buffer(4).unwrap();
        let artifact_path = backend.context().dir().join("kernel.vvp");
        std::fs::write(&artifact_path, "").unwrap();
        let program = VerilogProgram::new(crate::toolchain::Artifact::from_path(artifact_path));

        let err = backend.run(&program, &[good, BufferHandle::new(99)]).unwrap_err();
        assert!(matches!(err, BackendError::InvalidBufferHandle(99)));
        // the detached buffer was reattached
        assert_eq!(backend.buffer_size(good).unwrap(), 4);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(BufferHandle::new(3).to_string(), "buf3");
    }
}
