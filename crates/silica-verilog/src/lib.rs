//! Verilog simulation backend
//!
//! Lowers an instruction sequence (a [`silica_ir::Kernel`]) into a
//! synthesizable Verilog module and executes it through an external
//! simulator as the kernel's execution engine.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │              Front end (instruction graph)             │
//! └───────────────────────┬───────────────────────────────┘
//!                         ▼
//! ┌───────────────────────────────────────────────────────┐
//! │  VerilogRenderer          kernel → Verilog source      │
//! └───────────────────────┬───────────────────────────────┘
//!                         ▼
//! ┌───────────────────────────────────────────────────────┐
//! │  BuildContext::compile    iverilog → .vvp artifact     │
//! └───────────────────────┬───────────────────────────────┘
//!                         ▼
//! ┌───────────────────────────────────────────────────────┐
//! │  VerilogProgram::launch   hex files ⇄ vvp simulation   │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! Host buffers hold f32; the simulator computes on 64-bit `real`
//! registers, so values cross the boundary as 16-hex-digit double bit
//! patterns, one per line, in per-buffer interchange files.
//!
//! # Usage
//!
//! ```no_run
//! use silica_ir::{DType, Kernel, Op};
//! use silica_verilog::{BuildContext, VerilogProgram, VerilogRenderer};
//!
//! # fn main() -> silica_verilog::Result<()> {
//! let mut kernel = Kernel::new();
//! let out = kernel.define_global(0, DType::f32_vec(4));
//! let a = kernel.define_global(1, DType::f32_vec(4));
//! let b = kernel.define_global(2, DType::f32_vec(4));
//! let bound = kernel.const_int(4, DType::i32());
//! let idx = kernel.special("lidx0", bound);
//! let a_at = kernel.index(a, idx);
//! let a_val = kernel.load(a_at, DType::f32());
//! let b_at = kernel.index(b, idx);
//! let b_val = kernel.load(b_at, DType::f32());
//! let sum = kernel.binary(Op::Add, a_val, b_val, DType::f32());
//! let out_at = kernel.index(out, idx);
//! kernel.store(out_at, sum);
//!
//! let source = VerilogRenderer::new().render(&kernel)?;
//! let ctx = BuildContext::new()?;
//! let program = VerilogProgram::new(ctx.compile(&source)?);
//!
//! let mut out_host = vec![0u8; 16];
//! let mut a_host = bytemuck::cast_slice::<f32, u8>(&[1.0, 2.0, 3.0, 4.0]).to_vec();
//! let mut b_host = bytemuck::cast_slice::<f32, u8>(&[5.0, 6.0, 7.0, 8.0]).to_vec();
//! let mut bufs: Vec<&mut [u8]> =
//!     vec![out_host.as_mut_slice(), a_host.as_mut_slice(), b_host.as_mut_slice()];
//! let elapsed = program.launch(&ctx, &mut bufs)?;
//! # let _ = elapsed;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod hex;
pub mod program;
pub mod render;
pub mod toolchain;

// Re-export public API
pub use backend::{BufferHandle, SimBackend, VerilogBackend};
pub use error::{BackendError, RenderError, Result};
pub use program::VerilogProgram;
pub use render::VerilogRenderer;
pub use toolchain::{Artifact, BuildContext};
