//! End-to-end pipeline tests: render → iverilog → vvp → output readback
//!
//! These tests need Icarus Verilog installed; they skip themselves when
//! `iverilog`/`vvp` are not on PATH so the suite stays green on machines
//! without the toolchain.

use silica_ir::{DType, Kernel, Op};
use silica_verilog::{BackendError, BuildContext, SimBackend, VerilogBackend};
use std::process::Command;
use std::time::Duration;

fn toolchain_available() -> bool {
    Command::new("iverilog").arg("-V").output().is_ok() && Command::new("vvp").arg("-V").output().is_ok()
}

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// buf0[i] = buf1[i] + buf2[i] over 4 elements
fn add_kernel() -> Kernel {
    let mut k = Kernel::new();
    let out = k.define_global(0, DType::f32_vec(4));
    let a = k.define_global(1, DType::f32_vec(4));
    let b = k.define_global(2, DType::f32_vec(4));
    let bound = k.const_int(4, DType::i32());
    let idx = k.special("lidx0", bound);
    let a_at = k.index(a, idx);
    let a_val = k.load(a_at, DType::f32());
    let b_at = k.index(b, idx);
    let b_val = k.load(b_at, DType::f32());
    let sum = k.binary(Op::Add, a_val, b_val, DType::f32());
    let out_at = k.index(out, idx);
    k.store(out_at, sum);
    k
}

#[test]
fn test_add_kernel_end_to_end() {
    init_test_logging();
    if !toolchain_available() {
        eprintln!("iverilog/vvp not installed; skipping");
        return;
    }

    let mut backend = VerilogBackend::new().unwrap();
    let out = backend.allocate_buffer(16).unwrap();
    let a = backend.allocate_buffer(16).unwrap();
    let b = backend.allocate_buffer(16).unwrap();

    backend
        .copy_to_buffer(a, bytemuck::cast_slice(&[1.0f32, 2.0, 3.0, 4.0]))
        .unwrap();
    backend
        .copy_to_buffer(b, bytemuck::cast_slice(&[5.0f32, 6.0, 7.0, 8.0]))
        .unwrap();

    let program = backend.compile_kernel(&add_kernel()).unwrap();
    let elapsed = backend.run(&program, &[out, a, b]).unwrap();
    assert!(elapsed > Duration::ZERO);

    let mut result = [0.0f32; 4];
    backend.copy_from_buffer(out, bytemuck::cast_slice_mut(&mut result)).unwrap();
    assert_eq!(result, [6.0, 8.0, 10.0, 12.0]);
}

#[test]
fn test_recompile_overwrites_artifact() {
    if !toolchain_available() {
        eprintln!("iverilog/vvp not installed; skipping");
        return;
    }

    let mut backend = VerilogBackend::new().unwrap();
    let out = backend.allocate_buffer(16).unwrap();
    let a = backend.allocate_buffer(16).unwrap();
    let b = backend.allocate_buffer(16).unwrap();
    backend
        .copy_to_buffer(a, bytemuck::cast_slice(&[1.0f32, 1.0, 1.0, 1.0]))
        .unwrap();
    backend
        .copy_to_buffer(b, bytemuck::cast_slice(&[2.0f32, 2.0, 2.0, 2.0]))
        .unwrap();

    // second compile in the same context replaces the first artifact
    let _first = backend.compile_kernel(&add_kernel()).unwrap();

    let mut mul = Kernel::new();
    let o = mul.define_global(0, DType::f32_vec(4));
    let x = mul.define_global(1, DType::f32_vec(4));
    let y = mul.define_global(2, DType::f32_vec(4));
    let bound = mul.const_int(4, DType::i32());
    let idx = mul.special("lidx0", bound);
    let x_at = mul.index(x, idx);
    let x_val = mul.load(x_at, DType::f32());
    let y_at = mul.index(y, idx);
    let y_val = mul.load(y_at, DType::f32());
    let prod = mul.binary(Op::Mul, x_val, y_val, DType::f32());
    let o_at = mul.index(o, idx);
    mul.store(o_at, prod);

    let program = backend.compile_kernel(&mul).unwrap();
    backend.run(&program, &[out, a, b]).unwrap();

    let mut result = [0.0f32; 4];
    backend.copy_from_buffer(out, bytemuck::cast_slice_mut(&mut result)).unwrap();
    assert_eq!(result, [2.0, 2.0, 2.0, 2.0]);
}

#[test]
fn test_compile_failure_attaches_generated_source() {
    if !toolchain_available() {
        eprintln!("iverilog/vvp not installed; skipping");
        return;
    }

    let ctx = BuildContext::new().unwrap();
    let bad = "module kernel;\n  this is not verilog\nendmodule\n";
    let err = ctx.compile(bad).unwrap_err();
    match err {
        BackendError::CompileFailed { stderr, source } => {
            assert!(!stderr.is_empty());
            assert!(source.contains("this is not verilog"));
        }
        other => panic!("expected CompileFailed, got {other}"),
    }
}
