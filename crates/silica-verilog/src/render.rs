//! Kernel-to-Verilog rendering
//!
//! Pure lowering of an instruction sequence into a single synthesizable
//! `module kernel`. No I/O and no external processes: the renderer returns
//! source text, the toolchain driver turns it into an artifact.
//!
//! Two passes over the sequence:
//! 1. collect buffer declarations (`DEFINE_GLOBAL`) and statically bounded
//!    index variables (`SPECIAL` whose bound source is a `CONST`);
//! 2. translate every node into its textual value, memoized per arena
//!    index, appending assignment statements for `STORE` nodes.
//!
//! The body is then wrapped in one nested `for` per index variable
//! (first-seen order, closed in reverse), or a single `begin` block when
//! the front end already fully vectorized the kernel.
//!
//! Each buffer gets two views: a `reg [63:0]` bit store fed by
//! `$readmemh`/`$writememh` interchange files, and a `real` numeric store
//! converted with `$bitstoreal`/`$realtobits`.

use crate::error::RenderError;
use crate::hex;
use silica_ir::{Kernel, NodeId, Op};
use std::collections::BTreeMap;

/// Renders instruction sequences to Verilog source text
///
/// Stateless; all per-kernel bookkeeping lives in [`RenderState`].
#[derive(Debug, Default)]
pub struct VerilogRenderer;

impl VerilogRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a kernel to Verilog source
    ///
    /// Output is deterministic: buffers declare in ascending id order,
    /// index variables in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnsupportedOp`] for operation kinds with no
    /// Verilog translation. References to nodes whose text was never
    /// computed (a caller contract violation: unordered or disconnected
    /// graph) degrade to a safe placeholder instead of failing; each miss
    /// is logged and counted.
    #[tracing::instrument(skip(self, kernel), fields(nodes = kernel.len()))]
    pub fn render(&self, kernel: &Kernel) -> Result<String, RenderError> {
        let mut state = RenderState::new(kernel);
        state.collect_declarations();
        state.translate()?;
        if state.misses > 0 {
            tracing::warn!(
                misses = state.misses,
                "kernel referenced values that were never rendered; placeholders substituted"
            );
        }
        Ok(state.emit())
    }
}

/// A buffer registered by a `DEFINE_GLOBAL` node
struct BufferDecl {
    name: String,
    size: usize,
}

struct RenderState<'k> {
    kernel: &'k Kernel,
    /// Buffers keyed by id; BTreeMap keeps declaration order sorted
    buffers: BTreeMap<i64, BufferDecl>,
    /// Index variables in first-seen order
    index_vars: Vec<(String, i64)>,
    /// Rendered textual value per arena index
    values: Vec<Option<String>>,
    /// Assignment statements accumulated from STORE nodes
    body: Vec<String>,
    /// Lookup misses observed while translating
    misses: usize,
}

impl<'k> RenderState<'k> {
    fn new(kernel: &'k Kernel) -> Self {
        Self {
            kernel,
            buffers: BTreeMap::new(),
            index_vars: Vec::new(),
            values: vec![None; kernel.len()],
            body: Vec::new(),
            misses: 0,
        }
    }

    /// Pass 1: register buffers and statically bounded index variables
    fn collect_declarations(&mut self) {
        for node in self.kernel.nodes() {
            match node.op {
                Op::DefineGlobal => {
                    if let Some(id) = node.arg.as_int() {
                        self.buffers.insert(
                            id,
                            BufferDecl {
                                name: format!("buf{id}"),
                                size: node.dtype.size(),
                            },
                        );
                    }
                }
                Op::Special => {
                    let Some(name) = node.arg.as_str() else { continue };
                    let bound = node.src.first().map(|&s| self.kernel.node(s));
                    match bound {
                        Some(b) if b.op == Op::Const => {
                            if let Some(limit) = b.arg.as_int() {
                                if !self.index_vars.iter().any(|(n, _)| n == name) {
                                    self.index_vars.push((name.to_string(), limit));
                                }
                            }
                        }
                        _ => {
                            // bound not statically resolvable; the loop is dropped
                            tracing::warn!(index = name, "SPECIAL bound does not resolve to a constant");
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Rendered text of the `n`th source, or `default` when the source is
    /// absent or was never rendered
    fn source_or(&mut self, src: &[NodeId], n: usize, default: &str) -> String {
        match src.get(n) {
            Some(&id) => self.value_or(id, default),
            None => default.to_string(),
        }
    }

    /// Rendered text of a source node, or a placeholder on a contract violation
    fn value_or(&mut self, id: NodeId, default: &str) -> String {
        match &self.values[id.index()] {
            Some(v) => v.clone(),
            None => {
                self.misses += 1;
                tracing::warn!(node = id.index(), default, "missing rendered value; substituting placeholder");
                default.to_string()
            }
        }
    }

    /// Pass 2: translate every node, memoizing its text by arena index
    fn translate(&mut self) -> Result<(), RenderError> {
        for i in 0..self.kernel.len() {
            let id = NodeId(i);
            let node = self.kernel.node(id);
            let op = node.op;
            let (arg, src) = (node.arg.clone(), node.src.clone());

            match op {
                Op::DefineGlobal => {
                    let name = arg
                        .as_int()
                        .and_then(|b| self.buffers.get(&b))
                        .map(|d| d.name.clone())
                        .unwrap_or_else(|| "buf0".to_string());
                    self.values[i] = Some(name);
                }

                Op::Const => {
                    self.values[i] = Some(arg.to_string());
                }

                Op::Special => {
                    self.values[i] = Some(arg.as_str().unwrap_or_default().to_string());
                }

                Op::Index => {
                    let buf = self.source_or(&src, 0, "buf0");
                    let idx = self.source_or(&src, 1, "0");
                    self.values[i] = Some(format!("{buf}[{idx}]"));
                }

                Op::Load => {
                    // a load just references the addressed location
                    let addr = self.source_or(&src, 0, "0");
                    self.values[i] = Some(addr);
                }

                Op::Store => self.translate_store(&src),

                Op::Add | Op::Sub | Op::Mul => {
                    let sym = match op {
                        Op::Add => "+",
                        Op::Sub => "-",
                        _ => "*",
                    };
                    let a = self.source_or(&src, 0, "0");
                    let b = self.source_or(&src, 1, "0");
                    self.values[i] = Some(format!("({a} {sym} {b})"));
                }

                Op::Max => {
                    let a = self.source_or(&src, 0, "0");
                    let b = self.source_or(&src, 1, "0");
                    self.values[i] = Some(format!("(({a} > {b}) ? {a} : {b})"));
                }

                Op::CmpLt => {
                    let a = self.source_or(&src, 0, "0");
                    let b = self.source_or(&src, 1, "0");
                    self.values[i] = Some(format!("({a} < {b})"));
                }

                Op::Where => {
                    let cond = self.source_or(&src, 0, "0");
                    let a = self.source_or(&src, 1, "0");
                    let b = self.source_or(&src, 2, "0");
                    self.values[i] = Some(format!("({cond} ? {a} : {b})"));
                }

                Op::Cast => {
                    // real handles the numerics; no conversion at this layer
                    let v = self.source_or(&src, 0, "0");
                    self.values[i] = Some(v);
                }

                Op::Gep => {
                    let v = self.source_or(&src, 0, "0");
                    let elem = arg.first_element();
                    self.values[i] = Some(match v.split_once('[') {
                        Some((base, _)) => format!("{base}[{elem}]"),
                        None => format!("{v}_{elem}"),
                    });
                }

                Op::Vectorize => {
                    // unpacked by the enclosing STORE; any other consumer
                    // hits the placeholder path
                    self.values[i] = Some(format!("vec_{i}"));
                }

                Op::Sink | Op::Noop | Op::Barrier => {}

                Op::Exp2
                | Op::Log2
                | Op::Sin
                | Op::Sqrt
                | Op::Recip
                | Op::Idiv
                | Op::Mod
                | Op::And
                | Op::Or
                | Op::Xor
                | Op::Shl
                | Op::Shr => {
                    return Err(RenderError::UnsupportedOp { op, node: id });
                }
            }
        }
        Ok(())
    }

    /// Emit assignment statements for a STORE node
    fn translate_store(&mut self, src: &[NodeId]) {
        let dest = self.source_or(src, 0, "buf0[0]");
        let Some(&value_id) = src.get(1) else {
            self.body.push(format!("      {dest} = 0;"));
            return;
        };

        if self.kernel.node(value_id).op == Op::Vectorize {
            // one assignment per vector element, addressed from the
            // destination's buffer-name prefix
            match dest.split_once('[') {
                Some((base, _)) => {
                    let elems = self.kernel.node(value_id).src.clone();
                    let base = base.to_string();
                    for (j, elem) in elems.into_iter().enumerate() {
                        let v = self.value_or(elem, "0");
                        self.body.push(format!("      {base}[{j}] = {v};"));
                    }
                }
                None => {
                    self.body.push(format!("      {dest} = 0; // vectorize store fallback"));
                }
            }
        } else {
            let v = self.value_or(value_id, "0");
            self.body.push(format!("      {dest} = {v};"));
        }
    }

    /// Assemble the final module text
    fn emit(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.push("module kernel;".to_string());
        lines.push(String::new());

        // two views per buffer: raw bit store and numeric store
        for decl in self.buffers.values() {
            lines.push(format!("  reg [63:0] {}_bits [0:{}];", decl.name, decl.size - 1));
            lines.push(format!("  real {} [0:{}];", decl.name, decl.size - 1));
        }

        lines.push(String::new());
        // _i drives the memory conversion loops
        lines.push("  integer _i;".to_string());
        for (name, _) in &self.index_vars {
            lines.push(format!("  integer {name};"));
        }
        lines.push(String::new());
        lines.push("  initial begin".to_string());

        // load each input buffer's bit pattern, convert to real
        for (&id, decl) in &self.buffers {
            if id > 0 {
                lines.push(format!("    $readmemh(\"{}\", {}_bits);", hex::input_file_name(id), decl.name));
                lines.push(format!("    for (_i = 0; _i < {}; _i = _i + 1)", decl.size));
                lines.push(format!("      {}[_i] = $bitstoreal({}_bits[_i]);", decl.name, decl.name));
            }
        }

        lines.push(String::new());
        if self.index_vars.is_empty() {
            lines.push("    begin  // vectorized (no loop)".to_string());
        } else {
            for (name, bound) in &self.index_vars {
                lines.push(format!(
                    "    for ({name} = 0; {name} < {bound}; {name} = {name} + 1) begin"
                ));
            }
        }

        lines.extend(self.body.iter().cloned());

        // close the nested loops (or the single block) in reverse
        let blocks = self.index_vars.len().max(1);
        for _ in 0..blocks {
            lines.push("    end".to_string());
        }
        lines.push(String::new());

        // convert the output back to bits and write its interchange file
        if let Some(decl) = self.buffers.get(&0) {
            lines.push(format!("    for (_i = 0; _i < {}; _i = _i + 1)", decl.size));
            lines.push(format!("      {}_bits[_i] = $realtobits({}[_i]);", decl.name, decl.name));
            lines.push(format!("    $writememh(\"{}\", {}_bits);", hex::OUTPUT_FILE, decl.name));
        }

        lines.push("    $finish;".to_string());
        lines.push("  end".to_string());
        lines.push("endmodule".to_string());

        lines.join("\n")
    }
}

// ================================================================================================
// Tests
// ================================================================================================
