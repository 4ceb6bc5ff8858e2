//! Node arena and kernel construction
//!
//! A [`Kernel`] owns its nodes in a flat arena. Sources are arena indices
//! ([`NodeId`]), so node identity is positional and repeated references to
//! the same node share one id. `push` only accepts sources that already
//! exist, which keeps every kernel topologically sorted and acyclic.

use crate::op::{Arg, DType, Op};
use std::fmt;

// ================================================================================================
// Node Identity
// ================================================================================================

/// Arena index of a node within a [`Kernel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Get the arena index
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

// ================================================================================================
// Nodes
// ================================================================================================

/// A single instruction node
///
/// Immutable once pushed into a kernel: an operation kind, a result data
/// type, an operation-specific argument, and the ordered list of source
/// nodes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub op: Op,
    pub dtype: DType,
    pub arg: Arg,
    pub src: Vec<NodeId>,
}

// ================================================================================================
// Kernel
// ================================================================================================

/// An ordered, topologically sorted instruction sequence
///
/// Built front-to-back with [`Kernel::push`]; every source reference must
/// name a node already in the arena.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Kernel {
    nodes: Vec<Node>,
}

impl Kernel {
    /// Create an empty kernel
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, returning its id
    ///
    /// # Panics
    ///
    /// Panics if any source id is not yet in the arena. This is the
    /// topological invariant the backend relies on, enforced at the only
    /// point a reference can be created.
    pub fn push(&mut self, op: Op, dtype: DType, arg: Arg, src: Vec<NodeId>) -> NodeId {
        for s in &src {
            assert!(
                s.index() < self.nodes.len(),
                "source {s} references a node not yet in the kernel"
            );
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { op, dtype, arg, src });
        id
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// All nodes in sequence order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the kernel holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ============================================================================================
    // Convenience builders
    // ============================================================================================

    /// Declare a buffer with the given id; id 0 is the kernel output
    pub fn define_global(&mut self, buffer: i64, dtype: DType) -> NodeId {
        self.push(Op::DefineGlobal, dtype, Arg::Int(buffer), vec![])
    }

    /// Integer literal
    pub fn const_int(&mut self, value: i64, dtype: DType) -> NodeId {
        self.push(Op::Const, dtype, Arg::Int(value), vec![])
    }

    /// Float literal
    pub fn const_float(&mut self, value: f64, dtype: DType) -> NodeId {
        self.push(Op::Const, dtype, Arg::Float(value), vec![])
    }

    /// Index variable named `name`, bounded by the `bound` node
    pub fn special(&mut self, name: &str, bound: NodeId) -> NodeId {
        self.push(Op::Special, DType::i32(), Arg::Str(name.to_string()), vec![bound])
    }

    /// Buffer element address `buffer[index]`
    pub fn index(&mut self, buffer: NodeId, index: NodeId) -> NodeId {
        self.push(Op::Index, DType::i32(), Arg::None, vec![buffer, index])
    }

    /// Read through an address
    pub fn load(&mut self, addr: NodeId, dtype: DType) -> NodeId {
        self.push(Op::Load, dtype, Arg::None, vec![addr])
    }

    /// Write `value` to an address
    pub fn store(&mut self, addr: NodeId, value: NodeId) -> NodeId {
        self.push(Op::Store, DType::f32(), Arg::None, vec![addr, value])
    }

    /// Binary operation over two sources
    pub fn binary(&mut self, op: Op, a: NodeId, b: NodeId, dtype: DType) -> NodeId {
        self.push(op, dtype, Arg::None, vec![a, b])
    }

    /// Debug dump: one node per line
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        for (i, n) in self.nodes.iter().enumerate() {
            out.push_str(&format!("n{i}: {} {} arg={}", n.op, n.dtype, n.arg));
            if !n.src.is_empty() {
                out.push_str(" src=[");
                for (j, s) in n.src.iter().enumerate() {
                    if j > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&s.to_string());
                }
                out.push(']');
            }
            out.push('\n');
        }
        out
    }
}

// ================================================================================================
// Tests
// ================================================================================================
