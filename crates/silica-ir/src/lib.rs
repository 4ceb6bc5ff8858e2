//! Instruction graph model for the silica backends
//!
//! This crate defines the data a backend consumes, not the front end that
//! produces it:
//! - **Op**: the closed set of operation kinds
//! - **DType**: element type and vector width of a node's result
//! - **Arg**: the operation-specific argument (buffer id, literal, index name, ...)
//! - **Kernel**: an arena of nodes addressed by [`NodeId`]
//!
//! Nodes are addressed by arena index rather than by value, so two
//! structurally identical nodes stay distinct. A [`Kernel`] can only be
//! built by pushing nodes whose sources are already in the arena, which
//! makes every kernel topologically ordered by construction.

pub mod graph;
pub mod op;

pub use graph::{Kernel, Node, NodeId};
pub use op::{Arg, DType, Op, ScalarType};
