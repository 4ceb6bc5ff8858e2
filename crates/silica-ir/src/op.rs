//! Operation kinds, data types, and node arguments
//!
//! The fundamental value types every instruction node is expressed over:
//! - Operation kinds (closed enumeration)
//! - Result data types (scalar base plus vector width)
//! - Operation-specific arguments

use std::fmt;

// ================================================================================================
// Operation Kinds
// ================================================================================================

/// Operation kind of an instruction node
///
/// This is the closed set of kinds the front end emits. Backends translate
/// a subset; kinds outside a backend's table must fail rendering with a
/// clear diagnostic rather than silently produce invalid output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Op {
    // Memory and structure
    /// Declares a logical memory buffer; arg is the buffer id, id 0 is the output
    DefineGlobal,
    /// A literal value; arg carries the literal
    Const,
    /// A loop/thread index variable; arg is its name, src\[0\] is the bound
    Special,
    /// Buffer element address: src\[0\] buffer, src\[1\] index
    Index,
    /// Read through an address
    Load,
    /// Write to an address: src\[0\] destination, src\[1\] value
    Store,

    // Arithmetic and comparison
    Add,
    Sub,
    Mul,
    Max,
    /// Less-than comparison
    CmpLt,
    /// 3-way select: src\[0\] condition, src\[1\] then, src\[2\] else
    Where,

    // Vector and type handling
    /// Type coercion
    Cast,
    /// Vector element extract; arg carries the element offsets
    Gep,
    /// Combine scalar sources into a vector; only valid as a STORE value
    Vectorize,

    // Structural no-ops
    Sink,
    Noop,
    Barrier,

    // Front-end kinds with no translation in the Verilog backend
    Exp2,
    Log2,
    Sin,
    Sqrt,
    Recip,
    Idiv,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::DefineGlobal => "DEFINE_GLOBAL",
            Op::Const => "CONST",
            Op::Special => "SPECIAL",
            Op::Index => "INDEX",
            Op::Load => "LOAD",
            Op::Store => "STORE",
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Max => "MAX",
            Op::CmpLt => "CMPLT",
            Op::Where => "WHERE",
            Op::Cast => "CAST",
            Op::Gep => "GEP",
            Op::Vectorize => "VECTORIZE",
            Op::Sink => "SINK",
            Op::Noop => "NOOP",
            Op::Barrier => "BARRIER",
            Op::Exp2 => "EXP2",
            Op::Log2 => "LOG2",
            Op::Sin => "SIN",
            Op::Sqrt => "SQRT",
            Op::Recip => "RECIP",
            Op::Idiv => "IDIV",
            Op::Mod => "MOD",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Xor => "XOR",
            Op::Shl => "SHL",
            Op::Shr => "SHR",
        };
        write!(f, "{name}")
    }
}

// ================================================================================================
// Data Types
// ================================================================================================

/// Scalar base of a node's result type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ScalarType {
    Bool,
    I32,
    F32,
    F64,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Bool => write!(f, "bool"),
            ScalarType::I32 => write!(f, "i32"),
            ScalarType::F32 => write!(f, "f32"),
            ScalarType::F64 => write!(f, "f64"),
        }
    }
}

/// Result data type of a node: scalar base plus vector width
///
/// For a `DEFINE_GLOBAL` node the vector width is the element count of the
/// declared buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DType {
    pub scalar: ScalarType,
    pub count: usize,
}

impl DType {
    /// Create a new data type
    pub const fn new(scalar: ScalarType, count: usize) -> Self {
        Self { scalar, count }
    }

    /// Scalar f32
    pub const fn f32() -> Self {
        Self::new(ScalarType::F32, 1)
    }

    /// Vector of f32 with `count` elements
    pub const fn f32_vec(count: usize) -> Self {
        Self::new(ScalarType::F32, count)
    }

    /// Scalar f64
    pub const fn f64() -> Self {
        Self::new(ScalarType::F64, 1)
    }

    /// Scalar i32
    pub const fn i32() -> Self {
        Self::new(ScalarType::I32, 1)
    }

    /// Scalar bool
    pub const fn bool() -> Self {
        Self::new(ScalarType::Bool, 1)
    }

    /// Element count derived from this type (1 for scalars)
    pub const fn size(self) -> usize {
        self.count
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 1 {
            write!(f, "{}", self.scalar)
        } else {
            write!(f, "{}x{}", self.scalar, self.count)
        }
    }
}

// ================================================================================================
// Node Arguments
// ================================================================================================

/// Operation-specific argument of a node
///
/// May be absent, an integer (buffer id, integer literal), a float
/// (literal), a string (index variable name), or a small integer tuple
/// (GEP element offsets).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Arg {
    None,
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<i64>),
}

impl Arg {
    /// Integer value, if this argument is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// String value, if this argument is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }

    /// First tuple element, defaulting to 0 (GEP convention)
    pub fn first_element(&self) -> i64 {
        match self {
            Arg::Tuple(elems) => elems.first().copied().unwrap_or(0),
            Arg::Int(v) => *v,
            _ => 0,
        }
    }
}

impl fmt::Display for Arg {
    /// Literal textual form, as emitted into generated source for CONST nodes
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::None => Ok(()),
            Arg::Int(v) => write!(f, "{v}"),
            Arg::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Arg::Str(s) => write!(f, "{s}"),
            Arg::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

// ================================================================================================
// Tests
// ================================================================================================
