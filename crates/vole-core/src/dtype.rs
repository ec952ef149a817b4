use std::fmt;

// DType — Supported element types
//
// The kernels are written once, generically, and instantiated for exactly
// two precisions:
//
//   F32  — 32-bit float, the default workhorse
//   F64  — 64-bit float, for high-precision work and reference checks
//
// Integer and boolean tensors never reach this library; the owning tensor
// layer casts before dispatching.

/// Enum of the element data types the kernels are instantiated for.
///
/// Stored by the dispatch layer so operations can be routed to the correct
/// monomorphized kernel at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        write!(f, "{}", s)
    }
}

// WithDType / KernelFloat — Traits that connect Rust types to kernels
//
// WithDType is the bridge between Rust's type system and the runtime DType.
// KernelFloat layers on top of it everything a kernel body needs that
// `num_traits::Float` does not provide: the error function and the encoding
// of a row-local sort index as an element value.
//
// erf comes from libm so that f32 stays in f32 (`erff`) instead of being
// widened to f64 and narrowed back.

/// Trait implemented by Rust types that can be stored in a kernel buffer.
pub trait WithDType: Copy + Send + Sync + 'static + num_traits::NumCast + fmt::Debug {
    /// The corresponding DType enum variant.
    const DTYPE: DType;

    /// Convert this value to f64.
    fn to_f64(self) -> f64;

    /// Create a value of this type from f64 (narrowing for f32).
    fn from_f64(v: f64) -> Self;
}

/// Floating-point element type every kernel is generic over.
pub trait KernelFloat: WithDType + num_traits::Float {
    /// Gauss error function, evaluated in this precision.
    fn erf(self) -> Self;

    /// Encode a row-local sort index as an element value.
    fn from_index(idx: u32) -> Self;
}

impl WithDType for f32 {
    const DTYPE: DType = DType::F32;
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl WithDType for f64 {
    const DTYPE: DType = DType::F64;
    fn to_f64(self) -> f64 {
        self
    }
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl KernelFloat for f32 {
    fn erf(self) -> Self {
        libm::erff(self)
    }
    fn from_index(idx: u32) -> Self {
        idx as f32
    }
}

impl KernelFloat for f64 {
    fn erf(self) -> Self {
        libm::erf(self)
    }
    fn from_index(idx: u32) -> Self {
        idx as f64
    }
}
