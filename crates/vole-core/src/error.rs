use crate::shape::Shape;

/// All errors that can be reported by vole.
///
/// The kernels themselves never fail: they trust the caller's layout. These
/// errors come from the places that validate once before dispatching, namely
/// the `Layout` constructors/view helpers and the checked storage layer in
/// `vole-cpu`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Shape and stride (or a declared rank) disagree on the number of dimensions.
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// Dimension index out of range for the layout's rank.
    #[error("dimension out of range: dim {dim} for layout with {rank} dimensions")]
    DimOutOfRange { dim: usize, rank: usize },

    /// Narrow/slice operation out of bounds.
    #[error("narrow out of bounds: dim {dim}, start {start}, len {len}, dim_size {dim_size}")]
    NarrowOutOfBounds {
        dim: usize,
        start: usize,
        len: usize,
        dim_size: usize,
    },

    /// A view cannot be broadcast to the requested shape.
    #[error("cannot broadcast {src} to {dst}")]
    BroadcastMismatch { src: Shape, dst: Shape },

    /// The view addresses storage slots outside of the buffer.
    #[error("view of shape {shape} reaches slots [{min}, {max}] but buffer holds {len} elements")]
    OffsetOutOfBounds {
        shape: Shape,
        min: isize,
        max: isize,
        len: usize,
    },

    /// Two buffers that must share an element type do not.
    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch {
        expected: crate::DType,
        got: crate::DType,
    },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }
}

/// Convenience Result type used throughout vole.
pub type Result<T> = std::result::Result<T, Error>;

/// Early return with a formatted error message.
/// Usage: `bail!("ncols {} does not divide {}", ncols, numel)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
