//! # vole-cpu
//!
//! CPU kernels over flat f32/f64 buffers addressed through a [`Layout`].
//!
//! - [`unary`] — ~25 elementwise transforms, contiguous and strided, with an
//!   in-place mode
//! - [`sort`] — stable per-row argsort along the innermost dimension
//! - [`storage`] — [`CpuStorage`] plus checked, dtype-dispatching entry points
//!
//! The kernels are synchronous and keep no state between calls.
//!
//! [`Layout`]: vole_core::Layout

pub mod sort;
pub mod storage;
pub mod unary;

pub use sort::{arg_sort_contiguous, arg_sort_strided, sorted_values, SortOrder};
pub use storage::{CpuElem, CpuStorage};
pub use unary::{map_contiguous, map_strided, unary_contiguous, unary_strided, UnaryOp};
