//! # vole-core
//!
//! Element types and view metadata shared by the vole CPU kernels.
//!
//! This crate provides:
//! - [`Shape`] / [`Layout`] — extents, signed strides and base offset of a view
//! - [`StridedIter`] / [`RowIter`] — row-major walkers over a view's storage slots
//! - [`DType`] / [`KernelFloat`] — the two precisions kernels are instantiated for
//! - [`Error`] / [`Result`] — failures reported by validating callers

pub mod dtype;
pub mod error;
pub mod layout;
pub mod shape;

pub use dtype::{DType, KernelFloat, WithDType};
pub use error::{Error, Result};
pub use layout::{Layout, RowIter, StridedIter};
pub use shape::Shape;
