// CpuStorage — dtype-tagged buffers and checked kernel entry points
//
// The raw kernels in `unary` and `sort` trust their arguments. This module is
// the boundary a tensor layer talks to when it would rather validate once:
// each entry point checks the layout against the buffer, allocates (or
// checks) the contiguous destination, and dispatches on dtype to the
// monomorphized kernel. No per-element checks happen after that.

use log::{debug, trace};
use vole_core::{bail, DType, Error, KernelFloat, Layout, Result};

use crate::sort::{self, SortOrder};
use crate::unary::{self, UnaryOp};

/// A flat CPU buffer of one of the kernel element types.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuStorage {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl CpuStorage {
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::F32(_) => DType::F32,
            CpuStorage::F64(_) => DType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CpuStorage::F32(v) => v.len(),
            CpuStorage::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the whole buffer out as f64 (for inspection and tests).
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            CpuStorage::F32(v) => v.iter().map(|&x| x as f64).collect(),
            CpuStorage::F64(v) => v.clone(),
        }
    }
}

/// Element types a [`CpuStorage`] can hold, with typed access to the
/// matching variant.
pub trait CpuElem: KernelFloat {
    fn storage_slice(storage: &CpuStorage) -> Option<&[Self]>;
}

impl CpuElem for f32 {
    fn storage_slice(storage: &CpuStorage) -> Option<&[f32]> {
        match storage {
            CpuStorage::F32(v) => Some(v.as_slice()),
            CpuStorage::F64(_) => None,
        }
    }
}

impl CpuElem for f64 {
    fn storage_slice(storage: &CpuStorage) -> Option<&[f64]> {
        match storage {
            CpuStorage::F64(v) => Some(v.as_slice()),
            CpuStorage::F32(_) => None,
        }
    }
}

impl CpuStorage {
    /// Borrow the buffer as `T`, failing if the storage holds another dtype.
    pub fn as_slice<T: CpuElem>(&self) -> Result<&[T]> {
        T::storage_slice(self).ok_or(Error::DTypeMismatch {
            expected: T::DTYPE,
            got: self.dtype(),
        })
    }
}

impl From<Vec<f32>> for CpuStorage {
    fn from(v: Vec<f32>) -> Self {
        CpuStorage::F32(v)
    }
}

impl From<Vec<f64>> for CpuStorage {
    fn from(v: Vec<f64>) -> Self {
        CpuStorage::F64(v)
    }
}

/// Run `$body` with `$data` bound to the typed vector of `$storage`, wrapping
/// the resulting Vec back into the same variant.
macro_rules! map_float_storage {
    ($storage:expr, |$data:ident, $T:ident| $body:expr) => {
        match $storage {
            CpuStorage::F32($data) => {
                type $T = f32;
                CpuStorage::F32($body)
            }
            CpuStorage::F64($data) => {
                type $T = f64;
                CpuStorage::F64($body)
            }
        }
    };
}

fn log_strided(kernel: &str, layout: &Layout) {
    if !layout.is_contiguous() {
        debug!(
            "{}: walking strides {:?} from offset {}",
            kernel,
            layout.strides(),
            layout.offset()
        );
    }
}

/// Apply a unary op to a (possibly strided) view, returning a new contiguous
/// buffer of `layout.elem_count()` elements.
pub fn unary_op(op: UnaryOp, input: &CpuStorage, layout: &Layout) -> Result<CpuStorage> {
    layout.check_bounds(input.len())?;
    let n = layout.elem_count();
    trace!(
        "unary {} on {} view {} (numel {}, contiguous {})",
        op,
        input.dtype(),
        layout.shape(),
        n,
        layout.is_contiguous()
    );
    log_strided(op.name(), layout);
    Ok(map_float_storage!(input, |data, T| {
        let mut out = vec![<T>::default(); n];
        unary::unary_strided(op, layout, Some(data.as_slice()), &mut out);
        out
    }))
}

/// Apply a unary op to a view, writing into a caller-owned typed buffer.
///
/// `out` must hold at least `layout.elem_count()` elements and share the
/// input's dtype.
pub fn unary_op_into<T: CpuElem>(
    op: UnaryOp,
    input: &CpuStorage,
    layout: &Layout,
    out: &mut [T],
) -> Result<()> {
    layout.check_bounds(input.len())?;
    let src = input.as_slice::<T>()?;
    let n = layout.elem_count();
    if out.len() < n {
        bail!(
            "destination holds {} elements but view {} has {}",
            out.len(),
            layout.shape(),
            n
        );
    }
    trace!(
        "unary {} into {} buffer, view {} (numel {})",
        op,
        T::DTYPE,
        layout.shape(),
        n
    );
    log_strided(op.name(), layout);
    unary::unary_strided(op, layout, Some(src), out);
    Ok(())
}

/// Apply a unary op in place to the slots a view addresses.
pub fn unary_op_inplace(op: UnaryOp, storage: &mut CpuStorage, layout: &Layout) -> Result<()> {
    layout.check_bounds(storage.len())?;
    trace!(
        "unary {} in place on {} view {} (numel {})",
        op,
        storage.dtype(),
        layout.shape(),
        layout.elem_count()
    );
    log_strided(op.name(), layout);
    match storage {
        CpuStorage::F32(data) => unary::unary_strided(op, layout, None, data.as_mut_slice()),
        CpuStorage::F64(data) => unary::unary_strided(op, layout, None, data.as_mut_slice()),
    }
    Ok(())
}

/// Materialize a view as a new contiguous buffer.
pub fn to_contiguous(input: &CpuStorage, layout: &Layout) -> Result<CpuStorage> {
    unary_op(UnaryOp::Copy, input, layout)
}

/// Argsort every row of a view along its innermost dimension.
///
/// Returns the permutation encoded in the input's dtype together with the
/// same permutation as `u32`.
pub fn arg_sort(
    order: SortOrder,
    input: &CpuStorage,
    layout: &Layout,
) -> Result<(CpuStorage, Vec<u32>)> {
    let ncols = layout.shape().last_dim().ok_or(Error::RankMismatch {
        expected: 1,
        got: 0,
    })?;
    layout.check_bounds(input.len())?;
    let n = layout.elem_count();
    trace!(
        "arg_sort {:?} on {} view {} (ncols {}, rows {})",
        order,
        input.dtype(),
        layout.shape(),
        ncols,
        if ncols == 0 { 0 } else { n / ncols }
    );
    log_strided("arg_sort", layout);
    Ok(match input {
        CpuStorage::F32(data) => {
            let mut out = vec![0f32; n];
            let indices = sort::arg_sort_strided(order, ncols, layout, data.as_slice(), &mut out);
            (CpuStorage::F32(out), indices)
        }
        CpuStorage::F64(data) => {
            let mut out = vec![0f64; n];
            let indices = sort::arg_sort_strided(order, ncols, layout, data.as_slice(), &mut out);
            (CpuStorage::F64(out), indices)
        }
    })
}
