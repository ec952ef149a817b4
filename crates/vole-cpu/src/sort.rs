// Row argsort — per-row permutations along the innermost dimension
//
// For every row (the run of `ncols` elements along the innermost dimension)
// the kernel computes which row-local source index lands at each sorted
// position. The result is returned twice:
//
//   - as a Vec<u32> of row-local indices, rows concatenated row-major, and
//   - written into `dst`, the same indices encoded as the element type.
//
// `dst` therefore holds the permutation, NOT the sorted values. Callers that
// want values gather them with `sorted_values`.
//
// Ordering is stable: rows are sorted with `sort_by` over indices initialized
// to 0..ncols, and descending order flips the value comparison rather than
// the result, so equal values keep lower indices first in both directions.
// NaN compares above every number, landing last ascending and first
// descending.

use std::cmp::Ordering;

use vole_core::{KernelFloat, Layout};

/// Sort direction for [`arg_sort_contiguous`] / [`arg_sort_strided`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn compare<T: KernelFloat>(self, a: T, b: T) -> Ordering {
        match self {
            SortOrder::Asc => total_cmp_nan_last(a, b),
            SortOrder::Desc => total_cmp_nan_last(b, a),
        }
    }
}

/// Numeric order with every NaN equal to each other and above all numbers.
/// -0.0 and 0.0 compare equal.
fn total_cmp_nan_last<T: KernelFloat>(a: T, b: T) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

/// Sort one row's indices by the values they point at.
fn sort_row<T: KernelFloat>(order: SortOrder, values: &[T], indices: &mut [u32]) {
    for (j, slot) in indices.iter_mut().enumerate() {
        *slot = j as u32;
    }
    indices.sort_by(|&i, &j| order.compare(values[i as usize], values[j as usize]));
}

fn encode_row<T: KernelFloat>(indices: &[u32], dst: &mut [T]) {
    for (d, &i) in dst.iter_mut().zip(indices.iter()) {
        *d = T::from_index(i);
    }
}

/// Argsort every contiguous row of `src`.
///
/// `src.len() / ncols` rows are processed; `dst` must hold at least as many
/// elements. `ncols == 0` returns an empty permutation and leaves `dst`
/// untouched.
pub fn arg_sort_contiguous<T: KernelFloat>(
    order: SortOrder,
    ncols: usize,
    src: &[T],
    dst: &mut [T],
) -> Vec<u32> {
    if ncols == 0 {
        return Vec::new();
    }
    let numel = (src.len() / ncols) * ncols;
    debug_assert!(dst.len() >= numel, "destination shorter than numel");

    let mut indices = vec![0u32; numel];
    for ((values, row_idx), row_dst) in src[..numel]
        .chunks_exact(ncols)
        .zip(indices.chunks_exact_mut(ncols))
        .zip(dst[..numel].chunks_exact_mut(ncols))
    {
        sort_row(order, values, row_idx);
        encode_row(row_idx, row_dst);
    }
    indices
}

/// Argsort every row of a strided view. The innermost extent of `layout`
/// must equal `ncols`.
///
/// Row `r` reads `base(r) + j * inner_stride` for `j in 0..ncols`, where the
/// bases come from walking the outer dimensions. The destination is written
/// contiguously in row-major order.
pub fn arg_sort_strided<T: KernelFloat>(
    order: SortOrder,
    ncols: usize,
    layout: &Layout,
    src: &[T],
    dst: &mut [T],
) -> Vec<u32> {
    let numel = layout.elem_count();
    if ncols == 0 || numel == 0 {
        return Vec::new();
    }
    debug_assert_eq!(layout.shape().last_dim(), Some(ncols), "ncols must be the innermost extent");
    if layout.is_contiguous() {
        return arg_sort_contiguous(order, ncols, &src[..numel], dst);
    }
    debug_assert!(dst.len() >= numel, "destination shorter than numel");

    let inner = layout.inner_stride();
    let mut values: Vec<T> = Vec::with_capacity(ncols);
    let mut indices = vec![0u32; numel];
    for ((base, row_idx), row_dst) in layout
        .rows()
        .zip(indices.chunks_exact_mut(ncols))
        .zip(dst[..numel].chunks_exact_mut(ncols))
    {
        values.clear();
        values.extend((0..ncols).map(|j| src[(base as isize + j as isize * inner) as usize]));
        sort_row(order, &values, row_idx);
        encode_row(row_idx, row_dst);
    }
    indices
}

/// Gather the sorted values of a contiguous source from a permutation
/// produced by [`arg_sort_contiguous`].
pub fn sorted_values<T: KernelFloat>(ncols: usize, src: &[T], indices: &[u32]) -> Vec<T> {
    if ncols == 0 {
        return Vec::new();
    }
    indices
        .chunks_exact(ncols)
        .enumerate()
        .flat_map(|(row, row_idx)| {
            let start = row * ncols;
            row_idx.iter().map(move |&i| src[start + i as usize])
        })
        .collect()
}
