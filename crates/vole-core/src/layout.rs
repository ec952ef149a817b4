use crate::error::{Error, Result};
use crate::shape::Shape;

// Layout — How a logical view maps onto flat storage (shape + strides + offset)
//
// The Layout decouples the *logical* shape a kernel iterates over from how
// the elements sit in the caller's buffer. Every kernel reads its source
// through a Layout and writes its destination contiguously, so transposed,
// broadcast and sliced views are materialized without intermediate copies.
//
// KEY CONCEPTS:
//
// 1. **Strides** are signed slot counts. A contiguous [2,3] view has strides
//    [3,1]; its transpose has [1,3]; a broadcast dimension has stride 0; a
//    reversed dimension has a negative stride.
//
// 2. **Offset** is the base slot the view starts at. Slicing and reversal
//    fold into it, so every addressed slot is
//    offset + Σ_d index[d] * stride[d].
//
// 3. **No validation on the hot path.** The walker trusts the layout. Bounds
//    can be checked once with `check_bounds` by whoever owns the buffer.

/// Layout describes how a view's logical shape maps to flat storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Vec<isize>,
    /// Slot of the buffer holding logical element [0, 0, ..., 0].
    offset: usize,
}

impl Layout {
    /// Create a new contiguous (row-major) layout for the given shape.
    pub fn contiguous(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let strides = shape.stride_contiguous();
        Layout {
            shape,
            strides,
            offset: 0,
        }
    }

    /// Create a layout with explicit strides and base offset.
    ///
    /// Only the rank is checked; strides are kept verbatim.
    pub fn new(shape: impl Into<Shape>, strides: Vec<isize>, offset: usize) -> Result<Self> {
        let shape = shape.into();
        if shape.rank() != strides.len() {
            return Err(Error::RankMismatch {
                expected: shape.rank(),
                got: strides.len(),
            });
        }
        Ok(Layout {
            shape,
            strides,
            offset,
        })
    }

    /// Build a layout from a declared rank plus shape and stride slices, the
    /// way a tensor layer hands them across the kernel boundary.
    pub fn from_parts(num_dims: usize, dims: &[usize], strides: &[isize]) -> Result<Self> {
        if dims.len() != num_dims {
            return Err(Error::RankMismatch {
                expected: num_dims,
                got: dims.len(),
            });
        }
        Layout::new(dims.to_vec(), strides.to_vec(), 0)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// Stride along the innermost dimension (0 for the empty layout).
    pub fn inner_stride(&self) -> isize {
        self.strides.last().copied().unwrap_or(0)
    }

    /// Check if this layout is contiguous (row-major, no gaps, offset 0).
    ///
    /// Dimensions of extent 1 are ignored since their stride is never used.
    pub fn is_contiguous(&self) -> bool {
        if self.offset != 0 {
            return false;
        }
        let mut expected = 1isize;
        for (&d, &s) in self.dims().iter().zip(self.strides.iter()).rev() {
            if d != 1 && s != expected {
                return false;
            }
            expected *= d as isize;
        }
        true
    }

    /// Transpose two dimensions. No data is copied.
    ///
    /// Example: [2, 3, 4] transpose(0, 2) → [4, 3, 2]
    ///          strides [12, 4, 1]         → [1, 4, 12]
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim0 >= rank || dim1 >= rank {
            return Err(Error::DimOutOfRange {
                dim: dim0.max(dim1),
                rank,
            });
        }
        let mut new_dims = self.dims().to_vec();
        let mut new_strides = self.strides.clone();
        new_dims.swap(dim0, dim1);
        new_strides.swap(dim0, dim1);
        Layout::new(new_dims, new_strides, self.offset)
    }

    /// Narrow (slice) along a dimension. The result addresses the same
    /// storage with a smaller extent and a moved base offset.
    ///
    /// Example: [4, 6] narrow(dim=1, start=2, len=3)
    /// → shape [4, 3], offset += 2 * stride[1]
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Layout> {
        let dim_size = self.shape.dim(dim)?;
        if start.checked_add(len).map_or(true, |end| end > dim_size) {
            return Err(Error::NarrowOutOfBounds {
                dim,
                start,
                len,
                dim_size,
            });
        }
        let mut new_dims = self.dims().to_vec();
        new_dims[dim] = len;
        let moved = self.offset as isize + start as isize * self.strides[dim];
        if moved < 0 {
            crate::bail!("narrow moves base offset below zero ({})", moved);
        }
        Layout::new(new_dims, self.strides.clone(), moved as usize)
    }

    /// Broadcast this view to a larger shape (NumPy rules, aligned from the
    /// right). Expanded dimensions get stride 0.
    pub fn broadcast_as(&self, target: impl Into<Shape>) -> Result<Layout> {
        let target = target.into();
        let src = self.dims();
        let dst = target.dims();
        if src.len() > dst.len() {
            return Err(Error::BroadcastMismatch {
                src: self.shape.clone(),
                dst: target,
            });
        }
        let lead = dst.len() - src.len();
        let mut strides = vec![0isize; dst.len()];
        for (i, (&s, &st)) in src.iter().zip(self.strides.iter()).enumerate() {
            let t = dst[lead + i];
            if s == t {
                strides[lead + i] = st;
            } else if s != 1 {
                return Err(Error::BroadcastMismatch {
                    src: self.shape.clone(),
                    dst: target,
                });
            }
        }
        Layout::new(target, strides, self.offset)
    }

    /// Flat storage slot for a row-major logical position, computed from
    /// scratch by peeling coordinates off the innermost dimension.
    ///
    /// This is the per-element fallback; the walker produces the same slots
    /// in amortized O(1).
    pub fn offset_of(&self, position: usize) -> usize {
        let mut rem = position;
        let mut flat = self.offset as isize;
        for (&d, &st) in self.dims().iter().zip(self.strides.iter()).rev() {
            flat += (rem % d) as isize * st;
            rem /= d;
        }
        flat as usize
    }

    /// Lowest and highest slots this view touches, or `None` if it is empty.
    pub fn offset_range(&self) -> Option<(isize, isize)> {
        if self.elem_count() == 0 {
            return None;
        }
        let mut lo = self.offset as isize;
        let mut hi = self.offset as isize;
        for (&d, &st) in self.dims().iter().zip(self.strides.iter()) {
            let span = (d as isize - 1) * st;
            if span < 0 {
                lo += span;
            } else {
                hi += span;
            }
        }
        Some((lo, hi))
    }

    /// Verify every slot the view can address lies in `[0, buffer_len)`.
    pub fn check_bounds(&self, buffer_len: usize) -> Result<()> {
        match self.offset_range() {
            None => Ok(()),
            Some((min, max)) if min >= 0 && (max as usize) < buffer_len => Ok(()),
            Some((min, max)) => Err(Error::OffsetOutOfBounds {
                shape: self.shape.clone(),
                min,
                max,
                len: buffer_len,
            }),
        }
    }

    /// Iterator over all flat storage slots of this layout, in row-major
    /// logical order.
    pub fn strided_indices(&self) -> StridedIter {
        StridedIter::new(self.dims(), &self.strides, self.offset as isize)
    }

    /// Iterator over the base slot of every row, where a row is the run of
    /// elements along the innermost dimension.
    pub fn rows(&self) -> RowIter {
        let rank = self.rank();
        let walker = if rank == 0 || self.elem_count() == 0 {
            StridedIter::new(&[], &[], 0)
        } else {
            let outer = &self.dims()[..rank - 1];
            let outer_strides = &self.strides[..rank - 1];
            if outer.is_empty() {
                StridedIter::single(self.offset as isize)
            } else {
                StridedIter::new(outer, outer_strides, self.offset as isize)
            }
        };
        RowIter { walker }
    }
}

// StridedIter — Carry-propagating walk over a strided view
//
// The walker keeps the current multi-index and the running signed offset.
// Advancing bumps the innermost coordinate; when a coordinate overflows its
// extent it is reset to zero, its contribution `stride * (extent - 1)` is
// taken back out of the offset, and the carry moves one dimension out.
// Each step therefore costs O(1) amortized instead of a full dot product.
//
// For a contiguous layout this counts 0, 1, 2, ...
// For a transposed [3,2] view with strides [1,3] it yields 0, 3, 1, 4, 2, 5.

/// Iterator that yields flat storage slots for each element of a view.
#[derive(Debug, Clone)]
pub struct StridedIter {
    current: Vec<usize>,
    dims: Vec<usize>,
    strides: Vec<isize>,
    /// Slot of the element at `current`.
    offset: isize,
    remaining: usize,
    started: bool,
}

impl StridedIter {
    fn new(dims: &[usize], strides: &[isize], base: isize) -> Self {
        let remaining = if dims.is_empty() {
            0
        } else {
            dims.iter().product()
        };
        StridedIter {
            current: vec![0; dims.len()],
            dims: dims.to_vec(),
            strides: strides.to_vec(),
            offset: base,
            remaining,
            started: false,
        }
    }

    /// A walker over exactly one slot.
    fn single(base: isize) -> Self {
        StridedIter {
            current: Vec::new(),
            dims: Vec::new(),
            strides: Vec::new(),
            offset: base,
            remaining: 1,
            started: false,
        }
    }

    /// Move to the next row-major position, keeping `offset` in step.
    fn advance(&mut self) {
        for i in (0..self.dims.len()).rev() {
            self.current[i] += 1;
            if self.current[i] < self.dims[i] {
                self.offset += self.strides[i];
                return;
            }
            self.current[i] = 0;
            self.offset -= self.strides[i] * (self.dims[i] as isize - 1);
        }
    }
}

impl Iterator for StridedIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        if self.started {
            self.advance();
        }
        self.started = true;
        self.remaining -= 1;
        Some(self.offset as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedIter {}

/// Iterator over row base slots; see [`Layout::rows`].
#[derive(Debug, Clone)]
pub struct RowIter {
    walker: StridedIter,
}

impl Iterator for RowIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.walker.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.walker.size_hint()
    }
}

impl ExactSizeIterator for RowIter {}
