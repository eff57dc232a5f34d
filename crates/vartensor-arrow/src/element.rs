//! Logical tensor elements and the cursor that walks over them.

use std::iter::FusedIterator;

use arrow::array::{Array, ArrayRef, AsArray, OffsetSizeTrait, PrimitiveArray};
use arrow::datatypes::ArrowPrimitiveType;
use smallvec::SmallVec;

use crate::array::GenericVariableShapeTensorArray;

/// Shape of one tensor element, inline for up to 6 dimensions
pub type Shape = SmallVec<[usize; 6]>;

/// One tensor of a variable-shape tensor array.
///
/// The values are a zero-copy slice of the array's `data` child, laid out in
/// row-major order (last dimension fastest).
#[derive(Debug, Clone)]
pub struct VariableShapeTensor {
    shape: Shape,
    values: ArrayRef,
}

impl VariableShapeTensor {
    pub(crate) fn new(shape: Shape, values: ArrayRef) -> Self {
        Self { shape, values }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Size along `axis`, `None` past the last dimension
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.shape.get(axis).copied()
    }

    /// Flattened values of this tensor
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    /// Values downcast to a primitive array, `None` on a type mismatch
    pub fn values_as<T: ArrowPrimitiveType>(&self) -> Option<&PrimitiveArray<T>> {
        self.values.as_primitive_opt::<T>()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row-major strides, in elements
    pub fn strides(&self) -> Shape {
        let mut strides: Shape = SmallVec::from_elem(1, self.shape.len());
        for axis in (0..self.shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * self.shape[axis + 1];
        }
        strides
    }

    /// Position of a multi-index inside [`values`](Self::values).
    ///
    /// Returns `None` if the index has the wrong length or is out of bounds.
    pub fn flat_index(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0;
        for (&i, &dim) in index.iter().zip(self.shape.iter()) {
            if i >= dim {
                return None;
            }
            flat = flat * dim + i;
        }
        Some(flat)
    }
}

/// Forward and backward cursor over the elements of a tensor array.
///
/// Yields `None` for null elements. Creating a new iterator always starts
/// from the first element.
#[derive(Debug, Clone)]
pub struct VariableShapeTensorIter<'a, O: OffsetSizeTrait> {
    array: &'a GenericVariableShapeTensorArray<O>,
    current: usize,
    current_end: usize,
}

impl<'a, O: OffsetSizeTrait> VariableShapeTensorIter<'a, O> {
    pub fn new(array: &'a GenericVariableShapeTensorArray<O>) -> Self {
        Self {
            array,
            current: 0,
            current_end: array.len(),
        }
    }
}

impl<O: OffsetSizeTrait> Iterator for VariableShapeTensorIter<'_, O> {
    type Item = Option<VariableShapeTensor>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.current_end {
            return None;
        }
        let item = self.array.element(self.current);
        self.current += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.current_end - self.current;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.current = self.current.saturating_add(n).min(self.current_end);
        self.next()
    }
}

impl<O: OffsetSizeTrait> DoubleEndedIterator for VariableShapeTensorIter<'_, O> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.current_end == self.current {
            return None;
        }
        self.current_end -= 1;
        Some(self.array.element(self.current_end))
    }
}

impl<O: OffsetSizeTrait> ExactSizeIterator for VariableShapeTensorIter<'_, O> {}

impl<O: OffsetSizeTrait> FusedIterator for VariableShapeTensorIter<'_, O> {}

impl<'a, O: OffsetSizeTrait> IntoIterator for &'a GenericVariableShapeTensorArray<O> {
    type Item = Option<VariableShapeTensor>;
    type IntoIter = VariableShapeTensorIter<'a, O>;

    fn into_iter(self) -> Self::IntoIter {
        VariableShapeTensorIter::new(self)
    }
}
