//! Incremental construction of tensor arrays from native values.

use std::fmt;
use std::sync::Arc;

use arrow::array::{FixedSizeListArray, GenericListArray, Int32Array, OffsetSizeTrait, PrimitiveArray};
use arrow::buffer::{NullBuffer, OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{ArrowPrimitiveType, DataType, Field};
use vartensor_core::TensorMetadata;

use crate::array::{GenericVariableShapeTensorArray, LargeVariableShapeTensorArray, VariableShapeTensorArray};
use crate::error::{TensorArrayResult, ValidationError};
use crate::options::TensorArrayOptions;

/// Builder appending one row-major tensor at a time.
///
/// # Examples
///
/// ```
/// use arrow::datatypes::Float32Type;
/// use vartensor_arrow::{TensorArrayOptions, VariableShapeTensorBuilder};
/// use vartensor_core::TensorMetadata;
///
/// let mut builder = VariableShapeTensorBuilder::<Float32Type>::new(2);
/// builder.append(&[2, 2], &[1.0, 2.0, 3.0, 4.0]).unwrap();
/// builder.append_null();
/// builder.append(&[1, 3], &[5.0, 6.0, 7.0]).unwrap();
///
/// let array = builder
///     .finish(TensorMetadata::default(), TensorArrayOptions::default())
///     .unwrap();
/// assert_eq!(array.len(), 3);
/// assert_eq!(array.null_count(), 1);
/// assert_eq!(array.at(2).unwrap().unwrap().shape(), &[1, 3]);
/// ```
pub struct VariableShapeTensorBuilder<T: ArrowPrimitiveType> {
    ndim: usize,
    values: Vec<T::Native>,
    lengths: Vec<usize>,
    shapes: Vec<i32>,
    validity: Vec<bool>,
}

impl<T: ArrowPrimitiveType> VariableShapeTensorBuilder<T> {
    pub fn new(ndim: usize) -> Self {
        Self::with_capacity(ndim, 0, 0)
    }

    /// Reserve room for `elements` tensors holding `values` values in total
    pub fn with_capacity(ndim: usize, elements: usize, values: usize) -> Self {
        Self {
            ndim,
            values: Vec::with_capacity(values),
            lengths: Vec::with_capacity(elements),
            shapes: Vec::with_capacity(elements * ndim),
            validity: Vec::with_capacity(elements),
        }
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of appended elements, nulls included
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Append a present tensor.
    ///
    /// # Errors
    ///
    /// Nothing is appended if `shape` does not have `ndim` entries, a size
    /// does not fit in `Int32`, or `values` is not exactly the product of
    /// `shape` long.
    pub fn append(&mut self, shape: &[usize], values: &[T::Native]) -> Result<(), ValidationError> {
        if shape.len() != self.ndim {
            return Err(ValidationError::ShapeListSize {
                expected: self.ndim,
                got: shape.len(),
            });
        }

        let mut sizes = Vec::with_capacity(shape.len());
        for (axis, &size) in shape.iter().enumerate() {
            let size = i32::try_from(size).map_err(|_| {
                ValidationError::layout(format!(
                    "size {} at axis {} does not fit in Int32",
                    size, axis
                ))
            })?;
            sizes.push(size);
        }

        let expected = shape.iter().product::<usize>();
        if expected != values.len() {
            return Err(ValidationError::ValueCountMismatch {
                index: self.len(),
                shape: sizes,
                expected,
                got: values.len(),
            });
        }

        self.values.extend_from_slice(values);
        self.lengths.push(values.len());
        self.shapes.extend(sizes);
        self.validity.push(true);
        Ok(())
    }

    /// Append a null element with an all-zero shape and no values
    pub fn append_null(&mut self) {
        self.lengths.push(0);
        self.shapes.extend(std::iter::repeat(0).take(self.ndim));
        self.validity.push(false);
    }

    /// Build an array with `i32` offsets.
    ///
    /// Appended nulls replace any validity set in `options`.
    pub fn finish(
        self,
        metadata: TensorMetadata,
        options: TensorArrayOptions,
    ) -> TensorArrayResult<VariableShapeTensorArray> {
        self.finish_generic(metadata, options)
    }

    /// Build an array with `i64` offsets
    pub fn finish_large(
        self,
        metadata: TensorMetadata,
        options: TensorArrayOptions,
    ) -> TensorArrayResult<LargeVariableShapeTensorArray> {
        self.finish_generic(metadata, options)
    }

    fn finish_generic<O: OffsetSizeTrait>(
        self,
        metadata: TensorMetadata,
        mut options: TensorArrayOptions,
    ) -> TensorArrayResult<GenericVariableShapeTensorArray<O>> {
        if O::from_usize(self.values.len()).is_none() {
            return Err(ValidationError::layout(format!(
                "{} values overflow {} offsets",
                self.values.len(),
                std::any::type_name::<O>()
            ))
            .into());
        }
        let list_size = i32::try_from(self.ndim).map_err(|_| {
            ValidationError::layout(format!("ndim {} does not fit in Int32", self.ndim))
        })?;

        let values = PrimitiveArray::<T>::new(ScalarBuffer::from(self.values), None);
        let data = GenericListArray::<O>::new(
            Arc::new(Field::new("item", T::DATA_TYPE, true)),
            OffsetBuffer::<O>::from_lengths(self.lengths),
            Arc::new(values),
            None,
        );
        let shape = FixedSizeListArray::new(
            Arc::new(Field::new("item", DataType::Int32, false)),
            list_size,
            Arc::new(Int32Array::from(self.shapes)),
            None,
        );

        if self.validity.contains(&false) {
            options.validity = Some(NullBuffer::from(self.validity));
        }

        GenericVariableShapeTensorArray::try_new(self.ndim, data, shape, metadata, options)
    }
}

impl<T: ArrowPrimitiveType> fmt::Debug for VariableShapeTensorBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableShapeTensorBuilder")
            .field("value_type", &T::DATA_TYPE)
            .field("ndim", &self.ndim)
            .field("len", &self.len())
            .field("values", &self.values.len())
            .finish()
    }
}
