//! Typed view over a variable-shape tensor extension array.
//!
//! [`GenericVariableShapeTensorArray`] owns a [`TensorArrayProxy`] (name,
//! field metadata and `{data, shape}` storage) together with the declared
//! dimensionality and the decoded [`TensorMetadata`]. Every constructor runs
//! the full structural validation before returning, so a freshly built array
//! always satisfies:
//!
//! - the shape child holds exactly `ndim` `Int32` sizes per element
//! - both children and the validity bitmap cover the same number of elements
//! - the metadata is valid and agrees with `ndim`
//! - every present element has non-negative sizes whose product is the length
//!   of its data slice, and matches every uniform dimension
//!
//! The mutable accessors hand out the children without re-validating;
//! [`is_valid`](GenericVariableShapeTensorArray::is_valid) re-runs the checks.

use std::collections::HashMap;

use arrow::array::{
    Array, AsArray, FixedSizeListArray, GenericListArray, OffsetSizeTrait, StructArray,
};
use arrow::datatypes::{Field, Int32Type};
use vartensor_core::{json, Rank, TensorMetadata};

use crate::element::{Shape, VariableShapeTensor, VariableShapeTensorIter};
use crate::error::{TensorArrayError, TensorArrayResult, ValidationError};
use crate::extension::{
    check_metadata, decode_metadata, inspect_storage_type, VariableShapeTensorType,
    EXTENSION_METADATA_KEY, EXTENSION_NAME, EXTENSION_NAME_KEY,
};
use crate::options::TensorArrayOptions;
use crate::proxy::TensorArrayProxy;
use crate::storage::{TensorStorage, DATA_FIELD_NAME, SHAPE_FIELD_NAME};

/// Variable-shape tensor array with `i32` data offsets
pub type VariableShapeTensorArray = GenericVariableShapeTensorArray<i32>;

/// Variable-shape tensor array with `i64` data offsets
pub type LargeVariableShapeTensorArray = GenericVariableShapeTensorArray<i64>;

/// Random-access, iterable sequence of nullable tensors sharing one `ndim`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use arrow::array::{FixedSizeListArray, Int32Array, ListArray};
/// use arrow::buffer::{OffsetBuffer, ScalarBuffer};
/// use arrow::datatypes::{DataType, Field, Int32Type};
/// use vartensor_arrow::VariableShapeTensorArray;
/// use vartensor_core::TensorMetadata;
///
/// let data = ListArray::new(
///     Arc::new(Field::new("item", DataType::Int32, true)),
///     OffsetBuffer::new(ScalarBuffer::from(vec![0, 3, 5])),
///     Arc::new(Int32Array::from(vec![1, 2, 3, 4, 5])),
///     None,
/// );
/// let shape = FixedSizeListArray::new(
///     Arc::new(Field::new("item", DataType::Int32, false)),
///     1,
///     Arc::new(Int32Array::from(vec![3, 2])),
///     None,
/// );
///
/// let array = VariableShapeTensorArray::new(1, data, shape, TensorMetadata::default()).unwrap();
/// assert_eq!(array.len(), 2);
///
/// let second = array.at(1).unwrap().unwrap();
/// assert_eq!(second.shape(), &[2]);
/// assert_eq!(&second.values_as::<Int32Type>().unwrap().values()[..], &[4, 5]);
/// ```
#[derive(Debug, Clone)]
pub struct GenericVariableShapeTensorArray<O: OffsetSizeTrait> {
    ndim: usize,
    metadata: TensorMetadata,
    proxy: TensorArrayProxy<O>,
}

impl<O: OffsetSizeTrait> GenericVariableShapeTensorArray<O> {
    /// Build an array from explicit parts.
    ///
    /// The attached metadata of `options` is merged with the extension
    /// identity entries; those two keys are always overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`TensorArrayError::Validation`] for the first broken
    /// structural rule, checked in this order: shape list size, shape value
    /// type, element counts, metadata, validity length, per-element shapes.
    pub fn try_new(
        ndim: usize,
        data: GenericListArray<O>,
        shape: FixedSizeListArray,
        metadata: TensorMetadata,
        options: TensorArrayOptions,
    ) -> TensorArrayResult<Self> {
        let TensorArrayOptions {
            name,
            metadata: mut field_metadata,
            validity,
        } = options;
        let storage = TensorStorage::new(data, shape, validity);

        if let Err(err) = validate_storage(ndim, &storage, &metadata) {
            tracing::debug!(ndim, error = %err, "rejected variable shape tensor array");
            return Err(err.into());
        }

        let extension_metadata = json::to_json(&metadata)?;
        field_metadata.insert(EXTENSION_NAME_KEY.to_string(), EXTENSION_NAME.to_string());
        field_metadata.insert(EXTENSION_METADATA_KEY.to_string(), extension_metadata);

        let array = Self {
            ndim,
            metadata,
            proxy: TensorArrayProxy::new(name, field_metadata, storage),
        };
        tracing::debug!(
            ndim,
            len = array.len(),
            null_count = array.null_count(),
            large_offsets = O::IS_LARGE,
            "created variable shape tensor array"
        );
        Ok(array)
    }

    /// Build an array with no name, no attached metadata and every element present
    pub fn new(
        ndim: usize,
        data: GenericListArray<O>,
        shape: FixedSizeListArray,
        metadata: TensorMetadata,
    ) -> TensorArrayResult<Self> {
        Self::try_new(ndim, data, shape, metadata, TensorArrayOptions::default())
    }

    /// Decode an array previously exported as an Arrow field and struct array.
    ///
    /// `ndim` is the list size of the shape child. A field without an
    /// `ARROW:extension:metadata` entry is read as carrying `{}`.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ExtensionName`] if the field is not tagged with
    ///   `arrow.variable_shape_tensor`
    /// - [`ValidationError::StorageLayout`] if the array is not a
    ///   `{data, shape}` struct with the expected offset width
    /// - [`TensorArrayError::Parse`] if the metadata JSON is malformed
    /// - any error of [`try_new`](Self::try_new)
    pub fn try_from_arrow(field: &Field, array: &dyn Array) -> TensorArrayResult<Self> {
        match field.metadata().get(EXTENSION_NAME_KEY) {
            Some(name) if name == EXTENSION_NAME => {}
            other => {
                return Err(ValidationError::ExtensionName {
                    expected: EXTENSION_NAME,
                    found: other.cloned().unwrap_or_else(|| "<none>".to_string()),
                }
                .into())
            }
        }

        if field.data_type() != array.data_type() {
            return Err(ValidationError::layout(format!(
                "field type {} does not match array type {}",
                field.data_type(),
                array.data_type()
            ))
            .into());
        }

        let layout = inspect_storage_type(array.data_type())?;
        let struct_array = array
            .as_struct_opt()
            .ok_or_else(|| ValidationError::layout("storage is not a StructArray"))?;
        let storage = TensorStorage::<O>::from_struct_array(struct_array)?;

        let metadata = decode_metadata(
            field
                .metadata()
                .get(EXTENSION_METADATA_KEY)
                .map(String::as_str),
        )?;

        let attached: HashMap<String, String> = field
            .metadata()
            .iter()
            .filter(|(key, _)| *key != EXTENSION_NAME_KEY && *key != EXTENSION_METADATA_KEY)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let (data, shape, validity) = storage.into_parts();
        let options = TensorArrayOptions {
            name: (!field.name().is_empty()).then(|| field.name().clone()),
            metadata: attached,
            validity,
        };

        tracing::debug!(
            field = %field.name(),
            ndim = layout.ndim,
            len = array.len(),
            "decoding variable shape tensor array"
        );
        Self::try_new(layout.ndim, data, shape, metadata, options)
    }

    /// Number of elements
    pub fn size(&self) -> usize {
        self.proxy.len()
    }

    pub fn len(&self) -> usize {
        self.proxy.len()
    }

    pub fn empty(&self) -> bool {
        self.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.proxy.is_empty()
    }

    /// Dimensionality implied by the metadata, `None` if it carries no structure.
    ///
    /// Independent of the declared shape width, see [`shape_ndim`](Self::shape_ndim).
    pub fn ndim(&self) -> Option<Rank> {
        self.metadata.get_ndim()
    }

    /// Declared number of dimensions of every element
    pub fn shape_ndim(&self) -> usize {
        self.ndim
    }

    pub fn get_metadata(&self) -> &TensorMetadata {
        &self.metadata
    }

    pub fn name(&self) -> Option<&str> {
        self.proxy.name()
    }

    /// Element `index`, `None` when it is null.
    ///
    /// # Errors
    ///
    /// [`TensorArrayError::OutOfRange`] if `index >= len()`.
    pub fn at(&self, index: usize) -> TensorArrayResult<Option<VariableShapeTensor>> {
        let len = self.len();
        if index >= len {
            return Err(TensorArrayError::OutOfRange { index, len });
        }
        Ok(self.element(index))
    }

    /// Element `index` without a bounds check result.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn value(&self, index: usize) -> Option<VariableShapeTensor> {
        assert!(
            index < self.len(),
            "index {} out of range for tensor array of length {}",
            index,
            self.len()
        );
        self.element(index)
    }

    /// Whether element `index` is null
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn is_null(&self, index: usize) -> bool {
        assert!(
            index < self.len(),
            "index {} out of range for tensor array of length {}",
            index,
            self.len()
        );
        self.proxy
            .storage()
            .nulls()
            .is_some_and(|nulls| nulls.is_null(index))
    }

    /// Whether element `index` is present
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn is_valid_index(&self, index: usize) -> bool {
        !self.is_null(index)
    }

    pub fn null_count(&self) -> usize {
        self.proxy
            .storage()
            .nulls()
            .map_or(0, |nulls| nulls.null_count())
    }

    pub fn iter(&self) -> VariableShapeTensorIter<'_, O> {
        VariableShapeTensorIter::new(self)
    }

    pub(crate) fn element(&self, index: usize) -> Option<VariableShapeTensor> {
        if self.is_null(index) {
            return None;
        }
        let storage = self.proxy.storage();
        let shape_child = storage.shape();
        let width = shape_child.value_length() as usize;
        let shape: Shape = match shape_child.values().as_primitive_opt::<Int32Type>() {
            Some(sizes) => (index * width..(index + 1) * width)
                .map(|j| usize::try_from(sizes.value(j)).unwrap_or(0))
                .collect(),
            None => Shape::new(),
        };
        Some(VariableShapeTensor::new(shape, storage.data().value(index)))
    }

    pub fn storage(&self) -> &TensorStorage<O> {
        self.proxy.storage()
    }

    pub fn storage_mut(&mut self) -> &mut TensorStorage<O> {
        self.proxy.storage_mut()
    }

    pub fn get_arrow_proxy(&self) -> &TensorArrayProxy<O> {
        &self.proxy
    }

    pub fn get_arrow_proxy_mut(&mut self) -> &mut TensorArrayProxy<O> {
        &mut self.proxy
    }

    pub fn data_child(&self) -> &GenericListArray<O> {
        self.proxy.storage().data()
    }

    pub fn data_child_mut(&mut self) -> &mut GenericListArray<O> {
        self.proxy.storage_mut().data_mut()
    }

    pub fn shape_child(&self) -> &FixedSizeListArray {
        self.proxy.storage().shape()
    }

    pub fn shape_child_mut(&mut self) -> &mut FixedSizeListArray {
        self.proxy.storage_mut().shape_mut()
    }

    pub const fn data_field_name() -> &'static str {
        DATA_FIELD_NAME
    }

    pub const fn shape_field_name() -> &'static str {
        SHAPE_FIELD_NAME
    }

    /// Re-run the structural validation on the current children
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_storage(self.ndim, self.proxy.storage(), &self.metadata)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Extension type describing this array
    pub fn extension_type(&self) -> VariableShapeTensorType {
        VariableShapeTensorType::new_unchecked(
            self.data_child().value_type(),
            self.ndim,
            O::IS_LARGE,
            self.metadata.clone(),
        )
    }

    /// Export as an Arrow field and struct array sharing the same buffers
    pub fn to_arrow(&self) -> TensorArrayResult<(Field, StructArray)> {
        Ok((self.proxy.field(), self.proxy.to_struct_array()?))
    }

    pub fn into_arrow(self) -> TensorArrayResult<(Field, StructArray)> {
        self.to_arrow()
    }
}

/// Check every structural rule of a tensor array, stopping at the first failure
fn validate_storage<O: OffsetSizeTrait>(
    ndim: usize,
    storage: &TensorStorage<O>,
    metadata: &TensorMetadata,
) -> Result<(), ValidationError> {
    let shape = storage.shape();
    let list_size = shape.value_length() as usize;
    if list_size != ndim {
        return Err(ValidationError::ShapeListSize {
            expected: ndim,
            got: list_size,
        });
    }

    let sizes = shape
        .values()
        .as_primitive_opt::<Int32Type>()
        .ok_or_else(|| ValidationError::ShapeValueType(shape.values().data_type().clone()))?;

    let data = storage.data();
    if data.len() != shape.len() {
        return Err(ValidationError::LengthMismatch {
            data: data.len(),
            shape: shape.len(),
        });
    }

    check_metadata(ndim, metadata)?;

    if let Some(nulls) = storage.nulls() {
        if nulls.len() != data.len() {
            return Err(ValidationError::ValidityLength {
                expected: data.len(),
                got: nulls.len(),
            });
        }
    }

    for index in 0..data.len() {
        if storage.nulls().is_some_and(|nulls| nulls.is_null(index)) {
            continue;
        }

        if shape.is_null(index) {
            return Err(ValidationError::NullShape { index });
        }

        let start = index * ndim;
        let mut expected: usize = 1;
        for axis in 0..ndim {
            let j = start + axis;
            if sizes.is_null(j) {
                return Err(ValidationError::NullShapeEntry { index, axis });
            }
            let size = sizes.value(j);
            if size < 0 {
                return Err(ValidationError::NegativeShapeEntry {
                    index,
                    axis,
                    value: size,
                });
            }
            if let Some(uniform) = metadata.uniform_dim(axis) {
                if uniform != size {
                    return Err(ValidationError::UniformShapeMismatch {
                        index,
                        axis,
                        expected: uniform,
                        got: size,
                    });
                }
            }
            expected = expected.saturating_mul(size as usize);
        }

        let got = data.value_length(index).as_usize();
        if expected != got {
            return Err(ValidationError::ValueCountMismatch {
                index,
                shape: sizes.values()[start..start + ndim].to_vec(),
                expected,
                got,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Float32Array, Int32Array, ListArray};
    use arrow::buffer::{NullBuffer, OffsetBuffer, ScalarBuffer};
    use arrow::datatypes::{DataType, Float32Type};

    fn data_child(offsets: Vec<i32>, values: Vec<f32>) -> ListArray {
        ListArray::new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            OffsetBuffer::new(ScalarBuffer::from(offsets)),
            Arc::new(Float32Array::from(values)),
            None,
        )
    }

    fn shape_child(ndim: i32, sizes: Vec<Option<i32>>) -> FixedSizeListArray {
        FixedSizeListArray::new(
            Arc::new(Field::new("item", DataType::Int32, true)),
            ndim,
            Arc::new(Int32Array::from(sizes)),
            None,
        )
    }

    /// Two matrices: 2x3 and 1x2
    fn matrices() -> (ListArray, FixedSizeListArray) {
        (
            data_child(vec![0, 6, 8], (0..8).map(|v| v as f32).collect()),
            shape_child(2, vec![Some(2), Some(3), Some(1), Some(2)]),
        )
    }

    #[test]
    fn test_new_matrices() {
        let (data, shape) = matrices();
        let array = VariableShapeTensorArray::new(2, data, shape, TensorMetadata::default()).unwrap();
        assert_eq!(array.size(), 2);
        assert_eq!(array.shape_ndim(), 2);
        assert_eq!(array.ndim(), None);
        assert!(array.is_valid());

        let first = array.value(0).unwrap();
        assert_eq!(first.shape(), &[2, 3]);
        let values = first.values_as::<Float32Type>().unwrap();
        assert_eq!(values.value(first.flat_index(&[1, 2]).unwrap()), 5.0);
    }

    #[test]
    fn test_shape_list_size_mismatch() {
        let (data, shape) = matrices();
        let err = VariableShapeTensorArray::new(3, data, shape, TensorMetadata::default()).unwrap_err();
        assert!(matches!(
            err,
            TensorArrayError::Validation(ValidationError::ShapeListSize {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn test_value_count_mismatch() {
        let data = data_child(vec![0, 5, 8], (0..8).map(|v| v as f32).collect());
        let shape = shape_child(2, vec![Some(2), Some(3), Some(1), Some(3)]);
        let err = VariableShapeTensorArray::new(2, data, shape, TensorMetadata::default()).unwrap_err();
        assert!(matches!(
            err,
            TensorArrayError::Validation(ValidationError::ValueCountMismatch {
                index: 0,
                expected: 6,
                got: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_null_element_skips_shape_checks() {
        let data = data_child(vec![0, 6, 6], (0..6).map(|v| v as f32).collect());
        let shape = shape_child(2, vec![Some(2), Some(3), None, Some(-1)]);
        let options = TensorArrayOptions::default().with_validity(vec![true, false]);
        let array =
            VariableShapeTensorArray::try_new(2, data, shape, TensorMetadata::default(), options)
                .unwrap();
        assert_eq!(array.null_count(), 1);
        assert!(array.at(1).unwrap().is_none());
        assert!(array.is_valid_index(0));
        assert!(!array.is_valid_index(1));
    }

    #[test]
    fn test_null_and_negative_shape_entries() {
        let data = data_child(vec![0, 6, 8], (0..8).map(|v| v as f32).collect());
        let shape = shape_child(2, vec![Some(2), Some(3), None, Some(2)]);
        let err = VariableShapeTensorArray::new(2, data, shape, TensorMetadata::default()).unwrap_err();
        assert!(matches!(
            err,
            TensorArrayError::Validation(ValidationError::NullShapeEntry { index: 1, axis: 0 })
        ));

        let data = data_child(vec![0, 6, 8], (0..8).map(|v| v as f32).collect());
        let shape = shape_child(2, vec![Some(2), Some(3), Some(-1), Some(2)]);
        let err = VariableShapeTensorArray::new(2, data, shape, TensorMetadata::default()).unwrap_err();
        assert!(matches!(
            err,
            TensorArrayError::Validation(ValidationError::NegativeShapeEntry {
                index: 1,
                axis: 0,
                value: -1
            })
        ));
    }

    #[test]
    fn test_null_shape_of_present_element() {
        let data = data_child(vec![0, 3, 3], vec![1.0, 2.0, 3.0]);
        let shape = FixedSizeListArray::new(
            Arc::new(Field::new("item", DataType::Int32, true)),
            1,
            Arc::new(Int32Array::from(vec![3, 0])),
            Some(NullBuffer::from(vec![true, false])),
        );
        let err = VariableShapeTensorArray::new(1, data, shape, TensorMetadata::default()).unwrap_err();
        assert!(matches!(
            err,
            TensorArrayError::Validation(ValidationError::NullShape { index: 1 })
        ));
    }

    #[test]
    fn test_null_shape_allowed_for_null_element() {
        let data = data_child(vec![0, 3, 3], vec![1.0, 2.0, 3.0]);
        let shape = FixedSizeListArray::new(
            Arc::new(Field::new("item", DataType::Int32, true)),
            1,
            Arc::new(Int32Array::from(vec![3, 0])),
            Some(NullBuffer::from(vec![true, false])),
        );
        let options = TensorArrayOptions::default().with_validity(vec![true, false]);
        let array =
            VariableShapeTensorArray::try_new(1, data, shape, TensorMetadata::default(), options)
                .unwrap();
        assert!(array.at(1).unwrap().is_none());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_is_null_past_end_panics_without_bitmap() {
        let (data, shape) = matrices();
        let array = VariableShapeTensorArray::new(2, data, shape, TensorMetadata::default()).unwrap();
        array.is_null(99);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_is_null_past_end_panics_with_bitmap() {
        let data = data_child(vec![0, 6, 6], (0..6).map(|v| v as f32).collect());
        let shape = shape_child(2, vec![Some(2), Some(3), Some(0), Some(0)]);
        let options = TensorArrayOptions::default().with_validity(vec![true, false]);
        let array =
            VariableShapeTensorArray::try_new(2, data, shape, TensorMetadata::default(), options)
                .unwrap();
        array.is_null(2);
    }

    #[test]
    fn test_uniform_shape_must_agree() {
        let (data, shape) = matrices();
        let meta = TensorMetadata::default().with_uniform_shape(vec![Some(2), None]);
        let err = VariableShapeTensorArray::new(2, data, shape, meta).unwrap_err();
        assert!(matches!(
            err,
            TensorArrayError::Validation(ValidationError::UniformShapeMismatch {
                index: 1,
                axis: 0,
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn test_validity_length_mismatch() {
        let (data, shape) = matrices();
        let options =
            TensorArrayOptions::default().with_validity(NullBuffer::from(vec![true, true, true]));
        let err = VariableShapeTensorArray::try_new(2, data, shape, TensorMetadata::default(), options)
            .unwrap_err();
        assert!(matches!(
            err,
            TensorArrayError::Validation(ValidationError::ValidityLength {
                expected: 2,
                got: 3
            })
        ));
    }

    #[test]
    fn test_extension_entries_override_caller_metadata() {
        let (data, shape) = matrices();
        let options = TensorArrayOptions::default()
            .with_metadata_entry(EXTENSION_NAME_KEY, "something.else")
            .with_metadata_entry("origin", "unit");
        let meta = TensorMetadata::default().with_dim_names(["rows", "cols"]);
        let array = VariableShapeTensorArray::try_new(2, data, shape, meta, options).unwrap();

        let proxy = array.get_arrow_proxy();
        assert_eq!(proxy.extension_name(), Some(EXTENSION_NAME));
        assert_eq!(
            proxy.extension_metadata(),
            Some(r#"{"dim_names":["rows","cols"]}"#)
        );
        assert_eq!(proxy.metadata().get("origin").map(String::as_str), Some("unit"));
    }

    #[test]
    fn test_mutable_edit_can_break_validity() {
        let (data, shape) = matrices();
        let mut array = VariableShapeTensorArray::new(2, data, shape, TensorMetadata::default()).unwrap();
        assert!(array.is_valid());

        *array.shape_child_mut() = shape_child(2, vec![Some(4), Some(4), Some(1), Some(2)]);
        assert!(!array.is_valid());
        assert!(matches!(
            array.validate(),
            Err(ValidationError::ValueCountMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_extension_type_matches_storage() {
        use arrow_schema::extension::ExtensionType;

        let (data, shape) = matrices();
        let array = VariableShapeTensorArray::new(2, data, shape, TensorMetadata::default()).unwrap();
        let ext = array.extension_type();
        assert_eq!(ext.value_type(), &DataType::Float32);
        assert!(ext.supports_data_type(&array.storage().data_type()).is_ok());
    }

    #[test]
    fn test_try_from_arrow_rejects_missing_extension_name() {
        let (data, shape) = matrices();
        let array = VariableShapeTensorArray::new(2, data, shape, TensorMetadata::default()).unwrap();
        let (field, storage) = array.to_arrow().unwrap();
        let plain = Field::new(field.name(), field.data_type().clone(), true);

        let err = VariableShapeTensorArray::try_from_arrow(&plain, &storage).unwrap_err();
        assert!(matches!(
            err,
            TensorArrayError::Validation(ValidationError::ExtensionName { .. })
        ));
    }
}
