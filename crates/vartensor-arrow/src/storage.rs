//! Physical storage of a variable-shape tensor array.
//!
//! The storage is a two-field struct:
//!
//! | field   | type                               | contents                              |
//! |---------|------------------------------------|---------------------------------------|
//! | `data`  | `List<T>` / `LargeList<T>`         | row-major flattened values per tensor |
//! | `shape` | `FixedSizeList<Int32>[ndim]`       | one shape vector per tensor           |
//!
//! plus an optional validity bitmap for the struct itself. [`TensorStorage`]
//! owns both children by value so they can be handed out by reference, mutable
//! or not, and exported as an Arrow [`StructArray`] when needed.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, FixedSizeListArray, GenericListArray, OffsetSizeTrait, StructArray,
};
use arrow::buffer::NullBuffer;
use arrow::datatypes::{DataType, Field, Fields};
use arrow::error::ArrowError;

use crate::error::ValidationError;

/// Name of the flattened values child
pub const DATA_FIELD_NAME: &str = "data";

/// Name of the per-element shape child
pub const SHAPE_FIELD_NAME: &str = "shape";

/// Two-child composite holding tensor values and shapes
#[derive(Debug, Clone)]
pub struct TensorStorage<O: OffsetSizeTrait> {
    data: GenericListArray<O>,
    shape: FixedSizeListArray,
    nulls: Option<NullBuffer>,
}

impl<O: OffsetSizeTrait> TensorStorage<O> {
    /// Assemble storage from its children without validation
    pub(crate) fn new(
        data: GenericListArray<O>,
        shape: FixedSizeListArray,
        nulls: Option<NullBuffer>,
    ) -> Self {
        Self { data, shape, nulls }
    }

    /// Take apart an Arrow struct array laid out as `{data, shape}`.
    ///
    /// Only the layout is checked here: two children, named `data` and
    /// `shape` in that order, with list and fixed-size-list types.
    pub fn from_struct_array(array: &StructArray) -> Result<Self, ValidationError> {
        let names = array.column_names();
        if names != [DATA_FIELD_NAME, SHAPE_FIELD_NAME] {
            return Err(ValidationError::layout(format!(
                "expected children [\"{}\", \"{}\"], found {:?}",
                DATA_FIELD_NAME, SHAPE_FIELD_NAME, names
            )));
        }

        let data = array.column(0).as_list_opt::<O>().ok_or_else(|| {
            ValidationError::layout(format!(
                "\"{}\" child must be a {} array, found {}",
                DATA_FIELD_NAME,
                if O::IS_LARGE { "LargeList" } else { "List" },
                array.column(0).data_type()
            ))
        })?;

        let shape = array.column(1).as_fixed_size_list_opt().ok_or_else(|| {
            ValidationError::layout(format!(
                "\"{}\" child must be a FixedSizeList array, found {}",
                SHAPE_FIELD_NAME,
                array.column(1).data_type()
            ))
        })?;

        Ok(Self::new(data.clone(), shape.clone(), array.nulls().cloned()))
    }

    /// Number of elements, taken from the `data` child
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data(&self) -> &GenericListArray<O> {
        &self.data
    }

    /// Mutable access to the values child. Edits are not re-validated.
    pub fn data_mut(&mut self) -> &mut GenericListArray<O> {
        &mut self.data
    }

    pub fn shape(&self) -> &FixedSizeListArray {
        &self.shape
    }

    /// Mutable access to the shape child. Edits are not re-validated.
    pub fn shape_mut(&mut self) -> &mut FixedSizeListArray {
        &mut self.shape
    }

    pub fn nulls(&self) -> Option<&NullBuffer> {
        self.nulls.as_ref()
    }

    pub fn nulls_mut(&mut self) -> &mut Option<NullBuffer> {
        &mut self.nulls
    }

    /// Child fields in storage order
    pub fn fields(&self) -> Fields {
        Fields::from(vec![
            Field::new(DATA_FIELD_NAME, self.data.data_type().clone(), true),
            Field::new(SHAPE_FIELD_NAME, self.shape.data_type().clone(), true),
        ])
    }

    /// Arrow type of the storage struct
    pub fn data_type(&self) -> DataType {
        DataType::Struct(self.fields())
    }

    /// Export as an Arrow struct array sharing the same buffers
    pub fn to_struct_array(&self) -> Result<StructArray, ArrowError> {
        let columns: Vec<ArrayRef> =
            vec![Arc::new(self.data.clone()), Arc::new(self.shape.clone())];
        StructArray::try_new(self.fields(), columns, self.nulls.clone())
    }

    pub fn into_parts(self) -> (GenericListArray<O>, FixedSizeListArray, Option<NullBuffer>) {
        (self.data, self.shape, self.nulls)
    }
}
