//! Raw extension container: name, field metadata and storage together.

use std::collections::HashMap;

use arrow::array::{OffsetSizeTrait, StructArray};
use arrow::datatypes::{DataType, Field};
use arrow::error::ArrowError;

use crate::extension::{EXTENSION_METADATA_KEY, EXTENSION_NAME_KEY};
use crate::storage::TensorStorage;

/// Everything an Arrow consumer sees of a tensor array.
///
/// The metadata map always contains the extension identity entries next to
/// whatever the caller attached.
#[derive(Debug, Clone)]
pub struct TensorArrayProxy<O: OffsetSizeTrait> {
    name: Option<String>,
    metadata: HashMap<String, String>,
    storage: TensorStorage<O>,
}

impl<O: OffsetSizeTrait> TensorArrayProxy<O> {
    pub(crate) fn new(
        name: Option<String>,
        metadata: HashMap<String, String>,
        storage: TensorStorage<O>,
    ) -> Self {
        Self {
            name,
            metadata,
            storage,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Field metadata including the extension identity
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.metadata
    }

    /// Value of `ARROW:extension:name`
    pub fn extension_name(&self) -> Option<&str> {
        self.metadata.get(EXTENSION_NAME_KEY).map(String::as_str)
    }

    /// Value of `ARROW:extension:metadata`
    pub fn extension_metadata(&self) -> Option<&str> {
        self.metadata.get(EXTENSION_METADATA_KEY).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn storage(&self) -> &TensorStorage<O> {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut TensorStorage<O> {
        &mut self.storage
    }

    pub fn data_type(&self) -> DataType {
        self.storage.data_type()
    }

    /// Arrow field describing this array; an unnamed array gets an empty name
    pub fn field(&self) -> Field {
        Field::new(
            self.name.clone().unwrap_or_default(),
            self.storage.data_type(),
            true,
        )
        .with_metadata(self.metadata.clone())
    }

    pub fn to_struct_array(&self) -> Result<StructArray, ArrowError> {
        self.storage.to_struct_array()
    }

    pub fn into_storage(self) -> TensorStorage<O> {
        self.storage
    }
}
