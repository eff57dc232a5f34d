//! Extension-type identity of variable-shape tensor arrays.
//!
//! A field carries the extension through two metadata entries:
//!
//! - `ARROW:extension:name` = `"arrow.variable_shape_tensor"`
//! - `ARROW:extension:metadata` = compact JSON of [`TensorMetadata`]
//!
//! [`VariableShapeTensorType`] implements Arrow's [`ExtensionType`] trait, which
//! is how `Field::try_extension_type` and `Field::with_extension_type` recognise
//! and attach this extension. No process-wide registration step is needed.
//!
//! # Examples
//!
//! ```
//! use arrow::datatypes::{DataType, Field};
//! use vartensor_arrow::extension::VariableShapeTensorType;
//! use vartensor_core::TensorMetadata;
//!
//! let meta = TensorMetadata::default().with_dim_names(["H", "W"]);
//! let ext = VariableShapeTensorType::try_new_with(DataType::Float32, 2, false, meta).unwrap();
//!
//! let field = Field::new("images", ext.storage_type(), true).with_extension_type(ext.clone());
//! assert_eq!(field.extension_type_name(), Some("arrow.variable_shape_tensor"));
//!
//! let decoded = field.try_extension_type::<VariableShapeTensorType>().unwrap();
//! assert_eq!(decoded, ext);
//! ```

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Fields};
use arrow::error::ArrowError;
use arrow_schema::extension::ExtensionType;
use vartensor_core::{json, TensorMetadata};

use crate::error::{TensorArrayError, ValidationError};
use crate::storage::{DATA_FIELD_NAME, SHAPE_FIELD_NAME};

/// Extension name of variable-shape tensor arrays
pub const EXTENSION_NAME: &str = "arrow.variable_shape_tensor";

/// Field metadata key holding the extension name
pub const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";

/// Field metadata key holding the serialized extension metadata
pub const EXTENSION_METADATA_KEY: &str = "ARROW:extension:metadata";

/// Logical type of a variable-shape tensor column.
///
/// Captures the value type of the tensors, their dimensionality, the offset
/// width of the `data` child and the descriptive [`TensorMetadata`].
#[derive(Debug, Clone, PartialEq)]
pub struct VariableShapeTensorType {
    value_type: DataType,
    ndim: usize,
    large_offsets: bool,
    metadata: TensorMetadata,
}

impl VariableShapeTensorType {
    /// Create the extension type, checking the metadata against `ndim`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the metadata is invalid or describes a
    /// dimensionality other than `ndim`.
    pub fn try_new_with(
        value_type: DataType,
        ndim: usize,
        large_offsets: bool,
        metadata: TensorMetadata,
    ) -> Result<Self, TensorArrayError> {
        check_metadata(ndim, &metadata)?;
        Ok(Self {
            value_type,
            ndim,
            large_offsets,
            metadata,
        })
    }

    /// Assemble from parts that were already checked by the array constructor
    pub(crate) fn new_unchecked(
        value_type: DataType,
        ndim: usize,
        large_offsets: bool,
        metadata: TensorMetadata,
    ) -> Self {
        Self {
            value_type,
            ndim,
            large_offsets,
            metadata,
        }
    }

    pub fn value_type(&self) -> &DataType {
        &self.value_type
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn large_offsets(&self) -> bool {
        self.large_offsets
    }

    pub fn tensor_metadata(&self) -> &TensorMetadata {
        &self.metadata
    }

    /// Storage struct type: `{data: List<T>, shape: FixedSizeList<Int32>[ndim]}`
    pub fn storage_type(&self) -> DataType {
        let item = Arc::new(Field::new("item", self.value_type.clone(), true));
        let data_type = if self.large_offsets {
            DataType::LargeList(item)
        } else {
            DataType::List(item)
        };
        let shape_type = DataType::FixedSizeList(
            Arc::new(Field::new("item", DataType::Int32, false)),
            self.ndim as i32,
        );
        DataType::Struct(Fields::from(vec![
            Field::new(DATA_FIELD_NAME, data_type, true),
            Field::new(SHAPE_FIELD_NAME, shape_type, true),
        ]))
    }
}

/// Storage properties read back from a struct type
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StorageLayout {
    pub value_type: DataType,
    pub ndim: usize,
    pub large_offsets: bool,
}

/// Inspect a storage type and extract value type, ndim and offset width
pub(crate) fn inspect_storage_type(data_type: &DataType) -> Result<StorageLayout, ValidationError> {
    let fields = match data_type {
        DataType::Struct(fields) => fields,
        other => {
            return Err(ValidationError::layout(format!(
                "storage must be a struct, found {}",
                other
            )))
        }
    };

    let names: Vec<&str> = fields.iter().map(|f| f.name().as_str()).collect();
    if names != [DATA_FIELD_NAME, SHAPE_FIELD_NAME] {
        return Err(ValidationError::layout(format!(
            "expected children [\"{}\", \"{}\"], found {:?}",
            DATA_FIELD_NAME, SHAPE_FIELD_NAME, names
        )));
    }

    let (value_type, large_offsets) = match fields[0].data_type() {
        DataType::List(item) => (item.data_type().clone(), false),
        DataType::LargeList(item) => (item.data_type().clone(), true),
        other => {
            return Err(ValidationError::layout(format!(
                "\"{}\" child must be a List or LargeList, found {}",
                DATA_FIELD_NAME, other
            )))
        }
    };

    let ndim = match fields[1].data_type() {
        DataType::FixedSizeList(item, size) => {
            if item.data_type() != &DataType::Int32 {
                return Err(ValidationError::ShapeValueType(item.data_type().clone()));
            }
            usize::try_from(*size).map_err(|_| {
                ValidationError::layout(format!("negative shape list size {}", size))
            })?
        }
        other => {
            return Err(ValidationError::layout(format!(
                "\"{}\" child must be a FixedSizeList, found {}",
                SHAPE_FIELD_NAME, other
            )))
        }
    };

    Ok(StorageLayout {
        value_type,
        ndim,
        large_offsets,
    })
}

/// Metadata must be valid and, when it implies a dimensionality, agree with `ndim`
pub(crate) fn check_metadata(ndim: usize, metadata: &TensorMetadata) -> Result<(), ValidationError> {
    metadata.validate()?;
    match metadata.get_ndim() {
        Some(implied) if implied != ndim => Err(ValidationError::MetadataNdimMismatch {
            ndim,
            metadata: implied,
        }),
        _ => Ok(()),
    }
}

/// Decode the optional extension metadata string; absence means `{}`
pub(crate) fn decode_metadata(text: Option<&str>) -> Result<TensorMetadata, TensorArrayError> {
    match text {
        None => Ok(TensorMetadata::default()),
        Some(text) => Ok(json::from_json(text)?),
    }
}

impl ExtensionType for VariableShapeTensorType {
    const NAME: &'static str = EXTENSION_NAME;

    type Metadata = TensorMetadata;

    fn metadata(&self) -> &Self::Metadata {
        &self.metadata
    }

    fn serialize_metadata(&self) -> Option<String> {
        json::to_json(&self.metadata).ok()
    }

    fn deserialize_metadata(metadata: Option<&str>) -> Result<Self::Metadata, ArrowError> {
        Ok(decode_metadata(metadata)?)
    }

    fn supports_data_type(&self, data_type: &DataType) -> Result<(), ArrowError> {
        let layout = inspect_storage_type(data_type).map_err(TensorArrayError::from)?;
        let expected = StorageLayout {
            value_type: self.value_type.clone(),
            ndim: self.ndim,
            large_offsets: self.large_offsets,
        };
        if layout != expected {
            return Err(ArrowError::InvalidArgumentError(format!(
                "{} expects storage {}, found {}",
                EXTENSION_NAME,
                self.storage_type(),
                data_type
            )));
        }
        Ok(())
    }

    fn try_new(data_type: &DataType, metadata: Self::Metadata) -> Result<Self, ArrowError> {
        let layout = inspect_storage_type(data_type).map_err(TensorArrayError::from)?;
        Ok(Self::try_new_with(
            layout.value_type,
            layout.ndim,
            layout.large_offsets,
            metadata,
        )?)
    }
}
