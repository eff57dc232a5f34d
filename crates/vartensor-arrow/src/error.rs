//! Error types for variable-shape tensor arrays
//!
//! # Design
//!
//! - **`TensorArrayError`**: top-level enum returned by every fallible operation
//! - **`ValidationError`**: the inputs of a constructor break a structural rule
//! - Metadata JSON failures surface as [`TensorArrayError::Parse`]
//! - Index access past the end surfaces as [`TensorArrayError::OutOfRange`]
//!
//! Construction never returns a partially valid array: either every check
//! passes or the first failing one is reported.

use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use thiserror::Error;
use vartensor_core::{CodecError, MetadataError};

/// Top-level error type for tensor array operations
#[derive(Error, Debug)]
pub enum TensorArrayError {
    /// Structural or metadata validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Extension metadata was not valid JSON
    #[error("Metadata parse error: {0}")]
    Parse(#[from] CodecError),

    /// Element index at or beyond the array length
    #[error("Index {index} out of range for tensor array of length {len}")]
    OutOfRange { index: usize, len: usize },

    /// Error reported by the underlying Arrow containers
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// Validation errors raised while assembling a tensor array
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid tensor metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Shape list size must equal ndim: expected {expected}, got {got}")]
    ShapeListSize { expected: usize, got: usize },

    #[error("Metadata describes {metadata} dimensions but ndim is {ndim}")]
    MetadataNdimMismatch { ndim: usize, metadata: usize },

    #[error("Element count mismatch: data child has {data} elements, shape child has {shape}")]
    LengthMismatch { data: usize, shape: usize },

    #[error("Validity bitmap must cover every element: expected {expected}, got {got}")]
    ValidityLength { expected: usize, got: usize },

    #[error("Shape values must be Int32, got {0}")]
    ShapeValueType(DataType),

    #[error("Element {index} is present but its shape is null")]
    NullShape { index: usize },

    #[error("Element {index} has a null size at axis {axis}")]
    NullShapeEntry { index: usize, axis: usize },

    #[error("Element {index} has negative size {value} at axis {axis}")]
    NegativeShapeEntry { index: usize, axis: usize, value: i32 },

    #[error("Element {index} with shape {shape:?} needs {expected} values, got {got}")]
    ValueCountMismatch {
        index: usize,
        shape: Vec<i32>,
        expected: usize,
        got: usize,
    },

    #[error("Element {index} has size {got} at uniform axis {axis}, expected {expected}")]
    UniformShapeMismatch {
        index: usize,
        axis: usize,
        expected: i32,
        got: i32,
    },

    #[error("Expected extension type {expected}, found {found}")]
    ExtensionName {
        expected: &'static str,
        found: String,
    },

    #[error("Invalid storage layout: {reason}")]
    StorageLayout { reason: String },
}

/// Result type alias for tensor array operations
pub type TensorArrayResult<T> = Result<T, TensorArrayError>;

impl ValidationError {
    pub(crate) fn layout(reason: impl Into<String>) -> Self {
        ValidationError::StorageLayout {
            reason: reason.into(),
        }
    }
}

impl From<MetadataError> for TensorArrayError {
    fn from(err: MetadataError) -> Self {
        TensorArrayError::Validation(ValidationError::Metadata(err))
    }
}

impl From<TensorArrayError> for ArrowError {
    fn from(err: TensorArrayError) -> Self {
        match err {
            TensorArrayError::Arrow(e) => e,
            TensorArrayError::Parse(e) => ArrowError::ParseError(e.to_string()),
            other => ArrowError::InvalidArgumentError(other.to_string()),
        }
    }
}
