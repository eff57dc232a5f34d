//! Error types for tensor metadata validation and the JSON codec
//!
//! # Design
//!
//! - **`MetadataError`**: a metadata value breaks one of the consistency rules
//! - **`CodecError`**: the JSON text could not be parsed (or, in theory, produced)
//!
//! # Examples
//!
//! ```
//! use vartensor_core::error::MetadataError;
//! use vartensor_core::TensorMetadata;
//!
//! let meta = TensorMetadata::new(None, Some(vec![]), None);
//! assert!(matches!(meta.validate(), Err(MetadataError::EmptyPermutation)));
//! ```

use thiserror::Error;

/// Violations of the tensor metadata consistency rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Dimensionality mismatch: {first} has {first_len} entries but {second} has {second_len}")]
    DimensionalityMismatch {
        first: &'static str,
        first_len: usize,
        second: &'static str,
        second_len: usize,
    },

    #[error("Permutation cannot be empty")]
    EmptyPermutation,

    #[error("Permutation entry {value} at position {position} is outside [0, {ndim})")]
    PermutationOutOfRange {
        position: usize,
        value: i64,
        ndim: usize,
    },

    #[error("Permutation entry {value} appears more than once")]
    DuplicatePermutationEntry { value: i64 },

    #[error("Uniform shape entry for axis {axis} must be positive, got {value}")]
    NonPositiveUniformDim { axis: usize, value: i32 },
}

/// Errors raised by the metadata JSON codec
#[derive(Error, Debug)]
pub enum CodecError {
    /// Malformed metadata text
    #[error("Failed to parse tensor metadata JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// Metadata could not be rendered as JSON
    #[error("Failed to encode tensor metadata JSON: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CodecError {
    /// Byte-level position of a parse failure, as (line, column)
    pub fn position(&self) -> (usize, usize) {
        match self {
            CodecError::Parse(e) | CodecError::Encode(e) => (e.line(), e.column()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_error_display() {
        let err = MetadataError::DimensionalityMismatch {
            first: "dim_names",
            first_len: 2,
            second: "permutation",
            second_len: 3,
        };
        assert_eq!(
            err.to_string(),
            "Dimensionality mismatch: dim_names has 2 entries but permutation has 3"
        );
    }

    #[test]
    fn test_permutation_error_display() {
        let err = MetadataError::PermutationOutOfRange {
            position: 2,
            value: 3,
            ndim: 3,
        };
        assert_eq!(
            err.to_string(),
            "Permutation entry 3 at position 2 is outside [0, 3)"
        );
    }

    #[test]
    fn test_codec_error_position() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": ").unwrap_err();
        let err = CodecError::Parse(err);
        let (line, _column) = err.position();
        assert_eq!(line, 2);
        assert!(err.to_string().starts_with("Failed to parse tensor metadata JSON"));
    }
}
