//! Compact JSON codec for [`TensorMetadata`].
//!
//! Wire format (all keys optional, emitted in this order):
//!
//! ```text
//! {
//!   "dim_names": [string, ...],
//!   "permutation": [int, ...],
//!   "uniform_shape": [int-or-null, ...]
//! }
//! ```
//!
//! Absent fields are omitted, so metadata without any field encodes to `{}`.
//! Decoding tolerates whitespace between tokens and ignores keys it does not
//! know about.
//!
//! # Examples
//!
//! ```
//! use vartensor_core::{json, TensorMetadata};
//!
//! let meta = TensorMetadata::default().with_uniform_shape(vec![Some(400), None, Some(3)]);
//! let text = json::to_json(&meta).unwrap();
//! assert_eq!(text, r#"{"uniform_shape":[400,null,3]}"#);
//!
//! let parsed = json::from_json(&text).unwrap();
//! assert_eq!(parsed, meta);
//! ```

use crate::error::CodecError;
use crate::metadata::TensorMetadata;

/// Encode metadata as a compact JSON object.
///
/// Only present fields are written, in the order `dim_names`, `permutation`,
/// `uniform_shape`. No whitespace is emitted.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails. The metadata model
/// only holds strings and integers, so this does not happen in practice.
pub fn to_json(meta: &TensorMetadata) -> Result<String, CodecError> {
    let text = serde_json::to_string(meta).map_err(CodecError::Encode)?;
    tracing::trace!(json = %text, "encoded tensor metadata");
    Ok(text)
}

/// Decode metadata from JSON text.
///
/// The result is not validated; callers that need the consistency rules
/// should call [`TensorMetadata::validate`].
///
/// # Errors
///
/// Returns [`CodecError::Parse`] for unterminated objects or arrays, missing
/// delimiters, non-integer dimension values, non-string names, and trailing
/// characters after the object.
pub fn from_json(text: &str) -> Result<TensorMetadata, CodecError> {
    let meta: TensorMetadata = serde_json::from_str(text).map_err(|e| {
        tracing::debug!(error = %e, "rejected tensor metadata JSON");
        CodecError::Parse(e)
    })?;
    tracing::trace!(ndim = ?meta.get_ndim(), "decoded tensor metadata");
    Ok(meta)
}

impl TensorMetadata {
    /// Encode as compact JSON, see [`to_json`]
    pub fn to_json(&self) -> Result<String, CodecError> {
        to_json(self)
    }

    /// Decode from JSON, see [`from_json`]
    pub fn from_json(text: &str) -> Result<Self, CodecError> {
        from_json(text)
    }
}

impl std::str::FromStr for TensorMetadata {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_json(s)
    }
}
