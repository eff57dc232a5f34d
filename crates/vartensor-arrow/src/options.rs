//! Optional construction parameters for tensor arrays.

use std::collections::HashMap;

use arrow::buffer::NullBuffer;

/// Name, attached key/value metadata and validity of a tensor array.
///
/// # Examples
///
/// ```
/// use vartensor_arrow::TensorArrayOptions;
///
/// let options = TensorArrayOptions::default()
///     .with_name("frames")
///     .with_metadata_entry("source", "camera_0")
///     .with_validity(vec![true, false, true]);
///
/// assert_eq!(options.name.as_deref(), Some("frames"));
/// assert_eq!(options.validity.as_ref().map(|v| v.null_count()), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TensorArrayOptions {
    /// Array name, exported as the Arrow field name
    pub name: Option<String>,
    /// Caller-supplied field metadata, merged with the extension identity
    pub metadata: HashMap<String, String>,
    /// Per-element presence; `None` means every element is present
    pub validity: Option<NullBuffer>,
}

impl TensorArrayOptions {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add every pair of `metadata`, replacing existing keys
    pub fn with_metadata<I, K, V>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata
            .extend(metadata.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the validity bitmap (`true` = present)
    pub fn with_validity(mut self, validity: impl Into<NullBuffer>) -> Self {
        self.validity = Some(validity.into());
        self
    }
}
