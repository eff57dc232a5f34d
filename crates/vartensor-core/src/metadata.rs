//! Descriptive metadata shared by every tensor of a variable-shape tensor array.
//!
//! [`TensorMetadata`] carries three optional fields:
//!
//! - **`dim_names`**: one symbolic name per dimension (e.g. `["C", "H", "W"]`)
//! - **`permutation`**: physical-to-logical dimension order, a bijection on `[0, ndim)`
//! - **`uniform_shape`**: per-dimension fixed size, `None` where the size varies
//!
//! Whichever fields are present must describe the same dimensionality.
//!
//! # Examples
//!
//! ```
//! use vartensor_core::TensorMetadata;
//!
//! let meta = TensorMetadata::default()
//!     .with_dim_names(["H", "W", "C"])
//!     .with_uniform_shape(vec![None, None, Some(3)]);
//!
//! assert!(meta.is_valid());
//! assert_eq!(meta.get_ndim(), Some(3));
//! assert!(meta.is_uniform(2));
//! assert!(!meta.is_uniform(0));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::MetadataError;
use crate::Rank;

/// Metadata of a variable-shape tensor array.
///
/// Field declaration order is the JSON key order, see [`crate::json`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dim_names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    permutation: Option<Vec<i64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    uniform_shape: Option<Vec<Option<i32>>>,
}

impl TensorMetadata {
    /// Create metadata from its three optional fields.
    ///
    /// No validation happens here; call [`validate`](Self::validate) or
    /// [`is_valid`](Self::is_valid) before relying on the fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use vartensor_core::TensorMetadata;
    ///
    /// let meta = TensorMetadata::new(
    ///     Some(vec!["X".into(), "Y".into()]),
    ///     Some(vec![1, 0]),
    ///     None,
    /// );
    /// assert!(meta.is_valid());
    /// ```
    pub fn new(
        dim_names: Option<Vec<String>>,
        permutation: Option<Vec<i64>>,
        uniform_shape: Option<Vec<Option<i32>>>,
    ) -> Self {
        Self {
            dim_names,
            permutation,
            uniform_shape,
        }
    }

    /// Replace the dimension names
    pub fn with_dim_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dim_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the permutation
    pub fn with_permutation(mut self, permutation: Vec<i64>) -> Self {
        self.permutation = Some(permutation);
        self
    }

    /// Replace the uniform shape
    pub fn with_uniform_shape(mut self, uniform_shape: Vec<Option<i32>>) -> Self {
        self.uniform_shape = Some(uniform_shape);
        self
    }

    pub fn dim_names(&self) -> Option<&[String]> {
        self.dim_names.as_deref()
    }

    pub fn permutation(&self) -> Option<&[i64]> {
        self.permutation.as_deref()
    }

    pub fn uniform_shape(&self) -> Option<&[Option<i32>]> {
        self.uniform_shape.as_deref()
    }

    /// Decompose into `(dim_names, permutation, uniform_shape)`
    pub fn into_parts(
        self,
    ) -> (
        Option<Vec<String>>,
        Option<Vec<i64>>,
        Option<Vec<Option<i32>>>,
    ) {
        (self.dim_names, self.permutation, self.uniform_shape)
    }

    /// Whether any of the three fields is present
    pub fn has_structure(&self) -> bool {
        self.dim_names.is_some() || self.permutation.is_some() || self.uniform_shape.is_some()
    }

    /// Name of `axis`, if dimension names are declared and `axis` is in range
    pub fn dim_name(&self, axis: usize) -> Option<&str> {
        self.dim_names
            .as_ref()
            .and_then(|names| names.get(axis))
            .map(String::as_str)
    }

    /// Fixed size of `axis` across all elements, if declared
    pub fn uniform_dim(&self, axis: usize) -> Option<i32> {
        self.uniform_shape
            .as_ref()
            .and_then(|shape| shape.get(axis).copied().flatten())
    }

    /// Whether `axis` has a declared fixed size
    pub fn is_uniform(&self, axis: usize) -> bool {
        self.uniform_dim(axis).is_some()
    }

    /// Dimensionality implied by the present fields.
    ///
    /// Returns `None` when all three fields are absent. For valid metadata
    /// every present field has the same length. For invalid metadata the first
    /// present field in key order (`dim_names`, `permutation`,
    /// `uniform_shape`) decides.
    ///
    /// # Examples
    ///
    /// ```
    /// use vartensor_core::TensorMetadata;
    ///
    /// let meta = TensorMetadata::default().with_permutation(vec![2, 0, 1, 3]);
    /// assert_eq!(meta.get_ndim(), Some(4));
    /// assert_eq!(TensorMetadata::default().get_ndim(), None);
    /// ```
    pub fn get_ndim(&self) -> Option<Rank> {
        self.dim_names
            .as_ref()
            .map(Vec::len)
            .or_else(|| self.permutation.as_ref().map(Vec::len))
            .or_else(|| self.uniform_shape.as_ref().map(Vec::len))
    }

    /// Check every consistency rule, reporting the first violation.
    ///
    /// # Errors
    ///
    /// - [`MetadataError::DimensionalityMismatch`] if two present fields differ in length
    /// - [`MetadataError::EmptyPermutation`] if the permutation has no entries
    /// - [`MetadataError::PermutationOutOfRange`] for an entry outside `[0, len)`
    /// - [`MetadataError::DuplicatePermutationEntry`] for a repeated entry
    /// - [`MetadataError::NonPositiveUniformDim`] for a uniform size `<= 0`
    pub fn validate(&self) -> Result<(), MetadataError> {
        self.check_dimensionality()?;

        if let Some(permutation) = &self.permutation {
            check_permutation(permutation)?;
        }

        if let Some(uniform_shape) = &self.uniform_shape {
            for (axis, dim) in uniform_shape.iter().enumerate() {
                if let Some(value) = *dim {
                    if value <= 0 {
                        return Err(MetadataError::NonPositiveUniformDim { axis, value });
                    }
                }
            }
        }

        Ok(())
    }

    /// `true` when [`validate`](Self::validate) succeeds
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn check_dimensionality(&self) -> Result<(), MetadataError> {
        let lengths = [
            ("dim_names", self.dim_names.as_ref().map(Vec::len)),
            ("permutation", self.permutation.as_ref().map(Vec::len)),
            ("uniform_shape", self.uniform_shape.as_ref().map(Vec::len)),
        ];

        let mut present = lengths
            .iter()
            .filter_map(|&(field, len)| len.map(|len| (field, len)));

        if let Some((first, first_len)) = present.next() {
            for (second, second_len) in present {
                if second_len != first_len {
                    return Err(MetadataError::DimensionalityMismatch {
                        first,
                        first_len,
                        second,
                        second_len,
                    });
                }
            }
        }

        Ok(())
    }
}

fn check_permutation(permutation: &[i64]) -> Result<(), MetadataError> {
    if permutation.is_empty() {
        return Err(MetadataError::EmptyPermutation);
    }

    let ndim = permutation.len();
    let mut seen = vec![false; ndim];
    for (position, &value) in permutation.iter().enumerate() {
        let slot = usize::try_from(value)
            .ok()
            .filter(|&v| v < ndim)
            .ok_or(MetadataError::PermutationOutOfRange {
                position,
                value,
                ndim,
            })?;
        if std::mem::replace(&mut seen[slot], true) {
            return Err(MetadataError::DuplicatePermutationEntry { value });
        }
    }

    Ok(())
}
