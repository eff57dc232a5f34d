//! # vartensor
//!
//! Variable-shape tensor arrays for Apache Arrow.
//!
//! This is the **meta crate** that re-exports the vartensor components:
//!
//! - [`core`]: metadata model (`dim_names`, `permutation`, `uniform_shape`)
//!   and its JSON codec
//! - [`arrow`]: the `arrow.variable_shape_tensor` extension array, its
//!   builder and Arrow import/export
//! - [`tracing_support`]: subscriber setup for the `tracing` events the
//!   library emits
//!
//! ## Quick Start
//!
//! ```
//! use vartensor::prelude::*;
//! use arrow::datatypes::UInt8Type;
//!
//! let mut builder = VariableShapeTensorBuilder::<UInt8Type>::new(3);
//! builder.append(&[2, 2, 3], &[0; 12])?;
//! builder.append(&[1, 5, 3], &[255; 15])?;
//!
//! let meta = TensorMetadata::default()
//!     .with_dim_names(["H", "W", "C"])
//!     .with_uniform_shape(vec![None, None, Some(3)]);
//! let images = builder.finish(meta, TensorArrayOptions::default().with_name("images"))?;
//!
//! assert_eq!(images.size(), 2);
//! assert_eq!(images.ndim(), Some(3));
//! assert_eq!(images.at(1)?.map(|t| t.shape().to_vec()), Some(vec![1, 5, 3]));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `tracing` (default): [`tracing_support::init_tracing`] installs a
//!   `tracing-subscriber` formatter; without it the call is a no-op

#![deny(warnings)]

pub use vartensor_arrow as arrow;
pub use vartensor_core as core;

pub mod tracing_support;

/// Commonly used types
pub mod prelude {
    pub use vartensor_arrow::{
        LargeVariableShapeTensorArray, TensorArrayError, TensorArrayOptions, TensorArrayResult,
        ValidationError, VariableShapeTensor, VariableShapeTensorArray, VariableShapeTensorBuilder,
        VariableShapeTensorType,
    };
    pub use vartensor_core::{CodecError, MetadataError, Rank, TensorMetadata};
}
