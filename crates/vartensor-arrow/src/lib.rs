//! # vartensor-arrow
//!
//! Arrow-backed arrays of variable-shape tensors.
//!
//! Every element of a variable-shape tensor array is a dense tensor with the
//! same number of dimensions (`ndim`) but its own sizes. The array is stored
//! as the `arrow.variable_shape_tensor` extension type over a struct:
//!
//! - `data`: `List<T>` or `LargeList<T>`, the row-major values of each tensor
//! - `shape`: `FixedSizeList<Int32>[ndim]`, the sizes of each tensor
//!
//! with [`vartensor_core::TensorMetadata`] serialized into the field's
//! `ARROW:extension:metadata` entry.
//!
//! ## Quick Start
//!
//! ```
//! use arrow::datatypes::Int32Type;
//! use vartensor_arrow::{TensorArrayOptions, VariableShapeTensorArray, VariableShapeTensorBuilder};
//! use vartensor_core::TensorMetadata;
//!
//! let mut builder = VariableShapeTensorBuilder::<Int32Type>::new(2);
//! builder.append(&[2, 3], &[1, 2, 3, 4, 5, 6]).unwrap();
//! builder.append(&[1, 1], &[7]).unwrap();
//!
//! let meta = TensorMetadata::default().with_dim_names(["H", "W"]);
//! let array = builder
//!     .finish(meta, TensorArrayOptions::default().with_name("patches"))
//!     .unwrap();
//!
//! // Export for IPC or record batches, then read it back
//! let (field, storage) = array.to_arrow().unwrap();
//! let decoded = VariableShapeTensorArray::try_from_arrow(&field, &storage).unwrap();
//! assert_eq!(decoded.ndim(), Some(2));
//!
//! for tensor in decoded.iter().flatten() {
//!     assert_eq!(tensor.len(), tensor.shape().iter().product::<usize>());
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`TensorArrayResult`]. Construction either
//! yields a fully valid array or the first [`ValidationError`] found;
//! malformed metadata JSON surfaces as [`TensorArrayError::Parse`] and
//! indexed access past the end as [`TensorArrayError::OutOfRange`].

#![deny(warnings)]

pub mod array;
pub mod builder;
pub mod element;
pub mod error;
pub mod extension;
pub mod options;
pub mod proxy;
pub mod storage;


pub use array::{GenericVariableShapeTensorArray, LargeVariableShapeTensorArray, VariableShapeTensorArray};
pub use builder::VariableShapeTensorBuilder;
pub use element::{Shape, VariableShapeTensor, VariableShapeTensorIter};
pub use error::{TensorArrayError, TensorArrayResult, ValidationError};
pub use extension::{VariableShapeTensorType, EXTENSION_NAME};
pub use options::TensorArrayOptions;
pub use proxy::TensorArrayProxy;
pub use storage::TensorStorage;
