//! # vartensor-core
//!
//! Metadata model and JSON codec for variable-shape tensor arrays.
//!
//! A variable-shape tensor array stores many tensors that share the same number
//! of dimensions while every tensor has its own per-dimension sizes. This crate
//! holds the part of that design that does not depend on any columnar storage:
//!
//! - **Metadata model** ([`TensorMetadata`]): optional dimension names,
//!   dimension permutation and uniform shape, with validation and
//!   dimensionality resolution
//! - **JSON codec** ([`json`]): compact, deterministic encoding of the metadata
//!   as it travels in Arrow extension metadata
//!
//! The Arrow-backed array view lives in `vartensor-arrow`.
//!
//! ## Quick Start
//!
//! ```
//! use vartensor_core::TensorMetadata;
//!
//! let meta = TensorMetadata::from_json(r#"{"dim_names":["C","H","W"],"permutation":[2,0,1]}"#)
//!     .unwrap();
//! assert!(meta.is_valid());
//! assert_eq!(meta.get_ndim(), Some(3));
//! assert_eq!(meta.to_json().unwrap(), r#"{"dim_names":["C","H","W"],"permutation":[2,0,1]}"#);
//! ```
//!
//! ## Validation Rules
//!
//! - Present fields agree on one length (the dimensionality)
//! - A permutation is non-empty and a bijection on `[0, ndim)`
//! - Uniform sizes are strictly positive
//!
//! ```
//! use vartensor_core::TensorMetadata;
//!
//! let meta = TensorMetadata::default()
//!     .with_dim_names(["C", "H"])
//!     .with_permutation(vec![2, 0, 1]);
//! assert!(!meta.is_valid());
//! ```
//!
//! ## Error Handling
//!
//! Validation reports [`MetadataError`]; the codec reports [`CodecError`].

#![deny(warnings)]

pub mod error;
pub mod json;
pub mod metadata;


pub use error::{CodecError, MetadataError};
pub use metadata::TensorMetadata;

/// Number of dimensions of a tensor
pub type Rank = usize;
