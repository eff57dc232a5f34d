//! Integration tests for vartensor-core
//!
//! These tests drive the metadata model through the public API only, the way
//! the array crate and external readers do.

use vartensor_core::{json, CodecError, MetadataError, TensorMetadata};

#[test]
fn test_image_batch_metadata() {
    // Channel-last images of varying height/width with a fixed channel count
    let meta = TensorMetadata::default()
        .with_dim_names(["H", "W", "C"])
        .with_uniform_shape(vec![None, None, Some(3)]);

    assert!(meta.is_valid());
    assert_eq!(meta.get_ndim(), Some(3));

    let text = json::to_json(&meta).unwrap();
    assert_eq!(text, r#"{"dim_names":["H","W","C"],"uniform_shape":[null,null,3]}"#);

    let restored = json::from_json(&text).unwrap();
    assert_eq!(restored, meta);
    assert_eq!(restored.dim_name(2), Some("C"));
    assert_eq!(restored.uniform_dim(2), Some(3));
}

#[test]
fn test_parse_then_validate_reports_reason() {
    let meta = json::from_json(r#"{"dim_names":["X","Y"],"permutation":[0,1,2]}"#).unwrap();
    match meta.validate() {
        Err(MetadataError::DimensionalityMismatch {
            first_len,
            second_len,
            ..
        }) => {
            assert_eq!(first_len, 2);
            assert_eq!(second_len, 3);
        }
        other => panic!("unexpected validation result: {:?}", other),
    }
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = json::from_json(r#"{"dim_names":["C","H","W""#).unwrap_err();
    assert!(matches!(err, CodecError::Parse(_)));
}

#[test]
fn test_round_trip_preserves_every_combination() {
    let names = || Some(vec!["a".to_string(), "b".to_string()]);
    let perm = || Some(vec![1i64, 0]);
    let uniform = || Some(vec![None, Some(5)]);

    for mask in 0u8..8 {
        let meta = TensorMetadata::new(
            if mask & 1 != 0 { names() } else { None },
            if mask & 2 != 0 { perm() } else { None },
            if mask & 4 != 0 { uniform() } else { None },
        );
        let text = meta.to_json().unwrap();
        assert_eq!(TensorMetadata::from_json(&text).unwrap(), meta, "mask {mask}");
        assert!(meta.is_valid());
        assert_eq!(meta.get_ndim().is_none(), mask == 0);
    }
}

#[test]
fn test_metadata_error_is_std_error() -> anyhow::Result<()> {
    let meta = TensorMetadata::default().with_permutation(vec![]);
    let result: anyhow::Result<()> = meta.validate().map_err(Into::into);
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Permutation cannot be empty");

    let ok = TensorMetadata::default().with_permutation(vec![0]);
    ok.validate()?;
    Ok(())
}
