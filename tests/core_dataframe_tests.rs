use meaview::core::{DataFrame, SourceMetadata};
use meaview::layout::ArrayKind;

#[test]
fn test_dataframe_from_interleaved() {
    let df = DataFrame::from_interleaved(1.0, 1.5, 2, vec![1, 10, 2, 20, 3, 30]).unwrap();

    assert_eq!(df.num_samples(), 3);
    assert_eq!(df.num_channels(), 2);
    assert!((df.duration() - 0.5).abs() < 1e-12);
    assert_eq!(df.channel(1).unwrap().to_vec(), vec![10, 20, 30]);
}

#[test]
fn test_interleaved_length_must_divide() {
    assert!(DataFrame::from_interleaved(0.0, 1.0, 3, vec![0; 7]).is_err());
    assert!(DataFrame::from_interleaved(0.0, 1.0, 0, vec![]).is_err());
}

#[test]
fn test_channels_must_have_equal_length() {
    let result = DataFrame::from_channels(0.0, 1.0, &[vec![1, 2], vec![3]]);
    assert!(result.is_err());
}

#[test]
fn test_slice_channel_copies_column() {
    let df = DataFrame::from_channels(0.0, 1.0, &[vec![1, 2], vec![3, 4]]).unwrap();

    let slice = df.slice_channel(1, 0.25).unwrap();
    assert_eq!(slice.channel, 1);
    assert_eq!(slice.samples, vec![3, 4]);
    assert_eq!(slice.gain, 0.25);
    assert!(df.slice_channel(2, 1.0).is_none());
}

#[test]
fn test_metadata_defaults() {
    let metadata = SourceMetadata {
        channel_count: 3,
        sample_rate: 20_000.0,
        gains: vec![0.5],
        array: "hidens-2011".to_string(),
    };

    assert_eq!(metadata.gain(0), 0.5);
    assert_eq!(metadata.gain(2), 1.0);
    assert_eq!(metadata.array_kind(), ArrayKind::HiDens);
}
