#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::config::{ConfigError, ConvertConfig, PaddingConfig};
    use crate::enums::*;
    use crate::events::{CancelFlag, LogSink, ProgressSink, RecordingSink};
    use crate::types::{AffineTransform, ElevationRange, TerrainExtent, UtmZone};

    /// Verify all enums round-trip through serde_json.
    #[test]
    fn test_coordinate_kind_serde() {
        for v in [CoordinateKind::Geographic, CoordinateKind::Projected] {
            let json = serde_json::to_string(&v).unwrap();
            let back: CoordinateKind = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn test_hemisphere_serde() {
        for v in [Hemisphere::North, Hemisphere::South] {
            let json = serde_json::to_string(&v).unwrap();
            let back: Hemisphere = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn test_types_serde() {
        let gt = AffineTransform::from_coefficients([1.0, 2.0, 3.0, 4.0, 5.0, -6.0]);
        let back: AffineTransform =
            serde_json::from_str(&serde_json::to_string(&gt).unwrap()).unwrap();
        assert_eq!(gt, back);

        let zone = UtmZone::from_lon_lat(56.2, 26.5);
        let back: UtmZone = serde_json::from_str(&serde_json::to_string(&zone).unwrap()).unwrap();
        assert_eq!(zone, back);

        let range = ElevationRange::new(-12.5, 840.0).unwrap();
        let back: ElevationRange =
            serde_json::from_str(&serde_json::to_string(&range).unwrap()).unwrap();
        assert_eq!(range, back);

        let extent = TerrainExtent::new(3000.0, 2999.5);
        let back: TerrainExtent =
            serde_json::from_str(&serde_json::to_string(&extent).unwrap()).unwrap();
        assert_eq!(extent, back);
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config = ConvertConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ConvertConfig::default());
        assert_eq!(config.padding.min_border_pixels, 5);
        assert_eq!(config.padding.border_fraction_divisor, 20);
        assert!((config.padding.border_zero_ratio_threshold - 0.30).abs() < 1e-12);
        assert!((config.pixel_square_tolerance - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn test_config_partial_override() {
        let config = ConvertConfig::from_json_str(
            r#"{"detect_padding": false, "border_fraction_divisor": 10, "min_border_pixels": 8}"#,
        )
        .unwrap();
        assert!(!config.padding.enabled);
        assert_eq!(config.padding.min_border_pixels, 8);
        assert_eq!(config.padding.border_fraction_divisor, 10);
        assert_eq!(
            config.padding.border_zero_ratio_threshold,
            PaddingConfig::default().border_zero_ratio_threshold
        );
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        let err = ConvertConfig::from_json_str(r#"{"detect_paddin": false}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        // The nested layout is not accepted either.
        let err = ConvertConfig::from_json_str(r#"{"padding": {"enabled": false}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_config_serializes_flat() {
        let json = serde_json::to_value(ConvertConfig::default()).unwrap();
        assert_eq!(json["detect_padding"], serde_json::Value::Bool(true));
        assert_eq!(json["border_fraction_divisor"], 20);
        assert!(json.get("padding").is_none());

        let back: ConvertConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, ConvertConfig::default());
    }

    #[test]
    fn test_config_rejects_bad_center_band() {
        let err = ConvertConfig::from_json_str(r#"{"center_band": [0.8, 0.2]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err =
            ConvertConfig::from_json_str(r#"{"border_fraction_divisor": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pixel_square_tolerance": 0.01}}"#).unwrap();
        let config = ConvertConfig::from_json_file(file.path()).unwrap();
        assert!((config.pixel_square_tolerance - 0.01).abs() < 1e-12);

        let missing = ConvertConfig::from_json_file(std::path::Path::new("/nonexistent/cfg.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_recording_sink_cancellation() {
        let flag = CancelFlag::new();
        let mut sink = RecordingSink::with_cancel(flag.clone());
        sink.push_info("first line");
        assert!(!sink.is_canceled());
        flag.cancel();
        assert!(sink.is_canceled());
        assert!(sink.contains("first"));
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn test_log_sink_follows_cancel_flag() {
        let flag = CancelFlag::new();
        let mut sink = LogSink::new(flag.clone());
        sink.push_info("Detected center Lon/Lat: (15.000000, 52.000000)");
        assert!(!sink.is_canceled());
        flag.cancel();
        assert!(sink.is_canceled());
        assert!(!LogSink::default().is_canceled());
    }

    #[test]
    fn test_sink_through_mut_reference() {
        fn push_twice<S: ProgressSink>(mut sink: S) {
            sink.push_info("a");
            sink.push_info("b");
        }
        let mut sink = RecordingSink::new();
        push_twice(&mut sink);
        assert_eq!(sink.into_lines(), vec!["a".to_string(), "b".to_string()]);
    }
}
