use demraw_terrain::core::events::{CancelFlag, RecordingSink};
use demraw_terrain::core::types::AffineTransform;
use demraw_terrain::core::{ConvertConfig, CoordinateKind};
use demraw_terrain::{
    geotiff, parse_settings, raw, ConvertError, Converter, Raster, SpatialRef, SyntheticDem,
};

/// 101×201 UTM raster whose elevation is `100 + row`.
fn tall_ramp() -> Raster {
    let (w, h) = (101, 201);
    let samples = (0..h)
        .flat_map(|row| (0..w).map(move |_| 100.0 + row as f32))
        .collect();
    Raster::new(
        w,
        h,
        samples,
        AffineTransform::north_up(500_000.0, 5_762_000.0, 20.0),
        SpatialRef::Epsg(32633),
        None,
    )
    .unwrap()
}

#[test]
fn test_tall_raster_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tall.tif");
    let output = dir.path().join("tall.raw");
    geotiff::write(&tall_ramp(), &input).unwrap();

    let mut sink = RecordingSink::new();
    let report = Converter::default()
        .convert_file(&input, &output, &mut sink)
        .unwrap();

    assert_eq!((report.width, report.height), (101, 101));
    let crop = report.crop.unwrap();
    assert_eq!((crop.x_offset, crop.y_offset, crop.size), (0, 50, 101));
    // rows 50..151 survive the crop
    assert_eq!(report.range.min, 150.0);
    assert_eq!(report.range.max, 250.0);
    assert_eq!(report.coordinate_kind, CoordinateKind::Projected);
    assert_eq!(report.extent.size_x, 2020.0);
    assert_eq!(report.extent.size_z, 2020.0);

    let values = raw::read_raw(&output, 101, 101).unwrap();
    assert_eq!(std::fs::metadata(&output).unwrap().len(), 101 * 101 * 2);
    assert!(values[..101].iter().all(|&v| v == 0));
    assert!(values[101 * 100..].iter().all(|&v| v == 65535));

    // the log lines alone are enough to read the file back
    let settings = parse_settings(sink.lines()).unwrap();
    assert_eq!((settings.width, settings.height), (101, 101));
    assert_eq!(settings.min_height, 150.0);
    assert_eq!(settings.max_height, 250.0);
    assert_eq!(settings.variation, 100.0);
    assert_eq!(settings.size_x, Some(2020.0));
    assert!(sink.contains("Cropping to 101x101 from center."));
    assert!(sink.contains("SUCCESS! File saved to:"));
}

#[test]
fn test_sentinel_holes_fill_with_minimum() {
    let dem = SyntheticDem::new(64, 64).seed(3).holes(40).build().unwrap();
    let holes: Vec<usize> = dem
        .samples()
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == -9999.0)
        .map(|(i, _)| i)
        .collect();
    assert!(!holes.is_empty());

    let mut sink = RecordingSink::new();
    let out = Converter::default().process(&dem, "holes", &mut sink).unwrap();

    assert_eq!(out.report.sentinel_excluded, holes.len());
    assert!(out.report.range.min > 0.0);
    for &i in &holes {
        assert_eq!(out.heightmap.values()[i], 0, "hole at {i}");
    }
    assert!(!out.report.padding_detected);
}

#[test]
fn test_padded_raster_excludes_border() {
    let dem = SyntheticDem::new(120, 120)
        .seed(11)
        .elevation(300.0, 900.0)
        .padding(6)
        .build()
        .unwrap();

    let mut sink = RecordingSink::new();
    let out = Converter::default().process(&dem, "padded", &mut sink).unwrap();

    assert!(out.report.padding_detected);
    assert_eq!(out.report.padding_excluded, 120 * 120 - 108 * 108);
    // zero padding does not drag the minimum down
    assert!(out.report.range.min >= 300.0);
    assert!(sink.contains("Padding detected in borders"));
}

#[test]
fn test_padding_disabled_by_config() {
    let dem = SyntheticDem::new(120, 120).padding(6).build().unwrap();
    let config = ConvertConfig::from_json_str(r#"{ "detect_padding": false }"#).unwrap();

    let mut sink = RecordingSink::new();
    let out = Converter::new(config).process(&dem, "padded", &mut sink).unwrap();

    assert!(!out.report.padding_detected);
    assert_eq!(out.report.range.min, 0.0);
}

#[test]
fn test_geographic_raster_warns_about_units() {
    let dem = SyntheticDem::new(100, 100)
        .geographic(-46.6, -23.5, 0.001)
        .build()
        .unwrap();

    let mut sink = RecordingSink::new();
    let out = Converter::default().process(&dem, "geo", &mut sink).unwrap();

    assert_eq!(out.report.coordinate_kind, CoordinateKind::Geographic);
    assert_eq!(out.report.zone.map(|z| z.epsg()), Some(32723));
    assert!(!out.report.is_utm);
    assert!(sink.contains("Warning: Input projection appears to be WGS 84 (not UTM)."));
    assert!(sink.contains("Auto-detected UTM EPSG code: 32723 (Zone 23)"));
    // 0.1° of latitude
    assert!((out.report.extent.size_z - 11_132.0).abs() < 1e-6);
    assert!(out.report.extent.size_x < out.report.extent.size_z);
}

#[test]
fn test_all_nodata_run_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.tif");
    let output = dir.path().join("empty.raw");
    let raster = Raster::new(
        8,
        8,
        vec![-32768.0; 64],
        AffineTransform::north_up(500_000.0, 5_762_000.0, 30.0),
        SpatialRef::Epsg(32633),
        Some(-32768.0),
    )
    .unwrap();
    geotiff::write(&raster, &input).unwrap();

    let mut sink = RecordingSink::new();
    assert!(!Converter::default().run(&input, &output, &mut sink));
    assert!(sink.contains("Error: No valid terrain pixels found after filtering."));
    assert!(!output.exists());
}

#[test]
fn test_cancellation_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("canceled.raw");
    let dem = SyntheticDem::new(32, 32).build().unwrap();

    let flag = CancelFlag::new();
    let mut sink = RecordingSink::with_cancel(flag.clone());
    flag.cancel();
    let err = Converter::default()
        .convert(&dem, "canceled", &output, &mut sink)
        .unwrap_err();

    assert!(matches!(err, ConvertError::Canceled(_)));
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_flat_terrain_writes_zeros() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("flat.raw");
    let raster = Raster::new(
        16,
        16,
        vec![42.0; 256],
        AffineTransform::north_up(500_000.0, 5_762_000.0, 10.0),
        SpatialRef::Epsg(32633),
        None,
    )
    .unwrap();

    let mut sink = RecordingSink::new();
    let report = Converter::default()
        .convert(&raster, "flat", &output, &mut sink)
        .unwrap();

    assert_eq!(report.variation(), 0.0);
    let values = raw::read_raw(&output, 16, 16).unwrap();
    assert!(values.iter().all(|&v| v == 0));
}
