use std::fs;
use std::path::Path;

use cellomics_stitch::rescale::rescale_value;
use cellomics_stitch::{
    read_tiff, run_batch, write_tiff_atomic, BatchConfig, BitDepth, GroupKey, RescaledImage, StitchError,
    TileImage, SPIRAL_INDEX_MAP,
};
use ndarray::{ArrayD, IxDyn};
use tempfile::tempdir;

const TILE_H: usize = 4;
const TILE_W: usize = 6;

fn tile_name(well: &str, field: usize, channel: u32) -> String {
    plate_tile_name(140206180002, well, field, channel)
}

fn plate_tile_name(plate: u64, well: &str, field: usize, channel: u32) -> String {
    format!("MFGTMP_{}_{}f{:02}d{}.TIF", plate, well, field, channel)
}

fn write_tile(dir: &Path, name: &str, value: u16, shape: &[usize]) {
    let arr = ArrayD::from_elem(IxDyn(shape), value);
    write_tiff_atomic(&dir.join(name), &RescaledImage::U16(arr)).unwrap();
}

fn write_well(dir: &Path, well: &str, channel: u32, skip: Option<usize>) {
    for field in (0..25).filter(|f| Some(*f) != skip) {
        write_tile(dir, &tile_name(well, field, channel), (field * 100) as u16, &[TILE_H, TILE_W]);
    }
}

#[test]
fn stitches_plate_and_isolates_bad_groups() {
    let root = tempdir().unwrap();
    let input = root.path().join("MFGTMP_140206180002");
    let output = root.path().join("stitched");
    fs::create_dir(&input).unwrap();

    write_well(&input, "A01", 0, None);
    write_well(&input, "B02", 1, Some(12));
    write_well(&input, "C03", 0, None);
    write_tile(&input, &tile_name("C03", 7, 0), 700, &[TILE_H + 1, TILE_W]);
    fs::write(input.join("not_a_valid_name.TIF"), b"junk").unwrap();
    fs::write(input.join("notes.txt"), b"ignored").unwrap();

    let mut config = BatchConfig::new(&input, &output);
    config.bit_depth = BitDepth::U16;
    config.show_progress = false;
    let report = run_batch(&config).unwrap();

    let a01 = output.join("MFGTMP_140206180002_A01d0_stitched.TIF");
    assert_eq!(report.written, vec![a01.clone()]);
    assert_eq!(report.rejected_files.len(), 1);
    assert!(matches!(
        &report.rejected_files[0],
        StitchError::MalformedFilename { filename, .. } if filename == "not_a_valid_name.TIF"
    ));

    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].key, GroupKey::new("B02", 1));
    match &report.failures[0].error {
        StitchError::IncompleteGroup { missing, .. } => assert_eq!(missing, &vec![12]),
        other => panic!("expected IncompleteGroup, got {:?}", other),
    }
    assert_eq!(report.failures[1].key, GroupKey::new("C03", 0));
    assert!(matches!(report.failures[1].error, StitchError::TileShapeMismatch { .. }));

    // Failed groups leave nothing behind, not even temporaries.
    let outputs: Vec<_> = fs::read_dir(&output).unwrap().collect();
    assert_eq!(outputs.len(), 1);

    let mosaic = match read_tiff(&a01).unwrap() {
        TileImage::U16(arr) => arr,
        other => panic!("expected 16-bit mosaic, got {:?}", other.layout()),
    };
    assert_eq!(mosaic.shape(), &[5 * TILE_H, 5 * TILE_W]);
    for (row, fields) in SPIRAL_INDEX_MAP.iter().enumerate() {
        for (col, &field) in fields.iter().enumerate() {
            let expected = rescale_value((field * 100) as f64, BitDepth::U16) as u16;
            let pixel = mosaic[&[row * TILE_H + 1, col * TILE_W + 2][..]];
            assert_eq!(pixel, expected, "grid position ({}, {})", row, col);
        }
    }
}

#[test]
fn rerun_produces_identical_output() {
    let root = tempdir().unwrap();
    let input = root.path().join("plate");
    fs::create_dir(&input).unwrap();
    write_well(&input, "H12", 3, None);

    let mut outputs = Vec::new();
    for run in 0..2 {
        let mut config = BatchConfig::new(&input, root.path().join(format!("out{}", run)));
        config.show_progress = false;
        let report = run_batch(&config).unwrap();
        assert!(report.is_clean());
        outputs.push(fs::read(&report.written[0]).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn duplicated_field_fails_only_its_group() {
    let root = tempdir().unwrap();
    let input = root.path().join("plate");
    let output = root.path().join("stitched");
    fs::create_dir(&input).unwrap();

    for well in ["A01", "B01"] {
        for field in 0..25 {
            let name = plate_tile_name(1, well, field, 0);
            write_tile(&input, &name, field as u16, &[TILE_H, TILE_W]);
        }
    }
    // Same well, channel and field from another plate export.
    write_tile(&input, &plate_tile_name(2, "A01", 3, 0), 3, &[TILE_H, TILE_W]);

    let mut config = BatchConfig::new(&input, &output);
    config.show_progress = false;
    let report = run_batch(&config).unwrap();

    assert!(report.rejected_files.is_empty());
    assert_eq!(report.written, vec![output.join("MFGTMP_1_B01d0_stitched.TIF")]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].key, GroupKey::new("A01", 0));
    match &report.failures[0].error {
        StitchError::DuplicateField { field, filename, .. } => {
            assert_eq!(*field, 3);
            assert_eq!(filename, "MFGTMP_2_A01f03d0.TIF");
        }
        other => panic!("expected DuplicateField, got {:?}", other),
    }

    assert!(!output.join("MFGTMP_1_A01d0_stitched.TIF").exists());
    let outputs: Vec<_> = fs::read_dir(&output).unwrap().collect();
    assert_eq!(outputs.len(), 1);
}
