//! Stitch every (well, channel) group found in an export directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;

use crate::error::{Result, StitchError};
use crate::filename::stitched_filename;
use crate::grouping::{GroupKey, TileGroup, TileGrouper};
use crate::listing::list_files_by_extension;
use crate::rescale::{rescale, BitDepth};
use crate::stitch::{stitch_group, TileLoader};
use crate::tiff_io::{write_tiff_atomic, TiffTileLoader};

/// Extension of the instrument's exported tiles.
pub const DEFAULT_EXTENSION: &str = "TIF";

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Tile extension without the leading dot; matched case-sensitively.
    pub extension: String,
    pub bit_depth: BitDepth,
    pub show_progress: bool,
}

impl BatchConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        BatchConfig {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            bit_depth: BitDepth::default(),
            show_progress: true,
        }
    }
}

/// A group that produced no mosaic, and why.
#[derive(Debug)]
pub struct GroupFailure {
    pub key: GroupKey,
    pub error: StitchError,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Mosaics written, in group key order.
    pub written: Vec<PathBuf>,
    pub failures: Vec<GroupFailure>,
    /// Files skipped because their names could not be parsed.
    pub rejected_files: Vec<StitchError>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.rejected_files.is_empty()
    }
}

/// Stitch, rescale and write one group; returns the output path.
pub fn stitch_and_save_group<L: TileLoader + ?Sized>(
    group: &TileGroup,
    loader: &L,
    output_dir: &Path,
    depth: BitDepth,
) -> Result<PathBuf> {
    let mosaic = stitch_group(group, loader)?;
    let first = group.first_filename().ok_or_else(|| StitchError::IncompleteGroup {
        key: group.key().clone(),
        found: 0,
        missing: Vec::new(),
        unexpected: Vec::new(),
    })?;
    let output_path = output_dir.join(stitched_filename(first));

    let rescaled = rescale(&mosaic, depth);
    write_tiff_atomic(&output_path, &rescaled)?;
    Ok(output_path)
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    let pb = ProgressBar::new(len as u64);
    pb.set_style(style);
    pb.set_message("Stitching wells...");
    pb
}

/// List, group, stitch and write every group in `config.input_dir`.
///
/// Only a failure to list or create directories aborts the run. Bad
/// filenames are skipped and a bad group is reported while the remaining
/// groups are still stitched.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport> {
    let start = Instant::now();

    fs::create_dir_all(&config.output_dir).map_err(|e| StitchError::io(&config.output_dir, e))?;

    let filenames = list_files_by_extension(&config.input_dir, &config.extension, true)?;
    info!(
        "Found {} .{} files in {:?}",
        filenames.len(),
        config.extension,
        config.input_dir
    );

    let mut report = BatchReport::default();
    let mut grouper = TileGrouper::new();
    let mut duplicated: BTreeMap<GroupKey, StitchError> = BTreeMap::new();

    for filename in &filenames {
        match grouper.push(filename) {
            Ok(_) => {}
            Err(StitchError::DuplicateField { key, field, filename }) => {
                error!("Duplicate field {} in {}: {}", field, key, filename);
                duplicated
                    .entry(key.clone())
                    .or_insert(StitchError::DuplicateField { key, field, filename });
            }
            Err(e) => {
                warn!("Skipping {}: {}", filename, e);
                report.rejected_files.push(e);
            }
        }
    }

    let groups = grouper.finish();
    let runnable: Vec<&TileGroup> = groups
        .values()
        .filter(|group| !duplicated.contains_key(group.key()))
        .collect();
    report.failures.extend(
        duplicated
            .into_iter()
            .map(|(key, error)| GroupFailure { key, error }),
    );
    info!(
        "Organized {} groups, {} ready to stitch",
        groups.len(),
        runnable.len()
    );

    let loader = TiffTileLoader::new(&config.input_dir);
    let pb = progress_bar(runnable.len(), config.show_progress);

    let results: Vec<(GroupKey, Result<PathBuf>)> = runnable
        .par_iter()
        .map(|group| {
            let result = stitch_and_save_group(group, &loader, &config.output_dir, config.bit_depth);
            match &result {
                Ok(path) => info!("Stitched {} into {:?}", group.key(), path),
                Err(e) => error!("Error stitching {}: {}", group.key(), e),
            }
            pb.inc(1);
            (group.key().clone(), result)
        })
        .collect();

    pb.finish_with_message("Stitched all wells");

    for (key, result) in results {
        match result {
            Ok(path) => report.written.push(path),
            Err(error) => report.failures.push(GroupFailure { key, error }),
        }
    }
    report.failures.sort_by(|a, b| a.key.cmp(&b.key));

    info!(
        "Wrote {} of {} mosaics in {:.2} seconds ({} failed groups, {} rejected files)",
        report.written.len(),
        groups.len(),
        start.elapsed().as_secs_f64(),
        report.failures.len(),
        report.rejected_files.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group_tiles;
    use crate::image::TileImage;
    use ndarray::{ArrayD, IxDyn};
    use tempfile::tempdir;

    struct ConstantLoader;

    impl TileLoader for ConstantLoader {
        fn load(&self, _filename: &str) -> Result<TileImage> {
            Ok(TileImage::U16(ArrayD::from_elem(IxDyn(&[2, 3]), 4095)))
        }
    }

    #[test]
    fn saves_group_under_derived_name() {
        let names: Vec<String> = (0..25)
            .map(|f| format!("MFGTMP_140206180002_B07f{:02}d2.TIF", f))
            .collect();
        let groups = group_tiles(&names).unwrap();
        let group = &groups[&GroupKey::new("B07", 2)];
        let out = tempdir().unwrap();

        let path = stitch_and_save_group(group, &ConstantLoader, out.path(), BitDepth::U8).unwrap();
        assert_eq!(path, out.path().join("MFGTMP_140206180002_B07d2_stitched.TIF"));

        let written = crate::tiff_io::read_tiff(&path).unwrap();
        assert_eq!(written, TileImage::U8(ArrayD::from_elem(IxDyn(&[10, 15]), 255)));
    }

    #[test]
    fn missing_input_directory_aborts() {
        let root = tempdir().unwrap();
        let mut config = BatchConfig::new(root.path().join("absent"), root.path().join("out"));
        config.show_progress = false;
        assert!(run_batch(&config).is_err());
    }

    #[test]
    fn default_config() {
        let config = BatchConfig::new("in", "out");
        assert_eq!(config.extension, "TIF");
        assert_eq!(config.bit_depth, BitDepth::U8);
    }
}
