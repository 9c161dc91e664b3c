// src/main.rs
use anyhow::{anyhow, Result};
use cellomics_stitch::{plate_from_dir, run_batch, BatchConfig, BitDepth};
use env_logger::{Builder, Env};
use log::{error, info, warn};
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "snail_stitch", about = "Stitch Cellomics 5x5 spiral field tiles into one image per well and channel")]
struct Opt {
    /// Input directory (where the exported TIFF tiles are)
    #[structopt(short = "i", long = "input-dir", parse(from_os_str))]
    input_dir: PathBuf,

    /// Output directory (where stitched mosaics will go)
    #[structopt(short = "o", long = "output-dir", parse(from_os_str))]
    output_dir: PathBuf,

    /// Tile file extension, without the dot (case-sensitive)
    #[structopt(short = "e", long = "extension", default_value = "TIF")]
    extension: String,

    /// Output bit depth: 8, 16 or float
    #[structopt(short = "b", long = "bit-depth", default_value = "8")]
    bit_depth: BitDepth,

    /// Number of wells to stitch in parallel
    #[structopt(short = "n", long = "num-threads", default_value = "8")]
    num_threads: usize,

    /// Hide the progress bar
    #[structopt(short = "q", long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    // Initialize env_logger
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    builder.init();

    let opt = Opt::from_args();

    ThreadPoolBuilder::new()
        .num_threads(opt.num_threads)
        .build_global()
        .map_err(|e| anyhow!("Failed to build thread pool: {:?}", e))?;

    info!("Starting snail_stitch with {} threads...", opt.num_threads);
    info!("Input dir: {:?}", opt.input_dir);
    info!("Output dir: {:?}", opt.output_dir);
    info!("Bit depth: {}", opt.bit_depth);

    match plate_from_dir(&opt.input_dir.to_string_lossy()) {
        Ok(plate) => info!("Plate: {}", plate),
        Err(e) => warn!("Could not read a plate id from the input directory: {}", e),
    }

    let config = BatchConfig {
        input_dir: opt.input_dir,
        output_dir: opt.output_dir,
        extension: opt.extension,
        bit_depth: opt.bit_depth,
        show_progress: !opt.quiet,
    };

    let report = run_batch(&config)?;

    for failure in &report.failures {
        error!("{}: {}", failure.key, failure.error);
    }

    if !report.failures.is_empty() {
        return Err(anyhow!(
            "{} of {} groups failed",
            report.failures.len(),
            report.failures.len() + report.written.len()
        ));
    }

    info!("All done! Output in {:?}", config.output_dir);
    Ok(())
}
