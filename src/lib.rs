//! Stitch Cellomics high-content screening tiles into one mosaic per well.
//!
//! The instrument acquires 25 fields per well on a 5x5 grid in a spiral
//! ("snail") order and exports one TIFF per field and channel, named
//! `<prefix>_<plate>_<well>f<field>d<channel>.<suffix>`. This crate decodes
//! those names, groups the tiles by well and channel, places each field on
//! its grid position and writes the rescaled mosaic.

pub mod batch;
pub mod error;
pub mod filename;
pub mod grouping;
pub mod image;
pub mod listing;
pub mod rescale;
pub mod spiral;
pub mod stitch;
pub mod tiff_io;

pub use batch::{run_batch, stitch_and_save_group, BatchConfig, BatchReport, GroupFailure};
pub use error::{Result, StitchError};
pub use filename::{filename_to_coord, parse_filename, plate_from_dir, stitched_filename, FilenameRecord, PlateWell};
pub use grouping::{group_tiles, GroupKey, TileGroup, TileGrouper, TileGroups};
pub use image::{Mosaic, PixelType, TileImage};
pub use listing::list_files_by_extension;
pub use rescale::{rescale, BitDepth, RescaledImage};
pub use spiral::SPIRAL_INDEX_MAP;
pub use stitch::{stitch_group, stitch_tiles, TileLoader};
pub use tiff_io::{read_tiff, write_tiff_atomic, TiffTileLoader};
