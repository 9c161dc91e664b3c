//! Snail stitching: place the 25 fields of a well on the spiral grid.

use log::debug;
use ndarray::{ArrayD, ArrayViewD, Axis};

use crate::error::{Result, StitchError};
use crate::grouping::TileGroup;
use crate::image::{Mosaic, TileImage, TileLayout};
use crate::spiral::{field_at, FIELDS_PER_WELL, GRID_SIDE, SPIRAL_INDEX_MAP};

/// Source of decoded tiles, shared read-only across stitching workers.
pub trait TileLoader: Sync {
    fn load(&self, filename: &str) -> Result<TileImage>;
}

/// Concatenate `next` onto `acc` along `axis`.
///
/// `None` is the empty accumulator and yields `next` unchanged. A `Some`
/// accumulator is always concatenated, even when it holds zero elements.
pub fn concatenate<T: Clone>(acc: Option<ArrayD<T>>, next: ArrayViewD<'_, T>, axis: Axis) -> Result<ArrayD<T>> {
    match acc {
        None => Ok(next.to_owned()),
        Some(acc) => Ok(ndarray::concatenate(axis, &[acc.view(), next.view()])?),
    }
}

/// Assemble 25 tiles, indexed by field, into a `(5H, 5W[, C])` mosaic.
pub fn stitch_tiles<T: Clone>(tiles: &[ArrayD<T>]) -> Result<ArrayD<T>> {
    if tiles.len() != FIELDS_PER_WELL {
        return Err(StitchError::UnsupportedLayout(format!(
            "expected {} tiles, got {}",
            FIELDS_PER_WELL,
            tiles.len()
        )));
    }

    let expected = tiles[0].shape();
    if !(2..=3).contains(&expected.len()) {
        return Err(StitchError::UnsupportedLayout(format!(
            "tiles must be 2-D or 3-D, got shape {:?}",
            expected
        )));
    }
    for (field, tile) in tiles.iter().enumerate() {
        if tile.shape() != expected {
            return Err(StitchError::TileShapeMismatch {
                filename: format!("field {}", field),
                expected: format!("{:?}", expected),
                found: format!("{:?}", tile.shape()),
            });
        }
    }

    let mut mosaic = None;
    for row in SPIRAL_INDEX_MAP.iter() {
        let mut strip = None;
        for &field in row.iter() {
            strip = Some(concatenate(strip, tiles[field].view(), Axis(1))?);
        }
        if let Some(strip) = strip {
            mosaic = Some(concatenate(mosaic, strip.view(), Axis(0))?);
        }
    }
    mosaic.ok_or_else(|| StitchError::UnsupportedLayout("empty spiral map".to_string()))
}

/// Load and stitch one complete (well, channel) group.
///
/// The group is validated before any tile is read, and every tile must match
/// the sample type and shape of the first one loaded.
pub fn stitch_group<L: TileLoader + ?Sized>(group: &TileGroup, loader: &L) -> Result<Mosaic> {
    let by_field = group.tiles_by_field()?;

    let mut loaded: Vec<Option<TileImage>> = (0..FIELDS_PER_WELL).map(|_| None).collect();
    let mut reference: Option<TileLayout> = None;

    for row in 0..GRID_SIDE {
        for col in 0..GRID_SIDE {
            let field = field_at(row, col);
            let filename = by_field[field];
            let tile = loader.load(filename)?;
            let layout = tile.layout();

            match &reference {
                Some(expected) if *expected != layout => {
                    return Err(StitchError::TileShapeMismatch {
                        filename: filename.to_string(),
                        expected: expected.to_string(),
                        found: layout.to_string(),
                    });
                }
                Some(_) => {}
                None => reference = Some(layout),
            }
            loaded[field] = Some(tile);
        }
    }

    let tiles: Vec<TileImage> = loaded.into_iter().flatten().collect();
    debug!("Stitching {} tiles for {}", tiles.len(), group.key());

    let mosaic = match tiles.first() {
        Some(TileImage::U8(_)) => {
            let arrays: Vec<ArrayD<u8>> = tiles.into_iter().filter_map(TileImage::into_u8).collect();
            TileImage::U8(stitch_tiles(&arrays)?)
        }
        Some(TileImage::U16(_)) => {
            let arrays: Vec<ArrayD<u16>> = tiles.into_iter().filter_map(TileImage::into_u16).collect();
            TileImage::U16(stitch_tiles(&arrays)?)
        }
        None => {
            return Err(StitchError::UnsupportedLayout(format!(
                "no tiles loaded for {}",
                group.key()
            )))
        }
    };
    Ok(mosaic)
}
