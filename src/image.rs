//! Pixel containers shared by the loader, stitcher and rescaler.

use std::fmt;

use ndarray::ArrayD;

/// Native sample type of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    U8,
    U16,
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelType::U8 => write!(f, "u8"),
            PixelType::U16 => write!(f, "u16"),
        }
    }
}

/// Sample type plus shape; two tiles can be stitched only if these agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayout {
    pub pixel: PixelType,
    pub shape: Vec<usize>,
}

impl fmt::Display for TileLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.pixel, self.shape)
    }
}

/// A decoded tile, `(H, W)` for grayscale or `(H, W, C)` for multi-sample data.
#[derive(Debug, Clone, PartialEq)]
pub enum TileImage {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
}

/// Assembled image for one (well, channel); same representation as a tile.
pub type Mosaic = TileImage;

impl TileImage {
    pub fn pixel_type(&self) -> PixelType {
        match self {
            TileImage::U8(_) => PixelType::U8,
            TileImage::U16(_) => PixelType::U16,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            TileImage::U8(arr) => arr.shape(),
            TileImage::U16(arr) => arr.shape(),
        }
    }

    pub fn layout(&self) -> TileLayout {
        TileLayout {
            pixel: self.pixel_type(),
            shape: self.shape().to_vec(),
        }
    }

    pub fn into_u8(self) -> Option<ArrayD<u8>> {
        match self {
            TileImage::U8(arr) => Some(arr),
            TileImage::U16(_) => None,
        }
    }

    pub fn into_u16(self) -> Option<ArrayD<u16>> {
        match self {
            TileImage::U16(arr) => Some(arr),
            TileImage::U8(_) => None,
        }
    }
}
