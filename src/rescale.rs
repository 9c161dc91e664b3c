//! Map 12-bit instrument data onto display/storage bit depths.

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayD;

use crate::image::TileImage;

/// Largest value a 12-bit sample can hold.
pub const MAX_12BIT: f64 = 4095.0;

/// Target representation of a rescaled mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    U8,
    U16,
    Float,
}

impl FromStr for BitDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "8" => Ok(BitDepth::U8),
            "16" => Ok(BitDepth::U16),
            "float" => Ok(BitDepth::Float),
            other => Err(format!(
                "invalid bit depth {:?}, expected one of 8, 16, float",
                other
            )),
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitDepth::U8 => write!(f, "8"),
            BitDepth::U16 => write!(f, "16"),
            BitDepth::Float => write!(f, "float"),
        }
    }
}

/// A rescaled mosaic, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub enum RescaledImage {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    F32(ArrayD<f32>),
}

impl RescaledImage {
    pub fn shape(&self) -> &[usize] {
        match self {
            RescaledImage::U8(arr) => arr.shape(),
            RescaledImage::U16(arr) => arr.shape(),
            RescaledImage::F32(arr) => arr.shape(),
        }
    }
}

/// Unconverted arithmetic result of rescaling one sample.
///
/// Integer depths round half away from zero; `Float` is not rounded.
pub fn rescale_value(value: f64, depth: BitDepth) -> f64 {
    let normalized = value / MAX_12BIT;
    match depth {
        BitDepth::U8 => (normalized * u8::MAX as f64).round(),
        BitDepth::U16 => (normalized * u16::MAX as f64).round(),
        BitDepth::Float => normalized,
    }
}

fn rescale_array<T: Copy + Into<f64>>(arr: &ArrayD<T>, depth: BitDepth) -> RescaledImage {
    // Out-of-range input is not rejected; `as` saturates at the target type's bounds.
    match depth {
        BitDepth::U8 => RescaledImage::U8(arr.mapv(|v| rescale_value(v.into(), depth) as u8)),
        BitDepth::U16 => RescaledImage::U16(arr.mapv(|v| rescale_value(v.into(), depth) as u16)),
        BitDepth::Float => RescaledImage::F32(arr.mapv(|v| rescale_value(v.into(), depth) as f32)),
    }
}

/// Rescale a 12-bit image to the requested depth.
pub fn rescale(image: &TileImage, depth: BitDepth) -> RescaledImage {
    match image {
        TileImage::U8(arr) => rescale_array(arr, depth),
        TileImage::U16(arr) => rescale_array(arr, depth),
    }
}
