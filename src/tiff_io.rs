//! TIFF tile loading and atomic mosaic writing.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use log::debug;
use memmap2::MmapOptions;
use ndarray::{ArrayD, IxDyn};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::ColorType;

use crate::error::{Result, StitchError};
use crate::image::TileImage;
use crate::rescale::RescaledImage;
use crate::stitch::TileLoader;

/// Loads tiles by filename from one input directory.
#[derive(Debug, Clone)]
pub struct TiffTileLoader {
    directory: PathBuf,
}

impl TiffTileLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        TiffTileLoader {
            directory: directory.into(),
        }
    }
}

impl TileLoader for TiffTileLoader {
    fn load(&self, filename: &str) -> Result<TileImage> {
        read_tiff(&self.directory.join(filename))
    }
}

fn tiff_error(path: &Path) -> impl FnOnce(tiff::TiffError) -> StitchError + '_ {
    move |source| StitchError::Tiff {
        path: path.to_path_buf(),
        source,
    }
}

fn decode_mapped(path: &Path) -> Result<TileImage> {
    let file = File::open(path).map_err(|e| StitchError::io(path, e))?;
    let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(|e| StitchError::io(path, e))?;

    let mut decoder = Decoder::new(Cursor::new(&mmap))
        .map_err(tiff_error(path))?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions().map_err(tiff_error(path))?;
    let samples = match decoder.colortype().map_err(tiff_error(path))? {
        ColorType::Gray(_) => 1,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) => 4,
        other => {
            return Err(StitchError::UnsupportedLayout(format!(
                "color type {:?} in {:?}",
                other, path
            )))
        }
    };

    let mut shape = vec![height as usize, width as usize];
    if samples > 1 {
        shape.push(samples);
    }
    let shape_error = |e: ndarray::ShapeError| {
        StitchError::UnsupportedLayout(format!("{:?} does not fit {:?}: {}", path, shape, e))
    };

    match decoder.read_image().map_err(tiff_error(path))? {
        DecodingResult::U8(data) => ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map(TileImage::U8)
            .map_err(shape_error),
        DecodingResult::U16(data) => ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map(TileImage::U16)
            .map_err(shape_error),
        _ => Err(StitchError::UnsupportedLayout(format!(
            "sample format in {:?} is not 8- or 16-bit unsigned",
            path
        ))),
    }
}

/// Read a tile through a memory map.
///
/// 8- and 16-bit grayscale decode to `(H, W)`, RGB and RGBA to `(H, W, C)`.
pub fn read_tiff(path: &Path) -> Result<TileImage> {
    // A decoder panic on a corrupt tile fails that tile only.
    match std::panic::catch_unwind(AssertUnwindSafe(|| decode_mapped(path))) {
        Ok(result) => result,
        Err(_) => Err(StitchError::DecoderPanic {
            path: path.to_path_buf(),
        }),
    }
}

fn to_dimension(value: usize, path: &Path) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        StitchError::UnsupportedLayout(format!("{:?}: dimension {} exceeds TIFF limits", path, value))
    })
}

fn encode<W: Write + Seek>(writer: W, image: &RescaledImage, path: &Path) -> Result<()> {
    let shape = image.shape();
    let (height, width, samples) = match *shape {
        [h, w] => (h, w, 1),
        [h, w, c] => (h, w, c),
        _ => {
            return Err(StitchError::UnsupportedLayout(format!(
                "cannot write {}-D image to {:?}",
                shape.len(),
                path
            )))
        }
    };
    let (width, height) = (to_dimension(width, path)?, to_dimension(height, path)?);

    let mut encoder = TiffEncoder::new(writer).map_err(tiff_error(path))?;
    let written = match (image, samples) {
        (RescaledImage::U8(arr), 1) => encoder.write_image::<colortype::Gray8>(width, height, &row_major(arr)),
        (RescaledImage::U8(arr), 3) => encoder.write_image::<colortype::RGB8>(width, height, &row_major(arr)),
        (RescaledImage::U8(arr), 4) => encoder.write_image::<colortype::RGBA8>(width, height, &row_major(arr)),
        (RescaledImage::U16(arr), 1) => encoder.write_image::<colortype::Gray16>(width, height, &row_major(arr)),
        (RescaledImage::U16(arr), 3) => encoder.write_image::<colortype::RGB16>(width, height, &row_major(arr)),
        (RescaledImage::U16(arr), 4) => encoder.write_image::<colortype::RGBA16>(width, height, &row_major(arr)),
        (RescaledImage::F32(arr), 1) => {
            encoder.write_image::<colortype::Gray32Float>(width, height, &row_major(arr))
        }
        (RescaledImage::F32(arr), 3) => {
            encoder.write_image::<colortype::RGB32Float>(width, height, &row_major(arr))
        }
        _ => {
            return Err(StitchError::UnsupportedLayout(format!(
                "{} samples per pixel cannot be written to {:?}",
                samples, path
            )))
        }
    };
    written.map_err(tiff_error(path))
}

fn row_major<T: Copy>(arr: &ArrayD<T>) -> Vec<T> {
    arr.iter().copied().collect()
}

/// Write `image` to `path` via a temporary file in the same directory.
///
/// The final name only ever holds a complete TIFF; an existing file is replaced.
pub fn write_tiff_atomic(path: &Path, image: &RescaledImage) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".stitch-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| StitchError::io(dir, e))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        encode(&mut writer, image, path)?;
        writer.flush().map_err(|e| StitchError::io(path, e))?;
    }

    tmp.persist(path).map_err(|e| StitchError::io(path, e.error))?;
    debug!("Wrote {:?} with shape {:?}", path, image.shape());
    Ok(())
}
