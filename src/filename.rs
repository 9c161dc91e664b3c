//! Cellomics filename semantics.
//!
//! The instrument names every tile `<prefix>_<plate>_<well>f<field>d<channel>.<suffix>`,
//! e.g. `MFGTMP_140206180002_A01f00d0.TIF`.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, StitchError};

/// Suffix appended to the stem of every stitched output file.
pub const STITCHED_SUFFIX: &str = "_stitched";

/// Decoded components of a single instrument filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameRecord {
    pub directory: String,
    pub prefix: String,
    pub plate: u64,
    pub well: String,
    pub field: u32,
    pub channel: u32,
    pub suffix: String,
}

/// (plate, well) coordinate of an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlateWell {
    pub plate: u64,
    pub well: String,
}

impl fmt::Display for PlateWell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plate, self.well)
    }
}

impl FilenameRecord {
    pub fn coord(&self) -> PlateWell {
        PlateWell {
            plate: self.plate,
            well: self.well.clone(),
        }
    }
}

fn code_regex() -> &'static Regex {
    static CODE: OnceLock<Regex> = OnceLock::new();
    CODE.get_or_init(|| {
        Regex::new(r"^(?P<well>[A-Z][0-9]{2})f(?P<field>[0-9]{2})d(?P<channel>[0-9])$")
            .expect("well/field/channel pattern is valid")
    })
}

fn field_marker_regex() -> &'static Regex {
    static FIELD_MARKER: OnceLock<Regex> = OnceLock::new();
    FIELD_MARKER.get_or_init(|| Regex::new(r"f[0-9]{2}").expect("field marker pattern is valid"))
}

fn parse_plate(filename: &str, plate: &str) -> Result<u64> {
    if plate.is_empty() || !plate.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StitchError::malformed(
            filename,
            format!("plate {:?} is not a decimal integer", plate),
        ));
    }
    plate
        .parse::<u64>()
        .map_err(|e| StitchError::malformed(filename, format!("plate {:?}: {}", plate, e)))
}

/// Split a Cellomics filename into its annotated components.
///
/// The suffix is everything after the first `.` of the base name, so
/// `x.ome.tif` keeps `ome.tif`.
pub fn parse_filename(filename: &str) -> Result<FilenameRecord> {
    let path = Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StitchError::malformed(filename, "no file name component"))?;
    let directory = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (stem, suffix) = match base.split_once('.') {
        Some((stem, suffix)) => (stem, suffix),
        None => (base, ""),
    };

    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() != 3 {
        return Err(StitchError::malformed(
            filename,
            format!(
                "expected <prefix>_<plate>_<code>, found {} underscore-separated parts",
                parts.len()
            ),
        ));
    }
    let (prefix, plate, code) = (parts[0], parts[1], parts[2]);
    if prefix.is_empty() {
        return Err(StitchError::malformed(filename, "empty prefix"));
    }
    let plate = parse_plate(filename, plate)?;

    let caps = code_regex().captures(code).ok_or_else(|| {
        StitchError::malformed(
            filename,
            format!("code {:?} is not <well>f<field>d<channel>", code),
        )
    })?;
    // The pattern only admits ASCII digits, so these parses cannot overflow.
    let field: u32 = caps["field"]
        .parse()
        .map_err(|_| StitchError::malformed(filename, "field is not an integer"))?;
    let channel: u32 = caps["channel"]
        .parse()
        .map_err(|_| StitchError::malformed(filename, "channel is not an integer"))?;

    Ok(FilenameRecord {
        directory,
        prefix: prefix.to_string(),
        plate,
        well: caps["well"].to_string(),
        field,
        channel,
        suffix: suffix.to_string(),
    })
}

/// Obtain the (plate, well) coordinate of a filename.
pub fn filename_to_coord(filename: &str) -> Result<PlateWell> {
    parse_filename(filename).map(|record| record.coord())
}

/// Plate ID from an export directory named `<prefix>_<plate>`.
pub fn plate_from_dir(dirname: &str) -> Result<u64> {
    let base = Path::new(dirname)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StitchError::malformed(dirname, "no directory name component"))?;
    let plate = base
        .split('_')
        .nth(1)
        .ok_or_else(|| StitchError::malformed(dirname, "expected <prefix>_<plate>"))?;
    parse_plate(dirname, plate)
}

/// Output name for a group, derived from the group's first filename.
///
/// Every `f<2 digits>` field marker is removed from the stem and `_stitched`
/// is inserted before the extension. Any directory component is dropped; the
/// caller decides where the mosaic is written.
pub fn stitched_filename(first_filename: &str) -> String {
    let base = Path::new(first_filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(first_filename);

    // Extension starts at the last dot; a leading dot belongs to the stem.
    let (stem, extension) = match base.rfind('.') {
        Some(idx) if idx > 0 => base.split_at(idx),
        _ => (base, ""),
    };

    let stripped = field_marker_regex().replace_all(stem, "");
    format!("{}{}{}", stripped, STITCHED_SUFFIX, extension)
}
