//! Partition tile filenames into (well, channel) stitching units.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, StitchError};
use crate::filename::parse_filename;
use crate::spiral::FIELDS_PER_WELL;

/// One physical well imaged in one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub well: String,
    pub channel: u32,
}

impl GroupKey {
    pub fn new(well: impl Into<String>, channel: u32) -> Self {
        GroupKey {
            well: well.into(),
            channel,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/ch{}", self.well, self.channel)
    }
}

/// A tile filename with its parsed field index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTile {
    pub field: u32,
    pub filename: String,
}

/// Tiles of one group, kept in the order they were supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGroup {
    key: GroupKey,
    tiles: Vec<FieldTile>,
}

impl TileGroup {
    fn new(key: GroupKey) -> Self {
        TileGroup {
            key,
            tiles: Vec::new(),
        }
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn tiles(&self) -> &[FieldTile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.tiles.iter().map(|t| t.filename.as_str())
    }

    /// First filename in supply order; the output name is derived from it.
    pub fn first_filename(&self) -> Option<&str> {
        self.tiles.first().map(|t| t.filename.as_str())
    }

    /// Filenames indexed by field, after checking the group holds exactly one
    /// tile for every field 0..25.
    pub fn tiles_by_field(&self) -> Result<Vec<&str>> {
        let mut slots: Vec<Option<&str>> = vec![None; FIELDS_PER_WELL];
        let mut unexpected = Vec::new();

        for tile in &self.tiles {
            match slots.get_mut(tile.field as usize) {
                Some(slot) if slot.is_none() => *slot = Some(tile.filename.as_str()),
                _ => unexpected.push(tile.field),
            }
        }

        let missing: Vec<u32> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(field, _)| field as u32)
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(StitchError::IncompleteGroup {
                key: self.key.clone(),
                found: self.tiles.len(),
                missing,
                unexpected,
            });
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

/// All groups of a listing, ordered by key.
pub type TileGroups = BTreeMap<GroupKey, TileGroup>;

/// Incremental grouper: feed filenames one at a time and keep going past bad ones.
#[derive(Debug, Default)]
pub struct TileGrouper {
    groups: TileGroups,
}

impl TileGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `filename` and append it to its group.
    ///
    /// A tile whose field is already present in the group is refused with
    /// `DuplicateField` and the group keeps the first one.
    pub fn push(&mut self, filename: &str) -> Result<GroupKey> {
        let record = parse_filename(filename)?;
        let key = GroupKey::new(record.well, record.channel);

        let group = self
            .groups
            .entry(key.clone())
            .or_insert_with(|| TileGroup::new(key.clone()));

        if group.tiles.iter().any(|t| t.field == record.field) {
            return Err(StitchError::DuplicateField {
                key,
                field: record.field,
                filename: filename.to_string(),
            });
        }

        group.tiles.push(FieldTile {
            field: record.field,
            filename: filename.to_string(),
        });
        Ok(key)
    }

    pub fn finish(self) -> TileGroups {
        self.groups
    }
}

/// Group filenames by (well, channel), failing on the first bad filename.
pub fn group_tiles<I, S>(filenames: I) -> Result<TileGroups>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut grouper = TileGrouper::new();
    for filename in filenames {
        grouper.push(filename.as_ref())?;
    }
    Ok(grouper.finish())
}
