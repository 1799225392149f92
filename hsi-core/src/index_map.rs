use crate::{Error, Result};

/// For every raster cell, the flat index of the nearest source point (or `None`).
///
/// Entries are stored in scan order: the rows ascend in Y, so scan row 0 is the *southern*
/// edge of the grid. Rasters use the opposite convention (row 0 is north), and
/// [`IndexMap::at_pixel`] translates between the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMap {
    width: usize,
    height: usize,
    entries: Vec<Option<usize>>,
}

impl IndexMap {
    pub fn new(width: usize, height: usize, entries: Vec<Option<usize>>) -> Result<Self> {
        if entries.len() != width * height {
            return Err(Error::Geometry(format!(
                "{} index entries cannot fill a {} x {} grid",
                entries.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            entries,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Entries in scan order (ascending Y, then ascending X).
    pub fn entries(&self) -> &[Option<usize>] {
        &self.entries
    }

    /// Entry at column `col` of scan row `scan_row`.
    pub fn at_scan(&self, col: usize, scan_row: usize) -> Option<usize> {
        if col >= self.width || scan_row >= self.height {
            return None;
        }
        self.entries[scan_row * self.width + col]
    }

    /// Entry under raster pixel `(row, col)`, with row 0 at the northern edge.
    pub fn at_pixel(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.height {
            return None;
        }
        self.at_scan(col, self.height - 1 - row)
    }

    pub fn matched(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }
}
