// SPDX-License-Identifier: MIT OR Apache-2.0
//! Palette books loaded from a RON file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use texprep_engine::{PaletteError, PaletteLookup, SpotColor};
use texprep_graph::Rgba;

/// One named palette color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// Entry name, e.g. `18-1663 TPX`
    pub name: String,
    /// Entry color
    pub rgba: Rgba,
}

/// Palette books held in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticPalette {
    /// Entries per book
    pub books: IndexMap<String, Vec<PaletteEntry>>,
}

impl StaticPalette {
    /// Load a palette file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        ron::from_str(&content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    fn book(&self, book: &str) -> Result<&[PaletteEntry], PaletteError> {
        self.books
            .get(book)
            .map(Vec::as_slice)
            .ok_or_else(|| PaletteError::UnknownBook(book.to_string()))
    }

    fn spot(book: &str, entry: &PaletteEntry) -> SpotColor {
        SpotColor {
            book: book.to_string(),
            name: entry.name.clone(),
            rgba: entry.rgba,
        }
    }
}

fn distance(a: Rgba, b: Rgba) -> f32 {
    let (dr, dg, db) = (a.r - b.r, a.g - b.g, a.b - b.b);
    dr * dr + dg * dg + db * db
}

impl PaletteLookup for StaticPalette {
    fn find_by_name(&self, book: &str, name: &str) -> Result<SpotColor, PaletteError> {
        self.book(book)?
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| Self::spot(book, entry))
            .ok_or_else(|| PaletteError::NoMatch {
                book: book.to_string(),
                query: name.to_string(),
            })
    }

    fn find_closest(&self, book: &str, target: Rgba) -> Result<SpotColor, PaletteError> {
        self.book(book)?
            .iter()
            .min_by(|a, b| distance(a.rgba, target).total_cmp(&distance(b.rgba, target)))
            .map(|entry| Self::spot(book, entry))
            .ok_or_else(|| PaletteError::NoMatch {
                book: book.to_string(),
                query: format!("{target:?}"),
            })
    }
}
