// SPDX-License-Identifier: MIT OR Apache-2.0
//! Color sources for replication.
//!
//! Three interchangeable [`ColorResolver`] strategies:
//! - [`ProceduralSpread`]: evenly spaced hues at fixed saturation and value
//! - [`ExplicitList`]: caller-supplied colors, in order
//! - [`NearestPalette`]: the procedural color snapped to a named palette
//!
//! Palette lookups go through the [`PaletteLookup`] capability. Its
//! failures surface as [`RewriteError::ExternalResolutionFailed`], never
//! as a substitute color.

use crate::config::SpreadConfig;
use crate::error::{Result, RewriteError};
use serde::{Deserialize, Serialize};
use texprep_graph::Rgba;
use thiserror::Error;

/// One requested color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorSpec {
    /// Literal color
    Rgba(Rgba),
    /// Named entry of a palette book
    Spot {
        /// Palette book
        book: String,
        /// Entry name
        name: String,
    },
}

/// A named palette entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotColor {
    /// Palette book
    pub book: String,
    /// Entry name
    pub name: String,
    /// Entry color
    pub rgba: Rgba,
}

/// A color ready to be written into a constant node
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColor {
    /// Color value
    pub rgba: Rgba,
    /// Palette entry the color came from
    pub spot: Option<SpotColor>,
}

impl From<Rgba> for ResolvedColor {
    fn from(rgba: Rgba) -> Self {
        Self { rgba, spot: None }
    }
}

impl From<SpotColor> for ResolvedColor {
    fn from(spot: SpotColor) -> Self {
        Self {
            rgba: spot.rgba,
            spot: Some(spot),
        }
    }
}

/// Palette lookup failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaletteError {
    /// No palette service is reachable
    #[error("palette service unavailable")]
    Unavailable,

    /// The book is not known to the service
    #[error("unknown palette book '{0}'")]
    UnknownBook(String),

    /// The book holds no matching entry
    #[error("no entry matching '{query}' in '{book}'")]
    NoMatch {
        /// Palette book
        book: String,
        /// What was looked up
        query: String,
    },
}

impl From<PaletteError> for RewriteError {
    fn from(err: PaletteError) -> Self {
        Self::ExternalResolutionFailed(err.to_string())
    }
}

/// External named-palette service
pub trait PaletteLookup {
    /// Find an entry by exact name
    fn find_by_name(&self, book: &str, name: &str) -> std::result::Result<SpotColor, PaletteError>;

    /// Find the entry closest to `target`
    fn find_closest(&self, book: &str, target: Rgba) -> std::result::Result<SpotColor, PaletteError>;
}

/// Source of the `index`-th of `count` colors
pub trait ColorResolver {
    /// Resolve one color
    fn resolve(&self, index: usize, count: usize) -> Result<ResolvedColor>;
}

/// Convert hue/saturation/value in `0.0..=1.0` to red/green/blue
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Evenly spaced hues at fixed saturation and value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProceduralSpread {
    /// Saturation
    pub saturation: f64,
    /// Value
    pub value: f64,
}

impl ProceduralSpread {
    /// Spread with explicit constants
    pub fn new(saturation: f64, value: f64) -> Self {
        Self { saturation, value }
    }

    /// Hue of the `index`-th of `count` colors, in fractional turns
    pub fn hue(index: usize, count: usize) -> f64 {
        (index as f64 * (360.0 / count as f64)) / 360.0
    }

    /// The `index`-th of `count` colors
    pub fn color(&self, index: usize, count: usize) -> Rgba {
        let (r, g, b) = hsv_to_rgb(Self::hue(index, count), self.saturation, self.value);
        Rgba::rgb(r as f32, g as f32, b as f32)
    }
}

impl Default for ProceduralSpread {
    fn default() -> Self {
        SpreadConfig::default().into()
    }
}

impl From<SpreadConfig> for ProceduralSpread {
    fn from(config: SpreadConfig) -> Self {
        Self::new(config.saturation, config.value)
    }
}

fn check_index(index: usize, count: usize) -> Result<()> {
    if index >= count {
        return Err(RewriteError::ParameterMismatch(format!(
            "color {index} requested from a sequence of {count}"
        )));
    }
    Ok(())
}

impl ColorResolver for ProceduralSpread {
    fn resolve(&self, index: usize, count: usize) -> Result<ResolvedColor> {
        check_index(index, count)?;
        Ok(self.color(index, count).into())
    }
}

/// Caller-supplied colors, returned in order
pub struct ExplicitList<'p> {
    colors: Vec<ColorSpec>,
    palette: Option<&'p dyn PaletteLookup>,
}

impl<'p> ExplicitList<'p> {
    /// List of colors; spot entries need [`ExplicitList::with_palette`]
    pub fn new(colors: Vec<ColorSpec>) -> Self {
        Self { colors, palette: None }
    }

    /// Resolve spot entries through a palette service
    pub fn with_palette(mut self, palette: &'p dyn PaletteLookup) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Number of colors supplied
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether no colors were supplied
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl ColorResolver for ExplicitList<'_> {
    fn resolve(&self, index: usize, count: usize) -> Result<ResolvedColor> {
        check_index(index, count)?;
        let spec = self.colors.get(index).ok_or_else(|| {
            RewriteError::ParameterMismatch(format!(
                "{count} colors requested but only {} supplied",
                self.colors.len()
            ))
        })?;
        match spec {
            ColorSpec::Rgba(rgba) => Ok((*rgba).into()),
            ColorSpec::Spot { book, name } => {
                let palette = self.palette.ok_or(PaletteError::Unavailable)?;
                Ok(palette.find_by_name(book, name)?.into())
            }
        }
    }
}

/// Procedural colors snapped to the nearest entry of a palette book
pub struct NearestPalette<'p> {
    book: String,
    palette: &'p dyn PaletteLookup,
    spread: ProceduralSpread,
}

impl<'p> NearestPalette<'p> {
    /// Snap the default spread to `book`
    pub fn new(book: impl Into<String>, palette: &'p dyn PaletteLookup) -> Self {
        Self {
            book: book.into(),
            palette,
            spread: ProceduralSpread::default(),
        }
    }

    /// Use a different spread
    pub fn with_spread(mut self, spread: ProceduralSpread) -> Self {
        self.spread = spread;
        self
    }
}

impl ColorResolver for NearestPalette<'_> {
    fn resolve(&self, index: usize, count: usize) -> Result<ResolvedColor> {
        check_index(index, count)?;
        let target = self.spread.color(index, count);
        Ok(self.palette.find_closest(&self.book, target)?.into())
    }
}
