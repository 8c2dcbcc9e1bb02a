// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph rewriting engine for `texprep`.
//!
//! Builds material preparation and color mixing on top of the graph model:
//! - [`matcher`] finds structural patterns
//! - [`rewriter`] deletes, splices and tags nodes one primitive at a time
//! - [`replicator`] stamps out parametric output families
//! - [`passes`] and [`session`] combine them into best-effort pipelines
//!
//! Everything runs synchronously on a `&mut Graph`.

pub mod color;
pub mod config;
pub mod error;
pub mod layout;
pub mod matcher;
pub mod passes;
pub mod replicator;
pub mod report;
pub mod rewriter;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use color::{
    ColorResolver, ColorSpec, ExplicitList, NearestPalette, PaletteError, PaletteLookup, ProceduralSpread,
    ResolvedColor, SpotColor,
};
pub use config::EngineConfig;
pub use error::{Result, RewriteError};
pub use replicator::{OutputHandle, ReplicationTemplate, SubgraphReplicator};
pub use report::{PassReport, SessionReport, Skip};
pub use rewriter::{AdapterPolicy, ColorSwitchPolicy, GraphRewriter, OutputTags};
pub use session::{MixOutcome, MixRequest, Session};
