// SPDX-License-Identifier: MIT OR Apache-2.0
//! Material preparation passes.
//!
//! Each pass is best-effort: a node it cannot process is skipped and
//! reported, and only an unresolvable template stops the pass early.
//! Mutations made before a stop stay in the graph.

pub mod cleanup;
pub mod displacement;
pub mod naming;
pub mod physical_size;

pub use cleanup::CleanupOutcome;
pub use displacement::DisplacementChain;
pub use physical_size::physical_size;
