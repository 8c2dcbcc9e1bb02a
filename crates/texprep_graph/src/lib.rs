// SPDX-License-Identifier: MIT OR Apache-2.0
//! Texture graph model for `texprep`.
//!
//! This crate mirrors the host's compositing graph in process:
//! - Nodes built from typed definitions and template resources
//! - Input/output/annotation properties validated at write time
//! - Connections kept acyclic, one per input
//! - Compute checkpoints recording an evaluation order
//!
//! The rewriting engine in `texprep_engine` only ever talks to [`Graph`]
//! and a [`TemplateProvider`].

pub mod node;
pub mod property;
pub mod connection;
pub mod graph;
pub mod evaluation;
pub mod library;

pub use node::{Node, NodeCategory, NodeDefinition, NodeId, NodeRegistry, Position, TemplateProvider};
pub use property::{Property, PropertyCategory, PropertyValue, Rgba, StructValue, Usage, ValueType};
pub use connection::{Connection, ConnectionId};
pub use graph::{Graph, GraphError, PHYSICAL_SIZE};
pub use evaluation::Evaluation;
