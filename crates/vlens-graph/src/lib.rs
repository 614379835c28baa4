//! vlens version graph
//!
//! Versions of a class form a directed acyclic graph: each version may
//! *replace* (breaking) or *upgrade* (non-breaking) earlier versions.
//!
//! # Example
//!
//! ```rust
//! use vlens_graph::{VersionGraph, VersionSpec};
//!
//! let graph = VersionGraph::from_specs([
//!     VersionSpec::new("1"),
//!     VersionSpec::new("2").replacing("1"),
//! ])
//! .unwrap();
//!
//! let v1 = graph.id("1").unwrap();
//! assert_eq!(graph.replaced_by(v1).len(), 1);
//!
//! // Deletion is a view; the original is untouched
//! let view = graph.delete(v1);
//! assert!(view.id("1").is_none());
//! assert!(graph.id("1").is_some());
//! ```

#![warn(missing_docs)]

mod dag;
pub mod error;
pub mod graph;
pub mod version;

pub use error::GraphError;
pub use graph::VersionGraph;
pub use version::{EdgeKind, VersionId, VersionSpec};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
