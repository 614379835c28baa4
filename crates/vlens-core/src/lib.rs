//! vlens core: version resolution, lens composition and class slicing
//!
//! A versioned class declares several versions of its interface and state
//! side by side, plus lenses converting between them. This crate turns such
//! a class into a standalone class for any one version:
//!
//! - [`resolve`] decides which declaration backs a member at a version;
//! - [`fields`] infers each version's state shape;
//! - [`rewrite`] moves borrowed bodies into a foreign state space through
//!   lenses, synthesizing put lenses ([`synth`]) as needed;
//! - [`slice`] drives the above per class, and per module in parallel;
//! - [`check`] reports every violation of a module at once.
//!
//! # Example
//!
//! ```rust
//! use vlens_core::prelude::*;
//! use vlens_syntax::{parse_module, print_class};
//!
//! let source = r#"
//! @version("1")
//! @version("2", replaces=["1"])
//! class Point:
//!     @at("1")
//!     def __init__(self, x):
//!         self.x = x
//!
//!     @at("2")
//!     def __init__(self, y):
//!         self.y = y
//!
//!     @at("1")
//!     def show(self):
//!         return self.x
//!
//!     @get("2", "1", "x")
//!     def x_from_y(self):
//!         return int(self.y)
//! "#;
//!
//! let model = ModuleModel::from_module(&parse_module(source).unwrap()).unwrap();
//! let classes = slice_module(&model, "2", &SliceConfig::default()).unwrap();
//! let printed = print_class(&classes[0]);
//! assert!(printed.contains("return self._lens_get_x_2_1()"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod check;
pub mod config;
pub mod error;
pub mod fields;
pub mod frontend;
pub mod lens;
pub mod model;
pub mod resolve;
pub mod rewrite;
pub mod slice;
pub mod synth;

pub use check::{check_class, check_module, Diagnostic, DiagnosticKind};
pub use config::SliceConfig;
pub use error::{ConfigError, ModelError, RewriteError, SliceError};
pub use fields::{base, fields_at, FieldMap};
pub use frontend::{ClassEntry, ModuleModel};
pub use lens::{Lens, LensTable};
pub use model::{BodyItem, ClassModel, DeclId, DeclKind, Declaration, Direction, INITIALIZER};
pub use resolve::{resolve, Resolution};
pub use rewrite::Rewriter;
pub use slice::{slice_all, slice_module, Slice, SliceTable, Slicer};
pub use synth::{fields_read, synthesize_put};

/// Prelude for common imports
pub mod prelude {
    pub use crate::check::{check_module, Diagnostic};
    pub use crate::config::SliceConfig;
    pub use crate::error::SliceError;
    pub use crate::frontend::ModuleModel;
    pub use crate::slice::{slice_all, slice_module};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
