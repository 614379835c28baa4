//! vlens syntax layer
//!
//! A syntax tree for the Python subset that versioned classes are written
//! in, a tree-sitter-python front-end that produces it, and a printer that
//! turns it back into source.
//!
//! # Example
//!
//! ```rust
//! use vlens_syntax::{parse_module, print_module};
//!
//! let module = parse_module("x = (a + b) * c\n").unwrap();
//! assert_eq!(print_module(&module), "x = (a + b) * c\n");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod ast;
pub mod error;
pub mod parse;
pub mod print;
pub mod visit;

pub use ast::{
    Arg, BinOp, ClassDef, Constant, Expr, FunctionDef, Module, Param, ParamKind, Signature, Stmt,
};
pub use error::ParseError;
pub use parse::{parse_expr, parse_module};
pub use print::{print_body, print_class, print_expr, print_function, print_module};
pub use visit::{Visitor, VisitorMut};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
