//! Testing utilities for the vlens workspace
//!
//! Shared fixtures and helpers.

#![allow(missing_docs)]

use std::fmt::Write as _;
use vlens_core::{slice_module, ClassModel, ModuleModel, SliceConfig, SliceError};
use vlens_syntax::{parse_module, print_class};

/// Point whose state is `x` at 1 and the string `y` at 2
pub const POINT: &str = r#"
@version("1")
@version("2", replaces=["1"])
class Point:
    @at("1")
    def __init__(self, x):
        self.x = x

    @at("2")
    def __init__(self, y):
        self.y = y

    @at("1")
    def bump(self):
        self.x += 1
        return self.x

    @at("1")
    def load(self, pair):
        self.x, label = parse(pair)
        return label

    @get("1", "2", "y")
    def y_from_x(self):
        return str(self.x)

    @get("2", "1", "x")
    def x_from_y(self):
        return int(self.y)
"#;

/// Three unrelated state shapes chained by lenses `C -> B -> A`
pub const CHAIN: &str = r#"
@version("A")
@version("B")
@version("C", replaces=["A"])
class Chain:
    @at("A")
    def __init__(self):
        self.f = 1

    @at("B")
    def __init__(self):
        self.f = "1"

    @at("C")
    def __init__(self):
        self.f = [1]

    @at("A")
    def show(self):
        return self.f

    @get("B", "A", "f")
    def a_from_b(self):
        return int(self.f)

    @get("C", "B", "f")
    def b_from_c(self):
        return str(self.f[0])
"#;

/// `Z` upgrades both `X` and `Y`, which each declare `m`
pub const DIAMOND: &str = r#"
@version("X")
@version("Y")
@version("Z", upgrades=["X", "Y"])
class Diamond:
    @at("X")
    def m(self):
        return "x"

    @at("Y")
    def m(self):
        return "y"
"#;

/// Model of the first class in `source`
///
/// # Panics
/// Panics if the source does not parse or its first class is not versioned.
#[must_use]
pub fn class_model(source: &str) -> ClassModel {
    let module = parse_module(source).expect("fixture parses");
    let class = module.classes().next().expect("fixture has a class");
    ClassModel::from_class(class)
        .expect("fixture tags are well formed")
        .expect("fixture class is versioned")
}

/// Model of a whole module
///
/// # Panics
/// Panics if the source does not parse or a class is malformed.
#[must_use]
pub fn module_model(source: &str) -> ModuleModel {
    let module = parse_module(source).expect("fixture parses");
    ModuleModel::from_module(&module).expect("fixture tags are well formed")
}

/// Printed slice of every class of `source` at `version`
///
/// # Errors
/// Whatever slicing reports.
pub fn slice_source(source: &str, version: &str, config: &SliceConfig) -> Result<String, SliceError> {
    let classes = slice_module(&module_model(source), version, config)?;
    Ok(classes
        .iter()
        .map(print_class)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// One version declaration for [`versioned_class`]
#[derive(Debug, Clone, Default)]
pub struct VersionDecl {
    pub name: String,
    pub replaces: Vec<String>,
    pub upgrades: Vec<String>,
}

/// Source of a class with the given versions and a member `m` declared at
/// each version in `declares`, every body returning its own version name
#[must_use]
pub fn versioned_class(versions: &[VersionDecl], declares: &[&str]) -> String {
    let list = |names: &[String]| {
        names
            .iter()
            .map(|n| format!("{n:?}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut src = String::new();
    for v in versions {
        let _ = writeln!(
            src,
            "@version({:?}, replaces=[{}], upgrades=[{}])",
            v.name,
            list(&v.replaces),
            list(&v.upgrades)
        );
    }
    src.push_str("class Generated:\n    pass\n");
    for d in declares {
        let _ = write!(src, "\n    @at({d:?})\n    def m(self):\n        return {d:?}\n");
    }
    src
}
