//! Slicing: one version of a class as a standalone class
//!
//! For every member name the slicer resolves the backing declaration,
//! keeps it as written when it originates at the requested version, and
//! otherwise substitutes a method lens or rewrites the borrowed body into
//! the version's state space. Lens methods the rewrites call are appended
//! after the members.

use crate::config::SliceConfig;
use crate::error::SliceError;
use crate::fields::FieldMap;
use crate::frontend::{ClassEntry, ModuleModel};
use crate::lens::LensTable;
use crate::model::{BodyItem, ClassModel};
use crate::resolve::{resolve, Resolution};
use crate::rewrite::Rewriter;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::HashSet;
use vlens_graph::VersionId;
use vlens_syntax::ast::{ClassDef, FunctionDef, Stmt};

/// One class at one version
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    /// Version name the class was sliced at
    pub version: String,
    /// Standalone class
    pub class: ClassDef,
}

/// Slices keyed by `(class, version)`
#[derive(Debug, Clone, Default)]
pub struct SliceTable {
    slices: IndexMap<(String, String), ClassDef>,
}

impl SliceTable {
    /// Slice of `class` at `version`
    #[must_use]
    pub fn get(&self, class: &str, version: &str) -> Option<&ClassDef> {
        self.slices.get(&(class.to_string(), version.to_string()))
    }

    /// Entries in class then version order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ClassDef)> + '_ {
        self.slices
            .iter()
            .map(|((c, v), def)| (c.as_str(), v.as_str(), def))
    }

    /// Number of slices
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether no slice was produced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Slicer for one class; shares field and lens indexes across versions
#[derive(Debug)]
pub struct Slicer<'c> {
    class: &'c ClassModel,
    config: &'c SliceConfig,
    fields: FieldMap,
    lenses: LensTable,
}

impl<'c> Slicer<'c> {
    /// Index fields and lenses of `class`
    #[must_use]
    pub fn new(class: &'c ClassModel, config: &'c SliceConfig) -> Self {
        let fields = FieldMap::new(class);
        let lenses = LensTable::new(class, &fields);
        Self {
            class,
            config,
            fields,
            lenses,
        }
    }

    /// Base versions and fields of the class
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Declared lenses of the class
    #[inline]
    #[must_use]
    pub fn lenses(&self) -> &LensTable {
        &self.lenses
    }

    /// Fresh rewriter into `version`, with its own copy of the lens table
    #[must_use]
    pub fn rewriter(&self, version: VersionId) -> Rewriter<'_> {
        Rewriter::new(self.class, &self.fields, self.lenses.clone(), self.config, version)
    }

    /// Implementation of `member` at `version`, or `None` when unresolved
    ///
    /// # Errors
    /// Ambiguity, a missing method lens, or a failed rewrite.
    pub fn member(
        &self,
        rewriter: &mut Rewriter<'_>,
        member: &str,
        version: VersionId,
    ) -> Result<Option<FunctionDef>, SliceError> {
        let class = self.class;
        let id = match resolve(class.graph(), class, member, version) {
            Resolution::Resolved(id) => id,
            Resolution::Unresolved => return Ok(None),
            Resolution::Ambiguous(ids) => {
                return Err(SliceError::AmbiguousResolution {
                    class: class.name().to_string(),
                    member: member.to_string(),
                    version: class.version_name(version).to_string(),
                    candidates: ids
                        .into_iter()
                        .filter_map(|id| class.decl(id).origin())
                        .map(|v| class.version_name(v).to_string())
                        .collect(),
                });
            }
        };

        let decl = class.decl(id);
        let Some(origin) = decl.origin() else {
            return Ok(None);
        };
        if origin == version {
            return Ok(Some(decl.def.clone()));
        }

        if let Some(lens) = self.lenses.method_lens(origin, member, version) {
            tracing::debug!(
                class = class.name(),
                member,
                from = class.version_name(origin),
                to = class.version_name(version),
                "using method lens"
            );
            let mut def = lens.def.clone();
            def.name = member.to_string();
            return Ok(Some(def));
        }

        if let Some(local) = class.local(member, version) {
            if class.decl(local).def.signature() != decl.def.signature() {
                return Err(SliceError::MissingMethodLens {
                    class: class.name().to_string(),
                    member: member.to_string(),
                    from: class.version_name(origin).to_string(),
                    to: class.version_name(version).to_string(),
                });
            }
        }

        rewriter
            .rewrite_function(&decl.def, origin)
            .map(Some)
            .map_err(|source| SliceError::Rewrite {
                class: class.name().to_string(),
                member: member.to_string(),
                from: class.version_name(origin).to_string(),
                to: class.version_name(version).to_string(),
                source,
            })
    }

    /// Standalone class for `version`
    ///
    /// # Errors
    /// The first [`SliceError`] met; no partial class is returned.
    pub fn slice(&self, version: VersionId) -> Result<Slice, SliceError> {
        let class = self.class;
        let mut rewriter = self.rewriter(version);
        let mut seen = HashSet::new();
        let mut body = Vec::new();

        for item in class.body() {
            match item {
                BodyItem::Shared(stmt) => {
                    if self.config.keep_shared_members {
                        body.push(stmt.clone());
                    }
                }
                BodyItem::Member(id) => {
                    let name = class.decl(*id).name.as_str();
                    if !seen.insert(name) {
                        continue;
                    }
                    if let Some(def) = self.member(&mut rewriter, name, version)? {
                        body.push(Stmt::FunctionDef(def));
                    }
                }
            }
        }

        let lenses = rewriter.into_emitted();
        tracing::info!(
            class = class.name(),
            version = class.version_name(version),
            members = body.len(),
            lenses = lenses.len(),
            "sliced"
        );
        body.extend(lenses.into_iter().map(Stmt::FunctionDef));
        if body.is_empty() {
            body.push(Stmt::Pass);
        }

        Ok(Slice {
            version: class.version_name(version).to_string(),
            class: ClassDef {
                name: class.name().to_string(),
                decorators: class.decorators().to_vec(),
                bases: class.bases().to_vec(),
                body,
            },
        })
    }
}

/// Every class of the module at `version`, in source order
///
/// Unversioned classes are kept as written; versioned classes that do not
/// declare `version` are left out.
///
/// # Errors
/// [`SliceError::UnknownVersion`] when no class declares `version`, or the
/// first slicing error.
pub fn slice_module(model: &ModuleModel, version: &str, config: &SliceConfig) -> Result<Vec<ClassDef>, SliceError> {
    if !model.versions().iter().any(|v| v == version) {
        return Err(SliceError::UnknownVersion(version.to_string()));
    }
    let sliced: Vec<Option<ClassDef>> = model
        .classes
        .par_iter()
        .map(|entry| match entry {
            ClassEntry::Plain(def) => Ok(Some(def.clone())),
            ClassEntry::Versioned(class) => match class.graph().id(version) {
                Some(v) => Slicer::new(class, config).slice(v).map(|s| Some(s.class)),
                None => {
                    tracing::info!(class = class.name(), version, "class does not declare version; skipped");
                    Ok(None)
                }
            },
        })
        .collect::<Result<_, SliceError>>()?;
    Ok(sliced.into_iter().flatten().collect())
}

/// Every versioned class at every one of its versions
///
/// # Errors
/// The first slicing error.
pub fn slice_all(model: &ModuleModel, config: &SliceConfig) -> Result<SliceTable, SliceError> {
    let per_class: Vec<Vec<Slice>> = model
        .versioned()
        .collect::<Vec<_>>()
        .par_iter()
        .map(|class| {
            let slicer = Slicer::new(class, config);
            class
                .graph()
                .versions()
                .map(|v| slicer.slice(v))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<_, SliceError>>()?;

    let mut table = SliceTable::default();
    for slice in per_class.into_iter().flatten() {
        table
            .slices
            .insert((slice.class.name.clone(), slice.version), slice.class);
    }
    Ok(table)
}
