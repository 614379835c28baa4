//! Tag extraction: decorated classes -> class models
//!
//! Recognised decorators:
//!
//! ```python
//! @version("2", replaces=["1"], upgrades=[])   # on the class
//! @at("1")                                      # on a member
//! @get("1", "2", "y")                           # lens: from, to, subject
//! @put("1", "2", "y")
//! ```
//!
//! Everything else is kept as written.

use crate::error::ModelError;
use crate::model::{BodyItem, ClassModel, DeclId, DeclKind, Declaration, Direction, INITIALIZER};
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use vlens_graph::{VersionGraph, VersionId, VersionSpec};
use vlens_syntax::ast::{Arg, ClassDef, Constant, Expr, FunctionDef, Module, Stmt};

/// A class of a module, versioned or not
#[derive(Debug, Clone)]
pub enum ClassEntry {
    /// Class carrying `@version` tags
    Versioned(ClassModel),
    /// Class without version tags, emitted unchanged
    Plain(ClassDef),
}

impl ClassEntry {
    /// Class name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ClassEntry::Versioned(model) => model.name(),
            ClassEntry::Plain(def) => &def.name,
        }
    }
}

/// Every class of a module
#[derive(Debug, Clone, Default)]
pub struct ModuleModel {
    pub classes: Vec<ClassEntry>,
}

impl ModuleModel {
    /// Extract class models from a parsed module
    ///
    /// # Errors
    /// Fails on the first class whose tags are malformed.
    pub fn from_module(module: &Module) -> Result<Self, ModelError> {
        let classes = module
            .classes()
            .map(|class| {
                Ok(match ClassModel::from_class(class)? {
                    Some(model) => ClassEntry::Versioned(model),
                    None => ClassEntry::Plain(class.clone()),
                })
            })
            .collect::<Result<_, ModelError>>()?;
        Ok(Self { classes })
    }

    /// Versioned classes only
    pub fn versioned(&self) -> impl Iterator<Item = &ClassModel> + '_ {
        self.classes.iter().filter_map(|c| match c {
            ClassEntry::Versioned(model) => Some(model),
            ClassEntry::Plain(_) => None,
        })
    }

    /// Union of version names across classes, in declaration order
    #[must_use]
    pub fn versions(&self) -> Vec<String> {
        let mut names = IndexSet::new();
        for class in self.versioned() {
            for name in class.graph().names() {
                names.insert(name.to_string());
            }
        }
        names.into_iter().collect()
    }
}

/// Decorator call `name(args...)`, matching `name` or `module.name`
fn tag_call<'e>(decorator: &'e Expr, names: &[&str]) -> Option<(&'e str, &'e [Arg])> {
    let Expr::Call { func, args } = decorator else {
        return None;
    };
    let name = match func.as_ref() {
        Expr::Name(id) => id.as_str(),
        Expr::Attribute { attr, .. } => attr.as_str(),
        _ => return None,
    };
    names.contains(&name).then_some((name, args.as_slice()))
}

/// Value of a simple string (or integer) literal, without escape processing
pub(crate) fn literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Constant(Constant::Int(digits)) => Some(digits.clone()),
        Expr::Constant(Constant::Str(raw)) => {
            let body = raw.trim_start_matches(|c: char| "rRuU".contains(c));
            ["\"\"\"", "'''", "\"", "'"].iter().find_map(|q| {
                body.strip_prefix(q)
                    .and_then(|rest| rest.strip_suffix(q))
                    .map(str::to_string)
            })
        }
        _ => None,
    }
}

fn literal_list(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::List(items) | Expr::Tuple(items) => items.iter().map(literal).collect(),
        single => literal(single).map(|v| vec![v]),
    }
}

struct Extractor<'c> {
    class: &'c str,
}

impl Extractor<'_> {
    fn malformed(&self, member: &str, reason: impl Into<String>) -> ModelError {
        ModelError::MalformedTag {
            class: self.class.to_string(),
            member: member.to_string(),
            reason: reason.into(),
        }
    }

    fn version_spec(&self, args: &[Arg]) -> Result<VersionSpec, ModelError> {
        let mut spec: Option<VersionSpec> = None;
        let mut replaces = Vec::new();
        let mut upgrades = Vec::new();
        for arg in args {
            match arg {
                Arg::Positional(e) if spec.is_none() => {
                    let name = literal(e).ok_or_else(|| self.malformed(self.class, "version name must be a literal"))?;
                    spec = Some(VersionSpec::new(name));
                }
                Arg::Keyword(key, e) if key == "replaces" || key == "upgrades" => {
                    let names = literal_list(e)
                        .ok_or_else(|| self.malformed(self.class, format!("`{key}` must list literal versions")))?;
                    if key == "replaces" {
                        replaces.extend(names);
                    } else {
                        upgrades.extend(names);
                    }
                }
                _ => return Err(self.malformed(self.class, "unexpected argument to `version`")),
            }
        }
        let mut spec = spec.ok_or_else(|| self.malformed(self.class, "`version` without a name"))?;
        spec.replaces = replaces;
        spec.upgrades = upgrades;
        Ok(spec)
    }

    fn resolve_version(&self, graph: &VersionGraph, member: &str, args: &[Arg], i: usize) -> Result<VersionId, ModelError> {
        let name = match args.get(i) {
            Some(Arg::Positional(e)) => literal(e),
            _ => None,
        }
        .ok_or_else(|| self.malformed(member, "version arguments must be literals"))?;
        graph.id(&name).ok_or_else(|| ModelError::UndefinedVersion {
            class: self.class.to_string(),
            member: member.to_string(),
            version: name,
        })
    }
}

enum MemberTag {
    At(Vec<VersionId>),
    Lens {
        direction: Direction,
        from: VersionId,
        to: VersionId,
        subject: String,
    },
    None,
}

impl ClassModel {
    /// Build the model of one class; `None` when the class has no `@version` tag
    ///
    /// # Errors
    /// Returns [`ModelError`] for graph errors, member/version duplicates,
    /// tags naming undeclared versions, and malformed tags.
    pub fn from_class(class: &ClassDef) -> Result<Option<Self>, ModelError> {
        let ex = Extractor { class: &class.name };

        let mut specs = Vec::new();
        let mut decorators = Vec::new();
        for d in &class.decorators {
            match tag_call(d, &["version"]) {
                Some((_, args)) => specs.push(ex.version_spec(args)?),
                None => decorators.push(d.clone()),
            }
        }
        if specs.is_empty() {
            return Ok(None);
        }
        let graph = VersionGraph::from_specs(specs).map_err(|source| ModelError::Graph {
            class: class.name.clone(),
            source,
        })?;

        let mut methods: IndexSet<String> = IndexSet::new();
        for stmt in &class.body {
            if let Stmt::FunctionDef(f) = stmt {
                let is_lens = f.decorators.iter().any(|d| tag_call(d, &["get", "put"]).is_some());
                if !is_lens {
                    methods.insert(f.name.clone());
                }
            }
        }

        let mut model = ClassModel {
            name: class.name.clone(),
            graph,
            decorators,
            bases: class.bases.clone(),
            decls: Vec::new(),
            body: Vec::new(),
            locals: HashMap::new(),
            methods,
        };
        let mut lens_keys = HashSet::new();

        for stmt in &class.body {
            let Stmt::FunctionDef(f) = stmt else {
                model.body.push(BodyItem::Shared(stmt.clone()));
                continue;
            };
            let (tag, def) = member_tag(&ex, &model.graph, f)?;
            match tag {
                MemberTag::None => model.body.push(BodyItem::Shared(stmt.clone())),
                MemberTag::At(origins) => {
                    for origin in origins {
                        let id = DeclId(model.decls.len() as u32);
                        if model.locals.insert((f.name.clone(), origin), id).is_some() {
                            return Err(ModelError::DuplicateVersion {
                                class: class.name.clone(),
                                member: f.name.clone(),
                                version: model.graph.name(origin).to_string(),
                            });
                        }
                        let kind = if f.name == INITIALIZER {
                            DeclKind::Initializer { origin }
                        } else {
                            DeclKind::Method { origin }
                        };
                        model.decls.push(Declaration {
                            id,
                            name: f.name.clone(),
                            kind,
                            def: def.clone(),
                        });
                        model.body.push(BodyItem::Member(id));
                    }
                }
                MemberTag::Lens {
                    direction,
                    from,
                    to,
                    subject,
                } => {
                    if !lens_keys.insert((direction, from, to, subject.clone())) {
                        return Err(ModelError::DuplicateLens {
                            class: class.name.clone(),
                            direction: direction.as_str(),
                            subject,
                            from: model.graph.name(from).to_string(),
                            to: model.graph.name(to).to_string(),
                        });
                    }
                    let id = DeclId(model.decls.len() as u32);
                    model.decls.push(Declaration {
                        id,
                        name: f.name.clone(),
                        kind: DeclKind::Lens {
                            direction,
                            from,
                            to,
                            subject,
                        },
                        def,
                    });
                }
            }
        }

        tracing::debug!(
            class = %model.name,
            versions = model.graph.len(),
            decls = model.decls.len(),
            "extracted class model"
        );
        Ok(Some(model))
    }
}

/// Classify a function by its tags and strip them
fn member_tag(ex: &Extractor<'_>, graph: &VersionGraph, f: &FunctionDef) -> Result<(MemberTag, FunctionDef), ModelError> {
    let mut tag = MemberTag::None;
    let mut kept = Vec::new();

    for d in &f.decorators {
        let Some((name, args)) = tag_call(d, &["at", "get", "put"]) else {
            kept.push(d.clone());
            continue;
        };
        if name == "at" {
            let origins = (0..args.len())
                .map(|i| ex.resolve_version(graph, &f.name, args, i))
                .collect::<Result<Vec<_>, _>>()?;
            if origins.is_empty() {
                return Err(ex.malformed(&f.name, "`at` without a version"));
            }
            if let MemberTag::At(existing) = &mut tag {
                existing.extend(origins);
            } else if matches!(tag, MemberTag::None) {
                tag = MemberTag::At(origins);
            } else {
                return Err(ex.malformed(&f.name, "conflicting version tags"));
            }
            continue;
        }

        if !matches!(tag, MemberTag::None) {
            return Err(ex.malformed(&f.name, "conflicting version tags"));
        }
        if args.len() != 3 {
            return Err(ex.malformed(&f.name, format!("`{name}` takes (from, to, subject)")));
        }
        let from = ex.resolve_version(graph, &f.name, args, 0)?;
        let to = ex.resolve_version(graph, &f.name, args, 1)?;
        if from == to {
            return Err(ex.malformed(&f.name, "lens endpoints must differ"));
        }
        let subject = match &args[2] {
            Arg::Positional(e) => literal(e),
            _ => None,
        }
        .ok_or_else(|| ex.malformed(&f.name, "lens subject must be a literal"))?;
        let direction = if name == "get" { Direction::Get } else { Direction::Put };
        tag = MemberTag::Lens {
            direction,
            from,
            to,
            subject,
        };
    }

    let def = FunctionDef {
        decorators: kept,
        ..f.clone()
    };
    Ok((tag, def))
}
