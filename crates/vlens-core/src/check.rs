//! Static checker
//!
//! Runs resolution and rewriting for every member at every version and
//! collects every violation instead of stopping at the first.

use crate::config::SliceConfig;
use crate::error::{ModelError, RewriteError, SliceError};
use crate::model::{ClassModel, DeclKind, Direction};
use crate::resolve::resolve;
use crate::slice::Slicer;
use vlens_graph::GraphError;
use vlens_syntax::ast::Module;

/// Category of a [`Diagnostic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Versions relate to each other in a loop
    CyclicVersionGraph,
    /// A version, or a member at a version, declared twice
    DuplicateVersion,
    /// A tag names a version the class never declares
    UndefinedVersion,
    /// Two lenses share direction, endpoints and subject
    DuplicateLens,
    /// A version or lens decorator with the wrong shape
    MalformedTag,
    /// Several declarations back a member
    AmbiguousResolution,
    /// Borrowed method clashes with a local signature
    MissingMethodLens,
    /// No lens path carries a field
    MissingFieldLens,
    /// Lens composition revisits a field
    LensCycle,
    /// Lens composition exceeds the hop ceiling
    LensHopLimit,
    /// Field in a position lenses cannot reach
    UnsupportedConstruct,
    /// Method lens parameters differ from the member it stands for
    SignatureMismatch,
}

impl DiagnosticKind {
    /// Kebab-case name shown in reports
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CyclicVersionGraph => "cyclic-version-graph",
            Self::DuplicateVersion => "duplicate-version",
            Self::UndefinedVersion => "undefined-version",
            Self::DuplicateLens => "duplicate-lens",
            Self::MalformedTag => "malformed-tag",
            Self::AmbiguousResolution => "ambiguous-resolution",
            Self::MissingMethodLens => "missing-method-lens",
            Self::MissingFieldLens => "missing-field-lens",
            Self::LensCycle => "lens-cycle",
            Self::LensHopLimit => "lens-hop-limit",
            Self::UnsupportedConstruct => "unsupported-construct",
            Self::SignatureMismatch => "signature-mismatch",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub class: String,
    /// Version being sliced; `None` for class-level problems
    pub version: Option<String>,
    pub member: Option<String>,
    pub kind: DiagnosticKind,
    /// Rendered error text
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error[{}]: {}", self.kind, self.message)
    }
}

impl Diagnostic {
    fn from_model(error: &ModelError) -> Self {
        let (class, kind) = match error {
            ModelError::Graph { class, source } => (
                class,
                match source {
                    GraphError::DuplicateVersion(_) => DiagnosticKind::DuplicateVersion,
                    GraphError::UndefinedVersion { .. } => DiagnosticKind::UndefinedVersion,
                    GraphError::SelfRelation(_) | GraphError::CyclicVersionGraph { .. } => {
                        DiagnosticKind::CyclicVersionGraph
                    }
                },
            ),
            ModelError::DuplicateVersion { class, .. } => (class, DiagnosticKind::DuplicateVersion),
            ModelError::UndefinedVersion { class, .. } => (class, DiagnosticKind::UndefinedVersion),
            ModelError::DuplicateLens { class, .. } => (class, DiagnosticKind::DuplicateLens),
            ModelError::MalformedTag { class, .. } => (class, DiagnosticKind::MalformedTag),
        };
        Self {
            class: class.clone(),
            version: None,
            member: None,
            kind,
            message: error.to_string(),
        }
    }

    fn from_slice(class: &ClassModel, version: &str, member: &str, error: &SliceError) -> Self {
        let kind = match error {
            SliceError::Model(e) => return Self::from_model(e),
            SliceError::AmbiguousResolution { .. } => DiagnosticKind::AmbiguousResolution,
            SliceError::MissingMethodLens { .. } => DiagnosticKind::MissingMethodLens,
            SliceError::Rewrite { source, .. } => match source {
                RewriteError::MissingFieldLens { .. } => DiagnosticKind::MissingFieldLens,
                RewriteError::LensCycle { .. } => DiagnosticKind::LensCycle,
                RewriteError::LensHopLimit { .. } => DiagnosticKind::LensHopLimit,
                RewriteError::UnsupportedConstruct { .. } => DiagnosticKind::UnsupportedConstruct,
            },
            SliceError::UnknownVersion(_) => DiagnosticKind::UndefinedVersion,
        };
        Self {
            class: class.name().to_string(),
            version: Some(version.to_string()),
            member: Some(member.to_string()),
            kind,
            message: error.to_string(),
        }
    }
}

/// Check every class of a parsed module
#[must_use]
pub fn check_module(module: &Module, config: &SliceConfig) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for class in module.classes() {
        match ClassModel::from_class(class) {
            Ok(Some(model)) => out.extend(check_class(&model, config)),
            Ok(None) => {}
            Err(e) => out.push(Diagnostic::from_model(&e)),
        }
    }
    tracing::info!(diagnostics = out.len(), "check finished");
    out
}

/// Check one class at all of its versions
#[must_use]
pub fn check_class(class: &ClassModel, config: &SliceConfig) -> Vec<Diagnostic> {
    let slicer = Slicer::new(class, config);
    let graph = class.graph();
    let mut out = Vec::new();

    for version in graph.versions() {
        let mut rewriter = slicer.rewriter(version);
        for member in class.member_names() {
            if let Err(e) = slicer.member(&mut rewriter, member, version) {
                out.push(Diagnostic::from_slice(class, graph.name(version), member, &e));
            }
        }
    }

    for decl in class.lens_decls() {
        let DeclKind::Lens {
            direction: Direction::Get,
            from,
            to,
            ref subject,
        } = decl.kind
        else {
            continue;
        };
        if !class.is_method(subject) {
            continue;
        }
        let Some(id) = resolve(graph, class, subject, to).decl() else {
            continue;
        };
        let (expected, found) = (class.decl(id).def.signature(), decl.def.signature());
        if expected != found {
            out.push(Diagnostic {
                class: class.name().to_string(),
                version: Some(graph.name(from).to_string()),
                member: Some(subject.clone()),
                kind: DiagnosticKind::SignatureMismatch,
                message: format!(
                    "class {}: method lens `{}` for `{subject}` from {} to {} has signature {found}, `{subject}` at {} has {expected}",
                    class.name(),
                    decl.name,
                    graph.name(from),
                    graph.name(to),
                    graph.name(to),
                ),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlens_syntax::parse_module;

    fn check(src: &str) -> Vec<Diagnostic> {
        check_module(&parse_module(src).unwrap(), &SliceConfig::default())
    }

    #[test]
    fn clean_class_has_no_diagnostics() {
        let src = r#"
@version("1")
@version("2", upgrades=["1"])
class C:
    @at("1")
    def __init__(self):
        self.n = 0

    @at("2")
    def next(self):
        return self.n + 1
"#;
        assert!(check(src).is_empty());
    }

    #[test]
    fn collects_every_violation() {
        let src = r#"
@version("1")
@version("2", replaces=["1"])
class C:
    @at("1")
    def __init__(self):
        self.a = 0

    @at("2")
    def __init__(self):
        self.b = 0

    @at("1")
    def get_a(self):
        return self.a

    @at("1")
    def set_a(self, v):
        self.a = v


@version("1")
@version("1")
class Broken:
    pass
"#;
        let diags = check(src);
        let kinds: Vec<_> = diags.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::MissingFieldLens,
                DiagnosticKind::MissingFieldLens,
                DiagnosticKind::DuplicateVersion,
            ]
        );
        assert_eq!(diags[0].version.as_deref(), Some("2"));
        assert_eq!(diags[0].member.as_deref(), Some("get_a"));
        assert_eq!(diags[2].class, "Broken");
        assert!(diags[0].to_string().starts_with("error[missing-field-lens]: class C:"));
    }

    #[test]
    fn write_without_put_target_is_reported() {
        let src = r#"
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
    def set_x(self, v):
        self.x = v

    @get("2", "1", "x")
    def x_of(self):
        return int(self.y)
"#;
        let diags = check(src);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::MissingFieldLens);
        assert_eq!(diags[0].member.as_deref(), Some("set_x"));
        assert_eq!(diags[0].version.as_deref(), Some("2"));
    }

    #[test]
    fn method_lens_signature_is_checked() {
        let src = r#"
@version("1")
@version("2", replaces=["1"])
class C:
    @at("1")
    def m(self, a):
        return a

    @at("2")
    def m(self):
        return 0

    @get("1", "2", "m")
    def m_on_1(self, extra):
        return extra
"#;
        let diags = check(src);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::SignatureMismatch);
        assert_eq!(diags[0].member.as_deref(), Some("m"));
    }
}
