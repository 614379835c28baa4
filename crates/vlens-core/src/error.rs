//! Error types for vlens core
//!
//! Provides error handling for:
//! - Class model extraction (decorators -> declarations)
//! - Body rewriting (field access -> lens calls)
//! - Slicing one class at one version
//! - Configuration loading

use vlens_graph::GraphError;

/// Errors while turning a decorated class into a [`crate::ClassModel`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Version graph is malformed (duplicate, undefined, self edge, cycle)
    #[error("class {class}: {source}")]
    Graph {
        class: String,
        #[source]
        source: GraphError,
    },

    /// Two declarations share a member name and origin version
    #[error("class {class}: member `{member}` declared twice at version {version}")]
    DuplicateVersion {
        class: String,
        member: String,
        version: String,
    },

    /// A member tag names a version the class never declares
    #[error("class {class}: member `{member}` tagged with undeclared version {version}")]
    UndefinedVersion {
        class: String,
        member: String,
        version: String,
    },

    /// Two lenses with the same direction, endpoints and subject
    #[error("class {class}: duplicate {direction} lens for `{subject}` from {from} to {to}")]
    DuplicateLens {
        class: String,
        direction: &'static str,
        subject: String,
        from: String,
        to: String,
    },

    /// A version or lens decorator with the wrong shape
    #[error("class {class}: malformed tag on `{member}`: {reason}")]
    MalformedTag {
        class: String,
        member: String,
        reason: String,
    },
}

/// Errors while rewriting a borrowed body into the target's state space
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// No lens path serves the field from the target's state
    #[error("no lens for field `{field}` of version {from} from the state of version {to}")]
    MissingFieldLens {
        field: String,
        from: String,
        to: String,
    },

    /// Lens composition came back to a field it is already composing
    #[error("lens composition for field `{field}` at version {version} is cyclic")]
    LensCycle { field: String, version: String },

    /// Lens composition exceeded the configured hop ceiling
    #[error("lens composition for field `{field}` exceeded {limit} hops")]
    LensHopLimit { field: String, limit: usize },

    /// A field appears where it cannot be routed through a lens
    #[error("field `{field}` used as {construct} target cannot be rewritten")]
    UnsupportedConstruct {
        field: String,
        construct: &'static str,
    },
}

/// Errors while slicing one class at one version
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SliceError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Version is not declared by any class of the module
    #[error("unknown target version {0}")]
    UnknownVersion(String),

    /// More than one distinct declaration backs the member
    #[error("class {class}: `{member}` is ambiguous at version {version} (candidates from {})", candidates.join(", "))]
    AmbiguousResolution {
        class: String,
        member: String,
        version: String,
        candidates: Vec<String>,
    },

    /// A method borrowed from another version clashes with a local signature
    #[error("class {class}: `{member}` borrowed from {from} into {to} needs a method lens")]
    MissingMethodLens {
        class: String,
        member: String,
        from: String,
        to: String,
    },

    /// Rewriting a borrowed member failed
    #[error("class {class}: rewriting `{member}` from {from} into {to}: {source}")]
    Rewrite {
        class: String,
        member: String,
        from: String,
        to: String,
        #[source]
        source: RewriteError,
    },
}

impl SliceError {
    /// Class the error belongs to, if any
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        match self {
            SliceError::Model(
                ModelError::Graph { class, .. }
                | ModelError::DuplicateVersion { class, .. }
                | ModelError::UndefinedVersion { class, .. }
                | ModelError::DuplicateLens { class, .. }
                | ModelError::MalformedTag { class, .. },
            )
            | SliceError::AmbiguousResolution { class, .. }
            | SliceError::MissingMethodLens { class, .. }
            | SliceError::Rewrite { class, .. } => Some(class),
            SliceError::UnknownVersion(_) => None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}
