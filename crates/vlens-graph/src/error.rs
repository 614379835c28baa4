//! Error types for version graph construction

/// Errors raised while building a [`crate::VersionGraph`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two version declarations share a name
    #[error("version '{0}' is declared more than once")]
    DuplicateVersion(String),

    /// An edge names a version that was never declared
    #[error("version '{referenced_by}' refers to undefined version '{version}'")]
    UndefinedVersion {
        /// The missing version name
        version: String,
        /// The version whose edge list mentions it
        referenced_by: String,
    },

    /// A version lists itself in `replaces` or `upgrades`
    #[error("version '{0}' relates to itself")]
    SelfRelation(String),

    /// The replaces/upgrades edges form a cycle
    #[error("version graph contains a cycle: {}", .cycle.join(" -> "))]
    CyclicVersionGraph {
        /// Versions on the cycle, in edge order
        cycle: Vec<String>,
    },
}

impl GraphError {
    /// Versions mentioned by this error
    #[must_use]
    pub fn versions(&self) -> Vec<&str> {
        match self {
            Self::DuplicateVersion(name) | Self::SelfRelation(name) => vec![name.as_str()],
            Self::UndefinedVersion {
                version,
                referenced_by,
            } => vec![referenced_by.as_str(), version.as_str()],
            Self::CyclicVersionGraph { cycle } => cycle.iter().map(String::as_str).collect(),
        }
    }
}
