//! Front-end errors

/// Parse error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    #[error("parse failed")]
    ParseFailed,

    #[error("syntax error at {line}:{column}: {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Valid Python outside the supported subset
    #[error("unsupported syntax `{kind}` at line {line}")]
    Unsupported { kind: String, line: usize },
}

impl ParseError {
    /// Unsupported-node error positioned at `node`
    pub(crate) fn unsupported(node: &tree_sitter::Node<'_>) -> Self {
        Self::Unsupported {
            kind: node.kind().to_string(),
            line: node.start_position().row + 1,
        }
    }

    /// Syntax error positioned at `node`
    pub(crate) fn syntax(node: &tree_sitter::Node<'_>, message: impl Into<String>) -> Self {
        let pos = node.start_position();
        Self::SyntaxError {
            line: pos.row + 1,
            column: pos.column + 1,
            message: message.into(),
        }
    }
}
