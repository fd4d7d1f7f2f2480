use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MalformedInput,
    SourceUnreadable,
    InvalidJson,
    ConfigParseError,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MalformedInput => "E1001",
            Self::SourceUnreadable => "E2001",
            Self::InvalidJson => "E2002",
            Self::ConfigParseError => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MalformedInput => "Adjacency payload is not shaped as expected",
            Self::SourceUnreadable => "Braid source could not be read",
            Self::InvalidJson => "Braid source is not valid JSON",
            Self::ConfigParseError => "Config file parse error",
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::MalformedInput => Some(
                "Provide `parents` and `children` as objects mapping ids to arrays of ids.",
            ),
            Self::SourceUnreadable => Some("Check the fixture path and read permissions."),
            Self::InvalidJson => None,
            Self::ConfigParseError => Some("Fix syntax in the braid config.toml and retry."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by the engine boundary.
///
/// Partitioning, path selection and layout never fail; everything here
/// originates from ingestion, the fixture source, or configuration.
#[derive(Debug, thiserror::Error)]
pub enum BraidError {
    /// The adjacency payload does not have the documented shape.
    #[error("malformed input at `{field}`: {reason}")]
    MalformedInput { field: String, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl BraidError {
    pub(crate) fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedInput { .. } => ErrorCode::MalformedInput,
            Self::Io { .. } => ErrorCode::SourceUnreadable,
            Self::Json(_) => ErrorCode::InvalidJson,
            Self::Config { .. } => ErrorCode::ConfigParseError,
        }
    }
}
