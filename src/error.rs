use thiserror::Error;

pub type Result<T> = std::result::Result<T, AbookError>;

/// Failures raised by the addressbook core. File I/O is not represented
/// here; callers wrap it with `anyhow` context instead.
#[derive(Debug, Error)]
pub enum AbookError {
    /// Malformed addressbook text: bad INI syntax, a missing `[format]`
    /// section, or a section name that is not a record id.
    #[error("{}", format_message(.line, .reason))]
    Format { line: Option<usize>, reason: String },

    #[error("could not parse query `{0}`: expected `key:pattern` or `key=pattern`")]
    InvalidQuery(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no record matches `{0}`")]
    NotFound(String),

    #[error("selection aborted")]
    Aborted,

    /// The edited fragment no longer describes the record that was handed out.
    #[error("edited contact rejected: {0}")]
    EditContract(String),
}

impl AbookError {
    pub fn format(reason: impl Into<String>) -> Self {
        AbookError::Format {
            line: None,
            reason: reason.into(),
        }
    }

    pub fn format_at(line: usize, reason: impl Into<String>) -> Self {
        AbookError::Format {
            line: Some(line),
            reason: reason.into(),
        }
    }

    /// Errors the CLI reports and then exits cleanly on.
    pub fn is_benign(&self) -> bool {
        matches!(self, AbookError::NotFound(_) | AbookError::Aborted)
    }
}

fn format_message(line: &Option<usize>, reason: &str) -> String {
    match line {
        Some(line) => format!("invalid addressbook (line {}): {}", line, reason),
        None => format!("invalid addressbook: {}", reason),
    }
}
