use thiserror::Error;

/// Errors that can occur while compiling, decoding, or evaluating policies.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The policy source could not be compiled. Carries the offending row
    /// text and its 1-based line number.
    #[error("syntax error while compiling rule {row} (line {line}): {reason}")]
    Compile {
        /// The trimmed source row.
        row: String,
        /// 1-based line number within the source.
        line: usize,
        /// What was wrong with the row.
        reason: String,
    },

    /// A compiled policy could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// Stored compiled bytes are corrupt or were written by an incompatible
    /// format.
    #[error("decode error: {0}")]
    Decode(String),

    /// An unexpected fault while matching a requester against a policy.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// An error occurred while accessing the role store.
    #[error("state access error: {0}")]
    StateAccess(String),

    /// The policy source could not be read.
    #[error("cannot read policy source: {0}")]
    Source(String),

    /// Invalid compiler configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RuleError {
    /// Build a [`RuleError::Compile`] for the given row.
    pub fn compile(row: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Self::Compile {
            row: row.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors raised while decoding stored artifacts.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

impl From<firerole_state::StateError> for RuleError {
    fn from(err: firerole_state::StateError) -> Self {
        Self::StateAccess(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = RuleError::compile("allow badsyntax", 1, "not a valid rule!");
        assert_eq!(
            err.to_string(),
            "syntax error while compiling rule allow badsyntax (line 1): not a valid rule!"
        );

        let err = RuleError::Decode("corrupt deflate stream".into());
        assert_eq!(err.to_string(), "decode error: corrupt deflate stream");

        let err = RuleError::Evaluation("bad address".into());
        assert_eq!(err.to_string(), "evaluation error: bad address");

        let err = RuleError::StateAccess("connection refused".into());
        assert_eq!(err.to_string(), "state access error: connection refused");

        let err = RuleError::Source("roles/admin.fr: not found".into());
        assert_eq!(
            err.to_string(),
            "cannot read policy source: roles/admin.fr: not found"
        );

        let err = RuleError::Config("expected a string".into());
        assert_eq!(err.to_string(), "invalid configuration: expected a string");
    }

    #[test]
    fn state_errors_convert_to_state_access() {
        let err: RuleError = firerole_state::StateError::Backend("down".into()).into();
        assert!(matches!(err, RuleError::StateAccess(ref msg) if msg == "backend error: down"));
        assert!(!err.is_decode());
    }
}
