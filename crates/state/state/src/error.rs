use thiserror::Error;

/// Errors from role store operations.
///
/// A missing role is not an error: [`RoleStore::get`](crate::RoleStore::get)
/// returns `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = StateError::Connection("refused".into());
        assert_eq!(err.to_string(), "connection error: refused");

        let err = StateError::Backend("disk full".into());
        assert_eq!(err.to_string(), "backend error: disk full");
    }
}
