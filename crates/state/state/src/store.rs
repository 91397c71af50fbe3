use async_trait::async_trait;

use crate::error::StateError;
use crate::key::RoleId;

/// The persisted compiled form of a role definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredRole {
    /// Encoded compiled policy. May be empty when the role was created
    /// without a definition.
    pub compiled: Vec<u8>,
}

/// Trait for persisting role definitions.
///
/// A role record holds the policy source text alongside its compiled,
/// encoded artifact. Implementations must be `Send + Sync` and safe for
/// concurrent access.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Load the compiled artifact for a role. Returns `None` if the role does
    /// not exist.
    async fn get(&self, role: &RoleId) -> Result<Option<StoredRole>, StateError>;

    /// Store a compiled artifact and the source it was compiled from,
    /// overwriting any previous definition for the role.
    async fn set(&self, role: &RoleId, compiled: &[u8], source: &str) -> Result<(), StateError>;

    /// List every known role together with its policy source text.
    ///
    /// Used by the repair pass, which recompiles every definition. This
    /// operation may be expensive on some backends.
    async fn list_all(&self) -> Result<Vec<(RoleId, String)>, StateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify object safety.
    fn _assert_dyn_role_store(_: &dyn RoleStore) {}

    #[test]
    fn stored_role_default_is_empty() {
        assert!(StoredRole::default().compiled.is_empty());
    }
}
