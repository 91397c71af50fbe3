use std::path::Path;

use crate::error::RuleError;
use crate::ir::policy::CompiledPolicy;

/// Trait for frontends that compile policy source text into a
/// [`CompiledPolicy`].
///
/// The repair pass only needs this trait, so it can recompile stored sources
/// without knowing which grammar produced them.
pub trait PolicyFrontend: Send + Sync {
    /// Compile policy source text.
    fn compile(&self, source: &str) -> Result<CompiledPolicy, RuleError>;

    /// Compile policy source read from a file.
    ///
    /// The default implementation reads the file and delegates to
    /// [`compile`](Self::compile).
    fn compile_file(&self, path: &Path) -> Result<CompiledPolicy, RuleError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RuleError::Source(format!("{}: {e}", path.display())))?;
        self.compile(&content)
    }
}
