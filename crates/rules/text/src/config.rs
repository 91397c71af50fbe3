use serde::Deserialize;

use firerole_rules::RuleError;

/// Source compiled in place of an empty or whitespace-only policy.
pub const EMPTY_POLICY_SOURCE: &str = "deny any";

/// Configuration for the text compiler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompilerConfig {
    /// Policy text substituted when a source is blank. Defaults to
    /// [`EMPTY_POLICY_SOURCE`].
    #[serde(default = "default_empty_policy_source")]
    pub empty_policy_source: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            empty_policy_source: default_empty_policy_source(),
        }
    }
}

impl CompilerConfig {
    /// Load a configuration from a TOML fragment.
    ///
    /// ```toml
    /// empty_policy_source = "allow any"
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self, RuleError> {
        toml::from_str(input).map_err(|e| RuleError::Config(e.to_string()))
    }
}

fn default_empty_policy_source() -> String {
    EMPTY_POLICY_SOURCE.to_owned()
}
