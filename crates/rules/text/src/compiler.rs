//! Compiler from policy text to [`CompiledPolicy`].

use tracing::{debug, instrument};

use firerole_rules::engine::attributes::REMOTE_IP_FIELD;
use firerole_rules::ip::build_range;
use firerole_rules::{
    CompiledPolicy, PolicyFrontend, PolicyRegex, RuleError, RuleRow, ValueMatcher,
};

use crate::config::CompilerConfig;
use crate::grammar::{Delimiter, RawExpression, RawRule, parse};

/// Synonyms accepted for field names, mapped to the canonical name.
static FIELD_ALIASES: &[(&str, &str)] = &[
    ("groups", "group"),
    ("apache_groups", "apache_group"),
];

/// Lowercase a field name and resolve its alias.
fn canonical_field(field: &str) -> String {
    let field = field.to_lowercase();
    FIELD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == field)
        .map_or(field, |(_, canonical)| (*canonical).to_owned())
}

/// Frontend for the line-oriented policy language.
#[derive(Debug, Clone, Default)]
pub struct FireroleFrontend {
    config: CompilerConfig,
}

impl FireroleFrontend {
    /// Create a frontend with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frontend with a custom configuration.
    ///
    /// Fails with [`RuleError::Config`] if the configured empty-policy source
    /// does not compile.
    pub fn with_config(config: CompilerConfig) -> Result<Self, RuleError> {
        let frontend = Self { config };
        frontend
            .compile_source(&frontend.config.empty_policy_source)
            .map_err(|e| RuleError::Config(format!("empty_policy_source: {e}")))?;
        Ok(frontend)
    }

    /// The active configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    #[instrument(skip_all)]
    fn compile_source(&self, source: &str) -> Result<CompiledPolicy, RuleError> {
        let parsed = parse(source)?;
        let rules = parsed
            .rules
            .iter()
            .map(compile_rule)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            rows = rules.len(),
            default_allow = parsed.default_allow,
            "compiled policy"
        );
        Ok(CompiledPolicy::new(parsed.default_allow, rules))
    }
}

impl PolicyFrontend for FireroleFrontend {
    fn compile(&self, source: &str) -> Result<CompiledPolicy, RuleError> {
        if source.trim().is_empty() {
            return self.compile_source(&self.config.empty_policy_source);
        }
        self.compile_source(source)
    }
}

/// Compile policy text with the default configuration.
pub fn compile(source: &str) -> Result<CompiledPolicy, RuleError> {
    FireroleFrontend::new().compile(source)
}

fn compile_rule(raw: &RawRule) -> Result<RuleRow, RuleError> {
    let field = canonical_field(&raw.field);
    let expressions = raw
        .expressions
        .iter()
        .map(|expr| compile_expression(raw, &field, expr))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RuleRow {
        allow: raw.allow,
        negate: raw.negate,
        field,
        expressions,
    })
}

fn compile_expression(
    raw: &RawRule,
    field: &str,
    expr: &RawExpression,
) -> Result<ValueMatcher, RuleError> {
    if expr.delimiter == Delimiter::Slash {
        return PolicyRegex::new(expr.body.as_str())
            .map(ValueMatcher::Regex)
            .map_err(|e| {
                RuleError::compile(
                    &raw.row,
                    raw.line,
                    format!("{expr} is not a valid re because {e}"),
                )
            });
    }

    if field == REMOTE_IP_FIELD && expr.body.contains('/') {
        return build_range(&expr.body)
            .map(ValueMatcher::CidrRange)
            .map_err(|e| {
                RuleError::compile(
                    &raw.row,
                    raw.line,
                    format!("{expr} is not a valid ip group because {e}"),
                )
            });
    }

    Ok(ValueMatcher::Literal(expr.body.clone()))
}
