use serde::{Deserialize, Serialize};

use super::matcher::ValueMatcher;

/// One compiled `allow|deny [not] <field> <expr>, ...` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRow {
    /// Decision returned when the row fires.
    pub allow: bool,
    /// Whether the row was written with `not`.
    pub negate: bool,
    /// Lowercased, alias-resolved requester attribute name.
    pub field: String,
    /// Value expressions, tried in source order.
    pub expressions: Vec<ValueMatcher>,
}

impl RuleRow {
    /// Create a row with no expressions.
    pub fn new(allow: bool, field: impl Into<String>) -> Self {
        Self {
            allow,
            negate: false,
            field: field.into(),
            expressions: Vec::new(),
        }
    }

    /// Mark the row as negated.
    #[must_use]
    pub fn with_negate(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    /// Append a value expression.
    #[must_use]
    pub fn with_expression(mut self, expression: ValueMatcher) -> Self {
        self.expressions.push(expression);
        self
    }
}

/// The compiled form of a role definition, and the unit of serialization.
///
/// Rows are evaluated in order; the first row that fires decides. When none
/// fires, `default_allow` applies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompiledPolicy {
    /// Decision set by a trailing `allow any` / `deny any` line.
    pub default_allow: bool,
    /// Rows in source order.
    pub rules: Vec<RuleRow>,
}

impl CompiledPolicy {
    /// Create a policy from its parts.
    pub fn new(default_allow: bool, rules: Vec<RuleRow>) -> Self {
        Self {
            default_allow,
            rules,
        }
    }

    /// The deny-by-default policy with no rows. Used whenever no usable
    /// compiled definition is available.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` when the policy has no rows.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::matcher::PolicyRegex;

    #[test]
    fn row_construction() {
        let row = RuleRow::new(false, "group")
            .with_negate(true)
            .with_expression(ValueMatcher::Literal("admins".into()))
            .with_expression(ValueMatcher::Regex(PolicyRegex::new("^ops").unwrap()));

        assert!(!row.allow);
        assert!(row.negate);
        assert_eq!(row.field, "group");
        assert_eq!(row.expressions.len(), 2);
    }

    #[test]
    fn empty_policy_denies_by_default() {
        let policy = CompiledPolicy::empty();
        assert!(!policy.default_allow);
        assert!(policy.is_empty());
    }

    #[test]
    fn policy_serde_roundtrip() {
        let policy = CompiledPolicy::new(
            true,
            vec![RuleRow::new(false, "email").with_expression(ValueMatcher::Literal("x@y".into()))],
        );
        let json = serde_json::to_string(&policy).unwrap();
        let back: CompiledPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
