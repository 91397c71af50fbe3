use tracing::{debug, instrument, trace};

use crate::engine::attributes::{
    AttributeValue, REMOTE_IP_FIELD, RequesterAttributes, is_group_field,
};
use crate::engine::verdict::Verdict;
use crate::error::RuleError;
use crate::ir::matcher::ValueMatcher;
use crate::ir::policy::{CompiledPolicy, RuleRow};

/// How a row's field is matched against the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldMode {
    /// A list of group names; a match on any element counts.
    Group,
    /// The remote address; CIDR matchers apply.
    Ip,
    /// Any other single-valued attribute.
    Scalar,
}

impl FieldMode {
    fn of(field: &str) -> Self {
        if is_group_field(field) {
            Self::Group
        } else if field == REMOTE_IP_FIELD {
            Self::Ip
        } else {
            Self::Scalar
        }
    }
}

/// Result of evaluating a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    /// The row decided.
    Fired(bool),
    /// The row does not apply: its field is missing, or a negated row hit
    /// one of its forbidden values.
    Skip,
    /// None of the row's expressions matched.
    NoMatch,
}

/// Evaluate a policy and report which row decided.
///
/// Rows are walked in order and the first one that fires wins. A row whose
/// field is absent from `attrs` is skipped. A plain row fires when any of
/// its expressions matches; a negated row fires when none does. When no row
/// fires the policy default applies.
#[instrument(skip_all, fields(rules_count = policy.rules.len()))]
pub fn evaluate_verdict(
    attrs: &RequesterAttributes,
    policy: &CompiledPolicy,
) -> Result<Verdict, RuleError> {
    for (index, row) in policy.rules.iter().enumerate() {
        match eval_row(row, attrs)? {
            RowOutcome::Fired(allow) => {
                debug!(index, field = %row.field, allow, "rule fired");
                return Ok(Verdict::Rule { index, allow });
            }
            RowOutcome::Skip => trace!(index, field = %row.field, "rule skipped"),
            RowOutcome::NoMatch => trace!(index, field = %row.field, "rule did not match"),
        }
    }

    debug!(
        default_allow = policy.default_allow,
        "no rule fired, applying default"
    );
    Ok(Verdict::Default(policy.default_allow))
}

/// Evaluate a policy for a requester. Returns `true` when access is allowed.
pub fn evaluate(attrs: &RequesterAttributes, policy: &CompiledPolicy) -> Result<bool, RuleError> {
    evaluate_verdict(attrs, policy).map(|v| v.is_allowed())
}

impl CompiledPolicy {
    /// Evaluate this policy for a requester. See [`evaluate`].
    pub fn evaluate(&self, attrs: &RequesterAttributes) -> Result<bool, RuleError> {
        evaluate(attrs, self)
    }
}

fn eval_row(row: &RuleRow, attrs: &RequesterAttributes) -> Result<RowOutcome, RuleError> {
    let Some(value) = attrs.get(&row.field) else {
        return Ok(RowOutcome::Skip);
    };
    let mode = FieldMode::of(&row.field);

    for expr in &row.expressions {
        if expression_matches(mode, &row.field, expr, value)? {
            return Ok(if row.negate {
                RowOutcome::Skip
            } else {
                RowOutcome::Fired(row.allow)
            });
        }
    }

    // A negated row whose forbidden values all missed applies in full.
    Ok(if row.negate {
        RowOutcome::Fired(row.allow)
    } else {
        RowOutcome::NoMatch
    })
}

fn expression_matches(
    mode: FieldMode,
    field: &str,
    expr: &ValueMatcher,
    value: &AttributeValue,
) -> Result<bool, RuleError> {
    match mode {
        FieldMode::Group => {
            let AttributeValue::Many(groups) = value else {
                return Err(RuleError::Evaluation(format!(
                    "field `{field}` expects a list of groups"
                )));
            };
            match expr {
                ValueMatcher::Regex(re) => Ok(groups.iter().any(|g| re.is_match(g))),
                ValueMatcher::Literal(lit) => {
                    let lit = lit.to_lowercase();
                    Ok(groups.iter().any(|g| g.to_lowercase() == lit))
                }
                ValueMatcher::CidrRange(_) => Err(unexpected_matcher(field, expr)),
            }
        }
        FieldMode::Ip | FieldMode::Scalar => {
            let AttributeValue::Single(actual) = value else {
                return Err(RuleError::Evaluation(format!(
                    "field `{field}` expects a single value"
                )));
            };
            match expr {
                ValueMatcher::Regex(re) => Ok(re.is_match(actual)),
                ValueMatcher::Literal(lit) => Ok(actual.to_lowercase() == lit.to_lowercase()),
                ValueMatcher::CidrRange(range) if mode == FieldMode::Ip => range
                    .contains(actual)
                    .map_err(|e| RuleError::Evaluation(format!("field `{field}`: {e}"))),
                ValueMatcher::CidrRange(_) => Err(unexpected_matcher(field, expr)),
            }
        }
    }
}

fn unexpected_matcher(field: &str, expr: &ValueMatcher) -> RuleError {
    RuleError::Evaluation(format!(
        "unexpected {} matcher {expr} on field `{field}`",
        expr.kind()
    ))
}
