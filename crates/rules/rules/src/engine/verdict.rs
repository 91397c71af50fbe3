use serde::{Deserialize, Serialize};

/// The outcome of evaluating a policy for one requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// A row fired and decided.
    Rule {
        /// Zero-based position of the row within the policy.
        index: usize,
        /// The row's decision.
        allow: bool,
    },
    /// No row fired; the policy default applied.
    Default(bool),
}

impl Verdict {
    /// Whether the requester is allowed.
    pub fn is_allowed(&self) -> bool {
        match *self {
            Self::Rule { allow, .. } | Self::Default(allow) => allow,
        }
    }

    /// The index of the row that decided, if any.
    pub fn rule_index(&self) -> Option<usize> {
        match *self {
            Self::Rule { index, .. } => Some(index),
            Self::Default(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_verdict_accessors() {
        let verdict = Verdict::Rule {
            index: 2,
            allow: true,
        };
        assert!(verdict.is_allowed());
        assert_eq!(verdict.rule_index(), Some(2));
    }

    #[test]
    fn default_verdict_accessors() {
        let verdict = Verdict::Default(false);
        assert!(!verdict.is_allowed());
        assert_eq!(verdict.rule_index(), None);
    }
}
