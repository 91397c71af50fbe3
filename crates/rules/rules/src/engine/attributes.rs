use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Requester attributes whose values are lists of group names.
pub const GROUP_FIELDS: &[&str] = &["group", "apache_group"];

/// The attribute consulted by CIDR matchers.
pub const REMOTE_IP_FIELD: &str = "remote_ip";

/// Returns `true` if the field holds a list of groups.
pub fn is_group_field(field: &str) -> bool {
    GROUP_FIELDS.contains(&field)
}

/// A single requester attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A scalar such as an email address or remote IP.
    Single(String),
    /// A list of values, used by the group-like fields.
    Many(Vec<String>),
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Single(s.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

/// The attributes describing who is making a request.
///
/// Built by the caller before evaluation and only read by the evaluator.
/// Field names are matched exactly; compiled policies store lowercase names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterAttributes {
    values: HashMap<String, AttributeValue>,
}

impl RequesterAttributes {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar attribute.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, AttributeValue::Single(value.into()));
        self
    }

    /// Set a list attribute.
    #[must_use]
    pub fn with_list<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(
            field,
            AttributeValue::Many(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// Insert or replace an attribute.
    pub fn insert(&mut self, field: impl Into<String>, value: AttributeValue) {
        self.values.insert(field.into(), value);
    }

    /// Look up an attribute.
    pub fn get(&self, field: &str) -> Option<&AttributeValue> {
        self.values.get(field)
    }

    /// Returns `true` if the attribute is present.
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Build attributes from a JSON object.
    ///
    /// String members become scalars and arrays of strings become lists.
    /// Members of any other type are ignored, as are non-string array
    /// elements. Anything but an object yields an empty set.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut attrs = Self::new();
        let Some(obj) = value.as_object() else {
            return attrs;
        };
        for (field, member) in obj {
            match member {
                serde_json::Value::String(s) => {
                    attrs.insert(field.clone(), AttributeValue::Single(s.clone()));
                }
                serde_json::Value::Array(items) => {
                    let values = items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_owned))
                        .collect();
                    attrs.insert(field.clone(), AttributeValue::Many(values));
                }
                _ => {}
            }
        }
        attrs
    }
}

impl<K, V> FromIterator<(K, V)> for RequesterAttributes
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
