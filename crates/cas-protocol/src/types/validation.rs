//! Validation results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Value of a user attribute.
///
/// Repeated attribute keys collapse into a single [`AttributeValue::Multiple`]
/// holding the values in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A single value.
    Single(String),
    /// Several values, in the order the server sent them.
    Multiple(Vec<String>),
}

impl AttributeValue {
    /// Appends a value, turning a single value into a sequence.
    pub fn push(&mut self, value: impl Into<String>) {
        let value = value.into();
        match self {
            Self::Single(existing) => {
                let first = std::mem::take(existing);
                *self = Self::Multiple(vec![first, value]);
            }
            Self::Multiple(values) => values.push(value),
        }
    }

    /// Returns every value.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Returns the first value.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(values) => values.first().map(String::as_str),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

/// Normalized outcome of a successful ticket validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The authenticated user id.
    pub user: String,

    /// User attributes, including ECAS `userDetails`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,

    /// The PGTIOU sent by the server when a `pgtUrl` was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_granting_ticket_iou: Option<String>,

    /// The proxy-granting ticket delivered to the callback for the IOU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_granting_ticket: Option<String>,

    /// Proxies the ticket went through, most recent first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proxies: Vec<String>,
}

impl ValidationResult {
    /// Creates a result for a user with no attributes.
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            attributes: BTreeMap::new(),
            proxy_granting_ticket_iou: None,
            proxy_granting_ticket: None,
            proxies: Vec::new(),
        }
    }

    /// Adds an attribute value, collapsing repeated keys into a sequence.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(name, value);
        self
    }

    /// Sets the PGTIOU.
    #[must_use]
    pub fn with_proxy_granting_ticket_iou(mut self, iou: impl Into<String>) -> Self {
        self.proxy_granting_ticket_iou = Some(iou.into());
        self
    }

    /// Sets the resolved proxy-granting ticket.
    #[must_use]
    pub fn with_proxy_granting_ticket(mut self, pgt: impl Into<String>) -> Self {
        self.proxy_granting_ticket = Some(pgt.into());
        self
    }

    /// Adds a proxy to the chain.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxies.push(proxy.into());
        self
    }

    /// Returns an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub(crate) fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        self.attributes
            .entry(name.into())
            .and_modify(|existing| existing.push(value.clone()))
            .or_insert_with(|| AttributeValue::Single(value));
    }

    pub(crate) fn add_attribute_values(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        for value in values {
            self.add_attribute(name.clone(), value);
        }
    }
}
