//! Named command parameters.

use std::fmt;

use crate::value::Value;

/// A named bound value, rendered as `@name` inside statement text.
///
/// The name is derived from the owning field and is only ever rewritten by
/// the canonicalization pass ([`QueryGroup::fix`](crate::QueryGroup::fix))
/// and the explicit isolation pass
/// ([`QueryGroup::prefix_parameters`](crate::QueryGroup::prefix_parameters)).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    name: String,
    value: Value,
}

impl Parameter {
    /// Create a parameter.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The parameter name, without the `@` marker.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Render the placeholder: `@name`.
    pub fn as_placeholder(&self) -> String {
        format!("@{}", self.name)
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn append_suffix(&mut self, index: usize) {
        self.name = format!("{}_{index}", self.name);
    }

    pub(crate) fn prepend_prefix(&mut self, prefix: &str) {
        self.name = format!("{prefix}{}", self.name);
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}
