//! Single column-operator-value comparison leaves.

use crate::error::{BuildError, BuildResult};
use crate::field::Field;
use crate::operation::Operation;
use crate::parameter::Parameter;
use crate::value::Value;

/// One column-operator-value comparison.
///
/// A `QueryField` owns exactly one [`Field`], one [`Operation`] and one
/// [`Parameter`]. Operand shape is validated at construction: range
/// operations require a two-element array of same-typed scalars, set
/// operations a non-empty array of same-typed scalars, and every other
/// operation a non-collection value (`NULL` only for equality).
///
/// # Example
/// ```ignore
/// use tsqlorm::QueryField;
///
/// let qf = QueryField::gt("Age", 18)?;
/// assert_eq!(qf.as_field_and_parameter(), "[Age] > @Age");
/// # Ok::<(), tsqlorm::BuildError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryField {
    field: Field,
    operation: Operation,
    parameter: Parameter,
}

impl QueryField {
    /// Create a query field, validating the operand shape for the operation.
    pub fn new(name: &str, operation: Operation, value: impl Into<Value>) -> BuildResult<Self> {
        let field = Field::parse(name)?;
        let value = value.into();
        validate_operand(&field, operation, &value)?;
        let parameter = Parameter::new(field.short_name(), value);
        Ok(Self {
            field,
            operation,
            parameter,
        })
    }

    // ==================== Convenience constructors ====================

    /// column = value
    pub fn eq(name: &str, value: impl Into<Value>) -> BuildResult<Self> {
        Self::new(name, Operation::Equal, value)
    }

    /// column <> value
    pub fn ne(name: &str, value: impl Into<Value>) -> BuildResult<Self> {
        Self::new(name, Operation::NotEqual, value)
    }

    /// column > value
    pub fn gt(name: &str, value: impl Into<Value>) -> BuildResult<Self> {
        Self::new(name, Operation::GreaterThan, value)
    }

    /// column >= value
    pub fn gte(name: &str, value: impl Into<Value>) -> BuildResult<Self> {
        Self::new(name, Operation::GreaterThanOrEqual, value)
    }

    /// column < value
    pub fn lt(name: &str, value: impl Into<Value>) -> BuildResult<Self> {
        Self::new(name, Operation::LessThan, value)
    }

    /// column <= value
    pub fn lte(name: &str, value: impl Into<Value>) -> BuildResult<Self> {
        Self::new(name, Operation::LessThanOrEqual, value)
    }

    /// column LIKE pattern
    pub fn like(name: &str, pattern: impl Into<Value>) -> BuildResult<Self> {
        Self::new(name, Operation::Like, pattern)
    }

    /// column NOT LIKE pattern
    pub fn not_like(name: &str, pattern: impl Into<Value>) -> BuildResult<Self> {
        Self::new(name, Operation::NotLike, pattern)
    }

    /// column IS NULL
    pub fn is_null(name: &str) -> BuildResult<Self> {
        Self::new(name, Operation::Equal, Value::Null)
    }

    /// column IS NOT NULL
    pub fn is_not_null(name: &str) -> BuildResult<Self> {
        Self::new(name, Operation::NotEqual, Value::Null)
    }

    /// column IN (values...)
    pub fn in_list<T: Into<Value>>(name: &str, values: Vec<T>) -> BuildResult<Self> {
        Self::new(name, Operation::In, Value::array(values))
    }

    /// column NOT IN (values...)
    pub fn not_in<T: Into<Value>>(name: &str, values: Vec<T>) -> BuildResult<Self> {
        Self::new(name, Operation::NotIn, Value::array(values))
    }

    /// column BETWEEN from AND to
    pub fn between(name: &str, from: impl Into<Value>, to: impl Into<Value>) -> BuildResult<Self> {
        Self::new(
            name,
            Operation::Between,
            Value::Array(vec![from.into(), to.into()]),
        )
    }

    /// column NOT BETWEEN from AND to
    pub fn not_between(
        name: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> BuildResult<Self> {
        Self::new(
            name,
            Operation::NotBetween,
            Value::Array(vec![from.into(), to.into()]),
        )
    }

    /// Parse a field from a JSON descriptor.
    ///
    /// A scalar descriptor maps to an equality; an object descriptor must
    /// carry exactly the members `operation` and `value`:
    ///
    /// ```ignore
    /// QueryField::from_json("Age", &serde_json::json!({
    ///     "operation": "greater_than",
    ///     "value": 18,
    /// }))?;
    /// ```
    pub fn from_json(name: &str, descriptor: &serde_json::Value) -> BuildResult<Self> {
        match descriptor {
            serde_json::Value::Null => Err(BuildError::NullArgument("descriptor")),
            serde_json::Value::Object(members) => {
                let operation = members.get("operation").ok_or_else(|| {
                    BuildError::invalid(format!(
                        "Descriptor for field '{name}' is missing the 'operation' member"
                    ))
                })?;
                let operation: Operation =
                    serde_json::from_value(operation.clone()).map_err(|_| {
                        BuildError::invalid(format!(
                            "Descriptor for field '{name}' has an unrecognized operation"
                        ))
                    })?;
                let value = members.get("value").ok_or_else(|| {
                    BuildError::invalid(format!(
                        "Descriptor for field '{name}' is missing the 'value' member"
                    ))
                })?;
                if let Some(unknown) = members.keys().find(|k| *k != "operation" && *k != "value") {
                    return Err(BuildError::invalid(format!(
                        "Descriptor for field '{name}' has an unexpected member '{unknown}'"
                    )));
                }
                Self::new(name, operation, Value::from_json(value)?)
            }
            serde_json::Value::Array(_) => Err(BuildError::invalid(format!(
                "Field '{name}' binds a collection without a set operation"
            ))),
            scalar => Self::new(name, Operation::Equal, Value::from_json(scalar)?),
        }
    }

    // ==================== Accessors ====================

    /// The column this comparison applies to.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// The comparison operation.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The bound parameter.
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    // ==================== Rendering ====================

    /// Render this comparison for embedding in a statement.
    ///
    /// Pure projection; does not change any state.
    pub fn as_field_and_parameter(&self) -> String {
        let field = self.field.as_sql();
        match self.operation {
            Operation::Equal if self.parameter.value().is_null() => {
                format!("{field} IS NULL")
            }
            Operation::NotEqual if self.parameter.value().is_null() => {
                format!("{field} IS NOT NULL")
            }
            Operation::Between | Operation::NotBetween => {
                format!(
                    "{field} {} @{name}_Left AND @{name}_Right",
                    self.operation.as_sql(),
                    name = self.parameter.name()
                )
            }
            Operation::In | Operation::NotIn => {
                let len = match self.parameter.value() {
                    Value::Array(items) => items.len(),
                    _ => 0,
                };
                let placeholders: Vec<String> = (0..len)
                    .map(|i| format!("@{}_In_{i}", self.parameter.name()))
                    .collect();
                format!(
                    "{field} {} ({})",
                    self.operation.as_sql(),
                    placeholders.join(", ")
                )
            }
            op => format!("{field} {} @{}", op.as_sql(), self.parameter.name()),
        }
    }

    /// The bindable `(name, value)` pairs for this comparison.
    ///
    /// Range and set operands are expanded to match the placeholders emitted
    /// by [`as_field_and_parameter`](Self::as_field_and_parameter); null
    /// equality binds nothing.
    pub fn parameters(&self) -> Vec<Parameter> {
        let name = self.parameter.name();
        match (self.operation, self.parameter.value()) {
            (Operation::Equal | Operation::NotEqual, Value::Null) => Vec::new(),
            (Operation::Between | Operation::NotBetween, Value::Array(items)) => vec![
                Parameter::new(format!("{name}_Left"), items[0].clone()),
                Parameter::new(format!("{name}_Right"), items[1].clone()),
            ],
            (Operation::In | Operation::NotIn, Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| Parameter::new(format!("{name}_In_{i}"), v.clone()))
                .collect(),
            (_, value) => vec![Parameter::new(name, value.clone())],
        }
    }

    // ==================== Canonicalization hooks ====================

    pub(crate) fn append_parameter_suffix(&mut self, index: usize) {
        self.parameter.append_suffix(index);
    }

    pub(crate) fn prepend_parameter_prefix(&mut self, prefix: &str) {
        self.parameter.prepend_prefix(prefix);
    }

    pub(crate) fn reset_parameter(&mut self) {
        self.parameter
            .set_name(self.field.short_name().to_string());
    }
}

impl std::fmt::Display for QueryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_field_and_parameter())
    }
}

/// Enforce the operand-shape invariants for an operation.
fn validate_operand(field: &Field, operation: Operation, value: &Value) -> BuildResult<()> {
    if operation.is_range() {
        let items = expect_array(field, operation, value)?;
        if items.len() != 2 {
            return Err(BuildError::invalid(format!(
                "{} on {} requires exactly 2 values, got {}",
                operation.as_sql(),
                field.name(),
                items.len()
            )));
        }
        return check_elements(field, operation, items);
    }

    if operation.is_set() {
        let items = expect_array(field, operation, value)?;
        if items.is_empty() {
            return Err(BuildError::invalid(format!(
                "{} on {} requires at least one value",
                operation.as_sql(),
                field.name()
            )));
        }
        return check_elements(field, operation, items);
    }

    if value.is_array() {
        return Err(BuildError::invalid(format!(
            "{} on {} must not bind a collection value",
            operation.as_sql(),
            field.name()
        )));
    }
    if value.is_null() && !matches!(operation, Operation::Equal | Operation::NotEqual) {
        return Err(BuildError::invalid(format!(
            "{} on {} must not bind NULL",
            operation.as_sql(),
            field.name()
        )));
    }
    Ok(())
}

fn expect_array<'a>(
    field: &Field,
    operation: Operation,
    value: &'a Value,
) -> BuildResult<&'a [Value]> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(BuildError::invalid(format!(
            "{} on {} requires an array value",
            operation.as_sql(),
            field.name()
        ))),
    }
}

fn check_elements(field: &Field, operation: Operation, items: &[Value]) -> BuildResult<()> {
    let first = items[0].kind();
    for item in items {
        if item.is_null() {
            return Err(BuildError::invalid(format!(
                "{} on {} must not contain NULL elements",
                operation.as_sql(),
                field.name()
            )));
        }
        if item.is_array() {
            return Err(BuildError::invalid(format!(
                "{} on {} must not contain nested collections",
                operation.as_sql(),
                field.name()
            )));
        }
        if item.kind() != first {
            return Err(BuildError::invalid(format!(
                "{} on {} requires identically-typed elements",
                operation.as_sql(),
                field.name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_scalar_comparison() {
        let qf = QueryField::eq("Name", "Bob").unwrap();
        assert_eq!(qf.as_field_and_parameter(), "[Name] = @Name");

        let qf = QueryField::ne("Name", "Bob").unwrap();
        assert_eq!(qf.as_field_and_parameter(), "[Name] <> @Name");
    }

    #[test]
    fn renders_null_equality() {
        let qf = QueryField::is_null("DeletedAt").unwrap();
        assert_eq!(qf.as_field_and_parameter(), "[DeletedAt] IS NULL");
        assert!(qf.parameters().is_empty());

        let qf = QueryField::is_not_null("DeletedAt").unwrap();
        assert_eq!(qf.as_field_and_parameter(), "[DeletedAt] IS NOT NULL");
    }

    #[test]
    fn renders_between() {
        let qf = QueryField::between("Age", 1, 2).unwrap();
        assert_eq!(
            qf.as_field_and_parameter(),
            "[Age] BETWEEN @Age_Left AND @Age_Right"
        );
        let params = qf.parameters();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name(), "Age_Left");
        assert_eq!(params[0].value(), &Value::Int(1));
        assert_eq!(params[1].name(), "Age_Right");
    }

    #[test]
    fn renders_in_list() {
        let qf = QueryField::in_list("Id", vec![1, 2, 3]).unwrap();
        assert_eq!(
            qf.as_field_and_parameter(),
            "[Id] IN (@Id_In_0, @Id_In_1, @Id_In_2)"
        );
        let params = qf.parameters();
        assert_eq!(params.len(), 3);
        assert_eq!(params[2].name(), "Id_In_2");
    }

    #[test]
    fn between_shape_contract() {
        assert!(QueryField::between("Age", 1, 2).is_ok());
        // mixed types
        assert!(QueryField::new("Age", Operation::Between, Value::array([Value::Int(1), Value::from("a")])).is_err());
        // wrong arity
        assert!(QueryField::new("Age", Operation::Between, Value::array([1])).is_err());
        assert!(QueryField::new("Age", Operation::Between, Value::array([1, 2, 3])).is_err());
        // not an array at all
        assert!(QueryField::new("Age", Operation::Between, 1).is_err());
    }

    #[test]
    fn in_shape_contract() {
        assert!(QueryField::in_list("Id", vec![1, 2, 3]).is_ok());
        // mixed types
        assert!(QueryField::new("Id", Operation::In, Value::array([Value::from("a"), Value::Int(1)])).is_err());
        // empty
        assert!(QueryField::in_list::<i32>("Id", vec![]).is_err());
        // null value instead of an array
        assert!(QueryField::new("Id", Operation::In, Value::Null).is_err());
        // null element
        assert!(QueryField::new("Id", Operation::In, Value::array([Value::Int(1), Value::Null])).is_err());
        // nested collection
        assert!(QueryField::new("Id", Operation::In, Value::array([Value::array([1])])).is_err());
    }

    #[test]
    fn scalar_operations_reject_collections_and_null() {
        assert!(QueryField::new("Age", Operation::GreaterThan, Value::array([1, 2])).is_err());
        assert!(QueryField::new("Age", Operation::GreaterThan, Value::Null).is_err());
        assert!(QueryField::new("Name", Operation::Like, Value::Null).is_err());
    }

    #[test]
    fn from_json_scalar_defaults_to_equal() {
        let qf = QueryField::from_json("Name", &serde_json::json!("Bob")).unwrap();
        assert_eq!(qf.operation(), Operation::Equal);
        assert_eq!(qf.as_field_and_parameter(), "[Name] = @Name");
    }

    #[test]
    fn from_json_descriptor() {
        let qf = QueryField::from_json(
            "Age",
            &serde_json::json!({"operation": "greater_than", "value": 18}),
        )
        .unwrap();
        assert_eq!(qf.operation(), Operation::GreaterThan);
        assert_eq!(qf.parameter().value(), &Value::Int(18));
    }

    #[test]
    fn from_json_descriptor_failures() {
        // missing members
        assert!(QueryField::from_json("Age", &serde_json::json!({"value": 18})).is_err());
        assert!(
            QueryField::from_json("Age", &serde_json::json!({"operation": "equal"})).is_err()
        );
        // unknown operation tag
        assert!(QueryField::from_json(
            "Age",
            &serde_json::json!({"operation": "gt", "value": 18})
        )
        .is_err());
        // stray member
        assert!(QueryField::from_json(
            "Age",
            &serde_json::json!({"operation": "equal", "value": 18, "extra": 1})
        )
        .is_err());
        // bare collection without a set operation
        assert!(QueryField::from_json("Id", &serde_json::json!([1, 2])).is_err());
        // a null descriptor is a missing argument, not an IS NULL filter
        assert!(matches!(
            QueryField::from_json("Age", &serde_json::Value::Null),
            Err(crate::error::BuildError::NullArgument(_))
        ));
        // null equality spells it out through a descriptor
        let qf = QueryField::from_json(
            "DeletedAt",
            &serde_json::json!({"operation": "equal", "value": null}),
        )
        .unwrap();
        assert_eq!(qf.as_field_and_parameter(), "[DeletedAt] IS NULL");
    }

    #[test]
    fn dotted_field_parameter_uses_short_name() {
        let qf = QueryField::eq("c.Age", 18).unwrap();
        assert_eq!(qf.as_field_and_parameter(), "[c].[Age] = @Age");
        assert_eq!(qf.parameter().name(), "Age");
    }
}
