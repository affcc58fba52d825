//! Boolean expression trees over query fields.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::error::{BuildError, BuildResult};
use crate::operation::{Conjunction, Operation};
use crate::parameter::Parameter;
use crate::predicate::{Comparison, Predicate};
use crate::query::field::QueryField;
use crate::value::Value;

/// A boolean (AND/OR/NOT) tree of [`QueryField`]s and nested groups.
///
/// Groups are constructed directly, lowered from a [`Predicate`], or parsed
/// from a JSON descriptor. Before the execution layer binds parameters the
/// tree must be canonicalized with [`fix`](Self::fix), which disambiguates
/// parameter names across the whole tree.
///
/// # Example
/// ```ignore
/// use tsqlorm::{Conjunction, QueryField, QueryGroup};
///
/// let mut group = QueryGroup::with_fields(
///     Conjunction::And,
///     vec![QueryField::gt("Age", 10)?, QueryField::lt("Age", 20)?],
/// );
/// group.fix();
/// assert_eq!(group.get_string(), "([Age] > @Age AND [Age] < @Age_1)");
/// # Ok::<(), tsqlorm::BuildError>(())
/// ```
#[derive(Debug, Clone)]
pub struct QueryGroup {
    conjunction: Conjunction,
    fields: Vec<QueryField>,
    groups: Vec<QueryGroup>,
    is_not: bool,
    fixed: bool,
}

impl QueryGroup {
    /// Create an empty group with the given conjunction.
    pub fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            fields: Vec::new(),
            groups: Vec::new(),
            is_not: false,
            fixed: false,
        }
    }

    /// Create a group holding the given fields.
    pub fn with_fields(conjunction: Conjunction, fields: Vec<QueryField>) -> Self {
        Self {
            conjunction,
            fields,
            groups: Vec::new(),
            is_not: false,
            fixed: false,
        }
    }

    /// Mark this group negated: it renders as `NOT (...)`.
    pub fn negated(mut self) -> Self {
        self.is_not = true;
        self
    }

    /// Append a field comparison.
    pub fn add_field(&mut self, field: QueryField) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Append a nested group.
    pub fn add_group(&mut self, group: QueryGroup) -> &mut Self {
        self.groups.push(group);
        self
    }

    // ==================== Accessors ====================

    /// The connective joining this group's members.
    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    /// Whether this group is negated.
    pub fn is_not(&self) -> bool {
        self.is_not
    }

    /// The direct field members, in insertion order.
    pub fn fields(&self) -> &[QueryField] {
        &self.fields
    }

    /// The nested groups, in insertion order.
    pub fn groups(&self) -> &[QueryGroup] {
        &self.groups
    }

    /// Whether the group holds no comparisons anywhere in its tree.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.groups.iter().all(QueryGroup::is_empty)
    }

    /// All field comparisons in the tree, depth-first (own fields first,
    /// then nested groups).
    pub fn query_fields(&self) -> Vec<&QueryField> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a QueryField>) {
        out.extend(self.fields.iter());
        for group in &self.groups {
            group.collect_fields(out);
        }
    }

    /// The bindable `(name, value)` pairs for the whole tree.
    ///
    /// Call [`fix`](Self::fix) first so the names are unique.
    pub fn parameters(&self) -> Vec<Parameter> {
        self.query_fields()
            .into_iter()
            .flat_map(QueryField::parameters)
            .collect()
    }

    // ==================== Canonicalization ====================

    /// Disambiguate parameter names across the whole tree.
    ///
    /// When several comparisons reference the same column (matched
    /// case-insensitively), every occurrence after the first gets a
    /// positional `_{n}` suffix. Idempotent: a second call is a no-op until
    /// [`reset`](Self::reset).
    pub fn fix(&mut self) -> &mut Self {
        if self.fixed {
            return self;
        }
        let mut counts: HashMap<String, usize> = HashMap::new();
        self.fix_leaves(&mut counts);
        self
    }

    fn fix_leaves(&mut self, counts: &mut HashMap<String, usize>) {
        for field in &mut self.fields {
            let key = field.field().name().to_ascii_lowercase();
            let seen = counts.entry(key).or_insert(0);
            if *seen > 0 {
                field.append_parameter_suffix(*seen);
            }
            *seen += 1;
        }
        for group in &mut self.groups {
            group.fix_leaves(counts);
        }
        // Latch the whole subtree so a nested group cannot be re-fixed on
        // its own.
        self.fixed = true;
    }

    /// Restore every parameter to its field-derived name and clear the
    /// fix latch, so the group can be canonicalized again.
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.reset_parameter();
        }
        for group in &mut self.groups {
            group.reset();
        }
        self.fixed = false;
    }

    /// Prepend a marker to every parameter name in the tree.
    ///
    /// This is the isolation pass for statements whose SET list and WHERE
    /// clause would otherwise bind clashing names (see
    /// [`StatementBuilder::create_update`](crate::StatementBuilder::create_update)).
    pub fn prefix_parameters(&mut self, prefix: &str) -> &mut Self {
        for field in &mut self.fields {
            field.prepend_parameter_prefix(prefix);
        }
        for group in &mut self.groups {
            group.prefix_parameters(prefix);
        }
        self
    }

    // ==================== Rendering ====================

    /// Render the tree as a parenthesized boolean expression.
    ///
    /// Fields render first (insertion order), then nested groups, joined by
    /// the conjunction. An empty group renders as the tautology `(1 = 1)`.
    pub fn get_string(&self) -> String {
        let mut parts: Vec<String> = self
            .fields
            .iter()
            .map(QueryField::as_field_and_parameter)
            .collect();
        parts.extend(self.groups.iter().map(QueryGroup::get_string));

        let body = if parts.is_empty() {
            "1 = 1".to_string()
        } else {
            parts.join(&format!(" {} ", self.conjunction.as_sql()))
        };

        if self.is_not {
            format!("NOT ({body})")
        } else {
            format!("({body})")
        }
    }

    // ==================== Parsing ====================

    /// Lower a [`Predicate`] into a canonicalized group.
    ///
    /// Negation propagates onto comparison leaves (flipping the operator)
    /// and marks conjunction groups as `NOT (...)`. Boolean literals fold
    /// algebraically; a predicate that reduces to a constant overall is
    /// rejected, since a constant filter is almost certainly a bug in the
    /// caller.
    pub fn parse(predicate: &Predicate) -> BuildResult<QueryGroup> {
        match lower(predicate, false)? {
            Lowered::Group(mut group) => {
                group.fix();
                Ok(group)
            }
            Lowered::Constant(value) => Err(BuildError::unsupported(format!(
                "Predicate reduces to the constant '{value}'"
            ))),
        }
    }

    /// Parse a flat JSON criteria object into a canonicalized group.
    ///
    /// Each key is a field name; each value is either a scalar (equality) or
    /// an operation descriptor handled by
    /// [`QueryField::from_json`]. An empty object yields the empty,
    /// always-true group.
    ///
    /// ```ignore
    /// QueryGroup::from_json(&serde_json::json!({
    ///     "Name": "Bob",
    ///     "Age": {"operation": "greater_than", "value": 18},
    /// }))?;
    /// ```
    pub fn from_json(criteria: &serde_json::Value) -> BuildResult<QueryGroup> {
        match criteria {
            serde_json::Value::Null => Err(BuildError::NullArgument("criteria")),
            serde_json::Value::Object(members) => {
                let mut group = QueryGroup::new(Conjunction::And);
                for (name, descriptor) in members {
                    group.add_field(QueryField::from_json(name, descriptor)?);
                }
                group.fix();
                Ok(group)
            }
            other => Err(BuildError::invalid(format!(
                "Criteria must be a JSON object, got {other}"
            ))),
        }
    }
}

impl PartialEq for QueryGroup {
    fn eq(&self, other: &Self) -> bool {
        // The fix latch is bookkeeping, not structure.
        self.conjunction == other.conjunction
            && self.is_not == other.is_not
            && self.fields == other.fields
            && self.groups == other.groups
    }
}

impl Eq for QueryGroup {}

impl Hash for QueryGroup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.conjunction.hash(state);
        self.is_not.hash(state);
        self.fields.hash(state);
        self.groups.hash(state);
    }
}

impl std::fmt::Display for QueryGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.get_string())
    }
}

/// The result of lowering one predicate node.
enum Lowered {
    Group(QueryGroup),
    Constant(bool),
}

fn leaf(field: QueryField) -> Lowered {
    Lowered::Group(QueryGroup::with_fields(Conjunction::And, vec![field]))
}

fn operation_for(comparison: Comparison) -> Operation {
    match comparison {
        Comparison::Equal => Operation::Equal,
        Comparison::NotEqual => Operation::NotEqual,
        Comparison::LessThan => Operation::LessThan,
        Comparison::LessThanOrEqual => Operation::LessThanOrEqual,
        Comparison::GreaterThan => Operation::GreaterThan,
        Comparison::GreaterThanOrEqual => Operation::GreaterThanOrEqual,
    }
}

fn lower(predicate: &Predicate, negated: bool) -> BuildResult<Lowered> {
    match predicate {
        Predicate::Literal(value) => Ok(Lowered::Constant(value ^ negated)),

        Predicate::Not(inner) => lower(inner, !negated),

        Predicate::Compare {
            field,
            comparison,
            value,
        } => {
            let comparison = if negated {
                comparison.negated()
            } else {
                *comparison
            };
            Ok(leaf(QueryField::new(
                field,
                operation_for(comparison),
                value.clone(),
            )?))
        }

        Predicate::Contains { field, fragment } => {
            like_leaf(field, format!("%{fragment}%"), negated)
        }
        Predicate::StartsWith { field, prefix } => like_leaf(field, format!("{prefix}%"), negated),
        Predicate::EndsWith { field, suffix } => like_leaf(field, format!("%{suffix}"), negated),

        Predicate::In { field, values } => {
            let operation = if negated {
                Operation::NotIn
            } else {
                Operation::In
            };
            Ok(leaf(QueryField::new(
                field,
                operation,
                Value::Array(values.clone()),
            )?))
        }

        Predicate::Between {
            field,
            lower,
            upper,
        } => {
            let operation = if negated {
                Operation::NotBetween
            } else {
                Operation::Between
            };
            Ok(leaf(QueryField::new(
                field,
                operation,
                Value::Array(vec![lower.clone(), upper.clone()]),
            )?))
        }

        Predicate::Any {
            field,
            comparison,
            values,
        } => fan_out(field, *comparison, values, Conjunction::Or, negated),

        Predicate::All {
            field,
            comparison,
            values,
        } => fan_out(field, *comparison, values, Conjunction::And, negated),

        Predicate::And(operands) => lower_conjunction(operands, Conjunction::And, negated),
        Predicate::Or(operands) => lower_conjunction(operands, Conjunction::Or, negated),
    }
}

fn like_leaf(field: &str, pattern: String, negated: bool) -> BuildResult<Lowered> {
    let operation = if negated {
        Operation::NotLike
    } else {
        Operation::Like
    };
    Ok(leaf(QueryField::new(field, operation, pattern)?))
}

/// Fan a comparison out over a collection: `Any` is an OR of per-element
/// comparisons, `All` an AND. Under negation both the connective and the
/// comparison flip (De Morgan).
fn fan_out(
    field: &str,
    comparison: Comparison,
    values: &[Value],
    conjunction: Conjunction,
    negated: bool,
) -> BuildResult<Lowered> {
    if values.is_empty() {
        return Err(BuildError::invalid(format!(
            "Quantifier over field '{field}' requires a non-empty collection"
        )));
    }
    let comparison = if negated {
        comparison.negated()
    } else {
        comparison
    };
    let conjunction = if negated {
        conjunction.flipped()
    } else {
        conjunction
    };
    let operation = operation_for(comparison);
    let fields = values
        .iter()
        .map(|value| QueryField::new(field, operation, value.clone()))
        .collect::<BuildResult<Vec<_>>>()?;
    Ok(Lowered::Group(QueryGroup::with_fields(conjunction, fields)))
}

fn lower_conjunction(
    operands: &[Predicate],
    conjunction: Conjunction,
    negated: bool,
) -> BuildResult<Lowered> {
    // The group carries the negation itself (`NOT (...)`), so operands lower
    // un-negated. `identity` absorbs, its complement dominates.
    let identity = matches!(conjunction, Conjunction::And);

    let mut group = QueryGroup::new(conjunction);
    group.is_not = negated;

    for operand in operands {
        match lower(operand, false)? {
            Lowered::Constant(value) if value == identity => {}
            Lowered::Constant(_) => return Ok(Lowered::Constant(!identity ^ negated)),
            Lowered::Group(sub) => {
                group.groups.push(sub);
            }
        }
    }

    if group.groups.is_empty() {
        return Ok(Lowered::Constant(identity ^ negated));
    }
    Ok(Lowered::Group(group))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age_range() -> QueryGroup {
        QueryGroup::with_fields(
            Conjunction::And,
            vec![
                QueryField::gt("Age", 10).unwrap(),
                QueryField::lt("Age", 20).unwrap(),
            ],
        )
    }

    #[test]
    fn renders_conjunction_in_order() {
        let group = QueryGroup::with_fields(
            Conjunction::Or,
            vec![
                QueryField::eq("field1", 1).unwrap(),
                QueryField::eq("field2", 2).unwrap(),
            ],
        );
        assert_eq!(
            group.get_string(),
            "([field1] = @field1 OR [field2] = @field2)"
        );
    }

    #[test]
    fn renders_negation() {
        let group = QueryGroup::with_fields(
            Conjunction::And,
            vec![QueryField::eq("Id", 1).unwrap()],
        )
        .negated();
        assert_eq!(group.get_string(), "NOT ([Id] = @Id)");
    }

    #[test]
    fn renders_empty_group_as_tautology() {
        let group = QueryGroup::new(Conjunction::And);
        assert_eq!(group.get_string(), "(1 = 1)");
        assert!(group.is_empty());
    }

    #[test]
    fn fix_disambiguates_duplicate_columns() {
        let mut group = age_range();
        group.fix();
        let names: Vec<_> = group
            .parameters()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Age", "Age_1"]);
        assert_eq!(
            group.get_string(),
            "([Age] > @Age AND [Age] < @Age_1)"
        );
    }

    #[test]
    fn fix_is_idempotent() {
        let mut group = age_range();
        group.fix();
        let first = group.get_string();
        group.fix();
        assert_eq!(group.get_string(), first);
        let names: Vec<_> = group
            .parameters()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Age", "Age_1"]);
    }

    #[test]
    fn fix_spans_nested_groups() {
        let mut group = QueryGroup::with_fields(
            Conjunction::And,
            vec![QueryField::gt("Age", 10).unwrap()],
        );
        group.add_group(QueryGroup::with_fields(
            Conjunction::Or,
            vec![
                QueryField::lt("Age", 20).unwrap(),
                QueryField::eq("age", 30).unwrap(),
            ],
        ));
        group.fix();
        let names: Vec<_> = group
            .parameters()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Age", "Age_1", "age_2"]);
    }

    #[test]
    fn reset_allows_refixing() {
        let mut group = age_range();
        group.fix();
        group.reset();
        let names: Vec<_> = group
            .parameters()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Age", "Age"]);
        group.fix();
        let names: Vec<_> = group
            .parameters()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Age", "Age_1"]);
    }

    #[test]
    fn prefix_parameters_marks_every_leaf() {
        let mut group = age_range();
        group.fix();
        group.prefix_parameters("_");
        assert_eq!(
            group.get_string(),
            "([Age] > @_Age AND [Age] < @_Age_1)"
        );
    }

    #[test]
    fn structural_equality_ignores_fix_latch() {
        let a = QueryGroup::with_fields(
            Conjunction::And,
            vec![QueryField::eq("Id", 1).unwrap()],
        );
        let mut b = a.clone();
        b.fix();
        // no duplicate columns, so fixing only flips the latch
        assert_eq!(a, b);

        let c = age_range();
        let mut d = age_range();
        d.fix();
        // here fixing rewrites a parameter name, which is structural
        assert_ne!(c, d);
        d.reset();
        assert_eq!(c, d);
    }

    #[test]
    fn hash_is_order_sensitive() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let forwards = age_range();
        let backwards = QueryGroup::with_fields(
            Conjunction::And,
            vec![
                QueryField::lt("Age", 20).unwrap(),
                QueryField::gt("Age", 10).unwrap(),
            ],
        );

        let mut h1 = DefaultHasher::new();
        forwards.hash(&mut h1);
        let mut h2 = DefaultHasher::new();
        backwards.hash(&mut h2);
        assert_ne!(h1.finish(), h2.finish());
    }
}
