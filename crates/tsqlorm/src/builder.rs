//! The SQL text accumulator.
//!
//! [`QueryBuilder`] is an append-only token buffer: every [`push`]
//! prepends a single separating space, and [`get_string`] drops the one
//! synthetic leading space. There is no other state, so one builder can be
//! [`clear`]ed and reused across statement compositions.
//!
//! Keyword methods exist for every token the statement builders emit; the
//! `*_from` composite helpers append nothing when their argument is absent
//! or empty, uniformly.
//!
//! [`push`]: QueryBuilder::push
//! [`get_string`]: QueryBuilder::get_string
//! [`clear`]: QueryBuilder::clear

use crate::field::{Field, OrderField};
use crate::query::QueryGroup;

/// An incremental, space-separated SQL text assembler.
#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    buffer: String,
}

impl QueryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the buffer for reuse.
    pub fn clear(&mut self) -> &mut Self {
        self.buffer.clear();
        self
    }

    /// The accumulated statement text, without the synthetic leading space.
    pub fn get_string(&self) -> &str {
        self.buffer.strip_prefix(' ').unwrap_or(&self.buffer)
    }

    /// Append one token, preceded by a single space. Empty tokens are
    /// dropped.
    pub fn push(&mut self, token: &str) -> &mut Self {
        if !token.is_empty() {
            self.buffer.push(' ');
            self.buffer.push_str(token);
        }
        self
    }

    // ==================== Keywords ====================

    /// `SELECT`
    pub fn select(&mut self) -> &mut Self {
        self.push("SELECT")
    }

    /// `INSERT`
    pub fn insert(&mut self) -> &mut Self {
        self.push("INSERT")
    }

    /// `INTO`
    pub fn into(&mut self) -> &mut Self {
        self.push("INTO")
    }

    /// `VALUES`
    pub fn values(&mut self) -> &mut Self {
        self.push("VALUES")
    }

    /// `UPDATE`
    pub fn update(&mut self) -> &mut Self {
        self.push("UPDATE")
    }

    /// `SET`
    pub fn set(&mut self) -> &mut Self {
        self.push("SET")
    }

    /// `DELETE`
    pub fn delete(&mut self) -> &mut Self {
        self.push("DELETE")
    }

    /// `FROM`
    pub fn from(&mut self) -> &mut Self {
        self.push("FROM")
    }

    /// `MERGE`
    pub fn merge(&mut self) -> &mut Self {
        self.push("MERGE")
    }

    /// `USING`
    pub fn using(&mut self) -> &mut Self {
        self.push("USING")
    }

    /// `ON`
    pub fn on(&mut self) -> &mut Self {
        self.push("ON")
    }

    /// `WITH`
    pub fn with(&mut self) -> &mut Self {
        self.push("WITH")
    }

    /// `AS <alias>` (unbracketed, for table aliases)
    pub fn as_alias(&mut self, alias: &str) -> &mut Self {
        self.push("AS").push(alias)
    }

    /// `AS [<field>]` (bracketed, for result columns)
    pub fn as_field(&mut self, name: &str) -> &mut Self {
        self.push("AS").push(&format!("[{name}]"))
    }

    /// `WHEN MATCHED THEN`
    pub fn when_matched(&mut self) -> &mut Self {
        self.push("WHEN MATCHED THEN")
    }

    /// `WHEN NOT MATCHED THEN`
    pub fn when_not_matched(&mut self) -> &mut Self {
        self.push("WHEN NOT MATCHED THEN")
    }

    /// `TRUNCATE TABLE`
    pub fn truncate_table(&mut self) -> &mut Self {
        self.push("TRUNCATE TABLE")
    }

    /// `SCOPE_IDENTITY()`
    pub fn scope_identity(&mut self) -> &mut Self {
        self.push("SCOPE_IDENTITY()")
    }

    /// `COUNT_BIG (1)`
    pub fn count_big(&mut self) -> &mut Self {
        self.push("COUNT_BIG (1)")
    }

    /// `(`
    pub fn open_paren(&mut self) -> &mut Self {
        self.push("(")
    }

    /// `)`
    pub fn close_paren(&mut self) -> &mut Self {
        self.push(")")
    }

    /// `;`
    pub fn end(&mut self) -> &mut Self {
        self.push(";")
    }

    /// A bracketed table or column name.
    pub fn table(&mut self, field: &Field) -> &mut Self {
        self.push(&field.as_sql())
    }

    // ==================== Composite emitters ====================

    /// `TOP (n)`, or nothing when absent.
    pub fn top_from(&mut self, top: Option<usize>) -> &mut Self {
        match top {
            Some(n) => self.push(&format!("TOP ({n})")),
            None => self,
        }
    }

    /// `WHERE <group>`, or nothing when the group is absent or empty.
    pub fn where_from(&mut self, group: Option<&QueryGroup>) -> &mut Self {
        match group {
            Some(g) if !g.is_empty() => self.push("WHERE").push(&g.get_string()),
            _ => self,
        }
    }

    /// `ORDER BY [F] ASC, ...`, or nothing when absent or empty.
    pub fn order_by_from(&mut self, order: Option<&[OrderField]>) -> &mut Self {
        match order {
            Some(fields) if !fields.is_empty() => {
                let list: Vec<String> = fields.iter().map(OrderField::as_sql).collect();
                self.push("ORDER BY").push(&list.join(", "))
            }
            _ => self,
        }
    }

    /// `[A], [B], ...`
    pub fn fields_from(&mut self, fields: &[&Field]) -> &mut Self {
        if fields.is_empty() {
            return self;
        }
        let list: Vec<String> = fields.iter().map(|f| f.as_sql()).collect();
        self.push(&list.join(", "))
    }

    /// `@A, @B, ...`
    pub fn parameters_from(&mut self, fields: &[&Field]) -> &mut Self {
        if fields.is_empty() {
            return self;
        }
        let list: Vec<String> = fields
            .iter()
            .map(|f| format!("@{}", f.short_name()))
            .collect();
        self.push(&list.join(", "))
    }

    /// `[A] = @A, [B] = @B, ...`
    pub fn fields_and_parameters_from(&mut self, fields: &[&Field]) -> &mut Self {
        if fields.is_empty() {
            return self;
        }
        let list: Vec<String> = fields
            .iter()
            .map(|f| format!("{} = @{}", f.as_sql(), f.short_name()))
            .collect();
        self.push(&list.join(", "))
    }

    /// `@A AS [A], @B AS [B], ...` (the USING source of a MERGE)
    pub fn parameters_as_fields_from(&mut self, fields: &[&Field]) -> &mut Self {
        if fields.is_empty() {
            return self;
        }
        let list: Vec<String> = fields
            .iter()
            .map(|f| format!("@{} AS {}", f.short_name(), f.as_sql()))
            .collect();
        self.push(&list.join(", "))
    }

    /// `S.[A], S.[B], ...`
    pub fn aliased_fields_from(&mut self, alias: &str, fields: &[&Field]) -> &mut Self {
        if fields.is_empty() {
            return self;
        }
        let list: Vec<String> = fields
            .iter()
            .map(|f| format!("{alias}.{}", f.as_sql()))
            .collect();
        self.push(&list.join(", "))
    }

    /// `[A] = S.[A], [B] = S.[B], ...`
    pub fn fields_and_aliased_fields_from(&mut self, fields: &[&Field], alias: &str) -> &mut Self {
        if fields.is_empty() {
            return self;
        }
        let list: Vec<String> = fields
            .iter()
            .map(|f| format!("{} = {alias}.{}", f.as_sql(), f.as_sql()))
            .collect();
        self.push(&list.join(", "))
    }
}

impl std::fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.get_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Conjunction;
    use crate::query::QueryField;

    #[test]
    fn tokens_are_space_separated() {
        let mut qb = QueryBuilder::new();
        qb.select().push("*").from().push("[Customer]").end();
        assert_eq!(qb.get_string(), "SELECT * FROM [Customer] ;");
    }

    #[test]
    fn clear_resets_for_reuse() {
        let mut qb = QueryBuilder::new();
        qb.select().push("1");
        qb.clear();
        qb.delete().from().push("[T]");
        assert_eq!(qb.get_string(), "DELETE FROM [T]");
    }

    #[test]
    fn empty_builder_renders_empty() {
        let qb = QueryBuilder::new();
        assert_eq!(qb.get_string(), "");
    }

    #[test]
    fn conditional_helpers_append_nothing_when_absent() {
        let mut qb = QueryBuilder::new();
        qb.select()
            .top_from(None)
            .push("*")
            .where_from(None)
            .order_by_from(None);
        assert_eq!(qb.get_string(), "SELECT *");

        let empty = QueryGroup::new(Conjunction::And);
        let mut qb = QueryBuilder::new();
        qb.where_from(Some(&empty)).order_by_from(Some(&[]));
        assert_eq!(qb.get_string(), "");
    }

    #[test]
    fn top_and_order_render() {
        let order = vec![
            OrderField::ascending("Id").unwrap(),
            OrderField::descending("Name").unwrap(),
        ];
        let mut qb = QueryBuilder::new();
        qb.top_from(Some(10)).order_by_from(Some(&order));
        assert_eq!(qb.get_string(), "TOP (10) ORDER BY [Id] ASC, [Name] DESC");
    }

    #[test]
    fn where_from_renders_group() {
        let mut group = QueryGroup::with_fields(
            Conjunction::And,
            vec![QueryField::eq("Id", 1).unwrap()],
        );
        group.fix();
        let mut qb = QueryBuilder::new();
        qb.where_from(Some(&group));
        assert_eq!(qb.get_string(), "WHERE ([Id] = @Id)");
    }

    #[test]
    fn field_list_emitters() {
        let id = Field::parse("Id").unwrap();
        let name = Field::parse("Name").unwrap();
        let fields = [&id, &name];

        let mut qb = QueryBuilder::new();
        qb.fields_from(&fields);
        assert_eq!(qb.get_string(), "[Id], [Name]");

        qb.clear().parameters_from(&fields);
        assert_eq!(qb.get_string(), "@Id, @Name");

        qb.clear().fields_and_parameters_from(&fields);
        assert_eq!(qb.get_string(), "[Id] = @Id, [Name] = @Name");

        qb.clear().parameters_as_fields_from(&fields);
        assert_eq!(qb.get_string(), "@Id AS [Id], @Name AS [Name]");

        qb.clear().aliased_fields_from("S", &fields);
        assert_eq!(qb.get_string(), "S.[Id], S.[Name]");

        qb.clear().fields_and_aliased_fields_from(&fields, "S");
        assert_eq!(qb.get_string(), "[Id] = S.[Id], [Name] = S.[Name]");
    }
}
