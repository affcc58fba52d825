//! The SQL Server statement builder.

use tracing::trace;

use crate::builder::QueryBuilder;
use crate::error::{BuildError, BuildResult};
use crate::field::{Field, OrderField};
use crate::mapping::{Command, EntityMapping};
use crate::query::QueryGroup;
use crate::statement::StatementBuilder;

/// Statement composition for the T-SQL dialect: bracketed identifiers,
/// `TOP`, `SCOPE_IDENTITY()`, `MERGE`, and `ROW_NUMBER()` pagination.
#[derive(Debug, Default, Clone, Copy)]
pub struct TsqlStatementBuilder;

impl TsqlStatementBuilder {
    /// Create a statement builder.
    pub fn new() -> Self {
        Self
    }
}

impl StatementBuilder for TsqlStatementBuilder {
    fn create_query(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        where_group: Option<&QueryGroup>,
        order_by: Option<&[OrderField]>,
        top: Option<usize>,
    ) -> BuildResult<String> {
        builder.clear();
        let fields = mapping.fields_for(Command::Query);
        if fields.is_empty() {
            return Err(no_fields(mapping, "queryable"));
        }
        if let Some(order) = order_by {
            validate_order(mapping, order, Command::Query)?;
        }

        builder
            .select()
            .top_from(top)
            .fields_from(&fields)
            .from()
            .table(mapping.table())
            .where_from(where_group)
            .order_by_from(order_by)
            .end();
        Ok(finish("query", mapping, builder))
    }

    fn create_batch_query(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        where_group: Option<&QueryGroup>,
        order_by: &[OrderField],
        page: usize,
        rows_per_batch: usize,
    ) -> BuildResult<String> {
        builder.clear();
        let fields = mapping.fields_for(Command::BatchQuery);
        if fields.is_empty() {
            return Err(no_fields(mapping, "batch-queryable"));
        }
        if order_by.is_empty() {
            return Err(BuildError::invalid(
                "Batch query requires at least one order field",
            ));
        }
        if rows_per_batch == 0 {
            return Err(BuildError::invalid("Rows per batch must be positive"));
        }
        validate_order(mapping, order_by, Command::BatchQuery)?;

        let order_list: Vec<String> = order_by.iter().map(OrderField::as_sql).collect();
        let order_list = order_list.join(", ");
        let start = page * rows_per_batch + 1;
        let end = (page + 1) * rows_per_batch;

        builder
            .with()
            .push("CTE")
            .push("AS")
            .open_paren()
            .select()
            .push(&format!(
                "ROW_NUMBER() OVER ( ORDER BY {order_list} ) AS [RowNumber],"
            ))
            .fields_from(&fields)
            .from()
            .table(mapping.table())
            .where_from(where_group)
            .close_paren()
            .select()
            .fields_from(&fields)
            .from()
            .push("CTE")
            .push(&format!("WHERE ([RowNumber] BETWEEN {start} AND {end})"))
            .order_by_from(Some(order_by))
            .end();
        Ok(finish("batch_query", mapping, builder))
    }

    fn create_count(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        where_group: Option<&QueryGroup>,
    ) -> BuildResult<String> {
        builder
            .clear()
            .select()
            .count_big()
            .as_field("Counted")
            .from()
            .table(mapping.table())
            .where_from(where_group)
            .end();
        Ok(finish("count", mapping, builder))
    }

    fn create_insert(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
    ) -> BuildResult<String> {
        builder.clear();
        let fields: Vec<&Field> = mapping
            .fields_for(Command::Insert)
            .into_iter()
            .filter(|f| !is_identity(mapping, f))
            .collect();
        if fields.is_empty() {
            return Err(no_fields(mapping, "insertable"));
        }

        compose_insert(builder, mapping, &fields);
        append_result_select(builder, mapping, &fields);
        Ok(finish("insert", mapping, builder))
    }

    fn create_inline_insert(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        fields: &[Field],
        override_ignore: bool,
    ) -> BuildResult<String> {
        builder.clear();
        if let Some(identity) = fields.iter().find(|f| is_identity(mapping, f)) {
            return Err(BuildError::mapping(format!(
                "Identity column '{}' must not be supplied for inline insert",
                identity.name()
            )));
        }
        let fields = resolve_inline(
            mapping,
            fields,
            Command::Insert,
            Command::InlineInsert,
            override_ignore,
            "inline insert",
        )?;
        if fields.is_empty() {
            return Err(no_fields(mapping, "insertable"));
        }

        compose_insert(builder, mapping, &fields);
        append_result_select(builder, mapping, &fields);
        Ok(finish("inline_insert", mapping, builder))
    }

    fn create_update(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        where_group: Option<&QueryGroup>,
    ) -> BuildResult<String> {
        builder.clear();
        let fields: Vec<&Field> = mapping
            .fields_for(Command::Update)
            .into_iter()
            .filter(|f| !mapping.is_primary(f))
            .collect();
        if fields.is_empty() {
            return Err(no_fields(mapping, "updatable"));
        }
        check_where_isolation(&fields, where_group)?;

        compose_update(builder, mapping, &fields, where_group);
        Ok(finish("update", mapping, builder))
    }

    fn create_inline_update(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        fields: &[Field],
        where_group: Option<&QueryGroup>,
        override_ignore: bool,
    ) -> BuildResult<String> {
        builder.clear();
        if let Some(primary) = fields.iter().find(|f| mapping.is_primary(f)) {
            return Err(BuildError::mapping(format!(
                "Primary column '{}' must not be supplied for inline update",
                primary.name()
            )));
        }
        let fields = resolve_inline(
            mapping,
            fields,
            Command::Update,
            Command::InlineUpdate,
            override_ignore,
            "inline update",
        )?;
        if fields.is_empty() {
            return Err(no_fields(mapping, "updatable"));
        }
        check_where_isolation(&fields, where_group)?;

        compose_update(builder, mapping, &fields, where_group);
        Ok(finish("inline_update", mapping, builder))
    }

    fn create_merge(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        qualifiers: Option<&[Field]>,
    ) -> BuildResult<String> {
        builder.clear();
        let fields = mapping.fields_for(Command::Merge);
        if fields.is_empty() {
            return Err(no_fields(mapping, "mergeable"));
        }
        let qualifiers = resolve_qualifiers(mapping, qualifiers, &fields, Command::Merge)?;

        compose_merge(builder, mapping, &fields, &qualifiers)?;
        Ok(finish("merge", mapping, builder))
    }

    fn create_inline_merge(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        fields: &[Field],
        qualifiers: Option<&[Field]>,
        override_ignore: bool,
    ) -> BuildResult<String> {
        builder.clear();
        let fields = resolve_inline(
            mapping,
            fields,
            Command::Merge,
            Command::InlineMerge,
            override_ignore,
            "inline merge",
        )?;
        if fields.is_empty() {
            return Err(no_fields(mapping, "mergeable"));
        }
        // The subset doubles as the USING source, so qualifiers resolve
        // against it and must carry their own values.
        let qualifiers = resolve_qualifiers(mapping, qualifiers, &fields, Command::Merge)?;

        compose_merge(builder, mapping, &fields, &qualifiers)?;
        Ok(finish("inline_merge", mapping, builder))
    }

    fn create_delete(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        where_group: Option<&QueryGroup>,
    ) -> BuildResult<String> {
        builder
            .clear()
            .delete()
            .from()
            .table(mapping.table())
            .where_from(where_group)
            .end();
        Ok(finish("delete", mapping, builder))
    }

    fn create_delete_all(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
    ) -> BuildResult<String> {
        builder.clear().delete().from().table(mapping.table()).end();
        Ok(finish("delete_all", mapping, builder))
    }

    fn create_truncate(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
    ) -> BuildResult<String> {
        builder
            .clear()
            .truncate_table()
            .table(mapping.table())
            .end();
        Ok(finish("truncate", mapping, builder))
    }
}

// ==================== Composition helpers ====================

fn compose_insert(builder: &mut QueryBuilder, mapping: &EntityMapping, fields: &[&Field]) {
    builder
        .insert()
        .into()
        .table(mapping.table())
        .open_paren()
        .fields_from(fields)
        .close_paren()
        .values()
        .open_paren()
        .parameters_from(fields)
        .close_paren()
        .end();
}

/// The trailing `SELECT ... AS [Result]` routing the inserted key back:
/// `SCOPE_IDENTITY()` for an identity key, the bound parameter for a
/// client-supplied key present in the field list, `NULL` otherwise.
fn append_result_select(builder: &mut QueryBuilder, mapping: &EntityMapping, fields: &[&Field]) {
    builder.select();
    match mapping.primary() {
        Some(primary) if primary.is_identity() => {
            builder.scope_identity();
        }
        Some(primary) if fields.iter().any(|f| primary.field().matches(f)) => {
            builder.push(&format!("@{}", primary.field().short_name()));
        }
        _ => {
            builder.push("NULL");
        }
    }
    builder.as_field("Result").end();
}

fn compose_update(
    builder: &mut QueryBuilder,
    mapping: &EntityMapping,
    fields: &[&Field],
    where_group: Option<&QueryGroup>,
) {
    builder
        .update()
        .table(mapping.table())
        .set()
        .fields_and_parameters_from(fields)
        .where_from(where_group)
        .end();
}

fn compose_merge(
    builder: &mut QueryBuilder,
    mapping: &EntityMapping,
    fields: &[&Field],
    qualifiers: &[Field],
) -> BuildResult<()> {
    let insert_fields: Vec<&Field> = fields
        .iter()
        .copied()
        .filter(|f| !is_identity(mapping, f))
        .collect();
    if insert_fields.is_empty() {
        return Err(BuildError::mapping(format!(
            "Merge into {} has no insertable fields",
            mapping.table().name()
        )));
    }
    let update_fields: Vec<&Field> = fields
        .iter()
        .copied()
        .filter(|f| !mapping.is_primary(f) && !qualifiers.iter().any(|q| q.matches(f)))
        .collect();
    if update_fields.is_empty() {
        return Err(BuildError::mapping(format!(
            "Merge into {} has no updatable fields",
            mapping.table().name()
        )));
    }

    let on_list: Vec<String> = qualifiers
        .iter()
        .map(|q| format!("S.{sql} = T.{sql}", sql = q.as_sql()))
        .collect();

    builder
        .merge()
        .table(mapping.table())
        .as_alias("T")
        .using()
        .open_paren()
        .select()
        .parameters_as_fields_from(fields)
        .close_paren()
        .as_alias("S")
        .on()
        .open_paren()
        .push(&on_list.join(" AND "))
        .close_paren()
        .when_not_matched()
        .insert()
        .open_paren()
        .fields_from(&insert_fields)
        .close_paren()
        .values()
        .open_paren()
        .aliased_fields_from("S", &insert_fields)
        .close_paren()
        .when_matched()
        .update()
        .set()
        .fields_and_aliased_fields_from(&update_fields, "S")
        .end();
    Ok(())
}

// ==================== Validation helpers ====================

fn no_fields(mapping: &EntityMapping, role: &str) -> BuildError {
    BuildError::mapping(format!("Entity {} has no {role} fields", mapping.table().name()))
}

fn is_identity(mapping: &EntityMapping, field: &Field) -> bool {
    mapping
        .primary()
        .is_some_and(|p| p.is_identity() && p.field().matches(field))
}

fn validate_order(
    mapping: &EntityMapping,
    order: &[OrderField],
    command: Command,
) -> BuildResult<()> {
    for entry in order {
        if !mapping.allows(&entry.field().name(), command) {
            return Err(BuildError::mapping(format!(
                "Order field '{}' is not mapped for the operation on {}",
                entry.field().name(),
                mapping.table().name()
            )));
        }
    }
    Ok(())
}

/// Resolve an explicit field subset against the allow-list intersection of
/// the base command and its inline variant. With `override_ignore`, the
/// ignore lists are bypassed but every field must still be a mapped column.
fn resolve_inline<'a>(
    mapping: &EntityMapping,
    fields: &'a [Field],
    base: Command,
    inline: Command,
    override_ignore: bool,
    operation: &str,
) -> BuildResult<Vec<&'a Field>> {
    let unmatched: Vec<String> = fields
        .iter()
        .filter(|f| {
            let name = f.name();
            if override_ignore {
                !mapping
                    .mapped_fields()
                    .any(|m| m.field().matches_name(&name))
            } else {
                !(mapping.allows(&name, base) && mapping.allows(&name, inline))
            }
        })
        .map(|f| f.name())
        .collect();
    if !unmatched.is_empty() {
        return Err(BuildError::mapping(format!(
            "Fields [{}] are not available for {operation} on {}",
            unmatched.join(", "),
            mapping.table().name()
        )));
    }
    Ok(fields.iter().collect())
}

/// UPDATE binds `@Column` for every SET entry, so a filter parameter with
/// the same name would clash at bind time. The caller isolates the filter
/// with `QueryGroup::prefix_parameters` instead of this builder renaming it
/// behind their back.
fn check_where_isolation(
    set_fields: &[&Field],
    where_group: Option<&QueryGroup>,
) -> BuildResult<()> {
    let Some(group) = where_group else {
        return Ok(());
    };
    for leaf in group.query_fields() {
        let name = leaf.parameter().name();
        if set_fields
            .iter()
            .any(|f| f.short_name().eq_ignore_ascii_case(name))
        {
            return Err(BuildError::mapping(format!(
                "Filter parameter '@{name}' collides with an update column; \
                 isolate the filter with prefix_parameters(\"_\")"
            )));
        }
    }
    Ok(())
}

/// Default merge qualifiers to the primary key and check every qualifier is
/// mapped for the command.
fn resolve_qualifiers(
    mapping: &EntityMapping,
    qualifiers: Option<&[Field]>,
    fields: &[&Field],
    command: Command,
) -> BuildResult<Vec<Field>> {
    let qualifiers: Vec<Field> = match qualifiers {
        Some(list) if !list.is_empty() => list.to_vec(),
        _ => match mapping.primary() {
            Some(primary) => vec![primary.field().clone()],
            None => {
                return Err(BuildError::mapping(format!(
                    "Merge into {} requires qualifiers or a primary key",
                    mapping.table().name()
                )));
            }
        },
    };
    for qualifier in &qualifiers {
        if !mapping.allows(&qualifier.name(), command) {
            return Err(BuildError::mapping(format!(
                "Qualifier '{}' is not mapped for merge on {}",
                qualifier.name(),
                mapping.table().name()
            )));
        }
        if !fields.iter().any(|f| f.matches(qualifier)) {
            return Err(BuildError::mapping(format!(
                "Qualifier '{}' is not part of the merge field set",
                qualifier.name()
            )));
        }
    }
    Ok(qualifiers)
}

fn finish(command: &'static str, mapping: &EntityMapping, builder: &QueryBuilder) -> String {
    let sql = builder.get_string().to_string();
    trace!(
        target: "tsqlorm.sql",
        command,
        table = %mapping.table().name(),
        sql = %sql,
        "statement composed"
    );
    sql
}
