//! Dialect-specific statement builders.
//!
//! A [`StatementBuilder`] turns an [`EntityMapping`] plus the query
//! expression model into one complete, executable statement string per
//! logical operation. The trait is object-safe and carries no state: every
//! method is a pure function of its inputs (the passed-in
//! [`QueryBuilder`] is cleared on entry and only used as the text buffer).
//!
//! One implementation ships per target dialect;
//! [`TsqlStatementBuilder`] covers SQL Server.

mod tsql;

pub use tsql::TsqlStatementBuilder;

use crate::builder::QueryBuilder;
use crate::error::BuildResult;
use crate::field::{Field, OrderField};
use crate::mapping::EntityMapping;
use crate::query::QueryGroup;

/// Composes complete SQL statements for one dialect.
///
/// Filter groups are taken as-is: canonicalize them with
/// [`QueryGroup::fix`] before composing so the emitted placeholders agree
/// with the pairs the execution layer will bind.
pub trait StatementBuilder {
    /// `SELECT [TOP (n)] ... FROM ... [WHERE ...] [ORDER BY ...] ;`
    fn create_query(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        where_group: Option<&QueryGroup>,
        order_by: Option<&[OrderField]>,
        top: Option<usize>,
    ) -> BuildResult<String>;

    /// Windowed offset pagination over a zero-based page number.
    fn create_batch_query(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        where_group: Option<&QueryGroup>,
        order_by: &[OrderField],
        page: usize,
        rows_per_batch: usize,
    ) -> BuildResult<String>;

    /// `SELECT COUNT_BIG (1) AS [Counted] FROM ... [WHERE ...] ;`
    fn create_count(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        where_group: Option<&QueryGroup>,
    ) -> BuildResult<String>;

    /// Insert over every mapped insertable column, returning the key as
    /// `[Result]`.
    fn create_insert(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
    ) -> BuildResult<String>;

    /// Insert over an explicit column subset. Unless `override_ignore` is
    /// set, every column must be allowed for both `Insert` and
    /// `InlineInsert`.
    fn create_inline_insert(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        fields: &[Field],
        override_ignore: bool,
    ) -> BuildResult<String>;

    /// Update over every mapped updatable column (primary key excluded).
    fn create_update(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        where_group: Option<&QueryGroup>,
    ) -> BuildResult<String>;

    /// Update over an explicit column subset.
    fn create_inline_update(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        fields: &[Field],
        where_group: Option<&QueryGroup>,
        override_ignore: bool,
    ) -> BuildResult<String>;

    /// Upsert via MERGE. Qualifiers default to the primary key.
    fn create_merge(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        qualifiers: Option<&[Field]>,
    ) -> BuildResult<String>;

    /// Upsert via MERGE over an explicit column subset.
    fn create_inline_merge(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        fields: &[Field],
        qualifiers: Option<&[Field]>,
        override_ignore: bool,
    ) -> BuildResult<String>;

    /// `DELETE FROM ... [WHERE ...] ;`
    fn create_delete(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
        where_group: Option<&QueryGroup>,
    ) -> BuildResult<String>;

    /// `DELETE FROM ... ;` without a filter.
    fn create_delete_all(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
    ) -> BuildResult<String>;

    /// `TRUNCATE TABLE ... ;`
    fn create_truncate(
        &self,
        builder: &mut QueryBuilder,
        mapping: &EntityMapping,
    ) -> BuildResult<String>;
}
