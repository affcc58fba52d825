//! # tsqlorm
//!
//! A query-expression-to-SQL compilation core for SQL Server flavored ORMs.
//!
//! ## Features
//!
//! - **Expression model**: [`QueryField`]/[`QueryGroup`] boolean trees with
//!   validated operand shapes and named `@parameter` binding
//! - **Predicate compilation**: a [`Predicate`] DSL (comparisons, string
//!   matching, IN/BETWEEN, quantifiers, AND/OR/NOT) lowered into the group
//!   model with De Morgan negation propagation
//! - **Dynamic criteria**: flat JSON descriptors parsed into the same model
//! - **Canonicalization**: [`QueryGroup::fix`] deduplicates parameter names
//!   across the whole tree
//! - **Statement building**: per-operation SQL text generation behind the
//!   [`StatementBuilder`] trait; [`TsqlStatementBuilder`] ships for T-SQL
//!   (bracketed identifiers, `TOP`, `SCOPE_IDENTITY()`, `MERGE`,
//!   `ROW_NUMBER()` pagination)
//!
//! ## Composing a query
//!
//! ```ignore
//! use tsqlorm::{
//!     EntityMapping, Predicate, QueryBuilder, QueryGroup, StatementBuilder,
//!     TsqlStatementBuilder,
//! };
//!
//! let customer = EntityMapping::new("Customer")?
//!     .column("Id")?
//!     .column("Name")?
//!     .primary_key("Id", true)?;
//!
//! let filter = QueryGroup::parse(
//!     &Predicate::gt("Age", 18).and(Predicate::contains("Name", "an")),
//! )?;
//!
//! let mut qb = QueryBuilder::new();
//! let sql = TsqlStatementBuilder::new()
//!     .create_query(&mut qb, &customer, Some(&filter), None, Some(10))?;
//! // bind filter.parameters() and execute `sql` through your connection
//! ```
//!
//! This crate composes text and validates shapes; it performs no I/O. The
//! execution layer binds the `(name, value)` pairs from
//! [`QueryGroup::parameters`] after [`QueryGroup::fix`] and runs the
//! statement through its own connection/command machinery.

pub mod builder;
pub mod error;
pub mod field;
pub mod mapping;
pub mod operation;
pub mod parameter;
pub mod predicate;
pub mod query;
pub mod statement;
pub mod value;

pub use builder::QueryBuilder;
pub use error::{BuildError, BuildResult};
pub use field::{Direction, Field, OrderField};
pub use mapping::{Command, EntityMapping, FieldMapping, Primary};
pub use operation::{Conjunction, Operation};
pub use parameter::Parameter;
pub use predicate::{Comparison, Predicate};
pub use query::{QueryField, QueryGroup};
pub use statement::{StatementBuilder, TsqlStatementBuilder};
pub use value::{Value, ValueKind};
