//! Entity-to-table mapping metadata.
//!
//! This module is the interface boundary to whatever produces mapping
//! metadata (a derive macro, a schema file, hand-written registration): the
//! statement builders consume an [`EntityMapping`] and never look further.
//! A mapping names the table, the columns, which logical [`Command`]s each
//! column participates in, and the primary key.
//!
//! # Example
//! ```ignore
//! use tsqlorm::{Command, EntityMapping, FieldMapping};
//!
//! let customer = EntityMapping::new("Customer")?
//!     .field(FieldMapping::new("Id")?)
//!     .field(FieldMapping::new("Name")?)
//!     .field(FieldMapping::new("Ssn")?.ignore(Command::Query))
//!     .primary_key("Id", true)?;
//! # Ok::<(), tsqlorm::BuildError>(())
//! ```

use crate::error::{BuildError, BuildResult};
use crate::field::Field;

/// The logical commands a column can participate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Query,
    BatchQuery,
    Count,
    Insert,
    InlineInsert,
    Update,
    InlineUpdate,
    Merge,
    InlineMerge,
    Delete,
}

/// A mapped column and the commands it is excluded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    field: Field,
    ignored: Vec<Command>,
}

impl FieldMapping {
    /// Map a column by name.
    pub fn new(name: &str) -> BuildResult<Self> {
        Ok(Self {
            field: Field::parse(name)?,
            ignored: Vec::new(),
        })
    }

    /// Exclude this column from a command.
    pub fn ignore(mut self, command: Command) -> Self {
        if !self.ignored.contains(&command) {
            self.ignored.push(command);
        }
        self
    }

    /// The mapped column.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Whether this column participates in a command.
    pub fn allows(&self, command: Command) -> bool {
        !self.ignored.contains(&command)
    }
}

/// The primary key of a mapped entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primary {
    field: Field,
    identity: bool,
}

impl Primary {
    /// The key column.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Whether the key value is database-generated.
    pub fn is_identity(&self) -> bool {
        self.identity
    }
}

/// Table, columns and primary key for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapping {
    table: Field,
    fields: Vec<FieldMapping>,
    primary: Option<Primary>,
}

impl EntityMapping {
    /// Create a mapping for a table (dotted schema qualification allowed).
    pub fn new(table: &str) -> BuildResult<Self> {
        Ok(Self {
            table: Field::parse(table)?,
            fields: Vec::new(),
            primary: None,
        })
    }

    /// Append a mapped column.
    pub fn field(mut self, field: FieldMapping) -> Self {
        self.fields.push(field);
        self
    }

    /// Convenience: append a column with no exclusions.
    pub fn column(self, name: &str) -> BuildResult<Self> {
        Ok(self.field(FieldMapping::new(name)?))
    }

    /// Declare the primary key. The column must already be mapped.
    pub fn primary_key(mut self, name: &str, identity: bool) -> BuildResult<Self> {
        let field = self
            .fields
            .iter()
            .find(|f| f.field().matches_name(name))
            .map(|f| f.field().clone())
            .ok_or_else(|| {
                BuildError::mapping(format!(
                    "Primary key '{name}' is not a mapped column of {}",
                    self.table.name()
                ))
            })?;
        self.primary = Some(Primary { field, identity });
        Ok(self)
    }

    /// The mapped table.
    pub fn table(&self) -> &Field {
        &self.table
    }

    /// The primary key, if declared.
    pub fn primary(&self) -> Option<&Primary> {
        self.primary.as_ref()
    }

    /// All mapped columns.
    pub fn mapped_fields(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.iter()
    }

    /// The allow-list for a command, in mapping order.
    pub fn fields_for(&self, command: Command) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| f.allows(command))
            .map(FieldMapping::field)
            .collect()
    }

    /// Whether a named column participates in a command.
    pub fn allows(&self, name: &str, command: Command) -> bool {
        self.fields
            .iter()
            .any(|f| f.field().matches_name(name) && f.allows(command))
    }

    /// Whether a field matches the primary key by name.
    pub fn is_primary(&self, field: &Field) -> bool {
        self.primary
            .as_ref()
            .is_some_and(|p| p.field().matches(field))
    }
}
