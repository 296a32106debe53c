//! Table Metadata - what the data layer knows about persisted entities
//!
//! A [`DataModel`] lists tables in declaration order, each with its outgoing
//! foreign keys and their delete behavior.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Policy applied to dependent rows when the referenced principal row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeleteBehavior {
    /// Dependent rows are deleted by the database
    Cascade,
    /// Deleting a referenced principal is rejected
    Restrict,
    /// The database sets the foreign key column to NULL
    SetNull,
    /// Checked at the end of the statement, rejected if still referenced
    NoAction,
    /// The client nulls out loaded dependents; the database itself restricts
    ClientSetNull,
}

impl DeleteBehavior {
    /// True when a bulk `DELETE` of a self-referencing table would be rejected
    pub fn blocks_self_delete(&self) -> bool {
        matches!(self, DeleteBehavior::Restrict | DeleteBehavior::ClientSetNull)
    }
}

impl FromStr for DeleteBehavior {
    type Err = ModelError;

    /// Parse an `information_schema.referential_constraints.delete_rule` value
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CASCADE" => Ok(DeleteBehavior::Cascade),
            "RESTRICT" => Ok(DeleteBehavior::Restrict),
            "SET NULL" | "SET DEFAULT" => Ok(DeleteBehavior::SetNull),
            "NO ACTION" => Ok(DeleteBehavior::NoAction),
            other => Err(ModelError::Schema(format!("Unknown delete rule '{}'", other))),
        }
    }
}

/// Foreign key from the declaring (dependent) table to a principal entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Entity name of the referenced table
    pub principal: String,
    pub delete_behavior: DeleteBehavior,
}

impl ForeignKey {
    pub fn new(principal: impl Into<String>, delete_behavior: DeleteBehavior) -> Self {
        Self {
            principal: principal.into(),
            delete_behavior,
        }
    }
}

/// Metadata for one persisted entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Logical identity, used for exclusion and in error messages
    pub entity: String,
    /// Table name in the database
    pub name: String,
    /// Optional schema namespace
    #[serde(default)]
    pub schema: Option<String>,
    /// Outgoing foreign keys
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    /// DDL used when the schema has to be created
    #[serde(default)]
    pub create_statement: Option<String>,
}

impl TableMetadata {
    /// New table whose name equals the entity name
    pub fn new(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self {
            name: entity.clone(),
            entity,
            schema: None,
            foreign_keys: Vec::new(),
            create_statement: None,
        }
    }

    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add a foreign key pointing at `principal`
    pub fn references(mut self, principal: impl Into<String>, delete_behavior: DeleteBehavior) -> Self {
        self.foreign_keys.push(ForeignKey::new(principal, delete_behavior));
        self
    }

    pub fn with_create_statement(mut self, sql: impl Into<String>) -> Self {
        self.create_statement = Some(sql.into());
        self
    }

    /// Foreign keys that point back at this same table
    pub fn self_references(&self) -> impl Iterator<Item = &ForeignKey> + '_ {
        self.foreign_keys.iter().filter(move |fk| fk.principal == self.entity)
    }

    /// Entities this table references, self-references excluded
    pub fn principals(&self) -> impl Iterator<Item = &str> + '_ {
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.principal != self.entity)
            .map(|fk| fk.principal.as_str())
    }

    /// `schema.name`, or just `name` without a schema, unquoted
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

/// Types that map to a table
pub trait Entity: 'static {
    /// Metadata for the table backing this type
    fn table() -> TableMetadata;

    /// Identity of this entity within a [`DataModel`]
    fn entity_name() -> String {
        Self::table().entity
    }
}

/// Supplies the model for a context type, see `PgDataContext`
pub trait ModelDefinition: Send + Sync + 'static {
    fn model() -> DataModel;
}

/// The set of tables a context manages, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModel {
    tables: Vec<TableMetadata>,
}

impl DataModel {
    pub fn new(tables: Vec<TableMetadata>) -> Self {
        Self { tables }
    }

    /// Load metadata from a JSON array of tables
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let tables: Vec<TableMetadata> = serde_json::from_str(json)?;
        Ok(Self::new(tables))
    }

    /// Append the table of an [`Entity`]
    pub fn with_entity<E: Entity>(self) -> Self {
        self.with_table(E::table())
    }

    /// Append a table, replacing any earlier table with the same entity name
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.tables.retain(|t| t.entity != table.entity);
        self.tables.push(table);
        self
    }

    pub fn tables(&self) -> &[TableMetadata] {
        &self.tables
    }

    /// Look up a table by entity name
    pub fn table(&self, entity: &str) -> Option<&TableMetadata> {
        self.tables.iter().find(|t| t.entity == entity)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
