//! PostgreSQL context implementation
//!
//! [`PgDataContext`] runs raw statements through a sqlx pool and creates the
//! model's tables on demand. [`introspect_model`] reads foreign keys and their
//! delete rules from `information_schema` for databases without a declared model.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::backends::DatabaseBackendType;
use crate::context::{DataContext, DbContext, DbContextOptions};
use crate::error::{ModelError, ModelResult};
use crate::metadata::{DataModel, DeleteBehavior, ForeignKey, ModelDefinition, TableMetadata};

/// PostgreSQL-backed context whose model comes from `M`
pub struct PgDataContext<M> {
    pool: PgPool,
    model: DataModel,
    _definition: PhantomData<fn() -> M>,
}

impl<M: ModelDefinition> PgDataContext<M> {
    /// Build a context with a lazily connecting pool. Must be called inside a tokio runtime.
    pub fn connect_lazy(options: &DbContextOptions<Self>) -> ModelResult<Self> {
        options.validate()?;
        if !options.database_url.starts_with("postgresql://") && !options.database_url.starts_with("postgres://") {
            return Err(ModelError::Configuration("Invalid PostgreSQL URL scheme".to_string()));
        }

        let pool = PgPoolOptions::new()
            .max_connections(options.pool.max_connections)
            .min_connections(options.pool.min_connections)
            .acquire_timeout(Duration::from_secs(options.pool.acquire_timeout))
            .connect_lazy(&options.database_url)?;

        tracing::debug!("Created lazy PostgreSQL pool for {}", std::any::type_name::<M>());
        Ok(Self::with_model(pool, M::model()))
    }

    /// Wrap an existing pool, using the model declared by `M`
    pub fn from_pool(pool: PgPool) -> Self {
        Self::with_model(pool, M::model())
    }
}

impl<M> PgDataContext<M> {
    /// Wrap an existing pool with an explicit model, e.g. one from [`introspect_model`]
    pub fn with_model(pool: PgPool, model: DataModel) -> Self {
        Self {
            pool,
            model,
            _definition: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl<M: Send + Sync + 'static> DataContext for PgDataContext<M> {
    fn model(&self) -> &DataModel {
        &self.model
    }

    fn backend(&self) -> DatabaseBackendType {
        DatabaseBackendType::PostgreSQL
    }

    /// Creates every table when none of them exist yet. If any table is already
    /// present the schema counts as existing and nothing is created.
    async fn ensure_created(&self) -> ModelResult<bool> {
        for table in self.model.tables() {
            let exists: bool = sqlx::query_scalar(TABLE_EXISTS_QUERY)
                .bind(table.schema.as_deref().unwrap_or(DEFAULT_SCHEMA))
                .bind(&table.name)
                .fetch_one(&self.pool)
                .await?;
            if exists {
                return Ok(false);
            }
        }

        let mut transaction = self.pool.begin().await?;
        for table in self.model.tables() {
            let sql = table.create_statement.as_deref().ok_or_else(|| {
                ModelError::Schema(format!("Table '{}' has no create statement", table.name))
            })?;
            sqlx::query(sql).execute(&mut *transaction).await?;
        }
        transaction.commit().await?;

        tracing::info!("Created {} tables", self.model.len());
        Ok(true)
    }

    async fn execute_raw(&self, sql: &str) -> ModelResult<u64> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

impl<M: ModelDefinition> DbContext for PgDataContext<M> {
    fn from_options(options: &DbContextOptions<Self>) -> ModelResult<Self> {
        Self::connect_lazy(options)
    }
}

const DEFAULT_SCHEMA: &str = "public";

// Quoted DDL keeps the name's case, unquoted DDL folds it to lowercase.
const TABLE_EXISTS_QUERY: &str = r#"
    SELECT EXISTS (
        SELECT 1
        FROM information_schema.tables
        WHERE table_schema::text IN ($1, lower($1))
          AND table_name::text IN ($2, lower($2))
    )
"#;

const TABLES_QUERY: &str = r#"
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = $1
      AND table_type = 'BASE TABLE'
      AND table_name != '_sqlx_migrations'
    ORDER BY table_name
"#;

const FOREIGN_KEYS_QUERY: &str = r#"
    SELECT DISTINCT
        tc.table_name::text AS table_name,
        ccu.table_name::text AS principal_table,
        rc.delete_rule::text AS delete_rule
    FROM information_schema.table_constraints tc
    JOIN information_schema.referential_constraints rc
      ON tc.constraint_name = rc.constraint_name
     AND tc.constraint_schema = rc.constraint_schema
    JOIN information_schema.constraint_column_usage ccu
      ON rc.unique_constraint_name = ccu.constraint_name
     AND rc.unique_constraint_schema = ccu.constraint_schema
    WHERE tc.constraint_type = 'FOREIGN KEY'
      AND tc.table_schema = $1
      AND ccu.table_schema = $1
"#;

/// Read the tables of `schema` and their foreign keys from the live database.
///
/// Entity names are the table names. Keys pointing outside `schema` are dropped.
pub async fn introspect_model(pool: &PgPool, schema: &str) -> ModelResult<DataModel> {
    let table_rows = sqlx::query(TABLES_QUERY).bind(schema).fetch_all(pool).await?;

    let mut tables: Vec<TableMetadata> = Vec::with_capacity(table_rows.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in table_rows {
        let name: String = row.try_get("table_name")?;
        index.insert(name.clone(), tables.len());
        tables.push(TableMetadata::new(name).with_schema(schema));
    }

    let key_rows = sqlx::query(FOREIGN_KEYS_QUERY).bind(schema).fetch_all(pool).await?;
    for row in key_rows {
        let dependent: String = row.try_get("table_name")?;
        let principal: String = row.try_get("principal_table")?;
        let delete_rule: String = row.try_get("delete_rule")?;

        if !index.contains_key(&principal) {
            continue;
        }
        if let Some(&position) = index.get(&dependent) {
            let behavior: DeleteBehavior = delete_rule.parse()?;
            tables[position].foreign_keys.push(ForeignKey::new(principal, behavior));
        }
    }

    tracing::debug!("Introspected {} tables in schema '{}'", tables.len(), schema);
    Ok(DataModel::new(tables))
}
