//! The model: the public operation surface over one table.
//!
//! A [`Model`] binds a [`ModelConfig`] to a storage backend, an optional
//! cache store and an ID strategy. Reads are cached best-effort under
//! `<table>:<operation>:<canonical-args>` keys; writes invalidate the
//! targeted lookup key and sweep the table's key space, concurrently, after
//! the statement succeeds. Cache failures never fail an operation: the
//! database is the source of truth.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use strata_cache::CacheStore;
use strata_sql::{Database, Executor, Row};

use crate::Entity;
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::ids::{IdStrategy, UuidIds};
use crate::reassemble::reassemble;
use crate::spec::{FieldSelection, FilterMap, PageInfo, QueryInput, QueryResult, QuerySpec};
use crate::sql::{self, QueryCompiler, Statement};
use crate::txn::ScopedModel;

/// Outcome of a non-returning write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    /// Rows affected by the statement.
    pub rows_affected: u64,
}

/// A data-access model for one table.
#[derive(Debug, Clone)]
pub struct Model {
    config: ModelConfig,
    db: Arc<dyn Database>,
    cache: Option<Arc<dyn CacheStore>>,
    ids: Arc<dyn IdStrategy>,
}

impl Model {
    /// Creates a model over `db` with the default [`UuidIds`] strategy and
    /// no cache store.
    #[must_use]
    pub fn new(config: ModelConfig, db: Arc<dyn Database>) -> Self {
        Self {
            config,
            db,
            cache: None,
            ids: Arc::new(UuidIds),
        }
    }

    /// Attaches a cache store. Caching also requires `use_cache` in the
    /// configuration.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the primary-key generation strategy.
    #[must_use]
    pub fn with_ids(mut self, ids: impl IdStrategy) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// The model's configuration.
    #[must_use]
    pub const fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Runs a structured or legacy query and returns a page of entities.
    ///
    /// # Errors
    ///
    /// Returns a backend error when a statement fails.
    pub async fn find_all(&self, input: impl Into<QueryInput>) -> Result<QueryResult> {
        let (spec, force_count) = input.into().normalize();
        self.run_find(spec, force_count).await
    }

    /// [`find_all`](Self::find_all) over a raw JSON argument, classifying
    /// legacy and structured calls at the boundary.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed spec object, or a backend
    /// error when a statement fails.
    pub async fn find_all_json(&self, value: Value) -> Result<QueryResult> {
        let input = QueryInput::from_json(value)
            .map_err(|error| Error::validation(&self.config.table, "find_all", error.to_string()))?;
        let (spec, force_count) = input.normalize();
        self.run_find(spec, force_count).await
    }

    /// Legacy entry point: the argument is a bare filter mapping and the
    /// total count is always computed.
    ///
    /// # Errors
    ///
    /// Returns a backend error when a statement fails.
    pub async fn find_where(&self, filters: FilterMap) -> Result<QueryResult> {
        self.run_find(
            QuerySpec {
                filters,
                ..QuerySpec::default()
            },
            true,
        )
        .await
    }

    /// Fetches one record by primary key.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the statement fails.
    pub async fn find_by_id(
        &self, id: &Value, fields: Option<FieldSelection>,
    ) -> Result<Option<Entity>> {
        let key = self.cache_key("find_by_id", &json!({"fields": &fields, "id": id}));
        if let Some(hit) = self.cache_read::<Option<Entity>>(&key).await {
            return Ok(hit);
        }

        let statement =
            sql::select_one_statement(&self.config, &self.config.primary_key, id, fields.as_ref());
        let rows = self.execute("find_by_id", statement).await?;
        let record = rows.into_iter().next();

        self.cache_write(&key, &record).await;
        Ok(record)
    }

    /// Fetches the first record where `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the statement fails.
    pub async fn find_by_field(
        &self, field: &str, value: &Value, fields: Option<FieldSelection>,
    ) -> Result<Option<Entity>> {
        let key = self
            .cache_key("find_by_field", &json!({"field": field, "fields": &fields, "value": value}));
        if let Some(hit) = self.cache_read::<Option<Entity>>(&key).await {
            return Ok(hit);
        }

        let statement = sql::select_one_statement(&self.config, field, value, fields.as_ref());
        let rows = self.execute("find_by_field", statement).await?;
        let record = rows.into_iter().next();

        self.cache_write(&key, &record).await;
        Ok(record)
    }

    /// Inserts a record and returns it as written. A missing or null primary
    /// key is filled by the model's ID strategy (or left to the backend).
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty payload, or a backend error
    /// when the statement fails.
    pub async fn create(&self, data: Entity) -> Result<Entity> {
        let statement = prepare_create(&self.config, self.ids.as_ref(), data)?;
        let rows = self.execute("create", statement).await?;
        let record = rows.into_iter().next().ok_or_else(|| {
            Error::backend(
                &self.config.table,
                "create",
                anyhow::anyhow!("backend returned no record for the insert"),
            )
        })?;

        self.invalidate_after_write(record.get(&self.config.primary_key)).await;
        Ok(record)
    }

    /// Updates a record by primary key and returns it as written, or `None`
    /// when no record matched.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a null id or empty payload, or a
    /// backend error when the statement fails.
    pub async fn update(&self, id: &Value, data: Entity) -> Result<Option<Entity>> {
        let statement = prepare_update(&self.config, id, &data)?;
        let rows = self.execute("update", statement).await?;
        let record = rows.into_iter().next();

        self.invalidate_after_write(Some(id)).await;
        Ok(record)
    }

    /// Deletes a record by primary key, reporting the affected-row count.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a null id, or a backend error when the
    /// statement fails.
    pub async fn delete(&self, id: &Value) -> Result<WriteResult> {
        let statement = prepare_delete(&self.config, id)?;
        let rows = self.execute("delete", statement).await?;

        self.invalidate_after_write(Some(id)).await;
        Ok(WriteResult {
            rows_affected: rows.len() as u64,
        })
    }

    /// Deletes a record by primary key and returns it, or `None` when no
    /// record matched.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a null id, or a backend error when the
    /// statement fails.
    pub async fn delete_returning(&self, id: &Value) -> Result<Option<Entity>> {
        let statement = prepare_delete(&self.config, id)?;
        let rows = self.execute("delete", statement).await?;
        let record = rows.into_iter().next();

        self.invalidate_after_write(Some(id)).await;
        Ok(record)
    }

    /// Counts records matching a filter mapping.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the statement fails.
    pub async fn count(&self, filters: FilterMap) -> Result<u64> {
        let key = self.cache_key("count", &Value::Object(filters.clone()));
        if let Some(hit) = self.cache_read::<u64>(&key).await {
            return Ok(hit);
        }

        let spec = QuerySpec {
            filters,
            ..QuerySpec::default()
        };
        let compiler = QueryCompiler::new(&self.config, &spec.relations);
        let rows = self.execute("count", compiler.count_statement(&spec)).await?;
        let total = count_from_rows(&rows);

        self.cache_write(&key, &total).await;
        Ok(total)
    }

    /// Whether any record matches the filter mapping.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the statement fails.
    pub async fn exists(&self, filters: FilterMap) -> Result<bool> {
        Ok(self.count(filters).await? > 0)
    }

    /// Executes a caller-supplied statement through the backend.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the statement fails.
    pub async fn raw_query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        self.execute(
            "raw_query",
            Statement {
                sql: sql.to_string(),
                params,
            },
        )
        .await
    }

    /// Runs `f` against a transaction-scoped model. On success the
    /// transaction commits and the table cache is invalidated exactly once;
    /// on failure the error propagates and the backend rolls back.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or a backend error from beginning or
    /// committing the transaction.
    pub async fn run_in_transaction<T, F, Fut>(&self, f: F) -> Result<T>
    where
        F: FnOnce(ScopedModel) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let tx = self.db.begin().await.map_err(|source| {
            tracing::error!(table = %self.config.table, error = %source, "failed to begin transaction");
            Error::backend(&self.config.table, "transaction", source)
        })?;

        let scoped = ScopedModel::new(self.config.clone(), Arc::clone(&tx), Arc::clone(&self.ids));
        let value = f(scoped).await?;

        tx.commit().await.map_err(|source| {
            tracing::error!(table = %self.config.table, error = %source, "failed to commit transaction");
            Error::backend(&self.config.table, "transaction", source)
        })?;

        self.invalidate_table_cache().await;
        Ok(value)
    }

    /// Drops every cached entry for this table. Best-effort and idempotent;
    /// an empty key listing issues no delete.
    pub async fn invalidate_table_cache(&self) {
        if let Some(cache) = self.cache_store() {
            self.sweep_table_cache(cache).await;
        }
    }

    async fn run_find(&self, spec: QuerySpec, force_count: bool) -> Result<QueryResult> {
        let key = serde_json::to_value(&spec).ok().map(|args| {
            self.cache_key("find_all", &json!({"forceCount": force_count, "spec": args}))
        });
        if let Some(key) = key.as_deref()
            && let Some(hit) = self.cache_read::<QueryResult>(key).await
        {
            return Ok(hit);
        }

        let compiler = QueryCompiler::new(&self.config, &spec.relations);
        let page = spec.pagination.map(|pagination| sql::resolve_page(&self.config, pagination));

        // Count first, reusing the data statement's WHERE and parameters.
        let total = if page.is_some() || force_count {
            let rows = self.execute("find_all", compiler.count_statement(&spec)).await?;
            Some(count_from_rows(&rows))
        } else {
            None
        };

        let rows = self.execute("find_all", compiler.data_statement(&spec, page)).await?;
        let data = reassemble(rows, &spec.relations, &self.config.primary_key);

        let pagination = match (total, page) {
            (Some(total), Some(page)) => PageInfo::compute(total, page.page, page.limit),
            // Forced count without pagination reports one total-sized page.
            (Some(total), None) => PageInfo::compute(total, 1, total),
            (None, _) => {
                let returned = data.len() as u64;
                PageInfo::compute(returned, 1, returned)
            }
        };

        let result = QueryResult { data, pagination };
        if let Some(key) = key.as_deref() {
            self.cache_write(key, &result).await;
        }
        Ok(result)
    }

    async fn execute(&self, op: &'static str, statement: Statement) -> Result<Vec<Row>> {
        execute_on(self.db.as_ref(), &self.config.table, op, statement).await
    }

    fn cache_store(&self) -> Option<&Arc<dyn CacheStore>> {
        if self.config.use_cache { self.cache.as_ref() } else { None }
    }

    fn cache_key(&self, op: &str, args: &Value) -> String {
        format!("{}:{op}:{args}", self.config.table)
    }

    async fn cache_read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cache = self.cache_store()?;
        match cache.get(key.to_string()).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(value) => {
                    tracing::debug!(table = %self.config.table, key, "cache hit");
                    Some(value)
                }
                Err(error) => {
                    tracing::warn!(table = %self.config.table, key, %error, "cache payload unreadable");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(table = %self.config.table, key, %error, "cache read failed");
                None
            }
        }
    }

    async fn cache_write<T: Serialize>(&self, key: &str, value: &T) {
        let Some(cache) = self.cache_store() else {
            return;
        };
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(table = %self.config.table, key, %error, "cache payload unserializable");
                return;
            }
        };
        if let Err(error) = cache.set(key.to_string(), payload, self.config.cache_ttl).await {
            tracing::warn!(table = %self.config.table, key, %error, "cache write failed");
        }
    }

    /// Post-write invalidation: the targeted lookup key and the table-wide
    /// sweep are independent and idempotent, so they run concurrently.
    async fn invalidate_after_write(&self, id: Option<&Value>) {
        let Some(cache) = self.cache_store() else {
            return;
        };

        let targeted = async {
            if let Some(id) = id {
                let key = self.cache_key("find_by_id", &json!({"fields": null, "id": id}));
                if let Err(error) = cache.delete(vec![key]).await {
                    tracing::warn!(table = %self.config.table, %error, "cache delete failed");
                }
            }
        };
        let sweep = self.sweep_table_cache(cache);

        futures::join!(targeted, sweep);
    }

    async fn sweep_table_cache(&self, cache: &Arc<dyn CacheStore>) {
        match cache.list_keys(format!("{}:*", self.config.table)).await {
            Ok(keys) if keys.is_empty() => {}
            Ok(keys) => {
                if let Err(error) = cache.delete(keys).await {
                    tracing::warn!(table = %self.config.table, %error, "cache invalidation failed");
                }
            }
            Err(error) => {
                tracing::warn!(table = %self.config.table, %error, "cache key listing failed");
            }
        }
    }
}

/// Execute a statement on any executor, mapping failures into backend
/// errors with table and operation context.
pub(crate) async fn execute_on(
    executor: &dyn Executor, table: &str, op: &'static str, statement: Statement,
) -> Result<Vec<Row>> {
    executor.execute(statement.sql, statement.params).await.map_err(|source| {
        tracing::error!(table, op, error = %source, "backend statement failed");
        Error::backend(table, op, source)
    })
}

/// Validate a create payload, apply the ID strategy, and compile the insert.
pub(crate) fn prepare_create(
    config: &ModelConfig, ids: &dyn IdStrategy, mut data: Entity,
) -> Result<Statement> {
    if data.is_empty() {
        return Err(Error::validation(&config.table, "create", "empty record payload"));
    }

    if data.get(&config.primary_key).is_none_or(Value::is_null) {
        match ids.next_id() {
            Some(id) => {
                data.insert(config.primary_key.clone(), id);
            }
            // Drop an explicit null so the backend's default applies.
            None => {
                data.remove(&config.primary_key);
            }
        }
    }

    Ok(sql::insert_statement(&config.table, &data))
}

/// Validate an update payload and compile the update.
pub(crate) fn prepare_update(config: &ModelConfig, id: &Value, data: &Entity) -> Result<Statement> {
    if id.is_null() {
        return Err(Error::validation(&config.table, "update", "missing id"));
    }
    if data.is_empty() {
        return Err(Error::validation(&config.table, "update", "empty record payload"));
    }
    Ok(sql::update_statement(&config.table, &config.primary_key, id, data))
}

/// Validate a delete id and compile the delete.
pub(crate) fn prepare_delete(config: &ModelConfig, id: &Value) -> Result<Statement> {
    if id.is_null() {
        return Err(Error::validation(&config.table, "delete", "missing id"));
    }
    Ok(sql::delete_statement(&config.table, &config.primary_key, id))
}

fn count_from_rows(rows: &[Row]) -> u64 {
    rows.first().and_then(|row| row.get("total")).and_then(Value::as_u64).unwrap_or(0)
}
