//! Transaction-scoped model.
//!
//! [`ScopedModel`] is the repository handed to a
//! [`run_in_transaction`](crate::Model::run_in_transaction) closure: the same
//! write surface as [`Model`](crate::Model), bound to one open transaction.
//! It never touches the cache; the owning model invalidates the table cache
//! once, after the transaction commits.

use std::sync::Arc;

use serde_json::Value;
use strata_sql::{Row, Transaction};

use crate::Entity;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::ids::IdStrategy;
use crate::model::{WriteResult, execute_on, prepare_create, prepare_delete, prepare_update};
use crate::spec::FieldSelection;
use crate::sql::{self, Statement};

/// A model bound to one open transaction.
#[derive(Debug, Clone)]
pub struct ScopedModel {
    config: ModelConfig,
    tx: Arc<dyn Transaction>,
    ids: Arc<dyn IdStrategy>,
}

impl ScopedModel {
    pub(crate) fn new(
        config: ModelConfig, tx: Arc<dyn Transaction>, ids: Arc<dyn IdStrategy>,
    ) -> Self {
        Self { config, tx, ids }
    }

    /// Fetches one record by primary key, seeing the transaction's writes.
    ///
    /// # Errors
    ///
    /// Returns a backend error when the statement fails.
    pub async fn find_by_id(
        &self, id: &Value, fields: Option<FieldSelection>,
    ) -> Result<Option<Entity>> {
        let statement =
            sql::select_one_statement(&self.config, &self.config.primary_key, id, fields.as_ref());
        let rows = self.execute("find_by_id", statement).await?;
        Ok(rows.into_iter().next())
    }

    /// Inserts a record inside the transaction and returns it as written.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty payload, or a backend error
    /// when the statement fails.
    pub async fn create(&self, data: Entity) -> Result<Entity> {
        let statement = prepare_create(&self.config, self.ids.as_ref(), data)?;
        let rows = self.execute("create", statement).await?;
        rows.into_iter().next().ok_or_else(|| {
            crate::Error::backend(
                &self.config.table,
                "create",
                anyhow::anyhow!("backend returned no record for the insert"),
            )
        })
    }

    /// Updates a record by primary key inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a null id or empty payload, or a
    /// backend error when the statement fails.
    pub async fn update(&self, id: &Value, data: Entity) -> Result<Option<Entity>> {
        let statement = prepare_update(&self.config, id, &data)?;
        let rows = self.execute("update", statement).await?;
        Ok(rows.into_iter().next())
    }

    /// Deletes a record by primary key inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a null id, or a backend error when the
    /// statement fails.
    pub async fn delete(&self, id: &Value) -> Result<WriteResult> {
        let statement = prepare_delete(&self.config, id)?;
        let rows = self.execute("delete", statement).await?;
        Ok(WriteResult {
            rows_affected: rows.len() as u64,
        })
    }

    /// Executes a caller-supplied statement inside the transaction.
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

    async fn execute(&self, op: &'static str, statement: Statement) -> Result<Vec<Row>> {
        execute_on(self.tx.as_ref(), &self.config.table, op, statement).await
    }
}
