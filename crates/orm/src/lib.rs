//! Dynamic data-access layer for SQL databases.
//!
//! A [`Model`] maps one table (name, primary key, paging limits, cache
//! policy) onto dynamically generated, parameterized SQL executed through a
//! pluggable [`Database`](strata_sql::Database) backend, with best-effort
//! result caching through a pluggable [`CacheStore`](strata_cache::CacheStore).
//!
//! # Quick Start
//!
//! ## Configure a model
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use strata_orm::{Model, ModelConfig};
//! use strata_sql::SqliteDatabase;
//! use strata_cache::MemoryCache;
//!
//! let config = ModelConfig::builder("users")
//!     .primary_key("id")
//!     .default_limit(25)
//!     .searchable_fields(["name", "email"])
//!     .use_cache(true)
//!     .cache_ttl(Duration::from_secs(30))
//!     .build();
//!
//! let db = Arc::new(SqliteDatabase::open("app.db")?);
//! let users = Model::new(config, db).with_cache(Arc::new(MemoryCache::default()));
//! ```
//!
//! ## Query
//!
//! ```ignore
//! use serde_json::json;
//!
//! // Structured call: filters, sorting, pagination, search, relations.
//! let page = users
//!     .find_all_json(json!({
//!         "filters": {"role": "admin", "age": {"gte": 21}},
//!         "sort": "-created_at",
//!         "pagination": {"page": 2, "limit": 25},
//!         "relations": [{
//!             "table": "posts",
//!             "foreignKey": "user_id",
//!             "type": "many",
//!             "select": ["id", "title"]
//!         }]
//!     }))
//!     .await?;
//!
//! assert_eq!(page.pagination.page, 2);
//!
//! // Legacy call: a bare filter mapping forces total-count computation.
//! let admins = users.find_all_json(json!({"role": "admin"})).await?;
//! ```
//!
//! ## Write
//!
//! ```ignore
//! let created = users.create(record(json!({"name": "Ada"}))).await?;
//! let id = created["id"].clone();
//!
//! users.update(&id, record(json!({"name": "Ada L."}))).await?;
//! users.delete(&id).await?;
//! ```
//!
//! ## Transactions
//!
//! ```ignore
//! users
//!     .run_in_transaction(|tx| async move {
//!         let ada = tx.create(record(json!({"name": "Ada"}))).await?;
//!         tx.update(&ada["id"], record(json!({"verified": true}))).await?;
//!         Ok(())
//!     })
//!     .await?;
//! ```

#![forbid(unsafe_code)]

mod config;
mod error;
mod ids;
mod model;
mod reassemble;
mod spec;
mod sql;
mod txn;

pub use config::{ModelConfig, ModelConfigBuilder};
pub use error::{Error, Result};
pub use ids::{BackendAssigned, IdStrategy, UuidIds};
pub use model::{Model, WriteResult};
pub use spec::{
    FieldSelection, FilterMap, PageInfo, PaginationSpec, QueryInput, QueryResult, QuerySpec,
    RelationKind, RelationSpec, SortSpec,
};
pub use sql::Statement;
// Re-export the collaborator contracts for convenience.
pub use strata_cache::CacheStore;
pub use strata_sql::{Database, Executor, Row, Transaction, Value};
pub use txn::ScopedModel;

/// An entity: an opaque mapping from column name to value. Structurally the
/// same as a backend [`Row`].
pub type Entity = Row;
