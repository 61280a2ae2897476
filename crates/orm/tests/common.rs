//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Value, json};
use strata_orm::{Entity, Model, ModelConfig};
use strata_sql::{Database, Executor, FutureResult, Row, SqliteDatabase, Transaction};

/// Build an entity from a JSON object literal.
pub fn record(value: Value) -> Entity {
    value.as_object().expect("record literal must be an object").clone()
}

/// Initialize test logging once; respects `RUST_LOG`.
fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// An in-memory database with the test schema applied.
pub async fn test_db() -> Arc<SqliteDatabase> {
    init_tracing();
    let db = SqliteDatabase::open_in_memory().expect("open in-memory database");

    for ddl in [
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            email TEXT,
            role TEXT,
            age INTEGER,
            active INTEGER DEFAULT 1
        )",
        "CREATE TABLE posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            title TEXT,
            published INTEGER DEFAULT 0
        )",
        "CREATE TABLE profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            bio TEXT
        )",
        "CREATE TABLE docs (id TEXT PRIMARY KEY, title TEXT)",
    ] {
        db.execute(ddl.to_string(), vec![]).await.expect("create table");
    }

    Arc::new(db)
}

/// [`test_db`] seeded with twelve users, a handful of posts and one profile.
pub async fn seeded_db() -> Arc<SqliteDatabase> {
    let db = test_db().await;

    for i in 1..=12u8 {
        let role = if i <= 3 { "admin" } else { "member" };
        db.execute(
            "INSERT INTO users (name, email, role, age) VALUES (?, ?, ?, ?)".to_string(),
            vec![
                json!(format!("user{i:02}")),
                json!(format!("user{i:02}@example.com")),
                json!(role),
                json!(20 + u32::from(i)),
            ],
        )
        .await
        .expect("seed user");
    }

    for (user_id, title, published) in
        [(1, "intro", 1), (1, "draft", 0), (2, "hello", 1)]
    {
        db.execute(
            "INSERT INTO posts (user_id, title, published) VALUES (?, ?, ?)".to_string(),
            vec![json!(user_id), json!(title), json!(published)],
        )
        .await
        .expect("seed post");
    }

    db.execute(
        "INSERT INTO profiles (user_id, bio) VALUES (?, ?)".to_string(),
        vec![json!(1), json!("first user")],
    )
    .await
    .expect("seed profile");

    db
}

/// The standard `users` model: integer primary keys assigned by the backend.
pub fn users_model(db: Arc<dyn Database>) -> Model {
    let config = ModelConfig::builder("users")
        .searchable_fields(["name", "email"])
        .default_limit(10)
        .max_limit(50)
        .build();
    Model::new(config, db).with_ids(strata_orm::BackendAssigned)
}

/// A database wrapper counting statements, for asserting cache behavior.
#[derive(Debug, Clone)]
pub struct CountingDb {
    inner: Arc<SqliteDatabase>,
    calls: Arc<AtomicU64>,
}

impl CountingDb {
    pub fn new(inner: Arc<SqliteDatabase>) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Executor for CountingDb {
    fn execute(&self, sql: String, params: Vec<Value>) -> FutureResult<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(sql, params)
    }
}

impl Database for CountingDb {
    fn begin(&self) -> FutureResult<Arc<dyn Transaction>> {
        self.inner.begin()
    }
}
