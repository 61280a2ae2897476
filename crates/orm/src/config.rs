//! Per-table model configuration.

use std::time::Duration;

/// Configuration for one [`Model`](crate::Model): the table it maps, its
/// primary key, paging limits, searchable fields and cache policy.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Table name.
    pub table: String,
    /// Primary key column.
    pub primary_key: String,
    /// Page size applied when a query paginates without an explicit limit.
    pub default_limit: u64,
    /// Upper bound for caller-supplied limits.
    pub max_limit: u64,
    /// Columns the `search` term matches against. Entries may be
    /// `table.column`-qualified when relations are joined.
    pub searchable_fields: Vec<String>,
    /// Whether read results are cached (requires a cache store on the model).
    pub use_cache: bool,
    /// Time-to-live for cached results.
    pub cache_ttl: Duration,
}

impl ModelConfig {
    /// Start building a configuration for `table`.
    #[must_use]
    pub fn builder(table: impl Into<String>) -> ModelConfigBuilder {
        ModelConfigBuilder {
            config: Self {
                table: table.into(),
                primary_key: "id".to_string(),
                default_limit: 10,
                max_limit: 100,
                searchable_fields: Vec::new(),
                use_cache: false,
                cache_ttl: Duration::from_secs(60),
            },
        }
    }
}

/// Builder for [`ModelConfig`].
#[derive(Debug)]
pub struct ModelConfigBuilder {
    config: ModelConfig,
}

impl ModelConfigBuilder {
    /// Sets the primary key column (default `id`).
    #[must_use]
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.config.primary_key = column.into();
        self
    }

    /// Sets the page size used when no explicit limit is given (default 10).
    #[must_use]
    pub const fn default_limit(mut self, limit: u64) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Sets the upper bound for caller-supplied limits (default 100).
    #[must_use]
    pub const fn max_limit(mut self, limit: u64) -> Self {
        self.config.max_limit = limit;
        self
    }

    /// Sets the columns matched by search terms.
    #[must_use]
    pub fn searchable_fields(
        mut self, fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.config.searchable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables result caching (default off).
    #[must_use]
    pub const fn use_cache(mut self, enabled: bool) -> Self {
        self.config.use_cache = enabled;
        self
    }

    /// Sets the TTL for cached results (default 60s).
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> ModelConfig {
        self.config
    }
}
