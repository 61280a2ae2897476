//! SQL statement compilation.
//!
//! A [`QueryCompiler`] turns a [`QuerySpec`] into parameterized statements:
//! filter maps compile into `AND`-joined conditions with a parallel ordered
//! parameter list, relations into `JOIN` clauses over generated table
//! aliases (`t1` is always the main table, relations get `t2`… in encounter
//! order), and sorting/search/pagination into their clauses. Values are
//! always bound through `?` placeholders, never interpolated; identifiers
//! come from the model configuration and query spec as-is.
//!
//! The count and data statements produced for one spec share the same WHERE
//! clause and the identical parameter list.

use serde_json::Value;

use crate::Entity;
use crate::config::ModelConfig;
use crate::spec::{FieldSelection, FilterMap, PaginationSpec, QuerySpec, RelationSpec, SortSpec};

/// Alias of the main table in every compiled statement.
pub(crate) const MAIN_ALIAS: &str = "t1";

/// A compiled statement: SQL text plus its ordered parameters.
#[derive(Debug, Clone)]
pub struct Statement {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Parameters bound in order.
    pub params: Vec<Value>,
}

/// A resolved page selection.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Page {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Clamp a caller-supplied page selection against the model's limits.
pub(crate) fn resolve_page(config: &ModelConfig, pagination: PaginationSpec) -> Page {
    let page = pagination.page.unwrap_or(1).max(1);
    let limit = pagination
        .limit
        .map_or(config.default_limit, |limit| limit.clamp(1, config.max_limit.max(1)));
    Page {
        page,
        limit,
        offset: page.saturating_sub(1).saturating_mul(limit),
    }
}

/// A relation with both join columns present, bound to its generated alias.
struct JoinedRelation<'a> {
    spec: &'a RelationSpec,
    table: &'a str,
    foreign_key: &'a str,
    alias: String,
}

/// Compiles one query spec into statements.
pub(crate) struct QueryCompiler<'a> {
    config: &'a ModelConfig,
    relations: Vec<JoinedRelation<'a>>,
}

impl<'a> QueryCompiler<'a> {
    /// Builds a compiler over the given relations. Specs missing `table` or
    /// `foreignKey` are skipped and never allocated an alias.
    pub fn new(config: &'a ModelConfig, specs: &'a [RelationSpec]) -> Self {
        let relations = specs
            .iter()
            .filter_map(|spec| spec.join_parts().map(|(table, foreign_key)| (spec, table, foreign_key)))
            .enumerate()
            .map(|(i, (spec, table, foreign_key))| JoinedRelation {
                spec,
                table,
                foreign_key,
                alias: format!("t{}", i + 2),
            })
            .collect();
        Self { config, relations }
    }

    pub fn has_joins(&self) -> bool {
        !self.relations.is_empty()
    }

    /// The data statement: projection, joins, conditions, grouping, ordering
    /// and the optional page window.
    pub fn data_statement(&self, spec: &QuerySpec, page: Option<Page>) -> Statement {
        let (conditions, params) = self.conditions(spec);

        let mut sql =
            format!("SELECT {} FROM {} {MAIN_ALIAS}", self.select_list(spec), self.config.table);
        for join in self.join_clauses() {
            sql.push(' ');
            sql.push_str(&join);
        }
        push_where(&mut sql, &conditions);
        if self.has_joins() {
            // Joins fan rows out; collapse back to one row per entity.
            sql.push_str(&format!(" GROUP BY {MAIN_ALIAS}.{}", self.config.primary_key));
        }
        if let Some(order) = spec.sort.as_ref().and_then(|sort| self.order_clause(sort)) {
            sql.push_str(&format!(" ORDER BY {order}"));
        }
        if let Some(page) = page {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", page.limit, page.offset));
        }

        tracing::debug!(
            table = %self.config.table,
            sql = %sql,
            param_count = params.len(),
            "compiled data statement"
        );

        Statement { sql, params }
    }

    /// The count statement sharing the data statement's conditions and
    /// parameters.
    pub fn count_statement(&self, spec: &QuerySpec) -> Statement {
        let (conditions, params) = self.conditions(spec);

        let count = if self.has_joins() {
            // Joins duplicate primary rows; count entities, not tuples.
            format!("COUNT(DISTINCT {MAIN_ALIAS}.{})", self.config.primary_key)
        } else {
            "COUNT(*)".to_string()
        };
        let mut sql = format!("SELECT {count} AS total FROM {} {MAIN_ALIAS}", self.config.table);
        for join in self.join_clauses() {
            sql.push(' ');
            sql.push_str(&join);
        }
        push_where(&mut sql, &conditions);

        tracing::debug!(
            table = %self.config.table,
            sql = %sql,
            param_count = params.len(),
            "compiled count statement"
        );

        Statement { sql, params }
    }

    /// All conditions for the spec, in order: relation-scoped filters,
    /// main-table filters, then the search group.
    fn conditions(&self, spec: &QuerySpec) -> (Vec<String>, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        for relation in &self.relations {
            self.compile_filters(&relation.spec.filters, &relation.alias, &mut conditions, &mut params);
        }
        self.compile_filters(&spec.filters, MAIN_ALIAS, &mut conditions, &mut params);

        if let Some(term) = spec.search.as_deref()
            && let Some(condition) = self.search_condition(term, &mut params)
        {
            conditions.push(condition);
        }

        (conditions, params)
    }

    /// Compile one filter map against `default_alias`.
    fn compile_filters(
        &self, filters: &FilterMap, default_alias: &str, conditions: &mut Vec<String>,
        params: &mut Vec<Value>,
    ) {
        for (key, value) in filters {
            let (alias, column) = self.resolve(key, default_alias);
            let target = format!("{alias}.{column}");

            match value {
                Value::Null => conditions.push(format!("{target} IS NULL")),
                // An empty membership test can match nothing; short-circuit
                // instead of emitting invalid `IN ()`.
                Value::Array(items) if items.is_empty() => conditions.push("FALSE".to_string()),
                Value::Array(items) => {
                    let placeholders = vec!["?"; items.len()].join(", ");
                    conditions.push(format!("{target} IN ({placeholders})"));
                    params.extend(items.iter().cloned());
                }
                Value::Object(operators) => {
                    for (op, operand) in operators {
                        if operand.is_null() {
                            let test = if op.as_str() == "ne" { "IS NOT NULL" } else { "IS NULL" };
                            conditions.push(format!("{target} {test}"));
                        } else {
                            conditions.push(format!("{target} {} ?", comparison_token(op)));
                            params.push(operand.clone());
                        }
                    }
                }
                scalar => {
                    conditions.push(format!("{target} = ?"));
                    params.push(scalar.clone());
                }
            }
        }
    }

    /// The projection: main-table fields plus `"<as>.<col>"` compound-aliased
    /// relation fields.
    fn select_list(&self, spec: &QuerySpec) -> String {
        let mut parts = self.main_projection(spec.fields.as_ref());

        for relation in &self.relations {
            let Some(attach) = relation.spec.attach_key() else {
                continue;
            };
            // `"*"` (or no select) joins for filtering only; there is no
            // column list to prefix.
            if let Some(columns) = relation.spec.select.as_ref().and_then(FieldSelection::columns) {
                for column in columns {
                    parts.push(format!("{}.{column} AS \"{attach}.{column}\"", relation.alias));
                }
            }
        }

        parts.join(", ")
    }

    /// The alias-qualified main-table projection.
    fn main_projection(&self, fields: Option<&FieldSelection>) -> Vec<String> {
        fields.and_then(FieldSelection::columns).map_or_else(
            || vec![format!("{MAIN_ALIAS}.*")],
            |columns| {
                columns
                    .into_iter()
                    .map(|column| {
                        let (alias, column) = self.resolve(column, MAIN_ALIAS);
                        format!("{alias}.{column}")
                    })
                    .collect()
            },
        )
    }

    fn join_clauses(&self) -> Vec<String> {
        self.relations
            .iter()
            .map(|relation| {
                let local =
                    relation.spec.local_key.as_deref().unwrap_or(&self.config.primary_key);
                format!(
                    "{} JOIN {} {} ON {MAIN_ALIAS}.{local} = {}.{}",
                    relation.spec.kind.join_keyword(),
                    relation.table,
                    relation.alias,
                    relation.alias,
                    relation.foreign_key,
                )
            })
            .collect()
    }

    /// One parenthesized OR-group of LIKE conditions over the searchable
    /// fields, or `None` when the term or field list is empty.
    fn search_condition(&self, term: &str, params: &mut Vec<Value>) -> Option<String> {
        if term.is_empty() || self.config.searchable_fields.is_empty() {
            return None;
        }
        let fragments: Vec<String> = self
            .config
            .searchable_fields
            .iter()
            .map(|field| {
                let (alias, column) = self.resolve(field, MAIN_ALIAS);
                params.push(Value::String(format!("%{term}%")));
                format!("{alias}.{column} LIKE ?")
            })
            .collect();
        Some(format!("({})", fragments.join(" OR ")))
    }

    fn order_clause(&self, sort: &SortSpec) -> Option<String> {
        let entries: Vec<String> = match sort {
            SortSpec::Column(raw) => vec![self.order_entry(raw, None)],
            SortSpec::Columns(list) => list.iter().map(|raw| self.order_entry(raw, None)).collect(),
            SortSpec::Directed(map) => map
                .iter()
                .map(|(column, direction)| {
                    let descending =
                        direction.as_str().is_some_and(|d| d.eq_ignore_ascii_case("desc"));
                    self.order_entry(column, Some(descending))
                })
                .collect(),
        };
        if entries.is_empty() { None } else { Some(entries.join(", ")) }
    }

    fn order_entry(&self, raw: &str, direction: Option<bool>) -> String {
        let (column, descending) = match direction {
            Some(descending) => (raw, descending),
            None => raw.strip_prefix('-').map_or((raw, false), |rest| (rest, true)),
        };
        let (alias, column) = self.resolve(column, MAIN_ALIAS);
        let direction = if descending { "DESC" } else { "ASC" };
        format!("{alias}.{column} {direction}")
    }

    /// Resolve an optionally `table.column`-qualified key to an alias and
    /// column. Unknown prefixes are treated as part of the column name.
    fn resolve(&self, key: &str, default_alias: &str) -> (String, String) {
        if let Some((prefix, column)) = key.split_once('.')
            && let Some(alias) = self.alias_of(prefix)
        {
            return (alias.to_string(), column.to_string());
        }
        (default_alias.to_string(), key.to_string())
    }

    fn alias_of(&self, table: &str) -> Option<&str> {
        if table == self.config.table {
            return Some(MAIN_ALIAS);
        }
        self.relations
            .iter()
            .find(|relation| relation.table == table)
            .map(|relation| relation.alias.as_str())
    }
}

fn push_where(sql: &mut String, conditions: &[String]) {
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
}

/// The comparison token for an operator key; unrecognized keys fall back to
/// equality.
fn comparison_token(op: &str) -> &'static str {
    match op {
        "gt" => ">",
        "lt" => "<",
        "gte" => ">=",
        "lte" => "<=",
        "ne" => "!=",
        "like" => "LIKE",
        "ilike" => "ILIKE",
        _ => "=",
    }
}

/// `INSERT … RETURNING *` for one record.
pub(crate) fn insert_statement(table: &str, data: &Entity) -> Statement {
    let columns: Vec<&str> = data.keys().map(String::as_str).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders}) RETURNING *",
        columns.join(", "),
    );
    let params = data.values().cloned().collect();

    tracing::debug!(table, sql = %sql, "compiled insert statement");
    Statement { sql, params }
}

/// `UPDATE … WHERE pk = ? RETURNING *` for one record.
pub(crate) fn update_statement(
    table: &str, primary_key: &str, id: &Value, data: &Entity,
) -> Statement {
    let assignments: Vec<String> = data.keys().map(|column| format!("{column} = ?")).collect();
    let sql = format!(
        "UPDATE {table} SET {} WHERE {primary_key} = ? RETURNING *",
        assignments.join(", "),
    );
    let mut params: Vec<Value> = data.values().cloned().collect();
    params.push(id.clone());

    tracing::debug!(table, sql = %sql, "compiled update statement");
    Statement { sql, params }
}

/// `DELETE … WHERE pk = ? RETURNING *` for one record.
pub(crate) fn delete_statement(table: &str, primary_key: &str, id: &Value) -> Statement {
    let sql = format!("DELETE FROM {table} WHERE {primary_key} = ? RETURNING *");

    tracing::debug!(table, sql = %sql, "compiled delete statement");
    Statement {
        sql,
        params: vec![id.clone()],
    }
}

/// `SELECT … WHERE column = ? LIMIT 1` for single-record lookups.
pub(crate) fn select_one_statement(
    config: &ModelConfig, column: &str, value: &Value, fields: Option<&FieldSelection>,
) -> Statement {
    let compiler = QueryCompiler::new(config, &[]);
    let projection = compiler.main_projection(fields).join(", ");
    let (alias, column) = compiler.resolve(column, MAIN_ALIAS);
    let sql = format!(
        "SELECT {projection} FROM {} {MAIN_ALIAS} WHERE {alias}.{column} = ? LIMIT 1",
        config.table,
    );

    tracing::debug!(table = %config.table, sql = %sql, "compiled lookup statement");
    Statement {
        sql,
        params: vec![value.clone()],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::spec::RelationKind;

    fn config() -> ModelConfig {
        ModelConfig::builder("users")
            .searchable_fields(["name", "email"])
            .default_limit(10)
            .max_limit(100)
            .build()
    }

    fn filters(value: Value) -> FilterMap {
        value.as_object().expect("object").clone()
    }

    fn compile(filter_map: FilterMap) -> (Vec<String>, Vec<Value>) {
        let config = config();
        let compiler = QueryCompiler::new(&config, &[]);
        let spec = QuerySpec {
            filters: filter_map,
            ..QuerySpec::default()
        };
        compiler.conditions(&spec)
    }

    #[test]
    fn scalar_compiles_to_bound_equality() {
        let (conditions, params) = compile(filters(json!({"role": "admin"})));
        assert_eq!(conditions, vec!["t1.role = ?"]);
        assert_eq!(params, vec![json!("admin")]);
    }

    #[test]
    fn null_compiles_to_is_null() {
        let (conditions, params) = compile(filters(json!({"deleted_at": null})));
        assert_eq!(conditions, vec!["t1.deleted_at IS NULL"]);
        assert!(params.is_empty());
    }

    #[test]
    fn empty_membership_short_circuits_to_false() {
        let (conditions, params) = compile(filters(json!({"id": [], "role": "admin"})));
        assert_eq!(conditions, vec!["FALSE", "t1.role = ?"]);
        assert_eq!(params, vec![json!("admin")]);
    }

    #[test]
    fn membership_binds_every_element_in_order() {
        let (conditions, params) = compile(filters(json!({"status": ["active", "pending"]})));
        assert_eq!(conditions, vec!["t1.status IN (?, ?)"]);
        assert_eq!(params, vec![json!("active"), json!("pending")]);
    }

    #[test]
    fn operator_object_emits_one_condition_per_key() {
        let (conditions, params) = compile(filters(json!({"age": {"gt": 25, "lte": 60}})));
        assert_eq!(conditions, vec!["t1.age > ?", "t1.age <= ?"]);
        assert_eq!(params, vec![json!(25), json!(60)]);
    }

    #[test]
    fn unknown_operator_falls_back_to_equality() {
        let (conditions, params) = compile(filters(json!({"age": {"approximately": 30}})));
        assert_eq!(conditions, vec!["t1.age = ?"]);
        assert_eq!(params, vec![json!(30)]);
    }

    #[test]
    fn null_operands_special_case_ne() {
        let (conditions, params) =
            compile(filters(json!({"a": {"ne": null}, "b": {"gt": null}})));
        assert_eq!(conditions, vec!["t1.a IS NOT NULL", "t1.b IS NULL"]);
        assert!(params.is_empty());
    }

    #[test]
    fn like_operators_pass_patterns_through() {
        let (conditions, params) =
            compile(filters(json!({"name": {"like": "Al%"}, "email": {"ilike": "%@EXAMPLE.%"}})));
        assert_eq!(conditions, vec!["t1.email ILIKE ?", "t1.name LIKE ?"]);
        assert_eq!(params, vec![json!("%@EXAMPLE.%"), json!("Al%")]);
    }

    #[test]
    fn qualified_keys_resolve_to_relation_aliases() {
        let config = config();
        let relations = vec![RelationSpec::new("posts", "user_id")];
        let compiler = QueryCompiler::new(&config, &relations);
        let spec = QuerySpec {
            filters: filters(json!({"posts.published": true, "users.role": "admin"})),
            relations: relations.clone(),
            ..QuerySpec::default()
        };

        let (conditions, _) = compiler.conditions(&spec);
        assert_eq!(conditions, vec!["t2.published = ?", "t1.role = ?"]);
    }

    #[test]
    fn unknown_prefix_stays_on_the_main_alias() {
        let (conditions, _) = compile(filters(json!({"meta.color": "red"})));
        assert_eq!(conditions, vec!["t1.meta.color = ?"]);
    }

    #[test]
    fn relation_filters_compile_before_main_filters() {
        let config = config();
        let relations =
            vec![RelationSpec::new("posts", "user_id").filters(filters(json!({"published": true})))];
        let compiler = QueryCompiler::new(&config, &relations);
        let spec = QuerySpec {
            filters: filters(json!({"role": "admin"})),
            relations: relations.clone(),
            ..QuerySpec::default()
        };

        let (conditions, params) = compiler.conditions(&spec);
        assert_eq!(conditions, vec!["t2.published = ?", "t1.role = ?"]);
        assert_eq!(params, vec![json!(true), json!("admin")]);
    }

    #[test]
    fn data_statement_with_joins_groups_by_primary_key() {
        let config = config();
        let relations = vec![
            RelationSpec::new("posts", "user_id").kind(RelationKind::Many).select(["id", "title"]),
        ];
        let compiler = QueryCompiler::new(&config, &relations);
        let spec = QuerySpec {
            relations: relations.clone(),
            ..QuerySpec::default()
        };

        let statement = compiler.data_statement(&spec, None);
        assert_eq!(
            statement.sql,
            "SELECT t1.*, t2.id AS \"posts.id\", t2.title AS \"posts.title\" \
             FROM users t1 LEFT JOIN posts t2 ON t1.id = t2.user_id GROUP BY t1.id",
        );
    }

    #[test]
    fn join_uses_local_key_and_kind() {
        let config = config();
        let relations = vec![
            RelationSpec::new("accounts", "owner").local_key("account_id").kind(RelationKind::Inner),
        ];
        let compiler = QueryCompiler::new(&config, &relations);
        let spec = QuerySpec {
            relations: relations.clone(),
            ..QuerySpec::default()
        };

        let statement = compiler.data_statement(&spec, None);
        assert!(
            statement.sql.contains("INNER JOIN accounts t2 ON t1.account_id = t2.owner"),
            "unexpected SQL: {}",
            statement.sql,
        );
    }

    #[test]
    fn incomplete_relations_are_skipped() {
        let config = config();
        let relations = vec![
            RelationSpec {
                table: Some("posts".to_string()),
                ..RelationSpec::default()
            },
            RelationSpec::new("comments", "user_id"),
        ];
        let compiler = QueryCompiler::new(&config, &relations);
        let spec = QuerySpec {
            relations: relations.clone(),
            ..QuerySpec::default()
        };

        let statement = compiler.data_statement(&spec, None);
        assert!(!statement.sql.contains("JOIN posts"));
        // The surviving relation takes the first generated alias.
        assert!(statement.sql.contains("LEFT JOIN comments t2 ON t1.id = t2.user_id"));
    }

    #[test]
    fn count_statement_is_distinct_under_joins() {
        let config = config();
        let relations = vec![RelationSpec::new("posts", "user_id")];
        let compiler = QueryCompiler::new(&config, &relations);
        let spec = QuerySpec {
            relations: relations.clone(),
            ..QuerySpec::default()
        };

        let statement = compiler.count_statement(&spec);
        assert!(statement.sql.starts_with("SELECT COUNT(DISTINCT t1.id) AS total"));
        assert!(!statement.sql.contains("GROUP BY"));

        let plain = QueryCompiler::new(&config, &[]).count_statement(&QuerySpec::default());
        assert_eq!(plain.sql, "SELECT COUNT(*) AS total FROM users t1");
    }

    #[test]
    fn count_and_data_share_parameters() {
        let config = config();
        let compiler = QueryCompiler::new(&config, &[]);
        let spec = QuerySpec {
            filters: filters(json!({"age": {"gt": 21}, "role": ["admin", "editor"]})),
            search: Some("smith".to_string()),
            ..QuerySpec::default()
        };

        let count = compiler.count_statement(&spec);
        let data = compiler.data_statement(&spec, Some(resolve_page(&config, PaginationSpec::default())));
        assert_eq!(count.params, data.params);
    }

    #[test]
    fn search_builds_one_or_group() {
        let config = config();
        let compiler = QueryCompiler::new(&config, &[]);
        let spec = QuerySpec {
            search: Some("ann".to_string()),
            ..QuerySpec::default()
        };

        let (conditions, params) = compiler.conditions(&spec);
        assert_eq!(conditions, vec!["(t1.name LIKE ? OR t1.email LIKE ?)"]);
        assert_eq!(params, vec![json!("%ann%"), json!("%ann%")]);
    }

    #[test]
    fn empty_search_term_is_ignored() {
        let config = config();
        let compiler = QueryCompiler::new(&config, &[]);
        let spec = QuerySpec {
            search: Some(String::new()),
            ..QuerySpec::default()
        };
        let (conditions, _) = compiler.conditions(&spec);
        assert!(conditions.is_empty());
    }

    #[test]
    fn sort_variants() {
        let config = config();
        let compiler = QueryCompiler::new(&config, &[]);

        let single = compiler.order_clause(&SortSpec::Column("-created_at".to_string()));
        assert_eq!(single.as_deref(), Some("t1.created_at DESC"));

        let multi = compiler.order_clause(&SortSpec::Columns(vec![
            "name".to_string(),
            "-age".to_string(),
        ]));
        assert_eq!(multi.as_deref(), Some("t1.name ASC, t1.age DESC"));

        let directed = compiler.order_clause(&SortSpec::Directed(
            json!({"name": "DESC"}).as_object().expect("object").clone(),
        ));
        assert_eq!(directed.as_deref(), Some("t1.name DESC"));
    }

    #[test]
    fn pagination_clamps() {
        let config = config();

        let page = resolve_page(
            &config,
            PaginationSpec {
                page: Some(0),
                limit: Some(500),
            },
        );
        assert_eq!((page.page, page.limit, page.offset), (1, 100, 0));

        let page = resolve_page(
            &config,
            PaginationSpec {
                page: Some(3),
                limit: None,
            },
        );
        assert_eq!((page.page, page.limit, page.offset), (3, 10, 20));

        let page = resolve_page(
            &config,
            PaginationSpec {
                page: None,
                limit: Some(0),
            },
        );
        assert_eq!(page.limit, 1);
    }

    #[test]
    fn limit_and_offset_are_inlined() {
        let config = config();
        let compiler = QueryCompiler::new(&config, &[]);
        let page = resolve_page(
            &config,
            PaginationSpec {
                page: Some(2),
                limit: Some(5),
            },
        );

        let statement = compiler.data_statement(&QuerySpec::default(), Some(page));
        assert!(statement.sql.ends_with("LIMIT 5 OFFSET 5"), "unexpected SQL: {}", statement.sql);
    }

    #[test]
    fn projection_expands_field_selections() {
        let config = config();
        let compiler = QueryCompiler::new(&config, &[]);

        let spec = QuerySpec {
            fields: Some(FieldSelection::Columns(vec!["id".to_string(), "name".to_string()])),
            ..QuerySpec::default()
        };
        let statement = compiler.data_statement(&spec, None);
        assert!(statement.sql.starts_with("SELECT t1.id, t1.name FROM users t1"));

        let spec = QuerySpec {
            fields: Some(FieldSelection::Column("*".to_string())),
            ..QuerySpec::default()
        };
        let statement = compiler.data_statement(&spec, None);
        assert!(statement.sql.starts_with("SELECT t1.* FROM users t1"));
    }

    #[test]
    fn write_statements() {
        let mut data = Entity::new();
        data.insert("name".to_string(), json!("Ada"));
        data.insert("role".to_string(), json!("admin"));

        let insert = insert_statement("users", &data);
        assert_eq!(insert.sql, "INSERT INTO users (name, role) VALUES (?, ?) RETURNING *");
        assert_eq!(insert.params, vec![json!("Ada"), json!("admin")]);

        let update = update_statement("users", "id", &json!(7), &data);
        assert_eq!(update.sql, "UPDATE users SET name = ?, role = ? WHERE id = ? RETURNING *");
        assert_eq!(update.params, vec![json!("Ada"), json!("admin"), json!(7)]);

        let delete = delete_statement("users", "id", &json!(7));
        assert_eq!(delete.sql, "DELETE FROM users WHERE id = ? RETURNING *");
        assert_eq!(delete.params, vec![json!(7)]);
    }

    #[test]
    fn lookup_statement_limits_to_one_row() {
        let config = config();
        let statement = select_one_statement(&config, "email", &json!("a@b.c"), None);
        assert_eq!(statement.sql, "SELECT t1.* FROM users t1 WHERE t1.email = ? LIMIT 1");
        assert_eq!(statement.params, vec![json!("a@b.c")]);
    }
}
