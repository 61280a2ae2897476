//! Reassembly of flat joined rows into nested entities.
//!
//! The data statement selects relation columns under `"<as>.<col>"` compound
//! aliases, so every row carries its relation data inline. Reassembly walks
//! the rows once, collapses duplicate primary rows (a one-to-many join fans
//! out), strips the compound keys off the base record and nests them under
//! the relation's attach key: an object for single-valued relations, an
//! array for `many`. A relation with nothing to attach yields an empty
//! object/array, never null, so downstream field access stays total.

use std::collections::HashMap;

use serde_json::Value;
use strata_sql::Row;

use crate::Entity;
use crate::spec::{FieldSelection, RelationSpec};

/// A relation that participates in reassembly.
struct Attachment<'a> {
    /// Key the nested data appears under.
    key: &'a str,
    /// The compound-alias prefix on row columns (`"<key>."`).
    prefix: String,
    many: bool,
    /// Single-column select: nested data collapses to this column's raw
    /// value instead of a one-key object.
    collapse: Option<String>,
}

/// Nest flat rows into entities according to the relation specs.
///
/// Rows whose primary key is missing or null pass through unchanged; for the
/// rest, the first occurrence of a primary-key value wins the base fields
/// and later occurrences only extend `many` arrays.
pub(crate) fn reassemble(
    rows: Vec<Row>, relations: &[RelationSpec], primary_key: &str,
) -> Vec<Entity> {
    let attachments: Vec<Attachment<'_>> = relations
        .iter()
        .filter(|spec| spec.join_parts().is_some())
        .filter_map(|spec| {
            let key = spec.attach_key()?;
            let collapse = spec.select.as_ref().and_then(FieldSelection::columns).and_then(
                |columns| match columns.as_slice() {
                    [only] => Some((*only).to_string()),
                    _ => None,
                },
            );
            Some(Attachment {
                key,
                prefix: format!("{key}."),
                many: spec.kind.is_many(),
                collapse,
            })
        })
        .collect();

    if attachments.is_empty() {
        return rows;
    }

    let mut out: Vec<Entity> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let pk_key = match row.get(primary_key) {
            Some(value) if !value.is_null() => value.to_string(),
            _ => {
                out.push(row);
                continue;
            }
        };

        if let Some(&at) = seen.get(&pk_key) {
            // A repeated primary row only ever contributes relation children.
            for attachment in attachments.iter().filter(|a| a.many) {
                if let Some(child) = extract_child(&row, attachment)
                    && let Some(Value::Array(children)) = out[at].get_mut(attachment.key)
                {
                    children.push(child);
                }
            }
            continue;
        }

        let mut entity = Entity::new();
        for (column, value) in &row {
            if attachments.iter().any(|a| column.starts_with(&a.prefix)) {
                continue;
            }
            entity.insert(column.clone(), value.clone());
        }
        for attachment in &attachments {
            let child = extract_child(&row, attachment);
            let nested = if attachment.many {
                Value::Array(child.into_iter().collect())
            } else {
                child.unwrap_or_else(|| empty_single(attachment))
            };
            entity.insert(attachment.key.to_string(), nested);
        }

        seen.insert(pk_key, out.len());
        out.push(entity);
    }

    out
}

/// Extract one relation child from a row, or `None` when the row carries no
/// data for it (no compound keys, or a left-join miss with all-null values).
fn extract_child(row: &Row, attachment: &Attachment<'_>) -> Option<Value> {
    if let Some(column) = &attachment.collapse {
        let value = row.get(&format!("{}{column}", attachment.prefix))?;
        if value.is_null() { None } else { Some(value.clone()) }
    } else {
        let mut child = Entity::new();
        let mut present = false;
        for (column, value) in row {
            if let Some(field) = column.strip_prefix(&attachment.prefix) {
                if !value.is_null() {
                    present = true;
                }
                child.insert(field.to_string(), value.clone());
            }
        }
        present.then(|| Value::Object(child))
    }
}

fn empty_single(attachment: &Attachment<'_>) -> Value {
    if attachment.collapse.is_some() {
        Value::Null
    } else {
        Value::Object(Entity::new())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::spec::RelationKind;

    fn row(value: Value) -> Row {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn no_relations_is_identity() {
        let rows = vec![row(json!({"id": 1, "name": "Ada"}))];
        let out = reassemble(rows.clone(), &[], "id");
        assert_eq!(out, rows);
    }

    #[test]
    fn duplicate_primary_rows_collapse_and_accumulate_children() {
        let relations = vec![
            RelationSpec::new("posts", "user_id").kind(RelationKind::Many).select(["id", "title"]),
        ];
        let rows = vec![
            row(json!({"id": 1, "name": "Ada", "posts.id": 10, "posts.title": "a"})),
            row(json!({"id": 1, "name": "Ada", "posts.id": 11, "posts.title": "b"})),
            row(json!({"id": 2, "name": "Bob", "posts.id": null, "posts.title": null})),
        ];

        let out = reassemble(rows, &relations, "id");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["name"], json!("Ada"));
        assert_eq!(
            out[0]["posts"],
            json!([{"id": 10, "title": "a"}, {"id": 11, "title": "b"}]),
        );
        // Zero children is an empty array, never null.
        assert_eq!(out[1]["posts"], json!([]));
        assert!(!out[1].contains_key("posts.id"));
    }

    #[test]
    fn single_relation_nests_an_object() {
        let relations =
            vec![RelationSpec::new("profiles", "user_id").alias("profile").select(["bio", "url"])];
        let rows = vec![
            row(json!({"id": 1, "profile.bio": "hi", "profile.url": "example.com"})),
            row(json!({"id": 2, "profile.bio": null, "profile.url": null})),
        ];

        let out = reassemble(rows, &relations, "id");
        assert_eq!(out[0]["profile"], json!({"bio": "hi", "url": "example.com"}));
        // A left-join miss is an empty object, never null.
        assert_eq!(out[1]["profile"], json!({}));
    }

    #[test]
    fn single_column_select_collapses_to_scalar() {
        let relations = vec![
            RelationSpec::new("roles", "id").local_key("role_id").select(["name"]),
            RelationSpec::new("posts", "user_id").kind(RelationKind::Many).select(["title"]),
        ];
        let rows = vec![
            row(json!({"id": 1, "roles.name": "admin", "posts.title": "a"})),
            row(json!({"id": 1, "roles.name": "admin", "posts.title": "b"})),
        ];

        let out = reassemble(rows, &relations, "id");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["roles"], json!("admin"));
        assert_eq!(out[0]["posts"], json!(["a", "b"]));
    }

    #[test]
    fn null_primary_keys_pass_through() {
        let relations = vec![RelationSpec::new("posts", "user_id").select(["title"])];
        let rows = vec![
            row(json!({"id": null, "posts.title": "orphan"})),
            row(json!({"id": 1, "posts.title": "kept"})),
        ];

        let out = reassemble(rows, &relations, "id");
        assert_eq!(out.len(), 2);
        // Passed through untouched, compound keys intact.
        assert_eq!(out[0]["posts.title"], json!("orphan"));
        // The kept row still reassembles (single-column select collapses).
        assert_eq!(out[1]["posts"], json!("kept"));
    }

    #[test]
    fn incomplete_relations_do_not_nest() {
        let relations = vec![RelationSpec {
            table: Some("posts".to_string()),
            ..RelationSpec::default()
        }];
        let rows = vec![row(json!({"id": 1, "name": "Ada"}))];

        let out = reassemble(rows, &relations, "id");
        assert!(!out[0].contains_key("posts"));
    }
}
