//! SQL statement builders.
//!
//! Table and column names cannot be bound as parameters, so every identifier is
//! validated and quoted here before it is spliced into a statement.
use std::collections::BTreeSet;

use legacy_migrator_shared::ConflictPolicy;

use crate::errors::TargetStoreError;

/// Quotes a (optionally schema-qualified) identifier.
///
/// Only ASCII letters, digits and underscores are accepted in each part, and a
/// part may not start with a digit.
pub fn quote_ident(ident: &str) -> Result<String, TargetStoreError> {
    let parts: Vec<&str> = ident.split('.').collect();
    if parts.len() > 2 {
        return Err(TargetStoreError::InvalidIdentifier(ident.to_string()));
    }

    let mut quoted = Vec::with_capacity(parts.len());
    for part in parts {
        let valid = !part.is_empty()
            && !part.starts_with(|c: char| c.is_ascii_digit())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(TargetStoreError::InvalidIdentifier(ident.to_string()));
        }
        quoted.push(format!("\"{}\"", part));
    }
    Ok(quoted.join("."))
}

/// Wraps a select statement so each row comes back as one `jsonb` column named `row`.
pub fn wrap_as_json_rows(sql: &str) -> String {
    let inner = sql.trim().trim_end_matches(';').trim_end();
    format!("SELECT to_jsonb(q) AS row FROM ({}) q", inner)
}

/// Builds a select of `columns` from `table`, one `jsonb` row per table row.
pub fn build_select(table: &str, columns: &[&str]) -> Result<String, TargetStoreError> {
    let table = quote_ident(table)?;
    let columns = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Err(TargetStoreError::InvalidIdentifier(
            "no columns selected".to_string(),
        ));
    }
    Ok(wrap_as_json_rows(&format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        table
    )))
}

/// Returns the sorted union of keys over `rows`.
///
/// Fails if any row is not a JSON object.
pub fn collect_columns(rows: &[serde_json::Value]) -> Result<Vec<String>, TargetStoreError> {
    let mut columns = BTreeSet::new();
    for row in rows {
        let object = row
            .as_object()
            .ok_or_else(|| TargetStoreError::serialization("row is not a JSON object"))?;
        columns.extend(object.keys().cloned());
    }
    Ok(columns.into_iter().collect())
}

/// Builds an upsert that reads its rows from a `jsonb` array bound as `$1`.
///
/// `jsonb_populate_recordset` casts every value to the column's declared type, so
/// uuids, timestamps and enums can travel as JSON strings.
pub fn build_upsert(
    table: &str,
    primary_key: &str,
    columns: &[String],
    policy: ConflictPolicy,
) -> Result<String, TargetStoreError> {
    if !columns.iter().any(|c| c == primary_key) {
        return Err(TargetStoreError::serialization(format!(
            "rows do not contain the primary key column {}",
            primary_key
        )));
    }

    let table = quote_ident(table)?;
    let primary_key = quote_ident(primary_key)?;
    let quoted = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Result<Vec<_>, _>>()?;
    let column_list = quoted.join(", ");

    let updates: Vec<String> = quoted
        .iter()
        .filter(|c| **c != primary_key)
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();

    let conflict_action = match policy {
        ConflictPolicy::Overwrite if !updates.is_empty() => {
            format!("DO UPDATE SET {}", updates.join(", "))
        }
        _ => "DO NOTHING".to_string(),
    };

    Ok(format!(
        "INSERT INTO {table} ({column_list}) \
         SELECT {column_list} FROM jsonb_populate_recordset(NULL::{table}, $1) \
         ON CONFLICT ({primary_key}) {conflict_action}"
    ))
}
