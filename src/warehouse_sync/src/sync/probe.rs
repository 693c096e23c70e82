use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::debug;

use crate::{
    db::{
        connection::WarehousePool,
        statement::{Dialect, SqlValue, Statement},
    },
    error::StorageError,
    sync::domain::{Domain, KeyProbe},
};

/// Renders a [`KeyProbe`] as one parameterized SELECT. The IN list is
/// de-duplicated, first occurrence wins.
pub fn render_probe(dialect: Dialect, table: &str, probe: &KeyProbe) -> Statement {
    let mut stmt = Statement {
        sql: String::new(),
        params: Vec::with_capacity(probe.filters.len() + probe.in_values.len()),
    };

    let mut predicates = Vec::with_capacity(probe.filters.len() + 1);
    for (column, value) in &probe.filters {
        let ph = stmt.push(dialect, value.clone());
        predicates.push(format!("{column} = {ph}"));
    }

    let distinct: IndexSet<&String> = probe.in_values.iter().collect();
    let in_list = distinct
        .into_iter()
        .map(|v| stmt.push(dialect, SqlValue::Text(v.clone())))
        .collect::<Vec<_>>()
        .join(", ");
    predicates.push(format!("{} IN ({in_list})", probe.in_column));

    stmt.sql = format!(
        "SELECT {} FROM {table} WHERE {}",
        probe.select.join(", "),
        predicates.join(" AND ")
    );
    stmt
}

/// Keys of `rows` that are already stored. Empty input issues no query.
pub fn existing_keys<D: Domain>(
    pool: &WarehousePool,
    scope: &D::Scope,
    rows: &[D::Row],
) -> Result<HashSet<D::Key>, StorageError> {
    if rows.is_empty() {
        return Ok(HashSet::new());
    }

    let stmt = render_probe(pool.dialect(), D::TABLE, &D::probe(scope, rows));
    let stored: Vec<D::Stored> = pool.load_keys(&stmt)?;
    debug!(table = D::TABLE, candidates = rows.len(), stored = stored.len(), "probed existing keys");

    stored.into_iter().map(D::key_from_stored).collect()
}
