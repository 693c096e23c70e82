use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use tracing::info;

use crate::{
    db::{
        connection::WarehousePool,
        statement::{Dialect, Statement},
    },
    error::EtlError,
    sync::{LoadOptions, domain::Domain},
};

/// What a bulk load did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Rows written to the store (0 when writes are disabled).
    pub inserted: usize,
    /// Audit file, when one was written.
    pub audit_file: Option<PathBuf>,
}

/// One multi-row INSERT covering all of `rows`, or `None` for an empty batch.
pub fn render_insert<D: Domain>(dialect: Dialect, rows: &[D::Row]) -> Option<Statement> {
    if rows.is_empty() {
        return None;
    }

    let mut stmt = Statement {
        sql: format!("INSERT INTO {} ({})\nVALUES\n", D::TABLE, D::COLUMNS.join(", ")),
        params: Vec::with_capacity(rows.len() * D::COLUMNS.len()),
    };
    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        let values = D::values(row);
        debug_assert_eq!(values.len(), D::COLUMNS.len());
        let placeholders = values
            .into_iter()
            .map(|v| stmt.push(dialect, v))
            .collect::<Vec<_>>();
        tuples.push(format!("  ({})", placeholders.join(", ")));
    }
    stmt.sql.push_str(&tuples.join(",\n"));
    Some(stmt)
}

/// Writes `stmt` to a new file under `dir`, creating `dir` if needed.
///
/// Name: `<label>_<tag>_<YYYYmmdd_HHMMSS>_<8 hex>.sql`.
pub fn write_audit(
    dir: &Path,
    label: &str,
    tag: &str,
    stmt: &Statement,
) -> Result<PathBuf, EtlError> {
    let path = dir.join(format!(
        "{label}_{tag}_{}_{}.sql",
        Local::now().format("%Y%m%d_%H%M%S"),
        &uuid::Uuid::new_v4().simple().to_string()[..8],
    ));
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, stmt.to_string()))
        .map_err(|source| EtlError::Audit {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Renders, optionally persists, and optionally executes the insert for an
/// already-filtered batch. Empty batches do nothing at all.
pub fn bulk_load<D: Domain>(
    pool: &WarehousePool,
    scope: &D::Scope,
    rows: &[D::Row],
    opts: &LoadOptions,
) -> Result<LoadOutcome, EtlError> {
    let Some(stmt) = render_insert::<D>(pool.dialect(), rows) else {
        return Ok(LoadOutcome::default());
    };

    let mut outcome = LoadOutcome::default();
    if opts.persist_audit {
        let path = write_audit(&opts.audit_dir, D::AUDIT_LABEL, &D::audit_tag(scope), &stmt)?;
        info!(table = D::TABLE, path = %path.display(), "insert statement saved");
        outcome.audit_file = Some(path);
    }
    if opts.write_to_store {
        pool.execute_atomic(&stmt)?;
        outcome.inserted = rows.len();
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domains::asn::{AsnInventory, AsnRecord};

    fn rows() -> Vec<AsnRecord> {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        vec![
            AsnRecord {
                country_iso2: "US".into(),
                as_of_date: date,
                asn: 123,
                is_routed: true,
            },
            AsnRecord {
                country_iso2: "US".into(),
                as_of_date: date,
                asn: 456,
                is_routed: false,
            },
        ]
    }

    #[test]
    fn empty_batch_renders_nothing() {
        assert!(render_insert::<AsnInventory>(Dialect::Postgres, &[]).is_none());
    }

    #[test]
    fn insert_is_one_statement_with_binds() {
        let stmt = render_insert::<AsnInventory>(Dialect::Postgres, &rows()).unwrap();
        insta::assert_snapshot!(stmt.to_string(), @r"
        INSERT INTO asn (country_iso2, as_of_date, asn, is_routed)
        VALUES
          ($1, $2, $3, $4),
          ($5, $6, $7, $8);
        -- binds: ['US', '2023-01-01', 123, TRUE, 'US', '2023-01-01', 456, FALSE]
        ");
    }

    #[test]
    fn audit_file_lands_in_fresh_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sql");
        let stmt = render_insert::<AsnInventory>(Dialect::Sqlite, &rows()).unwrap();
        let path = write_audit(&dir, "country_asns", "US", &stmt).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("country_asns_US_"));
        assert!(name.ends_with(".sql"));
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("INSERT INTO asn"));
    }
}
