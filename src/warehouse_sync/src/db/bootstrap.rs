//! Table bootstrap.
//!
//! Plain `CREATE TABLE IF NOT EXISTS` DDL that runs unchanged on PostgreSQL and
//! SQLite. There is no versioning: running it again is a no-op. Natural keys
//! are deliberately not declared unique; the load pipeline enforces them.
//! Non-unique indexes cover the probe predicates.

use crate::{db::connection::WarehousePool, error::StorageError};

/// DDL for the five metric tables and their probe indexes.
pub const TABLES_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS asn (
    country_iso2 TEXT NOT NULL,
    as_of_date   TEXT NOT NULL,
    asn          BIGINT NOT NULL,
    is_routed    BOOLEAN NOT NULL
);
CREATE INDEX IF NOT EXISTS asn_country_date_idx ON asn (country_iso2, as_of_date);

CREATE TABLE IF NOT EXISTS country_stat (
    country_iso2      TEXT NOT NULL,
    stats_timestamp   TEXT NOT NULL,
    resolution        TEXT NOT NULL,
    v4_prefixes_ris   BIGINT,
    v6_prefixes_ris   BIGINT,
    asns_ris          BIGINT,
    v4_prefixes_stats BIGINT,
    v6_prefixes_stats BIGINT,
    asns_stats        BIGINT
);
CREATE INDEX IF NOT EXISTS country_stat_probe_idx
    ON country_stat (country_iso2, resolution, stats_timestamp);

CREATE TABLE IF NOT EXISTS asn_neighbour (
    asn          BIGINT NOT NULL,
    neighbour    BIGINT NOT NULL,
    as_of_date   TEXT NOT NULL,
    relationship TEXT NOT NULL,
    power        BIGINT,
    v4_peers     BIGINT,
    v6_peers     BIGINT
);
CREATE INDEX IF NOT EXISTS asn_neighbour_date_idx ON asn_neighbour (as_of_date);

CREATE TABLE IF NOT EXISTS country_traffic (
    country_iso2     TEXT NOT NULL,
    sample_timestamp TEXT NOT NULL,
    traffic          DOUBLE PRECISION NOT NULL
);
CREATE INDEX IF NOT EXISTS country_traffic_probe_idx
    ON country_traffic (country_iso2, sample_timestamp);

CREATE TABLE IF NOT EXISTS country_internet_quality (
    country_iso2     TEXT NOT NULL,
    sample_timestamp TEXT NOT NULL,
    p75              DOUBLE PRECISION NOT NULL,
    p50              DOUBLE PRECISION NOT NULL,
    p25              DOUBLE PRECISION NOT NULL
);
CREATE INDEX IF NOT EXISTS country_internet_quality_probe_idx
    ON country_internet_quality (country_iso2, sample_timestamp);
"#;

/// Creates any missing metric table. Idempotent.
pub fn ensure_tables(pool: &WarehousePool) -> Result<(), StorageError> {
    pool.batch_execute(TABLES_DDL)?;
    tracing::info!(dialect = ?pool.dialect(), "warehouse tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::db::connection::PoolSettings;

    use super::*;

    #[test]
    fn bootstrap_is_idempotent_on_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let pool = WarehousePool::connect(
            dir.path().join("w.db").to_str().unwrap(),
            PoolSettings {
                min_idle: 1,
                max_size: 2,
                ..Default::default()
            },
        )
        .unwrap();

        ensure_tables(&pool).expect("first run");
        ensure_tables(&pool).expect("second run");
        pool.batch_execute(
            "INSERT INTO asn (country_iso2, as_of_date, asn, is_routed) VALUES ('NL', '2023-01-01', 1, TRUE)",
        )
        .unwrap();
    }
}
