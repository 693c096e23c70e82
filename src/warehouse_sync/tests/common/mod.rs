#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use tempfile::TempDir;
use warehouse_sync::{
    db::{
        bootstrap::ensure_tables,
        connection::{PoolSettings, WarehousePool},
    },
    sync::LoadOptions,
};

pub struct TestWarehouse {
    _dir: TempDir, // keep alive for the life of the test
    pub pool: WarehousePool,
    pub audit_dir: PathBuf,
}

impl TestWarehouse {
    /// Writes to the store, no audit files.
    pub fn options(&self) -> LoadOptions {
        LoadOptions {
            persist_audit: false,
            write_to_store: true,
            audit_dir: self.audit_dir.clone(),
            batch_size: 1000,
        }
    }

    pub fn audit_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.audit_dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => vec![],
        }
    }
}

/// Fresh SQLite warehouse with all tables, in a temp directory.
pub fn setup_warehouse() -> TestWarehouse {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite:{}", dir.path().join("warehouse.db").display());
    let pool = WarehousePool::connect(
        &url,
        PoolSettings {
            min_idle: 1,
            max_size: 2,
            ..Default::default()
        },
    )
    .expect("connect");
    ensure_tables(&pool).expect("bootstrap");

    let audit_dir = dir.path().join("sql");
    TestWarehouse {
        _dir: dir,
        pool,
        audit_dir,
    }
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}
