//! Warehouse access: pooled connections, parameterized statements and the
//! table bootstrap.
//!
//! This module provides:
//! - [`connection::WarehousePool`]: an r2d2 pool over PostgreSQL or SQLite,
//!   chosen from the URL (`postgres://`, `postgresql://`, `sqlite:` or a bare
//!   path). SQLite connections get WAL, foreign_keys=ON and a 5000ms busy_timeout.
//! - [`statement::Statement`]: SQL text plus typed binds, rendered with the
//!   placeholder style of the target backend.
//! - [`bootstrap::ensure_tables`]: idempotent `CREATE TABLE IF NOT EXISTS` for
//!   the five metric tables.
//!
//! Example:
//! ```no_run
//! use warehouse_sync::db::{bootstrap, connection::{PoolSettings, WarehousePool}};
//!
//! let path = std::env::temp_dir().join("warehouse_example.db");
//! let pool = WarehousePool::connect(path.to_str().unwrap(), PoolSettings::default()).expect("pool");
//! bootstrap::ensure_tables(&pool).expect("tables");
//! ```
//!
//! Note: Building with PostgreSQL support requires the system libpq (e.g., libpq-dev on Debian/Ubuntu).

pub mod bootstrap;
pub mod connection;
pub mod statement;
