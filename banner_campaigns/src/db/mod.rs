//! Database utilities for connections and schema migrations.
//!
//! This module provides:
//! - SQLite connection helper: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON,
//!   and a 5000ms busy_timeout.
//! - Embedded Diesel migrations: [`migrate::run_sqlite`] brings a database file up to date.
//!
//! Example:
//! ```no_run
//! use banner_campaigns::db::{connection, migrate};
//!
//! let db_path = std::env::temp_dir().join("campaigns_example.db");
//! migrate::run_sqlite(db_path.to_str().unwrap()).expect("migrations");
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;
