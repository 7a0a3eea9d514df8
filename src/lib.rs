//! Perfumery: ordering backend for catalog perfumes and custom blends.
//!
//! Suppliers publish parfums and components, clients order them (either
//! catalog parfums or a custom blend of components) and suppliers move
//! orders through production. Access is role based (Admin, Supplier, Client)
//! and carried by HS256 bearer tokens.

use std::{str::FromStr, time::Duration};

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod errors;
pub mod orders;
pub mod routes;
pub mod structs;
pub mod utils;

use config::Config;
use errors::AppError;

pub static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        Self { db_pool, config }
    }
}

/// Opens the database and applies pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .read_only(false)
        .busy_timeout(Duration::from_secs(5));

    let db_pool = SqlitePoolOptions::new().connect_with(opts).await?;
    MIGRATOR.run(&db_pool).await?;
    log::info!("Database migrated successfully");
    Ok(db_pool)
}
