#![allow(dead_code)]

use std::str::FromStr;

use perfumery::{
    auth,
    config::Config,
    db,
    structs::{CatalogInput, CatalogItem, Component, Parfum, Role, User},
    utils, AppState, MIGRATOR,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "integration-test-secret-0123456789".into(),
        jwt_issuer: "perfumery-test".into(),
        token_lifetime_days: 1,
        admin_email: None,
        admin_password: None,
    }
}

/// Fresh in-memory database. One connection, since every in-memory
/// connection would otherwise see its own empty database.
pub async fn test_state() -> AppState {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    AppState::new(pool, test_config())
}

/// Inserts a user without hashing a password, for tests that never log in.
pub async fn insert_user(state: &AppState, email: &str, role: Role) -> User {
    let now = utils::now();
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, full_name, pwd_hash, created_at, updated_at) VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(email)
    .bind(email)
    .bind("unusable")
    .bind(&now)
    .bind(&now)
    .fetch_one(&state.db_pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE name = $2")
        .bind(user.id)
        .bind(role.as_str())
        .execute(&state.db_pool)
        .await
        .unwrap();
    user
}

pub fn bearer(state: &AppState, user: &User, role: Role) -> (&'static str, String) {
    let token = auth::issue_token(user, &[role], &state.config).unwrap();
    ("Authorization", format!("Bearer {token}"))
}

pub fn catalog_input(name: &str, price: i64, available_quantity: i64) -> CatalogInput {
    CatalogInput {
        name: name.into(),
        description: format!("{name} description"),
        price,
        available_quantity,
        image_url: None,
    }
}

pub async fn insert_parfum(
    state: &AppState,
    supplier_id: i64,
    name: &str,
    price: i64,
    available_quantity: i64,
) -> Parfum {
    db::create_catalog_item::<Parfum>(
        state,
        supplier_id,
        catalog_input(name, price, available_quantity),
    )
    .await
    .unwrap()
}

pub async fn insert_component(
    state: &AppState,
    supplier_id: i64,
    name: &str,
    price: i64,
    available_quantity: i64,
) -> Component {
    db::create_catalog_item::<Component>(
        state,
        supplier_id,
        catalog_input(name, price, available_quantity),
    )
    .await
    .unwrap()
}

pub async fn stock_of<T: CatalogItem>(state: &AppState, id: i64) -> i64 {
    let sql = format!("SELECT available_quantity FROM {} WHERE id = $1", T::TABLE);
    sqlx::query_scalar::<_, i64>(&sql)
        .bind(id)
        .fetch_one(&state.db_pool)
        .await
        .unwrap()
}

pub async fn count_rows(state: &AppState, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(&state.db_pool)
        .await
        .unwrap()
}
