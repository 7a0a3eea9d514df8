use crate::{
    errors::AppError,
    structs::{CatalogInput, CatalogItem, Role, User},
    utils, AppState,
};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}

fn referenced_by_orders(label: &str, id: i64) -> AppError {
    AppError::BadRequest(format!("{label} {id} is referenced by existing orders"))
}

pub async fn find_user_by_email(state: &AppState, email: &str) -> Result<Option<User>, AppError> {
    let pool = state.db_pool.clone();
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&pool)
        .await?;
    Ok(user)
}

pub async fn get_user_by_id(state: &AppState, id: i64) -> Result<User, AppError> {
    let pool = state.db_pool.clone();
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

pub async fn get_user_roles(state: &AppState, user_id: i64) -> Result<Vec<Role>, AppError> {
    let pool = state.db_pool.clone();
    let names = sqlx::query_scalar::<_, String>(
        "SELECT r.name FROM roles r JOIN user_roles ur ON ur.role_id = r.id WHERE ur.user_id = $1 ORDER BY r.id",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    names
        .iter()
        .map(|name| name.parse::<Role>().map_err(AppError::ConfigError))
        .collect()
}

/// Inserts the user and its role link in one transaction.
pub async fn create_user(
    state: &AppState,
    email: &str,
    full_name: &str,
    password: &str,
    role: Role,
) -> Result<User, AppError> {
    let created_at = utils::now();
    let pwd_hash = utils::hash_password(password)?;

    let mut tx = state.db_pool.begin().await?;
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, full_name, pwd_hash, created_at, updated_at) VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(email)
    .bind(full_name)
    .bind(pwd_hash)
    .bind(&created_at)
    .bind(&created_at)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::BadRequest(format!("Email {email} is already registered"))
        } else {
            AppError::SqlxError(e)
        }
    })?;

    sqlx::query("INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE name = $2")
        .bind(user.id)
        .bind(role.as_str())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    log::info!("User created: {} ({})", user.email, role);
    Ok(user)
}

/// Creates the admin account unless a user with that email already exists.
pub async fn seed_admin(state: &AppState, email: &str, password: &str) -> Result<bool, AppError> {
    let email = utils::normalize_email(email)?;
    if find_user_by_email(state, &email).await?.is_some() {
        return Ok(false);
    }
    create_user(state, &email, "Administrator", password, Role::Admin).await?;
    log::info!("Seeded admin account {}", email);
    Ok(true)
}

pub fn validate_catalog_input(input: &CatalogInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    if input.price < 0 {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if input.available_quantity < 0 {
        return Err(AppError::BadRequest(
            "Available quantity must not be negative".into(),
        ));
    }
    Ok(())
}

pub async fn list_available<T: CatalogItem>(state: &AppState) -> Result<Vec<T>, AppError> {
    let pool = state.db_pool.clone();
    let sql = format!(
        "SELECT * FROM {} WHERE available_quantity > 0 ORDER BY id",
        T::TABLE
    );
    let items = sqlx::query_as::<_, T>(&sql).fetch_all(&pool).await?;
    Ok(items)
}

pub async fn list_by_supplier<T: CatalogItem>(
    state: &AppState,
    supplier_id: i64,
) -> Result<Vec<T>, AppError> {
    let pool = state.db_pool.clone();
    let sql = format!(
        "SELECT * FROM {} WHERE supplier_id = $1 ORDER BY id",
        T::TABLE
    );
    let items = sqlx::query_as::<_, T>(&sql)
        .bind(supplier_id)
        .fetch_all(&pool)
        .await?;
    Ok(items)
}

pub async fn get_catalog_item<T: CatalogItem>(state: &AppState, id: i64) -> Result<T, AppError> {
    let pool = state.db_pool.clone();
    let sql = format!("SELECT * FROM {} WHERE id = $1", T::TABLE);
    sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::not_found(T::LABEL, id))
}

pub async fn create_catalog_item<T: CatalogItem>(
    state: &AppState,
    supplier_id: i64,
    input: CatalogInput,
) -> Result<T, AppError> {
    validate_catalog_input(&input)?;
    let created_at = utils::now();
    let pool = state.db_pool.clone();
    let sql = format!(
        "INSERT INTO {} (name, description, price, available_quantity, image_url, supplier_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        T::TABLE
    );
    let item = sqlx::query_as::<_, T>(&sql)
        .bind(input.name.trim())
        .bind(input.description)
        .bind(input.price)
        .bind(input.available_quantity)
        .bind(input.image_url)
        .bind(supplier_id)
        .bind(&created_at)
        .bind(&created_at)
        .fetch_one(&pool)
        .await?;
    log::info!(
        "{} {} created by supplier {}",
        T::LABEL,
        item.id(),
        supplier_id
    );
    Ok(item)
}

/// Replaces the editable fields; the owning supplier never changes.
pub async fn update_catalog_item<T: CatalogItem>(
    state: &AppState,
    id: i64,
    input: CatalogInput,
) -> Result<T, AppError> {
    validate_catalog_input(&input)?;
    let pool = state.db_pool.clone();
    let sql = format!(
        "UPDATE {} SET name = $1, description = $2, price = $3, available_quantity = $4, image_url = $5, updated_at = $6 \
         WHERE id = $7 RETURNING *",
        T::TABLE
    );
    let item = sqlx::query_as::<_, T>(&sql)
        .bind(input.name.trim())
        .bind(input.description)
        .bind(input.price)
        .bind(input.available_quantity)
        .bind(input.image_url)
        .bind(utils::now())
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::not_found(T::LABEL, id))?;
    log::info!("{} {} updated", T::LABEL, id);
    Ok(item)
}

/// Refuses to delete rows that existing orders still point at.
pub async fn delete_catalog_item<T: CatalogItem>(state: &AppState, id: i64) -> Result<(), AppError> {
    let pool = state.db_pool.clone();
    let (child_table, child_column) = T::REFERENCED_BY;
    let count_sql = format!("SELECT COUNT(*) FROM {child_table} WHERE {child_column} = $1");
    let references = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(id)
        .fetch_one(&pool)
        .await?;
    if references > 0 {
        return Err(referenced_by_orders(T::LABEL, id));
    }

    // An order may still land between the count and the delete; the
    // RESTRICT foreign key rejects it then.
    let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
    let result = sqlx::query(&sql)
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                referenced_by_orders(T::LABEL, id)
            } else {
                AppError::from(err)
            }
        })?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(T::LABEL, id));
    }
    log::info!("{} with id {} deleted", T::LABEL, id);
    Ok(())
}
