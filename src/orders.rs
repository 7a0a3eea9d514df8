//! Order workflow: stock reservation, totals and persistence.
//!
//! Each order is written inside a single transaction. Stock is taken with a
//! conditional `UPDATE ... WHERE available_quantity >= qty`, so two concurrent
//! orders cannot both consume the last units of a row.

use sqlx::{Sqlite, Transaction};

use crate::{
    errors::AppError,
    structs::{
        CatalogItem, Component, CustomOrderRequest, CustomParfum, CustomParfumComponentLine,
        CustomParfumDetails, Order, OrderDetails, OrderItemLine, OrderStatus, OrderType, Parfum,
        StandardOrderRequest,
    },
    utils, AppState,
};

const DEFAULT_CUSTOM_NAME: &str = "Custom parfum";

fn validate_quantity(quantity: i64) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::BadRequest("Quantity must be positive".into()));
    }
    Ok(())
}

fn price_overflow() -> AppError {
    AppError::BadRequest("Order total is too large".into())
}

/// Decrements stock for one line and returns the unit price. The decrement
/// is the first statement so the transaction takes the write lock up front.
async fn reserve_stock<T: CatalogItem>(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
    quantity: i64,
) -> Result<i64, AppError> {
    let update = format!(
        "UPDATE {} SET available_quantity = available_quantity - $1, updated_at = $2 \
         WHERE id = $3 AND available_quantity >= $4 RETURNING price",
        T::TABLE
    );
    let price = sqlx::query_scalar::<_, i64>(&update)
        .bind(quantity)
        .bind(utils::now())
        .bind(id)
        .bind(quantity)
        .fetch_optional(&mut **tx)
        .await?;
    if let Some(price) = price {
        return Ok(price);
    }

    let select = format!(
        "SELECT name, available_quantity FROM {} WHERE id = $1",
        T::TABLE
    );
    let (name, available) = sqlx::query_as::<_, (String, i64)>(&select)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::not_found(T::LABEL, id))?;
    Err(AppError::BadRequest(format!(
        "Insufficient stock for {} {}: requested {}, available {}",
        T::LABEL.to_lowercase(),
        name,
        quantity,
        available
    )))
}

async fn insert_order(
    tx: &mut Transaction<'_, Sqlite>,
    client_id: i64,
    order_type: OrderType,
    total_price: i64,
) -> Result<Order, AppError> {
    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (client_id, created_date, status, order_type, total_price) VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(client_id)
    .bind(utils::now())
    .bind(OrderStatus::Awaiting)
    .bind(order_type)
    .bind(total_price)
    .fetch_one(&mut **tx)
    .await?;
    Ok(order)
}

async fn write_standard_order(
    tx: &mut Transaction<'_, Sqlite>,
    client_id: i64,
    request: &StandardOrderRequest,
) -> Result<Order, AppError> {
    let mut total: i64 = 0;
    let mut lines = Vec::with_capacity(request.items.len());
    for item in &request.items {
        let unit_price = reserve_stock::<Parfum>(tx, item.parfum_id, item.quantity).await?;
        let line_total = unit_price
            .checked_mul(item.quantity)
            .ok_or_else(price_overflow)?;
        total = total.checked_add(line_total).ok_or_else(price_overflow)?;
        lines.push((item.parfum_id, item.quantity, unit_price, line_total));
    }

    let order = insert_order(tx, client_id, OrderType::Standard, total).await?;
    for (parfum_id, quantity, unit_price, line_total) in lines {
        sqlx::query(
            "INSERT INTO order_items (order_id, parfum_id, quantity, unit_price, total_price) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order.id)
        .bind(parfum_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(line_total)
        .execute(&mut **tx)
        .await?;
    }
    Ok(order)
}

async fn write_custom_order(
    tx: &mut Transaction<'_, Sqlite>,
    client_id: i64,
    request: &CustomOrderRequest,
) -> Result<Order, AppError> {
    for line in &request.components {
        reserve_stock::<Component>(tx, line.component_id, line.quantity).await?;
    }

    // Priced later by a supplier.
    let order = insert_order(tx, client_id, OrderType::Custom, 0).await?;
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_CUSTOM_NAME);
    let custom_parfum_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO custom_parfums (order_id, name, price) VALUES ($1, $2, 0) RETURNING id",
    )
    .bind(order.id)
    .bind(name)
    .fetch_one(&mut **tx)
    .await?;

    for line in &request.components {
        sqlx::query(
            "INSERT INTO custom_parfum_components (custom_parfum_id, component_id, quantity) VALUES ($1, $2, $3)",
        )
        .bind(custom_parfum_id)
        .bind(line.component_id)
        .bind(line.quantity)
        .execute(&mut **tx)
        .await?;
    }
    Ok(order)
}

pub async fn create_standard_order(
    state: &AppState,
    client_id: i64,
    request: &StandardOrderRequest,
) -> Result<OrderDetails, AppError> {
    if request.items.is_empty() {
        return Err(AppError::BadRequest("No items specified".into()));
    }
    for item in &request.items {
        validate_quantity(item.quantity)?;
    }

    let mut tx = state.db_pool.begin().await?;
    let order = match write_standard_order(&mut tx, client_id, request).await {
        Ok(order) => order,
        Err(e) => {
            log::warn!("Standard order for client {} rolled back: {}", client_id, e);
            tx.rollback().await?;
            return Err(e);
        }
    };
    tx.commit().await?;

    log::info!(
        "Standard order {} created for client {} (total {})",
        order.id,
        client_id,
        order.total_price
    );
    load_details(state, order).await
}

pub async fn create_custom_order(
    state: &AppState,
    client_id: i64,
    request: &CustomOrderRequest,
) -> Result<OrderDetails, AppError> {
    if request.components.is_empty() {
        return Err(AppError::BadRequest("No components specified".into()));
    }
    for line in &request.components {
        validate_quantity(line.quantity)?;
    }

    let mut tx = state.db_pool.begin().await?;
    let order = match write_custom_order(&mut tx, client_id, request).await {
        Ok(order) => order,
        Err(e) => {
            log::warn!("Custom order for client {} rolled back: {}", client_id, e);
            tx.rollback().await?;
            return Err(e);
        }
    };
    tx.commit().await?;

    log::info!("Custom order {} created for client {}", order.id, client_id);
    load_details(state, order).await
}

async fn load_details(state: &AppState, order: Order) -> Result<OrderDetails, AppError> {
    let pool = state.db_pool.clone();
    let items = sqlx::query_as::<_, OrderItemLine>(
        "SELECT oi.id, oi.order_id, oi.parfum_id, p.name AS parfum_name, p.supplier_id, \
         oi.quantity, oi.unit_price, oi.total_price \
         FROM order_items oi JOIN parfums p ON p.id = oi.parfum_id \
         WHERE oi.order_id = $1 ORDER BY oi.id",
    )
    .bind(order.id)
    .fetch_all(&pool)
    .await?;

    let custom_parfum =
        sqlx::query_as::<_, CustomParfum>("SELECT * FROM custom_parfums WHERE order_id = $1")
            .bind(order.id)
            .fetch_optional(&pool)
            .await?;

    let custom_parfum = match custom_parfum {
        Some(custom_parfum) => {
            let components = sqlx::query_as::<_, CustomParfumComponentLine>(
                "SELECT cpc.id, cpc.custom_parfum_id, cpc.component_id, c.name AS component_name, \
                 c.supplier_id, cpc.quantity \
                 FROM custom_parfum_components cpc JOIN components c ON c.id = cpc.component_id \
                 WHERE cpc.custom_parfum_id = $1 ORDER BY cpc.id",
            )
            .bind(custom_parfum.id)
            .fetch_all(&pool)
            .await?;
            Some(CustomParfumDetails {
                custom_parfum,
                components,
            })
        }
        None => None,
    };

    Ok(OrderDetails {
        order,
        items,
        custom_parfum,
    })
}

pub async fn get_order_details(state: &AppState, id: i64) -> Result<OrderDetails, AppError> {
    let pool = state.db_pool.clone();
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::not_found("Order", id))?;
    load_details(state, order).await
}

async fn load_all(state: &AppState, orders: Vec<Order>) -> Result<Vec<OrderDetails>, AppError> {
    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        details.push(load_details(state, order).await?);
    }
    Ok(details)
}

pub async fn list_client_orders(
    state: &AppState,
    client_id: i64,
) -> Result<Vec<OrderDetails>, AppError> {
    let pool = state.db_pool.clone();
    let orders =
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE client_id = $1 ORDER BY id")
            .bind(client_id)
            .fetch_all(&pool)
            .await?;
    load_all(state, orders).await
}

/// Orders containing at least one parfum or component of this supplier.
pub async fn list_supplier_orders(
    state: &AppState,
    supplier_id: i64,
) -> Result<Vec<OrderDetails>, AppError> {
    let pool = state.db_pool.clone();
    let orders = sqlx::query_as::<_, Order>(
        "SELECT DISTINCT o.* FROM orders o \
         LEFT JOIN order_items oi ON oi.order_id = o.id \
         LEFT JOIN parfums p ON p.id = oi.parfum_id \
         LEFT JOIN custom_parfums cp ON cp.order_id = o.id \
         LEFT JOIN custom_parfum_components cpc ON cpc.custom_parfum_id = cp.id \
         LEFT JOIN components c ON c.id = cpc.component_id \
         WHERE (o.order_type = 'Standard' AND p.supplier_id = $1) \
            OR (o.order_type = 'Custom' AND c.supplier_id = $2) \
         ORDER BY o.id",
    )
    .bind(supplier_id)
    .bind(supplier_id)
    .fetch_all(&pool)
    .await?;
    load_all(state, orders).await
}

/// No transition guards: any authorized caller may set any status.
pub async fn update_status(state: &AppState, id: i64, status: OrderStatus) -> Result<(), AppError> {
    let pool = state.db_pool.clone();
    let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Order", id));
    }
    log::info!("Order {} status set to {:?}", id, status);
    Ok(())
}

/// Sets the supplier price of a custom order; it becomes the order total.
pub async fn set_custom_price(state: &AppState, order: &Order, price: i64) -> Result<(), AppError> {
    if order.order_type != OrderType::Custom {
        return Err(AppError::BadRequest(format!(
            "Order {} is not a custom order",
            order.id
        )));
    }
    if price < 0 {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }

    let mut tx = state.db_pool.begin().await?;
    sqlx::query("UPDATE custom_parfums SET price = $1 WHERE order_id = $2")
        .bind(price)
        .bind(order.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE orders SET total_price = $1 WHERE id = $2")
        .bind(price)
        .bind(order.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    log::info!("Custom order {} priced at {}", order.id, price);
    Ok(())
}

/// Removes the order and its children. Stock is not restored.
pub async fn delete_order(state: &AppState, id: i64) -> Result<(), AppError> {
    let pool = state.db_pool.clone();
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Order", id));
    }
    log::info!("Order with id {} deleted", id);
    Ok(())
}
