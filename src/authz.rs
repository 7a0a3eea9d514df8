//! Ownership and access rules for catalog rows and orders.

use crate::{
    auth::AuthUser,
    errors::AppError,
    structs::{CatalogItem, OrderDetails, OrderType, Role},
};

/// Only the supplier who created a catalog row may change it.
pub fn ensure_owner<T: CatalogItem>(user: &AuthUser, item: &T) -> Result<(), AppError> {
    if user.has_role(Role::Supplier) && item.supplier_id() == user.id {
        return Ok(());
    }
    log::warn!(
        "User {} tried to modify {} {} owned by supplier {}",
        user.id,
        T::LABEL,
        item.id(),
        item.supplier_id()
    );
    Err(AppError::forbidden())
}

pub fn ensure_owner_or_admin<T: CatalogItem>(user: &AuthUser, item: &T) -> Result<(), AppError> {
    if user.has_role(Role::Admin) {
        return Ok(());
    }
    ensure_owner(user, item)
}

/// True when the supplier provided at least one parfum (standard) or
/// component (custom) of the order.
pub fn supplies_order(supplier_id: i64, order: &OrderDetails) -> bool {
    match order.order.order_type {
        OrderType::Standard => order
            .items
            .iter()
            .any(|item| item.supplier_id == supplier_id),
        OrderType::Custom => order.custom_parfum.as_ref().is_some_and(|custom| {
            custom
                .components
                .iter()
                .any(|line| line.supplier_id == supplier_id)
        }),
    }
}

fn is_supplying_supplier(user: &AuthUser, order: &OrderDetails) -> bool {
    user.has_role(Role::Supplier) && supplies_order(user.id, order)
}

pub fn ensure_can_read_order(user: &AuthUser, order: &OrderDetails) -> Result<(), AppError> {
    let own_order = user.has_role(Role::Client) && order.order.client_id == user.id;
    if user.has_role(Role::Admin) || own_order || is_supplying_supplier(user, order) {
        return Ok(());
    }
    log::warn!("User {} denied read on order {}", user.id, order.order.id);
    Err(AppError::forbidden())
}

pub fn ensure_can_update_status(user: &AuthUser, order: &OrderDetails) -> Result<(), AppError> {
    if user.has_role(Role::Admin) || is_supplying_supplier(user, order) {
        return Ok(());
    }
    log::warn!(
        "User {} denied status update on order {}",
        user.id,
        order.order.id
    );
    Err(AppError::forbidden())
}

pub fn ensure_can_price_order(user: &AuthUser, order: &OrderDetails) -> Result<(), AppError> {
    if is_supplying_supplier(user, order) {
        return Ok(());
    }
    log::warn!("User {} denied pricing of order {}", user.id, order.order.id);
    Err(AppError::forbidden())
}
