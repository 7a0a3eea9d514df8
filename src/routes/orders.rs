use actix_web::{
    delete, get, post, put,
    web::{self, Data},
    HttpResponse, Responder, Scope,
};

use crate::{
    auth::AuthUser,
    authz,
    errors::AppError,
    orders,
    structs::{CustomOrderRequest, OrderDetails, PriceUpdate, Role, StandardOrderRequest, StatusUpdate},
    AppState,
};

/// Literal paths come before `/{id}`.
pub fn scope() -> Scope {
    web::scope("/api/order")
        .service(my_orders_handler)
        .service(supplier_orders_handler)
        .service(create_standard_order_handler)
        .service(create_custom_order_handler)
        .service(custom_price_handler)
        .service(get_order_handler)
        .service(update_status_handler)
        .service(delete_order_handler)
}

fn created(order: OrderDetails) -> HttpResponse {
    HttpResponse::Created()
        .append_header(("Location", format!("/api/order/{}", order.order.id)))
        .json(order)
}

#[get("/my-orders")]
pub async fn my_orders_handler(
    state: Data<AppState>,
    user: AuthUser,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Client)?;
    let orders = orders::list_client_orders(&state, user.id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[get("/supplier-orders")]
pub async fn supplier_orders_handler(
    state: Data<AppState>,
    user: AuthUser,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Supplier)?;
    let orders = orders::list_supplier_orders(&state, user.id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[post("/create-standard-order")]
pub async fn create_standard_order_handler(
    state: Data<AppState>,
    user: AuthUser,
    web::Json(request): web::Json<StandardOrderRequest>,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Client)?;
    let order = orders::create_standard_order(&state, user.id, &request).await?;
    Ok(created(order))
}

#[post("/create-custom-order")]
pub async fn create_custom_order_handler(
    state: Data<AppState>,
    user: AuthUser,
    web::Json(request): web::Json<CustomOrderRequest>,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Client)?;
    let order = orders::create_custom_order(&state, user.id, &request).await?;
    Ok(created(order))
}

#[get("/{id}")]
pub async fn get_order_handler(
    state: Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let order = orders::get_order_details(&state, path.into_inner()).await?;
    authz::ensure_can_read_order(&user, &order)?;
    Ok(HttpResponse::Ok().json(order))
}

#[put("/{id}/status")]
pub async fn update_status_handler(
    state: Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
    web::Json(update): web::Json<StatusUpdate>,
) -> Result<impl Responder, AppError> {
    user.require_any(&[Role::Supplier, Role::Admin])?;
    let order = orders::get_order_details(&state, path.into_inner()).await?;
    authz::ensure_can_update_status(&user, &order)?;
    orders::update_status(&state, order.order.id, update.status).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[put("/custom/{id}/price")]
pub async fn custom_price_handler(
    state: Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
    web::Json(update): web::Json<PriceUpdate>,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Supplier)?;
    let order = orders::get_order_details(&state, path.into_inner()).await?;
    authz::ensure_can_price_order(&user, &order)?;
    orders::set_custom_price(&state, &order.order, update.price).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[delete("/{id}")]
pub async fn delete_order_handler(
    state: Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Admin)?;
    orders::delete_order(&state, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
