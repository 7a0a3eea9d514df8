use actix_web::{get, http::Method, web, HttpResponse, Responder};
use serde_json::json;

use crate::{
    auth::AuthUser,
    errors::AppError,
    structs::{Component, Parfum, Role},
};

pub mod auth;
pub mod catalog;
pub mod orders;

/// Registers every API route. Shared by `main` and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::scope())
        .service(admin_data_handler)
        .service(supplier_data_handler)
        .service(client_data_handler)
        .service(catalog::scope::<Parfum>("/api/parfum"))
        .service(catalog::scope::<Parfum>("/api/perfume"))
        .service(catalog::scope::<Component>("/api/component"))
        .service(orders::scope());
}

fn gated_message(user: &AuthUser, role: Role, message: &str) -> Result<HttpResponse, AppError> {
    user.require_role(role)?;
    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}

#[get("/api/admin/data")]
pub async fn admin_data_handler(user: AuthUser) -> Result<impl Responder, AppError> {
    gated_message(&user, Role::Admin, "Data visible to admins only.")
}

#[get("/api/supplier/data")]
pub async fn supplier_data_handler(user: AuthUser) -> Result<impl Responder, AppError> {
    gated_message(&user, Role::Supplier, "Data visible to suppliers only.")
}

#[get("/api/client/data")]
pub async fn client_data_handler(user: AuthUser) -> Result<impl Responder, AppError> {
    gated_message(&user, Role::Client, "Data visible to clients only.")
}

pub async fn default_handler(req_method: Method) -> impl Responder {
    match req_method {
        Method::GET => HttpResponse::NotFound().json(json!({ "message": "Not found" })),
        _ => HttpResponse::MethodNotAllowed().finish(),
    }
}
