//! Catalog endpoints, shared by parfums and components.

use actix_web::{
    web::{self, Data},
    HttpRequest, HttpResponse, Scope,
};

use crate::{
    auth::AuthUser,
    authz, db,
    errors::AppError,
    structs::{CatalogInput, CatalogItem, Role},
    AppState,
};

/// `/supplier` is registered ahead of `/{id}` so it is not parsed as an id.
pub fn scope<T: CatalogItem>(path: &str) -> Scope {
    web::scope(path)
        .service(
            web::resource("")
                .route(web::get().to(list_available::<T>))
                .route(web::post().to(create::<T>)),
        )
        .service(web::resource("/supplier").route(web::get().to(list_own::<T>)))
        .service(
            web::resource("/{id}")
                .route(web::get().to(get_one::<T>))
                .route(web::put().to(update::<T>))
                .route(web::delete().to(delete::<T>)),
        )
}

async fn list_available<T: CatalogItem>(state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let items = db::list_available::<T>(&state).await?;
    Ok(HttpResponse::Ok().json(items))
}

async fn list_own<T: CatalogItem>(
    state: Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    user.require_role(Role::Supplier)?;
    let items = db::list_by_supplier::<T>(&state, user.id).await?;
    Ok(HttpResponse::Ok().json(items))
}

async fn get_one<T: CatalogItem>(
    state: Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let item = db::get_catalog_item::<T>(&state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

async fn create<T: CatalogItem>(
    state: Data<AppState>,
    user: AuthUser,
    req: HttpRequest,
    web::Json(input): web::Json<CatalogInput>,
) -> Result<HttpResponse, AppError> {
    user.require_role(Role::Supplier)?;
    let item = db::create_catalog_item::<T>(&state, user.id, input).await?;
    let location = format!("{}/{}", req.path().trim_end_matches('/'), item.id());
    Ok(HttpResponse::Created()
        .append_header(("Location", location))
        .json(item))
}

async fn update<T: CatalogItem>(
    state: Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
    web::Json(input): web::Json<CatalogInput>,
) -> Result<HttpResponse, AppError> {
    user.require_role(Role::Supplier)?;
    let id = path.into_inner();
    let existing = db::get_catalog_item::<T>(&state, id).await?;
    authz::ensure_owner(&user, &existing)?;
    db::update_catalog_item::<T>(&state, id, input).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn delete<T: CatalogItem>(
    state: Data<AppState>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    user.require_any(&[Role::Supplier, Role::Admin])?;
    let id = path.into_inner();
    let existing = db::get_catalog_item::<T>(&state, id).await?;
    authz::ensure_owner_or_admin(&user, &existing)?;
    db::delete_catalog_item::<T>(&state, id).await?;
    Ok(HttpResponse::NoContent().finish())
}
