use actix_web::{
    get, post,
    web::{self, Data},
    HttpResponse, Responder, Scope,
};
use serde_json::json;

use crate::{
    auth::{self, AuthUser},
    db,
    errors::AppError,
    structs::{LoginRequest, LoginResponse, RegisterQuery, RegisterRequest, Role, UserInfo},
    utils, AppState,
};

pub fn scope() -> Scope {
    web::scope("/api/auth")
        .service(register_handler)
        .service(login_handler)
        .service(user_info_handler)
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password.".into())
}

/// Self-service registration is limited to clients and suppliers.
#[post("/register")]
pub async fn register_handler(
    state: Data<AppState>,
    query: web::Query<RegisterQuery>,
    web::Json(form): web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let role = match query.user_type.as_deref().unwrap_or("Client") {
        "Client" => Role::Client,
        "Supplier" => Role::Supplier,
        _ => {
            return Err(AppError::BadRequest(
                "Invalid user type. Use 'Client' or 'Supplier'.".into(),
            ))
        }
    };

    let email = utils::normalize_email(&form.email)?;
    utils::validate_password(&form.password)?;
    if db::find_user_by_email(&state, &email).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "Email {email} is already registered"
        )));
    }

    db::create_user(&state, &email, form.full_name.trim(), &form.password, role).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "User registered successfully." })))
}

#[post("/login")]
pub async fn login_handler(
    state: Data<AppState>,
    web::Json(form): web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let email = utils::normalize_email(&form.email).map_err(|_| invalid_credentials())?;
    let user = db::find_user_by_email(&state, &email)
        .await?
        .ok_or_else(invalid_credentials)?;

    match utils::verify_password(&form.password, &user.pwd_hash) {
        Ok(true) => {}
        Ok(false) => return Err(invalid_credentials()),
        Err(e) => {
            log::warn!("Password verification failed for user {}: {}", user.id, e);
            return Err(invalid_credentials());
        }
    }

    let roles = db::get_user_roles(&state, user.id).await?;
    let token = auth::issue_token(&user, &roles, &state.config)?;
    log::info!("User {} logged in", user.id);

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserInfo {
            id: user.id,
            username: user.email.clone(),
            email: user.email,
            full_name: user.full_name,
            roles,
        },
        token,
    }))
}

#[get("/user-info")]
pub async fn user_info_handler(
    state: Data<AppState>,
    auth_user: AuthUser,
) -> Result<impl Responder, AppError> {
    let user = db::get_user_by_id(&state, auth_user.id).await?;
    let roles = db::get_user_roles(&state, user.id).await?;

    Ok(HttpResponse::Ok().json(UserInfo {
        id: user.id,
        username: user.email.clone(),
        email: user.email,
        full_name: user.full_name,
        roles,
    }))
}
