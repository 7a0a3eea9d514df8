//! HS256 access tokens and the `AuthUser` request extractor.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    errors::AppError,
    structs::{Role, User},
    AppState,
};

/// Claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "UserID")]
    pub user_id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Role")]
    pub roles: Vec<Role>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(user: &User, roles: &[Role], config: &Config) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        user_id: user.id,
        name: user.email.clone(),
        email: user.email.clone(),
        roles: roles.to_vec(),
        iss: config.jwt_issuer.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::days(config.token_lifetime_days)).timestamp(),
    };
    encode_claims(&claims, config)
}

fn encode_claims(claims: &Claims, config: &Config) -> Result<String, AppError> {
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AppError::TokenError(format!("JWT encode: {e}")))
}

pub fn decode_token(token: &str, config: &Config) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["exp", "iss"]);

    jsonwebtoken::decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::Unauthorized("Token has expired".into())
            }
            _ => {
                log::warn!("Rejected access token: {}", e);
                AppError::Unauthorized("Invalid token".into())
            }
        })
}

/// The caller, as proven by a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub roles: Vec<Role>,
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        self.require_any(&[role])
    }

    pub fn require_any(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.iter().any(|r| self.has_role(*r)) {
            Ok(())
        } else {
            log::warn!(
                "User {} with roles {:?} denied, requires one of {:?}",
                self.id,
                self.roles,
                roles
            );
            Err(AppError::forbidden())
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.email,
            roles: claims.roles,
        }
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::ConfigError("application state is not registered".into()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;

    decode_token(token, &state.config).map(AuthUser::from)
}
