use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{Request, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use diesel::prelude::*;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::db::DbPool;
use crate::db::enums::UserRole;
use crate::db::models::user::{AuthUser, User};
use crate::error::{AppError, AppResult};

/// Access token claims issued by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub exp: u64,
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Signs claims with the shared secret. The engine never logs users in; this is for
/// operational tooling and tests.
pub fn issue_token(secret: &str, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

fn bearer_token<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<axum::body::Body>,
    next: Next<axum::body::Body>,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::auth("Missing bearer token"))?
        .to_string();

    let claims = verify_token(&state.config.jwt_secret, &token)?;

    let user = load_active_user(state.db.clone(), claims.sub)
        .await?
        .ok_or_else(|| AppError::auth("User not found or inactive"))?;

    if user.role != claims.role {
        tracing::warn!(user_id = %user.id, "Token role does not match stored role");
        return Err(AppError::auth("Token is out of date, please sign in again"));
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn load_active_user(pool: DbPool, user_id: Uuid) -> AppResult<Option<AuthUser>> {
    tokio::task::spawn_blocking(move || -> AppResult<Option<AuthUser>> {
        use crate::schema::users::dsl::*;

        let mut conn = pool.get()?;
        let user = users
            .filter(id.eq(user_id))
            .filter(is_active.eq(true))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(user.map(AuthUser::from))
    })
    .await
    .map_err(|e| AppError::internal(format!("User lookup task failed: {}", e)))?
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::auth("Authentication required"))
    }
}
