use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::services::auth_service;
use crate::web::models::AuthenticatedUser;
use crate::web::{AppState, error::AppError};

pub const AUTH_COOKIE: &str = "token";

fn request_token(req: &Request<AxumBody>, jar: &CookieJar) -> Option<String> {
    // Authorization header first, then the session cookie
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| jar.get(AUTH_COOKIE).map(|c| c.value().to_string()))
}

async fn resolve_user(
    state: &AppState,
    token: Option<String>,
) -> Result<Option<AuthenticatedUser>, AppError> {
    auth_service::current_user(&state.db_pool, &state.config.jwt_secret, token.as_deref()).await
}

pub fn login_redirect(next: &str) -> Response {
    let target = format!("/login?next={}", urlencoding::encode(next));
    Redirect::to(&target).into_response()
}

/// Guard for routes that need a signed-in user. Anonymous requests are sent
/// to the login page with the original path as `next`.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    // Pull everything out of the request before awaiting; the body is not `Sync`.
    let token = request_token(&req, &jar);
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let Some(user) = resolve_user(&state, token).await? else {
        return Err(AppError::Unauthenticated(path));
    };

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Attaches `Option<AuthenticatedUser>` without rejecting anyone.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let token = request_token(&req, &jar);
    let user = resolve_user(&state, token).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
