use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::{
    Form,
    cookie::{Cookie, CookieJar, SameSite},
};
use std::sync::Arc;
use tracing::info;

use crate::server::config::ServerConfig;
use crate::services::auth_service;
use crate::validation::ValidationErrors;
use crate::web::middleware::auth::AUTH_COOKIE;
use crate::web::models::forms::safe_next;
use crate::web::models::{LoginForm, NextQuery, RegisterForm};
use crate::web::templates::{base_context, render};
use crate::web::{AppError, AppState};

const FLASH_COOKIE: &str = "flash";
const FLASH_REGISTERED: &str = "registered";

fn flash_message(key: &str) -> Option<&'static str> {
    match key {
        FLASH_REGISTERED => Some("Your account has been created! You are now able to log in"),
        _ => None,
    }
}

fn session_cookie(token: String, config: &ServerConfig) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .max_age(time::Duration::hours(config.token_ttl_hours))
        .build()
}

// --- Registration ---

fn render_register(
    app_state: &AppState,
    form: &RegisterForm,
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let mut context = base_context(None);
    // Passwords are never echoed back.
    context.insert("username", &form.username);
    context.insert("email", &form.email);
    context.insert("errors", errors);
    Ok(render(&app_state.templates, "register.html", &context)?.into_response())
}

async fn register_page_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    render_register(&app_state, &RegisterForm::default(), &ValidationErrors::new())
}

async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match auth_service::create_account(&app_state.db_pool, &form, app_state.config.bcrypt_cost).await {
        Ok(_) => {
            let flash = Cookie::build((FLASH_COOKIE, FLASH_REGISTERED))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax);
            Ok((jar.add(flash), Redirect::to("/login")).into_response())
        }
        Err(AppError::Validation(errors)) => render_register(&app_state, &form, &errors),
        Err(e) => Err(e),
    }
}

// --- Login / logout ---

struct LoginPage<'a> {
    username: &'a str,
    next: Option<String>,
    error: Option<&'a str>,
    flash: Option<&'a str>,
}

fn render_login(app_state: &AppState, page: LoginPage<'_>) -> Result<Response, AppError> {
    let mut context = base_context(None);
    context.insert("username", page.username);
    context.insert("next", &page.next);
    context.insert("error", &page.error);
    context.insert("flash", &page.flash);
    Ok(render(&app_state.templates, "login.html", &context)?.into_response())
}

async fn login_page_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
) -> Result<Response, AppError> {
    let flash = jar
        .get(FLASH_COOKIE)
        .and_then(|c| flash_message(c.value()));

    let page = LoginPage {
        username: "",
        next: safe_next(query.next.as_deref()),
        error: None,
        flash,
    };
    let body = render_login(&app_state, page)?;

    // One-shot: drop the flash once shown.
    let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/"));
    Ok((jar, body).into_response())
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref());

    let user = match auth_service::authenticate(&app_state.db_pool, &form.username, &form.password).await {
        Ok(user) => user,
        Err(AppError::InvalidCredentials) => {
            let page = LoginPage {
                username: &form.username,
                next,
                error: Some("Please enter a correct username and password."),
                flash: None,
            };
            return render_login(&app_state, page);
        }
        Err(e) => return Err(e),
    };

    let token = auth_service::issue_token(
        &user,
        &app_state.config.jwt_secret,
        app_state.config.token_ttl_hours,
    )?;
    info!(user_id = user.id, "User logged in.");

    let target = next.unwrap_or_else(|| "/".to_string());
    let jar = jar.add(session_cookie(token, &app_state.config));
    Ok((jar, Redirect::to(&target)).into_response())
}

async fn logout_handler(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build((AUTH_COOKIE, "")).path("/"));
    (jar, Redirect::to("/login"))
}

async fn health_check_handler() -> &'static str {
    "OK"
}

// --- Router ---

pub fn create_auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check_handler))
        .route("/register", get(register_page_handler).post(register_handler))
        .route("/login", get(login_page_handler).post(login_handler))
        .route("/logout", post(logout_handler))
}
