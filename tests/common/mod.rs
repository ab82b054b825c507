#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use tower::ServiceExt;

use taskboard::db::entities::user;
use taskboard::db::schema;
use taskboard::db::services::user_service;
use taskboard::server::config::ServerConfig;
use taskboard::services::auth_service;
use taskboard::web::{self, templates};

pub const JWT_SECRET: &str = "test-secret";
pub const PASSWORD: &str = "correct-horse-battery";

/// Fresh in-memory SQLite database with the schema applied.
pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    // One connection: every pooled connection would otherwise get its own empty database.
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    schema::create_tables(&db).await.unwrap();
    db
}

/// Inserts a user directly, with a cheap bcrypt hash.
pub async fn create_user(db: &DatabaseConnection, username: &str) -> user::Model {
    let password_hash = bcrypt::hash(PASSWORD, 4).unwrap();
    user_service::create_user(
        db,
        username.to_string(),
        format!("{username}@example.com"),
        password_hash,
    )
    .await
    .unwrap()
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        token_ttl_hours: 1,
        secure_cookies: false,
        bcrypt_cost: 4,
        log_dir: "logs".to_string(),
    }
}

pub fn test_app(db: DatabaseConnection) -> Router {
    let tera = templates::load_templates().unwrap();
    web::create_axum_router(db, Arc::new(tera), Arc::new(test_config()))
}

pub fn auth_cookie(user: &user::Model) -> String {
    let token = auth_service::issue_token(user, JWT_SECRET, 1).unwrap();
    format!("token={token}")
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: &Router, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::from(form.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
