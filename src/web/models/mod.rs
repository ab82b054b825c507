use serde::{Deserialize, Serialize};

pub mod forms;

pub use forms::{LoginForm, NextQuery, PageQuery, RegisterForm, TagForm, TaskForm};

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub user_id: i32,
    pub exp: usize,
}

/// Struct to hold authenticated user details, to be passed as a request extension.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
}
