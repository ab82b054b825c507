//! HTML rendering with Tera over templates embedded at build time.

use axum::response::Html;
use rust_embed::RustEmbed;
use tera::{Context, Tera};

use crate::web::error::AppError;
use crate::web::models::AuthenticatedUser;

#[derive(RustEmbed, Clone)]
#[folder = "templates/"]
pub struct TemplateAssets;

/// Builds a Tera instance from every embedded `.html` file.
pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut sources = Vec::new();
    for name in TemplateAssets::iter() {
        let Some(file) = TemplateAssets::get(&name) else {
            continue;
        };
        let body = String::from_utf8(file.data.into_owned())
            .map_err(|e| tera::Error::msg(format!("Template {name} is not UTF-8: {e}")))?;
        sources.push((name.to_string(), body));
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(sources)?;
    Ok(tera)
}

/// Context every page starts from: the signed-in user for the nav bar.
pub fn base_context(user: Option<&AuthenticatedUser>) -> Context {
    let mut context = Context::new();
    context.insert("current_user", &user);
    context
}

pub fn render(tera: &Tera, name: &str, context: &Context) -> Result<Html<String>, AppError> {
    Ok(Html(tera.render(name, context)?))
}
