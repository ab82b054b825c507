use axum::{
    Router,
    extract::{Extension, Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::Form;
use std::sync::Arc;

use crate::db::services::{TagError, TagService};
use crate::validation::ValidationErrors;
use crate::web::models::{AuthenticatedUser, TagForm};
use crate::web::templates::{base_context, render};
use crate::web::{AppError, AppState};

// --- Route Handlers ---

async fn tag_list_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Response, AppError> {
    let tags = TagService::list_tags(&app_state.db_pool).await?;
    let mut context = base_context(Some(&user));
    context.insert("tags", &tags);
    Ok(render(&app_state.templates, "tag_list.html", &context)?.into_response())
}

fn render_tag_form(
    app_state: &AppState,
    user: &AuthenticatedUser,
    title: &str,
    action: &str,
    form: &TagForm,
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let mut context = base_context(Some(user));
    context.insert("title", title);
    context.insert("action", action);
    context.insert("name", &form.name);
    context.insert("errors", errors);
    Ok(render(&app_state.templates, "tag_form.html", &context)?.into_response())
}

async fn new_tag_page_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Response, AppError> {
    render_tag_form(
        &app_state,
        &user,
        "New tag",
        "/tags/new",
        &TagForm::default(),
        &ValidationErrors::new(),
    )
}

async fn create_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Form(form): Form<TagForm>,
) -> Result<Response, AppError> {
    match TagService::create_tag(&app_state.db_pool, &form.name).await {
        Ok(_) => Ok(Redirect::to("/tags").into_response()),
        Err(TagError::Validation(errors)) => {
            render_tag_form(&app_state, &user, "New tag", "/tags/new", &form, &errors)
        }
        Err(e) => Err(e.into()),
    }
}

async fn edit_tag_page_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(tag_id): Path<i32>,
) -> Result<Response, AppError> {
    let tag = TagService::get_tag(&app_state.db_pool, tag_id).await?;
    let form = TagForm { name: tag.name };
    render_tag_form(
        &app_state,
        &user,
        "Edit tag",
        &format!("/tags/{tag_id}/edit"),
        &form,
        &ValidationErrors::new(),
    )
}

async fn update_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(tag_id): Path<i32>,
    Form(form): Form<TagForm>,
) -> Result<Response, AppError> {
    match TagService::update_tag(&app_state.db_pool, tag_id, &form.name).await {
        Ok(_) => Ok(Redirect::to("/tags").into_response()),
        Err(TagError::Validation(errors)) => render_tag_form(
            &app_state,
            &user,
            "Edit tag",
            &format!("/tags/{tag_id}/edit"),
            &form,
            &errors,
        ),
        Err(e) => Err(e.into()),
    }
}

async fn delete_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<Redirect, AppError> {
    TagService::delete_tag(&app_state.db_pool, tag_id).await?;
    Ok(Redirect::to("/tags"))
}

// --- Router ---

pub fn create_tags_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tags", get(tag_list_handler))
        .route("/tags/new", get(new_tag_page_handler).post(create_tag_handler))
        .route(
            "/tags/{tag_id}/edit",
            get(edit_tag_page_handler).post(update_tag_handler),
        )
        .route("/tags/{tag_id}/delete", post(delete_tag_handler))
}
