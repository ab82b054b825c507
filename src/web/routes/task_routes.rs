use axum::{
    Router,
    extract::{Extension, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::Form;
use std::sync::Arc;

use crate::db::services::{TagService, TaskError, TaskService};
use crate::validation::ValidationErrors;
use crate::web::models::{AuthenticatedUser, PageQuery, TaskForm};
use crate::web::templates::{base_context, render};
use crate::web::{AppError, AppState};

// --- Route Handlers ---

/// Entry point: the signed-in user's tasks, or a trip to the login page.
pub async fn home_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<Option<AuthenticatedUser>>,
) -> Result<Response, AppError> {
    let Some(user) = user else {
        return Err(AppError::Unauthenticated("/".to_string()));
    };

    let tasks = TaskService::list_tasks(&app_state.db_pool, user.id).await?;
    let mut context = base_context(Some(&user));
    context.insert("tasks", &tasks);
    Ok(render(&app_state.templates, "home.html", &context)?.into_response())
}

async fn recent_tasks_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let page = match query.page.as_deref().map(str::trim) {
        None | Some("") => 1,
        Some(raw) => raw.parse::<u64>().map_err(|_| TaskError::InvalidPage(0))?,
    };

    let page = TaskService::list_recent_tasks(&app_state.db_pool, page).await?;
    let mut context = base_context(Some(&user));
    context.insert("page", &page);
    Ok(render(&app_state.templates, "recent.html", &context)?.into_response())
}

struct TaskFormPage<'a> {
    title: &'a str,
    action: String,
}

async fn render_task_form(
    app_state: &AppState,
    user: &AuthenticatedUser,
    page: TaskFormPage<'_>,
    form: &TaskForm,
    errors: &ValidationErrors,
) -> Result<Response, AppError> {
    let all_tags = TagService::list_tags(&app_state.db_pool).await?;

    let mut context = base_context(Some(user));
    context.insert("title", page.title);
    context.insert("action", &page.action);
    context.insert("form", &form.context_value());
    context.insert("errors", errors);
    context.insert("all_tags", &all_tags);
    Ok(render(&app_state.templates, "task_form.html", &context)?.into_response())
}

async fn new_task_page_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Response, AppError> {
    let page = TaskFormPage {
        title: "New task",
        action: "/tasks/new".to_string(),
    };
    render_task_form(&app_state, &user, page, &TaskForm::default(), &ValidationErrors::new()).await
}

async fn create_task_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Form(form): Form<TaskForm>,
) -> Result<Response, AppError> {
    let page = TaskFormPage {
        title: "New task",
        action: "/tasks/new".to_string(),
    };

    let input = match form.clone().into_input() {
        Ok(input) => input,
        Err(errors) => return render_task_form(&app_state, &user, page, &form, &errors).await,
    };

    match TaskService::create_task(&app_state.db_pool, user.id, input).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(TaskError::Validation(errors)) => {
            render_task_form(&app_state, &user, page, &form, &errors).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn edit_task_page_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(task_id): Path<i32>,
) -> Result<Response, AppError> {
    let task = TaskService::get_owned_task(&app_state.db_pool, user.id, task_id).await?;
    let page = TaskFormPage {
        title: "Edit task",
        action: format!("/tasks/{task_id}/edit"),
    };
    render_task_form(&app_state, &user, page, &TaskForm::from_task(&task), &ValidationErrors::new())
        .await
}

async fn update_task_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(task_id): Path<i32>,
    Form(form): Form<TaskForm>,
) -> Result<Response, AppError> {
    // Someone else's task is a 404 whether or not the form is valid.
    TaskService::get_owned_task(&app_state.db_pool, user.id, task_id).await?;

    let page = TaskFormPage {
        title: "Edit task",
        action: format!("/tasks/{task_id}/edit"),
    };

    let input = match form.clone().into_input() {
        Ok(input) => input,
        Err(errors) => return render_task_form(&app_state, &user, page, &form, &errors).await,
    };

    match TaskService::update_task(&app_state.db_pool, user.id, task_id, input).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(TaskError::Validation(errors)) => {
            render_task_form(&app_state, &user, page, &form, &errors).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_task_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(task_id): Path<i32>,
) -> Result<Redirect, AppError> {
    TaskService::delete_task(&app_state.db_pool, user.id, task_id).await?;
    Ok(Redirect::to("/"))
}

async fn toggle_task_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(task_id): Path<i32>,
) -> Result<Redirect, AppError> {
    TaskService::toggle_task(&app_state.db_pool, user.id, task_id).await?;
    Ok(Redirect::to("/"))
}

// --- Router ---

/// Task routes that require a signed-in user.
pub fn create_tasks_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks/recent", get(recent_tasks_handler))
        .route("/tasks/new", get(new_task_page_handler).post(create_task_handler))
        .route(
            "/tasks/{task_id}/edit",
            get(edit_task_page_handler).post(update_task_handler),
        )
        .route("/tasks/{task_id}/delete", post(delete_task_handler))
        .route("/tasks/{task_id}/toggle", post(toggle_task_handler))
}
