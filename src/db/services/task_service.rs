use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbConn, DbErr, EntityTrait, LoaderTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::db::entities::prelude::{Tag, Task, TaskTag};
use crate::db::entities::{tag, task, task_tag};
use crate::db::models::{TaskPage, TaskWithTags};
use crate::validation::{ValidationErrors, normalize_task_content};

pub const RECENT_TASKS_PAGE_SIZE: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    /// The task does not exist or belongs to someone else.
    #[error("Task not found: {0}")]
    NotFound(i32),
    #[error("Invalid task: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Invalid page: {0}")]
    InvalidPage(u64),
}

/// The mutable fields of a task, as submitted on create or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInput {
    pub content: String,
    pub deadline: Option<DateTime<Utc>>,
    pub is_done: bool,
    pub tag_ids: BTreeSet<i32>,
}

pub struct TaskService;

impl TaskService {
    /// Tasks owned by `user_id`: open tasks first, newest first within each group.
    pub async fn list_tasks(db: &DbConn, user_id: i32) -> Result<Vec<TaskWithTags>, TaskError> {
        let tasks = Task::find()
            .filter(task::Column::UserId.eq(user_id))
            .order_by_asc(task::Column::IsDone)
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(db)
            .await?;

        Ok(with_tags(db, tasks).await?)
    }

    /// Every task regardless of owner, newest first, five per page.
    pub async fn list_recent_tasks(db: &DbConn, page: u64) -> Result<TaskPage, TaskError> {
        let paginator = Task::find()
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .paginate(db, RECENT_TASKS_PAGE_SIZE);

        let num_pages = paginator.num_pages().await?;
        // An empty listing still has a (blank) first page.
        let last_page = num_pages.max(1);
        if page == 0 || page > last_page {
            return Err(TaskError::InvalidPage(page));
        }

        let tasks = paginator.fetch_page(page - 1).await?;
        Ok(TaskPage {
            tasks: with_tags(db, tasks).await?,
            page,
            num_pages: last_page,
            has_previous: page > 1,
            has_next: page < last_page,
        })
    }

    pub async fn create_task(
        db: &DbConn,
        user_id: i32,
        input: TaskInput,
    ) -> Result<TaskWithTags, TaskError> {
        let content = normalize_task_content(&input.content)?;

        let txn = db.begin().await?;
        ensure_tags_exist(&txn, &input.tag_ids).await?;

        let new_task = task::ActiveModel {
            user_id: Set(user_id),
            content: Set(content),
            created_at: Set(Utc::now()),
            deadline: Set(input.deadline),
            is_done: Set(input.is_done),
            ..Default::default()
        };
        let task = new_task.insert(&txn).await?;
        link_tags(&txn, task.id, &input.tag_ids).await?;
        let tags = tags_of(&txn, &task).await?;
        txn.commit().await?;

        info!(user_id, task_id = task.id, tag_count = tags.len(), "Task created.");
        Ok(TaskWithTags::from_parts(task, tags))
    }

    /// The task with `task_id`, only if `user_id` owns it.
    pub async fn get_owned_task(
        db: &DbConn,
        user_id: i32,
        task_id: i32,
    ) -> Result<TaskWithTags, TaskError> {
        let task = find_owned(db, user_id, task_id).await?;
        let tags = tags_of(db, &task).await?;
        Ok(TaskWithTags::from_parts(task, tags))
    }

    /// Overwrites content, deadline, completion and tags. `created_at` and the
    /// owner never change.
    pub async fn update_task(
        db: &DbConn,
        user_id: i32,
        task_id: i32,
        input: TaskInput,
    ) -> Result<TaskWithTags, TaskError> {
        let txn = db.begin().await?;
        let task = find_owned(&txn, user_id, task_id).await?;

        let content = normalize_task_content(&input.content)?;
        ensure_tags_exist(&txn, &input.tag_ids).await?;

        let mut active_task: task::ActiveModel = task.into();
        active_task.content = Set(content);
        active_task.deadline = Set(input.deadline);
        active_task.is_done = Set(input.is_done);
        let task = active_task.update(&txn).await?;

        TaskTag::delete_many()
            .filter(task_tag::Column::TaskId.eq(task.id))
            .exec(&txn)
            .await?;
        link_tags(&txn, task.id, &input.tag_ids).await?;
        let tags = tags_of(&txn, &task).await?;
        txn.commit().await?;

        info!(user_id, task_id, "Task updated.");
        Ok(TaskWithTags::from_parts(task, tags))
    }

    /// Removes the task and its tag links. The tags themselves stay.
    pub async fn delete_task(db: &DbConn, user_id: i32, task_id: i32) -> Result<(), TaskError> {
        let txn = db.begin().await?;
        let task = find_owned(&txn, user_id, task_id).await?;

        TaskTag::delete_many()
            .filter(task_tag::Column::TaskId.eq(task.id))
            .exec(&txn)
            .await?;
        task.delete(&txn).await?;
        txn.commit().await?;

        info!(user_id, task_id, "Task deleted.");
        Ok(())
    }

    pub async fn toggle_task(
        db: &DbConn,
        user_id: i32,
        task_id: i32,
    ) -> Result<TaskWithTags, TaskError> {
        let task = find_owned(db, user_id, task_id).await?;
        let is_done = !task.is_done;

        let mut active_task: task::ActiveModel = task.into();
        active_task.is_done = Set(is_done);
        let task = active_task.update(db).await?;
        let tags = tags_of(db, &task).await?;

        info!(user_id, task_id, is_done, "Task toggled.");
        Ok(TaskWithTags::from_parts(task, tags))
    }
}

async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    task_id: i32,
) -> Result<task::Model, TaskError> {
    Task::find_by_id(task_id)
        .filter(task::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(TaskError::NotFound(task_id))
}

async fn ensure_tags_exist<C: ConnectionTrait>(
    conn: &C,
    tag_ids: &BTreeSet<i32>,
) -> Result<(), TaskError> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    let found: BTreeSet<i32> = Tag::find()
        .filter(tag::Column::Id.is_in(tag_ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();

    if let Some(missing) = tag_ids.difference(&found).next() {
        return Err(TaskError::Validation(ValidationErrors::single(
            "tags",
            format!("Select a valid choice. {missing} is not one of the available choices."),
        )));
    }
    Ok(())
}

async fn link_tags<C: ConnectionTrait>(
    conn: &C,
    task_id: i32,
    tag_ids: &BTreeSet<i32>,
) -> Result<(), DbErr> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    let links = tag_ids.iter().map(|&tag_id| task_tag::ActiveModel {
        task_id: Set(task_id),
        tag_id: Set(tag_id),
    });
    TaskTag::insert_many(links).exec_without_returning(conn).await?;
    Ok(())
}

async fn tags_of<C: ConnectionTrait>(conn: &C, task: &task::Model) -> Result<Vec<tag::Model>, DbErr> {
    task.find_related(Tag).all(conn).await
}

async fn with_tags<C: ConnectionTrait>(
    conn: &C,
    tasks: Vec<task::Model>,
) -> Result<Vec<TaskWithTags>, DbErr> {
    let tags = tasks.load_many_to_many(Tag, TaskTag, conn).await?;
    Ok(tasks
        .into_iter()
        .zip(tags)
        .map(|(task, tags)| TaskWithTags::from_parts(task, tags))
        .collect())
}
