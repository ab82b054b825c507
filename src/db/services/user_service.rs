use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;

use crate::db::entities::prelude::{Task, TaskTag, User};
use crate::db::entities::{task, task_tag, user};

/// Creates a new user. `password_hash` must already be hashed.
pub async fn create_user(
    db: &DbConn,
    username: String,
    email: String,
    password_hash: String,
) -> Result<user::Model, DbErr> {
    let new_user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    new_user.insert(db).await
}

pub async fn get_user_by_id(db: &DbConn, user_id: i32) -> Result<Option<user::Model>, DbErr> {
    User::find_by_id(user_id).one(db).await
}

pub async fn get_user_by_username(db: &DbConn, username: &str) -> Result<Option<user::Model>, DbErr> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
}

/// Deletes a user together with their tasks and those tasks' tag links.
/// Returns `false` when no such user exists.
pub async fn delete_user(db: &DbConn, user_id: i32) -> Result<bool, DbErr> {
    let txn = db.begin().await?;
    let Some(user) = User::find_by_id(user_id).one(&txn).await? else {
        return Ok(false);
    };

    let task_ids: Vec<i32> = Task::find()
        .filter(task::Column::UserId.eq(user.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();

    if !task_ids.is_empty() {
        TaskTag::delete_many()
            .filter(task_tag::Column::TaskId.is_in(task_ids.iter().copied()))
            .exec(&txn)
            .await?;
        Task::delete_many()
            .filter(task::Column::UserId.eq(user.id))
            .exec(&txn)
            .await?;
    }
    user.delete(&txn).await?;
    txn.commit().await?;

    info!(user_id, tasks_removed = task_ids.len(), "User deleted.");
    Ok(true)
}
