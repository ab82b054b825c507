use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use tracing::info;

use crate::db::entities::prelude::{Tag, TaskTag};
use crate::db::entities::{tag, task_tag};
use crate::validation::{ValidationErrors, normalize_tag_name};

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Tag not found: {0}")]
    NotFound(i32),
    #[error("Invalid tag: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Tags are shared by every user, so none of these calls take an owner.
pub struct TagService;

impl TagService {
    pub async fn list_tags(db: &DbConn) -> Result<Vec<tag::Model>, TagError> {
        Ok(Tag::find().order_by_asc(tag::Column::Id).all(db).await?)
    }

    pub async fn create_tag(db: &DbConn, name: &str) -> Result<tag::Model, TagError> {
        let name = normalize_tag_name(name)?;

        let new_tag = tag::ActiveModel {
            name: Set(name),
            ..Default::default()
        };
        let tag = new_tag.insert(db).await?;

        info!(tag_id = tag.id, name = %tag.name, "Tag created.");
        Ok(tag)
    }

    pub async fn get_tag(db: &DbConn, tag_id: i32) -> Result<tag::Model, TagError> {
        Tag::find_by_id(tag_id)
            .one(db)
            .await?
            .ok_or(TagError::NotFound(tag_id))
    }

    pub async fn update_tag(db: &DbConn, tag_id: i32, name: &str) -> Result<tag::Model, TagError> {
        let tag = Self::get_tag(db, tag_id).await?;
        let name = normalize_tag_name(name)?;

        let mut active_tag: tag::ActiveModel = tag.into();
        active_tag.name = Set(name);
        let tag = active_tag.update(db).await?;

        info!(tag_id, name = %tag.name, "Tag renamed.");
        Ok(tag)
    }

    /// Deletes the tag and detaches it from every task that carried it.
    pub async fn delete_tag(db: &DbConn, tag_id: i32) -> Result<(), TagError> {
        let txn = db.begin().await?;
        let tag = Tag::find_by_id(tag_id)
            .one(&txn)
            .await?
            .ok_or(TagError::NotFound(tag_id))?;

        let detached = TaskTag::delete_many()
            .filter(task_tag::Column::TagId.eq(tag.id))
            .exec(&txn)
            .await?
            .rows_affected;
        tag.delete(&txn).await?;
        txn.commit().await?;

        info!(tag_id, detached, "Tag deleted.");
        Ok(())
    }
}
