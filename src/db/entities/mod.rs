//! SeaORM entities for the task board tables.

pub mod tag;
pub mod task;
pub mod task_tag;
pub mod user;

// Prelude module for easy importing of all entities and their related types
pub mod prelude {
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;

    pub use super::task::ActiveModel as TaskActiveModel;
    pub use super::task::Column as TaskColumn;
    pub use super::task::Entity as Task;
    pub use super::task::Model as TaskModel;

    pub use super::tag::ActiveModel as TagActiveModel;
    pub use super::tag::Column as TagColumn;
    pub use super::tag::Entity as Tag;
    pub use super::tag::Model as TagModel;

    pub use super::task_tag::ActiveModel as TaskTagActiveModel;
    pub use super::task_tag::Column as TaskTagColumn;
    pub use super::task_tag::Entity as TaskTag;
    pub use super::task_tag::Model as TaskTagModel;
}
