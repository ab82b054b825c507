//! Table creation from the entity definitions.
//!
//! Statements use `IF NOT EXISTS`, so running this on every start is safe.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};
use tracing::info;

use crate::db::entities::{tag, task, task_tag, user};

async fn create_table_for<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

/// Creates `users`, `tags`, `tasks` and `task_tags`, parents first.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table_for(db, &schema, user::Entity).await?;
    create_table_for(db, &schema, tag::Entity).await?;
    create_table_for(db, &schema, task::Entity).await?;
    create_table_for(db, &schema, task_tag::Entity).await?;

    info!("Database schema is ready.");
    Ok(())
}
