pub mod auth_routes;
pub mod tag_routes;
pub mod task_routes;
