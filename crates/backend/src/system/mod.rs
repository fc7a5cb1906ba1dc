pub mod auth;
pub mod handlers;
pub mod initialization;
pub mod middleware;
pub mod routes;
pub mod tracing;
pub mod users;
