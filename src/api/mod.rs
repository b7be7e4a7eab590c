/*
 * Responsibility
 * - Demo routes mounted behind the CSRF middleware
 */
pub mod handlers;
mod routes;

pub use routes::routes;
