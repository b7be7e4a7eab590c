/*
 * Responsibility
 * - csrf: double-submit token check (library surface)
 * - http: request id / trace / limits for the demo server
 */
pub mod csrf;
pub mod http;

pub use csrf::CsrfProtection;
