/*
 * Responsibility
 * - any method on /: only reached once the CSRF check passed
 */
pub async fn hello() -> &'static str {
    "hello"
}
