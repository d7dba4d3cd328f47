pub mod auth;
pub mod measurement;
pub mod ml;
pub mod nutrition;
pub mod user;

pub async fn health() -> &'static str {
    "Backend is running!"
}
