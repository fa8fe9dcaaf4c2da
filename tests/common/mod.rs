use axum::body::Body;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

/// Connect to the test database. Schema is created lazily per pool by
/// `import`, so there are no migrations to run up front.
pub async fn setup_pool() -> PgPool {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL_VOUCHER"))
        .expect("DATABASE_URL or DATABASE_URL_VOUCHER must be set for integration tests");

    PgPoolOptions::new()
        .max_connections(5)
        .idle_timeout(Some(std::time::Duration::from_secs(30)))
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await
        .expect("Failed to connect to test database")
}

/// Build the full router with pool state for testing.
pub fn app(pool: &PgPool) -> Router {
    voucher_rs::routes::router(pool.clone())
}

/// A pool name unique to this test run, so concurrent tests never collide
/// on the same dynamically-created tables.
pub fn unique_pool_name() -> String {
    format!("p{}", Uuid::new_v4().simple())
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
