//! Shared fixtures for service-level tests: an in-memory SQLite pool
//! with the schema applied, plus seed helpers.

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::{
    models::{Gender, NewUser, SystemRole, User},
    repository::UserRepository,
};

pub async fn test_pool() -> Pool<Sqlite> {
    // One connection: every connection to `sqlite::memory:` would get
    // its own empty database otherwise.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database should open");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations should apply");

    pool
}

pub async fn seed_user(pool: &Pool<Sqlite>, display_name: &str, gender: Option<Gender>) -> User {
    UserRepository::new(pool.clone())
        .create(NewUser {
            display_name: display_name.to_string(),
            gender,
            role: SystemRole::User,
        })
        .await
        .expect("user insert should succeed")
}
