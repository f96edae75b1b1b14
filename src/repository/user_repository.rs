use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{NewUser, User},
};

const USER_COLUMNS: &str = "id, display_name, gender, role, is_active";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: Pool<Sqlite>,
}

impl UserRepository {
    pub fn new(pool: Pool<Sqlite>) -> UserRepository {
        UserRepository { pool }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>> {
        let mut conn = self.pool.acquire().await?;
        self.get_by_ids_on(&mut conn, user_ids).await
    }

    pub async fn get_by_ids_on(
        &self,
        conn: &mut SqliteConnection,
        user_ids: &[Uuid],
    ) -> Result<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for user_id in user_ids {
            separated.push_bind(*user_id);
        }
        builder.push(")");

        let users = builder.build_query_as::<User>().fetch_all(conn).await?;

        Ok(users)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, display_name, gender, role, is_active) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new_user.display_name)
        .bind(new_user.gender)
        .bind(new_user.role)
        .bind(true)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
