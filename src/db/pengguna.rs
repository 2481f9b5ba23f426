//! User account queries.

use super::AppState;
use crate::auth::model::{Role, User};
use crate::error::AppError;

impl AppState {
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Create a user together with its profile row, atomically.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
        nama_lengkap: &str,
        nik: &str,
    ) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, role, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO profil (user_id, nama_lengkap, nik) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(nama_lengkap)
            .bind(nik)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }
}
