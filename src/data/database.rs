//! SQLite database operations
//!
//! All database access goes through this module.

use sqlx::{Pool, Sqlite, SqlitePool};

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to the database and run pending migrations.
    ///
    /// # Arguments
    /// * `url` - SQLite connection string, e.g. `sqlite://app.db?mode=rwc`
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let pool = SqlitePool::connect(url).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Load a user by primary key
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // OAuth links
    // =========================================================================

    /// Find the link for a provider identity
    pub async fn find_oauth_link(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<OAuthLink>, AppError> {
        let link = sqlx::query_as::<_, OAuthLink>(
            "SELECT * FROM oauth WHERE provider = ? AND provider_user_id = ?",
        )
        .bind(provider)
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    /// Find the most recent link a user holds for `provider`
    pub async fn find_oauth_link_for_user(
        &self,
        user_id: i64,
        provider: &str,
    ) -> Result<Option<OAuthLink>, AppError> {
        let link = sqlx::query_as::<_, OAuthLink>(
            "SELECT * FROM oauth WHERE user_id = ? AND provider = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    pub async fn count_oauth_links(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM oauth")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Replace the token stored on a persisted link
    ///
    /// # Returns
    /// `true` if a row was updated
    pub async fn update_oauth_token(&self, link_id: i64, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE oauth SET token = ? WHERE id = ?")
            .bind(token)
            .bind(link_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Create a user and associate `link` with it in one transaction.
    ///
    /// The link is inserted when it has no id yet, otherwise its user
    /// reference and token are updated in place.
    ///
    /// # Returns
    /// The stored user and link, both with their assigned ids
    pub async fn create_user_with_link(
        &self,
        new_user: &NewUser,
        link: &OAuthLink,
    ) -> Result<(User, OAuthLink), AppError> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query("INSERT INTO users (username, email, join_date) VALUES (?, ?, ?)")
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(new_user.join_date)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        let link_id = match link.id {
            Some(link_id) => {
                sqlx::query("UPDATE oauth SET user_id = ?, token = ? WHERE id = ?")
                    .bind(user_id)
                    .bind(&link.token)
                    .bind(link_id)
                    .execute(&mut *tx)
                    .await?;
                link_id
            }
            None => sqlx::query(
                r#"
                INSERT INTO oauth (provider, provider_user_id, token, created_at, user_id)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&link.provider)
            .bind(&link.provider_user_id)
            .bind(&link.token)
            .bind(link.created_at)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid(),
        };

        tx.commit().await?;

        let user = User {
            id: user_id,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            join_date: Some(new_user.join_date),
        };
        let link = OAuthLink {
            id: Some(link_id),
            user_id: Some(user_id),
            ..link.clone()
        };

        Ok((user, link))
    }

    /// Insert a link that is not associated with any user yet
    #[cfg(test)]
    pub(crate) async fn insert_unlinked_oauth(&self, link: &OAuthLink) -> Result<i64, AppError> {
        let id = sqlx::query(
            r#"
            INSERT INTO oauth (provider, provider_user_id, token, created_at, user_id)
            VALUES (?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&link.provider)
        .bind(&link.provider_user_id)
        .bind(&link.token)
        .bind(link.created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(id)
    }
}
