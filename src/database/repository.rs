use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::manager::StoreError;
use crate::database::models::{Post, User};

/// Data access consumed by the credential store and the handlers.
///
/// Implementations must be safe for concurrent use; callers add no locking of their own.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Insert-or-replace keyed by slug. Sets `created` when absent, `modified` always.
    async fn save_post(&self, post: Post) -> Result<Post, StoreError>;

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, StoreError>;

    /// Newest created first. An empty table is an empty list, not `NotFound`.
    async fn get_all_posts(&self) -> Result<Vec<Post>, StoreError>;

    /// Upsert keyed by username. An empty `password_hash` keeps the stored one.
    async fn save_user(&self, user: User) -> Result<User, StoreError>;

    /// Insert only. A taken username is `AlreadyExists`, never an overwrite.
    async fn create_user(&self, user: User) -> Result<User, StoreError>;

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError>;

    async fn delete_user(&self, username: &str) -> Result<(), StoreError>;
}

const POST_COLUMNS: &str = "posts.slug, posts.user_id, COALESCE(users.name, '') AS author, \
     posts.title, COALESCE(posts.body, '') AS body, posts.created, posts.modified";

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn save_post(&self, mut post: Post) -> Result<Post, StoreError> {
        let now = Utc::now();
        if post.created.is_none() {
            post.created = Some(now);
        }
        post.modified = Some(now);

        // The first save fixes `created`; re-saves overwrite everything else in place.
        sqlx::query(
            "INSERT INTO posts(slug, user_id, title, body, created, modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(slug) DO UPDATE SET
                user_id = excluded.user_id,
                title = excluded.title,
                body = excluded.body,
                modified = excluded.modified",
        )
        .bind(&post.slug)
        .bind(post.user_id)
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.created)
        .bind(post.modified)
        .execute(&self.pool)
        .await?;

        self.get_post_by_slug(&post.slug).await
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, StoreError> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts LEFT JOIN users ON posts.user_id = users.id
             WHERE posts.slug = ?1"
        );

        sqlx::query_as::<_, Post>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("post '{slug}'")))
    }

    async fn get_all_posts(&self) -> Result<Vec<Post>, StoreError> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts LEFT JOIN users ON posts.user_id = users.id
             ORDER BY julianday(posts.created) DESC, posts.slug"
        );

        let posts = sqlx::query_as::<_, Post>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn save_user(&self, user: User) -> Result<User, StoreError> {
        let saved = sqlx::query_as::<_, User>(
            "INSERT INTO users(username, name, password) VALUES (?1, ?2, ?3)
             ON CONFLICT(username) DO UPDATE SET
                name = excluded.name,
                password = CASE WHEN excluded.password = '' THEN users.password
                                ELSE excluded.password END
             RETURNING id, username, name, password",
        )
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users(username, name, password) VALUES (?1, ?2, ?3)
             RETURNING id, username, name, password",
        )
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::AlreadyExists(format!("user '{}'", user.username))
            }
            other => StoreError::Sqlx(other),
        })?;

        Ok(created)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, name, password FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("user '{username}'")))
    }

    async fn delete_user(&self, username: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?1")
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user '{username}'")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use chrono::Duration;

    async fn repo() -> SqliteRepository {
        SqliteRepository::new(DatabaseManager::in_memory().await.unwrap())
    }

    fn user(username: &str, name: &str, hash: &str) -> User {
        let mut user = User::new(username, name);
        user.password_hash = hash.to_string();
        user
    }

    #[tokio::test]
    async fn save_user_assigns_id_and_upserts_by_username() {
        let repo = repo().await;
        let first = repo.save_user(user("alice", "Alice", "h1")).await.unwrap();
        assert!(first.id >= 1);

        // Re-save without a hash keeps the stored one and the id.
        let second = repo.save_user(user("alice", "Alice A.", "")).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.display_name, "Alice A.");
        assert_eq!(second.password_hash, "h1");

        let third = repo.save_user(user("alice", "Alice A.", "h2")).await.unwrap();
        assert_eq!(third.password_hash, "h2");
    }

    #[tokio::test]
    async fn create_user_never_overwrites() {
        let repo = repo().await;
        let alice = repo.create_user(user("alice", "Alice", "h1")).await.unwrap();
        assert!(alice.id >= 1);

        let err = repo.create_user(user("alice", "Mallory", "h2")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));

        let stored = repo.get_user_by_username("alice").await.unwrap();
        assert_eq!(stored.display_name, "Alice");
        assert_eq!(stored.password_hash, "h1");
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let repo = repo().await;
        assert!(repo.get_user_by_username("ghost").await.unwrap_err().is_not_found());
        assert!(repo.get_post_by_slug("missing").await.unwrap_err().is_not_found());
        assert!(repo.delete_user("ghost").await.unwrap_err().is_not_found());
        assert!(repo.get_all_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_post_joins_author_and_keeps_created() {
        let repo = repo().await;
        let alice = repo.save_user(user("alice", "Alice", "h")).await.unwrap();

        let post = Post {
            slug: "hi".into(),
            user_id: alice.id,
            title: "Hi".into(),
            body: "<p>x</p>".into(),
            ..Default::default()
        };
        let saved = repo.save_post(post.clone()).await.unwrap();
        assert_eq!(saved.author, "Alice");
        let created = saved.created.unwrap();
        assert!(saved.modified.unwrap() >= created);

        let mut edit = post;
        edit.title = "Hello".into();
        let resaved = repo.save_post(edit).await.unwrap();
        assert_eq!(resaved.title, "Hello");
        assert_eq!(resaved.created.unwrap(), created);
        assert_eq!(repo.get_all_posts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn posts_listed_newest_first() {
        let repo = repo().await;
        let alice = repo.save_user(user("alice", "Alice", "h")).await.unwrap();
        let now = Utc::now();

        for (slug, age) in [("old", 3), ("newest", 0), ("middle", 1)] {
            repo.save_post(Post {
                slug: slug.into(),
                user_id: alice.id,
                title: slug.into(),
                created: Some(now - Duration::days(age)),
                ..Default::default()
            })
            .await
            .unwrap();
        }

        let slugs: Vec<_> = repo
            .get_all_posts()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(slugs, ["newest", "middle", "old"]);
    }
}
