use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;

use super::SocialStore;
use crate::domain::{
    ActivityKind, DateRange, FeedPost, FollowedUser, FollowerEntry, Hashtag, LikedPost,
    OwnedRecords, PageWindow, Post, User,
};
use crate::error::ServiceResult;

/// PostgreSQL-backed store (source of truth)
#[derive(Clone)]
pub struct PgSocialStore {
    pool: PgPool,
}

/// Post joined with its author, one row per post
#[derive(sqlx::FromRow)]
struct FeedPostRow {
    id: i64,
    author_id: i64,
    content: String,
    like_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_first_name: String,
    author_last_name: String,
    author_email: String,
    author_created_at: DateTime<Utc>,
    author_updated_at: DateTime<Utc>,
}

impl FeedPostRow {
    fn into_feed_post(self, hashtags: Vec<Hashtag>) -> FeedPost {
        let author = User {
            id: self.author_id,
            first_name: self.author_first_name,
            last_name: self.author_last_name,
            email: self.author_email,
            created_at: self.author_created_at,
            updated_at: self.author_updated_at,
        };
        let post = Post {
            id: self.id,
            author_id: self.author_id,
            content: self.content,
            like_count: self.like_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        FeedPost::new(post, author, hashtags)
    }
}

#[derive(sqlx::FromRow)]
struct PostHashtagRow {
    post_id: i64,
    id: i64,
    tag: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn window_binds(window: PageWindow) -> (i64, i64) {
    (
        i64::from(window.limit),
        i64::try_from(window.offset).unwrap_or(i64::MAX),
    )
}

fn range_binds(range: Option<DateRange>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match range {
        Some(r) => (Some(r.start), Some(r.end)),
        None => (None, None),
    }
}

impl PgSocialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hashtags for a batch of posts, grouped by post id
    async fn hashtags_for_posts(
        &self,
        post_ids: &[i64],
    ) -> ServiceResult<HashMap<i64, Vec<Hashtag>>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, PostHashtagRow>(
            r#"
            SELECT ph.post_id, h.id, h.tag, h.created_at, h.updated_at
            FROM post_hashtags ph
            JOIN hashtags h ON h.id = ph.hashtag_id
            WHERE ph.post_id = ANY($1)
            ORDER BY h.tag ASC
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<Hashtag>> = HashMap::new();
        for row in rows {
            grouped.entry(row.post_id).or_default().push(Hashtag {
                id: row.id,
                tag: row.tag,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }
        Ok(grouped)
    }

    async fn authored_posts(
        &self,
        user_id: i64,
        range: Option<DateRange>,
    ) -> ServiceResult<(OwnedRecords, u64)> {
        let (start, end) = range_binds(range);

        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, like_count, created_at, updated_at
            FROM posts
            WHERE author_id = $1
              AND ($2::timestamptz IS NULL OR created_at BETWEEN $2 AND $3)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool);

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM posts
            WHERE author_id = $1
              AND ($2::timestamptz IS NULL OR created_at BETWEEN $2 AND $3)
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool);

        let (rows, count) = tokio::try_join!(rows, count)?;
        Ok((OwnedRecords::Posts(rows), to_count(count)))
    }

    async fn given_likes(
        &self,
        user_id: i64,
        range: Option<DateRange>,
    ) -> ServiceResult<(OwnedRecords, u64)> {
        let (start, end) = range_binds(range);

        let rows = sqlx::query_as::<_, LikedPost>(
            r#"
            SELECT l.id AS like_id, l.post_id, p.content AS post_content, l.created_at
            FROM likes l
            JOIN posts p ON p.id = l.post_id
            WHERE l.user_id = $1
              AND ($2::timestamptz IS NULL OR l.created_at BETWEEN $2 AND $3)
            ORDER BY l.created_at DESC, l.id DESC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool);

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM likes l
            JOIN posts p ON p.id = l.post_id
            WHERE l.user_id = $1
              AND ($2::timestamptz IS NULL OR l.created_at BETWEEN $2 AND $3)
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool);

        let (rows, count) = tokio::try_join!(rows, count)?;
        Ok((OwnedRecords::Likes(rows), to_count(count)))
    }

    async fn made_follows(
        &self,
        user_id: i64,
        range: Option<DateRange>,
    ) -> ServiceResult<(OwnedRecords, u64)> {
        let (start, end) = range_binds(range);

        let rows = sqlx::query_as::<_, FollowedUser>(
            r#"
            SELECT f.id AS follow_id, f.following_id, u.first_name, u.last_name, f.created_at
            FROM follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = $1
              AND ($2::timestamptz IS NULL OR f.created_at BETWEEN $2 AND $3)
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool);

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = $1
              AND ($2::timestamptz IS NULL OR f.created_at BETWEEN $2 AND $3)
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool);

        let (rows, count) = tokio::try_join!(rows, count)?;
        Ok((OwnedRecords::Follows(rows), to_count(count)))
    }
}

#[async_trait::async_trait]
impl SocialStore for PgSocialStore {
    async fn find_user_by_id(&self, user_id: i64) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_followed_ids(&self, user_id: i64) -> ServiceResult<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT following_id
            FROM follows
            WHERE follower_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(user_id, followed = ids.len(), "Resolved followed set");
        Ok(ids)
    }

    async fn find_posts_by_authors(
        &self,
        author_ids: &[i64],
        window: PageWindow,
    ) -> ServiceResult<(Vec<FeedPost>, u64)> {
        let (limit, offset) = window_binds(window);

        let rows = sqlx::query_as::<_, FeedPostRow>(
            r#"
            SELECT p.id, p.author_id, p.content, p.like_count, p.created_at, p.updated_at,
                   u.first_name AS author_first_name,
                   u.last_name AS author_last_name,
                   u.email AS author_email,
                   u.created_at AS author_created_at,
                   u.updated_at AS author_updated_at
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.author_id = ANY($1)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(author_ids)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool);

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM posts
            WHERE author_id = ANY($1)
            "#,
        )
        .bind(author_ids)
        .fetch_one(&self.pool);

        let (rows, total) = tokio::try_join!(rows, total)?;

        let post_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut hashtags = self.hashtags_for_posts(&post_ids).await?;

        let posts = rows
            .into_iter()
            .map(|row| {
                let tags = hashtags.remove(&row.id).unwrap_or_default();
                row.into_feed_post(tags)
            })
            .collect();

        Ok((posts, to_count(total)))
    }

    async fn find_owned_records(
        &self,
        kind: ActivityKind,
        user_id: i64,
        range: Option<DateRange>,
    ) -> ServiceResult<(OwnedRecords, u64)> {
        match kind {
            ActivityKind::Post => self.authored_posts(user_id, range).await,
            ActivityKind::Like => self.given_likes(user_id, range).await,
            ActivityKind::Follow => self.made_follows(user_id, range).await,
        }
    }

    async fn find_followers(
        &self,
        user_id: i64,
        window: PageWindow,
    ) -> ServiceResult<(Vec<FollowerEntry>, u64)> {
        let (limit, offset) = window_binds(window);

        let followers = sqlx::query_as::<_, FollowerEntry>(
            r#"
            SELECT u.id, u.first_name, u.last_name, u.email, f.created_at AS followed_at
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC, f.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool);

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM follows
            WHERE following_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool);

        let (followers, total) = tokio::try_join!(followers, total)?;
        Ok((followers, to_count(total)))
    }

    async fn health_check(&self) -> ServiceResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
