//! In-process store with the same ordering and counting rules as the
//! PostgreSQL store. Used by the test suites and for running the service
//! without a database.

use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use super::SocialStore;
use crate::domain::{
    ActivityKind, DateRange, FeedPost, Follow, FollowedUser, FollowerEntry, Hashtag, Like,
    LikedPost, OwnedRecords, PageWindow, Post, User,
};
use crate::error::{ServiceError, ServiceResult};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    likes: Vec<Like>,
    follows: Vec<Follow>,
    hashtags: Vec<Hashtag>,
    post_hashtags: HashSet<(i64, i64)>,
}

impl Tables {
    fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn post(&self, id: i64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    fn next_id(len: usize) -> i64 {
        i64::try_from(len).unwrap_or(i64::MAX - 1) + 1
    }
}

#[derive(Default)]
pub struct InMemorySocialStore {
    tables: RwLock<Tables>,
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    rows.sort_by_key(|row| Reverse(key(row)));
}

fn in_range(range: Option<DateRange>, ts: DateTime<Utc>) -> bool {
    range.map_or(true, |r| r.contains(ts))
}

fn page_of<T>(rows: Vec<T>, window: PageWindow) -> Vec<T> {
    let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
    rows.into_iter()
        .skip(offset)
        .take(window.limit as usize)
        .collect()
}

impl InMemorySocialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        created_at: DateTime<Utc>,
    ) -> ServiceResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == email) {
            return Err(ServiceError::InvalidInput(format!(
                "email {} already registered",
                email
            )));
        }
        let user = User {
            id: Tables::next_id(tables.users.len()),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            created_at,
            updated_at: created_at,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    pub async fn insert_post(
        &self,
        author_id: i64,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> ServiceResult<Post> {
        let mut tables = self.tables.write().await;
        if tables.user(author_id).is_none() {
            return Err(ServiceError::user_not_found(author_id));
        }
        let post = Post {
            id: Tables::next_id(tables.posts.len()),
            author_id,
            content: content.to_string(),
            like_count: 0,
            created_at,
            updated_at: created_at,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    /// Records a like and bumps the post's denormalized counter
    pub async fn insert_like(
        &self,
        user_id: i64,
        post_id: i64,
        created_at: DateTime<Utc>,
    ) -> ServiceResult<Like> {
        let mut tables = self.tables.write().await;
        if tables.user(user_id).is_none() {
            return Err(ServiceError::user_not_found(user_id));
        }
        if tables.post(post_id).is_none() {
            return Err(ServiceError::NotFound(format!("Post {} not found", post_id)));
        }
        if tables
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id)
        {
            return Err(ServiceError::InvalidInput(format!(
                "user {} already liked post {}",
                user_id, post_id
            )));
        }
        let like = Like {
            id: Tables::next_id(tables.likes.len()),
            user_id,
            post_id,
            created_at,
        };
        tables.likes.push(like.clone());
        if let Some(post) = tables.posts.iter_mut().find(|p| p.id == post_id) {
            post.like_count += 1;
        }
        Ok(like)
    }

    pub async fn insert_follow(
        &self,
        follower_id: i64,
        following_id: i64,
        created_at: DateTime<Utc>,
    ) -> ServiceResult<Follow> {
        let mut tables = self.tables.write().await;
        if follower_id == following_id {
            return Err(ServiceError::InvalidInput("cannot follow yourself".into()));
        }
        for id in [follower_id, following_id] {
            if tables.user(id).is_none() {
                return Err(ServiceError::user_not_found(id));
            }
        }
        if tables
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id)
        {
            return Err(ServiceError::InvalidInput(format!(
                "user {} already follows {}",
                follower_id, following_id
            )));
        }
        let follow = Follow {
            id: Tables::next_id(tables.follows.len()),
            follower_id,
            following_id,
            created_at,
        };
        tables.follows.push(follow.clone());
        Ok(follow)
    }

    /// Attaches a hashtag to a post, creating the tag on first use
    pub async fn tag_post(
        &self,
        post_id: i64,
        tag: &str,
        created_at: DateTime<Utc>,
    ) -> ServiceResult<Hashtag> {
        let mut tables = self.tables.write().await;
        if tables.post(post_id).is_none() {
            return Err(ServiceError::NotFound(format!("Post {} not found", post_id)));
        }
        let hashtag = match tables.hashtags.iter().find(|h| h.tag == tag) {
            Some(existing) => existing.clone(),
            None => {
                let hashtag = Hashtag {
                    id: Tables::next_id(tables.hashtags.len()),
                    tag: tag.to_string(),
                    created_at,
                    updated_at: created_at,
                };
                tables.hashtags.push(hashtag.clone());
                hashtag
            }
        };
        tables.post_hashtags.insert((post_id, hashtag.id));
        Ok(hashtag)
    }
}

#[async_trait::async_trait]
impl SocialStore for InMemorySocialStore {
    async fn find_user_by_id(&self, user_id: i64) -> ServiceResult<Option<User>> {
        Ok(self.tables.read().await.user(user_id).cloned())
    }

    async fn find_followed_ids(&self, user_id: i64) -> ServiceResult<Vec<i64>> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .filter(|f| f.follower_id == user_id)
            .map(|f| f.following_id)
            .collect())
    }

    async fn find_posts_by_authors(
        &self,
        author_ids: &[i64],
        window: PageWindow,
    ) -> ServiceResult<(Vec<FeedPost>, u64)> {
        let tables = self.tables.read().await;
        let authors: HashSet<i64> = author_ids.iter().copied().collect();

        let mut matching: Vec<&Post> = tables
            .posts
            .iter()
            .filter(|p| authors.contains(&p.author_id))
            .collect();
        newest_first(&mut matching, |p| (p.created_at, p.id));
        let total = matching.len() as u64;

        let mut tags_by_post: HashMap<i64, Vec<Hashtag>> = HashMap::new();
        for (post_id, hashtag_id) in &tables.post_hashtags {
            if let Some(h) = tables.hashtags.iter().find(|h| h.id == *hashtag_id) {
                tags_by_post.entry(*post_id).or_default().push(h.clone());
            }
        }

        let mut page = Vec::new();
        for post in page_of(matching, window) {
            let author = tables
                .user(post.author_id)
                .cloned()
                .ok_or_else(|| ServiceError::storage(format!("post {} has no author", post.id)))?;
            let mut hashtags = tags_by_post.remove(&post.id).unwrap_or_default();
            hashtags.sort_by(|a, b| a.tag.cmp(&b.tag));
            page.push(FeedPost::new(post.clone(), author, hashtags));
        }

        Ok((page, total))
    }

    async fn find_owned_records(
        &self,
        kind: ActivityKind,
        user_id: i64,
        range: Option<DateRange>,
    ) -> ServiceResult<(OwnedRecords, u64)> {
        let tables = self.tables.read().await;

        let records = match kind {
            ActivityKind::Post => {
                let mut rows: Vec<Post> = tables
                    .posts
                    .iter()
                    .filter(|p| p.author_id == user_id && in_range(range, p.created_at))
                    .cloned()
                    .collect();
                newest_first(&mut rows, |p| (p.created_at, p.id));
                OwnedRecords::Posts(rows)
            }
            ActivityKind::Like => {
                let mut rows: Vec<LikedPost> = tables
                    .likes
                    .iter()
                    .filter(|l| l.user_id == user_id && in_range(range, l.created_at))
                    .filter_map(|l| {
                        tables.post(l.post_id).map(|p| LikedPost {
                            like_id: l.id,
                            post_id: p.id,
                            post_content: p.content.clone(),
                            created_at: l.created_at,
                        })
                    })
                    .collect();
                newest_first(&mut rows, |l| (l.created_at, l.like_id));
                OwnedRecords::Likes(rows)
            }
            ActivityKind::Follow => {
                let mut rows: Vec<FollowedUser> = tables
                    .follows
                    .iter()
                    .filter(|f| f.follower_id == user_id && in_range(range, f.created_at))
                    .filter_map(|f| {
                        tables.user(f.following_id).map(|u| FollowedUser {
                            follow_id: f.id,
                            following_id: u.id,
                            first_name: u.first_name.clone(),
                            last_name: u.last_name.clone(),
                            created_at: f.created_at,
                        })
                    })
                    .collect();
                newest_first(&mut rows, |f| (f.created_at, f.follow_id));
                OwnedRecords::Follows(rows)
            }
        };

        let count = records.len() as u64;
        Ok((records, count))
    }

    async fn find_followers(
        &self,
        user_id: i64,
        window: PageWindow,
    ) -> ServiceResult<(Vec<FollowerEntry>, u64)> {
        let tables = self.tables.read().await;

        let mut edges: Vec<&Follow> = tables
            .follows
            .iter()
            .filter(|f| f.following_id == user_id)
            .collect();
        newest_first(&mut edges, |f| (f.created_at, f.id));
        let total = edges.len() as u64;

        let followers = page_of(edges, window)
            .into_iter()
            .filter_map(|f| {
                tables.user(f.follower_id).map(|u| FollowerEntry {
                    id: u.id,
                    first_name: u.first_name.clone(),
                    last_name: u.last_name.clone(),
                    email: u.email.clone(),
                    followed_at: f.created_at,
                })
            })
            .collect();

        Ok((followers, total))
    }
}
