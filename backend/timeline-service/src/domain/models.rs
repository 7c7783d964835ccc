use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// User entity - profile fields only, never mutated by this service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post entity - `like_count` is maintained by the like write path, not here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Follow entity - directed edge follower -> following, unique per pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: i64,
    pub follower_id: i64,
    pub following_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Like entity - a user liking a post, unique per pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Hashtag {
    pub id: i64,
    pub tag: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A feed entry: the post plus its author and hashtags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub id: i64,
    pub content: String,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: User,
    pub hashtags: Vec<Hashtag>,
}

impl FeedPost {
    pub fn new(post: Post, author: User, hashtags: Vec<Hashtag>) -> Self {
        Self {
            id: post.id,
            content: post.content,
            like_count: post.like_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
            author,
            hashtags,
        }
    }
}

/// One row of a user's followers listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FollowerEntry {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub followed_at: DateTime<Utc>,
}

/// Ids of every account a user follows. Built once per feed request and used
/// only as the author filter for the post lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowedSet(BTreeSet<i64>);

impl FollowedSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.0.contains(&user_id)
    }

    pub fn to_vec(&self) -> Vec<i64> {
        self.0.iter().copied().collect()
    }
}

impl FromIterator<i64> for FollowedSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_followed_set_dedups_and_orders() {
        let set: FollowedSet = vec![9, 3, 9, 1].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.to_vec(), vec![1, 3, 9]);
        assert!(set.contains(3));
        assert!(!set.contains(4));
    }

    #[test]
    fn test_feed_post_serializes_camel_case() {
        let now = Utc::now();
        let author = User {
            id: 2,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            created_at: now,
            updated_at: now,
        };
        let post = Post {
            id: 10,
            author_id: 2,
            content: "hello".into(),
            like_count: 4,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(FeedPost::new(post, author, vec![])).unwrap();
        assert_eq!(value["likeCount"], 4);
        assert_eq!(value["author"]["firstName"], "Ada");
        assert!(value["hashtags"].as_array().unwrap().is_empty());
    }
}
