//! Activity records: the normalized shape every timeline source is mapped into
//! before the merge.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;

use super::models::Post;

/// Activity source. The declaration order is the order sources are queried
/// and concatenated in, which is what breaks same-timestamp ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Post,
    Like,
    Follow,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 3] = [
        ActivityKind::Post,
        ActivityKind::Like,
        ActivityKind::Follow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Post => "post",
            ActivityKind::Like => "like",
            ActivityKind::Follow => "follow",
        }
    }

    /// Verb shown next to the record
    pub fn action(&self) -> &'static str {
        match self {
            ActivityKind::Post => "created",
            ActivityKind::Like => "liked",
            ActivityKind::Follow => "followed",
        }
    }

    /// Exact, case-sensitive match on the wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "post" => Some(ActivityKind::Post),
            "like" => Some(ActivityKind::Like),
            "follow" => Some(ActivityKind::Follow),
            _ => None,
        }
    }
}

/// Requested activity kinds, iterated in `ActivityKind` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityKindSet(BTreeSet<ActivityKind>);

impl ActivityKindSet {
    pub fn all() -> Self {
        Self(ActivityKind::ALL.into_iter().collect())
    }

    /// Builds the set from raw `types` values. Unrecognized values are
    /// dropped, so a request naming only unknown kinds yields an empty set.
    pub fn from_params<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            values
                .into_iter()
                .filter_map(|v| ActivityKind::parse(v.as_ref()))
                .collect(),
        )
    }

    pub fn contains(&self, kind: ActivityKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ActivityKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for ActivityKindSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<ActivityKind> for ActivityKindSet {
    fn from_iter<I: IntoIterator<Item = ActivityKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Inclusive `createdAt` window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// A like given by the user, joined with the liked post
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LikedPost {
    pub like_id: i64,
    pub post_id: i64,
    pub post_content: String,
    pub created_at: DateTime<Utc>,
}

/// A follow made by the user, joined with the followed account
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FollowedUser {
    pub follow_id: i64,
    pub following_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Raw rows of one activity source, as returned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedRecords {
    Posts(Vec<Post>),
    Likes(Vec<LikedPost>),
    Follows(Vec<FollowedUser>),
}

impl OwnedRecords {
    pub fn kind(&self) -> ActivityKind {
        match self {
            OwnedRecords::Posts(_) => ActivityKind::Post,
            OwnedRecords::Likes(_) => ActivityKind::Like,
            OwnedRecords::Follows(_) => ActivityKind::Follow,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OwnedRecords::Posts(rows) => rows.len(),
            OwnedRecords::Likes(rows) => rows.len(),
            OwnedRecords::Follows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tags every row with its kind, preserving row order.
    pub fn into_activities(self) -> Vec<ActivityRecord> {
        match self {
            OwnedRecords::Posts(rows) => rows.into_iter().map(ActivityRecord::from).collect(),
            OwnedRecords::Likes(rows) => rows.into_iter().map(ActivityRecord::from).collect(),
            OwnedRecords::Follows(rows) => rows.into_iter().map(ActivityRecord::from).collect(),
        }
    }
}

/// Kind-specific part of an activity record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityPayload {
    PostCreated { content: String },
    PostLiked { post_id: i64, post_content: String },
    UserFollowed { following_id: i64, following_name: String },
}

/// One unit of user activity. `id` is the row id inside the source table, so
/// it is only unique together with the kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub payload: ActivityPayload,
}

impl ActivityRecord {
    pub fn kind(&self) -> ActivityKind {
        match self.payload {
            ActivityPayload::PostCreated { .. } => ActivityKind::Post,
            ActivityPayload::PostLiked { .. } => ActivityKind::Like,
            ActivityPayload::UserFollowed { .. } => ActivityKind::Follow,
        }
    }

    pub fn action(&self) -> &'static str {
        self.kind().action()
    }
}

impl From<Post> for ActivityRecord {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            created_at: post.created_at,
            payload: ActivityPayload::PostCreated {
                content: post.content,
            },
        }
    }
}

impl From<LikedPost> for ActivityRecord {
    fn from(like: LikedPost) -> Self {
        Self {
            id: like.like_id,
            created_at: like.created_at,
            payload: ActivityPayload::PostLiked {
                post_id: like.post_id,
                post_content: like.post_content,
            },
        }
    }
}

impl From<FollowedUser> for ActivityRecord {
    fn from(follow: FollowedUser) -> Self {
        Self {
            id: follow.follow_id,
            created_at: follow.created_at,
            payload: ActivityPayload::UserFollowed {
                following_id: follow.following_id,
                following_name: format!("{} {}", follow.first_name, follow.last_name),
            },
        }
    }
}

// Flat wire shape: {type, action, id, <payload fields>, createdAt}
impl Serialize for ActivityRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.kind())?;
        map.serialize_entry("action", self.action())?;
        map.serialize_entry("id", &self.id)?;
        match &self.payload {
            ActivityPayload::PostCreated { content } => {
                map.serialize_entry("content", content)?;
            }
            ActivityPayload::PostLiked {
                post_id,
                post_content,
            } => {
                map.serialize_entry("postId", post_id)?;
                map.serialize_entry("postContent", post_content)?;
            }
            ActivityPayload::UserFollowed {
                following_id,
                following_name,
            } => {
                map.serialize_entry("followingId", following_id)?;
                map.serialize_entry("followingName", following_name)?;
            }
        }
        map.serialize_entry("createdAt", &self.created_at)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ActivityKind::Post.as_str(), "post");
        assert_eq!(ActivityKind::Like.action(), "liked");
        assert_eq!(ActivityKind::Follow.action(), "followed");
        assert_eq!(ActivityKind::parse("Post"), None);
    }

    #[test]
    fn test_kind_set_ignores_unknown_values() {
        let kinds = ActivityKindSet::from_params(["follow", "unfollow", "post"]);
        assert_eq!(
            kinds.iter().collect::<Vec<_>>(),
            vec![ActivityKind::Post, ActivityKind::Follow]
        );

        let none = ActivityKindSet::from_params(["bogus"]);
        assert!(none.is_empty());
        assert_eq!(ActivityKindSet::default().len(), 3);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let range = DateRange::new(ts(100), ts(200));
        assert!(range.contains(ts(100)));
        assert!(range.contains(ts(200)));
        assert!(!range.contains(ts(99)));
        assert!(!range.contains(ts(201)));
    }

    #[test]
    fn test_follow_record_wire_shape() {
        let record = ActivityRecord::from(FollowedUser {
            follow_id: 4,
            following_id: 12,
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            created_at: ts(1_700_000_000),
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "follow");
        assert_eq!(value["action"], "followed");
        assert_eq!(value["id"], 4);
        assert_eq!(value["followingId"], 12);
        assert_eq!(value["followingName"], "Grace Hopper");
        assert!(value.get("content").is_none());
    }

    #[test]
    fn test_like_record_wire_shape() {
        let record = ActivityRecord::from(LikedPost {
            like_id: 1,
            post_id: 33,
            post_content: "nice".into(),
            created_at: ts(5),
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "like");
        assert_eq!(value["postId"], 33);
        assert_eq!(value["postContent"], "nice");
    }
}
