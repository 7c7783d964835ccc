pub mod activity;
pub mod models;
pub mod pagination;

pub use activity::{
    ActivityKind, ActivityKindSet, ActivityPayload, ActivityRecord, DateRange, FollowedUser,
    LikedPost, OwnedRecords,
};
pub use models::{FeedPost, Follow, FollowedSet, FollowerEntry, Hashtag, Like, Post, User};
pub use pagination::{
    normalize_page, normalize_window, OffsetPagination, PagePagination, PageRequest, PageWindow,
};
