mod memory;
mod postgres;
mod r#trait;

pub use memory::InMemorySocialStore;
pub use postgres::PgSocialStore;
pub use r#trait::SocialStore;

#[cfg(test)]
pub use r#trait::MockSocialStore;
