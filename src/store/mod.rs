//! Persistence seam for jokes and their vote/rating ledgers.
//!
//! Services hold an `Arc<dyn JokeStore>` and never touch a connection pool
//! directly. Both implementations enforce one vote and one rating per
//! (joke, user) pair and cascade ledger rows when a joke is deleted.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{Joke, JokeCategory, JokeFilter, JokeSort, Rating, RatingSummary, Vote, VoteSummary},
};

pub use memory::MemoryJokeStore;
pub use postgres::PgJokeStore;

#[async_trait]
pub trait JokeStore: Send + Sync {
    async fn find_joke(&self, id: Uuid) -> Result<Option<Joke>>;

    async fn insert_joke(&self, joke: &Joke) -> Result<()>;

    /// Replaces the editable fields, leaving counters and authorship alone.
    async fn update_joke(
        &self,
        id: Uuid,
        question: &str,
        answer: &str,
        category: JokeCategory,
    ) -> Result<Option<Joke>>;

    /// Returns `false` when no joke had this id.
    async fn delete_joke(&self, id: Uuid) -> Result<bool>;

    async fn count_jokes(&self, filter: &JokeFilter) -> Result<u64>;

    async fn list_jokes(
        &self,
        filter: &JokeFilter,
        sort: JokeSort,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Joke>>;

    /// The joke at `index` when all jokes are ordered by creation time then id.
    async fn joke_at(&self, index: u64) -> Result<Option<Joke>>;

    /// Bumps the view counter and returns the updated joke.
    async fn record_view(&self, id: Uuid) -> Result<Option<Joke>>;

    async fn find_vote(&self, joke_id: Uuid, user_id: &str) -> Result<Option<Vote>>;

    /// Fails with `Conflict` if the (joke, user) pair already voted.
    async fn insert_vote(&self, vote: &Vote) -> Result<()>;

    async fn update_vote(&self, vote_id: Uuid, is_like: bool, updated_at: DateTime<Utc>)
    -> Result<()>;

    /// Recounts likes/dislikes from the ledger and stores them on the joke.
    async fn recount_votes(&self, joke_id: Uuid) -> Result<VoteSummary>;

    async fn find_rating(&self, joke_id: Uuid, user_id: &str) -> Result<Option<Rating>>;

    /// Fails with `Conflict` if the (joke, user) pair already rated.
    async fn insert_rating(&self, rating: &Rating) -> Result<()>;

    async fn update_rating(&self, rating_id: Uuid, value: i32, updated_at: DateTime<Utc>)
    -> Result<()>;

    /// Recomputes count and rounded average from the ledger and stores them on the joke.
    async fn recount_ratings(&self, joke_id: Uuid) -> Result<RatingSummary>;
}
