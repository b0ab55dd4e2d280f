use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{Vote, VoteSummary},
    store::JokeStore,
};

/// Records a like or dislike from `user_id`, one vote per user per joke.
///
/// Repeating the current vote changes nothing and returns the cached counts.
/// Otherwise the ledger row is inserted or flipped, and the joke's counters
/// are recounted from the ledger.
#[instrument(skip(store))]
pub async fn vote(
    store: &dyn JokeStore,
    joke_id: Uuid,
    user_id: &str,
    is_like: bool,
) -> Result<VoteSummary> {
    let joke = store
        .find_joke(joke_id)
        .await?
        .ok_or_else(AppError::joke_not_found)?;

    match store.find_vote(joke_id, user_id).await? {
        None => store.insert_vote(&Vote::new(joke_id, user_id, is_like)).await?,
        Some(existing) if existing.is_like == is_like => {
            debug!("repeated vote, nothing to do");
            return Ok(VoteSummary {
                likes: joke.likes,
                dislikes: joke.dislikes,
            });
        }
        Some(existing) => store.update_vote(existing.id, is_like, Utc::now()).await?,
    }

    let summary = store.recount_votes(joke_id).await?;
    info!(likes = summary.likes, dislikes = summary.dislikes, "vote recorded");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Joke, JokeCategory},
        store::MemoryJokeStore,
    };

    async fn store_with_joke() -> (MemoryJokeStore, Uuid) {
        let store = MemoryJokeStore::new();
        let joke = Joke::new(
            "Why do programmers prefer dark mode?".to_string(),
            "Because light attracts bugs.".to_string(),
            JokeCategory::TechJokes,
            None,
        );
        store.insert_joke(&joke).await.unwrap();
        (store, joke.id)
    }

    #[tokio::test]
    async fn like_then_switch_then_repeat() {
        let (store, id) = store_with_joke().await;

        let summary = vote(&store, id, "u1", true).await.unwrap();
        assert_eq!(summary, VoteSummary { likes: 1, dislikes: 0 });

        let summary = vote(&store, id, "u1", false).await.unwrap();
        assert_eq!(summary, VoteSummary { likes: 0, dislikes: 1 });

        let before = store.find_vote(id, "u1").await.unwrap().unwrap();
        let summary = vote(&store, id, "u1", false).await.unwrap();
        assert_eq!(summary, VoteSummary { likes: 0, dislikes: 1 });
        let after = store.find_vote(id, "u1").await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn first_vote_has_no_update_timestamp() {
        let (store, id) = store_with_joke().await;
        vote(&store, id, "u1", true).await.unwrap();

        let row = store.find_vote(id, "u1").await.unwrap().unwrap();
        assert!(row.updated_at.is_none());

        vote(&store, id, "u1", false).await.unwrap();
        let row = store.find_vote(id, "u1").await.unwrap().unwrap();
        assert!(!row.is_like);
        assert!(row.updated_at.is_some());
    }

    #[tokio::test]
    async fn counters_match_ledger_across_users() {
        let (store, id) = store_with_joke().await;
        vote(&store, id, "u1", true).await.unwrap();
        vote(&store, id, "u2", true).await.unwrap();
        vote(&store, id, "u3", false).await.unwrap();
        vote(&store, id, "u2", false).await.unwrap();

        let joke = store.find_joke(id).await.unwrap().unwrap();
        assert_eq!((joke.likes, joke.dislikes), (1, 2));
    }

    #[tokio::test]
    async fn vote_on_missing_joke_is_not_found() {
        let store = MemoryJokeStore::new();
        let err = vote(&store, Uuid::new_v4(), "u1", true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
