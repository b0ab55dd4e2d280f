use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{MAX_RATING, MIN_RATING, Rating, RatingSummary, is_valid_rating},
    store::JokeStore,
};

/// Records a 1-5 star rating from `user_id`, one rating per user per joke.
///
/// Unlike voting there is no short-circuit: re-sending the same value still
/// rewrites the row and its `updated_at`.
#[instrument(skip(store))]
pub async fn rate(
    store: &dyn JokeStore,
    joke_id: Uuid,
    user_id: &str,
    value: i32,
) -> Result<RatingSummary> {
    if !is_valid_rating(value) {
        return Err(AppError::BadRequest(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }

    store
        .find_joke(joke_id)
        .await?
        .ok_or_else(AppError::joke_not_found)?;

    match store.find_rating(joke_id, user_id).await? {
        None => store.insert_rating(&Rating::new(joke_id, user_id, value)).await?,
        Some(existing) => store.update_rating(existing.id, value, Utc::now()).await?,
    }

    let summary = store.recount_ratings(joke_id).await?;
    info!(average = summary.average, count = summary.count, "rating recorded");
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
            "What's orange and sounds like a parrot?".to_string(),
            "A carrot.".to_string(),
            JokeCategory::Random,
            None,
        );
        store.insert_joke(&joke).await.unwrap();
        (store, joke.id)
    }

    #[tokio::test]
    async fn two_users_average_out() {
        let (store, id) = store_with_joke().await;

        let summary = rate(&store, id, "u1", 4).await.unwrap();
        assert_eq!(summary, RatingSummary { average: 4.0, count: 1 });

        let summary = rate(&store, id, "u2", 2).await.unwrap();
        assert_eq!(summary, RatingSummary { average: 3.0, count: 2 });

        let joke = store.find_joke(id).await.unwrap().unwrap();
        assert_eq!(joke.rating_average, 3.0);
        assert_eq!(joke.rating_count, 2);
    }

    #[tokio::test]
    async fn rerating_replaces_previous_value() {
        let (store, id) = store_with_joke().await;
        rate(&store, id, "u1", 1).await.unwrap();
        let summary = rate(&store, id, "u1", 5).await.unwrap();
        assert_eq!(summary, RatingSummary { average: 5.0, count: 1 });
    }

    #[tokio::test]
    async fn identical_rating_still_touches_timestamp() {
        let (store, id) = store_with_joke().await;
        rate(&store, id, "u1", 3).await.unwrap();
        assert!(store.find_rating(id, "u1").await.unwrap().unwrap().updated_at.is_none());

        rate(&store, id, "u1", 3).await.unwrap();
        let first_touch = store.find_rating(id, "u1").await.unwrap().unwrap().updated_at;
        assert!(first_touch.is_some());

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        rate(&store, id, "u1", 3).await.unwrap();
        let second_touch = store.find_rating(id, "u1").await.unwrap().unwrap().updated_at;
        assert!(second_touch > first_touch);
    }

    #[tokio::test]
    async fn out_of_range_is_rejected_before_lookup() {
        let store = MemoryJokeStore::new();
        // the joke does not exist, but range validation comes first
        for value in [0, 6, -1] {
            let err = rate(&store, Uuid::new_v4(), "u1", value).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn rating_missing_joke_is_not_found() {
        let store = MemoryJokeStore::new();
        let err = rate(&store, Uuid::new_v4(), "u1", 3).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
