//! Store tests against a live Postgres. They are skipped when `DATABASE_URL` is unset.

use jokes_app::{
    database::{create_pool, run_migrations},
    error::AppError,
    models::{Joke, JokeCategory, JokeFilter, JokeSort, Rating, Vote, VoteSummary},
    store::{JokeStore, PgJokeStore},
};
use uuid::Uuid;

async fn store() -> Option<PgJokeStore> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };
    let pool = create_pool(&url, 2).await.unwrap();
    run_migrations(&pool).await.unwrap();
    Some(PgJokeStore::new(pool))
}

async fn insert(store: &PgJokeStore, question: &str) -> Joke {
    let joke = Joke::new(
        question.to_string(),
        "Answer.".to_string(),
        JokeCategory::General,
        Some("author".to_string()),
    );
    store.insert_joke(&joke).await.unwrap();
    joke
}

#[tokio::test]
async fn vote_recount_reads_the_ledger() {
    let Some(store) = store().await else { return };
    let joke = insert(&store, "Vote recount?").await;

    store.insert_vote(&Vote::new(joke.id, "u1", true)).await.unwrap();
    store.insert_vote(&Vote::new(joke.id, "u2", true)).await.unwrap();
    let flipped = Vote::new(joke.id, "u3", true);
    store.insert_vote(&flipped).await.unwrap();
    store
        .update_vote(flipped.id, false, chrono::Utc::now())
        .await
        .unwrap();

    let summary = store.recount_votes(joke.id).await.unwrap();
    assert_eq!(summary, VoteSummary { likes: 2, dislikes: 1 });

    let stored = store.find_joke(joke.id).await.unwrap().unwrap();
    assert_eq!((stored.likes, stored.dislikes), (2, 1));
}

#[tokio::test]
async fn rating_average_rounds_half_away_from_zero() {
    let Some(store) = store().await else { return };
    let joke = insert(&store, "Rating rounding?").await;

    for (user, value) in [("u1", 3), ("u2", 3), ("u3", 3), ("u4", 4)] {
        store.insert_rating(&Rating::new(joke.id, user, value)).await.unwrap();
    }

    // 13 / 4 = 3.25
    let summary = store.recount_ratings(joke.id).await.unwrap();
    assert_eq!(summary.average, 3.3);
    assert_eq!(summary.count, 4);

    let stored = store.find_joke(joke.id).await.unwrap().unwrap();
    assert_eq!(stored.rating_average, 3.3);
    assert_eq!(stored.rating_count, 4);
}

#[tokio::test]
async fn unrated_joke_recounts_to_zero() {
    let Some(store) = store().await else { return };
    let joke = insert(&store, "Nobody rated me?").await;

    let summary = store.recount_ratings(joke.id).await.unwrap();
    assert_eq!(summary.average, 0.0);
    assert_eq!(summary.count, 0);
}

#[tokio::test]
async fn duplicate_ledger_rows_conflict() {
    let Some(store) = store().await else { return };
    let joke = insert(&store, "Double vote?").await;

    store.insert_vote(&Vote::new(joke.id, "u1", true)).await.unwrap();
    let err = store
        .insert_vote(&Vote::new(joke.id, "u1", false))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    store.insert_rating(&Rating::new(joke.id, "u1", 5)).await.unwrap();
    let err = store
        .insert_rating(&Rating::new(joke.id, "u1", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn delete_cascades_to_ledgers() {
    let Some(store) = store().await else { return };
    let joke = insert(&store, "Delete me?").await;
    store.insert_vote(&Vote::new(joke.id, "u1", true)).await.unwrap();
    store.insert_rating(&Rating::new(joke.id, "u1", 4)).await.unwrap();

    assert!(store.delete_joke(joke.id).await.unwrap());
    assert!(store.find_joke(joke.id).await.unwrap().is_none());
    assert!(store.find_vote(joke.id, "u1").await.unwrap().is_none());
    assert!(store.find_rating(joke.id, "u1").await.unwrap().is_none());
    assert!(!store.delete_joke(joke.id).await.unwrap());
}

#[tokio::test]
async fn search_escapes_like_metacharacters() {
    let Some(store) = store().await else { return };
    let marker = Uuid::new_v4().simple().to_string();
    let percent = insert(&store, &format!("Save 100% today {marker}")).await;
    insert(&store, &format!("Save 1000 today {marker}")).await;

    let filter = JokeFilter {
        search: Some(format!("100% TODAY {}", marker.to_uppercase())),
        category: None,
    };
    assert_eq!(store.count_jokes(&filter).await.unwrap(), 1);

    let jokes = store
        .list_jokes(&filter, JokeSort::DateDesc, 12, 0)
        .await
        .unwrap();
    assert_eq!(jokes.len(), 1);
    assert_eq!(jokes[0].id, percent.id);

    let both = JokeFilter {
        search: Some(marker),
        category: Some(JokeCategory::General),
    };
    assert_eq!(store.count_jokes(&both).await.unwrap(), 2);
}

#[tokio::test]
async fn missing_joke_is_not_found_not_an_error() {
    let Some(store) = store().await else { return };
    let id = Uuid::new_v4();
    assert!(store.find_joke(id).await.unwrap().is_none());
    assert!(store.record_view(id).await.unwrap().is_none());
}
