use rand::Rng;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::{
        CreateJokeRequest, Joke, JokeFilter, JokePage, JokeSort, PAGE_SIZE, PageWindow,
        UpdateJokeRequest,
    },
    store::JokeStore,
};

#[instrument(skip(store))]
pub async fn list_jokes(
    store: &dyn JokeStore,
    filter: &JokeFilter,
    sort: JokeSort,
    page: u32,
) -> Result<JokePage> {
    let total = store.count_jokes(filter).await?;
    let window = PageWindow::clamp(page, total, PAGE_SIZE);

    let jokes = if total == 0 {
        Vec::new()
    } else {
        store
            .list_jokes(filter, sort, PAGE_SIZE, window.offset(PAGE_SIZE))
            .await?
    };

    Ok(JokePage::new(jokes, window, PAGE_SIZE))
}

/// Picks a joke uniformly at random and counts the view.
#[instrument(skip(store))]
pub async fn get_random(store: &dyn JokeStore) -> Result<Joke> {
    let total = store.count_jokes(&JokeFilter::default()).await?;
    if total == 0 {
        return Err(AppError::NotFound("No jokes yet".to_string()));
    }

    let index = rand::rng().random_range(0..total);
    let joke = store
        .joke_at(index)
        .await?
        .ok_or_else(AppError::joke_not_found)?;

    store
        .record_view(joke.id)
        .await?
        .ok_or_else(AppError::joke_not_found)
}

/// Every call counts as a view, whoever the caller is.
#[instrument(skip(store))]
pub async fn get_details(store: &dyn JokeStore, id: Uuid) -> Result<Joke> {
    store
        .record_view(id)
        .await?
        .ok_or_else(AppError::joke_not_found)
}

#[instrument(skip(store, payload))]
pub async fn create_joke(
    store: &dyn JokeStore,
    payload: CreateJokeRequest,
    created_by: Option<String>,
) -> Result<Joke> {
    payload.validate()?;

    let joke = Joke::new(
        payload.question.trim().to_string(),
        payload.answer.trim().to_string(),
        payload.category,
        created_by,
    );
    store.insert_joke(&joke).await?;

    info!(joke_id = %joke.id, category = %joke.category, "joke created");
    Ok(joke)
}

#[instrument(skip(store, payload))]
pub async fn edit_joke(
    store: &dyn JokeStore,
    id: Uuid,
    payload: UpdateJokeRequest,
) -> Result<Joke> {
    payload.validate()?;

    let joke = store
        .update_joke(
            id,
            payload.question.trim(),
            payload.answer.trim(),
            payload.category,
        )
        .await?
        .ok_or_else(AppError::joke_not_found)?;

    info!(joke_id = %id, "joke updated");
    Ok(joke)
}

#[instrument(skip(store))]
pub async fn delete_joke(store: &dyn JokeStore, id: Uuid) -> Result<()> {
    if !store.delete_joke(id).await? {
        return Err(AppError::joke_not_found());
    }

    info!(joke_id = %id, "joke deleted");
    Ok(())
}
