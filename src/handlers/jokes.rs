use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, Result},
    extract::{Json, Path, Query},
    models::{
        CreateJokeRequest, Joke, JokeCategory, JokeFilter, JokePage, JokeSort, UpdateJokeRequest,
    },
    services::joke_service,
};

#[derive(Debug, Deserialize)]
pub struct GetJokesQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
}

impl GetJokesQuery {
    fn filter(&self) -> Result<JokeFilter> {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(all) if all.eq_ignore_ascii_case("all") => None,
            Some(name) => Some(name.parse::<JokeCategory>().map_err(AppError::BadRequest)?),
        };

        Ok(JokeFilter { search, category })
    }

    fn sort(&self) -> Result<JokeSort> {
        match self.sort.as_deref().map(str::trim) {
            None | Some("") => Ok(JokeSort::default()),
            Some(key) => key.parse().map_err(AppError::BadRequest),
        }
    }

    fn page(&self) -> u32 {
        self.page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32
    }
}

pub async fn list_jokes(
    State(state): State<AppState>,
    Query(params): Query<GetJokesQuery>,
) -> Result<Json<JokePage>> {
    let filter = params.filter()?;
    let sort = params.sort()?;

    let page = joke_service::list_jokes(state.store.as_ref(), &filter, sort, params.page()).await?;

    Ok(Json(page))
}

pub async fn get_random_joke(State(state): State<AppState>) -> Result<Json<Joke>> {
    let joke = joke_service::get_random(state.store.as_ref()).await?;
    Ok(Json(joke))
}

pub async fn get_joke(
    State(state): State<AppState>,
    Path(joke_id): Path<Uuid>,
) -> Result<Json<Joke>> {
    let joke = joke_service::get_details(state.store.as_ref(), joke_id).await?;
    Ok(Json(joke))
}

pub async fn get_categories() -> Json<Vec<JokeCategory>> {
    Json(JokeCategory::ALL.to_vec())
}

pub async fn create_joke(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateJokeRequest>,
) -> Result<(StatusCode, Json<Joke>)> {
    let joke =
        joke_service::create_joke(state.store.as_ref(), payload, Some(auth_user.username)).await?;

    Ok((StatusCode::CREATED, Json(joke)))
}

pub async fn update_joke(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(joke_id): Path<Uuid>,
    Json(payload): Json<UpdateJokeRequest>,
) -> Result<Json<Joke>> {
    let joke = joke_service::edit_joke(state.store.as_ref(), joke_id, payload).await?;
    Ok(Json(joke))
}

pub async fn delete_joke(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(joke_id): Path<Uuid>,
) -> Result<StatusCode> {
    joke_service::delete_joke(state.store.as_ref(), joke_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
