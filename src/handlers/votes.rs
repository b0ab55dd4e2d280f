use axum::extract::State;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    extract::{Json, Path},
    models::{RateRequest, RatingSummary, VoteSummary},
    services::{rating_service, vote_service},
};

pub async fn like_joke(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(joke_id): Path<Uuid>,
) -> Result<Json<VoteSummary>> {
    let summary =
        vote_service::vote(state.store.as_ref(), joke_id, &auth_user.user_id, true).await?;
    Ok(Json(summary))
}

pub async fn dislike_joke(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(joke_id): Path<Uuid>,
) -> Result<Json<VoteSummary>> {
    let summary =
        vote_service::vote(state.store.as_ref(), joke_id, &auth_user.user_id, false).await?;
    Ok(Json(summary))
}

pub async fn rate_joke(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(joke_id): Path<Uuid>,
    Json(payload): Json<RateRequest>,
) -> Result<Json<RatingSummary>> {
    let summary = rating_service::rate(
        state.store.as_ref(),
        joke_id,
        &auth_user.user_id,
        payload.rating,
    )
    .await?;
    Ok(Json(summary))
}
