use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::JokeStore;
use crate::{
    error::{AppError, Result},
    models::{Joke, JokeCategory, JokeFilter, JokeSort, Rating, RatingSummary, Vote, VoteSummary},
};

#[derive(Default)]
struct Tables {
    jokes: HashMap<Uuid, Joke>,
    votes: Vec<Vote>,
    ratings: Vec<Rating>,
}

impl Tables {
    fn ordered<'a>(&'a self, filter: &JokeFilter, sort: JokeSort) -> Vec<&'a Joke> {
        let mut jokes: Vec<&Joke> = self.jokes.values().filter(|j| filter.matches(j)).collect();
        jokes.sort_by(|a, b| compare(a, b, sort));
        jokes
    }
}

/// Primary key per sort, then newest first, then id.
fn compare(a: &Joke, b: &Joke, sort: JokeSort) -> Ordering {
    let primary = match sort {
        JokeSort::DateAsc => a.created_at.cmp(&b.created_at),
        JokeSort::DateDesc => b.created_at.cmp(&a.created_at),
        JokeSort::PopularityAsc => a.popularity().cmp(&b.popularity()),
        JokeSort::PopularityDesc => b.popularity().cmp(&a.popularity()),
        JokeSort::RatingAsc => a.rating_average.total_cmp(&b.rating_average),
        JokeSort::RatingDesc => b.rating_average.total_cmp(&a.rating_average),
    };
    primary
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryJokeStore {
    tables: Mutex<Tables>,
}

impl MemoryJokeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JokeStore for MemoryJokeStore {
    async fn find_joke(&self, id: Uuid) -> Result<Option<Joke>> {
        Ok(self.tables.lock().jokes.get(&id).cloned())
    }

    async fn insert_joke(&self, joke: &Joke) -> Result<()> {
        let mut tables = self.tables.lock();
        if tables.jokes.contains_key(&joke.id) {
            return Err(AppError::Conflict("Joke already exists".to_string()));
        }
        tables.jokes.insert(joke.id, joke.clone());
        Ok(())
    }

    async fn update_joke(
        &self,
        id: Uuid,
        question: &str,
        answer: &str,
        category: JokeCategory,
    ) -> Result<Option<Joke>> {
        let mut tables = self.tables.lock();
        Ok(tables.jokes.get_mut(&id).map(|joke| {
            joke.question = question.to_string();
            joke.answer = answer.to_string();
            joke.category = category;
            joke.clone()
        }))
    }

    async fn delete_joke(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock();
        if tables.jokes.remove(&id).is_none() {
            return Ok(false);
        }
        tables.votes.retain(|v| v.joke_id != id);
        tables.ratings.retain(|r| r.joke_id != id);
        Ok(true)
    }

    async fn count_jokes(&self, filter: &JokeFilter) -> Result<u64> {
        let tables = self.tables.lock();
        Ok(tables.jokes.values().filter(|j| filter.matches(j)).count() as u64)
    }

    async fn list_jokes(
        &self,
        filter: &JokeFilter,
        sort: JokeSort,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Joke>> {
        let tables = self.tables.lock();
        Ok(tables
            .ordered(filter, sort)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn joke_at(&self, index: u64) -> Result<Option<Joke>> {
        let tables = self.tables.lock();
        Ok(tables
            .ordered(&JokeFilter::default(), JokeSort::DateAsc)
            .into_iter()
            .nth(index as usize)
            .cloned())
    }

    async fn record_view(&self, id: Uuid) -> Result<Option<Joke>> {
        let mut tables = self.tables.lock();
        Ok(tables.jokes.get_mut(&id).map(|joke| {
            joke.views += 1;
            joke.clone()
        }))
    }

    async fn find_vote(&self, joke_id: Uuid, user_id: &str) -> Result<Option<Vote>> {
        let tables = self.tables.lock();
        Ok(tables
            .votes
            .iter()
            .find(|v| v.joke_id == joke_id && v.user_id == user_id)
            .cloned())
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<()> {
        let mut tables = self.tables.lock();
        if !tables.jokes.contains_key(&vote.joke_id) {
            return Err(AppError::joke_not_found());
        }
        if tables
            .votes
            .iter()
            .any(|v| v.joke_id == vote.joke_id && v.user_id == vote.user_id)
        {
            return Err(AppError::Conflict("Vote already exists".to_string()));
        }
        tables.votes.push(vote.clone());
        Ok(())
    }

    async fn update_vote(
        &self,
        vote_id: Uuid,
        is_like: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.tables.lock();
        let vote = tables
            .votes
            .iter_mut()
            .find(|v| v.id == vote_id)
            .ok_or_else(|| AppError::NotFound("Vote not found".to_string()))?;
        vote.is_like = is_like;
        vote.updated_at = Some(updated_at);
        Ok(())
    }

    async fn recount_votes(&self, joke_id: Uuid) -> Result<VoteSummary> {
        let mut tables = self.tables.lock();
        let summary = VoteSummary::tally(tables.votes.iter().filter(|v| v.joke_id == joke_id));
        let joke = tables
            .jokes
            .get_mut(&joke_id)
            .ok_or_else(AppError::joke_not_found)?;
        joke.likes = summary.likes;
        joke.dislikes = summary.dislikes;
        Ok(summary)
    }

    async fn find_rating(&self, joke_id: Uuid, user_id: &str) -> Result<Option<Rating>> {
        let tables = self.tables.lock();
        Ok(tables
            .ratings
            .iter()
            .find(|r| r.joke_id == joke_id && r.user_id == user_id)
            .cloned())
    }

    async fn insert_rating(&self, rating: &Rating) -> Result<()> {
        let mut tables = self.tables.lock();
        if !tables.jokes.contains_key(&rating.joke_id) {
            return Err(AppError::joke_not_found());
        }
        if tables
            .ratings
            .iter()
            .any(|r| r.joke_id == rating.joke_id && r.user_id == rating.user_id)
        {
            return Err(AppError::Conflict("Rating already exists".to_string()));
        }
        tables.ratings.push(rating.clone());
        Ok(())
    }

    async fn update_rating(
        &self,
        rating_id: Uuid,
        value: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.tables.lock();
        let rating = tables
            .ratings
            .iter_mut()
            .find(|r| r.id == rating_id)
            .ok_or_else(|| AppError::NotFound("Rating not found".to_string()))?;
        rating.value = value;
        rating.updated_at = Some(updated_at);
        Ok(())
    }

    async fn recount_ratings(&self, joke_id: Uuid) -> Result<RatingSummary> {
        let mut tables = self.tables.lock();
        let summary = RatingSummary::from_values(
            tables
                .ratings
                .iter()
                .filter(|r| r.joke_id == joke_id)
                .map(|r| r.value),
        );
        let joke = tables
            .jokes
            .get_mut(&joke_id)
            .ok_or_else(AppError::joke_not_found)?;
        joke.rating_average = summary.average;
        joke.rating_count = summary.count;
        Ok(summary)
    }
}
