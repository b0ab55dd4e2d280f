use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::JokeStore;
use crate::{
    error::{AppError, Result, map_unique_violation},
    models::{Joke, JokeCategory, JokeFilter, JokeSort, Rating, RatingSummary, Vote, VoteSummary},
};

const JOKE_COLUMNS: &str = "id, question, answer, category, created_by, created_at, \
     likes, dislikes, rating_average, rating_count, views";

#[derive(Debug, FromRow)]
struct JokeRow {
    id: Uuid,
    question: String,
    answer: String,
    category: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    likes: i32,
    dislikes: i32,
    rating_average: f64,
    rating_count: i32,
    views: i32,
}

impl TryFrom<JokeRow> for Joke {
    type Error = AppError;

    fn try_from(row: JokeRow) -> Result<Self> {
        let category = row
            .category
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid category: {}", e)))?;

        Ok(Joke {
            id: row.id,
            question: row.question,
            answer: row.answer,
            category,
            created_by: row.created_by,
            created_at: row.created_at,
            likes: row.likes,
            dislikes: row.dislikes,
            rating_average: row.rating_average,
            rating_count: row.rating_count,
            views: row.views,
        })
    }
}

#[derive(Debug, FromRow)]
struct VoteRow {
    id: Uuid,
    joke_id: Uuid,
    user_id: String,
    is_like: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Vote {
            id: row.id,
            joke_id: row.joke_id,
            user_id: row.user_id,
            is_like: row.is_like,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RatingRow {
    id: Uuid,
    joke_id: Uuid,
    user_id: String,
    value: i32,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating {
            id: row.id,
            joke_id: row.joke_id,
            user_id: row.user_id,
            value: row.value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn order_clause(sort: JokeSort) -> &'static str {
    match sort {
        JokeSort::DateAsc => "created_at ASC, id ASC",
        JokeSort::DateDesc => "created_at DESC, id ASC",
        JokeSort::PopularityAsc => "(likes - dislikes) ASC, created_at DESC, id ASC",
        JokeSort::PopularityDesc => "(likes - dislikes) DESC, created_at DESC, id ASC",
        JokeSort::RatingAsc => "rating_average ASC, created_at DESC, id ASC",
        JokeSort::RatingDesc => "rating_average DESC, created_at DESC, id ASC",
    }
}

/// `%term%` with LIKE metacharacters escaped (backslash is the default escape).
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Appends the WHERE clause for `filter`, returning the next free parameter index.
fn push_filter(query: &mut String, filter: &JokeFilter) -> usize {
    let mut param_count = 0;
    query.push_str(" WHERE 1 = 1");

    if filter.search.is_some() {
        param_count += 1;
        query.push_str(&format!(
            " AND (question ILIKE ${0} OR answer ILIKE ${0})",
            param_count
        ));
    }

    if filter.category.is_some() {
        param_count += 1;
        query.push_str(&format!(" AND category = ${}", param_count));
    }

    param_count
}

pub struct PgJokeStore {
    db: PgPool,
}

impl PgJokeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JokeStore for PgJokeStore {
    async fn find_joke(&self, id: Uuid) -> Result<Option<Joke>> {
        let row = sqlx::query_as::<_, JokeRow>(&format!(
            "SELECT {} FROM jokes WHERE id = $1",
            JOKE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Joke::try_from).transpose()
    }

    async fn insert_joke(&self, joke: &Joke) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jokes (
                id, question, answer, category, created_by, created_at,
                likes, dislikes, rating_average, rating_count, views
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(joke.id)
        .bind(&joke.question)
        .bind(&joke.answer)
        .bind(joke.category.as_str())
        .bind(&joke.created_by)
        .bind(joke.created_at)
        .bind(joke.likes)
        .bind(joke.dislikes)
        .bind(joke.rating_average)
        .bind(joke.rating_count)
        .bind(joke.views)
        .execute(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "Joke"))?;

        Ok(())
    }

    async fn update_joke(
        &self,
        id: Uuid,
        question: &str,
        answer: &str,
        category: JokeCategory,
    ) -> Result<Option<Joke>> {
        let row = sqlx::query_as::<_, JokeRow>(&format!(
            r#"
            UPDATE jokes
            SET question = $1,
                answer = $2,
                category = $3
            WHERE id = $4
            RETURNING {}
            "#,
            JOKE_COLUMNS
        ))
        .bind(question)
        .bind(answer)
        .bind(category.as_str())
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Joke::try_from).transpose()
    }

    async fn delete_joke(&self, id: Uuid) -> Result<bool> {
        // joke_votes and joke_ratings cascade through their foreign keys
        let result = sqlx::query("DELETE FROM jokes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_jokes(&self, filter: &JokeFilter) -> Result<u64> {
        let mut query = "SELECT COUNT(*) FROM jokes".to_string();
        push_filter(&mut query, filter);

        let mut query_builder = sqlx::query_scalar::<_, i64>(&query);
        if let Some(search) = &filter.search {
            query_builder = query_builder.bind(like_pattern(search));
        }
        if let Some(category) = filter.category {
            query_builder = query_builder.bind(category.as_str());
        }

        let count = query_builder.fetch_one(&self.db).await?;
        Ok(count as u64)
    }

    async fn list_jokes(
        &self,
        filter: &JokeFilter,
        sort: JokeSort,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Joke>> {
        let mut query = format!("SELECT {} FROM jokes", JOKE_COLUMNS);
        let param_count = push_filter(&mut query, filter);

        query.push_str(&format!(
            " ORDER BY {} LIMIT ${} OFFSET ${}",
            order_clause(sort),
            param_count + 1,
            param_count + 2
        ));

        let mut query_builder = sqlx::query_as::<_, JokeRow>(&query);
        if let Some(search) = &filter.search {
            query_builder = query_builder.bind(like_pattern(search));
        }
        if let Some(category) = filter.category {
            query_builder = query_builder.bind(category.as_str());
        }
        query_builder = query_builder.bind(limit as i64).bind(offset as i64);

        let rows = query_builder.fetch_all(&self.db).await?;
        rows.into_iter().map(Joke::try_from).collect()
    }

    async fn joke_at(&self, index: u64) -> Result<Option<Joke>> {
        let row = sqlx::query_as::<_, JokeRow>(&format!(
            "SELECT {} FROM jokes ORDER BY created_at ASC, id ASC OFFSET $1 LIMIT 1",
            JOKE_COLUMNS
        ))
        .bind(index as i64)
        .fetch_optional(&self.db)
        .await?;

        row.map(Joke::try_from).transpose()
    }

    async fn record_view(&self, id: Uuid) -> Result<Option<Joke>> {
        let row = sqlx::query_as::<_, JokeRow>(&format!(
            "UPDATE jokes SET views = views + 1 WHERE id = $1 RETURNING {}",
            JOKE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Joke::try_from).transpose()
    }

    async fn find_vote(&self, joke_id: Uuid, user_id: &str) -> Result<Option<Vote>> {
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT id, joke_id, user_id, is_like, created_at, updated_at
            FROM joke_votes
            WHERE joke_id = $1 AND user_id = $2
            "#,
        )
        .bind(joke_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Vote::from))
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO joke_votes (id, joke_id, user_id, is_like, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(vote.id)
        .bind(vote.joke_id)
        .bind(&vote.user_id)
        .bind(vote.is_like)
        .bind(vote.created_at)
        .bind(vote.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "Vote"))?;

        Ok(())
    }

    async fn update_vote(
        &self,
        vote_id: Uuid,
        is_like: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE joke_votes SET is_like = $1, updated_at = $2 WHERE id = $3")
            .bind(is_like)
            .bind(updated_at)
            .bind(vote_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn recount_votes(&self, joke_id: Uuid) -> Result<VoteSummary> {
        // Ledger read and counter write in one statement
        let row: Option<(i32, i32)> = sqlx::query_as(
            r#"
            UPDATE jokes
            SET likes = (SELECT COUNT(*) FROM joke_votes WHERE joke_id = $1 AND is_like),
                dislikes = (SELECT COUNT(*) FROM joke_votes WHERE joke_id = $1 AND NOT is_like)
            WHERE id = $1
            RETURNING likes, dislikes
            "#,
        )
        .bind(joke_id)
        .fetch_optional(&self.db)
        .await?;

        let (likes, dislikes) = row.ok_or_else(AppError::joke_not_found)?;
        Ok(VoteSummary { likes, dislikes })
    }

    async fn find_rating(&self, joke_id: Uuid, user_id: &str) -> Result<Option<Rating>> {
        let row = sqlx::query_as::<_, RatingRow>(
            r#"
            SELECT id, joke_id, user_id, value, created_at, updated_at
            FROM joke_ratings
            WHERE joke_id = $1 AND user_id = $2
            "#,
        )
        .bind(joke_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Rating::from))
    }

    async fn insert_rating(&self, rating: &Rating) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO joke_ratings (id, joke_id, user_id, value, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rating.id)
        .bind(rating.joke_id)
        .bind(&rating.user_id)
        .bind(rating.value)
        .bind(rating.created_at)
        .bind(rating.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "Rating"))?;

        Ok(())
    }

    async fn update_rating(
        &self,
        rating_id: Uuid,
        value: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE joke_ratings SET value = $1, updated_at = $2 WHERE id = $3")
            .bind(value)
            .bind(updated_at)
            .bind(rating_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn recount_ratings(&self, joke_id: Uuid) -> Result<RatingSummary> {
        // NUMERIC ROUND is half away from zero, matching round_average
        let row: Option<(f64, i32)> = sqlx::query_as(
            r#"
            UPDATE jokes
            SET rating_count = stats.total,
                rating_average = COALESCE(ROUND(stats.mean, 1), 0)::DOUBLE PRECISION
            FROM (
                SELECT COUNT(*) AS total, AVG(value) AS mean
                FROM joke_ratings
                WHERE joke_id = $1
            ) AS stats
            WHERE jokes.id = $1
            RETURNING jokes.rating_average, jokes.rating_count
            "#,
        )
        .bind(joke_id)
        .fetch_optional(&self.db)
        .await?;

        let (average, count) = row.ok_or_else(AppError::joke_not_found)?;
        Ok(RatingSummary { average, count })
    }
}
