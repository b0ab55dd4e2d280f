use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vote {
    pub id: Uuid,
    pub joke_id: Uuid,
    pub user_id: String,
    pub is_like: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Vote {
    pub fn new(joke_id: Uuid, user_id: &str, is_like: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            joke_id,
            user_id: user_id.to_string(),
            is_like,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

// Vote response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteSummary {
    pub likes: i32,
    pub dislikes: i32,
}

impl VoteSummary {
    pub fn tally<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> Self {
        votes
            .into_iter()
            .fold(VoteSummary { likes: 0, dislikes: 0 }, |mut acc, vote| {
                if vote.is_like {
                    acc.likes += 1;
                } else {
                    acc.dislikes += 1;
                }
                acc
            })
    }
}
