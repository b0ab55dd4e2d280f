use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rating {
    pub id: Uuid,
    pub joke_id: Uuid,
    pub user_id: String,
    pub value: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Rating {
    pub fn new(joke_id: Uuid, user_id: &str, value: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            joke_id,
            user_id: user_id.to_string(),
            value,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i32,
}

// Rating response
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i32,
}

impl RatingSummary {
    pub fn from_values(values: impl IntoIterator<Item = i32>) -> Self {
        let (sum, count) = values
            .into_iter()
            .fold((0i64, 0i64), |(sum, count), value| (sum + value as i64, count + 1));

        Self {
            average: round_average(sum, count),
            count: count as i32,
        }
    }
}

/// Mean of `count` ratings summing to `sum`, rounded half away from zero to
/// one decimal place. Zero ratings average to 0.
pub fn round_average(sum: i64, count: i64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    // tenths, rounded: floor((20 * sum + count) / (2 * count)) for non-negative sums
    let tenths = (20 * sum + count) / (2 * count);
    tenths as f64 / 10.0
}

pub fn is_valid_rating(value: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&value)
}
