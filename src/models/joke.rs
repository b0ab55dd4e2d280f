use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const PAGE_SIZE: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum JokeCategory {
    #[default]
    General,
    #[serde(rename = "Dad Jokes")]
    DadJokes,
    #[serde(rename = "Knock-Knock")]
    KnockKnock,
    #[serde(rename = "Dark Humor")]
    DarkHumor,
    #[serde(rename = "Tech Jokes")]
    TechJokes,
    Random,
}

impl JokeCategory {
    /// Display order used by category pickers.
    pub const ALL: [JokeCategory; 6] = [
        JokeCategory::General,
        JokeCategory::DadJokes,
        JokeCategory::KnockKnock,
        JokeCategory::DarkHumor,
        JokeCategory::TechJokes,
        JokeCategory::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JokeCategory::General => "General",
            JokeCategory::DadJokes => "Dad Jokes",
            JokeCategory::KnockKnock => "Knock-Knock",
            JokeCategory::DarkHumor => "Dark Humor",
            JokeCategory::TechJokes => "Tech Jokes",
            JokeCategory::Random => "Random",
        }
    }
}

impl fmt::Display for JokeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JokeCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JokeCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown JokeCategory: {}", s))
    }
}

impl TryFrom<String> for JokeCategory {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joke {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub category: JokeCategory,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes: i32,
    pub dislikes: i32,
    pub rating_average: f64,
    pub rating_count: i32,
    pub views: i32,
}

impl Joke {
    pub fn new(
        question: String,
        answer: String,
        category: JokeCategory,
        created_by: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question,
            answer,
            category,
            created_by,
            created_at: Utc::now(),
            likes: 0,
            dislikes: 0,
            rating_average: 0.0,
            rating_count: 0,
            views: 0,
        }
    }

    pub fn popularity(&self) -> i32 {
        self.likes - self.dislikes
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

// Create joke request
#[derive(Debug, Validate, Deserialize)]
pub struct CreateJokeRequest {
    #[validate(
        length(min = 1, max = 500, message = "must be between 1 and 500 characters"),
        custom(function = "not_blank")
    )]
    pub question: String,
    #[validate(
        length(min = 1, max = 1000, message = "must be between 1 and 1000 characters"),
        custom(function = "not_blank")
    )]
    pub answer: String,
    #[serde(default)]
    pub category: JokeCategory,
}

// Update joke request; only these fields are editable
#[derive(Debug, Validate, Deserialize)]
pub struct UpdateJokeRequest {
    #[validate(
        length(min = 1, max = 500, message = "must be between 1 and 500 characters"),
        custom(function = "not_blank")
    )]
    pub question: String,
    #[validate(
        length(min = 1, max = 1000, message = "must be between 1 and 1000 characters"),
        custom(function = "not_blank")
    )]
    pub answer: String,
    pub category: JokeCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JokeSort {
    DateAsc,
    #[default]
    DateDesc,
    PopularityAsc,
    PopularityDesc,
    RatingAsc,
    RatingDesc,
}

impl FromStr for JokeSort {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_asc" => Ok(JokeSort::DateAsc),
            "date_desc" => Ok(JokeSort::DateDesc),
            "popularity_asc" => Ok(JokeSort::PopularityAsc),
            "popularity_desc" => Ok(JokeSort::PopularityDesc),
            "rating_asc" => Ok(JokeSort::RatingAsc),
            "rating_desc" => Ok(JokeSort::RatingDesc),
            _ => Err(format!("Unknown sort: {}", s)),
        }
    }
}

/// Listing filter after the raw query parameters have been interpreted.
#[derive(Debug, Clone, Default)]
pub struct JokeFilter {
    pub search: Option<String>,
    pub category: Option<JokeCategory>,
}

impl JokeFilter {
    pub fn matches(&self, joke: &Joke) -> bool {
        if let Some(category) = self.category {
            if joke.category != category {
                return false;
            }
        }
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                joke.question.to_lowercase().contains(&term)
                    || joke.answer.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

/// Page placement after clamping the requested page into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl PageWindow {
    pub fn clamp(requested: u32, total_items: u64, page_size: u32) -> Self {
        let total_pages = total_items.div_ceil(page_size as u64) as u32;
        let page = requested.clamp(1, total_pages.max(1));
        Self {
            page,
            total_pages,
            total_items,
        }
    }

    pub fn offset(&self, page_size: u32) -> u64 {
        (self.page as u64 - 1) * page_size as u64
    }
}

#[derive(Debug, Serialize)]
pub struct JokePage {
    pub jokes: Vec<Joke>,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_jokes: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl JokePage {
    pub fn new(jokes: Vec<Joke>, window: PageWindow, page_size: u32) -> Self {
        Self {
            jokes,
            page: window.page,
            page_size,
            total_pages: window.total_pages,
            total_jokes: window.total_items,
            has_previous: window.page > 1,
            has_next: window.page < window.total_pages,
        }
    }
}
