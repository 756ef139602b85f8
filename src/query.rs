use chrono::{DateTime, Utc};
use std::fmt;

/// Inclusive star-count range, rendered as the `stars:from..to` qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRange {
    pub from: u64,
    pub to: u64,
}

impl StarRange {
    pub fn new(from: u64, to: u64) -> Self {
        StarRange { from, to }
    }
}

impl fmt::Display for StarRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stars:{}..{}", self.from, self.to)
    }
}

/// Structured search predicate. The engine only ever manipulates this value;
/// [`SearchQuery::to_query_string`] is the single place where the platform's
/// query syntax is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub topic: String,
    pub language: String,
    pub stars: Option<StarRange>,
    pub pushed_before: Option<DateTime<Utc>>,
}

impl SearchQuery {
    pub fn new(topic: &str, language: &str) -> Self {
        SearchQuery {
            topic: topic.to_string(),
            language: language.to_string(),
            stars: None,
            pushed_before: None,
        }
    }

    pub fn with_stars(&self, stars: StarRange) -> Self {
        let mut query = self.clone();
        query.stars = Some(stars);
        query
    }

    pub fn to_query_string(&self) -> String {
        let mut parts = vec![
            format!("topic:{}", self.topic),
            format!("language:{}", self.language),
        ];
        if let Some(stars) = &self.stars {
            parts.push(stars.to_string());
        }
        if let Some(cursor) = &self.pushed_before {
            // Strict inequality: the entity at the cursor instant was already
            // fetched by the previous round.
            parts.push(format!("pushed:<{}", cursor.format("%Y-%m-%dT%H:%M:%SZ")));
        }
        parts.join(" ")
    }
}
