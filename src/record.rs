use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Error, Result};

/// A search term plus the continuation token of the page to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    term: String,
    token: Option<String>,
}

impl Query {
    /// Query for the first page of results.
    pub fn new(term: impl Into<String>) -> Result<Self> {
        let term = term.into();
        if term.trim().is_empty() {
            return Err(Error::EmptyTerm);
        }
        Ok(Self { term, token: None })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Consumes the query and returns the one for the page behind `token`.
    pub fn advance(self, token: String) -> Self {
        Self {
            term: self.term,
            token: Some(token),
        }
    }
}

/// A single post scraped from a results page.
/// Everything but the id is whatever the markup happened to expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: String,
    pub text: Option<String>,
    pub user_id: Option<String>,
    pub user_screen_name: Option<String>,
    pub user_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub retweets: Option<u64>,
    pub favorites: Option<u64>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: None,
            user_id: None,
            user_screen_name: None,
            user_name: None,
            created_at: None,
            retweets: None,
            favorites: None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.created_at {
            Some(t) => write!(f, "[{}]", t.format("%Y-%m-%d %H:%M:%S"))?,
            None => write!(f, "[{:<19}]", "unknown")?,
        }
        if let Some(screen_name) = &self.user_screen_name {
            write!(f, " @{screen_name}:")?;
        }
        write!(f, " {}", self.text.as_deref().unwrap_or_default().trim())
    }
}

/// Records of one response, in provider order, and the token of the next page.
/// `next == None` marks the end of the results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub records: Vec<Record>,
    pub next: Option<String>,
}
