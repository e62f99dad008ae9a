use std::collections::HashSet;
use std::time::Duration;

use chrono::Local;

use crate::parse::parse_body;
use crate::record::{Query, Record};
use crate::request::SearchClient;
use crate::{info_time, Error, RECORDS_PER_PAGE};

/// Limits and pacing of a single run.
#[derive(Debug, Clone, Default)]
pub struct PagerConfig {
    /// `None` follows the cursor until the provider runs out.
    pub max_pages: Option<usize>,
    pub max_records: Option<usize>,
    /// Fixed pause between consecutive requests.
    pub rate_delay: Duration,
    /// Treat a first page without records as [`Error::EmptyResult`].
    pub require_results: bool,
}

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop {
    /// The last page carried no continuation token.
    Exhausted,
    /// The last page carried no records.
    EmptyPage,
    PageLimit,
    RecordLimit,
    /// The provider handed back a token that was already requested.
    RepeatedToken(String),
}

/// Everything a finished run collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harvest {
    pub records: Vec<Record>,
    pub fetches: usize,
    pub stop: Stop,
}

/// A run aborted by `error`. The records gathered before the failure are kept.
#[derive(Debug, thiserror::Error)]
#[error("run interrupted after {fetches} fetches ({} records kept): {error}", .records.len())]
pub struct Interrupted {
    pub records: Vec<Record>,
    pub fetches: usize,
    #[source]
    pub error: Error,
}

/// Follows the cursor of one search, page by page.
pub struct Pager<'a> {
    client: &'a SearchClient,
    config: PagerConfig,
}

impl<'a> Pager<'a> {
    pub fn new(client: &'a SearchClient, config: PagerConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    /// Same client and limits, but a first page without records just ends the run.
    pub(crate) fn allowing_empty(&self) -> Pager<'a> {
        Pager {
            client: self.client,
            config: PagerConfig {
                require_results: false,
                ..self.config.clone()
            },
        }
    }

    /// Fetches, parses and appends pages until the provider runs out or a limit is hit.
    /// Nothing is retried, the first failure ends the run.
    pub async fn run(&self, term: &str) -> Result<Harvest, Interrupted> {
        let start_time = Local::now();
        let mut records = Vec::with_capacity(RECORDS_PER_PAGE);
        let mut fetches = 0;

        let stop = match self.collect(term, &mut records, &mut fetches).await {
            Ok(stop) => stop,
            Err(error) => {
                tracing::error!(term, fetches, records = records.len(), %error, "run interrupted");
                return Err(Interrupted {
                    records,
                    fetches,
                    error,
                });
            }
        };

        info_time!(
            start_time,
            "Finished '{}': {} records in {} fetches, stop: {:?}",
            term,
            records.len(),
            fetches,
            stop
        );
        Ok(Harvest {
            records,
            fetches,
            stop,
        })
    }

    async fn collect(
        &self,
        term: &str,
        records: &mut Vec<Record>,
        fetches: &mut usize,
    ) -> crate::Result<Stop> {
        let mut query = Query::new(term)?;
        let mut requested = HashSet::new();

        loop {
            if let Some(max_pages) = self.config.max_pages {
                if *fetches >= max_pages {
                    return Ok(Stop::PageLimit);
                }
            }
            if let Some(max_records) = self.config.max_records {
                if records.len() >= max_records {
                    return Ok(Stop::RecordLimit);
                }
            }
            if *fetches > 0 && !self.config.rate_delay.is_zero() {
                tokio::time::sleep(self.config.rate_delay).await;
            }

            if let Some(token) = query.token() {
                requested.insert(token.to_string());
            }
            let body = self.client.fetch_page(&query).await?;
            *fetches += 1;

            let page = parse_body(self.client.format(), body).await?;
            tracing::info!(
                page = *fetches,
                records = page.records.len(),
                next = page.next.as_deref().unwrap_or("-"),
                "parsed page"
            );

            if page.records.is_empty() {
                if *fetches == 1 && self.config.require_results {
                    return Err(Error::EmptyResult(term.to_string()));
                }
                return Ok(Stop::EmptyPage);
            }
            records.extend(page.records);

            if let Some(max_records) = self.config.max_records {
                if records.len() >= max_records {
                    records.truncate(max_records);
                    return Ok(Stop::RecordLimit);
                }
            }

            match page.next {
                None => return Ok(Stop::Exhausted),
                Some(token) if requested.contains(&token) => {
                    tracing::warn!(%token, "provider repeated a continuation token");
                    return Ok(Stop::RepeatedToken(token));
                }
                Some(token) => query = query.advance(token),
            }
        }
    }
}
