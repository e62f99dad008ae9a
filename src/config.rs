use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use crate::parse::ResponseFormat;
use crate::process::PagerConfig;
use crate::request::ClientConfig;
use crate::slice::DayWindows;
use crate::{Result, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT};

/// Follows a search's scroll cursor and prints every post it finds.
#[derive(Debug, Parser)]
#[command(name = "scrollpage", version, about)]
pub struct Args {
    /// Search term, anything the provider's advanced search understands
    pub term: String,

    /// Stop after this many pages
    #[arg(long)]
    pub pages: Option<usize>,

    /// Stop after this many records
    #[arg(long)]
    pub max_records: Option<usize>,

    /// How the endpoint wraps its results
    #[arg(long, value_enum, default_value_t = ResponseFormat::Timeline)]
    pub format: ResponseFormat,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Pause between consecutive requests, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub rate_delay_ms: u64,

    /// Request timeout in seconds, the client default applies if unset
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Search day by day starting at this date (YYYY-MM-DD)
    #[arg(long, requires = "until")]
    pub since: Option<NaiveDate>,

    /// Last day of the sliced search, excluded (YYYY-MM-DD)
    #[arg(long, requires = "since")]
    pub until: Option<NaiveDate>,

    /// Fail if the first page has no results
    #[arg(long)]
    pub require_results: bool,

    /// Print records as JSON lines
    #[arg(long)]
    pub json: bool,

    #[arg(long, env = "SCROLLPAGE_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    #[arg(long, env = "SCROLLPAGE_PROXY")]
    pub proxy: Option<String>,
}

impl Args {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            format: self.format,
            user_agent: self.user_agent.clone(),
            proxy: self.proxy.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
            ..ClientConfig::default()
        }
    }

    pub fn pager_config(&self) -> PagerConfig {
        PagerConfig {
            max_pages: self.pages,
            max_records: self.max_records,
            rate_delay: Duration::from_millis(self.rate_delay_ms),
            require_results: self.require_results,
        }
    }

    /// Day windows of a sliced search, `None` for a plain one.
    pub fn windows(&self) -> Result<Option<DayWindows>> {
        match (self.since, self.until) {
            (Some(since), Some(until)) => DayWindows::new(since, until).map(Some),
            _ => Ok(None),
        }
    }
}
