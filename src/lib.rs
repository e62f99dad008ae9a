//! Scrapes the posts of a search by following the results page's scroll cursor.
//!
//! A run is a single loop: request a page with the current continuation token,
//! parse out its records and the next token, repeat until the provider runs out.

pub mod config;
mod error;
mod macros;
pub mod parse;
pub mod process;
pub mod record;
pub mod request;
pub mod slice;

pub use error::{Error, Result};
pub use parse::{parse_page, parse_timeline, ResponseFormat};
pub use process::{Harvest, Interrupted, Pager, PagerConfig, Stop};
pub use record::{Query, Record, ResultPage};
pub use request::{ClientConfig, SearchClient};

pub const DEFAULT_ENDPOINT: &str = "https://twitter.com/i/search/timeline";
/// Desktop browser user agent, otherwise the provider answers with a profile card.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/46.0.2490.86 Safari/537.36";
/// Sent with every search request.
pub const FIXED_PARAMS: &[(&str, &str)] = &[("f", "tweets")];
/// A results page shouldn't hold more than 20 items.
const RECORDS_PER_PAGE: usize = 20;
