use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Network Error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Couldn't locate the stream container, the document isn't a results page.")]
    MissingRoot,
    #[error("Timeline response isn't valid JSON: {0}")]
    Timeline(#[source] serde_json::Error),
    #[error("The selector you are trying to scrape with is invalid. Selector: {0}")]
    InvalidSelector(String),

    #[error("Search for '{0}' returned no results.")]
    EmptyResult(String),

    #[error("The search term is empty.")]
    EmptyTerm,
    #[error("Empty date window: {since} is not before {until}.")]
    EmptyWindow {
        since: chrono::NaiveDate,
        until: chrono::NaiveDate,
    },
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("Couldn't build the HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("Invalid proxy: {0}")]
    InvalidProxy(#[source] reqwest::Error),

    #[error("Couldn't encode a record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),
}

impl Error {
    /// Whether the error came from a response that couldn't be decoded.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Error::MissingRoot | Error::Timeline(_) | Error::InvalidSelector(_)
        )
    }
}
