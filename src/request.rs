use std::time::Duration;

use reqwest::{Client, Proxy};
use url::Url;

use crate::parse::ResponseFormat;
use crate::record::Query;
use crate::{Error, Result, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, FIXED_PARAMS};

/// Everything the search client is built from.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    /// Provider-required parameters sent with every request.
    pub fixed_params: Vec<(String, String)>,
    pub format: ResponseFormat,
    pub user_agent: String,
    pub proxy: Option<String>,
    /// `None` leaves reqwest's default in place.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            fixed_params: FIXED_PARAMS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            format: ResponseFormat::default(),
            user_agent: DEFAULT_USER_AGENT.into(),
            proxy: None,
            timeout: None,
        }
    }
}

/// An explicitly configured HTTP client for one search endpoint.
/// Build one per run and hand it to the pager by reference.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: Client,
    endpoint: Url,
    fixed_params: Vec<(String, String)>,
    format: ResponseFormat,
}

impl SearchClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;

        let mut builder = Client::builder().user_agent(config.user_agent);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(Proxy::all(proxy).map_err(Error::InvalidProxy)?);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build().map_err(Error::ClientBuild)?,
            endpoint,
            fixed_params: config.fixed_params,
            format: config.format,
        })
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    /// The URL requested for `query`: fixed params, then `q`, then `max_position` if there is a token.
    pub fn search_url(&self, query: &Query) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.fixed_params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("q", query.term());
            if let Some(token) = query.token() {
                pairs.append_pair("max_position", token);
            }
        }
        url
    }

    /// Requests a page and returns the raw body.
    /// Non-success statuses are treated like transport failures.
    pub async fn fetch_page(&self, query: &Query) -> Result<String> {
        let url = self.search_url(query);
        tracing::debug!(%url, "requesting page");

        let res = self.http.get(url).send().await?.error_for_status()?;
        let body = res.text().await?;
        Ok(body)
    }
}
