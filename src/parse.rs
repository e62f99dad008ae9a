use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tokio::task::spawn_blocking;

use crate::record::{Record, ResultPage};
use crate::{Error, Result, RECORDS_PER_PAGE};

/// How the search endpoint wraps its results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ResponseFormat {
    /// A full HTML results page, the cursor lives on the stream container.
    Html,
    /// A JSON envelope carrying an HTML fragment of items and the cursor.
    #[default]
    Timeline,
}

/// Parses a response body on the blocking pool, `scraper` documents aren't `Send`.
pub(crate) async fn parse_body(format: ResponseFormat, body: String) -> Result<ResultPage> {
    let page = spawn_blocking(move || match format {
        ResponseFormat::Html => parse_page(&body),
        ResponseFormat::Timeline => parse_timeline(&body),
    })
    .await??;

    Ok(page)
}

/// Attempts to parse a full results page.
/// Fails only if the stream container can't be found, every other piece of markup is optional.
pub fn parse_page(html: &str) -> Result<ResultPage> {
    let selectors = PageSelectors::new()?;
    let doc = Html::parse_document(html);

    let root = doc
        .select(&selectors.root)
        .next()
        .ok_or(Error::MissingRoot)?;

    let records = extract_records(root, &selectors);
    let next = root.value().attr("data-min-position").and_then(non_empty);

    Ok(ResultPage { records, next })
}

#[derive(Debug, Deserialize)]
struct TimelineEnvelope {
    #[serde(default)]
    items_html: Option<String>,
    #[serde(default)]
    min_position: Option<String>,
    #[serde(default)]
    has_more_items: Option<bool>,
}

/// Attempts to parse a timeline JSON envelope: `{ items_html, min_position, has_more_items }`.
/// A missing `items_html` is the provider's way of saying there is nothing left.
pub fn parse_timeline(body: &str) -> Result<ResultPage> {
    let envelope: TimelineEnvelope = serde_json::from_str(body).map_err(Error::Timeline)?;

    let Some(items_html) = envelope.items_html else {
        return Ok(ResultPage::default());
    };

    let selectors = PageSelectors::new()?;
    let fragment = Html::parse_fragment(&items_html);
    let records = extract_records(fragment.root_element(), &selectors);

    let next = match envelope.has_more_items {
        Some(false) => None,
        _ => envelope.min_position.as_deref().and_then(non_empty),
    };

    Ok(ResultPage { records, next })
}

struct PageSelectors {
    root: Selector,
    item: Selector,
    text: Selector,
    user: Selector,
    timestamp: Selector,
    retweets: Selector,
    favorites: Selector,
}

impl PageSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            root: create_selector("div.stream-container")?,
            item: create_selector("li.js-stream-item")?,
            text: create_selector("p.tweet-text")?,
            user: create_selector("div.tweet")?,
            timestamp: create_selector("span._timestamp")?,
            retweets: create_selector(
                "span.ProfileTweet-action--retweet > span.ProfileTweet-actionCount",
            )?,
            favorites: create_selector(
                "span.ProfileTweet-action--favorite > span.ProfileTweet-actionCount",
            )?,
        })
    }
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::InvalidSelector(sel_str.into()))
}

fn extract_records(container: ElementRef<'_>, selectors: &PageSelectors) -> Vec<Record> {
    let mut records = Vec::with_capacity(RECORDS_PER_PAGE);
    for item in container.select(&selectors.item) {
        match extract_record(item, selectors) {
            Some(record) => records.push(record),
            None => tracing::debug!("skipping stream item without an item id"),
        }
    }
    records
}

/// Stream items without an id aren't posts (who-to-follow cards and such).
fn extract_record(item: ElementRef<'_>, selectors: &PageSelectors) -> Option<Record> {
    let id = item.value().attr("data-item-id").and_then(non_empty)?;

    Some(Record {
        text: extract_text(item, selectors),
        user_id: extract_user_id(item, selectors),
        user_screen_name: extract_screen_name(item, selectors),
        user_name: extract_user_name(item, selectors),
        created_at: extract_created_at(item, selectors),
        retweets: extract_retweets(item, selectors),
        favorites: extract_favorites(item, selectors),
        ..Record::new(id)
    })
}

fn extract_text(item: ElementRef<'_>, selectors: &PageSelectors) -> Option<String> {
    let text_p = item.select(&selectors.text).next()?;
    Some(text_p.text().collect::<String>().trim().to_string())
}

fn extract_user_id(item: ElementRef<'_>, selectors: &PageSelectors) -> Option<String> {
    user_attr(item, selectors, "data-user-id")
}

fn extract_screen_name(item: ElementRef<'_>, selectors: &PageSelectors) -> Option<String> {
    user_attr(item, selectors, "data-screen-name")
}

fn extract_user_name(item: ElementRef<'_>, selectors: &PageSelectors) -> Option<String> {
    user_attr(item, selectors, "data-name")
}

fn user_attr(item: ElementRef<'_>, selectors: &PageSelectors, attr: &str) -> Option<String> {
    let user_div = item.select(&selectors.user).next()?;
    user_div.value().attr(attr).and_then(non_empty)
}

fn extract_created_at(item: ElementRef<'_>, selectors: &PageSelectors) -> Option<DateTime<Utc>> {
    let date_span = item.select(&selectors.timestamp).next()?;
    let millis = date_span.value().attr("data-time-ms")?.trim().parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

fn extract_retweets(item: ElementRef<'_>, selectors: &PageSelectors) -> Option<u64> {
    stat_count(item, &selectors.retweets)
}

fn extract_favorites(item: ElementRef<'_>, selectors: &PageSelectors) -> Option<u64> {
    stat_count(item, &selectors.favorites)
}

fn stat_count(item: ElementRef<'_>, selector: &Selector) -> Option<u64> {
    let count_span = item.select(selector).next()?;
    count_span
        .value()
        .attr("data-tweet-stat-count")?
        .trim()
        .parse()
        .ok()
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_ITEM: &str = r#"
        <li class="js-stream-item stream-item" data-item-id="100">
          <div class="tweet js-stream-tweet" data-user-id="42" data-screen-name="jms" data-name="J. Michael">
            <small class="time"><span class="_timestamp js-short-timestamp" data-time-ms="1477000000000">20 Oct</span></small>
            <p class="TweetTextSize tweet-text">The <b>Babylon</b> project was our last, best hope</p>
            <div class="ProfileTweet-actionList">
              <span class="ProfileTweet-action--retweet u-hiddenVisually">
                <span class="ProfileTweet-actionCount" data-tweet-stat-count="7">7 retweets</span>
              </span>
              <span class="ProfileTweet-action--favorite u-hiddenVisually">
                <span class="ProfileTweet-actionCount" data-tweet-stat-count="31">31 likes</span>
              </span>
            </div>
          </div>
        </li>"#;

    const BARE_ITEM: &str = r#"<li class="js-stream-item" data-item-id="101"></li>"#;

    const CARD_ITEM: &str =
        r#"<li class="js-stream-item"><div class="who-to-follow">Follow us</div></li>"#;

    fn results_page(cursor: Option<&str>, items: &[&str]) -> String {
        let cursor = cursor
            .map(|c| format!(r#" data-min-position="{c}""#))
            .unwrap_or_default();
        format!(
            r#"<!DOCTYPE html><html><body>
            <div class="stream-container"{cursor}>
              <div class="stream"><ol class="stream-items" id="stream-items-id">{}</ol></div>
            </div>
            </body></html>"#,
            items.concat()
        )
    }

    #[test]
    fn extracts_every_field_of_a_full_item() {
        let page = parse_page(&results_page(Some("abc"), &[FULL_ITEM])).unwrap();

        assert_eq!(page.next.as_deref(), Some("abc"));
        assert_eq!(page.records.len(), 1);

        let record = &page.records[0];
        assert_eq!(record.id, "100");
        assert_eq!(
            record.text.as_deref(),
            Some("The Babylon project was our last, best hope")
        );
        assert_eq!(record.user_id.as_deref(), Some("42"));
        assert_eq!(record.user_screen_name.as_deref(), Some("jms"));
        assert_eq!(record.user_name.as_deref(), Some("J. Michael"));
        assert_eq!(
            record.created_at,
            DateTime::from_timestamp_millis(1_477_000_000_000)
        );
        assert_eq!(record.retweets, Some(7));
        assert_eq!(record.favorites, Some(31));
    }

    #[test]
    fn missing_fields_stay_empty() {
        let page = parse_page(&results_page(None, &[BARE_ITEM])).unwrap();

        assert_eq!(page.records, vec![Record::new("101")]);
        assert_eq!(page.next, None);
    }

    #[test]
    fn broken_field_doesnt_drop_the_record() {
        let item = r#"
            <li class="js-stream-item" data-item-id="102">
              <div class="tweet" data-user-id="9">
                <span class="_timestamp" data-time-ms="yesterday"></span>
                <p class="tweet-text">still here</p>
              </div>
            </li>"#;
        let page = parse_page(&results_page(None, &[item])).unwrap();

        let record = &page.records[0];
        assert_eq!(record.created_at, None);
        assert_eq!(record.user_screen_name, None);
        assert_eq!(record.user_id.as_deref(), Some("9"));
        assert_eq!(record.text.as_deref(), Some("still here"));
    }

    #[test]
    fn items_without_an_id_are_skipped_and_order_is_kept() {
        let page = parse_page(&results_page(
            Some("c"),
            &[BARE_ITEM, CARD_ITEM, FULL_ITEM],
        ))
        .unwrap();

        let ids: Vec<_> = page.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["101", "100"]);
    }

    #[test]
    fn empty_cursor_means_no_next_page() {
        let page = parse_page(&results_page(Some("  "), &[BARE_ITEM])).unwrap();
        assert_eq!(page.next, None);
    }

    #[test]
    fn empty_results_page_is_not_an_error() {
        let page = parse_page(&results_page(None, &[])).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.next, None);
    }

    #[test]
    fn page_without_stream_container_fails() {
        let err = parse_page("<html><body><h1>Something went wrong</h1>").unwrap_err();
        assert!(matches!(err, Error::MissingRoot));
        assert!(err.is_parse());

        assert!(matches!(parse_page("not even html"), Err(Error::MissingRoot)));
    }

    #[test]
    fn timeline_envelope_is_decoded() {
        let items_html = [FULL_ITEM, BARE_ITEM].concat();
        let body = serde_json::json!({
            "has_more_items": true,
            "items_html": items_html,
            "min_position": "TWEET-101-100",
        })
        .to_string();

        let page = parse_timeline(&body).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].user_screen_name.as_deref(), Some("jms"));
        assert_eq!(page.next.as_deref(), Some("TWEET-101-100"));
    }

    #[test]
    fn timeline_without_more_items_has_no_cursor() {
        let body = serde_json::json!({
            "has_more_items": false,
            "items_html": BARE_ITEM,
            "min_position": "TWEET-101-101",
        })
        .to_string();

        let page = parse_timeline(&body).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.next, None);
    }

    #[test]
    fn timeline_without_items_is_empty() {
        let page = parse_timeline(r#"{"items_html": null, "min_position": "x"}"#).unwrap();
        assert_eq!(page, ResultPage::default());
    }

    #[test]
    fn timeline_that_isnt_json_fails() {
        let err = parse_timeline("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, Error::Timeline(_)));
        assert!(err.is_parse());
    }

    #[tokio::test]
    async fn parse_body_dispatches_on_format() {
        let html = results_page(Some("abc"), &[FULL_ITEM]);
        let page = parse_body(ResponseFormat::Html, html.clone()).await.unwrap();
        assert_eq!(page.next.as_deref(), Some("abc"));

        let err = parse_body(ResponseFormat::Timeline, html).await.unwrap_err();
        assert!(matches!(err, Error::Timeline(_)));
    }
}
