// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::ListingError;
use crate::http::{HttpClient, HttpResponse};
use crate::period::ReleasePeriod;
use crate::retry::RetryPolicy;

use super::parse::{CatalogEntry, FeedItem, parse_listing, parse_release_feed};

/// Directory-listing worker serving both period listings and playable files
pub const DEFAULT_LISTING_BASE: &str = "https://openani.an-i.workers.dev";

/// RSS feed of the most recent releases
pub const DEFAULT_RELEASE_FEED: &str = "https://api.ani.rip/ani-download.xml";

/// URL of the directory listing for `period`
pub fn period_url(listing_base: &str, period: ReleasePeriod) -> String {
    format!("{}/{}/", listing_base.trim_end_matches('/'), period)
}

fn check_status(url: &str, response: HttpResponse) -> Result<Bytes, ListingError> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(ListingError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        })
    }
}

/// Fetch and parse the listing of one period, without retrying
pub async fn try_fetch_period<C: HttpClient>(
    client: &C,
    listing_base: &str,
    period: ReleasePeriod,
) -> Result<Vec<CatalogEntry>, ListingError> {
    let url = period_url(listing_base, period);

    let response = client
        .post(&url)
        .await
        .map_err(|e| ListingError::RequestFailed {
            url: url.clone(),
            source: e,
        })?;
    let body = check_status(&url, response)?;

    let names = parse_listing(&body).map_err(|e| ListingError::InvalidJson {
        url: url.clone(),
        source: e,
    })?;
    debug!(%period, files = names.len(), "Parsed period listing");

    Ok(names
        .into_iter()
        .map(|name| CatalogEntry::listed(name, period))
        .collect())
}

/// Fetch the listing of one period with retry
///
/// Exhausted retries yield an empty list, so one unreachable period never
/// aborts a multi-period sweep.
pub async fn fetch_period<C: HttpClient>(
    client: &C,
    listing_base: &str,
    period: ReleasePeriod,
    retry: &RetryPolicy,
) -> Vec<CatalogEntry> {
    let label = period.to_string();

    match retry
        .run(&label, || try_fetch_period(client, listing_base, period))
        .await
    {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                %period,
                error = %e,
                "Giving up on period listing; make sure the season folder exists and the network is reachable"
            );
            Vec::new()
        }
    }
}

/// Fetch and parse the latest-releases feed, without retrying
pub async fn try_fetch_release_feed<C: HttpClient>(
    client: &C,
    feed_url: &str,
) -> Result<Vec<FeedItem>, ListingError> {
    let response = client
        .get(feed_url)
        .await
        .map_err(|e| ListingError::RequestFailed {
            url: feed_url.to_string(),
            source: e,
        })?;
    let body = check_status(feed_url, response)?;

    parse_release_feed(&body).map_err(|e| ListingError::InvalidFeed {
        url: feed_url.to_string(),
        source: e,
    })
}

/// Fetch the latest-releases feed with retry, degrading to an empty list
pub async fn fetch_release_feed<C: HttpClient>(
    client: &C,
    feed_url: &str,
    retry: &RetryPolicy,
) -> Vec<FeedItem> {
    match retry
        .run(feed_url, || try_fetch_release_feed(client, feed_url))
        .await
    {
        Ok(items) => items,
        Err(e) => {
            warn!(url = %feed_url, error = %e, "Giving up on latest-releases feed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies per URL and counts requests
    #[derive(Default)]
    struct MockHttpClient {
        responses: HashMap<String, (u16, String)>,
        calls: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.responses
                .insert(url.to_string(), (status, body.to_string()));
            self
        }

        fn respond(&self, url: &str) -> HttpResponse {
            self.calls.lock().unwrap().push(url.to_string());
            let (status, body) = self
                .responses
                .get(url)
                .cloned()
                .unwrap_or((404, String::new()));
            HttpResponse {
                status,
                body: Bytes::from(body),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            Ok(self.respond(url))
        }

        async fn post(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            Ok(self.respond(url))
        }
    }

    const BASE: &str = "https://listing.test";
    const FEED: &str = "https://feed.test/latest.xml";

    #[test]
    fn period_url_has_trailing_slash() {
        let period = ReleasePeriod::new(2024, 4);
        assert_eq!(period_url(BASE, period), "https://listing.test/2024-4/");
        assert_eq!(
            period_url("https://listing.test/", period),
            "https://listing.test/2024-4/"
        );
    }

    #[tokio::test]
    async fn fetch_period_tags_entries_with_period() {
        let period = ReleasePeriod::new(2024, 1);
        let client = MockHttpClient::default().with(
            "https://listing.test/2024-1/",
            200,
            r#"{"files":[{"name":"[ANi] Show - 01 [1080P]"}]}"#,
        );

        let entries = fetch_period(&client, BASE, period, &RetryPolicy::immediate(3)).await;

        assert_eq!(
            entries,
            vec![CatalogEntry::listed("[ANi] Show - 01 [1080P]", period)]
        );
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn fetch_period_exhausts_retries_to_empty() {
        let period = ReleasePeriod::new(2024, 1);
        let client =
            MockHttpClient::default().with("https://listing.test/2024-1/", 500, "oops");

        let entries = fetch_period(&client, BASE, period, &RetryPolicy::immediate(3)).await;

        assert!(entries.is_empty());
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn try_fetch_period_reports_status() {
        let client = MockHttpClient::default();

        let err = try_fetch_period(&client, BASE, ReleasePeriod::new(2020, 7))
            .await
            .unwrap_err();

        match err {
            ListingError::HttpStatus { status, url } => {
                assert_eq!(status, 404);
                assert_eq!(url, "https://listing.test/2020-7/");
            }
            other => panic!("Expected HttpStatus error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn try_fetch_period_reports_malformed_json() {
        let client =
            MockHttpClient::default().with("https://listing.test/2020-7/", 200, "<html>");

        let err = try_fetch_period(&client, BASE, ReleasePeriod::new(2020, 7))
            .await
            .unwrap_err();

        assert!(matches!(err, ListingError::InvalidJson { .. }));
    }

    #[tokio::test]
    async fn fetch_release_feed_parses_items() {
        let client = MockHttpClient::default().with(
            FEED,
            200,
            r#"<rss version="2.0"><channel><title>t</title><link>l</link><description>d</description>
               <item><title>Ep</title><link>https://resources.ani.rip/x</link></item>
               </channel></rss>"#,
        );

        let items = fetch_release_feed(&client, FEED, &RetryPolicy::immediate(3)).await;

        assert_eq!(
            items,
            vec![FeedItem {
                title: "Ep".to_string(),
                link: "https://resources.ani.rip/x".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn fetch_release_feed_degrades_to_empty() {
        let client = MockHttpClient::default().with(FEED, 200, "not a feed");

        let items = fetch_release_feed(&client, FEED, &RetryPolicy::immediate(2)).await;

        assert!(items.is_empty());
        assert_eq!(client.call_count(), 2);
    }
}
