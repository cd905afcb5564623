mod fetch;
mod parse;

pub use fetch::{
    DEFAULT_LISTING_BASE, DEFAULT_RELEASE_FEED, fetch_period, fetch_release_feed, period_url,
    try_fetch_period, try_fetch_release_feed,
};
pub use parse::{CatalogEntry, FeedItem, parse_listing, parse_release_feed};
