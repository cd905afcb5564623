// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::Deserialize;

use crate::period::ReleasePeriod;

/// One discovered episode, as advertised by the remote source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Raw file name, also the ledger key
    pub name: String,
    /// Direct link, only present for entries from the latest-releases feed
    pub url: Option<String>,
    /// Owning release period, only present for entries from a period listing
    pub period: Option<ReleasePeriod>,
}

impl CatalogEntry {
    /// Entry discovered in the directory listing of `period`
    pub fn listed(name: impl Into<String>, period: ReleasePeriod) -> Self {
        Self {
            name: name.into(),
            url: None,
            period: Some(period),
        }
    }

    /// Entry discovered in the latest-releases feed
    pub fn linked(name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            url,
            period: None,
        }
    }
}

/// One `<item>` of the latest-releases feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
struct DirectoryListing {
    files: Vec<ListedFile>,
}

#[derive(Debug, Deserialize)]
struct ListedFile {
    name: String,
}

/// Parse a directory listing body (`{"files": [{"name": ...}, ...]}`) into file names
///
/// Any other fields on the listing or its files are ignored.
pub fn parse_listing(body: &[u8]) -> Result<Vec<String>, serde_json::Error> {
    let listing: DirectoryListing = serde_json::from_slice(body)?;
    Ok(listing.files.into_iter().map(|file| file.name).collect())
}

/// Parse the latest-releases RSS document into its items
///
/// Missing `title` or `link` elements become empty strings.
pub fn parse_release_feed(body: &[u8]) -> Result<Vec<FeedItem>, rss::Error> {
    let channel = rss::Channel::read_from(body)?;

    Ok(channel
        .items()
        .iter()
        .map(|item| FeedItem {
            title: item.title().unwrap_or_default().trim().to_string(),
            link: item.link().unwrap_or_default().trim().to_string(),
        })
        .collect())
}
