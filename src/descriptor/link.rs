use crate::period::ReleasePeriod;

/// Host the release feed links to
pub const SOURCE_HOST: &str = "resources.ani.rip";

/// Host that serves the same files directly
pub const BACKING_HOST: &str = "openani.an-i.workers.dev";

/// Extension the player expects on a playable resource
pub const PLAYABLE_EXTENSION: &str = ".mp4";

/// Query marker asking the worker for the raw file
pub const PLAYABLE_QUERY: &str = "?d=true";

/// Older query-based spelling of the extension
const ALT_EXTENSION_QUERY: &str = "?d=mp4";

/// Whether `url` already ends in `.mp4?d=true`
pub fn is_canonical(url: &str) -> bool {
    url.strip_suffix(PLAYABLE_QUERY)
        .is_some_and(|rest| rest.ends_with(PLAYABLE_EXTENSION))
}

/// Rewrite a link into the `.mp4?d=true` form, leaving its host untouched
pub fn canonicalize(url: &str) -> String {
    if is_canonical(url) {
        url.to_string()
    } else if url.contains(ALT_EXTENSION_QUERY) {
        url.replace(
            ALT_EXTENSION_QUERY,
            &format!("{PLAYABLE_EXTENSION}{PLAYABLE_QUERY}"),
        )
    } else if url.ends_with(PLAYABLE_EXTENSION) {
        format!("{url}{PLAYABLE_QUERY}")
    } else {
        format!("{url}{PLAYABLE_EXTENSION}{PLAYABLE_QUERY}")
    }
}

/// Normalize a raw feed link: point it at the backing host, then canonicalize
///
/// Idempotent: normalizing an already normalized link returns it unchanged.
pub fn normalize_link(raw: &str) -> String {
    canonicalize(&raw.replace(SOURCE_HOST, BACKING_HOST))
}

/// Build the playable URL of a file from a period listing
///
/// The file name is percent-encoded as a single path segment.
pub fn period_file_link(listing_base: &str, period: ReleasePeriod, file_name: &str) -> String {
    format!(
        "{}/{}/{}{PLAYABLE_EXTENSION}{PLAYABLE_QUERY}",
        listing_base.trim_end_matches('/'),
        period,
        urlencoding::encode(file_name)
    )
}
