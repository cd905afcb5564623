use std::sync::LazyLock;

use regex::Regex;

/// Separator between series title and episode number in release names
const EPISODE_SEPARATOR: &str = " - ";

static LEADING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[.*?\]\s*").expect("valid leading tag pattern"));

static BRACKETED_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("valid bracket pattern"));

/// Extract the series title from a noisy release file name
///
/// `[ANi] 葬送的芙莉蓮 - 02 [1080P][Baha][WEB-DL][AAC AVC][CHT]` becomes `葬送的芙莉蓮`.
/// The leading group tag is dropped, everything from the first ` - ` on is dropped,
/// remaining bracketed groups are removed. Falls back to the raw name when nothing
/// is left.
pub fn extract_series_name(file_name: &str) -> String {
    let name = LEADING_TAG.replace(file_name, "");

    let name = match name.split_once(EPISODE_SEPARATOR) {
        Some((title, _)) => title.trim(),
        None => name.as_ref(),
    };

    let name = BRACKETED_GROUP.replace_all(name, "");
    let name = name.trim();

    if name.is_empty() {
        file_name.to_string()
    } else {
        name.to_string()
    }
}
