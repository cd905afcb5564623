mod link;
mod name;
mod write;

pub use link::{
    BACKING_HOST, PLAYABLE_EXTENSION, PLAYABLE_QUERY, SOURCE_HOST, canonicalize, is_canonical,
    normalize_link, period_file_link,
};
pub use name::extract_series_name;
pub use write::{DESCRIPTOR_EXTENSION, DescriptorWriter, WriteOutcome};
