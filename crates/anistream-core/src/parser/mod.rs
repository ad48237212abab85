//! HTML parsers for the scraped sites
//!
//! Site-specific listing parsers plus the shared video-source heuristics
//! and title matching.

pub mod hanime;
pub mod matching;
pub mod video;
pub mod yhdm;

pub use matching::{best_match, edit_distance, normalize_title, strip_season_markers};
pub use video::{ExtractedSource, ExtractionMethod, MediaTag, extract_inline_source};
