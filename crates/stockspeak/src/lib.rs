//! Turn dictated stock counts into catalog lines.
//!
//! A transcript such as `"ten avocado, three red onions and out of cucumber"`
//! goes through normalization, segment extraction, catalog matching and a
//! last-mention-wins fold, and comes out as one `{itemId, qty, flag}` line per
//! item. [`InventoryParser`] owns a catalog snapshot and its index;
//! [`IndexCache`] keeps built parsers per location for the HTTP host.

pub mod cache;
pub mod handlers;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod numbers;
pub mod parser;
pub mod resolve;
pub mod segment;

pub use cache::IndexCache;
pub use handlers::{AppState, SERVER_CATALOG_KEY, router};
pub use index::{CatalogIndex, KeySource};
pub use matcher::match_phrase;
pub use normalize::normalize;
pub use parser::{InventoryParser, SpeechAnalysis, parse_speech_to_lines};
pub use resolve::{Correction, Resolution, resolve_corrections};
pub use segment::{Continuation, Extraction, SegmentStrategy, extract_segments};
