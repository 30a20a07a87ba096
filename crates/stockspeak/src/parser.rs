use std::collections::HashSet;

use serde::Serialize;
use stock_morphy::Singularizer;
use stock_types::{CatalogItem, FlaggedLine, LocationOverrides, ResolvedLine};
use tracing::debug;

use crate::index::CatalogIndex;
use crate::matcher::match_phrase;
use crate::resolve::{Correction, Resolution, resolve_corrections};
use crate::segment::extract_segments;

/// A catalog snapshot with its index, ready to parse transcripts.
///
/// Immutable once built; share it behind an `Arc` and rebuild when the
/// catalog changes.
#[derive(Debug, Clone)]
pub struct InventoryParser {
    catalog: Vec<CatalogItem>,
    index: CatalogIndex,
}

/// Everything the confirmation step needs to show for one transcript.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAnalysis {
    pub lines: Vec<FlaggedLine>,
    /// `"<qty> <item name>"` for each line, in line order.
    pub recognized: Vec<String>,
    /// Phrases that matched no item and text spoken outside any count.
    pub unrecognized: Vec<String>,
    pub corrections: Vec<Correction>,
}

struct Run {
    resolution: Resolution,
    unrecognized: Vec<String>,
}

impl InventoryParser {
    pub fn new(catalog: Vec<CatalogItem>) -> Self {
        Self::with_singularizer(catalog, Singularizer::new())
    }

    pub fn with_singularizer(catalog: Vec<CatalogItem>, singularizer: Singularizer) -> Self {
        let index = CatalogIndex::build_with(&catalog, singularizer);
        Self { catalog, index }
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// Resolve a transcript into at most one line per item.
    pub fn parse(&self, transcript: &str) -> Vec<ResolvedLine> {
        self.run(transcript).resolution.lines
    }

    /// [`parse`](Self::parse) plus a stock flag per line, using the
    /// location's thresholds where set.
    pub fn parse_flagged(
        &self,
        transcript: &str,
        overrides: &LocationOverrides,
    ) -> Vec<FlaggedLine> {
        self.parse(transcript)
            .iter()
            .map(|line| overrides.flag(line))
            .collect()
    }

    pub fn analyze(&self, transcript: &str, overrides: &LocationOverrides) -> SpeechAnalysis {
        let run = self.run(transcript);
        let recognized = run
            .resolution
            .lines
            .iter()
            .map(|line| {
                let name = self
                    .catalog
                    .iter()
                    .find(|item| item.id == line.item_id)
                    .map_or(line.item_id.as_str(), CatalogItem::display_name);
                format!("{} {}", line.qty, name)
            })
            .collect();
        SpeechAnalysis {
            lines: run
                .resolution
                .lines
                .iter()
                .map(|line| overrides.flag(line))
                .collect(),
            recognized,
            unrecognized: run.unrecognized,
            corrections: run.resolution.corrections,
        }
    }

    fn run(&self, transcript: &str) -> Run {
        if transcript.trim().is_empty() {
            return Run {
                resolution: Resolution::default(),
                unrecognized: Vec::new(),
            };
        }

        let extraction = extract_segments(transcript);
        let mut absorbed = HashSet::new();
        let mut unmatched = Vec::new();
        let mut matches: Vec<(&str, f64)> = Vec::with_capacity(extraction.segments.len());
        for (pos, segment) in extraction.segments.iter().enumerate() {
            let plain = match_phrase(&segment.phrase, &self.index, &self.catalog);
            // Prefer "mac and cheese" over "mac" only when it names another item.
            let joined = extraction
                .continuations
                .iter()
                .filter(|c| c.segment == pos)
                .find_map(|c| {
                    let item_id = match_phrase(&c.phrase, &self.index, &self.catalog)?;
                    (Some(item_id) != plain).then_some((item_id, c))
                });
            let matched = match joined {
                Some((item_id, continuation)) => {
                    debug!("{:?} reads as {:?}", segment.phrase, continuation.phrase);
                    absorbed.insert(continuation.unanchored);
                    Some(item_id)
                }
                None => plain,
            };
            match matched {
                Some(item_id) => {
                    debug!("{} {:?} -> {item_id}", segment.quantity, segment.phrase);
                    matches.push((item_id, segment.quantity));
                }
                None => {
                    debug!("no catalog match for {:?}", segment.phrase);
                    unmatched.push(segment.phrase.clone());
                }
            }
        }

        let unrecognized = extraction
            .unanchored
            .into_iter()
            .enumerate()
            .filter(|(pos, _)| !absorbed.contains(pos))
            .map(|(_, text)| text)
            .chain(unmatched)
            .collect();

        Run {
            resolution: resolve_corrections(matches),
            unrecognized,
        }
    }
}

/// One-shot parse that builds a fresh index for `catalog`.
pub fn parse_speech_to_lines(transcript: &str, catalog: &[CatalogItem]) -> Vec<ResolvedLine> {
    if transcript.trim().is_empty() {
        return Vec::new();
    }
    InventoryParser::new(catalog.to_vec()).parse(transcript)
}
