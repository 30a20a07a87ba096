use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use stock_catalog::fingerprint;
use stock_morphy::Singularizer;
use stock_types::CatalogItem;
use tracing::{debug, info};

use crate::parser::InventoryParser;

#[derive(Clone)]
struct CachedParser {
    fingerprint: u64,
    parser: Arc<InventoryParser>,
}

/// Built parsers keyed by location (or any caller-chosen key).
///
/// A lookup whose catalog differs from the cached snapshot rebuilds the
/// parser in full.
pub struct IndexCache {
    entries: DashMap<String, CachedParser>,
    singularizer: Singularizer,
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(Singularizer::new())
    }
}

impl IndexCache {
    pub fn new(singularizer: Singularizer) -> Self {
        Self {
            entries: DashMap::new(),
            singularizer,
        }
    }

    pub fn parser_for(&self, key: &str, catalog: &[CatalogItem]) -> Arc<InventoryParser> {
        let fp = fingerprint(catalog);
        if let Some(entry) = self.entries.get(key)
            && entry.fingerprint == fp
            && entry.parser.catalog() == catalog
        {
            return Arc::clone(&entry.parser);
        }

        let start = Instant::now();
        let parser = Arc::new(InventoryParser::with_singularizer(
            catalog.to_vec(),
            self.singularizer.clone(),
        ));
        info!(
            "built parser for {key:?} ({} items) in {} us",
            catalog.len(),
            start.elapsed().as_micros()
        );
        self.entries.insert(
            key.to_string(),
            CachedParser {
                fingerprint: fp,
                parser: Arc::clone(&parser),
            },
        );
        parser
    }

    /// Build a parser with this cache's singularizer without storing it, for
    /// catalogs that arrive with a single request.
    pub fn build_uncached(&self, catalog: Vec<CatalogItem>) -> InventoryParser {
        let start = Instant::now();
        let parser = InventoryParser::with_singularizer(catalog, self.singularizer.clone());
        debug!(
            "built one-off parser ({} items) in {} us",
            parser.catalog().len(),
            start.elapsed().as_micros()
        );
        parser
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
