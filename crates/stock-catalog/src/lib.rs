//! Load catalog snapshots and location overrides exported by the catalog store.
//!
//! This crate is the ingestion boundary: records come in the shape the store
//! exports them (optional names, synonyms as a list, a single delimited string
//! or `null`) and leave as uniform [`CatalogItem`]s. Nothing downstream has to
//! care how the store spelled a synonym field.
//!
//! # Features
//! - Synonym normalization: `"scallion; spring onion"` and
//!   `["scallion", "spring onion"]` produce the same list.
//! - Tolerant records: entries without an id are skipped with a warning
//!   instead of failing the whole snapshot.
//! - Fingerprints: [`Catalog::fingerprint`] changes whenever any item, name or
//!   synonym changes, so caches keyed on it never serve a stale index.
//! - Overrides: per-location `lowThreshold` maps, either as
//!   `{"tofu": {"lowThreshold": 10}}` or the bare `{"tofu": 10}`.
//!
//! # Example
//! ```no_run
//! use stock_catalog::{Catalog, load_location_overrides};
//!
//! # fn main() -> anyhow::Result<()> {
//! let catalog = Catalog::load("catalog.json")?;
//! let overrides = load_location_overrides("overrides.json")?;
//! println!(
//!     "{} items, {} locations with overrides, fingerprint {:016x}",
//!     catalog.len(),
//!     overrides.len(),
//!     catalog.fingerprint()
//! );
//! # Ok(()) }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use stock_types::{CatalogItem, LocationOverrides};
use tracing::{debug, warn};

/// Characters that separate synonyms packed into one string.
const SYNONYM_DELIMITERS: &[char] = &[',', ';', '|'];

/// Synonym field as exported by the store.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum SynonymField {
    Joined(String),
    List(Vec<Option<String>>),
}

/// One catalog record before normalization.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalogRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub synonyms: Option<SynonymField>,
    pub default_unit: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Items(Vec<RawCatalogRecord>),
    Wrapped { items: Vec<RawCatalogRecord> },
}

/// Immutable catalog snapshot with normalized synonyms.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Read a snapshot from a JSON file (an array of records, or
    /// `{"items": [...]}`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read catalog file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parse catalog file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let doc: CatalogDocument = serde_json::from_str(text).context("decode catalog JSON")?;
        let records = match doc {
            CatalogDocument::Items(items) | CatalogDocument::Wrapped { items } => items,
        };
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: impl IntoIterator<Item = RawCatalogRecord>) -> Self {
        let mut items = Vec::new();
        let mut seen_ids = HashSet::new();
        for (pos, record) in records.into_iter().enumerate() {
            let Some(item) = normalize_record(record) else {
                warn!("skipping catalog record {pos}: missing id");
                continue;
            };
            if !seen_ids.insert(item.id.clone()) {
                warn!("catalog record {pos} repeats id {}; later record wins", item.id);
                items.retain(|existing: &CatalogItem| existing.id != item.id);
            }
            items.push(item);
        }
        debug!("normalized {} catalog items", items.len());
        Self { items }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CatalogItem> {
        self.items
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Order-sensitive hash of the snapshot. Only meaningful within one
    /// process.
    pub fn fingerprint(&self) -> u64 {
        fingerprint(&self.items)
    }
}

impl From<Vec<CatalogItem>> for Catalog {
    fn from(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }
}

/// Order-sensitive hash of a list of catalog items.
pub fn fingerprint(items: &[CatalogItem]) -> u64 {
    let mut hasher = DefaultHasher::new();
    items.hash(&mut hasher);
    hasher.finish()
}

fn normalize_record(record: RawCatalogRecord) -> Option<CatalogItem> {
    let id = record.id.map(|id| id.trim().to_string())?;
    if id.is_empty() {
        return None;
    }
    let name = record
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| id.clone());
    Some(CatalogItem {
        id,
        name,
        synonyms: record.synonyms.map(normalize_synonyms).unwrap_or_default(),
        default_unit: record
            .default_unit
            .map(|unit| unit.trim().to_string())
            .filter(|unit| !unit.is_empty()),
    })
}

/// Flatten a synonym field into a list: split joined strings, trim, drop
/// blanks and case-insensitive duplicates, keep first-seen order.
pub fn normalize_synonyms(field: SynonymField) -> Vec<String> {
    let raw: Vec<String> = match field {
        SynonymField::Joined(joined) => joined
            .split(SYNONYM_DELIMITERS)
            .map(str::to_string)
            .collect(),
        SynonymField::List(list) => list.into_iter().flatten().collect(),
    };
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

/// Read `{"<locationId>": {"<itemId>": threshold}}` where each threshold is a
/// number or `{"lowThreshold": number}`. A missing file means no overrides.
pub fn load_location_overrides(
    path: impl AsRef<Path>,
) -> Result<HashMap<String, LocationOverrides>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("read overrides file {}", path.display()))?;
    let doc: HashMap<String, Value> = serde_json::from_str(&text)
        .with_context(|| format!("parse overrides file {}", path.display()))?;
    Ok(doc
        .into_iter()
        .map(|(location, value)| {
            let overrides = overrides_from_value(&value);
            debug!("location {location}: {} overrides", overrides.len());
            (location, overrides)
        })
        .collect())
}

/// Decode one location's `{"<itemId>": threshold}` map, ignoring entries
/// without a numeric threshold.
pub fn overrides_from_value(value: &Value) -> LocationOverrides {
    let Some(map) = value.as_object() else {
        warn!("location overrides are not an object; ignoring");
        return LocationOverrides::new();
    };
    let mut overrides = LocationOverrides::new();
    for (item_id, entry) in map {
        let low = match entry {
            Value::Number(n) => n.as_f64(),
            Value::Object(fields) => fields.get("lowThreshold").and_then(Value::as_f64),
            _ => None,
        };
        match low {
            Some(low) if low.is_finite() => overrides.set(item_id.clone(), low),
            _ => debug!("ignoring non-numeric threshold for {item_id}"),
        }
    }
    overrides
}
