//! Shared types for resolving dictated stock counts against a catalog.
//!
//! The catalog side ([`CatalogItem`], [`LocationOverrides`]) is owned by an
//! external store and only consumed here. Everything else ([`ParsedSegment`],
//! [`ResolvedLine`], [`FlaggedLine`]) lives for the duration of one parse
//! call. [`classify`] maps a quantity to a [`StockFlag`].
//!
//! ```rust
//! use stock_types::{StockFlag, classify};
//!
//! assert_eq!(classify(0.0, Some(10.0)), StockFlag::Out);
//! assert_eq!(classify(5.0, None), StockFlag::Low);
//! assert_eq!(classify(6.0, None), StockFlag::Ok);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Quantity at or below which an item is flagged [`StockFlag::Low`] when no
/// location override exists.
pub const DEFAULT_LOW: f64 = 5.0;

/// One catalog entry as seen by the parser.
///
/// Synonyms are already split into a list; see `stock-catalog` for the
/// ingestion boundary that accepts delimiter-joined strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_unit: Option<String>,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            synonyms: Vec::new(),
            default_unit: None,
        }
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }

    /// Name used for display and as the primary match key; falls back to the
    /// id for nameless records.
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { self.id.trim() } else { name }
    }

    /// Primary name followed by every synonym.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.display_name()).chain(self.synonyms.iter().map(String::as_str))
    }
}

/// A quantity paired with the phrase that followed it, before catalog lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedSegment {
    pub quantity: f64,
    pub phrase: String,
}

/// Final `(item, quantity)` assignment; at most one per item per parse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLine {
    pub item_id: String,
    pub qty: f64,
}

/// A resolved line with its stock flag attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedLine {
    pub item_id: String,
    pub qty: f64,
    pub flag: StockFlag,
}

/// Stock severity for a counted item.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockFlag {
    Ok,
    Low,
    Out,
}

impl StockFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            StockFlag::Ok => "ok",
            StockFlag::Low => "low",
            StockFlag::Out => "out",
        }
    }
}

impl fmt::Display for StockFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a quantity against an optional low threshold.
///
/// Anything at or below zero is `Out` whatever the threshold says. NaN is
/// treated as `Out` as well.
pub fn classify(qty: f64, low: Option<f64>) -> StockFlag {
    if qty.is_nan() || qty <= 0.0 {
        return StockFlag::Out;
    }
    if qty <= low.unwrap_or(DEFAULT_LOW) {
        StockFlag::Low
    } else {
        StockFlag::Ok
    }
}

/// Per-item low thresholds configured for one location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationOverrides {
    thresholds: HashMap<String, f64>,
}

impl LocationOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, item_id: impl Into<String>, low_threshold: f64) {
        self.thresholds.insert(item_id.into(), low_threshold);
    }

    pub fn low_for(&self, item_id: &str) -> Option<f64> {
        self.thresholds.get(item_id).copied()
    }

    /// Override entries from `other` win over ours.
    pub fn merge(&mut self, other: &LocationOverrides) {
        for (id, low) in &other.thresholds {
            self.thresholds.insert(id.clone(), *low);
        }
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Flag a resolved line, preferring this location's threshold for the item.
    pub fn flag(&self, line: &ResolvedLine) -> FlaggedLine {
        FlaggedLine {
            item_id: line.item_id.clone(),
            qty: line.qty,
            flag: classify(line.qty, self.low_for(&line.item_id)),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for LocationOverrides {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self {
            thresholds: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
