use std::collections::HashMap;
use std::collections::hash_map::Entry;

use stock_morphy::Singularizer;
use stock_types::CatalogItem;
use tracing::{info, warn};

use crate::normalize::{compact, normalize};
use crate::segment::is_filler;

/// Which catalog field a key came from. Name keys outrank synonym keys, and
/// both outrank derived variant keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum KeySource {
    /// Plural spelling or filler-free form of a name or synonym.
    Variant,
    Synonym,
    Name,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    item_id: String,
    source: KeySource,
}

/// Canonical and compact catalog terms mapped to item ids.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    exact: HashMap<String, IndexEntry>,
    compact: HashMap<String, IndexEntry>,
    singularizer: Singularizer,
}

impl CatalogIndex {
    pub fn build(items: &[CatalogItem]) -> Self {
        Self::build_with(items, Singularizer::new())
    }

    pub fn build_with(items: &[CatalogItem], singularizer: Singularizer) -> Self {
        let mut index = Self {
            exact: HashMap::new(),
            compact: HashMap::new(),
            singularizer,
        };

        for item in items {
            let mut name_key = index.canonical(item.display_name());
            if name_key.is_empty() {
                name_key = index.canonical(&item.id);
            }
            if name_key.is_empty() {
                warn!("catalog item {:?} has no usable name or id", item.id);
            } else {
                index.register(&name_key, &item.id, KeySource::Name);
            }

            let mut terms = vec![item.display_name()];
            for synonym in &item.synonyms {
                let key = index.canonical(synonym);
                if !key.is_empty() {
                    index.register(&key, &item.id, KeySource::Synonym);
                    terms.push(synonym.as_str());
                }
            }

            for term in terms {
                for key in index.variant_keys(term) {
                    index.register(&key, &item.id, KeySource::Variant);
                }
            }
        }

        info!(
            "indexed {} catalog items under {} keys ({} compact)",
            items.len(),
            index.exact.len(),
            index.compact.len()
        );
        index
    }

    /// Normalized, singularized form used for every key and every lookup.
    pub fn canonical(&self, text: &str) -> String {
        self.singularizer.singular_phrase(&normalize(text))
    }

    /// Extra keys for a catalog term: the canonical form of each spelling of
    /// its last word ("smoothies" reduces to "smoothy", not "smoothie"), and
    /// the term with filler words removed, as spoken phrases never carry them.
    fn variant_keys(&self, term: &str) -> Vec<String> {
        let normalized = normalize(term);
        let primary = self.canonical(&normalized);
        let mut keys: Vec<String> = Vec::new();
        let mut push = |key: String| {
            if !key.is_empty() && key != primary && !keys.contains(&key) {
                keys.push(key);
            }
        };

        let (head, last) = match normalized.rsplit_once(' ') {
            Some((head, last)) => (Some(head), last),
            None => (None, normalized.as_str()),
        };
        for variant in self.singularizer.variants(last) {
            let spelled = match head {
                Some(head) => format!("{head} {}", variant.text),
                None => variant.text.into_owned(),
            };
            push(self.canonical(&spelled));
        }

        let unfilled: Vec<&str> = primary
            .split_whitespace()
            .filter(|word| !is_filler(word))
            .collect();
        push(unfilled.join(" "));
        keys
    }

    pub fn singularizer(&self) -> &Singularizer {
        &self.singularizer
    }

    /// Look up an already canonical phrase, exact form first.
    pub fn lookup(&self, canonical: &str) -> Option<&str> {
        self.lookup_exact(canonical)
            .or_else(|| self.lookup_compact(canonical))
    }

    pub fn lookup_exact(&self, canonical: &str) -> Option<&str> {
        self.exact.get(canonical).map(|e| e.item_id.as_str())
    }

    pub fn lookup_compact(&self, canonical: &str) -> Option<&str> {
        self.compact
            .get(&compact(canonical))
            .map(|e| e.item_id.as_str())
    }

    /// Number of exact keys.
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    fn register(&mut self, key: &str, item_id: &str, source: KeySource) {
        let compact_key = compact(key);
        insert_key(&mut self.exact, key, item_id, source);
        if !compact_key.is_empty() {
            insert_key(&mut self.compact, &compact_key, item_id, source);
        }
    }
}

/// Insert with a deterministic collision policy: a key never displaces
/// another item's key of higher rank (name over synonym over variant);
/// otherwise the later registration wins.
fn insert_key(
    map: &mut HashMap<String, IndexEntry>,
    key: &str,
    item_id: &str,
    source: KeySource,
) {
    match map.entry(key.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(IndexEntry {
                item_id: item_id.to_string(),
                source,
            });
        }
        Entry::Occupied(mut slot) => {
            let existing = slot.get_mut();
            if existing.item_id == item_id {
                existing.source = existing.source.max(source);
                return;
            }
            if source < existing.source {
                warn!(
                    "{source:?} key {key:?} of {item_id} collides with {:?} of {}; keeping it",
                    existing.source, existing.item_id
                );
                return;
            }
            warn!(
                "key {key:?} moves from {} to {item_id} (later {source:?} wins)",
                existing.item_id
            );
            *existing = IndexEntry {
                item_id: item_id.to_string(),
                source,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new("green-onion", "Green Onion").with_synonyms(["scallion"]),
            CatalogItem::new("onion", "Onion"),
            CatalogItem::new("edamame", "Edamame"),
            CatalogItem::new("berries", "Mixed Berries"),
        ]
    }

    #[test]
    fn indexes_names_and_synonyms_canonically() {
        let index = CatalogIndex::build(&catalog());
        assert_eq!(index.lookup("green onion"), Some("green-onion"));
        assert_eq!(index.lookup("scallion"), Some("green-onion"));
        assert_eq!(index.lookup("onion"), Some("onion"));
        assert_eq!(index.lookup("mixed berry"), Some("berries"));
        assert_eq!(index.lookup("tofu"), None);
    }

    #[test]
    fn compact_keys_bridge_spacing() {
        let index = CatalogIndex::build(&catalog());
        assert_eq!(index.lookup_exact("greenonion"), None);
        assert_eq!(index.lookup("greenonion"), Some("green-onion"));
        let index = CatalogIndex::build(&[CatalogItem::new("edamame", "Eda-Mame")]);
        assert_eq!(index.lookup("edamame"), Some("edamame"));
    }

    #[test]
    fn synonym_never_displaces_another_name() {
        let items = vec![
            CatalogItem::new("onion", "Onion"),
            CatalogItem::new("shallot", "Shallot").with_synonyms(["onion"]),
        ];
        let index = CatalogIndex::build(&items);
        assert_eq!(index.lookup("onion"), Some("onion"));

        let reversed = vec![
            CatalogItem::new("shallot", "Shallot").with_synonyms(["onion"]),
            CatalogItem::new("onion", "Onion"),
        ];
        let index = CatalogIndex::build(&reversed);
        assert_eq!(index.lookup("onion"), Some("onion"));
    }

    #[test]
    fn later_synonym_wins_between_synonyms() {
        let items = vec![
            CatalogItem::new("lime", "Lime").with_synonyms(["citrus"]),
            CatalogItem::new("lemon", "Lemon").with_synonyms(["citrus"]),
        ];
        let index = CatalogIndex::build(&items);
        assert_eq!(index.lookup("citrus"), Some("lemon"));
    }

    #[test]
    fn registers_plural_and_filler_free_keys() {
        let items = vec![
            CatalogItem::new("smoothie", "Smoothie"),
            CatalogItem::new("quiche", "Quiche"),
            CatalogItem::new("aloe", "Aloe"),
            CatalogItem::new("mac-cheese", "Mac and Cheese"),
        ];
        let index = CatalogIndex::build(&items);
        assert_eq!(index.lookup(&index.canonical("smoothies")), Some("smoothie"));
        assert_eq!(index.lookup(&index.canonical("quiches")), Some("quiche"));
        assert_eq!(index.lookup(&index.canonical("aloes")), Some("aloe"));
        assert_eq!(index.lookup("mac and cheese"), Some("mac-cheese"));
        assert_eq!(index.lookup("mac cheese"), Some("mac-cheese"));
    }

    #[test]
    fn variant_keys_never_displace_names() {
        let items = vec![
            CatalogItem::new("quich", "Quich"),
            CatalogItem::new("quiche", "Quiche"),
        ];
        let index = CatalogIndex::build(&items);
        assert_eq!(index.lookup("quich"), Some("quich"));
        assert_eq!(index.lookup("quiche"), Some("quiche"));
    }

    #[test]
    fn nameless_items_fall_back_to_id() {
        let index = CatalogIndex::build(&[CatalogItem::new("bok-choy", "")]);
        assert_eq!(index.lookup("bok choy"), Some("bok-choy"));
        assert_eq!(index.len(), 1);
        assert!(CatalogIndex::build(&[]).is_empty());
    }
}
