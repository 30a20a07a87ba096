use std::collections::HashMap;

use serde::Serialize;
use stock_types::ResolvedLine;

/// An item that was counted more than once in one transcript.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub item_id: String,
    /// Earlier quantities, in the order they were spoken.
    pub superseded: Vec<f64>,
    pub qty: f64,
}

/// Folded result of one transcript's matches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    pub lines: Vec<ResolvedLine>,
    pub corrections: Vec<Correction>,
}

#[derive(Default)]
struct Fold {
    lines: Vec<ResolvedLine>,
    positions: HashMap<String, usize>,
    superseded: HashMap<String, Vec<f64>>,
}

impl Fold {
    fn step(mut self, item_id: &str, qty: f64) -> Self {
        match self.positions.get(item_id) {
            Some(&pos) => {
                let line = &mut self.lines[pos];
                self.superseded
                    .entry(item_id.to_string())
                    .or_default()
                    .push(line.qty);
                line.qty = qty;
            }
            None => {
                self.positions.insert(item_id.to_string(), self.lines.len());
                self.lines.push(ResolvedLine {
                    item_id: item_id.to_string(),
                    qty,
                });
            }
        }
        self
    }

    fn finish(mut self) -> Resolution {
        let corrections = self
            .lines
            .iter()
            .filter_map(|line| {
                self.superseded
                    .remove(&line.item_id)
                    .map(|superseded| Correction {
                        item_id: line.item_id.clone(),
                        superseded,
                        qty: line.qty,
                    })
            })
            .collect();
        Resolution {
            lines: self.lines,
            corrections,
        }
    }
}

/// Fold ordered `(item id, quantity)` matches so the last mention of each item
/// wins, keeping the order in which items were first mentioned.
pub fn resolve_corrections<I, S>(matches: I) -> Resolution
where
    I: IntoIterator<Item = (S, f64)>,
    S: AsRef<str>,
{
    matches
        .into_iter()
        .fold(Fold::default(), |fold, (item_id, qty)| {
            fold.step(item_id.as_ref(), qty)
        })
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_mention_wins_in_first_mention_order() {
        let resolution = resolve_corrections([
            ("avocado", 5.0),
            ("tofu", 2.0),
            ("avocado", 3.0),
            ("avocado", 4.0),
        ]);
        let lines: Vec<(&str, f64)> = resolution
            .lines
            .iter()
            .map(|l| (l.item_id.as_str(), l.qty))
            .collect();
        assert_eq!(lines, vec![("avocado", 4.0), ("tofu", 2.0)]);
        assert_eq!(
            resolution.corrections,
            vec![Correction {
                item_id: "avocado".into(),
                superseded: vec![5.0, 3.0],
                qty: 4.0,
            }]
        );
    }

    #[test]
    fn empty_input_resolves_to_nothing() {
        let resolution = resolve_corrections(Vec::<(String, f64)>::new());
        assert_eq!(resolution, Resolution::default());
    }

    #[test]
    fn later_zero_replaces_count() {
        let resolution = resolve_corrections([("cucumber", 4.0), ("cucumber", 0.0)]);
        assert_eq!(resolution.lines.len(), 1);
        assert_eq!(resolution.lines[0].qty, 0.0);
    }
}
