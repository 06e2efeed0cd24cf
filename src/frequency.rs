use crate::error::CorruptTableError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Occurrence counts of each distinct symbol, in first-seen order.
///
/// The order matters: tree construction breaks frequency ties by it, so the
/// same input always yields the same tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "RawFrequencyTable<Symbol>",
    bound(deserialize = "Symbol: Deserialize<'de> + Eq + Hash")
)]
pub struct FrequencyTable<Symbol> {
    counts: Vec<(Symbol, usize)>,
}

#[derive(Deserialize)]
struct RawFrequencyTable<Symbol> {
    counts: Vec<(Symbol, usize)>,
}

impl<Symbol> TryFrom<RawFrequencyTable<Symbol>> for FrequencyTable<Symbol>
where
    Symbol: Eq + Hash,
{
    type Error = CorruptTableError;

    fn try_from(raw: RawFrequencyTable<Symbol>) -> Result<Self, Self::Error> {
        let mut seen = HashSet::new();
        for (s, count) in &raw.counts {
            if *count == 0 {
                return Err(CorruptTableError::ZeroCount);
            }
            if !seen.insert(s) {
                return Err(CorruptTableError::DuplicateSymbol);
            }
        }

        Ok(Self { counts: raw.counts })
    }
}

impl<Symbol> FrequencyTable<Symbol>
where
    Symbol: Eq + Hash + Clone,
{
    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut index: HashMap<Symbol, usize> = HashMap::new();
        let mut counts: Vec<(Symbol, usize)> = Vec::new();

        for s in symbols {
            match index.get(&s) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(s.clone(), counts.len());
                    counts.push((s, 1));
                }
            }
        }

        Self { counts }
    }

    pub fn get(&self, symbol: &Symbol) -> Option<usize> {
        self.counts
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|&(_, c)| c)
    }
}

impl<Symbol> FrequencyTable<Symbol> {
    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the input length.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|&(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, usize)> {
        self.counts.iter().map(|(s, c)| (s, *c))
    }
}
