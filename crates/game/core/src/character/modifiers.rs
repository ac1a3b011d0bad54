//! Time-bounded stat modifiers keyed by sheet path.

use std::collections::BTreeMap;

use crate::types::Timestamp;

/// A temporary adjustment to one sheet path.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifier {
    pub path: String,
    pub amount: f64,
    /// Last instant at which the modifier still applies.
    pub expires_at: Timestamp,
    /// Who granted it. A newer modifier from the same source replaces the old one.
    pub source: String,
}

impl Modifier {
    pub fn new(
        path: impl Into<String>,
        amount: f64,
        expires_at: Timestamp,
        source: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            amount,
            expires_at,
            source: source.into(),
        }
    }
}

/// Entry stored per path; the path itself is the map key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveModifier {
    pub amount: f64,
    pub expires_at: Timestamp,
    pub source: String,
}

/// Modifiers grouped by exact sheet path.
///
/// Invariant: at most one entry per (path, source), and no path maps to an
/// empty list.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierSet {
    by_path: BTreeMap<String, Vec<ActiveModifier>>,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds modifiers; each replaces any existing entry from the same source.
    pub fn add(&mut self, modifiers: impl IntoIterator<Item = Modifier>) {
        for modifier in modifiers {
            let entries = self.by_path.entry(modifier.path).or_default();
            entries.retain(|existing| existing.source != modifier.source);
            entries.push(ActiveModifier {
                amount: modifier.amount,
                expires_at: modifier.expires_at,
                source: modifier.source,
            });
        }
    }

    /// Drops everything that expired before `now`.
    pub fn prune(&mut self, now: Timestamp) {
        self.by_path.retain(|_, entries| {
            entries.retain(|entry| entry.expires_at >= now);
            !entries.is_empty()
        });
    }

    /// Sum of modifiers registered for exactly `path`.
    pub fn sum(&self, path: &str) -> f64 {
        self.by_path
            .get(path)
            .map(|entries| entries.iter().map(|entry| entry.amount).sum())
            .unwrap_or(0.0)
    }

    pub fn get(&self, path: &str) -> Option<&[ActiveModifier]> {
        self.by_path.get(path).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_path.values().map(Vec::len).sum()
    }
}
