//! Tracked substances and the registry that holds them.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

/// The identifier a substance is queried by in the metrics backend.
pub type SubstanceId = u32;

/// Concentration, in percent of the regulatory limit, at which a substance
/// counts as over the limit.
pub const LIMIT_PCT: i64 = 100;

/// A tracked pollutant and the values the alert engine keeps about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substance {
    /// Stable identifier, unique within the registry.
    pub id: SubstanceId,
    /// Display label used in messages.
    pub name: String,
    /// Latest fetched concentration as % of the limit.
    pub current_pct: i64,
    /// Concentration at the time this substance was last included in a
    /// delivered notification.
    pub last_reported_pct: i64,
    /// Highest reported concentration since the last all-clear.
    pub max_pct_since_clear: i64,
}

impl Substance {
    /// Creates a substance with all tracked values at zero.
    pub fn new(id: SubstanceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            current_pct: 0,
            last_reported_pct: 0,
            max_pct_since_clear: 0,
        }
    }

    /// Whether the latest reading is at or above the limit.
    pub fn is_over_limit(&self) -> bool {
        self.current_pct >= LIMIT_PCT
    }

    /// Change since the last delivered report, in percentage points.
    pub fn delta_since_report(&self) -> i64 {
        self.current_pct - self.last_reported_pct
    }
}

/// Errors raised while building a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No substances were supplied.
    #[error("Substance registry is empty")]
    Empty,

    /// The same id appeared more than once.
    #[error("Duplicate substance id: {0}")]
    DuplicateId(SubstanceId),

    /// A substance had a blank display name.
    #[error("Substance {0} has an empty name")]
    EmptyName(SubstanceId),
}

/// The fixed catalogue of tracked substances, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstanceRegistry {
    substances: Vec<Substance>,
}

impl SubstanceRegistry {
    /// Builds a registry from `(id, name)` pairs.
    pub fn new<I, S>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (SubstanceId, S)>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut substances = Vec::new();
        for (id, name) in entries {
            let name = name.into();
            if !seen.insert(id) {
                return Err(RegistryError::DuplicateId(id));
            }
            if name.trim().is_empty() {
                return Err(RegistryError::EmptyName(id));
            }
            substances.push(Substance::new(id, name));
        }
        if substances.is_empty() {
            return Err(RegistryError::Empty);
        }
        substances.sort_by_key(|s| s.id);
        Ok(Self { substances })
    }

    /// Returns the substance with the given id.
    pub fn get(&self, id: SubstanceId) -> Option<&Substance> {
        self.substances.iter().find(|s| s.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: SubstanceId) -> Option<&mut Substance> {
        self.substances.iter_mut().find(|s| s.id == id)
    }

    /// All substances, ordered by id.
    pub fn substances(&self) -> &[Substance] {
        &self.substances
    }

    pub(crate) fn substances_mut(&mut self) -> &mut [Substance] {
        &mut self.substances
    }

    /// Ids of every tracked substance.
    pub fn ids(&self) -> Vec<SubstanceId> {
        self.substances.iter().map(|s| s.id).collect()
    }

    /// Number of tracked substances.
    pub fn len(&self) -> usize {
        self.substances.len()
    }

    /// Always false for a constructed registry.
    pub fn is_empty(&self) -> bool {
        self.substances.is_empty()
    }
}
