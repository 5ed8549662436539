use crate::models::{Substance, SubstanceId, SubstanceRegistry};

/// A builder for creating test substances.
pub struct SubstanceBuilder {
    id: SubstanceId,
    name: Option<String>,
    current_pct: i64,
    last_reported_pct: i64,
    max_pct_since_clear: i64,
}

impl SubstanceBuilder {
    /// Starts a substance with the given id and every value at zero.
    pub fn new(id: SubstanceId) -> Self {
        Self { id, name: None, current_pct: 0, last_reported_pct: 0, max_pct_since_clear: 0 }
    }

    /// Sets the display name. Defaults to `substance-<id>`.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the latest reading.
    pub fn current(mut self, pct: i64) -> Self {
        self.current_pct = pct;
        self
    }

    /// Sets the value from the last delivered report.
    pub fn last_reported(mut self, pct: i64) -> Self {
        self.last_reported_pct = pct;
        self
    }

    /// Sets the running maximum since the last all-clear.
    pub fn max_since_clear(mut self, pct: i64) -> Self {
        self.max_pct_since_clear = pct;
        self
    }

    /// Builds the substance.
    pub fn build(self) -> Substance {
        Substance {
            id: self.id,
            name: self.name.unwrap_or_else(|| format!("substance-{}", self.id)),
            current_pct: self.current_pct,
            last_reported_pct: self.last_reported_pct,
            max_pct_since_clear: self.max_pct_since_clear,
        }
    }
}

/// A builder for registries whose substances start from arbitrary values.
#[derive(Default)]
pub struct RegistryBuilder {
    substances: Vec<Substance>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a substance, letting `configure` set its values.
    pub fn substance(
        mut self,
        id: SubstanceId,
        name: &str,
        configure: impl FnOnce(SubstanceBuilder) -> SubstanceBuilder,
    ) -> Self {
        self.substances.push(configure(SubstanceBuilder::new(id).name(name)).build());
        self
    }

    /// Builds the registry.
    ///
    /// # Panics
    ///
    /// Panics if no substance was added or an id was added twice.
    pub fn build(self) -> SubstanceRegistry {
        let mut registry =
            SubstanceRegistry::new(self.substances.iter().map(|s| (s.id, s.name.clone())))
                .expect("test registry should be valid");
        for substance in self.substances {
            if let Some(slot) = registry.get_mut(substance.id) {
                *slot = substance;
            }
        }
        registry
    }
}
