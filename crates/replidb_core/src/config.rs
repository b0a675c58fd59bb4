//! Deployment topology configuration.

use crate::error::{CoreError, CoreResult};
use crate::types::{SiteId, Value, VariableId};

/// Default number of sites.
pub const SITE_COUNT: u32 = 10;

/// Default number of variables.
pub const VAR_COUNT: u32 = 20;

/// Default multiplier for initial values: variable `i` starts at `10 * i`.
pub const INITIAL_VALUE_FACTOR: Value = 10;

/// Configuration for a simulated deployment.
///
/// Sites are numbered `1..=site_count`, variables `1..=variable_count`.
/// Even-indexed variables are replicated at every site. Odd-indexed variable
/// `i` lives only at the site numbered `(i + 1) mod site_count`, where a
/// remainder of zero means the last site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of sites.
    pub site_count: u32,

    /// Number of variables.
    pub variable_count: u32,

    /// Variable `i` is created with value `initial_value_factor * i`.
    pub initial_value_factor: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_count: SITE_COUNT,
            variable_count: VAR_COUNT,
            initial_value_factor: INITIAL_VALUE_FACTOR,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of sites.
    #[must_use]
    pub const fn site_count(mut self, count: u32) -> Self {
        self.site_count = count;
        self
    }

    /// Sets the number of variables.
    #[must_use]
    pub const fn variable_count(mut self, count: u32) -> Self {
        self.variable_count = count;
        self
    }

    /// Sets the initial value multiplier.
    #[must_use]
    pub const fn initial_value_factor(mut self, factor: Value) -> Self {
        self.initial_value_factor = factor;
        self
    }

    /// Checks that the configuration describes a usable topology.
    pub fn validate(&self) -> CoreResult<()> {
        if self.site_count == 0 {
            return Err(CoreError::invalid_config("site count must be at least 1"));
        }
        if self.variable_count == 0 {
            return Err(CoreError::invalid_config(
                "variable count must be at least 1",
            ));
        }
        Ok(())
    }

    /// Returns all site IDs in ascending order.
    pub fn sites(&self) -> impl Iterator<Item = SiteId> {
        (1..=self.site_count).map(SiteId::new)
    }

    /// Returns all variable IDs in ascending order.
    pub fn variables(&self) -> impl Iterator<Item = VariableId> {
        (1..=self.variable_count).map(VariableId::new)
    }

    /// Returns true if the site exists.
    #[must_use]
    pub fn has_site(&self, site: SiteId) -> bool {
        (1..=self.site_count).contains(&site.as_u32())
    }

    /// Returns true if the variable exists.
    #[must_use]
    pub fn has_variable(&self, var: VariableId) -> bool {
        (1..=self.variable_count).contains(&var.index())
    }

    /// Returns the only site holding a non-replicated variable, or `None`
    /// for replicated variables.
    #[must_use]
    pub fn home_site(&self, var: VariableId) -> Option<SiteId> {
        if var.is_replicated() {
            return None;
        }
        match (var.index() + 1) % self.site_count {
            0 => Some(SiteId::new(self.site_count)),
            n => Some(SiteId::new(n)),
        }
    }

    /// Returns true if `site` holds a copy of `var`.
    #[must_use]
    pub fn hosts(&self, site: SiteId, var: VariableId) -> bool {
        if !self.has_site(site) || !self.has_variable(var) {
            return false;
        }
        match self.home_site(var) {
            Some(home) => home == site,
            None => true,
        }
    }

    /// Returns every site holding a copy of `var`, in ascending order.
    pub fn sites_for(&self, var: VariableId) -> impl Iterator<Item = SiteId> + '_ {
        self.sites().filter(move |site| self.hosts(*site, var))
    }

    /// Returns the value a variable holds before any write.
    #[must_use]
    pub fn initial_value(&self, var: VariableId) -> Value {
        self.initial_value_factor * Value::from(var.index())
    }
}
