//! Validation configuration.
//!
//! Per-table checks are external configuration: a JSON document mapping table
//! names to constraint lists, plus an optional derivation policy.
//!
//! ```json
//! {
//!   "tables": {
//!     "employees": {
//!       "check_name": "employees_quality",
//!       "level": "error",
//!       "constraints": [
//!         {"type": "is_complete", "column": "emp_no"},
//!         {"type": "is_unique", "column": "emp_no"},
//!         {"type": "is_contained_in", "column": "gender", "allowed": ["M", "F"]}
//!       ]
//!     }
//!   },
//!   "derivation": {"tolerance": 0.1}
//! }
//! ```
//!
//! Tables without an entry are validated with [`Check::default_for`]. When a
//! `derivation` policy is present, pipelines built from this configuration also
//! derive expectations unless an explicit mode is set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::constraints::ConstraintSpec;
use crate::core::{Check, Level};
use crate::derivation::DerivationPolicy;
use crate::prelude::*;

fn default_level() -> Level {
    Level::Error
}

/// The check configured for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    /// Defaults to `<table>_check`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_name: Option<String>,
    #[serde(default = "default_level")]
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub constraints: Vec<ConstraintSpec>,
}

impl TableConfig {
    pub fn new(constraints: Vec<ConstraintSpec>) -> Self {
        Self {
            check_name: None,
            level: default_level(),
            description: None,
            constraints,
        }
    }

    pub fn check_name(mut self, name: impl Into<String>) -> Self {
        self.check_name = Some(name.into());
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Builds the check for `table_name`.
    pub fn to_check(&self, table_name: &str) -> Result<Check> {
        let name = self
            .check_name
            .clone()
            .unwrap_or_else(|| format!("{table_name}_check"));
        let mut builder = Check::builder(name).level(self.level);
        if let Some(description) = &self.description {
            builder = builder.description(description.clone());
        }
        for spec in &self.constraints {
            builder = builder.spec(spec).map_err(|e| {
                GuardError::Configuration(format!("table '{table_name}': {e}"))
            })?;
        }
        Ok(builder.build())
    }
}

/// Configuration for a validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    #[serde(default)]
    pub tables: BTreeMap<String, TableConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation: Option<DerivationPolicy>,
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GuardError::Configuration(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("failed to read configuration '{}'", path.as_ref().display())
        })?;
        let config = Self::from_json_str(&json)?;
        info!(
            tables = config.tables.len(),
            derivation = config.derivation.is_some(),
            "Loaded validation configuration"
        );
        Ok(config)
    }

    pub fn with_table(mut self, table_name: impl Into<String>, table: TableConfig) -> Self {
        self.tables.insert(table_name.into(), table);
        self
    }

    pub fn with_derivation(mut self, policy: DerivationPolicy) -> Self {
        self.derivation = Some(policy);
        self
    }

    /// Builds every configured constraint and checks the derivation policy.
    pub fn validate(&self) -> Result<()> {
        for (table_name, table) in &self.tables {
            table.to_check(table_name)?;
        }
        if let Some(policy) = &self.derivation {
            policy.validate()?;
        }
        debug!(tables = self.tables.len(), "Configuration validated");
        Ok(())
    }

    /// The check for `table_name`, or the default check if none is configured.
    pub fn check_for(&self, table_name: &str) -> Result<Check> {
        match self.tables.get(table_name) {
            Some(table) => table.to_check(table_name),
            None => {
                debug!(table.name = %table_name, "No configured check, using default");
                Ok(Check::default_for(table_name))
            }
        }
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}
