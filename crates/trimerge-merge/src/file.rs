//! TOML configuration files.

use std::collections::BTreeMap;
use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use trimerge_types::{Path, Side};

use crate::comparator::KeyComparator;
use crate::config::MergeConfig;
use crate::error::{MergeError, MergeResult};
use crate::filter::FieldEqualsFilter;
use crate::ops::{FieldOp, ListOp};

/// On-disk form of a [`MergeConfig`].
///
/// Paths are dotted strings and operations use their tag names, e.g.
/// `"authors.full_name" = "KEEP_LONGEST"`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub default_field_op: Option<FieldOp>,
    pub default_list_op: Option<ListOp>,
    #[serde(default)]
    pub conflict_filters: Vec<String>,
    #[serde(default)]
    pub field_ops: BTreeMap<String, FieldOp>,
    #[serde(default)]
    pub list_ops: BTreeMap<String, ListOp>,
    #[serde(default)]
    pub comparators: Vec<ComparatorEntry>,
    #[serde(default)]
    pub pre_filters: Vec<PreFilterEntry>,
}

/// A key comparator for the list at `path`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparatorEntry {
    pub path: String,
    pub keys: Vec<String>,
    #[serde(default)]
    pub case_insensitive: bool,
}

/// Drop entities of the list at `path` whose `field` equals `equals`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreFilterEntry {
    pub path: String,
    pub field: String,
    pub equals: Value,
    /// Restrict the filter to one side; both editing sides when absent.
    #[serde(default)]
    pub side: Option<Side>,
}

impl ConfigFile {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> MergeResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Build and validate the in-memory configuration.
    pub fn into_config(self) -> MergeResult<MergeConfig> {
        let mut config = MergeConfig::default();

        if let Some(op) = self.default_field_op {
            config.operations.set_default_field_op(op);
        }
        if let Some(op) = self.default_list_op {
            config.operations.set_default_list_op(op);
        }
        for (path, op) in self.field_ops {
            config.operations.insert_field_op(Path::parse(&path)?, op);
        }
        for (path, op) in self.list_ops {
            config.operations.insert_list_op(Path::parse(&path)?, op);
        }

        for entry in self.comparators {
            if entry.keys.is_empty() {
                return Err(MergeError::config(format!(
                    "comparator for {:?} has no keys",
                    entry.path
                )));
            }
            let keys = entry
                .keys
                .iter()
                .map(|key| Path::parse(key))
                .collect::<Result<Vec<_>, _>>()?;
            let mut comparator = KeyComparator::new(keys);
            if entry.case_insensitive {
                comparator = comparator.case_insensitive();
            }
            config.comparators.register(Path::parse(&entry.path)?, comparator);
        }

        for entry in self.pre_filters {
            if entry.side == Some(Side::Ancestor) {
                return Err(MergeError::config(format!(
                    "pre-filter for {:?} cannot target the ancestor",
                    entry.path
                )));
            }
            let mut filter = FieldEqualsFilter::new(Path::parse(&entry.field)?, entry.equals);
            if let Some(side) = entry.side {
                filter = filter.on_side(side);
            }
            config.pre_filters.register(Path::parse(&entry.path)?, filter);
        }

        for path in &self.conflict_filters {
            config.conflict_filters.insert(Path::parse(path)?);
        }

        config.validate()?;
        Ok(config)
    }
}

impl MergeConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(s: &str) -> MergeResult<Self> {
        ConfigFile::from_toml_str(s)?.into_config()
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn load(path: impl AsRef<FsPath>) -> MergeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MergeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(
            path = %path.display(),
            operations = config.operations.len(),
            suppressed_paths = config.conflict_filters.len(),
            "loaded merge configuration"
        );
        Ok(config)
    }
}
