//! Queue configuration.
//!
//! A queue is described by its box name, box size, direction and element
//! type, usually loaded from a TOML file:
//!
//! ```toml
//! name = "bids"
//! box_size = 5600
//! order = "descending"
//! element = "(uint64,uint64,address,uint64)"
//! ```

use boxq_storage::MAX_BOX_SIZE;
use boxq_types::TypeSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::HeapError;
use crate::layout;
use crate::order::{SortOrder, SORT_PREFIX_LEN};

/// Budget requested before each sift level and each scanned slot.
pub const DEFAULT_BUDGET_PER_LEVEL: u64 = 500;

fn default_budget_per_level() -> u64 {
    DEFAULT_BUDGET_PER_LEVEL
}

/// Priority queue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapConfig {
    /// Box name, also the key of the element counter
    pub name: String,
    /// Box size in bytes
    pub box_size: usize,
    #[serde(default)]
    pub order: SortOrder,
    /// Element type; must be static and at least 16 bytes
    pub element: TypeSpec,
    #[serde(default = "default_budget_per_level")]
    pub budget_per_level: u64,
}

impl HeapConfig {
    pub fn new(
        name: impl Into<String>,
        box_size: usize,
        order: SortOrder,
        element: TypeSpec,
    ) -> Self {
        Self {
            name: name.into(),
            box_size,
            order,
            element,
            budget_per_level: DEFAULT_BUDGET_PER_LEVEL,
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, HeapError> {
        let config: HeapConfig =
            toml::from_str(contents).map_err(|e| HeapError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file.
    pub fn from_file(path: &Path) -> Result<Self, HeapError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HeapError::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, HeapError> {
        toml::to_string(self).map_err(|e| HeapError::InvalidConfig(e.to_string()))
    }

    /// Encoded size of one element.
    pub fn element_size(&self) -> Result<usize, HeapError> {
        Ok(self.element.byte_len()?)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.name.is_empty() {
            return Err(HeapError::InvalidConfig("box name is empty".to_string()));
        }
        if self.name.len() > 64 {
            return Err(HeapError::InvalidConfig(format!(
                "box name is {} bytes, max 64",
                self.name.len()
            )));
        }
        let element_size = self.element_size()?;
        validate_layout(self.box_size, element_size)?;
        if self.budget_per_level == 0 {
            return Err(HeapError::InvalidConfig("budget_per_level must be > 0".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn validate_layout(box_size: usize, element_size: usize) -> Result<(), HeapError> {
    if element_size < SORT_PREFIX_LEN {
        return Err(HeapError::InvalidConfig(format!(
            "element size {} is smaller than the {}-byte sort prefix",
            element_size, SORT_PREFIX_LEN
        )));
    }
    if box_size > MAX_BOX_SIZE {
        return Err(HeapError::InvalidConfig(format!(
            "box size {} exceeds max {}",
            box_size, MAX_BOX_SIZE
        )));
    }
    if layout::capacity(box_size, element_size) == 0 {
        return Err(HeapError::InvalidConfig(format!(
            "box size {} holds no {}-byte element",
            box_size, element_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ORDERS: &str = r#"
        name = "bids"
        box_size = 5600
        order = "descending"
        element = "(uint64,uint64,address,uint64)"
    "#;

    #[test]
    fn test_parse() {
        let config = HeapConfig::from_toml_str(ORDERS).unwrap();
        assert_eq!(config.name, "bids");
        assert_eq!(config.order, SortOrder::Descending);
        assert_eq!(config.element_size().unwrap(), 56);
        assert_eq!(config.box_size / 56, 100);
        assert_eq!(config.budget_per_level, DEFAULT_BUDGET_PER_LEVEL);
    }

    #[test]
    fn test_defaults() {
        let config = HeapConfig::from_toml_str(
            "name = \"q\"\nbox_size = 160\nelement = \"byte[16]\"",
        )
        .unwrap();
        assert_eq!(config.order, SortOrder::Ascending);
    }

    #[test]
    fn test_rejects_dynamic_element() {
        let err = HeapConfig::from_toml_str("name = \"q\"\nbox_size = 160\nelement = \"byte[]\"")
            .unwrap_err();
        assert!(matches!(err, HeapError::Types(_)));
    }

    #[test]
    fn test_rejects_small_element() {
        let err = HeapConfig::from_toml_str("name = \"q\"\nbox_size = 160\nelement = \"uint64\"")
            .unwrap_err();
        assert!(matches!(err, HeapError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_box_size() {
        let too_big = HeapConfig::new(
            "q",
            MAX_BOX_SIZE + 1,
            SortOrder::Ascending,
            TypeSpec::static_bytes(16),
        );
        assert!(too_big.validate().is_err());

        let too_small = HeapConfig::new("q", 15, SortOrder::Ascending, TypeSpec::static_bytes(16));
        assert!(too_small.validate().is_err());
    }

    #[test]
    fn test_from_file_roundtrip() {
        let config = HeapConfig::new("asks", 560, SortOrder::Ascending, TypeSpec::static_bytes(56));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml_string().unwrap().as_bytes()).unwrap();

        let loaded = HeapConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let err = HeapConfig::from_file(Path::new("/nonexistent/boxq.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
