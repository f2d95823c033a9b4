//! Dictionary-style configuration block.

use crate::error::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::{Mapping, Value};

/// Key naming the registered variant a block selects.
pub const TYPE_KEY: &str = "type";

/// A configuration block: a YAML mapping plus the dotted path it was read
/// from, used to name the block in error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Dict {
    path: String,
    entries: Mapping,
}

impl Dict {
    /// Create an empty block with the given path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entries: Mapping::new(),
        }
    }

    /// Wrap an existing mapping.
    pub fn from_mapping(path: impl Into<String>, entries: Mapping) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }

    /// Parse a block from YAML text. The document root must be a mapping.
    pub fn from_yaml_str(path: impl Into<String>, text: &str) -> ConfigResult<Self> {
        let path = path.into();
        match serde_yaml::from_str::<Value>(text)? {
            Value::Mapping(entries) => Ok(Self { path, entries }),
            Value::Null => Ok(Self::new(path)),
            _ => Err(ConfigError::NotADict {
                dict: path,
                key: "<document>".to_string(),
            }),
        }
    }

    /// Builder-style insert, mostly for programmatic configuration and tests.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style insert of a nested block.
    pub fn with_dict(mut self, key: &str, dict: Dict) -> Self {
        self.entries
            .insert(Value::String(key.to_string()), Value::Mapping(dict.entries));
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.entries
            .insert(Value::String(key.to_string()), value.into());
    }

    /// Re-label the block, e.g. when it is extracted from a larger document.
    pub fn renamed(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Dotted path of this block.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys present in the block, in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().filter_map(Value::as_str)
    }

    /// The mandatory `type` tag.
    pub fn type_name(&self) -> ConfigResult<String> {
        self.lookup(TYPE_KEY)
    }

    /// Read a required entry.
    pub fn lookup<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<T> {
        let value = self
            .entries
            .get(key)
            .ok_or_else(|| ConfigError::MissingKey {
                dict: self.path.clone(),
                key: key.to_string(),
            })?;
        self.convert(key, value)
    }

    /// Read an optional entry, falling back to `default` when absent.
    pub fn lookup_or<T: DeserializeOwned>(&self, key: &str, default: T) -> ConfigResult<T> {
        match self.entries.get(key) {
            Some(value) => self.convert(key, value),
            None => Ok(default),
        }
    }

    /// Read an optional entry.
    pub fn lookup_optional<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<Option<T>> {
        self.entries
            .get(key)
            .map(|value| self.convert(key, value))
            .transpose()
    }

    /// Read a required nested block.
    pub fn sub_dict(&self, key: &str) -> ConfigResult<Dict> {
        self.optional_sub_dict(key)?
            .ok_or_else(|| ConfigError::MissingKey {
                dict: self.path.clone(),
                key: key.to_string(),
            })
    }

    /// Read an optional nested block.
    pub fn optional_sub_dict(&self, key: &str) -> ConfigResult<Option<Dict>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Value::Mapping(entries)) => Ok(Some(Dict {
                path: self.child_path(key),
                entries: entries.clone(),
            })),
            Some(_) => Err(ConfigError::NotADict {
                dict: self.path.clone(),
                key: key.to_string(),
            }),
        }
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn convert<T: DeserializeOwned>(&self, key: &str, value: &Value) -> ConfigResult<T> {
        serde_yaml::from_value(value.clone()).map_err(|e| ConfigError::BadValue {
            dict: self.path.clone(),
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Serialize for Dict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Dict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Mapping::deserialize(deserializer)?;
        Ok(Dict {
            path: String::new(),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALL_BOILING: &str = r#"
type: wallBoiling
vapourPhase: gas
relax: 0.5
heatTransferModel:
  type: spherical
partitioningModel:
  type: Lavieville
  alphaCrit: 0.2
"#;

    #[test]
    fn reads_type_and_scalars() {
        let dict = Dict::from_yaml_str("wallBoiling", WALL_BOILING).unwrap();
        assert_eq!(dict.type_name().unwrap(), "wallBoiling");
        assert_eq!(dict.lookup::<String>("vapourPhase").unwrap(), "gas");
        assert_eq!(dict.lookup::<f64>("relax").unwrap(), 0.5);
        assert_eq!(dict.lookup_or("missing", 1.0).unwrap(), 1.0);
    }

    #[test]
    fn nested_blocks_carry_their_path() {
        let dict = Dict::from_yaml_str("wallBoiling", WALL_BOILING).unwrap();
        let part = dict.sub_dict("partitioningModel").unwrap();
        assert_eq!(part.path(), "wallBoiling.partitioningModel");
        assert_eq!(part.type_name().unwrap(), "Lavieville");

        let err = part.lookup::<f64>("alphaLiquid0").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("alphaLiquid0"));
        assert!(msg.contains("wallBoiling.partitioningModel"));
    }

    #[test]
    fn integer_reads_as_real() {
        let dict = Dict::new("XiModel").with("Xi", 2);
        assert_eq!(dict.lookup::<f64>("Xi").unwrap(), 2.0);
    }

    #[test]
    fn wrong_shape_is_reported() {
        let dict = Dict::from_yaml_str("root", WALL_BOILING).unwrap();
        assert!(matches!(
            dict.sub_dict("relax"),
            Err(ConfigError::NotADict { .. })
        ));
        assert!(matches!(
            dict.lookup::<f64>("vapourPhase"),
            Err(ConfigError::BadValue { .. })
        ));
    }

    #[test]
    fn missing_type_is_missing_key() {
        let dict = Dict::new("XiModel").with("Xi", 2.5);
        assert!(matches!(
            dict.type_name(),
            Err(ConfigError::MissingKey { .. })
        ));
    }

    #[test]
    fn builder_nests_blocks() {
        let dict = Dict::new("outer").with_dict(
            "inner",
            Dict::new("ignored").with(TYPE_KEY, "spherical"),
        );
        let inner = dict.sub_dict("inner").unwrap();
        assert_eq!(inner.path(), "outer.inner");
        assert_eq!(inner.type_name().unwrap(), "spherical");
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["inner"]);
    }
}
