//! Symbol-code shortcuts to reserve identifiers, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::asset::SymbolCode;
use crate::reserve::ReserveId;

/// Maps well-known symbol codes (wrapped or anchor) straight to a reserve.
///
/// A hit is only a hint: the registry still checks that the reserve matches
/// the asset being resolved and falls back to its index when it does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasConfig(BTreeMap<SymbolCode, ReserveId>);

impl AliasConfig {
    /// Empty table: every lookup goes through the registry index.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Load an alias table from a TOML file of `CODE = "reserve"` lines.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn insert(&mut self, code: SymbolCode, reserve: ReserveId) {
        self.0.insert(code, reserve);
    }

    pub fn get(&self, code: &SymbolCode) -> Option<&ReserveId> {
        self.0.get(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AliasConfig {
    /// Stablecoin reserves reachable by either their wrapped or anchor code.
    fn default() -> Self {
        let pairs = [
            ("PZUSDT", "pzusdt"),
            ("USDT", "pzusdt"),
            ("PZUSN", "pzusn"),
            ("USN", "pzusn"),
            ("PZOUSD", "pzousd"),
            ("OUSD", "pzousd"),
        ];
        let mut table = Self::empty();
        for (code, reserve) in pairs {
            if let (Ok(code), Ok(reserve)) = (code.parse(), reserve.parse()) {
                table.insert(code, reserve);
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let aliases = AliasConfig::default();
        assert_eq!(aliases.len(), 6);
        let usdt: SymbolCode = "USDT".parse().unwrap();
        assert_eq!(aliases.get(&usdt).unwrap().as_str(), "pzusdt");
    }

    #[test]
    fn test_parse_alias_table() {
        let toml_str = r#"
            PZEOS = "pzeos"
            EOS = "pzeos"
        "#;
        let aliases: AliasConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases.get(&"EOS".parse().unwrap()).unwrap().as_str(), "pzeos");
    }

    #[test]
    fn test_rejects_bad_codes() {
        let toml_str = r#"eos = "pzeos""#;
        assert!(toml::from_str::<AliasConfig>(toml_str).is_err());
    }
}
