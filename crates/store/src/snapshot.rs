//! Snapshot files: reserves and positions loaded from TOML or JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use pizzalend_core::{CollateralPosition, LoanPosition, Reserve};

use crate::memory::MemoryStore;

/// Every record a store is seeded with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub reserves: Vec<Reserve>,
    #[serde(default)]
    pub collaterals: Vec<CollateralPosition>,
    #[serde(default)]
    pub loans: Vec<LoanPosition>,
}

impl Snapshot {
    /// Load a snapshot; `.json` files are read as JSON, anything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {:?}", path))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let snapshot = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
        .with_context(|| format!("Failed to parse snapshot {:?}", path))?;

        info!(
            path = %path.display(),
            reserves = snapshot.reserves.len(),
            collaterals = snapshot.collaterals.len(),
            loans = snapshot.loans.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Seed a fresh store, reserves first so positions can reference them.
    pub fn into_store(self) -> Result<MemoryStore> {
        let store = MemoryStore::new();
        for reserve in self.reserves {
            let id = reserve.id;
            store
                .insert_reserve(reserve)
                .with_context(|| format!("Rejected reserve {id}"))?;
        }
        for position in self.collaterals {
            let id = position.id;
            store
                .insert_collateral(position)
                .with_context(|| format!("Rejected collateral position {id}"))?;
        }
        for position in self.loans {
            let id = position.id;
            store
                .insert_loan(position)
                .with_context(|| format!("Rejected loan position {id}"))?;
        }
        Ok(store)
    }
}
