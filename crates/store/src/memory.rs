//! In-memory reserve and position store.
//!
//! Reserves keep insertion order (the registry's "first match wins" relies on
//! it). Positions are grouped per account, each group in insertion order.
//! Writes enforce the invariants the engine assumes on read: unique reserve
//! ids, unique anchors, known reserves and non-negative quantities.

use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use pizzalend_core::{
    CollateralPosition, ExtendedSymbol, LoanPosition, Name, PositionStore, Reserve, ReserveId,
    ReserveStore, SupplyProvider, Symbol,
};

/// Rejected store writes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reserve {0} already exists")]
    DuplicateReserve(ReserveId),

    #[error("anchor {anchor} already backs reserve {existing}")]
    DuplicateAnchor {
        anchor: ExtendedSymbol,
        existing: ReserveId,
    },

    #[error("unknown reserve {0}")]
    UnknownReserve(ReserveId),

    #[error("position {position} has negative quantity {quantity}")]
    NegativeQuantity { position: u64, quantity: String },

    #[error(transparent)]
    InvalidReserve(#[from] pizzalend_core::Error),
}

/// Thread-safe store backing every collaborator interface of the engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
    reserves: RwLock<Vec<Reserve>>,
    collaterals: DashMap<Name, Vec<CollateralPosition>>,
    loans: DashMap<Name, Vec<LoanPosition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reserve after validating it.
    pub fn insert_reserve(&self, reserve: Reserve) -> Result<(), StoreError> {
        reserve.validate()?;

        let mut reserves = self.reserves.write();
        if reserves.iter().any(|r| r.id == reserve.id) {
            return Err(StoreError::DuplicateReserve(reserve.id));
        }
        if let Some(existing) = reserves.iter().find(|r| r.anchor == reserve.anchor) {
            return Err(StoreError::DuplicateAnchor {
                anchor: reserve.anchor,
                existing: existing.id,
            });
        }

        debug!(reserve = %reserve.id, anchor = %reserve.anchor, "Reserve stored");
        reserves.push(reserve);
        Ok(())
    }

    /// Replace an existing reserve in place, keeping its storage position.
    pub fn update_reserve(&self, reserve: Reserve) -> Result<(), StoreError> {
        reserve.validate()?;

        let mut reserves = self.reserves.write();
        if let Some(existing) = reserves
            .iter()
            .find(|r| r.anchor == reserve.anchor && r.id != reserve.id)
        {
            return Err(StoreError::DuplicateAnchor {
                anchor: reserve.anchor,
                existing: existing.id,
            });
        }
        let slot = reserves
            .iter_mut()
            .find(|r| r.id == reserve.id)
            .ok_or(StoreError::UnknownReserve(reserve.id))?;
        *slot = reserve;
        Ok(())
    }

    fn check_reserve(&self, reserve: &ReserveId) -> Result<(), StoreError> {
        if self.reserves.read().iter().any(|r| r.id == *reserve) {
            Ok(())
        } else {
            Err(StoreError::UnknownReserve(*reserve))
        }
    }

    pub fn insert_collateral(&self, position: CollateralPosition) -> Result<(), StoreError> {
        self.check_reserve(&position.reserve)?;
        if position.quantity.amount < 0 {
            return Err(StoreError::NegativeQuantity {
                position: position.id,
                quantity: position.quantity.to_string(),
            });
        }
        self.collaterals
            .entry(position.account)
            .or_default()
            .push(position);
        Ok(())
    }

    pub fn insert_loan(&self, position: LoanPosition) -> Result<(), StoreError> {
        self.check_reserve(&position.reserve)?;
        if position.outstanding_scaled < 0 {
            return Err(StoreError::NegativeQuantity {
                position: position.id,
                quantity: position.outstanding_scaled.to_string(),
            });
        }
        self.loans.entry(position.account).or_default().push(position);
        Ok(())
    }

    pub fn reserve_count(&self) -> usize {
        self.reserves.read().len()
    }
}

impl ReserveStore for MemoryStore {
    fn scan(&self) -> Vec<Reserve> {
        self.reserves.read().clone()
    }

    fn get(&self, id: &ReserveId) -> Option<Reserve> {
        self.reserves.read().iter().find(|r| r.id == *id).cloned()
    }

    fn find_by_anchor(&self, anchor: &ExtendedSymbol) -> Option<Reserve> {
        self.reserves
            .read()
            .iter()
            .find(|r| r.is_anchor(anchor))
            .cloned()
    }
}

impl PositionStore for MemoryStore {
    fn collaterals_by_account(&self, account: &Name) -> Vec<CollateralPosition> {
        self.collaterals
            .get(account)
            .map(|positions| positions.clone())
            .unwrap_or_default()
    }

    fn loans_by_account(&self, account: &Name) -> Vec<LoanPosition> {
        self.loans
            .get(account)
            .map(|positions| positions.clone())
            .unwrap_or_default()
    }

    fn accounts(&self) -> Vec<Name> {
        let mut accounts: Vec<Name> = self
            .collaterals
            .iter()
            .map(|entry| *entry.key())
            .chain(self.loans.iter().map(|entry| *entry.key()))
            .collect();
        accounts.sort();
        accounts.dedup();
        accounts
    }
}

impl SupplyProvider for MemoryStore {
    /// A symbol is a wrapped token when some stored reserve issues it.
    fn is_valid_wrapped_symbol(&self, symbol: &Symbol) -> bool {
        self.reserves.read().iter().any(|r| r.is_wrapped(symbol))
    }
}
