//! Read-only collaborator interfaces the engine consumes.
//!
//! Implementations must serve one consistent snapshot for the duration of a
//! logical invocation (e.g. one ledger transaction); the engine performs
//! several dependent reads and never retries.

use std::fmt::Debug;

use crate::asset::{ExtendedSymbol, Name, Symbol};
use crate::position::{CollateralPosition, LoanPosition};
use crate::reserve::{Reserve, ReserveId};

/// Source of reserve records.
pub trait ReserveStore: Send + Sync + Debug {
    /// All reserves in storage order.
    fn scan(&self) -> Vec<Reserve>;

    /// Reserve by identifier.
    fn get(&self, id: &ReserveId) -> Option<Reserve> {
        self.scan().into_iter().find(|r| r.id == *id)
    }

    /// First reserve whose anchor is exactly `anchor`.
    fn find_by_anchor(&self, anchor: &ExtendedSymbol) -> Option<Reserve> {
        self.scan().into_iter().find(|r| r.is_anchor(anchor))
    }
}

/// Source of per-account positions, each list in insertion order.
pub trait PositionStore: Send + Sync + Debug {
    fn collaterals_by_account(&self, account: &Name) -> Vec<CollateralPosition>;

    fn loans_by_account(&self, account: &Name) -> Vec<LoanPosition>;

    /// Every account holding at least one position.
    fn accounts(&self) -> Vec<Name>;
}

/// Token supply lookup used to tell wrapped tokens from underlying ones.
pub trait SupplyProvider: Send + Sync + Debug {
    fn is_valid_wrapped_symbol(&self, symbol: &Symbol) -> bool;
}
