//! Reserve registry for lookups by id, anchor identity and wrapped symbol.
//!
//! A registry is a snapshot: it reads every reserve once, validates it and
//! builds its secondary indexes, so all lookups inside one invocation see the
//! same data. Anchors are expected to be unique; when they are not, the first
//! reserve in storage order wins and a warning is logged.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::asset::{ExtendedSymbol, SymbolCode};
use crate::config::AliasConfig;
use crate::error::{Error, Result};
use crate::reserve::{Reserve, ReserveId};
use crate::store::ReserveStore;

/// Reserve registry for efficient lookups.
#[derive(Debug, Clone)]
pub struct ReserveRegistry {
    reserves: Vec<Reserve>,
    by_id: HashMap<ReserveId, usize>,
    by_anchor: HashMap<ExtendedSymbol, usize>,
    by_anchor_code: HashMap<SymbolCode, usize>,
    by_wrapped: HashMap<ExtendedSymbol, usize>,
    aliases: AliasConfig,
}

impl ReserveRegistry {
    /// Build a registry from a list of reserves in storage order.
    pub fn new(reserves: Vec<Reserve>, aliases: AliasConfig) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(reserves.len());
        let mut by_anchor = HashMap::with_capacity(reserves.len());
        let mut by_anchor_code = HashMap::with_capacity(reserves.len());
        let mut by_wrapped = HashMap::with_capacity(reserves.len());

        for (idx, reserve) in reserves.iter().enumerate() {
            reserve.validate()?;

            if by_id.insert(reserve.id, idx).is_some() {
                return Err(Error::InvalidReserve {
                    reserve: reserve.id.to_string(),
                    reason: "duplicate reserve id".into(),
                });
            }
            if by_anchor.contains_key(&reserve.anchor) {
                warn!(
                    reserve = %reserve.id,
                    anchor = %reserve.anchor,
                    "Duplicate reserve anchor, keeping first match"
                );
            }
            by_anchor.entry(reserve.anchor).or_insert(idx);
            by_anchor_code.entry(reserve.anchor.symbol.code).or_insert(idx);
            by_wrapped.entry(reserve.wrapped).or_insert(idx);
        }

        info!(
            reserves = reserves.len(),
            aliases = aliases.len(),
            "Reserve registry snapshot built"
        );

        Ok(Self {
            reserves,
            by_id,
            by_anchor,
            by_anchor_code,
            by_wrapped,
            aliases,
        })
    }

    /// Snapshot every reserve the store holds.
    pub fn from_store(store: &dyn ReserveStore, aliases: AliasConfig) -> Result<Self> {
        Self::new(store.scan(), aliases)
    }

    /// Reserve by identifier.
    pub fn lookup_by_id(&self, id: &ReserveId) -> Result<&Reserve> {
        self.by_id
            .get(id)
            .map(|&idx| &self.reserves[idx])
            .ok_or_else(|| Error::not_found(format!("reserve {id}")))
    }

    /// Reserve whose anchor is exactly `anchor` (issuer and symbol).
    pub fn lookup_by_anchor(&self, anchor: &ExtendedSymbol) -> Result<&Reserve> {
        if let Some(reserve) = self.alias_hit(&anchor.symbol.code, |r| r.is_anchor(anchor)) {
            return Ok(reserve);
        }
        self.by_anchor
            .get(anchor)
            .map(|&idx| &self.reserves[idx])
            .ok_or_else(|| Error::not_found(format!("reserve anchored to {anchor}")))
    }

    /// Reserve issuing exactly the wrapped token `wrapped`.
    pub fn lookup_by_wrapped(&self, wrapped: &ExtendedSymbol) -> Result<&Reserve> {
        if let Some(reserve) = self.alias_hit(&wrapped.symbol.code, |r| r.wrapped == *wrapped) {
            return Ok(reserve);
        }
        self.by_wrapped
            .get(wrapped)
            .map(|&idx| &self.reserves[idx])
            .ok_or_else(|| Error::not_found(format!("reserve issuing {wrapped}")))
    }

    /// Wrapped token of the first reserve whose anchor has symbol code `anchor_code`.
    pub fn lookup_wrapped_symbol(&self, anchor_code: &SymbolCode) -> Result<ExtendedSymbol> {
        self.by_anchor_code
            .get(anchor_code)
            .map(|&idx| self.reserves[idx].wrapped)
            .ok_or_else(|| Error::not_found(format!("wrapped token for {anchor_code}")))
    }

    /// Alias lookup, accepted only when the aliased reserve passes `matches`.
    fn alias_hit(&self, code: &SymbolCode, matches: impl Fn(&Reserve) -> bool) -> Option<&Reserve> {
        let id = self.aliases.get(code)?;
        let reserve = self.by_id.get(id).map(|&idx| &self.reserves[idx])?;
        if matches(reserve) {
            Some(reserve)
        } else {
            debug!(code = %code, reserve = %id, "Alias did not match, falling back to index");
            None
        }
    }

    /// All reserves in storage order.
    pub fn reserves(&self) -> impl Iterator<Item = &Reserve> {
        self.reserves.iter()
    }

    pub fn len(&self) -> usize {
        self.reserves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserves.is_empty()
    }

    /// Reserves sorted by debt liquidation order (ascending, ties keep storage order).
    pub fn by_borrow_liquidation_order(&self) -> Vec<&Reserve> {
        let mut reserves: Vec<_> = self.reserves.iter().collect();
        reserves.sort_by_key(|r| r.config.borrow_liquidation_order);
        reserves
    }

    /// Reserves sorted by collateral liquidation order (ascending, ties keep storage order).
    pub fn by_collateral_liquidation_order(&self) -> Vec<&Reserve> {
        let mut reserves: Vec<_> = self.reserves.iter().collect();
        reserves.sort_by_key(|r| r.config.collateral_liquidation_order);
        reserves
    }
}
