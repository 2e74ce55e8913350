//! Token model: symbols, account names and asset quantities.
//!
//! Quantities are signed integers in the smallest unit of their symbol, so
//! `"1.0000 EOS"` is stored as `10000` with precision 4. Every type here has
//! a canonical text form and (de)serializes through it, which keeps TOML and
//! JSON snapshots readable.

use alloy::primitives::U256;
use arrayvec::ArrayString;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::u256_math;

/// Largest precision a symbol may carry.
pub const MAX_PRECISION: u8 = 18;

static ASSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-)?([0-9]+)(?:\.([0-9]+))? ([A-Z]{1,7})$").expect("static regex")
});

static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2}),([A-Z]{1,7})$").expect("static regex"));

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z1-5.]{1,12}$").expect("static regex"));

// ============================================================================
// Symbol code / symbol
// ============================================================================

/// Ticker of a token, 1 to 7 uppercase letters (e.g. "USDT", "PZUSDT").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SymbolCode(ArrayString<7>);

impl SymbolCode {
    pub fn new(code: &str) -> Result<Self> {
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(Error::parse(code, "symbol code must be 1-7 uppercase letters"));
        }
        ArrayString::from(code)
            .map(Self)
            .map_err(|_| Error::parse(code, "symbol code longer than 7 characters"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for SymbolCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for SymbolCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}

impl From<SymbolCode> for String {
    fn from(code: SymbolCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbol code together with its decimal precision, text form `"4,EOS"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    pub precision: u8,
    pub code: SymbolCode,
}

impl Symbol {
    pub fn new(precision: u8, code: &str) -> Result<Self> {
        if precision > MAX_PRECISION {
            return Err(Error::parse(code, format!("precision {precision} exceeds {MAX_PRECISION}")));
        }
        Ok(Self {
            precision,
            code: SymbolCode::new(code)?,
        })
    }

    /// `10^precision`, the number of smallest units in one whole token.
    pub fn unit(&self) -> U256 {
        u256_math::pow10(self.precision)
    }
}

impl FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = SYMBOL_RE
            .captures(s)
            .ok_or_else(|| Error::parse(s, "expected '<precision>,<CODE>'"))?;
        let precision: u8 = caps[1]
            .parse()
            .map_err(|_| Error::parse(s, "invalid precision"))?;
        Self::new(precision, &caps[2])
    }
}

impl TryFrom<String> for Symbol {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

// ============================================================================
// Account / contract name
// ============================================================================

/// Account or contract name: 1 to 12 characters of `a-z`, `1-5` and `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(ArrayString<12>);

impl Name {
    pub fn new(name: &str) -> Result<Self> {
        if !NAME_RE.is_match(name) {
            return Err(Error::parse(name, "name must be 1-12 characters of a-z, 1-5 or '.'"));
        }
        ArrayString::from(name)
            .map(Self)
            .map_err(|_| Error::parse(name, "name longer than 12 characters"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Name {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.as_str().to_string()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token identity: a symbol issued by a specific contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtendedSymbol {
    pub symbol: Symbol,
    pub contract: Name,
}

impl ExtendedSymbol {
    pub fn new(symbol: Symbol, contract: Name) -> Self {
        Self { symbol, contract }
    }
}

impl FromStr for ExtendedSymbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (symbol, contract) = s
            .split_once('@')
            .ok_or_else(|| Error::parse(s, "expected '<precision>,<CODE>@<contract>'"))?;
        Ok(Self::new(symbol.parse()?, contract.parse()?))
    }
}

impl TryFrom<String> for ExtendedSymbol {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ExtendedSymbol> for String {
    fn from(symbol: ExtendedSymbol) -> Self {
        symbol.to_string()
    }
}

impl fmt::Display for ExtendedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.contract)
    }
}

// ============================================================================
// Quantities
// ============================================================================

/// Token quantity in the smallest unit of its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub fn zero(symbol: Symbol) -> Self {
        Self::new(0, symbol)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Amount as an unsigned integer; negative quantities count as zero.
    pub fn amount_u256(&self) -> U256 {
        U256::from(self.amount.max(0) as u64)
    }
}

impl FromStr for Asset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = ASSET_RE
            .captures(s)
            .ok_or_else(|| Error::parse(s, "expected '<amount> <CODE>'"))?;
        let fraction = caps.get(3).map_or("", |m| m.as_str());
        let precision = u8::try_from(fraction.len())
            .map_err(|_| Error::parse(s, "precision too large"))?;
        let symbol = Symbol::new(precision, &caps[4])?;

        let whole: i64 = caps[2]
            .parse()
            .map_err(|_| Error::parse(s, "amount out of range"))?;
        let fraction: i64 = if fraction.is_empty() {
            0
        } else {
            fraction
                .parse()
                .map_err(|_| Error::parse(s, "amount out of range"))?
        };
        let amount = 10i64
            .checked_pow(precision as u32)
            .and_then(|unit| whole.checked_mul(unit))
            .and_then(|units| units.checked_add(fraction))
            .ok_or_else(|| Error::parse(s, "amount out of range"))?;

        let amount = if caps.get(1).is_some() { -amount } else { amount };
        Ok(Self::new(amount, symbol))
    }
}

impl TryFrom<String> for Asset {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.to_string()
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        let precision = self.symbol.precision as u32;
        if precision == 0 {
            return write!(f, "{sign}{abs} {}", self.symbol.code);
        }
        let unit = 10u64.pow(precision);
        write!(
            f,
            "{sign}{}.{:0width$} {}",
            abs / unit,
            abs % unit,
            self.symbol.code,
            width = precision as usize
        )
    }
}

/// Quantity of a specific token identity, text form `"1.0000 EOS@eosio.token"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtendedAsset {
    pub quantity: Asset,
    pub contract: Name,
}

impl ExtendedAsset {
    pub fn new(quantity: Asset, contract: Name) -> Self {
        Self { quantity, contract }
    }

    pub fn from_amount(amount: i64, symbol: ExtendedSymbol) -> Self {
        Self::new(Asset::new(amount, symbol.symbol), symbol.contract)
    }

    pub fn zero(symbol: ExtendedSymbol) -> Self {
        Self::from_amount(0, symbol)
    }

    pub fn extended_symbol(&self) -> ExtendedSymbol {
        ExtendedSymbol::new(self.quantity.symbol, self.contract)
    }

    pub fn symbol(&self) -> Symbol {
        self.quantity.symbol
    }

    pub fn amount(&self) -> i64 {
        self.quantity.amount
    }

    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero()
    }
}

impl FromStr for ExtendedAsset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (quantity, contract) = s
            .split_once('@')
            .ok_or_else(|| Error::parse(s, "expected '<amount> <CODE>@<contract>'"))?;
        Ok(Self::new(quantity.parse()?, contract.parse()?))
    }
}

impl TryFrom<String> for ExtendedAsset {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ExtendedAsset> for String {
    fn from(asset: ExtendedAsset) -> Self {
        asset.to_string()
    }
}

impl fmt::Display for ExtendedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.quantity, self.contract)
    }
}
