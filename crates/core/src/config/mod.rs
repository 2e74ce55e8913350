//! Configuration for the valuation and liquidation engine.
//!
//! This module provides:
//! - Engine configuration (profiles, liquidation parameters)
//! - The injectable reserve alias table

mod aliases;
mod engine;

pub use aliases::AliasConfig;
pub use engine::{EngineConfig, LiquidationConfig, CONFIG_PATH_ENV, PROFILE_ENV};
