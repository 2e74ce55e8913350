//! Engine configuration with profile support.
//!
//! Provides the parameters the registry and the liquidation engine are built
//! with. Nothing here is global: callers load a config and pass it in.

use serde::{Deserialize, Serialize};

use super::AliasConfig;

/// Environment variable selecting a built-in profile.
pub const PROFILE_ENV: &str = "PIZZALEND_PROFILE";

/// Environment variable pointing at a TOML config file.
pub const CONFIG_PATH_ENV: &str = "PIZZALEND_CONFIG";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Profile name (for logging/identification)
    #[serde(default = "default_profile_name")]
    pub profile: String,

    /// Symbol-code shortcuts used by the reserve registry
    #[serde(default)]
    pub aliases: AliasConfig,

    /// Liquidation quote parameters
    #[serde(default)]
    pub liquidation: LiquidationConfig,
}

fn default_profile_name() -> String {
    "default".to_string()
}

/// Liquidation quote parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationConfig {
    /// Recompute the health factor and refuse to quote healthy accounts.
    /// When off, callers must establish `health < 1` themselves.
    #[serde(default = "default_recheck_health")]
    pub recheck_health: bool,
}

fn default_recheck_health() -> bool {
    true
}

impl Default for LiquidationConfig {
    fn default() -> Self {
        Self {
            recheck_health: default_recheck_health(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: default_profile_name(),
            aliases: AliasConfig::default(),
            liquidation: LiquidationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// No shortcuts: every reserve lookup goes through the anchor/wrapped index.
    pub fn strict() -> Self {
        Self {
            profile: "strict".to_string(),
            aliases: AliasConfig::empty(),
            liquidation: LiquidationConfig {
                recheck_health: true,
            },
        }
    }

    /// Trust the caller's liquidatability check, as the on-chain contract does.
    pub fn permissive() -> Self {
        Self {
            profile: "permissive".to_string(),
            aliases: AliasConfig::default(),
            liquidation: LiquidationConfig {
                recheck_health: false,
            },
        }
    }

    /// Load from `PIZZALEND_CONFIG` if set, otherwise pick the profile named by
    /// `PIZZALEND_PROFILE` (default, strict, permissive).
    pub fn from_env() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(&path);
        }
        let profile = std::env::var(PROFILE_ENV).unwrap_or_else(|_| "default".to_string());
        Ok(Self::from_profile(&profile))
    }

    /// Built-in profile by name; unknown names fall back to the default.
    pub fn from_profile(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "strict" => Self::strict(),
            "permissive" | "legacy" => Self::permissive(),
            _ => Self::default(),
        }
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        tracing::info!(profile = %self.profile, "Engine configuration loaded");
        tracing::info!(aliases = self.aliases.len(), "Reserve alias table");
        tracing::info!(
            recheck_health = self.liquidation.recheck_health,
            "Liquidation parameters"
        );
    }
}
