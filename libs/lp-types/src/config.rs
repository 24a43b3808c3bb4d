use serde::{Deserialize, Serialize};

use crate::{LpError, LpResult, BPS_DENOMINATOR, SECONDS_PER_YEAR};

/// Liquidity used to price a range when no position size is given
pub const DEFAULT_ESTIMATION_LIQUIDITY: u128 = 500_000_000_000_000_000_000_000;

/// Engine tuning loaded from TOML
///
/// ```toml
/// slippage_bps = 50
/// seconds_per_year = 31536000
/// estimation_liquidity = "500000000000000000000000"
///
/// [search]
/// loop_budget = 20
/// tolerance_bps = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Price impact allowed for rebalance swaps (basis points)
    pub slippage_bps: u32,

    /// Year length used to annualize fee windows
    pub seconds_per_year: u64,

    /// Liquidity probe for range APR estimates
    #[serde(with = "u128_string")]
    pub estimation_liquidity: u128,

    /// Swap-amount search settings
    pub search: SearchConfig,
}

/// Swap-amount search settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum bisection steps
    pub loop_budget: u32,

    /// Relative distance to the target ratio that ends the search (basis points)
    pub tolerance_bps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slippage_bps: 50,
            seconds_per_year: SECONDS_PER_YEAR,
            estimation_liquidity: DEFAULT_ESTIMATION_LIQUIDITY,
            search: SearchConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            loop_budget: 20,
            tolerance_bps: 10,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> LpResult<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| LpError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> LpResult<String> {
        toml::to_string_pretty(self).map_err(|e| LpError::InvalidConfig(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> LpResult<()> {
        if u64::from(self.slippage_bps) >= BPS_DENOMINATOR {
            return Err(LpError::InvalidConfig(format!(
                "slippage_bps must be below {}, got {}",
                BPS_DENOMINATOR, self.slippage_bps
            )));
        }
        if self.seconds_per_year == 0 {
            return Err(LpError::InvalidConfig("seconds_per_year must be greater than 0".into()));
        }
        if self.estimation_liquidity == 0 {
            return Err(LpError::InvalidConfig(
                "estimation_liquidity must be greater than 0".into(),
            ));
        }
        self.search.validate()
    }
}

impl SearchConfig {
    fn validate(&self) -> LpResult<()> {
        if self.loop_budget == 0 {
            return Err(LpError::InvalidConfig("search.loop_budget must be greater than 0".into()));
        }
        if self.tolerance_bps == 0 || u64::from(self.tolerance_bps) >= BPS_DENOMINATOR {
            return Err(LpError::InvalidConfig(format!(
                "search.tolerance_bps must be in 1..{}, got {}",
                BPS_DENOMINATOR, self.tolerance_bps
            )));
        }
        Ok(())
    }
}

/// TOML integers stop at i64, so large liquidity values travel as strings
mod u128_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(u128::from(v)),
            Raw::Str(s) => s.replace('_', "").parse().map_err(de::Error::custom),
        }
    }
}
