use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};


#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BalanceMode {
    // Role coverage matters as much as rating parity.
    #[default]
    PreferLine,
    // Rating parity first; evaluation ratings get a small jitter to break ties.
    PreferMmr,
    IgnoreLine,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MixStrength {
    #[default]
    Normal,
    // More restarts, more annealing rounds, hotter start.
    Strong,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoringMode {
    Elo,
    #[default]
    Fixed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub mode: BalanceMode,
    // Max allowed difference between team rating averages before hard penalties kick in.
    pub tolerance: u32,
    pub strength: MixStrength,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub mode: ScoringMode,
    pub elo_k: u32,
    pub fixed_bonus: u32,
    // Players with fewer games than this get amplified rating changes.
    pub placement_games: u32,
    pub placement_multiplier: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub balance: BalanceConfig,
    pub scoring: ScoringRules,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RulesError {
    ZeroEloK,
    ZeroFixedBonus,
    ZeroPlacementMultiplier,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        BalanceConfig {
            mode: BalanceMode::PreferLine,
            tolerance: 120,
            strength: MixStrength::Normal,
        }
    }
}

impl BalanceConfig {
    pub fn new(mode: BalanceMode, tolerance: u32, strength: MixStrength) -> Self {
        BalanceConfig { mode, tolerance, strength }
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        ScoringRules {
            mode: ScoringMode::Fixed,
            elo_k: 32,
            fixed_bonus: 10,
            placement_games: 10,
            placement_multiplier: 2,
        }
    }
}

impl ScoringRules {
    pub fn elo(elo_k: u32) -> Self { ScoringRules { mode: ScoringMode::Elo, elo_k, ..Self::default() } }

    pub fn fixed(fixed_bonus: u32) -> Self {
        ScoringRules { mode: ScoringMode::Fixed, fixed_bonus, ..Self::default() }
    }
}

impl Rules {
    pub fn verify(&self) -> Result<(), RulesError> {
        if self.scoring.elo_k == 0 {
            return Err(RulesError::ZeroEloK);
        }
        if self.scoring.fixed_bonus == 0 {
            return Err(RulesError::ZeroFixedBonus);
        }
        if self.scoring.placement_multiplier == 0 {
            return Err(RulesError::ZeroPlacementMultiplier);
        }
        Ok(())
    }
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesError::ZeroEloK => write!(f, "Elo K-factor must be positive"),
            RulesError::ZeroFixedBonus => write!(f, "fixed win bonus must be positive"),
            RulesError::ZeroPlacementMultiplier => write!(f, "placement multiplier must be positive"),
        }
    }
}

impl std::error::Error for RulesError {}
