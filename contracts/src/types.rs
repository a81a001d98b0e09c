//! Common types used across the CDP ledger.

use odra::prelude::*;
use odra::casper_types::U256;

/// Lifecycle status of a position.
///
/// Transitions are one-way except `NonExistent -> Active`. A closed position
/// may be reopened, which starts it fresh as if it never existed.
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum PositionStatus {
    #[default]
    NonExistent,
    Active,
    ClosedByOwner,
    ClosedByLiquidation,
    ClosedByRedemption,
}

impl PositionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, PositionStatus::Active)
    }
}

/// Ledger operation that changed a position
#[odra::odra_type]
#[derive(Copy)]
pub enum PositionOperation {
    Open,
    Adjust,
    Close,
    Redeem,
    Liquidate,
}

/// Per-owner position record
#[odra::odra_type]
#[derive(Default)]
pub struct Position {
    /// Collateral applied to the position (excludes pending rewards)
    pub collateral: U256,
    /// Debt applied to the position (excludes pending rewards)
    pub debt: U256,
    /// Share of total stakes, see `RedistributionState::compute_new_stake`
    pub stake: U256,
    /// Lifecycle status
    pub status: PositionStatus,
}

/// Accumulator values at a position's last sync point
#[odra::odra_type]
#[derive(Default)]
pub struct RewardSnapshot {
    /// `L_Collateral` at last sync
    pub collateral_per_unit_staked: U256,
    /// `L_Debt` at last sync
    pub debt_per_unit_staked: U256,
}

/// Accumulator values at a staker's last interaction
#[odra::odra_type]
#[derive(Default)]
pub struct StakerSnapshot {
    /// `F_Collateral` at last interaction
    pub f_collateral: U256,
    /// `F_Debt` at last interaction
    pub f_debt: U256,
}

/// Health flag reported by an upstream price feed.
///
/// Wire codes `0..=4` follow the declaration order.
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum FeedHealth {
    #[default]
    Live,
    StaleAuthority,
    Untrusted,
    Frozen,
    UntrustedAuthority,
}

impl FeedHealth {
    /// Decode a feed's raw health code. Unknown codes are treated as untrusted.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => FeedHealth::Live,
            1 => FeedHealth::StaleAuthority,
            2 => FeedHealth::Untrusted,
            3 => FeedHealth::Frozen,
            4 => FeedHealth::UntrustedAuthority,
            _ => FeedHealth::Untrusted,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn is_live(&self) -> bool {
        matches!(self, FeedHealth::Live)
    }
}

/// Failover state of the price aggregator
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum OracleStatus {
    /// Both sources trusted
    #[default]
    Primary,
    PrimaryUntrusted,
    BothUntrusted,
    PrimaryFrozenFallbackWorking,
    FallbackUntrusted,
}

impl OracleStatus {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Single reading from an upstream feed
#[odra::odra_type]
#[derive(Copy)]
pub struct FeedReading {
    /// Price scaled by 1e18
    pub price: U256,
    /// Reported health
    pub health: FeedHealth,
}

impl FeedReading {
    pub fn new(price: U256, health: FeedHealth) -> Self {
        Self { price, health }
    }
}

/// Amounts released by a position-lifecycle hook
#[odra::odra_type]
#[derive(Default)]
pub struct ReleasedAmounts {
    pub collateral: U256,
    pub debt: U256,
}
