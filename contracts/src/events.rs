//! Events emitted by the ledger, the fee accumulator and the price aggregator.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::types::{OracleStatus, PositionOperation, PositionStatus};

// ========== RedistributionLedger ==========

#[odra::event]
pub struct PositionUpdated {
    pub owner: Address,
    pub collateral: U256,
    pub debt: U256,
    pub stake: U256,
    pub status: PositionStatus,
    pub operation: PositionOperation,
}

#[odra::event]
pub struct PositionLiquidated {
    pub owner: Address,
    pub collateral: U256,
    pub debt: U256,
}

/// Liquidated amounts folded into the accumulators
#[odra::event]
pub struct Redistribution {
    pub collateral: U256,
    pub debt: U256,
    pub l_collateral: U256,
    pub l_debt: U256,
}

#[odra::event]
pub struct TotalStakesUpdated {
    pub total_stakes: U256,
}

#[odra::event]
pub struct SystemSnapshotsUpdated {
    pub total_stakes_snapshot: U256,
    pub total_collateral_snapshot: U256,
}

#[odra::event]
pub struct RewardSnapshotsUpdated {
    pub owner: Address,
    pub l_collateral: U256,
    pub l_debt: U256,
}

#[odra::event]
pub struct DebtLimitUpdated {
    pub old_limit: U256,
    pub new_limit: U256,
}

// ========== FeeAccumulator ==========

#[odra::event]
pub struct StakeChanged {
    pub staker: Address,
    pub new_stake: U256,
}

#[odra::event]
pub struct StakingGainsWithdrawn {
    pub staker: Address,
    pub collateral_gain: U256,
    pub debt_gain: U256,
}

#[odra::event]
pub struct FeeCollateralUpdated {
    pub f_collateral: U256,
}

#[odra::event]
pub struct FeeDebtUpdated {
    pub f_debt: U256,
}

#[odra::event]
pub struct TotalStakedUpdated {
    pub total_staked: U256,
}

// ========== OracleAggregator ==========

#[odra::event]
pub struct PriceFeedStatusChanged {
    pub old_status: OracleStatus,
    pub new_status: OracleStatus,
}

#[odra::event]
pub struct LastGoodPriceUpdated {
    pub last_good_price: U256,
}

// ========== Admin ==========

#[odra::event]
pub struct AdminTransferred {
    pub old_admin: Address,
    pub new_admin: Address,
}
