//! Fee revenue sharing for stakers.
//!
//! Fees are spread over the stake present at the moment they arrive by
//! bumping `F_Collateral` / `F_Debt` by `fee * 1e18 / total_staked`. A staker's
//! gain is `stake * (F - snapshot) / 1e18`, paid out and re-snapshotted on
//! every interaction. A fee that arrives while nothing is staked is not
//! accumulated.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::CdpError;
use crate::math::{accrued_since, checked_add, checked_sub, per_unit_staked};
use crate::types::StakerSnapshot;

/// Global fee accumulator state
#[odra::odra_type]
#[derive(Default)]
pub struct FeeState {
    /// Cumulative collateral fee per unit staked (1e18 scaled)
    pub f_collateral: U256,
    /// Cumulative debt-token fee per unit staked (1e18 scaled)
    pub f_debt: U256,
    /// Total staking tokens staked
    pub total_staked: U256,
}

/// Gains paid to a staker on sync
#[odra::odra_type]
#[derive(Copy, Default)]
pub struct StakingGains {
    pub collateral: U256,
    pub debt: U256,
}

impl StakingGains {
    pub fn is_zero(&self) -> bool {
        self.collateral.is_zero() && self.debt.is_zero()
    }
}

impl FeeState {
    pub fn pending_gains(&self, stake: U256, snapshot: &StakerSnapshot) -> Result<StakingGains, CdpError> {
        if stake.is_zero() {
            return Ok(StakingGains::default());
        }
        Ok(StakingGains {
            collateral: accrued_since(stake, self.f_collateral, snapshot.f_collateral)?,
            debt: accrued_since(stake, self.f_debt, snapshot.f_debt)?,
        })
    }

    /// Compute the staker's gains and move the snapshot to the current
    /// accumulators. A second call with no fee in between yields zero.
    pub fn sync(&self, stake: U256, snapshot: &mut StakerSnapshot) -> Result<StakingGains, CdpError> {
        let gains = self.pending_gains(stake, snapshot)?;
        snapshot.f_collateral = self.f_collateral;
        snapshot.f_debt = self.f_debt;
        Ok(gains)
    }

    /// Sync the staker and add `amount` to their stake.
    pub fn stake(
        &mut self,
        stake: &mut U256,
        snapshot: &mut StakerSnapshot,
        amount: U256,
    ) -> Result<StakingGains, CdpError> {
        if amount.is_zero() {
            return Err(CdpError::InvalidAmount);
        }
        let gains = self.sync(*stake, snapshot)?;
        let new_stake = checked_add(*stake, amount)?;
        self.total_staked = checked_add(self.total_staked, amount)?;
        *stake = new_stake;
        Ok(gains)
    }

    /// Sync the staker and remove `amount` from their stake.
    ///
    /// A zero `amount` only pays out gains. A stake that drops to zero loses
    /// its snapshot.
    pub fn unstake(
        &mut self,
        stake: &mut U256,
        snapshot: &mut StakerSnapshot,
        amount: U256,
    ) -> Result<StakingGains, CdpError> {
        if stake.is_zero() || amount > *stake {
            return Err(CdpError::InsufficientStake);
        }
        let gains = self.sync(*stake, snapshot)?;
        *stake = checked_sub(*stake, amount)?;
        self.total_staked = checked_sub(self.total_staked, amount)?;
        if stake.is_zero() {
            *snapshot = StakerSnapshot::default();
        }
        Ok(gains)
    }

    /// Spread a collateral fee over current stakers. Returns `false` when
    /// nothing is staked and the fee is not accumulated.
    pub fn increase_fee_collateral(&mut self, amount: U256) -> Result<bool, CdpError> {
        if self.total_staked.is_zero() {
            return Ok(false);
        }
        let increment = per_unit_staked(amount, self.total_staked)?;
        self.f_collateral = checked_add(self.f_collateral, increment)?;
        Ok(true)
    }

    /// Debt-token counterpart of `increase_fee_collateral`
    pub fn increase_fee_debt(&mut self, amount: U256) -> Result<bool, CdpError> {
        if self.total_staked.is_zero() {
            return Ok(false);
        }
        let increment = per_unit_staked(amount, self.total_staked)?;
        self.f_debt = checked_add(self.f_debt, increment)?;
        Ok(true)
    }
}
