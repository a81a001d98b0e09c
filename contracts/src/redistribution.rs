//! Liquidation redistribution accounting.
//!
//! Liquidated collateral and debt are folded into two global
//! reward-per-unit-stake accumulators (`L_Collateral`, `L_Debt`). A position
//! realises its share lazily: `stake * (L - snapshot)` is pulled into its live
//! balances the next time it is synced, so no operation iterates positions.
//!
//! Balances are tracked in two buckets:
//! - active: collateral/debt already applied to a position's live balances
//! - pending: redistributed amounts not yet pulled into any position
//!
//! Stakes are re-derived from the `total_stakes_snapshot /
//! total_collateral_snapshot` ratio taken after the latest liquidation, not
//! from live totals, because live totals include rewards that have not been
//! applied yet. Each liquidation lowers that ratio, so a position's
//! stake-to-collateral ratio slowly decays across liquidate+adjust cycles.
//!
//! Truncation leaves at most `total_stakes - 1` smallest units undistributed
//! per liquidation. The residual stays in the pending bucket for good.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::CdpError;
use crate::math::{accrued_since, checked_add, checked_sub, per_unit_staked, mul_div};
use crate::types::{Position, PositionStatus, ReleasedAmounts, RewardSnapshot};

/// Global redistribution state
#[odra::odra_type]
#[derive(Default)]
pub struct RedistributionState {
    /// Sum of stakes of all active positions
    pub total_stakes: U256,
    /// `total_stakes` right after the latest liquidation
    pub total_stakes_snapshot: U256,
    /// System collateral right after the latest liquidation
    pub total_collateral_snapshot: U256,
    /// Cumulative collateral reward per unit staked (1e18 scaled)
    pub l_collateral: U256,
    /// Cumulative debt reward per unit staked (1e18 scaled)
    pub l_debt: U256,
    /// Collateral applied to active positions
    pub active_collateral: U256,
    /// Debt applied to active positions
    pub active_debt: U256,
    /// Redistributed collateral not yet pulled into positions
    pub pending_collateral: U256,
    /// Redistributed debt not yet pulled into positions
    pub pending_debt: U256,
}

/// Outcome of a liquidation batch
#[odra::odra_type]
#[derive(Default)]
pub struct LiquidationTotals {
    /// Number of positions liquidated
    pub count: u32,
    /// Collateral redistributed
    pub collateral: U256,
    /// Debt redistributed
    pub debt: U256,
}

impl RedistributionState {
    pub fn entire_system_collateral(&self) -> Result<U256, CdpError> {
        checked_add(self.active_collateral, self.pending_collateral)
    }

    pub fn entire_system_debt(&self) -> Result<U256, CdpError> {
        checked_add(self.active_debt, self.pending_debt)
    }

    /// Stake for a position holding `collateral`.
    ///
    /// Before the first liquidation both snapshots are zero and the stake
    /// equals the collateral.
    pub fn compute_new_stake(&self, collateral: U256) -> Result<U256, CdpError> {
        if self.total_collateral_snapshot.is_zero() || self.total_stakes_snapshot.is_zero() {
            return Ok(collateral);
        }
        mul_div(collateral, self.total_stakes_snapshot, self.total_collateral_snapshot)
    }

    /// Pending `(collateral, debt)` reward of a position. Zero when inactive.
    pub fn pending_rewards(
        &self,
        position: &Position,
        snapshot: &RewardSnapshot,
    ) -> Result<(U256, U256), CdpError> {
        if !position.status.is_active() || position.stake.is_zero() {
            return Ok((U256::zero(), U256::zero()));
        }
        let collateral = accrued_since(
            position.stake,
            self.l_collateral,
            snapshot.collateral_per_unit_staked,
        )?;
        let debt = accrued_since(position.stake, self.l_debt, snapshot.debt_per_unit_staked)?;
        Ok((collateral, debt))
    }

    pub fn has_pending_rewards(&self, position: &Position, snapshot: &RewardSnapshot) -> bool {
        position.status.is_active()
            && (snapshot.collateral_per_unit_staked < self.l_collateral
                || snapshot.debt_per_unit_staked < self.l_debt)
    }

    /// Pull pending rewards into the position's live balances and advance its
    /// snapshot to the current accumulators. Returns the applied rewards.
    pub fn sync_rewards(
        &mut self,
        position: &mut Position,
        snapshot: &mut RewardSnapshot,
    ) -> Result<(U256, U256), CdpError> {
        let (collateral, debt) = self.pending_rewards(position, snapshot)?;
        if !collateral.is_zero() || !debt.is_zero() {
            position.collateral = checked_add(position.collateral, collateral)?;
            position.debt = checked_add(position.debt, debt)?;

            self.pending_collateral = checked_sub(self.pending_collateral, collateral)?;
            self.pending_debt = checked_sub(self.pending_debt, debt)?;
            self.active_collateral = checked_add(self.active_collateral, collateral)?;
            self.active_debt = checked_add(self.active_debt, debt)?;
        }
        self.update_reward_snapshot(snapshot);
        Ok((collateral, debt))
    }

    pub fn update_reward_snapshot(&self, snapshot: &mut RewardSnapshot) {
        snapshot.collateral_per_unit_staked = self.l_collateral;
        snapshot.debt_per_unit_staked = self.l_debt;
    }

    /// Re-derive the position's stake from its collateral and fold the change
    /// into `total_stakes`. Returns the new stake.
    pub fn update_stake(&mut self, position: &mut Position) -> Result<U256, CdpError> {
        let new_stake = self.compute_new_stake(position.collateral)?;
        let without_old = checked_sub(self.total_stakes, position.stake)?;
        self.total_stakes = checked_add(without_old, new_stake)?;
        position.stake = new_stake;
        Ok(new_stake)
    }

    pub fn remove_stake(&mut self, position: &mut Position) -> Result<(), CdpError> {
        self.total_stakes = checked_sub(self.total_stakes, position.stake)?;
        position.stake = U256::zero();
        Ok(())
    }

    pub fn open_position(
        &mut self,
        position: &mut Position,
        snapshot: &mut RewardSnapshot,
        collateral: U256,
        debt: U256,
    ) -> Result<U256, CdpError> {
        if position.status.is_active() {
            return Err(CdpError::PositionAlreadyActive);
        }
        *position = Position {
            collateral,
            debt,
            stake: U256::zero(),
            status: PositionStatus::Active,
        };
        self.active_collateral = checked_add(self.active_collateral, collateral)?;
        self.active_debt = checked_add(self.active_debt, debt)?;
        self.update_reward_snapshot(snapshot);
        self.update_stake(position)
    }

    /// Sync, apply the deltas and re-derive the stake.
    pub fn adjust_position(
        &mut self,
        position: &mut Position,
        snapshot: &mut RewardSnapshot,
        collateral_change: U256,
        is_collateral_increase: bool,
        debt_change: U256,
        is_debt_increase: bool,
    ) -> Result<U256, CdpError> {
        require_active(position)?;
        self.sync_rewards(position, snapshot)?;

        if is_collateral_increase {
            position.collateral = checked_add(position.collateral, collateral_change)?;
            self.active_collateral = checked_add(self.active_collateral, collateral_change)?;
        } else {
            position.collateral = position
                .collateral
                .checked_sub(collateral_change)
                .ok_or(CdpError::InsufficientCollateral)?;
            self.active_collateral = checked_sub(self.active_collateral, collateral_change)?;
        }

        if is_debt_increase {
            position.debt = checked_add(position.debt, debt_change)?;
            self.active_debt = checked_add(self.active_debt, debt_change)?;
        } else {
            position.debt = position
                .debt
                .checked_sub(debt_change)
                .ok_or(CdpError::RepayExceedsDebt)?;
            self.active_debt = checked_sub(self.active_debt, debt_change)?;
        }

        self.update_stake(position)
    }

    /// Sync and close a position, releasing its whole balance.
    pub fn close_position(
        &mut self,
        position: &mut Position,
        snapshot: &mut RewardSnapshot,
        closed_status: PositionStatus,
    ) -> Result<ReleasedAmounts, CdpError> {
        require_active(position)?;
        self.sync_rewards(position, snapshot)?;
        self.remove_stake(position)?;

        let released = ReleasedAmounts {
            collateral: position.collateral,
            debt: position.debt,
        };
        self.active_collateral = checked_sub(self.active_collateral, released.collateral)?;
        self.active_debt = checked_sub(self.active_debt, released.debt)?;

        position.collateral = U256::zero();
        position.debt = U256::zero();
        position.status = closed_status;
        Ok(released)
    }

    /// Cancel `debt_amount` against `collateral_amount` of a position.
    ///
    /// A position whose debt reaches zero is closed by redemption and its
    /// leftover collateral is released; otherwise its stake is re-derived.
    pub fn redeem_from_position(
        &mut self,
        position: &mut Position,
        snapshot: &mut RewardSnapshot,
        debt_amount: U256,
        collateral_amount: U256,
    ) -> Result<ReleasedAmounts, CdpError> {
        require_active(position)?;
        self.sync_rewards(position, snapshot)?;

        position.debt = position
            .debt
            .checked_sub(debt_amount)
            .ok_or(CdpError::RepayExceedsDebt)?;
        position.collateral = position
            .collateral
            .checked_sub(collateral_amount)
            .ok_or(CdpError::InsufficientCollateral)?;
        self.active_debt = checked_sub(self.active_debt, debt_amount)?;
        self.active_collateral = checked_sub(self.active_collateral, collateral_amount)?;

        if position.debt.is_zero() {
            return self.close_position(position, snapshot, PositionStatus::ClosedByRedemption);
        }
        self.update_stake(position)?;
        Ok(ReleasedAmounts::default())
    }

    /// Sync, remove the stake and move the position's balances from the
    /// active bucket out for redistribution. Does not touch the accumulators.
    pub fn close_for_liquidation(
        &mut self,
        position: &mut Position,
        snapshot: &mut RewardSnapshot,
    ) -> Result<ReleasedAmounts, CdpError> {
        self.close_position(position, snapshot, PositionStatus::ClosedByLiquidation)
    }

    /// Fold liquidated amounts into the accumulators over the current
    /// `total_stakes` and take the post-liquidation snapshots.
    ///
    /// Fails with no state change if there is no stake left to receive them.
    pub fn apply_liquidation(&mut self, collateral: U256, debt: U256) -> Result<(), CdpError> {
        if self.total_stakes.is_zero() {
            return Err(CdpError::NothingToRedistribute);
        }
        let collateral_increment = per_unit_staked(collateral, self.total_stakes)?;
        let debt_increment = per_unit_staked(debt, self.total_stakes)?;

        let l_collateral = checked_add(self.l_collateral, collateral_increment)?;
        let l_debt = checked_add(self.l_debt, debt_increment)?;
        let pending_collateral = checked_add(self.pending_collateral, collateral)?;
        let pending_debt = checked_add(self.pending_debt, debt)?;

        self.l_collateral = l_collateral;
        self.l_debt = l_debt;
        self.pending_collateral = pending_collateral;
        self.pending_debt = pending_debt;

        self.update_system_snapshots()
    }

    pub fn update_system_snapshots(&mut self) -> Result<(), CdpError> {
        self.total_stakes_snapshot = self.total_stakes;
        self.total_collateral_snapshot = self.entire_system_collateral()?;
        Ok(())
    }

    /// Entire `(collateral, debt)` of a position including pending rewards
    pub fn entire_collateral_and_debt(
        &self,
        position: &Position,
        snapshot: &RewardSnapshot,
    ) -> Result<(U256, U256), CdpError> {
        let (pending_collateral, pending_debt) = self.pending_rewards(position, snapshot)?;
        Ok((
            checked_add(position.collateral, pending_collateral)?,
            checked_add(position.debt, pending_debt)?,
        ))
    }
}

fn require_active(position: &Position) -> Result<(), CdpError> {
    if !position.status.is_active() {
        return Err(CdpError::PositionNotActive);
    }
    Ok(())
}
