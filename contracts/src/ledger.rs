//! Redistribution Ledger Contract
//!
//! Owns every position's collateral, debt, stake and reward snapshot, the
//! global redistribution accumulators and the debt ceiling.
//!
//! Position lifecycle hooks and targeted liquidations are called by
//! operators (the borrowing and liquidation wrappers). `liquidate_positions`
//! is public: it prices the system through the oracle aggregator and walks
//! the sorted position list from the riskiest end.
//!
//! Every entry point works on copies of the stored state and writes back
//! only after the whole operation succeeded.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::debt_ceiling::DebtCeiling;
use crate::errors::{CdpError, OrRevert};
use crate::events::{
    AdminTransferred, DebtLimitUpdated, PositionLiquidated, PositionUpdated, Redistribution,
    RewardSnapshotsUpdated, SystemSnapshotsUpdated, TotalStakesUpdated,
};
use crate::interfaces::{
    collect_undercollateralized, OrderedPositions, PriceOracleContractRef, SortedPositionsContractRef,
};
use crate::math::{checked_add, collateral_ratio};
use crate::redistribution::{LiquidationTotals, RedistributionState};
use crate::types::{Position, PositionOperation, PositionStatus, ReleasedAmounts, RewardSnapshot};

/// Redistribution Ledger Contract
#[odra::module(events = [
    PositionUpdated,
    PositionLiquidated,
    Redistribution,
    TotalStakesUpdated,
    SystemSnapshotsUpdated,
    RewardSnapshotsUpdated,
    DebtLimitUpdated,
    AdminTransferred
])]
pub struct RedistributionLedger {
    /// Admin allowed to configure the ledger
    admin: Var<Address>,
    /// Contracts allowed to drive position hooks and targeted liquidations
    operators: Mapping<Address, bool>,
    /// Oracle aggregator used by `liquidate_positions`
    oracle: Var<Address>,
    /// Positions ordered by collateral ratio
    sorted_positions: Var<Address>,
    /// Accumulators, stakes, snapshots and balance buckets
    state: Var<RedistributionState>,
    /// Aggregate debt limit
    debt_ceiling: Var<DebtCeiling>,
    /// Position per owner
    positions: Mapping<Address, Position>,
    /// Reward snapshot per owner
    reward_snapshots: Mapping<Address, RewardSnapshot>,
}

#[odra::module]
impl RedistributionLedger {
    pub fn init(&mut self, admin: Address) {
        self.admin.set(admin);
        self.state.set(RedistributionState::default());
        self.debt_ceiling.set(DebtCeiling::default());
    }

    // ========== Position Hooks ==========

    /// Open a position for `owner`. A closed position starts over fresh.
    pub fn open_position(&mut self, owner: Address, collateral: U256, debt: U256) {
        self.require_operator();
        let mut state = self.load_state();
        let system_debt = state.entire_system_debt().or_revert(&self.env());
        self.get_debt_ceiling_state()
            .check_issuance(system_debt, debt)
            .or_revert(&self.env());

        let mut position = self.get_position(owner);
        let mut snapshot = self.get_reward_snapshot(owner);
        state
            .open_position(&mut position, &mut snapshot, collateral, debt)
            .or_revert(&self.env());

        self.store_position(owner, position, snapshot, PositionOperation::Open);
        self.store_state(state);
    }

    /// Sync pending rewards, apply the deltas and re-derive the stake.
    pub fn adjust_position(
        &mut self,
        owner: Address,
        collateral_change: U256,
        is_collateral_increase: bool,
        debt_change: U256,
        is_debt_increase: bool,
    ) {
        self.require_operator();
        let mut state = self.load_state();
        if is_debt_increase {
            let system_debt = state.entire_system_debt().or_revert(&self.env());
            self.get_debt_ceiling_state()
                .check_issuance(system_debt, debt_change)
                .or_revert(&self.env());
        }

        let mut position = self.get_position(owner);
        let mut snapshot = self.get_reward_snapshot(owner);
        state
            .adjust_position(
                &mut position,
                &mut snapshot,
                collateral_change,
                is_collateral_increase,
                debt_change,
                is_debt_increase,
            )
            .or_revert(&self.env());

        self.store_position(owner, position, snapshot, PositionOperation::Adjust);
        self.store_state(state);
    }

    /// Close the position and return what it held, rewards included.
    pub fn close_position(&mut self, owner: Address) -> ReleasedAmounts {
        self.require_operator();
        let mut state = self.load_state();
        let mut position = self.get_position(owner);
        let mut snapshot = self.get_reward_snapshot(owner);
        let released = state
            .close_position(&mut position, &mut snapshot, PositionStatus::ClosedByOwner)
            .or_revert(&self.env());

        self.store_position(owner, position, snapshot, PositionOperation::Close);
        self.store_state(state);
        released
    }

    /// Cancel `debt_amount` of the position's debt against `collateral_amount`
    /// of its collateral. Returns the collateral released to the owner if the
    /// position was fully redeemed.
    pub fn redeem_from_position(
        &mut self,
        owner: Address,
        debt_amount: U256,
        collateral_amount: U256,
    ) -> ReleasedAmounts {
        self.require_operator();
        let mut state = self.load_state();
        let mut position = self.get_position(owner);
        let mut snapshot = self.get_reward_snapshot(owner);
        let released = state
            .redeem_from_position(&mut position, &mut snapshot, debt_amount, collateral_amount)
            .or_revert(&self.env());

        self.store_position(owner, position, snapshot, PositionOperation::Redeem);
        self.store_state(state);
        released
    }

    // ========== Liquidation ==========

    /// Liquidate a single active position.
    pub fn liquidate(&mut self, owner: Address) {
        self.require_operator();
        if !self.get_position(owner).status.is_active() {
            self.env().revert(CdpError::PositionNotActive);
        }
        self.liquidate_batch(Vec::from([owner]));
    }

    /// Liquidate every listed active position with one redistribution.
    /// Inactive and repeated entries are skipped.
    pub fn batch_liquidate(&mut self, owners: Vec<Address>) -> LiquidationTotals {
        self.require_operator();
        self.liquidate_batch(owners)
    }

    /// Liquidate up to `max_count` positions below MCR, starting from the
    /// lowest collateral ratio.
    ///
    /// Reverts with `PriceUnavailable` on a zero price, `NotLiquidatable` if
    /// the riskiest position is healthy and `NothingToLiquidate` on an empty
    /// list.
    pub fn liquidate_positions(&mut self, max_count: u32) -> LiquidationTotals {
        let oracle = self.require_address(self.oracle.get());
        let sorted = self.require_address(self.sorted_positions.get());

        let price = PriceOracleContractRef::new(self.env().clone(), oracle).fetch_price();
        if price.is_zero() {
            self.env().revert(CdpError::PriceUnavailable);
        }
        let sorted = SortedPositionsContractRef::new(self.env().clone(), sorted);
        let state = self.load_state();

        let candidates = collect_undercollateralized(&sorted, max_count, |owner| {
            let position = self.get_position(*owner);
            let snapshot = self.get_reward_snapshot(*owner);
            let (collateral, debt) = state.entire_collateral_and_debt(&position, &snapshot)?;
            collateral_ratio(collateral, debt, price)
        })
        .or_revert(&self.env());

        if candidates.is_empty() && max_count > 0 && sorted.first().is_some() {
            self.env().revert(CdpError::NotLiquidatable);
        }
        self.liquidate_batch(candidates)
    }

    // ========== Debt Ceiling ==========

    /// Replace the aggregate debt limit. `U256::MAX` means no limit.
    pub fn set_debt_limit(&mut self, new_limit: U256) {
        self.require_admin();
        let system_debt = self.load_state().entire_system_debt().or_revert(&self.env());
        let mut ceiling = self.get_debt_ceiling_state();
        let old_limit = ceiling.limit;
        ceiling.set_limit(new_limit, system_debt).or_revert(&self.env());
        self.debt_ceiling.set(ceiling);
        self.env().emit_event(DebtLimitUpdated { old_limit, new_limit });
    }

    /// Reverts with `DebtLimitExceeded` if `additional_debt` cannot be issued.
    pub fn check_issuance(&self, additional_debt: U256) {
        let system_debt = self.load_state().entire_system_debt().or_revert(&self.env());
        self.get_debt_ceiling_state()
            .check_issuance(system_debt, additional_debt)
            .or_revert(&self.env());
    }

    pub fn get_debt_limit(&self) -> U256 {
        self.get_debt_ceiling_state().limit
    }

    pub fn get_debt_headroom(&self) -> U256 {
        let system_debt = self.load_state().entire_system_debt().or_revert(&self.env());
        self.get_debt_ceiling_state().headroom(system_debt)
    }

    // ========== Query Functions ==========

    pub fn get_position(&self, owner: Address) -> Position {
        self.positions.get(&owner).unwrap_or_default()
    }

    pub fn get_reward_snapshot(&self, owner: Address) -> RewardSnapshot {
        self.reward_snapshots.get(&owner).unwrap_or_default()
    }

    pub fn get_pending_collateral_reward(&self, owner: Address) -> U256 {
        self.pending_rewards(owner).0
    }

    pub fn get_pending_debt_reward(&self, owner: Address) -> U256 {
        self.pending_rewards(owner).1
    }

    pub fn has_pending_rewards(&self, owner: Address) -> bool {
        let position = self.get_position(owner);
        let snapshot = self.get_reward_snapshot(owner);
        self.load_state().has_pending_rewards(&position, &snapshot)
    }

    /// Collateral and debt including pending rewards
    pub fn get_entire_debt_and_coll(&self, owner: Address) -> ReleasedAmounts {
        let position = self.get_position(owner);
        let snapshot = self.get_reward_snapshot(owner);
        let (collateral, debt) = self
            .load_state()
            .entire_collateral_and_debt(&position, &snapshot)
            .or_revert(&self.env());
        ReleasedAmounts { collateral, debt }
    }

    /// Collateral ratio at `price`, pending rewards included
    pub fn get_current_icr(&self, owner: Address, price: U256) -> U256 {
        let entire = self.get_entire_debt_and_coll(owner);
        collateral_ratio(entire.collateral, entire.debt, price).or_revert(&self.env())
    }

    pub fn get_redistribution_state(&self) -> RedistributionState {
        self.load_state()
    }

    pub fn get_total_stakes(&self) -> U256 {
        self.load_state().total_stakes
    }

    pub fn get_total_stakes_snapshot(&self) -> U256 {
        self.load_state().total_stakes_snapshot
    }

    pub fn get_total_collateral_snapshot(&self) -> U256 {
        self.load_state().total_collateral_snapshot
    }

    pub fn get_l_collateral(&self) -> U256 {
        self.load_state().l_collateral
    }

    pub fn get_l_debt(&self) -> U256 {
        self.load_state().l_debt
    }

    pub fn get_active_collateral(&self) -> U256 {
        self.load_state().active_collateral
    }

    pub fn get_active_debt(&self) -> U256 {
        self.load_state().active_debt
    }

    pub fn get_pending_collateral(&self) -> U256 {
        self.load_state().pending_collateral
    }

    pub fn get_pending_debt(&self) -> U256 {
        self.load_state().pending_debt
    }

    pub fn get_entire_system_debt(&self) -> U256 {
        self.load_state().entire_system_debt().or_revert(&self.env())
    }

    pub fn get_entire_system_collateral(&self) -> U256 {
        self.load_state().entire_system_collateral().or_revert(&self.env())
    }

    pub fn is_operator(&self, account: Address) -> bool {
        self.operators.get(&account).unwrap_or(false)
    }

    // ========== Configuration ==========

    pub fn set_operator(&mut self, account: Address, enabled: bool) {
        self.require_admin();
        self.operators.set(&account, enabled);
    }

    pub fn set_oracle(&mut self, oracle: Address) {
        self.require_admin();
        self.oracle.set(oracle);
    }

    pub fn set_sorted_positions(&mut self, sorted_positions: Address) {
        self.require_admin();
        self.sorted_positions.set(sorted_positions);
    }

    pub fn get_oracle(&self) -> Option<Address> {
        self.oracle.get()
    }

    pub fn get_sorted_positions(&self) -> Option<Address> {
        self.sorted_positions.get()
    }

    pub fn transfer_admin(&mut self, new_admin: Address) {
        let old_admin = self.require_admin();
        self.admin.set(new_admin);
        self.env().emit_event(AdminTransferred { old_admin, new_admin });
    }

    // ========== Internal Functions ==========

    fn liquidate_batch(&mut self, owners: Vec<Address>) -> LiquidationTotals {
        let mut state = self.load_state();
        let mut closed: Vec<(Address, Position, RewardSnapshot, ReleasedAmounts)> = Vec::new();
        let mut totals = LiquidationTotals::default();

        for owner in owners {
            if closed.iter().any(|(seen, ..)| *seen == owner) {
                continue;
            }
            let mut position = self.get_position(owner);
            if !position.status.is_active() {
                continue;
            }
            let mut snapshot = self.get_reward_snapshot(owner);
            let released = state
                .close_for_liquidation(&mut position, &mut snapshot)
                .or_revert(&self.env());

            totals.count += 1;
            totals.collateral = checked_add(totals.collateral, released.collateral).or_revert(&self.env());
            totals.debt = checked_add(totals.debt, released.debt).or_revert(&self.env());
            closed.push((owner, position, snapshot, released));
        }

        if totals.count == 0 {
            self.env().revert(CdpError::NothingToLiquidate);
        }
        state
            .apply_liquidation(totals.collateral, totals.debt)
            .or_revert(&self.env());

        for (owner, position, snapshot, released) in closed {
            self.store_position(owner, position, snapshot, PositionOperation::Liquidate);
            self.env().emit_event(PositionLiquidated {
                owner,
                collateral: released.collateral,
                debt: released.debt,
            });
        }
        self.env().emit_event(Redistribution {
            collateral: totals.collateral,
            debt: totals.debt,
            l_collateral: state.l_collateral,
            l_debt: state.l_debt,
        });
        self.env().emit_event(SystemSnapshotsUpdated {
            total_stakes_snapshot: state.total_stakes_snapshot,
            total_collateral_snapshot: state.total_collateral_snapshot,
        });
        self.store_state(state);
        totals
    }

    fn pending_rewards(&self, owner: Address) -> (U256, U256) {
        let position = self.get_position(owner);
        let snapshot = self.get_reward_snapshot(owner);
        self.load_state()
            .pending_rewards(&position, &snapshot)
            .or_revert(&self.env())
    }

    fn store_position(
        &mut self,
        owner: Address,
        position: Position,
        snapshot: RewardSnapshot,
        operation: PositionOperation,
    ) {
        self.env().emit_event(PositionUpdated {
            owner,
            collateral: position.collateral,
            debt: position.debt,
            stake: position.stake,
            status: position.status,
            operation,
        });
        self.env().emit_event(RewardSnapshotsUpdated {
            owner,
            l_collateral: snapshot.collateral_per_unit_staked,
            l_debt: snapshot.debt_per_unit_staked,
        });
        self.positions.set(&owner, position);
        self.reward_snapshots.set(&owner, snapshot);
    }

    fn load_state(&self) -> RedistributionState {
        self.state.get().unwrap_or_default()
    }

    fn store_state(&mut self, state: RedistributionState) {
        self.env().emit_event(TotalStakesUpdated {
            total_stakes: state.total_stakes,
        });
        self.state.set(state);
    }

    fn get_debt_ceiling_state(&self) -> DebtCeiling {
        self.debt_ceiling.get().unwrap_or_default()
    }

    fn require_address(&self, address: Option<Address>) -> Address {
        match address {
            Some(address) => address,
            None => self.env().revert(CdpError::InvalidConfig),
        }
    }

    fn require_operator(&self) {
        if !self.is_operator(self.env().caller()) {
            self.env().revert(CdpError::UnauthorizedProtocol);
        }
    }

    fn require_admin(&self) -> Address {
        let admin = self.require_address(self.admin.get());
        if self.env().caller() != admin {
            self.env().revert(CdpError::Unauthorized);
        }
        admin
    }
}
