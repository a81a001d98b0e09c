//! Fee Accumulator Contract
//!
//! Stakers lock the staking token and earn a pro-rata share of collateral
//! and debt-token fees injected by the designated fee sources. Fees are
//! distributed in O(1) through the `FeeState` accumulators; each staker's
//! gains are paid out whenever they stake, unstake or claim.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::{CdpError, OrRevert};
use crate::events::{
    AdminTransferred, FeeCollateralUpdated, FeeDebtUpdated, StakeChanged,
    StakingGainsWithdrawn, TotalStakedUpdated,
};
use crate::fee_distribution::{FeeState, StakingGains};
use crate::interfaces::Cep18TokenContractRef;
use crate::types::StakerSnapshot;

/// Token contracts the accumulator moves
#[odra::odra_type]
pub struct TokenAddresses {
    /// Token stakers lock
    pub staking_token: Address,
    /// Collateral fee asset
    pub collateral_token: Address,
    /// Debt fee asset
    pub debt_token: Address,
}

/// Fee Accumulator Contract
#[odra::module(events = [
    StakeChanged,
    StakingGainsWithdrawn,
    FeeCollateralUpdated,
    FeeDebtUpdated,
    TotalStakedUpdated,
    AdminTransferred
])]
pub struct FeeAccumulator {
    /// Admin allowed to configure tokens and fee sources
    admin: Var<Address>,
    /// Token addresses
    tokens: Var<TokenAddresses>,
    /// Contracts allowed to inject fees
    fee_sources: Mapping<Address, bool>,
    /// Global accumulators and total staked
    state: Var<FeeState>,
    /// Staked amount per staker
    stakes: Mapping<Address, U256>,
    /// Accumulator snapshot per staker
    snapshots: Mapping<Address, StakerSnapshot>,
}

#[odra::module]
impl FeeAccumulator {
    pub fn init(&mut self, admin: Address) {
        self.admin.set(admin);
        self.state.set(FeeState::default());
    }

    // ========== Staking ==========

    /// Stake `amount` of the staking token, paying out any pending gains first.
    pub fn stake(&mut self, amount: U256) {
        let staker = self.env().caller();
        let tokens = self.require_tokens();
        let mut state = self.state.get().unwrap_or_default();
        let mut stake = self.get_stake(staker);
        let mut snapshot = self.get_snapshot(staker);

        let gains = state.stake(&mut stake, &mut snapshot, amount).or_revert(&self.env());
        self.store_staker(staker, stake, snapshot);
        self.state.set(state.clone());

        let self_address = self.env().self_address();
        let mut staking_token = Cep18TokenContractRef::new(self.env().clone(), tokens.staking_token);
        if !staking_token.transfer_from(staker, self_address, amount) {
            self.env().revert(CdpError::TokenTransferFailed);
        }
        self.pay_out(staker, &tokens, gains);

        self.env().emit_event(StakeChanged { staker, new_stake: stake });
        self.env().emit_event(TotalStakedUpdated { total_staked: state.total_staked });
    }

    /// Unstake `amount`, paying out pending gains. A zero amount only claims.
    pub fn unstake(&mut self, amount: U256) {
        let staker = self.env().caller();
        let tokens = self.require_tokens();
        let mut state = self.state.get().unwrap_or_default();
        let mut stake = self.get_stake(staker);
        let mut snapshot = self.get_snapshot(staker);

        let gains = state.unstake(&mut stake, &mut snapshot, amount).or_revert(&self.env());
        self.store_staker(staker, stake, snapshot);
        self.state.set(state.clone());

        self.pay_out(staker, &tokens, gains);
        if !amount.is_zero() {
            self.transfer(tokens.staking_token, staker, amount);
        }

        self.env().emit_event(StakeChanged { staker, new_stake: stake });
        self.env().emit_event(TotalStakedUpdated { total_staked: state.total_staked });
    }

    /// Pay out the caller's pending gains without changing their stake.
    pub fn claim(&mut self) {
        let staker = self.env().caller();
        let tokens = self.require_tokens();
        let state = self.state.get().unwrap_or_default();
        let stake = self.get_stake(staker);
        if stake.is_zero() {
            self.env().revert(CdpError::InsufficientStake);
        }
        let mut snapshot = self.get_snapshot(staker);

        let gains = state.sync(stake, &mut snapshot).or_revert(&self.env());
        self.snapshots.set(&staker, snapshot);
        self.pay_out(staker, &tokens, gains);
    }

    // ========== Fee Injection ==========

    /// Record a collateral fee already transferred to this contract.
    pub fn increase_fee_collateral(&mut self, amount: U256) {
        self.require_fee_source();
        let mut state = self.state.get().unwrap_or_default();
        if state.increase_fee_collateral(amount).or_revert(&self.env()) {
            self.env().emit_event(FeeCollateralUpdated { f_collateral: state.f_collateral });
            self.state.set(state);
        }
    }

    /// Record a debt-token fee already transferred to this contract.
    pub fn increase_fee_debt(&mut self, amount: U256) {
        self.require_fee_source();
        let mut state = self.state.get().unwrap_or_default();
        if state.increase_fee_debt(amount).or_revert(&self.env()) {
            self.env().emit_event(FeeDebtUpdated { f_debt: state.f_debt });
            self.state.set(state);
        }
    }

    // ========== Query Functions ==========

    pub fn get_pending_collateral_gain(&self, staker: Address) -> U256 {
        self.pending_gains(staker).collateral
    }

    pub fn get_pending_debt_gain(&self, staker: Address) -> U256 {
        self.pending_gains(staker).debt
    }

    pub fn get_stake(&self, staker: Address) -> U256 {
        self.stakes.get(&staker).unwrap_or(U256::zero())
    }

    pub fn get_snapshot(&self, staker: Address) -> StakerSnapshot {
        self.snapshots.get(&staker).unwrap_or_default()
    }

    pub fn get_total_staked(&self) -> U256 {
        self.state.get().unwrap_or_default().total_staked
    }

    pub fn get_f_collateral(&self) -> U256 {
        self.state.get().unwrap_or_default().f_collateral
    }

    pub fn get_f_debt(&self) -> U256 {
        self.state.get().unwrap_or_default().f_debt
    }

    pub fn is_fee_source(&self, account: Address) -> bool {
        self.fee_sources.get(&account).unwrap_or(false)
    }

    pub fn get_addresses(&self) -> Option<TokenAddresses> {
        self.tokens.get()
    }

    // ========== Configuration ==========

    pub fn set_addresses(&mut self, staking_token: Address, collateral_token: Address, debt_token: Address) {
        self.require_admin();
        self.tokens.set(TokenAddresses {
            staking_token,
            collateral_token,
            debt_token,
        });
    }

    pub fn set_fee_source(&mut self, account: Address, enabled: bool) {
        self.require_admin();
        self.fee_sources.set(&account, enabled);
    }

    pub fn transfer_admin(&mut self, new_admin: Address) {
        let old_admin = self.require_admin();
        self.admin.set(new_admin);
        self.env().emit_event(AdminTransferred { old_admin, new_admin });
    }

    // ========== Internal Functions ==========

    fn pending_gains(&self, staker: Address) -> StakingGains {
        let state = self.state.get().unwrap_or_default();
        let snapshot = self.get_snapshot(staker);
        state.pending_gains(self.get_stake(staker), &snapshot).or_revert(&self.env())
    }

    fn store_staker(&mut self, staker: Address, stake: U256, snapshot: StakerSnapshot) {
        self.stakes.set(&staker, stake);
        self.snapshots.set(&staker, snapshot);
    }

    /// Collateral and debt gains are separate transfers; a zero gain is skipped.
    fn pay_out(&self, staker: Address, tokens: &TokenAddresses, gains: StakingGains) {
        if !gains.collateral.is_zero() {
            self.transfer(tokens.collateral_token, staker, gains.collateral);
        }
        if !gains.debt.is_zero() {
            self.transfer(tokens.debt_token, staker, gains.debt);
        }
        if !gains.is_zero() {
            self.env().emit_event(StakingGainsWithdrawn {
                staker,
                collateral_gain: gains.collateral,
                debt_gain: gains.debt,
            });
        }
    }

    fn transfer(&self, token: Address, recipient: Address, amount: U256) {
        let mut token = Cep18TokenContractRef::new(self.env().clone(), token);
        if !token.transfer(recipient, amount) {
            self.env().revert(CdpError::TokenTransferFailed);
        }
    }

    fn require_tokens(&self) -> TokenAddresses {
        match self.tokens.get() {
            Some(tokens) => tokens,
            None => self.env().revert(CdpError::InvalidConfig),
        }
    }

    fn require_fee_source(&self) {
        if !self.is_fee_source(self.env().caller()) {
            self.env().revert(CdpError::UnauthorizedProtocol);
        }
    }

    fn require_admin(&self) -> Address {
        let admin = match self.admin.get() {
            Some(admin) => admin,
            None => self.env().revert(CdpError::InvalidConfig),
        };
        if self.env().caller() != admin {
            self.env().revert(CdpError::Unauthorized);
        }
        admin
    }
}
