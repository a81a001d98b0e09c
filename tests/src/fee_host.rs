//! Fee accumulator driven through the Odra host environment.

use cdp_ledger_contracts::errors::CdpError;
use cdp_ledger_contracts::fee_accumulator::{FeeAccumulator, FeeAccumulatorHostRef, FeeAccumulatorInitArgs};
use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
use odra::prelude::{Address, Addressable};
use pretty_assertions::assert_eq;

use crate::mocks::{MockToken, MockTokenHostRef};

const E18: u128 = 1_000_000_000_000_000_000;

fn dec(value: u64) -> U256 {
    U256::from(value) * U256::from(E18)
}

struct Setup {
    env: HostEnv,
    fees: FeeAccumulatorHostRef,
    staking: MockTokenHostRef,
    collateral: MockTokenHostRef,
    debt: MockTokenHostRef,
    fee_source: Address,
}

fn setup() -> Setup {
    let env = odra_test::env();
    let admin = env.get_account(0);
    let fee_source = env.get_account(1);

    env.set_caller(admin);
    let staking = MockToken::deploy(&env, NoArgs);
    let collateral = MockToken::deploy(&env, NoArgs);
    let debt = MockToken::deploy(&env, NoArgs);
    let mut fees = FeeAccumulator::deploy(&env, FeeAccumulatorInitArgs { admin });
    fees.set_addresses(
        staking.address().clone(),
        collateral.address().clone(),
        debt.address().clone(),
    );
    fees.set_fee_source(fee_source, true);

    Setup {
        env,
        fees,
        staking,
        collateral,
        debt,
        fee_source,
    }
}

impl Setup {
    fn stake(&mut self, staker: Address, amount: U256) {
        self.staking.mint(staker, amount);
        self.env.set_caller(staker);
        self.staking.approve(self.fees.address().clone(), amount);
        self.fees.stake(amount);
    }

    fn inject(&mut self, collateral_fee: U256, debt_fee: U256) {
        let pool = self.fees.address().clone();
        self.collateral.mint(pool, collateral_fee);
        self.debt.mint(pool, debt_fee);
        self.env.set_caller(self.fee_source);
        self.fees.increase_fee_collateral(collateral_fee);
        self.fees.increase_fee_debt(debt_fee);
    }
}

#[test]
fn stakers_share_fees_by_stake() {
    let mut s = setup();
    let (a, b) = (s.env.get_account(5), s.env.get_account(6));
    s.stake(a, dec(100));
    s.stake(b, dec(300));
    assert_eq!(s.fees.get_total_staked(), dec(400));
    assert_eq!(s.staking.balance_of(s.fees.address().clone()), dec(400));

    s.inject(dec(8), dec(40));
    assert_eq!(s.fees.get_pending_collateral_gain(a), dec(2));
    assert_eq!(s.fees.get_pending_collateral_gain(b), dec(6));
    assert_eq!(s.fees.get_pending_debt_gain(b), dec(30));

    s.env.set_caller(a);
    s.fees.unstake(dec(100));
    assert_eq!(s.collateral.balance_of(a), dec(2));
    assert_eq!(s.debt.balance_of(a), dec(10));
    assert_eq!(s.staking.balance_of(a), dec(100));
    assert!(s.fees.get_stake(a).is_zero());

    s.env.set_caller(b);
    s.fees.claim();
    assert_eq!(s.collateral.balance_of(b), dec(6));
    assert_eq!(s.debt.balance_of(b), dec(30));
    assert_eq!(s.fees.get_stake(b), dec(300));

    // Nothing new to claim
    s.fees.claim();
    assert_eq!(s.collateral.balance_of(b), dec(6));
}

#[test]
fn fee_with_no_stakers_is_not_accumulated() {
    let mut s = setup();
    s.inject(dec(5), dec(5));
    assert!(s.fees.get_f_collateral().is_zero());
    assert!(s.fees.get_f_debt().is_zero());

    let a = s.env.get_account(5);
    s.stake(a, dec(10));
    assert!(s.fees.get_pending_collateral_gain(a).is_zero());
}

#[test]
fn staking_validations() {
    let mut s = setup();
    let a = s.env.get_account(5);

    s.env.set_caller(a);
    assert_eq!(s.fees.try_stake(U256::zero()), Err(CdpError::InvalidAmount.into()));
    assert_eq!(s.fees.try_unstake(dec(1)), Err(CdpError::InsufficientStake.into()));
    assert_eq!(s.fees.try_claim(), Err(CdpError::InsufficientStake.into()));

    s.stake(a, dec(10));
    s.env.set_caller(a);
    assert_eq!(s.fees.try_unstake(dec(11)), Err(CdpError::InsufficientStake.into()));
}

#[test]
fn stake_without_allowance_fails() {
    let s = setup();
    let mut fees = s.fees;
    let mut staking = s.staking;
    let a = s.env.get_account(5);
    staking.mint(a, dec(10));

    s.env.set_caller(a);
    assert_eq!(fees.try_stake(dec(10)), Err(CdpError::TokenTransferFailed.into()));
    assert!(fees.get_total_staked().is_zero());
}

#[test]
fn only_fee_sources_inject() {
    let mut s = setup();
    s.env.set_caller(s.env.get_account(7));
    assert_eq!(
        s.fees.try_increase_fee_collateral(dec(1)),
        Err(CdpError::UnauthorizedProtocol.into())
    );
    assert_eq!(
        s.fees.try_set_fee_source(s.env.get_account(7), true),
        Err(CdpError::Unauthorized.into())
    );
}
