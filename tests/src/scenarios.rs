//! Multi-step scenarios on the pure accounting types.

use cdp_ledger_contracts::debt_ceiling::DebtCeiling;
use cdp_ledger_contracts::errors::CdpError;
use cdp_ledger_contracts::fee_distribution::FeeState;
use cdp_ledger_contracts::price_feed::OracleState;
use cdp_ledger_contracts::redistribution::RedistributionState;
use cdp_ledger_contracts::types::*;
use odra::casper_types::U256;
use pretty_assertions::assert_eq;

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

fn dec(value: u64, exp: u32) -> U256 {
    U256::from(value) * pow10(exp)
}

struct Book {
    state: RedistributionState,
    positions: Vec<(Position, RewardSnapshot)>,
}

impl Book {
    fn new() -> Self {
        Self {
            state: RedistributionState::default(),
            positions: Vec::new(),
        }
    }

    fn open(&mut self, collateral: U256, debt: U256) -> usize {
        let mut position = Position::default();
        let mut snapshot = RewardSnapshot::default();
        self.state
            .open_position(&mut position, &mut snapshot, collateral, debt)
            .unwrap();
        self.positions.push((position, snapshot));
        self.positions.len() - 1
    }

    fn liquidate(&mut self, id: usize) -> ReleasedAmounts {
        let (position, snapshot) = &mut self.positions[id];
        let released = self.state.close_for_liquidation(position, snapshot).unwrap();
        self.state
            .apply_liquidation(released.collateral, released.debt)
            .unwrap();
        released
    }

    fn repay_one_unit(&mut self, id: usize) {
        let (position, snapshot) = &mut self.positions[id];
        self.state
            .adjust_position(position, snapshot, U256::zero(), false, U256::one(), false)
            .unwrap();
    }

    fn position(&self, id: usize) -> &Position {
        &self.positions[id].0
    }

    fn pending_total(&self) -> (U256, U256) {
        self.positions
            .iter()
            .filter(|(position, _)| position.status.is_active())
            .fold((U256::zero(), U256::zero()), |(c, d), (position, snapshot)| {
                let (pc, pd) = self.state.pending_rewards(position, snapshot).unwrap();
                (c + pc, d + pd)
            })
    }
}

#[test]
fn stake_ratio_never_increases_over_liquidate_adjust_cycles() {
    let mut book = Book::new();
    let mega = book.open(dec(2, 29), dec(1, 31));
    let b = book.open(dec(4, 28), dec(2, 30));
    for _ in 0..4 {
        book.open(dec(4, 28), dec(2, 30));
    }
    let tiny: Vec<usize> = (0..10).map(|_| book.open(dec(2, 20), dec(1, 22))).collect();

    book.liquidate(mega);
    book.repay_one_unit(b);

    let mut previous = (book.position(b).stake, book.position(b).collateral);
    for id in tiny {
        book.liquidate(id);
        book.repay_one_unit(b);

        let current = (book.position(b).stake, book.position(b).collateral);
        // stake/collateral never rises: s1 * c0 <= s0 * c1
        assert!(current.0 * previous.1 <= previous.0 * current.1);
        assert!(current.0 <= current.1);
        previous = current;
    }
    assert_eq!(book.position(b).status, PositionStatus::Active);
}

#[test]
fn pending_rewards_never_exceed_liquidated_amounts() {
    let mut book = Book::new();
    let ids: Vec<usize> = [7u64, 11, 13, 17, 19, 23, 29, 31]
        .iter()
        .map(|c| book.open(U256::from(*c), U256::from(c / 2 + 1)))
        .collect();

    let mut passed = (U256::zero(), U256::zero());
    let mut bound = U256::zero();
    for id in [ids[0], ids[3], ids[5]] {
        let remaining = book.state.total_stakes - book.position(id).stake;
        let released = book.liquidate(id);
        passed = (passed.0 + released.collateral, passed.1 + released.debt);
        bound = bound + remaining - U256::one();
    }

    let (pending_collateral, pending_debt) = book.pending_total();
    assert_eq!(passed, (U256::from(51u64), U256::from(27u64)));
    assert_eq!((pending_collateral, pending_debt), (U256::from(42u64), U256::from(22u64)));
    assert!(pending_collateral <= book.state.pending_collateral);
    assert!(passed.0 - pending_collateral <= bound);
    assert!(passed.1 - pending_debt <= bound);
}

#[test]
fn redistributed_debt_counts_towards_the_ceiling() {
    let mut book = Book::new();
    let a = book.open(dec(10, 18), dec(4, 18));
    book.open(dec(10, 18), dec(6, 18));
    book.liquidate(a);

    assert_eq!(book.state.active_debt, dec(6, 18));
    assert_eq!(book.state.pending_debt, dec(4, 18));
    let system_debt = book.state.entire_system_debt().unwrap();
    assert_eq!(system_debt, dec(10, 18));

    let mut ceiling = DebtCeiling::default();
    assert_eq!(
        ceiling.set_limit(dec(9, 18), system_debt),
        Err(CdpError::BelowCurrentDebt)
    );
    ceiling.set_limit(dec(12, 18), system_debt).unwrap();
    assert!(ceiling.check_issuance(system_debt, dec(2, 18)).is_ok());
    assert_eq!(
        ceiling.check_issuance(system_debt, dec(2, 18) + U256::one()),
        Err(CdpError::DebtLimitExceeded)
    );
}

#[test]
fn fee_shares_follow_stake_ratio() {
    let mut fees = FeeState::default();
    let stakes = [dec(100, 18), dec(200, 18), dec(300, 18)];
    let mut stakers: Vec<(U256, StakerSnapshot)> = Vec::new();
    for amount in stakes {
        let mut stake = U256::zero();
        let mut snapshot = StakerSnapshot::default();
        fees.stake(&mut stake, &mut snapshot, amount).unwrap();
        stakers.push((stake, snapshot));
    }

    let fee = U256::from(123_456_789_012_345_678_901u128);
    fees.increase_fee_collateral(fee).unwrap();
    fees.increase_fee_debt(fee).unwrap();

    let gains: Vec<_> = stakers
        .iter_mut()
        .map(|(stake, snapshot)| fees.sync(*stake, snapshot).unwrap())
        .collect();

    assert_eq!(gains[1].collateral, gains[0].collateral * U256::from(2u64));
    assert_eq!(gains[2].collateral, gains[0].collateral * U256::from(3u64));
    let total = gains[0].collateral + gains[1].collateral + gains[2].collateral;
    assert!(total <= fee);
    assert!(fee - total < U256::from(stakes.len() as u64) * U256::from(1_000u64));
    assert_eq!(gains[0].collateral, gains[0].debt);

    // A second sync pays nothing
    for (stake, snapshot) in stakers.iter_mut() {
        assert!(fees.sync(*stake, snapshot).unwrap().is_zero());
    }
}

#[test]
fn fee_before_any_stake_is_forfeited() {
    let mut fees = FeeState::default();
    assert!(!fees.increase_fee_collateral(dec(5, 18)).unwrap());

    let mut stake = U256::zero();
    let mut snapshot = StakerSnapshot::default();
    fees.stake(&mut stake, &mut snapshot, dec(1, 18)).unwrap();
    assert!(fees.pending_gains(stake, &snapshot).unwrap().is_zero());
}

#[test]
fn oracle_failover_keeps_price_through_outage() {
    let p1 = U256::from(4_100_682_166_650_000_000_000u128);
    let p2 = U256::from(141_193_844_780_215_400u128);
    let index = U256::from(41_428_690_506u64);
    let good = U256::from(23_986_842_311_112_663_398_400u128);

    let mut oracle = OracleState::default();
    let live = |price| FeedReading::new(price, FeedHealth::Live);

    assert_eq!(oracle.process(live(p1), live(p2), index), Ok(good));
    assert_eq!(oracle.status, OracleStatus::Primary);

    let outage = oracle.process(
        FeedReading::new(p1 * U256::from(3u64), FeedHealth::UntrustedAuthority),
        FeedReading::new(p2, FeedHealth::Frozen),
        index,
    );
    assert_eq!(outage, Ok(good));
    assert_eq!(oracle.status, OracleStatus::BothUntrusted);
    assert_eq!(oracle.last_good_price, good);

    assert_eq!(
        oracle.process(live(U256::zero()), FeedReading::new(p2, FeedHealth::Untrusted), index),
        Err(CdpError::PrimaryPriceZero)
    );
    assert_eq!(oracle.status, OracleStatus::BothUntrusted);
    assert_eq!(oracle.last_good_price, good);
}
