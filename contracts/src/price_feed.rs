//! Dual-source price failover.
//!
//! Two independent feeds and an index multiplier are combined into one
//! composite price. Primary health is evaluated first; only a live primary
//! lets the secondary feed's health decide the status.
//!
//! | primary            | secondary          | status                        |
//! |--------------------|--------------------|-------------------------------|
//! | Live               | Live               | Primary                       |
//! | Live               | StaleAuthority     | PrimaryUntrusted              |
//! | Live               | Frozen             | PrimaryFrozenFallbackWorking  |
//! | Live               | UntrustedAuthority | FallbackUntrusted             |
//! | Live               | Untrusted          | BothUntrusted                 |
//! | StaleAuthority     | Live               | PrimaryUntrusted              |
//! | Frozen             | Live               | PrimaryFrozenFallbackWorking  |
//! | UntrustedAuthority | Live               | FallbackUntrusted             |
//! | Untrusted          | Live               | BothUntrusted                 |
//! | not Live           | not Live           | BothUntrusted                 |
//!
//! `last_good_price` is refreshed in every status except `BothUntrusted`,
//! and never with a zero composite. A round that would return a zero price
//! fails with `PriceUnavailable` and leaves the state untouched.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::CdpError;
use crate::math::composite_price;
use crate::types::{FeedHealth, FeedReading, OracleStatus};

/// Status implied by a single degraded source while the other one is live.
pub fn status_for(health: FeedHealth) -> OracleStatus {
    match health {
        FeedHealth::Live => OracleStatus::Primary,
        FeedHealth::StaleAuthority => OracleStatus::PrimaryUntrusted,
        FeedHealth::Untrusted => OracleStatus::BothUntrusted,
        FeedHealth::Frozen => OracleStatus::PrimaryFrozenFallbackWorking,
        FeedHealth::UntrustedAuthority => OracleStatus::FallbackUntrusted,
    }
}

/// Status transition for the given pair of feed healths
pub fn next_status(primary: FeedHealth, secondary: FeedHealth) -> OracleStatus {
    match (primary.is_live(), secondary.is_live()) {
        (true, _) => status_for(secondary),
        (false, true) => status_for(primary),
        (false, false) => OracleStatus::BothUntrusted,
    }
}

/// Aggregator state
#[odra::odra_type]
#[derive(Default)]
pub struct OracleState {
    pub status: OracleStatus,
    pub last_good_price: U256,
}

impl OracleState {
    /// Apply one round of feed readings and return the price to use.
    ///
    /// A live feed reporting zero halts the fetch, primary checked first.
    pub fn process(
        &mut self,
        primary: FeedReading,
        secondary: FeedReading,
        index: U256,
    ) -> Result<U256, CdpError> {
        if primary.health.is_live() && primary.price.is_zero() {
            return Err(CdpError::PrimaryPriceZero);
        }
        if secondary.health.is_live() && secondary.price.is_zero() {
            return Err(CdpError::SecondaryPriceZero);
        }
        if primary.health.is_live() && secondary.health.is_live() && index.is_zero() {
            return Err(CdpError::IndexZero);
        }

        let status = next_status(primary.health, secondary.health);
        let mut last_good_price = self.last_good_price;
        if status != OracleStatus::BothUntrusted {
            let price = composite_price(primary.price, secondary.price, index)?;
            if !price.is_zero() {
                last_good_price = price;
            }
        }
        if last_good_price.is_zero() {
            return Err(CdpError::PriceUnavailable);
        }
        self.status = status;
        self.last_good_price = last_good_price;
        Ok(last_good_price)
    }
}
