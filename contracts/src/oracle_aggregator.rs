//! Oracle Aggregator Contract
//!
//! Combines a primary feed, a secondary feed and an index source into one
//! USD price, with failover driven by each feed's reported health. The
//! transition rules live in `price_feed`; this contract reads the feeds,
//! stores the resulting `OracleState` and emits the changes.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::{CdpError, OrRevert};
use crate::events::{AdminTransferred, LastGoodPriceUpdated, PriceFeedStatusChanged};
use crate::interfaces::{IndexSourceContractRef, PriceFeedContractRef};
use crate::price_feed::OracleState;
use crate::types::{FeedHealth, FeedReading, OracleStatus};

/// Upstream sources read by the aggregator
#[odra::odra_type]
pub struct FeedAddresses {
    pub primary_feed: Address,
    pub secondary_feed: Address,
    pub index_source: Address,
}

/// Oracle Aggregator Contract
#[odra::module(events = [PriceFeedStatusChanged, LastGoodPriceUpdated, AdminTransferred])]
pub struct OracleAggregator {
    /// Admin allowed to configure sources
    admin: Var<Address>,
    /// Feed and index addresses
    feeds: Var<FeedAddresses>,
    /// Failover status and last good price
    state: Var<OracleState>,
}

#[odra::module]
impl OracleAggregator {
    pub fn init(&mut self, admin: Address) {
        self.admin.set(admin);
        self.state.set(OracleState::default());
    }

    // ========== Price ==========

    /// Read both feeds and the index, advance the failover state and
    /// return the price the protocol should use.
    pub fn fetch_price(&mut self) -> U256 {
        let feeds = self.require_feeds();
        let primary = self.read_feed(feeds.primary_feed);
        let secondary = self.read_feed(feeds.secondary_feed);
        let index = IndexSourceContractRef::new(self.env().clone(), feeds.index_source).index();

        let mut state = self.state.get().unwrap_or_default();
        let old = state.clone();
        let price = state.process(primary, secondary, index).or_revert(&self.env());

        if state.status != old.status {
            self.env().emit_event(PriceFeedStatusChanged {
                old_status: old.status,
                new_status: state.status,
            });
        }
        if state.last_good_price != old.last_good_price {
            self.env().emit_event(LastGoodPriceUpdated {
                last_good_price: state.last_good_price,
            });
        }
        self.state.set(state);
        price
    }

    pub fn get_last_good_price(&self) -> U256 {
        self.state.get().unwrap_or_default().last_good_price
    }

    pub fn get_status(&self) -> OracleStatus {
        self.state.get().unwrap_or_default().status
    }

    // ========== Configuration ==========

    pub fn set_addresses(&mut self, primary_feed: Address, secondary_feed: Address, index_source: Address) {
        self.require_admin();
        if primary_feed == secondary_feed {
            self.env().revert(CdpError::InvalidConfig);
        }
        self.feeds.set(FeedAddresses {
            primary_feed,
            secondary_feed,
            index_source,
        });
    }

    pub fn get_addresses(&self) -> Option<FeedAddresses> {
        self.feeds.get()
    }

    pub fn get_admin(&self) -> Address {
        self.require_admin_address()
    }

    pub fn transfer_admin(&mut self, new_admin: Address) {
        let old_admin = self.require_admin();
        self.admin.set(new_admin);
        self.env().emit_event(AdminTransferred { old_admin, new_admin });
    }

    // ========== Internal Functions ==========

    fn read_feed(&self, feed: Address) -> FeedReading {
        let feed = PriceFeedContractRef::new(self.env().clone(), feed);
        FeedReading::new(feed.current_price(), FeedHealth::from_code(feed.health_status()))
    }

    fn require_feeds(&self) -> FeedAddresses {
        match self.feeds.get() {
            Some(feeds) => feeds,
            None => self.env().revert(CdpError::InvalidConfig),
        }
    }

    fn require_admin_address(&self) -> Address {
        match self.admin.get() {
            Some(admin) => admin,
            None => self.env().revert(CdpError::InvalidConfig),
        }
    }

    fn require_admin(&self) -> Address {
        let admin = self.require_admin_address();
        if self.env().caller() != admin {
            self.env().revert(CdpError::Unauthorized);
        }
        admin
    }
}
