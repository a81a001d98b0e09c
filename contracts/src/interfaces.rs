//! External collaborator interfaces.
//!
//! Price feeds, the index source, the ordered position list and CEP-18
//! tokens are separate contracts. They are reached through the generated
//! `*ContractRef` types.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::CdpError;
use crate::math::MCR;

/// Upstream price feed
#[odra::external_contract]
pub trait PriceFeed {
    /// Latest price, 1e18 scaled
    fn current_price(&self) -> U256;
    /// Raw health code, see `FeedHealth::from_code`
    fn health_status(&self) -> u8;
}

/// Source of the 9-decimal index multiplier
#[odra::external_contract]
pub trait IndexSource {
    fn index(&self) -> U256;
}

/// Aggregated price as consumed by the ledger
#[odra::external_contract]
pub trait PriceOracle {
    fn fetch_price(&mut self) -> U256;
}

/// Positions ordered by ascending collateral ratio
#[odra::external_contract]
pub trait SortedPositions {
    fn get_first(&self) -> Option<Address>;
    fn get_last(&self) -> Option<Address>;
    fn get_next(&self, id: Address) -> Option<Address>;
    fn get_prev(&self, id: Address) -> Option<Address>;
}

/// CEP-18 token
#[odra::external_contract]
pub trait Cep18Token {
    fn transfer(&mut self, recipient: Address, amount: U256) -> bool;
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool;
    fn balance_of(&self, account: Address) -> U256;
}

/// Read access to an ordered index of positions.
///
/// `first` is the lowest collateral ratio. Any structure that can answer
/// these queries works, the ledger never mutates the ordering.
pub trait OrderedPositions {
    type Id;

    fn first(&self) -> Option<Self::Id>;
    fn last(&self) -> Option<Self::Id>;
    fn next(&self, id: &Self::Id) -> Option<Self::Id>;
    fn prev(&self, id: &Self::Id) -> Option<Self::Id>;
}

impl OrderedPositions for SortedPositionsContractRef {
    type Id = Address;

    fn first(&self) -> Option<Address> {
        self.get_first()
    }

    fn last(&self) -> Option<Address> {
        self.get_last()
    }

    fn next(&self, id: &Address) -> Option<Address> {
        self.get_next(*id)
    }

    fn prev(&self, id: &Address) -> Option<Address> {
        self.get_prev(*id)
    }
}

/// Walk from the lowest ratio and collect positions below MCR.
///
/// Stops at the first healthy position or once `max_count` are collected.
pub fn collect_undercollateralized<O, F>(
    positions: &O,
    max_count: u32,
    mut icr_of: F,
) -> Result<Vec<O::Id>, CdpError>
where
    O: OrderedPositions,
    F: FnMut(&O::Id) -> Result<U256, CdpError>,
{
    let mcr = U256::from(MCR);
    let mut found = Vec::new();
    let mut cursor = positions.first();

    while let Some(id) = cursor {
        if found.len() as u32 >= max_count {
            break;
        }
        if icr_of(&id)? >= mcr {
            break;
        }
        cursor = positions.next(&id);
        found.push(id);
    }
    Ok(found)
}
