//! Mock collaborators for host tests.
//!
//! Each mock exposes the entry points the protocol contracts call, under
//! the same names and argument names, plus setters to drive scenarios.

use odra::prelude::*;
use odra::casper_types::U256;

/// Price feed with a settable price and health code
#[odra::module]
pub struct MockPriceFeed {
    price: Var<U256>,
    health: Var<u8>,
}

#[odra::module]
impl MockPriceFeed {
    pub fn init(&mut self, price: U256) {
        self.price.set(price);
        self.health.set(0);
    }

    pub fn set_price(&mut self, price: U256) {
        self.price.set(price);
    }

    pub fn set_health(&mut self, health: u8) {
        self.health.set(health);
    }

    pub fn current_price(&self) -> U256 {
        self.price.get().unwrap_or_default()
    }

    pub fn health_status(&self) -> u8 {
        self.health.get().unwrap_or(0)
    }
}

/// Index source with a settable index
#[odra::module]
pub struct MockIndexSource {
    value: Var<U256>,
}

#[odra::module]
impl MockIndexSource {
    pub fn init(&mut self, index: U256) {
        self.value.set(index);
    }

    pub fn set_index(&mut self, index: U256) {
        self.value.set(index);
    }

    pub fn index(&self) -> U256 {
        self.value.get().unwrap_or_default()
    }
}

/// Fixed-price oracle for ledger tests
#[odra::module]
pub struct MockPriceOracle {
    price: Var<U256>,
}

#[odra::module]
impl MockPriceOracle {
    pub fn init(&mut self, price: U256) {
        self.price.set(price);
    }

    pub fn set_price(&mut self, price: U256) {
        self.price.set(price);
    }

    pub fn fetch_price(&mut self) -> U256 {
        self.price.get().unwrap_or_default()
    }
}

/// Position list in a caller-supplied order, lowest ratio first
#[odra::module]
pub struct MockSortedPositions {
    order: Var<Vec<Address>>,
}

#[odra::module]
impl MockSortedPositions {
    pub fn set_order(&mut self, order: Vec<Address>) {
        self.order.set(order);
    }

    pub fn get_first(&self) -> Option<Address> {
        self.load().first().copied()
    }

    pub fn get_last(&self) -> Option<Address> {
        self.load().last().copied()
    }

    pub fn get_next(&self, id: Address) -> Option<Address> {
        let order = self.load();
        let at = order.iter().position(|x| *x == id)?;
        order.get(at + 1).copied()
    }

    pub fn get_prev(&self, id: Address) -> Option<Address> {
        let order = self.load();
        let at = order.iter().position(|x| *x == id)?;
        at.checked_sub(1).and_then(|i| order.get(i).copied())
    }

    fn load(&self) -> Vec<Address> {
        self.order.get().unwrap_or_default()
    }
}

/// Minimal CEP-18 style token. Transfers report failure instead of reverting.
#[odra::module]
pub struct MockToken {
    balances: Mapping<Address, U256>,
    allowances: Mapping<(Address, Address), U256>,
}

#[odra::module]
impl MockToken {
    pub fn mint(&mut self, to: Address, amount: U256) {
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.allowances.set(&(owner, spender), amount);
        true
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.move_balance(sender, recipient, amount)
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        let allowance = self.allowances.get(&(owner, spender)).unwrap_or_default();
        if allowance < amount {
            return false;
        }
        if !self.move_balance(owner, recipient, amount) {
            return false;
        }
        self.allowances.set(&(owner, spender), allowance - amount);
        true
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or_default()
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return false;
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);
        true
    }
}
