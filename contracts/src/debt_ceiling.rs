//! Global debt ceiling.
//!
//! A configurable upper bound on aggregate outstanding debt. The check is
//! advisory: it never mutates ledger state, callers consult it before any
//! debt-increasing mutation. `U256::MAX` means "no limit".

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::CdpError;
use crate::math::checked_add;

#[odra::odra_type]
pub struct DebtCeiling {
    /// Maximum aggregate debt
    pub limit: U256,
}

impl Default for DebtCeiling {
    fn default() -> Self {
        Self { limit: U256::MAX }
    }
}

impl DebtCeiling {
    pub fn new(limit: U256) -> Self {
        Self { limit }
    }

    /// Replace the limit. It can never be set under what is already issued.
    pub fn set_limit(&mut self, new_limit: U256, current_debt: U256) -> Result<(), CdpError> {
        if new_limit < current_debt {
            return Err(CdpError::BelowCurrentDebt);
        }
        self.limit = new_limit;
        Ok(())
    }

    /// Fails if issuing `additional_debt` would push aggregate debt over the limit.
    pub fn check_issuance(&self, current_debt: U256, additional_debt: U256) -> Result<(), CdpError> {
        let new_debt = checked_add(current_debt, additional_debt)
            .map_err(|_| CdpError::DebtLimitExceeded)?;
        if new_debt > self.limit {
            return Err(CdpError::DebtLimitExceeded);
        }
        Ok(())
    }

    /// Debt that can still be issued
    pub fn headroom(&self, current_debt: U256) -> U256 {
        self.limit.saturating_sub(current_debt)
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit == U256::MAX
    }
}
