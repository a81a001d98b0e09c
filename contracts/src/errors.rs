//! Protocol error definitions.

use odra::prelude::*;
use odra::ContractEnv;

/// CDP ledger errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CdpError {
    // Position errors (1xx)
    PositionNotActive = 100,
    PositionAlreadyActive = 101,
    InsufficientCollateral = 102,
    RepayExceedsDebt = 103,

    // Liquidation / redistribution errors (2xx)
    NothingToRedistribute = 200,
    NothingToLiquidate = 201,
    NotLiquidatable = 202,

    // Debt ceiling errors (3xx)
    DebtLimitExceeded = 300,
    BelowCurrentDebt = 301,

    // Access control errors (4xx)
    Unauthorized = 400,
    UnauthorizedProtocol = 401,

    // Token errors (5xx)
    TokenTransferFailed = 500,

    // Fee staking errors (6xx)
    InvalidAmount = 600,
    InsufficientStake = 601,

    // Oracle errors (7xx)
    PrimaryPriceZero = 700,
    SecondaryPriceZero = 701,
    IndexZero = 702,
    PriceUnavailable = 703,

    // Math errors (8xx)
    Overflow = 800,
    Underflow = 801,
    DivisionByZero = 802,

    // Configuration errors (9xx)
    InvalidConfig = 900,
}

impl CdpError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Position
            CdpError::PositionNotActive => "Position does not exist or is closed",
            CdpError::PositionAlreadyActive => "Position is already active",
            CdpError::InsufficientCollateral => "Collateral withdrawal exceeds position collateral",
            CdpError::RepayExceedsDebt => "Repay amount exceeds position debt",

            // Liquidation
            CdpError::NothingToRedistribute => "No remaining stakes to redistribute to",
            CdpError::NothingToLiquidate => "Nothing to liquidate",
            CdpError::NotLiquidatable => "Position is not liquidatable",

            // Debt ceiling
            CdpError::DebtLimitExceeded => "Cannot exceed debt limit",
            CdpError::BelowCurrentDebt => "Debt limit below current aggregate debt",

            // Access control
            CdpError::Unauthorized => "Unauthorized: caller is not admin",
            CdpError::UnauthorizedProtocol => "Unauthorized: caller is not protocol contract",

            // Token
            CdpError::TokenTransferFailed => "Token transfer failed",

            // Fee staking
            CdpError::InvalidAmount => "Amount must be non-zero",
            CdpError::InsufficientStake => "Insufficient stake",

            // Oracle
            CdpError::PrimaryPriceZero => "Primary feed reported a zero price",
            CdpError::SecondaryPriceZero => "Secondary feed reported a zero price",
            CdpError::IndexZero => "Index source reported zero",
            CdpError::PriceUnavailable => "No good price has been recorded",

            // Math
            CdpError::Overflow => "Arithmetic overflow",
            CdpError::Underflow => "Arithmetic underflow",
            CdpError::DivisionByZero => "Division by zero",

            // Config
            CdpError::InvalidConfig => "Invalid configuration parameter",
        }
    }
}

impl core::fmt::Display for CdpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<CdpError> for OdraError {
    fn from(error: CdpError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}

/// Turn a pure-code failure into a contract revert
pub trait OrRevert<T> {
    fn or_revert(self, env: &ContractEnv) -> T;
}

impl<T> OrRevert<T> for Result<T, CdpError> {
    fn or_revert(self, env: &ContractEnv) -> T {
        match self {
            Ok(value) => value,
            Err(error) => env.revert(error),
        }
    }
}
