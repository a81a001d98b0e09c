//! CDP Ledger Contracts
//!
//! Casper-native accounting core of a collateralized-debt protocol.
//!
//! ## Architecture
//!
//! - **RedistributionLedger**: positions, stakes and O(1) redistribution of
//!   liquidated collateral and debt to surviving positions
//! - **FeeAccumulator**: O(1) sharing of protocol fees among stakers
//! - **OracleAggregator**: composite price from two feeds and an index, with
//!   health-driven failover
//! - **DebtCeiling**: aggregate debt limit enforced by the ledger
//!
//! The accounting rules live in storage-free types (`redistribution`,
//! `fee_distribution`, `price_feed`, `debt_ceiling`) that return
//! `Result<_, CdpError>`. Contracts load state, run the rule and store the
//! result only on success.

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod events;
pub mod math;
pub mod interfaces;

// Accounting rules
pub mod redistribution;
pub mod fee_distribution;
pub mod price_feed;
pub mod debt_ceiling;

// Contract modules
pub mod ledger;
pub mod fee_accumulator;
pub mod oracle_aggregator;
