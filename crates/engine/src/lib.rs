//! Compliance balance ledger and pool allocation engine.
//!
//! Ships earn a signed compliance balance (CB, in gCO2e) per year. The engine
//! lets a ship bank part of a positive balance and later draw on it, oldest
//! year first, to offset a deficit, and lets a group of ships pool their
//! balances for one year.
//!
//! Every mutating operation runs in a single database transaction while
//! holding the locks of the ships it touches.

pub use allocation::{MemberBalance, allocate_pool, validate_allocation};
pub use bank_entries::{BankEntry, Consumption};
pub use calculator::{
    CbParameters, DEFAULT_ENERGY_MJ, REGULATORY_TARGET_2025, compliance_balance,
    intensity_diff_percent,
};
pub use commands::{ApplyBankedCmd, BankSurplusCmd, ComputeComplianceCmd, CreatePoolCmd};
pub use error::EngineError;
pub use ops::{DEFAULT_STORE_TIMEOUT, Engine, EngineBuilder};
pub use pools::{Pool, PoolMember};
pub use receipts::{AdjustedCb, ApplyReceipt, BankReceipt, ComplianceStatus};
pub use records::ComplianceRecord;
pub use routes::{Route, RouteComparison, RouteNew};

mod allocation;
mod bank_entries;
mod calculator;
mod commands;
mod error;
mod locks;
mod ops;
mod pool_members;
mod pools;
mod receipts;
mod records;
mod routes;

type ResultEngine<T> = Result<T, EngineError>;

/// Rounding slack, in gCO2e, allowed when comparing balances.
pub const BALANCE_TOLERANCE: f64 = 0.001;
