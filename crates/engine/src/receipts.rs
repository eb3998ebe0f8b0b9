//! Results returned by the write and summary operations.

use serde::{Deserialize, Serialize};

use crate::{BankEntry, Consumption};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BankReceipt {
    pub entry: BankEntry,
    /// Banked balance available to the ship after this entry.
    pub available_balance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApplyReceipt {
    pub ship_id: String,
    pub year: i32,
    pub applied: f64,
    pub cb_before: f64,
    pub cb_after: f64,
    /// Bank entries drawn, oldest year first.
    pub draws: Vec<Consumption>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

impl ComplianceStatus {
    pub fn from_balance(cb_gco2eq: f64) -> Self {
        if cb_gco2eq >= 0.0 {
            Self::Compliant
        } else {
            Self::NonCompliant
        }
    }
}

/// A ship's balance for a year together with what it has banked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdjustedCb {
    pub ship_id: String,
    pub year: i32,
    pub raw_cb: f64,
    pub banked_available: f64,
    pub adjusted_cb: f64,
    pub status: ComplianceStatus,
}
