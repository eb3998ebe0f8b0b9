//! Command structs for engine operations.
//!
//! These types group parameters for write operations (bank, apply, pool,
//! compute), keeping call sites readable.

use serde::{Deserialize, Serialize};

/// Bank part of a positive compliance balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BankSurplusCmd {
    pub ship_id: String,
    pub year: i32,
    pub amount: f64,
}

impl BankSurplusCmd {
    #[must_use]
    pub fn new(ship_id: impl Into<String>, year: i32, amount: f64) -> Self {
        Self {
            ship_id: ship_id.into(),
            year,
            amount,
        }
    }
}

/// Offset a deficit with previously banked surplus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApplyBankedCmd {
    pub ship_id: String,
    pub target_year: i32,
    pub amount: f64,
}

impl ApplyBankedCmd {
    #[must_use]
    pub fn new(ship_id: impl Into<String>, target_year: i32, amount: f64) -> Self {
        Self {
            ship_id: ship_id.into(),
            target_year,
            amount,
        }
    }
}

/// Pool the balances of `ship_ids` for `year`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatePoolCmd {
    pub year: i32,
    pub ship_ids: Vec<String>,
}

impl CreatePoolCmd {
    #[must_use]
    pub fn new<I, S>(year: i32, ship_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            year,
            ship_ids: ship_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Derive and store a ship's compliance balance from its GHG intensity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComputeComplianceCmd {
    pub ship_id: String,
    pub year: i32,
    /// gCO2e/MJ.
    pub ghg_intensity: f64,
    /// MJ in scope. Falls back to the engine's configured energy basis.
    pub energy_mj: Option<f64>,
}

impl ComputeComplianceCmd {
    #[must_use]
    pub fn new(ship_id: impl Into<String>, year: i32, ghg_intensity: f64) -> Self {
        Self {
            ship_id: ship_id.into(),
            year,
            ghg_intensity,
            energy_mj: None,
        }
    }

    #[must_use]
    pub fn energy_mj(mut self, energy_mj: f64) -> Self {
        self.energy_mj = Some(energy_mj);
        self
    }
}
