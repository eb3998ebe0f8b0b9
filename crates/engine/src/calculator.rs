//! Compliance balance arithmetic.
//!
//! Intensities are expressed in gCO2e/MJ, energy in MJ and balances in
//! gCO2e. A positive balance is a surplus, a negative one a deficit.

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Default GHG intensity target, in gCO2e/MJ.
pub const REGULATORY_TARGET_2025: f64 = 91.16;

/// Energy basis used when a caller does not provide the energy in scope.
pub const DEFAULT_ENERGY_MJ: f64 = 1e6;

/// Percentage difference of `comparison` against `baseline`:
/// `(comparison / baseline - 1) * 100`.
pub fn intensity_diff_percent(baseline: f64, comparison: f64) -> ResultEngine<f64> {
    if !baseline.is_finite() || !comparison.is_finite() {
        return Err(EngineError::InvalidInput(format!(
            "intensities must be finite (baseline: {baseline}, comparison: {comparison})"
        )));
    }
    if baseline == 0.0 {
        return Err(EngineError::InvalidInput(
            "baseline intensity must not be zero".to_string(),
        ));
    }
    Ok((comparison / baseline - 1.0) * 100.0)
}

/// Compliance balance of a ship: `(target - actual_intensity) * energy_mj`.
pub fn compliance_balance(actual_intensity: f64, energy_mj: f64, target: f64) -> f64 {
    (target - actual_intensity) * energy_mj
}

/// Target and energy basis the engine computes balances with.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CbParameters {
    pub target_intensity: f64,
    pub energy_mj: f64,
}

impl Default for CbParameters {
    fn default() -> Self {
        Self {
            target_intensity: REGULATORY_TARGET_2025,
            energy_mj: DEFAULT_ENERGY_MJ,
        }
    }
}

impl CbParameters {
    /// Balance for `actual_intensity`, using `energy_mj` when given and the
    /// configured energy basis otherwise.
    pub fn balance(&self, actual_intensity: f64, energy_mj: Option<f64>) -> f64 {
        compliance_balance(
            actual_intensity,
            energy_mj.unwrap_or(self.energy_mj),
            self.target_intensity,
        )
    }
}
