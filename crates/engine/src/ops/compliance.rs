use crate::{
    AdjustedCb, ApplyBankedCmd, ApplyReceipt, ComplianceRecord, ComplianceStatus,
    ComputeComplianceCmd, EngineError, ResultEngine, bank_entries, records,
};

use super::{Engine, normalize_ship_id, validate_amount, validate_year, with_tx};

impl Engine {
    /// Return the compliance record of a ship for a year.
    ///
    /// A ship without a record reads as a zero balance.
    pub async fn compliance_record(
        &self,
        ship_id: &str,
        year: i32,
    ) -> ResultEngine<ComplianceRecord> {
        let ship_id = normalize_ship_id(ship_id)?;
        validate_year(year)?;
        with_tx!(self, |db_tx| {
            let record = records::find(&db_tx, &ship_id, year)
                .await?
                .unwrap_or_else(|| ComplianceRecord::new(ship_id.clone(), year, 0.0));
            Ok(record)
        })
    }

    /// Compute a ship's balance from its GHG intensity and store it as the
    /// record for that year.
    ///
    /// A record is only created here; once it exists it changes exclusively
    /// through banking, pooling and applied surplus.
    pub async fn compute_compliance(
        &self,
        cmd: ComputeComplianceCmd,
    ) -> ResultEngine<ComplianceRecord> {
        let ComputeComplianceCmd {
            ship_id,
            year,
            ghg_intensity,
            energy_mj,
        } = cmd;
        let ship_id = normalize_ship_id(&ship_id)?;
        validate_year(year)?;
        if !ghg_intensity.is_finite() || ghg_intensity < 0.0 {
            return Err(EngineError::Validation(format!(
                "ghg intensity must be a non-negative number, got {ghg_intensity}"
            )));
        }
        if let Some(energy) = energy_mj {
            validate_amount(energy, "energy")?;
        }

        let record = ComplianceRecord::new(
            ship_id.clone(),
            year,
            self.parameters.balance(ghg_intensity, energy_mj),
        );

        let _guard = self.ship_locks.lock(&ship_id).await;
        with_tx!(self, |db_tx| {
            if let Some(existing) = records::find(&db_tx, &ship_id, year).await? {
                return Err(EngineError::Validation(format!(
                    "compliance record for ship {ship_id} in {year} already exists (cb: {})",
                    existing.cb_gco2eq
                )));
            }
            records::insert(&db_tx, &record).await?;
            Ok(())
        })?;

        tracing::debug!(
            ship_id = %ship_id,
            year,
            cb = record.cb_gco2eq,
            "computed compliance balance"
        );
        Ok(record)
    }

    /// Add `delta` to a ship's balance for `year`, creating the record at zero
    /// first when absent. Returns the record as it stands afterwards.
    pub async fn increment_cb(
        &self,
        ship_id: &str,
        year: i32,
        delta: f64,
    ) -> ResultEngine<ComplianceRecord> {
        let ship_id = normalize_ship_id(ship_id)?;
        validate_year(year)?;
        if !delta.is_finite() {
            return Err(EngineError::Validation(format!(
                "delta must be a finite number, got {delta}"
            )));
        }

        let _guard = self.ship_locks.lock(&ship_id).await;
        let record = with_tx!(self, |db_tx| {
            records::increment_cb(&db_tx, &ship_id, year, delta).await?;
            records::find(&db_tx, &ship_id, year).await?.ok_or_else(|| {
                EngineError::PartialFailure(format!(
                    "compliance record for ship {ship_id} in {year} missing after increment"
                ))
            })
        })?;

        tracing::debug!(ship_id = %ship_id, year, delta, cb = record.cb_gco2eq, "incremented cb");
        Ok(record)
    }

    /// Raw balance for the year plus what the ship has banked.
    pub async fn adjusted_cb(&self, ship_id: &str, year: i32) -> ResultEngine<AdjustedCb> {
        let ship_id = normalize_ship_id(ship_id)?;
        validate_year(year)?;
        with_tx!(self, |db_tx| {
            let raw_cb = records::find(&db_tx, &ship_id, year)
                .await?
                .map_or(0.0, |r| r.cb_gco2eq);
            let banked_available = bank_entries::available_balance(&db_tx, &ship_id).await?;
            let adjusted_cb = raw_cb + banked_available;
            Ok(AdjustedCb {
                ship_id: ship_id.clone(),
                year,
                raw_cb,
                banked_available,
                adjusted_cb,
                status: ComplianceStatus::from_balance(adjusted_cb),
            })
        })
    }

    /// Offset a deficit in `target_year` with banked surplus.
    ///
    /// Requires the target record to be in deficit and the ship to have at
    /// least `amount` banked, with no rounding slack. The bank draw-down and the record increment run
    /// in the same transaction: both happen or neither does.
    pub async fn apply_banked_surplus(&self, cmd: ApplyBankedCmd) -> ResultEngine<ApplyReceipt> {
        let ApplyBankedCmd {
            ship_id,
            target_year,
            amount,
        } = cmd;
        let ship_id = normalize_ship_id(&ship_id)?;
        validate_year(target_year)?;
        validate_amount(amount, "amount to apply")?;

        let _guard = self.ship_locks.lock(&ship_id).await;
        let receipt = with_tx!(self, |db_tx| {
            let record = records::find(&db_tx, &ship_id, target_year)
                .await?
                .ok_or_else(|| {
                    EngineError::Validation(format!(
                        "no compliance record for ship {ship_id} in {target_year}"
                    ))
                })?;
            if !record.is_deficit() {
                return Err(EngineError::Validation(format!(
                    "no deficit to apply surplus to for ship {ship_id} in {target_year} (cb: {})",
                    record.cb_gco2eq
                )));
            }

            let available = bank_entries::available_balance(&db_tx, &ship_id).await?;
            if amount > available {
                return Err(EngineError::InsufficientFunds(format!(
                    "insufficient banked surplus for ship {ship_id} \
                     (available: {available}, requested: {amount})"
                )));
            }

            let draws = bank_entries::apply_consumption(&db_tx, &ship_id, amount).await?;
            // The record only moves by what the bank actually gave out.
            let applied: f64 = draws.iter().map(|d| d.amount).sum();
            if !records::increment_existing(&db_tx, &ship_id, target_year, applied).await? {
                return Err(EngineError::PartialFailure(format!(
                    "compliance record for ship {ship_id} in {target_year} vanished \
                     after consuming banked surplus; rolled back"
                )));
            }

            Ok(ApplyReceipt {
                ship_id: ship_id.clone(),
                year: target_year,
                applied,
                cb_before: record.cb_gco2eq,
                cb_after: record.cb_gco2eq + applied,
                draws,
            })
        })
        .inspect_err(|err| {
            if matches!(err, EngineError::InsufficientFunds(_)) {
                tracing::warn!(ship_id = %ship_id, target_year, amount, "apply rejected: {err}");
            }
        })?;

        tracing::debug!(
            ship_id = %ship_id,
            year = target_year,
            amount,
            cb_after = receipt.cb_after,
            "applied banked surplus"
        );
        Ok(receipt)
    }
}
