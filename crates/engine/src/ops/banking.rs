use crate::{
    BankEntry, BankReceipt, BankSurplusCmd, Consumption, EngineError, ResultEngine, bank_entries,
    records,
};

use super::{Engine, normalize_ship_id, validate_amount, validate_year, with_tx};

impl Engine {
    /// Bank part of a positive compliance balance.
    ///
    /// Preconditions: `amount > 0`, the record for (`ship_id`, `year`) exists,
    /// its balance is positive and not smaller than `amount`.
    ///
    /// The compliance record itself is left untouched: it stays the live
    /// figure for that year while the new entry is a claim tracked
    /// separately by the bank.
    pub async fn bank_surplus(&self, cmd: BankSurplusCmd) -> ResultEngine<BankReceipt> {
        let BankSurplusCmd {
            ship_id,
            year,
            amount,
        } = cmd;
        let ship_id = normalize_ship_id(&ship_id)?;
        validate_year(year)?;
        validate_amount(amount, "amount to bank")?;

        let _guard = self.ship_locks.lock(&ship_id).await;
        let receipt = with_tx!(self, |db_tx| {
            let record = records::find(&db_tx, &ship_id, year)
                .await?
                .ok_or_else(|| {
                    EngineError::Validation(format!(
                        "no compliance record for ship {ship_id} in {year}"
                    ))
                })?;
            if !record.is_surplus() {
                return Err(EngineError::Validation(format!(
                    "no surplus to bank for ship {ship_id} in {year} (cb: {})",
                    record.cb_gco2eq
                )));
            }
            if amount > record.cb_gco2eq {
                return Err(EngineError::Validation(format!(
                    "cannot bank more than the surplus (available: {}, requested: {amount})",
                    record.cb_gco2eq
                )));
            }

            let entry = BankEntry::new(ship_id.clone(), year, amount);
            bank_entries::insert(&db_tx, &entry).await?;
            let available_balance = bank_entries::available_balance(&db_tx, &ship_id).await?;
            Ok(BankReceipt {
                entry,
                available_balance,
            })
        })?;

        tracing::debug!(
            ship_id = %ship_id,
            year,
            amount,
            available = receipt.available_balance,
            "banked surplus"
        );
        Ok(receipt)
    }

    /// Banked balance a ship can still draw on.
    pub async fn available_balance(&self, ship_id: &str) -> ResultEngine<f64> {
        let ship_id = normalize_ship_id(ship_id)?;
        with_tx!(self, |db_tx| {
            bank_entries::available_balance(&db_tx, &ship_id).await
        })
    }

    /// Every bank entry of a ship, spent ones included, oldest year first.
    pub async fn bank_entries(&self, ship_id: &str) -> ResultEngine<Vec<BankEntry>> {
        let ship_id = normalize_ship_id(ship_id)?;
        with_tx!(self, |db_tx| {
            bank_entries::all_entries(&db_tx, &ship_id).await
        })
    }

    /// Draw `amount` from a ship's banked surplus, oldest year first.
    ///
    /// All or nothing: when the ship has less than `amount` available no
    /// entry is modified and `EngineError::InsufficientFunds` is returned.
    pub async fn consume(&self, ship_id: &str, amount: f64) -> ResultEngine<Vec<Consumption>> {
        let ship_id = normalize_ship_id(ship_id)?;
        validate_amount(amount, "amount to consume")?;

        let _guard = self.ship_locks.lock(&ship_id).await;
        let draws = with_tx!(self, |db_tx| {
            bank_entries::apply_consumption(&db_tx, &ship_id, amount).await
        })
        .inspect_err(|err| {
            if matches!(err, EngineError::InsufficientFunds(_)) {
                tracing::warn!(ship_id = %ship_id, amount, "consumption rejected: {err}");
            }
        })?;

        tracing::debug!(
            ship_id = %ship_id,
            amount,
            entries = draws.len(),
            "consumed banked surplus"
        );
        Ok(draws)
    }
}
