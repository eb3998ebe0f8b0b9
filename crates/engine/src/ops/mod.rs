use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::{CbParameters, EngineError, ResultEngine, locks::ShipLocks};

mod banking;
mod compliance;
mod pools;
mod routes;

/// Store timeout used when the builder is not given one.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// Opening the transaction and running the block are bounded by the engine's
/// store timeout. On expiry the transaction is dropped uncommitted and
/// `EngineError::Timeout` is returned. The commit runs after the deadline
/// check, so a `Timeout` always means nothing was written.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let work = async {
            let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
            let result: $crate::ResultEngine<_> = $body;
            Ok::<_, $crate::EngineError>(($tx, result))
        };
        match tokio::time::timeout($self.store_timeout, work).await {
            Ok(Ok(($tx, Ok(value)))) => match $tx.commit().await {
                Ok(()) => Ok(value),
                Err(err) => Err($crate::EngineError::from(err)),
            },
            Ok(Ok((_, Err(err)))) | Ok(Err(err)) => Err(err),
            Err(_) => Err($crate::EngineError::Timeout(format!(
                "store did not answer within {} ms",
                $self.store_timeout.as_millis()
            ))),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    parameters: CbParameters,
    store_timeout: Duration,
    ship_locks: ShipLocks,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Target and energy basis balances are computed with.
    pub fn parameters(&self) -> CbParameters {
        self.parameters
    }
}

/// Trim a ship id and reject empty ones.
fn normalize_ship_id(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(
            "ship id must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_year(year: i32) -> ResultEngine<()> {
    if year <= 0 {
        return Err(EngineError::Validation(format!(
            "year must be positive, got {year}"
        )));
    }
    Ok(())
}

/// Amounts moved through the ledger must be finite and strictly positive.
fn validate_amount(amount: f64, label: &str) -> ResultEngine<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(EngineError::Validation(format!(
            "{label} must be positive, got {amount}"
        )));
    }
    Ok(())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    parameters: CbParameters,
    store_timeout: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Target and energy basis for computed balances.
    pub fn parameters(mut self, parameters: CbParameters) -> EngineBuilder {
        self.parameters = parameters;
        self
    }

    /// Upper bound for a single store transaction.
    pub fn store_timeout(mut self, timeout: Duration) -> EngineBuilder {
        self.store_timeout = Some(timeout);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let CbParameters {
            target_intensity,
            energy_mj,
        } = self.parameters;
        if !target_intensity.is_finite() || !energy_mj.is_finite() || energy_mj <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "invalid compliance parameters (target: {target_intensity}, energy: {energy_mj})"
            )));
        }

        Ok(Engine {
            database: self.database,
            parameters: self.parameters,
            store_timeout: self.store_timeout.unwrap_or(DEFAULT_STORE_TIMEOUT),
            ship_locks: ShipLocks::default(),
        })
    }
}
