use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    CreatePoolCmd, EngineError, MemberBalance, Pool, ResultEngine, allocate_pool, pools, records,
    validate_allocation,
};

use super::{Engine, normalize_ship_id, validate_year, with_tx};

impl Engine {
    /// Pool the compliance balances of `ship_ids` for `year`.
    ///
    /// Runs the allocator over the ships' current balances, checks the pool
    /// invariants, persists the pool with its members and moves each ship's
    /// record by its allocation delta. Everything happens in one transaction
    /// while holding the locks of every ship involved, so readers see either
    /// no pool and the old balances, or the pool and the new balances.
    pub async fn create_pool(&self, cmd: CreatePoolCmd) -> ResultEngine<Pool> {
        let CreatePoolCmd { year, ship_ids } = cmd;
        validate_year(year)?;
        if ship_ids.is_empty() {
            return Err(EngineError::Validation(
                "a pool needs at least one ship".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(ship_ids.len());
        for raw in &ship_ids {
            let ship_id = normalize_ship_id(raw)?;
            if !seen.insert(ship_id.clone()) {
                return Err(EngineError::Validation(format!(
                    "ship {ship_id} appears more than once in the pool"
                )));
            }
            normalized.push(ship_id);
        }

        let _guards = self
            .ship_locks
            .lock_all(normalized.iter().map(String::as_str))
            .await;

        let pool = with_tx!(self, |db_tx| {
            let mut balances = Vec::with_capacity(normalized.len());
            for ship_id in &normalized {
                let record = records::find(&db_tx, ship_id, year).await?.ok_or_else(|| {
                    EngineError::NotFound(format!(
                        "compliance record for ship {ship_id} in {year}"
                    ))
                })?;
                balances.push(MemberBalance::new(ship_id.clone(), record.cb_gco2eq));
            }

            let allocated = allocate_pool(&balances);
            if let Err(err) = validate_allocation(&allocated) {
                tracing::warn!(year, ships = normalized.len(), "pool rejected: {err}");
                return Err(err);
            }

            let pool = pools::persist_pool(&db_tx, year, allocated).await?;

            for member in &pool.members {
                let delta = member.delta();
                if delta == 0.0 {
                    continue;
                }
                if !records::increment_existing(&db_tx, &member.ship_id, year, delta).await? {
                    return Err(EngineError::PartialFailure(format!(
                        "compliance record for ship {} in {year} vanished \
                         while reconciling pool {}; rolled back",
                        member.ship_id, pool.id
                    )));
                }
            }

            Ok(pool)
        })?;

        tracing::debug!(
            pool_id = %pool.id,
            year,
            members = pool.members.len(),
            total = pool.total_after(),
            "pool formed"
        );
        Ok(pool)
    }

    /// Return a persisted pool with its members.
    pub async fn pool(&self, pool_id: Uuid) -> ResultEngine<Pool> {
        with_tx!(self, |db_tx| {
            pools::find(&db_tx, pool_id)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("pool {pool_id}")))
        })
    }

    /// Pools formed for `year`, oldest first.
    pub async fn pools(&self, year: i32) -> ResultEngine<Vec<Pool>> {
        validate_year(year)?;
        with_tx!(self, |db_tx| { pools::for_year(&db_tx, year).await })
    }
}
