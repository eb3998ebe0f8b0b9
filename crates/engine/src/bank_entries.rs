//! Banked surplus.
//!
//! A [`BankEntry`] reserves part of a past positive compliance balance for
//! later use. Entries are immutable except for `amount_used`, which only
//! grows and never exceeds `amount_gco2eq`. Spent entries are kept as an
//! audit trail.
//!
//! Consumption is FIFO: the oldest year is drawn first and an entry may be
//! partially consumed before moving to the next one.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, Select, entity::prelude::*,
    sea_query::{Expr, SimpleExpr},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BALANCE_TOLERANCE, EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BankEntry {
    pub id: Uuid,
    pub ship_id: String,
    pub year: i32,
    pub amount_gco2eq: f64,
    pub amount_used: f64,
    pub created_at: DateTime<Utc>,
}

impl BankEntry {
    pub fn new(ship_id: impl Into<String>, year: i32, amount_gco2eq: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            ship_id: ship_id.into(),
            year,
            amount_gco2eq,
            amount_used: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Amount that can still be drawn from this entry.
    pub fn remaining(&self) -> f64 {
        self.amount_gco2eq - self.amount_used
    }

    pub fn is_spent(&self) -> bool {
        self.amount_used >= self.amount_gco2eq
    }
}

/// A single draw from a bank entry made by a consumption.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    pub entry_id: Uuid,
    pub year: i32,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub ship_id: String,
    pub year: i32,
    pub amount_gco2eq: f64,
    pub amount_used: f64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BankEntry> for ActiveModel {
    fn from(value: &BankEntry) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            ship_id: ActiveValue::Set(value.ship_id.clone()),
            year: ActiveValue::Set(value.year),
            amount_gco2eq: ActiveValue::Set(value.amount_gco2eq),
            amount_used: ActiveValue::Set(value.amount_used),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for BankEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| {
                EngineError::InvalidInput(format!("invalid bank entry id: {}", model.id))
            })?,
            ship_id: model.ship_id,
            year: model.year,
            amount_gco2eq: model.amount_gco2eq,
            amount_used: model.amount_used,
            created_at: model.created_at,
        })
    }
}

fn ordered_for_ship(ship_id: &str) -> Select<Entity> {
    Entity::find()
        .filter(Column::ShipId.eq(ship_id))
        .order_by_asc(Column::Year)
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
}

fn into_entries(models: Vec<Model>) -> ResultEngine<Vec<BankEntry>> {
    models.into_iter().map(BankEntry::try_from).collect()
}

/// Every entry of a ship, spent ones included, oldest year first.
pub(crate) async fn all_entries<C: ConnectionTrait>(
    conn: &C,
    ship_id: &str,
) -> ResultEngine<Vec<BankEntry>> {
    into_entries(ordered_for_ship(ship_id).all(conn).await?)
}

/// Entries that still have something left to draw, oldest year first.
pub(crate) async fn available_entries<C: ConnectionTrait>(
    conn: &C,
    ship_id: &str,
) -> ResultEngine<Vec<BankEntry>> {
    let models = ordered_for_ship(ship_id)
        .filter(Expr::col(Column::AmountUsed).lt(Expr::col(Column::AmountGco2eq)))
        .all(conn)
        .await?;
    into_entries(models)
}

/// Sum of the unspent remainders of a ship's entries.
pub(crate) async fn available_balance<C: ConnectionTrait>(
    conn: &C,
    ship_id: &str,
) -> ResultEngine<f64> {
    let entries = available_entries(conn, ship_id).await?;
    Ok(entries.iter().map(BankEntry::remaining).sum())
}

pub(crate) async fn insert<C: ConnectionTrait>(conn: &C, entry: &BankEntry) -> ResultEngine<()> {
    ActiveModel::from(entry).insert(conn).await?;
    Ok(())
}

/// Plan a FIFO draw of `amount` over `entries` (already ordered oldest
/// first). Nothing is planned unless the whole amount can be covered.
pub(crate) fn plan_consumption(
    entries: &[BankEntry],
    amount: f64,
) -> ResultEngine<Vec<Consumption>> {
    let available: f64 = entries.iter().map(BankEntry::remaining).sum();
    if amount - available > BALANCE_TOLERANCE {
        return Err(EngineError::InsufficientFunds(format!(
            "requested {amount}, available {available}"
        )));
    }

    let mut remaining = amount;
    let mut draws = Vec::new();
    for entry in entries {
        if remaining <= 0.0 {
            break;
        }
        let take = entry.remaining().min(remaining);
        if take <= 0.0 {
            continue;
        }
        draws.push(Consumption {
            entry_id: entry.id,
            year: entry.year,
            amount: take,
        });
        remaining -= take;
    }
    Ok(draws)
}

/// Draw `amount` from the ship's entries, oldest year first.
///
/// Feasibility is checked against the total available before any entry is
/// touched, and every update runs on `conn`, so a caller holding a
/// transaction gets all-or-nothing semantics.
pub(crate) async fn apply_consumption<C: ConnectionTrait>(
    conn: &C,
    ship_id: &str,
    amount: f64,
) -> ResultEngine<Vec<Consumption>> {
    let entries = available_entries(conn, ship_id).await?;
    let draws = plan_consumption(&entries, amount)?;

    for draw in &draws {
        let entry = entries
            .iter()
            .find(|e| e.id == draw.entry_id)
            .ok_or_else(|| EngineError::NotFound(format!("bank entry {}", draw.entry_id)))?;
        // A fully drawn entry is pinned to its total so it reads as spent
        // regardless of float rounding.
        let used: SimpleExpr = if draw.amount >= entry.remaining() {
            Expr::col(Column::AmountGco2eq).into()
        } else {
            Expr::col(Column::AmountUsed).add(draw.amount)
        };
        let res = Entity::update_many()
            .col_expr(Column::AmountUsed, used)
            .filter(Column::Id.eq(draw.entry_id.to_string()))
            .filter(Expr::col(Column::AmountUsed).lt(Expr::col(Column::AmountGco2eq)))
            .exec(conn)
            .await?;
        if res.rows_affected != 1 {
            return Err(EngineError::PartialFailure(format!(
                "bank entry {} changed while consuming for ship {ship_id}",
                draw.entry_id
            )));
        }
    }

    Ok(draws)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(year: i32, amount: f64, used: f64) -> BankEntry {
        let mut entry = BankEntry::new("ship", year, amount);
        entry.amount_used = used;
        entry
    }

    #[test]
    fn plan_draws_oldest_first() {
        let entries = vec![entry(2023, 10.0, 0.0), entry(2024, 20.0, 0.0)];
        let draws = plan_consumption(&entries, 15.0).unwrap();

        assert_eq!(draws.len(), 2);
        assert_eq!((draws[0].year, draws[0].amount), (2023, 10.0));
        assert_eq!((draws[1].year, draws[1].amount), (2024, 5.0));
    }

    #[test]
    fn plan_accounts_for_partial_use() {
        let entries = vec![entry(2023, 10.0, 8.0), entry(2024, 20.0, 0.0)];
        let draws = plan_consumption(&entries, 3.0).unwrap();

        assert_eq!((draws[0].year, draws[0].amount), (2023, 2.0));
        assert_eq!((draws[1].year, draws[1].amount), (2024, 1.0));
    }

    #[test]
    fn plan_rejects_more_than_available() {
        let entries = vec![entry(2023, 10.0, 0.0)];
        let err = plan_consumption(&entries, 10.5).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientFunds("requested 10.5, available 10".to_string())
        );
    }

    #[test]
    fn plan_tolerates_rounding_noise() {
        let entries = vec![entry(2023, 10.0, 0.0)];
        let draws = plan_consumption(&entries, 10.0005).unwrap();
        assert_eq!(draws[0].amount, 10.0);
    }

    #[test]
    fn spent_entry_reports_spent() {
        let spent = entry(2023, 10.0, 10.0);
        assert!(spent.is_spent());
        assert_eq!(spent.remaining(), 0.0);
    }
}
