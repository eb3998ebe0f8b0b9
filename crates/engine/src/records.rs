//! Compliance records.
//!
//! One record per (ship, year) holding the live compliance balance. Records
//! are never deleted; after creation they only change through
//! [`increment_cb`], an atomic add executed in SQL.

use sea_orm::{ActiveValue, ConnectionTrait, entity::prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};

use crate::ResultEngine;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    pub ship_id: String,
    pub year: i32,
    pub cb_gco2eq: f64,
}

impl ComplianceRecord {
    pub fn new(ship_id: impl Into<String>, year: i32, cb_gco2eq: f64) -> Self {
        Self {
            ship_id: ship_id.into(),
            year,
            cb_gco2eq,
        }
    }

    pub fn is_surplus(&self) -> bool {
        self.cb_gco2eq > 0.0
    }

    pub fn is_deficit(&self) -> bool {
        self.cb_gco2eq < 0.0
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ship_compliance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ship_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub year: i32,
    pub cb_gco2eq: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ComplianceRecord> for ActiveModel {
    fn from(value: &ComplianceRecord) -> Self {
        Self {
            ship_id: ActiveValue::Set(value.ship_id.clone()),
            year: ActiveValue::Set(value.year),
            cb_gco2eq: ActiveValue::Set(value.cb_gco2eq),
        }
    }
}

impl From<Model> for ComplianceRecord {
    fn from(model: Model) -> Self {
        Self {
            ship_id: model.ship_id,
            year: model.year,
            cb_gco2eq: model.cb_gco2eq,
        }
    }
}

/// Fetch the record of `ship_id` for `year`, if any.
pub(crate) async fn find<C: ConnectionTrait>(
    conn: &C,
    ship_id: &str,
    year: i32,
) -> ResultEngine<Option<ComplianceRecord>> {
    let model = Entity::find_by_id((ship_id.to_string(), year))
        .one(conn)
        .await?;
    Ok(model.map(ComplianceRecord::from))
}

pub(crate) async fn insert<C: ConnectionTrait>(
    conn: &C,
    record: &ComplianceRecord,
) -> ResultEngine<()> {
    ActiveModel::from(record).insert(conn).await?;
    Ok(())
}

/// Add `delta` to an existing record. Returns whether a record was updated.
pub(crate) async fn increment_existing<C: ConnectionTrait>(
    conn: &C,
    ship_id: &str,
    year: i32,
    delta: f64,
) -> ResultEngine<bool> {
    let res = Entity::update_many()
        .col_expr(Column::CbGco2eq, Expr::col(Column::CbGco2eq).add(delta))
        .filter(Column::ShipId.eq(ship_id))
        .filter(Column::Year.eq(year))
        .exec(conn)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Atomically add `delta` to the record, creating it at zero first when
/// absent.
pub(crate) async fn increment_cb<C: ConnectionTrait>(
    conn: &C,
    ship_id: &str,
    year: i32,
    delta: f64,
) -> ResultEngine<()> {
    if !increment_existing(conn, ship_id, year, delta).await? {
        insert(conn, &ComplianceRecord::new(ship_id, year, delta)).await?;
    }
    Ok(())
}
