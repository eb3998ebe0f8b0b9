//! Pools.
//!
//! A [`Pool`] is the record of one allocation event: the year and, for every
//! ship taking part, its balance before and after pooling. Pools are
//! append-only; they are written once together with their members and never
//! changed afterwards.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, pool_members};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolMember {
    pub ship_id: String,
    pub cb_before: f64,
    pub cb_after: f64,
}

impl PoolMember {
    /// Change applied to the ship's compliance record by the pool.
    pub fn delta(&self) -> f64 {
        self.cb_after - self.cb_before
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: Uuid,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub members: Vec<PoolMember>,
}

impl Pool {
    pub fn total_before(&self) -> f64 {
        self.members.iter().map(|m| m.cb_before).sum()
    }

    pub fn total_after(&self) -> f64 {
        self.members.iter().map(|m| m.cb_after).sum()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pools")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub year: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pool_members::Entity")]
    PoolMembers,
}

impl Related<super::pool_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PoolMembers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn parse_pool_id(raw: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(raw).map_err(|_| EngineError::InvalidInput(format!("invalid pool id: {raw}")))
}

/// Insert a pool and its members. Atomic when `conn` is a transaction.
pub(crate) async fn persist_pool<C: ConnectionTrait>(
    conn: &C,
    year: i32,
    members: Vec<PoolMember>,
) -> ResultEngine<Pool> {
    let pool = Pool {
        id: Uuid::new_v4(),
        year,
        created_at: Utc::now(),
        members,
    };
    let pool_id = pool.id.to_string();

    ActiveModel {
        id: ActiveValue::Set(pool_id.clone()),
        year: ActiveValue::Set(year),
        created_at: ActiveValue::Set(pool.created_at),
    }
    .insert(conn)
    .await?;

    for (position, member) in pool.members.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| EngineError::Validation("too many pool members".to_string()))?;
        pool_members::ActiveModel::new(&pool_id, position, member)
            .insert(conn)
            .await?;
    }

    Ok(pool)
}

async fn load_members<C: ConnectionTrait>(conn: &C, model: Model) -> ResultEngine<Pool> {
    let members = pool_members::Entity::find()
        .filter(pool_members::Column::PoolId.eq(model.id.clone()))
        .order_by_asc(pool_members::Column::Position)
        .all(conn)
        .await?
        .into_iter()
        .map(PoolMember::from)
        .collect();

    Ok(Pool {
        id: parse_pool_id(&model.id)?,
        year: model.year,
        created_at: model.created_at,
        members,
    })
}

pub(crate) async fn find<C: ConnectionTrait>(
    conn: &C,
    pool_id: Uuid,
) -> ResultEngine<Option<Pool>> {
    match Entity::find_by_id(pool_id.to_string()).one(conn).await? {
        Some(model) => Ok(Some(load_members(conn, model).await?)),
        None => Ok(None),
    }
}

/// Pools formed for `year`, oldest first.
pub(crate) async fn for_year<C: ConnectionTrait>(
    conn: &C,
    year: i32,
) -> ResultEngine<Vec<Pool>> {
    let models = Entity::find()
        .filter(Column::Year.eq(year))
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(conn)
        .await?;

    let mut pools = Vec::with_capacity(models.len());
    for model in models {
        pools.push(load_members(conn, model).await?);
    }
    Ok(pools)
}
