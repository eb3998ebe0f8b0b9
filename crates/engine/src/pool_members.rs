//! Pool members.
//!
//! Rows are written once together with their pool and never updated.
//! `position` keeps the order in which ships were given to the pool.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::PoolMember;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pool_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub pool_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub position: i32,
    pub ship_id: String,
    pub cb_before: f64,
    pub cb_after: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pools::Entity",
        from = "Column::PoolId",
        to = "super::pools::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Pools,
}

impl Related<super::pools::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pools.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new(pool_id: &str, position: i32, member: &PoolMember) -> Self {
        Self {
            pool_id: ActiveValue::Set(pool_id.to_string()),
            position: ActiveValue::Set(position),
            ship_id: ActiveValue::Set(member.ship_id.clone()),
            cb_before: ActiveValue::Set(member.cb_before),
            cb_after: ActiveValue::Set(member.cb_after),
        }
    }
}

impl From<Model> for PoolMember {
    fn from(model: Model) -> Self {
        Self {
            ship_id: model.ship_id,
            cb_before: model.cb_before,
            cb_after: model.cb_after,
        }
    }
}
