//! Voyage routes.
//!
//! Each year has at most one baseline route. Other routes of the same year
//! are compared against its GHG intensity.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: i32,
    pub route_id: String,
    pub year: i32,
    pub vessel_type: Option<String>,
    pub fuel_type: Option<String>,
    /// gCO2e/MJ.
    pub ghg_intensity: f64,
    pub fuel_consumption_t: Option<f64>,
    pub distance_km: Option<f64>,
    pub total_emissions_t: Option<f64>,
    pub is_baseline: bool,
}

/// A route to be registered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteNew {
    pub route_id: String,
    pub year: i32,
    #[serde(default)]
    pub vessel_type: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    pub ghg_intensity: f64,
    #[serde(default)]
    pub fuel_consumption_t: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub total_emissions_t: Option<f64>,
    #[serde(default)]
    pub is_baseline: bool,
}

/// A route measured against its year's baseline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteComparison {
    #[serde(flatten)]
    pub route: Route,
    pub percent_diff: f64,
    pub is_compliant: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "routes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub route_id: String,
    pub year: i32,
    pub vessel_type: Option<String>,
    pub fuel_type: Option<String>,
    pub ghg_intensity: f64,
    pub fuel_consumption_t: Option<f64>,
    pub distance_km: Option<f64>,
    pub total_emissions_t: Option<f64>,
    pub is_baseline: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RouteNew> for ActiveModel {
    fn from(value: &RouteNew) -> Self {
        Self {
            id: ActiveValue::NotSet,
            route_id: ActiveValue::Set(value.route_id.clone()),
            year: ActiveValue::Set(value.year),
            vessel_type: ActiveValue::Set(value.vessel_type.clone()),
            fuel_type: ActiveValue::Set(value.fuel_type.clone()),
            ghg_intensity: ActiveValue::Set(value.ghg_intensity),
            fuel_consumption_t: ActiveValue::Set(value.fuel_consumption_t),
            distance_km: ActiveValue::Set(value.distance_km),
            total_emissions_t: ActiveValue::Set(value.total_emissions_t),
            is_baseline: ActiveValue::Set(value.is_baseline),
        }
    }
}

impl From<Model> for Route {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            route_id: model.route_id,
            year: model.year,
            vessel_type: model.vessel_type,
            fuel_type: model.fuel_type,
            ghg_intensity: model.ghg_intensity,
            fuel_consumption_t: model.fuel_consumption_t,
            distance_km: model.distance_km,
            total_emissions_t: model.total_emissions_t,
            is_baseline: model.is_baseline,
        }
    }
}
