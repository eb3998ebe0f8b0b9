use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};

use crate::{
    EngineError, ResultEngine, Route, RouteComparison, RouteNew, intensity_diff_percent, routes,
};

use super::{Engine, validate_year, with_tx};

impl Engine {
    /// Register a route. Setting `is_baseline` clears the flag on the other
    /// routes of the same year.
    pub async fn new_route(&self, route: RouteNew) -> ResultEngine<Route> {
        let route = validate_route(route)?;
        with_tx!(self, |db_tx| { insert_route(&db_tx, &route).await })
    }

    /// Register a batch of routes in one transaction. If any route is
    /// invalid or already exists, none of them is stored.
    pub async fn import_routes(&self, batch: Vec<RouteNew>) -> ResultEngine<Vec<Route>> {
        let batch = batch
            .into_iter()
            .map(validate_route)
            .collect::<ResultEngine<Vec<_>>>()?;

        let imported = with_tx!(self, |db_tx| {
            let mut imported = Vec::with_capacity(batch.len());
            for route in &batch {
                imported.push(insert_route(&db_tx, route).await?);
            }
            Ok(imported)
        })?;

        tracing::debug!(count = imported.len(), "routes imported");
        Ok(imported)
    }

    /// Routes of `year`, or of every year, ordered by year then route id.
    pub async fn routes(&self, year: Option<i32>) -> ResultEngine<Vec<Route>> {
        with_tx!(self, |db_tx| {
            let mut query = routes::Entity::find();
            if let Some(year) = year {
                query = query.filter(routes::Column::Year.eq(year));
            }
            let models = query
                .order_by_asc(routes::Column::Year)
                .order_by_asc(routes::Column::RouteId)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Route::from).collect())
        })
    }

    /// Make `id` the baseline of its year. Any previous baseline of that
    /// year loses the flag in the same transaction.
    pub async fn set_baseline(&self, id: i32) -> ResultEngine<Route> {
        let route = with_tx!(self, |db_tx| {
            let model = routes::Entity::find_by_id(id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("route {id}")))?;

            clear_baseline(&db_tx, model.year).await?;
            let active = routes::ActiveModel {
                id: ActiveValue::Set(id),
                is_baseline: ActiveValue::Set(true),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            Ok(Route::from(model))
        })?;

        tracing::debug!(route_id = %route.route_id, year = route.year, "baseline set");
        Ok(route)
    }

    /// Every route of `year` compared against the year's baseline.
    pub async fn route_comparison(&self, year: i32) -> ResultEngine<Vec<RouteComparison>> {
        let routes = self.routes(Some(year)).await?;
        if routes.is_empty() {
            return Err(EngineError::NotFound(format!("routes for {year}")));
        }
        let baseline = routes
            .iter()
            .find(|r| r.is_baseline)
            .map(|r| r.ghg_intensity)
            .ok_or_else(|| EngineError::NotFound(format!("baseline route for {year}")))?;

        routes
            .into_iter()
            .map(|route| {
                let percent_diff = intensity_diff_percent(baseline, route.ghg_intensity)?;
                let is_compliant = route.ghg_intensity <= baseline;
                Ok(RouteComparison {
                    route,
                    percent_diff,
                    is_compliant,
                })
            })
            .collect()
    }
}

fn validate_route(route: RouteNew) -> ResultEngine<RouteNew> {
    let route_id = route.route_id.trim();
    if route_id.is_empty() {
        return Err(EngineError::Validation(
            "route id must not be empty".to_string(),
        ));
    }
    validate_year(route.year)?;
    if !route.ghg_intensity.is_finite() || route.ghg_intensity < 0.0 {
        return Err(EngineError::Validation(format!(
            "ghg intensity must be a non-negative number, got {}",
            route.ghg_intensity
        )));
    }
    Ok(RouteNew {
        route_id: route_id.to_string(),
        ..route
    })
}

async fn insert_route(db: &impl ConnectionTrait, route: &RouteNew) -> ResultEngine<Route> {
    let exists = routes::Entity::find()
        .filter(routes::Column::RouteId.eq(route.route_id.clone()))
        .filter(routes::Column::Year.eq(route.year))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Err(EngineError::Validation(format!(
            "route {} already exists for {}",
            route.route_id, route.year
        )));
    }

    if route.is_baseline {
        clear_baseline(db, route.year).await?;
    }
    let model = routes::ActiveModel::from(route).insert(db).await?;
    Ok(Route::from(model))
}

async fn clear_baseline(db: &impl ConnectionTrait, year: i32) -> ResultEngine<()> {
    routes::Entity::update_many()
        .col_expr(routes::Column::IsBaseline, Expr::value(false))
        .filter(routes::Column::Year.eq(year))
        .exec(db)
        .await?;
    Ok(())
}
