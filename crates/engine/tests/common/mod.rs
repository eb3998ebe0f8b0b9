#![allow(dead_code)]

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::Engine;
use migration::MigratorTrait;

pub async fn db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // One connection keeps every query on the same in-memory database.
    options
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn seed_record(db: &DatabaseConnection, ship_id: &str, year: i32, cb: f64) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO ship_compliance (ship_id, year, cb_gco2eq) VALUES (?, ?, ?)",
        vec![ship_id.into(), year.into(), cb.into()],
    ))
    .await
    .unwrap();
}

pub async fn cb(engine: &Engine, ship_id: &str, year: i32) -> f64 {
    engine
        .compliance_record(ship_id, year)
        .await
        .unwrap()
        .cb_gco2eq
}
