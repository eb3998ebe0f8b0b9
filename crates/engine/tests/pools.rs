use std::sync::Arc;

use engine::{CreatePoolCmd, EngineError};

mod common;

use common::{cb, engine_with_db, seed_record};

#[tokio::test]
async fn pool_redistributes_surplus_and_updates_records() {
    let (engine, db) = engine_with_db().await;
    seed_record(&db, "A", 2025, 100.0).await;
    seed_record(&db, "B", 2025, -40.0).await;
    seed_record(&db, "C", 2025, -30.0).await;

    let pool = engine
        .create_pool(CreatePoolCmd::new(2025, ["A", "B", "C"]))
        .await
        .unwrap();

    let after: Vec<(&str, f64, f64)> = pool
        .members
        .iter()
        .map(|m| (m.ship_id.as_str(), m.cb_before, m.cb_after))
        .collect();
    assert_eq!(
        after,
        vec![("A", 100.0, 30.0), ("B", -40.0, 0.0), ("C", -30.0, 0.0)]
    );
    assert_eq!(pool.total_before(), pool.total_after());

    assert_eq!(cb(&engine, "A", 2025).await, 30.0);
    assert_eq!(cb(&engine, "B", 2025).await, 0.0);
    assert_eq!(cb(&engine, "C", 2025).await, 0.0);

    let stored = engine.pool(pool.id).await.unwrap();
    assert_eq!(stored.year, 2025);
    assert_eq!(stored.members, pool.members);
}

#[tokio::test]
async fn pool_with_negative_sum_is_rejected_without_side_effects() {
    let (engine, db) = engine_with_db().await;
    seed_record(&db, "A", 2025, 10.0).await;
    seed_record(&db, "B", 2025, -50.0).await;

    let err = engine
        .create_pool(CreatePoolCmd::new(2025, ["A", "B"]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(msg) if msg.contains("pool sum")));

    assert_eq!(cb(&engine, "A", 2025).await, 10.0);
    assert_eq!(cb(&engine, "B", 2025).await, -50.0);
    assert!(engine.pools(2025).await.unwrap().is_empty());
}

#[tokio::test]
async fn pool_requires_a_record_for_every_ship() {
    let (engine, db) = engine_with_db().await;
    seed_record(&db, "A", 2025, 100.0).await;

    let err = engine
        .create_pool(CreatePoolCmd::new(2025, ["A", "GHOST"]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::NotFound("compliance record for ship GHOST in 2025".to_string())
    );
    assert!(engine.pools(2025).await.unwrap().is_empty());
    assert_eq!(cb(&engine, "A", 2025).await, 100.0);
}

#[tokio::test]
async fn pool_rejects_bad_ship_lists() {
    let (engine, db) = engine_with_db().await;
    seed_record(&db, "A", 2025, 100.0).await;

    let err = engine
        .create_pool(CreatePoolCmd::new(2025, Vec::<String>::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_pool(CreatePoolCmd::new(2025, ["A", " A "]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(msg) if msg.contains("more than once")));
}

#[tokio::test]
async fn unchanged_members_keep_their_record() {
    let (engine, db) = engine_with_db().await;
    seed_record(&db, "A", 2025, 50.0).await;
    seed_record(&db, "Z", 2025, 0.0).await;
    seed_record(&db, "OTHER", 2024, -10.0).await;

    let pool = engine
        .create_pool(CreatePoolCmd::new(2025, ["A", "Z"]))
        .await
        .unwrap();

    assert!(pool.members.iter().all(|m| m.delta() == 0.0));
    assert_eq!(cb(&engine, "A", 2025).await, 50.0);
    assert_eq!(cb(&engine, "Z", 2025).await, 0.0);
    assert_eq!(cb(&engine, "OTHER", 2024).await, -10.0);
}

#[tokio::test]
async fn pools_are_listed_per_year() {
    let (engine, db) = engine_with_db().await;
    seed_record(&db, "A", 2025, 100.0).await;
    seed_record(&db, "B", 2025, -40.0).await;
    seed_record(&db, "A", 2024, 10.0).await;

    let first = engine
        .create_pool(CreatePoolCmd::new(2025, ["A", "B"]))
        .await
        .unwrap();
    engine
        .create_pool(CreatePoolCmd::new(2024, ["A"]))
        .await
        .unwrap();

    let pools = engine.pools(2025).await.unwrap();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].id, first.id);

    let err = engine.pool(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn overlapping_pools_do_not_double_allocate() {
    let (engine, db) = engine_with_db().await;
    seed_record(&db, "A", 2025, 100.0).await;
    seed_record(&db, "B", 2025, -40.0).await;
    seed_record(&db, "C", 2025, -30.0).await;

    let engine = Arc::new(engine);
    let left = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.create_pool(CreatePoolCmd::new(2025, ["A", "B"])).await })
    };
    let right = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.create_pool(CreatePoolCmd::new(2025, ["C", "A"])).await })
    };
    let left = left.await.unwrap().unwrap();
    let right = right.await.unwrap().unwrap();

    let a_of = |pool: &engine::Pool| {
        pool.members
            .iter()
            .find(|m| m.ship_id == "A")
            .cloned()
            .unwrap()
    };
    let (first, second) = if a_of(&left).cb_before == 100.0 {
        (a_of(&left), a_of(&right))
    } else {
        (a_of(&right), a_of(&left))
    };
    // The later pool starts from what the earlier one left.
    assert_eq!(second.cb_before, first.cb_after);

    assert_eq!(cb(&engine, "A", 2025).await, 30.0);
    assert_eq!(cb(&engine, "B", 2025).await, 0.0);
    assert_eq!(cb(&engine, "C", 2025).await, 0.0);
    assert_eq!(engine.pools(2025).await.unwrap().len(), 2);
}

#[tokio::test]
async fn pool_short_by_a_fraction_is_not_formed() {
    let (engine, db) = engine_with_db().await;
    seed_record(&db, "A", 2025, 10.0).await;
    seed_record(&db, "B", 2025, -10.0009).await;

    let err = engine
        .create_pool(CreatePoolCmd::new(2025, ["A", "B"]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(msg) if msg.contains("pool sum")));
    assert!(engine.pools(2025).await.unwrap().is_empty());
    assert_eq!(cb(&engine, "A", 2025).await, 10.0);
}
