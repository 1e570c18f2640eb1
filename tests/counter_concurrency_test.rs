use plixies_api::db;
use plixies_api::services::counters;
use std::collections::HashSet;
use std::sync::Arc;

// Ignored by default: needs a real Postgres database with migrations applied.
// Run with: DATABASE_URL=postgres://... cargo test -- --ignored counter
#[tokio::test]
#[ignore]
async fn concurrent_serial_issuance_yields_distinct_contiguous_values() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for ignored test");
    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let pool = Arc::new(pool);

    let baseline = counters::next_iso_number(&*pool, 25)
        .await
        .expect("baseline issue");

    let mut tasks = Vec::new();
    for _ in 0..40 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            counters::next_iso_number(&*pool, 25).await
        }));
    }

    let mut issued = Vec::new();
    for task in tasks {
        issued.push(task.await.expect("join").expect("issue"));
    }

    let distinct: HashSet<i64> = issued.iter().copied().collect();
    assert_eq!(distinct.len(), issued.len(), "serials must never repeat");

    let min = *issued.iter().min().expect("non-empty");
    let max = *issued.iter().max().expect("non-empty");
    assert_eq!(min, baseline + 1);
    assert_eq!(max, baseline + issued.len() as i64, "no gaps in the block");
}

#[tokio::test]
#[ignore]
async fn pallet_numbers_are_globally_unique() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for ignored test");
    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let pool = Arc::new(pool);

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            counters::next_pallet_number(&*pool).await
        }));
    }
    let mut issued = Vec::new();
    for task in tasks {
        issued.push(task.await.expect("join").expect("issue"));
    }
    let distinct: HashSet<i64> = issued.iter().copied().collect();
    assert_eq!(distinct.len(), issued.len());
}

#[tokio::test]
#[ignore]
async fn unsupported_size_is_rejected_without_touching_counters() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for ignored test");
    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");

    let err = counters::next_iso_number(&pool, 20).await.unwrap_err();
    assert!(matches!(
        err,
        plixies_api::errors::ServiceError::InvalidInput(_)
    ));
}
