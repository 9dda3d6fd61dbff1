use chrono::{DateTime, Duration, TimeZone, Utc};
use group_pool::domain::ports::PoolStore;
use group_pool::{
    ManualClock, MemoryStore, NewPool, NewProduct, NewRequest, PoolError, PoolService, PoolState,
};
use rust_decimal::Decimal;
use std::sync::Arc;

struct TestContext {
    service: PoolService,
    store: Arc<MemoryStore>,
    clock: ManualClock,
    now: DateTime<Utc>,
}

fn context() -> TestContext {
    let now = Utc.with_ymd_and_hms(2025, 9, 15, 14, 0, 0).unwrap();
    let clock = ManualClock::new(now);
    let store = Arc::new(MemoryStore::new());
    let service = PoolService::new(store.clone(), Arc::new(clock.clone()));
    TestContext {
        service,
        store,
        clock,
        now,
    }
}

async fn open_pool(ctx: &TestContext, min_quantity: i64) -> u64 {
    let product = ctx
        .service
        .catalog()
        .create_product(NewProduct {
            name: "Espresso machine".to_string(),
            description: "Dual boiler".to_string(),
            unit_price: Decimal::new(89900, 2),
        })
        .await
        .unwrap();

    let view = ctx
        .service
        .create_pool(NewPool {
            product_id: product.id,
            start_at: ctx.now - Duration::hours(1),
            end_at: ctx.now + Duration::hours(1),
            min_quantity,
        })
        .await
        .unwrap();
    view.pool.id
}

#[tokio::test]
async fn test_pool_reaches_threshold() {
    let ctx = context();
    let pool_id = open_pool(&ctx, 10).await;

    for (email, quantity) in [("a@x.com", 4), ("b@x.com", 5)] {
        ctx.service
            .submit_request(NewRequest::new(pool_id, email).with_quantity(quantity))
            .await
            .unwrap();
    }

    let view = ctx.service.get_pool(pool_id).await.unwrap();
    assert_eq!(view.aggregate.committed_quantity, 9);
    assert!(view.aggregate.is_open);
    assert!(!view.aggregate.is_fulfilled);

    ctx.service
        .submit_request(NewRequest::new(pool_id, "c@x.com").with_quantity(1))
        .await
        .unwrap();

    let view = ctx.service.get_pool(pool_id).await.unwrap();
    assert_eq!(view.aggregate.committed_quantity, 10);
    assert_eq!(view.aggregate.request_count, 3);
    assert!(view.aggregate.is_fulfilled);
}

#[tokio::test]
async fn test_duplicate_commitment_keeps_total() {
    let ctx = context();
    let pool_id = open_pool(&ctx, 10).await;

    ctx.service
        .submit_request(NewRequest::new(pool_id, "a@x.com").with_quantity(4))
        .await
        .unwrap();

    let result = ctx
        .service
        .submit_request(NewRequest::new(pool_id, "a@x.com").with_quantity(2))
        .await;

    match result {
        Err(PoolError::DuplicateCommitmentError { pool_id: id, email }) => {
            assert_eq!(id, pool_id);
            assert_eq!(email, "a@x.com");
        }
        other => panic!("expected DuplicateCommitmentError, got {:?}", other),
    }

    let aggregate = ctx.service.ledger().get_aggregate(pool_id).await.unwrap();
    assert_eq!(aggregate.committed_quantity, 4);
}

#[tokio::test]
async fn test_submission_outside_window_is_rejected() {
    let ctx = context();
    let product = ctx
        .service
        .catalog()
        .create_product(NewProduct {
            name: "Bike helmet".to_string(),
            description: String::new(),
            unit_price: Decimal::new(5999, 2),
        })
        .await
        .unwrap();
    let pool = ctx
        .service
        .create_pool(NewPool {
            product_id: product.id,
            start_at: ctx.now + Duration::hours(1),
            end_at: ctx.now + Duration::hours(2),
            min_quantity: 3,
        })
        .await
        .unwrap()
        .pool;

    let early = ctx
        .service
        .submit_request(NewRequest::new(pool.id, "early@x.com"))
        .await;
    assert!(matches!(early, Err(PoolError::PoolClosedError { ref state, .. }) if state == "pending"));

    ctx.clock.set(pool.start_at);
    ctx.service
        .submit_request(NewRequest::new(pool.id, "ontime@x.com"))
        .await
        .unwrap();

    ctx.clock.set(pool.end_at + Duration::seconds(1));
    // 不合法的數量與重複的買家也一律回報 PoolClosed
    for request in [
        NewRequest::new(pool.id, "late@x.com").with_quantity(0),
        NewRequest::new(pool.id, "ontime@x.com").with_quantity(2),
        NewRequest::new(pool.id, "late@x.com").with_quantity(2),
    ] {
        let result = ctx.service.submit_request(request).await;
        assert!(matches!(result, Err(PoolError::PoolClosedError { .. })));
    }

    let view = ctx.service.get_pool(pool.id).await.unwrap();
    assert_eq!(view.aggregate.state, PoolState::Closed);
    assert_eq!(view.aggregate.request_count, 1);
    assert_eq!(view.aggregate.committed_quantity, 1);
}

#[tokio::test]
async fn test_create_pool_rejects_inverted_window() {
    let ctx = context();
    let pool_id = open_pool(&ctx, 2).await;
    let product_id = ctx.service.get_pool(pool_id).await.unwrap().pool.product_id;

    for end_at in [ctx.now, ctx.now - Duration::minutes(1)] {
        let result = ctx
            .service
            .create_pool(NewPool {
                product_id,
                start_at: ctx.now,
                end_at,
                min_quantity: 2,
            })
            .await;
        assert!(matches!(result, Err(PoolError::ValidationError { .. })));
    }

    assert_eq!(ctx.service.list_pools(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deleting_pool_removes_requests() {
    let ctx = context();
    let pool_id = open_pool(&ctx, 5).await;
    for email in ["a@x.com", "b@x.com", "c@x.com"] {
        ctx.service
            .submit_request(NewRequest::new(pool_id, email))
            .await
            .unwrap();
    }

    ctx.service.ledger().delete_pool(pool_id).await.unwrap();

    assert!(ctx.store.requests_page(pool_id, None, 100).await.unwrap().is_empty());
    assert_eq!(ctx.store.request_totals(pool_id).await.unwrap().request_count, 0);
    assert!(matches!(
        ctx.service.list_requests(pool_id).await,
        Err(PoolError::NotFoundError { .. })
    ));
    assert!(matches!(
        ctx.service.submit_request(NewRequest::new(pool_id, "d@x.com")).await,
        Err(PoolError::NotFoundError { .. })
    ));
}

#[tokio::test]
async fn test_deleting_product_cascades_to_pools() {
    let ctx = context();
    let pool_id = open_pool(&ctx, 5).await;
    ctx.service
        .submit_request(NewRequest::new(pool_id, "a@x.com").with_quantity(2))
        .await
        .unwrap();
    let product_id = ctx.service.get_pool(pool_id).await.unwrap().pool.product_id;

    ctx.service.catalog().delete_product(product_id).await.unwrap();

    assert!(ctx.service.list_pools(None).await.unwrap().is_empty());
    assert!(ctx.store.requests_page(pool_id, None, 100).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_price_edit_does_not_touch_pools() {
    let ctx = context();
    let pool_id = open_pool(&ctx, 5).await;
    let before = ctx.service.get_pool(pool_id).await.unwrap();

    ctx.service
        .catalog()
        .update_product(
            before.pool.product_id,
            group_pool::ProductPatch {
                unit_price: Some(Decimal::new(79900, 2)),
                description: Some("Dual boiler, 2025 model".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let after = ctx.service.get_pool(pool_id).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_list_requests_in_creation_order() {
    let ctx = context();
    let pool_id = open_pool(&ctx, 5).await;
    for (step, email) in ["z@x.com", "m@x.com", "a@x.com"].iter().enumerate() {
        ctx.clock.set(ctx.now + Duration::minutes(step as i64));
        ctx.service
            .submit_request(NewRequest::new(pool_id, *email))
            .await
            .unwrap();
    }

    let mut listing = ctx.service.list_requests(pool_id).await.unwrap();
    let first_pass = listing.collect_all().await.unwrap();
    let second_pass = listing.collect_all().await.unwrap();

    let emails: Vec<&str> = first_pass.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(emails, vec!["z@x.com", "m@x.com", "a@x.com"]);
    assert_eq!(first_pass, second_pass);
    assert!(first_pass
        .windows(2)
        .all(|pair| pair[0].created_at <= pair[1].created_at));
}

#[tokio::test]
async fn test_reschedule_cannot_strand_requests() {
    let ctx = context();
    let pool_id = open_pool(&ctx, 5).await;
    let request = ctx
        .service
        .submit_request(NewRequest::new(pool_id, "a@x.com").with_quantity(2))
        .await
        .unwrap();

    ctx.clock.set(ctx.now + Duration::minutes(30));
    for patch in [
        group_pool::PoolPatch {
            start_at: Some(ctx.now + Duration::minutes(10)),
            ..Default::default()
        },
        group_pool::PoolPatch {
            end_at: Some(ctx.now - Duration::minutes(5)),
            ..Default::default()
        },
    ] {
        let result = ctx.service.ledger().update_pool(pool_id, patch).await;
        assert!(matches!(result, Err(PoolError::ValidationError { .. })));
    }

    let pool = ctx.service.get_pool(pool_id).await.unwrap().pool;
    assert!(pool.start_at <= request.created_at && request.created_at <= pool.end_at);

    // 延長結束時間仍然允許
    let extended = ctx
        .service
        .ledger()
        .update_pool(
            pool_id,
            group_pool::PoolPatch {
                end_at: Some(ctx.now + Duration::hours(3)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(extended.end_at, ctx.now + Duration::hours(3));
}
