//! Query cache middleware: request-scoped caching and teardown

mod common;

use common::{doc, CountingDriver};
use docmap::infrastructure::storage::cache::CacheGuard;
use docmap::{query_cache, Criteria, Driver, QueryCacheMiddleware, QueryExecutor};
use serde_json::json;
use std::sync::Arc;

async fn seeded() -> (Arc<CountingDriver>, QueryExecutor) {
    let driver = Arc::new(CountingDriver::new());
    driver
        .insert("people", doc(json!({"_id": "1", "name": "Ada", "age": 36})))
        .await
        .unwrap();
    driver
        .insert("people", doc(json!({"_id": "2", "name": "Grace", "age": 45})))
        .await
        .unwrap();
    let executor = QueryExecutor::new(driver.clone());
    (driver, executor)
}

fn query_a() -> Criteria {
    Criteria::new("people").where_eq("name", json!("Ada"))
}

#[tokio::test]
async fn test_repeated_query_is_served_from_cache() {
    let (driver, executor) = seeded().await;
    let middleware = QueryCacheMiddleware::new();

    middleware
        .call((), |_| async {
            assert!(query_cache::is_enabled());

            let first = executor.find(&query_a()).await.unwrap();
            assert_eq!(driver.finds(), 1);
            assert_eq!(query_cache::len(), 1);

            let second = executor.find(&query_a()).await.unwrap();
            assert_eq!(driver.finds(), 1);
            assert!(Arc::ptr_eq(&first, &second));
            assert_eq!(second[0]["name"], json!("Ada"));
        })
        .await;

    // Outside the request there is no cache at all
    assert!(!query_cache::is_enabled());
    assert_eq!(query_cache::len(), 0);
}

#[tokio::test]
async fn test_different_queries_miss_separately() {
    let (driver, executor) = seeded().await;

    QueryCacheMiddleware::new()
        .call((), |_| async {
            executor.find(&query_a()).await.unwrap();
            executor
                .find(&Criteria::new("people").where_eq("name", json!("Grace")))
                .await
                .unwrap();
            executor.find(&query_a().only(&["name"])).await.unwrap();
            assert_eq!(driver.finds(), 3);
            assert_eq!(query_cache::len(), 3);
        })
        .await;
}

#[tokio::test]
async fn test_no_leakage_between_sequential_invocations() {
    let (driver, executor) = seeded().await;
    let middleware = QueryCacheMiddleware::new();

    middleware
        .call((), |_| async {
            executor.find(&query_a()).await.unwrap();
        })
        .await;
    assert_eq!(driver.finds(), 1);

    middleware
        .call((), |_| async {
            assert_eq!(query_cache::len(), 0);
            executor.find(&query_a()).await.unwrap();
        })
        .await;
    assert_eq!(driver.finds(), 2);
}

#[tokio::test]
async fn test_handler_failure_propagates_unchanged() {
    let (driver, executor) = seeded().await;
    let middleware = QueryCacheMiddleware::new();

    let exec = &executor;
    let result: Result<(u16, String), String> = middleware
        .call("request-1", |input| async move {
            exec.find(&query_a()).await.unwrap();
            Err(format!("handler failed on {}", input))
        })
        .await;
    assert_eq!(result, Err("handler failed on request-1".to_string()));

    // Next request starts from an empty store
    middleware
        .call((), |_| async {
            assert_eq!(query_cache::len(), 0);
            executor.find(&query_a()).await.unwrap();
        })
        .await;
    assert_eq!(driver.finds(), 2);
}

#[tokio::test]
async fn test_guard_tears_down_on_error_path() {
    let (_driver, executor) = seeded().await;

    query_cache::scope(async {
        let result: Result<(), &str> = async {
            let _guard = CacheGuard::enable();
            executor.find(&query_a()).await.unwrap();
            assert_eq!(query_cache::len(), 1);
            Err("boom")
        }
        .await;

        assert_eq!(result, Err("boom"));
        assert!(!query_cache::is_enabled());
        assert_eq!(query_cache::len(), 0);
    })
    .await;
}

#[tokio::test]
async fn test_handler_panic_does_not_leak_entries() {
    let (driver, executor) = seeded().await;

    let panicking = {
        let executor = executor.clone();
        tokio::spawn(async move {
            QueryCacheMiddleware::new()
                .call((), |_| async {
                    executor.find(&query_a()).await.unwrap();
                    panic!("handler blew up");
                })
                .await
        })
    };
    let err = panicking.await.unwrap_err();
    assert!(err.is_panic());
    assert_eq!(driver.finds(), 1);

    QueryCacheMiddleware::new()
        .call((), |_| async {
            assert_eq!(query_cache::len(), 0);
            executor.find(&query_a()).await.unwrap();
        })
        .await;
    assert_eq!(driver.finds(), 2);
}

#[tokio::test]
async fn test_output_passes_through_verbatim() {
    let middleware = QueryCacheMiddleware::new();
    let (status, body) = middleware
        .call(21, |n| async move { (200u16, format!("answer={}", n * 2)) })
        .await;
    assert_eq!(status, 200);
    assert_eq!(body, "answer=42");
}

#[tokio::test]
async fn test_driver_failure_is_not_cached() {
    let (driver, executor) = seeded().await;

    QueryCacheMiddleware::new()
        .call((), |_| async {
            driver.fail_finds(true);
            assert!(executor.find(&query_a()).await.is_err());
            assert_eq!(query_cache::len(), 0);

            driver.fail_finds(false);
            let docs = executor.find(&query_a()).await.unwrap();
            assert_eq!(docs.len(), 1);
        })
        .await;
    assert_eq!(driver.finds(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_have_independent_stores() {
    let (_driver, executor) = seeded().await;
    let middleware = QueryCacheMiddleware::new();

    let request = |name: &'static str| {
        let executor = executor.clone();
        let middleware = middleware.clone();
        async move {
            middleware
                .call(name, |name| async move {
                    executor
                        .find(&Criteria::new("people").where_eq("name", json!(name)))
                        .await
                        .unwrap();
                    tokio::task::yield_now().await;
                    query_cache::len()
                })
                .await
        }
    };

    let (left, right) = tokio::join!(request("Ada"), request("Grace"));
    assert_eq!(left, 1);
    assert_eq!(right, 1);
}

#[tokio::test]
async fn test_disabled_middleware_does_not_cache() {
    let (driver, executor) = seeded().await;
    let config = docmap::infrastructure::config::QueryCacheConfig { enabled: false };

    QueryCacheMiddleware::from_config(&config)
        .call((), |_| async {
            assert!(!query_cache::is_enabled());
            executor.find(&query_a()).await.unwrap();
            executor.find(&query_a()).await.unwrap();
        })
        .await;
    assert_eq!(driver.finds(), 2);
}

#[tokio::test]
async fn test_write_during_inflight_find_is_not_undone() {
    let (driver, executor) = seeded().await;
    driver.slow_finds(2);
    let query = Criteria::new("people").where_eq("_id", json!("1"));

    QueryCacheMiddleware::new()
        .call((), |_| async {
            let (before, deleted) = tokio::join!(executor.find(&query), async {
                tokio::task::yield_now().await;
                executor
                    .delete_where("people", &doc(json!({"_id": "1"})))
                    .await
            });
            assert_eq!(before.unwrap().len(), 1);
            assert_eq!(deleted.unwrap(), 1);

            // The result read before the delete must not have been cached
            assert_eq!(query_cache::len(), 0);
            let after = executor.find(&query).await.unwrap();
            assert!(after.is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_nested_guard_keeps_outer_cache() {
    let (driver, executor) = seeded().await;

    QueryCacheMiddleware::new()
        .call((), |_| async {
            executor.find(&query_a()).await.unwrap();
            {
                let _inner = CacheGuard::enable();
                assert!(query_cache::is_enabled());
            }
            assert!(query_cache::is_enabled());
            assert_eq!(query_cache::len(), 1);
            executor.find(&query_a()).await.unwrap();
        })
        .await;
    assert_eq!(driver.finds(), 1);
}
