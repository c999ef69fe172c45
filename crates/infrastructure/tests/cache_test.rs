use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fleet_core::{CacheConfig, FleetError};
use fleet_infrastructure::{read_through, ResourceCache, TtlPolicy};

fn scenario_policy() -> TtlPolicy {
    TtlPolicy::new(Duration::from_secs(10)).with_class("instances", Duration::from_secs(2))
}

#[tokio::test(start_paused = true)]
async fn test_instances_entry_expires_after_class_ttl() {
    let cache = ResourceCache::new(scenario_policy());
    cache.set("instances_p_r1", vec!["x".to_string()]);
    assert_eq!(cache.get("instances_p_r1"), Some(vec!["x".to_string()]));

    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(cache.get("instances_p_r1"), None);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_class_uses_default_ttl() {
    let cache = ResourceCache::new(scenario_policy());
    cache.set("widgets_p_r1", 7u32);
    cache.set("nounderscore", 8u32);

    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(cache.get("widgets_p_r1"), Some(7));
    assert_eq!(cache.get("nounderscore"), Some(8));

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(cache.get("widgets_p_r1"), None);
    assert_eq!(cache.get("nounderscore"), None);
}

#[tokio::test(start_paused = true)]
async fn test_config_driven_ttls() {
    let cache = ResourceCache::new(TtlPolicy::from_config(&CacheConfig::default()));
    cache.set("regions_prod_global", 1u8);
    cache.set("ssm_prod_us-east-1", 2u8);

    tokio::time::advance(Duration::from_secs(121)).await;
    assert_eq!(cache.get("ssm_prod_us-east-1"), None);
    assert_eq!(cache.get("regions_prod_global"), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_successful_refresh_restarts_ttl_clock() {
    let cache = ResourceCache::new(scenario_policy());
    cache.set("instances_p_r1", 1u32);

    tokio::time::advance(Duration::from_millis(1500)).await;
    cache
        .start_background_refresh("instances_p_r1", || async { Ok::<u32, FleetError>(2) })
        .unwrap()
        .await
        .unwrap();

    // 距最初写入已3秒，超过2秒TTL，但刷新重新计时
    tokio::time::advance(Duration::from_millis(1500)).await;
    assert_eq!(cache.get("instances_p_r1"), Some(2));

    tokio::time::advance(Duration::from_millis(600)).await;
    assert_eq!(cache.get("instances_p_r1"), None);
}

#[tokio::test]
async fn test_concurrent_refresh_requests_fetch_once() {
    let cache: ResourceCache<u32> = ResourceCache::new(scenario_policy());
    let calls = Arc::new(AtomicUsize::new(0));

    let slow_fetch = |calls: Arc<AtomicUsize>| {
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<u32, FleetError>(42)
        }
    };

    let first = cache.start_background_refresh("k", slow_fetch(Arc::clone(&calls)));
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = cache.start_background_refresh("k", slow_fetch(Arc::clone(&calls)));

    assert!(first.is_some());
    assert!(second.is_none());

    first.unwrap().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get("k"), Some(42));
    assert!(!cache.is_refreshing("k"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_keeps_previous_value_until_expiry() {
    let cache = ResourceCache::new(scenario_policy());
    cache.set("instances_p_r1", 1u32);

    let handle = cache
        .start_background_refresh("instances_p_r1", || async {
            Err(FleetError::transient("throttled"))
        })
        .unwrap();
    handle.await.unwrap();

    assert_eq!(cache.get("instances_p_r1"), Some(1));
    assert_eq!(cache.stats().refresh_failures, 1);

    tokio::time::advance(Duration::from_millis(2001)).await;
    assert_eq!(cache.get("instances_p_r1"), None);
}

#[tokio::test]
async fn test_read_through_serves_hits_and_refreshes_behind() {
    let cache: ResourceCache<u32> = ResourceCache::new(scenario_policy());
    let calls = Arc::new(AtomicUsize::new(0));

    let fetch = |calls: Arc<AtomicUsize>, value: u32| {
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, FleetError>(value)
        }
    };

    let miss = read_through(&cache, "rds_p_r1", false, fetch(Arc::clone(&calls), 1))
        .await
        .unwrap();
    assert_eq!(miss, 1);

    // 命中时返回旧值，刷新在后台进行
    let hit = read_through(&cache, "rds_p_r1", false, fetch(Arc::clone(&calls), 2))
        .await
        .unwrap();
    assert_eq!(hit, 1);

    let settled = fleet_testing_utils::TestEnv::wait_for(
        || {
            let cache = cache.clone();
            async move { cache.get("rds_p_r1") == Some(2) }
        },
        Duration::from_secs(2),
    )
    .await;
    assert!(settled);

    let forced = read_through(&cache, "rds_p_r1", true, fetch(Arc::clone(&calls), 3))
        .await
        .unwrap();
    assert_eq!(forced, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_read_through_propagates_fetch_error_on_miss() {
    let cache: ResourceCache<u32> = ResourceCache::new(scenario_policy());
    let result = read_through(&cache, "rds_p_r1", false, || async {
        Err(FleetError::transient("throttled"))
    })
    .await;

    assert!(result.is_err());
    assert!(cache.is_empty());
}
