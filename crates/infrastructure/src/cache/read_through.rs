use std::future::Future;

use fleet_core::FleetResult;

use super::ResourceCache;

/// Refresh-ahead read: a hit is returned immediately and a background refresh
/// is started for the key; a miss (or `force_refresh`) fetches synchronously
/// and stores the result before returning it.
pub async fn read_through<V, F, Fut>(
    cache: &ResourceCache<V>,
    key: &str,
    force_refresh: bool,
    fetch: F,
) -> FleetResult<V>
where
    V: Clone + Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = FleetResult<V>> + Send + 'static,
{
    if !force_refresh {
        if let Some(value) = cache.get(key) {
            cache.start_background_refresh(key, fetch);
            return Ok(value);
        }
    }

    let value = fetch().await?;
    cache.set(key, value.clone());
    Ok(value)
}
