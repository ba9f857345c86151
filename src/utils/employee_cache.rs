use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// Normalized display name => employee id.
pub static EMPLOYEE_CACHE: Lazy<Cache<String, u64>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Remember a resolved display name
pub async fn remember(name: &str, employee_id: u64) {
    EMPLOYEE_CACHE
        .insert(name.trim().to_lowercase(), employee_id)
        .await;
}

/// Cached employee id for a display name, if previously resolved
pub async fn lookup(name: &str) -> Option<u64> {
    EMPLOYEE_CACHE.get(&name.trim().to_lowercase()).await
}

/// Batch insert resolved names
async fn batch_remember(entries: &[(String, u64)]) {
    let futures: Vec<_> = entries
        .iter()
        .map(|(name, id)| EMPLOYEE_CACHE.insert(name.trim().to_lowercase(), *id))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load active employees into the in-memory cache (batched)
pub async fn warmup_employee_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, u64)>(
        "SELECT TRIM(CONCAT(COALESCE(CONCAT(extname, ' '), ''), first_name, ' ', last_name)), id \
         FROM employees \
         WHERE status = 'active'",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let entry = row?;
        batch.push(entry);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_remember(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_remember(&batch).await;
    }

    log::info!(
        "Employee cache warmup complete: {} active employees",
        total_count
    );

    Ok(())
}
