use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real headcounts.
const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static NAME_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check if an employee display name might exist (false positives possible)
pub fn might_exist(name: &str) -> bool {
    let name = normalize(name);
    NAME_FILTER
        .read()
        .expect("employee name filter poisoned")
        .contains(&name)
}

/// Insert a single display name into the filter
pub fn insert(name: &str) {
    let name = normalize(name);
    NAME_FILTER
        .write()
        .expect("employee name filter poisoned")
        .add(&name);
}

/// Remove a display name from the filter
pub fn remove(name: &str) {
    let name = normalize(name);
    NAME_FILTER
        .write()
        .expect("employee name filter poisoned")
        .remove(&name);
}

/// Warm up the name filter using streaming + batching
pub async fn warmup_employee_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        "SELECT TRIM(CONCAT(COALESCE(CONCAT(extname, ' '), ''), first_name, ' ', last_name)) \
         FROM employees",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (name,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&name));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Employee name filter warmup complete: {} employees", total);
    Ok(())
}

/// Insert a batch of normalized names
fn insert_batch(names: &[String]) {
    let mut filter = NAME_FILTER
        .write()
        .expect("employee name filter poisoned");

    for name in names {
        filter.add(name);
    }
}
