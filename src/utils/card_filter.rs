use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// A college roster is small; leave generous headroom anyway.
const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Registered card ids. Lets the swipe endpoint reject an unknown card
/// without a database round trip. False positives fall through to the
/// roster lookup, which stays authoritative.
static CARD_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE))
});

/// Card readers pad their output; the DB stores ids unpadded.
#[inline]
pub fn normalize(card_id: &str) -> String {
    card_id.trim().to_string()
}

/// Check if a card might be registered (false positives possible)
pub fn might_exist(card_id: &str) -> bool {
    let card_id = normalize(card_id);
    CARD_FILTER
        .read()
        .expect("card filter poisoned")
        .contains(&card_id)
}

/// Insert a single card id into the filter
pub fn insert(card_id: &str) {
    let card_id = normalize(card_id);
    CARD_FILTER
        .write()
        .expect("card filter poisoned")
        .add(&card_id);
}

/// Remove a card id from the filter (student deleted or card re-issued)
pub fn remove(card_id: &str) {
    let card_id = normalize(card_id);
    CARD_FILTER
        .write()
        .expect("card filter poisoned")
        .remove(&card_id);
}

/// Warm up the card filter from the roster using streaming + batching
pub async fn warmup_card_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String,)>("SELECT card_id FROM students").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (card_id,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&card_id));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Card filter warmup complete: {} cards", total);
    Ok(())
}

/// Insert a batch of normalized card ids
fn insert_batch(card_ids: &[String]) {
    let mut filter = CARD_FILTER.write().expect("card filter poisoned");

    for card_id in card_ids {
        filter.add(card_id);
    }
}
