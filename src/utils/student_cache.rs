use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::student::Student;

/// card_id -> roster snapshot, so a swipe usually skips the roster query.
/// Roster edits must invalidate (see the student handlers).
pub static STUDENT_CACHE: Lazy<Cache<String, Student>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(50_000)
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

/// Cache one student under their card id
pub async fn put(student: &Student) {
    STUDENT_CACHE
        .insert(student.card_id.clone(), student.clone())
        .await;
}

/// Look up the cached snapshot for a card
pub async fn get(card_id: &str) -> Option<Student> {
    STUDENT_CACHE.get(card_id).await
}

/// Drop a card's cached snapshot (student edited or deleted)
pub async fn invalidate(card_id: &str) {
    STUDENT_CACHE.invalidate(card_id).await;
}

/// Batch insert students
async fn batch_put(students: &[Student]) {
    let futures: Vec<_> = students
        .iter()
        .map(|s| STUDENT_CACHE.insert(s.card_id.clone(), s.clone()))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load the whole roster into the in-memory cache (batched)
pub async fn warmup_student_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, Student>("SELECT * FROM students").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let student = row?;
        batch.push(student);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_put(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining students
    if !batch.is_empty() {
        batch_put(&batch).await;
    }

    log::info!("Student cache warmup complete: {} students", total_count);

    Ok(())
}
