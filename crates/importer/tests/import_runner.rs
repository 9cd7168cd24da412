//! End-to-end tests for the import runner against a real database.
//!
//! Each test writes a CSV into a temp directory, creates a job row and runs
//! [`ImportRunner::run`] directly, then inspects products, job counters and
//! the task queue.

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use tempfile::TempDir;

use stockroom_core::import_status::JobStatus;
use stockroom_db::models::product::ProductListQuery;
use stockroom_db::repositories::{ImportJobRepo, ProductRepo};
use stockroom_importer::{ImportError, ImportRunner};

const CHUNK: usize = 5000;

fn write_csv(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

async fn dispatch_tasks(pool: &PgPool) -> Vec<serde_json::Value> {
    sqlx::query_as::<_, (serde_json::Value,)>(
        "SELECT payload FROM tasks WHERE kind = 'webhook.dispatch' ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .unwrap()
    .into_iter()
    .map(|(payload,)| payload)
    .collect()
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_import_applies_rows_and_finalizes(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    // Three data rows: a product, a row without a SKU, and an update to the
    // first product within the same file.
    let path = write_csv(
        &dir,
        "feed.csv",
        "sku,name,description,price,active\n\
         A1,Widget,First widget,9.99,true\n\
         ,Ghost,No sku here,1.00,true\n\
         A1,Widget v2,Updated widget,12.00,false\n",
    );

    let job = ImportJobRepo::create(&pool, "feed.csv").await.unwrap();
    let outcome = ImportRunner::run(&pool, job.id, &path, CHUNK).await.unwrap();

    assert_eq!(outcome.total_rows, 3);
    assert_eq!(outcome.processed, 2);

    let job = ImportJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Done.as_str());
    assert_eq!(job.total_rows, 3);
    assert_eq!(job.processed, 2);
    assert_eq!(job.error, None);

    // The SKU-less row is skipped and the duplicate collapses to its last
    // occurrence, so exactly one product exists.
    let products = ProductRepo::list(&pool, &ProductListQuery::default()).await.unwrap();
    assert_eq!(products.len(), 1);
    let product = &products[0];
    assert_eq!(product.sku, "A1");
    assert_eq!(product.sku_lower, "a1");
    assert_eq!(product.name, "Widget v2");
    assert_eq!(product.description.as_deref(), Some("Updated widget"));
    assert_eq!(product.price, Some(Decimal::new(1200, 2)));
    assert!(!product.active);

    // Completion announced exactly once, with the job's final counters.
    let dispatches = dispatch_tasks(&pool).await;
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0]["event_type"], "import.completed");
    assert_eq!(dispatches[0]["payload"]["job_id"], job.id);
    assert_eq!(dispatches[0]["payload"]["total"], 3);
    assert_eq!(dispatches[0]["payload"]["processed"], 2);
    // The wire key is `total`; the job column name must not leak out.
    assert!(dispatches[0]["payload"].get("total_rows").is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_header_only_file_completes_and_notifies(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "empty.csv", "sku,name,description,price,active\n");

    let job = ImportJobRepo::create(&pool, "empty.csv").await.unwrap();
    let outcome = ImportRunner::run(&pool, job.id, &path, CHUNK).await.unwrap();

    assert_eq!(outcome.total_rows, 0);
    assert_eq!(outcome.processed, 0);

    let job = ImportJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Done.as_str());

    // Even an empty import notifies subscribers that it finished.
    let dispatches = dispatch_tasks(&pool).await;
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0]["payload"]["total"], 0);
    assert_eq!(dispatches[0]["payload"]["processed"], 0);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_missing_file_marks_job_failed(pool: PgPool) {
    let job = ImportJobRepo::create(&pool, "gone.csv").await.unwrap();

    let err = ImportRunner::run(&pool, job.id, "/tmp/stockroom-nope/gone.csv", CHUNK)
        .await
        .unwrap_err();
    assert_matches!(err, ImportError::FileMissing(_));

    let job = ImportJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed.as_str());
    let error = job.error.unwrap();
    assert!(error.contains("CSV file not found"), "unexpected error: {error}");

    // A failed import announces nothing.
    assert!(dispatch_tasks(&pool).await.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unknown_job_is_an_error(pool: PgPool) {
    let err = ImportRunner::run(&pool, 999, "/tmp/whatever.csv", CHUNK)
        .await
        .unwrap_err();
    assert_matches!(err, ImportError::JobNotFound(999));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_flush_failure_keeps_prior_batches(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    // The second row's price overflows NUMERIC(12, 2), so with a chunk size
    // of 1 the second flush fails after the first has committed.
    let path = write_csv(
        &dir,
        "overflow.csv",
        "sku,name,price\n\
         G1,Good,10.00\n\
         G2,Too big,99999999999999.99\n",
    );

    let job = ImportJobRepo::create(&pool, "overflow.csv").await.unwrap();
    let err = ImportRunner::run(&pool, job.id, &path, 1).await.unwrap_err();
    assert_matches!(err, ImportError::Db(_));

    let job = ImportJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed.as_str());
    assert_eq!(job.total_rows, 2);
    // Progress stops at the last committed batch.
    assert_eq!(job.processed, 1);
    assert!(job.error.is_some());

    let products = ProductRepo::list(&pool, &ProductListQuery::default()).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].sku, "G1");

    assert!(dispatch_tasks(&pool).await.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_finished_job_is_not_rerun(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "feed.csv",
        "sku,name\nB1,Original\n",
    );

    let job = ImportJobRepo::create(&pool, "feed.csv").await.unwrap();
    ImportRunner::run(&pool, job.id, &path, CHUNK).await.unwrap();

    // Redelivered task for an already-finalized job must change nothing.
    std::fs::write(dir.path().join("feed.csv"), "sku,name\nB1,Tampered\n").unwrap();
    let outcome = ImportRunner::run(&pool, job.id, &path, CHUNK).await.unwrap();
    assert_eq!(outcome.total_rows, 1);
    assert_eq!(outcome.processed, 1);

    let products = ProductRepo::list(&pool, &ProductListQuery::default()).await.unwrap();
    assert_eq!(products[0].name, "Original");
    assert_eq!(dispatch_tasks(&pool).await.len(), 1);
}

// ---------------------------------------------------------------------------
// Parsing and progress
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn test_chunked_import_processes_all_rows(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    let mut content = String::from("sku,name,description,price,active\n");
    for n in 1..=5 {
        content.push_str(&format!("C{n},Chunked {n},,{n}.00,true\n"));
    }
    let path = write_csv(&dir, "chunked.csv", &content);

    let job = ImportJobRepo::create(&pool, "chunked.csv").await.unwrap();
    let outcome = ImportRunner::run(&pool, job.id, &path, 2).await.unwrap();

    assert_eq!(outcome.total_rows, 5);
    assert_eq!(outcome.processed, 5);

    let job = ImportJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.processed, 5);

    let products = ProductRepo::list(&pool, &ProductListQuery::default()).await.unwrap();
    assert_eq!(products.len(), 5);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_oversized_chunk_size_is_clamped(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    // More rows than one statement can bind (six binds per row against the
    // 65535-parameter cap), with a chunk size asking for all of them at
    // once. The batcher must split the work into flushable batches.
    let rows: i32 = 11_000;
    let mut content = String::from("sku,name,price\n");
    for n in 0..rows {
        content.push_str(&format!("H{n},Bulk {n},1.00\n"));
    }
    let path = write_csv(&dir, "big.csv", &content);

    let job = ImportJobRepo::create(&pool, "big.csv").await.unwrap();
    let outcome = ImportRunner::run(&pool, job.id, &path, 1_000_000)
        .await
        .unwrap();

    assert_eq!(outcome.total_rows, rows);
    assert_eq!(outcome.processed, rows);

    let job = ImportJobRepo::find_by_id(&pool, job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Done.as_str());
    assert_eq!(job.processed, rows);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, i64::from(rows));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_reimport_updates_existing_product(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    let first = write_csv(&dir, "v1.csv", "sku,name,price\nD1,Day one,5.00\n");
    let second = write_csv(&dir, "v2.csv", "sku,name,price\nd1,Day two,6.00\n");

    let job = ImportJobRepo::create(&pool, "v1.csv").await.unwrap();
    ImportRunner::run(&pool, job.id, &first, CHUNK).await.unwrap();
    let original = ProductRepo::list(&pool, &ProductListQuery::default())
        .await
        .unwrap()
        .remove(0);

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    // Same product, different SKU casing: matched on the lowercase key.
    let job = ImportJobRepo::create(&pool, "v2.csv").await.unwrap();
    ImportRunner::run(&pool, job.id, &second, CHUNK).await.unwrap();

    let products = ProductRepo::list(&pool, &ProductListQuery::default()).await.unwrap();
    assert_eq!(products.len(), 1);
    let updated = &products[0];
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.sku, "d1");
    assert_eq!(updated.name, "Day two");
    assert_eq!(updated.price, Some(Decimal::new(600, 2)));
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at > original.updated_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_bom_header_is_recognised(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "bom.csv",
        "\u{feff}sku,name,price\nE1,Excel export,3.50\n",
    );

    let job = ImportJobRepo::create(&pool, "bom.csv").await.unwrap();
    let outcome = ImportRunner::run(&pool, job.id, &path, CHUNK).await.unwrap();
    assert_eq!(outcome.processed, 1);

    let products = ProductRepo::list(&pool, &ProductListQuery::default()).await.unwrap();
    assert_eq!(products[0].sku, "E1");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_missing_columns_fall_back_to_defaults(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    // No description, price or active columns at all.
    let path = write_csv(&dir, "slim.csv", "sku,name\nF1,Slim\nF2,Slimmer\n");

    let job = ImportJobRepo::create(&pool, "slim.csv").await.unwrap();
    let outcome = ImportRunner::run(&pool, job.id, &path, CHUNK).await.unwrap();
    assert_eq!(outcome.processed, 2);

    for product in ProductRepo::list(&pool, &ProductListQuery::default()).await.unwrap() {
        // Absent description reads like an empty cell, not NULL.
        assert_eq!(product.description.as_deref(), Some(""));
        assert_eq!(product.price, None);
        assert!(product.active);
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_price_variants_parse_or_null(pool: PgPool) {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "prices.csv",
        "sku,name,price\n\
         P1,Thousands,\"1,299.99\"\n\
         P2,Blank,\n\
         P3,Junk,n/a\n\
         P4,Padded,\" 15.50 \"\n",
    );

    let job = ImportJobRepo::create(&pool, "prices.csv").await.unwrap();
    let outcome = ImportRunner::run(&pool, job.id, &path, CHUNK).await.unwrap();
    assert_eq!(outcome.processed, 4);

    let by_sku: HashMap<String, Option<Decimal>> =
        ProductRepo::list(&pool, &ProductListQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| (p.sku, p.price))
            .collect();

    assert_eq!(by_sku["P1"], Some(Decimal::new(129999, 2)));
    assert_eq!(by_sku["P2"], None);
    assert_eq!(by_sku["P3"], None);
    assert_eq!(by_sku["P4"], Some(Decimal::new(1550, 2)));
}
