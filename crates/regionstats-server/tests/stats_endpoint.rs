use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use regionstats_core::{region_stats, sync_records, CountryRecord, StaticFeed, Store};
use regionstats_server::{app, ingest_once, spawn_periodic_sync, AppState};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

fn record(name: &str, alpha2: &str, alpha3: &str, population: i64, region: &str) -> CountryRecord {
    CountryRecord {
        name: name.to_string(),
        alpha2_code: alpha2.to_string(),
        alpha3_code: alpha3.to_string(),
        population,
        region: region.to_string(),
        top_level_domain: Vec::new(),
        capital: None,
    }
}

fn seed() -> Vec<CountryRecord> {
    vec![
        record("Nigeria", "NG", "NGA", 200_000_000, "Africa"),
        record("Egypt", "EG", "EGY", 100_000_000, "Africa"),
        record("Brazil", "BR", "BRA", 210_000_000, "Americas"),
    ]
}

/// Temp dir holding a seeded database.
fn seeded_db() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("regionstats.sqlite3");
    let mut store = Store::open(&db).unwrap();
    sync_records(&mut store, seed()).unwrap();
    (dir, db)
}

async fn get(db: &Path, uri: &str) -> Response {
    app(AppState::new(db))
        .oneshot(
            Request::builder()
                .uri(uri)
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn response_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn region<'a>(body: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    body["regions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == name)
        .unwrap_or_else(|| panic!("region {name} missing from {body}"))
}

#[tokio::test]
async fn stats_returns_counts_and_totals() {
    let (_dir, db) = seeded_db();

    let response = get(&db, "/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["regions"].as_array().unwrap().len(), 2);

    let africa = region(&body, "Africa");
    assert_eq!(africa["number_countries"], 2);
    assert_eq!(africa["total_population"], 300_000_000);

    let americas = region(&body, "Americas");
    assert_eq!(americas["number_countries"], 1);
    assert_eq!(americas["total_population"], 210_000_000);
}

#[tokio::test]
async fn stats_is_empty_without_rows() {
    let (_dir, db) = seeded_db();
    {
        let store = Store::open(&db).unwrap();
        store.connection().execute("DELETE FROM countries", []).unwrap();
        store.connection().execute("DELETE FROM regions", []).unwrap();
    }

    let response = get(&db, "/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, serde_json::json!({"regions": []}));
}

#[tokio::test]
async fn region_without_countries_reports_zero_not_null() {
    let (_dir, db) = seeded_db();
    {
        let mut store = Store::open(&db).unwrap();
        store.insert_regions(&["Antarctica".to_string()]).unwrap();
    }

    let response = get(&db, "/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let ant = region(&body, "Antarctica");
    assert_eq!(ant["number_countries"], 0);
    assert_eq!(ant["total_population"], 0);
}

#[tokio::test]
async fn fresh_database_serves_an_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let response = get(&dir.path().join("new.sqlite3"), "/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, serde_json::json!({"regions": []}));
}

#[tokio::test]
async fn unopenable_database_is_a_json_500() {
    let dir = tempfile::tempdir().unwrap();
    let response = get(&dir.path().join("missing/dir/db.sqlite3"), "/stats").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response_json(response).await;
    assert_eq!(body["error"], "STORAGE_ERROR");
    assert_eq!(body["message"], "Storage unavailable");
    assert!(!body.to_string().contains("missing/dir"));
}

#[tokio::test]
async fn stats_is_served_while_an_ingest_holds_the_write_lock() {
    let (_dir, db) = seeded_db();
    let writer = Store::open(&db).unwrap();
    writer.connection().execute_batch("BEGIN IMMEDIATE").unwrap();
    writer
        .connection()
        .execute("DELETE FROM countries", [])
        .unwrap();

    let started = std::time::Instant::now();
    let response = get(&db, "/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(started.elapsed() < Duration::from_secs(2));

    let body = response_json(response).await;
    assert_eq!(region(&body, "Africa")["number_countries"], 2);

    writer.connection().execute_batch("ROLLBACK").unwrap();
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let response = get(dir.path(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, serde_json::json!({"status": "ok"}));
}

#[test]
fn ingest_once_writes_through_to_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.sqlite3");

    let report = ingest_once(&db, &StaticFeed::new(seed())).unwrap();
    assert_eq!(report.countries_created.len(), 3);

    let store = Store::open(&db).unwrap();
    assert_eq!(region_stats(&store).unwrap().regions.len(), 2);
}

#[tokio::test]
async fn periodic_sync_populates_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.sqlite3");

    let handle = spawn_periodic_sync(
        db.clone(),
        StaticFeed::new(seed()),
        Duration::from_secs(3600),
    );

    let mut populated = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let body = response_json(get(&db, "/stats").await).await;
        if body["regions"].as_array().is_some_and(|r| r.len() == 2) {
            populated = true;
            break;
        }
    }
    handle.abort();

    assert!(populated, "first tick should ingest immediately");
}
