//! Spreadsheet writer and Google Sheets REST worksheet tests
//!
//! The REST tests run `GoogleWorksheet` against a local axum server that
//! records every request.

use agrisync_scraper::error::{SyncError, SyncResult};
use agrisync_scraper::sheets::google::GoogleWorksheet;
use agrisync_scraper::sheets::{SheetConnector, SpreadSheetWriter, Worksheet};
use agrisync_scraper::table::{Cell, SheetValues};
use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Writer over an in-memory worksheet
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct MemorySheet {
    grid: Arc<Mutex<Vec<Vec<String>>>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    fail_reads: bool,
}

#[async_trait]
impl Worksheet for MemorySheet {
    async fn clear(&self) -> SyncResult<()> {
        self.calls.lock().unwrap().push("clear");
        self.grid.lock().unwrap().clear();
        Ok(())
    }

    async fn update(&self, values: Vec<Vec<String>>) -> SyncResult<()> {
        self.calls.lock().unwrap().push("update");
        *self.grid.lock().unwrap() = values;
        Ok(())
    }

    async fn get_all_values(&self) -> SyncResult<Vec<Vec<String>>> {
        if self.fail_reads {
            return Err(SyncError::Write("quota exceeded".into()));
        }
        Ok(self.grid.lock().unwrap().clone())
    }
}

struct MemoryConnector {
    sheet: MemorySheet,
    connects: Arc<AtomicUsize>,
    fail: bool,
}

impl MemoryConnector {
    fn new(sheet: MemorySheet) -> Self {
        Self {
            sheet,
            connects: Arc::default(),
            fail: false,
        }
    }
}

#[async_trait]
impl SheetConnector for MemoryConnector {
    type Sheet = MemorySheet;

    async fn connect(&self) -> SyncResult<MemorySheet> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SyncError::Write("invalid service account JSON".into()));
        }
        Ok(self.sheet.clone())
    }
}

fn values() -> SheetValues {
    SheetValues {
        header: vec!["作業ID".into(), "作業時間".into()],
        rows: vec![
            vec!["001".into(), "1.5".into()],
            vec!["002".into(), "".into()],
        ],
    }
}

#[tokio::test]
async fn test_write_all_clears_then_updates_with_header_first() {
    let sheet = MemorySheet::default();
    let writer = SpreadSheetWriter::new(MemoryConnector::new(sheet.clone()));

    writer.write_all(&values()).await.unwrap();

    assert_eq!(*sheet.calls.lock().unwrap(), vec!["clear", "update"]);
    assert_eq!(
        *sheet.grid.lock().unwrap(),
        vec![
            vec!["作業ID", "作業時間"],
            vec!["001", "1.5"],
            vec!["002", ""],
        ]
    );
}

#[tokio::test]
async fn test_connection_is_cached() {
    let connector = MemoryConnector::new(MemorySheet::default());
    let connects = connector.connects.clone();
    let writer = SpreadSheetWriter::new(connector);

    writer.write_all(&values()).await.unwrap();
    writer.write_all(&values()).await.unwrap();
    writer.read_all().await;

    assert_eq!(connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connect_failure_is_write_error() {
    let mut connector = MemoryConnector::new(MemorySheet::default());
    connector.fail = true;
    let writer = SpreadSheetWriter::new(connector);

    let err = writer.write_all(&values()).await.unwrap_err();
    assert!(matches!(err, SyncError::Write(_)));
    assert!(err.to_string().contains("GoogleSpreadsheetへの接続に失敗しました"));
}

#[tokio::test]
async fn test_read_all_round_trips_text() {
    let writer = SpreadSheetWriter::new(MemoryConnector::new(MemorySheet::default()));
    writer.write_all(&values()).await.unwrap();

    let table = writer.read_all().await;
    assert_eq!(table.columns, vec!["作業ID", "作業時間"]);
    assert_eq!(table.rows[1], vec![Cell::text("002"), Cell::text("")]);
}

#[tokio::test]
async fn test_read_all_empty_sheet() {
    let writer = SpreadSheetWriter::new(MemoryConnector::new(MemorySheet::default()));
    let table = writer.read_all().await;
    assert!(table.columns.is_empty());
    assert!(table.is_empty());
}

#[tokio::test]
async fn test_read_all_swallows_failures() {
    let mut connector = MemoryConnector::new(MemorySheet::default());
    connector.fail = true;
    assert!(SpreadSheetWriter::new(connector).read_all().await.is_empty());

    let sheet = MemorySheet {
        fail_reads: true,
        ..MemorySheet::default()
    };
    assert!(SpreadSheetWriter::new(MemoryConnector::new(sheet))
        .read_all()
        .await
        .is_empty());
}

// ---------------------------------------------------------------------------
// GoogleWorksheet against a fake Sheets API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Captured {
    method: Method,
    path_and_query: String,
    authorization: Option<String>,
    body: String,
}

#[derive(Clone, Default)]
struct FakeSheets {
    requests: Arc<Mutex<Vec<Captured>>>,
    reject: bool,
}

async fn capture(
    State(fake): State<FakeSheets>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let is_get = method == Method::GET;
    fake.requests.lock().unwrap().push(Captured {
        method,
        path_and_query: uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    if fake.reject {
        return (StatusCode::FORBIDDEN, "caller does not have permission").into_response();
    }
    if is_get {
        Json(json!({
            "range": "'records'!A1:B2",
            "majorDimension": "ROWS",
            "values": [["作業ID", "作業時間"], ["001"]]
        }))
        .into_response()
    } else {
        Json(json!({})).into_response()
    }
}

async fn spawn_fake(fake: FakeSheets) -> String {
    let app = Router::new().fallback(capture).with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v4/spreadsheets", addr)
}

fn worksheet(base_url: &str) -> GoogleWorksheet {
    GoogleWorksheet::new(
        reqwest::Client::new(),
        base_url,
        "sheet-1",
        "records",
        "ya29.token".to_string(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_clear_posts_to_clear_endpoint() {
    let fake = FakeSheets::default();
    let base = spawn_fake(fake.clone()).await;

    worksheet(&base).clear().await.unwrap();

    let requests = fake.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(
        requests[0].path_and_query,
        "/v4/spreadsheets/sheet-1/values/'records':clear"
    );
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer ya29.token"));
}

#[tokio::test]
async fn test_update_writes_raw_grid_from_a1() {
    let fake = FakeSheets::default();
    let base = spawn_fake(fake.clone()).await;

    worksheet(&base)
        .update(vec![
            vec!["作業ID".into(), "作業時間".into()],
            vec!["001".into(), "1.5".into()],
        ])
        .await
        .unwrap();

    let requests = fake.requests.lock().unwrap();
    assert_eq!(requests[0].method, Method::PUT);
    assert_eq!(
        requests[0].path_and_query,
        "/v4/spreadsheets/sheet-1/values/'records'!A1?valueInputOption=RAW"
    );
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["majorDimension"], "ROWS");
    assert_eq!(body["values"][1], json!(["001", "1.5"]));
}

#[tokio::test]
async fn test_get_all_values_returns_ragged_rows() {
    let fake = FakeSheets::default();
    let base = spawn_fake(fake.clone()).await;

    let rows = worksheet(&base).get_all_values().await.unwrap();
    assert_eq!(rows, vec![vec!["作業ID", "作業時間"], vec!["001"]]);
}

#[tokio::test]
async fn test_error_status_is_write_error() {
    let fake = FakeSheets {
        reject: true,
        ..FakeSheets::default()
    };
    let base = spawn_fake(fake).await;

    let err = worksheet(&base).clear().await.unwrap_err();
    match err {
        SyncError::Write(message) => {
            assert!(message.contains("403"));
            assert!(message.contains("caller does not have permission"));
        }
        other => panic!("expected write error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_repeated_reads_are_equal() {
    let writer = SpreadSheetWriter::new(MemoryConnector::new(MemorySheet::default()));
    writer.write_all(&values()).await.unwrap();

    let first = writer.read_all().await;
    let second = writer.read_all().await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}
