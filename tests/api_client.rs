// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! ApiClient, DocumentStore and AnalysisSimulator against an in-process portal

use axum::{
    extract::{Form, Multipart, Path, Query, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use keyveve::api::ApiClient;
use keyveve::classifier::Classifier;
use keyveve::config::ApiConfig;
use keyveve::models::{
    DocCategory, DocumentStatus, NewProject, ProjectFilter, RenameAction, ScheduleRequest,
    StorageLocation, UploadRequest,
};
use keyveve::simulator::{AnalysisSimulator, AnalysisStage};
use keyveve::store::DocumentStore;
use keyveve::KeyveveError;

type Calls = Arc<Mutex<Vec<String>>>;

fn record(calls: &Calls, call: String) {
    calls.lock().unwrap().push(call);
}

async fn get_project(Path(id): Path<String>) -> impl IntoResponse {
    if id == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "id": id.parse::<u64>().unwrap_or(0),
        "name": "2024 Individual Return",
        "client_name": "Jane Doe",
        "service_type": "Tax Return - Individual",
        "status": "in_progress",
        "assigned_staff": [{"id": 3, "name": "Sam Lee", "role": "Preparer"}]
    }))
    .into_response()
}

async fn list_projects(State(calls): State<Calls>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let mut keys: Vec<_> = q.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    keys.sort();
    record(&calls, format!("projects {}", keys.join("&")));
    Json(json!([{"id": 1, "client_name": "Jane Doe", "service_type": "Audit"}]))
}

async fn update_project_status(
    State(calls): State<Calls>,
    Path(id): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> StatusCode {
    record(&calls, format!("project-status {} {}", id, q.get("new_status").cloned().unwrap_or_default()));
    StatusCode::OK
}

async fn list_documents(Path(id): Path<String>) -> impl IntoResponse {
    if id == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "documents": [
            {"id": 1, "original_name": "acme_w2.pdf", "doc_type": "W-2",
             "ai_suggested_name": "2024_W2_Acme.pdf"},
            {"id": 2, "original_name": "mortgage.pdf", "doc_type": "1098 Mortgage Interest",
             "status": "reviewed", "storage_location": "sharepoint"},
            {"id": 3, "original_name": "photo_id.jpg"}
        ]
    }))
    .into_response()
}

async fn update_document(
    State(calls): State<Calls>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    record(&calls, format!("status {} {}", id, body["status"].as_str().unwrap_or("")));
    StatusCode::OK
}

async fn organize(State(calls): State<Calls>, Path(id): Path<String>) -> impl IntoResponse {
    record(&calls, format!("organize {}", id));
    if id == "broken" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({"organized": true})).into_response()
}

async fn rename(
    State(calls): State<Calls>,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> StatusCode {
    record(&calls, format!(
        "rename {} {} {}",
        id,
        form.get("action").cloned().unwrap_or_default(),
        form.get("new_name").cloned().unwrap_or_default()
    ));
    StatusCode::OK
}

async fn notifications(State(calls): State<Calls>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    record(&calls, format!(
        "notifications unread_only={} limit={}",
        q.get("unread_only").cloned().unwrap_or_default(),
        q.get("limit").cloned().unwrap_or_default()
    ));
    Json(json!([
        {"id": 10, "message": "Client uploaded 3 documents", "read": false,
         "created_at": "2024-03-01T12:00:00Z"}
    ]))
}

async fn staff() -> Json<Value> {
    Json(json!([{"id": "s1", "name": "Sam Lee", "email": "sam@example.com"}]))
}

async fn qa(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"answer": format!("You asked: {}", body["question"].as_str().unwrap_or(""))}))
}

async fn create_project(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
    record(&calls, format!("create {}", body));
    Json(json!({
        "id": 99,
        "name": body["name"].clone(),
        "client_name": body["client_name"].clone(),
        "service_type": body["service_type"].clone(),
        "status": "not_started"
    }))
}

async fn assign_staff(State(calls): State<Calls>, Path(id): Path<String>, Json(body): Json<Value>) -> StatusCode {
    record(&calls, format!("assign {} {}", id, body));
    StatusCode::OK
}

/// `name=value` per field; file parts as `name=file_name:contents`
async fn multipart_fields(mut multipart: Multipart) -> Vec<String> {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(String::from);
        let value = field.text().await.unwrap();
        fields.push(match file_name {
            Some(file_name) => format!("{}={}:{}", name, file_name, value),
            None => format!("{}={}", name, value),
        });
    }
    fields
}

async fn upload(State(calls): State<Calls>, multipart: Multipart) -> Json<Value> {
    let fields = multipart_fields(multipart).await;
    record(&calls, format!("upload {}", fields.join(" ")));
    Json(json!({"id": 11, "status": "uploaded"}))
}

async fn import_csv(State(calls): State<Calls>, multipart: Multipart) -> Json<Value> {
    let fields = multipart_fields(multipart).await;
    record(&calls, format!("import-csv {}", fields.join(" ")));
    Json(json!({"imported": 2}))
}

/// JSON endpoints that only need their path and body checked
async fn echo(State(calls): State<Calls>, uri: Uri, Json(body): Json<Value>) -> Json<Value> {
    record(&calls, format!("{} {}", uri.path(), body));
    Json(json!({"ok": true, "path": uri.path()}))
}

async fn mark_read(State(calls): State<Calls>, Path(id): Path<String>) -> StatusCode {
    record(&calls, format!("read {}", id));
    StatusCode::NO_CONTENT
}

async fn spawn_portal() -> (String, Calls) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));

    let router = Router::new()
        .route("/projects/", get(list_projects).post(create_project))
        .route("/projects/:id", get(get_project))
        .route("/projects/:id/status", patch(update_project_status))
        .route("/projects/:id/assign-staff", post(assign_staff))
        .route("/staff/", get(staff))
        .route("/documents/upload", post(upload))
        .route("/documents/:id", get(list_documents).patch(update_document))
        .route("/documents/organize/:id", post(organize))
        .route("/documents/rename/:id", patch(rename))
        .route("/notifications/", get(notifications))
        .route("/notifications/:id/read", patch(mark_read))
        .route("/qa", post(qa))
        .route("/pricing/", post(echo))
        .route("/integrations/engagement-letter", post(echo))
        .route("/integrations/import-csv", post(import_csv))
        .route("/integrations/import-pms", post(echo))
        .route("/integrations/connect", post(echo))
        .route("/tasks/:id/schedule", post(echo))
        .with_state(calls.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}/", addr), calls)
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn fast_offsets() -> Vec<Duration> {
    (1..=5).map(Duration::from_millis).collect()
}

#[tokio::test]
async fn test_project_and_staff_endpoints() {
    let (url, calls) = spawn_portal().await;
    let api = client(&url);

    let project = api.get_project("42").await.unwrap();
    assert_eq!(project.id, "42");
    assert_eq!(project.service_type, "Tax Return - Individual");
    assert_eq!(project.assigned_staff[0].id, "3");

    let filter = ProjectFilter {
        limit: Some(5),
        service_type: Some("Audit".to_string()),
        ..Default::default()
    };
    let projects = api.list_projects(&filter).await.unwrap();
    assert_eq!(projects.len(), 1);

    api.update_project_status("42", "completed").await.unwrap();

    let staff = api.list_staff().await.unwrap();
    assert_eq!(staff[0].name, "Sam Lee");

    let calls = calls.lock().unwrap().clone();
    assert_eq!(calls, vec![
        "projects limit=5&service_type=Audit".to_string(),
        "project-status 42 completed".to_string(),
    ]);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let (url, _) = spawn_portal().await;
    let api = client(&url);

    match api.get_project("missing").await {
        Err(KeyveveError::ApiStatus { status, url }) => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/projects/missing"));
        }
        other => panic!("expected ApiStatus, got {:?}", other.map(|p| p.id)),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_api_error() {
    let api = client("http://127.0.0.1:9");
    assert!(matches!(api.list_staff().await, Err(KeyveveError::Api(_))));
}

#[tokio::test]
async fn test_documents_and_notifications() {
    let (url, calls) = spawn_portal().await;
    let api = client(&url);

    let docs = api.list_documents("7").await.unwrap();
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[1].status, DocumentStatus::Reviewed);

    let notes = api.list_notifications(true, 5).await.unwrap();
    assert_eq!(notes[0].id, "10");
    assert!(!notes[0].read);
    assert!(notes[0].created_at.is_some());

    let answer = api.ask(&keyveve::models::QaRequest {
        question: "When is the deadline?".to_string(),
        project_id: None,
    }).await.unwrap();
    assert_eq!(answer.answer, "You asked: When is the deadline?");

    assert!(calls.lock().unwrap().contains(&"notifications unread_only=true limit=5".to_string()));
}

#[tokio::test]
async fn test_store_mutations_go_through_api() {
    let (url, calls) = spawn_portal().await;
    let api = client(&url);
    let store = DocumentStore::new(Classifier::default());

    store.replace_all(api.list_documents("7").await.unwrap());
    store.set_status(&api, "2", DocumentStatus::Filed).await.unwrap();
    store.resolve_rename(&api, "1", RenameAction::Accept).await.unwrap();

    assert_eq!(store.get("2").unwrap().status, DocumentStatus::Filed);
    assert_eq!(store.get("1").unwrap().final_name.as_deref(), Some("2024_W2_Acme.pdf"));

    let calls = calls.lock().unwrap().clone();
    assert_eq!(calls, vec![
        "status 2 filed".to_string(),
        "rename 1 accept 2024_W2_Acme.pdf".to_string(),
    ]);
}

#[tokio::test]
async fn test_analysis_end_to_end() {
    let (url, calls) = spawn_portal().await;
    let api = Arc::new(client(&url));
    let store = Arc::new(DocumentStore::default());

    let simulator = AnalysisSimulator::new(
        api.clone(),
        store.clone(),
        "Tax Return - Individual",
        fast_offsets(),
    ).unwrap();

    let outcome = simulator.run("7").await.unwrap();
    assert_eq!(simulator.stage(), AnalysisStage::Complete);
    assert_eq!(outcome.document_count(), 3);

    let folder_of = |id: &str| {
        outcome.groups.iter()
            .find(|g| g.documents.iter().any(|d| d.id == id))
            .map(|g| g.folder.name)
    };
    assert_eq!(folder_of("1"), Some("Income Documents"));
    assert_eq!(folder_of("2"), Some("Expense Documents"));
    assert_eq!(folder_of("3"), Some("Client Information"));

    assert_eq!(store.len(), 3);
    assert_eq!(calls.lock().unwrap().as_slice(), ["organize 7"]);
}

#[tokio::test]
async fn test_analysis_failure_keeps_prior_documents() {
    let (url, _) = spawn_portal().await;
    let api = Arc::new(client(&url));
    let store = Arc::new(DocumentStore::default());
    store.replace_all(api.list_documents("7").await.unwrap());

    let simulator = AnalysisSimulator::new(api.clone(), store.clone(), "Audit", fast_offsets()).unwrap();
    let result = simulator.run("broken").await;

    assert!(matches!(result, Err(KeyveveError::ApiStatus { status: 500, .. })));
    assert_eq!(simulator.stage(), AnalysisStage::Idle);
    assert_eq!(store.len(), 3);
    assert!(store.get("1").unwrap().final_name.is_none());
}

#[tokio::test]
async fn test_project_creation_and_staffing() {
    let (url, calls) = spawn_portal().await;
    let api = client(&url);

    let project = api.create_project(&NewProject {
        name: "2024 Audit".to_string(),
        client_name: "Acme Corp".to_string(),
        service_type: "Audit".to_string(),
        due_date: None,
    }).await.unwrap();
    assert_eq!(project.id, "99");
    assert_eq!(project.client_name, "Acme Corp");

    api.assign_staff("99", &["3".to_string(), "s1".to_string()]).await.unwrap();
    api.mark_notification_read("10").await.unwrap();

    let calls = calls.lock().unwrap().clone();
    assert_eq!(calls, vec![
        r#"create {"client_name":"Acme Corp","name":"2024 Audit","service_type":"Audit"}"#.to_string(),
        r#"assign 99 {"staff_ids":["3","s1"]}"#.to_string(),
        "read 10".to_string(),
    ]);
}

#[tokio::test]
async fn test_upload_sends_every_form_field() {
    let (url, calls) = spawn_portal().await;
    let api = client(&url);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("acme_w2.pdf");
    std::fs::write(&path, "w2 contents").unwrap();

    let response = api.upload_document(&UploadRequest {
        project_id: "7".to_string(),
        path,
        process_async: true,
        storage_location: StorageLocation::Sharepoint,
        doc_category: DocCategory::Permanent,
    }).await.unwrap();
    assert_eq!(response["status"], "uploaded");

    let csv = dir.path().join("clients.csv");
    std::fs::write(&csv, "name,email").unwrap();
    let imported = api.import_csv(&csv).await.unwrap();
    assert_eq!(imported["imported"], 2);

    let calls = calls.lock().unwrap().clone();
    assert_eq!(calls, vec![
        "upload project_id=7 file=acme_w2.pdf:w2 contents process_async=true \
         storage_location=sharepoint doc_category=permanent".to_string(),
        "import-csv file=clients.csv:name,email".to_string(),
    ]);
}

#[tokio::test]
async fn test_upload_of_missing_file_sends_nothing() {
    let (url, calls) = spawn_portal().await;
    let api = client(&url);

    let result = api.upload_document(&UploadRequest {
        project_id: "7".to_string(),
        path: "/nonexistent/keyveve/upload.pdf".into(),
        process_async: false,
        storage_location: StorageLocation::Keyveve,
        doc_category: DocCategory::Client,
    }).await;

    assert!(matches!(result, Err(KeyveveError::FileSystem(_))));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_pricing_integrations_and_scheduling() {
    let (url, calls) = spawn_portal().await;
    let api = client(&url);

    let quote = api.pricing(&json!({"service_type": "Audit", "complexity": "high"})).await.unwrap();
    assert_eq!(quote["path"], "/pricing/");
    api.engagement_letter(&json!({"project_id": 7})).await.unwrap();
    api.import_pms(&json!({"source": "karbon"})).await.unwrap();
    api.connect_integration(&json!({"provider": "sharepoint"})).await.unwrap();
    api.schedule_task("t5", &ScheduleRequest {
        scheduled_date: "2024-04-01".to_string(),
        duration_minutes: Some(90),
    }).await.unwrap();

    let calls = calls.lock().unwrap().clone();
    assert_eq!(calls, vec![
        r#"/pricing/ {"complexity":"high","service_type":"Audit"}"#.to_string(),
        r#"/integrations/engagement-letter {"project_id":7}"#.to_string(),
        r#"/integrations/import-pms {"source":"karbon"}"#.to_string(),
        r#"/integrations/connect {"provider":"sharepoint"}"#.to_string(),
        r#"/tasks/t5/schedule {"duration_minutes":90,"scheduled_date":"2024-04-01"}"#.to_string(),
    ]);
}
