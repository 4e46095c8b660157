//! In-process fake of the admin REST backend and its object storage.
//!
//! Each test gets its own server on an ephemeral port. Handlers record
//! every request in [`FakeState::calls`] and answer from scripted state.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adminboard_client::config::ClientConfig;
use adminboard_client::http::ApiClient;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

pub type Shared = Arc<Mutex<FakeState>>;

/// Object written through a presigned URL.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub base_url: String,
    /// `"METHOD /path"` for every request, in arrival order.
    pub calls: Vec<String>,
    pub authorization: Vec<Option<String>>,
    pub presign_status: Option<u16>,
    pub storage_status: Option<u16>,
    /// Statuses for successive `process-csv-from-s3` calls; 200 once empty.
    pub process_statuses: VecDeque<u16>,
    /// Delays before answering successive `process-csv-from-s3` calls.
    pub process_delays: VecDeque<Duration>,
    pub storage_delay: Option<Duration>,
    pub validation: Value,
    pub preview: Value,
    pub confirm_status: Option<u16>,
    pub confirm_bodies: Vec<Value>,
    pub objects: HashMap<String, StoredObject>,
    pub branches: BTreeMap<i64, Value>,
    pub next_branch_id: i64,
    pub permissions: Vec<Value>,
    pub batch_bodies: Vec<Value>,
}

impl FakeState {
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }
}

pub struct FakeBackend {
    pub base_url: String,
    pub state: Shared,
}

impl FakeBackend {
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.base_url.clone(),
            storage_public_base_url: format!("{}/storage", self.base_url),
            api_token: Some("test-token".into()),
            ..Default::default()
        }
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("client should build")
    }

    pub fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        f(&mut self.state.lock().expect("state lock"))
    }
}

/// Start a fake backend with a valid 3-row staged import and two branches.
pub async fn spawn_backend() -> FakeBackend {
    adminboard_client::telemetry::init_tracing();
    let state: Shared = Arc::new(Mutex::new(FakeState {
        validation: json!({ "isValid": true, "totalRows": 3, "errors": [] }),
        preview: json!({
            "totalRows": 3,
            "preview": [
                { "codigo": "A1", "precio": 10.5 },
                { "codigo": "A2", "precio": 11.0 },
                { "codigo": "A3", "precio": 12.25 }
            ]
        }),
        next_branch_id: 3,
        branches: BTreeMap::from([
            (1, json!({ "id": 1, "status": 1, "nombre": "Centro", "ciudad": "Lima" })),
            (2, json!({ "id": 2, "status": 0, "nombre": "Norte", "ciudad": "Trujillo" })),
        ]),
        ..Default::default()
    }));

    let app = router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
    state.lock().expect("state lock").base_url = base_url.clone();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend");
    });

    FakeBackend { base_url, state }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/tarifarios/presigned-url", post(presign))
        .route("/api/tarifarios/process-csv-from-s3", post(process))
        .route("/api/tarifarios/validate-temp", post(validate_temp))
        .route("/api/tarifarios/preview-temp", get(preview_temp))
        .route("/api/tarifarios/confirm-replace", post(confirm_replace))
        .route("/api/tarifarios/cancel-upload", post(cancel_upload))
        .route("/storage/{*key}", put(store_object))
        .route("/api/sucursales", get(list_branches).post(create_branch))
        .route(
            "/api/sucursales/{id}",
            get(get_branch).put(update_branch).delete(delete_branch),
        )
        .route(
            "/api/permisosSucursal",
            get(list_permissions)
                .post(add_permission)
                .delete(remove_permission),
        )
        .route("/api/permisosSucursal/batch-replace", post(batch_replace))
        .with_state(state)
}

fn record<'a>(state: &'a Shared, call: &str, headers: &HeaderMap) -> std::sync::MutexGuard<'a, FakeState> {
    let mut guard = state.lock().expect("state lock");
    guard.calls.push(call.to_string());
    guard.authorization.push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    guard
}

fn failure(status: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "message": message }))).into_response()
}

// ---------------------------------------------------------------------------
// Import endpoints
// ---------------------------------------------------------------------------

async fn presign(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let s = record(&state, "POST /api/tarifarios/presigned-url", &headers);
    if let Some(status) = s.presign_status {
        return failure(status, "Credenciales no disponibles");
    }
    let attempt = s.count("POST /api/tarifarios/presigned-url");
    let filename = body["filename"].as_str().unwrap_or("upload.csv");
    let key = format!("tarifarios/{attempt}-{filename}");
    Json(json!({ "url": format!("{}/storage/{key}", s.base_url), "key": key })).into_response()
}

async fn store_object(
    State(state): State<Shared>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delay = {
        let s = record(&state, &format!("PUT /storage/{key}"), &headers);
        if let Some(status) = s.storage_status {
            return failure(status, "AccessDenied");
        }
        s.storage_delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.lock().expect("state lock").objects.insert(
        key,
        StoredObject {
            content_type,
            body: body.to_vec(),
        },
    );
    StatusCode::OK.into_response()
}

async fn process(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let (status, delay) = {
        let mut s = record(&state, "POST /api/tarifarios/process-csv-from-s3", &headers);
        if body["s3Key"].as_str().is_none() {
            return failure(400, "s3Key requerido");
        }
        let status = s.process_statuses.pop_front().unwrap_or(200);
        (status, s.process_delays.pop_front())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    match status {
        200 => Json(json!({ "message": "Procesado" })).into_response(),
        503 => failure(503, "Service Unavailable"),
        status => failure(status, "Formato de archivo inválido"),
    }
}

async fn validate_temp(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let s = record(&state, "POST /api/tarifarios/validate-temp", &headers);
    Json(s.validation.clone()).into_response()
}

async fn preview_temp(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let s = record(&state, "GET /api/tarifarios/preview-temp", &headers);
    Json(s.preview.clone()).into_response()
}

async fn confirm_replace(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = record(&state, "POST /api/tarifarios/confirm-replace", &headers);
    s.confirm_bodies.push(body);
    if let Some(status) = s.confirm_status {
        return failure(status, "No hay datos en la tabla temporal");
    }
    Json(json!({ "message": "Datos reemplazados", "totalRows": 3 })).into_response()
}

async fn cancel_upload(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "POST /api/tarifarios/cancel-upload", &headers);
    Json(json!({ "message": "Cancelado" })).into_response()
}

// ---------------------------------------------------------------------------
// Branch CRUD
// ---------------------------------------------------------------------------

async fn list_branches(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let s = record(&state, "GET /api/sucursales", &headers);
    let rows: Vec<Value> = s.branches.values().cloned().collect();
    Json(json!({ "data": rows })).into_response()
}

async fn create_branch(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    let mut s = record(&state, "POST /api/sucursales", &headers);
    let id = s.next_branch_id;
    s.next_branch_id += 1;
    body["id"] = json!(id);
    s.branches.insert(id, body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn get_branch(State(state): State<Shared>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    let s = record(&state, &format!("GET /api/sucursales/{id}"), &headers);
    match s.branches.get(&id) {
        Some(row) => Json(row.clone()).into_response(),
        None => failure(404, "Sucursal no encontrada"),
    }
}

async fn update_branch(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = record(&state, &format!("PUT /api/sucursales/{id}"), &headers);
    if !s.branches.contains_key(&id) {
        return failure(404, "Sucursal no encontrada");
    }
    s.branches.insert(id, body);
    Json(json!({ "message": "Actualizado" })).into_response()
}

async fn delete_branch(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut s = record(&state, &format!("DELETE /api/sucursales/{id}"), &headers);
    match s.branches.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => failure(404, "Sucursal no encontrada"),
    }
}

// ---------------------------------------------------------------------------
// Branch permissions
// ---------------------------------------------------------------------------

fn same_item(row: &Value, query: &HashMap<String, String>) -> bool {
    let name = query.get("objetoName").map(String::as_str);
    let id = query.get("idObjeto").and_then(|v| v.parse::<i64>().ok());
    row["objetoName"].as_str() == name && row["idObjeto"].as_i64() == id
}

async fn list_permissions(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let s = record(&state, "GET /api/permisosSucursal", &headers);
    let rows: Vec<Value> = s
        .permissions
        .iter()
        .filter(|row| same_item(row, &query))
        .cloned()
        .collect();
    Json(rows).into_response()
}

async fn add_permission(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = record(&state, "POST /api/permisosSucursal", &headers);
    s.permissions.push(body);
    StatusCode::CREATED.into_response()
}

async fn remove_permission(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut s = record(&state, "DELETE /api/permisosSucursal", &headers);
    let branch = query.get("idSucursal").and_then(|v| v.parse::<i64>().ok());
    s.permissions
        .retain(|row| !(same_item(row, &query) && row["idSucursal"].as_i64() == branch));
    StatusCode::NO_CONTENT.into_response()
}

async fn batch_replace(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = record(&state, "POST /api/permisosSucursal/batch-replace", &headers);
    s.batch_bodies.push(body);
    Json(json!({ "message": "Permisos actualizados" })).into_response()
}
