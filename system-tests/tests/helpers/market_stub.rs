// system-tests/tests/helpers/market_stub.rs
// ============================================================================
// Module: Market API Stub
// Description: In-memory stand-in for the remote market API.
// Purpose: Run the full contract suite on loopback with injectable faults.
// Dependencies: axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! Serves `/mercado` and its product sub-resources from an in-memory store,
//! answering with the same status codes and messages as the real API.
//! Faults can make creation fail, drop the created id, slow down fetches, or
//! break deletion. Every request is logged, and the peak number of requests
//! in flight is tracked so suites can prove the runner is sequential.

use std::collections::BTreeMap;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use tokio::time::sleep;

/// Fault switches for the stub.
#[derive(Debug, Clone, Default)]
pub struct StubFaults {
    /// `POST /mercado` answers 500.
    pub fail_create: bool,
    /// `POST /mercado` answers 201 without `novoMercado.id`.
    pub omit_created_id: bool,
    /// `GET /mercado/{id}` of an existing market waits this long before answering.
    pub slow_fetch: Option<Duration>,
    /// `DELETE /mercado/{id}` of an existing market answers 500.
    pub fail_delete: bool,
}

/// Request as seen by the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubRequest {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
}

#[derive(Debug, Clone)]
struct StoredMarket {
    id: u64,
    nome: String,
    cnpj: String,
    endereco: String,
    produtos: BTreeMap<String, Vec<Value>>,
}

impl StoredMarket {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "nome": self.nome,
            "cnpj": self.cnpj,
            "endereco": self.endereco,
            "produtos": self.produtos,
        })
    }
}

#[derive(Default)]
struct Store {
    next_id: u64,
    markets: BTreeMap<u64, StoredMarket>,
}

#[derive(Clone)]
struct StubState {
    faults: StubFaults,
    store: Arc<Mutex<Store>>,
    requests: Arc<Mutex<Vec<StubRequest>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

/// Handle for a running stub; dropping it stops the server.
pub struct MarketStubHandle {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
    state: StubState,
}

impl MarketStubHandle {
    /// Collection URL, e.g. `http://127.0.0.1:PORT/mercado`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<StubRequest> {
        self.state.requests.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Highest number of requests that were being handled at once.
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of markets currently stored.
    pub fn market_count(&self) -> usize {
        self.state.store.lock().map_or(0, |store| store.markets.len())
    }

    /// Products stored for a market under `section/category`.
    pub fn products(&self, id: u64, category: &str) -> Vec<Value> {
        self.state
            .store
            .lock()
            .ok()
            .and_then(|store| store.markets.get(&id).and_then(|m| m.produtos.get(category).cloned()))
            .unwrap_or_default()
    }
}

impl Drop for MarketStubHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns a well-behaved stub.
pub fn spawn_market_stub() -> Result<MarketStubHandle, String> {
    spawn_market_stub_with(StubFaults::default())
}

/// Spawns a stub with the given faults on its own thread and runtime.
pub fn spawn_market_stub_with(faults: StubFaults) -> Result<MarketStubHandle, String> {
    let listener = StdTcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("market stub bind failed: {err}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("market stub listener nonblocking failed: {err}"))?;
    let addr = listener.local_addr().map_err(|err| format!("market stub local addr failed: {err}"))?;
    let base_url = format!("http://{addr}/mercado");

    let state = StubState {
        faults,
        store: Arc::new(Mutex::new(Store::default())),
        requests: Arc::new(Mutex::new(Vec::new())),
        in_flight: Arc::new(AtomicUsize::new(0)),
        max_in_flight: Arc::new(AtomicUsize::new(0)),
    };
    let app = Router::new()
        .route("/mercado", get(list_markets).post(create_market))
        .route("/mercado/{id}", get(get_market).put(update_market).delete(delete_market))
        .route("/mercado/{id}/produtos", post(add_product))
        .route(
            "/mercado/{id}/produtos/{section}/{category}",
            get(list_category).post(add_category_product),
        )
        .layer(middleware::from_fn_with_state(state.clone(), track_request))
        .with_state(state.clone());

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        let Ok(runtime) = Builder::new_current_thread().enable_all().build() else {
            return;
        };
        runtime.block_on(async move {
            let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
                return;
            };
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });
    Ok(MarketStubHandle {
        base_url,
        shutdown: Some(shutdown_tx),
        join: Some(join),
        state,
    })
}

// ============================================================================
// SECTION: Middleware
// ============================================================================

async fn track_request(State(state): State<StubState>, request: Request, next: Next) -> Response {
    if let Ok(mut requests) = state.requests.lock() {
        requests.push(StubRequest {
            method: request.method().as_str().to_string(),
            path: request.uri().path().to_string(),
        });
    }
    let current = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(current, Ordering::SeqCst);
    let response = next.run(request).await;
    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

const MSG_CNPJ_LENGTH: &str = "CNPJ deve ter 14 dígitos";
const MSG_INVALID_INPUT: &str = "Dados de entrada inválidos";
const MSG_INVALID_VALUE: &str = "Valor deve ser um número inteiro e não negativo";

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn message(status: StatusCode, text: &str) -> Response {
    reply(status, json!({ "message": text }))
}

fn not_found(id: &str) -> Response {
    message(StatusCode::NOT_FOUND, &format!("Mercado com ID {id} não encontrado."))
}

/// Market fields from a request body, or the error message to answer with.
fn market_fields(body: &Bytes) -> Result<(String, String, String), &'static str> {
    let value: Value = serde_json::from_slice(body).map_err(|_| MSG_INVALID_INPUT)?;
    let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
    let (Some(nome), Some(cnpj), Some(endereco)) = (field("nome"), field("cnpj"), field("endereco"))
    else {
        return Err(MSG_INVALID_INPUT);
    };
    if cnpj.len() != 14 || !cnpj.chars().all(|c| c.is_ascii_digit()) {
        return Err(MSG_CNPJ_LENGTH);
    }
    Ok((nome, cnpj, endereco))
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.parse().ok()
}

async fn list_markets(State(state): State<StubState>) -> Response {
    let Ok(store) = state.store.lock() else {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "store poisoned");
    };
    let data: Vec<Value> = store.markets.values().map(StoredMarket::to_json).collect();
    reply(StatusCode::OK, json!({ "data": data }))
}

async fn create_market(State(state): State<StubState>, body: Bytes) -> Response {
    if state.faults.fail_create {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "falha interna");
    }
    let (nome, cnpj, endereco) = match market_fields(&body) {
        Ok(fields) => fields,
        Err(text) => return message(StatusCode::BAD_REQUEST, text),
    };
    let Ok(mut store) = state.store.lock() else {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "store poisoned");
    };
    if store.markets.values().any(|market| market.nome == nome) {
        return message(
            StatusCode::BAD_REQUEST,
            &format!("O nome {nome} já existe na lista de Mercados."),
        );
    }
    store.next_id += 1;
    let market = StoredMarket {
        id: store.next_id,
        nome,
        cnpj,
        endereco,
        produtos: BTreeMap::new(),
    };
    let mut created = market.to_json();
    if state.faults.omit_created_id
        && let Some(fields) = created.as_object_mut()
    {
        fields.remove("id");
    }
    let text = format!("Mercado '{}' adicionado com sucesso!", market.nome);
    store.markets.insert(market.id, market);
    reply(StatusCode::CREATED, json!({ "message": text, "novoMercado": created }))
}

async fn get_market(State(state): State<StubState>, Path(id): Path<String>) -> Response {
    let known = parse_id(&id)
        .is_some_and(|key| state.store.lock().is_ok_and(|store| store.markets.contains_key(&key)));
    if let Some(delay) = state.faults.slow_fetch.filter(|_| known) {
        sleep(delay).await;
    }
    let Ok(store) = state.store.lock() else {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "store poisoned");
    };
    match parse_id(&id).and_then(|key| store.markets.get(&key)) {
        Some(market) => reply(StatusCode::OK, json!({ "data": market.to_json() })),
        None => not_found(&id),
    }
}

async fn update_market(
    State(state): State<StubState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let Ok(mut store) = state.store.lock() else {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "store poisoned");
    };
    let Some(market) = parse_id(&id).and_then(|key| store.markets.get_mut(&key)) else {
        return not_found(&id);
    };
    let Ok((nome, cnpj, endereco)) = market_fields(&body) else {
        return message(StatusCode::BAD_REQUEST, MSG_INVALID_INPUT);
    };
    market.nome = nome;
    market.cnpj = cnpj;
    market.endereco = endereco;
    reply(
        StatusCode::OK,
        json!({ "message": "Mercado atualizado com sucesso", "data": market.to_json() }),
    )
}

async fn delete_market(State(state): State<StubState>, Path(id): Path<String>) -> Response {
    let Ok(mut store) = state.store.lock() else {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "store poisoned");
    };
    let Some(key) = parse_id(&id).filter(|key| store.markets.contains_key(key)) else {
        return not_found(&id);
    };
    if state.faults.fail_delete {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "falha interna");
    }
    store.markets.remove(&key);
    message(StatusCode::OK, &format!("Mercado com ID {id} foi removido com sucesso."))
}

/// Stores a product under `category` after validating `nome` and `valor`.
fn store_product(state: &StubState, id: &str, category: &str, body: &Bytes) -> Response {
    let Ok(mut store) = state.store.lock() else {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "store poisoned");
    };
    let Some(market) = parse_id(id).and_then(|key| store.markets.get_mut(&key)) else {
        return not_found(id);
    };
    let Ok(product) = serde_json::from_slice::<Value>(body) else {
        return message(StatusCode::BAD_REQUEST, MSG_INVALID_INPUT);
    };
    if product.get("nome").and_then(Value::as_str).is_none() {
        return message(StatusCode::BAD_REQUEST, MSG_INVALID_INPUT);
    }
    if product.get("valor").and_then(Value::as_u64).is_none() {
        return message(StatusCode::BAD_REQUEST, MSG_INVALID_VALUE);
    }
    market.produtos.entry(category.to_string()).or_default().push(product.clone());
    reply(
        StatusCode::CREATED,
        json!({ "message": "Produto adicionado com sucesso", "product_item": product }),
    )
}

async fn add_product(State(state): State<StubState>, Path(id): Path<String>, body: Bytes) -> Response {
    store_product(&state, &id, "hortifruit/frutas", &body)
}

async fn add_category_product(
    State(state): State<StubState>,
    Path((id, section, category)): Path<(String, String, String)>,
    body: Bytes,
) -> Response {
    store_product(&state, &id, &format!("{section}/{category}"), &body)
}

async fn list_category(
    State(state): State<StubState>,
    Path((id, section, category)): Path<(String, String, String)>,
) -> Response {
    let Ok(store) = state.store.lock() else {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "store poisoned");
    };
    let Some(market) = parse_id(&id).and_then(|key| store.markets.get(&key)) else {
        return not_found(&id);
    };
    let items = market.produtos.get(&format!("{section}/{category}")).cloned().unwrap_or_default();
    reply(StatusCode::OK, json!({ "data": items }))
}
