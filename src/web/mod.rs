use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

use crate::{
    config::Config,
    db::DocumentStore,
    error::ServiceError,
    llm_client::{LanguageModel, OpenAiClient},
    models::{
        chat::{ChatHistoryResponse, ChatRequest, ChatResponse},
        prediction::{Prediction, PredictionRequest},
        property::{PropertiesResponse, Property, PropertyFilter, PropertyResponse},
    },
    pricing::estimator::PricingEstimator,
    properties::{
        search::{SearchEngine, SearchQuery},
        store::PropertyStore,
    },
    services::{
        chat_history::ChatHistory,
        chatbot::ConversationPipeline,
        saved_properties::{SavedProperties, StorageBackend},
    },
};

const DEFAULT_USER_ID: &str = "default";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub properties: Arc<PropertyStore>,
    pub search: SearchEngine,
    pub pricing: Arc<PricingEstimator>,
    pub saved: Arc<SavedProperties>,
    pub history: Arc<ChatHistory>,
    pub chatbot: Arc<ConversationPipeline>,
}

impl AppState {
    pub fn new(
        config: Config,
        llm: Option<Arc<dyn LanguageModel>>,
        store: DocumentStore,
    ) -> Self {
        let properties = Arc::new(PropertyStore::new(&config));
        let search = SearchEngine::new(&config);
        let pricing = Arc::new(PricingEstimator::from_config(&config));
        let saved = Arc::new(SavedProperties::new(store.clone()));
        let history = Arc::new(ChatHistory::new(store));
        let chatbot = Arc::new(ConversationPipeline::new(
            properties.clone(),
            search.clone(),
            pricing.clone(),
            llm,
            history.clone(),
            Duration::from_secs(config.llm_timeout_seconds),
        ));

        AppState {
            config: Arc::new(config),
            properties,
            search,
            pricing,
            saved,
            history,
            chatbot,
        }
    }

    /// Wires the OpenAI client and the database from configuration. Either
    /// may be missing; the service then runs on its fallbacks.
    pub async fn from_config(config: Config) -> Self {
        let llm = OpenAiClient::from_config(&config)
            .map(|client| Arc::new(client) as Arc<dyn LanguageModel>);
        let store = DocumentStore::connect(&config).await;

        AppState::new(config, llm, store)
    }
}

#[derive(Deserialize)]
pub struct SavePropertyRequest {
    pub property_id: i64,
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct SavePropertyResponse {
    pub message: String,
    pub saved_properties: Vec<i64>,
    pub storage: StorageBackend,
}

#[derive(Deserialize)]
pub struct CompareRequest {
    pub property_ids: Vec<i64>,
}

#[derive(Serialize)]
pub struct ComparisonResponse {
    pub property1: PropertyResponse,
    pub property2: PropertyResponse,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::PropertyNotFound(_) | ServiceError::PropertiesNotFound => {
                StatusCode::NOT_FOUND
            }
            ServiceError::ModelNotLoaded => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/properties", get(list_properties))
        .route("/api/properties/search", post(search_properties))
        .route("/api/properties/save", post(save_property))
        .route("/api/properties/saved/:user_id", get(get_saved_properties))
        .route(
            "/api/properties/saved/:user_id/:property_id",
            delete(remove_saved_property),
        )
        .route("/api/properties/compare", post(compare_properties))
        .route("/api/properties/:id/predict", post(predict_property_price))
        .route("/api/predict", post(predict_price))
        .route("/api/chat", post(chat))
        .route(
            "/api/chat/history/:user_id",
            get(get_chat_history).delete(clear_chat_history),
        )
        .layer(middleware::from_fn(cors_layer))
        .with_state(state)
}

pub async fn start_http_server(
    state: AppState,
    mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let bind_addr = state
        .config
        .http_bind_address
        .clone()
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind http listener on {}", bind_addr))?;
    info!("HTTP server listening on {}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .context("HTTP server crashed")
}

async fn cors_layer(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        apply_cors_headers(response.headers_mut());
        *response.status_mut() = StatusCode::NO_CONTENT;
        response
    } else {
        let mut response = next.run(req).await;
        apply_cors_headers(response.headers_mut());
        response
    }
}

fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    headers.insert(
        axum::http::header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Real Estate Chatbot API",
        "status": "running",
    }))
}

async fn list_properties(State(state): State<AppState>) -> Json<PropertiesResponse> {
    let properties = state.properties.all().await;
    Json(PropertiesResponse::new(
        properties.iter().map(PropertyResponse::from).collect(),
    ))
}

async fn search_properties(
    State(state): State<AppState>,
    Json(filter): Json<PropertyFilter>,
) -> Json<PropertiesResponse> {
    let properties = state.properties.all().await;
    let found = state.search.search(
        &properties,
        &SearchQuery {
            filter: Some(&filter),
            ..SearchQuery::default()
        },
    );

    Json(PropertiesResponse::new(
        found.iter().map(PropertyResponse::from).collect(),
    ))
}

async fn save_property(
    State(state): State<AppState>,
    Json(body): Json<SavePropertyRequest>,
) -> Result<Json<SavePropertyResponse>, ServiceError> {
    if body.property_id <= 0 {
        return Err(ServiceError::InvalidRequest(
            "property_id must be greater than 0".to_string(),
        ));
    }

    let user_id = body.user_id.as_deref().unwrap_or(DEFAULT_USER_ID);
    let (saved_properties, storage) = state.saved.save(user_id, body.property_id).await;

    Ok(Json(SavePropertyResponse {
        message: "Property saved".to_string(),
        saved_properties,
        storage,
    }))
}

async fn get_saved_properties(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<PropertiesResponse> {
    let saved_ids = state.saved.list(&user_id).await;
    if saved_ids.is_empty() {
        return Json(PropertiesResponse::new(Vec::new()));
    }

    let properties = state.properties.get_by_ids(&saved_ids).await;
    Json(PropertiesResponse::new(
        properties.iter().map(PropertyResponse::from).collect(),
    ))
}

async fn remove_saved_property(
    State(state): State<AppState>,
    Path((user_id, property_id)): Path<(String, i64)>,
) -> Json<StatusResponse> {
    let success = state.saved.remove(&user_id, property_id).await;
    let message = if success {
        "Property removed"
    } else {
        "Property was not saved"
    };

    Json(StatusResponse {
        success,
        message: message.to_string(),
    })
}

async fn compare_properties(
    State(state): State<AppState>,
    Json(body): Json<CompareRequest>,
) -> Result<Json<ComparisonResponse>, ServiceError> {
    if body.property_ids.len() != 2 {
        return Err(ServiceError::InvalidRequest(
            "Please provide exactly 2 property IDs".to_string(),
        ));
    }

    let properties = state.properties.get_by_ids(&body.property_ids).await;
    let [first, second] = properties.as_slice() else {
        return Err(ServiceError::PropertiesNotFound);
    };

    let with_prediction = |property: &Property| {
        let prediction = state
            .pricing
            .predict_for_property(property)
            .unwrap_or_else(|_| Prediction::zero(property.id, property.price));
        PropertyResponse::from(property).with_prediction(prediction)
    };

    Ok(Json(ComparisonResponse {
        property1: with_prediction(first),
        property2: with_prediction(second),
    }))
}

async fn predict_price(
    State(state): State<AppState>,
    Json(body): Json<PredictionRequest>,
) -> Result<Json<Prediction>, ServiceError> {
    if !state.pricing.is_available() {
        return Err(ServiceError::ModelNotLoaded);
    }
    if !(1..=10).contains(&body.school_rating) {
        return Err(ServiceError::InvalidRequest(
            "school_rating must be between 1 and 10".to_string(),
        ));
    }
    if body.year_built < 1800 {
        return Err(ServiceError::InvalidRequest(
            "year_built must be 1800 or later".to_string(),
        ));
    }

    state.pricing.predict(&body).map(Json)
}

async fn predict_property_price(
    State(state): State<AppState>,
    Path(property_id): Path<i64>,
) -> Result<Json<Prediction>, ServiceError> {
    if !state.pricing.is_available() {
        return Err(ServiceError::ModelNotLoaded);
    }

    let property = state
        .properties
        .get_by_id(property_id)
        .await
        .ok_or(ServiceError::PropertyNotFound(property_id))?;

    state.pricing.predict_for_property(&property).map(Json)
}

async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Json<ChatResponse> {
    let user_id = body
        .user_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_USER_ID);

    Json(state.chatbot.process_message(&body.message, user_id).await)
}

async fn get_chat_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ChatHistoryResponse> {
    let messages = state.history.get(&user_id).await;
    let count = messages.len();
    Json(ChatHistoryResponse { messages, count })
}

async fn clear_chat_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<StatusResponse> {
    let success = state.history.clear(&user_id).await;
    let message = if success {
        "Chat history cleared"
    } else {
        "Failed to clear history"
    };

    Json(StatusResponse {
        success,
        message: message.to_string(),
    })
}
