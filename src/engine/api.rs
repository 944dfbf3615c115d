//! Bolt API Module
//! REST surface over the relational and wide-column backends, with OpenAPI documentation

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::engine::adapter::{AdapterError, AdminCommand, RelationalBackend};
use crate::engine::filter::{parse_select, translate_ad_hoc_filter};
use crate::engine::query::{translate_structured_query, ValidationError};
use crate::engine::serializer::{
    serialize_relational_rows, serialize_table_metadata, serialize_table_names,
    serialize_wide_column_rows,
};
use crate::engine::widecolumn::{WideColumnBackend, WideColumnError};

#[derive(Clone)]
pub struct ApiState {
    pub relational: Arc<dyn RelationalBackend>,
    pub wide_column: Arc<dyn WideColumnBackend>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Relational(#[from] AdapterError),
    #[error("{0}")]
    WideColumn(#[from] WideColumnError),
    #[error("Unknown administration command: {0}")]
    UnknownCommand(String),
    #[error("{0}")]
    MalformedBody(#[from] JsonRejection),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Relational(AdapterError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::WideColumn(WideColumnError::TableNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::UnknownCommand(_) => StatusCode::NOT_FOUND,
            ApiError::MalformedBody(rejection) => rejection.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_relational_tables,
        filter_relational_rows,
        relational_table_metadata,
        lookup_relational_entity,
        run_structured_query,
        administer_database,
        administer_table,
        list_wide_column_tables,
        filter_wide_column_entities,
        wide_column_table_metadata,
        lookup_wide_column_entity,
    ),
    tags(
        (name = "relational", description = "Relational table operations"),
        (name = "widecolumn", description = "Wide-column table operations"),
        (name = "admin", description = "Relational administration"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/relational/tables", get(list_relational_tables))
        .route("/api/relational/tables/{table}", get(filter_relational_rows))
        .route("/api/relational/tables/{table}/metadata", get(relational_table_metadata))
        .route(
            "/api/relational/tables/{table}/entities/{partition_key}/{row_key}",
            get(lookup_relational_entity),
        )
        .route("/api/relational/query", post(run_structured_query))
        .route("/api/relational/admin/{command}", get(administer_database))
        .route("/api/relational/admin/{command}/{table}", get(administer_table))
        .route("/api/widecolumn/tables", get(list_wide_column_tables))
        .route("/api/widecolumn/tables/{table}", get(filter_wide_column_entities))
        .route("/api/widecolumn/tables/{table}/metadata", get(wide_column_table_metadata))
        .route(
            "/api/widecolumn/tables/{table}/entities/{partition_key}/{row_key}",
            get(lookup_wide_column_entity),
        )
        .route("/api/health", get(health_check))
        .route("/api/openapi.json", get(openapi_spec))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    get,
    path = "/api/relational/tables",
    responses(
        (status = 200, description = "Table names wrapped in value", body = Value)
    ),
    tag = "relational"
)]
async fn list_relational_tables(State(state): State<ApiState>) -> ApiResult {
    let tables = state.relational.list_tables()?;
    Ok(Json(serialize_table_names(&tables)))
}

#[utoipa::path(
    get,
    path = "/api/relational/tables/{table}",
    params(
        ("table" = String, Path, description = "Table name"),
    ),
    responses(
        (status = 200, description = "Rows matching the ad-hoc filter", body = Value),
        (status = 404, description = "Unknown table", body = Value)
    ),
    tag = "relational"
)]
async fn filter_relational_rows(
    State(state): State<ApiState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let filter = translate_ad_hoc_filter(&params);
    let select = parse_select(&params);
    tracing::debug!("filtering relational table {} with {:?}", table, filter);

    let rows = state.relational.filter_rows(&table, &select, &filter)?;
    Ok(Json(serialize_relational_rows(&rows)))
}

#[utoipa::path(
    get,
    path = "/api/relational/tables/{table}/metadata",
    params(
        ("table" = String, Path, description = "Table name"),
    ),
    responses(
        (status = 200, description = "Table metadata", body = Value)
    ),
    tag = "relational"
)]
async fn relational_table_metadata(Path(table): Path<String>) -> Json<Value> {
    Json(serialize_table_metadata(&table))
}

#[utoipa::path(
    get,
    path = "/api/relational/tables/{table}/entities/{partition_key}/{row_key}",
    params(
        ("table" = String, Path, description = "Table name"),
        ("partition_key" = String, Path, description = "Partition key"),
        ("row_key" = String, Path, description = "Row key"),
    ),
    responses(
        (status = 200, description = "Matching rows", body = Value),
        (status = 404, description = "Unknown table", body = Value)
    ),
    tag = "relational"
)]
async fn lookup_relational_entity(
    State(state): State<ApiState>,
    Path((table, partition_key, row_key)): Path<(String, String, String)>,
) -> ApiResult {
    let rows = state.relational.lookup(&table, &partition_key, &row_key)?;
    Ok(Json(serialize_relational_rows(&rows)))
}

#[utoipa::path(
    post,
    path = "/api/relational/query",
    request_body = Value,
    responses(
        (status = 200, description = "Query results", body = Value),
        (status = 400, description = "Malformed query document", body = Value),
        (status = 415, description = "Body is not declared as JSON", body = Value)
    ),
    tag = "relational"
)]
async fn run_structured_query(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let Json(document) = body?;
    let spec = translate_structured_query(&document)?;
    tracing::info!("structured query on {}", spec.from);

    let rows = state.relational.query(&spec)?;
    Ok(Json(serialize_relational_rows(&rows)))
}

#[utoipa::path(
    get,
    path = "/api/relational/admin/{command}",
    params(
        ("command" = String, Path, description = "engines, status, plugins or open-tables"),
    ),
    responses(
        (status = 200, description = "Command output rows", body = Value),
        (status = 404, description = "Unknown command", body = Value)
    ),
    tag = "admin"
)]
async fn administer_database(
    State(state): State<ApiState>,
    Path(command): Path<String>,
) -> ApiResult {
    administer(&state, &command, None)
}

#[utoipa::path(
    get,
    path = "/api/relational/admin/{command}/{table}",
    params(
        (
            "command" = String,
            Path,
            description = "analyze, check, repair, optimize, indexes or keys"
        ),
        ("table" = String, Path, description = "Table name"),
    ),
    responses(
        (status = 200, description = "Command output rows", body = Value),
        (status = 404, description = "Unknown command or table", body = Value)
    ),
    tag = "admin"
)]
async fn administer_table(
    State(state): State<ApiState>,
    Path((command, table)): Path<(String, String)>,
) -> ApiResult {
    administer(&state, &command, Some(&table))
}

fn administer(state: &ApiState, command: &str, table: Option<&str>) -> ApiResult {
    let command = AdminCommand::from_path(command, table)
        .ok_or_else(|| ApiError::UnknownCommand(command.to_string()))?;
    tracing::info!("administration command {:?}", command);

    let rows = state.relational.administer(&command)?;
    Ok(Json(serialize_relational_rows(&rows)))
}

#[utoipa::path(
    get,
    path = "/api/widecolumn/tables",
    responses(
        (status = 200, description = "Table names wrapped in value", body = Value)
    ),
    tag = "widecolumn"
)]
async fn list_wide_column_tables(State(state): State<ApiState>) -> ApiResult {
    let tables = state.wide_column.list_tables()?;
    Ok(Json(serialize_table_names(&tables)))
}

#[utoipa::path(
    get,
    path = "/api/widecolumn/tables/{table}",
    params(
        ("table" = String, Path, description = "Table name"),
    ),
    responses(
        (status = 200, description = "Entities matching the ad-hoc filter", body = Value),
        (status = 404, description = "Unknown table", body = Value)
    ),
    tag = "widecolumn"
)]
async fn filter_wide_column_entities(
    State(state): State<ApiState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    let filter = translate_ad_hoc_filter(&params);
    let select = parse_select(&params);
    tracing::debug!("filtering wide-column table {} with {:?}", table, filter);

    let entities = state.wide_column.filter_entities(&table, &select, &filter)?;
    Ok(Json(serialize_wide_column_rows(&entities)))
}

#[utoipa::path(
    get,
    path = "/api/widecolumn/tables/{table}/metadata",
    params(
        ("table" = String, Path, description = "Table name"),
    ),
    responses(
        (status = 200, description = "Table metadata", body = Value)
    ),
    tag = "widecolumn"
)]
async fn wide_column_table_metadata(Path(table): Path<String>) -> Json<Value> {
    Json(serialize_table_metadata(&table))
}

#[utoipa::path(
    get,
    path = "/api/widecolumn/tables/{table}/entities/{partition_key}/{row_key}",
    params(
        ("table" = String, Path, description = "Table name"),
        ("partition_key" = String, Path, description = "Partition key"),
        ("row_key" = String, Path, description = "Row key"),
    ),
    responses(
        (status = 200, description = "Zero or one entity", body = Value),
        (status = 404, description = "Unknown table", body = Value)
    ),
    tag = "widecolumn"
)]
async fn lookup_wide_column_entity(
    State(state): State<ApiState>,
    Path((table, partition_key, row_key)): Path<(String, String, String)>,
) -> ApiResult {
    let entities = state.wide_column.lookup(&table, &partition_key, &row_key)?;
    Ok(Json(serialize_wide_column_rows(&entities)))
}
