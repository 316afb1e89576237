use axum::{
    Router,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    AgeBandRes, BatchRes, CommandRes, CsvReq, DemoParams, DemoRes, DiagnosisCountRes, ErrorRes,
    HealthRes, HealthService, InsightsReq, InsightsRes, InterpretReq, PatientRecordRes,
    PredictionBody, PredictionParseReq, PredictionRes, PromptItemRes, PromptRes,
    RecordValidationRes, SkippedRowRes, ValidationRes, predictions_by_id,
};
use readmit_core::{
    BatchService, CoreError, build_prompt, constants::DEFAULT_DEMO_RECORDS,
    core_config_from_env_values, demo_batch, interpret, normalise_transcript,
    parse_prediction_response, summarise, validate_batch,
};

type ApiError = (StatusCode, Json<ErrorRes>);

/// Room for the JSON envelope and string escapes around a batch at the configured limit.
const REQUEST_BODY_SLACK: usize = 64 * 1024;

/// Application state shared across REST API handlers
#[derive(Clone)]
struct AppState {
    batches: BatchService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        interpret_command,
        ingest_batch,
        validate_batch_records,
        parse_prediction,
        build_prompts,
        batch_insights,
        demo_data
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        InterpretReq,
        CommandRes,
        CsvReq,
        BatchRes,
        PatientRecordRes,
        SkippedRowRes,
        ValidationRes,
        RecordValidationRes,
        PredictionParseReq,
        PredictionRes,
        PromptRes,
        PromptItemRes,
        PredictionBody,
        InsightsReq,
        InsightsRes,
        AgeBandRes,
        DiagnosisCountRes,
        DemoRes
    ))
)]
struct ApiDoc;

/// Main entry point for the readmission-risk REST server
///
/// # Environment Variables
/// - `READMIT_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - `READMIT_ID_PREFIX`: prefix for generated record ids (default: "patient")
/// - `READMIT_MAX_BATCH_BYTES`: largest accepted batch text (default: 5 MiB)
///
/// # Errors
/// Returns an error if the configuration is invalid, the address cannot be bound, or the server
/// fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("readmit=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = core_config_from_env_values(
        std::env::var("READMIT_ID_PREFIX").ok(),
        std::env::var("READMIT_MAX_BATCH_BYTES").ok(),
    )?;
    let rest_addr = std::env::var("READMIT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting Readmit REST on {}", rest_addr);

    let state = AppState {
        batches: BatchService::new(Arc::new(cfg))?,
    };

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    // Escaping can double the batch text; `ingest` applies the exact limit.
    let body_limit = state
        .batches
        .config()
        .max_batch_bytes()
        .saturating_mul(2)
        .saturating_add(REQUEST_BODY_SLACK);

    Router::new()
        .route("/health", get(health))
        .route("/commands/interpret", post(interpret_command))
        .route("/batches", post(ingest_batch))
        .route("/batches/validate", post(validate_batch_records))
        .route("/predictions/parse", post(parse_prediction))
        .route("/predictions/prompt", post(build_prompts))
        .route("/insights", post(batch_insights))
        .route("/demo", get(demo_data))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Maps a core error to a status code, surfacing its message verbatim.
fn api_error(err: CoreError) -> ApiError {
    let status = match &err {
        CoreError::PredictionShape(_) | CoreError::PredictionJson(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CoreError::BatchTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        CoreError::PredictionKeyInvalid | CoreError::PredictionFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::BAD_REQUEST,
    };
    tracing::warn!("request failed ({}): {}", status, err);
    (
        status,
        Json(ErrorRes {
            message: err.to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/commands/interpret",
    request_body = InterpretReq,
    responses(
        (status = 200, description = "Recognised command; UNKNOWN when no rule matched", body = CommandRes)
    )
)]
/// Interpret a voice transcript
///
/// The transcript is trimmed and lower-cased first. Interpretation never fails: an unrecognised
/// phrase comes back as an `UNKNOWN` command carrying the transcript.
#[axum::debug_handler]
async fn interpret_command(
    State(_state): State<AppState>,
    Json(req): Json<InterpretReq>,
) -> Json<CommandRes> {
    let command = interpret(&normalise_transcript(&req.transcript));
    Json(CommandRes::from(&command))
}

#[utoipa::path(
    post,
    path = "/batches",
    request_body = CsvReq,
    responses(
        (status = 200, description = "Parsed records and skipped rows", body = BatchRes),
        (status = 400, description = "Empty text, missing data row, or missing header", body = ErrorRes),
        (status = 413, description = "Batch text too large", body = ErrorRes)
    )
)]
/// Parse batch text into patient records
///
/// Rows whose column count differs from the header are skipped and listed in `skippedRows`.
#[axum::debug_handler]
async fn ingest_batch(
    State(state): State<AppState>,
    Json(req): Json<CsvReq>,
) -> Result<Json<BatchRes>, ApiError> {
    let report = state.batches.ingest(&req.csv).map_err(api_error)?;
    Ok(Json(BatchRes::from(&report)))
}

#[utoipa::path(
    post,
    path = "/batches/validate",
    request_body = CsvReq,
    responses(
        (status = 200, description = "Coercion outcome per record", body = ValidationRes),
        (status = 400, description = "Batch could not be parsed", body = ErrorRes)
    )
)]
/// Parse batch text and coerce every record into typed data
#[axum::debug_handler]
async fn validate_batch_records(
    State(state): State<AppState>,
    Json(req): Json<CsvReq>,
) -> Result<Json<ValidationRes>, ApiError> {
    let report = state.batches.ingest(&req.csv).map_err(api_error)?;
    let results = validate_batch(&report.records)
        .iter()
        .map(RecordValidationRes::from)
        .collect();

    Ok(Json(ValidationRes {
        results,
        skipped_rows: report.skipped_rows.iter().map(SkippedRowRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/predictions/parse",
    request_body = PredictionParseReq,
    responses(
        (status = 200, description = "Parsed prediction with narration", body = PredictionRes),
        (status = 422, description = "Reply is not JSON or has the wrong shape", body = ErrorRes)
    )
)]
/// Parse a prediction model reply
#[axum::debug_handler]
async fn parse_prediction(
    State(_state): State<AppState>,
    Json(req): Json<PredictionParseReq>,
) -> Result<Json<PredictionRes>, ApiError> {
    let result = parse_prediction_response(&req.text).map_err(api_error)?;
    Ok(Json(PredictionRes::from(&result)))
}

#[utoipa::path(
    post,
    path = "/predictions/prompt",
    request_body = CsvReq,
    responses(
        (status = 200, description = "Prediction prompt per record", body = PromptRes),
        (status = 400, description = "Batch could not be parsed", body = ErrorRes)
    )
)]
/// Build the prediction prompt for every record in a batch
#[axum::debug_handler]
async fn build_prompts(
    State(state): State<AppState>,
    Json(req): Json<CsvReq>,
) -> Result<Json<PromptRes>, ApiError> {
    let report = state.batches.ingest(&req.csv).map_err(api_error)?;
    let prompts = report
        .records
        .iter()
        .map(|record| PromptItemRes {
            id: record.id().to_string(),
            prompt: build_prompt(record.data()),
        })
        .collect();

    Ok(Json(PromptRes {
        prompts,
        skipped_rows: report.skipped_rows.iter().map(SkippedRowRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/insights",
    request_body = InsightsReq,
    responses(
        (status = 200, description = "Dashboard figures for the batch", body = InsightsRes),
        (status = 400, description = "Batch could not be parsed", body = ErrorRes),
        (status = 413, description = "Batch text too large", body = ErrorRes)
    )
)]
/// Aggregate a batch and its predictions for the insights dashboard
///
/// Predictions are matched to records by id. A record is high risk when its risk is above 50.
#[axum::debug_handler]
async fn batch_insights(
    State(state): State<AppState>,
    Json(req): Json<InsightsReq>,
) -> Result<Json<InsightsRes>, ApiError> {
    let report = state.batches.ingest(&req.csv).map_err(api_error)?;
    let insights = summarise(&report.records, &predictions_by_id(req.predictions));
    Ok(Json(InsightsRes::new(&insights, &report)))
}

#[utoipa::path(
    get,
    path = "/demo",
    params(DemoParams),
    responses(
        (status = 200, description = "Generated batch text and predictions", body = DemoRes),
        (status = 400, description = "Count above the demo limit", body = ErrorRes)
    )
)]
/// Generate a seeded demo batch
#[axum::debug_handler]
async fn demo_data(
    State(_state): State<AppState>,
    Query(params): Query<DemoParams>,
) -> Result<Json<DemoRes>, ApiError> {
    let pairs = demo_batch(
        params.count.unwrap_or(DEFAULT_DEMO_RECORDS),
        params.seed.unwrap_or_default(),
    )
    .map_err(api_error)?;
    Ok(Json(DemoRes::from(pairs.as_slice())))
}
