use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware::from_fn,
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::{
    chat::{ChatError, continue_conversation},
    evaluation::{EvaluationError, evaluate_session},
    llm::{ModelClient, ModelError},
    models::{ChatReply, EvaluationResult, SessionRequest},
    telemetry::correlation_id_middleware,
};

pub const INVALID_REQUEST_MESSAGE: &str = "リクエストの形式が正しくありません。";
pub const CHAT_FAILURE_MESSAGE: &str = "AIからの応答中にエラーが発生しました。";
pub const CHAT_EMPTY_REPLY_MESSAGE: &str = "AIから応答が得られませんでした。もう一度お試しください。";
pub const EVALUATION_FAILURE_MESSAGE: &str = "評価中にエラーが発生しました。";
pub const EVALUATION_MALFORMED_MESSAGE: &str = "評価結果を読み取れませんでした。もう一度お試しください。";

/// Failures keep the success shape so the client can always render them.
type ApiResult<T> = Result<Json<T>, (StatusCode, Json<T>)>;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn ModelClient>,
}

impl AppState {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/evaluate", post(evaluate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(correlation_id_middleware))
        .with_state(app_state)
}

async fn root() -> &'static str {
    "Hello from the backend!"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn chat_failure(status: StatusCode, message: &str) -> (StatusCode, Json<ChatReply>) {
    (
        status,
        Json(ChatReply {
            reply: message.to_string(),
        }),
    )
}

fn evaluation_failure(status: StatusCode, message: &str) -> (StatusCode, Json<EvaluationResult>) {
    (
        status,
        Json(EvaluationResult {
            score: 0,
            feedback: message.to_string(),
        }),
    )
}

impl From<ChatError> for (StatusCode, Json<ChatReply>) {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyConversation => {
                chat_failure(StatusCode::BAD_REQUEST, INVALID_REQUEST_MESSAGE)
            }
            ChatError::Upstream(ModelError::Request(_)) => {
                chat_failure(StatusCode::INTERNAL_SERVER_ERROR, CHAT_FAILURE_MESSAGE)
            }
            ChatError::Upstream(ModelError::EmptyReply) => {
                chat_failure(StatusCode::INTERNAL_SERVER_ERROR, CHAT_EMPTY_REPLY_MESSAGE)
            }
        }
    }
}

impl From<EvaluationError> for (StatusCode, Json<EvaluationResult>) {
    fn from(err: EvaluationError) -> Self {
        match err {
            EvaluationError::EmptyTranscript => {
                evaluation_failure(StatusCode::BAD_REQUEST, INVALID_REQUEST_MESSAGE)
            }
            EvaluationError::Upstream(_) => evaluation_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                EVALUATION_FAILURE_MESSAGE,
            ),
            EvaluationError::MalformedOutput(_) | EvaluationError::InvalidResult(_) => {
                evaluation_failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    EVALUATION_MALFORMED_MESSAGE,
                )
            }
        }
    }
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> ApiResult<ChatReply> {
    let Json(request) = payload.map_err(|e| {
        warn!(error = %e, "Rejected chat request");
        chat_failure(StatusCode::BAD_REQUEST, INVALID_REQUEST_MESSAGE)
    })?;

    info!(
        message_count = request.messages.len(),
        patient_type = ?request.patient_type(),
        "Received chat request"
    );
    debug!(messages = ?request.messages, "Conversation history");

    match continue_conversation(
        state.model.as_ref(),
        &request.messages,
        request.patient_type(),
    )
    .await
    {
        Ok(reply) => Ok(Json(ChatReply { reply })),
        Err(e) => {
            error!(error = %e, "Failed to continue conversation");
            Err(e.into())
        }
    }
}

async fn evaluate(
    State(state): State<AppState>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> ApiResult<EvaluationResult> {
    let Json(request) = payload.map_err(|e| {
        warn!(error = %e, "Rejected evaluation request");
        evaluation_failure(StatusCode::BAD_REQUEST, INVALID_REQUEST_MESSAGE)
    })?;

    info!(
        message_count = request.messages.len(),
        patient_type = ?request.patient_type(),
        "Received evaluation request"
    );
    debug!(messages = ?request.messages, "Transcript for evaluation");

    match evaluate_session(
        state.model.as_ref(),
        &request.messages,
        request.patient_type(),
    )
    .await
    {
        Ok(result) => {
            info!(score = result.score, "Evaluation completed");
            Ok(Json(result))
        }
        Err(e) => {
            error!(error = %e, "Failed to evaluate session");
            Err(e.into())
        }
    }
}
